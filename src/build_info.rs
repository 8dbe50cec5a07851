//! Compile-time build information.

pub const BUILD_COMMIT: &str = env!("DELVE_BUILD_COMMIT");
pub const BUILD_DATE: &str = env!("DELVE_BUILD_DATE");

/// One-line version string shown by `delve --version`.
pub fn version_line() -> String {
    format!("delve {} ({} {})", env!("CARGO_PKG_VERSION"), BUILD_DATE, BUILD_COMMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info_not_empty() {
        assert!(!BUILD_COMMIT.is_empty());
        assert!(!BUILD_DATE.is_empty());
    }

    #[test]
    fn test_version_line_mentions_commit() {
        let line = version_line();
        assert!(line.starts_with("delve "));
        assert!(line.contains(BUILD_COMMIT));
    }
}
