//! Slot files under a save directory.
//!
//! Layout:
//! - `<save_dir>/<slot>.json` holds the current record
//! - `<save_dir>/backups/<slot>/<slot>-<timestamp>-<n>.json` holds earlier ones
//!
//! Writes go to a temp file in the same directory, are flushed and synced,
//! then renamed over the slot. A failed save never touches the old record.

use super::record::{world_from_record, world_to_record, SaveRecord};
use crate::core::config::GameConfig;
use crate::core::error::{GameError, GameResult};
use crate::world::WorldState;
use chrono::{DateTime, Utc};
use serde_json::value::RawValue;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const SLOT_EXTENSION: &str = "json";
const BACKUP_DIR: &str = "backups";

/// One entry of [`SaveManager::list_slots`].
#[derive(Debug, Clone, PartialEq)]
pub struct SlotInfo {
    pub slot: String,
    pub saved_at: Option<DateTime<Utc>>,
    pub player_name: String,
    pub steps: u64,
    pub is_corrupted: bool,
}

#[derive(Debug, Clone)]
pub struct SaveManager {
    save_dir: PathBuf,
    max_backups: usize,
}

impl SaveManager {
    pub fn new(save_dir: impl Into<PathBuf>, max_backups: usize) -> Self {
        Self {
            save_dir: save_dir.into(),
            max_backups,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.save_dir.clone(), config.max_backups)
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    pub fn slot_path(&self, slot: &str) -> GameResult<PathBuf> {
        let name = slot_name(slot)?;
        Ok(self
            .save_dir
            .join(format!("{}.{}", name, SLOT_EXTENSION)))
    }

    fn backup_dir(&self, slot: &str) -> GameResult<PathBuf> {
        Ok(self.save_dir.join(BACKUP_DIR).join(slot_name(slot)?))
    }

    pub fn exists(&self, slot: &str) -> bool {
        self.slot_path(slot).is_ok_and(|p| p.is_file())
    }

    /// Writes a checkpoint of `world` into `slot`, keeping the previous record
    /// as a backup.
    pub fn save(&self, world: &WorldState, slot: &str) -> GameResult<SaveRecord> {
        let path = self.slot_path(slot)?;
        fs::create_dir_all(&self.save_dir)?;

        let world_json = serde_json::to_string(&world_to_record(world))
            .map_err(|e| GameError::InvariantViolation(format!("world encoding failed: {}", e)))?;
        let raw = RawValue::from_string(world_json)
            .map_err(|e| GameError::InvariantViolation(format!("world encoding failed: {}", e)))?;
        let record = SaveRecord::seal(raw);
        let text = serde_json::to_string_pretty(&record)
            .map_err(|e| GameError::InvariantViolation(format!("record encoding failed: {}", e)))?;

        if path.is_file() {
            self.backup(slot, &path)?;
        }
        write_atomically(&path, text.as_bytes())?;

        info!(
            slot,
            record_id = %record.record_id,
            steps = world.steps,
            "checkpoint written"
        );
        Ok(record)
    }

    /// Loads and fully validates the world stored in `slot`.
    pub fn load(&self, slot: &str) -> GameResult<WorldState> {
        let path = self.slot_path(slot)?;
        let (_, world) = decode_file(slot, &path)?;
        info!(slot, steps = world.steps, "save loaded");
        Ok(world)
    }

    /// Loads the envelope of `slot` after verifying its checksum.
    pub fn load_record(&self, slot: &str) -> GameResult<SaveRecord> {
        let path = self.slot_path(slot)?;
        let (record, _) = decode_file(slot, &path)?;
        Ok(record)
    }

    /// Every slot in the save directory, newest first. Unreadable slots are
    /// listed with `is_corrupted` set.
    pub fn list_slots(&self) -> GameResult<Vec<SlotInfo>> {
        let entries = match fs::read_dir(&self.save_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut slots = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|s| s.to_str()) != Some(SLOT_EXTENSION)
            {
                continue;
            }
            let Some(slot) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
            else {
                continue;
            };

            slots.push(match decode_file(&slot, &path) {
                Ok((record, world)) => SlotInfo {
                    player_name: world
                        .player()
                        .map(|p| p.name().to_string())
                        .unwrap_or_default(),
                    steps: world.steps,
                    saved_at: Some(record.saved_at),
                    is_corrupted: false,
                    slot,
                },
                Err(e) => {
                    warn!(slot, error = %e, "unreadable save slot");
                    SlotInfo {
                        slot,
                        saved_at: None,
                        player_name: "[CORRUPTED]".to_string(),
                        steps: 0,
                        is_corrupted: true,
                    }
                }
            });
        }

        slots.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then(a.slot.cmp(&b.slot)));
        Ok(slots)
    }

    /// Removes a slot and all of its backups.
    pub fn delete_slot(&self, slot: &str) -> GameResult<()> {
        let path = self.slot_path(slot)?;
        let backups = self.backup_dir(slot)?;
        if !path.exists() && !backups.exists() {
            return Err(GameError::NotFound {
                slot: slot.to_string(),
            });
        }
        if path.exists() {
            fs::remove_file(&path)?;
        }
        if backups.exists() {
            fs::remove_dir_all(&backups)?;
        }
        info!(slot, "save slot deleted");
        Ok(())
    }

    /// Backup files of `slot`, oldest first.
    pub fn backups(&self, slot: &str) -> GameResult<Vec<PathBuf>> {
        let dir = self.backup_dir(slot)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some(SLOT_EXTENSION) {
                files.push(path);
            }
        }
        // Timestamped names sort chronologically.
        files.sort();
        Ok(files)
    }

    /// Replaces the slot with its newest valid backup and returns that world.
    pub fn restore_latest_backup(&self, slot: &str) -> GameResult<WorldState> {
        let mut last_error = None;
        for backup in self.backups(slot)?.into_iter().rev() {
            match decode_file(slot, &backup) {
                Ok((_, world)) => {
                    fs::create_dir_all(&self.save_dir)?;
                    let bytes = fs::read(&backup)?;
                    write_atomically(&self.slot_path(slot)?, &bytes)?;
                    info!(slot, backup = %backup.display(), "restored from backup");
                    return Ok(world);
                }
                Err(e) => {
                    warn!(slot, backup = %backup.display(), error = %e, "skipping bad backup");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| GameError::NotFound {
            slot: slot.to_string(),
        }))
    }

    /// Copies the current slot file into the backup directory and prunes the
    /// oldest backups beyond the limit.
    fn backup(&self, slot: &str, current: &Path) -> GameResult<()> {
        if self.max_backups == 0 {
            return Ok(());
        }
        let dir = self.backup_dir(slot)?;
        fs::create_dir_all(&dir)?;

        let name = slot_name(slot)?;
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%3f");
        let mut n = 0;
        let mut target = dir.join(format!("{}-{}-{:03}.{}", name, stamp, n, SLOT_EXTENSION));
        while target.exists() {
            n += 1;
            target = dir.join(format!("{}-{}-{:03}.{}", name, stamp, n, SLOT_EXTENSION));
        }
        fs::copy(current, &target)?;

        let backups = self.backups(slot)?;
        let excess = backups.len().saturating_sub(self.max_backups);
        for old in &backups[..excess] {
            if let Err(e) = fs::remove_file(old) {
                warn!(backup = %old.display(), error = %e, "could not prune backup");
            }
        }
        Ok(())
    }
}

/// Validates a slot name: letters, digits, `-` and `_` only.
fn slot_name(slot: &str) -> GameResult<String> {
    let name = sanitize_slot(slot);
    if name.is_empty() {
        return Err(GameError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' is not a usable slot name", slot),
        )));
    }
    Ok(name)
}

/// Lowercases a slot name and drops anything that is not safe in a file name.
pub fn sanitize_slot(slot: &str) -> String {
    slot.trim()
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

fn decode_file(slot: &str, path: &Path) -> GameResult<(SaveRecord, WorldState)> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(GameError::NotFound {
                slot: slot.to_string(),
            })
        }
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            return Err(GameError::corrupt(slot, "file is not valid UTF-8"))
        }
        Err(e) => return Err(e.into()),
    };
    let record: SaveRecord = serde_json::from_str(&text)
        .map_err(|e| GameError::corrupt(slot, format!("unreadable record: {}", e)))?;
    record.verify().map_err(|reason| GameError::corrupt(slot, reason))?;
    let world = record
        .decode_world()
        .and_then(world_from_record)
        .map_err(|reason| GameError::corrupt(slot, reason))?;
    Ok((record, world))
}

fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    let result = (|| {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.flush()?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{generate_world, FixedNames};

    fn manager() -> (tempfile::TempDir, SaveManager) {
        let dir = tempfile::tempdir().unwrap();
        let saves = SaveManager::new(dir.path().join("saves"), 3);
        (dir, saves)
    }

    fn world(seed: u64) -> WorldState {
        generate_world(seed, "Hero", &mut FixedNames::new()).unwrap()
    }

    #[test]
    fn test_sanitize_slot() {
        assert_eq!(sanitize_slot("  My Run "), "my_run");
        assert_eq!(sanitize_slot("../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_slot("ok-1_a"), "ok-1_a");
    }

    #[test]
    fn test_unusable_slot_name_is_rejected() {
        let (_dir, saves) = manager();
        assert!(matches!(saves.slot_path("///"), Err(GameError::Io(_))));
    }

    #[test]
    fn test_save_then_load() {
        let (_dir, saves) = manager();
        let w = world(3);
        saves.save(&w, "main").unwrap();
        assert!(saves.exists("main"));
        assert_eq!(saves.load("main").unwrap(), w);
    }

    #[test]
    fn test_missing_slot_is_not_found() {
        let (_dir, saves) = manager();
        assert!(matches!(saves.load("ghost"), Err(GameError::NotFound { .. })));
        assert!(matches!(
            saves.delete_slot("ghost"),
            Err(GameError::NotFound { .. })
        ));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let (_dir, saves) = manager();
        saves.save(&world(3), "main").unwrap();
        let leftovers: Vec<_> = fs::read_dir(saves.save_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_backups_rotate() {
        let (_dir, saves) = manager();
        let mut w = world(3);
        for step in 0..6 {
            w.steps = step;
            saves.save(&w, "main").unwrap();
        }
        assert_eq!(saves.backups("main").unwrap().len(), 3);
        assert_eq!(saves.load("main").unwrap().steps, 5);
    }

    #[test]
    fn test_restore_latest_backup() {
        let (_dir, saves) = manager();
        let mut w = world(3);
        w.steps = 1;
        saves.save(&w, "main").unwrap();
        w.steps = 2;
        saves.save(&w, "main").unwrap();

        fs::write(saves.slot_path("main").unwrap(), "garbage").unwrap();
        assert!(matches!(
            saves.load("main"),
            Err(GameError::CorruptRecord { .. })
        ));

        let restored = saves.restore_latest_backup("main").unwrap();
        assert_eq!(restored.steps, 1);
        assert_eq!(saves.load("main").unwrap().steps, 1);
    }

    #[test]
    fn test_delete_removes_backups() {
        let (_dir, saves) = manager();
        let w = world(3);
        saves.save(&w, "main").unwrap();
        saves.save(&w, "main").unwrap();
        saves.delete_slot("main").unwrap();
        assert!(!saves.exists("main"));
        assert!(saves.backups("main").unwrap().is_empty());
    }

    #[test]
    fn test_list_slots_flags_corruption() {
        let (_dir, saves) = manager();
        saves.save(&world(1), "alpha").unwrap();
        fs::write(saves.slot_path("broken").unwrap(), "{}").unwrap();

        let slots = saves.list_slots().unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].slot, "alpha");
        assert_eq!(slots[0].player_name, "Hero");
        assert!(!slots[0].is_corrupted);
        assert_eq!(slots[1].slot, "broken");
        assert!(slots[1].is_corrupted);
    }

    #[test]
    fn test_list_slots_on_missing_dir_is_empty() {
        let (_dir, saves) = manager();
        assert!(saves.list_slots().unwrap().is_empty());
    }
}
