//! Runtime configuration.
//!
//! Defaults come from the platform directories reported by `directories`.
//! An optional `config.json` in the config directory overrides them, and
//! `DELVE_SAVE_DIR` overrides the save location last.

use crate::core::constants::{
    DEFAULT_HERO_NAME, DEFAULT_SCRIPTED_INTERVAL, DEFAULT_SLOT, MAX_BACKUPS_PER_SLOT,
};
use crate::world::encounter::{EncounterPolicy, ScriptedEncounters, WeightedEncounters};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SAVE_DIR_ENV: &str = "DELVE_SAVE_DIR";
const CONFIG_FILE: &str = "config.json";

/// How encounters are decided while exploring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EncounterMode {
    /// Seeded roll per step, more likely in dangerous places.
    #[default]
    Weighted,
    /// An encounter every `every` steps in any dangerous place.
    Scripted { every: u64 },
}

impl EncounterMode {
    pub fn build(&self, seed: u64) -> Box<dyn EncounterPolicy> {
        match *self {
            EncounterMode::Weighted => Box::new(WeightedEncounters::new(seed)),
            EncounterMode::Scripted { every } => Box::new(ScriptedEncounters::new(every)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub save_dir: PathBuf,
    pub log_dir: PathBuf,
    pub default_slot: String,
    pub hero_name: String,
    pub autosave: bool,
    pub permadeath: bool,
    pub encounters: EncounterMode,
    /// Fixed world seed; a fresh one is drawn for each new game when absent.
    pub seed: Option<u64>,
    pub max_backups: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        let (save_dir, log_dir) = match project_dirs() {
            Some(dirs) => (
                dirs.data_dir().join("saves"),
                dirs.data_local_dir().join("logs"),
            ),
            None => (PathBuf::from("saves"), PathBuf::from("logs")),
        };
        Self {
            save_dir,
            log_dir,
            default_slot: DEFAULT_SLOT.to_string(),
            hero_name: DEFAULT_HERO_NAME.to_string(),
            autosave: true,
            permadeath: true,
            encounters: EncounterMode::default(),
            seed: None,
            max_backups: MAX_BACKUPS_PER_SLOT,
        }
    }
}

impl GameConfig {
    /// Loads `config.json` from the platform config directory, then applies
    /// environment overrides.
    pub fn load() -> Self {
        let config = match project_dirs() {
            Some(dirs) => Self::load_from(&dirs.config_dir().join(CONFIG_FILE)),
            None => Self::default(),
        };
        config.with_env_overrides()
    }

    /// Reads a config file, falling back to defaults when it is missing or invalid.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("ignoring invalid config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(dir) = std::env::var_os(SAVE_DIR_ENV) {
            self.save_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn encounter_policy(&self, seed: u64) -> Box<dyn EncounterPolicy> {
        self.encounters.build(seed)
    }
}

impl EncounterMode {
    pub fn scripted() -> Self {
        EncounterMode::Scripted {
            every: DEFAULT_SCRIPTED_INTERVAL,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "delve")
}
