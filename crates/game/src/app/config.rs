use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ledgefall_engine::{FighterAction, MAX_LOCAL_SLOTS};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::gameplay::FighterTuning;

pub(crate) const CONFIG_ENV_VAR: &str = "LEDGEFALL_CONFIG";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("read config {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("parse config at {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("validation failed at roster: at least one fighter is required")]
    EmptyRoster,
    #[error("validation failed at {field}: tick rate must be positive")]
    ZeroTickRate { field: &'static str },
    #[error("validation failed at game_over_frames: must be positive")]
    ZeroGameOverFrames,
    #[error("validation failed at roster[{index}].control.slot: expected < {max}, got {slot}")]
    SlotOutOfRange {
        index: usize,
        slot: usize,
        max: usize,
    },
    #[error("validation failed at roster[{index}].control.steps: script needs at least one step")]
    EmptyScript { index: usize },
    #[error("validation failed at roster[{index}].control.steps[{step}].frames: must be positive")]
    ZeroFrameStep { index: usize, step: usize },
    #[error("validation failed at tuning.{field}: value out of range")]
    InvalidTuning { field: &'static str },
}

/// One timed chunk of a scripted fighter's input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScriptStep {
    pub(crate) frames: u32,
    #[serde(default)]
    pub(crate) actions: Vec<FighterAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum ControlKind {
    Keyboard {
        slot: usize,
    },
    Idle,
    Scripted {
        steps: Vec<ScriptStep>,
        #[serde(default)]
        looping: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RosterEntry {
    pub(crate) team: u32,
    pub(crate) control: ControlKind,
    #[serde(default)]
    pub(crate) show_highlight: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MatchConfig {
    pub(crate) tuning: FighterTuning,
    pub(crate) roster: Vec<RosterEntry>,
    pub(crate) normal_tick_rate: u32,
    pub(crate) slowed_tick_rate: u32,
    pub(crate) game_over_frames: u32,
    pub(crate) rng_seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            tuning: FighterTuning::default(),
            roster: vec![
                RosterEntry {
                    team: 0,
                    control: ControlKind::Keyboard { slot: 0 },
                    show_highlight: true,
                },
                RosterEntry {
                    team: 1,
                    control: ControlKind::Keyboard { slot: 1 },
                    show_highlight: true,
                },
            ],
            normal_tick_rate: 120,
            slowed_tick_rate: 20,
            game_over_frames: 60,
            rng_seed: 0x5eed,
        }
    }
}

impl MatchConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.roster.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }
        if self.normal_tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate {
                field: "normal_tick_rate",
            });
        }
        if self.slowed_tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate {
                field: "slowed_tick_rate",
            });
        }
        if self.game_over_frames == 0 {
            return Err(ConfigError::ZeroGameOverFrames);
        }
        for (index, entry) in self.roster.iter().enumerate() {
            match &entry.control {
                ControlKind::Keyboard { slot } if *slot >= MAX_LOCAL_SLOTS => {
                    return Err(ConfigError::SlotOutOfRange {
                        index,
                        slot: *slot,
                        max: MAX_LOCAL_SLOTS,
                    });
                }
                ControlKind::Scripted { steps, .. } => {
                    if steps.is_empty() {
                        return Err(ConfigError::EmptyScript { index });
                    }
                    if let Some(step) = steps.iter().position(|step| step.frames == 0) {
                        return Err(ConfigError::ZeroFrameStep { index, step });
                    }
                }
                ControlKind::Keyboard { .. } | ControlKind::Idle => {}
            }
        }
        if let Some(field) = self.tuning.first_invalid_field() {
            return Err(ConfigError::InvalidTuning { field });
        }
        Ok(())
    }
}

/// Reads the file named by `LEDGEFALL_CONFIG`, or falls back to defaults
/// when the variable is unset or empty.
pub(crate) fn load_match_config() -> Result<MatchConfig, ConfigError> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) if !path.is_empty() => load_match_config_from(Path::new(&path)),
        _ => {
            info!("match_config_defaults");
            Ok(MatchConfig::default())
        }
    }
}

pub(crate) fn load_match_config_from(path: &Path) -> Result<MatchConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_match_config_json(&raw)?;
    config.validate()?;
    info!(
        path = %path.display(),
        fighters = config.roster.len(),
        normal_tick_rate = config.normal_tick_rate,
        "match_config_loaded"
    );
    Ok(config)
}

fn parse_match_config_json(raw: &str) -> Result<MatchConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, MatchConfig>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let path = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        ConfigError::Parse {
            path,
            source: error.into_inner(),
        }
    })
}
