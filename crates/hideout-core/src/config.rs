use serde::{Deserialize, Serialize};

use crate::arena_option::ArenaOption;
use crate::snapshot::SnapshotFields;

/// Data-driven configuration for round coordination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// How long seed-wait collects peer seeds before assigning roles (seconds).
    pub seed_wait_secs: f32,
    /// Time rate during seed-wait is `exp(-seed_wait_slowdown * t)`.
    pub seed_wait_slowdown: f32,
    /// Invincibility granted on every avatar (re)load inside a round (seconds).
    pub respawn_invincibility_secs: f32,
    /// Invincibility floor held while a screen transition is in progress (seconds).
    pub transition_invincibility_secs: f32,
    /// Grant the dream-dash ability to the winner on return to the lobby.
    pub reward_dream_dash: bool,
    /// Session fields captured on arena entry and restored on return.
    pub snapshot: SnapshotFields,
    /// Locally known round-start locations.
    pub arena_options: Vec<ArenaOption>,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            seed_wait_secs: 1.0,
            seed_wait_slowdown: 4.0,
            respawn_invincibility_secs: 1.0,
            transition_invincibility_secs: 0.25,
            reward_dream_dash: true,
            snapshot: SnapshotFields::default(),
            arena_options: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "config parse error: {e}"),
            Self::Invalid(e) => write!(f, "invalid config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl RoundConfig {
    /// Load config from `$HIDEOUT_ROUND_CONFIG` or `config/hideout.toml`,
    /// falling back to defaults.
    pub fn load() -> Self {
        let path = std::env::var("HIDEOUT_ROUND_CONFIG")
            .unwrap_or_else(|_| "config/hideout.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!("Failed to load {path}: {e}, using defaults");
                    Self::default()
                },
            },
            Err(_) => Self::default(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("seed_wait_secs", self.seed_wait_secs),
            ("seed_wait_slowdown", self.seed_wait_slowdown),
            ("respawn_invincibility_secs", self.respawn_invincibility_secs),
            (
                "transition_invincibility_secs",
                self.transition_invincibility_secs,
            ),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for opt in &self.arena_options {
            if opt.spawn_level.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "arena option for switch {} has no spawn_level",
                    opt.switch_id
                )));
            }
            if !ArenaOption::SPAWN_INDEX_RANGE.contains(&opt.spawn_index) {
                return Err(ConfigError::Invalid(format!(
                    "arena option for switch {} has spawn_index {} outside {:?}",
                    opt.switch_id,
                    opt.spawn_index,
                    ArenaOption::SPAWN_INDEX_RANGE
                )));
            }
            if !seen.insert(opt.switch_id) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate arena option for switch {}",
                    opt.switch_id
                )));
            }
        }
        Ok(())
    }

    pub fn arena_option(&self, switch_id: i32) -> Option<&ArenaOption> {
        self.arena_options.iter().find(|o| o.switch_id == switch_id)
    }
}
