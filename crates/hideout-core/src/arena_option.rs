use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::session::Session;
use crate::settings::{AreaKey, RoundSettings, Vec2};

/// A locally known round-start location: one arena choice offered by a start
/// switch in the lobby.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaOption {
    /// Start switch this option is attached to.
    pub switch_id: i32,
    /// Arena area as `"sid"` or `"sid#b"`. Empty means the lobby's own area.
    pub arena_area: String,
    pub spawn_level: String,
    /// Non-negative: fixed spawn index. Negative `-n`: pick uniformly from `0..n`.
    pub spawn_index: i32,
    pub initial_seekers: i32,
    pub tag_mode: bool,
    pub golden_mode: bool,
    pub hide_names: bool,
}

impl Default for ArenaOption {
    fn default() -> Self {
        Self {
            switch_id: 0,
            arena_area: String::new(),
            spawn_level: String::new(),
            spawn_index: 0,
            initial_seekers: 1,
            tag_mode: true,
            golden_mode: false,
            hide_names: true,
        }
    }
}

impl ArenaOption {
    /// Accepted `spawn_index` values: a fixed index that fits a `u8`, or
    /// `-n` for a random pick among at most 256 indices.
    pub const SPAWN_INDEX_RANGE: std::ops::RangeInclusive<i32> = -256..=255;

    fn arena_key(&self, lobby_area: &AreaKey) -> AreaKey {
        if self.arena_area.is_empty() {
            lobby_area.clone()
        } else {
            AreaKey::parse(&self.arena_area)
        }
    }

    fn spawn_index_allowed(&self, index: u8) -> bool {
        if self.spawn_index < 0 {
            u32::from(index) < self.spawn_index.unsigned_abs()
        } else {
            i32::from(index) == self.spawn_index
        }
    }

    /// Build round settings for a round started from the player's current lobby position.
    pub fn generate_settings(&self, ses: &Session, rng: &mut impl Rng) -> RoundSettings {
        let limit = u32::from(u8::MAX) + 1;
        let spawn_index = if self.spawn_index < 0 {
            rng.random_range(0..self.spawn_index.unsigned_abs().min(limit))
        } else {
            self.spawn_index.unsigned_abs().min(limit - 1)
        };

        RoundSettings {
            lobby_area: ses.area.clone(),
            lobby_level: ses.level.clone(),
            lobby_spawn_point: ses.respawn_point.unwrap_or(Vec2::ZERO),
            arena_area: self.arena_key(&ses.area),
            spawn_level: self.spawn_level.clone(),
            spawn_index: u8::try_from(spawn_index).unwrap_or(u8::MAX),
            initial_seekers: self.initial_seekers,
            tag_mode: self.tag_mode,
            golden_mode: self.golden_mode,
            hide_names: self.hide_names,
        }
    }

    /// Whether `settings` could have been generated from this option.
    pub fn matches(&self, settings: &RoundSettings) -> bool {
        settings.arena_area == self.arena_key(&settings.lobby_area)
            && settings.spawn_level == self.spawn_level
            && self.spawn_index_allowed(settings.spawn_index)
            && settings.initial_seekers == self.initial_seekers
            && settings.tag_mode == self.tag_mode
            && settings.golden_mode == self.golden_mode
            && settings.hide_names == self.hide_names
    }
}
