use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::settings::{AreaKey, Vec2};

/// Session flag set while the local player is in a live round.
pub const FLAG_IN_ROUND: &str = "hideout_in_round";
/// Session flag set while the local player is a hider.
pub const FLAG_IS_HIDER: &str = "hideout_is_hider";
/// Session flag set while the local player is a seeker.
pub const FLAG_IS_SEEKER: &str = "hideout_is_seeker";

/// Identifies a placed entity within a level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId {
    pub level: String,
    pub id: i32,
}

impl EntityId {
    pub fn new(level: impl Into<String>, id: i32) -> Self {
        Self {
            level: level.into(),
            id,
        }
    }
}

/// Named integer counter stored in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub key: String,
    pub value: i32,
}

/// Abilities carried by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub dashes: u8,
    pub dream_dash: bool,
    pub backpack: bool,
    pub no_refills: bool,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            dashes: 1,
            dream_dash: false,
            backpack: true,
            no_refills: false,
        }
    }
}

/// The persistent player session record, owned by the host for the lifetime
/// of the client process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub area: AreaKey,
    pub level: String,
    pub respawn_point: Option<Vec2>,

    pub dashes: u8,
    pub dreaming: bool,
    pub inventory: Inventory,

    pub color_grade: String,
    pub lighting_alpha_add: f32,
    pub bloom_base_add: f32,
    pub dark_room_alpha: f32,
    pub grabbed_golden: bool,

    pub flags: HashSet<String>,
    pub level_flags: HashSet<String>,
    pub counters: Vec<Counter>,
    pub do_not_load: HashSet<EntityId>,
    pub keys: HashSet<EntityId>,
    pub summit_gems: [bool; 6],

    /// Reward marker: whether the local player won the last finished round.
    pub won_last_round: bool,
}

impl Session {
    pub fn new(area: AreaKey, level: impl Into<String>) -> Self {
        Self {
            area,
            level: level.into(),
            respawn_point: None,
            dashes: 1,
            dreaming: false,
            inventory: Inventory::default(),
            color_grade: "none".to_string(),
            lighting_alpha_add: 0.0,
            bloom_base_add: 0.0,
            dark_room_alpha: 0.75,
            grabbed_golden: false,
            flags: HashSet::new(),
            level_flags: HashSet::new(),
            counters: Vec::new(),
            do_not_load: HashSet::new(),
            keys: HashSet::new(),
            summit_gems: [false; 6],
            won_last_round: false,
        }
    }

    pub fn get_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: &str, value: bool) {
        if value {
            self.flags.insert(flag.to_string());
        } else {
            self.flags.remove(flag);
        }
    }

    pub fn get_counter(&self, key: &str) -> i32 {
        self.counters
            .iter()
            .find(|c| c.key == key)
            .map_or(0, |c| c.value)
    }

    pub fn set_counter(&mut self, key: &str, value: i32) {
        match self.counters.iter_mut().find(|c| c.key == key) {
            Some(c) => c.value = value,
            None => self.counters.push(Counter {
                key: key.to_string(),
                value,
            }),
        }
    }

    /// Mirror the local round role into the session flags so level scripts can react.
    pub fn set_round_flags(&mut self, in_round: bool, hider: bool, seeker: bool) {
        self.set_flag(FLAG_IN_ROUND, in_round);
        self.set_flag(FLAG_IS_HIDER, in_round && hider);
        self.set_flag(FLAG_IS_SEEKER, in_round && seeker);
    }
}
