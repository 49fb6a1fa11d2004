use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::session::{Counter, EntityId, Inventory, Session};

/// Which session fields a round captures on arena entry and rolls back on
/// return to the lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotFields {
    pub dashes: bool,
    pub dreaming: bool,
    pub inventory: bool,
    /// Color grade plus the lighting, bloom and dark-room adjustments.
    pub lighting: bool,
    pub grabbed_golden: bool,
    /// Both session-wide and level flags.
    pub flags: bool,
    pub counters: bool,
    pub do_not_load: bool,
    pub keys: bool,
    pub summit_gems: bool,
}

impl Default for SnapshotFields {
    fn default() -> Self {
        Self {
            dashes: true,
            dreaming: true,
            inventory: true,
            lighting: true,
            grabbed_golden: true,
            flags: true,
            counters: true,
            do_not_load: true,
            keys: true,
            summit_gems: false,
        }
    }
}

impl SnapshotFields {
    pub fn all() -> Self {
        Self {
            summit_gems: true,
            ..Self::default()
        }
    }

    pub fn none() -> Self {
        Self {
            dashes: false,
            dreaming: false,
            inventory: false,
            lighting: false,
            grabbed_golden: false,
            flags: false,
            counters: false,
            do_not_load: false,
            keys: false,
            summit_gems: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Lighting {
    color_grade: String,
    lighting_alpha_add: f32,
    bloom_base_add: f32,
    dark_room_alpha: f32,
}

/// Copy of the configured session fields. Fields outside the configured set
/// are left untouched by [`SessionSnapshot::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    dashes: Option<u8>,
    dreaming: Option<bool>,
    inventory: Option<Inventory>,
    lighting: Option<Lighting>,
    grabbed_golden: Option<bool>,
    flags: Option<(HashSet<String>, HashSet<String>)>,
    counters: Option<Vec<Counter>>,
    do_not_load: Option<HashSet<EntityId>>,
    keys: Option<HashSet<EntityId>>,
    summit_gems: Option<[bool; 6]>,
}

impl SessionSnapshot {
    pub fn take(ses: &Session, fields: &SnapshotFields) -> Self {
        Self {
            dashes: fields.dashes.then_some(ses.dashes),
            dreaming: fields.dreaming.then_some(ses.dreaming),
            inventory: fields.inventory.then_some(ses.inventory),
            lighting: fields.lighting.then(|| Lighting {
                color_grade: ses.color_grade.clone(),
                lighting_alpha_add: ses.lighting_alpha_add,
                bloom_base_add: ses.bloom_base_add,
                dark_room_alpha: ses.dark_room_alpha,
            }),
            grabbed_golden: fields.grabbed_golden.then_some(ses.grabbed_golden),
            flags: fields
                .flags
                .then(|| (ses.flags.clone(), ses.level_flags.clone())),
            counters: fields.counters.then(|| ses.counters.clone()),
            do_not_load: fields.do_not_load.then(|| ses.do_not_load.clone()),
            keys: fields.keys.then(|| ses.keys.clone()),
            summit_gems: fields.summit_gems.then_some(ses.summit_gems),
        }
    }

    /// Restore every captured field. The snapshot stays valid and can be
    /// applied again.
    pub fn apply(&self, ses: &mut Session) {
        if let Some(dashes) = self.dashes {
            ses.dashes = dashes;
        }
        if let Some(dreaming) = self.dreaming {
            ses.dreaming = dreaming;
        }
        if let Some(inventory) = self.inventory {
            ses.inventory = inventory;
        }
        if let Some(lighting) = &self.lighting {
            ses.color_grade = lighting.color_grade.clone();
            ses.lighting_alpha_add = lighting.lighting_alpha_add;
            ses.bloom_base_add = lighting.bloom_base_add;
            ses.dark_room_alpha = lighting.dark_room_alpha;
        }
        if let Some(grabbed) = self.grabbed_golden {
            ses.grabbed_golden = grabbed;
        }
        if let Some((flags, level_flags)) = &self.flags {
            ses.flags = flags.clone();
            ses.level_flags = level_flags.clone();
        }
        if let Some(counters) = &self.counters {
            ses.counters = counters.clone();
        }
        if let Some(do_not_load) = &self.do_not_load {
            ses.do_not_load = do_not_load.clone();
        }
        if let Some(keys) = &self.keys {
            ses.keys = keys.clone();
        }
        if let Some(gems) = self.summit_gems {
            ses.summit_gems = gems;
        }
    }
}
