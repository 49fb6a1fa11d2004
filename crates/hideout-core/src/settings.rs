use std::fmt;

use serde::{Deserialize, Serialize};

/// Major version of the round protocol. Peers must match exactly.
pub const VERSION_MAJOR: u32 = 0;
/// Minor version of the round protocol. Peers must match exactly.
pub const VERSION_MINOR: u32 = 1;

/// 2D position in level space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Which side of an area is loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaMode {
    #[default]
    Normal,
    BSide,
    CSide,
}

impl fmt::Display for AreaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::BSide => write!(f, "BSide"),
            Self::CSide => write!(f, "CSide"),
        }
    }
}

/// Identifies a loadable area (map SID plus side).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AreaKey {
    pub sid: String,
    pub mode: AreaMode,
}

impl AreaKey {
    pub fn new(sid: impl Into<String>, mode: AreaMode) -> Self {
        Self {
            sid: sid.into(),
            mode,
        }
    }

    /// Parse `"sid"` or `"sid#a"`/`"sid#b"`/`"sid#c"` (suffix case-insensitive).
    /// Anything that is not a recognized side suffix stays part of the SID.
    pub fn parse(s: &str) -> Self {
        if let Some((sid, side)) = s.rsplit_once('#')
            && side.len() == 1
        {
            let mode = match side.to_ascii_lowercase().as_str() {
                "a" => Some(AreaMode::Normal),
                "b" => Some(AreaMode::BSide),
                "c" => Some(AreaMode::CSide),
                _ => None,
            };
            if let Some(mode) = mode {
                return Self::new(sid, mode);
            }
        }
        Self::new(s, AreaMode::Normal)
    }
}

impl fmt::Display for AreaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.sid, self.mode)
    }
}

/// Canonical identity of a round. Two settings with the same id are the same round.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(pub String);

impl RoundId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoundId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Parameters of one round, created by the initiating peer and copied
/// verbatim into the start message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSettings {
    pub lobby_area: AreaKey,
    pub lobby_level: String,
    pub lobby_spawn_point: Vec2,

    pub arena_area: AreaKey,
    pub spawn_level: String,
    pub spawn_index: u8,

    /// Positive: fixed number of seekers. Zero or negative: fixed number of
    /// hiders equal to the magnitude.
    pub initial_seekers: i32,
    pub tag_mode: bool,
    pub golden_mode: bool,
    pub hide_names: bool,
}

impl RoundSettings {
    /// `arena sid # arena mode # spawn level # major.minor`
    pub fn round_id(&self) -> RoundId {
        RoundId(format!(
            "{}#{}#{}#{}.{}",
            self.arena_area.sid, self.arena_area.mode, self.spawn_level, VERSION_MAJOR, VERSION_MINOR
        ))
    }
}
