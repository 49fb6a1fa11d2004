use std::fmt;

use serde::{Deserialize, Serialize};

use crate::settings::RoundId;

/// Identity of a peer on the messaging layer. Also the assignment tie-break key.
pub type PeerId = u32;

/// Role of a participant in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlayerRole {
    /// Transient phase before assignment. Never counts towards round-end evaluation.
    SeedWait = 0,
    Hider = 1,
    Seeker = 2,
}

impl PlayerRole {
    /// Whether this role takes part in round-end evaluation.
    pub fn is_assigned(self) -> bool {
        !matches!(self, Self::SeedWait)
    }
}

impl fmt::Display for PlayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SeedWait => write!(f, "seed-wait"),
            Self::Hider => write!(f, "hider"),
            Self::Seeker => write!(f, "seeker"),
        }
    }
}

/// The only thing peers learn about each other's round participation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub round_id: RoundId,
    pub seed: i32,
    pub role: PlayerRole,
}

/// Number of peers ordered strictly above the local `(seed, identity)` pair.
pub fn rank_of(local_seed: i32, local_id: PeerId, peers: &[(i32, PeerId)]) -> usize {
    peers
        .iter()
        .filter(|&&(seed, id)| seed > local_seed || (seed == local_seed && id > local_id))
        .count()
}

/// Deterministically compute the local role from the observed peer seeds.
///
/// Every peer evaluating the same `(seed, identity)` set gets a distinct rank,
/// so the resulting partition is identical everywhere without a coordinator.
pub fn assign_role(
    local_seed: i32,
    local_id: PeerId,
    peers: &[(i32, PeerId)],
    initial_seekers: i32,
) -> PlayerRole {
    let rank = rank_of(local_seed, local_id, peers) as i64;
    let count = i64::from(initial_seekers);
    if count > 0 {
        if rank < count {
            PlayerRole::Seeker
        } else {
            PlayerRole::Hider
        }
    } else if rank < -count {
        PlayerRole::Hider
    } else {
        PlayerRole::Seeker
    }
}
