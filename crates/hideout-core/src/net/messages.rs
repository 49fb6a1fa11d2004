use serde::{Deserialize, Serialize};

use crate::role::{PeerId, PlayerRole, PlayerState};
use crate::settings::{RoundId, RoundSettings};

/// Network message type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    RoundStart = 0x01,
    RoundEnd = 0x02,
    StateUpdate = 0x03,
}

impl MessageType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::RoundStart),
            0x02 => Some(Self::RoundEnd),
            0x03 => Some(Self::StateUpdate),
            _ => None,
        }
    }
}

/// Request that every peer in the same start zone joins a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundStartMsg {
    pub sender: PeerId,
    pub major_version: u32,
    pub minor_version: u32,
    pub settings: RoundSettings,
    /// Start zone the initiator stood in. Receivers outside it ignore the request.
    pub start_zone: Option<i32>,
}

/// Authoritative end of a round, e.g. a hider reached the goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundEndMsg {
    pub sender: PeerId,
    pub round_id: RoundId,
    pub winning_role: Option<PlayerRole>,
}

/// Latest round state of the sending peer. `None` means "not in any round".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateUpdateMsg {
    pub sender: PeerId,
    pub state: Option<PlayerState>,
}

/// Every message this crate puts on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NetMessage {
    RoundStart(RoundStartMsg),
    RoundEnd(RoundEndMsg),
    StateUpdate(StateUpdateMsg),
}

impl NetMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::RoundStart(_) => MessageType::RoundStart,
            Self::RoundEnd(_) => MessageType::RoundEnd,
            Self::StateUpdate(_) => MessageType::StateUpdate,
        }
    }

    pub fn sender(&self) -> PeerId {
        match self {
            Self::RoundStart(m) => m.sender,
            Self::RoundEnd(m) => m.sender,
            Self::StateUpdate(m) => m.sender,
        }
    }
}
