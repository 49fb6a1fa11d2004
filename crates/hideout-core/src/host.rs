//! Seams between round coordination and the surrounding client.
//!
//! The messaging layer, the scene/session host and the arena spawn lookup are
//! all external. Round logic only talks to them through these traits.

use crate::net::messages::NetMessage;
use crate::role::{PeerId, PlayerRole, PlayerState};
use crate::session::Session;
use crate::settings::{AreaKey, Vec2};

/// Read access to the gossiped per-peer round state.
///
/// The local peer is never listed; its state is owned by the round lifecycle.
pub trait PeerStateTable {
    fn local_peer(&self) -> PeerId;

    /// Every currently connected remote peer.
    fn known_peers(&self) -> Vec<PeerId>;

    /// Latest state received from `peer`, `None` if it is in no round or unknown.
    fn peer_state(&self, peer: PeerId) -> Option<PlayerState>;

    /// All remote peers that currently report a round state.
    fn peer_states(&self) -> Vec<(PeerId, PlayerState)> {
        self.known_peers()
            .into_iter()
            .filter_map(|peer| self.peer_state(peer).map(|state| (peer, state)))
            .collect()
    }
}

/// The peer-to-peer messaging layer.
pub trait PeerNetwork: PeerStateTable {
    fn is_connected(&self) -> bool;

    /// Fire-and-forget delivery to every other peer. Delivery is reliable,
    /// unordered and at-least-once.
    fn broadcast(&self, msg: &NetMessage);
}

/// The scene and session owner.
pub trait GameHost {
    /// `None` while no level is loaded (e.g. mid scene transition).
    fn session(&self) -> Option<&Session>;
    fn session_mut(&mut self) -> Option<&mut Session>;

    /// Request a scene change. `spawn` overrides the level's default spawn.
    fn load_level(&mut self, area: &AreaKey, level: &str, spawn: Option<Vec2>);

    fn set_time_rate(&mut self, rate: f32);

    /// Kill the local avatar. Death completion is reported back through the
    /// coordinator's death hook.
    fn kill_avatar(&mut self);

    fn is_transitioning(&self) -> bool;

    /// Start zone the local avatar currently overlaps, if any.
    fn overlapped_start_zone(&self) -> Option<i32>;
}

/// Role-specific spawn points of the loaded arena.
pub trait ArenaSpawns {
    fn spawn_point(&self, role: PlayerRole, index: u8) -> Option<Vec2>;
    fn default_spawn_point(&self) -> Vec2;
}
