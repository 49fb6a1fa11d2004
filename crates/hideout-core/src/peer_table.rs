use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::host::PeerStateTable;
use crate::net::messages::StateUpdateMsg;
use crate::role::{PeerId, PlayerState};

/// In-memory peer state table, keyed by peer identity.
///
/// Cheap to clone; clones share the same table so a receive thread can
/// record updates while the tick thread reads them.
#[derive(Debug, Clone)]
pub struct PeerTable {
    local: PeerId,
    peers: Arc<RwLock<HashMap<PeerId, Option<PlayerState>>>>,
}

impl PeerTable {
    pub fn new(local: PeerId) -> Self {
        Self {
            local,
            peers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a connected peer with no round state yet.
    pub fn add_peer(&self, peer: PeerId) {
        if peer == self.local {
            return;
        }
        self.peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(peer)
            .or_insert(None);
    }

    /// Returns the last known state of the removed peer.
    pub fn remove_peer(&self, peer: PeerId) -> Option<PlayerState> {
        self.peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&peer)
            .flatten()
    }

    /// Apply a received state update. Updates from the local peer are ignored.
    pub fn record(&self, msg: &StateUpdateMsg) {
        if msg.sender == self.local {
            return;
        }
        self.peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(msg.sender, msg.state.clone());
    }

    pub fn len(&self) -> usize {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PeerStateTable for PeerTable {
    fn local_peer(&self) -> PeerId {
        self.local
    }

    fn known_peers(&self) -> Vec<PeerId> {
        let mut peers: Vec<PeerId> = self
            .peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        peers.sort_unstable();
        peers
    }

    fn peer_state(&self, peer: PeerId) -> Option<PlayerState> {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&peer)
            .cloned()
            .flatten()
    }
}
