use std::sync::{Mutex, PoisonError};

use hideout_core::net::messages::{RoundEndMsg, RoundStartMsg};

use crate::lifecycle::LobbyReturn;

/// Deferred reactions, run by the coordinator once per tick.
#[derive(Debug)]
pub enum RoundAction {
    /// Version-checked start request, local or remote.
    Start(RoundStartMsg),
    /// Authoritative end for a round.
    End(RoundEndMsg),
    /// A peer's state changed or it left.
    CheckEnd,
    /// Arena entry that found no session to snapshot.
    EnterArena,
    /// Lobby return that found no session to restore.
    ReturnToLobby(Box<LobbyReturn>),
}

/// Single-consumer action queue. Producers push from any thread; the tick
/// swaps the whole buffer out, so actions pushed during a drain run next tick.
#[derive(Debug, Default)]
pub struct ActionQueue {
    actions: Mutex<Vec<RoundAction>>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, action: RoundAction) {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(action);
    }

    pub fn take(&self) -> Vec<RoundAction> {
        std::mem::take(&mut *self.actions.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
