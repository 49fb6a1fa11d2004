pub mod collision;
pub mod coordinator;
pub mod debug;
pub mod lifecycle;
pub mod queue;
pub mod verify;

pub use collision::{AvatarAppearance, ContactOutcome};
pub use coordinator::{RoundCoordinator, RoundInbox};
pub use lifecycle::RoundLifecycle;
pub use verify::{ArenaOptionVerifier, LobbyLocationVerifier, RoundStartVerifier};
