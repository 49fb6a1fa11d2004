use hideout_core::config::RoundConfig;
use hideout_core::host::{GameHost, PeerStateTable};
use hideout_core::role::{PeerId, PlayerRole, PlayerState, assign_role};
use hideout_core::settings::{AreaKey, RoundId, RoundSettings, Vec2};
use hideout_core::snapshot::{SessionSnapshot, SnapshotFields};

/// Result of advancing the seed-wait timer by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeedWait {
    /// Still collecting seeds; the host should run at this time rate.
    Waiting { time_rate: f32 },
    /// Budget used up; roles must be assigned now.
    Expired,
}

/// Outcome of a round-end consensus check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCheck {
    Continue,
    Ended { winner: bool },
}

/// Everything needed to put the player back into the lobby after a round,
/// detached from the lifecycle so it can be retried on a later tick.
#[derive(Debug, Clone)]
pub struct LobbyReturn {
    pub round_id: RoundId,
    pub lobby_area: AreaKey,
    pub lobby_level: String,
    pub lobby_spawn_point: Vec2,
    pub snapshot: Option<SessionSnapshot>,
    pub winner: bool,
    pub reward_dream_dash: bool,
}

impl LobbyReturn {
    /// Restore the session and request the lobby scene. Returns `false`
    /// without side effects if the host has no session right now.
    pub fn apply(&self, host: &mut dyn GameHost) -> bool {
        let Some(ses) = host.session_mut() else {
            return false;
        };
        if let Some(snapshot) = &self.snapshot {
            snapshot.apply(ses);
        }
        ses.respawn_point = Some(self.lobby_spawn_point);
        ses.won_last_round = self.winner;
        if self.reward_dream_dash {
            ses.inventory.dream_dash = self.winner;
        }
        ses.set_round_flags(false, false, false);

        host.load_level(
            &self.lobby_area,
            &self.lobby_level,
            Some(self.lobby_spawn_point),
        );
        tracing::info!(round_id = %self.round_id, winner = self.winner, "Returned to lobby");
        true
    }
}

/// The local peer's view of one round, from the verified start request
/// until it stops.
#[derive(Debug, Clone)]
pub struct RoundLifecycle {
    settings: RoundSettings,
    round_id: RoundId,
    local_seed: i32,
    local_role: PlayerRole,
    seed_wait_timer: f32,
    invincibility_timer: f32,
    skip_end_check: bool,
    is_likely_winner: bool,
    tag_pending: bool,
    snapshot: Option<SessionSnapshot>,
    in_arena: bool,
    spawned_in_arena: bool,
}

impl RoundLifecycle {
    pub fn new(settings: RoundSettings, local_seed: i32) -> Self {
        let round_id = settings.round_id();
        Self {
            settings,
            round_id,
            local_seed,
            local_role: PlayerRole::SeedWait,
            seed_wait_timer: 0.0,
            invincibility_timer: 0.0,
            skip_end_check: true,
            is_likely_winner: false,
            tag_pending: false,
            snapshot: None,
            in_arena: false,
            spawned_in_arena: false,
        }
    }

    pub fn settings(&self) -> &RoundSettings {
        &self.settings
    }

    pub fn round_id(&self) -> &RoundId {
        &self.round_id
    }

    pub fn local_seed(&self) -> i32 {
        self.local_seed
    }

    pub fn local_role(&self) -> PlayerRole {
        self.local_role
    }

    pub fn in_seed_wait(&self) -> bool {
        self.local_role == PlayerRole::SeedWait
    }

    /// Roles are assigned and the round is being played.
    pub fn is_active(&self) -> bool {
        self.local_role.is_assigned()
    }

    pub fn invincibility_timer(&self) -> f32 {
        self.invincibility_timer
    }

    pub fn is_invincible(&self) -> bool {
        self.invincibility_timer > 0.0
    }

    pub fn skip_end_check(&self) -> bool {
        self.skip_end_check
    }

    pub fn is_likely_winner(&self) -> bool {
        self.is_likely_winner
    }

    pub fn in_arena(&self) -> bool {
        self.in_arena
    }

    pub fn spawned_in_arena(&self) -> bool {
        self.spawned_in_arena
    }

    pub fn tag_pending(&self) -> bool {
        self.tag_pending
    }

    pub fn local_state(&self) -> PlayerState {
        PlayerState {
            round_id: self.round_id.clone(),
            seed: self.local_seed,
            role: self.local_role,
        }
    }

    /// Remote peers currently reporting a state for this round.
    pub fn peer_states(&self, table: &dyn PeerStateTable) -> Vec<(PeerId, PlayerState)> {
        table
            .peer_states()
            .into_iter()
            .filter(|(_, state)| state.round_id == self.round_id)
            .collect()
    }

    /// State of `peer` if it is in this round.
    pub fn peer_state(&self, table: &dyn PeerStateTable, peer: PeerId) -> Option<PlayerState> {
        table
            .peer_state(peer)
            .filter(|state| state.round_id == self.round_id)
    }

    /// Apply a role change. Only `SeedWait -> Hider|Seeker` and
    /// `Hider -> Seeker` are accepted.
    pub fn set_role(&mut self, role: PlayerRole) -> bool {
        let allowed = matches!(
            (self.local_role, role),
            (PlayerRole::SeedWait, PlayerRole::Hider | PlayerRole::Seeker)
                | (PlayerRole::Hider, PlayerRole::Seeker)
        );
        if !allowed {
            tracing::warn!(
                round_id = %self.round_id,
                from = %self.local_role,
                to = %role,
                "Rejected role transition"
            );
            return false;
        }
        tracing::info!(round_id = %self.round_id, from = %self.local_role, to = %role, "Role changed");
        self.local_role = role;
        self.tag_pending = false;
        true
    }

    /// Advance seed-wait by real (unscaled) time. `None` outside seed-wait.
    pub fn tick_seed_wait(&mut self, dt: f32, config: &RoundConfig) -> Option<SeedWait> {
        if !self.in_seed_wait() {
            return None;
        }
        self.seed_wait_timer += dt;
        if self.seed_wait_timer > config.seed_wait_secs {
            Some(SeedWait::Expired)
        } else {
            Some(SeedWait::Waiting {
                time_rate: (-config.seed_wait_slowdown * self.seed_wait_timer).exp(),
            })
        }
    }

    /// Pick the local role from every observed seed of this round. Returns
    /// `None` if no other participant was ever seen.
    pub fn assign_from_peers(
        &self,
        local_peer: PeerId,
        peers: &[(PeerId, PlayerState)],
    ) -> Option<PlayerRole> {
        if peers.is_empty() {
            return None;
        }
        let seeds: Vec<(i32, PeerId)> = peers.iter().map(|(id, s)| (s.seed, *id)).collect();
        Some(assign_role(
            self.local_seed,
            local_peer,
            &seeds,
            self.settings.initial_seekers,
        ))
    }

    /// Round-end consensus over the remote states of this round.
    ///
    /// Seed-wait participants count towards neither side. While the local
    /// peer is still in seed-wait the check only observes.
    pub fn check_round_end(&mut self, peers: &[(PeerId, PlayerState)]) -> EndCheck {
        let other_hider = peers.iter().any(|(_, s)| s.role == PlayerRole::Hider);
        let other_seeker = peers.iter().any(|(_, s)| s.role == PlayerRole::Seeker);
        let any_hider = self.local_role == PlayerRole::Hider || other_hider;
        let any_seeker = self.local_role == PlayerRole::Seeker || other_seeker;
        let winner = self.local_role == PlayerRole::Hider && !other_hider;

        if any_hider && any_seeker {
            self.skip_end_check = false;
            self.is_likely_winner = winner;
            return EndCheck::Continue;
        }
        if self.skip_end_check || self.in_seed_wait() {
            return EndCheck::Continue;
        }
        EndCheck::Ended { winner }
    }

    /// Snapshot the session and request the arena. Returns `false` if the
    /// host has no session right now.
    pub fn enter_arena(&mut self, host: &mut dyn GameHost, fields: &SnapshotFields) -> bool {
        let Some(ses) = host.session_mut() else {
            return false;
        };
        self.snapshot = Some(SessionSnapshot::take(ses, fields));
        ses.keys.clear();
        ses.won_last_round = false;
        self.in_arena = true;
        self.spawned_in_arena = false;

        host.load_level(&self.settings.arena_area, &self.settings.spawn_level, None);
        tracing::info!(
            round_id = %self.round_id,
            role = %self.local_role,
            level = %self.settings.spawn_level,
            "Entering arena"
        );
        true
    }

    /// Consume the lifecycle. Returns the pending lobby return if the arena
    /// was entered.
    pub fn stop(self, winner: bool, config: &RoundConfig) -> Option<LobbyReturn> {
        tracing::info!(
            round_id = %self.round_id,
            role = %self.local_role,
            winner,
            "Stopping round"
        );
        if !self.in_arena {
            return None;
        }
        Some(LobbyReturn {
            round_id: self.round_id,
            lobby_area: self.settings.lobby_area,
            lobby_level: self.settings.lobby_level,
            lobby_spawn_point: self.settings.lobby_spawn_point,
            snapshot: self.snapshot,
            winner,
            reward_dream_dash: config.reward_dream_dash,
        })
    }

    pub fn grant_invincibility(&mut self, secs: f32) {
        self.invincibility_timer = self.invincibility_timer.max(secs);
    }

    pub fn update_invincibility(&mut self, dt: f32, transitioning: bool, config: &RoundConfig) {
        if self.invincibility_timer > 0.0 {
            self.invincibility_timer -= dt;
        }
        if transitioning {
            self.grant_invincibility(config.transition_invincibility_secs);
        }
    }

    pub(crate) fn mark_tag_pending(&mut self) {
        self.tag_pending = true;
    }

    /// Claim the first arena spawn. Returns `true` exactly once per round.
    pub(crate) fn claim_arena_spawn(&mut self) -> bool {
        if !self.in_arena || self.spawned_in_arena || !self.is_active() {
            return false;
        }
        self.spawned_in_arena = true;
        true
    }
}
