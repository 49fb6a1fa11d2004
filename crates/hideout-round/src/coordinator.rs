use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hideout_core::config::RoundConfig;
use hideout_core::host::{ArenaSpawns, GameHost, PeerNetwork};
use hideout_core::net::messages::{
    NetMessage, RoundEndMsg, RoundStartMsg, StateUpdateMsg,
};
use hideout_core::net::protocol::decode_message;
use hideout_core::role::{PeerId, PlayerRole, PlayerState};
use hideout_core::settings::{RoundId, RoundSettings, VERSION_MAJOR, VERSION_MINOR, Vec2};

use crate::collision::{self, AvatarAppearance, ContactOutcome};
use crate::debug::{self, DebugState, InvalidWinnerCode, PeerDebug, RoundDebug};
use crate::lifecycle::{EndCheck, RoundLifecycle, SeedWait};
use crate::queue::{ActionQueue, RoundAction};
use crate::verify::{AllOf, ArenaOptionVerifier, LobbyLocationVerifier, RoundStartVerifier};

/// Thread-safe entry point for inbound messages. Every handler only enqueues;
/// the owning [`RoundCoordinator`] reacts on its next tick.
#[derive(Debug, Clone)]
pub struct RoundInbox {
    queue: Arc<ActionQueue>,
}

impl RoundInbox {
    fn new() -> Self {
        Self {
            queue: Arc::new(ActionQueue::new()),
        }
    }

    /// Start requests from incompatible versions are dropped here.
    pub fn handle_round_start(&self, msg: RoundStartMsg) {
        if msg.major_version != VERSION_MAJOR || msg.minor_version != VERSION_MINOR {
            tracing::info!(
                sender = msg.sender,
                major = msg.major_version,
                minor = msg.minor_version,
                "Ignoring round start with incompatible version (installed {VERSION_MAJOR}.{VERSION_MINOR})"
            );
            return;
        }
        self.queue.push(RoundAction::Start(msg));
    }

    pub fn handle_round_end(&self, msg: RoundEndMsg) {
        self.queue.push(RoundAction::End(msg));
    }

    /// The messaging layer has already stored the state in its table.
    pub fn handle_state_update(&self, _msg: &StateUpdateMsg) {
        self.queue.push(RoundAction::CheckEnd);
    }

    pub fn handle_peer_left(&self, _peer: PeerId) {
        self.queue.push(RoundAction::CheckEnd);
    }

    pub fn handle_message(&self, msg: NetMessage) {
        match msg {
            NetMessage::RoundStart(m) => self.handle_round_start(m),
            NetMessage::RoundEnd(m) => self.handle_round_end(m),
            NetMessage::StateUpdate(m) => self.handle_state_update(&m),
        }
    }

    /// Decode raw wire data and dispatch it. Malformed data is dropped.
    pub fn handle_bytes(&self, data: &[u8]) {
        match decode_message(data) {
            Ok(msg) => self.handle_message(msg),
            Err(e) => tracing::debug!(error = %e, "Dropping malformed round message"),
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn push(&self, action: RoundAction) {
        self.queue.push(action);
    }

    fn take(&self) -> Vec<RoundAction> {
        self.queue.take()
    }
}

/// Owner of the single optional round. All round mutation happens on the
/// thread calling [`RoundCoordinator::tick`] and the avatar hooks.
pub struct RoundCoordinator<N: PeerNetwork> {
    net: N,
    config: RoundConfig,
    rng: StdRng,
    inbox: RoundInbox,
    verifiers: Vec<Box<dyn RoundStartVerifier>>,
    round: Option<RoundLifecycle>,
}

impl<N: PeerNetwork> RoundCoordinator<N> {
    pub fn new(net: N, config: RoundConfig) -> Self {
        Self::with_rng(net, config, StdRng::from_os_rng())
    }

    /// Use a caller-provided seed generator, e.g. a seeded one in tests.
    pub fn with_rng(net: N, config: RoundConfig, rng: StdRng) -> Self {
        Self {
            net,
            config,
            rng,
            inbox: RoundInbox::new(),
            verifiers: Vec::new(),
            round: None,
        }
    }

    pub fn network(&self) -> &N {
        &self.net
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn inbox(&self) -> RoundInbox {
        self.inbox.clone()
    }

    pub fn round(&self) -> Option<&RoundLifecycle> {
        self.round.as_ref()
    }

    pub fn local_role(&self) -> Option<PlayerRole> {
        self.round.as_ref().map(RoundLifecycle::local_role)
    }

    pub fn register_verifier(&mut self, verifier: Box<dyn RoundStartVerifier>) {
        self.verifiers.push(verifier);
    }

    /// Accept starts from the local lobby that match a configured arena option.
    pub fn register_builtin_verifiers(&mut self) {
        let builtin = AllOf::new()
            .with(LobbyLocationVerifier)
            .with(ArenaOptionVerifier::new(self.config.arena_options.clone()));
        self.register_verifier(Box::new(builtin));
    }

    // --- Inbound messages ---

    pub fn handle_round_start(&self, msg: RoundStartMsg) {
        self.inbox.handle_round_start(msg);
    }

    pub fn handle_round_end(&self, msg: RoundEndMsg) {
        self.inbox.handle_round_end(msg);
    }

    pub fn handle_state_update(&self, msg: &StateUpdateMsg) {
        self.inbox.handle_state_update(msg);
    }

    pub fn handle_peer_left(&self, peer: PeerId) {
        self.inbox.handle_peer_left(peer);
    }

    // --- Round control ---

    /// Broadcast a start request and take the same path as every receiver.
    /// Fails if disconnected or a round is already live.
    pub fn start_round(&mut self, settings: RoundSettings, zone_hint: Option<i32>) -> bool {
        if !self.net.is_connected() || self.round.is_some() {
            return false;
        }
        let msg = RoundStartMsg {
            sender: self.net.local_peer(),
            major_version: VERSION_MAJOR,
            minor_version: VERSION_MINOR,
            settings,
            start_zone: zone_hint,
        };
        self.net.broadcast(&NetMessage::RoundStart(msg.clone()));
        self.inbox.handle_round_start(msg);
        true
    }

    /// A lobby start switch was activated: build settings from its arena
    /// option and the local lobby position, then start.
    pub fn start_from_switch(
        &mut self,
        switch_id: i32,
        zone_hint: Option<i32>,
        host: &dyn GameHost,
    ) -> bool {
        let Some(option) = self.config.arena_option(switch_id) else {
            tracing::warn!(switch_id, "No arena option for start switch");
            return false;
        };
        let Some(ses) = host.session() else {
            return false;
        };
        let settings = option.generate_settings(ses, &mut self.rng);
        self.start_round(settings, zone_hint)
    }

    /// Stop the live round without a winner.
    pub fn stop_round(&mut self, host: &mut dyn GameHost) -> bool {
        self.end_round(None, host)
    }

    /// Stop the live round locally; the local peer wins iff its role is
    /// `winning_role`.
    pub fn end_round(&mut self, winning_role: Option<PlayerRole>, host: &mut dyn GameHost) -> bool {
        let Some(round) = &self.round else {
            return false;
        };
        let winner = winning_role == Some(round.local_role());
        self.stop(winner, host);
        true
    }

    /// Console form of [`end_round`](Self::end_round): `0` no winner,
    /// `1` hiders, `2` seekers.
    pub fn end_round_by_code(
        &mut self,
        code: i32,
        host: &mut dyn GameHost,
    ) -> Result<bool, InvalidWinnerCode> {
        let winning_role = debug::parse_winner(code)?;
        Ok(self.end_round(winning_role, host))
    }

    /// A hard win condition was reached locally: tell every peer, then stop.
    pub fn declare_winner(&mut self, role: PlayerRole, host: &mut dyn GameHost) -> bool {
        let Some(round) = self.round.as_ref().filter(|r| r.is_active()) else {
            return false;
        };
        self.net.broadcast(&NetMessage::RoundEnd(RoundEndMsg {
            sender: self.net.local_peer(),
            round_id: round.round_id().clone(),
            winning_role: Some(role),
        }));
        self.end_round(Some(role), host)
    }

    /// Whether anyone, the local peer included, is in round `round_id`.
    pub fn is_round_active(&self, round_id: &RoundId) -> bool {
        self.round.as_ref().is_some_and(|r| r.round_id() == round_id)
            || self
                .net
                .peer_states()
                .iter()
                .any(|(_, state)| &state.round_id == round_id)
    }

    // --- Tick ---

    /// Advance timers and run every action queued before this call.
    /// `dt` is real time, unaffected by the seed-wait slowdown.
    pub fn tick(&mut self, dt: f32, host: &mut dyn GameHost) {
        if let Some(round) = self.round.as_mut() {
            round.update_invincibility(dt, host.is_transitioning(), &self.config);
        }

        let seed_wait = self
            .round
            .as_mut()
            .and_then(|round| round.tick_seed_wait(dt, &self.config));
        match seed_wait {
            Some(SeedWait::Waiting { time_rate }) => host.set_time_rate(time_rate),
            Some(SeedWait::Expired) => {
                host.set_time_rate(1.0);
                self.end_seed_wait(host);
            },
            None => {},
        }

        for action in self.inbox.take() {
            self.run_action(action, host);
        }
    }

    fn run_action(&mut self, action: RoundAction, host: &mut dyn GameHost) {
        match action {
            RoundAction::Start(msg) => self.accept_start(msg, host),
            RoundAction::End(msg) => {
                let Some(round) = self.round.as_ref().filter(|r| *r.round_id() == msg.round_id)
                else {
                    return;
                };
                let winner = msg.winning_role == Some(round.local_role());
                tracing::info!(
                    round_id = %msg.round_id,
                    sender = msg.sender,
                    winning_role = ?msg.winning_role,
                    "Round ended by peer"
                );
                self.stop(winner, host);
            },
            RoundAction::CheckEnd => {
                self.check_round_end(host);
            },
            RoundAction::EnterArena => self.enter_arena(host),
            RoundAction::ReturnToLobby(ret) => {
                if !ret.apply(host) {
                    self.inbox.push(RoundAction::ReturnToLobby(ret));
                }
            },
        }
    }

    fn accept_start(&mut self, msg: RoundStartMsg, host: &mut dyn GameHost) {
        if let Some(round) = &self.round {
            tracing::debug!(round_id = %round.round_id(), "Ignoring round start while in a round");
            return;
        }
        if !self.net.is_connected() {
            return;
        }
        if let Some(zone) = msg.start_zone
            && host.overlapped_start_zone() != Some(zone)
        {
            tracing::info!(sender = msg.sender, zone, "Ignoring round start from another start zone");
            return;
        }
        if !self
            .verifiers
            .iter()
            .any(|v| v.verify(&msg, host.session()))
        {
            tracing::info!(sender = msg.sender, "Ignoring round start the verifiers did not accept");
            return;
        }

        let seed: i32 = self.rng.random();
        let round = RoundLifecycle::new(msg.settings, seed);
        tracing::info!(round_id = %round.round_id(), seed, "Starting round");
        let state = round.local_state();
        self.round = Some(round);
        // Peers need every seed before assigning roles.
        self.broadcast_state(Some(state));
    }

    fn end_seed_wait(&mut self, host: &mut dyn GameHost) {
        let Some(round) = self.round.as_ref() else {
            return;
        };
        let peers = round.peer_states(&self.net);
        let Some(role) = round.assign_from_peers(self.net.local_peer(), &peers) else {
            tracing::info!(round_id = %round.round_id(), "No other participant showed up, aborting round");
            self.round = None;
            self.broadcast_state(None);
            host.kill_avatar();
            return;
        };
        tracing::info!(
            round_id = %round.round_id(),
            seed = round.local_seed(),
            participants = peers.len() + 1,
            %role,
            "Ended seed wait"
        );
        if self.change_role(role, host) {
            self.enter_arena(host);
        }
    }

    /// Apply a role change with its side effects. Returns `false` if the
    /// round ended as a result.
    fn change_role(&mut self, role: PlayerRole, host: &mut dyn GameHost) -> bool {
        let Some(round) = self.round.as_mut() else {
            return false;
        };
        if !round.set_role(role) {
            return true;
        }
        let state = round.local_state();
        self.broadcast_state(Some(state));
        self.sync_round_flags(host);
        !self.check_round_end(host)
    }

    /// Mirror the local role into the session flags.
    fn sync_round_flags(&self, host: &mut dyn GameHost) {
        let Some(round) = &self.round else {
            return;
        };
        if let Some(ses) = host.session_mut() {
            let role = round.local_role();
            ses.set_round_flags(
                round.is_active(),
                role == PlayerRole::Hider,
                role == PlayerRole::Seeker,
            );
        }
    }

    /// Returns `true` if the round ended.
    fn check_round_end(&mut self, host: &mut dyn GameHost) -> bool {
        let Some(round) = self.round.as_mut() else {
            return false;
        };
        let peers = round.peer_states(&self.net);
        match round.check_round_end(&peers) {
            EndCheck::Continue => false,
            EndCheck::Ended { winner } => {
                self.stop(winner, host);
                true
            },
        }
    }

    fn enter_arena(&mut self, host: &mut dyn GameHost) {
        let Some(round) = self.round.as_mut().filter(|r| r.is_active() && !r.in_arena()) else {
            return;
        };
        if round.enter_arena(host, &self.config.snapshot) {
            self.sync_round_flags(host);
        } else {
            tracing::debug!(round_id = %round.round_id(), "No session, deferring arena entry");
            self.inbox.push(RoundAction::EnterArena);
        }
    }

    fn stop(&mut self, winner: bool, host: &mut dyn GameHost) {
        let Some(round) = self.round.take() else {
            return;
        };
        if round.in_seed_wait() {
            host.set_time_rate(1.0);
        }
        self.broadcast_state(None);
        match round.stop(winner, &self.config) {
            Some(ret) => {
                if !ret.apply(host) {
                    tracing::debug!(round_id = %ret.round_id, "No session, deferring lobby return");
                    self.inbox.push(RoundAction::ReturnToLobby(Box::new(ret)));
                }
            },
            None => {
                if let Some(ses) = host.session_mut() {
                    ses.set_round_flags(false, false, false);
                }
            },
        }
    }

    fn broadcast_state(&self, state: Option<PlayerState>) {
        self.net
            .broadcast(&NetMessage::StateUpdate(StateUpdateMsg {
                sender: self.net.local_peer(),
                state,
            }));
    }

    // --- Avatar and scene hooks ---

    /// The local avatar was (re)created. Grants respawn invincibility and,
    /// on the first arena spawn, returns where to place the avatar.
    pub fn on_avatar_loaded(
        &mut self,
        host: &mut dyn GameHost,
        spawns: &dyn ArenaSpawns,
    ) -> Option<Vec2> {
        let round = self.round.as_mut()?;
        round.grant_invincibility(self.config.respawn_invincibility_secs);
        if !round.claim_arena_spawn() {
            return None;
        }
        let pos = spawn_for(round, spawns);
        if let Some(ses) = host.session_mut() {
            ses.respawn_point = Some(pos);
        }
        Some(pos)
    }

    /// Arena spawn point for the local role, or `None` outside an active round.
    pub fn resolve_spawn(&self, spawns: &dyn ArenaSpawns) -> Option<Vec2> {
        self.round
            .as_ref()
            .filter(|r| r.is_active())
            .map(|r| spawn_for(r, spawns))
    }

    pub fn on_avatar_contact(&mut self, peer: PeerId, host: &mut dyn GameHost) -> ContactOutcome {
        let Some(round) = self.round.as_mut() else {
            return ContactOutcome::Default;
        };
        let remote = self.net.peer_state(peer);
        let outcome = collision::resolve_contact(round, remote.as_ref(), host.is_transitioning());
        if outcome == ContactOutcome::Tagged {
            tracing::info!(round_id = %round.round_id(), seeker = peer, "Tagged");
            round.mark_tag_pending();
            host.kill_avatar();
        }
        outcome
    }

    /// The local avatar's death finished playing out.
    pub fn on_avatar_death(&mut self, host: &mut dyn GameHost) {
        if self.round.as_ref().is_some_and(collision::death_flips_role) {
            self.change_role(PlayerRole::Seeker, host);
        }
    }

    pub fn can_pick_up(&self, peer: PeerId) -> bool {
        collision::pickup_allowed(self.round.as_ref(), self.net.peer_state(peer).as_ref())
    }

    pub fn show_name_tag(&self, peer: PeerId) -> bool {
        collision::name_tag_visible(self.round.as_ref(), self.net.peer_state(peer).as_ref())
    }

    pub fn avatar_appearance(&self) -> AvatarAppearance {
        collision::appearance(self.round.as_ref())
    }

    pub fn save_quit_allowed(&self) -> bool {
        self.round.is_none()
    }

    /// Leaving the level ends the round without a winner.
    pub fn on_level_exit(&mut self, host: &mut dyn GameHost) {
        if self.stop_round(host) {
            tracing::info!("Left the level, round ended");
        }
    }

    pub fn on_disconnected(&mut self, host: &mut dyn GameHost) {
        if self.stop_round(host) {
            tracing::info!("Disconnected, round ended");
        }
    }

    pub fn debug_state(&self, host: &dyn GameHost) -> DebugState {
        DebugState {
            protocol_version: format!("{VERSION_MAJOR}.{VERSION_MINOR}"),
            local_peer: self.net.local_peer(),
            connected: self.net.is_connected(),
            pending_actions: self.inbox.pending(),
            round: self.round.as_ref().map(|round| RoundDebug {
                round_id: round.round_id().to_string(),
                seed: round.local_seed(),
                role: round.local_role(),
                is_likely_winner: round.is_likely_winner(),
                skip_end_check: round.skip_end_check(),
                invincibility: round.invincibility_timer().max(0.0),
                in_arena: round.in_arena(),
                spawned_in_arena: round.spawned_in_arena(),
                peers: round
                    .peer_states(&self.net)
                    .into_iter()
                    .map(|(peer, state)| PeerDebug {
                        peer,
                        seed: state.seed,
                        role: state.role,
                    })
                    .collect(),
            }),
            won_last_round: host.session().map(|ses| ses.won_last_round),
        }
    }
}

fn spawn_for(round: &RoundLifecycle, spawns: &dyn ArenaSpawns) -> Vec2 {
    let index = round.settings().spawn_index;
    spawns
        .spawn_point(round.local_role(), index)
        .unwrap_or_else(|| {
            tracing::warn!(
                round_id = %round.round_id(),
                index,
                role = %round.local_role(),
                "Missing spawn point, using the arena default"
            );
            spawns.default_spawn_point()
        })
}
