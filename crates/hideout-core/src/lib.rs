pub mod arena_option;
pub mod config;
pub mod host;
pub mod net;
pub mod peer_table;
pub mod role;
pub mod session;
pub mod settings;
pub mod snapshot;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::{Arc, Mutex, PoisonError};

    use crate::host::{ArenaSpawns, GameHost, PeerNetwork, PeerStateTable};
    use crate::net::messages::NetMessage;
    use crate::net::protocol::encode_message;
    use crate::peer_table::PeerTable;
    use crate::role::{PeerId, PlayerRole, PlayerState};
    use crate::session::Session;
    use crate::settings::{AreaKey, AreaMode, RoundSettings, Vec2};

    pub const LOBBY_SID: &str = "Hideout/Lobby";
    pub const LOBBY_LEVEL: &str = "lobby";
    pub const ARENA_SID: &str = "Hideout/Arena";
    pub const ARENA_LEVEL: &str = "arena-a";

    /// Settings for a one-seeker tag-mode round from the test lobby.
    pub fn make_settings() -> RoundSettings {
        RoundSettings {
            lobby_area: AreaKey::new(LOBBY_SID, AreaMode::Normal),
            lobby_level: LOBBY_LEVEL.to_string(),
            lobby_spawn_point: Vec2::new(16.0, 48.0),
            arena_area: AreaKey::new(ARENA_SID, AreaMode::Normal),
            spawn_level: ARENA_LEVEL.to_string(),
            spawn_index: 0,
            initial_seekers: 1,
            tag_mode: true,
            golden_mode: false,
            hide_names: true,
        }
    }

    /// A session standing in the test lobby.
    pub fn lobby_session() -> Session {
        let mut ses = Session::new(AreaKey::new(LOBBY_SID, AreaMode::Normal), LOBBY_LEVEL);
        ses.respawn_point = Some(Vec2::new(16.0, 48.0));
        ses
    }

    /// Shorthand for a peer state in the given round.
    pub fn make_state(settings: &RoundSettings, seed: i32, role: PlayerRole) -> PlayerState {
        PlayerState {
            round_id: settings.round_id(),
            seed,
            role,
        }
    }

    /// Records every side effect requested by round logic.
    #[derive(Debug)]
    pub struct MockHost {
        pub session: Option<Session>,
        pub transitioning: bool,
        pub start_zone: Option<i32>,
        pub time_rate: f32,
        pub time_rates: Vec<f32>,
        pub loads: Vec<(AreaKey, String, Option<Vec2>)>,
        pub kills: usize,
        pub spawns: HashMap<(PlayerRole, u8), Vec2>,
        pub default_spawn: Vec2,
    }

    impl Default for MockHost {
        fn default() -> Self {
            Self {
                session: Some(lobby_session()),
                transitioning: false,
                start_zone: None,
                time_rate: 1.0,
                time_rates: Vec::new(),
                loads: Vec::new(),
                kills: 0,
                spawns: HashMap::new(),
                default_spawn: Vec2::ZERO,
            }
        }
    }

    impl MockHost {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn session_ref(&self) -> &Session {
            self.session.as_ref().expect("mock host has no session")
        }

        pub fn last_load(&self) -> Option<&(AreaKey, String, Option<Vec2>)> {
            self.loads.last()
        }
    }

    impl GameHost for MockHost {
        fn session(&self) -> Option<&Session> {
            self.session.as_ref()
        }

        fn session_mut(&mut self) -> Option<&mut Session> {
            self.session.as_mut()
        }

        /// Loads complete instantly.
        fn load_level(&mut self, area: &AreaKey, level: &str, spawn: Option<Vec2>) {
            self.loads.push((area.clone(), level.to_string(), spawn));
            if let Some(ses) = self.session.as_mut() {
                ses.area = area.clone();
                ses.level = level.to_string();
                ses.respawn_point = spawn;
            }
        }

        fn set_time_rate(&mut self, rate: f32) {
            self.time_rate = rate;
            self.time_rates.push(rate);
        }

        fn kill_avatar(&mut self) {
            self.kills += 1;
        }

        fn is_transitioning(&self) -> bool {
            self.transitioning
        }

        fn overlapped_start_zone(&self) -> Option<i32> {
            self.start_zone
        }
    }

    impl ArenaSpawns for MockHost {
        fn spawn_point(&self, role: PlayerRole, index: u8) -> Option<Vec2> {
            self.spawns.get(&(role, index)).copied()
        }

        fn default_spawn_point(&self) -> Vec2 {
            self.default_spawn
        }
    }

    /// Something delivered to a loopback peer.
    #[derive(Debug, Clone, PartialEq)]
    pub enum LoopbackEvent {
        /// Encoded wire message.
        Message(Vec<u8>),
        PeerLeft(PeerId),
    }

    #[derive(Debug)]
    struct Endpoint {
        table: PeerTable,
        inbox: Vec<LoopbackEvent>,
    }

    #[derive(Debug, Default)]
    struct HubInner {
        peers: BTreeMap<PeerId, Endpoint>,
        duplicate: bool,
    }

    /// In-process messaging layer. Broadcasts are encoded to wire bytes and
    /// queued on every other peer; state updates also land in their tables.
    #[derive(Debug, Clone, Default)]
    pub struct LoopbackHub {
        inner: Arc<Mutex<HubInner>>,
    }

    impl LoopbackHub {
        pub fn new() -> Self {
            Self::default()
        }

        /// Deliver every message twice, modelling at-least-once transport.
        pub fn set_duplicate_delivery(&self, duplicate: bool) {
            self.lock().duplicate = duplicate;
        }

        /// Connect a new peer and make it known to everyone already connected.
        pub fn join(&self, id: PeerId) -> LoopbackNet {
            let table = PeerTable::new(id);
            let mut inner = self.lock();
            for (&other, endpoint) in &inner.peers {
                endpoint.table.add_peer(id);
                table.add_peer(other);
            }
            inner.peers.insert(
                id,
                Endpoint {
                    table: table.clone(),
                    inbox: Vec::new(),
                },
            );
            LoopbackNet {
                id,
                hub: self.clone(),
                table,
            }
        }

        /// Disconnect a peer. Everyone else drops its state and is told it left.
        pub fn leave(&self, id: PeerId) {
            let mut inner = self.lock();
            inner.peers.remove(&id);
            for endpoint in inner.peers.values_mut() {
                endpoint.table.remove_peer(id);
                endpoint.inbox.push(LoopbackEvent::PeerLeft(id));
            }
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, HubInner> {
            self.inner.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// One peer's view of a [`LoopbackHub`].
    #[derive(Debug, Clone)]
    pub struct LoopbackNet {
        id: PeerId,
        hub: LoopbackHub,
        table: PeerTable,
    }

    impl LoopbackNet {
        pub fn id(&self) -> PeerId {
            self.id
        }

        pub fn table(&self) -> &PeerTable {
            &self.table
        }

        /// Take everything delivered to this peer since the last drain.
        pub fn drain(&self) -> Vec<LoopbackEvent> {
            let mut inner = self.hub.lock();
            match inner.peers.get_mut(&self.id) {
                Some(endpoint) => std::mem::take(&mut endpoint.inbox),
                None => Vec::new(),
            }
        }
    }

    impl PeerStateTable for LoopbackNet {
        fn local_peer(&self) -> PeerId {
            self.id
        }

        fn known_peers(&self) -> Vec<PeerId> {
            self.table.known_peers()
        }

        fn peer_state(&self, peer: PeerId) -> Option<PlayerState> {
            self.table.peer_state(peer)
        }
    }

    impl PeerNetwork for LoopbackNet {
        fn is_connected(&self) -> bool {
            self.hub.lock().peers.contains_key(&self.id)
        }

        fn broadcast(&self, msg: &NetMessage) {
            let bytes = match encode_message(msg) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("Loopback broadcast failed: {e}");
                    return;
                },
            };
            let mut inner = self.hub.lock();
            let copies = if inner.duplicate { 2 } else { 1 };
            for (&peer, endpoint) in inner.peers.iter_mut() {
                if peer == self.id {
                    continue;
                }
                if let NetMessage::StateUpdate(update) = msg {
                    endpoint.table.record(update);
                }
                for _ in 0..copies {
                    endpoint.inbox.push(LoopbackEvent::Message(bytes.clone()));
                }
            }
        }
    }

}
