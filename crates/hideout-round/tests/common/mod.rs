use rand::SeedableRng;
use rand::rngs::StdRng;

use hideout_core::arena_option::ArenaOption;
use hideout_core::config::RoundConfig;
use hideout_core::role::{PeerId, PlayerRole};
use hideout_core::settings::{AreaMode, RoundSettings};
use hideout_core::test_helpers::{LoopbackEvent, LoopbackHub, LoopbackNet, MockHost, make_settings};

use hideout_round::RoundCoordinator;

/// Simulated frame time.
pub const DT: f32 = 0.05;

/// One simulated client: a coordinator on a loopback network plus its host.
pub struct TestPeer {
    pub id: PeerId,
    pub coord: RoundCoordinator<LoopbackNet>,
    pub host: MockHost,
}

impl TestPeer {
    /// Hand everything the network delivered to the coordinator's inbox.
    pub fn pump(&mut self) {
        let inbox = self.coord.inbox();
        for event in self.coord.network().drain() {
            match event {
                LoopbackEvent::Message(bytes) => inbox.handle_bytes(&bytes),
                LoopbackEvent::PeerLeft(peer) => inbox.handle_peer_left(peer),
            }
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.pump();
        self.coord.tick(dt, &mut self.host);
    }

    pub fn role(&self) -> Option<PlayerRole> {
        self.coord.local_role()
    }

    pub fn in_round(&self) -> bool {
        self.coord.round().is_some()
    }
}

/// Arena option that approves exactly `settings`.
pub fn option_for(settings: &RoundSettings) -> ArenaOption {
    let side = match settings.arena_area.mode {
        AreaMode::Normal => "a",
        AreaMode::BSide => "b",
        AreaMode::CSide => "c",
    };
    ArenaOption {
        switch_id: 1,
        arena_area: format!("{}#{side}", settings.arena_area.sid),
        spawn_level: settings.spawn_level.clone(),
        spawn_index: i32::from(settings.spawn_index),
        initial_seekers: settings.initial_seekers,
        tag_mode: settings.tag_mode,
        golden_mode: settings.golden_mode,
        hide_names: settings.hide_names,
    }
}

/// A lobby of peers `1..=n` connected through one loopback hub.
pub struct TestLobby {
    pub hub: LoopbackHub,
    pub peers: Vec<TestPeer>,
    pub settings: RoundSettings,
}

impl TestLobby {
    pub fn new(n: u32) -> Self {
        Self::with_settings(n, make_settings())
    }

    /// Every peer accepts rounds started with `settings` from the test lobby.
    pub fn with_settings(n: u32, settings: RoundSettings) -> Self {
        let mut lobby = Self::unverified(n, settings);
        for peer in &mut lobby.peers {
            peer.coord.register_builtin_verifiers();
        }
        lobby
    }

    /// Peers with no start verifiers registered.
    pub fn unverified(n: u32, settings: RoundSettings) -> Self {
        let config = RoundConfig {
            arena_options: vec![option_for(&settings)],
            ..RoundConfig::default()
        };
        let hub = LoopbackHub::new();
        let peers = (1..=n)
            .map(|id| {
                let net = hub.join(id);
                let coord = RoundCoordinator::with_rng(
                    net,
                    config.clone(),
                    StdRng::seed_from_u64(u64::from(id) * 7919),
                );
                TestPeer {
                    id,
                    coord,
                    host: MockHost::new(),
                }
            })
            .collect();
        Self {
            hub,
            peers,
            settings,
        }
    }

    pub fn peer(&self, id: PeerId) -> &TestPeer {
        self.peers
            .iter()
            .find(|p| p.id == id)
            .expect("unknown peer")
    }

    pub fn peer_mut(&mut self, id: PeerId) -> &mut TestPeer {
        self.peers
            .iter_mut()
            .find(|p| p.id == id)
            .expect("unknown peer")
    }

    pub fn start(&mut self, initiator: PeerId) -> bool {
        let settings = self.settings.clone();
        self.peer_mut(initiator).coord.start_round(settings, None)
    }

    pub fn tick_all(&mut self) {
        for peer in &mut self.peers {
            peer.tick(DT);
        }
    }

    pub fn run(&mut self, secs: f32) {
        let ticks = (secs / DT).ceil() as usize;
        for _ in 0..ticks {
            self.tick_all();
        }
    }

    /// Start a round from peer 1 and run until seed-wait is over everywhere.
    pub fn start_and_assign(&mut self) {
        assert!(self.start(1));
        self.run(1.5);
    }

    /// Ids of peers currently holding `role`.
    pub fn with_role(&self, role: PlayerRole) -> Vec<PeerId> {
        self.peers
            .iter()
            .filter(|p| p.role() == Some(role))
            .map(|p| p.id)
            .collect()
    }

    pub fn only(&self, role: PlayerRole) -> PeerId {
        let ids = self.with_role(role);
        assert_eq!(ids.len(), 1, "expected exactly one {role}, got {ids:?}");
        ids[0]
    }
}
