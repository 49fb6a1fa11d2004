use hideout_core::arena_option::ArenaOption;
use hideout_core::net::messages::RoundStartMsg;
use hideout_core::session::Session;

/// Local check of an untrusted start request. A request is accepted when at
/// least one registered verifier approves it.
pub trait RoundStartVerifier: Send {
    fn verify(&self, msg: &RoundStartMsg, session: Option<&Session>) -> bool;
}

impl<F> RoundStartVerifier for F
where
    F: Fn(&RoundStartMsg, Option<&Session>) -> bool + Send,
{
    fn verify(&self, msg: &RoundStartMsg, session: Option<&Session>) -> bool {
        self(msg, session)
    }
}

/// Approves requests whose lobby is the level the local player stands in.
#[derive(Debug, Clone, Copy, Default)]
pub struct LobbyLocationVerifier;

impl RoundStartVerifier for LobbyLocationVerifier {
    fn verify(&self, msg: &RoundStartMsg, session: Option<&Session>) -> bool {
        session.is_some_and(|ses| {
            ses.area == msg.settings.lobby_area && ses.level == msg.settings.lobby_level
        })
    }
}

/// Approves requests that one of the locally known arena options could have produced.
#[derive(Debug, Clone, Default)]
pub struct ArenaOptionVerifier {
    options: Vec<ArenaOption>,
}

impl ArenaOptionVerifier {
    pub fn new(options: Vec<ArenaOption>) -> Self {
        Self { options }
    }
}

impl RoundStartVerifier for ArenaOptionVerifier {
    fn verify(&self, msg: &RoundStartMsg, _session: Option<&Session>) -> bool {
        self.options.iter().any(|opt| opt.matches(&msg.settings))
    }
}

/// Approves only if every inner verifier does.
#[derive(Default)]
pub struct AllOf {
    verifiers: Vec<Box<dyn RoundStartVerifier>>,
}

impl AllOf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, verifier: impl RoundStartVerifier + 'static) -> Self {
        self.verifiers.push(Box::new(verifier));
        self
    }
}

impl RoundStartVerifier for AllOf {
    fn verify(&self, msg: &RoundStartMsg, session: Option<&Session>) -> bool {
        !self.verifiers.is_empty() && self.verifiers.iter().all(|v| v.verify(msg, session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hideout_core::settings::{AreaKey, RoundSettings, VERSION_MAJOR, VERSION_MINOR};
    use hideout_core::test_helpers::{ARENA_LEVEL, ARENA_SID, lobby_session, make_settings};

    fn start(settings: RoundSettings) -> RoundStartMsg {
        RoundStartMsg {
            sender: 2,
            major_version: VERSION_MAJOR,
            minor_version: VERSION_MINOR,
            settings,
            start_zone: None,
        }
    }

    fn known_option() -> ArenaOption {
        ArenaOption {
            switch_id: 1,
            arena_area: ARENA_SID.to_string(),
            spawn_level: ARENA_LEVEL.to_string(),
            ..ArenaOption::default()
        }
    }

    #[test]
    fn lobby_location_requires_matching_session() {
        let ses = lobby_session();
        let msg = start(make_settings());
        assert!(LobbyLocationVerifier.verify(&msg, Some(&ses)));
        assert!(!LobbyLocationVerifier.verify(&msg, None));

        let elsewhere = start(RoundSettings {
            lobby_area: AreaKey::parse("Other/Lobby"),
            ..make_settings()
        });
        assert!(!LobbyLocationVerifier.verify(&elsewhere, Some(&ses)));
    }

    #[test]
    fn arena_option_must_match() {
        let verifier = ArenaOptionVerifier::new(vec![known_option()]);
        assert!(verifier.verify(&start(make_settings()), None));

        let forged = start(RoundSettings {
            spawn_level: "goal-room".to_string(),
            ..make_settings()
        });
        assert!(!verifier.verify(&forged, None));
        assert!(!ArenaOptionVerifier::default().verify(&start(make_settings()), None));
    }

    #[test]
    fn closures_are_verifiers() {
        let only_seeker_rounds =
            |msg: &RoundStartMsg, _: Option<&Session>| msg.settings.initial_seekers > 0;
        assert!(only_seeker_rounds.verify(&start(make_settings()), None));
    }

    #[test]
    fn all_of_requires_every_verifier() {
        let both = AllOf::new()
            .with(LobbyLocationVerifier)
            .with(ArenaOptionVerifier::new(vec![known_option()]));
        let ses = lobby_session();
        assert!(both.verify(&start(make_settings()), Some(&ses)));
        assert!(!both.verify(&start(make_settings()), None));
        assert!(!AllOf::new().verify(&start(make_settings()), Some(&ses)));
    }
}
