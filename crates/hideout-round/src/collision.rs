//! Round-aware answers to questions the physics and rendering layers ask
//! about the local avatar and remote avatars.

use hideout_core::role::{PlayerRole, PlayerState};

use crate::lifecycle::RoundLifecycle;

/// How a contact between the local avatar and a remote avatar is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    /// Not a round matter; the host applies its normal contact handling.
    Default,
    /// Participants of different roles pass through each other.
    Suppress,
    /// The local hider was caught. The avatar dies and becomes a seeker.
    Tagged,
}

/// Which sprite set the local avatar should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarAppearance {
    Default,
    Hider,
    Seeker,
}

/// Resolve a contact with a remote avatar whose latest state is `remote`.
pub fn resolve_contact(
    round: &RoundLifecycle,
    remote: Option<&PlayerState>,
    transitioning: bool,
) -> ContactOutcome {
    let Some(remote) = remote.filter(|s| &s.round_id == round.round_id()) else {
        return ContactOutcome::Default;
    };
    if !round.settings().tag_mode {
        return ContactOutcome::Default;
    }

    let local = round.local_role();
    if local == remote.role {
        return ContactOutcome::Default;
    }
    if local == PlayerRole::Hider
        && remote.role == PlayerRole::Seeker
        && !round.is_invincible()
        && !transitioning
        && !round.tag_pending()
    {
        return ContactOutcome::Tagged;
    }
    ContactOutcome::Suppress
}

/// Whether a completed local death turns the local hider into a seeker.
pub fn death_flips_role(round: &RoundLifecycle) -> bool {
    round.local_role() == PlayerRole::Hider && (round.tag_pending() || round.settings().golden_mode)
}

/// Pickups and carrying are blocked between participants of different roles
/// while tag-mode is on.
pub fn pickup_allowed(round: Option<&RoundLifecycle>, remote: Option<&PlayerState>) -> bool {
    let Some(round) = round else {
        return true;
    };
    if !round.settings().tag_mode {
        return true;
    }
    match remote {
        Some(state) if &state.round_id == round.round_id() => state.role == round.local_role(),
        _ => true,
    }
}

/// With `hide_names`, remote participants of the other role have no name tag.
pub fn name_tag_visible(round: Option<&RoundLifecycle>, remote: Option<&PlayerState>) -> bool {
    let Some(round) = round.filter(|r| r.is_active() && r.settings().hide_names) else {
        return true;
    };
    match remote {
        Some(state) if &state.round_id == round.round_id() && state.role.is_assigned() => {
            state.role == round.local_role()
        },
        _ => true,
    }
}

pub fn appearance(round: Option<&RoundLifecycle>) -> AvatarAppearance {
    match round.map(RoundLifecycle::local_role) {
        Some(PlayerRole::Hider) => AvatarAppearance::Hider,
        Some(PlayerRole::Seeker) => AvatarAppearance::Seeker,
        _ => AvatarAppearance::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hideout_core::config::RoundConfig;
    use hideout_core::settings::{AreaKey, RoundSettings};
    use hideout_core::test_helpers::{make_settings, make_state};

    fn round_as(role: PlayerRole, settings: RoundSettings) -> RoundLifecycle {
        let mut round = RoundLifecycle::new(settings, 0);
        round.set_role(role);
        round
    }

    fn remote(role: PlayerRole) -> PlayerState {
        make_state(&make_settings(), 9, role)
    }

    fn other_round(role: PlayerRole) -> PlayerState {
        let settings = RoundSettings {
            arena_area: AreaKey::parse("Elsewhere"),
            ..make_settings()
        };
        make_state(&settings, 9, role)
    }

    #[test]
    fn hider_touched_by_seeker_is_tagged() {
        let round = round_as(PlayerRole::Hider, make_settings());
        assert_eq!(
            resolve_contact(&round, Some(&remote(PlayerRole::Seeker)), false),
            ContactOutcome::Tagged
        );
    }

    #[test]
    fn invincibility_and_transitions_suppress_tag() {
        let mut round = round_as(PlayerRole::Hider, make_settings());
        let seeker = remote(PlayerRole::Seeker);
        assert_eq!(
            resolve_contact(&round, Some(&seeker), true),
            ContactOutcome::Suppress
        );
        round.grant_invincibility(RoundConfig::default().respawn_invincibility_secs);
        assert_eq!(
            resolve_contact(&round, Some(&seeker), false),
            ContactOutcome::Suppress
        );
    }

    #[test]
    fn tag_only_once_until_death() {
        let mut round = round_as(PlayerRole::Hider, make_settings());
        round.mark_tag_pending();
        assert_eq!(
            resolve_contact(&round, Some(&remote(PlayerRole::Seeker)), false),
            ContactOutcome::Suppress
        );
        assert!(death_flips_role(&round));
    }

    #[test]
    fn seeker_touching_hider_is_not_tagged() {
        let round = round_as(PlayerRole::Seeker, make_settings());
        assert_eq!(
            resolve_contact(&round, Some(&remote(PlayerRole::Hider)), false),
            ContactOutcome::Suppress
        );
    }

    #[test]
    fn equal_roles_never_flip() {
        for role in [PlayerRole::Hider, PlayerRole::Seeker] {
            let round = round_as(role, make_settings());
            assert_eq!(
                resolve_contact(&round, Some(&remote(role)), false),
                ContactOutcome::Default
            );
        }
    }

    #[test]
    fn other_rounds_and_absent_states_use_default() {
        let round = round_as(PlayerRole::Hider, make_settings());
        assert_eq!(resolve_contact(&round, None, false), ContactOutcome::Default);
        assert_eq!(
            resolve_contact(&round, Some(&other_round(PlayerRole::Seeker)), false),
            ContactOutcome::Default
        );
    }

    #[test]
    fn without_tag_mode_contacts_are_default() {
        let settings = RoundSettings {
            tag_mode: false,
            ..make_settings()
        };
        let round = round_as(PlayerRole::Hider, settings);
        assert_eq!(
            resolve_contact(&round, Some(&remote(PlayerRole::Seeker)), false),
            ContactOutcome::Default
        );
        assert!(pickup_allowed(Some(&round), Some(&remote(PlayerRole::Seeker))));
    }

    #[test]
    fn golden_mode_death_flips_hiders_only() {
        let settings = RoundSettings {
            golden_mode: true,
            ..make_settings()
        };
        assert!(death_flips_role(&round_as(PlayerRole::Hider, settings.clone())));
        assert!(!death_flips_role(&round_as(PlayerRole::Seeker, settings)));
        assert!(!death_flips_role(&round_as(PlayerRole::Hider, make_settings())));
    }

    #[test]
    fn pickups_blocked_between_roles() {
        let round = round_as(PlayerRole::Hider, make_settings());
        assert!(!pickup_allowed(Some(&round), Some(&remote(PlayerRole::Seeker))));
        assert!(pickup_allowed(Some(&round), Some(&remote(PlayerRole::Hider))));
        assert!(pickup_allowed(Some(&round), Some(&other_round(PlayerRole::Seeker))));
        assert!(pickup_allowed(Some(&round), None));
        assert!(pickup_allowed(None, Some(&remote(PlayerRole::Seeker))));
    }

    #[test]
    fn name_tags_hidden_for_other_role() {
        let round = round_as(PlayerRole::Seeker, make_settings());
        assert!(!name_tag_visible(Some(&round), Some(&remote(PlayerRole::Hider))));
        assert!(name_tag_visible(Some(&round), Some(&remote(PlayerRole::Seeker))));
        assert!(name_tag_visible(Some(&round), Some(&remote(PlayerRole::SeedWait))));
        assert!(name_tag_visible(None, Some(&remote(PlayerRole::Hider))));

        let shown = RoundSettings {
            hide_names: false,
            ..make_settings()
        };
        let round = round_as(PlayerRole::Seeker, shown);
        assert!(name_tag_visible(Some(&round), Some(&remote(PlayerRole::Hider))));
    }

    #[test]
    fn appearance_follows_role() {
        assert_eq!(appearance(None), AvatarAppearance::Default);
        assert_eq!(
            appearance(Some(&RoundLifecycle::new(make_settings(), 0))),
            AvatarAppearance::Default
        );
        assert_eq!(
            appearance(Some(&round_as(PlayerRole::Seeker, make_settings()))),
            AvatarAppearance::Seeker
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn any_role() -> impl Strategy<Value = PlayerRole> {
            prop_oneof![
                Just(PlayerRole::SeedWait),
                Just(PlayerRole::Hider),
                Just(PlayerRole::Seeker),
            ]
        }

        proptest! {
            #[test]
            fn only_hider_touched_by_seeker_is_tagged(
                local in any_role(),
                other in any_role(),
                tag_mode in proptest::bool::ANY,
                golden_mode in proptest::bool::ANY,
                invincible in proptest::bool::ANY,
                transitioning in proptest::bool::ANY,
                pending in proptest::bool::ANY,
            ) {
                let settings = RoundSettings {
                    tag_mode,
                    golden_mode,
                    ..make_settings()
                };
                let mut round = round_as(local, settings);
                if invincible {
                    round.grant_invincibility(1.0);
                }
                if pending {
                    round.mark_tag_pending();
                }
                let outcome = resolve_contact(&round, Some(&remote(other)), transitioning);

                if local == other {
                    prop_assert_eq!(outcome, ContactOutcome::Default);
                }
                if outcome == ContactOutcome::Tagged {
                    prop_assert_eq!(local, PlayerRole::Hider);
                    prop_assert_eq!(other, PlayerRole::Seeker);
                    prop_assert!(tag_mode && !invincible && !transitioning && !pending);
                }
            }
        }
    }
}
