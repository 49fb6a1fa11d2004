use std::fmt;

use serde::Serialize;

use hideout_core::role::{PeerId, PlayerRole};

/// Point-in-time dump of the coordinator, for console commands and bug reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugState {
    pub protocol_version: String,
    pub local_peer: PeerId,
    pub connected: bool,
    pub pending_actions: usize,
    pub round: Option<RoundDebug>,
    /// `None` when the host has no session loaded.
    pub won_last_round: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundDebug {
    pub round_id: String,
    pub seed: i32,
    pub role: PlayerRole,
    pub is_likely_winner: bool,
    pub skip_end_check: bool,
    pub invincibility: f32,
    pub in_arena: bool,
    pub spawned_in_arena: bool,
    pub peers: Vec<PeerDebug>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerDebug {
    pub peer: PeerId,
    pub seed: i32,
    pub role: PlayerRole,
}

impl DebugState {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for DebugState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "protocol version: {}", self.protocol_version)?;
        writeln!(f, "peer: {} (connected: {})", self.local_peer, self.connected)?;
        writeln!(f, "pending actions: {}", self.pending_actions)?;
        writeln!(f, "round:")?;
        match &self.round {
            Some(round) => {
                writeln!(f, "  id: {}", round.round_id)?;
                writeln!(f, "  seed: {}", round.seed)?;
                writeln!(f, "  role: {}", round.role)?;
                writeln!(f, "  is likely winner: {}", round.is_likely_winner)?;
                writeln!(f, "  skip end check: {}", round.skip_end_check)?;
                writeln!(f, "  invincibility: {:.2}", round.invincibility)?;
                writeln!(f, "  in arena: {}", round.in_arena)?;
                for peer in &round.peers {
                    writeln!(f, "  peer {}: {} (seed {})", peer.peer, peer.role, peer.seed)?;
                }
            },
            None => writeln!(f, "  no round")?,
        }
        match self.won_last_round {
            Some(won) => write!(f, "won last round: {won}"),
            None => write!(f, "no session"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidWinnerCode(pub i32);

impl fmt::Display for InvalidWinnerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid winner {}: expected 0 (no winner), 1 (hiders) or 2 (seekers)",
            self.0
        )
    }
}

impl std::error::Error for InvalidWinnerCode {}

/// Parse the console end-round argument.
pub fn parse_winner(code: i32) -> Result<Option<PlayerRole>, InvalidWinnerCode> {
    match code {
        0 => Ok(None),
        1 => Ok(Some(PlayerRole::Hider)),
        2 => Ok(Some(PlayerRole::Seeker)),
        _ => Err(InvalidWinnerCode(code)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DebugState {
        DebugState {
            protocol_version: "0.1".to_string(),
            local_peer: 3,
            connected: true,
            pending_actions: 1,
            round: Some(RoundDebug {
                round_id: "Hideout/Arena#Normal#arena-a#0.1".to_string(),
                seed: -12,
                role: PlayerRole::Hider,
                is_likely_winner: false,
                skip_end_check: true,
                invincibility: 0.5,
                in_arena: true,
                spawned_in_arena: false,
                peers: vec![PeerDebug {
                    peer: 4,
                    seed: 7,
                    role: PlayerRole::Seeker,
                }],
            }),
            won_last_round: Some(false),
        }
    }

    #[test]
    fn json_dump_contains_round() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["round"]["seed"], -12);
        assert_eq!(json["round"]["role"], "Hider");
        assert_eq!(json["round"]["peers"][0]["peer"], 4);
        assert_eq!(json["won_last_round"], false);
    }

    #[test]
    fn text_dump() {
        let text = sample().to_string();
        assert!(text.contains("role: hider"));
        assert!(text.contains("peer 4: seeker (seed 7)"));

        let idle = DebugState {
            round: None,
            won_last_round: None,
            ..sample()
        };
        let text = idle.to_string();
        assert!(text.contains("no round"));
        assert!(text.ends_with("no session"));
    }

    #[test]
    fn winner_codes() {
        assert_eq!(parse_winner(0), Ok(None));
        assert_eq!(parse_winner(1), Ok(Some(PlayerRole::Hider)));
        assert_eq!(parse_winner(2), Ok(Some(PlayerRole::Seeker)));
        assert_eq!(parse_winner(3), Err(InvalidWinnerCode(3)));
        assert!(InvalidWinnerCode(-1).to_string().contains("-1"));
    }
}
