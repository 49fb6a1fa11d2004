//! Wire framing: a type byte followed by a MessagePack payload. Struct field
//! order is the wire contract; integer width is not, MessagePack picks the
//! smallest encoding that fits the value.

use serde::{Deserialize, Serialize};

use super::messages::{MessageType, NetMessage, RoundEndMsg, RoundStartMsg, StateUpdateMsg};

/// Maximum message size in bytes, including the type prefix.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024; // 16 KiB

#[derive(Debug)]
pub enum ProtocolError {
    EmptyMessage,
    UnknownMessageType(u8),
    PayloadTooLarge(usize),
    SerializeError(String),
    DeserializeError(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "empty message"),
            Self::UnknownMessageType(b) => write!(f, "unknown message type: 0x{b:02x}"),
            Self::PayloadTooLarge(size) => {
                write!(
                    f,
                    "payload too large: {size} bytes (max {MAX_MESSAGE_SIZE})"
                )
            },
            Self::SerializeError(e) => write!(f, "serialize error: {e}"),
            Self::DeserializeError(e) => write!(f, "deserialize error: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Encode a payload with a 1-byte type prefix. Structs are written
/// positionally, so field order is part of the wire contract.
pub fn encode_payload<T: Serialize>(
    msg_type: MessageType,
    payload: &T,
) -> Result<Vec<u8>, ProtocolError> {
    let payload_bytes =
        rmp_serde::to_vec(payload).map_err(|e| ProtocolError::SerializeError(e.to_string()))?;
    let total = 1 + payload_bytes.len();
    if total > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(total));
    }
    let mut buf = Vec::with_capacity(total);
    buf.push(msg_type as u8);
    buf.extend_from_slice(&payload_bytes);
    Ok(buf)
}

/// Encode a [`NetMessage`] to wire format.
pub fn encode_message(msg: &NetMessage) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        NetMessage::RoundStart(m) => encode_payload(MessageType::RoundStart, m),
        NetMessage::RoundEnd(m) => encode_payload(MessageType::RoundEnd, m),
        NetMessage::StateUpdate(m) => encode_payload(MessageType::StateUpdate, m),
    }
}

/// Extract the message type byte from raw wire data.
pub fn decode_message_type(data: &[u8]) -> Result<MessageType, ProtocolError> {
    let Some(&first) = data.first() else {
        return Err(ProtocolError::EmptyMessage);
    };
    MessageType::from_byte(first).ok_or(ProtocolError::UnknownMessageType(first))
}

/// Decode a MessagePack payload (bytes after the type prefix).
pub fn decode_payload<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    rmp_serde::from_slice(&data[1..]).map_err(|e| ProtocolError::DeserializeError(e.to_string()))
}

/// Decode raw wire data into a [`NetMessage`]. Payloads are read
/// positionally, so a peer whose message structs declare fields in another
/// order fails here or decodes garbage.
pub fn decode_message(data: &[u8]) -> Result<NetMessage, ProtocolError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(data.len()));
    }
    match decode_message_type(data)? {
        MessageType::RoundStart => Ok(NetMessage::RoundStart(decode_payload::<RoundStartMsg>(
            data,
        )?)),
        MessageType::RoundEnd => Ok(NetMessage::RoundEnd(decode_payload::<RoundEndMsg>(data)?)),
        MessageType::StateUpdate => Ok(NetMessage::StateUpdate(decode_payload::<
            StateUpdateMsg,
        >(data)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::{PlayerRole, PlayerState};
    use crate::settings::{RoundId, VERSION_MAJOR, VERSION_MINOR};
    use crate::test_helpers::make_settings;

    fn start_msg(start_zone: Option<i32>) -> NetMessage {
        NetMessage::RoundStart(RoundStartMsg {
            sender: 4,
            major_version: VERSION_MAJOR,
            minor_version: VERSION_MINOR,
            settings: make_settings(),
            start_zone,
        })
    }

    #[test]
    fn roundtrip_round_start() {
        for zone in [None, Some(17), Some(-3)] {
            let msg = start_msg(zone);
            let encoded = encode_message(&msg).unwrap();
            assert_eq!(encoded[0], MessageType::RoundStart as u8);
            assert_eq!(decode_message(&encoded).unwrap(), msg);
        }
    }

    #[test]
    fn roundtrip_round_end_without_winner() {
        let msg = NetMessage::RoundEnd(RoundEndMsg {
            sender: 9,
            round_id: RoundId::from("arena#Normal#a#0.1"),
            winning_role: None,
        });
        let encoded = encode_message(&msg).unwrap();
        assert_eq!(decode_message(&encoded).unwrap(), msg);
    }

    #[test]
    fn roundtrip_absent_state_update() {
        let msg = NetMessage::StateUpdate(StateUpdateMsg {
            sender: 2,
            state: None,
        });
        let encoded = encode_message(&msg).unwrap();
        assert_eq!(encoded[0], MessageType::StateUpdate as u8);
        assert_eq!(decode_message(&encoded).unwrap(), msg);
    }

    #[test]
    fn state_update_keeps_negative_seed() {
        let msg = NetMessage::StateUpdate(StateUpdateMsg {
            sender: 2,
            state: Some(PlayerState {
                round_id: make_settings().round_id(),
                seed: i32::MIN,
                role: PlayerRole::SeedWait,
            }),
        });
        let decoded = decode_message(&encode_message(&msg).unwrap()).unwrap();
        match decoded {
            NetMessage::StateUpdate(StateUpdateMsg {
                state: Some(state), ..
            }) => {
                assert_eq!(state.seed, i32::MIN);
                assert_eq!(state.role, PlayerRole::SeedWait);
            },
            other => panic!("Expected StateUpdate, got {other:?}"),
        }
    }

    #[test]
    fn decode_empty_message_fails() {
        assert!(matches!(
            decode_message(&[]),
            Err(ProtocolError::EmptyMessage)
        ));
    }

    #[test]
    fn decode_unknown_type_fails() {
        assert!(matches!(
            decode_message(&[0x7F, 0x90]),
            Err(ProtocolError::UnknownMessageType(0x7F))
        ));
    }

    #[test]
    fn decode_truncated_payload_fails() {
        let encoded = encode_message(&start_msg(Some(1))).unwrap();
        let truncated = &encoded[..encoded.len() / 2];
        assert!(matches!(
            decode_message(truncated),
            Err(ProtocolError::DeserializeError(_))
        ));
    }

    #[test]
    fn decode_mismatched_payload_fails() {
        // A state update payload behind a round-start type byte
        let mut encoded = encode_message(&NetMessage::StateUpdate(StateUpdateMsg {
            sender: 1,
            state: None,
        }))
        .unwrap();
        encoded[0] = MessageType::RoundStart as u8;
        assert!(decode_message(&encoded).is_err());
    }

    #[test]
    fn message_type_from_byte_exhaustive() {
        for byte in 0u8..=255 {
            let expected = match byte {
                0x01 => Some(MessageType::RoundStart),
                0x02 => Some(MessageType::RoundEnd),
                0x03 => Some(MessageType::StateUpdate),
                _ => None,
            };
            assert_eq!(MessageType::from_byte(byte), expected, "byte 0x{byte:02x}");
        }
    }

    #[test]
    fn oversized_payload_rejected() {
        let mut settings = make_settings();
        settings.spawn_level = "x".repeat(MAX_MESSAGE_SIZE);
        let msg = NetMessage::RoundStart(RoundStartMsg {
            sender: 1,
            major_version: VERSION_MAJOR,
            minor_version: VERSION_MINOR,
            settings,
            start_zone: None,
        });
        assert!(matches!(
            encode_message(&msg),
            Err(ProtocolError::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn protocol_error_display() {
        assert_eq!(format!("{}", ProtocolError::EmptyMessage), "empty message");
        assert_eq!(
            format!("{}", ProtocolError::UnknownMessageType(0xAB)),
            "unknown message type: 0xab"
        );
        assert!(format!("{}", ProtocolError::PayloadTooLarge(20000)).contains("20000"));
        assert!(format!("{}", ProtocolError::DeserializeError("eof".into())).contains("eof"));
    }
}
