//! Client requests and server messages, and how frames map onto them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::{ErrorCode, Opcode, ProtocolError, Role, RoomId};

/// What a connection may ask for before it has been matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRequest {
    /// `[100]`: put me in the pairing queue.
    Queue,
    /// `[101]`: I'm done; close my connection.
    Leave,
}

/// Classifies a pre-match frame.
///
/// Anything other than exactly `[100]` or `[101]` is rejected with the
/// [`ErrorCode`] to send back to the client:
///
/// | frame                 | result                    |
/// |-----------------------|---------------------------|
/// | not JSON / not UTF-8  | `ErrorCode::MalformedJson` |
/// | JSON, not an array    | `ErrorCode::NotAList`      |
/// | any other array       | `ErrorCode::NotAllowed`    |
pub fn parse_request(frame: &[u8]) -> Result<ClientRequest, ErrorCode> {
    let value: Value =
        serde_json::from_slice(frame).map_err(|_| ErrorCode::MalformedJson)?;
    let Value::Array(items) = value else {
        return Err(ErrorCode::NotAList);
    };
    match single_opcode(&items) {
        Some(Opcode::Queue) => Ok(ClientRequest::Queue),
        Some(Opcode::Leave) => Ok(ClientRequest::Leave),
        _ => Err(ErrorCode::NotAllowed),
    }
}

/// How a room treats one frame received from a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomFrame {
    /// Exactly `[101]`: the sender ends the room.
    Leave,
    /// Valid JSON, forwarded verbatim.
    Payload,
    /// Not valid JSON. Still forwarded verbatim; only worth a log line.
    Unparsed,
}

/// Classifies a frame received inside a room.
pub fn classify_room_frame(frame: &[u8]) -> RoomFrame {
    match serde_json::from_slice::<Value>(frame) {
        Ok(Value::Array(items)) if single_opcode(&items) == Some(Opcode::Leave) => {
            RoomFrame::Leave
        }
        Ok(_) => RoomFrame::Payload,
        Err(_) => RoomFrame::Unparsed,
    }
}

/// The opcode of a one-element array, if that element is one.
fn single_opcode(items: &[Value]) -> Option<Opcode> {
    match items {
        [op] => Opcode::from_json(op),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// ServerMessage
// ---------------------------------------------------------------------------

/// Everything the server itself sends. In-room payload is forwarded as raw
/// bytes and never goes through this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// `[110, room_id, role]`
    Matched { room_id: RoomId, role: Role },
    /// `[111]`
    PersonLeft,
    /// `[120, code, message]`
    Error { code: ErrorCode, message: String },
}

impl ServerMessage {
    /// An ERROR frame carrying the standard text for `code`.
    pub fn error(code: ErrorCode) -> Self {
        Self::Error {
            code,
            message: code.message().to_owned(),
        }
    }

    /// Returns this message's opcode.
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Matched { .. } => Opcode::Matched,
            Self::PersonLeft => Opcode::PersonLeft,
            Self::Error { .. } => Opcode::Error,
        }
    }

    /// Interprets a decoded JSON value as a server message.
    pub fn from_json(value: Value) -> Result<Self, ProtocolError> {
        let Value::Array(items) = value else {
            return Err(ProtocolError::InvalidMessage(
                "top level must be an array".into(),
            ));
        };
        let opcode = items
            .first()
            .and_then(Opcode::from_json)
            .ok_or_else(|| ProtocolError::InvalidMessage("missing or unknown opcode".into()))?;

        match (opcode, items.as_slice()) {
            (Opcode::Matched, [_, Value::String(room_id), role]) => {
                let role = role.as_u64().and_then(Role::from_index).ok_or_else(|| {
                    ProtocolError::InvalidMessage(format!("invalid role {role}"))
                })?;
                Ok(ServerMessage::Matched {
                    room_id: RoomId::from(room_id.as_str()),
                    role,
                })
            }
            (Opcode::PersonLeft, [_]) => Ok(ServerMessage::PersonLeft),
            (Opcode::Error, [_, code, Value::String(message)]) => {
                let code = code.as_u64().and_then(ErrorCode::from_code).ok_or_else(|| {
                    ProtocolError::InvalidMessage(format!("invalid error code {code}"))
                })?;
                Ok(ServerMessage::Error {
                    code,
                    message: message.clone(),
                })
            }
            _ => Err(ProtocolError::InvalidMessage(format!(
                "malformed {opcode} frame"
            ))),
        }
    }
}

/// Serializes to the flat wire array, e.g. `[110,"<id>",0]`.
impl Serialize for ServerMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Matched { room_id, role } => {
                (Opcode::Matched, room_id, role).serialize(serializer)
            }
            Self::PersonLeft => [Opcode::PersonLeft].serialize(serializer),
            Self::Error { code, message } => {
                (Opcode::Error, code, message).serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for ServerMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ServerMessage::from_json(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_request_queue_and_leave() {
        assert_eq!(parse_request(b"[100]"), Ok(ClientRequest::Queue));
        assert_eq!(parse_request(b"[101]"), Ok(ClientRequest::Leave));
        assert_eq!(parse_request(b" [ 100 ] "), Ok(ClientRequest::Queue));
    }

    #[test]
    fn test_parse_request_malformed_json_is_code_1() {
        assert_eq!(parse_request(b"[100"), Err(ErrorCode::MalformedJson));
        assert_eq!(parse_request(b"hello"), Err(ErrorCode::MalformedJson));
        assert_eq!(parse_request(b""), Err(ErrorCode::MalformedJson));
        assert_eq!(parse_request(&[0xff, 0xfe]), Err(ErrorCode::MalformedJson));
    }

    #[test]
    fn test_parse_request_non_array_is_code_2() {
        assert_eq!(parse_request(b"100"), Err(ErrorCode::NotAList));
        assert_eq!(parse_request(br#"{"op":100}"#), Err(ErrorCode::NotAList));
        assert_eq!(parse_request(b"\"[100]\""), Err(ErrorCode::NotAList));
    }

    #[test]
    fn test_parse_request_other_arrays_are_code_3() {
        assert_eq!(parse_request(b"[999]"), Err(ErrorCode::NotAllowed));
        assert_eq!(parse_request(b"[]"), Err(ErrorCode::NotAllowed));
        assert_eq!(parse_request(b"[100, 1]"), Err(ErrorCode::NotAllowed));
        assert_eq!(parse_request(b"[\"hello\"]"), Err(ErrorCode::NotAllowed));
        assert_eq!(parse_request(b"[110]"), Err(ErrorCode::NotAllowed));
    }

    #[test]
    fn test_classify_room_frame_leave_is_exactly_101() {
        assert_eq!(classify_room_frame(b"[ 101 ]"), RoomFrame::Leave);
        assert_eq!(classify_room_frame(b"[101, 1]"), RoomFrame::Payload);
        assert_eq!(classify_room_frame(b"101"), RoomFrame::Payload);
        assert_eq!(classify_room_frame(b"not json"), RoomFrame::Unparsed);
    }

    #[test]
    fn test_classify_room_frame() {
        assert_eq!(classify_room_frame(b"[101]"), RoomFrame::Leave);
        assert_eq!(classify_room_frame(b"[100]"), RoomFrame::Payload);
        assert_eq!(classify_room_frame(br#"{"move":3}"#), RoomFrame::Payload);
        assert_eq!(classify_room_frame(b"{oops"), RoomFrame::Unparsed);
    }

    #[test]
    fn test_server_message_wire_shapes() {
        let matched = ServerMessage::Matched {
            room_id: RoomId::from("abc"),
            role: Role::First,
        };
        assert_eq!(serde_json::to_value(&matched).unwrap(), json!([110, "abc", 0]));
        assert_eq!(
            serde_json::to_value(ServerMessage::PersonLeft).unwrap(),
            json!([111])
        );
        assert_eq!(
            serde_json::to_value(ServerMessage::error(ErrorCode::MalformedJson)).unwrap(),
            json!([120, 1, "Bad JSON; send a list like [100]."])
        );
    }

    #[test]
    fn test_server_message_from_json_rejects_unknown_shapes() {
        assert!(ServerMessage::from_json(json!([110, "abc", 2])).is_err());
        assert!(ServerMessage::from_json(json!([111, 0])).is_err());
        assert!(ServerMessage::from_json(json!([100])).is_err());
        assert!(ServerMessage::from_json(json!({"op": 111})).is_err());
    }

    #[test]
    fn test_server_message_opcode() {
        assert_eq!(ServerMessage::PersonLeft.opcode(), Opcode::PersonLeft);
        assert_eq!(
            ServerMessage::error(ErrorCode::NotAllowed).opcode(),
            Opcode::Error
        );
    }
}
