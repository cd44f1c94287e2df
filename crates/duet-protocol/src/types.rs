//! Core protocol vocabulary: opcodes, roles, room identifiers, error codes.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Opcode
// ---------------------------------------------------------------------------

/// Integer tag in the first slot of every protocol frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Client → Server: request pairing.
    Queue,
    /// Client → Server: withdraw before a match, or end the room after one.
    Leave,
    /// Server → Client: a partner was found.
    Matched,
    /// Server → Client: the partner disconnected or left.
    PersonLeft,
    /// Server → Client: a pre-match frame was rejected.
    Error,
}

impl Opcode {
    /// Returns the numeric wire value.
    pub fn code(self) -> u16 {
        match self {
            Self::Queue => 100,
            Self::Leave => 101,
            Self::Matched => 110,
            Self::PersonLeft => 111,
            Self::Error => 120,
        }
    }

    /// Looks up an opcode by its wire value.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            100 => Some(Self::Queue),
            101 => Some(Self::Leave),
            110 => Some(Self::Matched),
            111 => Some(Self::PersonLeft),
            120 => Some(Self::Error),
            _ => None,
        }
    }

    /// Reads an opcode out of a JSON value.
    ///
    /// Integral floats (`101.0`) count, since JSON does not distinguish
    /// them from integers.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let serde_json::Value::Number(number) = value else {
            return None;
        };
        let code = number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        })?;
        Self::from_code(code)
    }
}

impl Serialize for Opcode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.code())
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Queue => "QUEUE",
            Self::Leave => "LEAVE",
            Self::Matched => "MATCHED",
            Self::PersonLeft => "PERSON_LEFT",
            Self::Error => "ERROR",
        };
        write!(f, "{name}({})", self.code())
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// A side of a room. The first connection dequeued gets [`Role::First`]
/// (`0` on the wire), its partner gets [`Role::Second`] (`1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    First,
    Second,
}

impl Role {
    /// Both roles, in wire order.
    pub const BOTH: [Role; 2] = [Role::First, Role::Second];

    /// Returns the wire value (`0` or `1`), also usable as an array index.
    pub fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }

    /// Parses a wire value.
    pub fn from_index(index: u64) -> Option<Self> {
        match index {
            0 => Some(Self::First),
            1 => Some(Self::Second),
            _ => None,
        }
    }

    /// Returns the partner's role.
    pub fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.index() as u8)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

// ---------------------------------------------------------------------------
// RoomId
// ---------------------------------------------------------------------------

/// Opaque identifier of a room, for diagnostics only. Clients must never
/// parse it.
///
/// `#[serde(transparent)]` puts it on the wire as a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Generates a fresh identifier: 128 random bits as 32 lowercase hex
    /// characters.
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::rng().random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Why a pre-match frame was rejected. Sent as the second element of an
/// ERROR frame; the connection stays open after any of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// `1`: the frame is not valid JSON (or not valid UTF-8).
    MalformedJson,
    /// `2`: valid JSON, but the top-level value is not an array.
    NotAList,
    /// `3`: an array, but not `[100]` or `[101]`.
    NotAllowed,
}

impl ErrorCode {
    /// Returns the numeric wire value.
    pub fn code(self) -> u8 {
        match self {
            Self::MalformedJson => 1,
            Self::NotAList => 2,
            Self::NotAllowed => 3,
        }
    }

    /// Parses a wire value.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(Self::MalformedJson),
            2 => Some(Self::NotAList),
            3 => Some(Self::NotAllowed),
            _ => None,
        }
    }

    /// The human-readable text sent alongside the code.
    pub fn message(self) -> &'static str {
        match self {
            Self::MalformedJson => "Bad JSON; send a list like [100].",
            Self::NotAList => "Top level must be a list.",
            Self::NotAllowed => "Must [100] (QUEUE) before sending data.",
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
