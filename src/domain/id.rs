use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

// ============================================================================
// Entity Identity
// ============================================================================
//
// Value-comparable identity used as entity/aggregate keys and as
// dispatch-queue keys. Fresh identities are random v4 UUIDs; reconstitution
// supplies the stored value, which may be textual or numeric depending on
// the backing store.
//
// ============================================================================

/// Identity of an entity or aggregate. Equality is value-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityId {
    Uuid(Uuid),
    Text(String),
    Number(i64),
}

impl EntityId {
    /// Generate a fresh random identity.
    pub fn new() -> Self {
        Self::Uuid(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self::Uuid(id)
    }

    pub fn from_text(id: impl Into<String>) -> Self {
        Self::Text(id.into())
    }

    pub fn from_number(id: i64) -> Self {
        Self::Number(id)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
            Self::Number(id) => write!(f, "{id}"),
        }
    }
}

impl From<Uuid> for EntityId {
    fn from(id: Uuid) -> Self {
        Self::Uuid(id)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

// Serializes to the raw value, not a tagged wrapper, so identities land in
// DTOs and payloads as plain strings/numbers.
impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Uuid(id) => serializer.collect_str(id),
            Self::Text(id) => serializer.serialize_str(id),
            Self::Number(id) => serializer.serialize_i64(*id),
        }
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self::Number(n)),
            Raw::Text(s) => Ok(s.parse::<Uuid>().map_or(Self::Text(s), Self::Uuid)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
