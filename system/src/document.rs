use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{EntityKind, RoomId};

#[derive(Debug)]
pub enum ValidationError {
    MissingUuid,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingUuid => write!(f, "document has no uuid"),
        }
    }
}

/// A document that takes part in uuid-keyed replication. Identity is the
/// client-generated `uuid`; deletion is a tombstone flag, never a removal.
pub trait Replicated: Clone + Serialize + DeserializeOwned {
    const KIND: EntityKind;

    fn uuid(&self) -> &str;

    fn is_deleted(&self) -> bool;

    /// A copy with server-internal fields stripped, as handed out by a
    /// restore. The mutation echo keeps the full document.
    fn redacted(&self) -> Self;

    fn validate(&self) -> Result<(), ValidationError> {
        if self.uuid().is_empty() {
            Err(ValidationError::MissingUuid)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub uuid: String,
    /// The room this card belongs to. Stripped from restore payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<RoomId>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub shape: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Replicated for Card {
    const KIND: EntityKind = EntityKind::Cards;

    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn redacted(&self) -> Self {
        Card {
            session: None,
            ..self.clone()
        }
    }
}

/// Shared per-room state. Everything except identity and the tombstone flag
/// is an opaque payload owned by the clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDoc {
    pub uuid: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(flatten)]
    pub state: Map<String, Value>,
}

impl Replicated for SessionDoc {
    const KIND: EntityKind = EntityKind::Sessions;

    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn redacted(&self) -> Self {
        self.clone()
    }
}
