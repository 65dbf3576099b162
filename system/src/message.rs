use serde::{Deserialize, Serialize};

use crate::document::{Card, SessionDoc};
use crate::types::{EntityKind, RoomId};

/// Ingress frames, tagged with the event names the front-end speaks. Every
/// message is self-contained: a mutation carries the full document, so the
/// server never has to reconstruct intermediate state and the resulting
/// upsert is idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "session:join")]
    Join { session: RoomId },
    #[serde(rename = "cards:init")]
    CardsInit,
    #[serde(rename = "sessions:init")]
    SessionsInit,
    #[serde(rename = "cards:mutation")]
    CardsMutation(Card),
    #[serde(rename = "sessions:mutation")]
    SessionsMutation(SessionDoc),
}

impl ClientEvent {
    /// Collection the event addresses, if any.
    pub fn kind(&self) -> Option<EntityKind> {
        match self {
            ClientEvent::Join { .. } => None,
            ClientEvent::CardsInit | ClientEvent::CardsMutation(_) => Some(EntityKind::Cards),
            ClientEvent::SessionsInit | ClientEvent::SessionsMutation(_) => {
                Some(EntityKind::Sessions)
            }
        }
    }
}

/// Egress frames. Responses go to the connection that issued the triggering
/// event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "session:boot")]
    Boot,
    #[serde(rename = "cards:restore")]
    CardsRestore(Vec<Card>),
    #[serde(rename = "sessions:restore")]
    SessionsRestore(Vec<SessionDoc>),
    #[serde(rename = "cards:push")]
    CardsPush(Card),
    #[serde(rename = "sessions:push")]
    SessionsPush(SessionDoc),
}
