pub type ConnectionId = u16;
pub type RoomId = String;

/// The two replicated collections. Every wire event except `session:join`
/// is parameterized by one of these.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum EntityKind {
    Cards,
    Sessions,
}

impl EntityKind {
    pub fn collection_name(&self) -> &'static str {
        match self {
            EntityKind::Cards => "cards",
            EntityKind::Sessions => "sessions",
        }
    }

    /// Cap on the number of documents a single restore may carry. A session
    /// restore only ever returns the most recent document.
    pub fn restore_limit(&self) -> usize {
        match self {
            EntityKind::Cards => 100_000,
            EntityKind::Sessions => 1,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.collection_name())
    }
}
