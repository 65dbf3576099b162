use std::collections::{HashMap, HashSet};

use system::{ConnectionId, RoomId};

/// Ephemeral room membership. Room ids are arbitrary strings chosen by the
/// client; nothing here survives a disconnect or is ever persisted.
pub struct RoomManager {
    rooms: HashMap<RoomId, Vec<ConnectionId>>,
    memberships: HashMap<ConnectionId, HashSet<RoomId>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            memberships: HashMap::new(),
        }
    }

    /// Adds the connection to the room. Joining a room twice is a no-op.
    pub fn join(&mut self, connection_id: ConnectionId, room_id: RoomId) {
        let members = self.rooms.entry(room_id.clone()).or_insert_with(Vec::new);
        if !members.contains(&connection_id) {
            members.push(connection_id);
            log::info!("connection {} joined room {}", connection_id, room_id);
        }
        self.memberships
            .entry(connection_id)
            .or_insert_with(HashSet::new)
            .insert(room_id);
    }

    pub fn is_member(&self, connection_id: ConnectionId, room_id: &str) -> bool {
        self.rooms
            .get(room_id)
            .map(|members| members.contains(&connection_id))
            .unwrap_or(false)
    }

    pub fn members(&self, room_id: &str) -> &[ConnectionId] {
        self.rooms
            .get(room_id)
            .map(|members| members.as_slice())
            .unwrap_or(&[])
    }

    pub fn membership_count(&self, connection_id: ConnectionId) -> usize {
        self.memberships
            .get(&connection_id)
            .map(|rooms| rooms.len())
            .unwrap_or(0)
    }

    /// Drops every membership of the connection. Rooms left with no members
    /// are removed entirely.
    pub fn drop_connection(&mut self, connection_id: ConnectionId) {
        if let Some(rooms) = self.memberships.remove(&connection_id) {
            for room_id in rooms {
                let emptied = self
                    .rooms
                    .get_mut(&room_id)
                    .map(|members| {
                        members.retain(|member| *member != connection_id);
                        members.is_empty()
                    })
                    .unwrap_or(false);
                if emptied {
                    self.rooms.remove(&room_id);
                }
            }
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_tracks_membership_after_join() {
        let mut rooms = RoomManager::new();
        rooms.join(1, "room-1".into());
        assert!(rooms.is_member(1, "room-1"));
        assert_eq!(rooms.members("room-1"), &[1]);
    }

    #[test]
    fn it_ignores_a_repeated_join() {
        let mut rooms = RoomManager::new();
        rooms.join(1, "room-1".into());
        rooms.join(1, "room-1".into());
        assert_eq!(rooms.members("room-1"), &[1]);
    }

    #[test]
    fn it_drops_all_memberships_on_disconnect() {
        let mut rooms = RoomManager::new();
        rooms.join(1, "room-1".into());
        rooms.join(1, "room-2".into());
        rooms.join(2, "room-1".into());

        rooms.drop_connection(1);
        assert!(!rooms.is_member(1, "room-1"));
        assert!(!rooms.is_member(1, "room-2"));
        assert_eq!(rooms.membership_count(1), 0);
        assert_eq!(rooms.members("room-1"), &[2]);
    }

    #[test]
    fn it_removes_a_room_when_all_connections_disconnect() {
        let mut rooms = RoomManager::new();
        rooms.join(1, "room-1".into());
        rooms.drop_connection(1);
        assert_eq!(rooms.room_count(), 0);
    }
}
