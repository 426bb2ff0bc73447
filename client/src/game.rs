use log::info;
use shared::{PlayerState, RoomInfo, Snapshot};

/// Latest authoritative snapshot plus who the local player is.
///
/// The client never simulates: every inbound snapshot replaces the previous
/// one outright.
#[derive(Debug, Clone)]
pub struct ClientGameState {
    local_player_id: String,
    latest: Option<Snapshot>,
}

impl ClientGameState {
    pub fn new(local_player_id: impl Into<String>) -> Self {
        Self {
            local_player_id: local_player_id.into(),
            latest: None,
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        if let Some(room) = &snapshot.room_info {
            if self.room_info() != Some(room) {
                info!(
                    "Room {}: {}/{} players",
                    room.name, room.players_count, room.max_players
                );
            }
        }
        self.latest = Some(snapshot);
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.latest.as_ref()
    }

    pub fn local_player_id(&self) -> &str {
        &self.local_player_id
    }

    pub fn local_player(&self) -> Option<&PlayerState> {
        self.latest.as_ref()?.player(&self.local_player_id)
    }

    pub fn room_info(&self) -> Option<&RoomInfo> {
        self.latest.as_ref()?.room_info.as_ref()
    }

    pub fn clear(&mut self) {
        self.latest = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{BulletState, PlayerStatus};

    fn snapshot_with(ids: &[&str]) -> Snapshot {
        let mut snapshot = Snapshot::default();
        for (i, id) in ids.iter().enumerate() {
            snapshot.players.insert(
                id.to_string(),
                PlayerState {
                    x: i as f32 * 100.0,
                    y: 50.0,
                    hp: 1000,
                    status: PlayerStatus::Alive,
                    kills: 0,
                },
            );
        }
        snapshot
    }

    #[test]
    fn test_starts_empty() {
        let state = ClientGameState::new("alice");
        assert!(state.snapshot().is_none());
        assert!(state.local_player().is_none());
        assert!(state.room_info().is_none());
    }

    #[test]
    fn test_snapshot_replaced_wholesale() {
        let mut state = ClientGameState::new("alice");

        let mut first = snapshot_with(&["alice", "bob"]);
        first.bullets.push(BulletState {
            x: 1.0,
            y: 1.0,
            owner: "bob".to_string(),
        });
        state.apply_snapshot(first);

        state.apply_snapshot(snapshot_with(&["carol"]));
        let current = state.snapshot().unwrap();
        assert_eq!(current.players.len(), 1);
        assert!(current.bullets.is_empty());
        assert!(state.local_player().is_none());
    }

    #[test]
    fn test_local_player_lookup() {
        let mut state = ClientGameState::new("bob");
        state.apply_snapshot(snapshot_with(&["alice", "bob"]));
        assert_eq!(state.local_player().unwrap().x, 100.0);
        assert_eq!(state.local_player_id(), "bob");
    }

    #[test]
    fn test_room_info_and_clear() {
        let mut state = ClientGameState::new("alice");
        let mut snapshot = snapshot_with(&["alice"]);
        snapshot.room_info = Some(RoomInfo {
            name: "arena".to_string(),
            players_count: 1,
            max_players: 8,
        });
        state.apply_snapshot(snapshot);
        assert_eq!(state.room_info().unwrap().name, "arena");

        state.clear();
        assert!(state.snapshot().is_none());
    }
}
