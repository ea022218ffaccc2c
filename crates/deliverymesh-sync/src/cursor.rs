//! The cursor-store interface a sync orchestrator consults to seed and advance checkpoints.

use parking_lot::Mutex;
use std::collections::HashMap;

/// Durable per-(connection, resource) checkpoint storage. A missing cursor is not an error;
/// callers treat `get` returning `None` as "start from scratch".
pub trait SyncCursorStore: Send + Sync {
    fn get(&self, connection_id: &str, resource_type: &str, resource_id: &str) -> Option<String>;
    fn upsert(&self, connection_id: &str, resource_type: &str, resource_id: &str, cursor: String);
    fn advance(&self, connection_id: &str, resource_type: &str, resource_id: &str, cursor: String) {
        self.upsert(connection_id, resource_type, resource_id, cursor);
    }
}

fn cursor_key(connection_id: &str, resource_type: &str, resource_id: &str) -> String {
    format!("{connection_id}\u{0}{resource_type}\u{0}{resource_id}")
}

#[derive(Default)]
pub struct InMemorySyncCursorStore {
    cursors: Mutex<HashMap<String, String>>,
}

impl InMemorySyncCursorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SyncCursorStore for InMemorySyncCursorStore {
    fn get(&self, connection_id: &str, resource_type: &str, resource_id: &str) -> Option<String> {
        self.cursors
            .lock()
            .get(&cursor_key(connection_id, resource_type, resource_id))
            .cloned()
    }

    fn upsert(&self, connection_id: &str, resource_type: &str, resource_id: &str, cursor: String) {
        self.cursors
            .lock()
            .insert(cursor_key(connection_id, resource_type, resource_id), cursor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_cursor_is_none_not_an_error() {
        let store = InMemorySyncCursorStore::new();
        assert_eq!(store.get("conn1", "repo", "r1"), None);
    }

    #[test]
    fn advance_overwrites_the_stored_cursor() {
        let store = InMemorySyncCursorStore::new();
        store.upsert("conn1", "repo", "r1", "cursor-1".to_string());
        store.advance("conn1", "repo", "r1", "cursor-2".to_string());
        assert_eq!(store.get("conn1", "repo", "r1"), Some("cursor-2".to_string()));
    }
}
