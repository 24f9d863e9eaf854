//! Online-presence registry for the session layer.
//!
//! Tracks which users currently have a live session and what they last
//! did. Owned by the transport/session layer — the query core never
//! touches it. Safe for concurrent sessions; process scope only, no
//! persistence.

use std::collections::BTreeMap;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// One live session: the socket it rides on and the user's last
/// reported activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub socket_id: String,
    /// Last activity kind (`init`, `load`, `view`, `update`, `chat`,
    /// `close`).
    pub action: String,
    /// Project the user is looking at, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// Concurrency-safe keyed registry of online users.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    online: DashMap<String, Session>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record activity for a user. Every message type upserts — even a
    /// window close, since the socket is still live until disconnect.
    pub fn record(&self, name: impl Into<String>, session: Session) {
        self.online.insert(name.into(), session);
    }

    /// Drop every session bound to a socket. Returns the names removed.
    pub fn disconnect(&self, socket_id: &str) -> Vec<String> {
        let names: Vec<String> = self
            .online
            .iter()
            .filter(|entry| entry.value().socket_id == socket_id)
            .map(|entry| entry.key().clone())
            .collect();
        for name in &names {
            self.online.remove(name);
        }
        names
    }

    /// A cloned, ordered view for broadcasting to clients.
    pub fn snapshot(&self) -> BTreeMap<String, Session> {
        self.online
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn is_online(&self, name: &str) -> bool {
        self.online.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.online.len()
    }

    pub fn is_empty(&self) -> bool {
        self.online.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(socket: &str, action: &str) -> Session {
        Session {
            socket_id: socket.to_string(),
            action: action.to_string(),
            project: None,
        }
    }

    #[test]
    fn record_upserts_latest_activity() {
        let registry = PresenceRegistry::new();
        registry.record("Alice", session("s1", "init"));
        registry.record("Alice", session("s1", "view"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.snapshot()["Alice"].action, "view");
    }

    #[test]
    fn disconnect_removes_only_that_socket() {
        let registry = PresenceRegistry::new();
        registry.record("Alice", session("s1", "init"));
        registry.record("Bob", session("s2", "init"));

        let removed = registry.disconnect("s1");
        assert_eq!(removed, vec!["Alice".to_string()]);
        assert!(!registry.is_online("Alice"));
        assert!(registry.is_online("Bob"));
    }

    #[test]
    fn reconnect_rebinds_to_new_socket() {
        let registry = PresenceRegistry::new();
        registry.record("Alice", session("s1", "init"));
        registry.record("Alice", session("s2", "load"));

        // The old socket no longer owns the session.
        assert!(registry.disconnect("s1").is_empty());
        assert!(registry.is_online("Alice"));
    }
}
