//! Flat-file user registry.
//!
//! A JSON document of everyone who has messaged the bot plus a blocklist,
//! loaded at startup and rewritten wholesale on each mutation. Nothing in
//! the message path depends on it; failures are logged and ignored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    /// Unix timestamp (ms) of the first message seen from this user.
    pub join_date: i64,
}

#[derive(Serialize, Deserialize, Default)]
struct RegistryState {
    users: HashMap<String, UserRecord>,
    blocked: Vec<String>,
}

pub struct UserRegistry {
    state: RegistryState,
    path: Option<PathBuf>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self {
            state: RegistryState::default(),
            path: None,
        }
    }

    pub fn load_or_new(path: &Path) -> Self {
        let state = if path.exists() {
            match Self::read(path) {
                Ok(state) => {
                    info!("Loaded user registry from {:?} ({} users)", path, state.users.len());
                    state
                }
                Err(e) => {
                    warn!("Failed to load user registry: {e}");
                    RegistryState::default()
                }
            }
        } else {
            info!("No user registry file, starting fresh");
            RegistryState::default()
        };

        Self {
            state,
            path: Some(path.to_path_buf()),
        }
    }

    fn read(path: &Path) -> Result<RegistryState, String> {
        let json = std::fs::read_to_string(path).map_err(|e| format!("Failed to read: {e}"))?;
        serde_json::from_str(&json).map_err(|e| format!("Failed to parse: {e}"))
    }

    /// Record a user if not already present. Existing records are never
    /// overwritten; only first contact is interesting.
    pub fn add_user(&mut self, id: &str, name: &str) -> Result<(), String> {
        if self.state.users.contains_key(id) {
            return Ok(());
        }

        self.state.users.insert(
            id.to_string(),
            UserRecord {
                id: id.to_string(),
                name: name.to_string(),
                join_date: chrono::Utc::now().timestamp_millis(),
            },
        );
        self.save()
    }

    pub fn is_blocked(&self, id: &str) -> bool {
        self.state.blocked.iter().any(|b| b == id)
    }

    pub fn block(&mut self, id: &str) {
        if !self.is_blocked(id) {
            self.state.blocked.push(id.to_string());
        }
    }

    pub fn user_count(&self) -> usize {
        self.state.users.len()
    }

    fn save(&self) -> Result<(), String> {
        let Some(ref path) = self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&self.state)
            .map_err(|e| format!("Failed to serialize: {e}"))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write: {e}"))
    }
}

impl Default for UserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_add_user_once() {
        let mut registry = UserRegistry::new();
        registry.add_user("94711111111", "Alice").unwrap();
        registry.add_user("94711111111", "Impostor").unwrap();

        assert_eq!(registry.user_count(), 1);
        assert_eq!(registry.state.users["94711111111"].name, "Alice");
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registry.json");

        {
            let mut registry = UserRegistry::load_or_new(&path);
            registry.add_user("94711111111", "Alice").unwrap();
            registry.add_user("94722222222", "Bob").unwrap();
        }

        let registry = UserRegistry::load_or_new(&path);
        assert_eq!(registry.user_count(), 2);
        assert_eq!(registry.state.users["94722222222"].name, "Bob");
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, "{ not json").unwrap();

        let registry = UserRegistry::load_or_new(&path);
        assert_eq!(registry.user_count(), 0);
    }

    #[test]
    fn test_blocklist_lookup() {
        let mut registry = UserRegistry::new();
        registry.block("94733333333");
        registry.block("94733333333");
        assert!(registry.is_blocked("94733333333"));
        assert!(!registry.is_blocked("94711111111"));
        assert_eq!(registry.state.blocked.len(), 1);
    }
}
