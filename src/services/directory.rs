//! In-memory player identity registry, keyed by case-insensitive nickname.

use hashbrown::HashMap;
use parking_lot::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Nickname is required")]
    EmptyNickname,
    #[error("Nickname already exists")]
    Duplicate,
}

/// A registered player identity.
#[derive(Debug, Clone)]
pub struct PlayerRecord {
    pub id: Uuid,
    pub nickname: String,
}

/// Nickname -> identity map. Registration is first-writer-wins; removal on
/// session end frees the nickname for re-registration.
pub struct PlayerDirectory {
    players: RwLock<HashMap<String, PlayerRecord>>,
}

impl PlayerDirectory {
    pub fn new() -> Self {
        Self {
            players: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new nickname, rejecting blanks and duplicates.
    pub fn register(&self, nickname: &str) -> Result<PlayerRecord, DirectoryError> {
        let trimmed = nickname.trim();
        if trimmed.is_empty() {
            return Err(DirectoryError::EmptyNickname);
        }

        let key = trimmed.to_lowercase();
        let mut players = self.players.write();
        if players.contains_key(&key) {
            return Err(DirectoryError::Duplicate);
        }
        let record = PlayerRecord {
            id: Uuid::new_v4(),
            nickname: trimmed.to_string(),
        };
        players.insert(key, record.clone());
        Ok(record)
    }

    pub fn get(&self, nickname: &str) -> Option<PlayerRecord> {
        self.players
            .read()
            .get(&nickname.trim().to_lowercase())
            .cloned()
    }

    pub fn contains(&self, nickname: &str) -> bool {
        self.players
            .read()
            .contains_key(&nickname.trim().to_lowercase())
    }

    pub fn remove(&self, nickname: &str) -> Option<PlayerRecord> {
        self.players.write().remove(&nickname.trim().to_lowercase())
    }

    pub fn count(&self) -> usize {
        self.players.read().len()
    }
}

impl Default for PlayerDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let directory = PlayerDirectory::new();
        let record = directory.register("Alice").unwrap();
        assert_eq!(record.nickname, "Alice");
        assert!(directory.contains("alice"));
        assert_eq!(directory.get("ALICE").unwrap().id, record.id);
    }

    #[test]
    fn test_register_rejects_blank() {
        let directory = PlayerDirectory::new();
        assert_eq!(
            directory.register("   ").unwrap_err(),
            DirectoryError::EmptyNickname
        );
    }

    #[test]
    fn test_register_rejects_case_insensitive_duplicate() {
        let directory = PlayerDirectory::new();
        directory.register("Alice").unwrap();
        assert_eq!(
            directory.register("aLiCe").unwrap_err(),
            DirectoryError::Duplicate
        );
        assert_eq!(directory.count(), 1);
    }

    #[test]
    fn test_remove_frees_nickname() {
        let directory = PlayerDirectory::new();
        directory.register("Alice").unwrap();
        assert!(directory.remove("alice").is_some());
        assert!(directory.register("Alice").is_ok());
    }
}
