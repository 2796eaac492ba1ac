//! Stable player identifier persisted across runs.

use crate::{EventsError, EventsResult};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// Anonymous player identifier, a UUID kept in a small file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentity {
    id: Uuid,
}

impl PlayerIdentity {
    /// Read the identity stored at `path`. `Ok(None)` if the file is missing.
    pub fn load(path: &Path) -> EventsResult<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let id = Uuid::parse_str(content.trim()).map_err(|e| EventsError::InvalidIdentity {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(Self { id }))
    }

    /// Load the stored identity, creating a new one if it is missing or
    /// unreadable.
    pub fn load_or_create(path: &Path) -> EventsResult<Self> {
        match Self::load(path) {
            Ok(Some(identity)) => return Ok(identity),
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Replacing unreadable player id"),
        }

        let identity = Self { id: Uuid::new_v4() };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, identity.id.to_string())?;
        info!(player_id = %identity.id, "Created player id");
        Ok(identity)
    }

    pub fn id(&self) -> String {
        self.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_then_reload_is_stable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("player_id");

        let first = PlayerIdentity::load_or_create(&path).unwrap();
        let second = PlayerIdentity::load_or_create(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read_to_string(&path).unwrap(), first.id());
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempdir().unwrap();
        assert!(PlayerIdentity::load(&dir.path().join("player_id"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_load_tolerates_whitespace() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("player_id");
        fs::write(&path, "  67e55044-10b1-426f-9247-bb680e5fe0c8\n").unwrap();

        let identity = PlayerIdentity::load(&path).unwrap().unwrap();
        assert_eq!(identity.id(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }

    #[test]
    fn test_garbage_is_replaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("player_id");
        fs::write(&path, "not-a-uuid").unwrap();

        assert!(matches!(
            PlayerIdentity::load(&path),
            Err(EventsError::InvalidIdentity { .. })
        ));

        let identity = PlayerIdentity::load_or_create(&path).unwrap();
        assert!(Uuid::parse_str(&identity.id()).is_ok());
        assert_eq!(fs::read_to_string(&path).unwrap(), identity.id());
    }
}
