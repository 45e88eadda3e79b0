use std::fs;
use std::io;
use std::path::PathBuf;

use crate::domain::models::Participant;

/// Local persistence for the signed-in participant, one JSON record at a
/// fixed path. Anything unreadable counts as "no session"; the record is
/// trusted until the API rejects it.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Option<Participant> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::debug!("discarding corrupt session file: {err}");
                None
            }
        }
    }

    pub fn save(&self, user: &Participant) -> io::Result<()> {
        let raw = serde_json::to_string(user)?;
        fs::write(&self.path, raw)
    }

    pub fn clear(&self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::warn!("failed to clear session file: {err}");
            }
        }
    }
}
