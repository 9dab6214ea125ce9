//! Session store: who is signed in and with which token.
//!
//! The store never fails. With [`SessionPersistence::File`] it mirrors the
//! identity to disk so a restarted shell stays signed in; disk problems are
//! logged and otherwise ignored, leaving the in-memory state authoritative.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use slooze_core::{BearerToken, Role};
use tracing::{debug, info, warn};

use crate::api::UserProfile;

/// Where the session identity is kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPersistence {
    /// Only for the lifetime of the process.
    #[default]
    Memory,
    /// Mirrored to a JSON file.
    File(PathBuf),
}

/// The signed-in user and their bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub token: BearerToken,
    pub user: UserProfile,
}

/// On-disk form of a [`SessionIdentity`].
#[derive(Serialize, Deserialize)]
struct Snapshot {
    access_token: String,
    user: UserProfile,
}

/// Holds at most one identity. Absent means unauthenticated.
#[derive(Debug, Default)]
pub struct SessionStore {
    identity: Option<SessionIdentity>,
    persistence: SessionPersistence,
}

impl SessionStore {
    /// Empty store with the given persistence mode.
    #[must_use]
    pub const fn new(persistence: SessionPersistence) -> Self {
        Self {
            identity: None,
            persistence,
        }
    }

    /// Store pre-populated from the session file, if there is one.
    #[must_use]
    pub fn restore(persistence: SessionPersistence) -> Self {
        let identity = match &persistence {
            SessionPersistence::Memory => None,
            SessionPersistence::File(path) => load_snapshot(path),
        };

        if let Some(identity) = &identity {
            info!(user = %identity.user.name, role = %identity.user.role, "Session restored");
        }

        Self {
            identity,
            persistence,
        }
    }

    /// Replace the current identity.
    pub fn login(&mut self, token: BearerToken, user: UserProfile) {
        info!(user = %user.name, role = %user.role, "Signed in");
        let identity = SessionIdentity { token, user };

        if let SessionPersistence::File(path) = &self.persistence
            && let Err(e) = save_snapshot(path, &identity)
        {
            warn!(path = %path.display(), error = %e, "Failed to persist session");
        }

        self.identity = Some(identity);
    }

    /// Forget the current identity. No-op when nobody is signed in.
    pub fn logout(&mut self) {
        if let Some(identity) = self.identity.take() {
            info!(user = %identity.user.name, "Signed out");
        }

        if let SessionPersistence::File(path) = &self.persistence {
            match fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "Session file removed"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove session file"),
            }
        }
    }

    #[must_use]
    pub const fn identity(&self) -> Option<&SessionIdentity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<&UserProfile> {
        self.identity.as_ref().map(|identity| &identity.user)
    }

    #[must_use]
    pub fn current_token(&self) -> Option<&BearerToken> {
        self.identity.as_ref().map(|identity| &identity.token)
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.current_user().map(|user| user.role)
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    #[must_use]
    pub const fn persistence(&self) -> &SessionPersistence {
        &self.persistence
    }
}

fn load_snapshot(path: &Path) -> Option<SessionIdentity> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read session file");
            return None;
        }
    };

    match serde_json::from_str::<Snapshot>(&contents) {
        Ok(snapshot) => Some(SessionIdentity {
            token: BearerToken::new(snapshot.access_token),
            user: snapshot.user,
        }),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring corrupt session file");
            None
        }
    }
}

fn save_snapshot(path: &Path, identity: &SessionIdentity) -> io::Result<()> {
    let snapshot = Snapshot {
        access_token: identity.token.expose().to_string(),
        user: identity.user.clone(),
    };
    let json = serde_json::to_vec_pretty(&snapshot).map_err(io::Error::other)?;

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    // Created 0600 on unix, then renamed over any existing file.
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(&json)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
