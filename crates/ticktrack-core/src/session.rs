//! The logged-in user, persisted as a single JSON file between runs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ticktrack_api::User;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::UserLookup;
use crate::error::TrackError;

/// File-backed storage for the current user.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored user.  A missing file means nobody is logged in; an
    /// unreadable one is logged and treated the same way.
    pub fn load(&self) -> Result<Option<User>, TrackError> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(TrackError::SessionIo {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt session file");
                Ok(None)
            }
        }
    }

    pub fn save(&self, user: &User) -> Result<(), TrackError> {
        let io_err = |source| TrackError::SessionIo {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let body = serde_json::to_vec_pretty(user)?;
        std::fs::write(&self.path, body).map_err(io_err)?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), TrackError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(TrackError::SessionIo {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Current-user state.  Login is a lookup by e-mail or id; there is no
/// password check.
pub struct Session<U: UserLookup> {
    store: SessionStore,
    users: Arc<U>,
    current: watch::Sender<Option<User>>,
}

impl<U: UserLookup> std::fmt::Debug for Session<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.store)
            .field("user", &self.current_user_id())
            .finish()
    }
}

impl<U: UserLookup> Session<U> {
    /// Restore whatever user the store holds.
    pub fn open(store: SessionStore, users: Arc<U>) -> Result<Self, TrackError> {
        let user = store.load()?;
        if let Some(u) = &user {
            debug!(user_id = %u.id, "session restored");
        }
        let (current, _) = watch::channel(user);
        Ok(Self {
            store,
            users,
            current,
        })
    }

    pub fn current(&self) -> Option<User> {
        self.current.borrow().clone()
    }

    pub fn current_user_id(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|u| u.id.clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// The current user, or [`TrackError::NotLoggedIn`].
    pub fn require_user(&self) -> Result<User, TrackError> {
        self.current().ok_or(TrackError::NotLoggedIn)
    }

    pub async fn login_by_email(&self, email: &str) -> Result<User, TrackError> {
        let user = self.users.user_by_email(email).await?;
        self.set_user(user.clone())?;
        info!(user_id = %user.id, "logged in");
        Ok(user)
    }

    pub async fn login_by_id(&self, id: &str) -> Result<User, TrackError> {
        let user = self.users.user_by_id(id).await?;
        self.set_user(user.clone())?;
        info!(user_id = %user.id, "logged in");
        Ok(user)
    }

    /// Replace the stored user, e.g. after registering or editing the profile.
    pub fn set_user(&self, user: User) -> Result<(), TrackError> {
        self.store.save(&user)?;
        self.current.send_replace(Some(user));
        Ok(())
    }

    pub fn logout(&self) -> Result<(), TrackError> {
        self.store.clear()?;
        if let Some(previous) = self.current.send_replace(None) {
            info!(user_id = %previous.id, "logged out");
        }
        Ok(())
    }

    /// Observe login and logout.
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.current.subscribe()
    }
}
