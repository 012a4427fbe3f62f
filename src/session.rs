//! Process-wide holder of the bearer token.
//!
//! Every data-fetching collaborator gets an `Arc<Session>`; nothing else reads
//! or writes the token. The token lives in one file (`session.json`) and is
//! cleared through one path, [`Session::invalidate`].

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    token: Option<String>,
}

#[derive(Debug)]
pub struct Session {
    path: Option<PathBuf>,
    token: Mutex<Option<String>>,
    login_required: AtomicBool,
}

impl Session {
    /// Loads the persisted token from `path`, if any.
    pub fn load(path: PathBuf) -> Self {
        let token = match read_token(&path) {
            Ok(token) => token,
            Err(err) => {
                tracing::debug!("no stored session: {err:#}");
                None
            }
        };
        Self {
            path: Some(path),
            token: Mutex::new(token),
            login_required: AtomicBool::new(false),
        }
    }

    /// A session that never touches disk.
    pub fn in_memory(token: Option<String>) -> Self {
        Self {
            path: None,
            token: Mutex::new(token.filter(|t| !t.trim().is_empty())),
            login_required: AtomicBool::new(false),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn set_token(&self, token: &str) -> anyhow::Result<()> {
        let token = token.trim();
        if token.is_empty() {
            anyhow::bail!("token is empty");
        }
        if let Ok(mut guard) = self.token.lock() {
            *guard = Some(token.to_string());
        }
        self.login_required.store(false, Ordering::SeqCst);
        self.persist()
    }

    /// Clears the token and flags a login redirect. Called on HTTP 401 and on
    /// explicit logout.
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = None;
        }
        self.login_required.store(true, Ordering::SeqCst);
        if let Err(err) = self.persist() {
            tracing::warn!("failed to clear stored session: {err:#}");
        }
        tracing::info!("session invalidated");
    }

    /// Returns `true` once per invalidation; the caller navigates to login.
    pub fn take_login_redirect(&self) -> bool {
        self.login_required.swap(false, Ordering::SeqCst)
    }

    fn persist(&self) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let stored = StoredSession { token: self.token() };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("create config dir")?;
        }
        let json = serde_json::to_string_pretty(&stored).context("serialize session")?;
        fs::write(path, json).context("write session")
    }
}

fn read_token(path: &Path) -> anyhow::Result<Option<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read session at {}", path.display()))?;
    let stored: StoredSession = serde_json::from_str(&contents).context("parse session")?;
    Ok(stored.token.filter(|t| !t.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let session = Session::load(path.clone());
        assert!(!session.is_authenticated());
        session.set_token("  abc123 ").unwrap();

        let reloaded = Session::load(path);
        assert_eq!(reloaded.token().as_deref(), Some("abc123"));
    }

    #[test]
    fn invalidate_clears_disk_and_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let session = Session::load(path.clone());
        session.set_token("abc123").unwrap();

        session.invalidate();
        assert!(session.token().is_none());
        assert!(Session::load(path).token().is_none());
    }

    #[test]
    fn login_redirect_fires_once_per_invalidation() {
        let session = Session::in_memory(Some("tok".into()));
        assert!(!session.take_login_redirect());

        session.invalidate();
        assert!(session.take_login_redirect());
        assert!(!session.take_login_redirect());
    }

    #[test]
    fn empty_token_is_rejected() {
        let session = Session::in_memory(None);
        assert!(session.set_token("   ").is_err());
        assert!(!session.is_authenticated());
    }
}
