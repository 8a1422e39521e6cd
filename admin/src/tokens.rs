//! Durable session token storage

use freekick_core::environment::{TokenPair, TokenStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// On-disk layout: the two keys the web console keeps in local storage
#[derive(Debug, Serialize, Deserialize)]
struct PersistedTokens {
    #[serde(rename = "authToken")]
    auth_token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
}

/// Token store persisted as a small JSON file
///
/// The file is read once at construction and written through on every
/// change. Both tokens are written and removed together.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cached: RwLock<Option<TokenPair>>,
}

impl FileTokenStore {
    /// Open the store at `path`, loading an existing session if the file is valid
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cached = load(&path);
        if cached.is_some() {
            tracing::debug!(path = %path.display(), "Loaded persisted session");
        }
        Self {
            path,
            cached: RwLock::new(cached),
        }
    }

    /// Location of the token file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, tokens: &TokenPair) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_vec_pretty(&PersistedTokens {
            auth_token: tokens.access.clone(),
            refresh_token: tokens.refresh.clone(),
        })?;
        std::fs::write(&self.path, body)
    }
}

fn load(path: &Path) -> Option<TokenPair> {
    let bytes = std::fs::read(path).ok()?;
    match serde_json::from_slice::<PersistedTokens>(&bytes) {
        Ok(persisted) => Some(TokenPair {
            access: persisted.auth_token,
            refresh: persisted.refresh_token,
        }),
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "Ignoring unreadable token file");
            None
        },
    }
}

impl TokenStore for FileTokenStore {
    fn access_token(&self) -> Option<String> {
        self.cached
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|t| t.access.clone()))
    }

    fn refresh_token(&self) -> Option<String> {
        self.cached
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|t| t.refresh.clone()))
    }

    fn store(&self, tokens: &TokenPair) {
        if let Err(error) = self.persist(tokens) {
            tracing::warn!(path = %self.path.display(), %error, "Failed to persist session tokens");
        }
        if let Ok(mut guard) = self.cached.write() {
            *guard = Some(tokens.clone());
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.cached.write() {
            *guard = None;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed session tokens"),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {},
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "Failed to remove token file");
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scratch_path(name: &str) -> PathBuf {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir()
            .join(format!("freekick-tokens-{}-{n}", std::process::id()))
            .join(name)
    }

    fn pair() -> TokenPair {
        TokenPair {
            access: "access-1".into(),
            refresh: "refresh-1".into(),
        }
    }

    #[test]
    fn store_writes_both_keys() {
        let path = scratch_path("tokens.json");
        let store = FileTokenStore::open(&path);

        store.store(&pair());

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["authToken"], "access-1");
        assert_eq!(raw["refreshToken"], "refresh-1");
        assert_eq!(store.access_token().as_deref(), Some("access-1"));
    }

    #[test]
    fn reopening_restores_the_session() {
        let path = scratch_path("tokens.json");
        FileTokenStore::open(&path).store(&pair());

        let reopened = FileTokenStore::open(&path);
        assert_eq!(reopened.refresh_token().as_deref(), Some("refresh-1"));
    }

    #[test]
    fn clear_removes_file_and_both_tokens() {
        let path = scratch_path("tokens.json");
        let store = FileTokenStore::open(&path);
        store.store(&pair());

        store.clear();

        assert!(!path.exists());
        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());
        assert!(FileTokenStore::open(&path).access_token().is_none());
    }

    #[test]
    fn corrupt_file_is_ignored() {
        let path = scratch_path("tokens.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{not json").unwrap();

        assert!(FileTokenStore::open(&path).access_token().is_none());
    }
}
