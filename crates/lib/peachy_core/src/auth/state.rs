//! Pending sign-ins.
//!
//! A sign-in starts by minting a CSRF `state` value that travels through
//! Discord's authorize page and comes back on the callback. Until then the
//! store remembers which provider was asked and where the user lands
//! afterwards. Each state is accepted once and only within its TTL.

use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine;
use dashmap::DashMap;
use rand::RngCore;
use tracing::debug;

/// Default lifetime of a pending sign-in.
pub const SIGN_IN_TTL: Duration = Duration::from_secs(600);

/// How often the background task evicts stale entries.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Random URL-safe CSRF value, 192 bits.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 24];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// What a callback needs to finish the sign-in it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSignIn {
    pub provider_id: String,
    /// App-relative path to land on after a successful sign-in.
    pub callback_path: String,
}

#[derive(Debug)]
struct Entry {
    pending: PendingSignIn,
    started_at: Instant,
}

/// Pending sign-ins keyed by their CSRF state.
#[derive(Debug)]
pub struct SignInStateStore {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

impl SignInStateStore {
    pub fn new() -> Self {
        Self::with_ttl(SIGN_IN_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Record a new sign-in and return the state to send to the provider.
    pub fn begin(&self, provider_id: &str, callback_path: impl Into<String>) -> String {
        let state = generate_state();
        self.entries.insert(
            state.clone(),
            Entry {
                pending: PendingSignIn {
                    provider_id: provider_id.to_string(),
                    callback_path: callback_path.into(),
                },
                started_at: Instant::now(),
            },
        );
        state
    }

    /// Consume `state`. Unknown, reused and stale states yield `None`.
    pub fn complete(&self, state: &str) -> Option<PendingSignIn> {
        let (_, entry) = self.entries.remove(state)?;
        if entry.started_at.elapsed() > self.ttl {
            debug!("sign-in state expired");
            return None;
        }
        Some(entry.pending)
    }

    /// Drop stale entries, returning how many were evicted.
    pub fn cleanup(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.started_at.elapsed() <= self.ttl);
        before.saturating_sub(self.entries.len())
    }

    /// Run [`cleanup`](Self::cleanup) every minute for the life of the process.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                let evicted = store.cleanup();
                if evicted > 0 {
                    debug!(evicted, "evicted stale sign-in states");
                }
            }
        })
    }
}

impl Default for SignInStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_are_unique_and_url_safe() {
        let a = generate_state();
        assert_ne!(a, generate_state());
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn state_is_single_use() {
        let store = SignInStateStore::new();
        let state = store.begin("discord", "/guilds");

        let pending = store.complete(&state).expect("pending sign-in");
        assert_eq!(pending.provider_id, "discord");
        assert_eq!(pending.callback_path, "/guilds");
        assert!(store.complete(&state).is_none());
    }

    #[test]
    fn unknown_state_is_rejected() {
        let store = SignInStateStore::new();
        store.begin("discord", "/dashboard");
        assert!(store.complete("forged").is_none());
    }

    #[test]
    fn stale_state_is_rejected() {
        let store = SignInStateStore::with_ttl(Duration::ZERO);
        let state = store.begin("discord", "/dashboard");
        std::thread::sleep(Duration::from_millis(5));
        assert!(store.complete(&state).is_none());
    }

    #[test]
    fn cleanup_counts_evictions() {
        let store = SignInStateStore::with_ttl(Duration::ZERO);
        store.begin("discord", "/a");
        store.begin("discord", "/b");
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.cleanup(), 2);
        assert_eq!(store.cleanup(), 0);
    }

    #[tokio::test]
    async fn cleanup_task_can_be_aborted() {
        let store = Arc::new(SignInStateStore::new());
        let handle = store.spawn_cleanup_task();
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
