//! # Freekick Testing
//!
//! Testing utilities and helpers for the Freekick admin state architecture.
//!
//! This crate provides:
//! - [`ReducerTest`], a Given-When-Then harness for slice reducers
//! - Effect assertions and an executor that resolves effects without a Store
//! - Token-store fixtures
//! - Store helpers for orchestration tests
//!
//! ## Example
//!
//! ```ignore
//! use freekick_testing::{signed_in_tokens, store::settle};
//!
//! #[tokio::test]
//! async fn fetch_bookings() {
//!     let store = AdminStore::new(AppState::default(), AppReducer::new(), scripted_env());
//!     settle(&store, AppAction::Bookings(ResourceAction::fetch())).await?;
//!
//!     let count = store.state(|s| s.bookings.items.len()).await;
//!     assert_eq!(count, 2);
//! }
//! ```

/// Ergonomic reducer testing utilities
pub mod reducer_test;

pub use reducer_test::{assertions, ReducerTest};

use freekick_core::environment::{MemoryTokenStore, TokenPair};
use std::sync::Arc;

/// Session token fixtures
pub mod mocks {
    use super::{Arc, MemoryTokenStore, TokenPair};

    /// Deterministic token pair for tests
    #[must_use]
    pub fn test_tokens() -> TokenPair {
        TokenPair {
            access: "test-access-token".to_string(),
            refresh: "test-refresh-token".to_string(),
        }
    }

    /// Token store holding [`test_tokens`]
    #[must_use]
    pub fn signed_in_tokens() -> Arc<MemoryTokenStore> {
        Arc::new(MemoryTokenStore::with_tokens(test_tokens()))
    }

    /// Empty token store
    #[must_use]
    pub fn signed_out_tokens() -> Arc<MemoryTokenStore> {
        Arc::new(MemoryTokenStore::new())
    }
}

/// Effect execution without a Store
///
/// Reducer tests get effect descriptions back. These helpers run them so
/// the produced outcome actions can be fed into the next `ReducerTest`.
pub mod effects {
    use freekick_core::effect::Effect;
    use futures::future::BoxFuture;

    /// Execute `effect` and collect every action it produces
    ///
    /// `Parallel` children run concurrently; their actions are reported in
    /// declaration order.
    ///
    /// `Delay` effects are returned immediately, without sleeping.
    pub fn collect_actions<A: Send + 'static>(effect: Effect<A>) -> BoxFuture<'static, Vec<A>> {
        Box::pin(async move {
            match effect {
                Effect::None => Vec::new(),
                Effect::Future(fut) => fut.await.into_iter().collect(),
                Effect::Delay { action, .. } => vec![*action],
                Effect::Parallel(effects) => {
                    futures::future::join_all(effects.into_iter().map(collect_actions))
                        .await
                        .into_iter()
                        .flatten()
                        .collect()
                },
            }
        })
    }

    /// Execute every effect in `effects` and collect the produced actions
    pub async fn collect_all<A, I>(effects: I) -> Vec<A>
    where
        A: Send + 'static,
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut actions = Vec::new();
        for effect in effects {
            actions.extend(collect_actions(effect).await);
        }
        actions
    }
}

/// Store helpers for orchestration tests
pub mod store {
    use freekick_core::reducer::Reducer;
    use freekick_runtime::{Store, StoreError};
    use std::time::Duration;

    /// How long [`settle`] waits before giving up
    pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Send `action` and wait until all of its effects (and their outcomes) are reduced
    ///
    /// # Errors
    ///
    /// Returns the store's error if the action is rejected, or
    /// [`StoreError::Timeout`] if the effects do not settle in time.
    pub async fn settle<S, A, E, R>(store: &Store<S, A, E, R>, action: A) -> Result<(), StoreError>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        let mut handle = store.send(action).await?;
        handle.wait_with_timeout(SETTLE_TIMEOUT).await
    }
}

/// Install a test subscriber honoring `RUST_LOG`
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub use mocks::{signed_in_tokens, signed_out_tokens, test_tokens};
