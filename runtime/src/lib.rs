//! # Freekick Runtime
//!
//! Runtime implementation for the Freekick admin state architecture.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that manages state and executes effects
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to reducers
//! - **Event Loop**: Manages the action → reducer → effects → action feedback loop
//!
//! ## Example
//!
//! ```ignore
//! use freekick_runtime::Store;
//!
//! let store = Store::new(
//!     AppState::default(),
//!     AppReducer::new(),
//!     environment,
//! );
//!
//! // Dispatch an intent; the handle resolves once its service call settles
//! let mut handle = store.send(AppAction::Bookings(ResourceAction::fetch())).await?;
//! handle.wait().await;
//!
//! // Read state
//! let count = store.state(|s| s.bookings.pagination.count).await;
//! ```

use freekick_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};

/// Prometheus metrics for observability
pub mod metrics;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// A task join error occurred during effect execution
        ///
        /// This typically means a spawned task panicked.
        #[error("Task failed during effect execution: {0}")]
        TaskJoinError(#[from] tokio::task::JoinError),

        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for terminal action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```ignore
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(64)
///     .with_shutdown_timeout(Duration::from_secs(5));
///
/// let store = Store::with_config(state, reducer, env, config);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of actions buffered for slow observers
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(broadcast_capacity: usize, default_shutdown_timeout: Duration) -> Self {
        Self {
            broadcast_capacity,
            default_shutdown_timeout,
        }
    }

    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            default_shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects of one
/// action to complete. An effect counts as complete once the action it
/// produced (if any) has itself been reduced, so awaiting the handle of an
/// intent observes the matching fulfilled/rejected state.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(AppAction::Auth(AuthAction::CheckAuth)).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    ///
    /// Useful for initialization in loops where you need a `last_handle`.
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running for this action
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all
    /// effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements the effect counter on drop
///
/// Ensures the counter is always decremented, even if the effect panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect,
        EffectHandle, EffectTracking, Ordering, Reducer, RwLock, StoreConfig, StoreError,
    };
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (transition logic)
    /// 3. Environment (injected service clients)
    /// 4. Effect execution (with feedback loop)
    ///
    /// Reducer calls are serialized by the write lock, so every slice
    /// transition is atomic with respect to readers. Effects run on spawned
    /// tasks and may settle in any order.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        config: StoreConfig,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Every action produced by an effect is broadcast here before it is
        /// fed back into the reducer.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default()`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                config,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// Access the injected environment
        #[must_use]
        pub const fn environment(&self) -> &E {
            &self.environment
        }

        /// Number of effects currently running across all actions
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Initiate graceful shutdown of the store
        ///
        /// Sets the shutdown flag (rejecting new actions), then waits for
        /// pending effects to complete.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timeout");
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tracing::debug!(
                    pending_effects = pending,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Waiting for effects to complete"
                );

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Shut down using the configured default timeout
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
        /// when [`StoreConfig::default_shutdown_timeout`] elapses.
        pub async fn shutdown_default(&self) -> Result<(), StoreError> {
            self.shutdown(self.config.default_shutdown_timeout).await
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Executes returned effects asynchronously
        /// 4. Effects may produce more actions (feedback loop)
        ///
        /// `send()` returns after starting effect execution, not completion.
        /// Use the returned [`EffectHandle`] to wait.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            tracing::debug!("Processing action");
            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());

                // Precision loss acceptable for metrics (effect counts < 2^52)
                #[allow(clippy::cast_precision_loss)]
                metrics::histogram!("store.effects.count").record(effects.len() as f64);

                effects
            };

            for effect in effects {
                self.execute_effect(effect, &tracking);
            }

            Ok(handle)
        }

        /// Send an action and wait for a matching result action
        ///
        /// Subscribes to the action broadcast before sending, so an outcome
        /// produced by a fast effect cannot be missed.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: Timeout expired before matching action received
        /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: Store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            R: Clone,
            E: Clone,
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to all actions produced by effects
        ///
        /// Only actions produced by effects are broadcast, not the ones
        /// passed to `send`.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read state through a closure
        ///
        /// The read lock is held only for the duration of `f`.
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        fn spawn_tracked<F>(&self, tracking: &EffectTracking, task: F)
        where
            F: std::future::Future<Output = ()> + Send + 'static,
        {
            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);

            let guard = DecrementGuard(tracking.clone());
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

            tokio::spawn(async move {
                let _guard = guard;
                let _pending_guard = pending_guard;
                task.await;
            });
        }

        async fn feed_back(&self, action: A)
        where
            R: Clone,
            E: Clone,
        {
            let _ = self.action_broadcast.send(action.clone());

            match self.send(action).await {
                Ok(mut handle) => handle.wait().await,
                Err(error) => tracing::debug!(%error, "Dropped effect output"),
            }
        }

        #[tracing::instrument(skip(self, effect, tracking), name = "execute_effect")]
        fn execute_effect(&self, effect: Effect<A>, tracking: &EffectTracking)
        where
            R: Clone,
            E: Clone,
        {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    tracing::trace!("Executing Effect::Future");
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);

                    let store = self.clone();
                    self.spawn_tracked(tracking, async move {
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action");
                            Box::pin(store.feed_back(action)).await;
                        }
                    });
                },
                Effect::Delay { duration, action } => {
                    tracing::trace!(?duration, "Executing Effect::Delay");
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);

                    let store = self.clone();
                    self.spawn_tracked(tracking, async move {
                        tokio::time::sleep(duration).await;
                        Box::pin(store.feed_back(*action)).await;
                    });
                },
                Effect::Parallel(effects) => {
                    tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                    metrics::counter!("store.effects.executed", "type" => "parallel")
                        .increment(1);

                    for effect in effects {
                        self.execute_effect(effect, tracking);
                    }
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                config: self.config.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

pub use store::Store;

#[cfg(test)]
mod tests {
    use super::*;
    use freekick_core::{SmallVec, smallvec};

    /// A miniature list slice: requests go out, rows come back
    #[derive(Debug, Clone, Default)]
    struct ListState {
        rows: Vec<u32>,
        in_flight: u32,
        search: Option<String>,
    }

    #[derive(Debug, Clone)]
    enum ListAction {
        /// Request row `id`
        Load(u32),
        /// Row `id` arrived
        Loaded(u32),
        /// Debounced search: the load fires after a delay
        Search(String),
        /// Load every id concurrently
        LoadAll(Vec<u32>),
        /// Reload row `id` through a second request
        Refresh(u32),
        /// Synchronous clear, no effect
        Clear,
        /// Request whose service call panics
        Crash,
    }

    #[derive(Debug, Clone)]
    struct ListEnv;

    #[derive(Debug, Clone)]
    struct ListReducer;

    fn request(id: u32) -> Effect<ListAction> {
        Effect::Future(Box::pin(async move { Some(ListAction::Loaded(id)) }))
    }

    impl Reducer for ListReducer {
        type State = ListState;
        type Action = ListAction;
        type Environment = ListEnv;

        fn reduce(
            &self,
            state: &mut ListState,
            action: ListAction,
            _env: &ListEnv,
        ) -> SmallVec<[Effect<ListAction>; 4]> {
            match action {
                ListAction::Load(id) => {
                    state.in_flight += 1;
                    smallvec![request(id)]
                },
                ListAction::Loaded(id) => {
                    state.in_flight = state.in_flight.saturating_sub(1);
                    state.rows.push(id);
                    SmallVec::new()
                },
                ListAction::Search(query) => {
                    let id = u32::try_from(query.len()).unwrap_or(u32::MAX);
                    state.search = Some(query);
                    smallvec![Effect::Delay {
                        duration: Duration::from_millis(10),
                        action: Box::new(ListAction::Load(id)),
                    }]
                },
                ListAction::LoadAll(ids) => {
                    state.in_flight += u32::try_from(ids.len()).unwrap_or(u32::MAX);
                    smallvec![Effect::Parallel(ids.into_iter().map(request).collect())]
                },
                ListAction::Refresh(id) => {
                    smallvec![Effect::Future(Box::pin(async move {
                        Some(ListAction::Load(id))
                    }))]
                },
                ListAction::Clear => {
                    state.rows.clear();
                    smallvec![Effect::None]
                },
                ListAction::Crash => {
                    #[allow(clippy::panic)] // Panicking service call under test
                    {
                        smallvec![Effect::Future(Box::pin(async {
                            panic!("service call blew up");
                        }))]
                    }
                },
            }
        }
    }

    fn store() -> Store<ListState, ListAction, ListEnv, ListReducer> {
        Store::new(ListState::default(), ListReducer, ListEnv)
    }

    #[tokio::test]
    async fn test_sync_action_applies_before_send_returns() -> Result<(), StoreError> {
        let store = Store::new(
            ListState {
                rows: vec![1, 2],
                ..ListState::default()
            },
            ListReducer,
            ListEnv,
        );

        let handle = store.send(ListAction::Clear).await?;
        assert_eq!(handle.pending(), 0);
        assert!(store.state(|s| s.rows.is_empty()).await);
        Ok(())
    }

    #[tokio::test]
    async fn test_pending_state_is_visible_before_outcome() -> Result<(), StoreError> {
        let store = store();

        let mut handle = store.send(ListAction::Load(7)).await?;
        // The reducer ran under the write lock; the request may still be out
        assert!(store.state(|s| s.in_flight <= 1).await);

        handle.wait_with_timeout(Duration::from_secs(1)).await?;
        let (rows, in_flight) = store.state(|s| (s.rows.clone(), s.in_flight)).await;
        assert_eq!(rows, vec![7]);
        assert_eq!(in_flight, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_handle_waits_for_follow_up_requests() -> Result<(), StoreError> {
        let store = store();

        let mut handle = store.send(ListAction::Refresh(3)).await?;
        handle.wait_with_timeout(Duration::from_secs(1)).await?;

        assert_eq!(store.state(|s| s.rows.clone()).await, vec![3]);
        Ok(())
    }

    #[tokio::test]
    async fn test_delayed_search_loads_after_debounce() -> Result<(), StoreError> {
        let store = store();

        let mut handle = store.send(ListAction::Search("dubai".into())).await?;
        assert!(store.state(|s| s.rows.is_empty()).await);

        handle.wait_with_timeout(Duration::from_secs(1)).await?;
        let (rows, search) = store.state(|s| (s.rows.clone(), s.search.clone())).await;
        assert_eq!(rows, vec![5]);
        assert_eq!(search.as_deref(), Some("dubai"));
        Ok(())
    }

    #[tokio::test]
    async fn test_parallel_requests_all_settle() -> Result<(), StoreError> {
        let store = store();

        let mut handle = store.send(ListAction::LoadAll(vec![1, 2, 3])).await?;
        handle.wait_with_timeout(Duration::from_secs(1)).await?;

        let mut rows = store.state(|s| s.rows.clone()).await;
        rows.sort_unstable();
        assert_eq!(rows, vec![1, 2, 3]);
        assert_eq!(store.state(|s| s.in_flight).await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_outcomes_are_broadcast_but_intents_are_not() -> Result<(), StoreError> {
        let store = store();
        let mut observer = store.subscribe_actions();

        let mut handle = store.send(ListAction::Load(2)).await?;
        handle.wait_with_timeout(Duration::from_secs(1)).await?;

        assert!(matches!(observer.try_recv(), Ok(ListAction::Loaded(2))));
        assert!(observer.try_recv().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_send_and_wait_for_returns_matching_outcome() -> Result<(), StoreError> {
        let store = store();

        let outcome = store
            .send_and_wait_for(
                ListAction::Load(11),
                |action| matches!(action, ListAction::Loaded(_)),
                Duration::from_secs(1),
            )
            .await?;

        assert!(matches!(outcome, ListAction::Loaded(11)));
        Ok(())
    }

    #[tokio::test]
    #[allow(clippy::panic)] // Tests are allowed to panic on failures
    async fn test_concurrent_sends_are_serialized() {
        let store = store();

        let tasks: Vec<_> = (0..10)
            .map(|id| {
                let store = store.clone();
                tokio::spawn(async move {
                    if let Ok(mut handle) = store.send(ListAction::Load(id)).await {
                        handle.wait().await;
                    }
                })
            })
            .collect();

        for task in tasks {
            if let Err(e) = task.await {
                panic!("send task panicked: {e}");
            }
        }

        let (rows, in_flight) = store.state(|s| (s.rows.len(), s.in_flight)).await;
        assert_eq!(rows, 10);
        assert_eq!(in_flight, 0);
    }

    #[tokio::test]
    async fn test_panicking_request_does_not_poison_store() -> Result<(), StoreError> {
        let store = store();

        let mut handle = store.send(ListAction::Crash).await?;
        handle.wait_with_timeout(Duration::from_secs(1)).await?;

        let mut handle = store.send(ListAction::Load(1)).await?;
        handle.wait_with_timeout(Duration::from_secs(1)).await?;
        assert_eq!(store.state(|s| s.rows.clone()).await, vec![1]);
        assert_eq!(store.pending_effects(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_actions() -> Result<(), StoreError> {
        let store = store();

        store.shutdown(Duration::from_secs(1)).await?;

        let result = store.send(ListAction::Clear).await;
        assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown_drains_in_flight_requests() -> Result<(), StoreError> {
        let store = store();

        store.send(ListAction::Search("abu dhabi".into())).await?;
        store.shutdown(Duration::from_secs(1)).await?;

        assert_eq!(store.pending_effects(), 0);
        // The debounced load arrived after shutdown began and was dropped
        assert!(store.state(|s| s.rows.is_empty()).await);
        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown_timeout_reports_pending_effects() -> Result<(), StoreError> {
        let store = store();

        store.send(ListAction::Search("sharjah".into())).await?;
        let result = store.shutdown(Duration::ZERO).await;

        assert!(matches!(result, Err(StoreError::ShutdownTimeout(1))));
        Ok(())
    }

    #[tokio::test]
    async fn test_completed_handle() {
        let mut handle = EffectHandle::completed();
        assert_eq!(handle.pending(), 0);
        handle.wait().await;
    }

    #[test]
    fn test_store_config_builders() {
        let config = StoreConfig::default()
            .with_broadcast_capacity(64)
            .with_shutdown_timeout(Duration::from_secs(5));

        assert_eq!(config.broadcast_capacity, 64);
        assert_eq!(config.default_shutdown_timeout, Duration::from_secs(5));
        assert_eq!(StoreConfig::default().broadcast_capacity, 16);
    }
}
