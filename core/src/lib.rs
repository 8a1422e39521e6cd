//! # Freekick Core
//!
//! Core traits and types for the Freekick admin state architecture.
//!
//! Every resource the admin console manages (bookings, tickets, banners, teams,
//! venues) lives in a *slice*: a plain state struct mutated only by a reducer.
//! Network I/O never happens inside a reducer. Instead the reducer returns
//! [`Effect`](effect::Effect) descriptions which the runtime executes, feeding
//! their outcome actions back through the same reducer.
//!
//! ## Core Concepts
//!
//! - **State**: The slice data (collection, current record, pagination, lifecycle flags)
//! - **Action**: Intents (`Fetch`, `Create`, ...) and settled outcomes (`Fetched`, `Rejected`, ...)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected service clients and the token store
//!
//! ## Example
//!
//! ```ignore
//! use freekick_core::*;
//!
//! impl Reducer for BannerReducer {
//!     type State = BannerState;
//!     type Action = BannerAction;
//!     type Environment = BannerEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut BannerState,
//!         action: BannerAction,
//!         env: &BannerEnvironment,
//!     ) -> SmallVec<[Effect<BannerAction>; 4]> {
//!         // Lifecycle transitions go here
//!         SmallVec::new()
//!     }
//! }
//! ```

pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

/// Reducer composition utilities
pub mod composition;

/// Declarative macros for constructing effects
pub mod effect_macros;

pub use effect::Effect;
pub use reducer::Reducer;

/// Reducer module - The core trait for slice logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They hold every lifecycle transition of a slice and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for slice logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The slice state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for TicketReducer {
    ///     type State = ResourceState;
    ///     type Action = ResourceAction;
    ///     type Environment = ResourceEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut ResourceState,
    ///         action: ResourceAction,
    ///         env: &ResourceEnvironment,
    ///     ) -> SmallVec<[Effect<ResourceAction>; 4]> {
    ///         match action {
    ///             ResourceAction::Fetch { filters } => {
    ///                 state.list.begin();
    ///                 smallvec![/* call the service client */]
    ///             }
    ///             _ => SmallVec::new(),
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Updates state in place
        /// 2. Returns effect descriptions to be executed
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// The effects to be executed by the runtime
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and can be composed and re-targeted.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects concurrently, each feeding back on its own
        Parallel(Vec<Effect<Action>>),

        /// Delayed action
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Returns true for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }

        /// Re-target an effect so the actions it produces become parent actions
        ///
        /// Used when a slice reducer is embedded in an application reducer: the
        /// child produces `Effect<ChildAction>`, the parent needs `Effect<AppAction>`.
        ///
        /// ```
        /// use freekick_core::effect::Effect;
        ///
        /// #[derive(Debug)]
        /// enum Child { Loaded }
        /// #[derive(Debug)]
        /// enum App { Child(Child) }
        ///
        /// let lifted: Effect<App> = Effect::<Child>::None.map(App::Child);
        /// assert!(lifted.is_none());
        /// ```
        #[must_use]
        pub fn map<B, F>(self, f: F) -> Effect<B>
        where
            F: Fn(Action) -> B + Clone + Send + Sync + 'static,
            Action: Send + 'static,
            B: Send + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Parallel(effects) => Effect::Parallel(
                    effects.into_iter().map(|e| e.map(f.clone())).collect(),
                ),
                Effect::Delay { duration, action } => Effect::Delay {
                    duration,
                    action: Box::new(f(*action)),
                },
                Effect::Future(fut) => {
                    Effect::Future(Box::pin(async move { fut.await.map(f) }))
                },
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use serde::{Deserialize, Serialize};
    use std::sync::RwLock;

    /// Access + refresh token pair issued by the auth endpoint
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TokenPair {
        /// Bearer token attached to every request
        pub access: String,
        /// Token exchanged for a new access token
        pub refresh: String,
    }

    /// Durable storage for the session tokens
    ///
    /// Single writer (the auth flow), many readers (the transport's request
    /// decoration). Both tokens are always stored and cleared together.
    ///
    /// # Examples
    ///
    /// ```
    /// use freekick_core::environment::{MemoryTokenStore, TokenPair, TokenStore};
    ///
    /// let tokens = MemoryTokenStore::new();
    /// tokens.store(&TokenPair { access: "a".into(), refresh: "r".into() });
    /// assert_eq!(tokens.access_token().as_deref(), Some("a"));
    ///
    /// tokens.clear();
    /// assert!(tokens.refresh_token().is_none());
    /// ```
    pub trait TokenStore: Send + Sync {
        /// Current access token, if any
        fn access_token(&self) -> Option<String>;

        /// Current refresh token, if any
        fn refresh_token(&self) -> Option<String>;

        /// Persist both tokens
        fn store(&self, tokens: &TokenPair);

        /// Remove both tokens
        fn clear(&self);
    }

    /// In-memory token store
    ///
    /// Lives as long as the process. Used by tests and ephemeral sessions.
    #[derive(Debug, Default)]
    pub struct MemoryTokenStore {
        tokens: RwLock<Option<TokenPair>>,
    }

    impl MemoryTokenStore {
        /// Create an empty store
        #[must_use]
        pub const fn new() -> Self {
            Self {
                tokens: RwLock::new(None),
            }
        }

        /// Create a store already holding a session
        #[must_use]
        pub const fn with_tokens(tokens: TokenPair) -> Self {
            Self {
                tokens: RwLock::new(Some(tokens)),
            }
        }
    }

    impl TokenStore for MemoryTokenStore {
        fn access_token(&self) -> Option<String> {
            self.tokens
                .read()
                .ok()
                .and_then(|guard| guard.as_ref().map(|t| t.access.clone()))
        }

        fn refresh_token(&self) -> Option<String> {
            self.tokens
                .read()
                .ok()
                .and_then(|guard| guard.as_ref().map(|t| t.refresh.clone()))
        }

        fn store(&self, tokens: &TokenPair) {
            if let Ok(mut guard) = self.tokens.write() {
                *guard = Some(tokens.clone());
            }
        }

        fn clear(&self) {
            if let Ok(mut guard) = self.tokens.write() {
                *guard = None;
            }
        }
    }
}
