//! Reducer composition
//!
//! An application is a set of independent slices. Each slice has its own
//! state, action and environment types, and knows nothing about the others.
//! Two tools assemble them into one reducer the Store can drive:
//!
//! - [`scope_reducer`] lifts a slice reducer onto one field of the
//!   application state and one variant of the application action.
//! - [`combine_reducers`] offers every action to each scoped slice in turn.
//!
//! ```
//! use freekick_core::{Effect, Reducer, SmallVec};
//! use freekick_core::composition::{SharedReducer, combine_reducers, scope_reducer};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Session { signed_in: bool }
//!
//! #[derive(Clone)]
//! enum SessionAction { SignIn, SignOut }
//!
//! struct SessionReducer;
//!
//! impl Reducer for SessionReducer {
//!     type State = Session;
//!     type Action = SessionAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut Session, action: SessionAction, _env: &()) -> SmallVec<[Effect<SessionAction>; 4]> {
//!         state.signed_in = matches!(action, SessionAction::SignIn);
//!         SmallVec::new()
//!     }
//! }
//!
//! #[derive(Default)]
//! struct App { session: Session, visits: u32 }
//!
//! #[derive(Clone)]
//! enum AppAction { Session(SessionAction), Visit }
//!
//! struct VisitReducer;
//!
//! impl Reducer for VisitReducer {
//!     type State = App;
//!     type Action = AppAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut App, action: AppAction, _env: &()) -> SmallVec<[Effect<AppAction>; 4]> {
//!         if matches!(action, AppAction::Visit) {
//!             state.visits += 1;
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! let session: SharedReducer<App, AppAction, ()> = Arc::new(scope_reducer(
//!     SessionReducer,
//!     |app: &mut App| &mut app.session,
//!     |action: AppAction| match action {
//!         AppAction::Session(inner) => Some(inner),
//!         AppAction::Visit => None,
//!     },
//!     AppAction::Session,
//!     |env: &()| env,
//! ));
//! let visits: SharedReducer<App, AppAction, ()> = Arc::new(VisitReducer);
//! let app = combine_reducers(vec![session, visits]);
//!
//! let mut state = App::default();
//! let _ = app.reduce(&mut state, AppAction::Session(SessionAction::SignIn), &());
//! let _ = app.reduce(&mut state, AppAction::Visit, &());
//! assert!(state.session.signed_in);
//! assert_eq!(state.visits, 1);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;
use std::sync::Arc;

/// A shareable reducer trait object
pub type SharedReducer<S, A, E> = Arc<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Offer every action to each reducer, in order, and concatenate their effects
///
/// Cloning the result only bumps reference counts, so the Store can hold it.
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<SharedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer { reducers }
}

/// Reducers sharing one state and action type. Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    reducers: Vec<SharedReducer<S, A, E>>,
}

impl<S, A, E> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    /// Number of combined reducers
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Whether nothing was combined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A, E> Clone for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    fn clone(&self) -> Self {
        Self {
            reducers: self.reducers.clone(),
        }
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        self.reducers
            .iter()
            .flat_map(|reducer| reducer.reduce(state, action.clone(), env))
            .collect()
    }
}

/// Lift a slice reducer into an application reducer
///
/// - `state` focuses the application state on the slice
/// - `extract` picks the slice action out of an application action; any other
///   variant is ignored and produces no effects
/// - `embed` wraps actions produced by the slice's effects
/// - `env` focuses the application environment on the slice's dependencies
///
/// See the [module documentation](self) for an example.
pub const fn scope_reducer<S, SubS, A, SubA, E, SubE, R>(
    reducer: R,
    state: fn(&mut S) -> &mut SubS,
    extract: fn(A) -> Option<SubA>,
    embed: fn(SubA) -> A,
    env: fn(&E) -> &SubE,
) -> ScopedReducer<S, SubS, A, SubA, E, SubE, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = SubE>,
{
    ScopedReducer {
        reducer,
        state,
        extract,
        embed,
        env,
    }
}

/// Slice reducer lifted by [`scope_reducer`]
pub struct ScopedReducer<S, SubS, A, SubA, E, SubE, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = SubE>,
{
    reducer: R,
    state: fn(&mut S) -> &mut SubS,
    extract: fn(A) -> Option<SubA>,
    embed: fn(SubA) -> A,
    env: fn(&E) -> &SubE,
}

impl<S, SubS, A, SubA, E, SubE, R> Reducer for ScopedReducer<S, SubS, A, SubA, E, SubE, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = SubE>,
    A: Send + 'static,
    SubA: Send + 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(child_action) = (self.extract)(action) else {
            return SmallVec::new();
        };

        let child_state = (self.state)(state);
        let child_env = (self.env)(env);

        self.reducer
            .reduce(child_state, child_action, child_env)
            .into_iter()
            .map(|effect| effect.map(self.embed))
            .collect()
    }
}
