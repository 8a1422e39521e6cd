//! Given-When-Then harness for slice reducers
//!
//! A slice test usually checks two moments: the pending state right after an
//! intent, and the state once the intent's outcome has been reduced.
//! [`ReducerTest::run`] covers the first; [`ReducerTest::run_settled`] also
//! executes the effects and reduces every outcome they produce.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use crate::effects::collect_all;
use freekick_core::{effect::Effect, reducer::Reducer};

type StateCheck<S> = Box<dyn FnOnce(&S)>;
type EffectCheck<A> = Box<dyn FnOnce(&[Effect<A>])>;
type OutcomeCheck<A> = Box<dyn FnOnce(&[A])>;

/// Upper bound on outcome rounds in [`ReducerTest::run_settled`]
///
/// Slices chain at most a couple of requests; anything deeper is a loop.
pub const MAX_SETTLE_ROUNDS: usize = 8;

/// Given-When-Then test of one reducer step
///
/// # Example
///
/// ```ignore
/// use freekick_testing::{ReducerTest, assertions};
///
/// ReducerTest::new(ResourceReducer)
///     .with_env(env(ResourceKind::Banners))
///     .given_state(ResourceState::default())
///     .when_action(ResourceAction::fetch())
///     .then_state(|state| assert!(state.is_loading()))
///     .then_effects(assertions::assert_has_future_effect)
///     .then_settled(|state| assert!(!state.is_loading()))
///     .run_settled()
///     .await;
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    setup_actions: Vec<A>,
    action: Option<A>,
    pending: Vec<StateCheck<S>>,
    effects: Vec<EffectCheck<A>>,
    outcomes: Vec<OutcomeCheck<A>>,
    settled: Vec<StateCheck<S>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Test of `reducer`
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            setup_actions: Vec::new(),
            action: None,
            pending: Vec::new(),
            effects: Vec::new(),
            outcomes: Vec::new(),
            settled: Vec::new(),
        }
    }

    /// Environment the reducer runs with
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Slice state before anything is reduced (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Reduce `actions` before the action under test, discarding their effects
    ///
    /// Used to reach states like "a fetch is pending" without spelling out
    /// the whole slice by hand.
    #[must_use]
    pub fn given_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.setup_actions.extend(actions);
        self
    }

    /// Action under test (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Check the state right after the action, before any effect runs
    #[must_use]
    pub fn then_state<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.pending.push(Box::new(check));
        self
    }

    /// Check the effects the action returned
    #[must_use]
    pub fn then_effects<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effects.push(Box::new(check));
        self
    }

    /// Check every outcome the effects produced, in reduction order
    ///
    /// Only evaluated by [`ReducerTest::run_settled`].
    #[must_use]
    pub fn then_outcomes<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&[A]) + 'static,
    {
        self.outcomes.push(Box::new(check));
        self
    }

    /// Check the state once every outcome has been reduced
    ///
    /// Only evaluated by [`ReducerTest::run_settled`].
    #[must_use]
    pub fn then_settled<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.settled.push(Box::new(check));
        self
    }

    #[allow(clippy::expect_used)] // Test code can use expect
    fn reduce_action(&mut self) -> (S, E, Vec<Effect<A>>) {
        let mut state = self
            .initial_state
            .take()
            .expect("Initial state must be set with given_state()");
        let action = self.action.take().expect("Action must be set with when_action()");
        let env = self
            .environment
            .take()
            .expect("Environment must be set with with_env()");

        for setup in self.setup_actions.drain(..) {
            let _ = self.reducer.reduce(&mut state, setup, &env);
        }

        let effects = self.reducer.reduce(&mut state, action, &env).into_vec();

        for check in self.pending.drain(..) {
            check(&state);
        }
        for check in self.effects.drain(..) {
            check(&effects);
        }

        (state, env, effects)
    }

    /// Reduce the action and run the pending-state and effect checks
    ///
    /// # Panics
    ///
    /// Panics if state, action or environment is missing, or if a check fails.
    pub fn run(mut self) {
        let _ = self.reduce_action();
    }
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
    A: Clone + Send + 'static,
{
    /// Like [`ReducerTest::run`], then execute the effects and reduce their
    /// outcomes (and any follow-up effects) before the settled checks
    ///
    /// `Delay` effects resolve immediately.
    ///
    /// # Panics
    ///
    /// Panics if state, action or environment is missing, if a check fails,
    /// or if outcomes keep producing effects for [`MAX_SETTLE_ROUNDS`] rounds.
    pub async fn run_settled(mut self) {
        let (mut state, env, mut effects) = self.reduce_action();
        let mut outcomes = Vec::new();

        for _ in 0..MAX_SETTLE_ROUNDS {
            if effects.iter().all(Effect::is_none) {
                break;
            }

            for outcome in collect_all(std::mem::take(&mut effects)).await {
                outcomes.push(outcome.clone());
                effects.extend(self.reducer.reduce(&mut state, outcome, &env));
            }
        }

        assert!(
            effects.iter().all(Effect::is_none),
            "Effects still pending after {MAX_SETTLE_ROUNDS} rounds"
        );

        for check in self.outcomes.drain(..) {
            check(&outcomes);
        }
        for check in self.settled.drain(..) {
            check(&state);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use freekick_core::effect::Effect;

    /// Assert that no effect does anything
    ///
    /// # Panics
    ///
    /// Panics if any effect is not `Effect::None`.
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match `expected`.
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that the action started a request
    ///
    /// # Panics
    ///
    /// Panics if no `Effect::Future` is found.
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected a request effect, but none found"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freekick_core::{SmallVec, smallvec};

    #[derive(Clone, Debug, Default)]
    struct PageState {
        items: Vec<u32>,
        loading: bool,
        error: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum PageAction {
        Fetch { size: u32 },
        Fetched { items: Vec<u32> },
        Rejected { message: String },
        Clear,
    }

    struct PageReducer;

    impl Reducer for PageReducer {
        type State = PageState;
        type Action = PageAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut PageState,
            action: PageAction,
            _env: &(),
        ) -> SmallVec<[Effect<PageAction>; 4]> {
            match action {
                PageAction::Fetch { size } => {
                    state.loading = true;
                    smallvec![Effect::Future(Box::pin(async move {
                        Some(if size == 0 {
                            PageAction::Rejected {
                                message: "empty page".into(),
                            }
                        } else {
                            PageAction::Fetched {
                                items: (1..=size).collect(),
                            }
                        })
                    }))]
                },
                PageAction::Fetched { items } => {
                    state.loading = false;
                    state.items = items;
                    SmallVec::new()
                },
                PageAction::Rejected { message } => {
                    state.loading = false;
                    state.error = Some(message);
                    SmallVec::new()
                },
                PageAction::Clear => {
                    state.items.clear();
                    smallvec![Effect::None]
                },
            }
        }
    }

    #[test]
    fn test_pending_state_and_effects() {
        ReducerTest::new(PageReducer)
            .with_env(())
            .given_state(PageState::default())
            .when_action(PageAction::Fetch { size: 3 })
            .then_state(|state| assert!(state.loading))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_given_actions_are_applied_first() {
        ReducerTest::new(PageReducer)
            .with_env(())
            .given_state(PageState::default())
            .given_actions([PageAction::Fetched { items: vec![7, 8] }])
            .when_action(PageAction::Clear)
            .then_state(|state| assert!(state.items.is_empty()))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn test_run_settled_reduces_outcomes() {
        ReducerTest::new(PageReducer)
            .with_env(())
            .given_state(PageState::default())
            .when_action(PageAction::Fetch { size: 2 })
            .then_outcomes(|outcomes| {
                assert_eq!(outcomes, [PageAction::Fetched { items: vec![1, 2] }]);
            })
            .then_settled(|state| {
                assert!(!state.loading);
                assert_eq!(state.items, vec![1, 2]);
            })
            .run_settled()
            .await;
    }

    #[tokio::test]
    async fn test_run_settled_reports_rejection() {
        ReducerTest::new(PageReducer)
            .with_env(())
            .given_state(PageState::default())
            .when_action(PageAction::Fetch { size: 0 })
            .then_settled(|state| {
                assert_eq!(state.error.as_deref(), Some("empty page"));
                assert!(state.items.is_empty());
            })
            .run_settled()
            .await;
    }
}
