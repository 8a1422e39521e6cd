//! State slices
//!
//! Each slice is a plain state struct plus a reducer. Async operations follow
//! one lifecycle: an intent marks its concern `Loading` and returns an effect
//! that calls a service client; the effect settles with an outcome action
//! stamped with the epoch it was started under.

pub mod analytics;
pub mod auth;
pub mod resource;

use serde::{Deserialize, Serialize};

pub use analytics::{AnalyticsAction, AnalyticsEnvironment, AnalyticsReducer, AnalyticsState};
pub use auth::{AuthAction, AuthEnvironment, AuthReducer, AuthState};
pub use resource::{Concern, ResourceAction, ResourceEnvironment, ResourceReducer, ResourceState};

/// Where an async operation stands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Never started
    #[default]
    Idle,
    /// In flight
    Loading,
    /// Last run succeeded
    Succeeded,
    /// Last run failed; see the concern's error
    Failed,
}

/// Lifecycle of one concern (list, detail, mutation, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestState {
    /// Current lifecycle
    pub lifecycle: Lifecycle,
    /// Message of the last failure
    pub error: Option<String>,
    /// Incremented by every start; outcomes carry the epoch they were started under
    pub epoch: u64,
    /// Epochs at or below this were started before the last reset
    pub floor: u64,
}

impl RequestState {
    /// Enter `Loading`, clear the error and return the new epoch
    pub fn begin(&mut self) -> u64 {
        self.epoch += 1;
        self.lifecycle = Lifecycle::Loading;
        self.error = None;
        self.epoch
    }

    /// Back to `Idle`, fencing off everything started so far
    pub fn reset(&mut self) {
        *self = Self {
            epoch: self.epoch,
            floor: self.epoch,
            ..Self::default()
        };
    }

    /// Whether an outcome stamped `epoch` was started before the last reset
    #[must_use]
    pub const fn predates_reset(&self, epoch: u64) -> bool {
        epoch <= self.floor
    }

    /// Whether `epoch` belongs to the most recent start
    #[must_use]
    pub const fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    /// Settle successfully
    pub fn succeed(&mut self) {
        self.lifecycle = Lifecycle::Succeeded;
        self.error = None;
    }

    /// Settle with a failure message
    pub fn fail(&mut self, message: String) {
        self.lifecycle = Lifecycle::Failed;
        self.error = Some(message);
    }

    /// Drop the error without touching the lifecycle
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Whether an operation is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lifecycle == Lifecycle::Loading
    }
}

/// How overlapping invocations of the same operation settle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConcurrencyPolicy {
    /// Outcomes from superseded invocations do not touch lifecycle or collection state
    #[default]
    LatestWins,
    /// Every outcome is applied in settle order, except those started
    /// before a reset
    LastSettledWins,
}

impl ConcurrencyPolicy {
    /// Whether an outcome stamped `epoch` may settle `concern`
    #[must_use]
    pub const fn accepts(self, concern: &RequestState, epoch: u64) -> bool {
        if concern.predates_reset(epoch) {
            return false;
        }
        match self {
            Self::LatestWins => concern.is_current(epoch),
            Self::LastSettledWins => true,
        }
    }
}
