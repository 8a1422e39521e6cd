//! Dashboard slice: popular venues and booking analytics

use super::{ConcurrencyPolicy, RequestState};
use crate::record::Record;
use crate::services::{AnalyticsClient, ResourceClient, popular_venue_filters};
use freekick_core::{Effect, Reducer, SmallVec, async_effect, smallvec};
use freekick_macros::Action;
use serde_json::Value;
use std::sync::Arc;

/// The four analytics payloads, fetched together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    /// Summary cards
    pub card_analytics: Value,
    /// Revenue over time
    pub revenue_trend: Value,
    /// Emirates ranked by bookings
    pub top_emirates: Value,
    /// Bookings per weekday
    pub weekly_bookings: Value,
}

/// Which dashboard request an outcome settles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardPart {
    /// Popular venue list
    PopularVenues,
    /// Analytics payloads
    Analytics,
}

/// Dashboard state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsState {
    /// Most booked active venues
    pub popular_venues: Vec<Record>,
    /// Summary cards
    pub card_analytics: Option<Value>,
    /// Revenue over time
    pub revenue_trend: Option<Value>,
    /// Emirates ranked by bookings
    pub top_emirates: Option<Value>,
    /// Bookings per weekday
    pub weekly_bookings: Option<Value>,
    /// Popular venue request
    pub venues: RequestState,
    /// Analytics request
    pub analytics: RequestState,
}

impl AnalyticsState {
    fn part_mut(&mut self, part: DashboardPart) -> &mut RequestState {
        match part {
            DashboardPart::PopularVenues => &mut self.venues,
            DashboardPart::Analytics => &mut self.analytics,
        }
    }

    /// Whether either request is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.venues.is_loading() || self.analytics.is_loading()
    }

    /// Last error of either request, analytics first
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.analytics
            .error
            .as_deref()
            .or(self.venues.error.as_deref())
    }
}

/// Dashboard actions
#[derive(Action, Clone, Debug, PartialEq)]
pub enum AnalyticsAction {
    /// Load the top five active venues, optionally in one city
    #[intent]
    FetchPopularVenues {
        /// City filter
        city: Option<String>,
    },
    /// Load all four analytics payloads; all or nothing
    #[intent]
    FetchDashboard,
    /// Load popular venues and analytics side by side
    #[intent]
    Refresh {
        /// City filter for popular venues
        city: Option<String>,
    },

    /// Popular venues arrived
    #[outcome]
    PopularVenuesLoaded {
        /// Epoch of the request
        epoch: u64,
        /// Venues, most booked first
        venues: Vec<Record>,
    },
    /// Analytics arrived
    #[outcome]
    DashboardLoaded {
        /// Epoch of the request
        epoch: u64,
        /// Payloads
        dashboard: Dashboard,
    },
    /// A dashboard request failed
    #[outcome]
    Rejected {
        /// Epoch of the request
        epoch: u64,
        /// Failed request
        part: DashboardPart,
        /// User-facing message
        message: String,
    },

    /// Drop error messages
    ClearError,
}

/// Dependencies of the dashboard slice
#[derive(Clone)]
pub struct AnalyticsEnvironment {
    /// Venue list endpoint
    pub venues: Arc<dyn ResourceClient>,
    /// Analytics endpoints
    pub analytics: Arc<dyn AnalyticsClient>,
    /// How overlapping requests settle
    pub policy: ConcurrencyPolicy,
}

impl std::fmt::Debug for AnalyticsEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsEnvironment")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Reducer for [`AnalyticsState`]
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsReducer;

impl Reducer for AnalyticsReducer {
    type State = AnalyticsState;
    type Action = AnalyticsAction;
    type Environment = AnalyticsEnvironment;

    fn reduce(
        &self,
        state: &mut AnalyticsState,
        action: AnalyticsAction,
        env: &AnalyticsEnvironment,
    ) -> SmallVec<[Effect<AnalyticsAction>; 4]> {
        tracing::trace!(action = action.name(), "Reducing");

        match action {
            AnalyticsAction::FetchPopularVenues { city } => {
                let epoch = state.venues.begin();
                let filters = popular_venue_filters(city.as_deref());
                let client = Arc::clone(&env.venues);
                smallvec![async_effect! {
                    Some(match client.list(&filters).await {
                        Ok(page) => AnalyticsAction::PopularVenuesLoaded {
                            epoch,
                            venues: page.results,
                        },
                        Err(error) => AnalyticsAction::Rejected {
                            epoch,
                            part: DashboardPart::PopularVenues,
                            message: error.user_message("Failed to fetch popular venues"),
                        },
                    })
                }]
            },

            AnalyticsAction::FetchDashboard => {
                let epoch = state.analytics.begin();
                let client = Arc::clone(&env.analytics);
                smallvec![async_effect! {
                    let fetched = futures::try_join!(
                        client.card_analytics(),
                        client.revenue_trend(),
                        client.top_emirates(),
                        client.weekly_bookings(),
                    );
                    Some(match fetched {
                        Ok((card_analytics, revenue_trend, top_emirates, weekly_bookings)) => {
                            AnalyticsAction::DashboardLoaded {
                                epoch,
                                dashboard: Dashboard {
                                    card_analytics,
                                    revenue_trend,
                                    top_emirates,
                                    weekly_bookings,
                                },
                            }
                        },
                        Err(error) => AnalyticsAction::Rejected {
                            epoch,
                            part: DashboardPart::Analytics,
                            message: error.user_message("Failed to fetch analytics"),
                        },
                    })
                }]
            },

            AnalyticsAction::Refresh { city } => {
                let mut effects: Vec<_> = self
                    .reduce(state, AnalyticsAction::FetchDashboard, env)
                    .into_iter()
                    .collect();
                effects.extend(self.reduce(
                    state,
                    AnalyticsAction::FetchPopularVenues { city },
                    env,
                ));
                smallvec![Effect::Parallel(effects)]
            },

            AnalyticsAction::PopularVenuesLoaded { epoch, venues } => {
                if env.policy.accepts(&state.venues, epoch) {
                    state.popular_venues = venues;
                    state.venues.succeed();
                }
                SmallVec::new()
            },

            AnalyticsAction::DashboardLoaded { epoch, dashboard } => {
                if env.policy.accepts(&state.analytics, epoch) {
                    state.card_analytics = Some(dashboard.card_analytics);
                    state.revenue_trend = Some(dashboard.revenue_trend);
                    state.top_emirates = Some(dashboard.top_emirates);
                    state.weekly_bookings = Some(dashboard.weekly_bookings);
                    state.analytics.succeed();
                }
                SmallVec::new()
            },

            AnalyticsAction::Rejected {
                epoch,
                part,
                message,
            } => {
                tracing::warn!(?part, %message, "Dashboard request failed");
                let request = state.part_mut(part);
                if env.policy.accepts(request, epoch) {
                    request.fail(message);
                }
                SmallVec::new()
            },

            AnalyticsAction::ClearError => {
                state.venues.clear_error();
                state.analytics.clear_error();
                SmallVec::new()
            },
        }
    }
}
