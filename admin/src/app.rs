//! Application-level composition
//!
//! One [`AppState`] holds every slice. [`AppReducer`] scopes each slice
//! reducer onto its field and lifts the slice's effects back into
//! [`AppAction`]s, so a single [`AdminStore`] drives the whole console.

use crate::config::AdminConfig;
use crate::error::ApiError;
use crate::services::{ResourceClient, ResourceKind, ServiceCatalog};
use crate::slices::{
    AnalyticsAction, AnalyticsEnvironment, AnalyticsReducer, AnalyticsState, AuthAction,
    AuthEnvironment, AuthReducer, AuthState, ConcurrencyPolicy, ResourceAction,
    ResourceEnvironment, ResourceReducer, ResourceState,
};
use crate::transport::HttpTransport;
use freekick_core::composition::{CombinedReducer, SharedReducer, combine_reducers, scope_reducer};
use freekick_core::environment::TokenStore;
use freekick_core::{Effect, Reducer, SmallVec};
use freekick_runtime::Store;
use std::sync::Arc;

/// Every slice of the console
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// Session
    pub auth: AuthState,
    /// Bookings
    pub bookings: ResourceState,
    /// Tickets
    pub tickets: ResourceState,
    /// Banners
    pub banners: ResourceState,
    /// Teams
    pub teams: ResourceState,
    /// Venues
    pub venues: ResourceState,
    /// Pitches
    pub pitches: ResourceState,
    /// Dashboard analytics
    pub dashboard: AnalyticsState,
}

impl AppState {
    /// Initial state: session restored from `tokens`, list filters sized by `page_limit`
    #[must_use]
    pub fn new(tokens: &dyn TokenStore, page_limit: u32) -> Self {
        Self {
            auth: AuthState::restore(tokens),
            bookings: ResourceState::new(page_limit),
            tickets: ResourceState::new(page_limit),
            banners: ResourceState::new(page_limit),
            teams: ResourceState::new(page_limit),
            venues: ResourceState::new(page_limit),
            pitches: ResourceState::new(page_limit),
            dashboard: AnalyticsState::default(),
        }
    }

    /// Slice for `kind`
    #[must_use]
    pub const fn resource(&self, kind: ResourceKind) -> &ResourceState {
        match kind {
            ResourceKind::Bookings => &self.bookings,
            ResourceKind::Tickets => &self.tickets,
            ResourceKind::Banners => &self.banners,
            ResourceKind::Teams => &self.teams,
            ResourceKind::Venues => &self.venues,
            ResourceKind::Pitches => &self.pitches,
        }
    }
}

/// Action for one slice
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// Session
    Auth(AuthAction),
    /// Bookings
    Bookings(ResourceAction),
    /// Tickets
    Tickets(ResourceAction),
    /// Banners
    Banners(ResourceAction),
    /// Teams
    Teams(ResourceAction),
    /// Venues
    Venues(ResourceAction),
    /// Pitches
    Pitches(ResourceAction),
    /// Dashboard analytics
    Dashboard(AnalyticsAction),
}

impl AppAction {
    /// Route a resource action to the slice for `kind`
    #[must_use]
    pub const fn resource(kind: ResourceKind, action: ResourceAction) -> Self {
        match kind {
            ResourceKind::Bookings => Self::Bookings(action),
            ResourceKind::Tickets => Self::Tickets(action),
            ResourceKind::Banners => Self::Banners(action),
            ResourceKind::Teams => Self::Teams(action),
            ResourceKind::Venues => Self::Venues(action),
            ResourceKind::Pitches => Self::Pitches(action),
        }
    }

    /// Whether this action settles an async operation
    #[must_use]
    pub const fn is_outcome(&self) -> bool {
        match self {
            Self::Auth(action) => action.is_outcome(),
            Self::Bookings(action)
            | Self::Tickets(action)
            | Self::Banners(action)
            | Self::Teams(action)
            | Self::Venues(action)
            | Self::Pitches(action) => action.is_outcome(),
            Self::Dashboard(action) => action.is_outcome(),
        }
    }
}

/// Dependencies of every slice
#[derive(Clone, Debug)]
pub struct AppEnvironment {
    /// Session
    pub auth: AuthEnvironment,
    /// Bookings
    pub bookings: ResourceEnvironment,
    /// Tickets
    pub tickets: ResourceEnvironment,
    /// Banners
    pub banners: ResourceEnvironment,
    /// Teams
    pub teams: ResourceEnvironment,
    /// Venues
    pub venues: ResourceEnvironment,
    /// Pitches
    pub pitches: ResourceEnvironment,
    /// Dashboard analytics
    pub dashboard: AnalyticsEnvironment,
}

impl AppEnvironment {
    /// Wire every client to one transport built from `config`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if the HTTP client cannot be built.
    pub fn from_config(config: &AdminConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(config, Arc::clone(&tokens))?;
        Ok(Self::from_catalog(&ServiceCatalog::new(transport), tokens, config.page_limit))
    }

    /// Wire every client from `catalog`
    #[must_use]
    pub fn from_catalog(catalog: &ServiceCatalog, tokens: Arc<dyn TokenStore>, page_limit: u32) -> Self {
        let resource = |kind: ResourceKind| {
            let client: Arc<dyn ResourceClient> = Arc::new(catalog.resource(kind));
            ResourceEnvironment::new(kind, client).with_page_limit(page_limit)
        };

        Self {
            auth: AuthEnvironment {
                client: Arc::new(catalog.auth()),
                tokens,
            },
            bookings: resource(ResourceKind::Bookings),
            tickets: resource(ResourceKind::Tickets),
            banners: resource(ResourceKind::Banners),
            teams: resource(ResourceKind::Teams),
            venues: resource(ResourceKind::Venues),
            pitches: resource(ResourceKind::Pitches),
            dashboard: AnalyticsEnvironment {
                venues: Arc::new(catalog.resource(ResourceKind::Venues)),
                analytics: Arc::new(catalog.analytics()),
                policy: ConcurrencyPolicy::default(),
            },
        }
    }

    /// Apply `policy` to every slice
    #[must_use]
    pub fn with_policy(mut self, policy: ConcurrencyPolicy) -> Self {
        for env in [
            &mut self.bookings,
            &mut self.tickets,
            &mut self.banners,
            &mut self.teams,
            &mut self.venues,
            &mut self.pitches,
        ] {
            env.policy = policy;
        }
        self.dashboard.policy = policy;
        self
    }
}

/// Routes each action to its slice
#[derive(Clone)]
pub struct AppReducer {
    slices: CombinedReducer<AppState, AppAction, AppEnvironment>,
}

impl Default for AppReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl AppReducer {
    /// Compose every slice reducer
    #[must_use]
    pub fn new() -> Self {
        let auth: SharedReducer<AppState, AppAction, AppEnvironment> = Arc::new(scope_reducer(
            AuthReducer,
            |state: &mut AppState| &mut state.auth,
            |action: AppAction| match action {
                AppAction::Auth(inner) => Some(inner),
                _ => None,
            },
            AppAction::Auth,
            |env: &AppEnvironment| &env.auth,
        ));

        let dashboard: SharedReducer<AppState, AppAction, AppEnvironment> =
            Arc::new(scope_reducer(
                AnalyticsReducer,
                |state: &mut AppState| &mut state.dashboard,
                |action: AppAction| match action {
                    AppAction::Dashboard(inner) => Some(inner),
                    _ => None,
                },
                AppAction::Dashboard,
                |env: &AppEnvironment| &env.dashboard,
            ));

        Self {
            slices: combine_reducers(vec![
                auth,
                resource_slice(
                    |state| &mut state.bookings,
                    |action| match action {
                        AppAction::Bookings(inner) => Some(inner),
                        _ => None,
                    },
                    AppAction::Bookings,
                    |env| &env.bookings,
                ),
                resource_slice(
                    |state| &mut state.tickets,
                    |action| match action {
                        AppAction::Tickets(inner) => Some(inner),
                        _ => None,
                    },
                    AppAction::Tickets,
                    |env| &env.tickets,
                ),
                resource_slice(
                    |state| &mut state.banners,
                    |action| match action {
                        AppAction::Banners(inner) => Some(inner),
                        _ => None,
                    },
                    AppAction::Banners,
                    |env| &env.banners,
                ),
                resource_slice(
                    |state| &mut state.teams,
                    |action| match action {
                        AppAction::Teams(inner) => Some(inner),
                        _ => None,
                    },
                    AppAction::Teams,
                    |env| &env.teams,
                ),
                resource_slice(
                    |state| &mut state.venues,
                    |action| match action {
                        AppAction::Venues(inner) => Some(inner),
                        _ => None,
                    },
                    AppAction::Venues,
                    |env| &env.venues,
                ),
                resource_slice(
                    |state| &mut state.pitches,
                    |action| match action {
                        AppAction::Pitches(inner) => Some(inner),
                        _ => None,
                    },
                    AppAction::Pitches,
                    |env| &env.pitches,
                ),
                dashboard,
            ]),
        }
    }
}

fn resource_slice(
    state: fn(&mut AppState) -> &mut ResourceState,
    extract: fn(AppAction) -> Option<ResourceAction>,
    embed: fn(ResourceAction) -> AppAction,
    env: fn(&AppEnvironment) -> &ResourceEnvironment,
) -> SharedReducer<AppState, AppAction, AppEnvironment> {
    Arc::new(scope_reducer(ResourceReducer, state, extract, embed, env))
}

impl Reducer for AppReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut AppState,
        action: AppAction,
        env: &AppEnvironment,
    ) -> SmallVec<[Effect<AppAction>; 4]> {
        self.slices.reduce(state, action, env)
    }
}

/// The store driving the console
pub type AdminStore = Store<AppState, AppAction, AppEnvironment, AppReducer>;

/// Build a store for `env` with state restored from `tokens`
#[must_use]
pub fn admin_store(env: AppEnvironment, tokens: &dyn TokenStore, page_limit: u32) -> AdminStore {
    Store::new(AppState::new(tokens, page_limit), AppReducer::new(), env)
}
