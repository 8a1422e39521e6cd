//! Generic slice for list-endpoint resources
//!
//! Bookings, tickets, banners, teams, venues and pitches share one state
//! shape and one reducer; the environment decides which endpoint is called
//! and how error messages read.

use super::{ConcurrencyPolicy, RequestState};
use crate::config::DEFAULT_PAGE_LIMIT;
use crate::envelope::{Filters, Page, Pagination};
use crate::record::{Record, RecordId};
use crate::services::{ResourceClient, ResourceKind};
use freekick_core::{Effect, Reducer, SmallVec, async_effect, delay, smallvec};
use freekick_macros::Action;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Quiet period before a search term is sent
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Which request state an operation settles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concern {
    /// Collection fetches
    List,
    /// Single-record fetches
    Detail,
    /// Create, update and delete
    Mutation,
    /// Custom detail actions such as `cancel` or `track_click`
    Action,
}

impl Concern {
    /// Every concern of a resource slice
    pub const ALL: [Self; 4] = [Self::List, Self::Detail, Self::Mutation, Self::Action];
}

/// State of one resource slice
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState {
    /// Current page of records, newest first after a create
    pub items: Vec<Record>,
    /// Record opened in a detail view
    pub current: Option<Record>,
    /// Server-side paging info
    pub pagination: Pagination,
    /// Filters merged across fetches
    pub filters: Filters,
    /// Collection fetches
    pub list: RequestState,
    /// Single-record fetches
    pub detail: RequestState,
    /// Writes
    pub mutation: RequestState,
    /// Custom detail actions; never touch `success`
    pub action: RequestState,
    /// Set when the latest mutation succeeded; cleared by `ClearSuccess`
    pub success: bool,
    /// Bumped by every search keystroke; only the latest one fetches
    pub search_generation: u64,
}

impl Default for ResourceState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT)
    }
}

impl ResourceState {
    /// Initial shape with list defaults for `page_limit`
    #[must_use]
    pub fn new(page_limit: u32) -> Self {
        Self {
            items: Vec::new(),
            current: None,
            pagination: Pagination::default(),
            filters: Filters::list_defaults(page_limit),
            list: RequestState::default(),
            detail: RequestState::default(),
            mutation: RequestState::default(),
            action: RequestState::default(),
            success: false,
            search_generation: 0,
        }
    }

    /// Request state for `concern`
    #[must_use]
    pub const fn concern(&self, concern: Concern) -> &RequestState {
        match concern {
            Concern::List => &self.list,
            Concern::Detail => &self.detail,
            Concern::Mutation => &self.mutation,
            Concern::Action => &self.action,
        }
    }

    fn concern_mut(&mut self, concern: Concern) -> &mut RequestState {
        match concern {
            Concern::List => &mut self.list,
            Concern::Detail => &mut self.detail,
            Concern::Mutation => &mut self.mutation,
            Concern::Action => &mut self.action,
        }
    }

    /// Whether any concern is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        [&self.list, &self.detail, &self.mutation, &self.action]
            .into_iter()
            .any(RequestState::is_loading)
    }

    /// Most relevant error: mutation, then custom action, then detail, then list
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.mutation
            .error
            .as_deref()
            .or(self.action.error.as_deref())
            .or(self.detail.error.as_deref())
            .or(self.list.error.as_deref())
    }

    /// Record with `id` on the current page
    #[must_use]
    pub fn find(&self, id: &RecordId) -> Option<&Record> {
        self.items.iter().find(|record| &record.id == id)
    }

    fn current_is(&self, id: &RecordId) -> bool {
        self.current.as_ref().is_some_and(|current| &current.id == id)
    }
}

/// Actions of a resource slice
#[derive(Action, Clone, Debug, PartialEq)]
pub enum ResourceAction {
    // Intents
    /// Merge `filters` into the slice filters and fetch that page
    #[intent]
    Fetch {
        /// Filters to merge
        filters: Filters,
    },
    /// Fetch one record into `current`
    #[intent]
    FetchOne {
        /// Record to fetch
        id: RecordId,
    },
    /// Create a record
    #[intent]
    Create {
        /// Request body
        payload: Value,
    },
    /// Patch a record
    #[intent]
    Update {
        /// Record to patch
        id: RecordId,
        /// Fields to change
        payload: Value,
    },
    /// Delete a record
    #[intent]
    Delete {
        /// Record to delete
        id: RecordId,
    },
    /// Debounced free-text search from page 1
    #[intent]
    Search {
        /// Search term; empty clears the search
        term: String,
    },
    /// Run a custom detail action such as `cancel` or `track_click`
    #[intent]
    Perform {
        /// Target record
        id: RecordId,
        /// Action path segment
        action: String,
        /// Request body
        payload: Value,
    },

    // Outcomes
    /// A page arrived
    #[outcome]
    Fetched {
        /// Epoch of the fetch
        epoch: u64,
        /// The page
        page: Page<Record>,
        /// Page number requested
        page_number: u32,
    },
    /// A single record arrived
    #[outcome]
    FetchedOne {
        /// Epoch of the fetch
        epoch: u64,
        /// The record
        record: Record,
    },
    /// The server created a record
    #[outcome]
    Created {
        /// Epoch of the mutation
        epoch: u64,
        /// Created record
        record: Record,
    },
    /// The server updated a record
    #[outcome]
    Updated {
        /// Epoch of the mutation
        epoch: u64,
        /// Updated record
        record: Record,
    },
    /// The server deleted a record
    #[outcome]
    Deleted {
        /// Epoch of the mutation
        epoch: u64,
        /// Deleted record
        id: RecordId,
    },
    /// A custom action completed
    #[outcome]
    Performed {
        /// Epoch of the mutation
        epoch: u64,
        /// Target record
        id: RecordId,
        /// Unwrapped response body
        response: Value,
    },
    /// Any operation failed
    #[outcome]
    Rejected {
        /// Epoch of the failed operation
        epoch: u64,
        /// Concern the operation belongs to
        concern: Concern,
        /// User-facing message
        message: String,
    },

    // Synchronous
    /// Debounce window of a search ended
    SearchSettled {
        /// Generation the window was opened for
        generation: u64,
    },
    /// Merge filters without fetching
    SetFilters(Filters),
    /// Select a page without fetching
    SetPage(u32),
    /// Open a record in the detail view
    SetCurrent(Record),
    /// Close the detail view
    ClearCurrent,
    /// Drop every error message
    ClearError,
    /// Drop the success flag
    ClearSuccess,
    /// Back to the initial shape
    Reset,
}

impl ResourceAction {
    /// Fetch with the slice's current filters
    #[must_use]
    pub fn fetch() -> Self {
        Self::Fetch {
            filters: Filters::new(),
        }
    }

    /// Fetch page `page` with the slice's other filters unchanged
    #[must_use]
    pub fn fetch_page(page: u32) -> Self {
        Self::Fetch {
            filters: Filters::new().with("page", page),
        }
    }

    /// Concern and epoch of an outcome that changes records directly
    const fn record_change(&self) -> Option<(Concern, u64)> {
        match self {
            Self::Created { epoch, .. } | Self::Updated { epoch, .. } | Self::Deleted { epoch, .. } => {
                Some((Concern::Mutation, *epoch))
            },
            Self::Performed { epoch, .. } => Some((Concern::Action, *epoch)),
            _ => None,
        }
    }
}

/// Dependencies of a resource slice
#[derive(Clone)]
pub struct ResourceEnvironment {
    /// Which resource this slice manages
    pub kind: ResourceKind,
    /// Client for the resource's endpoint
    pub client: Arc<dyn ResourceClient>,
    /// How overlapping invocations settle
    pub policy: ConcurrencyPolicy,
    /// Page size restored by `Reset`
    pub page_limit: u32,
    /// Quiet period before a search fetches
    pub search_debounce: Duration,
}

impl std::fmt::Debug for ResourceEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceEnvironment")
            .field("kind", &self.kind)
            .field("policy", &self.policy)
            .field("page_limit", &self.page_limit)
            .field("search_debounce", &self.search_debounce)
            .finish_non_exhaustive()
    }
}

impl ResourceEnvironment {
    /// Environment with the default policy and page size
    #[must_use]
    pub fn new(kind: ResourceKind, client: Arc<dyn ResourceClient>) -> Self {
        Self {
            kind,
            client,
            policy: ConcurrencyPolicy::default(),
            page_limit: DEFAULT_PAGE_LIMIT,
            search_debounce: SEARCH_DEBOUNCE,
        }
    }

    /// Override the concurrency policy
    #[must_use]
    pub fn with_policy(mut self, policy: ConcurrencyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the page size
    #[must_use]
    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit;
        self
    }

    /// Override the search quiet period
    #[must_use]
    pub fn with_search_debounce(mut self, search_debounce: Duration) -> Self {
        self.search_debounce = search_debounce;
        self
    }
}

/// Reducer shared by every resource slice
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceReducer;

impl ResourceReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for ResourceReducer {
    type State = ResourceState;
    type Action = ResourceAction;
    type Environment = ResourceEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per lifecycle transition
    fn reduce(
        &self,
        state: &mut ResourceState,
        action: ResourceAction,
        env: &ResourceEnvironment,
    ) -> SmallVec<[Effect<ResourceAction>; 4]> {
        let resource = env.kind.plural();
        tracing::trace!(resource, action = action.name(), "Reducing");

        if let Some((concern, epoch)) = action.record_change() {
            if state.concern(concern).predates_reset(epoch) {
                tracing::debug!(resource, ?concern, epoch, "Discarding outcome started before reset");
                return SmallVec::new();
            }
        }

        match action {
            ResourceAction::Fetch { filters } => {
                state.filters.merge(&filters);
                let request = state.filters.cleaned();
                let page_number = request.page();
                let epoch = state.list.begin();
                tracing::debug!(resource, epoch, page = page_number, "Fetching list");

                let client = Arc::clone(&env.client);
                let fallback = format!("Failed to fetch {resource}");
                smallvec![async_effect! {
                    Some(match client.list(&request).await {
                        Ok(page) => ResourceAction::Fetched { epoch, page, page_number },
                        Err(error) => ResourceAction::Rejected {
                            epoch,
                            concern: Concern::List,
                            message: error.user_message(&fallback),
                        },
                    })
                }]
            },

            ResourceAction::FetchOne { id } => {
                let epoch = state.detail.begin();
                tracing::debug!(resource, epoch, %id, "Fetching record");

                let client = Arc::clone(&env.client);
                let fallback = format!("Failed to fetch {}", env.kind.singular());
                smallvec![async_effect! {
                    Some(match client.get(&id).await {
                        Ok(record) => ResourceAction::FetchedOne { epoch, record },
                        Err(error) => ResourceAction::Rejected {
                            epoch,
                            concern: Concern::Detail,
                            message: error.user_message(&fallback),
                        },
                    })
                }]
            },

            ResourceAction::Create { payload } => {
                let epoch = begin_mutation(state);
                let client = Arc::clone(&env.client);
                let fallback = format!("Failed to create {}", env.kind.singular());
                smallvec![async_effect! {
                    Some(match client.create(&payload).await {
                        Ok(record) => ResourceAction::Created { epoch, record },
                        Err(error) => mutation_rejected(epoch, &error, &fallback),
                    })
                }]
            },

            ResourceAction::Update { id, payload } => {
                let epoch = begin_mutation(state);
                let client = Arc::clone(&env.client);
                let fallback = format!("Failed to update {}", env.kind.singular());
                smallvec![async_effect! {
                    Some(match client.update(&id, &payload).await {
                        Ok(record) => ResourceAction::Updated { epoch, record },
                        Err(error) => mutation_rejected(epoch, &error, &fallback),
                    })
                }]
            },

            ResourceAction::Delete { id } => {
                let epoch = begin_mutation(state);
                let client = Arc::clone(&env.client);
                let fallback = format!("Failed to delete {}", env.kind.singular());
                smallvec![async_effect! {
                    Some(match client.delete(&id).await {
                        Ok(()) => ResourceAction::Deleted { epoch, id },
                        Err(error) => mutation_rejected(epoch, &error, &fallback),
                    })
                }]
            },

            ResourceAction::Search { term } => {
                state.filters.merge(&Filters::new().with("search", term).with("page", 1));
                state.search_generation += 1;
                smallvec![delay! {
                    duration: env.search_debounce,
                    action: ResourceAction::SearchSettled { generation: state.search_generation }
                }]
            },

            ResourceAction::SearchSettled { generation } => {
                if generation != state.search_generation {
                    return SmallVec::new();
                }
                self.reduce(state, ResourceAction::fetch(), env)
            },

            ResourceAction::Perform { id, action, payload } => {
                let epoch = state.action.begin();
                let client = Arc::clone(&env.client);
                let fallback = format!(
                    "Failed to {} {}",
                    action.replace('_', " "),
                    env.kind.singular()
                );
                smallvec![async_effect! {
                    Some(match client.perform(&id, &action, &payload).await {
                        Ok(response) => ResourceAction::Performed { epoch, id, response },
                        Err(error) => ResourceAction::Rejected {
                            epoch,
                            concern: Concern::Action,
                            message: error.user_message(&fallback),
                        },
                    })
                }]
            },

            ResourceAction::Fetched {
                epoch,
                page,
                page_number,
            } => {
                if !env.policy.accepts(&state.list, epoch) {
                    tracing::debug!(resource, epoch, current = state.list.epoch, "Discarding stale list");
                    return SmallVec::new();
                }
                state.pagination = Pagination::from_page(&page, page_number);
                state.items = page.results;
                state.list.succeed();
                SmallVec::new()
            },

            ResourceAction::FetchedOne { epoch, record } => {
                if !env.policy.accepts(&state.detail, epoch) {
                    tracing::debug!(resource, epoch, "Discarding stale record");
                    return SmallVec::new();
                }
                state.current = Some(record);
                state.detail.succeed();
                SmallVec::new()
            },

            // Record-level changes below reflect server truth and apply unless
            // started before a reset; only the lifecycle is gated by the policy.
            ResourceAction::Created { epoch, record } => {
                state.items.insert(0, record);
                state.pagination.count += 1;
                settle_mutation(state, env.policy, epoch);
                SmallVec::new()
            },

            ResourceAction::Updated { epoch, record } => {
                if state.current_is(&record.id) {
                    state.current = Some(record.clone());
                }
                if let Some(slot) = state.items.iter_mut().find(|r| r.id == record.id) {
                    *slot = record;
                }
                settle_mutation(state, env.policy, epoch);
                SmallVec::new()
            },

            ResourceAction::Deleted { epoch, id } => {
                state.items.retain(|record| record.id != id);
                state.pagination.count = state.pagination.count.saturating_sub(1);
                if state.current_is(&id) {
                    state.current = None;
                }
                settle_mutation(state, env.policy, epoch);
                SmallVec::new()
            },

            ResourceAction::Performed { epoch, id, response } => {
                if let Value::Object(patch) = &response {
                    if let Some(record) = state.items.iter_mut().find(|r| r.id == id) {
                        record.merge(patch);
                    }
                    if let Some(current) = state.current.as_mut().filter(|c| c.id == id) {
                        current.merge(patch);
                    }
                }
                if env.policy.accepts(&state.action, epoch) {
                    state.action.succeed();
                }
                SmallVec::new()
            },

            ResourceAction::Rejected {
                epoch,
                concern,
                message,
            } => {
                tracing::warn!(resource, ?concern, epoch, %message, "Operation failed");
                if env.policy.accepts(state.concern(concern), epoch) {
                    state.concern_mut(concern).fail(message);
                    if concern == Concern::Mutation {
                        state.success = false;
                    }
                }
                SmallVec::new()
            },

            ResourceAction::SetFilters(filters) => {
                state.filters.merge(&filters);
                SmallVec::new()
            },

            ResourceAction::SetPage(page) => {
                let page = page.max(1);
                state.filters.insert("page", page);
                state.pagination.page = page;
                SmallVec::new()
            },

            ResourceAction::SetCurrent(record) => {
                state.current = Some(record);
                SmallVec::new()
            },

            ResourceAction::ClearCurrent => {
                state.current = None;
                SmallVec::new()
            },

            ResourceAction::ClearError => {
                state.list.clear_error();
                state.detail.clear_error();
                state.mutation.clear_error();
                state.action.clear_error();
                SmallVec::new()
            },

            ResourceAction::ClearSuccess => {
                state.success = false;
                SmallVec::new()
            },

            ResourceAction::Reset => {
                for concern in Concern::ALL {
                    state.concern_mut(concern).reset();
                }
                *state = ResourceState {
                    list: std::mem::take(&mut state.list),
                    detail: std::mem::take(&mut state.detail),
                    mutation: std::mem::take(&mut state.mutation),
                    action: std::mem::take(&mut state.action),
                    search_generation: state.search_generation + 1,
                    ..ResourceState::new(env.page_limit)
                };
                SmallVec::new()
            },
        }
    }
}

fn begin_mutation(state: &mut ResourceState) -> u64 {
    state.success = false;
    state.mutation.begin()
}

fn settle_mutation(state: &mut ResourceState, policy: ConcurrencyPolicy, epoch: u64) {
    if policy.accepts(&state.mutation, epoch) {
        state.mutation.succeed();
        state.success = true;
    } else {
        tracing::debug!(epoch, current = state.mutation.epoch, "Superseded mutation settled");
    }
}

fn mutation_rejected(epoch: u64, error: &crate::error::ApiError, fallback: &str) -> ResourceAction {
    ResourceAction::Rejected {
        epoch,
        concern: Concern::Mutation,
        message: error.user_message(fallback),
    }
}
