//! Service clients for the Freekick REST API
//!
//! Every client sits on one shared [`HttpTransport`] and unwraps the
//! server's `{data: ...}` envelope before decoding, so callers never
//! special-case a resource. Errors always propagate; clients never swallow
//! them.

pub mod analytics;
pub mod auth;

use crate::envelope::{Filters, Page, unwrap_envelope};
use crate::error::ApiError;
use crate::record::{Record, RecordId};
use crate::transport::HttpTransport;
use async_trait::async_trait;
use serde_json::Value;

pub use analytics::{AnalyticsClient, HttpAnalyticsClient};
pub use auth::{AuthClient, HttpAuthClient};

// ── ResourceClient ──────────────────────────────────────────────────

/// CRUD client for one list endpoint
///
/// Object-safe so slices hold an `Arc<dyn ResourceClient>` and tests can
/// script outcomes without a server.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// `GET <path>?<cleaned filters>`
    async fn list(&self, filters: &Filters) -> Result<Page<Record>, ApiError>;

    /// `GET <path><id>/`
    async fn get(&self, id: &RecordId) -> Result<Record, ApiError>;

    /// `POST <path>`
    async fn create(&self, payload: &Value) -> Result<Record, ApiError>;

    /// `PATCH <path><id>/`
    async fn update(&self, id: &RecordId, payload: &Value) -> Result<Record, ApiError>;

    /// `DELETE <path><id>/`
    async fn delete(&self, id: &RecordId) -> Result<(), ApiError>;

    /// Custom detail action: `POST <path><id>/<action>/`
    async fn perform(&self, id: &RecordId, action: &str, payload: &Value)
    -> Result<Value, ApiError>;
}

/// [`ResourceClient`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpResourceClient {
    transport: HttpTransport,
    path: String,
}

impl HttpResourceClient {
    /// Client for the list endpoint at `path` (leading and trailing slash)
    #[must_use]
    pub fn new(transport: HttpTransport, path: impl Into<String>) -> Self {
        Self {
            transport,
            path: path.into(),
        }
    }

    /// List endpoint path
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    fn detail(&self, id: &RecordId) -> String {
        format!("{}{id}/", self.path)
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    async fn list(&self, filters: &Filters) -> Result<Page<Record>, ApiError> {
        let query = filters.to_query();
        tracing::debug!(path = %self.path, params = query.len(), "Listing records");
        let body = self.transport.get(&self.path, &query).await?;
        Page::from_body(unwrap_envelope(body))
    }

    async fn get(&self, id: &RecordId) -> Result<Record, ApiError> {
        let body = self.transport.get(&self.detail(id), &[]).await?;
        Record::from_value(unwrap_envelope(body))
    }

    async fn create(&self, payload: &Value) -> Result<Record, ApiError> {
        let body = self.transport.post(&self.path, payload).await?;
        Record::from_value(unwrap_envelope(body))
    }

    async fn update(&self, id: &RecordId, payload: &Value) -> Result<Record, ApiError> {
        let body = self.transport.patch(&self.detail(id), payload).await?;
        Record::from_value(unwrap_envelope(body))
    }

    async fn delete(&self, id: &RecordId) -> Result<(), ApiError> {
        self.transport.delete(&self.detail(id)).await?;
        Ok(())
    }

    async fn perform(
        &self,
        id: &RecordId,
        action: &str,
        payload: &Value,
    ) -> Result<Value, ApiError> {
        let path = format!("{}{action}/", self.detail(id));
        let body = self.transport.post(&path, payload).await?;
        Ok(unwrap_envelope(body))
    }
}

// ── Catalogue ───────────────────────────────────────────────────────

/// The resources the admin console manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Pitch bookings
    Bookings,
    /// Tournament tickets
    Tickets,
    /// Promotional banners
    Banners,
    /// Teams
    Teams,
    /// Venues
    Venues,
    /// Pitches inside venues
    Pitches,
}

impl ResourceKind {
    /// Every managed resource
    pub const ALL: [Self; 6] = [
        Self::Bookings,
        Self::Tickets,
        Self::Banners,
        Self::Teams,
        Self::Venues,
        Self::Pitches,
    ];

    /// List endpoint path
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Bookings => "/booking/bookings/",
            Self::Tickets => "/ticket/tickets/",
            Self::Banners => "/banner/banners/",
            Self::Teams => "/team/teams/",
            Self::Venues => "/venue/venues/",
            Self::Pitches => "/venue/pitch/pitches/",
        }
    }

    /// Singular noun used in fallback error messages
    #[must_use]
    pub const fn singular(self) -> &'static str {
        match self {
            Self::Bookings => "booking",
            Self::Tickets => "ticket",
            Self::Banners => "banner",
            Self::Teams => "team",
            Self::Venues => "venue",
            Self::Pitches => "pitch",
        }
    }

    /// Plural noun used in fallback error messages
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Bookings => "bookings",
            Self::Tickets => "tickets",
            Self::Banners => "banners",
            Self::Teams => "teams",
            Self::Venues => "venues",
            Self::Pitches => "pitches",
        }
    }
}

/// Builds every client on one shared transport
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    transport: HttpTransport,
}

impl ServiceCatalog {
    /// Catalogue over `transport`
    #[must_use]
    pub const fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Shared transport
    #[must_use]
    pub const fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// CRUD client for `kind`
    #[must_use]
    pub fn resource(&self, kind: ResourceKind) -> HttpResourceClient {
        HttpResourceClient::new(self.transport.clone(), kind.path())
    }

    /// Tournaments a team takes part in
    #[must_use]
    pub fn team_tournaments(&self, team: &RecordId) -> HttpResourceClient {
        self.team_nested(team, "tournaments")
    }

    /// Bookings made by a team
    #[must_use]
    pub fn team_bookings(&self, team: &RecordId) -> HttpResourceClient {
        self.team_nested(team, "bookings")
    }

    fn team_nested(&self, team: &RecordId, nested: &str) -> HttpResourceClient {
        HttpResourceClient::new(
            self.transport.clone(),
            format!("{}{team}/{nested}/", ResourceKind::Teams.path()),
        )
    }

    /// Authentication client
    #[must_use]
    pub fn auth(&self) -> HttpAuthClient {
        HttpAuthClient::new(self.transport.clone())
    }

    /// Dashboard analytics client
    #[must_use]
    pub fn analytics(&self) -> HttpAnalyticsClient {
        HttpAnalyticsClient::new(self.transport.clone())
    }
}

/// Filters for the dashboard's popular-venue list
#[must_use]
pub fn popular_venue_filters(city: Option<&str>) -> Filters {
    let filters = Filters::new()
        .with("ordering", "-number_of_booking")
        .with("is_active", true)
        .with("page_limit", 5);
    match city {
        Some(city) => filters.with("city", city),
        None => filters,
    }
}
