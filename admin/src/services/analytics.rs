//! Dashboard analytics endpoints

use crate::envelope::unwrap_envelope;
use crate::error::ApiError;
use crate::transport::HttpTransport;
use async_trait::async_trait;
use serde_json::Value;

const CARD_ANALYTICS_PATH: &str = "/booking/analytics/cards/";
const REVENUE_TREND_PATH: &str = "/booking/analytics/revenue-trend/";
const TOP_EMIRATES_PATH: &str = "/booking/analytics/top-emirates/";
const WEEKLY_BOOKINGS_PATH: &str = "/booking/analytics/weekly/";

/// Booking analytics shown on the dashboard
///
/// Payloads stay opaque; only presentation code interprets them.
#[async_trait]
pub trait AnalyticsClient: Send + Sync {
    /// Summary cards (totals, revenue, occupancy)
    async fn card_analytics(&self) -> Result<Value, ApiError>;

    /// Revenue over time
    async fn revenue_trend(&self) -> Result<Value, ApiError>;

    /// Emirates ranked by bookings
    async fn top_emirates(&self) -> Result<Value, ApiError>;

    /// Bookings per weekday
    async fn weekly_bookings(&self) -> Result<Value, ApiError>;
}

/// [`AnalyticsClient`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpAnalyticsClient {
    transport: HttpTransport,
}

impl HttpAnalyticsClient {
    /// Analytics client over `transport`
    #[must_use]
    pub const fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    async fn fetch(&self, path: &str) -> Result<Value, ApiError> {
        let body = self.transport.get(path, &[]).await?;
        Ok(unwrap_envelope(body))
    }
}

#[async_trait]
impl AnalyticsClient for HttpAnalyticsClient {
    async fn card_analytics(&self) -> Result<Value, ApiError> {
        self.fetch(CARD_ANALYTICS_PATH).await
    }

    async fn revenue_trend(&self) -> Result<Value, ApiError> {
        self.fetch(REVENUE_TREND_PATH).await
    }

    async fn top_emirates(&self) -> Result<Value, ApiError> {
        self.fetch(TOP_EMIRATES_PATH).await
    }

    async fn weekly_bookings(&self) -> Result<Value, ApiError> {
        self.fetch(WEEKLY_BOOKINGS_PATH).await
    }
}
