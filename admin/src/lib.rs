//! # Freekick Admin
//!
//! Headless core of the Freekick venue-booking admin console.
//!
//! - [`transport`]: authenticated JSON transport with 401 session invalidation
//! - [`services`]: resource, auth and analytics clients over the transport
//! - [`slices`]: reducers holding every lifecycle transition
//! - [`app`]: one store composing all slices
//! - [`views`]: chart and table projections of slice state
//!
//! ## Example
//!
//! ```ignore
//! use freekick_admin::app::{AppAction, AppEnvironment, admin_store};
//! use freekick_admin::config::AdminConfig;
//! use freekick_admin::slices::ResourceAction;
//! use freekick_admin::tokens::FileTokenStore;
//! use std::sync::Arc;
//!
//! let config = AdminConfig::from_env()?;
//! let tokens = Arc::new(FileTokenStore::open(&config.token_file));
//! let env = AppEnvironment::from_config(&config, tokens.clone())?;
//! let store = admin_store(env, tokens.as_ref(), config.page_limit);
//!
//! let mut handle = store.send(AppAction::Bookings(ResourceAction::fetch())).await?;
//! handle.wait().await;
//! let count = store.state(|s| s.bookings.pagination.count).await;
//! ```

pub mod app;
pub mod config;
pub mod envelope;
pub mod error;
pub mod record;
pub mod services;
pub mod slices;
pub mod tokens;
pub mod transport;
pub mod views;

pub use app::{AdminStore, AppAction, AppEnvironment, AppReducer, AppState};
pub use config::{AdminConfig, ConfigError};
pub use envelope::{Filters, Page, Pagination};
pub use error::ApiError;
pub use record::{Record, RecordId};
