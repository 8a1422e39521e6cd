//! Freekick admin console, headless.
//!
//! Restores or creates a session, loads the dashboard and the first page of
//! bookings, then prints what the console would render.

use anyhow::Context;
use freekick_admin::app::{AdminStore, AppAction, AppEnvironment, admin_store};
use freekick_admin::config::AdminConfig;
use freekick_admin::slices::{AnalyticsAction, AuthAction, ResourceAction};
use freekick_admin::tokens::FileTokenStore;
use freekick_admin::views::{project_segments_for, venue_label};
use freekick_runtime::metrics::{MetricsRecorder, install_recorder};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "freekick_admin=info,freekick_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AdminConfig::from_env().context("loading configuration")?;
    info!(
        api_base_url = %config.api_base_url,
        timeout_secs = config.timeout_secs,
        token_file = %config.token_file.display(),
        "Configuration loaded"
    );

    let recorder = if flag("FREEKICK_PRINT_METRICS") {
        Some(install_recorder().context("installing metrics recorder")?)
    } else {
        None
    };

    let tokens = Arc::new(FileTokenStore::open(&config.token_file));
    let env = AppEnvironment::from_config(&config, tokens.clone())
        .context("building HTTP transport")?;
    let store = admin_store(env, tokens.as_ref(), config.page_limit);

    let session = match (std::env::var("FREEKICK_PHONE"), std::env::var("FREEKICK_PASSWORD")) {
        (Ok(phone), Ok(password)) => AuthAction::Login { phone, password },
        _ => AuthAction::CheckAuth,
    };
    dispatch(&store, &config, [AppAction::Auth(session)]).await?;

    let (authenticated, auth_error) = store
        .state(|s| (s.auth.is_authenticated, s.auth.error.clone()))
        .await;
    if !authenticated {
        warn!(error = auth_error.as_deref().unwrap_or("no session"), "Not signed in");
        println!("Not signed in. Set FREEKICK_PHONE and FREEKICK_PASSWORD to log in.");
        store.shutdown_default().await?;
        return Ok(());
    }

    dispatch(
        &store,
        &config,
        [
            AppAction::Dashboard(AnalyticsAction::Refresh { city: None }),
            AppAction::Bookings(ResourceAction::fetch_page(1)),
        ],
    )
    .await?;

    print_report(&store).await;
    print_metrics(recorder.as_ref());

    store.shutdown_default().await?;
    info!("Shut down cleanly");
    Ok(())
}

/// Send every action at once and wait until all of them settle
async fn dispatch<const N: usize>(
    store: &AdminStore,
    config: &AdminConfig,
    actions: [AppAction; N],
) -> anyhow::Result<()> {
    let mut handles = Vec::with_capacity(N);
    for action in actions {
        handles.push(store.send(action).await?);
    }
    // Every effect ends within one transport timeout; leave room for the follow-up request
    let limit = config.timeout() * 2;
    for mut handle in handles {
        handle
            .wait_with_timeout(limit)
            .await
            .context("waiting for requests to settle")?;
    }
    Ok(())
}

async fn print_report(store: &AdminStore) {
    let (venues, venue_error) = store
        .state(|s| (s.dashboard.popular_venues.clone(), s.dashboard.error().map(str::to_string)))
        .await;

    println!("Popular venues");
    if let Some(error) = venue_error {
        println!("  error: {error}");
    }
    for segment in project_segments_for(&venues) {
        let venue = &venues[segment.index];
        println!(
            "  {:>3}%  {}  {:>7.1}°  {}",
            segment.percentage,
            segment.color,
            segment.rotation,
            venue_label(venue)
        );
    }

    let (bookings, pagination, booking_error) = store
        .state(|s| {
            (
                s.bookings.items.clone(),
                s.bookings.pagination,
                s.bookings.error().map(str::to_string),
            )
        })
        .await;

    println!();
    println!(
        "Bookings: {} total, page {}{}",
        pagination.count,
        pagination.page,
        if pagination.has_next { " (more available)" } else { "" }
    );
    if let Some(error) = booking_error {
        println!("  error: {error}");
    }
    for booking in &bookings {
        println!(
            "  #{:<6} {:<10} {}",
            booking.id,
            booking.text("status").unwrap_or("-"),
            booking.text("date").unwrap_or("")
        );
    }
}

fn print_metrics(recorder: Option<&MetricsRecorder>) {
    if let Some(text) = recorder.and_then(MetricsRecorder::render) {
        println!();
        println!("{text}");
    }
}

fn flag(key: &str) -> bool {
    std::env::var(key).is_ok_and(|value| value == "1" || value.eq_ignore_ascii_case("true"))
}
