//! Documentation of a workshop registration backend.
//!
//! A public form collects attendee details, stores them once per email, issues an access code
//! and mails the organizer. A lookup page recovers a previously issued code by email.
//!
//!
//!
//! # Endpoints
//! - `POST /registrations`: JSON form, returns the access code on first registration
//! - `GET /access-code?email=`: returns the access code for a registered email
//! - `POST /notifications/registration`: sends the organizer email for a registration payload
//! - `OPTIONS /notifications/registration`: preflight, empty body
//!
//! Responses are JSON with a `status` of `success`, `duplicate`, `invalid`, `error`, `found`
//! or `not_found` plus a human readable `message`.
//!
//!
//!
//! # Registration Flow
//!
//! - Validate and normalize (email trimmed and lower-cased)
//! - Generate the access code server side
//! - Single atomic insert, the store rejects a second record for the same email
//! - Duplicate is reported distinctly so the user is pointed to the lookup page
//! - Organizer email is queued after the insert commits
//!
//!
//!
//! # Notes
//!
//! ## Why the email never fails a registration
//! The record is durable before the email is attempted. Failing the request on a mail outage
//! would invite a resubmission, which can only ever hit the duplicate path. So the worker logs
//! and moves on.
//!
//! ## Uniqueness
//! No check-then-insert. Two concurrent submissions for one email both reach the store and
//! exactly one `HSETNX` wins.
//!
//!
//!
//! # Setup
//!
//! Run against a local Redis.
//! ```sh
//! REDIS_URL=redis://127.0.0.1:6379 RUST_LOG=info cargo run -p workshop
//! ```
//!
//! Run without Redis.
//! ```sh
//! STORE_BACKEND=memory RUST_LOG=debug cargo run -p workshop
//! ```
//!
//! Smoke test a running server.
//! ```sh
//! cargo run -p tester -- register --email a@x.com
//! cargo run -p tester -- lookup a@x.com
//! ```
//!
//!
//!
//! # Configuration
//!
//! | Variable | Default |
//! |---|---|
//! | `RUST_PORT` | `8080` |
//! | `STORE_BACKEND` | `redis` |
//! | `REDIS_URL` | `redis://127.0.0.1:6379` |
//! | `REGISTRATIONS_KEY` | `registrations` |
//! | `RESEND_URL` | `https://api.resend.com` |
//! | `RESEND_API_KEY` | secret, `/run/secrets/RESEND_API_KEY` or env |
//! | `MAIL_FROM` | `Workshop Registration <noreply@example.com>` |
//! | `ORGANIZER_EMAIL` | `organizer@example.com` |
//! | `EVENT_NAME` | `Tech Workshop` |
//! | `NOTIFY_TIMEOUT_MS` | `5000` |
//! | `NOTIFY_QUEUE_CAPACITY` | `100` |
//! | `NOTIFY_MAX_ATTEMPTS` | `2` |
use std::{sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Router,
    http::{
        HeaderName, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal, task::JoinHandle, time::timeout};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod access_code;
pub mod config;
pub mod database;
pub mod error;
pub mod lookup;
pub mod models;
pub mod notify;
pub mod registration;
pub mod routes;
pub mod state;
pub mod utils;

use config::Config;
use routes::{lookup_handler, notification_handler, preflight_handler, register_handler};
use state::AppState;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn start_server() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let (state, worker) = AppState::new(config).await?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down, draining notifications...");

    drain_worker(worker, DRAIN_TIMEOUT).await;

    Ok(())
}

/// Waits for the notification worker to finish. Returns whether it exited cleanly.
async fn drain_worker(worker: JoinHandle<()>, limit: Duration) -> bool {
    match timeout(limit, worker).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            error!("Notification worker failed: {e}");
            false
        }
        Err(_) => {
            warn!("Notification queue not drained within {limit:?}");
            false
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static("apikey"),
            HeaderName::from_static("x-client-info"),
        ])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/registrations", post(register_handler))
        .route("/access-code", get(lookup_handler))
        .route(
            "/notifications/registration",
            post(notification_handler).options(preflight_handler),
        )
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
