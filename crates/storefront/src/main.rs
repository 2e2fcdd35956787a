//! Harbor Storefront - Public e-commerce site.
//!
//! This binary serves the public-facing storefront on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework with HTMX for interactivity
//! - Askama templates for server-side rendering
//! - Shopify Storefront API for carts and shop localization
//! - Sessions in `PostgreSQL` when configured, in memory otherwise
//!
//! # Security
//!
//! This binary only has access to the Shopify Storefront API (private
//! token) and, optionally, its own session database. Customer access
//! tokens arrive from the browser and are kept in an HTTP-only cookie.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use harbor_core::CurrencyCode;
use harbor_storefront::config::StorefrontConfig;
use harbor_storefront::currency::ShopCurrencies;
use harbor_storefront::shopify::StorefrontClient;
use harbor_storefront::state::AppState;
use harbor_storefront::{app, db, middleware};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Shop currencies from configuration, asking Shopify for the supported
/// list when none is configured.
async fn load_currencies(config: &StorefrontConfig, client: &StorefrontClient) -> ShopCurrencies {
    if !config.currency.supported.is_empty() {
        return ShopCurrencies::from_config(&config.currency, Vec::new());
    }

    let fallback: Vec<CurrencyCode> = match client.shop_localization().await {
        Ok(localization) => {
            tracing::info!(
                count = localization.available_currencies.len(),
                "Loaded shop currencies from Shopify"
            );
            localization.available_currencies
        }
        Err(e) => {
            tracing::warn!("Failed to load shop currencies, using base only: {e}");
            vec![config.currency.base.clone()]
        }
    };

    ShopCurrencies::from_config(&config.currency, fallback)
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() -> ExitCode {
    // Load configuration from environment (needed for Sentry init)
    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Tracing is not initialized yet
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "harbor_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: StorefrontConfig) -> Result<(), String> {
    let storefront = StorefrontClient::new(&config.shopify, config.retry.clone());
    let currencies = load_currencies(&config, &storefront).await;
    tracing::info!(
        base = %currencies.base(),
        supported = currencies.supported().len(),
        "Shop currencies configured"
    );

    let pool = match &config.database_url {
        Some(url) => Some(
            db::create_pool(url)
                .await
                .map_err(|e| format!("Failed to create database pool: {e}"))?,
        ),
        None => None,
    };

    let addr = config.socket_addr();
    let state = AppState::new(config, storefront, currencies, pool.clone());

    let router = match pool {
        Some(pool) => {
            let store = middleware::postgres_store(&pool)
                .await
                .map_err(|e| format!("Failed to prepare session store: {e}"))?;
            tracing::info!("Sessions stored in PostgreSQL");
            app(state, store)
        }
        None => {
            tracing::info!("Sessions stored in memory");
            app(state, middleware::memory_store())
        }
    };

    // Sentry layers (outermost for full request coverage)
    let router = router
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {addr}: {e}"))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("Server error: {e}"))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
