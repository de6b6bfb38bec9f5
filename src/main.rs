//! academy-console - keeps a live change feed from the academy backend.
//!
//! Loads configuration, optionally logs in, binds the realtime client to the
//! query cache and runs until Ctrl-C.

use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use academy_console::adapters::{
    AuthApi, FileCredentialStore, FlagLoginRedirect, HttpResourceClient, InMemoryCredentialStore,
    StompTransport, TracingNotifier,
};
use academy_console::application::{
    CacheInvalidationBridge, QueryCache, RealtimeClient, RealtimeSettings, Resources,
};
use academy_console::config::{AppConfig, LoggingConfig, ValidationError};
use academy_console::ports::{ApiError, CredentialStore, Notifier};

#[derive(Debug, Error)]
enum StartupError {
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Backend client error: {0}")]
    Api(#[from] ApiError),

    #[error("Failed to wait for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    let credentials: Arc<dyn CredentialStore> = match &config.auth.token_path {
        Some(path) => Arc::new(FileCredentialStore::new(path)),
        None => Arc::new(InMemoryCredentialStore::new()),
    };

    let base_url = config.api.base_url();
    let auth = AuthApi::new(&base_url, config.api.timeout(), Arc::clone(&credentials))?;
    if let (Some(username), Some(password)) = (&config.auth.username, &config.auth.password) {
        let response = auth.login(username, password).await?;
        tracing::info!(username = %username, token_type = %response.token_type, "Logged in");
    } else {
        match auth.validate_stored().await {
            Ok(Some(validation)) if !validation.valid => {
                tracing::warn!(error = ?validation.error, "Stored token was rejected");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Could not validate stored token"),
        }
    }

    let redirect = Arc::new(FlagLoginRedirect::new());
    let api = Arc::new(HttpResourceClient::new(
        &base_url,
        config.api.timeout(),
        Arc::clone(&credentials),
        redirect.clone(),
    )?);

    let cache = QueryCache::new(config.cache.stale_time());
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier::new());
    let resources = Resources::new(api, cache.clone(), Arc::clone(&notifier));

    let settings = RealtimeSettings::new(config.realtime.endpoint())
        .with_heartbeat_ms(config.realtime.heartbeat_ms)
        .with_policy(config.realtime.reconnect_policy());
    let client = RealtimeClient::new(Arc::new(StompTransport::new()), credentials, settings);

    let bridge = Arc::new(CacheInvalidationBridge::new(cache.clone(), notifier));
    bridge.register(&client);

    if config.realtime.enabled {
        tracing::info!(endpoint = %config.realtime.endpoint(), "Connecting to live updates");
        client.connect_with_stored_credential().await;
    } else {
        tracing::info!("Live updates disabled");
    }

    match resources.students.list_paged(0, 20, None).await {
        Ok(page) => tracing::info!(total = page.total_elements, "Students available"),
        Err(e) => tracing::warn!(error = %e, "Could not load students"),
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!(login_required = redirect.login_required(), "Shutting down");
    client.disconnect();
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.logging);

    let result = match config.validate() {
        Ok(()) => run(config).await,
        Err(e) => Err(StartupError::from(e)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "academy-console stopped");
            ExitCode::FAILURE
        }
    }
}
