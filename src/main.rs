use gym_console::{
    AppState, FileStorage, HttpTransport, MenuTable, RouteGuard, SessionStore,
    config::{AppConfig, Env},
    create_router,
    session::StorageState,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, validates the navigation tables, restores the persisted session
/// and serves the console.
#[tokio::main]
async fn main() {
    // 1. Configuration
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gym_console=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Console starting in {:?} mode", config.env);

    // 3. Navigation Tables (fail fast on an inconsistent configuration)
    let guard = RouteGuard::standard().expect("FATAL: route table is inconsistent");
    let menu = match &config.menu_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading menu configuration");
            MenuTable::load(path).expect("FATAL: menu configuration is invalid")
        }
        None => MenuTable::standard(),
    };
    menu.validate()
        .expect("FATAL: every role needs a menu or an explicit fallback");
    for (role, entry) in menu.unreachable_entries(&guard) {
        tracing::warn!(%role, path = %entry.path, "menu entry leads to a screen the role cannot open");
    }

    // 4. Session Restore
    let file_storage = FileStorage::new(config.session_file.clone());
    tracing::info!(path = %file_storage.path().display(), "session storage");
    let session = Arc::new(SessionStore::new(Arc::new(file_storage) as StorageState));
    match session.restore().await {
        Ok(Some(_)) => {}
        Ok(None) => tracing::info!("no stored session, starting logged out"),
        Err(err) => tracing::warn!(%err, "stored session unreadable, starting logged out"),
    }

    // 5. Backend Transport
    let transport = HttpTransport::new(&config.api_base_url, config.request_timeout)
        .expect("FATAL: cannot build the HTTP client");
    tracing::info!(backend = %config.api_base_url, "backend configured");

    // 6. State, Router and Server
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(
        session,
        Arc::new(transport),
        Arc::new(guard),
        Arc::new(menu),
        config,
    );
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: cannot bind the listen address");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: server stopped unexpectedly");
}
