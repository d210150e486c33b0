use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod menu;
pub mod models;
pub mod roster;
pub mod session;

// Routing split by audience (public, guarded screens, administrator screens).
pub mod routes;
use routes::{admin, public, screens};

// --- Public Re-exports ---

pub use api::{ApiClient, HttpTransport, MockTransport, TransportState};
pub use config::AppConfig;
pub use guard::{Decision, GuardState, NavigationRequest, RouteGuard};
pub use menu::{MenuState, MenuTable};
pub use session::{FileStorage, MemoryStorage, SessionState, SessionStore, StorageState};

use guard::redirect_response;

/// ApiDoc
///
/// OpenAPI description of the console's own HTTP surface, served at
/// `/api-docs/openapi.json` and browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::home, handlers::help, handlers::login_screen, handlers::login,
        handlers::logout, handlers::session_summary, handlers::menu,
        handlers::resolve_navigation, handlers::dashboard, handlers::class_roster,
        handlers::enroll_client, handlers::query_screen, handlers::client_overview
    ),
    components(
        schemas(
            models::Credentials, models::SessionSummary, models::Client, models::Trainer,
            models::Membership, models::Product, models::Payment, models::EntryKind,
            models::AccountingEntry, models::GymClass, models::Enrollment,
            models::EnrollRequest, models::Exercise, models::Routine, models::UserAccount,
            models::ClientOverview, menu::MenuEntry, guard::NavigationRequest,
            guard::Decision, roster::ClassRoster, roster::RosterView,
        )
    ),
    tags(
        (name = "gym-console", description = "Gym administration console")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything the handlers share: the session, the backend client and the static
/// navigation tables. Cloning is cheap, all heavy parts are behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub session: SessionState,
    pub api: ApiClient,
    pub guard: GuardState,
    pub menu: MenuState,
    pub config: AppConfig,
}

impl AppState {
    /// Wires a state around an already restored session store.
    pub fn new(
        session: SessionState,
        transport: TransportState,
        guard: GuardState,
        menu: MenuState,
        config: AppConfig,
    ) -> Self {
        let api = ApiClient::new(transport, session.clone());
        Self {
            session,
            api,
            guard,
            menu,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.session.clone()
    }
}

impl FromRef<AppState> for GuardState {
    fn from_ref(app_state: &AppState) -> GuardState {
        app_state.guard.clone()
    }
}

impl FromRef<AppState> for MenuState {
    fn from_ref(app_state: &AppState) -> MenuState {
        app_state.menu.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// navigation_guard
///
/// Runs the route guard in front of every guarded screen. Renders by passing the
/// request on; otherwise answers with the guard's redirect and never reaches the handler.
async fn navigation_guard(
    State(guard): State<GuardState>,
    State(session): State<SessionState>,
    request: Request,
    next: Next,
) -> Response {
    let navigation = NavigationRequest::to(request.uri().path());
    let current = session.current().await;

    match guard.evaluate(&navigation, current.as_ref()) {
        Decision::Render => next.run(request).await,
        Decision::Redirect { to, replace } => redirect_response(&to, replace),
    }
}

/// create_router
///
/// Assembles the console's routes, the navigation guard and the observability layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header used to correlate every log line of one request.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Guarded Screens
    // Front-desk, trainer and administrator screens share one guard layer; the route
    // table decides per path who renders and who is redirected.
    let guarded = screens::screen_routes()
        .merge(admin::admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            navigation_guard,
        ));

    // 3. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Swagger UI over the generated OpenAPI document.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public screens: no guard, they render with or without a session.
        .merge(public::public_routes())
        .merge(guarded)
        .with_state(state);

    // 4. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 4a. Request ID: a fresh UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 4b. Tracing: one span per request, tagged with the request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 4c. Propagation: echo x-request-id back on the response.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 5. CORS Layer (outermost)
        .layer(cors)
}

/// Span for one request, correlated by the `x-request-id` set above.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
