use crate::{
    AppState,
    api::Resource,
    auth::{AuthenticatedSession, CurrentSession},
    error::ApiError,
    guard::{self, Decision, NavigationRequest},
    menu::MenuEntry,
    models::{
        Client, ClientOverview, Credentials, EnrollRequest, Enrollment, Role, SessionSummary,
    },
    roster::RosterView,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

// --- View Envelope ---

/// ScreenView
///
/// Every screen renders as its name, the menu for the current role and the screen's own
/// data. The front end never derives the menu itself.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScreenView<T> {
    pub screen: String,
    pub menu: Vec<MenuEntry>,
    pub data: T,
}

fn screen<T>(state: &AppState, name: &str, role: Option<Role>, data: T) -> ScreenView<T> {
    ScreenView {
        screen: name.to_string(),
        menu: state.menu.build(role),
        data,
    }
}

// --- Public Screens ---

/// home
///
/// [Public Route] Landing screen, rendered with or without a session.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Home screen"))
)]
pub async fn home(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Json<ScreenView<SessionSummary>> {
    let summary = state.session.summary().await;
    Json(screen(&state, "inicio", session.role(), summary))
}

/// help
///
/// [Public Route] Static help screen.
#[utoipa::path(
    get,
    path = "/ayuda",
    responses((status = 200, description = "Help screen"))
)]
pub async fn help(State(state): State<AppState>, session: CurrentSession) -> Json<ScreenView<Value>> {
    let data = json!({
        "docs": "/swagger-ui",
        "backend": state.config.api_base_url,
    });
    Json(screen(&state, "ayuda", session.role(), data))
}

/// login_screen
///
/// [Public Route] Login form. An operator who is already logged in is sent to the
/// landing page instead.
#[utoipa::path(
    get,
    path = "/login",
    responses(
        (status = 200, description = "Login screen"),
        (status = 303, description = "Already logged in")
    )
)]
pub async fn login_screen(State(state): State<AppState>, session: CurrentSession) -> Response {
    if session.0.is_some() {
        return guard::redirect_response(state.guard.landing_path(), true);
    }
    Json(screen(&state, "login", None, Value::Null)).into_response()
}

/// login
///
/// [Public Route] Exchanges credentials for a backend token, stores the session and
/// navigates to the landing page.
#[utoipa::path(
    post,
    path = "/login",
    request_body = Credentials,
    responses(
        (status = 303, description = "Logged in, redirect to the dashboard"),
        (status = 401, description = "Invalid credentials"),
        (status = 422, description = "Empty username or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, ApiError> {
    state.api.login(&credentials).await?;
    Ok(guard::redirect_response(state.guard.landing_path(), true))
}

/// logout
///
/// [Public Route] Clears the stored token and role and navigates to login. Idempotent.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 303, description = "Logged out, redirect to login"))
)]
pub async fn logout(State(state): State<AppState>) -> Result<Response, ApiError> {
    state.api.logout().await?;
    Ok(guard::redirect_response(state.guard.login_path(), true))
}

/// session_summary
///
/// [Public Route] Whether a session is active and with which role.
#[utoipa::path(
    get,
    path = "/session",
    responses((status = 200, description = "Current session", body = SessionSummary))
)]
pub async fn session_summary(State(state): State<AppState>) -> Json<SessionSummary> {
    Json(state.session.summary().await)
}

/// menu
///
/// [Public Route] The navigation menu for the current session.
#[utoipa::path(
    get,
    path = "/menu",
    responses((status = 200, description = "Visible menu entries", body = [MenuEntry]))
)]
pub async fn menu(State(state): State<AppState>, session: CurrentSession) -> Json<Vec<MenuEntry>> {
    Json(state.menu.build(session.role()))
}

/// resolve_navigation
///
/// [Public Route] Lets a client-side router ask the guard about a path before
/// navigating. Same verdict the guard middleware applies to screen requests.
#[utoipa::path(
    post,
    path = "/navigation/resolve",
    request_body = NavigationRequest,
    responses((status = 200, description = "Guard decision", body = Decision))
)]
pub async fn resolve_navigation(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<NavigationRequest>,
) -> Json<Decision> {
    Json(state.guard.evaluate(&request, session.as_ref()))
}

// --- Guarded Screens ---

/// dashboard
///
/// [Guarded Route] Landing page of every authenticated role.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard"),
        (status = 303, description = "No session, redirect to login")
    )
)]
pub async fn dashboard(
    State(state): State<AppState>,
    AuthenticatedSession(session): AuthenticatedSession,
) -> Json<ScreenView<SessionSummary>> {
    let summary = SessionSummary {
        authenticated: true,
        role: Some(session.role()),
    };
    Json(screen(&state, "dashboard", Some(session.role()), summary))
}

/// [Guarded Route] Lists a backend collection.
pub async fn list_records<R: Resource>(
    State(state): State<AppState>,
    AuthenticatedSession(session): AuthenticatedSession,
) -> Result<Json<ScreenView<Vec<R>>>, ApiError> {
    let records = state.api.list::<R>().await?;
    Ok(Json(screen(&state, R::SCREEN, Some(session.role()), records)))
}

/// [Guarded Route] Detail/edit form of one record.
pub async fn show_record<R: Resource>(
    State(state): State<AppState>,
    AuthenticatedSession(session): AuthenticatedSession,
    Path(id): Path<i64>,
) -> Result<Json<ScreenView<R>>, ApiError> {
    let record = state.api.fetch::<R>(id).await?;
    Ok(Json(screen(&state, R::SCREEN, Some(session.role()), record)))
}

/// [Guarded Route] Create form submission. Invalid input is rejected with 422 before
/// anything reaches the backend.
pub async fn create_record<R: Resource>(
    State(state): State<AppState>,
    Json(record): Json<R>,
) -> Result<(StatusCode, Json<R>), ApiError> {
    let created = state.api.create(&record).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// [Guarded Route] Edit form submission.
pub async fn update_record<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(record): Json<R>,
) -> Result<Json<R>, ApiError> {
    Ok(Json(state.api.update(id, &record).await?))
}

/// [Guarded Route]
pub async fn delete_record<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.api.delete::<R>(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// class_roster
///
/// [Guarded Route] Enrollment screen of a class: roster, free places and the clients
/// that can still be added.
#[utoipa::path(
    get,
    path = "/clases/{id}/inscripciones",
    params(("id" = i64, Path, description = "Class ID")),
    responses((status = 200, description = "Class roster", body = RosterView))
)]
pub async fn class_roster(
    State(state): State<AppState>,
    AuthenticatedSession(session): AuthenticatedSession,
    Path(class_id): Path<i64>,
) -> Result<Json<ScreenView<RosterView>>, ApiError> {
    let view = state.api.roster_view(class_id).await?;
    Ok(Json(screen(&state, "inscripciones", Some(session.role()), view)))
}

/// enroll_client
///
/// [Guarded Route] Registers a client into a class after checking capacity and
/// duplicates against the current roster.
#[utoipa::path(
    post,
    path = "/clases/{id}/inscripciones",
    params(("id" = i64, Path, description = "Class ID")),
    request_body = EnrollRequest,
    responses(
        (status = 201, description = "Enrolled", body = Enrollment),
        (status = 409, description = "Class full or client already enrolled")
    )
)]
pub async fn enroll_client(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Json(request): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<Enrollment>), ApiError> {
    let enrollment = state.api.enroll(class_id, &request).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// query_screen
///
/// [Guarded Route] Entry point of the client query screen: the clients to pick from.
#[utoipa::path(
    get,
    path = "/consultas",
    responses((status = 200, description = "Clients available for querying", body = [Client]))
)]
pub async fn query_screen(
    State(state): State<AppState>,
    AuthenticatedSession(session): AuthenticatedSession,
) -> Result<Json<ScreenView<Vec<Client>>>, ApiError> {
    let clients = state.api.list::<Client>().await?;
    Ok(Json(screen(&state, "consultas", Some(session.role()), clients)))
}

/// client_overview
///
/// [Guarded Route] A client with its routine and payment history, loaded in parallel.
#[utoipa::path(
    get,
    path = "/consultas/clientes/{id}",
    params(("id" = i64, Path, description = "Client ID")),
    responses((status = 200, description = "Client overview", body = ClientOverview))
)]
pub async fn client_overview(
    State(state): State<AppState>,
    AuthenticatedSession(session): AuthenticatedSession,
    Path(client_id): Path<i64>,
) -> Result<Json<ScreenView<ClientOverview>>, ApiError> {
    let overview = state.api.client_overview(client_id).await?;
    Ok(Json(screen(&state, "consultas", Some(session.role()), overview)))
}
