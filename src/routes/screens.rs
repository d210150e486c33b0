use crate::{
    AppState, handlers,
    models::{Client, GymClass, Membership, Payment, Product, Routine},
};
use axum::{Router, routing::get};

/// Screens Router Module
///
/// The day-to-day screens of receptionists and trainers. Every route here is wrapped by
/// the navigation guard (see `create_router`): no session redirects to login, a role
/// outside the path's role set redirects to the dashboard.
pub fn screen_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /dashboard
        // Landing screen of every authenticated role.
        .route("/dashboard", get(handlers::dashboard))
        // --- Front Desk ---
        // GET/POST /clientes
        // Lists gym members and submits the new-client form.
        .route(
            "/clientes",
            get(handlers::list_records::<Client>).post(handlers::create_record::<Client>),
        )
        // GET/PUT /clientes/{id}
        // Client detail and edit form. Clients are deactivated, never deleted.
        .route(
            "/clientes/{id}",
            get(handlers::show_record::<Client>).put(handlers::update_record::<Client>),
        )
        // GET/POST /membresias
        // Membership plans on sale.
        .route(
            "/membresias",
            get(handlers::list_records::<Membership>)
                .post(handlers::create_record::<Membership>),
        )
        // GET/PUT/DELETE /membresias/{id}
        .route(
            "/membresias/{id}",
            get(handlers::show_record::<Membership>)
                .put(handlers::update_record::<Membership>)
                .delete(handlers::delete_record::<Membership>),
        )
        // GET/POST /pagos
        // Payment history and the front-desk payment form.
        .route(
            "/pagos",
            get(handlers::list_records::<Payment>).post(handlers::create_record::<Payment>),
        )
        // GET /pagos/{id}
        // Recorded payments are read-only.
        .route("/pagos/{id}", get(handlers::show_record::<Payment>))
        // GET/POST /productos
        // Products sold at the desk, with stock.
        .route(
            "/productos",
            get(handlers::list_records::<Product>).post(handlers::create_record::<Product>),
        )
        // GET/PUT/DELETE /productos/{id}
        .route(
            "/productos/{id}",
            get(handlers::show_record::<Product>)
                .put(handlers::update_record::<Product>)
                .delete(handlers::delete_record::<Product>),
        )
        // --- Classes ---
        // GET/POST /clases
        // Scheduled group classes.
        .route(
            "/clases",
            get(handlers::list_records::<GymClass>).post(handlers::create_record::<GymClass>),
        )
        // GET/PUT /clases/{id}
        .route(
            "/clases/{id}",
            get(handlers::show_record::<GymClass>).put(handlers::update_record::<GymClass>),
        )
        // GET/POST /clases/{id}/inscripciones
        // Roster of a class with free places, and enrollment with capacity and
        // duplicate checks before the backend is called.
        .route(
            "/clases/{id}/inscripciones",
            get(handlers::class_roster).post(handlers::enroll_client),
        )
        // --- Trainers' Workspace ---
        // GET/POST /rutinas
        // Training routines and their exercises.
        .route(
            "/rutinas",
            get(handlers::list_records::<Routine>).post(handlers::create_record::<Routine>),
        )
        // GET/PUT/DELETE /rutinas/{id}
        .route(
            "/rutinas/{id}",
            get(handlers::show_record::<Routine>)
                .put(handlers::update_record::<Routine>)
                .delete(handlers::delete_record::<Routine>),
        )
        // --- Queries ---
        // GET /consultas
        // Client picker of the query screen.
        .route("/consultas", get(handlers::query_screen))
        // GET /consultas/clientes/{id}
        // One client with its routine and payments, loaded concurrently.
        .route("/consultas/clientes/{id}", get(handlers::client_overview))
}
