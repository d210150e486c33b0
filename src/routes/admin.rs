use crate::{
    AppState, handlers,
    models::{AccountingEntry, Trainer, UserAccount},
};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Screens only administrators render. Administrators also pass every other role set,
/// so this module holds what nobody else may see rather than everything they can.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // --- Console Accounts ---
        // GET/POST /usuarios
        // Console logins and their roles.
        .route(
            "/usuarios",
            get(handlers::list_records::<UserAccount>)
                .post(handlers::create_record::<UserAccount>),
        )
        // GET/PUT/DELETE /usuarios/{id}
        .route(
            "/usuarios/{id}",
            get(handlers::show_record::<UserAccount>)
                .put(handlers::update_record::<UserAccount>)
                .delete(handlers::delete_record::<UserAccount>),
        )
        // --- Staff ---
        // GET/POST /entrenadores
        // Trainers employed by the gym.
        .route(
            "/entrenadores",
            get(handlers::list_records::<Trainer>).post(handlers::create_record::<Trainer>),
        )
        // GET/PUT/DELETE /entrenadores/{id}
        .route(
            "/entrenadores/{id}",
            get(handlers::show_record::<Trainer>)
                .put(handlers::update_record::<Trainer>)
                .delete(handlers::delete_record::<Trainer>),
        )
        // --- Accounting ---
        // GET/POST /contabilidad
        // Income and expense ledger.
        .route(
            "/contabilidad",
            get(handlers::list_records::<AccountingEntry>)
                .post(handlers::create_record::<AccountingEntry>),
        )
        // GET /contabilidad/{id}
        // Ledger lines are corrected with a new entry, not edited.
        .route("/contabilidad/{id}", get(handlers::show_record::<AccountingEntry>))
}
