pub mod errors;
pub mod handlers;


pub use errors::ApiError;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::ledger::InvoiceLedger;
use crate::models::Sender;
use crate::store::InvoiceStore;
use handlers::{
    create_invoice, db_health_check, get_dashboard, get_invoice, get_me, get_sender_bank,
    health_check, list_invoices, method_not_allowed, not_found, update_invoice,
};

/// Application state shared by every handler.
///
/// Holds the invoice store handle and the ledger; nothing process-global.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn InvoiceStore>,
    pub ledger: InvoiceLedger,
    pub sender: Arc<Sender>,
    pub default_page_limit: i64,
}

/// Creates the main application router.
///
/// Invoice routes live under `/api/v1`; `/invoice/:id` and `/invoices/:id`
/// are equivalent. Unknown paths get a JSON 404 and known paths with the
/// wrong method a JSON 405.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route("/invoices/dashboard", get(get_dashboard))
        .route("/invoices/:invoice_id", get(get_invoice).patch(update_invoice))
        .route("/invoice/:invoice_id", get(get_invoice).patch(update_invoice))
        .route("/me", get(get_me))
        .route("/me/bank", get(get_sender_bank))
        .method_not_allowed_fallback(method_not_allowed);

    Router::new()
        .route("/health", get(health_check))
        .route("/health/db", get(db_health_check))
        .method_not_allowed_fallback(method_not_allowed)
        .nest("/api/v1", api)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
