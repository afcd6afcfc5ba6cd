use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::AppState;
use crate::error::LedgerError;
use crate::ledger::build_dashboard;
use crate::models::{
    BankDetail, CreateInvoice, Invoice, InvoiceDashboard, InvoiceStatus, Sender, UpdateInvoice,
};
use crate::store::PageParams;

/// Raw listing query. Parsed by hand so bad values get a readable message.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

fn parse_page_value(raw: Option<&str>, default: i64, message: &str) -> Result<i64, ApiError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => v
            .parse::<i64>()
            .ok()
            .filter(|n| *n >= 0)
            .ok_or_else(|| ApiError::BadRequest(message.to_string())),
    }
}

fn parse_invoice_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::Unprocessable("invoiceId is not a valid uuid".to_string()))
}

/// Health check endpoint.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "invoicer-core",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Store health check endpoint.
///
/// Verifies the invoice store answers a trivial request.
pub async fn db_health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    state.store.health_check().await.map_err(|e| {
        error!("Store health check failed: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "database": "connected"
    })))
}

/// `GET /api/v1/invoices` - newest-created first.
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    let page = PageParams {
        limit: parse_page_value(
            query.limit.as_deref(),
            state.default_page_limit,
            "Invalid limit value",
        )?,
        offset: parse_page_value(query.offset.as_deref(), 0, "Invalid offset value")?,
    };

    let invoices = state.store.find_page(page).await?;
    Ok(Json(invoices))
}

/// `GET /api/v1/invoice/:invoice_id`
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice_id = parse_invoice_id(&invoice_id)?;
    let invoice = state.store.find_by_id(invoice_id).await?;
    Ok(Json(invoice))
}

/// `POST /api/v1/invoices`
pub async fn create_invoice(
    State(state): State<AppState>,
    payload: Result<Json<CreateInvoice>, JsonRejection>,
) -> Result<(StatusCode, Json<Invoice>), ApiError> {
    let Json(input) = payload.map_err(ApiError::invalid_body)?;

    let invoice = state.ledger.create(&input, Utc::now())?;
    state.store.insert(&invoice).await?;

    info!(
        "Created invoice {} for {} (amount {})",
        invoice.invoice_id, invoice.customer_info.email, invoice.amount
    );
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// `PATCH /api/v1/invoice/:invoice_id`
///
/// Read, apply the ledger update, write back. Concurrent updates to the same
/// invoice are last-writer-wins.
pub async fn update_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
    payload: Result<Json<UpdateInvoice>, JsonRejection>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice_id = parse_invoice_id(&invoice_id)?;
    let Json(input) = payload.map_err(ApiError::invalid_body)?;

    if let Some(status) = input.status {
        if status.is_payment() {
            return Err(LedgerError::validation(format!(
                "status must be one of {}, {}, {}, {}",
                InvoiceStatus::Draft,
                InvoiceStatus::Created,
                InvoiceStatus::Sent,
                InvoiceStatus::Canceled
            ))
            .into());
        }
    }

    let existing = state.store.find_by_id(invoice_id).await?;
    let now = Utc::now();
    let mut updated = state.ledger.update(&existing, &input, now).map_err(|e| {
        if let LedgerError::Overpayment { .. } = e {
            warn!("Rejected overpayment on invoice {}: {}", invoice_id, e);
        }
        e
    })?;

    if updated == existing {
        return Ok(Json(existing));
    }

    updated.updated_at = now;
    state.store.replace(invoice_id, &updated).await?;
    info!("Updated invoice {} (status {})", invoice_id, updated.status);
    Ok(Json(updated))
}

/// `GET /api/v1/invoices/dashboard`
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<InvoiceDashboard>, ApiError> {
    let dashboard = build_dashboard(state.store.as_ref(), Utc::now()).await?;
    Ok(Json(dashboard))
}

/// `GET /api/v1/me`
pub async fn get_me(State(state): State<AppState>) -> Json<Sender> {
    Json(state.sender.as_ref().clone())
}

/// `GET /api/v1/me/bank`
pub async fn get_sender_bank(State(state): State<AppState>) -> Json<BankDetail> {
    Json(state.sender.bank_detail.clone())
}

pub async fn not_found(uri: Uri) -> Response {
    warn!("404 - Not Found: {}", uri);
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "detail": "not found" })),
    )
        .into_response()
}

pub async fn method_not_allowed(method: Method, uri: Uri) -> Response {
    warn!("405 - Method Not Allowed: {} {}", method, uri);
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(serde_json::json!({ "detail": "method not allowed" })),
    )
        .into_response()
}
