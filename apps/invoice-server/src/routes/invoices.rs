//! Invoice CRUD routes
//!
//! Endpoints:
//! - GET /api/invoices?q= - List invoices, newest first, optionally filtered
//! - POST /api/invoices - Save a confirmed invoice
//! - GET /api/invoices/:id - Get one invoice
//! - PUT /api/invoices/:id - Replace the fields present in the body
//! - DELETE /api/invoices/:id - Delete an invoice (the stored PDF is kept)

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::InvoiceRepository;
use crate::error::{AppError, Result};
use crate::invoice::{validate, InvoiceRecord, InvoiceUpdate, NewInvoice};
use crate::state::AppState;

/// Query parameters for listing
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Substring of vendor name or invoice number
    pub q: Option<String>,
}

/// Create the invoices router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route(
            "/:id",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
}

/// Normalize a path id to the stored (hyphenated) form
fn parse_id(raw: &str) -> Result<String> {
    Uuid::try_parse(raw)
        .map(|id| id.to_string())
        .map_err(|_| AppError::Validation(format!("Invalid invoice ID: {}", raw)))
}

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| AppError::Validation(e.body_text()))
}

/// GET /api/invoices
async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<InvoiceRecord>>> {
    let repo = InvoiceRepository::new(state.db());
    let invoices = repo.list(query.q.as_deref()).await?;
    Ok(Json(invoices))
}

/// POST /api/invoices
async fn create_invoice(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewInvoice>, JsonRejection>,
) -> Result<(StatusCode, Json<InvoiceRecord>)> {
    let new_invoice = body(payload)?;
    validate::validate_new_invoice(&new_invoice).map_err(|v| AppError::Validation(v.to_string()))?;

    if !state.blobs().exists(&new_invoice.file_id).await? {
        return Err(AppError::Validation(format!(
            "fileId {} does not reference an uploaded file",
            new_invoice.file_id
        )));
    }

    let repo = InvoiceRepository::new(state.db());
    let invoice = repo.create(&new_invoice).await?;

    Ok((StatusCode::CREATED, Json(invoice)))
}

/// GET /api/invoices/:id
async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InvoiceRecord>> {
    let id = parse_id(&id)?;
    let repo = InvoiceRepository::new(state.db());

    let invoice = repo
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Invoice {} not found", id)))?;

    Ok(Json(invoice))
}

/// PUT /api/invoices/:id
async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<InvoiceUpdate>, JsonRejection>,
) -> Result<Json<InvoiceRecord>> {
    let id = parse_id(&id)?;
    let update = body(payload)?;
    validate::validate_update(&update).map_err(|v| AppError::Validation(v.to_string()))?;

    let repo = InvoiceRepository::new(state.db());
    let invoice = repo
        .update(&id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Invoice {} not found", id)))?;

    Ok(Json(invoice))
}

/// DELETE /api/invoices/:id
async fn delete_invoice(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    let id = parse_id(&id)?;
    let repo = InvoiceRepository::new(state.db());

    if !repo.delete(&id).await? {
        return Err(AppError::NotFound(format!("Invoice {} not found", id)));
    }

    tracing::info!(invoice_id = %id, "Deleted invoice");
    Ok(StatusCode::NO_CONTENT)
}
