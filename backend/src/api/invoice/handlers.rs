use super::models::CreateInvoiceRequest;
use crate::api::common::{ApiError, bad_request, lightning_error_to_http, validation_error_response};
use crate::services::{invoice_service::InvoiceService, node_manager::Invoice};
use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
};
use std::sync::Arc;
use validator::Validate;

/// Handler for creating a new invoice
#[axum::debug_handler]
pub async fn create_invoice(
    Extension(invoices): Extension<Arc<InvoiceService>>,
    payload: Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> Result<Json<Invoice>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!("Bad request: {}", rejection);
        bad_request("Bad request")
    })?;
    request.validate().map_err(validation_error_response)?;

    let invoice = invoices
        .add_invoice(request.value, &request.memo, None)
        .await
        .map_err(|e| lightning_error_to_http(e, "adding invoice"))?;

    Ok(Json(invoice))
}

/// Handler for checking the status of an invoice
#[axum::debug_handler]
pub async fn get_invoice(
    Extension(invoices): Extension<Arc<InvoiceService>>,
    Path(payment_hash): Path<String>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice = invoices
        .get_invoice(&payment_hash)
        .await
        .map_err(|e| lightning_error_to_http(e, "fetching invoice"))?;

    Ok(Json(invoice))
}

/// Handler for getting the next on-chain address
#[axum::debug_handler]
pub async fn new_address(
    Extension(invoices): Extension<Arc<InvoiceService>>,
) -> Result<Json<String>, ApiError> {
    let address = invoices
        .new_address()
        .await
        .map_err(|e| lightning_error_to_http(e, "getting address"))?;

    Ok(Json(address))
}
