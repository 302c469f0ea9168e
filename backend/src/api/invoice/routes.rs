use super::handlers::{create_invoice, get_invoice, new_address};
use axum::{
    Router,
    routing::{get, post},
};

/// Endpoint URLs compatible with the LND REST API v1.
pub fn invoice_router() -> Router {
    Router::new()
        .route("/v1/invoices", post(create_invoice))
        .route("/v1/invoice/{payment_hash}", get(get_invoice))
        .route("/v1/newaddress", post(new_address))
}
