//! Central module for organizing the application's HTTP endpoints.
//!
//! The invoice endpoints mirror the LND REST API v1, the LNURL endpoints serve
//! Lightning Addresses. [`router`] assembles them together with the CORS,
//! rate limiting and static file layers selected by the configuration.

pub mod common;
pub mod invoice;
pub mod lnurl;
pub mod rate_limit;

use crate::config::Config;
use crate::services::{invoice_service::InvoiceService, lnurl_service::LnurlPayService};
use axum::{Extension, Json, Router, middleware, routing::get};
use rate_limit::{RequestLimiter, limit_by_ip};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, services::ServeDir};

pub fn router(
    config: &Config,
    invoices: Arc<InvoiceService>,
    lnurl: Arc<LnurlPayService>,
) -> Router {
    let mut app = Router::new()
        .route("/ping", get(ping))
        .merge(invoice::routes::invoice_router());

    if !config.disable_ln_address {
        app = app.merge(lnurl::routes::lnurl_router());
    }

    if let Some(static_path) = config.static_path.as_deref() {
        tracing::info!("Serving static files from {}", static_path);
        app = app.fallback_service(ServeDir::new(static_path));
    }

    app = app
        .layer(Extension(invoices))
        .layer(Extension(lnurl))
        .layer(CatchPanicLayer::new());

    if !config.disable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    if config.request_limit > 0.0 {
        let limiter = Arc::new(RequestLimiter::new(config.request_limit));
        app = app.layer(middleware::from_fn_with_state(limiter, limit_by_ip));
    }

    app
}

async fn ping() -> Json<&'static str> {
    Json("pong")
}
