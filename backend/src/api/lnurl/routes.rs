use super::handlers::lnurl_pay;
use axum::{Router, routing::get};

pub fn lnurl_router() -> Router {
    Router::new()
        .route("/.well-known/lnurlp/{name}", get(lnurl_pay))
        .route("/lnurlp/{name}", get(lnurl_pay))
}
