//! Lightning Address endpoint.
//!
//! Resolves the identifier's host and the callback URL from the request and
//! hands plain values to the LNURL-pay service. Responses are always 200.

use crate::lnurl::models::{LnurlErrorResponse, LnurlPayOutcome};
use crate::services::lnurl_service::{LnurlPayService, PayRequestContext};
use axum::{
    Json,
    extract::{Extension, OriginalUri, Path, Query, rejection::QueryRejection},
    http::{HeaderMap, header},
};
use serde::Deserialize;
use std::sync::Arc;

const X_FORWARDED_HOST: &str = "x-forwarded-host";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const DEFAULT_SCHEME: &str = "https";

#[derive(Debug, Deserialize)]
pub struct LnurlPayQuery {
    /// Millisatoshi, present only on the callback.
    pub amount: Option<String>,
}

/// First value of a possibly comma separated proxy header.
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// The forwarding header wins over the request's own host. Both phases go
/// through here so the identifier hashed in the invoice matches discovery.
///
/// A reverse proxy in front of lnme must set `X-Forwarded-Host`;
/// `X-Forwarded-For` carries the client address and is not consulted.
pub fn resolve_host(headers: &HeaderMap, uri: &axum::http::Uri) -> String {
    header_value(headers, X_FORWARDED_HOST)
        .or_else(|| header_value(headers, header::HOST.as_str()))
        .or_else(|| uri.authority().map(|authority| authority.to_string()))
        .unwrap_or_default()
}

pub fn resolve_scheme(headers: &HeaderMap) -> String {
    header_value(headers, X_FORWARDED_PROTO).unwrap_or_else(|| DEFAULT_SCHEME.to_string())
}

#[axum::debug_handler]
pub async fn lnurl_pay(
    Extension(lnurl): Extension<Arc<LnurlPayService>>,
    Path(name): Path<String>,
    query: Result<Query<LnurlPayQuery>, QueryRejection>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Json<LnurlPayOutcome> {
    let amount = match query {
        Ok(Query(query)) => query.amount,
        Err(rejection) => {
            tracing::warn!("Rejected LNURL query {:?}: {}", uri.query(), rejection);
            return Json(LnurlPayOutcome::Error(LnurlErrorResponse::new(
                "Invalid Amount",
            )));
        }
    };

    let ctx = PayRequestContext {
        name,
        host: resolve_host(&headers, &uri),
        scheme: resolve_scheme(&headers),
        path: uri.path().to_string(),
    };

    Json(lnurl.handle(&ctx, amount.as_deref()).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Uri};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_forwarded_host_wins() {
        let uri: Uri = "/.well-known/lnurlp/alice".parse().unwrap();
        let map = headers(&[
            ("host", "127.0.0.1:1323"),
            ("x-forwarded-host", "pay.example.com, proxy.internal"),
        ]);
        assert_eq!(resolve_host(&map, &uri), "pay.example.com");
    }

    #[test]
    fn test_host_header_without_proxy() {
        let uri: Uri = "/lnurlp/alice".parse().unwrap();
        let map = headers(&[("host", "pay.example.com")]);
        assert_eq!(resolve_host(&map, &uri), "pay.example.com");

        let empty_forward = headers(&[("host", "pay.example.com"), ("x-forwarded-host", "")]);
        assert_eq!(resolve_host(&empty_forward, &uri), "pay.example.com");
    }

    #[test]
    fn test_scheme_defaults_to_https() {
        assert_eq!(resolve_scheme(&HeaderMap::new()), "https");
        assert_eq!(resolve_scheme(&headers(&[("x-forwarded-proto", "http")])), "http");
    }
}
