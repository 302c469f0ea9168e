//! Manages the authenticated connection to the LND node.
//!
//! This module builds the gRPC channel from resolved credentials, attaches
//! the macaroon to every call through an interceptor, and exposes the node
//! operations the rest of the application needs via [`LightningClient`].

use crate::{
    errors::LightningError,
    services::credential_service::LndCredentials,
};

use async_trait::async_trait;
use hyper::{Uri, client::HttpConnector};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use lightning::ln::PaymentHash;
use serde::{Deserialize, Serialize};
use tonic_lnd::{
    lnrpc::{
        AddressType, Invoice as LndInvoice, NewAddressRequest, PaymentHash as LndPaymentHash,
        invoice::InvoiceState, lightning_client::LightningClient as LndRpcClient,
    },
    tonic::{
        Request, Status,
        body::BoxBody,
        metadata::AsciiMetadataValue,
        service::{Interceptor, interceptor::InterceptedService},
    },
};
use tower::ServiceExt;
use tracing::{Instrument, Span};

/// A Lightning invoice as seen by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub payment_hash: String,
    pub payment_request: String,
    pub settled: bool,
}

/// Attaches the macaroon to every outgoing call.
#[derive(Clone)]
pub struct MacaroonInterceptor {
    macaroon: AsciiMetadataValue,
}

impl Interceptor for MacaroonInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        request
            .metadata_mut()
            .insert("macaroon", self.macaroon.clone());
        Ok(request)
    }
}

type HttpsClient = hyper::Client<HttpsConnector<HttpConnector>, BoxBody>;
type LndRpc = LndRpcClient<InterceptedService<HttpsClient, MacaroonInterceptor>>;

pub struct LndNode {
    client: LndRpc,
    span: Span,
}

/// Prefixes `https://` when the address carries no scheme.
pub fn normalize_address(address: &str) -> String {
    if address.starts_with("https://") || address.starts_with("http://") {
        address.to_string()
    } else {
        format!("https://{}", address)
    }
}

impl LndNode {
    /// Resolves the credentials and dials the node.
    ///
    /// The returned node is immutable: there is no reconnect, and a severed
    /// channel fails every subsequent call with a `RemoteError`.
    pub async fn connect(credentials: LndCredentials, span: Span) -> Result<Self, LightningError> {
        let resolved = credentials.resolve()?;

        let macaroon = resolved
            .macaroon_hex
            .parse::<AsciiMetadataValue>()
            .map_err(|err| LightningError::AuthError(format!("Invalid macaroon: {}", err)))?;

        let address = normalize_address(&credentials.address);
        let uri = address
            .parse::<Uri>()
            .ok()
            .filter(|uri| uri.host().is_some())
            .ok_or_else(|| LightningError::ConfigError(format!("Invalid LND address {}", address)))?;

        let mut builder = HttpsConnectorBuilder::new()
            .with_tls_config(tls::pinned_client_config(&resolved.cert_pem)?)
            .https_or_http();
        if let Some(domain) = credentials.tls_domain.as_deref() {
            builder = builder.with_server_name(domain.to_string());
        }
        let connector = builder.enable_http2().build();

        // Handshake once here: an unreachable node or a certificate mismatch
        // is a connect error, not a failure of the first call.
        tracing::info!(parent: &span, "Connecting to {}", address);
        connector
            .clone()
            .oneshot(uri.clone())
            .instrument(span.clone())
            .await
            .map_err(|err| {
                LightningError::ConnectionError(format!("Cannot connect to {}: {}", address, err))
            })?;

        let http = hyper::Client::builder().http2_only(true).build(connector);
        let service = InterceptedService::new(http, MacaroonInterceptor { macaroon });

        Ok(Self {
            client: LndRpcClient::with_origin(service, uri),
            span,
        })
    }

    /// Clones the stub; the underlying channel is multiplexed so concurrent
    /// callers never wait on each other here.
    fn stub(&self) -> LndRpc {
        self.client.clone()
    }
}

/// LND serves a self-signed certificate that is also its own CA, which
/// regular chain validation rejects. The node is trusted when it presents
/// exactly the configured certificate instead.
mod tls {
    use crate::errors::LightningError;
    use rustls::{
        Certificate, ClientConfig, Error as TlsError, ServerName,
        client::{ServerCertVerified, ServerCertVerifier},
    };
    use std::{sync::Arc, time::SystemTime};

    struct PinnedCertVerifier {
        certs: Vec<Vec<u8>>,
    }

    impl ServerCertVerifier for PinnedCertVerifier {
        fn verify_server_cert(
            &self,
            end_entity: &Certificate,
            intermediates: &[Certificate],
            _server_name: &ServerName,
            _scts: &mut dyn Iterator<Item = &[u8]>,
            _ocsp_response: &[u8],
            _now: SystemTime,
        ) -> Result<ServerCertVerified, TlsError> {
            let presented: Vec<&[u8]> = intermediates
                .iter()
                .chain(std::iter::once(end_entity))
                .map(|cert| cert.0.as_slice())
                .collect();

            if presented.len() != self.certs.len() {
                return Err(TlsError::General(format!(
                    "Expected {} certificates, node presented {}",
                    self.certs.len(),
                    presented.len()
                )));
            }
            if presented
                .iter()
                .zip(&self.certs)
                .any(|(presented, pinned)| *presented != pinned.as_slice())
            {
                return Err(TlsError::General(
                    "Node certificate does not match the configured one".to_string(),
                ));
            }
            Ok(ServerCertVerified::assertion())
        }
    }

    pub(super) fn pinned_client_config(cert_pem: &[u8]) -> Result<ClientConfig, LightningError> {
        let mut certs = rustls_pemfile::certs(&mut &cert_pem[..]).map_err(|err| {
            LightningError::AuthError(format!("Cannot parse TLS certificate: {}", err))
        })?;
        certs.retain(|cert| !cert.is_empty());
        if certs.is_empty() {
            return Err(LightningError::AuthError(
                "TLS certificate holds no certificate".to_string(),
            ));
        }

        Ok(ClientConfig::builder()
            .with_safe_defaults()
            .with_custom_certificate_verifier(Arc::new(PinnedCertVerifier { certs }))
            .with_no_client_auth())
    }
}

fn remote_error(status: Status) -> LightningError {
    LightningError::RemoteError(format!("{:?}: {}", status.code(), status.message()))
}

/// The node operations the invoice and LNURL services depend on.
#[async_trait]
pub trait LightningClient: Send + Sync {
    /// Creates an invoice over `value_sat`. When `description_hash` is set
    /// the invoice commits to it instead of carrying `memo` as description.
    async fn add_invoice(
        &self,
        value_sat: i64,
        memo: &str,
        description_hash: Option<[u8; 32]>,
    ) -> Result<Invoice, LightningError>;
    /// Looks up an invoice by payment hash, reporting its current settlement.
    async fn lookup_invoice(&self, payment_hash: &PaymentHash) -> Result<Invoice, LightningError>;
    /// Requests a fresh on-chain receive address.
    async fn new_address(&self) -> Result<String, LightningError>;
}

#[async_trait]
impl LightningClient for LndNode {
    async fn add_invoice(
        &self,
        value_sat: i64,
        memo: &str,
        description_hash: Option<[u8; 32]>,
    ) -> Result<Invoice, LightningError> {
        tracing::info!(parent: &self.span, "Adding invoice: memo={} value={}", memo, value_sat);
        let request = LndInvoice {
            memo: memo.to_string(),
            value: value_sat,
            description_hash: description_hash.map(|hash| hash.to_vec()).unwrap_or_default(),
            ..Default::default()
        };

        let response = self
            .stub()
            .add_invoice(request)
            .instrument(self.span.clone())
            .await
            .map_err(remote_error)?
            .into_inner();

        Ok(Invoice {
            payment_hash: hex::encode(&response.r_hash),
            payment_request: response.payment_request,
            settled: false,
        })
    }

    async fn lookup_invoice(&self, payment_hash: &PaymentHash) -> Result<Invoice, LightningError> {
        tracing::info!(parent: &self.span, "Getting invoice: hash={}", hex::encode(payment_hash.0));
        let request = LndPaymentHash {
            r_hash: payment_hash.0.to_vec(),
            ..Default::default()
        };

        let invoice = self
            .stub()
            .lookup_invoice(request)
            .instrument(self.span.clone())
            .await
            .map_err(remote_error)?
            .into_inner();

        Ok(Invoice {
            payment_hash: hex::encode(&invoice.r_hash),
            settled: invoice.state() == InvoiceState::Settled,
            payment_request: invoice.payment_request,
        })
    }

    async fn new_address(&self) -> Result<String, LightningError> {
        tracing::info!(parent: &self.span, "Getting a new BTC address");
        let request = NewAddressRequest {
            r#type: AddressType::WitnessPubkeyHash as i32,
            ..Default::default()
        };

        let response = self
            .stub()
            .new_address(request)
            .instrument(self.span.clone())
            .await
            .map_err(remote_error)?
            .into_inner();

        Ok(response.address)
    }
}
