//! Two-phase LNURL-pay exchange for Lightning Addresses.
//!
//! Discovery returns the pay parameters and the metadata; the callback with
//! an `amount` issues an invoice committing to that same metadata. The
//! phases share no server-side state, so the identifier must be derived the
//! same way both times.

use crate::errors::LightningError;
use crate::lnurl::metadata::Metadata;
use crate::lnurl::models::{
    LnurlErrorResponse, LnurlPayOutcome, LnurlPayResponse1, LnurlPayResponse2, STATUS_OK,
    SuccessAction, TAG_PAY_REQUEST,
};
use crate::services::invoice_service::InvoiceService;
use std::sync::Arc;
use tracing::Span;

pub const MIN_SENDABLE_MSAT: i64 = 1_000;
pub const MAX_SENDABLE_MSAT: i64 = 100_000_000;
pub const SUCCESS_MESSAGE: &str = "Thanks, payment received!";

/// The request as resolved by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayRequestContext {
    pub name: String,
    pub host: String,
    pub scheme: String,
    pub path: String,
}

impl PayRequestContext {
    /// `name@host`, the Lightning Address being paid.
    pub fn identifier(&self) -> String {
        format!("{}@{}", self.name, self.host)
    }

    /// Fully qualified URL of the endpoint that served this request.
    pub fn callback_url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.host, self.path)
    }

    fn metadata(&self) -> Metadata {
        let identifier = self.identifier();
        Metadata::for_identifier(&identifier, &format!("Sats for {}", identifier))
    }
}

pub struct LnurlPayService {
    invoices: Arc<InvoiceService>,
    span: Span,
}

impl LnurlPayService {
    pub fn new(invoices: Arc<InvoiceService>, span: Span) -> Self {
        Self { invoices, span }
    }

    /// Runs whichever phase the request asks for and folds failures into a
    /// protocol error body.
    pub async fn handle(&self, ctx: &PayRequestContext, amount: Option<&str>) -> LnurlPayOutcome {
        match amount.filter(|a| !a.is_empty()) {
            None => LnurlPayOutcome::Discovery(self.discover(ctx)),
            Some(amount) => match self.request_invoice(ctx, amount).await {
                Ok(response) => LnurlPayOutcome::Invoice(response),
                Err(LightningError::ValidationError(reason)) => {
                    tracing::warn!(parent: &self.span, "Invalid amount: {}", reason);
                    LnurlPayOutcome::Error(LnurlErrorResponse::new("Invalid Amount"))
                }
                Err(err) => {
                    tracing::error!(parent: &self.span, "Error creating invoice: {}", err);
                    LnurlPayOutcome::Error(LnurlErrorResponse::new("Server Error"))
                }
            },
        }
    }

    /// Phase 1. Creates nothing on the node.
    pub fn discover(&self, ctx: &PayRequestContext) -> LnurlPayResponse1 {
        LnurlPayResponse1 {
            status: STATUS_OK.to_string(),
            callback: ctx.callback_url(),
            min_sendable: MIN_SENDABLE_MSAT,
            max_sendable: MAX_SENDABLE_MSAT,
            metadata: ctx.metadata().canonical_string(),
            tag: TAG_PAY_REQUEST.to_string(),
        }
    }

    /// Phase 2. `amount` is in millisatoshi; sub-satoshi remainders are
    /// floored away.
    pub async fn request_invoice(
        &self,
        ctx: &PayRequestContext,
        amount: &str,
    ) -> Result<LnurlPayResponse2, LightningError> {
        tracing::info!(parent: &self.span, "New LightningAddress request amount: {}", amount);
        let msats = parse_amount(amount)?;
        let sats = msats / 1000;

        let identifier = ctx.identifier();
        let description_hash = ctx.metadata().content_hash();
        let invoice = self
            .invoices
            .add_invoice(sats, &identifier, Some(description_hash))
            .await?;

        Ok(LnurlPayResponse2 {
            status: STATUS_OK.to_string(),
            pr: invoice.payment_request,
            routes: Vec::new(),
            success_action: Some(SuccessAction::message(SUCCESS_MESSAGE)),
            disposable: false,
        })
    }
}

/// Parses a millisatoshi amount, accepting only values of at least 1000.
pub fn parse_amount(amount: &str) -> Result<i64, LightningError> {
    let msats = amount.parse::<i64>().map_err(|err| {
        LightningError::ValidationError(format!("amount '{}' is not an integer: {}", amount, err))
    })?;
    if msats < MIN_SENDABLE_MSAT {
        return Err(LightningError::ValidationError(format!(
            "amount {} is below the minimum of {} msat",
            msats, MIN_SENDABLE_MSAT
        )));
    }
    Ok(msats)
}
