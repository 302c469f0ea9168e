//! Invoice business logic service.
//!
//! Thin operation set over the node connection: create an invoice, look one
//! up by payment hash and fetch a fresh on-chain address. Nothing is cached;
//! the node is the system of record.

use crate::errors::LightningError;
use crate::services::node_manager::{Invoice, LightningClient};
use lightning::ln::PaymentHash;
use std::sync::Arc;
use tracing::Span;

pub struct InvoiceService {
    node: Arc<dyn LightningClient>,
    span: Span,
}

impl InvoiceService {
    /// Creates a new InvoiceService instance.
    ///
    /// # Arguments
    /// * `node` - Shared connection to the Lightning node
    /// * `span` - Span the service logs under
    pub fn new(node: Arc<dyn LightningClient>, span: Span) -> Self {
        Self { node, span }
    }

    /// Creates an invoice for `amount_sats`.
    ///
    /// `description_hash` binds the invoice to an external metadata
    /// commitment instead of the plain memo.
    ///
    /// # Errors
    /// Returns `RemoteError` when the node rejects the invoice.
    pub async fn add_invoice(
        &self,
        amount_sats: i64,
        memo: &str,
        description_hash: Option<[u8; 32]>,
    ) -> Result<Invoice, LightningError> {
        let invoice = self
            .node
            .add_invoice(amount_sats, memo, description_hash)
            .await?;
        tracing::debug!(parent: &self.span, payment_hash = %invoice.payment_hash, "Invoice created");
        Ok(invoice)
    }

    /// Looks up an invoice by its hex encoded payment hash.
    ///
    /// # Errors
    /// Returns `DecodeError` when the hash is not 32 hex encoded bytes and
    /// `RemoteError` when the node has no such invoice.
    pub async fn get_invoice(&self, payment_hash_hex: &str) -> Result<Invoice, LightningError> {
        let payment_hash = parse_payment_hash(payment_hash_hex)?;
        let invoice = self.node.lookup_invoice(&payment_hash).await?;
        tracing::debug!(parent: &self.span, payment_hash = %invoice.payment_hash, settled = invoice.settled, "Invoice looked up");
        Ok(invoice)
    }

    /// Requests a fresh receive address. Every call yields a new address.
    pub async fn new_address(&self) -> Result<String, LightningError> {
        self.node.new_address().await
    }
}

/// Parse hex string into PaymentHash
pub fn parse_payment_hash(payment_hash: &str) -> Result<PaymentHash, LightningError> {
    let payment_hash_bytes = hex::decode(payment_hash).map_err(|e| {
        LightningError::DecodeError(format!("Invalid payment hash format: {}", e))
    })?;

    let hash_array: [u8; 32] = payment_hash_bytes.try_into().map_err(|bytes: Vec<u8>| {
        LightningError::DecodeError(format!(
            "Payment hash must be 32 bytes, got {}",
            bytes.len()
        ))
    })?;
    Ok(PaymentHash(hash_array))
}
