//! In-memory stand-in for the LND node, used by the service and router tests.

use crate::errors::LightningError;
use crate::services::node_manager::{Invoice, LightningClient};
use async_trait::async_trait;
use lightning::ln::PaymentHash;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct StoredInvoice {
    pub invoice: Invoice,
    pub value_sat: i64,
    pub memo: String,
    pub description_hash: Option<[u8; 32]>,
}

#[derive(Default)]
pub struct MockNode {
    invoices: Mutex<HashMap<String, StoredInvoice>>,
    /// When set, every call fails as if the node were offline.
    pub offline: bool,
    /// When set, every call panics.
    pub panics: bool,
}

impl MockNode {
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Default::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Default::default()
        }
    }

    pub fn settle(&self, payment_hash: &str) {
        if let Some(stored) = self.invoices.lock().unwrap().get_mut(payment_hash) {
            stored.invoice.settled = true;
        }
    }

    pub fn stored(&self, payment_hash: &str) -> Option<StoredInvoice> {
        self.invoices.lock().unwrap().get(payment_hash).cloned()
    }

    /// Looks an invoice up by its payment request.
    pub fn stored_by_request(&self, payment_request: &str) -> Option<StoredInvoice> {
        self.invoices
            .lock()
            .unwrap()
            .values()
            .find(|stored| stored.invoice.payment_request == payment_request)
            .cloned()
    }

    fn check_online(&self) -> Result<(), LightningError> {
        if self.panics {
            panic!("node client panicked");
        }
        if self.offline {
            return Err(LightningError::RemoteError("Unavailable: node offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LightningClient for MockNode {
    async fn add_invoice(
        &self,
        value_sat: i64,
        memo: &str,
        description_hash: Option<[u8; 32]>,
    ) -> Result<Invoice, LightningError> {
        self.check_online()?;
        if value_sat < 0 {
            return Err(LightningError::RemoteError(
                "InvalidArgument: amount must not be negative".to_string(),
            ));
        }

        let payment_hash = hex::encode(rand::random::<[u8; 32]>());
        let invoice = Invoice {
            payment_request: format!("lnbcrt{}n1p{}", value_sat, &payment_hash[..16]),
            payment_hash: payment_hash.clone(),
            settled: false,
        };
        self.invoices.lock().unwrap().insert(
            payment_hash,
            StoredInvoice {
                invoice: invoice.clone(),
                value_sat,
                memo: memo.to_string(),
                description_hash,
            },
        );
        Ok(invoice)
    }

    async fn lookup_invoice(&self, payment_hash: &PaymentHash) -> Result<Invoice, LightningError> {
        self.check_online()?;
        self.stored(&hex::encode(payment_hash.0))
            .map(|stored| stored.invoice)
            .ok_or_else(|| LightningError::RemoteError("NotFound: unable to locate invoice".to_string()))
    }

    async fn new_address(&self) -> Result<String, LightningError> {
        self.check_online()?;
        Ok(format!("bcrt1q{}", hex::encode(rand::random::<[u8; 20]>())))
    }
}
