use serde::Deserialize;
use validator::Validate;

/// Body of `POST /v1/invoices`, compatible with the LND REST API.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    /// Amount in satoshis
    #[validate(range(min = 0, message = "Value must not be negative"))]
    pub value: i64,
    /// BOLT11 descriptions are capped at 639 characters
    #[serde(default)]
    #[validate(length(max = 639, message = "Memo must be at most 639 characters"))]
    pub memo: String,
}
