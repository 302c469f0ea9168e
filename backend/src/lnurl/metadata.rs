//! Canonical LNURL metadata and its content hash.
//!
//! The compact JSON string produced here is returned to the wallet during
//! discovery and hashed into the invoice's description hash when the wallet
//! asks for an invoice. Both sides must see byte-identical strings.

use bitcoin::hashes::{Hash, sha256};
use serde_json::Value;

pub const TEXT_IDENTIFIER: &str = "text/identifier";
pub const TEXT_PLAIN: &str = "text/plain";

/// Ordered `[type, value]` entries. Order is significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    /// Metadata for a Lightning Address: the identifier first, then the
    /// human readable description.
    pub fn for_identifier(identifier: &str, description: &str) -> Self {
        Self {
            entries: vec![
                (TEXT_IDENTIFIER.to_string(), identifier.to_string()),
                (TEXT_PLAIN.to_string(), description.to_string()),
            ],
        }
    }

    /// Compact JSON array of arrays, no whitespace.
    pub fn canonical_string(&self) -> String {
        Value::Array(
            self.entries
                .iter()
                .map(|(kind, value)| {
                    Value::Array(vec![Value::String(kind.clone()), Value::String(value.clone())])
                })
                .collect(),
        )
        .to_string()
    }

    /// SHA-256 of the UTF-8 bytes of [`Metadata::canonical_string`].
    pub fn content_hash(&self) -> [u8; 32] {
        sha256::Hash::hash(self.canonical_string().as_bytes()).to_byte_array()
    }
}
