//! Module for core business logic services.
//!
//! This module holds the connection to the Lightning node, the credential
//! resolution it depends on, and the invoice and LNURL-pay services built
//! on top of it.

pub mod credential_service;
pub mod invoice_service;
pub mod lnurl_service;
#[cfg(test)]
pub mod mock_node;
pub mod node_manager;
