//! LNURL-pay protocol types and the metadata commitment codec.
//!
//! Only the pieces of LNURL needed to serve a Lightning Address live here;
//! the exchange itself is driven by `services::lnurl_service`.

pub mod metadata;
pub mod models;
