//! Central module for application-wide configuration settings.
//!
//! Settings are read from `LNME_*` environment variables (a `.env` file is
//! honored). They cover the LND connection credentials, the listen address
//! and the toggles of the HTTP surface.

use crate::services::credential_service::{CredentialSource, LndCredentials};
use anyhow::{Context, Result, bail};
use std::env;

pub const DEFAULT_LISTEN: &str = ":1323";

const DEFAULT_LND_ADDRESS: &str = "localhost:10009";
const DEFAULT_CERT_PATH: &str = "~/.lnd/tls.cert";
const DEFAULT_MACAROON_PATH: &str = "~/.lnd/data/chain/bitcoin/mainnet/invoice.macaroon";

#[derive(Debug, Clone)]
pub struct Config {
    pub lnd_address: String,
    pub lnd_cert: Option<String>,
    pub lnd_cert_path: Option<String>,
    pub lnd_macaroon: Option<String>,
    pub lnd_macaroon_path: Option<String>,
    pub lnd_tls_domain: Option<String>,
    pub listen: String,
    pub disable_ln_address: bool,
    pub disable_cors: bool,
    /// Requests per second per client, 0 disables limiting.
    pub request_limit: f64,
    pub static_path: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let lnd_address = get("LNME_LND_ADDRESS").unwrap_or_else(|| DEFAULT_LND_ADDRESS.to_string());

        let request_limit = get("LNME_REQUEST_LIMIT")
            .unwrap_or_else(|| "5".to_string())
            .parse::<f64>()
            .ok()
            .filter(|limit| limit.is_finite() && *limit >= 0.0)
            .context("LNME_REQUEST_LIMIT must be a non-negative number")?;

        let disable_ln_address = parse_bool(get("LNME_DISABLE_LN_ADDRESS"))
            .context("LNME_DISABLE_LN_ADDRESS must be true or false")?;
        let disable_cors = parse_bool(get("LNME_DISABLE_CORS"))
            .context("LNME_DISABLE_CORS must be true or false")?;

        // PORT is what most cloud providers inject, so it beats LNME_PORT.
        let port = get("PORT")
            .map(|port| ("PORT", port))
            .or_else(|| get("LNME_PORT").map(|port| ("LNME_PORT", port)));
        let listen = match (get("LNME_LISTEN"), port) {
            (Some(_), Some(_)) => {
                bail!("Port and listen options are mutually exclusive, please just use listen")
            }
            (Some(listen), None) => listen,
            (None, Some((key, port))) => {
                tracing::warn!("Please use LNME_LISTEN instead of the deprecated port setting");
                port.parse::<u16>()
                    .with_context(|| format!("{} must be a valid number", key))?;
                format!(":{}", port)
            }
            (None, None) => DEFAULT_LISTEN.to_string(),
        };

        Ok(Config {
            lnd_address,
            lnd_cert: get("LNME_LND_CERT"),
            lnd_cert_path: get("LNME_LND_CERT_PATH").or_else(|| Some(DEFAULT_CERT_PATH.to_string())),
            lnd_macaroon: get("LNME_LND_MACAROON"),
            lnd_macaroon_path: get("LNME_LND_MACAROON_PATH")
                .or_else(|| Some(DEFAULT_MACAROON_PATH.to_string())),
            lnd_tls_domain: get("LNME_LND_TLS_DOMAIN"),
            listen,
            disable_ln_address,
            disable_cors,
            request_limit,
            static_path: get("LNME_STATIC_PATH"),
        })
    }

    /// The credential value object handed to the connection manager.
    pub fn lnd_credentials(&self) -> LndCredentials {
        LndCredentials {
            address: self.lnd_address.clone(),
            cert: CredentialSource {
                inline_hex: self.lnd_cert.clone(),
                path: self.lnd_cert_path.clone(),
            },
            macaroon: CredentialSource {
                inline_hex: self.lnd_macaroon.clone(),
                path: self.lnd_macaroon_path.clone(),
            },
            tls_domain: self.lnd_tls_domain.clone(),
        }
    }

    /// Socket address to bind, `:1323` meaning all interfaces.
    pub fn bind_address(&self) -> String {
        if self.listen.starts_with(':') {
            format!("0.0.0.0{}", self.listen)
        } else {
            self.listen.clone()
        }
    }
}

fn parse_bool(value: Option<String>) -> Result<bool> {
    match value.as_deref().map(|v| v.trim().to_lowercase()) {
        None => Ok(false),
        Some(v) if v == "true" || v == "1" => Ok(true),
        Some(v) if v == "false" || v == "0" => Ok(false),
        Some(v) => bail!("invalid boolean '{}'", v),
    }
}
