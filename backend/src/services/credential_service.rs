//! Resolution of LND credential material.
//!
//! The TLS certificate and the macaroon can each be supplied inline (hex
//! encoded) or as a file path. Inline values always take precedence so that
//! operators can inject secrets without touching the filesystem.

use crate::errors::LightningError;
use expanduser::expanduser;
use std::fs;

/// First byte of a binary (v2) macaroon, the format LND writes.
const MACAROON_V2_VERSION: u8 = 0x02;
const PEM_CERT_HEADER: &str = "-----BEGIN CERTIFICATE-----";

/// Where a single credential comes from.
#[derive(Debug, Clone, Default)]
pub struct CredentialSource {
    pub inline_hex: Option<String>,
    pub path: Option<String>,
}

/// Everything needed to open an authenticated channel to LND.
#[derive(Debug, Clone)]
pub struct LndCredentials {
    pub address: String,
    pub cert: CredentialSource,
    pub macaroon: CredentialSource,
    /// Server name to verify the certificate against, defaults to the address host.
    pub tls_domain: Option<String>,
}

/// Credential material after resolution and parsing.
#[derive(Debug, Clone)]
pub struct ResolvedCredentials {
    pub cert_pem: Vec<u8>,
    pub macaroon_hex: String,
}

impl CredentialSource {
    /// Returns the raw bytes of this credential.
    ///
    /// `kind` is only used for error messages ("TLS certificate", "macaroon").
    pub fn resolve(&self, kind: &str) -> Result<Vec<u8>, LightningError> {
        let bytes = if let Some(inline) = self.inline_hex.as_deref().filter(|s| !s.is_empty()) {
            hex::decode(inline.trim()).map_err(|err| {
                LightningError::AuthError(format!("Cannot decode inline {}: {}", kind, err))
            })?
        } else if let Some(path) = self.path.as_deref().filter(|s| !s.is_empty()) {
            let path = expanduser(path).map_err(|err| {
                LightningError::ConfigError(format!("Invalid {} path '{}': {}", kind, path, err))
            })?;
            fs::read(&path).map_err(|err| {
                LightningError::ConfigError(format!(
                    "Cannot read {} from {}: {}",
                    kind,
                    path.display(),
                    err
                ))
            })?
        } else {
            return Err(LightningError::ConfigError(format!("LND {} is missing", kind)));
        };

        if bytes.is_empty() {
            return Err(LightningError::ConfigError(format!("LND {} is empty", kind)));
        }
        Ok(bytes)
    }
}

impl LndCredentials {
    /// Resolves and validates both the certificate and the macaroon.
    pub fn resolve(&self) -> Result<ResolvedCredentials, LightningError> {
        let cert_pem = parse_certificate(self.cert.resolve("TLS certificate")?)?;
        let macaroon_hex = parse_macaroon(&self.macaroon.resolve("macaroon")?)?;
        Ok(ResolvedCredentials {
            cert_pem,
            macaroon_hex,
        })
    }
}

/// Checks the certificate bytes are a PEM encoded certificate.
fn parse_certificate(bytes: Vec<u8>) -> Result<Vec<u8>, LightningError> {
    let text = std::str::from_utf8(&bytes).map_err(|_| {
        LightningError::AuthError("TLS certificate is not PEM encoded".to_string())
    })?;
    if !text.contains(PEM_CERT_HEADER) {
        return Err(LightningError::AuthError(
            "TLS certificate is missing a PEM certificate block".to_string(),
        ));
    }
    Ok(bytes)
}

/// Checks the macaroon is in binary v2 form and returns it hex encoded, the
/// representation LND expects in the `macaroon` call metadata.
fn parse_macaroon(bytes: &[u8]) -> Result<String, LightningError> {
    match bytes.first() {
        Some(&MACAROON_V2_VERSION) if bytes.len() > 1 => Ok(hex::encode(bytes)),
        _ => Err(LightningError::AuthError(
            "macaroon is not a binary v2 macaroon".to_string(),
        )),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    pub(crate) const TEST_CERT: &str = "-----BEGIN CERTIFICATE-----\nMIIBszCCAVmgAwIBAgIQ\n-----END CERTIFICATE-----\n";

    pub(crate) fn test_macaroon() -> Vec<u8> {
        vec![0x02, 0x01, 0x03, b'l', b'n', b'd', 0x02, 0x05]
    }

    fn temp_file(contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("lnme-cred-{}", rand::random::<u64>()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_inline_takes_precedence_over_file() {
        let path = temp_file(b"from file");
        let source = CredentialSource {
            inline_hex: Some(hex::encode(b"from inline")),
            path: Some(path.display().to_string()),
        };
        assert_eq!(source.resolve("macaroon").unwrap(), b"from inline");
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_file_is_used_without_inline() {
        let path = temp_file(b"from file");
        let source = CredentialSource {
            inline_hex: Some(String::new()),
            path: Some(path.display().to_string()),
        };
        assert_eq!(source.resolve("macaroon").unwrap(), b"from file");
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_sources_is_config_error() {
        let err = CredentialSource::default().resolve("macaroon").unwrap_err();
        assert!(matches!(err, LightningError::ConfigError(_)));
    }

    #[test]
    fn test_unreadable_or_empty_file_is_config_error() {
        let source = CredentialSource {
            inline_hex: None,
            path: Some("/nonexistent/lnme/tls.cert".to_string()),
        };
        assert!(matches!(
            source.resolve("TLS certificate"),
            Err(LightningError::ConfigError(_))
        ));

        let path = temp_file(b"");
        let source = CredentialSource {
            inline_hex: None,
            path: Some(path.display().to_string()),
        };
        assert!(matches!(
            source.resolve("TLS certificate"),
            Err(LightningError::ConfigError(_))
        ));
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_bad_inline_hex_is_auth_error() {
        let source = CredentialSource {
            inline_hex: Some("zz-not-hex".to_string()),
            path: None,
        };
        assert!(matches!(
            source.resolve("macaroon"),
            Err(LightningError::AuthError(_))
        ));
    }

    #[test]
    fn test_resolve_validates_cert_and_macaroon() {
        let creds = LndCredentials {
            address: "localhost:10009".to_string(),
            cert: CredentialSource {
                inline_hex: Some(hex::encode(TEST_CERT)),
                path: None,
            },
            macaroon: CredentialSource {
                inline_hex: Some(hex::encode(test_macaroon())),
                path: None,
            },
            tls_domain: None,
        };
        let resolved = creds.resolve().unwrap();
        assert_eq!(resolved.cert_pem, TEST_CERT.as_bytes());
        assert_eq!(resolved.macaroon_hex, hex::encode(test_macaroon()));

        let mut bad_cert = creds.clone();
        bad_cert.cert.inline_hex = Some(hex::encode("not a certificate"));
        assert!(matches!(bad_cert.resolve(), Err(LightningError::AuthError(_))));

        let mut bad_macaroon = creds;
        bad_macaroon.macaroon.inline_hex = Some(hex::encode("AgEDbG5k"));
        assert!(matches!(
            bad_macaroon.resolve(),
            Err(LightningError::AuthError(_))
        ));
    }
}
