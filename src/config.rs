// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup via
//! [`Config::from_env`]. Invalid values are fatal at startup, never
//! per-request.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `NETWORK_PASSPHRASE` | Network identifier string | Required |
//! | `HOME_DOMAIN` | Audience/home-domain string bound into challenges | Required |
//! | `SIGNING_KEY` | Hex-encoded 32-byte Ed25519 seed for challenge signing | Required |
//! | `TOKEN_SIGNING_KEY` | Ed25519 PKCS#8 PEM for JWT signing | Required |
//! | `LEDGER_URL` | Base URL of the ledger account-query endpoint | Required |
//! | `CHALLENGE_EXPIRES_IN` | Challenge validity window in seconds | `300` |
//! | `TOKEN_EXPIRES_IN` | Token lifetime in seconds | `86400` |
//! | `CLOCK_SKEW` | Clock skew tolerance in seconds | `60` |
//! | `AUTH_THRESHOLD` | Threshold class used for authentication (`low`/`med`/`high`) | `med` |
//! | `LEDGER_TIMEOUT` | Ledger lookup timeout in seconds | `10` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;
use std::time::Duration;

use ed25519_dalek::SigningKey;
use jsonwebtoken::EncodingKey;

use crate::ledger::ThresholdClass;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const NETWORK_PASSPHRASE_ENV: &str = "NETWORK_PASSPHRASE";
pub const HOME_DOMAIN_ENV: &str = "HOME_DOMAIN";
pub const SIGNING_KEY_ENV: &str = "SIGNING_KEY";
pub const TOKEN_SIGNING_KEY_ENV: &str = "TOKEN_SIGNING_KEY";
pub const LEDGER_URL_ENV: &str = "LEDGER_URL";
pub const CHALLENGE_EXPIRES_IN_ENV: &str = "CHALLENGE_EXPIRES_IN";
pub const TOKEN_EXPIRES_IN_ENV: &str = "TOKEN_EXPIRES_IN";
pub const CLOCK_SKEW_ENV: &str = "CLOCK_SKEW";
pub const AUTH_THRESHOLD_ENV: &str = "AUTH_THRESHOLD";
pub const LEDGER_TIMEOUT_ENV: &str = "LEDGER_TIMEOUT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Immutable service configuration, constructed once at startup and shared
/// read-only across requests.
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Network identifier bound into every challenge; mismatches fail
    /// verification, preventing cross-network replay.
    pub network_passphrase: String,
    /// Expected audience/home-domain string.
    pub home_domain: String,
    /// Server keypair used to sign issued challenges.
    pub signing_key: SigningKey,
    /// Key used to sign bearer tokens (EdDSA).
    pub token_key: EncodingKey,
    pub ledger_url: String,
    pub challenge_expires_in: Duration,
    pub token_expires_in: Duration,
    pub clock_skew: Duration,
    /// Which of the account's threshold classes gates authentication.
    pub auth_threshold: ThresholdClass,
    pub ledger_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl Config {
    /// Load and validate configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var(PORT_ENV, 8080u16)?;

        let network_passphrase = require(NETWORK_PASSPHRASE_ENV)?;
        let home_domain = require(HOME_DOMAIN_ENV)?;

        let signing_key = parse_signing_key(&require(SIGNING_KEY_ENV)?)?;
        let token_pem = require(TOKEN_SIGNING_KEY_ENV)?;
        let token_key =
            EncodingKey::from_ed_pem(token_pem.as_bytes()).map_err(|e| ConfigError::Invalid {
                name: TOKEN_SIGNING_KEY_ENV,
                reason: e.to_string(),
            })?;

        let ledger_url = require(LEDGER_URL_ENV)?;
        url::Url::parse(&ledger_url).map_err(|e| ConfigError::Invalid {
            name: LEDGER_URL_ENV,
            reason: e.to_string(),
        })?;

        let auth_threshold = match env::var(AUTH_THRESHOLD_ENV) {
            Ok(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                name: AUTH_THRESHOLD_ENV,
                reason,
            })?,
            Err(_) => ThresholdClass::Med,
        };

        Ok(Self {
            host,
            port,
            network_passphrase,
            home_domain,
            signing_key,
            token_key,
            ledger_url,
            challenge_expires_in: duration_var(CHALLENGE_EXPIRES_IN_ENV, 300)?,
            token_expires_in: duration_var(TOKEN_EXPIRES_IN_ENV, 86_400)?,
            clock_skew: duration_var(CLOCK_SKEW_ENV, 60)?,
            auth_threshold,
            ledger_timeout: duration_var(LEDGER_TIMEOUT_ENV, 10)?,
        })
    }

    /// Hex-encoded public key of the challenge-signing keypair, used as the
    /// server identity in API surfaces.
    pub fn server_account_id(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn duration_var(name: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    Ok(Duration::from_secs(parse_var(name, default_secs)?))
}

/// Parse a hex-encoded 32-byte Ed25519 seed into a signing keypair.
fn parse_signing_key(raw: &str) -> Result<SigningKey, ConfigError> {
    let bytes = hex::decode(raw.trim()).map_err(|e| ConfigError::Invalid {
        name: SIGNING_KEY_ENV,
        reason: e.to_string(),
    })?;
    let seed: [u8; 32] = bytes.try_into().map_err(|_| ConfigError::Invalid {
        name: SIGNING_KEY_ENV,
        reason: "expected 32 bytes of hex".to_string(),
    })?;
    Ok(SigningKey::from_bytes(&seed))
}

#[cfg(test)]
pub mod testutil {
    //! Test fixtures shared across module tests.

    use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
    use ed25519_dalek::pkcs8::{EncodePrivateKey, EncodePublicKey};
    use ed25519_dalek::SigningKey;
    use jsonwebtoken::EncodingKey;
    use rand::rngs::OsRng;
    use std::time::Duration;

    use super::Config;
    use crate::ledger::ThresholdClass;

    /// A ready-to-use config plus the token verification key tests need to
    /// decode issued JWTs.
    pub struct TestConfig {
        pub config: Config,
        pub token_public_pem: String,
    }

    pub fn test_config() -> TestConfig {
        let token_signing = SigningKey::generate(&mut OsRng);
        let token_pem = token_signing
            .to_pkcs8_pem(LineEnding::LF)
            .expect("encode token key");
        let token_public_pem = token_signing
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .expect("encode token public key");

        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            network_passphrase: "Test Network ; 2026".to_string(),
            home_domain: "auth.example.com".to_string(),
            signing_key: SigningKey::generate(&mut OsRng),
            token_key: EncodingKey::from_ed_pem(token_pem.as_bytes()).expect("token key"),
            ledger_url: "http://127.0.0.1:1".to_string(),
            challenge_expires_in: Duration::from_secs(300),
            token_expires_in: Duration::from_secs(86_400),
            clock_skew: Duration::from_secs(60),
            auth_threshold: ThresholdClass::Med,
            ledger_timeout: Duration::from_secs(2),
        };

        TestConfig {
            config,
            token_public_pem,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_signing_key_accepts_32_byte_hex() {
        let seed = "11".repeat(32);
        let key = parse_signing_key(&seed).expect("valid seed");
        assert_eq!(key.to_bytes(), [0x11u8; 32]);
    }

    #[test]
    fn parse_signing_key_rejects_short_seed() {
        let err = parse_signing_key("deadbeef").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: SIGNING_KEY_ENV,
                ..
            }
        ));
    }

    #[test]
    fn parse_signing_key_rejects_non_hex() {
        assert!(parse_signing_key("not hex at all").is_err());
    }

    #[test]
    fn server_account_id_is_hex_public_key() {
        let fixture = testutil::test_config();
        let id = fixture.config.server_account_id();
        assert_eq!(id.len(), 64);
        assert_eq!(
            hex::decode(&id).unwrap(),
            fixture
                .config
                .signing_key
                .verifying_key()
                .to_bytes()
                .to_vec()
        );
    }
}
