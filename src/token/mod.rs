// SPDX-License-Identifier: AGPL-3.0-or-later

//! Bearer token issuance.
//!
//! Tokens are EdDSA-signed JWTs carrying subject, issuer, issued-at and
//! expiry claims. They are stateless and self-verifying: any holder of the
//! token public key can validate them, and their lifecycle ends purely by
//! expiry. There is no revocation list; operators needing revocation must
//! shorten the lifetime and rotate keys.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, Header};
use serde::{Deserialize, Serialize};

use crate::challenge::ChallengeError;
use crate::config::Config;

/// Claims carried by an issued bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Hex-encoded public key of the authenticated account.
    pub sub: String,
    /// Server identity (the configured home domain).
    pub iss: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// Mint a bearer token for a verified account identity.
pub fn issue_token(subject: &str, config: &Config) -> Result<String, ChallengeError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: subject.to_string(),
        iss: config.home_domain.clone(),
        iat: now,
        exp: now + config.token_expires_in.as_secs() as i64,
    };

    encode(&Header::new(Algorithm::EdDSA), &claims, &config.token_key)
        .map_err(|e| ChallengeError::SigningError(e.to_string()))
}
