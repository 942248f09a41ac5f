// SPDX-License-Identifier: AGPL-3.0-or-later

//! Challenge verification and issuance errors.
//!
//! Client-input failures map to 400 with a specific reason so callers know to
//! try again differently; ledger lookup failures map to 503 (retry later);
//! key failures map to 500 (operator problem). No failure is ambiguous.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, PartialEq, Eq)]
pub enum ChallengeError {
    /// Envelope could not be decoded.
    MalformedChallenge(String),
    /// Challenge was built for a different network.
    NetworkMismatch,
    /// Current time is past the validity window (plus skew).
    ChallengeExpired,
    /// Current time is before the validity window (minus skew).
    ChallengeNotYetValid,
    /// Home-domain field does not match the configured audience.
    AudienceMismatch,
    /// The server's own signature is absent or invalid.
    MissingServerSignature,
    /// No subject account present in the envelope.
    NoSubjectAccount,
    /// Ledger lookup failed or timed out.
    AccountLookupFailed(String),
    /// Accumulated signature weight below the account's threshold.
    InsufficientSignatureWeight { required: u32, presented: u32 },
    /// Token or challenge signing key unusable.
    SigningError(String),
    /// Challenge could not be canonically serialized.
    EncodingError(String),
}

#[derive(Serialize)]
struct ChallengeErrorBody {
    error: String,
    error_code: String,
}

impl ChallengeError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ChallengeError::MalformedChallenge(_) => "malformed_challenge",
            ChallengeError::NetworkMismatch => "network_mismatch",
            ChallengeError::ChallengeExpired => "challenge_expired",
            ChallengeError::ChallengeNotYetValid => "challenge_not_yet_valid",
            ChallengeError::AudienceMismatch => "audience_mismatch",
            ChallengeError::MissingServerSignature => "missing_server_signature",
            ChallengeError::NoSubjectAccount => "no_subject_account",
            ChallengeError::AccountLookupFailed(_) => "account_lookup_failed",
            ChallengeError::InsufficientSignatureWeight { .. } => "insufficient_signature_weight",
            ChallengeError::SigningError(_) => "signing_error",
            ChallengeError::EncodingError(_) => "encoding_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ChallengeError::MalformedChallenge(_)
            | ChallengeError::NetworkMismatch
            | ChallengeError::ChallengeExpired
            | ChallengeError::ChallengeNotYetValid
            | ChallengeError::AudienceMismatch
            | ChallengeError::MissingServerSignature
            | ChallengeError::NoSubjectAccount
            | ChallengeError::InsufficientSignatureWeight { .. } => StatusCode::BAD_REQUEST,
            ChallengeError::AccountLookupFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
            ChallengeError::SigningError(_) | ChallengeError::EncodingError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::fmt::Display for ChallengeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChallengeError::MalformedChallenge(reason) => {
                write!(f, "Challenge is malformed: {reason}")
            }
            ChallengeError::NetworkMismatch => {
                write!(f, "Challenge was issued for a different network")
            }
            ChallengeError::ChallengeExpired => write!(f, "Challenge has expired"),
            ChallengeError::ChallengeNotYetValid => write!(f, "Challenge is not yet valid"),
            ChallengeError::AudienceMismatch => {
                write!(f, "Challenge home domain does not match this service")
            }
            ChallengeError::MissingServerSignature => {
                write!(f, "Challenge is missing a valid server signature")
            }
            ChallengeError::NoSubjectAccount => {
                write!(f, "Challenge does not identify a subject account")
            }
            ChallengeError::AccountLookupFailed(reason) => {
                write!(f, "Account lookup failed: {reason}")
            }
            ChallengeError::InsufficientSignatureWeight {
                required,
                presented,
            } => write!(
                f,
                "Signature weight {presented} below required threshold {required}"
            ),
            ChallengeError::SigningError(reason) => write!(f, "Signing failed: {reason}"),
            ChallengeError::EncodingError(reason) => {
                write!(f, "Challenge could not be encoded: {reason}")
            }
        }
    }
}

impl std::error::Error for ChallengeError {}

impl IntoResponse for ChallengeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ChallengeErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
