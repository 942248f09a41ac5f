// SPDX-License-Identifier: AGPL-3.0-or-later

//! Challenge verification.
//!
//! Verification is split in two so the ledger lookup can sit between them:
//!
//! 1. [`verify_envelope`] runs the pure structural checks (network, time
//!    window, audience, server signature, subject extraction) and yields the
//!    claimed subject account;
//! 2. [`verify_client_signatures`] checks the client's signatures against the
//!    subject account's signer list and threshold, once that record has been
//!    fetched (or substituted with the implicit single-signer record).
//!
//! Every failing check short-circuits with its own [`ChallengeError`] kind.

use chrono::Utc;

use super::artifact::{network_id, ChallengeEnvelope};
use super::error::ChallengeError;
use super::weight;
use crate::config::Config;
use crate::ledger::AccountRecord;

/// Structurally verify a submitted envelope and extract the subject account.
///
/// Checks, in order: network id, validity window (with configured clock-skew
/// tolerance), home domain, exactly one valid server signature over the
/// subject-less encoding, and subject presence. Returns the subject's
/// hex-encoded public key.
pub fn verify_envelope(
    envelope: &ChallengeEnvelope,
    config: &Config,
) -> Result<String, ChallengeError> {
    let artifact = &envelope.artifact;

    if artifact.network_id != network_id(&config.network_passphrase) {
        return Err(ChallengeError::NetworkMismatch);
    }

    let now = Utc::now().timestamp();
    let skew = config.clock_skew.as_secs() as i64;
    // Saturating arithmetic: adversarial timestamps at the i64 extremes must
    // not overflow the window checks.
    if now < artifact.valid_from.saturating_sub(skew) {
        return Err(ChallengeError::ChallengeNotYetValid);
    }
    if now > artifact.valid_until.saturating_add(skew) {
        return Err(ChallengeError::ChallengeExpired);
    }

    if artifact.home_domain != config.home_domain {
        return Err(ChallengeError::AudienceMismatch);
    }

    // An artifact addressed to a different server key was not issued here,
    // whatever signatures it carries.
    let server_key = config.signing_key.verifying_key().to_bytes();
    if artifact.server_account != server_key {
        return Err(ChallengeError::MissingServerSignature);
    }

    let server_payload = artifact.server_payload()?;
    let mut server_signatures = envelope
        .signatures
        .iter()
        .filter(|sig| sig.signer == server_key);
    match (server_signatures.next(), server_signatures.next()) {
        (Some(signature), None) if signature.verifies(&server_payload) => {}
        _ => return Err(ChallengeError::MissingServerSignature),
    }

    let subject = artifact
        .subject_account
        .ok_or(ChallengeError::NoSubjectAccount)?;
    Ok(hex::encode(subject))
}

/// Verify the client's signatures carry enough weight for `account`.
///
/// Signatures that fail cryptographic verification or whose signer is not in
/// the account's signer list are discarded rather than rejected: the hard
/// gate is the accumulated weight of the survivors against the configured
/// threshold class.
pub fn verify_client_signatures(
    envelope: &ChallengeEnvelope,
    account: &AccountRecord,
    config: &Config,
) -> Result<(), ChallengeError> {
    let server_key = config.signing_key.verifying_key().to_bytes();
    let payload = envelope.artifact.client_payload()?;

    let presented: Vec<(String, bool)> = envelope
        .signatures
        .iter()
        .filter(|sig| sig.signer != server_key)
        .map(|sig| (hex::encode(sig.signer), sig.verifies(&payload)))
        .collect();

    let threshold = account.thresholds.class(config.auth_threshold);
    let outcome = weight::accumulate(&account.signers, threshold, &presented);
    if !outcome.met {
        return Err(ChallengeError::InsufficientSignatureWeight {
            required: outcome.required,
            presented: outcome.total,
        });
    }
    Ok(())
}
