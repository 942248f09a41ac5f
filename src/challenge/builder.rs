// SPDX-License-Identifier: AGPL-3.0-or-later

//! Challenge construction and server signing.

use chrono::Utc;
use ed25519_dalek::Signer;
use rand::rngs::OsRng;
use rand::RngCore;

use super::artifact::{network_id, ChallengeArtifact, ChallengeEnvelope, DecoratedSignature, NONCE_LEN};
use super::error::ChallengeError;
use crate::config::Config;

/// Build a fresh server-signed challenge and return its base64 envelope.
///
/// The nonce comes from the OS RNG at full entropy: a predictable or reused
/// nonce would make two challenges interchangeable and open a replay window.
/// The subject field is left unset; the client binds itself by filling it in
/// and signing the result. The server signature covers the subject-less
/// encoding so it survives that binding.
pub fn build_challenge(config: &Config) -> Result<String, ChallengeError> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let now = Utc::now().timestamp();
    let artifact = ChallengeArtifact {
        network_id: network_id(&config.network_passphrase),
        server_account: config.signing_key.verifying_key().to_bytes(),
        subject_account: None,
        home_domain: config.home_domain.clone(),
        nonce,
        valid_from: now,
        valid_until: now + config.challenge_expires_in.as_secs() as i64,
    };

    let payload = artifact.server_payload()?;
    let signature = config.signing_key.sign(&payload);

    let envelope = ChallengeEnvelope {
        signatures: vec![DecoratedSignature {
            signer: artifact.server_account,
            signature: signature.to_bytes(),
        }],
        artifact,
    };
    envelope.to_base64()
}
