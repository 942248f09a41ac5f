// SPDX-License-Identifier: AGPL-3.0-or-later

//! Challenge issuance endpoint.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::challenge::{build_challenge, ChallengeError};
use crate::state::AppState;

/// A freshly issued challenge.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChallengeResponse {
    /// Base64-encoded server-signed challenge envelope. The client binds its
    /// account into it, signs it, and posts it back.
    pub transaction: String,
    /// Network the challenge is valid for.
    pub network_passphrase: String,
}

/// Issue a fresh challenge. No request body; the challenge is not yet bound
/// to an account.
#[utoipa::path(
    get,
    path = "/",
    tag = "Auth",
    responses(
        (status = 200, description = "Challenge issued", body = ChallengeResponse),
        (status = 500, description = "Server key unusable")
    )
)]
pub async fn challenge(
    State(state): State<AppState>,
) -> Result<Json<ChallengeResponse>, ChallengeError> {
    let transaction = build_challenge(&state.config)?;
    Ok(Json(ChallengeResponse {
        transaction,
        network_passphrase: state.config.network_passphrase.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::ChallengeEnvelope;
    use crate::state::testutil::test_state;

    #[tokio::test]
    async fn challenge_endpoint_returns_decodable_envelope() {
        let state = test_state("http://127.0.0.1:1");
        let response = challenge(State(state.clone())).await.expect("challenge");

        assert_eq!(
            response.0.network_passphrase,
            state.config.network_passphrase
        );
        let envelope = ChallengeEnvelope::from_base64(&response.0.transaction).expect("decodes");
        assert!(envelope.artifact.subject_account.is_none());
        assert_eq!(envelope.signatures.len(), 1);
    }
}
