// SPDX-License-Identifier: AGPL-3.0-or-later

//! Token issuance endpoint: verifies a client-signed challenge and mints a
//! bearer token.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::challenge::{
    verify_client_signatures, verify_envelope, ChallengeEnvelope, ChallengeError,
};
use crate::ledger::{AccountRecord, LedgerError};
use crate::state::AppState;
use crate::token::issue_token;

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRequest {
    /// Base64-encoded challenge envelope, signed by the claiming account.
    pub transaction: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// Signed bearer token (JWT).
    pub token: String,
}

/// Verify a client-signed challenge and issue a bearer token.
///
/// Structural checks run first; only then is the ledger consulted for the
/// subject's signer set. An account the ledger does not know (or one with an
/// empty signer list) falls back to the implicit self-signed record, matching
/// default-account semantics for unfunded accounts. Ledger transport failures
/// surface as 503 and never trigger that fallback.
#[utoipa::path(
    post,
    path = "/",
    tag = "Auth",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Challenge rejected"),
        (status = 503, description = "Ledger lookup failed")
    )
)]
pub async fn token(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ChallengeError> {
    let envelope = ChallengeEnvelope::from_base64(&request.transaction)?;
    let subject = verify_envelope(&envelope, &state.config)?;

    let account = match state.ledger.account(&subject).await {
        Ok(account) if !account.signers.is_empty() => account,
        Ok(_) | Err(LedgerError::NotFound(_)) => AccountRecord::implicit(&subject),
        Err(err) => {
            tracing::error!(account = %subject, error = %err, "ledger lookup failed");
            return Err(ChallengeError::AccountLookupFailed(err.to_string()));
        }
    };

    verify_client_signatures(&envelope, &account, &state.config)?;
    let token = issue_token(&subject, &state.config)?;
    tracing::info!(account = %subject, "issued bearer token");
    Ok(Json(TokenResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::challenge::challenge;
    use crate::state::testutil::test_state;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;

    /// Spawn a throwaway ledger that answers `/accounts/{id}` with `body`.
    async fn spawn_ledger(status: StatusCode, body: &'static str) -> String {
        let app = Router::new().route(
            "/accounts/{id}",
            get(move || async move {
                (
                    status,
                    [("content-type", "application/json")],
                    body.to_string(),
                )
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{addr}")
    }

    async fn claimed_transaction(state: &AppState, key: &SigningKey) -> String {
        let issued = challenge(State(state.clone())).await.expect("challenge");
        let mut envelope = ChallengeEnvelope::from_base64(&issued.0.transaction).unwrap();
        envelope.artifact.subject_account = Some(key.verifying_key().to_bytes());
        envelope.sign(key).unwrap();
        envelope.to_base64().unwrap()
    }

    #[tokio::test]
    async fn unknown_account_authenticates_as_its_own_signer() {
        let ledger_url = spawn_ledger(StatusCode::NOT_FOUND, r#"{"error":"not found"}"#).await;
        let state = test_state(&ledger_url);
        let client = SigningKey::generate(&mut OsRng);
        let transaction = claimed_transaction(&state, &client).await;

        let response = token(State(state), Json(TokenRequest { transaction }))
            .await
            .expect("token issued");
        assert!(!response.0.token.is_empty());
    }

    #[tokio::test]
    async fn known_multisig_account_requires_threshold() {
        let client = SigningKey::generate(&mut OsRng);
        // Account with a second required signer the client does not control.
        let body = format!(
            r#"{{"id":"{id}","signers":[
                {{"key":"{id}","weight":1,"type":"ed25519_public_key"}},
                {{"key":"{other}","weight":1,"type":"ed25519_public_key"}}
            ],"thresholds":{{"low_threshold":1,"med_threshold":2,"high_threshold":2}}}}"#,
            id = hex::encode(client.verifying_key().to_bytes()),
            other = "9e".repeat(32),
        );
        let ledger_url = spawn_ledger(StatusCode::OK, Box::leak(body.into_boxed_str())).await;
        let state = test_state(&ledger_url);
        let transaction = claimed_transaction(&state, &client).await;

        let err = token(State(state), Json(TokenRequest { transaction }))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChallengeError::InsufficientSignatureWeight { required: 2, .. }
        ));
    }

    #[tokio::test]
    async fn ledger_failure_maps_to_lookup_failed() {
        // Nothing listens here.
        let state = test_state("http://127.0.0.1:1");
        let client = SigningKey::generate(&mut OsRng);
        let transaction = claimed_transaction(&state, &client).await;

        let err = token(State(state), Json(TokenRequest { transaction }))
            .await
            .unwrap_err();
        assert!(matches!(err, ChallengeError::AccountLookupFailed(_)));
    }

    #[tokio::test]
    async fn malformed_transaction_is_rejected_before_lookup() {
        let state = test_state("http://127.0.0.1:1");
        let err = token(
            State(state),
            Json(TokenRequest {
                transaction: "@@not-base64@@".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ChallengeError::MalformedChallenge(_)));
    }

    #[tokio::test]
    async fn issued_token_subject_matches_account() {
        use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

        let ledger_url = spawn_ledger(StatusCode::NOT_FOUND, r#"{"error":"not found"}"#).await;
        let fixture = crate::config::testutil::test_config();
        let mut config = fixture.config;
        config.ledger_url = ledger_url.clone();
        let ledger =
            crate::ledger::LedgerClient::new(&config.ledger_url, config.ledger_timeout).unwrap();
        let state = AppState::new(config, ledger);

        let client = SigningKey::generate(&mut OsRng);
        let transaction = claimed_transaction(&state, &client).await;
        let response = token(State(state), Json(TokenRequest { transaction }))
            .await
            .expect("token issued");

        let decoding_key = DecodingKey::from_ed_pem(fixture.token_public_pem.as_bytes()).unwrap();
        let data = decode::<crate::token::Claims>(
            &response.0.token,
            &decoding_key,
            &Validation::new(Algorithm::EdDSA),
        )
        .unwrap();
        assert_eq!(
            data.claims.sub,
            hex::encode(client.verifying_key().to_bytes())
        );
    }
}
