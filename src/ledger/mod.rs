// SPDX-License-Identifier: AGPL-3.0-or-later

//! Ledger account-query client.
//!
//! Fetches an account's current signer list and threshold triple from the
//! ledger's HTTP API (`GET {base}/accounts/{account_id}`). The account record
//! is read-only to this service; the ledger is the single source of truth for
//! signer weights.
//!
//! Lookups run with a bounded timeout so a slow ledger degrades into a
//! retryable error instead of hanging the request.

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// A single entry in an account's signer list.
#[derive(Debug, Clone, Deserialize)]
pub struct Signer {
    /// Hex-encoded public key (or hash, depending on `kind`).
    pub key: String,
    pub weight: u32,
    #[serde(rename = "type")]
    pub kind: SignerKind,
}

/// Signer flavor. Only plain Ed25519 keys can countersign a client-presented
/// challenge; hash-based flavors authorize ledger operations, not signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerKind {
    Ed25519PublicKey,
    PreauthTx,
    Sha256Hash,
}

impl SignerKind {
    pub fn can_countersign(self) -> bool {
        matches!(self, SignerKind::Ed25519PublicKey)
    }
}

/// The account's low/medium/high authorization threshold triple.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Thresholds {
    #[serde(rename = "low_threshold")]
    pub low: u32,
    #[serde(rename = "med_threshold")]
    pub med: u32,
    #[serde(rename = "high_threshold")]
    pub high: u32,
}

/// Which threshold class gates an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdClass {
    Low,
    Med,
    High,
}

impl Thresholds {
    pub fn class(&self, class: ThresholdClass) -> u32 {
        match class {
            ThresholdClass::Low => self.low,
            ThresholdClass::Med => self.med,
            ThresholdClass::High => self.high,
        }
    }
}

impl FromStr for ThresholdClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(ThresholdClass::Low),
            "med" | "medium" => Ok(ThresholdClass::Med),
            "high" => Ok(ThresholdClass::High),
            other => Err(format!("unknown threshold class '{other}'")),
        }
    }
}

/// An account as reported by the ledger.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRecord {
    pub id: String,
    pub signers: Vec<Signer>,
    pub thresholds: Thresholds,
}

impl AccountRecord {
    /// The implicit record for an account the ledger does not know about:
    /// the account's own key is its sole signer with weight 1, and every
    /// threshold is 1, so it can self-authorize. Mirrors default-account
    /// behavior for newly created, not-yet-funded accounts.
    pub fn implicit(account_id: &str) -> Self {
        Self {
            id: account_id.to_string(),
            signers: vec![Signer {
                key: account_id.to_string(),
                weight: 1,
                kind: SignerKind::Ed25519PublicKey,
            }],
            thresholds: Thresholds {
                low: 1,
                med: 1,
                high: 1,
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("account {0} not found")]
    NotFound(String),

    #[error("ledger request failed: {0}")]
    Transport(String),

    #[error("invalid ledger response: {0}")]
    InvalidResponse(String),

    #[error("failed to build ledger client: {0}")]
    Client(String),
}

/// HTTP client for the ledger's account-query endpoint.
#[derive(Clone)]
pub struct LedgerClient {
    base_url: String,
    client: reqwest::Client,
}

impl LedgerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Client(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Fetch an account's signer list and thresholds.
    ///
    /// A definitive 404 from the ledger is `NotFound`; timeouts and other
    /// transport failures are `Transport` so callers can distinguish
    /// "account does not exist" from "ledger unavailable".
    pub async fn account(&self, account_id: &str) -> Result<AccountRecord, LedgerError> {
        let url = format!("{}/accounts/{}", self.base_url, account_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LedgerError::NotFound(account_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(LedgerError::Transport(format!(
                "HTTP {} from ledger",
                response.status()
            )));
        }

        response
            .json::<AccountRecord>()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))
    }

    /// Readiness probe: whether the ledger endpoint answers at all.
    pub async fn ping(&self) -> bool {
        self.client.get(&self.base_url).send().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_record_parses_ledger_json() {
        let json = r#"{
            "id": "4a5b000000000000000000000000000000000000000000000000000000000000",
            "signers": [
                {"key": "4a5b000000000000000000000000000000000000000000000000000000000000", "weight": 1, "type": "ed25519_public_key"},
                {"key": "9f00000000000000000000000000000000000000000000000000000000000000", "weight": 2, "type": "preauth_tx"}
            ],
            "thresholds": {"low_threshold": 1, "med_threshold": 2, "high_threshold": 3}
        }"#;

        let account: AccountRecord = serde_json::from_str(json).expect("parses");
        assert_eq!(account.signers.len(), 2);
        assert_eq!(account.signers[0].kind, SignerKind::Ed25519PublicKey);
        assert_eq!(account.signers[1].kind, SignerKind::PreauthTx);
        assert_eq!(account.thresholds.med, 2);
    }

    #[test]
    fn only_plain_keys_countersign() {
        assert!(SignerKind::Ed25519PublicKey.can_countersign());
        assert!(!SignerKind::PreauthTx.can_countersign());
        assert!(!SignerKind::Sha256Hash.can_countersign());
    }

    #[test]
    fn implicit_account_self_authorizes() {
        let account = AccountRecord::implicit("ab".repeat(32).as_str());
        assert_eq!(account.signers.len(), 1);
        assert_eq!(account.signers[0].weight, 1);
        assert_eq!(account.thresholds.med, 1);
        assert_eq!(account.signers[0].key, account.id);
    }

    #[test]
    fn threshold_class_parses() {
        assert_eq!("low".parse::<ThresholdClass>().unwrap(), ThresholdClass::Low);
        assert_eq!("MED".parse::<ThresholdClass>().unwrap(), ThresholdClass::Med);
        assert_eq!(
            "medium".parse::<ThresholdClass>().unwrap(),
            ThresholdClass::Med
        );
        assert_eq!(
            "high".parse::<ThresholdClass>().unwrap(),
            ThresholdClass::High
        );
        assert!("payment".parse::<ThresholdClass>().is_err());
    }

    #[test]
    fn thresholds_select_by_class() {
        let t = Thresholds {
            low: 1,
            med: 5,
            high: 9,
        };
        assert_eq!(t.class(ThresholdClass::Low), 1);
        assert_eq!(t.class(ThresholdClass::Med), 5);
        assert_eq!(t.class(ThresholdClass::High), 9);
    }

    #[tokio::test]
    async fn account_lookup_maps_transport_errors() {
        // Nothing listens on port 1.
        let client =
            LedgerClient::new("http://127.0.0.1:1", Duration::from_millis(300)).expect("client");
        let err = client.account(&"ab".repeat(32)).await.unwrap_err();
        assert!(matches!(err, LedgerError::Transport(_)));
        assert!(!client.ping().await);
    }
}
