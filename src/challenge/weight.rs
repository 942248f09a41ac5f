// SPDX-License-Identifier: AGPL-3.0-or-later

//! Signer-weight arithmetic. Pure, no I/O.

use std::collections::{HashMap, HashSet};

use crate::ledger::Signer;

/// Result of accumulating presented signature weight against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightOutcome {
    pub met: bool,
    pub total: u32,
    /// The effective threshold the total was compared against.
    pub required: u32,
}

/// Sum the weights of distinct, cryptographically valid presented signers
/// that appear in the account's signer list, and compare against `threshold`.
///
/// `presented` pairs each signer's hex-encoded public key with whether its
/// signature verified. Invalid signatures and keys absent from the signer
/// list contribute nothing but are not an error: multi-wallet clients may
/// attach extra signatures.
///
/// A signer key listed twice counts its maximum weight once, and duplicate
/// presented signatures from one key count once. A zero threshold is treated
/// as one so that an account can never be authenticated by an empty
/// signature set.
pub fn accumulate(signers: &[Signer], threshold: u32, presented: &[(String, bool)]) -> WeightOutcome {
    let mut weights: HashMap<&str, u32> = HashMap::new();
    for signer in signers {
        if !signer.kind.can_countersign() {
            continue;
        }
        let entry = weights.entry(signer.key.as_str()).or_insert(0);
        *entry = (*entry).max(signer.weight);
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut total: u32 = 0;
    for (key, valid) in presented {
        if !valid || !seen.insert(key.as_str()) {
            continue;
        }
        if let Some(weight) = weights.get(key.as_str()) {
            total = total.saturating_add(*weight);
        }
    }

    let required = threshold.max(1);
    WeightOutcome {
        met: total >= required,
        total,
        required,
    }
}
