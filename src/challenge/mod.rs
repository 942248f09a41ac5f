// SPDX-License-Identifier: AGPL-3.0-or-later

//! Challenge-response protocol core: artifact codec, builder, verifier, and
//! signer-weight arithmetic.

pub mod artifact;
pub mod builder;
pub mod error;
pub mod verifier;
pub mod weight;

pub use artifact::ChallengeEnvelope;
pub use builder::build_challenge;
pub use error::ChallengeError;
pub use verifier::{verify_client_signatures, verify_envelope};
