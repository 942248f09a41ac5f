// SPDX-License-Identifier: AGPL-3.0-or-later

//! Challenge artifact and envelope codec.
//!
//! The artifact is a fixed-layout binary payload (version byte, network id,
//! server account, optional subject account, home domain, nonce, validity
//! window). An envelope is the artifact followed by a list of detached
//! Ed25519 signatures. The transport encoding is base64 of the envelope
//! bytes.
//!
//! Two canonical byte encodings exist for signing:
//!
//! - the *server payload* clears the subject field: the server signs the
//!   challenge before it knows which account will claim it;
//! - the *client payload* is the envelope's artifact exactly as submitted,
//!   subject included, so the subject cannot be swapped after client signing.

use base64ct::{Base64, Encoding};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};

use super::error::ChallengeError;

pub const ARTIFACT_VERSION: u8 = 1;
pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;
/// Home domains longer than this cannot be encoded.
pub const MAX_HOME_DOMAIN_LEN: usize = 256;
/// Hard cap on attached signatures, matching the ledger's own envelope limit.
pub const MAX_SIGNATURES: usize = 20;

/// Derive the 32-byte network id bound into challenges. Hashing the
/// passphrase (rather than embedding it) means a signature can never verify
/// against a challenge built for another network.
pub fn network_id(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}

/// The unsigned challenge payload. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeArtifact {
    pub network_id: [u8; 32],
    pub server_account: [u8; KEY_LEN],
    /// Set by the client when it claims the challenge; unset at issuance.
    pub subject_account: Option<[u8; KEY_LEN]>,
    pub home_domain: String,
    pub nonce: [u8; NONCE_LEN],
    /// Validity window start, unix seconds.
    pub valid_from: i64,
    /// Validity window end, unix seconds.
    pub valid_until: i64,
}

impl ChallengeArtifact {
    /// Canonical bytes the server signature covers (subject cleared).
    pub fn server_payload(&self) -> Result<Vec<u8>, ChallengeError> {
        self.encode_payload(None)
    }

    /// Canonical bytes client signatures cover (subject as submitted).
    pub fn client_payload(&self) -> Result<Vec<u8>, ChallengeError> {
        self.encode_payload(self.subject_account.as_ref())
    }

    fn encode_payload(&self, subject: Option<&[u8; KEY_LEN]>) -> Result<Vec<u8>, ChallengeError> {
        if self.home_domain.len() > MAX_HOME_DOMAIN_LEN {
            return Err(ChallengeError::EncodingError(format!(
                "home domain exceeds {MAX_HOME_DOMAIN_LEN} bytes"
            )));
        }

        let mut out = Vec::with_capacity(128 + self.home_domain.len());
        out.push(ARTIFACT_VERSION);
        out.extend_from_slice(&self.network_id);
        out.extend_from_slice(&self.server_account);
        match subject {
            Some(subject) => {
                out.push(1);
                out.extend_from_slice(subject);
            }
            None => out.push(0),
        }
        out.extend_from_slice(&(self.home_domain.len() as u16).to_be_bytes());
        out.extend_from_slice(self.home_domain.as_bytes());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.valid_from.to_be_bytes());
        out.extend_from_slice(&self.valid_until.to_be_bytes());
        Ok(out)
    }
}

/// A detached signature tagged with its signer's public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedSignature {
    pub signer: [u8; KEY_LEN],
    pub signature: [u8; SIGNATURE_LEN],
}

impl DecoratedSignature {
    /// Whether this signature cryptographically verifies over `payload`.
    pub fn verifies(&self, payload: &[u8]) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(&self.signer) else {
            return false;
        };
        let signature = Signature::from_bytes(&self.signature);
        key.verify(payload, &signature).is_ok()
    }
}

/// A challenge artifact plus its attached signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeEnvelope {
    pub artifact: ChallengeArtifact,
    pub signatures: Vec<DecoratedSignature>,
}

impl ChallengeEnvelope {
    /// Append a signature over the client payload. Used by the client side of
    /// the protocol (and the test suite) when claiming a challenge.
    pub fn sign(&mut self, key: &SigningKey) -> Result<(), ChallengeError> {
        let payload = self.artifact.client_payload()?;
        self.signatures.push(DecoratedSignature {
            signer: key.verifying_key().to_bytes(),
            signature: key.sign(&payload).to_bytes(),
        });
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>, ChallengeError> {
        if self.signatures.len() > MAX_SIGNATURES {
            return Err(ChallengeError::EncodingError(format!(
                "more than {MAX_SIGNATURES} signatures"
            )));
        }
        let mut out = self.artifact.client_payload()?;
        out.push(self.signatures.len() as u8);
        for sig in &self.signatures {
            out.extend_from_slice(&sig.signer);
            out.extend_from_slice(&sig.signature);
        }
        Ok(out)
    }

    pub fn to_base64(&self) -> Result<String, ChallengeError> {
        Ok(Base64::encode_string(&self.encode()?))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ChallengeError> {
        let mut reader = Reader::new(bytes);

        let version = reader.u8()?;
        if version != ARTIFACT_VERSION {
            return Err(malformed(format!("unsupported version {version}")));
        }

        let network_id = reader.array::<32>()?;
        let server_account = reader.array::<KEY_LEN>()?;
        let subject_account = match reader.u8()? {
            0 => None,
            1 => Some(reader.array::<KEY_LEN>()?),
            flag => return Err(malformed(format!("invalid subject flag {flag}"))),
        };

        let domain_len = reader.u16()? as usize;
        if domain_len > MAX_HOME_DOMAIN_LEN {
            return Err(malformed("home domain too long".to_string()));
        }
        let home_domain = String::from_utf8(reader.bytes(domain_len)?.to_vec())
            .map_err(|_| malformed("home domain is not UTF-8".to_string()))?;

        let nonce = reader.array::<NONCE_LEN>()?;
        let valid_from = reader.i64()?;
        let valid_until = reader.i64()?;

        let sig_count = reader.u8()? as usize;
        if sig_count > MAX_SIGNATURES {
            return Err(malformed("too many signatures".to_string()));
        }
        let mut signatures = Vec::with_capacity(sig_count);
        for _ in 0..sig_count {
            signatures.push(DecoratedSignature {
                signer: reader.array::<KEY_LEN>()?,
                signature: reader.array::<SIGNATURE_LEN>()?,
            });
        }

        reader.finish()?;

        Ok(Self {
            artifact: ChallengeArtifact {
                network_id,
                server_account,
                subject_account,
                home_domain,
                nonce,
                valid_from,
                valid_until,
            },
            signatures,
        })
    }

    pub fn from_base64(encoded: &str) -> Result<Self, ChallengeError> {
        let bytes = Base64::decode_vec(encoded.trim())
            .map_err(|_| malformed("invalid base64".to_string()))?;
        Self::decode(&bytes)
    }
}

fn malformed(reason: String) -> ChallengeError {
    ChallengeError::MalformedChallenge(reason)
}

/// Bounds-checked cursor over the envelope bytes.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], ChallengeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| malformed("truncated envelope".to_string()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], ChallengeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, ChallengeError> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ChallengeError> {
        Ok(u16::from_be_bytes(self.array::<2>()?))
    }

    fn i64(&mut self) -> Result<i64, ChallengeError> {
        Ok(i64::from_be_bytes(self.array::<8>()?))
    }

    fn finish(&self) -> Result<(), ChallengeError> {
        if self.pos == self.bytes.len() {
            Ok(())
        } else {
            Err(malformed("trailing bytes after envelope".to_string()))
        }
    }
}
