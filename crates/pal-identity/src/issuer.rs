//! # Claim Issuer
//!
//! A claim issuer is an Identity whose claim-signing keys are trusted (by a
//! trusted-issuers registry) to attest topics. On top of the Identity key
//! registry it keeps a revocation list of signatures it has withdrawn.
//!
//! A claim is valid for the issuer iff:
//!
//! 1. the signature verifies over the canonical message for
//!    `(identity, topic, data)`,
//! 2. the recovered signer is a key on this issuer holding the
//!    claim-signing purpose, and
//! 3. the signature has not been revoked.

use std::collections::BTreeSet;

use pal_core::{Address, Capability, ClaimTopic, IdentityId, LedgerError, LedgerResult};
use pal_crypto::Ed25519PublicKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::claim::ClaimSignature;
use crate::identity::Identity;
use crate::key::{Key, KeyId, KeyPurpose};

/// Why a claim failed validation against an issuer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimRejection {
    /// Signature does not verify over the claim-signing message.
    #[error("bad signature: {0}")]
    BadSignature(String),
    /// The signer is not a claim-signing key of the issuer.
    #[error("signer {0} is not a claim-signing key of the issuer")]
    UnknownSigner(KeyId),
    /// The issuer revoked this signature.
    #[error("claim signature revoked by issuer")]
    Revoked,
}

/// An Identity that signs claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimIssuer {
    identity: Identity,
    revoked: BTreeSet<Vec<u8>>,
}

impl ClaimIssuer {
    /// Create an issuer whose first management key is `management_wallet`.
    pub fn new(management_wallet: &Address) -> Self {
        Self {
            identity: Identity::new(management_wallet),
            revoked: BTreeSet::new(),
        }
    }

    /// The issuer's identity reference.
    pub fn id(&self) -> IdentityId {
        self.identity.id()
    }

    /// The underlying Identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Mutable access to the underlying Identity (key management).
    pub fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    /// Register an Ed25519 claim-signing key.
    pub fn add_signing_key(&mut self, caller: &Address, public_key: Ed25519PublicKey) -> LedgerResult<()> {
        self.identity
            .add_key(caller, Key::ed25519(public_key, KeyPurpose::ClaimSigning))
    }

    /// Withdraw a previously issued claim signature. Management key only.
    pub fn revoke_claim(&mut self, caller: &Address, signature: &ClaimSignature) -> LedgerResult<()> {
        if !self.identity.wallet_has_purpose(caller, KeyPurpose::Management) {
            return Err(LedgerError::NotAuthorized {
                actor: *caller,
                required: Capability::ManagementKey,
            });
        }
        if !self.revoked.insert(signature.to_bytes().to_vec()) {
            return Err(LedgerError::invariant("claim signature already revoked"));
        }
        tracing::info!(issuer = %self.id(), "claim signature revoked");
        Ok(())
    }

    /// Whether `signature` has been revoked.
    pub fn is_claim_revoked(&self, signature: &ClaimSignature) -> bool {
        self.revoked.contains(&signature.to_bytes()[..])
    }

    /// Validate a claim, reporting why it fails.
    pub fn check_claim(
        &self,
        identity: &IdentityId,
        topic: ClaimTopic,
        signature: &ClaimSignature,
        data: &[u8],
    ) -> Result<(), ClaimRejection> {
        signature
            .verify(identity, topic, data)
            .map_err(|e| ClaimRejection::BadSignature(e.to_string()))?;
        let signer = KeyId::for_public_key(&signature.signer);
        if !self.identity.key_has_purpose(&signer, KeyPurpose::ClaimSigning) {
            return Err(ClaimRejection::UnknownSigner(signer));
        }
        if self.is_claim_revoked(signature) {
            return Err(ClaimRejection::Revoked);
        }
        Ok(())
    }

    /// Boolean form of [`check_claim`](Self::check_claim).
    pub fn is_claim_valid(
        &self,
        identity: &IdentityId,
        topic: ClaimTopic,
        signature: &ClaimSignature,
        data: &[u8],
    ) -> bool {
        self.check_claim(identity, topic, signature, data).is_ok()
    }
}
