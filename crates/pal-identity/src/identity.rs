//! # Identity
//!
//! The capability-holder record backing one or more investor wallets. An
//! Identity owns a purpose-tagged key set and a set of claims. It is never
//! destroyed, only abandoned; registries reference it but never own it.
//!
//! ## Authorization
//!
//! - Keys are added and removed by callers whose wallet key holds
//!   `KeyPurpose::Management`.
//! - Claims are added and removed by callers whose wallet key holds
//!   `KeyPurpose::ClaimSigning` (management keys qualify).
//! - The last management key can never be removed.
//!
//! Claims are stored but not validated on insertion. Validity is a function
//! of the *current* issuer keys and revocations, so the identity registry
//! re-checks every claim each time eligibility is evaluated.

use std::collections::BTreeMap;

use pal_core::{Address, Capability, ClaimTopic, IdentityId, LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};

use crate::claim::{Claim, ClaimId};
use crate::key::{Key, KeyId, KeyPurpose};

/// An on-ledger identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    id: IdentityId,
    keys: BTreeMap<KeyId, Key>,
    claims: BTreeMap<ClaimId, Claim>,
}

impl Identity {
    /// Create an identity whose first management key is `management_wallet`.
    pub fn new(management_wallet: &Address) -> Self {
        let key = Key::wallet(management_wallet, KeyPurpose::Management);
        Self {
            id: IdentityId::new(),
            keys: BTreeMap::from([(key.id, key)]),
            claims: BTreeMap::new(),
        }
    }

    /// The identity reference.
    pub fn id(&self) -> IdentityId {
        self.id
    }

    // ─── Keys ─────────────────────────────────────────────────────────

    /// Look up a key.
    pub fn key(&self, key_id: &KeyId) -> Option<&Key> {
        self.keys.get(key_id)
    }

    /// All keys holding `purpose` directly.
    pub fn keys_by_purpose(&self, purpose: KeyPurpose) -> Vec<&Key> {
        self.keys
            .values()
            .filter(|k| k.purposes.contains(&purpose))
            .collect()
    }

    /// Whether `key_id` holds `purpose` (or is a management key).
    pub fn key_has_purpose(&self, key_id: &KeyId, purpose: KeyPurpose) -> bool {
        self.keys
            .get(key_id)
            .map(|k| k.has_purpose(purpose))
            .unwrap_or(false)
    }

    /// Whether the key derived from `wallet` holds `purpose`.
    pub fn wallet_has_purpose(&self, wallet: &Address, purpose: KeyPurpose) -> bool {
        self.key_has_purpose(&KeyId::for_wallet(wallet), purpose)
    }

    /// Register a key, or add its purposes to an already registered key.
    ///
    /// Rejected if every purpose of `key` is already held.
    pub fn add_key(&mut self, caller: &Address, key: Key) -> LedgerResult<()> {
        self.require_wallet_purpose(caller, KeyPurpose::Management, Capability::ManagementKey)?;
        if key.purposes.is_empty() {
            return Err(LedgerError::invariant("key must carry at least one purpose"));
        }
        match self.keys.get_mut(&key.id) {
            Some(existing) => {
                if key.purposes.is_subset(&existing.purposes) {
                    return Err(LedgerError::invariant(format!(
                        "{} already holds the requested purposes",
                        key.id
                    )));
                }
                existing.purposes.extend(key.purposes.iter().copied());
            }
            None => {
                self.keys.insert(key.id, key.clone());
            }
        }
        tracing::debug!(identity = %self.id, key = %key.id, "identity key added");
        Ok(())
    }

    /// Remove `purpose` from a key; the key is dropped once no purpose remains.
    pub fn remove_key(&mut self, caller: &Address, key_id: &KeyId, purpose: KeyPurpose) -> LedgerResult<()> {
        self.require_wallet_purpose(caller, KeyPurpose::Management, Capability::ManagementKey)?;
        let holds = self
            .keys
            .get(key_id)
            .map(|k| k.purposes.contains(&purpose))
            .unwrap_or(false);
        if !holds {
            return Err(LedgerError::invariant(format!("{key_id} does not hold purpose {purpose:?}")));
        }
        if purpose == KeyPurpose::Management && self.keys_by_purpose(KeyPurpose::Management).len() == 1 {
            return Err(LedgerError::invariant("cannot remove the last management key"));
        }
        if let Some(key) = self.keys.get_mut(key_id) {
            key.purposes.remove(&purpose);
            if key.purposes.is_empty() {
                self.keys.remove(key_id);
            }
        }
        tracing::debug!(identity = %self.id, key = %key_id, ?purpose, "identity key purpose removed");
        Ok(())
    }

    // ─── Claims ───────────────────────────────────────────────────────

    /// Store a claim, replacing any previous claim from the same issuer on
    /// the same topic. Returns the claim slot.
    pub fn add_claim(&mut self, caller: &Address, claim: Claim) -> LedgerResult<ClaimId> {
        self.require_wallet_purpose(caller, KeyPurpose::ClaimSigning, Capability::ClaimKey)?;
        let claim_id = claim.id()?;
        let replaced = self.claims.insert(claim_id, claim).is_some();
        tracing::debug!(identity = %self.id, claim = %claim_id, replaced, "claim stored");
        Ok(claim_id)
    }

    /// Remove a claim.
    pub fn remove_claim(&mut self, caller: &Address, claim_id: &ClaimId) -> LedgerResult<Claim> {
        self.require_wallet_purpose(caller, KeyPurpose::ClaimSigning, Capability::ClaimKey)?;
        self.claims
            .remove(claim_id)
            .ok_or_else(|| LedgerError::invariant(format!("{claim_id} does not exist")))
    }

    /// Look up a claim by slot.
    pub fn claim(&self, claim_id: &ClaimId) -> Option<&Claim> {
        self.claims.get(claim_id)
    }

    /// Slots holding a claim about `topic`.
    pub fn claim_ids_by_topic(&self, topic: ClaimTopic) -> Vec<ClaimId> {
        self.claims
            .iter()
            .filter(|(_, c)| c.topic == topic)
            .map(|(id, _)| *id)
            .collect()
    }

    /// All claims, in slot order.
    pub fn claims(&self) -> impl Iterator<Item = &Claim> {
        self.claims.values()
    }

    fn require_wallet_purpose(
        &self,
        caller: &Address,
        purpose: KeyPurpose,
        required: Capability,
    ) -> LedgerResult<()> {
        if self.wallet_has_purpose(caller, purpose) {
            Ok(())
        } else {
            Err(LedgerError::NotAuthorized {
                actor: *caller,
                required,
            })
        }
    }
}
