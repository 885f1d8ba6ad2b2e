//! # Identity Registry Storage
//!
//! Wallet → (identity, country) records. One storage may back several
//! identity registries (for example one per token of the same issuer); each
//! registry must be bound by the storage owner before it can write.
//!
//! ## Invariants
//!
//! - A wallet appears at most once.
//! - An identity may back several wallets; each wallet maps to exactly one
//!   identity at a time.
//! - [`add_identities_to_storage`](IdentityRegistryStorage::add_identities_to_storage)
//!   validates every entry before writing any, so a rejected batch leaves
//!   the records untouched.

use std::collections::{BTreeMap, BTreeSet};

use pal_core::{
    AccessControl, Address, Capability, CountryCode, IdentityId, LedgerError, LedgerResult, Shared,
};
use pal_identity::Identity;
use serde::Serialize;

/// Upper bound on identity registries bound to one storage.
pub const MAX_BOUND_REGISTRIES: usize = 300;

/// A stored wallet record.
#[derive(Debug, Clone)]
pub struct IdentityRecord {
    /// Handle to the identity backing the wallet.
    pub identity: Shared<Identity>,
    /// The identity's reference, cached at write time.
    pub identity_id: IdentityId,
    /// Investor country.
    pub country: CountryCode,
}

/// Serializable view of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredIdentity {
    pub wallet: Address,
    pub identity: IdentityId,
    pub country: CountryCode,
}

/// Shared wallet → identity storage.
#[derive(Debug)]
pub struct IdentityRegistryStorage {
    access: AccessControl,
    bound_registries: BTreeSet<Address>,
    records: BTreeMap<Address, IdentityRecord>,
}

impl IdentityRegistryStorage {
    /// Create empty storage governed by `owner`.
    pub fn new(owner: Address) -> Self {
        Self {
            access: AccessControl::new(owner),
            bound_registries: BTreeSet::new(),
            records: BTreeMap::new(),
        }
    }

    /// The governing owner.
    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    // ─── Binding ──────────────────────────────────────────────────────

    /// Authorize the identity registry at `registry` to write records.
    pub fn bind_identity_registry(&mut self, caller: &Address, registry: Address) -> LedgerResult<()> {
        self.access.require_owner(caller)?;
        if self.bound_registries.contains(&registry) {
            return Err(LedgerError::invariant(format!("registry {registry} is already bound")));
        }
        if self.bound_registries.len() >= MAX_BOUND_REGISTRIES {
            return Err(LedgerError::invariant(format!(
                "cannot bind more than {MAX_BOUND_REGISTRIES} identity registries"
            )));
        }
        self.bound_registries.insert(registry);
        tracing::info!(%registry, "identity registry bound to storage");
        Ok(())
    }

    /// Withdraw a registry's write authorization.
    pub fn unbind_identity_registry(&mut self, caller: &Address, registry: &Address) -> LedgerResult<()> {
        self.access.require_owner(caller)?;
        if !self.bound_registries.remove(registry) {
            return Err(LedgerError::invariant(format!("registry {registry} is not bound")));
        }
        tracing::info!(%registry, "identity registry unbound from storage");
        Ok(())
    }

    /// Registries currently allowed to write.
    pub fn linked_identity_registries(&self) -> Vec<Address> {
        self.bound_registries.iter().copied().collect()
    }

    /// Grant direct write access to `agent`. Owner only.
    pub fn add_agent(&mut self, caller: &Address, agent: Address) -> LedgerResult<()> {
        self.access.add_agent(caller, agent)
    }

    /// Revoke direct write access. Owner only.
    pub fn remove_agent(&mut self, caller: &Address, agent: &Address) -> LedgerResult<()> {
        self.access.remove_agent(caller, agent)
    }

    /// Hand governance to `new_owner`.
    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> LedgerResult<()> {
        self.access.transfer_ownership(caller, new_owner)
    }

    // ─── Writes ───────────────────────────────────────────────────────

    /// Store a new wallet record.
    pub fn add_identity_to_storage(
        &mut self,
        caller: &Address,
        wallet: Address,
        identity: Shared<Identity>,
        country: CountryCode,
    ) -> LedgerResult<()> {
        self.require_writer(caller)?;
        if self.records.contains_key(&wallet) {
            return Err(LedgerError::invariant(format!("wallet {wallet} is already registered")));
        }
        let record = make_record(identity, country);
        tracing::debug!(%wallet, identity = %record.identity_id, %country, "identity stored");
        self.records.insert(wallet, record);
        Ok(())
    }

    /// Store several records, all or nothing.
    ///
    /// Rejected without writing if any wallet is already stored or appears
    /// twice in `entries`.
    pub fn add_identities_to_storage(
        &mut self,
        caller: &Address,
        entries: Vec<(Address, Shared<Identity>, CountryCode)>,
    ) -> LedgerResult<()> {
        self.require_writer(caller)?;
        let mut seen = BTreeSet::new();
        for (wallet, _, _) in &entries {
            if self.records.contains_key(wallet) {
                return Err(LedgerError::invariant(format!("wallet {wallet} is already registered")));
            }
            if !seen.insert(*wallet) {
                return Err(LedgerError::invariant(format!("wallet {wallet} appears twice in batch")));
            }
        }
        let staged: Vec<(Address, IdentityRecord)> = entries
            .into_iter()
            .map(|(wallet, identity, country)| (wallet, make_record(identity, country)))
            .collect();
        tracing::debug!(count = staged.len(), "identity batch stored");
        self.records.extend(staged);
        Ok(())
    }

    /// Point a stored wallet at a different identity.
    pub fn modify_stored_identity(
        &mut self,
        caller: &Address,
        wallet: &Address,
        identity: Shared<Identity>,
    ) -> LedgerResult<()> {
        self.require_writer(caller)?;
        let identity_id = identity.read().id();
        let record = self.record_mut(wallet)?;
        record.identity = identity;
        record.identity_id = identity_id;
        tracing::debug!(%wallet, identity = %identity_id, "stored identity modified");
        Ok(())
    }

    /// Change a stored wallet's country.
    pub fn modify_stored_investor_country(
        &mut self,
        caller: &Address,
        wallet: &Address,
        country: CountryCode,
    ) -> LedgerResult<()> {
        self.require_writer(caller)?;
        self.record_mut(wallet)?.country = country;
        tracing::debug!(%wallet, %country, "stored country modified");
        Ok(())
    }

    /// Drop a wallet record.
    pub fn remove_identity_from_storage(&mut self, caller: &Address, wallet: &Address) -> LedgerResult<()> {
        self.require_writer(caller)?;
        if self.records.remove(wallet).is_none() {
            return Err(LedgerError::invariant(format!("wallet {wallet} is not registered")));
        }
        tracing::debug!(%wallet, "identity removed from storage");
        Ok(())
    }

    // ─── Reads ────────────────────────────────────────────────────────

    pub fn contains(&self, wallet: &Address) -> bool {
        self.records.contains_key(wallet)
    }

    pub fn record(&self, wallet: &Address) -> Option<&IdentityRecord> {
        self.records.get(wallet)
    }

    /// Handle to the identity stored for `wallet`.
    pub fn stored_identity(&self, wallet: &Address) -> Option<Shared<Identity>> {
        self.records.get(wallet).map(|r| r.identity.clone())
    }

    pub fn stored_identity_id(&self, wallet: &Address) -> Option<IdentityId> {
        self.records.get(wallet).map(|r| r.identity_id)
    }

    pub fn stored_investor_country(&self, wallet: &Address) -> Option<CountryCode> {
        self.records.get(wallet).map(|r| r.country)
    }

    /// Snapshot of every record, in wallet order.
    pub fn records(&self) -> Vec<StoredIdentity> {
        self.records
            .iter()
            .map(|(wallet, r)| StoredIdentity {
                wallet: *wallet,
                identity: r.identity_id,
                country: r.country,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn require_writer(&self, caller: &Address) -> LedgerResult<()> {
        if self.bound_registries.contains(caller) || self.access.is_agent(caller) {
            Ok(())
        } else {
            Err(LedgerError::NotAuthorized {
                actor: *caller,
                required: Capability::Agent,
            })
        }
    }

    fn record_mut(&mut self, wallet: &Address) -> LedgerResult<&mut IdentityRecord> {
        self.records
            .get_mut(wallet)
            .ok_or_else(|| LedgerError::invariant(format!("wallet {wallet} is not registered")))
    }
}

fn make_record(identity: Shared<Identity>, country: CountryCode) -> IdentityRecord {
    let identity_id = identity.read().id();
    IdentityRecord {
        identity,
        identity_id,
        country,
    }
}
