//! # Identity Registry — Eligibility Oracle
//!
//! Answers "is this wallet verified" for a token. The registry owns no data
//! of its own beyond its agent set: wallet records live in a (possibly
//! shared) [`IdentityRegistryStorage`], required topics in a
//! [`ClaimTopicsRegistry`], and issuer trust in a [`TrustedIssuersRegistry`].
//!
//! ## Verification
//!
//! `is_verified(wallet)` holds iff the wallet has a storage record and, for
//! every required topic, the wallet's identity carries a claim on that topic
//! whose issuer is trusted for the topic and whose signature validates
//! against the issuer's current claim-signing keys and revocation list.
//! With no required topics, every stored wallet is verified.
//!
//! ## Locking
//!
//! Reads acquire storage → identity → topics → issuers → claim issuer, in
//! that order, and hold them for the whole evaluation so one call observes a
//! single consistent snapshot.

use pal_core::{AccessControl, Address, ClaimTopic, CountryCode, LedgerError, LedgerResult, Shared};
use pal_identity::{Identity, SCHEME_ED25519};

use crate::issuers::TrustedIssuersRegistry;
use crate::storage::IdentityRegistryStorage;
use crate::topics::ClaimTopicsRegistry;

/// The eligibility oracle consulted by a token on every value movement.
#[derive(Debug)]
pub struct IdentityRegistry {
    address: Address,
    access: AccessControl,
    storage: Shared<IdentityRegistryStorage>,
    topics: Shared<ClaimTopicsRegistry>,
    issuers: Shared<TrustedIssuersRegistry>,
}

impl IdentityRegistry {
    /// Create a registry reachable at `address`.
    ///
    /// The registry can only write once the storage owner has bound
    /// `address` with [`IdentityRegistryStorage::bind_identity_registry`].
    pub fn new(
        address: Address,
        owner: Address,
        storage: Shared<IdentityRegistryStorage>,
        topics: Shared<ClaimTopicsRegistry>,
        issuers: Shared<TrustedIssuersRegistry>,
    ) -> Self {
        Self {
            address,
            access: AccessControl::new(owner),
            storage,
            topics,
            issuers,
        }
    }

    /// The address this registry writes to storage as.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    // ─── Agents ───────────────────────────────────────────────────────

    pub fn is_agent(&self, who: &Address) -> bool {
        self.access.is_agent(who)
    }

    /// Grant registration rights. Owner only.
    pub fn add_agent(&mut self, caller: &Address, agent: Address) -> LedgerResult<()> {
        self.access.add_agent(caller, agent)?;
        tracing::info!(registry = %self.address, %agent, "registry agent added");
        Ok(())
    }

    /// Revoke registration rights. Owner only.
    pub fn remove_agent(&mut self, caller: &Address, agent: &Address) -> LedgerResult<()> {
        self.access.remove_agent(caller, agent)?;
        tracing::info!(registry = %self.address, %agent, "registry agent removed");
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> LedgerResult<()> {
        self.access.transfer_ownership(caller, new_owner)
    }

    // ─── Registration ─────────────────────────────────────────────────

    /// Record `wallet` as backed by `identity` in `country`. Agent only.
    pub fn register_identity(
        &self,
        caller: &Address,
        wallet: Address,
        identity: Shared<Identity>,
        country: CountryCode,
    ) -> LedgerResult<()> {
        self.access.require_agent(caller)?;
        self.storage
            .write()
            .add_identity_to_storage(&self.address, wallet, identity, country)?;
        tracing::info!(registry = %self.address, %wallet, %country, "identity registered");
        Ok(())
    }

    /// Register several wallets, all or nothing. Agent only.
    ///
    /// The three slices must have equal length. A wallet that is already
    /// stored, or that appears twice, rejects the whole batch.
    pub fn batch_register_identity(
        &self,
        caller: &Address,
        wallets: &[Address],
        identities: &[Shared<Identity>],
        countries: &[CountryCode],
    ) -> LedgerResult<()> {
        self.access.require_agent(caller)?;
        if wallets.len() != identities.len() || wallets.len() != countries.len() {
            return Err(LedgerError::invariant(format!(
                "batch length mismatch: {} wallets, {} identities, {} countries",
                wallets.len(),
                identities.len(),
                countries.len()
            )));
        }
        let entries = wallets
            .iter()
            .zip(identities)
            .zip(countries)
            .map(|((w, i), c)| (*w, i.clone(), *c))
            .collect();
        self.storage
            .write()
            .add_identities_to_storage(&self.address, entries)?;
        tracing::info!(registry = %self.address, count = wallets.len(), "identity batch registered");
        Ok(())
    }

    /// Re-point `wallet` at a different identity. Agent only.
    pub fn update_identity(&self, caller: &Address, wallet: &Address, identity: Shared<Identity>) -> LedgerResult<()> {
        self.access.require_agent(caller)?;
        self.storage
            .write()
            .modify_stored_identity(&self.address, wallet, identity)?;
        tracing::info!(registry = %self.address, %wallet, "identity updated");
        Ok(())
    }

    /// Change the country recorded for `wallet`. Agent only.
    pub fn update_country(&self, caller: &Address, wallet: &Address, country: CountryCode) -> LedgerResult<()> {
        self.access.require_agent(caller)?;
        self.storage
            .write()
            .modify_stored_investor_country(&self.address, wallet, country)?;
        tracing::info!(registry = %self.address, %wallet, %country, "country updated");
        Ok(())
    }

    /// Remove `wallet`; it is unverified from the next query on. Agent only.
    pub fn delete_identity(&self, caller: &Address, wallet: &Address) -> LedgerResult<()> {
        self.access.require_agent(caller)?;
        self.storage
            .write()
            .remove_identity_from_storage(&self.address, wallet)?;
        tracing::info!(registry = %self.address, %wallet, "identity deleted");
        Ok(())
    }

    // ─── Queries ──────────────────────────────────────────────────────

    /// Whether `wallet` currently satisfies every required claim topic.
    pub fn is_verified(&self, wallet: &Address) -> bool {
        matches!(self.unverified_topics(wallet), Some(missing) if missing.is_empty())
    }

    /// Required topics `wallet` has no valid claim for.
    ///
    /// `None` when the wallet has no storage record at all.
    pub fn unverified_topics(&self, wallet: &Address) -> Option<Vec<ClaimTopic>> {
        let storage = self.storage.read();
        let record = storage.record(wallet)?;
        let identity = record.identity.read();
        let topics = self.topics.read();
        let issuers = self.issuers.read();

        let missing: Vec<ClaimTopic> = topics
            .claim_topics()
            .iter()
            .copied()
            .filter(|topic| !has_valid_claim(&identity, *topic, &issuers))
            .collect();
        if !missing.is_empty() {
            tracing::debug!(%wallet, missing = missing.len(), "wallet not verified");
        }
        Some(missing)
    }

    pub fn contains(&self, wallet: &Address) -> bool {
        self.storage.read().contains(wallet)
    }

    /// Handle to the identity backing `wallet`.
    pub fn identity(&self, wallet: &Address) -> Option<Shared<Identity>> {
        self.storage.read().stored_identity(wallet)
    }

    pub fn investor_country(&self, wallet: &Address) -> Option<CountryCode> {
        self.storage.read().stored_investor_country(wallet)
    }

    // ─── Wiring ───────────────────────────────────────────────────────

    pub fn identity_storage(&self) -> Shared<IdentityRegistryStorage> {
        self.storage.clone()
    }

    pub fn topics_registry(&self) -> Shared<ClaimTopicsRegistry> {
        self.topics.clone()
    }

    pub fn issuers_registry(&self) -> Shared<TrustedIssuersRegistry> {
        self.issuers.clone()
    }

    /// Point at a different storage. Owner only.
    pub fn set_identity_registry_storage(
        &mut self,
        caller: &Address,
        storage: Shared<IdentityRegistryStorage>,
    ) -> LedgerResult<()> {
        self.access.require_owner(caller)?;
        self.storage = storage;
        tracing::info!(registry = %self.address, "identity storage replaced");
        Ok(())
    }

    /// Point at a different claim topics registry. Owner only.
    pub fn set_claim_topics_registry(
        &mut self,
        caller: &Address,
        topics: Shared<ClaimTopicsRegistry>,
    ) -> LedgerResult<()> {
        self.access.require_owner(caller)?;
        self.topics = topics;
        tracing::info!(registry = %self.address, "claim topics registry replaced");
        Ok(())
    }

    /// Point at a different trusted issuers registry. Owner only.
    pub fn set_trusted_issuers_registry(
        &mut self,
        caller: &Address,
        issuers: Shared<TrustedIssuersRegistry>,
    ) -> LedgerResult<()> {
        self.access.require_owner(caller)?;
        self.issuers = issuers;
        tracing::info!(registry = %self.address, "trusted issuers registry replaced");
        Ok(())
    }
}

fn has_valid_claim(identity: &Identity, topic: ClaimTopic, issuers: &TrustedIssuersRegistry) -> bool {
    identity
        .claims()
        .filter(|claim| claim.topic == topic && claim.scheme == SCHEME_ED25519)
        .filter(|claim| issuers.is_trusted_for_topic(&claim.issuer, topic))
        .any(|claim| {
            let Some(handle) = issuers.issuer(&claim.issuer) else {
                return false;
            };
            let issuer = handle.read();
            issuer.is_claim_valid(&identity.id(), topic, &claim.signature, &claim.data)
        })
}
