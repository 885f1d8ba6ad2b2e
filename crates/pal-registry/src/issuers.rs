//! # Trusted Issuers Registry
//!
//! Map-of-sets from claim issuer identity to the topics that issuer is
//! trusted to attest. The registry holds a [`Shared`] handle to each
//! [`ClaimIssuer`] so the identity registry can validate claim signatures
//! against the issuer's *current* keys and revocation list.
//!
//! ## Limits
//!
//! At most [`MAX_TRUSTED_ISSUERS`] issuers, each trusted for between one
//! and [`MAX_ISSUER_TOPICS`] topics.

use std::collections::{BTreeMap, BTreeSet};

use pal_core::{AccessControl, Address, ClaimTopic, IdentityId, LedgerError, LedgerResult, Shared};
use pal_identity::ClaimIssuer;

/// Upper bound on trusted issuers.
pub const MAX_TRUSTED_ISSUERS: usize = 50;

/// Upper bound on topics per trusted issuer.
pub const MAX_ISSUER_TOPICS: usize = 15;

#[derive(Debug)]
struct TrustedIssuer {
    issuer: Shared<ClaimIssuer>,
    topics: BTreeSet<ClaimTopic>,
}

/// Issuer identity → trusted topics.
#[derive(Debug)]
pub struct TrustedIssuersRegistry {
    access: AccessControl,
    issuers: BTreeMap<IdentityId, TrustedIssuer>,
}

impl TrustedIssuersRegistry {
    /// Create an empty registry governed by `owner`.
    pub fn new(owner: Address) -> Self {
        Self {
            access: AccessControl::new(owner),
            issuers: BTreeMap::new(),
        }
    }

    /// The governing owner.
    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    // ─── Mutations ────────────────────────────────────────────────────

    /// Trust `issuer` for `topics`. Returns the issuer's identity reference.
    pub fn add_trusted_issuer(
        &mut self,
        caller: &Address,
        issuer: Shared<ClaimIssuer>,
        topics: &[ClaimTopic],
    ) -> LedgerResult<IdentityId> {
        self.access.require_owner(caller)?;
        let topics = validate_topics(topics)?;
        let issuer_id = issuer.read().id();
        if self.issuers.contains_key(&issuer_id) {
            return Err(LedgerError::invariant(format!("{issuer_id} is already a trusted issuer")));
        }
        if self.issuers.len() >= MAX_TRUSTED_ISSUERS {
            return Err(LedgerError::invariant(format!(
                "cannot trust more than {MAX_TRUSTED_ISSUERS} issuers"
            )));
        }
        tracing::info!(issuer = %issuer_id, topics = topics.len(), "trusted issuer added");
        self.issuers.insert(issuer_id, TrustedIssuer { issuer, topics });
        Ok(issuer_id)
    }

    /// Withdraw trust from an issuer. Takes effect on the next evaluation.
    pub fn remove_trusted_issuer(&mut self, caller: &Address, issuer_id: &IdentityId) -> LedgerResult<()> {
        self.access.require_owner(caller)?;
        if self.issuers.remove(issuer_id).is_none() {
            return Err(LedgerError::invariant(format!("{issuer_id} is not a trusted issuer")));
        }
        tracing::info!(issuer = %issuer_id, "trusted issuer removed");
        Ok(())
    }

    /// Replace the topic set of an already trusted issuer.
    pub fn update_issuer_claim_topics(
        &mut self,
        caller: &Address,
        issuer_id: &IdentityId,
        topics: &[ClaimTopic],
    ) -> LedgerResult<()> {
        self.access.require_owner(caller)?;
        let topics = validate_topics(topics)?;
        let entry = self
            .issuers
            .get_mut(issuer_id)
            .ok_or_else(|| LedgerError::invariant(format!("{issuer_id} is not a trusted issuer")))?;
        entry.topics = topics;
        tracing::info!(issuer = %issuer_id, topics = entry.topics.len(), "trusted issuer topics updated");
        Ok(())
    }

    /// Hand governance to `new_owner`.
    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> LedgerResult<()> {
        self.access.transfer_ownership(caller, new_owner)
    }

    // ─── Queries ──────────────────────────────────────────────────────

    /// All trusted issuers, in identity order.
    pub fn trusted_issuers(&self) -> Vec<IdentityId> {
        self.issuers.keys().copied().collect()
    }

    pub fn is_trusted_issuer(&self, issuer_id: &IdentityId) -> bool {
        self.issuers.contains_key(issuer_id)
    }

    /// Topics `issuer_id` is trusted for, if it is trusted at all.
    pub fn issuer_claim_topics(&self, issuer_id: &IdentityId) -> Option<&BTreeSet<ClaimTopic>> {
        self.issuers.get(issuer_id).map(|e| &e.topics)
    }

    /// Whether `issuer_id` is trusted to attest `topic`.
    pub fn is_trusted_for_topic(&self, issuer_id: &IdentityId, topic: ClaimTopic) -> bool {
        self.issuers
            .get(issuer_id)
            .map(|e| e.topics.contains(&topic))
            .unwrap_or(false)
    }

    /// Every issuer trusted to attest `topic`.
    pub fn trusted_issuers_for_topic(&self, topic: ClaimTopic) -> Vec<IdentityId> {
        self.issuers
            .iter()
            .filter(|(_, e)| e.topics.contains(&topic))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Handle to the issuer's key registry, if trusted.
    pub fn issuer(&self, issuer_id: &IdentityId) -> Option<Shared<ClaimIssuer>> {
        self.issuers.get(issuer_id).map(|e| e.issuer.clone())
    }
}

fn validate_topics(topics: &[ClaimTopic]) -> LedgerResult<BTreeSet<ClaimTopic>> {
    if topics.is_empty() {
        return Err(LedgerError::invariant("trusted issuer needs at least one claim topic"));
    }
    if topics.len() > MAX_ISSUER_TOPICS {
        return Err(LedgerError::invariant(format!(
            "trusted issuer may hold at most {MAX_ISSUER_TOPICS} claim topics"
        )));
    }
    let set: BTreeSet<ClaimTopic> = topics.iter().copied().collect();
    if set.len() != topics.len() {
        return Err(LedgerError::invariant("duplicate claim topic in issuer topic list"));
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pal_core::{shared, ErrorKind};

    fn owner() -> Address {
        Address::from_label("tir-owner")
    }

    fn issuer(label: &str) -> Shared<ClaimIssuer> {
        shared(ClaimIssuer::new(&Address::from_label(label)))
    }

    #[test]
    fn topic_membership_queries() {
        let mut reg = TrustedIssuersRegistry::new(owner());
        let a = reg
            .add_trusted_issuer(&owner(), issuer("a"), &[ClaimTopic(1), ClaimTopic(2)])
            .unwrap();
        let b = reg.add_trusted_issuer(&owner(), issuer("b"), &[ClaimTopic(2)]).unwrap();

        assert!(reg.is_trusted_for_topic(&a, ClaimTopic(1)));
        assert!(!reg.is_trusted_for_topic(&b, ClaimTopic(1)));
        let mut for_two = reg.trusted_issuers_for_topic(ClaimTopic(2));
        for_two.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(for_two, expected);
        assert!(reg.trusted_issuers_for_topic(ClaimTopic(3)).is_empty());
    }

    #[test]
    fn issuer_appears_at_most_once() {
        let mut reg = TrustedIssuersRegistry::new(owner());
        let handle = issuer("a");
        reg.add_trusted_issuer(&owner(), handle.clone(), &[ClaimTopic(1)]).unwrap();
        let err = reg.add_trusted_issuer(&owner(), handle, &[ClaimTopic(2)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        assert_eq!(reg.trusted_issuers().len(), 1);
    }

    #[test]
    fn topic_lists_are_validated() {
        let mut reg = TrustedIssuersRegistry::new(owner());
        assert!(reg.add_trusted_issuer(&owner(), issuer("a"), &[]).is_err());
        assert!(reg
            .add_trusted_issuer(&owner(), issuer("a"), &[ClaimTopic(1), ClaimTopic(1)])
            .is_err());
        let too_many: Vec<ClaimTopic> = (0..=MAX_ISSUER_TOPICS as u64).map(ClaimTopic).collect();
        assert!(reg.add_trusted_issuer(&owner(), issuer("a"), &too_many).is_err());
        assert!(reg.trusted_issuers().is_empty());
    }

    #[test]
    fn update_and_remove() {
        let mut reg = TrustedIssuersRegistry::new(owner());
        let a = reg.add_trusted_issuer(&owner(), issuer("a"), &[ClaimTopic(1)]).unwrap();
        reg.update_issuer_claim_topics(&owner(), &a, &[ClaimTopic(5)]).unwrap();
        assert!(!reg.is_trusted_for_topic(&a, ClaimTopic(1)));
        assert!(reg.is_trusted_for_topic(&a, ClaimTopic(5)));

        reg.remove_trusted_issuer(&owner(), &a).unwrap();
        assert!(!reg.is_trusted_issuer(&a));
        assert!(reg.issuer(&a).is_none());
        assert!(reg.remove_trusted_issuer(&owner(), &a).is_err());
        assert!(reg.update_issuer_claim_topics(&owner(), &a, &[ClaimTopic(1)]).is_err());
    }

    #[test]
    fn stranger_cannot_change_trust() {
        let mut reg = TrustedIssuersRegistry::new(owner());
        let err = reg
            .add_trusted_issuer(&Address::from_label("x"), issuer("a"), &[ClaimTopic(1)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);
    }
}
