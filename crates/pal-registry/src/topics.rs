//! # Claim Topics Registry
//!
//! The ordered set of claim topics an asset requires of every holder.
//! Owner-governed; at most [`MAX_CLAIM_TOPICS`] entries and no duplicates.

use pal_core::{AccessControl, Address, ClaimTopic, LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};

/// Upper bound on required topics.
pub const MAX_CLAIM_TOPICS: usize = 15;

/// Required claim topics, in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimTopicsRegistry {
    access: AccessControl,
    topics: Vec<ClaimTopic>,
}

impl ClaimTopicsRegistry {
    /// Create an empty registry governed by `owner`.
    pub fn new(owner: Address) -> Self {
        Self {
            access: AccessControl::new(owner),
            topics: Vec::new(),
        }
    }

    /// The governing owner.
    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    /// Require `topic` of every holder.
    pub fn add_claim_topic(&mut self, caller: &Address, topic: ClaimTopic) -> LedgerResult<()> {
        self.access.require_owner(caller)?;
        if self.topics.contains(&topic) {
            return Err(LedgerError::invariant(format!("{topic} is already required")));
        }
        if self.topics.len() >= MAX_CLAIM_TOPICS {
            return Err(LedgerError::invariant(format!(
                "cannot require more than {MAX_CLAIM_TOPICS} claim topics"
            )));
        }
        self.topics.push(topic);
        tracing::info!(%topic, "claim topic added");
        Ok(())
    }

    /// Stop requiring `topic`.
    pub fn remove_claim_topic(&mut self, caller: &Address, topic: ClaimTopic) -> LedgerResult<()> {
        self.access.require_owner(caller)?;
        let pos = self
            .topics
            .iter()
            .position(|t| *t == topic)
            .ok_or_else(|| LedgerError::invariant(format!("{topic} is not required")))?;
        self.topics.remove(pos);
        tracing::info!(%topic, "claim topic removed");
        Ok(())
    }

    /// The required topics, in insertion order.
    pub fn claim_topics(&self) -> &[ClaimTopic] {
        &self.topics
    }

    pub fn contains(&self, topic: ClaimTopic) -> bool {
        self.topics.contains(&topic)
    }

    /// Hand governance to `new_owner`.
    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> LedgerResult<()> {
        self.access.transfer_ownership(caller, new_owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pal_core::ErrorKind;

    fn owner() -> Address {
        Address::from_label("topics-owner")
    }

    #[test]
    fn add_and_remove_preserve_order() {
        let mut reg = ClaimTopicsRegistry::new(owner());
        for t in [3, 1, 2] {
            reg.add_claim_topic(&owner(), ClaimTopic(t)).unwrap();
        }
        assert_eq!(reg.claim_topics(), &[ClaimTopic(3), ClaimTopic(1), ClaimTopic(2)]);
        reg.remove_claim_topic(&owner(), ClaimTopic(1)).unwrap();
        assert_eq!(reg.claim_topics(), &[ClaimTopic(3), ClaimTopic(2)]);
    }

    #[test]
    fn duplicates_and_unknown_removals_are_rejected() {
        let mut reg = ClaimTopicsRegistry::new(owner());
        reg.add_claim_topic(&owner(), ClaimTopic(7)).unwrap();
        let dup = reg.add_claim_topic(&owner(), ClaimTopic(7)).unwrap_err();
        assert_eq!(dup.kind(), ErrorKind::InvariantViolation);
        let missing = reg.remove_claim_topic(&owner(), ClaimTopic(8)).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::InvariantViolation);
        assert_eq!(reg.claim_topics().len(), 1);
    }

    #[test]
    fn capacity_is_bounded() {
        let mut reg = ClaimTopicsRegistry::new(owner());
        for t in 0..MAX_CLAIM_TOPICS as u64 {
            reg.add_claim_topic(&owner(), ClaimTopic(t)).unwrap();
        }
        assert!(reg.add_claim_topic(&owner(), ClaimTopic(99)).is_err());
    }

    #[test]
    fn only_owner_mutates() {
        let mut reg = ClaimTopicsRegistry::new(owner());
        let stranger = Address::from_label("stranger");
        let err = reg.add_claim_topic(&stranger, ClaimTopic(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);

        reg.transfer_ownership(&owner(), stranger).unwrap();
        reg.add_claim_topic(&stranger, ClaimTopic(1)).unwrap();
        assert!(reg.add_claim_topic(&owner(), ClaimTopic(2)).is_err());
    }
}
