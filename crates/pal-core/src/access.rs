//! # Owner / Agent Access Control
//!
//! Every administrable component (token, identity registry, registry
//! storage, topic and issuer registries, modular compliance) embeds one
//! [`AccessControl`]. The owner governs the component; agents are a flat
//! capability set the owner grants and revokes. There is no role hierarchy:
//! an owner is not implicitly an agent.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Capability, LedgerError, LedgerResult};
use crate::identity::Address;

/// Owner plus agent set for one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    owner: Address,
    agents: BTreeSet<Address>,
}

impl AccessControl {
    /// Create with the given owner and no agents.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            agents: BTreeSet::new(),
        }
    }

    /// The current owner.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Whether `who` is the owner.
    pub fn is_owner(&self, who: &Address) -> bool {
        &self.owner == who
    }

    /// Whether `who` holds agent status.
    pub fn is_agent(&self, who: &Address) -> bool {
        self.agents.contains(who)
    }

    /// All current agents, in address order.
    pub fn agents(&self) -> impl Iterator<Item = &Address> {
        self.agents.iter()
    }

    /// Reject unless `caller` is the owner.
    pub fn require_owner(&self, caller: &Address) -> LedgerResult<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(LedgerError::NotAuthorized {
                actor: *caller,
                required: Capability::Owner,
            })
        }
    }

    /// Reject unless `caller` is an agent.
    pub fn require_agent(&self, caller: &Address) -> LedgerResult<()> {
        if self.is_agent(caller) {
            Ok(())
        } else {
            Err(LedgerError::NotAuthorized {
                actor: *caller,
                required: Capability::Agent,
            })
        }
    }

    /// Reject unless `caller` is the owner or an agent.
    pub fn require_owner_or_agent(&self, caller: &Address) -> LedgerResult<()> {
        if self.is_owner(caller) || self.is_agent(caller) {
            Ok(())
        } else {
            Err(LedgerError::NotAuthorized {
                actor: *caller,
                required: Capability::OwnerOrAgent,
            })
        }
    }

    /// Grant agent status. Owner only; granting twice is rejected.
    pub fn add_agent(&mut self, caller: &Address, agent: Address) -> LedgerResult<()> {
        self.require_owner(caller)?;
        if !self.agents.insert(agent) {
            return Err(LedgerError::invariant(format!("{agent} is already an agent")));
        }
        Ok(())
    }

    /// Revoke agent status. Owner only; revoking a non-agent is rejected.
    pub fn remove_agent(&mut self, caller: &Address, agent: &Address) -> LedgerResult<()> {
        self.require_owner(caller)?;
        if !self.agents.remove(agent) {
            return Err(LedgerError::invariant(format!("{agent} is not an agent")));
        }
        Ok(())
    }

    /// Hand ownership to `new_owner`. Owner only.
    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> LedgerResult<()> {
        self.require_owner(caller)?;
        self.owner = new_owner;
        Ok(())
    }
}
