//! # Token Event Log
//!
//! Append-only record of committed token operations. Rejected operations
//! never produce an event.

use chrono::{DateTime, Utc};
use pal_core::{Address, Amount, ComplianceId, IdentityId};
use serde::{Deserialize, Serialize};

/// A committed state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TokenEvent {
    Transfer { from: Address, to: Address, amount: Amount, forced: bool },
    Minted { to: Address, amount: Amount },
    Burned { from: Address, amount: Amount },
    Paused { by: Address },
    Unpaused { by: Address },
    AddressFrozen { wallet: Address, frozen: bool, by: Address },
    TokensFrozen { wallet: Address, amount: Amount },
    TokensUnfrozen { wallet: Address, amount: Amount },
    RecoverySuccess { lost: Address, new: Address, identity: IdentityId },
    ComplianceAdded { compliance: ComplianceId },
    IdentityRegistryAdded { registry: Address },
    AgentAdded { agent: Address },
    AgentRemoved { agent: Address },
    UpdatedTokenInformation { name: String, symbol: String, onchain_id: Option<IdentityId> },
    OwnershipTransferred { previous: Address, new: Address },
}

/// An event with its position in the log and commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub sequence: u64,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: TokenEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_tag() {
        let logged = LoggedEvent {
            sequence: 3,
            at: Utc::now(),
            event: TokenEvent::Minted {
                to: Address::from_label("w"),
                amount: 10,
            },
        };
        let json = serde_json::to_value(&logged).unwrap();
        assert_eq!(json["event"], "minted");
        assert_eq!(json["sequence"], 3);
        assert_eq!(json["amount"], 10);
    }
}
