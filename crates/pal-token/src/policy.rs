//! # Token Configuration
//!
//! Static token metadata plus the forced-transfer policy. Deserializable
//! from YAML or JSON with defaults for every optional field.

use pal_core::{IdentityId, LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};

/// Largest accepted `decimals`.
pub const MAX_DECIMALS: u8 = 18;

/// Which guards a forced transfer skips.
///
/// Recipient identity verification is never skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForcedTransferPolicy {
    /// Proceed while the token is paused.
    pub bypass_pause: bool,
    /// Proceed when sender or recipient is frozen.
    pub bypass_frozen_address: bool,
    /// Release partially frozen tokens of the sender when the free balance
    /// does not cover the amount.
    pub release_frozen_tokens: bool,
    /// Run the compliance check.
    pub enforce_compliance: bool,
}

impl Default for ForcedTransferPolicy {
    fn default() -> Self {
        Self {
            bypass_pause: true,
            bypass_frozen_address: true,
            release_frozen_tokens: true,
            enforce_compliance: true,
        }
    }
}

fn default_decimals() -> u8 {
    MAX_DECIMALS
}

/// Token metadata and policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    /// Identity of the token issuer, if any.
    #[serde(default)]
    pub onchain_id: Option<IdentityId>,
    /// Start in the paused state instead of unpaused.
    #[serde(default)]
    pub start_paused: bool,
    #[serde(default)]
    pub forced_transfer: ForcedTransferPolicy,
}

impl TokenConfig {
    /// Unpaused token with default policy.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            onchain_id: None,
            start_paused: false,
            forced_transfer: ForcedTransferPolicy::default(),
        }
    }

    /// Reject empty metadata and out-of-range decimals.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.name.trim().is_empty() || self.symbol.trim().is_empty() {
            return Err(LedgerError::invariant("token name and symbol must be non-empty"));
        }
        if self.decimals > MAX_DECIMALS {
            return Err(LedgerError::invariant(format!(
                "decimals must be at most {MAX_DECIMALS}, got {}",
                self.decimals
            )));
        }
        Ok(())
    }
}
