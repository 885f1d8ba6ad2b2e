//! # Error Types — Ledger Rejection Taxonomy
//!
//! Every mutating operation in the ledger either commits completely or is
//! rejected with a [`LedgerError`] before any state is touched. There is no
//! internal retry path; callers decide whether to resubmit.
//!
//! ## Kinds
//!
//! | Kind                  | Raised when                                              |
//! |-----------------------|----------------------------------------------------------|
//! | `NotAuthorized`       | caller lacks owner/agent/key capability                  |
//! | `InvalidState`        | token paused, address frozen, component not bound        |
//! | `NotEligible`         | recipient fails identity verification                    |
//! | `ComplianceRejected`  | a bound compliance module vetoed the movement            |
//! | `InsufficientBalance` | debit exceeds the unfrozen balance                       |
//! | `InvariantViolation`  | malformed input, duplicates, limits, arithmetic overflow |

use thiserror::Error;

use crate::identity::{Address, Amount};

/// Result alias used across every `pal-*` crate.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// The capability a caller was required to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Owner (governance) of the component.
    Owner,
    /// Agent of the component.
    Agent,
    /// Owner or agent of the component.
    OwnerOrAgent,
    /// A management key on an Identity.
    ManagementKey,
    /// A claim-signing (or management) key on an Identity.
    ClaimKey,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Owner => "owner",
            Self::Agent => "agent",
            Self::OwnerOrAgent => "owner or agent",
            Self::ManagementKey => "management key",
            Self::ClaimKey => "claim key",
        };
        f.write_str(s)
    }
}

/// Coarse classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotAuthorized,
    InvalidState,
    NotEligible,
    ComplianceRejected,
    InsufficientBalance,
    InvariantViolation,
}

impl ErrorKind {
    /// Stable snake_case label, used as a metrics label value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAuthorized => "not_authorized",
            Self::InvalidState => "invalid_state",
            Self::NotEligible => "not_eligible",
            Self::ComplianceRejected => "compliance_rejected",
            Self::InsufficientBalance => "insufficient_balance",
            Self::InvariantViolation => "invariant_violation",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected ledger operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Caller lacks the capability required for the mutation.
    #[error("{actor} is not authorized: requires {required}")]
    NotAuthorized {
        /// The caller.
        actor: Address,
        /// The capability the caller was required to hold.
        required: Capability,
    },

    /// Operation is incompatible with the current pause/freeze/binding state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Recipient wallet is not verified by the identity registry.
    #[error("wallet {wallet} is not eligible: identity verification failed")]
    NotEligible {
        /// The wallet that failed verification.
        wallet: Address,
    },

    /// A bound compliance module vetoed the operation.
    #[error("transfer rejected by compliance module {module}")]
    ComplianceRejected {
        /// Name of the first module that returned `false`.
        module: String,
    },

    /// Debit exceeds the available (unfrozen) balance.
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Balance minus frozen tokens.
        available: Amount,
        /// Amount the operation tried to debit.
        requested: Amount,
    },

    /// Malformed input rejected before any state was touched.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl LedgerError {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAuthorized { .. } => ErrorKind::NotAuthorized,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::NotEligible { .. } => ErrorKind::NotEligible,
            Self::ComplianceRejected { .. } => ErrorKind::ComplianceRejected,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::InvariantViolation(_) => ErrorKind::InvariantViolation,
        }
    }

    /// Shorthand for an `InvariantViolation` with a formatted message.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Shorthand for an `InvalidState` with a formatted message.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}

impl From<CanonicalizationError> for LedgerError {
    fn from(e: CanonicalizationError) -> Self {
        Self::InvariantViolation(e.to_string())
    }
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error in cryptographic operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Key generation or parsing failed.
    #[error("key error: {0}")]
    KeyError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_one_to_one() {
        let wallet = Address::from_label("w");
        let cases = [
            (
                LedgerError::NotAuthorized {
                    actor: wallet,
                    required: Capability::Agent,
                },
                ErrorKind::NotAuthorized,
            ),
            (LedgerError::invalid_state("paused"), ErrorKind::InvalidState),
            (LedgerError::NotEligible { wallet }, ErrorKind::NotEligible),
            (
                LedgerError::ComplianceRejected {
                    module: "country_allow".into(),
                },
                ErrorKind::ComplianceRejected,
            ),
            (
                LedgerError::InsufficientBalance {
                    available: 1,
                    requested: 2,
                },
                ErrorKind::InsufficientBalance,
            ),
            (LedgerError::invariant("dup"), ErrorKind::InvariantViolation),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn display_names_the_missing_capability() {
        let err = LedgerError::NotAuthorized {
            actor: Address::from_label("mallory"),
            required: Capability::Owner,
        };
        assert!(err.to_string().ends_with("requires owner"));
    }

    #[test]
    fn canonicalization_failure_is_an_invariant_violation() {
        let err: LedgerError = CanonicalizationError::FloatRejected(0.5).into();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }
}
