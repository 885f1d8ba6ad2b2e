//! # pal-token — Permissioned Token State Machine
//!
//! The ledger itself: balances, total supply, pause and freeze state, and
//! the transfer/mint/burn operations that consult the identity registry and
//! the token's modular compliance before committing.
//!
//! ## Security Invariant
//!
//! - `sum(balances) == total_supply` after every operation.
//! - Frozen tokens of a wallet never exceed its balance.
//! - Eligibility and compliance are evaluated on every operation against the
//!   registries' current state. Nothing is cached between operations.
//! - Every operation either commits completely or returns a
//!   [`LedgerError`](pal_core::LedgerError) with no state change. Compliance
//!   hooks run only after the balance change is in place.
//!
//! ## Observability
//!
//! Committed operations are logged at `info` and counted in
//! `pal_token_operations_total{op}`; rejections are logged at `debug` and
//! counted in `pal_token_rejections_total{op,kind}`. Every commit also
//! appends a [`TokenEvent`] to the token's event log.

pub mod events;
pub mod policy;
pub mod token;
pub mod view;

pub use events::{LoggedEvent, TokenEvent};
pub use policy::{ForcedTransferPolicy, TokenConfig, MAX_DECIMALS};
pub use token::Token;
pub use view::LedgerSnapshot;
