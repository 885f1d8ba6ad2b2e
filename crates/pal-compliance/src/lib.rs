//! # pal-compliance — Modular Transfer Rules
//!
//! A token consults exactly one [`ModularCompliance`] before every transfer
//! and mint. The modular compliance holds an ordered list of
//! [`ComplianceModule`]s; a movement is allowed only if every module allows
//! it, and every module is notified after a movement commits.
//!
//! ## Module contract
//!
//! - `can_transfer` is a pure predicate. Modules veto there and nowhere else.
//! - `transferred` / `created` / `destroyed` update side-effect state
//!   (volume counters and the like). They cannot fail.
//! - A module instance is bound to at most one compliance at a time.
//!
//! Modules read ledger state through [`LedgerView`], which the token
//! implements over its own balances and identity registry.

pub mod modular;
pub mod module;
pub mod modules;
pub mod spec;

pub use modular::{ModularCompliance, MAX_MODULES};
pub use module::{ComplianceModule, LedgerView, ModuleBinding, ModuleCommand, TransferIntent};
pub use modules::{
    CountryAllowModule, CountryRestrictModule, MaxBalanceModule, SupplyLimitModule,
    TransferVolumeLimitModule,
};
pub use spec::ModuleSpec;
