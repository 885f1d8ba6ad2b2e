//! # Stock Compliance Modules
//!
//! Rules covering the common jurisdiction and concentration requirements
//! of permissioned assets. Each is configured at construction and adjusted
//! afterwards through [`ModuleCommand`](crate::ModuleCommand)s.

pub mod country_allow;
pub mod country_restrict;
pub mod max_balance;
pub mod supply_limit;
pub mod transfer_volume;

pub use country_allow::CountryAllowModule;
pub use country_restrict::CountryRestrictModule;
pub use max_balance::MaxBalanceModule;
pub use supply_limit::SupplyLimitModule;
pub use transfer_volume::TransferVolumeLimitModule;
