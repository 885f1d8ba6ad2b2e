//! # Module Specs
//!
//! Declarative description of a stock module, so a compliance stack can be
//! written down in configuration and instantiated in binding order.
//!
//! ```yaml
//! modules:
//!   - kind: country_allow
//!     countries: [250, 276]
//!   - kind: max_balance
//!     limit: 100000
//! ```

use pal_core::{Amount, CountryCode};
use serde::{Deserialize, Serialize};

use crate::module::ComplianceModule;
use crate::modules::{
    CountryAllowModule, CountryRestrictModule, MaxBalanceModule, SupplyLimitModule,
    TransferVolumeLimitModule,
};

/// A stock module and its initial configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleSpec {
    CountryAllow { countries: Vec<CountryCode> },
    CountryRestrict { countries: Vec<CountryCode> },
    MaxBalance { limit: Amount },
    SupplyLimit { limit: Amount },
    TransferVolumeLimit { limit: Amount },
}

impl ModuleSpec {
    /// Name the built module reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CountryAllow { .. } => "country_allow",
            Self::CountryRestrict { .. } => "country_restrict",
            Self::MaxBalance { .. } => "max_balance",
            Self::SupplyLimit { .. } => "supply_limit",
            Self::TransferVolumeLimit { .. } => "transfer_volume_limit",
        }
    }

    /// Instantiate an unbound module.
    pub fn build(&self) -> Box<dyn ComplianceModule> {
        match self {
            Self::CountryAllow { countries } => Box::new(CountryAllowModule::new(countries.iter().copied())),
            Self::CountryRestrict { countries } => {
                Box::new(CountryRestrictModule::new(countries.iter().copied()))
            }
            Self::MaxBalance { limit } => Box::new(MaxBalanceModule::new(*limit)),
            Self::SupplyLimit { limit } => Box::new(SupplyLimitModule::new(*limit)),
            Self::TransferVolumeLimit { limit } => Box::new(TransferVolumeLimitModule::new(*limit)),
        }
    }
}
