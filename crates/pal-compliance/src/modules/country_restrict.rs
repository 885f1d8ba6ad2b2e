//! Recipients in restricted countries are rejected.

use std::collections::BTreeSet;

use pal_core::{CountryCode, LedgerError, LedgerResult};

use crate::module::{ComplianceModule, LedgerView, ModuleBinding, ModuleCommand, TransferIntent};

/// Rejects a movement whose recipient's country is on the deny list.
#[derive(Debug, Clone, Default)]
pub struct CountryRestrictModule {
    binding: ModuleBinding,
    restricted: BTreeSet<CountryCode>,
}

impl CountryRestrictModule {
    pub fn new(restricted: impl IntoIterator<Item = CountryCode>) -> Self {
        Self {
            binding: ModuleBinding::default(),
            restricted: restricted.into_iter().collect(),
        }
    }

    pub fn is_country_restricted(&self, country: CountryCode) -> bool {
        self.restricted.contains(&country)
    }
}

impl ComplianceModule for CountryRestrictModule {
    fn name(&self) -> &'static str {
        "country_restrict"
    }

    fn binding(&self) -> &ModuleBinding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut ModuleBinding {
        &mut self.binding
    }

    fn can_transfer(&self, ledger: &dyn LedgerView, intent: &TransferIntent) -> bool {
        !ledger
            .investor_country(&intent.to)
            .is_some_and(|c| self.restricted.contains(&c))
    }

    fn configure(&mut self, command: &ModuleCommand) -> LedgerResult<()> {
        match command {
            ModuleCommand::AddCountry { country } => {
                if !self.restricted.insert(*country) {
                    return Err(LedgerError::invariant(format!("country {country} is already restricted")));
                }
                Ok(())
            }
            ModuleCommand::BatchAddCountries { countries } => {
                let fresh: BTreeSet<CountryCode> = countries.iter().copied().collect();
                if fresh.len() != countries.len() || fresh.iter().any(|c| self.restricted.contains(c)) {
                    return Err(LedgerError::invariant("batch repeats a restricted country"));
                }
                self.restricted.extend(fresh);
                Ok(())
            }
            ModuleCommand::RemoveCountry { country } => {
                if !self.restricted.remove(country) {
                    return Err(LedgerError::invariant(format!("country {country} is not restricted")));
                }
                Ok(())
            }
            other => Err(LedgerError::invariant(format!(
                "module {} does not accept {other:?}",
                self.name()
            ))),
        }
    }
}
