//! Recipients must reside in an allowed country.

use std::collections::BTreeSet;

use pal_core::{CountryCode, LedgerError, LedgerResult};

use crate::module::{ComplianceModule, LedgerView, ModuleBinding, ModuleCommand, TransferIntent};

/// Allows a movement only if the recipient's country is on the allow list.
/// Recipients without a registered country are rejected.
#[derive(Debug, Clone, Default)]
pub struct CountryAllowModule {
    binding: ModuleBinding,
    allowed: BTreeSet<CountryCode>,
}

impl CountryAllowModule {
    pub fn new(allowed: impl IntoIterator<Item = CountryCode>) -> Self {
        Self {
            binding: ModuleBinding::default(),
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn is_country_allowed(&self, country: CountryCode) -> bool {
        self.allowed.contains(&country)
    }

    fn add(&mut self, country: CountryCode) -> LedgerResult<()> {
        if !self.allowed.insert(country) {
            return Err(LedgerError::invariant(format!("country {country} is already allowed")));
        }
        Ok(())
    }
}

impl ComplianceModule for CountryAllowModule {
    fn name(&self) -> &'static str {
        "country_allow"
    }

    fn binding(&self) -> &ModuleBinding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut ModuleBinding {
        &mut self.binding
    }

    fn can_transfer(&self, ledger: &dyn LedgerView, intent: &TransferIntent) -> bool {
        ledger
            .investor_country(&intent.to)
            .is_some_and(|c| self.allowed.contains(&c))
    }

    fn configure(&mut self, command: &ModuleCommand) -> LedgerResult<()> {
        match command {
            ModuleCommand::AddCountry { country } => self.add(*country),
            ModuleCommand::BatchAddCountries { countries } => {
                let fresh: BTreeSet<CountryCode> = countries.iter().copied().collect();
                if fresh.len() != countries.len() || fresh.iter().any(|c| self.allowed.contains(c)) {
                    return Err(LedgerError::invariant("batch repeats an allowed country"));
                }
                self.allowed.extend(fresh);
                Ok(())
            }
            ModuleCommand::RemoveCountry { country } => {
                if !self.allowed.remove(country) {
                    return Err(LedgerError::invariant(format!("country {country} is not allowed")));
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
