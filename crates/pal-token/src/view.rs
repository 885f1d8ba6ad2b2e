//! Ledger view handed to compliance modules.

use std::collections::BTreeMap;

use pal_compliance::LedgerView;
use pal_core::{Address, Amount, CountryCode};
use pal_registry::IdentityRegistry;

/// Borrowed snapshot of a token's balances plus its identity registry.
pub struct LedgerSnapshot<'a> {
    balances: &'a BTreeMap<Address, Amount>,
    total_supply: Amount,
    registry: &'a IdentityRegistry,
}

impl<'a> LedgerSnapshot<'a> {
    pub fn new(balances: &'a BTreeMap<Address, Amount>, total_supply: Amount, registry: &'a IdentityRegistry) -> Self {
        Self {
            balances,
            total_supply,
            registry,
        }
    }
}

impl LedgerView for LedgerSnapshot<'_> {
    fn investor_country(&self, wallet: &Address) -> Option<CountryCode> {
        self.registry.investor_country(wallet)
    }

    fn balance_of(&self, wallet: &Address) -> Amount {
        self.balances.get(wallet).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> Amount {
        self.total_supply
    }
}
