//! Caps total supply.

use pal_core::{Amount, LedgerError, LedgerResult};

use crate::module::{ComplianceModule, LedgerView, ModuleBinding, ModuleCommand, TransferIntent};

/// Rejects a mint that would push total supply above `limit`. Transfers
/// do not change supply and always pass.
#[derive(Debug, Clone)]
pub struct SupplyLimitModule {
    binding: ModuleBinding,
    limit: Amount,
}

impl SupplyLimitModule {
    pub fn new(limit: Amount) -> Self {
        Self {
            binding: ModuleBinding::default(),
            limit,
        }
    }

    pub fn limit(&self) -> Amount {
        self.limit
    }
}

impl ComplianceModule for SupplyLimitModule {
    fn name(&self) -> &'static str {
        "supply_limit"
    }

    fn binding(&self) -> &ModuleBinding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut ModuleBinding {
        &mut self.binding
    }

    fn can_transfer(&self, ledger: &dyn LedgerView, intent: &TransferIntent) -> bool {
        if !intent.is_mint() {
            return true;
        }
        ledger
            .total_supply()
            .checked_add(intent.amount)
            .is_some_and(|after| after <= self.limit)
    }

    fn configure(&mut self, command: &ModuleCommand) -> LedgerResult<()> {
        match command {
            ModuleCommand::SetLimit { limit } => {
                self.limit = *limit;
                Ok(())
            }
            other => Err(LedgerError::invariant(format!(
                "module {} does not accept {other:?}",
                self.name()
            ))),
        }
    }
}
