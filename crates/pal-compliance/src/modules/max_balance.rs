//! Caps the balance any single wallet may hold.

use pal_core::{Amount, LedgerError, LedgerResult};

use crate::module::{ComplianceModule, LedgerView, ModuleBinding, ModuleCommand, TransferIntent};

/// Rejects a movement that would leave the recipient above `limit`.
#[derive(Debug, Clone)]
pub struct MaxBalanceModule {
    binding: ModuleBinding,
    limit: Amount,
}

impl MaxBalanceModule {
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

impl ComplianceModule for MaxBalanceModule {
    fn name(&self) -> &'static str {
        "max_balance"
    }

    fn binding(&self) -> &ModuleBinding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut ModuleBinding {
        &mut self.binding
    }

    fn can_transfer(&self, ledger: &dyn LedgerView, intent: &TransferIntent) -> bool {
        if intent.is_self_transfer() {
            return true;
        }
        ledger
            .balance_of(&intent.to)
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
