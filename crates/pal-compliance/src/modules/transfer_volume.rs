//! Caps the cumulative amount each wallet may send.

use std::collections::BTreeMap;

use pal_core::{Address, Amount, ComplianceId, LedgerError, LedgerResult};

use crate::module::{ComplianceModule, LedgerView, ModuleBinding, ModuleCommand, TransferIntent};

/// Rejects a transfer that would take the sender's running outbound total
/// above `limit`. The total is updated in the `transferred` hook; mints
/// and burns do not count.
#[derive(Debug, Clone)]
pub struct TransferVolumeLimitModule {
    binding: ModuleBinding,
    limit: Amount,
    sent: BTreeMap<Address, Amount>,
}

impl TransferVolumeLimitModule {
    pub fn new(limit: Amount) -> Self {
        Self {
            binding: ModuleBinding::default(),
            limit,
            sent: BTreeMap::new(),
        }
    }

    pub fn limit(&self) -> Amount {
        self.limit
    }

    /// Amount `wallet` has sent since binding (or its last reset).
    pub fn volume_sent(&self, wallet: &Address) -> Amount {
        self.sent.get(wallet).copied().unwrap_or(0)
    }
}

impl ComplianceModule for TransferVolumeLimitModule {
    fn name(&self) -> &'static str {
        "transfer_volume_limit"
    }

    fn binding(&self) -> &ModuleBinding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut ModuleBinding {
        &mut self.binding
    }

    fn bind(&mut self, compliance: ComplianceId) -> LedgerResult<()> {
        self.binding.bind(compliance)?;
        self.sent.clear();
        Ok(())
    }

    fn can_transfer(&self, _ledger: &dyn LedgerView, intent: &TransferIntent) -> bool {
        let Some(from) = intent.from else {
            return true;
        };
        self.volume_sent(&from)
            .checked_add(intent.amount)
            .is_some_and(|after| after <= self.limit)
    }

    fn transferred(&mut self, _ledger: &dyn LedgerView, from: &Address, _to: &Address, amount: Amount) {
        let total = self.sent.entry(*from).or_insert(0);
        *total = total.saturating_add(amount);
    }

    fn configure(&mut self, command: &ModuleCommand) -> LedgerResult<()> {
        match command {
            ModuleCommand::SetLimit { limit } => {
                self.limit = *limit;
                Ok(())
            }
            ModuleCommand::ResetVolume { wallet } => {
                self.sent.remove(wallet);
                Ok(())
            }
            other => Err(LedgerError::invariant(format!(
                "module {} does not accept {other:?}",
                self.name()
            ))),
        }
    }
}
