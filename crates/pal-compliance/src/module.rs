//! # Compliance Module Interface
//!
//! The capability interface every rule implements, the read-only ledger
//! view rules evaluate against, and the binding bookkeeping that keeps a
//! module attached to at most one compliance instance.

use pal_core::{Address, Amount, ComplianceId, CountryCode, LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};

/// Read-only ledger state available to compliance modules.
///
/// Implemented by the token over its balances and identity registry. Values
/// reflect the ledger *before* the movement under evaluation for
/// `can_transfer`, and *after* it for the notification hooks.
pub trait LedgerView {
    /// Country of the investor behind `wallet`, if registered.
    fn investor_country(&self, wallet: &Address) -> Option<CountryCode>;

    /// Current balance of `wallet`.
    fn balance_of(&self, wallet: &Address) -> Amount;

    /// Current total supply.
    fn total_supply(&self) -> Amount;
}

/// The movement a compliance check is asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIntent {
    /// Sender; `None` for a mint.
    pub from: Option<Address>,
    /// Recipient.
    pub to: Address,
    pub amount: Amount,
}

impl TransferIntent {
    pub fn transfer(from: Address, to: Address, amount: Amount) -> Self {
        Self {
            from: Some(from),
            to,
            amount,
        }
    }

    pub fn mint(to: Address, amount: Amount) -> Self {
        Self { from: None, to, amount }
    }

    pub fn is_mint(&self) -> bool {
        self.from.is_none()
    }

    /// Whether sender and recipient are the same wallet.
    pub fn is_self_transfer(&self) -> bool {
        self.from == Some(self.to)
    }
}

/// Administrative command routed to a module through
/// [`ModularCompliance::configure_module`](crate::ModularCompliance::configure_module).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ModuleCommand {
    AddCountry { country: CountryCode },
    RemoveCountry { country: CountryCode },
    BatchAddCountries { countries: Vec<CountryCode> },
    SetLimit { limit: Amount },
    ResetVolume { wallet: Address },
}

/// Which compliance, if any, a module is bound to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModuleBinding(Option<ComplianceId>);

impl ModuleBinding {
    pub fn compliance(&self) -> Option<ComplianceId> {
        self.0
    }

    /// Attach to `compliance`. Rejected if already attached anywhere.
    pub fn bind(&mut self, compliance: ComplianceId) -> LedgerResult<()> {
        match self.0 {
            Some(current) => Err(LedgerError::invariant(format!(
                "module is already bound to {current}"
            ))),
            None => {
                self.0 = Some(compliance);
                Ok(())
            }
        }
    }

    /// Detach from `compliance`. Rejected if bound elsewhere or not at all.
    pub fn unbind(&mut self, compliance: ComplianceId) -> LedgerResult<()> {
        if self.0 != Some(compliance) {
            return Err(LedgerError::invariant(format!("module is not bound to {compliance}")));
        }
        self.0 = None;
        Ok(())
    }
}

/// A pluggable transfer rule.
///
/// Implementations hold their own configuration and side-effect state and
/// expose it through [`binding`](Self::binding) so the default `bind` and
/// `unbind` enforce single ownership. Override `bind` to initialise
/// per-compliance state, calling `self.binding_mut().bind(..)` first.
pub trait ComplianceModule: Send + Sync + std::fmt::Debug {
    /// Stable module name, reported when the module vetoes a movement.
    fn name(&self) -> &'static str;

    fn binding(&self) -> &ModuleBinding;

    fn binding_mut(&mut self) -> &mut ModuleBinding;

    /// Called when a compliance adds the module.
    fn bind(&mut self, compliance: ComplianceId) -> LedgerResult<()> {
        self.binding_mut().bind(compliance)
    }

    /// Called when a compliance removes the module.
    fn unbind(&mut self, compliance: ComplianceId) -> LedgerResult<()> {
        self.binding_mut().unbind(compliance)
    }

    /// Whether the movement is allowed. Must not mutate state.
    fn can_transfer(&self, ledger: &dyn LedgerView, intent: &TransferIntent) -> bool;

    /// A transfer committed.
    fn transferred(&mut self, _ledger: &dyn LedgerView, _from: &Address, _to: &Address, _amount: Amount) {}

    /// A mint committed.
    fn created(&mut self, _ledger: &dyn LedgerView, _to: &Address, _amount: Amount) {}

    /// A burn committed.
    fn destroyed(&mut self, _ledger: &dyn LedgerView, _from: &Address, _amount: Amount) {}

    /// Apply an administrative command. Modules reject commands they do not
    /// understand.
    fn configure(&mut self, command: &ModuleCommand) -> LedgerResult<()> {
        Err(LedgerError::invariant(format!(
            "module {} does not accept {command:?}",
            self.name()
        )))
    }
}
