//! # Modular Compliance
//!
//! Aggregates an ordered list of bound modules into one gate:
//!
//! - [`check_transfer`](ModularCompliance::check_transfer) evaluates modules
//!   in binding order and stops at the first veto, naming the module.
//! - The notification hooks run every module in binding order after the
//!   token has committed the balance change.
//!
//! Owner-governed: adding, removing and configuring modules and binding the
//! token require the compliance owner. A compliance is bound to at most one
//! token; the token owns it.

use pal_core::{AccessControl, Address, Amount, ComplianceId, LedgerError, LedgerResult, ModuleId};

use crate::module::{ComplianceModule, LedgerView, ModuleCommand, TransferIntent};

/// Upper bound on modules per compliance.
pub const MAX_MODULES: usize = 25;

#[derive(Debug)]
struct BoundModule {
    id: ModuleId,
    module: Box<dyn ComplianceModule>,
}

/// Ordered collection of compliance modules.
#[derive(Debug)]
pub struct ModularCompliance {
    id: ComplianceId,
    access: AccessControl,
    token: Option<Address>,
    modules: Vec<BoundModule>,
}

impl ModularCompliance {
    /// Create an empty compliance governed by `owner`.
    pub fn new(owner: Address) -> Self {
        Self {
            id: ComplianceId::new(),
            access: AccessControl::new(owner),
            token: None,
            modules: Vec::new(),
        }
    }

    pub fn id(&self) -> ComplianceId {
        self.id
    }

    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> LedgerResult<()> {
        self.access.transfer_ownership(caller, new_owner)
    }

    // ─── Token binding ────────────────────────────────────────────────

    /// The token this compliance gates, if bound.
    pub fn token_bound(&self) -> Option<Address> {
        self.token
    }

    /// Bind to `token`.
    ///
    /// Callable by the owner, or by the token itself while the compliance is
    /// unbound. A bound compliance must be unbound first.
    pub fn bind_token(&mut self, caller: &Address, token: Address) -> LedgerResult<()> {
        let self_binding = self.token.is_none() && *caller == token;
        if !self_binding {
            self.access.require_owner(caller)?;
        }
        if let Some(current) = self.token {
            return Err(LedgerError::invariant(format!(
                "{} is already bound to token {current}",
                self.id
            )));
        }
        self.token = Some(token);
        tracing::info!(compliance = %self.id, %token, "token bound");
        Ok(())
    }

    /// Release the binding to `token`. Callable by the owner or the bound token.
    pub fn unbind_token(&mut self, caller: &Address, token: &Address) -> LedgerResult<()> {
        if self.token.as_ref() != Some(caller) {
            self.access.require_owner(caller)?;
        }
        if self.token.as_ref() != Some(token) {
            return Err(LedgerError::invariant(format!("{} is not bound to token {token}", self.id)));
        }
        self.token = None;
        tracing::info!(compliance = %self.id, %token, "token unbound");
        Ok(())
    }

    // ─── Modules ──────────────────────────────────────────────────────

    /// Bind `module` at the end of the evaluation order. Owner only.
    pub fn add_module(&mut self, caller: &Address, mut module: Box<dyn ComplianceModule>) -> LedgerResult<ModuleId> {
        self.access.require_owner(caller)?;
        if self.modules.len() >= MAX_MODULES {
            return Err(LedgerError::invariant(format!(
                "cannot bind more than {MAX_MODULES} modules"
            )));
        }
        module.bind(self.id)?;
        let id = ModuleId::new();
        tracing::info!(compliance = %self.id, module = %id, name = module.name(), "module added");
        self.modules.push(BoundModule { id, module });
        Ok(id)
    }

    /// Unbind and hand back a module. Owner only.
    pub fn remove_module(&mut self, caller: &Address, module_id: &ModuleId) -> LedgerResult<Box<dyn ComplianceModule>> {
        self.access.require_owner(caller)?;
        let pos = self.position(module_id)?;
        self.modules[pos].module.unbind(self.id)?;
        let removed = self.modules.remove(pos);
        tracing::info!(compliance = %self.id, module = %module_id, name = removed.module.name(), "module removed");
        Ok(removed.module)
    }

    /// Route an administrative command to a bound module. Owner only.
    pub fn configure_module(&mut self, caller: &Address, module_id: &ModuleId, command: &ModuleCommand) -> LedgerResult<()> {
        self.access.require_owner(caller)?;
        let pos = self.position(module_id)?;
        self.modules[pos].module.configure(command)?;
        tracing::info!(compliance = %self.id, module = %module_id, ?command, "module configured");
        Ok(())
    }

    /// Bound modules as `(id, name)`, in binding order.
    pub fn modules(&self) -> Vec<(ModuleId, &'static str)> {
        self.modules.iter().map(|m| (m.id, m.module.name())).collect()
    }

    pub fn is_module_bound(&self, module_id: &ModuleId) -> bool {
        self.modules.iter().any(|m| &m.id == module_id)
    }

    /// Borrow a bound module.
    pub fn module(&self, module_id: &ModuleId) -> Option<&dyn ComplianceModule> {
        self.modules
            .iter()
            .find(|m| &m.id == module_id)
            .map(|m| m.module.as_ref())
    }

    fn position(&self, module_id: &ModuleId) -> LedgerResult<usize> {
        self.modules
            .iter()
            .position(|m| &m.id == module_id)
            .ok_or_else(|| LedgerError::invariant(format!("{module_id} is not bound to {}", self.id)))
    }

    // ─── Evaluation ───────────────────────────────────────────────────

    /// Evaluate every module in binding order; the first veto rejects.
    pub fn check_transfer(&self, ledger: &dyn LedgerView, intent: &TransferIntent) -> LedgerResult<()> {
        match self.modules.iter().find(|m| !m.module.can_transfer(ledger, intent)) {
            Some(veto) => {
                tracing::debug!(compliance = %self.id, module = veto.module.name(), ?intent, "compliance veto");
                Err(LedgerError::ComplianceRejected {
                    module: veto.module.name().to_string(),
                })
            }
            None => Ok(()),
        }
    }

    /// Whether every module allows the movement.
    pub fn can_transfer(&self, ledger: &dyn LedgerView, intent: &TransferIntent) -> bool {
        self.check_transfer(ledger, intent).is_ok()
    }

    /// Notify every module of a committed transfer.
    pub fn transferred(&mut self, ledger: &dyn LedgerView, from: &Address, to: &Address, amount: Amount) {
        for m in &mut self.modules {
            m.module.transferred(ledger, from, to, amount);
        }
    }

    /// Notify every module of a committed mint.
    pub fn created(&mut self, ledger: &dyn LedgerView, to: &Address, amount: Amount) {
        for m in &mut self.modules {
            m.module.created(ledger, to, amount);
        }
    }

    /// Notify every module of a committed burn.
    pub fn destroyed(&mut self, ledger: &dyn LedgerView, from: &Address, amount: Amount) {
        for m in &mut self.modules {
            m.module.destroyed(ledger, from, amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::testing::FakeLedger;
    use crate::modules::{CountryAllowModule, MaxBalanceModule, TransferVolumeLimitModule};
    use pal_core::{CountryCode, ErrorKind};

    fn owner() -> Address {
        Address::from_label("compliance-owner")
    }

    #[test]
    fn empty_compliance_allows_everything() {
        let compliance = ModularCompliance::new(owner());
        let ledger = FakeLedger::default();
        assert!(compliance.can_transfer(&ledger, &TransferIntent::mint(Address::from_label("x"), 1)));
    }

    #[test]
    fn first_veto_in_binding_order_is_reported() {
        let mut compliance = ModularCompliance::new(owner());
        compliance
            .add_module(&owner(), Box::new(CountryAllowModule::new([CountryCode(250)])))
            .unwrap();
        compliance
            .add_module(&owner(), Box::new(MaxBalanceModule::new(10)))
            .unwrap();
        let to = Address::from_label("to");

        let abroad = FakeLedger::default().with_country(to, 840);
        let err = compliance
            .check_transfer(&abroad, &TransferIntent::mint(to, 100))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::ComplianceRejected {
                module: "country_allow".into()
            }
        );

        let home = FakeLedger::default().with_country(to, 250);
        let err = compliance
            .check_transfer(&home, &TransferIntent::mint(to, 100))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ComplianceRejected);
        assert!(compliance.can_transfer(&home, &TransferIntent::mint(to, 10)));
    }

    #[test]
    fn module_already_bound_elsewhere_is_rejected() {
        let mut first = ModularCompliance::new(owner());
        let mut second = ModularCompliance::new(owner());
        let id = first
            .add_module(&owner(), Box::new(MaxBalanceModule::new(1)))
            .unwrap();

        let mut stray = MaxBalanceModule::new(1);
        stray.bind(first.id()).unwrap();
        let err = second.add_module(&owner(), Box::new(stray)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);

        // Once removed, the module is free to move.
        let module = first.remove_module(&owner(), &id).unwrap();
        assert!(module.binding().compliance().is_none());
        second.add_module(&owner(), module).unwrap();
        assert_eq!(second.modules().len(), 1);
        assert!(!first.is_module_bound(&id));
    }

    #[test]
    fn governance_is_owner_only() {
        let mut compliance = ModularCompliance::new(owner());
        let stranger = Address::from_label("stranger");
        let err = compliance
            .add_module(&stranger, Box::new(MaxBalanceModule::new(1)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);

        let id = compliance
            .add_module(&owner(), Box::new(MaxBalanceModule::new(1)))
            .unwrap();
        let cmd = ModuleCommand::SetLimit { limit: 50 };
        assert!(compliance.configure_module(&stranger, &id, &cmd).is_err());
        compliance.configure_module(&owner(), &id, &cmd).unwrap();
        assert!(compliance.remove_module(&stranger, &id).is_err());
    }

    #[test]
    fn module_capacity_is_bounded() {
        let mut compliance = ModularCompliance::new(owner());
        for _ in 0..MAX_MODULES {
            compliance
                .add_module(&owner(), Box::new(MaxBalanceModule::new(1)))
                .unwrap();
        }
        assert!(compliance
            .add_module(&owner(), Box::new(MaxBalanceModule::new(1)))
            .is_err());
    }

    #[test]
    fn hooks_reach_every_module() {
        let mut compliance = ModularCompliance::new(owner());
        let id = compliance
            .add_module(&owner(), Box::new(TransferVolumeLimitModule::new(100)))
            .unwrap();
        let (a, b) = (Address::from_label("a"), Address::from_label("b"));
        let ledger = FakeLedger::default();
        compliance.transferred(&ledger, &a, &b, 60);
        assert!(!compliance.can_transfer(&ledger, &TransferIntent::transfer(a, b, 41)));
        compliance
            .configure_module(&owner(), &id, &ModuleCommand::ResetVolume { wallet: a })
            .unwrap();
        assert!(compliance.can_transfer(&ledger, &TransferIntent::transfer(a, b, 41)));
    }

    #[test]
    fn token_binding_is_exclusive() {
        let mut compliance = ModularCompliance::new(owner());
        let (t1, t2) = (Address::from_label("t1"), Address::from_label("t2"));
        compliance.bind_token(&owner(), t1).unwrap();
        assert!(compliance.bind_token(&owner(), t2).is_err());
        assert!(compliance.unbind_token(&owner(), &t2).is_err());
        compliance.unbind_token(&owner(), &t1).unwrap();
        compliance.bind_token(&owner(), t2).unwrap();
        assert_eq!(compliance.token_bound(), Some(t2));
    }

    #[test]
    fn token_may_bind_and_unbind_itself() {
        let mut compliance = ModularCompliance::new(owner());
        let (t1, t2) = (Address::from_label("t1"), Address::from_label("t2"));
        compliance.bind_token(&t1, t1).unwrap();
        let err = compliance.bind_token(&t2, t2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);
        assert!(compliance.unbind_token(&t2, &t1).is_err());
        compliance.unbind_token(&t1, &t1).unwrap();
        assert_eq!(compliance.token_bound(), None);
    }
}
