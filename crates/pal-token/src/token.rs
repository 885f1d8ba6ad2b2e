//! # Token
//!
//! Balances, supply, pause and freeze state, and the operations that move
//! value. Each public mutating operation runs its guards in a fixed order,
//! commits, notifies compliance, then appends to the event log:
//!
//! | Operation        | Caller       | Guards (in order)                                                    |
//! |------------------|--------------|----------------------------------------------------------------------|
//! | `transfer`       | holder       | not paused, neither side frozen, available balance, recipient verified, compliance |
//! | `mint`           | agent        | recipient verified, supply overflow, compliance                      |
//! | `burn`           | agent        | available balance                                                    |
//! | `forced_transfer`| agent        | [`ForcedTransferPolicy`](crate::ForcedTransferPolicy), recipient verified, compliance (per policy) |
//!
//! `transfer`, `mint`, `burn` and `forced_transfer` additionally require the
//! token's compliance to be bound to this token.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use pal_compliance::{ModularCompliance, TransferIntent};
use pal_core::{AccessControl, Address, Amount, Capability, IdentityId, LedgerError, LedgerResult, Shared};
use pal_identity::{Identity, KeyPurpose};
use pal_registry::IdentityRegistry;

use crate::events::{LoggedEvent, TokenEvent};
use crate::policy::TokenConfig;
use crate::view::LedgerSnapshot;

/// A permissioned fungible token.
#[derive(Debug)]
pub struct Token {
    address: Address,
    config: TokenConfig,
    access: AccessControl,
    paused: bool,
    total_supply: Amount,
    balances: BTreeMap<Address, Amount>,
    frozen: BTreeSet<Address>,
    frozen_tokens: BTreeMap<Address, Amount>,
    identity_registry: Shared<IdentityRegistry>,
    compliance: ModularCompliance,
    events: Vec<LoggedEvent>,
}

impl Token {
    /// Create a token at `address` owned by `owner`.
    ///
    /// The compliance is bound to the token here if it is still unbound.
    pub fn new(
        address: Address,
        owner: Address,
        config: TokenConfig,
        identity_registry: Shared<IdentityRegistry>,
        mut compliance: ModularCompliance,
    ) -> LedgerResult<Self> {
        config.validate()?;
        if compliance.token_bound() != Some(address) {
            compliance.bind_token(&address, address)?;
        }
        let registry_address = identity_registry.read().address();
        let compliance_id = compliance.id();
        let mut token = Self {
            address,
            paused: config.start_paused,
            config,
            access: AccessControl::new(owner),
            total_supply: 0,
            balances: BTreeMap::new(),
            frozen: BTreeSet::new(),
            frozen_tokens: BTreeMap::new(),
            identity_registry,
            compliance,
            events: Vec::new(),
        };
        token.log(TokenEvent::IdentityRegistryAdded {
            registry: registry_address,
        });
        token.log(TokenEvent::ComplianceAdded {
            compliance: compliance_id,
        });
        tracing::info!(
            token = %address,
            name = %token.config.name,
            symbol = %token.config.symbol,
            paused = token.paused,
            "token created"
        );
        Ok(token)
    }

    // ─── Value movement ───────────────────────────────────────────────

    /// Move `amount` from the caller to `to`.
    pub fn transfer(&mut self, caller: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        let result = self.try_transfer(caller, to, amount);
        self.observe("transfer", result)
    }

    /// Create `amount` new units for `to`. Agent only.
    pub fn mint(&mut self, caller: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        let result = self.try_mint(caller, to, amount);
        self.observe("mint", result)
    }

    /// Destroy `amount` of `from`'s free units. Agent only.
    pub fn burn(&mut self, caller: &Address, from: &Address, amount: Amount) -> LedgerResult<()> {
        let result = self.try_burn(caller, from, amount);
        self.observe("burn", result)
    }

    /// Agent-initiated transfer that skips the guards the token's
    /// [`ForcedTransferPolicy`](crate::ForcedTransferPolicy) allows it to.
    pub fn forced_transfer(&mut self, caller: &Address, from: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        let result = self.try_forced_transfer(caller, from, to, amount);
        self.observe("forced_transfer", result)
    }

    /// Move everything held by `lost` to `new`, a wallet whose key is a
    /// management key on `identity`. Agent only.
    ///
    /// Balance, partially frozen amount and the frozen flag follow the
    /// holder. If `lost` is registered, its record is re-registered under
    /// `new` (the token must be an agent of its identity registry) and the
    /// `lost` record is deleted. `new` must then be verified and, when the
    /// forced-transfer policy enforces compliance, pass the compliance check;
    /// otherwise the registry is restored and nothing moves.
    pub fn recovery_address(
        &mut self,
        caller: &Address,
        lost: &Address,
        new: &Address,
        identity: &Shared<Identity>,
    ) -> LedgerResult<()> {
        let result = self.try_recovery(caller, lost, new, identity);
        self.observe("recovery_address", result)
    }

    fn try_transfer(&mut self, caller: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        let from = *caller;
        self.require_compliance_bound()?;
        self.require_not_paused()?;
        self.require_not_frozen(&from)?;
        self.require_not_frozen(to)?;
        self.require_available(&from, amount)?;

        let registry_handle = self.identity_registry.clone();
        let registry = registry_handle.read();
        require_verified(&registry, to)?;
        let intent = TransferIntent::transfer(from, *to, amount);
        self.compliance.check_transfer(
            &LedgerSnapshot::new(&self.balances, self.total_supply, &registry),
            &intent,
        )?;

        self.move_balance(&from, to, amount)?;
        let view = LedgerSnapshot::new(&self.balances, self.total_supply, &registry);
        self.compliance.transferred(&view, &from, to, amount);
        drop(registry);

        self.log(TokenEvent::Transfer {
            from,
            to: *to,
            amount,
            forced: false,
        });
        tracing::info!(token = %self.address, %from, %to, %amount, "transfer committed");
        Ok(())
    }

    fn try_mint(&mut self, caller: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        self.access.require_agent(caller)?;
        self.require_compliance_bound()?;

        let registry_handle = self.identity_registry.clone();
        let registry = registry_handle.read();
        require_verified(&registry, to)?;
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| LedgerError::invariant("total supply overflow"))?;
        self.compliance.check_transfer(
            &LedgerSnapshot::new(&self.balances, self.total_supply, &registry),
            &TransferIntent::mint(*to, amount),
        )?;

        let balance = self
            .balance(to)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::invariant("balance overflow"))?;
        self.set_balance(*to, balance);
        self.total_supply = supply;
        let view = LedgerSnapshot::new(&self.balances, self.total_supply, &registry);
        self.compliance.created(&view, to, amount);
        drop(registry);

        self.log(TokenEvent::Minted { to: *to, amount });
        tracing::info!(token = %self.address, %to, %amount, supply = %self.total_supply, "minted");
        Ok(())
    }

    fn try_burn(&mut self, caller: &Address, from: &Address, amount: Amount) -> LedgerResult<()> {
        self.access.require_agent(caller)?;
        self.require_compliance_bound()?;
        self.require_available(from, amount)?;

        let balance = self.balance(from) - amount;
        self.set_balance(*from, balance);
        self.total_supply -= amount;

        let registry_handle = self.identity_registry.clone();
        let registry = registry_handle.read();
        let view = LedgerSnapshot::new(&self.balances, self.total_supply, &registry);
        self.compliance.destroyed(&view, from, amount);
        drop(registry);

        self.log(TokenEvent::Burned { from: *from, amount });
        tracing::info!(token = %self.address, %from, %amount, supply = %self.total_supply, "burned");
        Ok(())
    }

    fn try_forced_transfer(&mut self, caller: &Address, from: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        self.access.require_agent(caller)?;
        self.require_compliance_bound()?;
        let policy = self.config.forced_transfer;
        if !policy.bypass_pause {
            self.require_not_paused()?;
        }
        if !policy.bypass_frozen_address {
            self.require_not_frozen(from)?;
            self.require_not_frozen(to)?;
        }

        let balance = self.balance(from);
        let available = self.available_balance(from);
        let release = if amount <= available {
            0
        } else if policy.release_frozen_tokens && amount <= balance {
            // A self-transfer moves nothing, so it releases nothing.
            if from == to {
                0
            } else {
                amount - available
            }
        } else {
            return Err(LedgerError::InsufficientBalance {
                available: if policy.release_frozen_tokens { balance } else { available },
                requested: amount,
            });
        };

        let registry_handle = self.identity_registry.clone();
        let registry = registry_handle.read();
        require_verified(&registry, to)?;
        if policy.enforce_compliance {
            self.compliance.check_transfer(
                &LedgerSnapshot::new(&self.balances, self.total_supply, &registry),
                &TransferIntent::transfer(*from, *to, amount),
            )?;
        }

        self.move_balance(from, to, amount)?;
        if release > 0 {
            self.adjust_frozen_tokens(from, |frozen| frozen - release);
        }
        let view = LedgerSnapshot::new(&self.balances, self.total_supply, &registry);
        self.compliance.transferred(&view, from, to, amount);
        drop(registry);

        if release > 0 {
            self.log(TokenEvent::TokensUnfrozen {
                wallet: *from,
                amount: release,
            });
        }
        self.log(TokenEvent::Transfer {
            from: *from,
            to: *to,
            amount,
            forced: true,
        });
        tracing::info!(token = %self.address, %from, %to, %amount, %release, "forced transfer committed");
        Ok(())
    }

    fn try_recovery(&mut self, caller: &Address, lost: &Address, new: &Address, identity: &Shared<Identity>) -> LedgerResult<()> {
        self.access.require_agent(caller)?;
        self.require_compliance_bound()?;
        if lost == new {
            return Err(LedgerError::invariant("lost and new wallet must differ"));
        }
        let amount = self.balance(lost);
        if amount == 0 {
            return Err(LedgerError::invalid_state(format!("wallet {lost} holds no tokens to recover")));
        }
        let (identity_id, new_is_manager) = {
            let identity = identity.read();
            (identity.id(), identity.wallet_has_purpose(new, KeyPurpose::Management))
        };
        if !new_is_manager {
            return Err(LedgerError::NotAuthorized {
                actor: *new,
                required: Capability::ManagementKey,
            });
        }

        let registry_handle = self.identity_registry.clone();
        let registry = registry_handle.read();
        let lost_record = registry
            .identity_storage()
            .read()
            .record(lost)
            .map(|r| (r.identity_id, r.country));
        let reregister = match lost_record {
            Some((stored, country)) => {
                if stored != identity_id {
                    return Err(LedgerError::invariant(format!("{identity_id} does not back wallet {lost}")));
                }
                if registry.contains(new) {
                    return Err(LedgerError::invariant(format!("wallet {new} is already registered")));
                }
                if !registry.is_agent(&self.address) {
                    return Err(LedgerError::invalid_state("token is not an agent of its identity registry"));
                }
                registry.register_identity(&self.address, *new, identity.clone(), country)?;
                true
            }
            None => false,
        };

        // `new` is judged as a recipient under its final registration; the
        // lost record is only removed once it passed.
        let admitted = self
            .check_recovery_recipient(&registry, lost, new, amount)
            .and_then(|()| {
                if reregister {
                    registry.delete_identity(&self.address, lost)
                } else {
                    Ok(())
                }
            });
        if let Err(e) = admitted {
            if reregister {
                if let Err(rollback) = registry.delete_identity(&self.address, new) {
                    tracing::warn!(token = %self.address, %new, error = %rollback, "recovery rollback failed");
                }
            }
            return Err(e);
        }

        self.move_balance(lost, new, amount)?;
        let moved_frozen = self.frozen_tokens.remove(lost).unwrap_or(0);
        if moved_frozen > 0 {
            self.adjust_frozen_tokens(new, |frozen| frozen + moved_frozen);
        }
        if self.frozen.remove(lost) {
            self.frozen.insert(*new);
        }
        let view = LedgerSnapshot::new(&self.balances, self.total_supply, &registry);
        self.compliance.transferred(&view, lost, new, amount);
        drop(registry);

        self.log(TokenEvent::Transfer {
            from: *lost,
            to: *new,
            amount,
            forced: true,
        });
        self.log(TokenEvent::RecoverySuccess {
            lost: *lost,
            new: *new,
            identity: identity_id,
        });
        tracing::info!(token = %self.address, %lost, %new, %amount, "wallet recovered");
        Ok(())
    }

    // ─── Freezing and pause ───────────────────────────────────────────

    /// Freeze or unfreeze a whole wallet. Owner or agent.
    pub fn set_address_frozen(&mut self, caller: &Address, wallet: &Address, freeze: bool) -> LedgerResult<()> {
        let result = self.access.require_owner_or_agent(caller).map(|()| {
            self.apply_address_frozen(caller, wallet, freeze);
        });
        self.observe("set_address_frozen", result)
    }

    /// Freeze or unfreeze several wallets. Owner or agent.
    pub fn batch_set_address_frozen(&mut self, caller: &Address, changes: &[(Address, bool)]) -> LedgerResult<()> {
        let result = self.access.require_owner_or_agent(caller).map(|()| {
            for (wallet, freeze) in changes {
                self.apply_address_frozen(caller, wallet, *freeze);
            }
        });
        self.observe("batch_set_address_frozen", result)
    }

    fn apply_address_frozen(&mut self, caller: &Address, wallet: &Address, freeze: bool) {
        if freeze {
            self.frozen.insert(*wallet);
        } else {
            self.frozen.remove(wallet);
        }
        self.log(TokenEvent::AddressFrozen {
            wallet: *wallet,
            frozen: freeze,
            by: *caller,
        });
        tracing::info!(token = %self.address, %wallet, freeze, "address freeze set");
    }

    /// Lock `amount` of `wallet`'s free balance. Agent only.
    pub fn freeze_partial_tokens(&mut self, caller: &Address, wallet: &Address, amount: Amount) -> LedgerResult<()> {
        let result = self.try_freeze_partial(caller, wallet, amount);
        self.observe("freeze_partial_tokens", result)
    }

    /// Release `amount` of `wallet`'s frozen tokens. Agent only.
    pub fn unfreeze_partial_tokens(&mut self, caller: &Address, wallet: &Address, amount: Amount) -> LedgerResult<()> {
        let result = self.try_unfreeze_partial(caller, wallet, amount);
        self.observe("unfreeze_partial_tokens", result)
    }

    fn try_freeze_partial(&mut self, caller: &Address, wallet: &Address, amount: Amount) -> LedgerResult<()> {
        self.access.require_agent(caller)?;
        let available = self.available_balance(wallet);
        if amount > available {
            return Err(LedgerError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        self.adjust_frozen_tokens(wallet, |frozen| frozen + amount);
        self.log(TokenEvent::TokensFrozen {
            wallet: *wallet,
            amount,
        });
        tracing::info!(token = %self.address, %wallet, %amount, "tokens frozen");
        Ok(())
    }

    fn try_unfreeze_partial(&mut self, caller: &Address, wallet: &Address, amount: Amount) -> LedgerResult<()> {
        self.access.require_agent(caller)?;
        let frozen = self.frozen_tokens(wallet);
        if amount > frozen {
            return Err(LedgerError::invariant(format!(
                "cannot unfreeze {amount}: only {frozen} frozen"
            )));
        }
        self.adjust_frozen_tokens(wallet, |frozen| frozen - amount);
        self.log(TokenEvent::TokensUnfrozen {
            wallet: *wallet,
            amount,
        });
        tracing::info!(token = %self.address, %wallet, %amount, "tokens unfrozen");
        Ok(())
    }

    /// Stop holder transfers. Owner or agent; pausing a paused token is a no-op.
    pub fn pause(&mut self, caller: &Address) -> LedgerResult<()> {
        let result = self.access.require_owner_or_agent(caller).map(|()| {
            if !self.paused {
                self.paused = true;
                self.log(TokenEvent::Paused { by: *caller });
                tracing::info!(token = %self.address, by = %caller, "token paused");
            }
        });
        self.observe("pause", result)
    }

    /// Resume holder transfers. Owner or agent; unpausing is idempotent.
    pub fn unpause(&mut self, caller: &Address) -> LedgerResult<()> {
        let result = self.access.require_owner_or_agent(caller).map(|()| {
            if self.paused {
                self.paused = false;
                self.log(TokenEvent::Unpaused { by: *caller });
                tracing::info!(token = %self.address, by = %caller, "token unpaused");
            }
        });
        self.observe("unpause", result)
    }

    // ─── Governance ───────────────────────────────────────────────────

    /// Grant agent status. Owner only.
    pub fn add_agent(&mut self, caller: &Address, agent: Address) -> LedgerResult<()> {
        let result = self.access.add_agent(caller, agent);
        if result.is_ok() {
            self.log(TokenEvent::AgentAdded { agent });
            tracing::info!(token = %self.address, %agent, "agent added");
        }
        self.observe("add_agent", result)
    }

    /// Revoke agent status. Owner only.
    pub fn remove_agent(&mut self, caller: &Address, agent: &Address) -> LedgerResult<()> {
        let result = self.access.remove_agent(caller, agent);
        if result.is_ok() {
            self.log(TokenEvent::AgentRemoved { agent: *agent });
            tracing::info!(token = %self.address, %agent, "agent removed");
        }
        self.observe("remove_agent", result)
    }

    /// Hand ownership to `new_owner`. Owner only.
    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> LedgerResult<()> {
        let previous = self.access.owner();
        let result = self.access.transfer_ownership(caller, new_owner);
        if result.is_ok() {
            self.log(TokenEvent::OwnershipTransferred {
                previous,
                new: new_owner,
            });
        }
        self.observe("transfer_ownership", result)
    }

    /// Rename the token. Owner only.
    pub fn set_name(&mut self, caller: &Address, name: impl Into<String>) -> LedgerResult<()> {
        let name = name.into();
        let result = self.update_information(caller, |cfg| cfg.name = name);
        self.observe("set_name", result)
    }

    /// Change the ticker symbol. Owner only.
    pub fn set_symbol(&mut self, caller: &Address, symbol: impl Into<String>) -> LedgerResult<()> {
        let symbol = symbol.into();
        let result = self.update_information(caller, |cfg| cfg.symbol = symbol);
        self.observe("set_symbol", result)
    }

    /// Set or clear the issuer identity. Owner only.
    pub fn set_onchain_id(&mut self, caller: &Address, onchain_id: Option<IdentityId>) -> LedgerResult<()> {
        let result = self.update_information(caller, |cfg| cfg.onchain_id = onchain_id);
        self.observe("set_onchain_id", result)
    }

    fn update_information(&mut self, caller: &Address, change: impl FnOnce(&mut TokenConfig)) -> LedgerResult<()> {
        self.access.require_owner(caller)?;
        let mut staged = self.config.clone();
        change(&mut staged);
        staged.validate()?;
        self.config = staged;
        self.log(TokenEvent::UpdatedTokenInformation {
            name: self.config.name.clone(),
            symbol: self.config.symbol.clone(),
            onchain_id: self.config.onchain_id,
        });
        Ok(())
    }

    /// Point at a different identity registry. Owner only.
    pub fn set_identity_registry(&mut self, caller: &Address, registry: Shared<IdentityRegistry>) -> LedgerResult<()> {
        let result = self.access.require_owner(caller).map(|()| {
            let registry_address = registry.read().address();
            self.identity_registry = registry;
            self.log(TokenEvent::IdentityRegistryAdded {
                registry: registry_address,
            });
            tracing::info!(token = %self.address, registry = %registry_address, "identity registry set");
        });
        self.observe("set_identity_registry", result)
    }

    /// Replace the token's compliance, returning the previous one unbound.
    /// Owner only.
    pub fn set_compliance(&mut self, caller: &Address, compliance: ModularCompliance) -> LedgerResult<ModularCompliance> {
        let result = self.try_set_compliance(caller, compliance);
        self.observe("set_compliance", result)
    }

    fn try_set_compliance(&mut self, caller: &Address, mut compliance: ModularCompliance) -> LedgerResult<ModularCompliance> {
        self.access.require_owner(caller)?;
        match compliance.token_bound() {
            Some(bound) if bound == self.address => {}
            Some(bound) => {
                return Err(LedgerError::invariant(format!(
                    "{} is bound to another token {bound}",
                    compliance.id()
                )));
            }
            None => compliance.bind_token(&self.address, self.address)?,
        }
        if self.compliance.token_bound() == Some(self.address) {
            self.compliance.unbind_token(&self.address, &self.address)?;
        }
        let compliance_id = compliance.id();
        let previous = std::mem::replace(&mut self.compliance, compliance);
        self.log(TokenEvent::ComplianceAdded {
            compliance: compliance_id,
        });
        tracing::info!(token = %self.address, compliance = %compliance_id, "compliance set");
        Ok(previous)
    }

    // ─── Queries ──────────────────────────────────────────────────────

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.config.decimals
    }

    pub fn onchain_id(&self) -> Option<IdentityId> {
        self.config.onchain_id
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    pub fn is_agent(&self, who: &Address) -> bool {
        self.access.is_agent(who)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, wallet: &Address) -> Amount {
        self.balance(wallet)
    }

    /// Non-zero balances, in wallet order.
    pub fn balances(&self) -> &BTreeMap<Address, Amount> {
        &self.balances
    }

    pub fn is_frozen(&self, wallet: &Address) -> bool {
        self.frozen.contains(wallet)
    }

    pub fn frozen_tokens(&self, wallet: &Address) -> Amount {
        self.frozen_tokens.get(wallet).copied().unwrap_or(0)
    }

    /// Balance minus partially frozen tokens.
    pub fn available_balance(&self, wallet: &Address) -> Amount {
        self.balance(wallet).saturating_sub(self.frozen_tokens(wallet))
    }

    /// Whether the identity registry currently verifies `wallet`.
    pub fn is_verified(&self, wallet: &Address) -> bool {
        self.identity_registry.read().is_verified(wallet)
    }

    /// Evaluate the compliance gate for `intent` against current state.
    pub fn check_compliance(&self, intent: &TransferIntent) -> LedgerResult<()> {
        let registry = self.identity_registry.read();
        self.compliance.check_transfer(
            &LedgerSnapshot::new(&self.balances, self.total_supply, &registry),
            intent,
        )
    }

    pub fn identity_registry(&self) -> Shared<IdentityRegistry> {
        self.identity_registry.clone()
    }

    pub fn compliance(&self) -> &ModularCompliance {
        &self.compliance
    }

    /// Mutable access for compliance governance. Every compliance mutation
    /// still checks its own owner.
    pub fn compliance_mut(&mut self) -> &mut ModularCompliance {
        &mut self.compliance
    }

    /// Committed events, oldest first.
    pub fn events(&self) -> &[LoggedEvent] {
        &self.events
    }

    // ─── Internals ────────────────────────────────────────────────────

    fn balance(&self, wallet: &Address) -> Amount {
        self.balances.get(wallet).copied().unwrap_or(0)
    }

    fn set_balance(&mut self, wallet: Address, amount: Amount) {
        if amount == 0 {
            self.balances.remove(&wallet);
        } else {
            self.balances.insert(wallet, amount);
        }
    }

    fn adjust_frozen_tokens(&mut self, wallet: &Address, change: impl FnOnce(Amount) -> Amount) {
        let updated = change(self.frozen_tokens(wallet));
        if updated == 0 {
            self.frozen_tokens.remove(wallet);
        } else {
            self.frozen_tokens.insert(*wallet, updated);
        }
    }

    /// Debit `from` and credit `to`; validated before either side changes.
    fn move_balance(&mut self, from: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        if from == to {
            return Ok(());
        }
        let from_balance = self.balance(from);
        let debited = from_balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                available: from_balance,
                requested: amount,
            })?;
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::invariant("balance overflow"))?;
        self.set_balance(*from, debited);
        self.set_balance(*to, credited);
        Ok(())
    }

    fn check_recovery_recipient(
        &self,
        registry: &IdentityRegistry,
        lost: &Address,
        new: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        require_verified(registry, new)?;
        if self.config.forced_transfer.enforce_compliance {
            self.compliance.check_transfer(
                &LedgerSnapshot::new(&self.balances, self.total_supply, registry),
                &TransferIntent::transfer(*lost, *new, amount),
            )?;
        }
        Ok(())
    }

    fn require_compliance_bound(&self) -> LedgerResult<()> {
        if self.compliance.token_bound() == Some(self.address) {
            Ok(())
        } else {
            Err(LedgerError::invalid_state(format!(
                "{} is not bound to token {}",
                self.compliance.id(),
                self.address
            )))
        }
    }

    fn require_not_paused(&self) -> LedgerResult<()> {
        if self.paused {
            Err(LedgerError::invalid_state("token is paused"))
        } else {
            Ok(())
        }
    }

    fn require_not_frozen(&self, wallet: &Address) -> LedgerResult<()> {
        if self.frozen.contains(wallet) {
            Err(LedgerError::invalid_state(format!("wallet {wallet} is frozen")))
        } else {
            Ok(())
        }
    }

    fn require_available(&self, wallet: &Address, amount: Amount) -> LedgerResult<()> {
        let available = self.available_balance(wallet);
        if amount > available {
            Err(LedgerError::InsufficientBalance {
                available,
                requested: amount,
            })
        } else {
            Ok(())
        }
    }

    fn log(&mut self, event: TokenEvent) {
        let sequence = self.events.len() as u64;
        self.events.push(LoggedEvent {
            sequence,
            at: Utc::now(),
            event,
        });
    }

    fn observe<T>(&self, op: &'static str, result: LedgerResult<T>) -> LedgerResult<T> {
        match &result {
            Ok(_) => metrics::counter!("pal_token_operations_total", "op" => op).increment(1),
            Err(e) => {
                tracing::debug!(token = %self.address, op, kind = %e.kind(), error = %e, "operation rejected");
                metrics::counter!("pal_token_rejections_total", "op" => op, "kind" => e.kind().as_str())
                    .increment(1);
            }
        }
        result
    }
}

fn require_verified(registry: &IdentityRegistry, wallet: &Address) -> LedgerResult<()> {
    if registry.is_verified(wallet) {
        Ok(())
    } else {
        Err(LedgerError::NotEligible { wallet: *wallet })
    }
}
