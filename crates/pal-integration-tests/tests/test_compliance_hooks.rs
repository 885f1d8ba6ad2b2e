//! # Compliance Gate and Hooks
//!
//! The token consults its modular compliance on every transfer and mint,
//! notifies modules in binding order only after balances changed, and never
//! re-judges movements that already committed.

mod common;

use std::sync::{Arc, Mutex};

use common::{Suite, FRANCE, GERMANY, NORTH_KOREA};
use pal_compliance::{
    ComplianceModule, LedgerView, MaxBalanceModule, ModularCompliance, ModuleBinding, ModuleCommand, ModuleSpec,
    SupplyLimitModule, TransferIntent,
};
use pal_core::{Address, Amount, ErrorKind, LedgerError};
use pal_token::TokenConfig;

// ---------------------------------------------------------------------------
// Recording module
// ---------------------------------------------------------------------------

type Journal = Arc<Mutex<Vec<String>>>;

/// Allows everything and records each hook with the sender's balance as the
/// hook observed it.
#[derive(Debug)]
struct Recorder {
    name: &'static str,
    binding: ModuleBinding,
    journal: Journal,
}

impl Recorder {
    fn boxed(name: &'static str, journal: &Journal) -> Box<dyn ComplianceModule> {
        Box::new(Self {
            name,
            binding: ModuleBinding::default(),
            journal: journal.clone(),
        })
    }

    fn record(&self, entry: String) {
        self.journal.lock().unwrap().push(entry);
    }
}

impl ComplianceModule for Recorder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn binding(&self) -> &ModuleBinding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut ModuleBinding {
        &mut self.binding
    }

    fn can_transfer(&self, _ledger: &dyn LedgerView, _intent: &TransferIntent) -> bool {
        true
    }

    fn transferred(&mut self, ledger: &dyn LedgerView, from: &Address, _to: &Address, amount: Amount) {
        self.record(format!("{}:transferred:{amount}:from_balance={}", self.name, ledger.balance_of(from)));
    }

    fn created(&mut self, ledger: &dyn LedgerView, _to: &Address, amount: Amount) {
        self.record(format!("{}:created:{amount}:supply={}", self.name, ledger.total_supply()));
    }

    fn destroyed(&mut self, ledger: &dyn LedgerView, _from: &Address, amount: Amount) {
        self.record(format!("{}:destroyed:{amount}:supply={}", self.name, ledger.total_supply()));
    }
}

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

// ---------------------------------------------------------------------------
// Hook ordering
// ---------------------------------------------------------------------------

#[test]
fn hooks_run_after_commit_in_binding_order() {
    let log = journal();
    let mut s = Suite::with(
        TokenConfig::new("Harbour Fund", "HBF", 0),
        vec![Recorder::boxed("first", &log), Recorder::boxed("second", &log)],
    );
    let (w1, _) = s.investor("w1", FRANCE);
    let (w2, _) = s.investor("w2", FRANCE);

    s.token.mint(&s.agent, &w1, 100).unwrap();
    s.token.transfer(&w1, &w2, 40).unwrap();
    s.token.burn(&s.agent, &w2, 10).unwrap();

    assert_eq!(
        entries(&log),
        vec![
            "first:created:100:supply=100",
            "second:created:100:supply=100",
            "first:transferred:40:from_balance=60",
            "second:transferred:40:from_balance=60",
            "first:destroyed:10:supply=90",
            "second:destroyed:10:supply=90",
        ]
    );
}

#[test]
fn rejected_operations_fire_no_hooks() {
    let log = journal();
    let mut s = Suite::with(TokenConfig::new("Harbour Fund", "HBF", 0), vec![Recorder::boxed("only", &log)]);
    let (w1, _) = s.investor("w1", FRANCE);
    let (w2, _) = s.investor("w2", FRANCE);
    s.token.mint(&s.agent, &w1, 10).unwrap();
    log.lock().unwrap().clear();

    assert!(s.token.transfer(&w1, &w2, 11).is_err());
    s.token.pause(&s.agent).unwrap();
    assert!(s.token.transfer(&w1, &w2, 1).is_err());
    assert!(entries(&log).is_empty());
}

#[test]
fn forced_transfer_notifies_transferred() {
    let log = journal();
    let mut s = Suite::with(TokenConfig::new("Harbour Fund", "HBF", 0), vec![Recorder::boxed("r", &log)]);
    let (w1, _) = s.investor("w1", FRANCE);
    let (w2, _) = s.investor("w2", FRANCE);
    s.token.mint(&s.agent, &w1, 10).unwrap();
    log.lock().unwrap().clear();

    s.token.forced_transfer(&s.agent, &w1, &w2, 3).unwrap();
    assert_eq!(entries(&log), vec!["r:transferred:3:from_balance=7"]);
}

// ---------------------------------------------------------------------------
// Gate semantics
// ---------------------------------------------------------------------------

#[test]
fn veto_names_the_rejecting_module() {
    let mut s = Suite::with(
        TokenConfig::new("Harbour Fund", "HBF", 0),
        vec![
            ModuleSpec::CountryRestrict { countries: vec![NORTH_KOREA] }.build(),
            ModuleSpec::MaxBalance { limit: 100 }.build(),
        ],
    );
    let (w1, _) = s.investor("w1", FRANCE);
    let (sanctioned, _) = s.investor("sanctioned", NORTH_KOREA);

    assert_eq!(
        s.token.mint(&s.agent, &sanctioned, 1).unwrap_err(),
        LedgerError::ComplianceRejected {
            module: "country_restrict".into()
        }
    );
    assert_eq!(
        s.token.mint(&s.agent, &w1, 101).unwrap_err(),
        LedgerError::ComplianceRejected {
            module: "max_balance".into()
        }
    );
    s.token.mint(&s.agent, &w1, 100).unwrap();
}

#[test]
fn module_added_later_does_not_touch_past_transfers() {
    let mut s = Suite::new();
    let (w1, _) = s.investor("w1", FRANCE);
    let (w2, _) = s.investor("w2", FRANCE);
    s.token.mint(&s.agent, &w1, 500).unwrap();
    s.token.transfer(&w1, &w2, 400).unwrap();

    let owner = s.owner;
    s.token
        .compliance_mut()
        .add_module(&owner, Box::new(MaxBalanceModule::new(300)))
        .unwrap();

    // The committed 400 stands; only new movements are judged.
    assert_eq!(s.token.balance_of(&w2), 400);
    assert_eq!(s.token.transfer(&w1, &w2, 1).unwrap_err().kind(), ErrorKind::ComplianceRejected);
    s.token.transfer(&w2, &w1, 150).unwrap();
}

#[test]
fn compliance_is_evaluated_against_current_registry_country() {
    let mut s = Suite::with(
        TokenConfig::new("Harbour Fund", "HBF", 0),
        vec![ModuleSpec::CountryAllow { countries: vec![FRANCE] }.build()],
    );
    let (w1, _) = s.investor("w1", FRANCE);
    let (w2, _) = s.investor("w2", FRANCE);
    s.token.mint(&s.agent, &w1, 10).unwrap();
    s.token.transfer(&w1, &w2, 1).unwrap();

    s.registry.read().update_country(&s.agent, &w2, GERMANY).unwrap();
    assert_eq!(s.token.transfer(&w1, &w2, 1).unwrap_err().kind(), ErrorKind::ComplianceRejected);

    let owner = s.owner;
    let (module_id, _) = s.token.compliance().modules()[0];
    s.token
        .compliance_mut()
        .configure_module(&owner, &module_id, &ModuleCommand::AddCountry { country: GERMANY })
        .unwrap();
    s.token.transfer(&w1, &w2, 1).unwrap();
}

#[test]
fn volume_limit_counts_committed_transfers_only() {
    let mut s = Suite::with(
        TokenConfig::new("Harbour Fund", "HBF", 0),
        vec![ModuleSpec::TransferVolumeLimit { limit: 100 }.build()],
    );
    let (w1, _) = s.investor("w1", FRANCE);
    let (w2, _) = s.investor("w2", FRANCE);
    s.token.mint(&s.agent, &w1, 1000).unwrap();

    s.token.transfer(&w1, &w2, 60).unwrap();
    s.token.set_address_frozen(&s.agent, &w2, true).unwrap();
    assert!(s.token.transfer(&w1, &w2, 30).is_err());
    s.token.set_address_frozen(&s.agent, &w2, false).unwrap();
    s.token.transfer(&w1, &w2, 40).unwrap();
    assert_eq!(
        s.token.transfer(&w1, &w2, 1).unwrap_err(),
        LedgerError::ComplianceRejected {
            module: "transfer_volume_limit".into()
        }
    );

    let owner = s.owner;
    let (module_id, _) = s.token.compliance().modules()[0];
    s.token
        .compliance_mut()
        .configure_module(&owner, &module_id, &ModuleCommand::ResetVolume { wallet: w1 })
        .unwrap();
    s.token.transfer(&w1, &w2, 1).unwrap();
}

#[test]
fn supply_limit_gates_mints_not_transfers() {
    let mut s = Suite::with(
        TokenConfig::new("Harbour Fund", "HBF", 0),
        vec![ModuleSpec::SupplyLimit { limit: 1000 }.build()],
    );
    let (w1, _) = s.investor("w1", FRANCE);
    let (w2, _) = s.investor("w2", FRANCE);
    s.token.mint(&s.agent, &w1, 1000).unwrap();
    assert_eq!(s.token.mint(&s.agent, &w2, 1).unwrap_err().kind(), ErrorKind::ComplianceRejected);
    s.token.transfer(&w1, &w2, 1000).unwrap();
    s.token.burn(&s.agent, &w2, 10).unwrap();
    s.token.mint(&s.agent, &w1, 10).unwrap();
}

#[test]
fn check_compliance_matches_what_transfer_would_do() {
    let mut s = Suite::with(
        TokenConfig::new("Harbour Fund", "HBF", 0),
        vec![ModuleSpec::MaxBalance { limit: 50 }.build()],
    );
    let (w1, _) = s.investor("w1", FRANCE);
    let (w2, _) = s.investor("w2", FRANCE);
    s.token.mint(&s.agent, &w1, 50).unwrap();
    assert!(s.token.check_compliance(&TransferIntent::transfer(w1, w2, 50)).is_ok());
    assert!(s.token.check_compliance(&TransferIntent::mint(w1, 1)).is_err());
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

#[test]
fn compliance_serves_exactly_one_token() {
    let mut s = Suite::new();
    let owner = s.owner;
    let mut fresh = ModularCompliance::new(owner);
    fresh.add_module(&owner, Box::new(SupplyLimitModule::new(5))).unwrap();
    let previous = s.token.set_compliance(&owner, fresh).unwrap();
    assert_eq!(previous.token_bound(), None);

    let (w1, _) = s.investor("w1", FRANCE);
    assert_eq!(s.token.mint(&s.agent, &w1, 6).unwrap_err().kind(), ErrorKind::ComplianceRejected);

    // A compliance already serving another token cannot be installed.
    let mut foreign = ModularCompliance::new(owner);
    foreign.bind_token(&owner, Address::from_label("token:OTHER")).unwrap();
    assert_eq!(
        s.token.set_compliance(&owner, foreign).unwrap_err().kind(),
        ErrorKind::InvariantViolation
    );
}
