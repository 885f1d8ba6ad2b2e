//! # Scenario Simulation
//!
//! Builds a complete in-memory suite from a [`SuiteConfig`], issues the
//! declared claims with deterministic issuer keys, replays the steps, and
//! reports per-step outcomes plus the final ledger state.
//!
//! Issuer keys are derived from `SHA-256("pal:issuer-key:" || label)`, so a
//! scenario produces the same signatures on every run.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pal_compliance::ModularCompliance;
use pal_core::error::CanonicalizationError;
use pal_core::{shared, Address, Amount, ClaimTopic, IdentityId, LedgerError, Shared};
use pal_crypto::Ed25519KeyPair;
use pal_identity::{sign_claim, Claim, ClaimIssuer, Identity, Key, KeyId, KeyPurpose, SCHEME_ED25519};
use pal_registry::{ClaimTopicsRegistry, IdentityRegistry, IdentityRegistryStorage, TrustedIssuersRegistry};
use pal_token::Token;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::{wallet, SuiteConfig, Step, AGENT_LABEL, OWNER_LABEL};

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("claim encoding failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    #[error("unknown issuer {0}")]
    UnknownIssuer(String),

    #[error("unknown investor {0}")]
    UnknownInvestor(String),

    #[error("{holder} holds no {topic} claim from {issuer}")]
    UnknownClaim {
        issuer: String,
        holder: String,
        topic: String,
    },
}

impl SimulationError {
    /// Error kind label used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.kind().as_str(),
            Self::Canonicalization(_) => "canonicalization",
            Self::UnknownIssuer(_) | Self::UnknownInvestor(_) | Self::UnknownClaim { .. } => "unresolved",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    /// 1-based position in the scenario.
    pub index: usize,
    pub op: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final state after a scenario ran.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub token: String,
    pub steps: Vec<StepOutcome>,
    /// Non-zero balances by actor label.
    pub balances: BTreeMap<String, Amount>,
    pub total_supply: Amount,
    pub paused: bool,
    /// Verification status of every investor label.
    pub verified: BTreeMap<String, bool>,
    pub frozen: Vec<String>,
    pub events: usize,
}

impl SimulationReport {
    /// Number of steps that were rejected.
    pub fn rejected(&self) -> usize {
        self.steps.iter().filter(|s| !s.ok).count()
    }
}

struct SimIssuer {
    admin: Address,
    key: Ed25519KeyPair,
    handle: Shared<ClaimIssuer>,
    id: IdentityId,
}

/// A running suite.
pub struct Simulation {
    owner: Address,
    agent: Address,
    registry: Shared<IdentityRegistry>,
    topics: Shared<ClaimTopicsRegistry>,
    trusted: Shared<TrustedIssuersRegistry>,
    issuers: BTreeMap<String, SimIssuer>,
    identities: BTreeMap<String, Shared<Identity>>,
    labels: BTreeMap<Address, String>,
    token: Token,
}

impl Simulation {
    /// Wire registries, compliance and token, then register investors and
    /// issue their claims.
    pub fn build(config: &SuiteConfig) -> Result<Self, SimulationError> {
        let owner = wallet(OWNER_LABEL);
        let agent = wallet(AGENT_LABEL);
        let token_address = wallet(&format!("token:{}", config.token.symbol));
        let registry_address = wallet(&format!("identity-registry:{}", config.token.symbol));

        let storage = shared(IdentityRegistryStorage::new(owner));
        storage.write().bind_identity_registry(&owner, registry_address)?;

        let topics = shared(ClaimTopicsRegistry::new(owner));
        for label in &config.claim_topics {
            topics.write().add_claim_topic(&owner, ClaimTopic::from_label(label))?;
        }

        let trusted = shared(TrustedIssuersRegistry::new(owner));
        let mut issuers = BTreeMap::new();
        for spec in &config.issuers {
            let admin = wallet(&spec.label);
            let key = issuer_key(&spec.label);
            let mut claim_issuer = ClaimIssuer::new(&admin);
            claim_issuer.add_signing_key(&admin, key.public_key())?;
            let handle = shared(claim_issuer);
            let topic_ids: Vec<ClaimTopic> = spec.topics.iter().map(|t| ClaimTopic::from_label(t)).collect();
            let id = trusted.write().add_trusted_issuer(&owner, handle.clone(), &topic_ids)?;
            issuers.insert(
                spec.label.clone(),
                SimIssuer {
                    admin,
                    key,
                    handle,
                    id,
                },
            );
        }

        let mut registry = IdentityRegistry::new(registry_address, owner, storage, topics.clone(), trusted.clone());
        registry.add_agent(&owner, agent)?;
        registry.add_agent(&owner, token_address)?;
        let registry = shared(registry);

        let mut compliance = ModularCompliance::new(owner);
        for spec in &config.compliance {
            compliance.add_module(&owner, spec.build())?;
        }

        let mut token = Token::new(token_address, owner, config.token.clone(), registry.clone(), compliance)?;
        token.add_agent(&owner, agent)?;

        let mut sim = Self {
            owner,
            agent,
            registry,
            topics,
            trusted,
            issuers,
            identities: BTreeMap::new(),
            labels: BTreeMap::new(),
            token,
        };
        sim.labels.insert(owner, OWNER_LABEL.to_string());
        sim.labels.insert(agent, AGENT_LABEL.to_string());

        for investor in &config.investors {
            let address = sim.actor(&investor.label);
            let identity = shared(Identity::new(&address));
            sim.registry
                .read()
                .register_identity(&agent, address, identity.clone(), investor.country)?;
            for claim in &investor.claims {
                sim.issue(&address, &identity, &claim.issuer, &claim.topic)?;
            }
            sim.identities.insert(investor.label.clone(), identity);
        }
        tracing::info!(
            token = %token_address,
            investors = config.investors.len(),
            issuers = config.issuers.len(),
            modules = config.compliance.len(),
            "suite built"
        );
        Ok(sim)
    }

    /// Replay `steps`, recording each outcome. A rejected step leaves the
    /// suite unchanged and the replay continues.
    pub fn run(&mut self, steps: &[Step]) -> Vec<StepOutcome> {
        steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let result = self.apply(step);
                if let Err(e) = &result {
                    tracing::info!(step = i + 1, op = step.op(), error = %e, "step rejected");
                }
                StepOutcome {
                    index: i + 1,
                    op: step.op(),
                    ok: result.is_ok(),
                    kind: result.as_ref().err().map(SimulationError::kind),
                    error: result.err().map(|e| e.to_string()),
                }
            })
            .collect()
    }

    /// Apply a single step.
    pub fn apply(&mut self, step: &Step) -> Result<(), SimulationError> {
        let agent = self.agent;
        let owner = self.owner;
        match step {
            Step::Mint { to, amount } => {
                let to = self.actor(to);
                self.token.mint(&agent, &to, *amount)?;
            }
            Step::Burn { from, amount } => {
                let from = self.actor(from);
                self.token.burn(&agent, &from, *amount)?;
            }
            Step::Transfer { from, to, amount } => {
                let (from, to) = (self.actor(from), self.actor(to));
                self.token.transfer(&from, &to, *amount)?;
            }
            Step::ForcedTransfer { from, to, amount } => {
                let (from, to) = (self.actor(from), self.actor(to));
                self.token.forced_transfer(&agent, &from, &to, *amount)?;
            }
            Step::Freeze { wallet } => {
                let wallet = self.actor(wallet);
                self.token.set_address_frozen(&agent, &wallet, true)?;
            }
            Step::Unfreeze { wallet } => {
                let wallet = self.actor(wallet);
                self.token.set_address_frozen(&agent, &wallet, false)?;
            }
            Step::FreezePartial { wallet, amount } => {
                let wallet = self.actor(wallet);
                self.token.freeze_partial_tokens(&agent, &wallet, *amount)?;
            }
            Step::UnfreezePartial { wallet, amount } => {
                let wallet = self.actor(wallet);
                self.token.unfreeze_partial_tokens(&agent, &wallet, *amount)?;
            }
            Step::Pause => self.token.pause(&agent)?,
            Step::Unpause => self.token.unpause(&agent)?,
            Step::AddTopic { topic } => {
                self.topics.write().add_claim_topic(&owner, ClaimTopic::from_label(topic))?;
            }
            Step::RemoveTopic { topic } => {
                self.topics
                    .write()
                    .remove_claim_topic(&owner, ClaimTopic::from_label(topic))?;
            }
            Step::RemoveIssuer { issuer } => {
                let id = self.issuer(issuer)?.id;
                self.trusted.write().remove_trusted_issuer(&owner, &id)?;
            }
            Step::RevokeClaim { issuer, holder, topic } => self.revoke(issuer, holder, topic)?,
            Step::DeleteIdentity { wallet } => {
                let wallet = self.actor(wallet);
                self.registry.read().delete_identity(&agent, &wallet)?;
            }
            Step::Recover { lost, new } => {
                let identity = self
                    .identities
                    .get(lost)
                    .cloned()
                    .ok_or_else(|| SimulationError::UnknownInvestor(lost.clone()))?;
                let (lost_wallet, new_wallet) = (self.actor(lost), self.actor(new));
                let key_added = !identity.read().wallet_has_purpose(&new_wallet, KeyPurpose::Management);
                if key_added {
                    identity
                        .write()
                        .add_key(&lost_wallet, Key::wallet(&new_wallet, KeyPurpose::Management))?;
                }
                if let Err(e) = self
                    .token
                    .recovery_address(&agent, &lost_wallet, &new_wallet, &identity)
                {
                    if key_added {
                        let key_id = KeyId::for_wallet(&new_wallet);
                        if let Err(undo) = identity
                            .write()
                            .remove_key(&lost_wallet, &key_id, KeyPurpose::Management)
                        {
                            tracing::warn!(%new_wallet, error = %undo, "recovery key rollback failed");
                        }
                    }
                    return Err(e.into());
                }
                self.identities.insert(new.clone(), identity);
            }
            Step::AddModule { module } => {
                self.token.compliance_mut().add_module(&owner, module.build())?;
            }
        }
        Ok(())
    }

    /// Snapshot the ledger into a report.
    pub fn report(&self, steps: Vec<StepOutcome>) -> SimulationReport {
        let balances = self
            .token
            .balances()
            .iter()
            .map(|(address, amount)| (self.label_of(address), *amount))
            .collect();
        let verified = self
            .identities
            .keys()
            .map(|label| (label.clone(), self.token.is_verified(&wallet(label))))
            .collect();
        let frozen = self
            .labels
            .iter()
            .filter(|(address, _)| self.token.is_frozen(address))
            .map(|(_, label)| label.clone())
            .collect();
        SimulationReport {
            token: self.token.symbol().to_string(),
            steps,
            balances,
            total_supply: self.token.total_supply(),
            paused: self.token.is_paused(),
            verified,
            frozen,
            events: self.token.events().len(),
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    fn actor(&mut self, label: &str) -> Address {
        let address = wallet(label);
        self.labels.entry(address).or_insert_with(|| label.to_string());
        address
    }

    fn label_of(&self, address: &Address) -> String {
        self.labels
            .get(address)
            .cloned()
            .unwrap_or_else(|| address.to_hex())
    }

    fn issuer(&self, label: &str) -> Result<&SimIssuer, SimulationError> {
        self.issuers
            .get(label)
            .ok_or_else(|| SimulationError::UnknownIssuer(label.to_string()))
    }

    fn issue(&self, holder: &Address, identity: &Shared<Identity>, issuer: &str, topic: &str) -> Result<(), SimulationError> {
        let issuer = self.issuer(issuer)?;
        let topic = ClaimTopic::from_label(topic);
        let identity_id = identity.read().id();
        let data = format!("{topic}:{identity_id}").into_bytes();
        let claim = Claim {
            topic,
            scheme: SCHEME_ED25519,
            issuer: issuer.id,
            signature: sign_claim(&issuer.key, &identity_id, topic, &data)?,
            data,
            uri: format!("pal://claims/{}", issuer.id),
        };
        identity.write().add_claim(holder, claim)?;
        Ok(())
    }

    fn revoke(&self, issuer_label: &str, holder: &str, topic_label: &str) -> Result<(), SimulationError> {
        let issuer = self.issuer(issuer_label)?;
        let identity = self
            .identities
            .get(holder)
            .ok_or_else(|| SimulationError::UnknownInvestor(holder.to_string()))?;
        let topic = ClaimTopic::from_label(topic_label);
        let signature = identity
            .read()
            .claims()
            .find(|c| c.issuer == issuer.id && c.topic == topic)
            .map(|c| c.signature)
            .ok_or_else(|| SimulationError::UnknownClaim {
                issuer: issuer_label.to_string(),
                holder: holder.to_string(),
                topic: topic_label.to_string(),
            })?;
        issuer.handle.write().revoke_claim(&issuer.admin, &signature)?;
        Ok(())
    }
}

/// Deterministic issuer signing key for `label`.
pub fn issuer_key(label: &str) -> Ed25519KeyPair {
    let hash = Sha256::new()
        .chain_update(b"pal:issuer-key:")
        .chain_update(label.as_bytes())
        .finalize();
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&hash);
    Ed25519KeyPair::from_seed(&seed)
}

/// Build a suite from `config` and replay its steps.
pub fn simulate(config: &SuiteConfig) -> Result<SimulationReport, SimulationError> {
    let mut sim = Simulation::build(config)?;
    let steps = sim.run(&config.steps);
    Ok(sim.report(steps))
}

/// `pal simulate` arguments.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Scenario file (YAML, or JSON with a `.json` extension).
    pub path: PathBuf,
}

/// Execute `pal simulate`.
pub fn run_simulate(args: &SimulateArgs, json: bool) -> Result<u8> {
    let config = SuiteConfig::load(&args.path).with_context(|| format!("loading {}", args.path.display()))?;
    config.validate()?;
    let report = simulate(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(0);
    }
    println!("Scenario {} ({} steps)", report.token, report.steps.len());
    for step in &report.steps {
        match (&step.kind, &step.error) {
            (Some(kind), Some(error)) => println!("  #{:<3} {:<18} REJECTED [{kind}] {error}", step.index, step.op),
            _ => println!("  #{:<3} {:<18} ok", step.index, step.op),
        }
    }
    println!();
    println!("Total supply: {}{}", report.total_supply, if report.paused { " (paused)" } else { "" });
    for (label, balance) in &report.balances {
        println!("  {label:<20} {balance}");
    }
    for (label, verified) in &report.verified {
        println!("  {label:<20} {}", if *verified { "verified" } else { "NOT verified" });
    }
    Ok(0)
}
