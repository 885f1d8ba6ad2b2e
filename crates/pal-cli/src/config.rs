//! # Suite Configuration
//!
//! A token suite written down as YAML (or JSON): token metadata and policy,
//! required claim topics by label, the compliance stack in binding order,
//! and for scenarios the issuers, investors and steps to replay.
//!
//! Actors are named by label. A label maps to a wallet address through
//! [`Address::from_label`], so the same label always names the same wallet.
//! `owner` and `agent` are reserved for the suite's governance actors.

use std::collections::BTreeSet;
use std::path::Path;

use pal_compliance::{ModuleSpec, MAX_MODULES};
use pal_core::{Address, Amount, CountryCode};
use pal_registry::{MAX_CLAIM_TOPICS, MAX_ISSUER_TOPICS, MAX_TRUSTED_ISSUERS};
use pal_token::TokenConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Label of the actor that owns every component of the suite.
pub const OWNER_LABEL: &str = "owner";

/// Label of the actor holding agent rights on the token and registry.
pub const AGENT_LABEL: &str = "agent";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid suite: {0}")]
    Invalid(String),
}

/// Top-level suite document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteConfig {
    pub token: TokenConfig,
    /// Required claim topics, by label.
    #[serde(default)]
    pub claim_topics: Vec<String>,
    /// Compliance modules in binding order.
    #[serde(default)]
    pub compliance: Vec<ModuleSpec>,
    #[serde(default)]
    pub issuers: Vec<IssuerSpec>,
    #[serde(default)]
    pub investors: Vec<InvestorSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A claim issuer trusted for the listed topic labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssuerSpec {
    pub label: String,
    pub topics: Vec<String>,
}

/// An investor registered before the steps run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvestorSpec {
    pub label: String,
    pub country: CountryCode,
    /// Claims issued to the investor's identity at setup.
    #[serde(default)]
    pub claims: Vec<ClaimSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClaimSpec {
    pub topic: String,
    pub issuer: String,
}

/// One scenario step. Value movements and freezes run as the suite agent;
/// `transfer` runs as `from`; registry governance runs as the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    Mint { to: String, amount: Amount },
    Burn { from: String, amount: Amount },
    Transfer { from: String, to: String, amount: Amount },
    ForcedTransfer { from: String, to: String, amount: Amount },
    Freeze { wallet: String },
    Unfreeze { wallet: String },
    FreezePartial { wallet: String, amount: Amount },
    UnfreezePartial { wallet: String, amount: Amount },
    Pause,
    Unpause,
    AddTopic { topic: String },
    RemoveTopic { topic: String },
    RemoveIssuer { issuer: String },
    RevokeClaim { issuer: String, holder: String, topic: String },
    DeleteIdentity { wallet: String },
    /// `new` becomes a management key on `lost`'s identity, then the agent
    /// recovers `lost` into `new`.
    Recover { lost: String, new: String },
    AddModule { module: ModuleSpec },
}

impl Step {
    /// The `op` tag of this step.
    pub fn op(&self) -> &'static str {
        match self {
            Self::Mint { .. } => "mint",
            Self::Burn { .. } => "burn",
            Self::Transfer { .. } => "transfer",
            Self::ForcedTransfer { .. } => "forced_transfer",
            Self::Freeze { .. } => "freeze",
            Self::Unfreeze { .. } => "unfreeze",
            Self::FreezePartial { .. } => "freeze_partial",
            Self::UnfreezePartial { .. } => "unfreeze_partial",
            Self::Pause => "pause",
            Self::Unpause => "unpause",
            Self::AddTopic { .. } => "add_topic",
            Self::RemoveTopic { .. } => "remove_topic",
            Self::RemoveIssuer { .. } => "remove_issuer",
            Self::RevokeClaim { .. } => "revoke_claim",
            Self::DeleteIdentity { .. } => "delete_identity",
            Self::Recover { .. } => "recover",
            Self::AddModule { .. } => "add_module",
        }
    }

    fn issuer_label(&self) -> Option<&str> {
        match self {
            Self::RemoveIssuer { issuer } | Self::RevokeClaim { issuer, .. } => Some(issuer),
            _ => None,
        }
    }
}

impl SuiteConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Read a suite file. `.json` files parse as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    /// Check the suite against the ledger's structural limits and make sure
    /// every label it references is declared.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.token
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("token: {e}")))?;

        unique("claim topic", self.claim_topics.iter())?;
        if self.claim_topics.len() > MAX_CLAIM_TOPICS {
            return Err(invalid(format!(
                "{} claim topics exceed the limit of {MAX_CLAIM_TOPICS}",
                self.claim_topics.len()
            )));
        }
        if self.compliance.len() > MAX_MODULES {
            return Err(invalid(format!(
                "{} compliance modules exceed the limit of {MAX_MODULES}",
                self.compliance.len()
            )));
        }

        let issuers = unique("issuer", self.issuers.iter().map(|i| &i.label))?;
        if issuers.len() > MAX_TRUSTED_ISSUERS {
            return Err(invalid(format!(
                "{} issuers exceed the limit of {MAX_TRUSTED_ISSUERS}",
                issuers.len()
            )));
        }
        for issuer in &self.issuers {
            reject_reserved(&issuer.label)?;
            unique("topic of issuer", issuer.topics.iter())?;
            if issuer.topics.is_empty() || issuer.topics.len() > MAX_ISSUER_TOPICS {
                return Err(invalid(format!(
                    "issuer {} must be trusted for 1..={MAX_ISSUER_TOPICS} topics",
                    issuer.label
                )));
            }
        }

        unique("investor", self.investors.iter().map(|i| &i.label))?;
        for investor in &self.investors {
            reject_reserved(&investor.label)?;
            for claim in &investor.claims {
                if !issuers.contains(claim.issuer.as_str()) {
                    return Err(invalid(format!(
                        "investor {} holds a claim from undeclared issuer {}",
                        investor.label, claim.issuer
                    )));
                }
            }
        }

        for (index, step) in self.steps.iter().enumerate() {
            if let Some(issuer) = step.issuer_label() {
                if !issuers.contains(issuer) {
                    return Err(invalid(format!(
                        "step {} ({}) names undeclared issuer {issuer}",
                        index + 1,
                        step.op()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Wallet address of a labelled actor.
pub fn wallet(label: &str) -> Address {
    Address::from_label(label)
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::Invalid(msg)
}

fn unique<'a>(what: &str, labels: impl Iterator<Item = &'a String>) -> Result<BTreeSet<&'a str>, ConfigError> {
    let mut seen = BTreeSet::new();
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(invalid(format!("duplicate {what} {label}")));
        }
    }
    Ok(seen)
}

fn reject_reserved(label: &str) -> Result<(), ConfigError> {
    if label == OWNER_LABEL || label == AGENT_LABEL {
        return Err(invalid(format!("label {label} is reserved")));
    }
    Ok(())
}
