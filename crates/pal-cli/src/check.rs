//! # `pal check`
//!
//! Parse and validate a suite file, then print what it declares.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::config::SuiteConfig;

/// `pal check` arguments.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Suite file (YAML, or JSON with a `.json` extension).
    pub path: PathBuf,
}

/// What a valid suite declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub start_paused: bool,
    pub claim_topics: Vec<String>,
    /// Module names in binding order.
    pub modules: Vec<&'static str>,
    pub issuers: usize,
    pub investors: usize,
    pub steps: usize,
}

pub fn summarize(config: &SuiteConfig) -> CheckSummary {
    CheckSummary {
        name: config.token.name.clone(),
        symbol: config.token.symbol.clone(),
        decimals: config.token.decimals,
        start_paused: config.token.start_paused,
        claim_topics: config.claim_topics.clone(),
        modules: config.compliance.iter().map(|m| m.name()).collect(),
        issuers: config.issuers.len(),
        investors: config.investors.len(),
        steps: config.steps.len(),
    }
}

/// Execute `pal check`. Returns exit code 1 when the suite is invalid.
pub fn run_check(args: &CheckArgs, json: bool) -> Result<u8> {
    let config = SuiteConfig::load(&args.path).with_context(|| format!("loading {}", args.path.display()))?;
    if let Err(e) = config.validate() {
        if json {
            println!("{}", serde_json::json!({ "valid": false, "error": e.to_string() }));
        } else {
            println!("INVALID {}: {e}", args.path.display());
        }
        return Ok(1);
    }

    let summary = summarize(&config);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(0);
    }
    println!("OK {}", args.path.display());
    println!("  token:        {} ({}), {} decimals", summary.name, summary.symbol, summary.decimals);
    if summary.start_paused {
        println!("  starts paused");
    }
    println!("  claim topics: {}", list(&summary.claim_topics));
    println!("  compliance:   {}", list(&summary.modules));
    println!(
        "  actors:       {} issuers, {} investors; {} steps",
        summary.issuers, summary.investors, summary.steps
    );
    Ok(0)
}

fn list<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.iter().map(|s| s.as_ref()).collect::<Vec<&str>>().join(", ")
    }
}
