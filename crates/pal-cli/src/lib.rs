//! # pal-cli
//!
//! Library half of the `pal` binary.
//!
//! ## Subcommands
//!
//! - `pal check <suite>`: parse and validate a suite file, print what it declares.
//! - `pal simulate <scenario>`: build the suite in memory, replay its steps,
//!   print per-step outcomes and the final ledger state.
//!
//! ```bash
//! pal check crates/pal-cli/scenarios/harbour-fund.yaml
//! pal -v simulate --json crates/pal-cli/scenarios/harbour-fund.yaml
//! ```

pub mod check;
pub mod config;
pub mod simulate;

pub use config::{ConfigError, Step, SuiteConfig};
pub use simulate::{simulate, Simulation, SimulationError, SimulationReport, StepOutcome};
