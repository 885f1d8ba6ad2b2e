//! # pal-core — Foundational Types for the Permissioned Asset Ledger
//!
//! Every other crate in the workspace depends on `pal-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for ledger primitives.** `Address`, `IdentityId`,
//!    `ClaimTopic`, `CountryCode`, `ModuleId`, `ComplianceId` are distinct
//!    types. A wallet address cannot be passed where an identity reference is
//!    expected.
//!
//! 2. **`CanonicalBytes` newtype.** Every byte sequence that gets hashed or
//!    signed (claim payloads, key identifiers) flows through
//!    `CanonicalBytes::new()`.
//!
//! 3. **One error taxonomy.** `LedgerError` carries the six rejection kinds
//!    every value-moving or administrative operation can report. Callers match
//!    on [`ErrorKind`].
//!
//! 4. **Capabilities, not roles.** [`AccessControl`] holds an owner plus a flat
//!    agent set. There is no role hierarchy.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `pal-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod access;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod shared;

pub use access::AccessControl;
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest};
pub use error::{Capability, ErrorKind, LedgerError, LedgerResult};
pub use identity::{Address, Amount, ClaimTopic, ComplianceId, CountryCode, IdentityId, ModuleId};
pub use shared::{shared, Shared};
