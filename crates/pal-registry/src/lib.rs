//! # pal-registry — Eligibility Registries
//!
//! The trust graph that decides who may hold a permissioned asset, kept as
//! plain lookup tables:
//!
//! - **Claim topics** (`topics.rs`): the topics every holder must satisfy.
//! - **Trusted issuers** (`issuers.rs`): issuer identity → topics it may attest.
//! - **Storage** (`storage.rs`): wallet → (identity, country), shareable
//!   between several identity registries.
//! - **Identity registry** (`registry.rs`): the eligibility oracle combining
//!   the three above into `is_verified(wallet)`.
//!
//! ## Crate Policy
//!
//! - Nothing here caches a verification result. Every `is_verified` call
//!   re-reads the current registries, identity claims and issuer keys, so a
//!   removed issuer or topic takes effect on the very next evaluation.
//! - Batch writes are validated in full before the first record is written.
//! - Registries reference identities and issuers through [`pal_core::Shared`]
//!   handles; they never own them.

pub mod issuers;
pub mod registry;
pub mod storage;
pub mod topics;

pub use issuers::{TrustedIssuersRegistry, MAX_ISSUER_TOPICS, MAX_TRUSTED_ISSUERS};
pub use registry::IdentityRegistry;
pub use storage::{IdentityRecord, IdentityRegistryStorage, StoredIdentity, MAX_BOUND_REGISTRIES};
pub use topics::{ClaimTopicsRegistry, MAX_CLAIM_TOPICS};
