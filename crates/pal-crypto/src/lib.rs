//! # pal-crypto — Cryptographic Primitives
//!
//! Claim issuers sign claims with Ed25519 keys registered on their Identity
//! under the claim-signing purpose; the identity registry verifies those
//! signatures on every eligibility check.
//!
//! ## Crate Policy
//!
//! - Depends only on `pal-core` internally.
//! - Signing and verification accept only `&CanonicalBytes`.
//! - No mocking of cryptographic operations in tests.

pub mod ed25519;

pub use ed25519::{verify, verify_with_public_key, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
