//! # Shared Component Handles
//!
//! Identities, claim issuers, and registries are *referenced* by several
//! components and owned by none of them. They live behind
//! `Arc<parking_lot::RwLock<T>>`: eligibility and compliance queries take
//! read locks and observe a consistent snapshot; administrative mutations
//! take the write lock and complete before releasing it.
//!
//! Lock order, whenever more than one is held: identity registry, registry
//! storage, identity, topics registry, issuers registry, claim issuer.

use std::sync::Arc;

use parking_lot::RwLock;

/// A reference-counted, read/write-locked component.
pub type Shared<T> = Arc<RwLock<T>>;

/// Wrap a component in a [`Shared`] handle.
pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}
