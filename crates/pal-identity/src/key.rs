//! # Identity Keys
//!
//! An Identity holds a set of keys. Each key is identified by a [`KeyId`]
//! (a digest of its material) and carries one or more [`KeyPurpose`]s.
//!
//! A management key implicitly satisfies every purpose check, so the wallet
//! that created an Identity can add claims to it without first granting
//! itself a claim key.

use std::collections::BTreeSet;

use pal_core::{Address, ContentDigest};
use pal_crypto::Ed25519PublicKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// What a key may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum KeyPurpose {
    /// Manage the identity's keys.
    Management = 1,
    /// Act on behalf of the identity.
    Action = 2,
    /// Sign claims (claim issuers) or add claims (holders).
    ClaimSigning = 3,
    /// Encrypt data addressed to the identity.
    Encryption = 4,
}

impl KeyPurpose {
    /// The numeric purpose code.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// The kind of key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum KeyType {
    /// An Ed25519 public key able to verify claim signatures.
    Ed25519 = 1,
    /// A wallet address acting as a key.
    Address = 2,
}

impl KeyType {
    /// The numeric key type code.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// Digest identifying a key on an Identity: SHA-256 over a per-type tag
/// followed by the fixed-width key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyId(pub ContentDigest);

impl KeyId {
    /// Key identifier of a wallet address.
    pub fn for_wallet(wallet: &Address) -> Self {
        Self(tagged_digest(b"pal:key:wallet:", wallet.as_bytes()))
    }

    /// Key identifier of an Ed25519 public key.
    pub fn for_public_key(public_key: &Ed25519PublicKey) -> Self {
        Self(tagged_digest(b"pal:key:ed25519:", public_key.as_bytes()))
    }
}

impl std::fmt::Display for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "key:{}", &self.0.to_hex()[..16])
    }
}

fn tagged_digest(tag: &[u8], material: &[u8]) -> ContentDigest {
    let hash = Sha256::new().chain_update(tag).chain_update(material).finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest::from_bytes(bytes)
}

/// A key registered on an Identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    /// Digest of the key material.
    pub id: KeyId,
    /// Purposes this key holds. Never empty while the key is registered.
    pub purposes: BTreeSet<KeyPurpose>,
    /// Kind of key material.
    pub key_type: KeyType,
    /// Verifying key, present for `KeyType::Ed25519`.
    pub public_key: Option<Ed25519PublicKey>,
}

impl Key {
    /// A wallet-address key with a single purpose.
    pub fn wallet(wallet: &Address, purpose: KeyPurpose) -> Self {
        Self {
            id: KeyId::for_wallet(wallet),
            purposes: BTreeSet::from([purpose]),
            key_type: KeyType::Address,
            public_key: None,
        }
    }

    /// An Ed25519 key with a single purpose.
    pub fn ed25519(public_key: Ed25519PublicKey, purpose: KeyPurpose) -> Self {
        Self {
            id: KeyId::for_public_key(&public_key),
            purposes: BTreeSet::from([purpose]),
            key_type: KeyType::Ed25519,
            public_key: Some(public_key),
        }
    }

    /// Whether the key satisfies `purpose` (directly or as a management key).
    pub fn has_purpose(&self, purpose: KeyPurpose) -> bool {
        self.purposes.contains(&KeyPurpose::Management) || self.purposes.contains(&purpose)
    }
}
