//! # pal-identity — Identities, Keys, and Claims
//!
//! - **Keys** (`key.rs`): purpose-tagged keys identified by a digest of
//!   their material. Management keys satisfy every purpose.
//! - **Claims** (`claim.rs`): issuer-signed attestations, the canonical
//!   claim-signing payload, and the 96-byte claim signature.
//! - **Identity** (`identity.rs`): a key set plus a claim set, mutated only
//!   by its own authorized keys.
//! - **Claim issuer** (`issuer.rs`): an Identity that signs claims and can
//!   revoke them; exposes the claim-validity check used by the identity
//!   registry.
//!
//! The ledger only *verifies* claims. Issuance happens off-ledger with
//! [`sign_claim`].

pub mod claim;
pub mod identity;
pub mod issuer;
pub mod key;

pub use claim::{
    claim_digest, claim_signing_message, sign_claim, Claim, ClaimId, ClaimSignature,
    CLAIM_SIGNING_DOMAIN, SCHEME_ED25519,
};
pub use identity::Identity;
pub use issuer::{ClaimIssuer, ClaimRejection};
pub use key::{Key, KeyId, KeyPurpose, KeyType};
