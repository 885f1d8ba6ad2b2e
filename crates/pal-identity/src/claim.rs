//! # Claims and the Claim-Signing Payload
//!
//! A claim is an issuer's signed assertion that an identity satisfies a
//! topic. The signature covers a deterministic encoding of
//! `(identity, topic, data)`:
//!
//! ```text
//! digest  = SHA-256( JCS({"data": hex(data), "identity": uuid, "topic": "<decimal>"}) )
//! message = JCS({"digest": hex(digest), "domain": "pal-claim-v1"})
//! ```
//!
//! The issuer signs `message` with an Ed25519 key registered under the
//! claim-signing purpose on its own Identity. A [`ClaimSignature`] carries
//! the signer's public key next to the signature, which lets the verifier
//! recover the signer and look it up in the issuer's key registry.

use pal_core::error::{CanonicalizationError, CryptoError};
use pal_core::{sha256_digest, CanonicalBytes, ClaimTopic, ContentDigest, IdentityId};
use pal_crypto::{verify_with_public_key, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use serde::{Deserialize, Serialize};

/// Domain tag mixed into every claim-signing message.
pub const CLAIM_SIGNING_DOMAIN: &str = "pal-claim-v1";

/// Claim scheme code for Ed25519 signatures.
pub const SCHEME_ED25519: u32 = 1;

/// Identifier of a claim on an Identity: one slot per `(issuer, topic)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClaimId(pub ContentDigest);

impl ClaimId {
    /// The slot a claim from `issuer` about `topic` occupies.
    pub fn for_issuer_topic(issuer: &IdentityId, topic: ClaimTopic) -> Result<Self, CanonicalizationError> {
        let cb = CanonicalBytes::new(&serde_json::json!({
            "issuer": issuer.0.to_string(),
            "topic": topic.0.to_string(),
        }))?;
        Ok(Self(sha256_digest(&cb)))
    }
}

impl std::fmt::Display for ClaimId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "claim:{}", &self.0.to_hex()[..16])
    }
}

/// Signer public key plus Ed25519 signature (96 bytes on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimSignature {
    /// Public key that produced `signature`.
    pub signer: Ed25519PublicKey,
    /// Signature over the claim-signing message.
    pub signature: Ed25519Signature,
}

impl ClaimSignature {
    /// Wire length: 32-byte public key followed by 64-byte signature.
    pub const LEN: usize = 96;

    /// Encode as `signer || signature`.
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[..32].copy_from_slice(self.signer.as_bytes());
        out[32..].copy_from_slice(self.signature.as_bytes());
        out
    }

    /// Decode from `signer || signature`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != Self::LEN {
            return Err(CryptoError::VerificationFailed(format!(
                "claim signature must be {} bytes, got {}",
                Self::LEN,
                bytes.len()
            )));
        }
        let mut signer = [0u8; 32];
        signer.copy_from_slice(&bytes[..32]);
        let mut signature = [0u8; 64];
        signature.copy_from_slice(&bytes[32..]);
        Ok(Self {
            signer: Ed25519PublicKey::from_bytes(signer),
            signature: Ed25519Signature::from_bytes(signature),
        })
    }

    /// Check the signature against the claim-signing message for
    /// `(identity, topic, data)`. Does not consult any key registry.
    pub fn verify(&self, identity: &IdentityId, topic: ClaimTopic, data: &[u8]) -> Result<(), CryptoError> {
        let message = claim_signing_message(identity, topic, data)
            .map_err(|e| CryptoError::VerificationFailed(e.to_string()))?;
        verify_with_public_key(&message, &self.signature, &self.signer)
    }
}

/// A signed attestation held by an Identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// The attested topic.
    pub topic: ClaimTopic,
    /// Signature scheme code.
    pub scheme: u32,
    /// Identity of the issuer that signed the claim.
    pub issuer: IdentityId,
    /// Issuer signature over the claim-signing message.
    pub signature: ClaimSignature,
    /// Claim payload (opaque to the ledger).
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    /// Off-ledger location of supporting material.
    pub uri: String,
}

impl Claim {
    /// The slot this claim occupies on an Identity.
    pub fn id(&self) -> Result<ClaimId, CanonicalizationError> {
        ClaimId::for_issuer_topic(&self.issuer, self.topic)
    }
}

/// Digest of the canonical `(identity, topic, data)` encoding.
pub fn claim_digest(
    identity: &IdentityId,
    topic: ClaimTopic,
    data: &[u8],
) -> Result<ContentDigest, CanonicalizationError> {
    let cb = CanonicalBytes::new(&serde_json::json!({
        "identity": identity.0.to_string(),
        "topic": topic.0.to_string(),
        "data": hex_bytes::encode(data),
    }))?;
    Ok(sha256_digest(&cb))
}

/// The canonical message an issuer signs for `(identity, topic, data)`.
pub fn claim_signing_message(
    identity: &IdentityId,
    topic: ClaimTopic,
    data: &[u8],
) -> Result<CanonicalBytes, CanonicalizationError> {
    let digest = claim_digest(identity, topic, data)?;
    CanonicalBytes::new(&serde_json::json!({
        "domain": CLAIM_SIGNING_DOMAIN,
        "digest": digest.to_hex(),
    }))
}

/// Sign `(identity, topic, data)` with an issuer key.
///
/// Issuance happens off-ledger; this helper is what an issuer's tooling
/// calls before handing the claim to the holder.
pub fn sign_claim(
    key: &Ed25519KeyPair,
    identity: &IdentityId,
    topic: ClaimTopic,
    data: &[u8],
) -> Result<ClaimSignature, CanonicalizationError> {
    let message = claim_signing_message(identity, topic, data)?;
    Ok(ClaimSignature {
        signer: key.public_key(),
        signature: key.sign(&message),
    })
}

pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.len() % 2 != 0 {
            return Err(serde::de::Error::custom("hex string must have even length"));
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(serde::de::Error::custom("hex string contains a non-hex character"));
        }
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(serde::de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer_key() -> Ed25519KeyPair {
        Ed25519KeyPair::from_seed(&[9u8; 32])
    }

    #[test]
    fn signature_verifies_for_the_signed_triple() {
        let identity = IdentityId::new();
        let topic = ClaimTopic::from_label("KYC");
        let sig = sign_claim(&issuer_key(), &identity, topic, b"Some claim public data.").unwrap();
        sig.verify(&identity, topic, b"Some claim public data.").unwrap();
    }

    #[test]
    fn signature_is_bound_to_identity_topic_and_data() {
        let identity = IdentityId::new();
        let topic = ClaimTopic::from_label("KYC");
        let sig = sign_claim(&issuer_key(), &identity, topic, b"data").unwrap();

        assert!(sig.verify(&IdentityId::new(), topic, b"data").is_err());
        assert!(sig.verify(&identity, ClaimTopic::from_label("AML"), b"data").is_err());
        assert!(sig.verify(&identity, topic, b"other").is_err());
    }

    #[test]
    fn wire_encoding_roundtrips_and_checks_length() {
        let sig = sign_claim(&issuer_key(), &IdentityId::new(), ClaimTopic(1), b"").unwrap();
        let bytes = sig.to_bytes();
        assert_eq!(ClaimSignature::from_bytes(&bytes).unwrap(), sig);
        assert!(ClaimSignature::from_bytes(&bytes[..95]).is_err());
    }

    #[test]
    fn claim_id_depends_only_on_issuer_and_topic() {
        let issuer = IdentityId::new();
        let a = ClaimId::for_issuer_topic(&issuer, ClaimTopic(5)).unwrap();
        let b = ClaimId::for_issuer_topic(&issuer, ClaimTopic(5)).unwrap();
        let c = ClaimId::for_issuer_topic(&issuer, ClaimTopic(6)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn claim_data_serializes_as_hex() {
        let claim = Claim {
            topic: ClaimTopic(1),
            scheme: SCHEME_ED25519,
            issuer: IdentityId::new(),
            signature: sign_claim(&issuer_key(), &IdentityId::new(), ClaimTopic(1), b"ab").unwrap(),
            data: vec![0xab, 0x01],
            uri: String::new(),
        };
        let json = serde_json::to_value(&claim).unwrap();
        assert_eq!(json["data"], "ab01");
        let back: Claim = serde_json::from_value(json).unwrap();
        assert_eq!(back, claim);
    }

    #[test]
    fn claim_data_rejects_non_hex_text() {
        let claim = Claim {
            topic: ClaimTopic(1),
            scheme: SCHEME_ED25519,
            issuer: IdentityId::new(),
            signature: sign_claim(&issuer_key(), &IdentityId::new(), ClaimTopic(1), b"ab").unwrap(),
            data: vec![0xab],
            uri: String::new(),
        };
        let mut json = serde_json::to_value(&claim).unwrap();
        for bad in ["a\u{e9}b", "+a", "zz"] {
            json["data"] = serde_json::Value::from(bad);
            assert!(serde_json::from_value::<Claim>(json.clone()).is_err(), "{bad:?}");
        }
    }
}
