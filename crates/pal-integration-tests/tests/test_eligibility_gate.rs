//! # Eligibility Gate
//!
//! Trust-registry changes take effect on the very next token operation:
//! issuer removal, claim revocation, topic changes, identity deletion and
//! key rotation on the issuer side. Also covers storage shared between two
//! registries and batch registration atomicity as seen by the token.

mod common;

use common::{Issuer, Suite, FRANCE, GERMANY};
use pal_core::{shared, Address, ClaimTopic, ErrorKind};
use pal_identity::{Identity, KeyId, KeyPurpose};
use pal_registry::IdentityRegistry;

// ---------------------------------------------------------------------------
// Trust changes are immediate
// ---------------------------------------------------------------------------

#[test]
fn removing_the_issuer_unverifies_holders_immediately() {
    let mut s = Suite::new();
    let (w1, _) = s.investor("w1", FRANCE);
    let (w2, _) = s.investor("w2", FRANCE);
    s.token.mint(&s.agent, &w1, 100).unwrap();
    assert!(s.token.is_verified(&w2));

    s.issuers
        .write()
        .remove_trusted_issuer(&s.owner, &s.kyc_issuer_id)
        .unwrap();

    assert!(!s.token.is_verified(&w2));
    assert_eq!(s.token.transfer(&w1, &w2, 1).unwrap_err().kind(), ErrorKind::NotEligible);
    assert_eq!(s.token.balance_of(&w1), 100);
}

#[test]
fn revoked_claim_signature_stops_counting() {
    let mut s = Suite::new();
    let (w1, _) = s.investor("w1", FRANCE);
    let (w2, w2_identity) = s.register("w2", FRANCE);
    let claim = s.kyc_issuer.attest(&w2, &w2_identity, s.kyc);
    s.token.mint(&s.agent, &w1, 100).unwrap();
    s.token.transfer(&w1, &w2, 10).unwrap();

    s.kyc_issuer
        .handle
        .write()
        .revoke_claim(&s.kyc_issuer.admin, &claim.signature)
        .unwrap();
    assert_eq!(s.token.transfer(&w1, &w2, 10).unwrap_err().kind(), ErrorKind::NotEligible);
    // Sending from an unverified wallet is still allowed; only recipients are gated.
    s.token.transfer(&w2, &w1, 10).unwrap();
}

#[test]
fn rotating_out_the_signing_key_invalidates_its_claims() {
    let mut s = Suite::new();
    let (w1, _) = s.investor("w1", FRANCE);
    assert!(s.token.is_verified(&w1));

    let key_id = KeyId::for_public_key(&s.kyc_issuer.key.public_key());
    s.kyc_issuer
        .handle
        .write()
        .identity_mut()
        .remove_key(&s.kyc_issuer.admin, &key_id, KeyPurpose::ClaimSigning)
        .unwrap();
    assert!(!s.token.is_verified(&w1));
}

#[test]
fn claim_from_untrusted_issuer_does_not_verify() {
    let mut s = Suite::new();
    let rogue = Issuer::new("rogue", 66);
    let (w1, w1_identity) = s.register("w1", FRANCE);
    rogue.attest(&w1, &w1_identity, s.kyc);
    assert_eq!(s.token.mint(&s.agent, &w1, 1).unwrap_err().kind(), ErrorKind::NotEligible);

    s.issuers
        .write()
        .add_trusted_issuer(&s.owner, rogue.handle.clone(), &[s.kyc])
        .unwrap();
    s.token.mint(&s.agent, &w1, 1).unwrap();
}

#[test]
fn adding_a_required_topic_gates_existing_holders() {
    let mut s = Suite::new();
    let (w1, _) = s.investor("w1", FRANCE);
    let (w2, w2_identity) = s.investor("w2", FRANCE);
    s.token.mint(&s.agent, &w1, 100).unwrap();

    let accredited = ClaimTopic::from_label("ACCREDITED");
    s.topics.write().add_claim_topic(&s.owner, accredited).unwrap();
    assert_eq!(s.token.transfer(&w1, &w2, 1).unwrap_err().kind(), ErrorKind::NotEligible);

    s.issuers
        .write()
        .update_issuer_claim_topics(&s.owner, &s.kyc_issuer_id, &[s.kyc, accredited])
        .unwrap();
    s.kyc_issuer.attest(&w2, &w2_identity, accredited);
    s.token.transfer(&w1, &w2, 1).unwrap();

    s.topics.write().remove_claim_topic(&s.owner, accredited).unwrap();
    s.topics.write().remove_claim_topic(&s.owner, s.kyc).unwrap();
    // With no required topics every registered wallet is verified.
    let (bare, _) = s.register("bare", GERMANY);
    s.token.transfer(&w1, &bare, 1).unwrap();
}

#[test]
fn deleting_the_identity_unverifies_the_wallet() {
    let mut s = Suite::new();
    let (w1, _) = s.investor("w1", FRANCE);
    let (w2, _) = s.investor("w2", FRANCE);
    s.token.mint(&s.agent, &w1, 10).unwrap();
    s.registry.read().delete_identity(&s.agent, &w2).unwrap();
    assert_eq!(s.token.transfer(&w1, &w2, 1).unwrap_err().kind(), ErrorKind::NotEligible);
}

#[test]
fn wallets_sharing_an_identity_share_its_claims() {
    let mut s = Suite::new();
    let (w1, identity) = s.investor("custodian", FRANCE);
    let family = Address::from_label("family-account");
    s.registry
        .read()
        .register_identity(&s.agent, family, identity.clone(), FRANCE)
        .unwrap();
    s.token.mint(&s.agent, &w1, 10).unwrap();
    s.token.transfer(&w1, &family, 5).unwrap();
    assert_eq!(s.token.balance_of(&family), 5);
}

// ---------------------------------------------------------------------------
// Shared storage and batch writes
// ---------------------------------------------------------------------------

#[test]
fn second_registry_over_shared_storage_sees_the_same_investors() {
    let s = Suite::new();
    let (w1, _) = s.investor("w1", FRANCE);
    let sibling_address = Address::from_label("identity-registry:sibling");
    s.storage
        .write()
        .bind_identity_registry(&s.owner, sibling_address)
        .unwrap();
    let mut sibling = IdentityRegistry::new(
        sibling_address,
        s.owner,
        s.storage.clone(),
        s.topics.clone(),
        s.issuers.clone(),
    );
    sibling.add_agent(&s.owner, s.agent).unwrap();

    assert!(sibling.is_verified(&w1));
    sibling.update_country(&s.agent, &w1, GERMANY).unwrap();
    assert_eq!(s.registry.read().investor_country(&w1), Some(GERMANY));

    s.storage
        .write()
        .unbind_identity_registry(&s.owner, &sibling_address)
        .unwrap();
    let (w2, identity) = (Address::from_label("w2"), shared(Identity::new(&Address::from_label("w2"))));
    let err = sibling.register_identity(&s.agent, w2, identity, FRANCE).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAuthorized);
}

#[test]
fn batch_with_duplicate_wallet_registers_nobody() {
    let mut s = Suite::new();
    let (existing, _) = s.investor("existing", FRANCE);
    let wallets: Vec<Address> = ["a", "b", "existing"].iter().map(|l| Address::from_label(l)).collect();
    let identities: Vec<_> = wallets.iter().map(|w| shared(Identity::new(w))).collect();
    let before = s.storage.read().records();

    let err = s
        .registry
        .read()
        .batch_register_identity(&s.agent, &wallets, &identities, &[FRANCE, FRANCE, FRANCE])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    assert_eq!(s.storage.read().records(), before);

    s.token.mint(&s.agent, &existing, 1).unwrap();
    assert_eq!(
        s.token.mint(&s.agent, &wallets[0], 1).unwrap_err().kind(),
        ErrorKind::NotEligible
    );
}
