//! Shared wiring for the cross-crate tests: a KYC-gated token over a
//! dedicated identity registry, with one trusted issuer holding a real
//! Ed25519 signing key.

#![allow(dead_code)]

use pal_compliance::{ComplianceModule, ModularCompliance};
use pal_core::{shared, Address, ClaimTopic, CountryCode, IdentityId, Shared};
use pal_crypto::Ed25519KeyPair;
use pal_identity::{sign_claim, Claim, ClaimIssuer, Identity, SCHEME_ED25519};
use pal_registry::{ClaimTopicsRegistry, IdentityRegistry, IdentityRegistryStorage, TrustedIssuersRegistry};
use pal_token::{Token, TokenConfig};

pub const FRANCE: CountryCode = CountryCode(250);
pub const GERMANY: CountryCode = CountryCode(276);
pub const NORTH_KOREA: CountryCode = CountryCode(408);

pub struct Issuer {
    pub admin: Address,
    pub key: Ed25519KeyPair,
    pub handle: Shared<ClaimIssuer>,
}

impl Issuer {
    pub fn new(label: &str, seed: u8) -> Self {
        let admin = Address::from_label(label);
        let key = Ed25519KeyPair::from_seed(&[seed; 32]);
        let mut claim_issuer = ClaimIssuer::new(&admin);
        claim_issuer.add_signing_key(&admin, key.public_key()).unwrap();
        Self {
            admin,
            key,
            handle: shared(claim_issuer),
        }
    }

    pub fn id(&self) -> IdentityId {
        self.handle.read().id()
    }

    /// Sign a claim for `identity` and hand it to the holder.
    pub fn attest(&self, holder: &Address, identity: &Shared<Identity>, topic: ClaimTopic) -> Claim {
        let identity_id = identity.read().id();
        let data = b"verified".to_vec();
        let claim = Claim {
            topic,
            scheme: SCHEME_ED25519,
            issuer: self.id(),
            signature: sign_claim(&self.key, &identity_id, topic, &data).unwrap(),
            data,
            uri: "https://issuer.example/claims".into(),
        };
        identity.write().add_claim(holder, claim.clone()).unwrap();
        claim
    }
}

pub struct Suite {
    pub owner: Address,
    pub agent: Address,
    pub kyc: ClaimTopic,
    pub kyc_issuer: Issuer,
    pub kyc_issuer_id: IdentityId,
    pub topics: Shared<ClaimTopicsRegistry>,
    pub issuers: Shared<TrustedIssuersRegistry>,
    pub storage: Shared<IdentityRegistryStorage>,
    pub registry: Shared<IdentityRegistry>,
    pub token: Token,
}

impl Suite {
    pub fn new() -> Self {
        Self::with(TokenConfig::new("Harbour Fund", "HBF", 0), Vec::new())
    }

    /// Suite whose compliance binds `modules` in order.
    pub fn with(config: TokenConfig, modules: Vec<Box<dyn ComplianceModule>>) -> Self {
        let owner = Address::from_label("issuer-governance");
        let agent = Address::from_label("transfer-agent");
        let token_address = Address::from_label("token:HBF");
        let registry_address = Address::from_label("identity-registry:HBF");

        let storage = shared(IdentityRegistryStorage::new(owner));
        storage.write().bind_identity_registry(&owner, registry_address).unwrap();

        let kyc = ClaimTopic::from_label("KYC");
        let topics = shared(ClaimTopicsRegistry::new(owner));
        topics.write().add_claim_topic(&owner, kyc).unwrap();

        let kyc_issuer = Issuer::new("kyc-provider", 11);
        let issuers = shared(TrustedIssuersRegistry::new(owner));
        let kyc_issuer_id = issuers
            .write()
            .add_trusted_issuer(&owner, kyc_issuer.handle.clone(), &[kyc])
            .unwrap();

        let mut registry = IdentityRegistry::new(registry_address, owner, storage.clone(), topics.clone(), issuers.clone());
        registry.add_agent(&owner, agent).unwrap();
        registry.add_agent(&owner, token_address).unwrap();
        let registry = shared(registry);

        let mut compliance = ModularCompliance::new(owner);
        for module in modules {
            compliance.add_module(&owner, module).unwrap();
        }
        let mut token = Token::new(token_address, owner, config, registry.clone(), compliance).unwrap();
        token.add_agent(&owner, agent).unwrap();

        Self {
            owner,
            agent,
            kyc,
            kyc_issuer,
            kyc_issuer_id,
            topics,
            issuers,
            storage,
            registry,
            token,
        }
    }

    /// Register a wallet without any claims.
    pub fn register(&self, label: &str, country: CountryCode) -> (Address, Shared<Identity>) {
        let wallet = Address::from_label(label);
        let identity = shared(Identity::new(&wallet));
        self.registry
            .read()
            .register_identity(&self.agent, wallet, identity.clone(), country)
            .unwrap();
        (wallet, identity)
    }

    /// Register a wallet and give its identity a KYC claim.
    pub fn investor(&self, label: &str, country: CountryCode) -> (Address, Shared<Identity>) {
        let (wallet, identity) = self.register(label, country);
        self.kyc_issuer.attest(&wallet, &identity, self.kyc);
        (wallet, identity)
    }

    /// Sum of every balance the token holds.
    pub fn sum_of_balances(&self) -> u128 {
        self.token.balances().values().sum()
    }
}
