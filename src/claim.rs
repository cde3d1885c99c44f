//! Claim Messages
//!
//! The `Claim` struct signed under the `SplitWithLockup` domain:
//!
//! ```text
//! Claim(address recipient,bool status,uint256 nonce)
//! ```

use crate::eip712::{Eip712Domain, Eip712Error, TypedData, TypedDataField, Types};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary type name of a claim
pub const CLAIM_TYPE: &str = "Claim";

/// Default domain name
pub const DOMAIN_NAME: &str = "SplitWithLockup";

/// Default domain version
pub const DOMAIN_VERSION: &str = "1";

/// A claim authorising `recipient` under a given nonce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub recipient: String,
    pub status: bool,
    pub nonce: u64,
}

impl Claim {
    pub fn new(recipient: impl Into<String>, status: bool, nonce: u64) -> Self {
        Self {
            recipient: recipient.into(),
            status,
            nonce,
        }
    }

    /// Schema with the claim fields in canonical order
    pub fn schema() -> Types {
        let mut types = Types::new();
        types.insert(
            CLAIM_TYPE.to_string(),
            vec![
                TypedDataField::new("recipient", "address"),
                TypedDataField::new("status", "bool"),
                TypedDataField::new("nonce", "uint256"),
            ],
        );
        types
    }

    /// Wrap the claim into a typed-data envelope under `domain`
    pub fn typed_data(&self, domain: Eip712Domain) -> Result<TypedData, Eip712Error> {
        self.typed_data_with_schema(domain, Self::schema())
    }

    /// Same as [`Claim::typed_data`] with a caller-provided schema
    pub fn typed_data_with_schema(
        &self,
        domain: Eip712Domain,
        schema: Types,
    ) -> Result<TypedData, Eip712Error> {
        TypedData::new(domain, schema, CLAIM_TYPE, self)
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Build a claim domain
pub fn claim_domain(
    name: impl Into<String>,
    version: impl Into<String>,
    chain_id: u64,
    verifying_contract: impl Into<String>,
) -> Eip712Domain {
    Eip712Domain {
        name: Some(name.into()),
        version: Some(version.into()),
        chain_id: Some(chain_id),
        verifying_contract: Some(verifying_contract.into()),
        salt: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eip712::{
        derive_address, encode_type, hash_typed_data, recover_typed_data_signer, sign_typed_data,
    };

    const TEST_KEY: [u8; 32] = [0x46; 32];
    const CONTRACT: &str = "0x5615dEB798BB3E4dFa0139dFa1b3D433Cc23b72f";

    fn default_domain() -> Eip712Domain {
        claim_domain(DOMAIN_NAME, DOMAIN_VERSION, 31337, CONTRACT)
    }

    fn default_claim() -> Claim {
        Claim::new(derive_address(&TEST_KEY).unwrap(), true, 0)
    }

    fn sign_with(domain: Eip712Domain) -> [u8; 65] {
        let typed_data = default_claim().typed_data(domain).unwrap();
        sign_typed_data(&typed_data, &TEST_KEY).unwrap().to_bytes()
    }

    #[test]
    fn test_claim_encode_type() {
        assert_eq!(
            encode_type(CLAIM_TYPE, &Claim::schema()).unwrap(),
            "Claim(address recipient,bool status,uint256 nonce)"
        );
    }

    #[test]
    fn test_claim_display_is_json() {
        let claim = Claim::new("0x9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F", true, 0);
        assert_eq!(
            claim.to_string(),
            r#"{"recipient":"0x9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F","status":true,"nonce":0}"#
        );
    }

    #[test]
    fn test_split_with_lockup_scenario() {
        let claim = default_claim();
        assert_eq!(claim.recipient, "0x9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F");

        let typed_data = claim.typed_data(default_domain()).unwrap();
        let signature = sign_typed_data(&typed_data, &TEST_KEY).unwrap();

        assert_eq!(signature.to_bytes().len(), 65);
        assert!(signature.v == 27 || signature.v == 28);
        assert_eq!(
            recover_typed_data_signer(&typed_data, &signature).unwrap(),
            claim.recipient
        );
    }

    #[test]
    fn test_domain_fields_separate_signatures() {
        let base = sign_with(default_domain());

        let mut other_chain = default_domain();
        other_chain.chain_id = Some(1);
        assert_ne!(base, sign_with(other_chain));

        let mut other_name = default_domain();
        other_name.name = Some("Other".to_string());
        assert_ne!(base, sign_with(other_name));

        let mut other_version = default_domain();
        other_version.version = Some("2".to_string());
        assert_ne!(base, sign_with(other_version));

        let mut other_contract = default_domain();
        other_contract.verifying_contract =
            Some("0x0000000000000000000000000000000000000001".to_string());
        assert_ne!(base, sign_with(other_contract));
    }

    #[test]
    fn test_schema_field_order_changes_signature() {
        let claim = default_claim();

        let mut reordered = Types::new();
        reordered.insert(
            CLAIM_TYPE.to_string(),
            vec![
                TypedDataField::new("nonce", "uint256"),
                TypedDataField::new("status", "bool"),
                TypedDataField::new("recipient", "address"),
            ],
        );

        let canonical = claim.typed_data(default_domain()).unwrap();
        let shuffled = claim
            .typed_data_with_schema(default_domain(), reordered)
            .unwrap();

        assert_ne!(
            hash_typed_data(&canonical).unwrap(),
            hash_typed_data(&shuffled).unwrap()
        );
        assert_ne!(
            sign_typed_data(&canonical, &TEST_KEY).unwrap(),
            sign_typed_data(&shuffled, &TEST_KEY).unwrap()
        );
    }

    #[test]
    fn test_claim_value_changes_signature() {
        let domain = default_domain();
        let base = default_claim();
        let revoked = Claim { status: false, ..base.clone() };
        let next = Claim { nonce: 1, ..base.clone() };

        let sign = |c: &Claim| {
            sign_typed_data(&c.typed_data(domain.clone()).unwrap(), &TEST_KEY).unwrap()
        };
        assert_ne!(sign(&base), sign(&revoked));
        assert_ne!(sign(&base), sign(&next));
    }

    #[test]
    fn test_typed_data_json_shape() {
        let typed_data = default_claim().typed_data(default_domain()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&typed_data.to_json().unwrap()).unwrap();

        assert_eq!(json["primaryType"], "Claim");
        assert_eq!(json["domain"]["chainId"], 31337);
        assert_eq!(json["domain"]["verifyingContract"], CONTRACT);
        assert_eq!(json["message"]["status"], true);
        assert_eq!(json["types"]["Claim"][2]["type"], "uint256");
    }
}
