//! EIP-712 Type Definitions
//!
//! Core data structures for EIP-712 typed data signing.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Name of the implicit domain struct type
pub const EIP712_DOMAIN_TYPE: &str = "EIP712Domain";

/// Schema: struct name -> ordered field list
///
/// Field order inside each list is part of the canonical encoding.
pub type Types = BTreeMap<String, Vec<TypedDataField>>;

/// A field in a struct type definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypedDataField {
    /// The name of the field
    pub name: String,
    /// The type of the field (e.g., "address", "uint256", "bytes32")
    #[serde(rename = "type")]
    pub type_name: String,
}

impl TypedDataField {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// The EIP-712 domain separator data
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Domain {
    /// The human-readable name of the signing domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The current major version of the signing domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// The EIP-155 chain ID
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_chain_id"
    )]
    pub chain_id: Option<u64>,

    /// The address of the contract that will verify the signature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<String>,

    /// An optional disambiguating salt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

impl Eip712Domain {
    /// The `EIP712Domain` struct fields for the values present, in canonical order
    pub fn fields(&self) -> Vec<TypedDataField> {
        let mut fields = Vec::new();

        if self.name.is_some() {
            fields.push(TypedDataField::new("name", "string"));
        }
        if self.version.is_some() {
            fields.push(TypedDataField::new("version", "string"));
        }
        if self.chain_id.is_some() {
            fields.push(TypedDataField::new("chainId", "uint256"));
        }
        if self.verifying_contract.is_some() {
            fields.push(TypedDataField::new("verifyingContract", "address"));
        }
        if self.salt.is_some() {
            fields.push(TypedDataField::new("salt", "bytes32"));
        }

        fields
    }
}

/// Accept a chain id as a JSON number, a decimal string or a `0x` hex string
fn deserialize_chain_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(value) = value else {
        return Ok(None);
    };

    let parsed = match &value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => {
            if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                u64::from_str_radix(hex, 16).ok()
            } else {
                s.parse().ok()
            }
        }
        _ => None,
    };

    parsed
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid chainId: {}", value)))
}

/// Complete EIP-712 typed data structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    /// Type definitions (struct name -> fields)
    pub types: Types,

    /// The name of the primary type being signed
    pub primary_type: String,

    /// The EIP-712 domain
    pub domain: Eip712Domain,

    /// The actual message data to sign
    pub message: serde_json::Value,
}

impl TypedData {
    /// Assemble typed data from a domain, a schema and any serializable message
    pub fn new<M: Serialize>(
        domain: Eip712Domain,
        types: Types,
        primary_type: impl Into<String>,
        message: &M,
    ) -> Result<Self, Eip712Error> {
        let message =
            serde_json::to_value(message).map_err(|e| Eip712Error::InvalidJson(e.to_string()))?;

        Ok(Self {
            types,
            primary_type: primary_type.into(),
            domain,
            message,
        })
    }

    /// Parse typed data from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Eip712Error> {
        serde_json::from_str(json).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, Eip712Error> {
        serde_json::to_string(self).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }

    /// Validate the typed data structure
    pub fn validate(&self) -> Result<(), Eip712Error> {
        if self.primary_type == EIP712_DOMAIN_TYPE || !self.types.contains_key(&self.primary_type)
        {
            return Err(Eip712Error::InvalidPrimaryType(self.primary_type.clone()));
        }

        for fields in self.types.values() {
            for field in fields {
                self.validate_type(&field.type_name)?;
            }
        }

        Ok(())
    }

    /// Check if a type is valid (either a built-in type or defined in types)
    fn validate_type(&self, type_name: &str) -> Result<(), Eip712Error> {
        let base_type = get_base_type(type_name);

        if is_atomic_type(base_type) || is_dynamic_type(base_type) {
            return Ok(());
        }

        if self.types.contains_key(base_type) {
            return Ok(());
        }

        Err(Eip712Error::InvalidType(type_name.to_string()))
    }
}

/// EIP-712 signature components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eip712Signature {
    /// r component (32 bytes)
    pub r: [u8; 32],
    /// s component (32 bytes)
    pub s: [u8; 32],
    /// v component (recovery id + 27)
    pub v: u8,
}

impl Eip712Signature {
    /// Create from raw components
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        Self { r, s, v }
    }

    /// Convert to 65-byte representation (r || s || v)
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[0..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    pub fn r_hex(&self) -> String {
        format!("0x{}", hex::encode(self.r))
    }

    pub fn s_hex(&self) -> String {
        format!("0x{}", hex::encode(self.s))
    }

    /// Recovery id (0 or 1), `None` when `v` is not 27 or 28
    pub fn recovery_id(&self) -> Option<u8> {
        match self.v {
            27 | 28 => Some(self.v - 27),
            _ => None,
        }
    }
}

/// Errors that can occur during EIP-712 operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Eip712Error {
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Signing error: {0}")]
    SigningError(String),

    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Invalid primary type: {0}")]
    InvalidPrimaryType(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid value for type {type_name}: {value}")]
    InvalidValue { type_name: String, value: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// Get the base type from a potentially array type
/// e.g., "Person[]" -> "Person", "uint256[2][]" -> "uint256"
pub fn get_base_type(type_name: &str) -> &str {
    match type_name.find('[') {
        Some(bracket_pos) => &type_name[..bracket_pos],
        None => type_name,
    }
}

/// Check if a type is an atomic (fixed-size) type
pub fn is_atomic_type(type_name: &str) -> bool {
    if type_name == "address" || type_name == "bool" {
        return true;
    }

    if let Some(bits) = integer_bits(type_name) {
        return bits > 0 && bits <= 256 && bits % 8 == 0;
    }

    // bytesN (fixed-size bytes)
    if let Some(size) = type_name.strip_prefix("bytes") {
        if let Ok(n) = size.parse::<u32>() {
            return n > 0 && n <= 32;
        }
    }

    false
}

/// Check if a type is a dynamic type
pub fn is_dynamic_type(type_name: &str) -> bool {
    type_name == "bytes" || type_name == "string"
}

/// Bit width of `uintN`/`intN`, `None` for anything else
pub(crate) fn integer_bits(type_name: &str) -> Option<u32> {
    let bits = type_name
        .strip_prefix("uint")
        .or_else(|| type_name.strip_prefix("int"))?;
    bits.parse::<u32>().ok()
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_atomic_types() {
        assert!(is_atomic_type("address"));
        assert!(is_atomic_type("bool"));
        assert!(is_atomic_type("uint256"));
        assert!(is_atomic_type("uint8"));
        assert!(is_atomic_type("int256"));
        assert!(is_atomic_type("bytes32"));
        assert!(is_atomic_type("bytes1"));

        assert!(!is_atomic_type("string"));
        assert!(!is_atomic_type("bytes"));
        assert!(!is_atomic_type("uint"));
        assert!(!is_atomic_type("uint257"));
        assert!(!is_atomic_type("uint7"));
        assert!(!is_atomic_type("bytes33"));
    }

    #[test]
    fn test_dynamic_types() {
        assert!(is_dynamic_type("bytes"));
        assert!(is_dynamic_type("string"));

        assert!(!is_dynamic_type("bytes32"));
        assert!(!is_dynamic_type("address"));
    }

    #[test]
    fn test_get_base_type() {
        assert_eq!(get_base_type("Person[]"), "Person");
        assert_eq!(get_base_type("uint256[10]"), "uint256");
        assert_eq!(get_base_type("uint256[2][]"), "uint256");
        assert_eq!(get_base_type("address"), "address");
    }

    #[test]
    fn test_domain_fields_follow_canonical_order() {
        let domain = Eip712Domain {
            name: Some("SplitWithLockup".to_string()),
            chain_id: Some(31337),
            verifying_contract: Some("0x5615dEB798BB3E4dFa0139dFa1b3D433Cc23b72f".to_string()),
            ..Default::default()
        };

        let names: Vec<_> = domain.fields().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["name", "chainId", "verifyingContract"]);
    }

    #[test]
    fn test_chain_id_parsing() {
        let numeric: Eip712Domain = serde_json::from_str(r#"{"chainId": 1}"#).unwrap();
        assert_eq!(numeric.chain_id, Some(1));

        let decimal: Eip712Domain = serde_json::from_str(r#"{"chainId": "137"}"#).unwrap();
        assert_eq!(decimal.chain_id, Some(137));

        let hex: Eip712Domain = serde_json::from_str(r#"{"chainId": "0x89"}"#).unwrap();
        assert_eq!(hex.chain_id, Some(137));

        let missing: Eip712Domain = serde_json::from_str(r#"{"name": "Test"}"#).unwrap();
        assert_eq!(missing.chain_id, None);

        assert!(serde_json::from_str::<Eip712Domain>(r#"{"chainId": true}"#).is_err());
    }

    #[test]
    fn test_signature_hex_parts() {
        let sig = Eip712Signature::new([1u8; 32], [2u8; 32], 28);
        let hex = sig.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 132);
        assert!(hex.ends_with("1c"));
        assert_eq!(sig.r_hex(), format!("0x{}", "01".repeat(32)));
        assert_eq!(sig.s_hex(), format!("0x{}", "02".repeat(32)));
        assert_eq!(sig.recovery_id(), Some(1));
    }

    #[test]
    fn test_recovery_id_rejects_out_of_range_v() {
        assert_eq!(Eip712Signature::new([1u8; 32], [2u8; 32], 27).recovery_id(), Some(0));
        assert_eq!(Eip712Signature::new([1u8; 32], [2u8; 32], 0).recovery_id(), None);
        assert_eq!(Eip712Signature::new([1u8; 32], [2u8; 32], 26).recovery_id(), None);
        assert_eq!(Eip712Signature::new([1u8; 32], [2u8; 32], 29).recovery_id(), None);
    }

    #[test]
    fn test_primary_type_must_not_be_domain() {
        let mut types = Types::new();
        types.insert(
            EIP712_DOMAIN_TYPE.to_string(),
            vec![TypedDataField::new("name", "string")],
        );
        let typed_data = TypedData {
            types,
            primary_type: EIP712_DOMAIN_TYPE.to_string(),
            domain: Eip712Domain::default(),
            message: serde_json::json!({}),
        };

        assert!(matches!(
            typed_data.validate(),
            Err(Eip712Error::InvalidPrimaryType(_))
        ));
    }
}
