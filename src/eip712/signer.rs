//! EIP-712 Signing
//!
//! Address derivation, recoverable ECDSA signing, signature splitting and
//! signer recovery for EIP-712 typed data.
//!
//! Key bytes are borrowed for the duration of a single call; the parsed
//! secp256k1 scalar is erased before returning.

use super::encoder::parse_address;
use super::hasher::hash_typed_data;
use super::types::*;
use crate::log_debug;
use crate::utils::crypto::{public_key_to_address, to_checksum_address};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use subtle::ConstantTimeEq;

/// Length of an `r || s || v` signature
pub const SIGNATURE_LENGTH: usize = 65;

/// Parse a 32-byte private key into a secp256k1 scalar
fn parse_secret_key(private_key: &[u8]) -> Result<SecretKey, Eip712Error> {
    if private_key.len() != 32 {
        return Err(Eip712Error::InvalidKey(format!(
            "expected 32 bytes, got {}",
            private_key.len()
        )));
    }

    // Rejects zero and scalars >= the curve order
    SecretKey::from_slice(private_key).map_err(|e| Eip712Error::InvalidKey(e.to_string()))
}

/// Derive the EIP-55 checksummed address for a private key
pub fn derive_address(private_key: &[u8]) -> Result<String, Eip712Error> {
    let secp = Secp256k1::signing_only();
    let mut secret_key = parse_secret_key(private_key)?;

    let public_key = PublicKey::from_secret_key(&secp, &secret_key);
    secret_key.non_secure_erase();

    Ok(to_checksum_address(&public_key_to_address(&public_key)))
}

/// Sign EIP-712 typed data
///
/// Returns a signature with v, r, s components.
pub fn sign_typed_data(
    typed_data: &TypedData,
    private_key: &[u8],
) -> Result<Eip712Signature, Eip712Error> {
    let hash = hash_typed_data(typed_data)?;

    log_debug!(
        "eip712",
        "signing typed data",
        primary_type = typed_data.primary_type,
        digest = format!("0x{}", hex::encode(hash)),
    );

    sign_hash(&hash, private_key)
}

/// Sign a pre-computed 32-byte digest
///
/// Signing is deterministic (RFC 6979) and always produces a low-s signature.
pub fn sign_hash(hash: &[u8; 32], private_key: &[u8]) -> Result<Eip712Signature, Eip712Error> {
    let secp = Secp256k1::signing_only();

    let mut secret_key = parse_secret_key(private_key).map_err(|e| match e {
        Eip712Error::InvalidKey(msg) => Eip712Error::SigningError(msg),
        other => other,
    })?;

    let message = Message::from_digest(*hash);
    let (recovery_id, signature) = secp
        .sign_ecdsa_recoverable(&message, &secret_key)
        .serialize_compact();
    secret_key.non_secure_erase();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&signature[0..32]);
    s.copy_from_slice(&signature[32..64]);

    // v is recovery_id + 27 (Ethereum standard)
    let v = recovery_id.to_i32() as u8 + 27;

    Ok(Eip712Signature::new(r, s, v))
}

/// Split a 65-byte signature (r || s || v) into its components
///
/// A trailing v of 0 or 1 is normalised to 27 or 28.
pub fn split_signature(bytes: &[u8]) -> Result<Eip712Signature, Eip712Error> {
    if bytes.len() != SIGNATURE_LENGTH {
        return Err(Eip712Error::MalformedSignature(format!(
            "expected {} bytes, got {}",
            SIGNATURE_LENGTH,
            bytes.len()
        )));
    }

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[0..32]);
    s.copy_from_slice(&bytes[32..64]);

    let v = match bytes[64] {
        0 | 1 => bytes[64] + 27,
        27 | 28 => bytes[64],
        other => {
            return Err(Eip712Error::MalformedSignature(format!(
                "invalid recovery byte: {}",
                other
            )))
        }
    };

    Ok(Eip712Signature::new(r, s, v))
}

/// Split a hex-encoded signature (with or without 0x prefix)
pub fn split_signature_hex(signature: &str) -> Result<Eip712Signature, Eip712Error> {
    let body = signature
        .strip_prefix("0x")
        .or_else(|| signature.strip_prefix("0X"))
        .unwrap_or(signature);

    let bytes = hex::decode(body)
        .map_err(|e| Eip712Error::MalformedSignature(format!("invalid hex: {}", e)))?;

    split_signature(&bytes)
}

/// Recover the signer's checksummed address from a digest and signature
pub fn recover_address(
    hash: &[u8; 32],
    signature: &Eip712Signature,
) -> Result<String, Eip712Error> {
    Ok(to_checksum_address(&recover_address_bytes(hash, signature)?))
}

fn recover_address_bytes(
    hash: &[u8; 32],
    signature: &Eip712Signature,
) -> Result<[u8; 20], Eip712Error> {
    let secp = Secp256k1::verification_only();

    let recovery_id = signature.recovery_id().ok_or_else(|| {
        Eip712Error::MalformedSignature(format!("invalid v: {}", signature.v))
    })?;
    let recovery_id = RecoveryId::from_i32(i32::from(recovery_id))
        .map_err(|e| Eip712Error::MalformedSignature(e.to_string()))?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[0..32].copy_from_slice(&signature.r);
    sig_bytes[32..64].copy_from_slice(&signature.s);

    let recoverable_sig = RecoverableSignature::from_compact(&sig_bytes, recovery_id)
        .map_err(|e| Eip712Error::MalformedSignature(e.to_string()))?;

    let message = Message::from_digest(*hash);
    let public_key = secp
        .recover_ecdsa(&message, &recoverable_sig)
        .map_err(|e| Eip712Error::MalformedSignature(e.to_string()))?;

    Ok(public_key_to_address(&public_key))
}

/// Recover the address that signed the given typed data
pub fn recover_typed_data_signer(
    typed_data: &TypedData,
    signature: &Eip712Signature,
) -> Result<String, Eip712Error> {
    let hash = hash_typed_data(typed_data)?;
    recover_address(&hash, signature)
}

/// Check whether `expected_address` signed the given typed data
pub fn verify_typed_data(
    typed_data: &TypedData,
    signature: &Eip712Signature,
    expected_address: &str,
) -> Result<bool, Eip712Error> {
    let expected = parse_address(expected_address)?;
    let hash = hash_typed_data(typed_data)?;
    let recovered = recover_address_bytes(&hash, signature)?;

    Ok(bool::from(recovered.ct_eq(&expected)))
}

#[cfg(test)]
mod signer_tests {
    use super::*;

    const TEST_KEY: [u8; 32] = [0x46; 32];
    const TEST_ADDRESS: &str = "0x9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F";

    fn create_test_typed_data() -> TypedData {
        let json = r#"{
            "types": {
                "Message": [
                    {"name": "content", "type": "string"}
                ]
            },
            "primaryType": "Message",
            "domain": {
                "name": "Test",
                "chainId": 1
            },
            "message": {
                "content": "Hello World"
            }
        }"#;

        TypedData::from_json(json).unwrap()
    }

    #[test]
    fn test_derive_address() {
        assert_eq!(derive_address(&TEST_KEY).unwrap(), TEST_ADDRESS);
        assert_eq!(
            derive_address(&TEST_KEY).unwrap(),
            derive_address(&TEST_KEY).unwrap()
        );
    }

    #[test]
    fn test_derive_address_rejects_invalid_keys() {
        assert!(matches!(
            derive_address(&[0u8; 32]),
            Err(Eip712Error::InvalidKey(_))
        ));
        assert!(matches!(
            derive_address(&[0xff; 32]),
            Err(Eip712Error::InvalidKey(_))
        ));
        assert!(matches!(
            derive_address(&[0x46; 31]),
            Err(Eip712Error::InvalidKey(_))
        ));
    }

    #[test]
    fn test_sign_rejects_invalid_key_as_signing_error() {
        let typed_data = create_test_typed_data();
        assert!(matches!(
            sign_typed_data(&typed_data, &[0u8; 32]),
            Err(Eip712Error::SigningError(_))
        ));
    }

    #[test]
    fn test_sign_and_recover() {
        let typed_data = create_test_typed_data();
        let signature = sign_typed_data(&typed_data, &TEST_KEY).unwrap();

        assert!(signature.v == 27 || signature.v == 28);
        assert_eq!(
            recover_typed_data_signer(&typed_data, &signature).unwrap(),
            TEST_ADDRESS
        );
        assert!(verify_typed_data(&typed_data, &signature, TEST_ADDRESS).unwrap());
        assert!(!verify_typed_data(
            &typed_data,
            &signature,
            "0x0000000000000000000000000000000000000000"
        )
        .unwrap());
    }

    #[test]
    fn test_recover_rejects_raw_recovery_id() {
        let typed_data = create_test_typed_data();
        let mut signature = sign_typed_data(&typed_data, &TEST_KEY).unwrap();

        for v in [0u8, 1, 26, 29] {
            signature.v = v;
            assert!(matches!(
                recover_typed_data_signer(&typed_data, &signature),
                Err(Eip712Error::MalformedSignature(_))
            ));
        }
    }

    #[test]
    fn test_signing_is_deterministic() {
        let typed_data = create_test_typed_data();
        let first = sign_typed_data(&typed_data, &TEST_KEY).unwrap();
        let second = sign_typed_data(&typed_data, &TEST_KEY).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_split_signature() {
        let sig = Eip712Signature::new([1u8; 32], [2u8; 32], 27);
        let split = split_signature(&sig.to_bytes()).unwrap();
        assert_eq!(split, sig);

        let split = split_signature_hex(&sig.to_hex()).unwrap();
        assert_eq!(split, sig);
    }

    #[test]
    fn test_split_signature_normalises_v() {
        let mut bytes = [0u8; 65];
        bytes[64] = 1;
        assert_eq!(split_signature(&bytes).unwrap().v, 28);

        bytes[64] = 0;
        assert_eq!(split_signature(&bytes).unwrap().v, 27);

        bytes[64] = 29;
        assert!(matches!(
            split_signature(&bytes),
            Err(Eip712Error::MalformedSignature(_))
        ));
    }

    #[test]
    fn test_split_signature_rejects_wrong_length() {
        assert!(matches!(
            split_signature(&[0u8; 64]),
            Err(Eip712Error::MalformedSignature(_))
        ));
        assert!(matches!(
            split_signature(&[0u8; 66]),
            Err(Eip712Error::MalformedSignature(_))
        ));
        assert!(matches!(
            split_signature_hex("0xzz"),
            Err(Eip712Error::MalformedSignature(_))
        ));
    }
}
