//! Claim Signer Library
//!
//! EIP-712 typed-data signing for `SplitWithLockup` claims.
//!
//! # Architecture
//!
//! This crate provides:
//! - **eip712**: Type encoding, hashing, signing, signature splitting and recovery
//! - **claim**: The `Claim` message, its schema and domain
//! - **config**: Explicit signer parameters with local development defaults
//! - **report**: Text and JSON rendering of a signing run
//! - **utils**: Keccak/address helpers and redacting structured logging
//!
//! # Security
//!
//! Private keys are held as `secrecy::SecretString` and decoded into
//! `zeroize::Zeroizing` buffers only for the signing call.
//!
//! # Example
//!
//! ```rust,ignore
//! use claim_signer::{run, SignerConfig};
//!
//! let report = run(&SignerConfig::default())?;
//! println!("{}", report);
//! ```

pub mod utils;
pub mod eip712;
pub mod claim;
pub mod config;
pub mod report;

pub use claim::{claim_domain, Claim};
pub use config::SignerConfig;
pub use eip712::{
    derive_address, hash_typed_data, recover_typed_data_signer, sign_typed_data,
    split_signature, split_signature_hex, verify_typed_data, Eip712Domain, Eip712Error,
    Eip712Signature, TypedData, TypedDataField, Types,
};
pub use report::SigningReport;
pub use utils::crypto::{keccak256, to_checksum_address};

/// Sign the claim described by `config`
///
/// Derives the signer address, assembles the claim (recipient defaults to the
/// signer), signs it under the configured domain and splits the signature.
pub fn run(config: &SignerConfig) -> Result<SigningReport, Eip712Error> {
    let key = config.decode_private_key()?;
    let signer = derive_address(&key[..])?;

    let recipient = config.recipient.clone().unwrap_or_else(|| signer.clone());
    eip712::parse_address(&recipient)?;
    if !recipient.eq_ignore_ascii_case(&signer) {
        crate::log_warn!(
            "claim",
            "claim recipient differs from signing address",
            recipient = recipient,
            signer = signer,
        );
    }

    let claim = Claim::new(recipient, config.status, config.nonce);
    let domain = config.domain();
    let typed_data = claim.typed_data(domain.clone())?;
    let digest = hash_typed_data(&typed_data)?;

    let signature = sign_typed_data(&typed_data, &key[..])?;
    drop(key);

    let split = split_signature(&signature.to_bytes())?;

    crate::log_debug!(
        "claim",
        "claim signed",
        signer = signer,
        chain_id = config.chain_id,
        nonce = config.nonce,
    );

    Ok(SigningReport::new(signer, claim, domain, &digest, &split))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn test_run_defaults() {
        let report = run(&SignerConfig::default()).unwrap();

        assert_eq!(report.signer, "0x9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F");
        assert_eq!(report.claim.recipient, report.signer);
        assert!(report.claim.status);
        assert_eq!(report.claim.nonce, 0);
        assert!(report.v == 27 || report.v == 28);
        assert_eq!(report.r.len(), 66);
        assert_eq!(report.s.len(), 66);
        assert_eq!(report.signature.len(), 132);
    }

    #[test]
    fn test_run_signature_recovers_to_signer() {
        let config = SignerConfig::default();
        let report = run(&config).unwrap();

        let typed_data = report.claim.typed_data(config.domain()).unwrap();
        let signature = split_signature_hex(&report.signature).unwrap();
        assert_eq!(
            recover_typed_data_signer(&typed_data, &signature).unwrap(),
            report.signer
        );
    }

    #[test]
    fn test_run_with_explicit_recipient() {
        let config = SignerConfig {
            recipient: Some("0x0000000000000000000000000000000000000001".to_string()),
            nonce: 7,
            status: false,
            ..Default::default()
        };
        let report = run(&config).unwrap();

        assert_eq!(report.claim.recipient, "0x0000000000000000000000000000000000000001");
        assert_eq!(report.claim.nonce, 7);
        assert!(!report.claim.status);
    }

    #[test]
    fn test_run_rejects_invalid_key() {
        let config = SignerConfig {
            private_key: SecretString::from("0x00".to_string()),
            ..Default::default()
        };
        assert!(matches!(run(&config), Err(Eip712Error::InvalidKey(_))));
    }

    #[test]
    fn test_run_rejects_non_ascii_recipient() {
        let config = SignerConfig {
            recipient: Some("0x56152éB798BB3E4dFa0139dFa1b3D433Cc23b72f".to_string()),
            ..Default::default()
        };
        assert!(matches!(run(&config), Err(Eip712Error::InvalidAddress(_))));
    }

    #[test]
    fn test_run_rejects_malformed_recipient() {
        let config = SignerConfig {
            recipient: Some("0x1234".to_string()),
            ..Default::default()
        };
        assert!(matches!(run(&config), Err(Eip712Error::InvalidAddress(_))));
    }
}
