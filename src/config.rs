//! Signer Configuration
//!
//! Explicit parameters for a signing run. `SignerConfig::default()` carries
//! the local development values (Anvil chain id, first deployed contract,
//! throwaway key) so an unconfigured run is reproducible.
//!
//! SECURITY: the private key stays wrapped in `SecretString` and is only
//! decoded into a zeroizing buffer for the duration of a call.

use crate::claim::{claim_domain, DOMAIN_NAME, DOMAIN_VERSION};
use crate::eip712::{derive_address, parse_address, Eip712Domain, Eip712Error};
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

/// Test-only key. DO NOT use keys that hold real funds.
pub const DEFAULT_PRIVATE_KEY: &str =
    "0x4646464646464646464646464646464646464646464646464646464646464646";

/// Local development chain (Anvil/Hardhat)
pub const DEFAULT_CHAIN_ID: u64 = 31337;

pub const DEFAULT_VERIFYING_CONTRACT: &str = "0x5615dEB798BB3E4dFa0139dFa1b3D433Cc23b72f";

/// Parameters of a single claim signing run
#[derive(Debug)]
pub struct SignerConfig {
    /// Hex-encoded 32-byte private key (0x prefix optional)
    pub private_key: SecretString,
    pub domain_name: String,
    pub domain_version: String,
    pub chain_id: u64,
    pub verifying_contract: String,
    /// Claim recipient; the signer's own address when unset
    pub recipient: Option<String>,
    pub status: bool,
    pub nonce: u64,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            private_key: SecretString::from(DEFAULT_PRIVATE_KEY.to_string()),
            domain_name: DOMAIN_NAME.to_string(),
            domain_version: DOMAIN_VERSION.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            verifying_contract: DEFAULT_VERIFYING_CONTRACT.to_string(),
            recipient: None,
            status: true,
            nonce: 0,
        }
    }
}

impl SignerConfig {
    /// Decode the private key into a buffer that is wiped on drop
    pub fn decode_private_key(&self) -> Result<Zeroizing<[u8; 32]>, Eip712Error> {
        let key = self.private_key.expose_secret().trim();
        let body = key
            .strip_prefix("0x")
            .or_else(|| key.strip_prefix("0X"))
            .unwrap_or(key);

        if body.len() != 64 {
            return Err(Eip712Error::InvalidKey(format!(
                "expected 64 hex chars, got {}",
                body.len()
            )));
        }

        let mut bytes = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(body, &mut bytes[..])
            .map_err(|e| Eip712Error::InvalidKey(format!("invalid hex: {}", e)))?;

        Ok(bytes)
    }

    /// The EIP-712 domain described by this configuration
    pub fn domain(&self) -> Eip712Domain {
        claim_domain(
            self.domain_name.clone(),
            self.domain_version.clone(),
            self.chain_id,
            self.verifying_contract.clone(),
        )
    }

    /// Check key and addresses before any signing happens
    pub fn validate(&self) -> Result<(), Eip712Error> {
        let key = self.decode_private_key()?;
        derive_address(&key[..])?;

        parse_address(&self.verifying_contract)?;
        if let Some(recipient) = &self.recipient {
            parse_address(recipient)?;
        }

        Ok(())
    }
}
