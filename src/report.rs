//! Signing Report
//!
//! Result of a signing run, rendered either as the plain text lines printed
//! by the CLI or as a single JSON document.

use crate::claim::Claim;
use crate::eip712::{Eip712Domain, Eip712Error, Eip712Signature};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything a signing run produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningReport {
    /// Checksummed address derived from the private key
    pub signer: String,
    pub claim: Claim,
    pub domain: Eip712Domain,
    /// EIP-712 digest that was signed
    pub digest: String,
    /// Full 65-byte signature as hex
    pub signature: String,
    pub v: u8,
    pub r: String,
    pub s: String,
}

impl SigningReport {
    pub fn new(
        signer: String,
        claim: Claim,
        domain: Eip712Domain,
        digest: &[u8; 32],
        signature: &Eip712Signature,
    ) -> Self {
        Self {
            signer,
            claim,
            domain,
            digest: format!("0x{}", hex::encode(digest)),
            signature: signature.to_hex(),
            v: signature.v,
            r: signature.r_hex(),
            s: signature.s_hex(),
        }
    }

    /// Output lines, in print order
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("publicKey {}", self.signer),
            self.claim.to_string(),
            format!("User Address: {}", self.signer),
            format!("Signature: {}", self.signature),
            format!("v: {}", self.v),
            format!("r: {}", self.r),
            format!("s: {}", self.s),
        ]
    }

    pub fn to_json(&self) -> Result<String, Eip712Error> {
        serde_json::to_string_pretty(self).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }
}

impl fmt::Display for SigningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}
