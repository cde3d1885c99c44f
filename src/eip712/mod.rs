//! EIP-712 Typed Data Signing
//!
//! Implementation of EIP-712 typed structured data hashing and signing.
//!
//! # Reference
//! - <https://eips.ethereum.org/EIPS/eip-712>
//!
//! # Example
//! ```rust,ignore
//! use claim_signer::eip712::{TypedData, derive_address, sign_typed_data};
//!
//! let typed_data = TypedData::from_json(json_string)?;
//! let signer = derive_address(&private_key)?;
//! let signature = sign_typed_data(&typed_data, &private_key)?;
//! println!("{} v={} r={} s={}", signer, signature.v, signature.r_hex(), signature.s_hex());
//! ```

pub mod types;
pub mod encoder;
pub mod hasher;
pub mod signer;

pub use types::*;
pub use encoder::*;
pub use hasher::*;
pub use signer::*;
