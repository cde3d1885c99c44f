//! Utilities Module
//!
//! Hashing helpers and structured logging shared across the crate.

pub mod crypto;
pub mod logging;

pub use crypto::*;
