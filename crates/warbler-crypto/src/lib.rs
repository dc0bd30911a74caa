//! Warbler Crypto Library
//!
//! Password credentials (Argon2id, PHC strings) and session signing keys.

pub mod credentials;
pub mod keys;

pub use credentials::{hash_password, verify_password};
