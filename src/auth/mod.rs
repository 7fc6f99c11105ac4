//! Credential handling
//!
//! There are no sessions: every mutating request carries the
//! username/password pair and is checked against the stored digest.

pub mod credentials;

pub use credentials::{Credentials, PasswordHash, authorize, hash_password, verify_password};
