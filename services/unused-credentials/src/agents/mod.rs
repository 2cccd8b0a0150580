//! Agent modules for the IAM hygiene service
//!
//! - `unused_credentials`: reports IAM users that never or no longer sign in

pub mod unused_credentials;

pub use unused_credentials::UnusedCredentialsAgent;
