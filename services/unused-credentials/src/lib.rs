//! Unused Credentials Library
//!
//! Scans an AWS Organization for IAM users with unused console credentials.

pub mod agents;
pub mod config;

pub use agents::unused_credentials::{ScanReport, StaleUserRecord, UnusedCredentialsError};
pub use agents::UnusedCredentialsAgent;
pub use config::{ScanArgs, ScanConfig};
