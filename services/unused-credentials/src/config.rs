//! Scan configuration
//!
//! Every option can be given as a flag or through its environment variable.
//! The Lambda entry point reads the environment only.

use clap::Args;
use serde::Serialize;

use crate::agents::unused_credentials::UnusedCredentialsError;

/// Default role session name, visible in the member accounts' CloudTrail
pub const DEFAULT_ROLE_SESSION_NAME: &str = "unused-credentials-function";

/// Default inactivity threshold in days
pub const DEFAULT_THRESHOLD_DAYS: u32 = 90;

/// Upper bound for the inactivity threshold (ten years)
const MAX_THRESHOLD_DAYS: u32 = 3650;

/// Default SDK attempts per call, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const MAX_ATTEMPTS_LIMIT: u32 = 10;

const KNOWN_PARTITIONS: &[&str] = &["aws", "aws-cn", "aws-us-gov", "aws-iso", "aws-iso-b"];

/// Raw scan options as accepted from the command line or environment
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Organizational unit (ou-...) or root (r-...) to scan; all accounts when unset
    #[arg(long = "ou-id", env = "UNUSED_CREDENTIALS_OU_ID")]
    pub organizational_unit_id: Option<String>,

    /// Days without a console sign-in before a user is reported
    #[arg(
        long = "threshold-days",
        env = "UNUSED_CREDENTIALS_THRESHOLD_DAYS",
        default_value_t = DEFAULT_THRESHOLD_DAYS
    )]
    pub staleness_threshold_days: u32,

    /// Role to assume in every member account
    #[arg(long = "role-name", env = "UNUSED_CREDENTIALS_ROLE_NAME")]
    pub assumed_role_name: String,

    /// Role session name used for AssumeRole
    #[arg(
        long,
        env = "UNUSED_CREDENTIALS_SESSION_NAME",
        default_value = DEFAULT_ROLE_SESSION_NAME
    )]
    pub role_session_name: String,

    /// AWS partition for role ARNs; derived from the region when unset
    #[arg(long, env = "UNUSED_CREDENTIALS_PARTITION")]
    pub partition: Option<String>,

    /// Maximum SDK attempts per call (standard retry mode)
    #[arg(
        long,
        env = "UNUSED_CREDENTIALS_MAX_ATTEMPTS",
        default_value_t = DEFAULT_MAX_ATTEMPTS
    )]
    pub max_attempts: u32,
}

/// Validated scan configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanConfig {
    pub organizational_unit_id: Option<String>,
    pub staleness_threshold_days: u32,
    pub assumed_role_name: String,
    pub role_session_name: String,
    pub partition: Option<String>,
    pub max_attempts: u32,
}

impl ScanConfig {
    /// Create a configuration with defaults for everything but the role
    pub fn new(assumed_role_name: impl Into<String>) -> Self {
        Self {
            organizational_unit_id: None,
            staleness_threshold_days: DEFAULT_THRESHOLD_DAYS,
            assumed_role_name: assumed_role_name.into(),
            role_session_name: DEFAULT_ROLE_SESSION_NAME.to_string(),
            partition: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn organizational_unit(mut self, ou_id: impl Into<String>) -> Self {
        self.organizational_unit_id = Some(ou_id.into());
        self
    }

    pub fn threshold_days(mut self, days: u32) -> Self {
        self.staleness_threshold_days = days;
        self
    }

    pub fn partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    /// Check every field, returning the first problem found
    pub fn validate(&self) -> Result<(), UnusedCredentialsError> {
        if let Some(ou_id) = &self.organizational_unit_id {
            validate_parent_id(ou_id)?;
        }

        if self.staleness_threshold_days == 0 || self.staleness_threshold_days > MAX_THRESHOLD_DAYS
        {
            return Err(UnusedCredentialsError::InvalidConfig(format!(
                "staleness threshold must be between 1 and {} days, got {}",
                MAX_THRESHOLD_DAYS, self.staleness_threshold_days
            )));
        }

        validate_role_name(&self.assumed_role_name)?;
        validate_session_name(&self.role_session_name)?;

        if let Some(partition) = &self.partition {
            if !KNOWN_PARTITIONS.contains(&partition.as_str()) {
                return Err(UnusedCredentialsError::InvalidConfig(format!(
                    "unknown AWS partition: {}",
                    partition
                )));
            }
        }

        if self.max_attempts == 0 || self.max_attempts > MAX_ATTEMPTS_LIMIT {
            return Err(UnusedCredentialsError::InvalidConfig(format!(
                "max attempts must be between 1 and {}, got {}",
                MAX_ATTEMPTS_LIMIT, self.max_attempts
            )));
        }

        Ok(())
    }
}

impl ScanArgs {
    /// Trim and validate into a [`ScanConfig`]
    pub fn into_config(self) -> Result<ScanConfig, UnusedCredentialsError> {
        let config = ScanConfig {
            organizational_unit_id: non_empty(self.organizational_unit_id),
            staleness_threshold_days: self.staleness_threshold_days,
            assumed_role_name: self.assumed_role_name.trim().to_string(),
            role_session_name: self.role_session_name.trim().to_string(),
            partition: non_empty(self.partition),
            max_attempts: self.max_attempts,
        };

        config.validate()?;
        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// OU ids look like `ou-ab12-cdefgh34`, roots like `r-ab12`
fn validate_parent_id(id: &str) -> Result<(), UnusedCredentialsError> {
    let lower_alnum = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    };

    let valid = if let Some(rest) = id.strip_prefix("ou-") {
        match rest.split_once('-') {
            Some((root, ou)) => {
                (4..=32).contains(&root.len())
                    && (8..=32).contains(&ou.len())
                    && lower_alnum(root)
                    && lower_alnum(ou)
            }
            None => false,
        }
    } else if let Some(rest) = id.strip_prefix("r-") {
        (4..=32).contains(&rest.len()) && lower_alnum(rest)
    } else {
        false
    };

    if valid {
        Ok(())
    } else {
        Err(UnusedCredentialsError::InvalidConfig(format!(
            "organizational unit id must look like ou-xxxx-xxxxxxxx or r-xxxx: {}",
            id
        )))
    }
}

fn validate_role_name(name: &str) -> Result<(), UnusedCredentialsError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || "+=,.@_-".contains(c);

    if name.is_empty() || name.len() > 64 || !name.chars().all(allowed) {
        return Err(UnusedCredentialsError::InvalidConfig(format!(
            "role name must be 1-64 characters of [A-Za-z0-9+=,.@_-]: {:?}",
            name
        )));
    }
    Ok(())
}

fn validate_session_name(name: &str) -> Result<(), UnusedCredentialsError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || "+=,.@_-".contains(c);

    if name.len() < 2 || name.len() > 64 || !name.chars().all(allowed) {
        return Err(UnusedCredentialsError::InvalidConfig(format!(
            "role session name must be 2-64 characters of [A-Za-z0-9+=,.@_-]: {:?}",
            name
        )));
    }
    Ok(())
}
