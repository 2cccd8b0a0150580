//! Cross-account role assumption via STS

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sts::Client as StsClient;
use tracing::debug;

use super::types::{AssumedSession, UnusedCredentialsError};
use super::{describe_sdk_error, to_utc};

/// Exchanges the caller's identity for credentials in a member account
#[async_trait]
pub trait RoleAssumer: Send + Sync {
    async fn assume(&self, account_id: &str) -> Result<AssumedSession, UnusedCredentialsError>;
}

/// Map a region name to its AWS partition
pub fn partition_for_region(region: Option<&str>) -> &'static str {
    match region {
        Some(r) if r.starts_with("cn-") => "aws-cn",
        Some(r) if r.starts_with("us-gov-") => "aws-us-gov",
        Some(r) if r.starts_with("us-isob-") => "aws-iso-b",
        Some(r) if r.starts_with("us-iso-") => "aws-iso",
        _ => "aws",
    }
}

pub fn role_arn(partition: &str, account_id: &str, role_name: &str) -> String {
    format!("arn:{}:iam::{}:role/{}", partition, account_id, role_name)
}

/// STS-backed role assumer
pub struct StsRoleAssumer {
    client: StsClient,
    partition: String,
    role_name: String,
    session_name: String,
}

impl StsRoleAssumer {
    /// `partition` overrides the one derived from the SDK region
    pub fn new(
        sdk_config: &SdkConfig,
        role_name: &str,
        session_name: &str,
        partition: Option<&str>,
    ) -> Self {
        let partition = partition
            .unwrap_or_else(|| partition_for_region(sdk_config.region().map(|r| r.as_ref())))
            .to_string();

        debug!(partition = %partition, role = %role_name, "Initialized STS role assumer");

        Self {
            client: StsClient::new(sdk_config),
            partition,
            role_name: role_name.to_string(),
            session_name: session_name.to_string(),
        }
    }
}

#[async_trait]
impl RoleAssumer for StsRoleAssumer {
    async fn assume(&self, account_id: &str) -> Result<AssumedSession, UnusedCredentialsError> {
        let arn = role_arn(&self.partition, account_id, &self.role_name);

        let output = self
            .client
            .assume_role()
            .role_arn(&arn)
            .role_session_name(&self.session_name)
            .send()
            .await
            .map_err(|e| UnusedCredentialsError::AssumeRole {
                account_id: account_id.to_string(),
                role_arn: arn.clone(),
                message: describe_sdk_error(&e),
            })?;

        let credentials = output
            .credentials()
            .ok_or_else(|| UnusedCredentialsError::AssumeRole {
                account_id: account_id.to_string(),
                role_arn: arn.clone(),
                message: "AssumeRole response contained no credentials".to_string(),
            })?;

        debug!(account_id = %account_id, "Assumed cross-account role");

        Ok(AssumedSession {
            account_id: account_id.to_string(),
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expires_at: to_utc(credentials.expiration()),
        })
    }
}
