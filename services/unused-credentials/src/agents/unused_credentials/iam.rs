//! IAM user listing inside a member account

use std::time::SystemTime;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_credential_types::Credentials;
use aws_sdk_iam::primitives::DateTime as SdkDateTime;
use aws_sdk_iam::Client as IamClient;
use tracing::debug;

use super::types::{AssumedSession, IamUser, LastLogin, UnusedCredentialsError};
use super::{describe_sdk_error, to_utc};

/// Users of one account; a user whose sign-in time cannot be read is an `Err`
/// entry so it can be skipped without dropping the rest of the account
pub type UserListing = Vec<Result<IamUser, UnusedCredentialsError>>;

/// Lists IAM users with their last console sign-in
#[async_trait]
pub trait UserInspector: Send + Sync {
    async fn list_users(&self, session: &AssumedSession)
        -> Result<UserListing, UnusedCredentialsError>;
}

/// IAM-backed inspector; builds a client per session from the base SDK config
pub struct AwsUserInspector {
    base_config: SdkConfig,
}

impl AwsUserInspector {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            base_config: sdk_config.clone(),
        }
    }

    fn client_for(&self, session: &AssumedSession) -> IamClient {
        let credentials = Credentials::new(
            &session.access_key_id,
            &session.secret_access_key,
            Some(session.session_token.clone()),
            session.expires_at.map(SystemTime::from),
            "unused-credentials-assumed-role",
        );

        let config = aws_sdk_iam::config::Builder::from(&self.base_config)
            .credentials_provider(credentials)
            .build();

        IamClient::from_conf(config)
    }
}

#[async_trait]
impl UserInspector for AwsUserInspector {
    async fn list_users(
        &self,
        session: &AssumedSession,
    ) -> Result<UserListing, UnusedCredentialsError> {
        let client = self.client_for(session);
        let mut users = Vec::new();
        let mut pages = client.list_users().into_paginator().send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| UnusedCredentialsError::IamAccess {
                account_id: session.account_id.clone(),
                message: describe_sdk_error(&e),
            })?;

            for user in page.users() {
                let user_name = user.user_name();
                let entry = last_login_from_sdk(
                    &session.account_id,
                    user_name,
                    user.password_last_used(),
                )
                .map(|last_login| IamUser {
                    user_name: user_name.to_string(),
                    account_id: session.account_id.clone(),
                    arn: Some(user.arn().to_string()),
                    last_login,
                });
                users.push(entry);
            }
        }

        debug!(account_id = %session.account_id, count = users.len(), "Listed IAM users");
        Ok(users)
    }
}

/// Absent `PasswordLastUsed` means the user never signed in to the console
pub fn last_login_from_sdk(
    account_id: &str,
    user_name: &str,
    password_last_used: Option<&SdkDateTime>,
) -> Result<LastLogin, UnusedCredentialsError> {
    match password_last_used {
        None => Ok(LastLogin::Never),
        Some(ts) => to_utc(ts).map(LastLogin::At).ok_or_else(|| {
            UnusedCredentialsError::MalformedTimestamp {
                account_id: account_id.to_string(),
                user_name: user_name.to_string(),
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_missing_timestamp_is_never() {
        let last = last_login_from_sdk("111111111111", "alice", None).unwrap();
        assert_eq!(last, LastLogin::Never);
    }

    #[test]
    fn test_timestamp_conversion() {
        let ts = SdkDateTime::from_secs(1_700_000_000);
        let last = last_login_from_sdk("111111111111", "bob", Some(&ts)).unwrap();
        assert_eq!(
            last,
            LastLogin::At(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
        );
    }

    #[test]
    fn test_out_of_range_timestamp_is_malformed() {
        let ts = SdkDateTime::from_secs(i64::MAX);
        let err = last_login_from_sdk("111111111111", "mallory", Some(&ts)).unwrap_err();

        match err {
            UnusedCredentialsError::MalformedTimestamp {
                account_id,
                user_name,
            } => {
                assert_eq!(account_id, "111111111111");
                assert_eq!(user_name, "mallory");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
