//! AWS Organizations account listing
//!
//! Walks an organizational unit and all of its child OUs, or lists every
//! account in the organization when no parent is given.

use std::collections::VecDeque;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_organizations::types::ChildType;
use aws_sdk_organizations::Client as OrganizationsClient;
use tracing::{debug, info, warn};

use super::describe_sdk_error;
use super::types::{Account, AccountStatus, UnusedCredentialsError};

/// Source of member accounts for a scan
#[async_trait]
pub trait OrganizationLister: Send + Sync {
    /// List accounts under `parent_id` (recursively), or the whole organization
    async fn list_accounts(
        &self,
        parent_id: Option<&str>,
    ) -> Result<Vec<Account>, UnusedCredentialsError>;
}

/// Organizations-backed lister using the caller's own credentials
pub struct AwsOrganizationLister {
    client: OrganizationsClient,
}

impl AwsOrganizationLister {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: OrganizationsClient::new(sdk_config),
        }
    }

    async fn list_all(&self) -> Result<Vec<Account>, UnusedCredentialsError> {
        let mut accounts = Vec::new();
        let mut pages = self.client.list_accounts().into_paginator().send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| UnusedCredentialsError::OrganizationsAccess {
                parent: "organization".to_string(),
                message: describe_sdk_error(&e),
            })?;

            accounts.extend(page.accounts().iter().filter_map(account_from_sdk));
        }

        info!(count = accounts.len(), "Listed all organization accounts");
        Ok(accounts)
    }

    async fn list_direct_accounts(
        &self,
        parent_id: &str,
    ) -> Result<Vec<Account>, UnusedCredentialsError> {
        let mut accounts = Vec::new();
        let mut pages = self
            .client
            .list_accounts_for_parent()
            .parent_id(parent_id)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| UnusedCredentialsError::OrganizationsAccess {
                parent: parent_id.to_string(),
                message: describe_sdk_error(&e),
            })?;

            accounts.extend(page.accounts().iter().filter_map(account_from_sdk));
        }

        Ok(accounts)
    }

    async fn list_child_units(
        &self,
        parent_id: &str,
    ) -> Result<Vec<String>, UnusedCredentialsError> {
        let mut children = Vec::new();
        let mut pages = self
            .client
            .list_children()
            .parent_id(parent_id)
            .child_type(ChildType::OrganizationalUnit)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| UnusedCredentialsError::OrganizationsAccess {
                parent: parent_id.to_string(),
                message: describe_sdk_error(&e),
            })?;

            children.extend(
                page.children()
                    .iter()
                    .filter_map(|child| child.id().map(str::to_string)),
            );
        }

        Ok(children)
    }
}

#[async_trait]
impl OrganizationLister for AwsOrganizationLister {
    async fn list_accounts(
        &self,
        parent_id: Option<&str>,
    ) -> Result<Vec<Account>, UnusedCredentialsError> {
        let Some(root) = parent_id else {
            return self.list_all().await;
        };

        info!(parent = %root, "Searching for accounts in OU");

        let mut accounts = Vec::new();
        let mut pending = VecDeque::from([root.to_string()]);

        while let Some(parent) = pending.pop_front() {
            let direct = self.list_direct_accounts(&parent).await?;
            debug!(parent = %parent, count = direct.len(), "Listed accounts directly in OU");
            accounts.extend(direct);

            for child in self.list_child_units(&parent).await? {
                info!(parent = %parent, child = %child, "Adding accounts from child OU");
                pending.push_back(child);
            }
        }

        info!(parent = %root, count = accounts.len(), "Found accounts in OU");
        Ok(accounts)
    }
}

fn account_from_sdk(account: &aws_sdk_organizations::types::Account) -> Option<Account> {
    let Some(id) = account.id() else {
        warn!("Organizations returned an account without an id, ignoring it");
        return None;
    };

    // `State` replaced the retired `Status` field; older responses only carry the latter
    #[allow(deprecated)]
    let raw = account
        .state()
        .map(|s| s.as_str())
        .or_else(|| account.status().map(|s| s.as_str()));

    let status = match raw {
        Some(raw) => AccountStatus::parse(raw),
        None => {
            warn!(account_id = %id, "Organizations returned no state for account");
            AccountStatus::Other("UNKNOWN".to_string())
        }
    };

    Some(Account {
        id: id.to_string(),
        name: account.name().map(str::to_string),
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_organizations::types::{AccountState, AccountStatus as SdkAccountStatus};

    #[test]
    fn test_account_from_sdk_reads_state() {
        let sdk = aws_sdk_organizations::types::Account::builder()
            .id("111111111111")
            .name("workloads-prod")
            .state(AccountState::Suspended)
            .build();

        let account = account_from_sdk(&sdk).unwrap();
        assert_eq!(account.id, "111111111111");
        assert_eq!(account.name.as_deref(), Some("workloads-prod"));
        assert_eq!(account.status, AccountStatus::Suspended);
        assert!(!account.is_active());
    }

    #[test]
    fn test_state_takes_precedence_over_legacy_status() {
        #[allow(deprecated)]
        let sdk = aws_sdk_organizations::types::Account::builder()
            .id("111111111111")
            .state(AccountState::Closed)
            .status(SdkAccountStatus::Active)
            .build();

        assert_eq!(account_from_sdk(&sdk).unwrap().status, AccountStatus::Closed);
    }

    #[test]
    fn test_legacy_status_used_when_state_missing() {
        #[allow(deprecated)]
        let sdk = aws_sdk_organizations::types::Account::builder()
            .id("111111111111")
            .status(SdkAccountStatus::PendingClosure)
            .build();

        assert_eq!(
            account_from_sdk(&sdk).unwrap().status,
            AccountStatus::PendingClosure
        );
    }

    #[test]
    fn test_account_without_id_is_ignored() {
        let sdk = aws_sdk_organizations::types::Account::builder()
            .name("orphan")
            .build();
        assert!(account_from_sdk(&sdk).is_none());
    }

    #[test]
    fn test_account_without_state_is_not_active() {
        let sdk = aws_sdk_organizations::types::Account::builder()
            .id("222222222222")
            .build();

        let account = account_from_sdk(&sdk).unwrap();
        assert_eq!(account.status, AccountStatus::Other("UNKNOWN".to_string()));
        assert!(!account.is_active());
    }
}
