//! Unused Credentials Agent
//!
//! Finds IAM users across an AWS Organization that have never signed in to
//! the console, or have not signed in within a threshold of days.
//!
//! ## Flow
//!
//! 1. List member accounts from AWS Organizations (an OU and its children,
//!    or the whole organization)
//! 2. For each active account, assume the cross-account audit role via STS
//! 3. List the account's IAM users with their last console sign-in
//! 4. Keep the users that never signed in or are past the threshold
//! 5. Log the report and hand the stale users to the action queue
//!
//! A failure to list accounts aborts the run. Role or IAM failures skip that
//! account; an unreadable sign-in timestamp skips that user.
//!
//! ## Example Usage
//!
//! ```ignore
//! use unused_credentials::{ScanConfig, UnusedCredentialsAgent};
//!
//! let config = ScanConfig::new("unused-credentials-audit")
//!     .organizational_unit("ou-ab12-cdefgh34")
//!     .threshold_days(90);
//!
//! let agent = UnusedCredentialsAgent::new(config).await?;
//! let report = agent.scan().await?;
//! println!("{}", report.display());
//! ```

pub mod action_queue;
pub mod assume_role;
pub mod iam;
pub mod organizations;
pub mod reporter;
pub mod staleness;
pub mod types;

pub use action_queue::{ActionQueue, LoggingActionQueue};
pub use assume_role::{RoleAssumer, StsRoleAssumer};
pub use iam::{AwsUserInspector, UserInspector, UserListing};
pub use organizations::{AwsOrganizationLister, OrganizationLister};
pub use reporter::Reporter;
pub use types::*;

use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_sts::error::DisplayErrorContext;
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::ScanConfig;

/// Unused Credentials Agent
///
/// Runs one sequential scan per call; nothing is kept between scans.
pub struct UnusedCredentialsAgent {
    config: ScanConfig,
    organizations: Box<dyn OrganizationLister>,
    roles: Box<dyn RoleAssumer>,
    users: Box<dyn UserInspector>,
    reporter: Reporter,
}

impl UnusedCredentialsAgent {
    /// Create an agent backed by AWS, using the default credential chain
    ///
    /// The caller's identity must be allowed to list Organizations accounts
    /// and to assume the audit role in every member account.
    pub async fn new(config: ScanConfig) -> Result<Self, UnusedCredentialsError> {
        config.validate()?;

        let sdk_config = load_sdk_config(config.max_attempts).await;

        let organizations = AwsOrganizationLister::new(&sdk_config);
        let roles = StsRoleAssumer::new(
            &sdk_config,
            &config.assumed_role_name,
            &config.role_session_name,
            config.partition.as_deref(),
        );
        let users = AwsUserInspector::new(&sdk_config);

        info!(
            ou = config.organizational_unit_id.as_deref().unwrap_or("<organization>"),
            role = %config.assumed_role_name,
            threshold_days = config.staleness_threshold_days,
            "UnusedCredentialsAgent initialized"
        );

        Ok(Self::with_components(
            config,
            Box::new(organizations),
            Box::new(roles),
            Box::new(users),
            Box::new(LoggingActionQueue::new()),
        ))
    }

    /// Create an agent from explicit components
    pub fn with_components(
        config: ScanConfig,
        organizations: Box<dyn OrganizationLister>,
        roles: Box<dyn RoleAssumer>,
        users: Box<dyn UserInspector>,
        action_queue: Box<dyn ActionQueue>,
    ) -> Self {
        Self {
            config,
            organizations,
            roles,
            users,
            reporter: Reporter::new(action_queue),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Execute a full scan evaluated against the current time
    pub async fn scan(&self) -> Result<ScanReport, UnusedCredentialsError> {
        self.scan_at(Utc::now()).await
    }

    /// Execute a full scan, measuring staleness against `now`
    pub async fn scan_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ScanReport, UnusedCredentialsError> {
        let scan_id = Uuid::new_v4();
        let started_at = Utc::now();
        let threshold_days = self.config.staleness_threshold_days;

        info!(scan_id = %scan_id, threshold_days, "Starting unused credentials scan");

        let accounts = self
            .organizations
            .list_accounts(self.config.organizational_unit_id.as_deref())
            .await
            .map_err(|e| {
                error!(
                    scan_id = %scan_id,
                    stage = %e.stage(),
                    error = %e,
                    "Account listing failed, aborting scan"
                );
                e
            })?;

        let mut outcomes = Vec::with_capacity(accounts.len());
        let mut stale_users = Vec::new();

        for account in &accounts {
            if !account.is_active() {
                info!(
                    account_id = %account.id,
                    status = %account.status,
                    "Skipping account that is not active"
                );
                outcomes.push(AccountOutcome::skipped(
                    account,
                    ScanStage::AccountStatus,
                    format!("account status is {}", account.status),
                ));
                continue;
            }

            info!(account_id = %account.id, "Currently evaluating account");

            match self.scan_account(account, now).await {
                Ok((outcome, records)) => {
                    outcomes.push(outcome);
                    stale_users.extend(records);
                }
                Err(e) => {
                    warn!(
                        account_id = %account.id,
                        stage = %e.stage(),
                        error = %e,
                        hint = e.hint().unwrap_or_default(),
                        "Skipping account"
                    );
                    outcomes.push(AccountOutcome::skipped(account, e.stage(), e.to_string()));
                }
            }
        }

        let report = ScanReport {
            scan_id,
            started_at,
            completed_at: Utc::now(),
            threshold_days,
            accounts: outcomes,
            stale_users,
        };

        self.reporter.publish(&report).await;

        Ok(report)
    }

    /// Assume the role in one account and evaluate all of its users
    async fn scan_account(
        &self,
        account: &Account,
        now: DateTime<Utc>,
    ) -> Result<(AccountOutcome, Vec<StaleUserRecord>), UnusedCredentialsError> {
        let session = self.roles.assume(&account.id).await?;
        let listing = self.users.list_users(&session).await?;

        if listing.is_empty() {
            info!(account_id = %account.id, "There are no users in this account");
        } else {
            info!(
                account_id = %account.id,
                users = listing.len(),
                "Evaluating users in this account"
            );
        }

        let mut records = Vec::new();
        let mut evaluated = 0;
        let mut skipped = 0;

        for entry in listing {
            match entry {
                Ok(user) => {
                    evaluated += 1;
                    if let Some(record) =
                        staleness::evaluate(&user, self.config.staleness_threshold_days, now)
                    {
                        records.push(record);
                    }
                }
                Err(e) => {
                    skipped += 1;
                    warn!(
                        account_id = %account.id,
                        stage = %e.stage(),
                        error = %e,
                        "Skipping user"
                    );
                }
            }
        }

        let outcome = AccountOutcome {
            account_id: account.id.clone(),
            account_name: account.name.clone(),
            users_evaluated: evaluated,
            stale_users: records.len(),
            users_skipped: skipped,
            status: AccountScanStatus::Scanned,
        };

        Ok((outcome, records))
    }
}

/// Default credential chain and region, standard retry mode
pub async fn load_sdk_config(max_attempts: u32) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .retry_config(RetryConfig::standard().with_max_attempts(max_attempts))
        .load()
        .await
}

/// Render an SDK error with its full source chain
pub(crate) fn describe_sdk_error<E: std::error::Error>(err: &E) -> String {
    DisplayErrorContext(err).to_string()
}

pub(crate) fn to_utc(ts: &aws_sdk_iam::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts.secs(), ts.subsec_nanos())
}
