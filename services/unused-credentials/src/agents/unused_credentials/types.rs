//! Types for the unused credentials scan
//!
//! Accounts, assumed sessions, IAM users and the stale-user findings that
//! flow from the Organizations listing through to the report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle state of an account as reported by AWS Organizations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Suspended,
    PendingClosure,
    PendingActivation,
    Closed,
    /// Missing, or a value not known to this build
    Other(String),
}

impl AccountStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "ACTIVE" => AccountStatus::Active,
            "SUSPENDED" => AccountStatus::Suspended,
            "PENDING_CLOSURE" => AccountStatus::PendingClosure,
            "PENDING_ACTIVATION" => AccountStatus::PendingActivation,
            "CLOSED" => AccountStatus::Closed,
            other => AccountStatus::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "ACTIVE"),
            AccountStatus::Suspended => write!(f, "SUSPENDED"),
            AccountStatus::PendingClosure => write!(f, "PENDING_CLOSURE"),
            AccountStatus::PendingActivation => write!(f, "PENDING_ACTIVATION"),
            AccountStatus::Closed => write!(f, "CLOSED"),
            AccountStatus::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// A member account of the organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// 12-digit account ID
    pub id: String,
    /// Friendly account name
    pub name: Option<String>,
    pub status: AccountStatus,
}

impl Account {
    /// Create an active account
    pub fn active(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            status: AccountStatus::Active,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Temporary credentials for one account, valid for this invocation only
#[derive(Clone)]
pub struct AssumedSession {
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

// Never print the secret halves of the credential triple
impl std::fmt::Debug for AssumedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssumedSession")
            .field("account_id", &self.account_id)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// When a user last signed in to the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "at")]
pub enum LastLogin {
    Never,
    At(DateTime<Utc>),
}

/// An IAM user snapshot taken during the scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamUser {
    pub user_name: String,
    pub account_id: String,
    pub arn: Option<String>,
    pub last_login: LastLogin,
}

impl IamUser {
    pub fn new(
        user_name: impl Into<String>,
        account_id: impl Into<String>,
        last_login: LastLogin,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            account_id: account_id.into(),
            arn: None,
            last_login,
        }
    }
}

/// How long a user has gone without a console sign-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DaysStale {
    Never,
    Days(i64),
}

impl std::fmt::Display for DaysStale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DaysStale::Never => write!(f, "never"),
            DaysStale::Days(days) => write!(f, "{}", days),
        }
    }
}

/// A user that never signed in, or has not within the threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleUserRecord {
    pub user_name: String,
    pub account_id: String,
    pub days_stale: DaysStale,
}

impl StaleUserRecord {
    pub fn new(
        user_name: impl Into<String>,
        account_id: impl Into<String>,
        days_stale: DaysStale,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            account_id: account_id.into(),
            days_stale,
        }
    }
}

/// Pipeline stage an error or skip happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStage {
    Configuration,
    ListAccounts,
    AccountStatus,
    AssumeRole,
    ListUsers,
    EvaluateUser,
    ActionQueue,
}

impl std::fmt::Display for ScanStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScanStage::Configuration => "configuration",
            ScanStage::ListAccounts => "list_accounts",
            ScanStage::AccountStatus => "account_status",
            ScanStage::AssumeRole => "assume_role",
            ScanStage::ListUsers => "list_users",
            ScanStage::EvaluateUser => "evaluate_user",
            ScanStage::ActionQueue => "action_queue",
        };
        write!(f, "{}", name)
    }
}

/// What happened to one account during the scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum AccountScanStatus {
    Scanned,
    Skipped { stage: ScanStage, reason: String },
}

/// Per-account summary line of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountOutcome {
    pub account_id: String,
    pub account_name: Option<String>,
    pub users_evaluated: usize,
    pub stale_users: usize,
    /// Users left out because their sign-in timestamp could not be read
    pub users_skipped: usize,
    #[serde(flatten)]
    pub status: AccountScanStatus,
}

impl AccountOutcome {
    pub fn skipped(account: &Account, stage: ScanStage, reason: impl Into<String>) -> Self {
        Self {
            account_id: account.id.clone(),
            account_name: account.name.clone(),
            users_evaluated: 0,
            stale_users: 0,
            users_skipped: 0,
            status: AccountScanStatus::Skipped {
                stage,
                reason: reason.into(),
            },
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, AccountScanStatus::Skipped { .. })
    }
}

/// Result of one complete scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub threshold_days: u32,
    pub accounts: Vec<AccountOutcome>,
    pub stale_users: Vec<StaleUserRecord>,
}

impl ScanReport {
    pub fn accounts_scanned(&self) -> usize {
        self.accounts.iter().filter(|a| !a.is_skipped()).count()
    }

    pub fn accounts_skipped(&self) -> usize {
        self.accounts.iter().filter(|a| a.is_skipped()).count()
    }

    pub fn users_evaluated(&self) -> usize {
        self.accounts.iter().map(|a| a.users_evaluated).sum()
    }

    /// Format the report for terminal output
    pub fn display(&self) -> String {
        let mut out = format!("Unused credentials scan {}\n", self.scan_id);
        out.push_str(&format!("  Threshold: {} days\n", self.threshold_days));
        out.push_str(&format!(
            "  Accounts scanned: {} (skipped: {})\n",
            self.accounts_scanned(),
            self.accounts_skipped()
        ));
        out.push_str(&format!("  Users evaluated: {}\n", self.users_evaluated()));

        out.push_str("\nAccounts:\n");
        for account in &self.accounts {
            match &account.status {
                AccountScanStatus::Scanned => out.push_str(&format!(
                    "  {:<14} users: {:<5} stale: {}\n",
                    account.account_id, account.users_evaluated, account.stale_users
                )),
                AccountScanStatus::Skipped { stage, reason } => out.push_str(&format!(
                    "  {:<14} skipped at {}: {}\n",
                    account.account_id, stage, reason
                )),
            }
        }

        out.push_str(&format!("\nStale users ({}):\n", self.stale_users.len()));
        for record in &self.stale_users {
            out.push_str(&format!(
                "  {:<14} {:<32} last login: {}\n",
                record.account_id,
                record.user_name,
                match record.days_stale {
                    DaysStale::Never => "never".to_string(),
                    DaysStale::Days(days) => format!("{} days ago", days),
                }
            ));
        }

        out
    }
}

/// Errors that can occur while scanning for unused credentials
#[derive(Debug, Error)]
pub enum UnusedCredentialsError {
    /// Configuration rejected before any AWS call
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Organizations listing failed; aborts the run
    #[error("Failed to list accounts under {parent}: {message}")]
    OrganizationsAccess { parent: String, message: String },

    /// Cross-account role could not be assumed
    #[error("Failed to assume {role_arn} in account {account_id}: {message}")]
    AssumeRole {
        account_id: String,
        role_arn: String,
        message: String,
    },

    /// Assumed role cannot list IAM users
    #[error("Failed to list IAM users in account {account_id}: {message}")]
    IamAccess { account_id: String, message: String },

    /// A user's sign-in timestamp is out of range
    #[error("Malformed last login timestamp for user {user_name} in account {account_id}")]
    MalformedTimestamp {
        account_id: String,
        user_name: String,
    },

    /// Downstream action queue refused the batch
    #[error("Action queue rejected {count} records: {message}")]
    ActionQueue { count: usize, message: String },
}

impl UnusedCredentialsError {
    pub fn stage(&self) -> ScanStage {
        match self {
            UnusedCredentialsError::InvalidConfig(_) => ScanStage::Configuration,
            UnusedCredentialsError::OrganizationsAccess { .. } => ScanStage::ListAccounts,
            UnusedCredentialsError::AssumeRole { .. } => ScanStage::AssumeRole,
            UnusedCredentialsError::IamAccess { .. } => ScanStage::ListUsers,
            UnusedCredentialsError::MalformedTimestamp { .. } => ScanStage::EvaluateUser,
            UnusedCredentialsError::ActionQueue { .. } => ScanStage::ActionQueue,
        }
    }

    /// Whether the error aborts the whole run rather than one account or user
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            UnusedCredentialsError::InvalidConfig(_)
                | UnusedCredentialsError::OrganizationsAccess { .. }
        )
    }

    /// Operator hint logged next to the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            UnusedCredentialsError::AssumeRole { .. } => {
                Some("check that the account has the cross-account audit role deployed")
            }
            UnusedCredentialsError::IamAccess { .. } => {
                Some("check that the audit role allows iam:ListUsers")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_status_parse() {
        assert_eq!(AccountStatus::parse("ACTIVE"), AccountStatus::Active);
        assert_eq!(AccountStatus::parse("SUSPENDED"), AccountStatus::Suspended);
        assert_eq!(
            AccountStatus::parse("PENDING_CLOSURE"),
            AccountStatus::PendingClosure
        );
        assert_eq!(AccountStatus::parse("CLOSED"), AccountStatus::Closed);
        assert_eq!(
            AccountStatus::parse("PENDING_ACTIVATION"),
            AccountStatus::PendingActivation
        );
        assert_eq!(
            AccountStatus::parse("SOMETHING_NEW"),
            AccountStatus::Other("SOMETHING_NEW".to_string())
        );
        assert!(Account::active("111111111111").is_active());
        assert!(!Account::active("111111111111")
            .with_status(AccountStatus::Suspended)
            .is_active());
    }

    #[test]
    fn test_assumed_session_debug_redacts_secrets() {
        let session = AssumedSession {
            account_id: "111111111111".to_string(),
            access_key_id: "ASIAEXAMPLE".to_string(),
            secret_access_key: "super-secret".to_string(),
            session_token: "token-value".to_string(),
            expires_at: None,
        };

        let rendered = format!("{:?}", session);
        assert!(rendered.contains("ASIAEXAMPLE"));
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("token-value"));
    }

    #[test]
    fn test_days_stale_display() {
        assert_eq!(DaysStale::Never.to_string(), "never");
        assert_eq!(DaysStale::Days(10).to_string(), "10");
    }

    #[test]
    fn test_stale_record_serialization() {
        let never = serde_json::to_value(StaleUserRecord::new("alice", "A1", DaysStale::Never))
            .unwrap();
        assert_eq!(never["days_stale"], "never");

        let days = serde_json::to_value(StaleUserRecord::new("carol", "A2", DaysStale::Days(10)))
            .unwrap();
        assert_eq!(days["days_stale"]["days"], 10);
    }

    #[test]
    fn test_error_stage_and_fatality() {
        let fatal = UnusedCredentialsError::OrganizationsAccess {
            parent: "ou-ab12-cdefgh34".to_string(),
            message: "AccessDenied".to_string(),
        };
        assert!(fatal.is_fatal());
        assert_eq!(fatal.stage(), ScanStage::ListAccounts);

        let scoped = UnusedCredentialsError::AssumeRole {
            account_id: "111111111111".to_string(),
            role_arn: "arn:aws:iam::111111111111:role/audit".to_string(),
            message: "AccessDenied".to_string(),
        };
        assert!(!scoped.is_fatal());
        assert_eq!(scoped.stage(), ScanStage::AssumeRole);
    }

    #[test]
    fn test_error_hint() {
        let assume = UnusedCredentialsError::AssumeRole {
            account_id: "111111111111".to_string(),
            role_arn: "arn:aws:iam::111111111111:role/audit".to_string(),
            message: "AccessDenied".to_string(),
        };
        assert!(assume.hint().unwrap().contains("cross-account audit role"));

        let config = UnusedCredentialsError::InvalidConfig("threshold_days".to_string());
        assert!(config.hint().is_none());
    }

    #[test]
    fn test_skipped_outcome_serializes_stage() {
        let outcome = AccountOutcome::skipped(
            &Account::active("111111111111"),
            ScanStage::AssumeRole,
            "AccessDenied",
        );
        let value = serde_json::to_value(&outcome).unwrap();

        assert_eq!(value["status"], "skipped");
        assert_eq!(value["stage"], "assume_role");
        assert_eq!(value["reason"], "AccessDenied");
        assert!(outcome.is_skipped());
    }
}
