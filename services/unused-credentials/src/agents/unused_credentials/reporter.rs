//! Scan reporting
//!
//! Writes the per-account summary and the stale-user list to the log, then
//! forwards the stale users to the action queue.

use tracing::{info, warn};

use super::action_queue::ActionQueue;
use super::types::{AccountScanStatus, ScanReport};

pub struct Reporter {
    action_queue: Box<dyn ActionQueue>,
}

impl Reporter {
    pub fn new(action_queue: Box<dyn ActionQueue>) -> Self {
        Self { action_queue }
    }

    /// Log the report and hand the stale users to the queue
    ///
    /// A queue failure is logged; it never fails the scan.
    pub async fn publish(&self, report: &ScanReport) {
        log_report(report);

        if let Err(e) = self.action_queue.submit(&report.stale_users).await {
            warn!(
                scan_id = %report.scan_id,
                stage = %e.stage(),
                error = %e,
                "Failed to forward stale users to the action queue"
            );
        }
    }
}

fn log_report(report: &ScanReport) {
    for account in &report.accounts {
        match &account.status {
            AccountScanStatus::Scanned => info!(
                scan_id = %report.scan_id,
                account_id = %account.account_id,
                account_name = account.account_name.as_deref().unwrap_or(""),
                users = account.users_evaluated,
                stale = account.stale_users,
                skipped_users = account.users_skipped,
                "Account scanned"
            ),
            AccountScanStatus::Skipped { stage, reason } => warn!(
                scan_id = %report.scan_id,
                account_id = %account.account_id,
                stage = %stage,
                reason = %reason,
                "Account skipped"
            ),
        }
    }

    for record in &report.stale_users {
        info!(
            scan_id = %report.scan_id,
            account_id = %record.account_id,
            user = %record.user_name,
            days_stale = %record.days_stale,
            "Stale IAM user"
        );
    }

    info!(
        scan_id = %report.scan_id,
        threshold_days = report.threshold_days,
        accounts_scanned = report.accounts_scanned(),
        accounts_skipped = report.accounts_skipped(),
        users_evaluated = report.users_evaluated(),
        stale_users = report.stale_users.len(),
        duration_ms = (report.completed_at - report.started_at).num_milliseconds(),
        "Unused credentials scan complete"
    );
}
