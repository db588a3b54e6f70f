//! One polling cycle: every account in parallel, then merge.

use fleetsync_types::{AccountConfig, FetchOutcome, TrackedEntity, TrackerError};
use futures::future::join_all;

use super::Poller;
use crate::sync::normalizer::{merge_outcomes, normalize};

/// Result of one cycle before it is published.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub cycle: u64,
    /// Merged entities of every successful account, in account order
    pub entities: Vec<TrackedEntity>,
    pub error: Option<String>,
    pub outcomes: Vec<FetchOutcome>,
}

impl CycleReport {
    pub fn failed_accounts(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().filter(|o| !o.success).map(|o| o.label.as_str())
    }
}

impl Poller {
    /// Poll every configured account concurrently and merge the results.
    ///
    /// The account list is captured once at the start; changes made while the
    /// cycle is running apply to the next one. One account failing never
    /// affects the others.
    pub async fn run_cycle(&self) -> CycleReport {
        let cycle = self.next_cycle();
        let accounts = self.registry.snapshot();

        self.snapshot_tx.send_modify(|s| s.loading = true);
        tracing::debug!("[cycle {}] polling {} account(s)", cycle, accounts.len());

        let outcomes = join_all(accounts.iter().map(|account| self.poll_account(account))).await;
        let (entities, error) = merge_outcomes(&outcomes);

        match &error {
            Some(message) => tracing::warn!("[cycle {}] {} entities, errors: {}", cycle, entities.len(), message),
            None => tracing::debug!("[cycle {}] {} entities", cycle, entities.len()),
        }

        CycleReport { cycle, entities, error, outcomes }
    }

    async fn poll_account(&self, account: &AccountConfig) -> FetchOutcome {
        if !account.has_credentials() {
            tracing::debug!("Account {} has no credentials, skipping", account.label);
            return FetchOutcome::skipped(&account.label);
        }

        let limit = self.config.account_timeout;
        let result = match tokio::time::timeout(limit, self.poll_account_inner(account)).await {
            Ok(result) => result,
            Err(_) => Err(TrackerError::Timeout {
                account: account.label.clone(),
                timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            }),
        };

        match result {
            Ok(entities) => FetchOutcome::success(&account.label, entities),
            Err(e) => {
                if e.invalidates_session() {
                    self.sessions.invalidate(&account.label);
                }
                tracing::warn!("{}", e);
                FetchOutcome::failure(e)
            },
        }
    }

    async fn poll_account_inner(&self, account: &AccountConfig) -> Result<Vec<TrackedEntity>, TrackerError> {
        let session = match self.sessions.get(&account.label) {
            Some(session) => session,
            None => {
                let session = self.backend.authenticate(account).await?;
                // Account replaced or removed mid-login: use the session once, do not keep it.
                self.registry.store_session(account, session.clone());
                tracing::info!("Authenticated {}", account.label);
                session
            },
        };

        let reports = self.backend.fetch_positions(account, &session).await?;
        Ok(normalize(&reports, &account.label))
    }
}
