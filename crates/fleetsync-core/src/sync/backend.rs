//! Seam between the orchestrator and the upstream tracking backend.

use async_trait::async_trait;
use fleetsync_types::{AccountConfig, SessionCredential, TrackerError};
use whatsgps_client::{ClientError, RawPositionReport, WhatsGpsClient};

use super::classify::is_session_failure;

/// Upstream operations the orchestrator needs for one account.
///
/// Errors are already classified: a fetch failure that means "session no
/// longer valid" must come back as [`TrackerError::SessionExpired`].
#[async_trait]
pub trait TrackingBackend: Send + Sync {
    async fn authenticate(&self, account: &AccountConfig) -> Result<SessionCredential, TrackerError>;

    async fn fetch_positions(
        &self,
        account: &AccountConfig,
        session: &SessionCredential,
    ) -> Result<Vec<RawPositionReport>, TrackerError>;
}

#[async_trait]
impl TrackingBackend for WhatsGpsClient {
    async fn authenticate(&self, account: &AccountConfig) -> Result<SessionCredential, TrackerError> {
        self.login(&account.account_id, &account.secret).await.map_err(|e| TrackerError::Auth {
            account: account.label.clone(),
            message: e.to_string(),
        })
    }

    async fn fetch_positions(
        &self,
        account: &AccountConfig,
        session: &SessionCredential,
    ) -> Result<Vec<RawPositionReport>, TrackerError> {
        WhatsGpsClient::fetch_positions(self, session)
            .await
            .map_err(|e| classify_fetch_error(&account.label, e))
    }
}

pub(crate) fn classify_fetch_error(label: &str, err: ClientError) -> TrackerError {
    let account = label.to_string();
    match err {
        ClientError::Api { payload, .. } if is_session_failure(&payload) => {
            TrackerError::SessionExpired { account, payload }
        },
        ClientError::Api { payload, .. } => TrackerError::Api { account, payload },
        ClientError::MissingCredentials => {
            TrackerError::SessionExpired { account, payload: "session credential is empty".to_string() }
        },
        ClientError::Request(e) => TrackerError::Network { account, message: e.to_string() },
        other => TrackerError::Api { account, payload: other.to_string() },
    }
}
