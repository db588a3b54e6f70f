use crate::error::ClientError;
use crate::types::*;
use fleetsync_types::SessionCredential;
use reqwest::Client;
use serde_json::Value;

pub struct WhatsGpsClient {
    client: Client,
    config: ClientConfig,
}

/// Result of a single login variant that reached the backend.
enum LoginReply {
    Accepted(SessionCredential),
    Rejected(String),
}

impl WhatsGpsClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if reqwest::Url::parse(&base_url).is_err() {
            return Err(ClientError::InvalidBaseUrl(config.base_url));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config: ClientConfig { base_url, ..config } })
    }

    /// Exchange an account login and secret for a session credential.
    ///
    /// Tries every [`LoginVariant`] in table order and stops at the first one
    /// the backend accepts. Each variant is a single request; transport errors
    /// only move on to the next variant.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionCredential, ClientError> {
        if username.is_empty() || password.is_empty() {
            return Err(ClientError::MissingCredentials);
        }

        let variants = login_variants();
        let mut last_reply = None;

        for (attempt, variant) in variants.iter().enumerate() {
            tracing::debug!(
                "[login] attempt {} ({:?}): {}/{}",
                attempt + 1,
                variant.encoding,
                variant.username_field,
                variant.password_field
            );

            match self.login_once(variant, username, password).await {
                Ok(LoginReply::Accepted(session)) => {
                    tracing::debug!(
                        "[login] accepted with {:?} {}/{}",
                        variant.encoding,
                        variant.username_field,
                        variant.password_field
                    );
                    return Ok(session);
                },
                Ok(LoginReply::Rejected(reply)) => {
                    tracing::debug!("[login] server reply (not success): {}", reply);
                    last_reply = Some(reply);
                },
                Err(e) => {
                    tracing::debug!("[login] request error: {}", e);
                    last_reply = Some(e.to_string());
                },
            }
        }

        Err(ClientError::LoginRejected { attempts: variants.len(), last_reply })
    }

    async fn login_once(
        &self,
        variant: &LoginVariant,
        username: &str,
        password: &str,
    ) -> Result<LoginReply, ClientError> {
        let payload = variant.payload(username, password);
        let request = self.client.post(format!("{}{}", self.config.base_url, LOGIN_PATH));

        let request = match variant.encoding {
            BodyEncoding::Form => request.form(&payload),
            BodyEncoding::Json => {
                let body: serde_json::Map<String, Value> = payload
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                    .collect();
                request.json(&body)
            },
        };

        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Ok(LoginReply::Rejected(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        let Ok(envelope) = serde_json::from_str::<ApiEnvelope>(&body) else {
            return Ok(LoginReply::Rejected(body));
        };

        if !envelope.is_success() {
            return Ok(LoginReply::Rejected(body));
        }

        match envelope.data.as_ref().and_then(session_from_login_data) {
            Some(session) => Ok(LoginReply::Accepted(session)),
            None => Ok(LoginReply::Rejected(body)),
        }
    }

    /// Fetch the current raw position reports of every device of the session's user.
    pub async fn fetch_positions(
        &self,
        session: &SessionCredential,
    ) -> Result<Vec<RawPositionReport>, ClientError> {
        if !session.is_usable() {
            return Err(ClientError::MissingCredentials);
        }

        let resp = self
            .client
            .get(format!("{}{}", self.config.base_url, STATUS_PATH))
            .query(&[("targetUserId", session.user_id.as_str()), ("mapType", MAP_TYPE)])
            .header("token", session.token.as_str())
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(ClientError::Api { status: status.as_u16(), payload: body });
        }

        let envelope = match serde_json::from_str::<ApiEnvelope>(&body) {
            Ok(envelope) if envelope.is_success() => envelope,
            _ => return Err(ClientError::Api { status: status.as_u16(), payload: body }),
        };

        match envelope.data {
            Some(Value::Array(reports)) => Ok(reports),
            other => {
                tracing::debug!("[positions] non-array data treated as empty: {:?}", other);
                Ok(Vec::new())
            },
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

fn session_from_login_data(data: &Value) -> Option<SessionCredential> {
    let token = scalar_to_string(data.get("token")?)?;
    let user_id = scalar_to_string(data.get("userId")?)?;
    let session = SessionCredential::new(token, user_id);
    session.is_usable().then_some(session)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
