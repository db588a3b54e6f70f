use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.whatsgps.com";

pub(crate) const LOGIN_PATH: &str = "/user/login.do";
pub(crate) const STATUS_PATH: &str = "/carStatus/getByUserId.do";

/// Username field synonyms accepted by different backend deployments, in probe order.
pub const USERNAME_FIELDS: &[&str] = &["name", "username", "userName", "phone", "account", "user"];

/// Password field synonyms, in probe order.
pub const PASSWORD_FIELDS: &[&str] = &["password", "pwd", "pass"];

/// Fields sent with every login payload.
pub const LOGIN_BASE_FIELDS: &[(&str, &str)] = &[("timeZoneSecond", "0"), ("lang", "en")];

/// Map type requested with position reports (2 = Google/WGS84 coordinates).
pub const MAP_TYPE: &str = "2";

/// Raw position report as returned by the backend. Shape varies by version.
pub type RawPositionReport = serde_json::Value;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), timeout: Duration::from_secs(10) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyEncoding {
    Form,
    Json,
}

/// One entry of the login strategy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginVariant {
    pub username_field: &'static str,
    pub password_field: &'static str,
    pub encoding: BodyEncoding,
}

impl LoginVariant {
    /// Payload fields for this variant, base fields first.
    pub fn payload<'a>(&self, username: &'a str, password: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut fields: Vec<(&'static str, &'a str)> = LOGIN_BASE_FIELDS.to_vec();
        fields.push((self.username_field, username));
        fields.push((self.password_field, password));
        fields
    }
}

/// The full strategy table: every username/password synonym pair,
/// form-encoded variants before JSON ones.
pub fn login_variants() -> Vec<LoginVariant> {
    [BodyEncoding::Form, BodyEncoding::Json]
        .into_iter()
        .flat_map(|encoding| {
            USERNAME_FIELDS.iter().copied().flat_map(move |username_field| {
                PASSWORD_FIELDS.iter().copied().map(move |password_field| LoginVariant {
                    username_field,
                    password_field,
                    encoding,
                })
            })
        })
        .collect()
}

/// Common `{ret, msg, data}` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiEnvelope {
    #[serde(default)]
    pub ret: Option<serde_json::Value>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl ApiEnvelope {
    pub fn is_success(&self) -> bool {
        self.ret.as_ref().and_then(serde_json::Value::as_i64) == Some(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_table_order() {
        let variants = login_variants();
        assert_eq!(variants.len(), USERNAME_FIELDS.len() * PASSWORD_FIELDS.len() * 2);

        let first = variants[0];
        assert_eq!(first.username_field, "name");
        assert_eq!(first.password_field, "password");
        assert_eq!(first.encoding, BodyEncoding::Form);

        let first_json = variants[18];
        assert_eq!(first_json.encoding, BodyEncoding::Json);
        assert_eq!(first_json.username_field, "name");

        let last = variants[variants.len() - 1];
        assert_eq!(last.username_field, "user");
        assert_eq!(last.password_field, "pass");
        assert_eq!(last.encoding, BodyEncoding::Json);
    }

    #[test]
    fn test_payload_contains_base_fields() {
        let variant = login_variants()[4];
        let payload = variant.payload("u", "p");
        assert_eq!(
            payload,
            vec![("timeZoneSecond", "0"), ("lang", "en"), ("username", "u"), ("pwd", "p")]
        );
    }

    #[test]
    fn test_envelope_success_requires_numeric_one() {
        let ok: ApiEnvelope = serde_json::from_str(r#"{"ret":1,"data":[]}"#).unwrap();
        let string_one: ApiEnvelope = serde_json::from_str(r#"{"ret":"1"}"#).unwrap();
        let missing: ApiEnvelope = serde_json::from_str(r#"{"msg":"x"}"#).unwrap();

        assert!(ok.is_success());
        assert!(!string_one.is_success());
        assert!(!missing.is_success());
    }
}
