//! Twilio transport — sends messages via the Messages API and downloads
//! webhook media with basic auth.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::TransportError;
use crate::transport::Transport;

/// Media downloads get a bounded wait; Twilio serves them slowly at times.
const MEDIA_DOWNLOAD_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Twilio error code for the sandbox daily message quota.
const DAILY_LIMIT_ERROR_CODE: i64 = 63038;

/// Twilio REST transport.
pub struct TwilioTransport {
    account_sid: String,
    auth_token: SecretString,
    from: String,
    client: reqwest::Client,
}

impl TwilioTransport {
    pub fn new(account_sid: String, auth_token: SecretString, from: String) -> Self {
        Self {
            account_sid,
            auth_token,
            from,
            client: reqwest::Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        )
    }
}

/// Error body returned by the Messages API.
#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

/// Whether an API error body is the daily-quota condition.
fn is_daily_limit(status: reqwest::StatusCode, body: &TwilioErrorBody) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || body.code == Some(DAILY_LIMIT_ERROR_CODE)
        || body.message.contains("daily messages limit")
}

#[async_trait]
impl Transport for TwilioTransport {
    async fn send_message(&self, to: &str, body: &str) -> Result<(), TransportError> {
        let form = [("From", self.from.as_str()), ("To", to), ("Body", body)];

        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&form)
            .send()
            .await
            .map_err(|e| TransportError::SendFailed {
                to: to.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let raw = resp.text().await.unwrap_or_default();
        let parsed: TwilioErrorBody = serde_json::from_str(&raw).unwrap_or(TwilioErrorBody {
            code: None,
            message: raw.clone(),
        });

        if is_daily_limit(status, &parsed) {
            return Err(TransportError::RateLimited {
                to: to.to_string(),
            });
        }

        Err(TransportError::SendFailed {
            to: to.to_string(),
            reason: format!("Messages API returned {status}: {}", parsed.message),
        })
    }

    async fn fetch_media(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let resp = self
            .client
            .get(url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .timeout(MEDIA_DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| TransportError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(TransportError::DownloadFailed {
                url: url.to_string(),
                reason: format!("media endpoint returned {}", resp.status()),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TransportError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_code_is_daily_limit() {
        let body = TwilioErrorBody {
            code: Some(63038),
            message: "Account exceeded the 50 daily messages limit".into(),
        };
        assert!(is_daily_limit(reqwest::StatusCode::BAD_REQUEST, &body));
    }

    #[test]
    fn quota_message_without_code_is_daily_limit() {
        let body = TwilioErrorBody {
            code: None,
            message: "Account exceeded the 50 daily messages limit".into(),
        };
        assert!(is_daily_limit(reqwest::StatusCode::BAD_REQUEST, &body));
    }

    #[test]
    fn http_429_is_daily_limit() {
        let body = TwilioErrorBody {
            code: None,
            message: String::new(),
        };
        assert!(is_daily_limit(reqwest::StatusCode::TOO_MANY_REQUESTS, &body));
    }

    #[test]
    fn ordinary_error_is_not_daily_limit() {
        let body = TwilioErrorBody {
            code: Some(21211),
            message: "Invalid 'To' phone number".into(),
        };
        assert!(!is_daily_limit(reqwest::StatusCode::BAD_REQUEST, &body));
    }
}
