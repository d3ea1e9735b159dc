//! Service configuration, assembled from environment variables.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Twilio account SID (also the basic-auth user for media downloads).
    pub twilio_account_sid: String,
    /// Twilio auth token.
    pub twilio_auth_token: SecretString,
    /// Sender identity for outbound messages (e.g. "whatsapp:+1234567890").
    pub twilio_from: String,
    /// Base URL of the transcription collaborator.
    pub transcriber_url: String,
    /// Language hint passed to the transcriber.
    pub language_hint: String,
    /// Base URL of the classification collaborator.
    pub classifier_url: String,
    /// Path to the local database file.
    pub db_path: PathBuf,
    /// Directory where downloaded voice notes are cached.
    pub audio_dir: PathBuf,
    /// Listen address for the webhook/admin server.
    pub bind_addr: String,
    /// Extra notification recipients merged into every fan-out, after
    /// the shopkeeper pool. Comma-separated identities.
    pub extra_recipients: Vec<String>,
}

impl Config {
    /// Build configuration from the environment.
    ///
    /// Transport credentials are required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let twilio_account_sid = require_env("TWILIO_ACCOUNT_SID")?;
        let twilio_auth_token = SecretString::from(require_env("TWILIO_AUTH_TOKEN")?);
        let twilio_from = std::env::var("TWILIO_PHONE")
            .unwrap_or_else(|_| "whatsapp:+1234567890".to_string());

        let transcriber_url = std::env::var("KIRANA_TRANSCRIBER_URL")
            .unwrap_or_else(|_| "http://localhost:9000".to_string());
        let language_hint =
            std::env::var("KIRANA_LANGUAGE").unwrap_or_else(|_| "en".to_string());
        let classifier_url = std::env::var("KIRANA_CLASSIFIER_URL")
            .unwrap_or_else(|_| "http://localhost:9100".to_string());

        let db_path = std::env::var("KIRANA_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/kirana-relay.db"));
        let audio_dir = std::env::var("KIRANA_AUDIO_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./audio_cache"));

        let bind_addr =
            std::env::var("KIRANA_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5001".to_string());

        let extra_recipients = std::env::var("KIRANA_EXTRA_RECIPIENTS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            twilio_account_sid,
            twilio_auth_token,
            twilio_from,
            transcriber_url,
            language_hint,
            classifier_url,
            db_path,
            audio_dir,
            bind_addr,
            extra_recipients,
        })
    }
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_is_an_error() {
        // Serialized via the env var name — no other test touches it.
        unsafe { std::env::remove_var("TWILIO_ACCOUNT_SID") };
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "TWILIO_ACCOUNT_SID"));
    }
}
