//! Speech-to-text collaborator seam.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::TranscriptionError;

/// Transcription seam — audio bytes in, text out.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe audio to text. An empty transcription is an error.
    async fn transcribe(
        &self,
        audio: &[u8],
        language_hint: &str,
    ) -> Result<String, TranscriptionError>;
}

#[derive(Deserialize)]
struct TranscribeResponse {
    text: String,
}

/// Transcriber backed by a whisper-server style HTTP endpoint.
///
/// POSTs raw audio bytes to `{base_url}/transcribe?language={hint}` and
/// decodes `{"text": …}`.
pub struct HttpTranscriber {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTranscriber {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(
        &self,
        audio: &[u8],
        language_hint: &str,
    ) -> Result<String, TranscriptionError> {
        let resp = self
            .client
            .post(format!("{}/transcribe", self.base_url))
            .query(&[("language", language_hint)])
            .header("content-type", "application/octet-stream")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(TranscriptionError::RequestFailed(format!(
                "transcriber returned {status}: {body}"
            )));
        }

        let parsed: TranscribeResponse = resp
            .json()
            .await
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            return Err(TranscriptionError::EmptyResult);
        }
        Ok(text)
    }
}
