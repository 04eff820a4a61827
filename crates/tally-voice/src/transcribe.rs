//! Transcription Adapter: multipart upload to an OpenAI-compatible
//! `/audio/transcriptions` endpoint.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{
  Client,
  multipart::{Form, Part},
};
use serde::Deserialize;
use tally_core::{Error, Result};
use tracing::{debug, warn};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
  /// Full URL of the transcription endpoint.
  pub url:          Option<String>,
  pub api_key:      Option<String>,
  pub model:        String,
  pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
  fn default() -> Self {
    Self {
      url:          None,
      api_key:      None,
      model:        "whisper-1".to_owned(),
      timeout_secs: 30,
    }
  }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
  text: Option<String>,
}

/// The inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct Transcriber {
  client: Client,
  config: TranscriptionConfig,
}

impl Transcriber {
  pub fn new(config: TranscriptionConfig) -> reqwest::Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  /// Transcribe one recording. Empty audio is rejected before any request.
  pub async fn transcribe(
    &self,
    audio: Bytes,
    file_name: &str,
    content_type: Option<&str>,
  ) -> Result<String> {
    if audio.is_empty() {
      return Err(Error::EmptyAudio);
    }

    let url = self
      .config
      .url
      .as_deref()
      .filter(|u| !u.trim().is_empty())
      .ok_or(Error::MissingConfiguration("transcription.url"))?;
    let key = self
      .config
      .api_key
      .as_deref()
      .filter(|k| !k.trim().is_empty())
      .ok_or(Error::MissingConfiguration("transcription.api_key"))?;

    let size = audio.len();
    let mut part = Part::bytes(audio.to_vec()).file_name(file_name.to_owned());
    if let Some(mime) = content_type {
      part = part
        .mime_str(mime)
        .map_err(|e| Error::TranscriptionFailed(format!("bad content type {mime:?}: {e}")))?;
    }
    let form = Form::new()
      .part("file", part)
      .text("model", self.config.model.clone());

    debug!(bytes = size, file = file_name, "uploading audio for transcription");

    let resp = self
      .client
      .post(url)
      .bearer_auth(key)
      .multipart(form)
      .send()
      .await
      .map_err(|e| {
        warn!(error = %e, "transcription request failed");
        Error::TranscriptionFailed(e.to_string())
      })?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      warn!(%status, body = %body, "transcription endpoint returned an error");
      return Err(Error::TranscriptionFailed(format!("{status}")));
    }

    let parsed: TranscriptionResponse = resp
      .json()
      .await
      .map_err(|e| Error::TranscriptionFailed(format!("undecodable response: {e}")))?;

    parsed
      .text
      .map(|t| t.trim().to_owned())
      .ok_or_else(|| Error::TranscriptionFailed("response has no text".to_owned()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn empty_audio_is_rejected_first() {
    let t = Transcriber::new(TranscriptionConfig::default()).unwrap();
    let err = t.transcribe(Bytes::new(), "a.webm", None).await.unwrap_err();
    assert!(matches!(err, Error::EmptyAudio));
  }

  #[tokio::test]
  async fn missing_endpoint_is_configuration_error() {
    let t = Transcriber::new(TranscriptionConfig::default()).unwrap();
    let err = t
      .transcribe(Bytes::from_static(b"RIFF"), "a.wav", Some("audio/wav"))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::MissingConfiguration("transcription.url")));
  }
}
