//! Handlers for `/voice` endpoints.
//!
//! `POST /voice` takes either a JSON body `{"text":"..."}` or a
//! `multipart/form-data` upload with the recording in the `audio` field.
//! Failures are answered with `{"error","code","detail"}`.

use axum::{
  Json,
  extract::{FromRequest, Multipart, Request, State},
  http::header::CONTENT_TYPE,
};
use serde::Deserialize;
use tally_core::{Error, store::FinanceStore, voice::VoiceCommand};
use tally_voice::VoiceReply;
use tracing::debug;

use crate::{AppState, error::ApiError};

/// Multipart field holding the recording.
pub const AUDIO_FIELD: &str = "audio";

#[derive(Debug, Deserialize)]
pub struct TextBody {
  pub text: String,
}

fn is_multipart(request: &Request) -> bool {
  request
    .headers()
    .get(CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

/// `POST /voice`
pub async fn command<S>(
  State(state): State<AppState<S>>,
  request: Request,
) -> Result<Json<VoiceReply>, ApiError>
where
  S: FinanceStore,
{
  let reply = if is_multipart(&request) {
    let mut multipart = Multipart::from_request(request, &())
      .await
      .map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart
      .next_field()
      .await
      .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
      if field.name() != Some(AUDIO_FIELD) {
        continue;
      }
      let file_name = field.file_name().unwrap_or("recording.webm").to_owned();
      let content_type = field.content_type().map(str::to_owned);
      let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
      upload = Some((bytes, file_name, content_type));
      break;
    }

    let (bytes, file_name, content_type) = upload.ok_or(ApiError::Voice(Error::EmptyAudio))?;
    debug!(bytes = bytes.len(), file = %file_name, "voice upload received");
    state
      .voice
      .handle_audio(bytes, &file_name, content_type.as_deref())
      .await
  } else {
    let Json(body) = Json::<TextBody>::from_request(request, &())
      .await
      .map_err(|e| ApiError::BadRequest(e.body_text()))?;
    state.voice.handle_text(&body.text).await
  };

  reply.map(Json).map_err(ApiError::Voice)
}

/// `GET /voice/history`: the 50 most recent commands.
pub async fn history<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<VoiceCommand>>, ApiError>
where
  S: FinanceStore,
{
  Ok(Json(state.voice.history().await?))
}
