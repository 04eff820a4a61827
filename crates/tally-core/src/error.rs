//! Error taxonomy shared by the dispatcher, the remote clients and the HTTP
//! layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("input text is empty")]
  EmptyInput,

  #[error("audio payload is empty")]
  EmptyAudio,

  #[error("remote endpoint unavailable: {0}")]
  RemoteUnavailable(String),

  #[error("malformed response: {0}")]
  MalformedResponse(String),

  #[error("invalid arguments: {0}")]
  InvalidArguments(String),

  /// The model answered in free text instead of choosing an operation.
  #[error("no operation was selected")]
  NoSelection { reply: Option<String> },

  #[error("unknown operation: {0:?}")]
  UnknownOperation(String),

  #[error("invalid amount: {0}")]
  InvalidAmount(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("transcription failed: {0}")]
  TranscriptionFailed(String),

  #[error("missing configuration: {0}")]
  MissingConfiguration(&'static str),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Box a backend error into [`Error::Store`].
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// Stable snake_case identifier for programmatic callers.
  pub fn code(&self) -> &'static str {
    match self {
      Self::EmptyInput => "empty_input",
      Self::EmptyAudio => "empty_audio",
      Self::RemoteUnavailable(_) => "remote_unavailable",
      Self::MalformedResponse(_) => "malformed_response",
      Self::InvalidArguments(_) => "invalid_arguments",
      Self::NoSelection { .. } => "no_selection",
      Self::UnknownOperation(_) => "unknown_operation",
      Self::InvalidAmount(_) => "invalid_amount",
      Self::NotFound(_) => "not_found",
      Self::TranscriptionFailed(_) => "transcription_failed",
      Self::MissingConfiguration(_) => "missing_configuration",
      Self::Store(_) => "store",
      Self::Serialization(_) => "serialization",
    }
  }

  /// `true` for errors caused by what the caller sent rather than by a
  /// collaborator failing.
  pub fn is_caller_error(&self) -> bool {
    matches!(
      self,
      Self::EmptyInput
        | Self::EmptyAudio
        | Self::InvalidArguments(_)
        | Self::UnknownOperation(_)
        | Self::InvalidAmount(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
