//! VoiceCommand audit records.
//!
//! One row is written when a natural-language command starts processing and
//! updated exactly once when it finishes. A row still carrying
//! [`PROCESSING_INTENT`] means the process stopped between the two writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Intent recorded on a freshly created audit row.
pub const PROCESSING_INTENT: &str = "PROCESSING";

/// Intent recorded when the model declined to choose an operation.
pub const UNKNOWN_INTENT: &str = "UNKNOWN";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceCommand {
  pub command_id:         Uuid,
  pub raw_text:           String,
  pub intent:             String,
  pub parameters:         serde_json::Value,
  pub success:            bool,
  pub processing_time_ms: u64,
  pub created_at:         DateTime<Utc>,
}

/// The single completing update applied to an audit row.
#[derive(Debug, Clone)]
pub struct VoiceCommandUpdate {
  /// Final intent; `None` keeps whatever the row already holds.
  pub intent:             Option<String>,
  /// Parsed arguments; `None` keeps the stored value.
  pub parameters:         Option<serde_json::Value>,
  pub success:            bool,
  pub processing_time_ms: u64,
}
