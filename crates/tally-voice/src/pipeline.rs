//! End-to-end voice command handling with an audit trail.
//!
//! Every non-empty command gets exactly one `VoiceCommand` row. The row is
//! inserted with intent `PROCESSING` before the resolver runs and finished
//! once, after dispatch, with whatever was learnt along the way.

use std::{sync::Arc, time::Instant};

use bytes::Bytes;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tally_core::{
  Error, Result,
  store::FinanceStore,
  transaction::AiAnalysis,
  voice::{UNKNOWN_INTENT, VoiceCommand, VoiceCommandUpdate},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  command::Command,
  dispatch::{Dispatcher, Outcome},
  registry::Operation,
  resolver::LlmClient,
  transcribe::Transcriber,
};

/// Rows returned by [`VoiceService::history`].
pub const HISTORY_LIMIT: usize = 50;

const HELP_MESSAGE: &str = "Sorry, I didn't catch a command in that. Try something like \
   \"I spent $20 on groceries\", \"how am I doing on my budget this month?\" or \"add $50 to \
   my vacation goal\".";

/// Reply to a command the pipeline handled, including the help reply when no
/// operation was selected.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceReply {
  pub command_id: Uuid,
  pub text:       String,
  pub intent:     String,
  pub message:    String,
  pub result:     Value,
}

/// What is known about a command so far, for the audit row.
#[derive(Debug, Default)]
struct Trace {
  intent:     Option<String>,
  parameters: Option<Value>,
}

pub struct VoiceService<S> {
  store:       Arc<S>,
  llm:         LlmClient,
  transcriber: Transcriber,
  dispatcher:  Dispatcher<S>,
}

impl<S> Clone for VoiceService<S> {
  fn clone(&self) -> Self {
    Self {
      store:       Arc::clone(&self.store),
      llm:         self.llm.clone(),
      transcriber: self.transcriber.clone(),
      dispatcher:  self.dispatcher.clone(),
    }
  }
}

impl<S: FinanceStore> VoiceService<S> {
  pub fn new(
    store: Arc<S>,
    llm: LlmClient,
    transcriber: Transcriber,
    default_income: Decimal,
  ) -> Self {
    let dispatcher = Dispatcher::new(Arc::clone(&store), default_income);
    Self { store, llm, transcriber, dispatcher }
  }

  pub fn llm(&self) -> &LlmClient { &self.llm }

  pub fn dispatcher(&self) -> &Dispatcher<S> { &self.dispatcher }

  /// Transcribe a recording, then handle the text.
  pub async fn handle_audio(
    &self,
    audio: Bytes,
    file_name: &str,
    content_type: Option<&str>,
  ) -> Result<VoiceReply> {
    let text = self.transcriber.transcribe(audio, file_name, content_type).await?;
    info!(chars = text.len(), "transcribed audio");
    self.handle_text(&text).await
  }

  /// Resolve, parse and dispatch one command.
  pub async fn handle_text(&self, text: &str) -> Result<VoiceReply> {
    let text = text.trim();
    if text.is_empty() {
      return Err(Error::EmptyInput);
    }

    let started = Instant::now();
    let row = self
      .store
      .begin_voice_command(text.to_owned())
      .await
      .map_err(Error::store)?;

    let mut trace = Trace::default();
    let result = self.run(text, &mut trace).await;
    let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match result {
      Ok(outcome) => {
        let intent = trace.intent.unwrap_or_default();
        info!(command_id = %row.command_id, %intent, elapsed_ms = elapsed, "voice command succeeded");
        self
          .finish(row.command_id, VoiceCommandUpdate {
            intent:             Some(intent.clone()),
            parameters:         trace.parameters,
            success:            true,
            processing_time_ms: elapsed,
          })
          .await;
        Ok(VoiceReply {
          command_id: row.command_id,
          text: row.raw_text,
          intent,
          message: outcome.message,
          result: outcome.result,
        })
      }
      Err(Error::NoSelection { .. }) => {
        info!(command_id = %row.command_id, "no operation selected");
        self
          .finish(row.command_id, VoiceCommandUpdate {
            intent:             Some(UNKNOWN_INTENT.to_owned()),
            parameters:         None,
            success:            false,
            processing_time_ms: elapsed,
          })
          .await;
        Ok(VoiceReply {
          command_id: row.command_id,
          text:       row.raw_text,
          intent:     UNKNOWN_INTENT.to_owned(),
          message:    HELP_MESSAGE.to_owned(),
          result:     Value::Null,
        })
      }
      Err(e) => {
        warn!(command_id = %row.command_id, error = %e, elapsed_ms = elapsed, "voice command failed");
        self
          .finish(row.command_id, VoiceCommandUpdate {
            intent:             trace.intent,
            parameters:         trace.parameters,
            success:            false,
            processing_time_ms: elapsed,
          })
          .await;
        Err(e)
      }
    }
  }

  async fn run(&self, text: &str, trace: &mut Trace) -> Result<Outcome> {
    let now = Utc::now();
    let resolution = self.llm.resolve(text, now).await?;
    trace.intent = Some(resolution.name.clone());
    trace.parameters = Some(Value::Object(resolution.arguments.clone()));

    let op = Operation::from_name(&resolution.name)?;
    let mut command = Command::parse(op, Value::Object(resolution.arguments))?;
    if let Some(commentary) = resolution.commentary {
      command.annotate(AiAnalysis {
        sentiment:   commentary,
        confidence:  1.0,
        suggestions: Vec::new(),
      });
    }
    self.dispatcher.dispatch(command, now).await
  }

  /// A failed audit update never changes the command's outcome.
  async fn finish(&self, id: Uuid, update: VoiceCommandUpdate) {
    match self.store.finish_voice_command(id, update).await {
      Ok(true) => {}
      Ok(false) => warn!(command_id = %id, "audit row vanished before it was finished"),
      Err(e) => warn!(command_id = %id, error = %e, "failed to finish audit row"),
    }
  }

  /// Most recent audit rows first.
  pub async fn history(&self) -> Result<Vec<VoiceCommand>> {
    self
      .store
      .list_voice_commands(HISTORY_LIMIT)
      .await
      .map_err(Error::store)
  }
}
