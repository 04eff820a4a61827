//! Intent Resolver: one chat-completion call that picks an operation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tally_core::{Error, Result};
use tracing::{debug, warn};

use crate::registry;

/// Connection settings for the completion endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
  /// Full URL of the `chat/completions` endpoint.
  pub url:          Option<String>,
  pub api_key:      Option<String>,
  pub model:        String,
  pub timeout_secs: u64,
}

impl Default for LlmConfig {
  fn default() -> Self {
    Self {
      url:          None,
      api_key:      None,
      model:        "grok-3-mini-beta".to_owned(),
      timeout_secs: 30,
    }
  }
}

/// The model chose an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
  pub name:       String,
  pub arguments:  Map<String, Value>,
  /// Free text the model sent alongside the call, if any.
  pub commentary: Option<String>,
}

const SYSTEM_PROMPT: &str = "You are a financial assistant that helps users track their spending \
   and manage a 50/30/20 budget (needs, wants, savings). Convert the user's command into exactly \
   one function call. Amounts are always positive numbers. Use ISO dates (YYYY-MM-DD).";

// ─── Response shape ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChatResponse {
  choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
  message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
  content:       Option<String>,
  tool_calls:    Option<Vec<ToolCall>>,
  /// Legacy single-function shape.
  function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
  function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
  name:      String,
  arguments: Option<Value>,
}

/// Decode the argument payload: a JSON-encoded string (the usual case) or an
/// inline object. Empty or absent means no arguments.
fn decode_arguments(raw: Option<Value>) -> Result<Map<String, Value>> {
  let value = match raw {
    None | Some(Value::Null) => return Ok(Map::new()),
    Some(Value::String(s)) if s.trim().is_empty() => return Ok(Map::new()),
    Some(Value::String(s)) => serde_json::from_str(&s)
      .map_err(|e| Error::InvalidArguments(format!("arguments are not JSON: {e}")))?,
    Some(other) => other,
  };
  match value {
    Value::Object(map) => Ok(map),
    other => Err(Error::InvalidArguments(format!(
      "arguments must be a JSON object, got {other}"
    ))),
  }
}

fn non_empty(s: Option<String>) -> Option<String> {
  s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

fn first_message(body: &[u8]) -> Result<ChatMessage> {
  let response: ChatResponse = serde_json::from_slice(body)
    .map_err(|e| Error::MalformedResponse(format!("undecodable completion: {e}")))?;
  response
    .choices
    .into_iter()
    .next()
    .map(|c| c.message)
    .ok_or_else(|| Error::MalformedResponse("completion has no choices".to_owned()))
}

/// Turn a completion body into a [`Resolution`], or `NoSelection` when the
/// model answered in prose.
pub fn parse_completion(body: &[u8]) -> Result<Resolution> {
  let message = first_message(body)?;
  let commentary = non_empty(message.content);

  let call = message
    .tool_calls
    .and_then(|calls| calls.into_iter().next())
    .map(|c| c.function)
    .or(message.function_call);

  match call {
    Some(call) => Ok(Resolution {
      name: call.name,
      arguments: decode_arguments(call.arguments)?,
      commentary,
    }),
    None => Err(Error::NoSelection { reply: commentary }),
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async client for an OpenAI-compatible chat-completions endpoint.
///
/// The inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct LlmClient {
  client: Client,
  config: LlmConfig,
}

impl LlmClient {
  pub fn new(config: LlmConfig) -> reqwest::Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn endpoint(&self) -> Result<(&str, &str)> {
    let url = self
      .config
      .url
      .as_deref()
      .filter(|u| !u.trim().is_empty())
      .ok_or(Error::MissingConfiguration("llm.url"))?;
    let key = self
      .config
      .api_key
      .as_deref()
      .filter(|k| !k.trim().is_empty())
      .ok_or(Error::MissingConfiguration("llm.api_key"))?;
    Ok((url, key))
  }

  /// Exactly one POST; never retried.
  async fn post(&self, body: &Value) -> Result<Vec<u8>> {
    let (url, key) = self.endpoint()?;

    let resp = self
      .client
      .post(url)
      .bearer_auth(key)
      .json(body)
      .send()
      .await
      .map_err(|e| {
        warn!(error = %e, "completion request failed");
        Error::RemoteUnavailable(e.to_string())
      })?;

    let status = resp.status();
    let bytes = resp
      .bytes()
      .await
      .map_err(|e| Error::RemoteUnavailable(e.to_string()))?;

    if !status.is_success() {
      let snippet: String = String::from_utf8_lossy(&bytes).chars().take(200).collect();
      warn!(%status, body = %snippet, "completion endpoint returned an error");
      return Err(Error::RemoteUnavailable(format!("{status}: {snippet}")));
    }
    Ok(bytes.to_vec())
  }

  /// Ask the model to map `text` onto one registry operation.
  pub async fn resolve(&self, text: &str, now: DateTime<Utc>) -> Result<Resolution> {
    let text = text.trim();
    if text.is_empty() {
      return Err(Error::EmptyInput);
    }

    let body = json!({
      "model": self.config.model,
      "messages": [
        {
          "role": "system",
          "content": format!("{SYSTEM_PROMPT} Today is {}.", now.date_naive()),
        },
        { "role": "user", "content": text },
      ],
      "tools": registry::tools(),
      "tool_choice": "auto",
    });

    let raw = self.post(&body).await?;
    let resolution = parse_completion(&raw);
    match &resolution {
      Ok(r) => debug!(operation = %r.name, arguments = ?r.arguments, "resolved"),
      Err(e) => debug!(error = %e, "no operation resolved"),
    }
    resolution
  }

  /// A plain prompt with no tools; returns the model's text.
  pub async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
    let body = json!({
      "model": self.config.model,
      "messages": [
        { "role": "system", "content": system },
        { "role": "user", "content": prompt },
      ],
    });

    let raw = self.post(&body).await?;
    non_empty(first_message(&raw)?.content)
      .ok_or_else(|| Error::MalformedResponse("completion has no content".to_owned()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tool_call_with_string_arguments() {
    let body = json!({
      "choices": [{
        "message": {
          "content": null,
          "tool_calls": [{
            "id": "call_1",
            "type": "function",
            "function": { "name": "addTransaction", "arguments": "{\"amount\": 20}" }
          }]
        }
      }]
    });
    let r = parse_completion(body.to_string().as_bytes()).unwrap();
    assert_eq!(r.name, "addTransaction");
    assert_eq!(r.arguments["amount"], 20);
    assert!(r.commentary.is_none());
  }

  #[test]
  fn legacy_function_call_with_commentary() {
    let body = json!({
      "choices": [{
        "message": {
          "content": "Nice, groceries are a need.",
          "function_call": { "name": "listGoals", "arguments": "" }
        }
      }]
    });
    let r = parse_completion(body.to_string().as_bytes()).unwrap();
    assert_eq!(r.name, "listGoals");
    assert!(r.arguments.is_empty());
    assert_eq!(r.commentary.as_deref(), Some("Nice, groceries are a need."));
  }

  #[test]
  fn prose_only_is_no_selection() {
    let body = json!({ "choices": [{ "message": { "content": "Hello there!" } }] });
    let err = parse_completion(body.to_string().as_bytes()).unwrap_err();
    assert!(matches!(err, Error::NoSelection { reply: Some(r) } if r == "Hello there!"));
  }

  #[test]
  fn malformed_bodies() {
    assert!(matches!(parse_completion(b"not json"), Err(Error::MalformedResponse(_))));
    assert!(matches!(
      parse_completion(br#"{"choices": []}"#),
      Err(Error::MalformedResponse(_))
    ));
    assert!(matches!(
      parse_completion(br#"{"id": "x"}"#),
      Err(Error::MalformedResponse(_))
    ));
  }

  #[test]
  fn non_object_arguments_are_invalid() {
    let body = json!({
      "choices": [{
        "message": { "tool_calls": [{ "function": { "name": "deleteGoal", "arguments": "[1, 2]" } }] }
      }]
    });
    assert!(matches!(
      parse_completion(body.to_string().as_bytes()),
      Err(Error::InvalidArguments(_))
    ));

    let body = json!({
      "choices": [{
        "message": { "tool_calls": [{ "function": { "name": "deleteGoal", "arguments": "{oops" } }] }
      }]
    });
    assert!(matches!(
      parse_completion(body.to_string().as_bytes()),
      Err(Error::InvalidArguments(_))
    ));
  }

  #[tokio::test]
  async fn missing_configuration_is_reported_at_call_time() {
    let client = LlmClient::new(LlmConfig::default()).unwrap();
    let err = client.resolve("spent 5 on coffee", Utc::now()).await.unwrap_err();
    assert!(matches!(err, Error::MissingConfiguration("llm.url")));
  }

  #[tokio::test]
  async fn empty_text_fails_before_configuration_is_checked() {
    let client = LlmClient::new(LlmConfig::default()).unwrap();
    let err = client.resolve("   ", Utc::now()).await.unwrap_err();
    assert!(matches!(err, Error::EmptyInput));
  }
}
