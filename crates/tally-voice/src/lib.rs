//! Natural-language command pipeline for Tally.
//!
//! Text (or audio, via [`transcribe`]) is handed to an OpenAI-compatible
//! completion endpoint together with the [`registry`] catalog. The selected
//! operation is parsed into a typed [`command::Command`] and executed by the
//! [`dispatch::Dispatcher`]. [`pipeline::VoiceService`] ties the steps
//! together and keeps the audit trail.

pub mod command;
pub mod dispatch;
pub mod insights;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod transcribe;

pub use dispatch::{Dispatcher, Outcome};
pub use pipeline::{VoiceReply, VoiceService};
pub use resolver::{LlmClient, LlmConfig};
pub use transcribe::{Transcriber, TranscriptionConfig};

#[cfg(test)]
mod tests;
