//! Server configuration, read from `config.toml` and `TALLY_*` variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use rust_decimal::Decimal;
use serde::Deserialize;
use tally_core::validate::validate_amount;
use tally_voice::{LlmConfig, TranscriptionConfig};

/// Runtime server configuration.
///
/// Nested keys come from the environment with a double underscore, e.g.
/// `TALLY_LLM__API_KEY`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                   String,
  pub port:                   u16,
  pub store_path:             PathBuf,
  /// Monthly income assumed until the user sets one.
  pub default_monthly_income: Decimal,
  pub llm:                    LlmConfig,
  pub transcription:          TranscriptionConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                   "127.0.0.1".to_string(),
      port:                   3000,
      store_path:             PathBuf::from("~/.local/share/tally/tally.db"),
      default_monthly_income: Decimal::from(3000),
      llm:                    LlmConfig::default(),
      transcription:          TranscriptionConfig::default(),
    }
  }
}

impl ServerConfig {
  /// Layer the optional file at `path` under the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("TALLY")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read config file")?;

    let cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.validated()
  }

  /// Reject values the server cannot run with.
  pub fn validated(self) -> anyhow::Result<Self> {
    validate_amount("default_monthly_income", self.default_monthly_income)
      .context("invalid default_monthly_income")?;
    Ok(self)
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/tally.toml")).unwrap();
    assert_eq!(cfg.port, 3000);
    assert_eq!(cfg.default_monthly_income, Decimal::from(3000));
    assert_eq!(cfg.llm.timeout_secs, 30);
  }

  #[test]
  fn default_income_must_be_positive_cents() {
    for bad in [Decimal::ZERO, Decimal::from(-100), Decimal::new(1, 27)] {
      let cfg = ServerConfig { default_monthly_income: bad, ..ServerConfig::default() };
      let err = cfg.validated().unwrap_err();
      assert!(format!("{err:#}").contains("default_monthly_income"), "{err:#}");
    }
    let cfg = ServerConfig { default_monthly_income: Decimal::new(425_050, 2), ..ServerConfig::default() };
    assert!(cfg.validated().is_ok());
  }

  #[test]
  fn absolute_paths_are_untouched() {
    let p = Path::new("/var/lib/tally.db");
    assert_eq!(expand_tilde(p), p.to_path_buf());
  }
}
