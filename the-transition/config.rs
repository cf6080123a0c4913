//! Transition defaults loaded from TOML.
//!
//! ```toml
//! fps = 120.0
//! duration-ms = 250
//! easing = "ease-out-quad"
//! optimize-events = false
//! ```

use std::{
  fs,
  io,
  path::Path,
  time::Duration,
};

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

use crate::{
  easing::Easing,
  error::TransitionError,
  frame_rate::{
    DEFAULT_FPS,
    FixedFrameRate,
  },
};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read transition config: {0}")]
  Io(#[from] io::Error),
  #[error("failed to parse transition config: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("invalid transition config: {0}")]
  Invalid(#[from] TransitionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct TransitionConfig {
  pub fps:             f64,
  pub duration_ms:     u64,
  pub easing:          Easing,
  pub optimize_events: bool,
}

impl Default for TransitionConfig {
  fn default() -> Self {
    Self {
      fps:             DEFAULT_FPS,
      duration_ms:     360,
      easing:          Easing::default(),
      optimize_events: true,
    }
  }
}

impl TransitionConfig {
  pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(contents)?;
    config.frame_rate()?;
    Ok(config)
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let config = Self::from_toml_str(&contents)?;
    log::debug!("loaded transition config from {}", path.display());
    Ok(config)
  }

  pub fn frame_rate(&self) -> Result<FixedFrameRate, TransitionError> {
    FixedFrameRate::new(self.fps)
  }

  pub fn duration(&self) -> Duration {
    Duration::from_millis(self.duration_ms)
  }
}
