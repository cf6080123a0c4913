use thiserror::Error;

use crate::state::TransitionState;

/// Result type for transition operations.
pub type Result<T> = std::result::Result<T, TransitionError>;

/// Faults raised by a misconfigured or misused transition.
///
/// None of these are recoverable at runtime: they mean the code authoring or
/// driving the animation is inconsistent, and they surface as soon as the
/// transition is built or first started.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
  #[error("illegal transition state change: {from} -> {to}")]
  IllegalState {
    from: TransitionState,
    to:   TransitionState,
  },
  #[error("queue transition requires at least one element")]
  EmptyQueue,
  #[error("no interpolation rule registered for {0}")]
  MissingInterpolator(&'static str),
  #[error("frame rate must be finite and positive, got {0}")]
  InvalidFrameRate(f64),
}
