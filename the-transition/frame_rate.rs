use std::fmt;

use crate::{
  clock::{
    NANOS_PER_SECOND,
    Nanos,
  },
  error::{
    Result,
    TransitionError,
  },
};

pub const DEFAULT_FPS: f64 = 60.0;

/// Sampling policy of a transition: how often the driver should come back.
///
/// The value may be computed from the transition's state (see
/// [`QueueFrameRate`]); a rate reports itself fixed when it never changes over
/// the lifetime of the transition, which lets drivers poll on a constant
/// cadence.
pub trait FrameRate: Send + Sync + fmt::Debug {
  /// Frames per second.
  fn fps(&self) -> f64;

  fn is_fixed(&self) -> bool;

  /// Nanoseconds between two frames, never less than one.
  fn frame_delay(&self) -> Nanos {
    delay_for(self.fps())
  }
}

fn delay_for(fps: f64) -> Nanos {
  if !fps.is_finite() || fps <= 0.0 {
    return NANOS_PER_SECOND;
  }
  ((NANOS_PER_SECOND as f64 / fps) as Nanos).max(1)
}

/// A constant number of frames per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedFrameRate {
  fps: f64,
}

impl FixedFrameRate {
  pub fn new(fps: f64) -> Result<Self> {
    if !fps.is_finite() || fps <= 0.0 {
      return Err(TransitionError::InvalidFrameRate(fps));
    }
    Ok(Self { fps })
  }
}

impl Default for FixedFrameRate {
  fn default() -> Self {
    Self { fps: DEFAULT_FPS }
  }
}

impl FrameRate for FixedFrameRate {
  fn fps(&self) -> f64 {
    self.fps
  }

  fn is_fixed(&self) -> bool {
    true
  }
}

/// Frame rate of a composite transition, resolved for its current phase.
///
/// Carries the rate of whichever element currently governs the composite and
/// is fixed only when every element runs at one identical fixed rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueFrameRate {
  pub(crate) fps:   f64,
  pub(crate) delay: Nanos,
  pub(crate) fixed: bool,
}

impl QueueFrameRate {
  pub(crate) fn resolve<'a>(
    current: &dyn FrameRate,
    all: impl IntoIterator<Item = &'a dyn FrameRate>,
  ) -> Self {
    let delay = current.frame_delay();
    let fixed = all
      .into_iter()
      .all(|rate| rate.is_fixed() && rate.frame_delay() == delay);
    Self {
      fps: current.fps(),
      delay,
      fixed,
    }
  }
}

impl FrameRate for QueueFrameRate {
  fn fps(&self) -> f64 {
    self.fps
  }

  fn is_fixed(&self) -> bool {
    self.fixed
  }

  fn frame_delay(&self) -> Nanos {
    self.delay
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fixed_rate_delay() {
    let rate = FixedFrameRate::default();
    assert_eq!(rate.frame_delay(), 16_666_666);
    assert!(rate.is_fixed());
    assert_eq!(FixedFrameRate::new(1000.0).unwrap().frame_delay(), 1_000_000);
  }

  #[test]
  fn invalid_rates_are_rejected() {
    assert_eq!(
      FixedFrameRate::new(0.0),
      Err(TransitionError::InvalidFrameRate(0.0))
    );
    assert!(FixedFrameRate::new(-30.0).is_err());
    assert!(FixedFrameRate::new(f64::NAN).is_err());
    assert!(FixedFrameRate::new(f64::INFINITY).is_err());
  }

  #[test]
  fn huge_rate_never_yields_zero_delay() {
    let rate = FixedFrameRate::new(1e12).unwrap();
    assert_eq!(rate.frame_delay(), 1);
  }

  #[test]
  fn queue_rate_fixed_only_when_uniform() {
    let sixty = FixedFrameRate::new(60.0).unwrap();
    let thirty = FixedFrameRate::new(30.0).unwrap();

    let uniform = QueueFrameRate::resolve(&sixty, [&sixty as &dyn FrameRate, &sixty]);
    assert!(uniform.is_fixed());
    assert_eq!(uniform.frame_delay(), sixty.frame_delay());

    let mixed = QueueFrameRate::resolve(&thirty, [&sixty as &dyn FrameRate, &thirty]);
    assert!(!mixed.is_fixed());
    assert_eq!(mixed.fps(), 30.0);
  }
}
