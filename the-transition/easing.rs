use std::f64::consts::PI;

use serde::{
  Deserialize,
  Serialize,
};

/// Maps linear progress to eased progress.
///
/// Implementations must map `0.0` to `0.0` and `1.0` to `1.0`. Curves may
/// overshoot in between (back, elastic).
pub trait Ease: Send + Sync {
  fn ease(&self, progress: f64) -> f64;
}

/// Wraps a plain function or closure as an [`Ease`].
#[derive(Debug, Clone, Copy)]
pub struct EaseFn<F>(pub F);

impl<F> Ease for EaseFn<F>
where
  F: Fn(f64) -> f64 + Send + Sync,
{
  fn ease(&self, progress: f64) -> f64 {
    (self.0)(progress.clamp(0.0, 1.0))
  }
}

/// Easing functions for transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
  /// Linear interpolation (no easing)
  Linear,
  EaseInQuad,
  EaseOutQuad,
  EaseInOutQuad,
  EaseInCubic,
  EaseOutCubic,
  #[default]
  EaseInOutCubic,
  EaseInQuart,
  EaseOutQuart,
  EaseInOutQuart,
  EaseInQuint,
  EaseOutQuint,
  EaseInOutQuint,
  EaseInSine,
  EaseOutSine,
  EaseInOutSine,
  EaseInExpo,
  EaseOutExpo,
  EaseInOutExpo,
  EaseInCirc,
  EaseOutCirc,
  EaseInOutCirc,
  /// Pulls back below zero before accelerating
  EaseInBack,
  /// Overshoots the goal before settling
  EaseOutBack,
  EaseInOutBack,
  EaseInElastic,
  EaseOutElastic,
  EaseInOutElastic,
  EaseInBounce,
  EaseOutBounce,
  EaseInOutBounce,
}

const BACK_C1: f64 = 1.70158;
const BACK_C2: f64 = BACK_C1 * 1.525;
const BACK_C3: f64 = BACK_C1 + 1.0;
const ELASTIC_C4: f64 = (2.0 * PI) / 3.0;
const ELASTIC_C5: f64 = (2.0 * PI) / 4.5;

impl Easing {
  pub const ALL: [Easing; 31] = [
    Easing::Linear,
    Easing::EaseInQuad,
    Easing::EaseOutQuad,
    Easing::EaseInOutQuad,
    Easing::EaseInCubic,
    Easing::EaseOutCubic,
    Easing::EaseInOutCubic,
    Easing::EaseInQuart,
    Easing::EaseOutQuart,
    Easing::EaseInOutQuart,
    Easing::EaseInQuint,
    Easing::EaseOutQuint,
    Easing::EaseInOutQuint,
    Easing::EaseInSine,
    Easing::EaseOutSine,
    Easing::EaseInOutSine,
    Easing::EaseInExpo,
    Easing::EaseOutExpo,
    Easing::EaseInOutExpo,
    Easing::EaseInCirc,
    Easing::EaseOutCirc,
    Easing::EaseInOutCirc,
    Easing::EaseInBack,
    Easing::EaseOutBack,
    Easing::EaseInOutBack,
    Easing::EaseInElastic,
    Easing::EaseOutElastic,
    Easing::EaseInOutElastic,
    Easing::EaseInBounce,
    Easing::EaseOutBounce,
    Easing::EaseInOutBounce,
  ];

  /// Whether the curve may leave `[0, 1]` between its endpoints.
  pub fn overshoots(self) -> bool {
    matches!(
      self,
      Easing::EaseInBack
        | Easing::EaseOutBack
        | Easing::EaseInOutBack
        | Easing::EaseInElastic
        | Easing::EaseOutElastic
        | Easing::EaseInOutElastic
    )
  }

  /// Whether eased progress never decreases as linear progress grows.
  pub fn is_monotonic(self) -> bool {
    !self.overshoots()
      && !matches!(
        self,
        Easing::EaseInBounce | Easing::EaseOutBounce | Easing::EaseInOutBounce
      )
  }

  /// Apply the easing function to a linear progress value (0.0 to 1.0)
  pub fn apply(self, t: f64) -> f64 {
    if t.is_nan() || t <= 0.0 {
      return 0.0;
    }
    if t >= 1.0 {
      return 1.0;
    }
    match self {
      Easing::Linear => t,
      Easing::EaseInQuad => t * t,
      Easing::EaseOutQuad => 1.0 - (1.0 - t).powi(2),
      Easing::EaseInOutQuad => {
        if t < 0.5 {
          2.0 * t * t
        } else {
          1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
        }
      },
      Easing::EaseInCubic => t * t * t,
      Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
      Easing::EaseInOutCubic => {
        if t < 0.5 {
          4.0 * t * t * t
        } else {
          1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
        }
      },
      Easing::EaseInQuart => t.powi(4),
      Easing::EaseOutQuart => 1.0 - (1.0 - t).powi(4),
      Easing::EaseInOutQuart => {
        if t < 0.5 {
          8.0 * t.powi(4)
        } else {
          1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
        }
      },
      Easing::EaseInQuint => t.powi(5),
      Easing::EaseOutQuint => 1.0 - (1.0 - t).powi(5),
      Easing::EaseInOutQuint => {
        if t < 0.5 {
          16.0 * t.powi(5)
        } else {
          1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
        }
      },
      Easing::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
      Easing::EaseOutSine => (t * PI / 2.0).sin(),
      Easing::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
      Easing::EaseInExpo => 2f64.powf(10.0 * t - 10.0),
      Easing::EaseOutExpo => 1.0 - 2f64.powf(-10.0 * t),
      Easing::EaseInOutExpo => {
        if t < 0.5 {
          2f64.powf(20.0 * t - 10.0) / 2.0
        } else {
          (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
        }
      },
      Easing::EaseInCirc => 1.0 - (1.0 - t * t).sqrt(),
      Easing::EaseOutCirc => (1.0 - (t - 1.0).powi(2)).sqrt(),
      Easing::EaseInOutCirc => {
        if t < 0.5 {
          (1.0 - (1.0 - (2.0 * t).powi(2)).sqrt()) / 2.0
        } else {
          ((1.0 - (-2.0 * t + 2.0).powi(2)).sqrt() + 1.0) / 2.0
        }
      },
      Easing::EaseInBack => BACK_C3 * t * t * t - BACK_C1 * t * t,
      Easing::EaseOutBack => {
        1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2)
      },
      Easing::EaseInOutBack => {
        if t < 0.5 {
          ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
        } else {
          ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2) + 2.0) / 2.0
        }
      },
      Easing::EaseInElastic => {
        -(2f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin()
      },
      Easing::EaseOutElastic => {
        2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
      },
      Easing::EaseInOutElastic => {
        if t < 0.5 {
          -(2f64.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0
        } else {
          (2f64.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0 + 1.0
        }
      },
      Easing::EaseInBounce => 1.0 - bounce_out(1.0 - t),
      Easing::EaseOutBounce => bounce_out(t),
      Easing::EaseInOutBounce => {
        if t < 0.5 {
          (1.0 - bounce_out(1.0 - 2.0 * t)) / 2.0
        } else {
          (1.0 + bounce_out(2.0 * t - 1.0)) / 2.0
        }
      },
    }
  }
}

impl Ease for Easing {
  fn ease(&self, progress: f64) -> f64 {
    self.apply(progress)
  }
}

fn bounce_out(t: f64) -> f64 {
  const N1: f64 = 7.5625;
  const D1: f64 = 2.75;
  if t < 1.0 / D1 {
    N1 * t * t
  } else if t < 2.0 / D1 {
    let t = t - 1.5 / D1;
    N1 * t * t + 0.75
  } else if t < 2.5 / D1 {
    let t = t - 2.25 / D1;
    N1 * t * t + 0.9375
  } else {
    let t = t - 2.625 / D1;
    N1 * t * t + 0.984375
  }
}
