//! Time based value transitions for UI decorations.
//!
//! A [`TimedTransition`] interpolates between two values over a duration,
//! sampled on the boundaries of a [`FrameRate`]. A [`QueueTransition`] plays
//! transitions one after another, optionally in a loop, and an
//! [`IdleTransition`] holds a value to pause between them. Listeners observe
//! every emitted value through the transition's event handler.
//!
//! Transitions never sleep. A driver (the bundled [`Animator`], or a host's
//! own frame loop) calls [`Timeline::start`] and then [`Timeline::proceed`]
//! with monotonic frame times, and waits however long each call asks for. A
//! driver that falls behind receives every missed frame on its next call.

pub mod animator;
pub mod clock;
pub mod config;
pub mod core;
pub mod easing;
pub mod error;
pub mod frame_rate;
pub mod idle;
pub mod interpolate;
pub mod listener;
pub mod queue;
pub mod state;
pub mod timed;
pub mod transition;

#[cfg(test)]
mod test_util;

pub use animator::Animator;
pub use clock::Nanos;
pub use config::{
  ConfigError,
  TransitionConfig,
};
pub use crate::core::TransitionCore;
pub use easing::{
  Ease,
  EaseFn,
  Easing,
};
pub use error::{
  Result,
  TransitionError,
};
pub use frame_rate::{
  FixedFrameRate,
  FrameRate,
  QueueFrameRate,
};
pub use idle::IdleTransition;
pub use interpolate::{
  Color,
  Interpolable,
  InterpolationRegistry,
  Interpolator,
  Point,
};
pub use listener::{
  TransitionListener,
  on_adjusted,
};
pub use queue::{
  QueueBuilder,
  QueueTransition,
};
pub use state::TransitionState;
pub use the_transition_event::{
  EventHandler,
  FifoEventHandler,
  ImmediateEventHandler,
  default_handler,
};
pub use timed::{
  TimedBuilder,
  TimedTransition,
};
pub use transition::{
  Timeline,
  Transition,
  Value,
};
