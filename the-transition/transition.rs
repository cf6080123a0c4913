use std::{
  fmt::Debug,
  sync::Arc,
};

use crate::{
  clock::Nanos,
  error::Result,
  frame_rate::FrameRate,
  listener::TransitionListener,
  state::TransitionState,
};

/// Bound shared by every value a transition can carry.
pub trait Value: Clone + PartialEq + Debug + Send + Sync + 'static {}

impl<T> Value for T where T: Clone + PartialEq + Debug + Send + Sync + 'static {}

/// Driver-facing side of a transition.
///
/// A driver calls [`Timeline::start`] once, then [`Timeline::proceed`]
/// repeatedly, roughly waiting the number of nanoseconds each call returns,
/// until the timeline leaves [`TransitionState::Playing`]. Every method
/// returns promptly; none of them sleeps.
pub trait Timeline: Send + Sync {
  fn state(&self) -> TransitionState;

  fn frame_rate(&self) -> Arc<dyn FrameRate>;

  /// Frame time at which the current run started, if there is one.
  fn start_time(&self) -> Option<Nanos>;

  /// Begin a run at `current_frame`, returns the delay until the first frame.
  fn start(&self, current_frame: Nanos) -> Result<Nanos>;

  /// Advance to `current_frame`.
  ///
  /// Returns the delay until the next frame is due. Zero or a negative value
  /// means the run completed; a negative value is how far past the end the
  /// completion was observed. Not playing returns zero and does nothing.
  fn proceed(&self, previous_frame: Nanos, current_frame: Nanos) -> Result<Nanos>;

  /// Stop a playing run where it is. Does nothing otherwise.
  fn abort(&self) -> Result<()>;

  /// Return to [`TransitionState::Ready`] so the run can be replayed.
  fn reset(&self) -> Result<()>;
}

/// Value-facing side of a transition.
pub trait Transition<V>: Timeline {
  /// Value the transition starts from.
  fn start_value(&self) -> V;

  /// Value the transition ends at.
  fn goal(&self) -> V;

  /// Current value for the lifecycle phase the transition is in.
  fn value(&self) -> V;

  /// Last value emitted to listeners, `None` after a reset.
  fn latest(&self) -> Option<V>;

  fn add_listener(&self, listener: Arc<dyn TransitionListener<V>>);

  fn remove_listener(&self, listener: &Arc<dyn TransitionListener<V>>) -> bool;
}
