use std::{
  fmt,
  sync::Arc,
  time::Duration,
};

use crate::{
  clock::Nanos,
  error::Result,
  frame_rate::FrameRate,
  listener::TransitionListener,
  state::TransitionState,
  timed::{
    TimedBuilder,
    TimedTransition,
  },
  transition::{
    Timeline,
    Transition,
    Value,
  },
};

/// Holds one value for a while.
///
/// Used as a pause between queue elements; `duration` may be zero.
pub struct IdleTransition<V>(TimedTransition<V>);

impl<V: Value> IdleTransition<V> {
  pub fn new(value: V, duration: Duration) -> Result<Self> {
    Self::build(TimedBuilder::idle(value).duration(duration))
  }

  /// Build from a [`TimedBuilder::idle`] builder carrying extra options.
  pub fn build(builder: TimedBuilder<V>) -> Result<Self> {
    builder.build().map(Self)
  }

  pub fn duration(&self) -> Duration {
    self.0.duration()
  }
}

impl<V: Value> fmt::Debug for IdleTransition<V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("IdleTransition").field(&self.0).finish()
  }
}

impl<V: Value> Timeline for IdleTransition<V> {
  fn state(&self) -> TransitionState {
    self.0.state()
  }

  fn frame_rate(&self) -> Arc<dyn FrameRate> {
    self.0.frame_rate()
  }

  fn start_time(&self) -> Option<Nanos> {
    self.0.start_time()
  }

  fn start(&self, current_frame: Nanos) -> Result<Nanos> {
    self.0.start(current_frame)
  }

  fn proceed(&self, previous_frame: Nanos, current_frame: Nanos) -> Result<Nanos> {
    self.0.proceed(previous_frame, current_frame)
  }

  fn abort(&self) -> Result<()> {
    self.0.abort()
  }

  fn reset(&self) -> Result<()> {
    self.0.reset()
  }
}

impl<V: Value> Transition<V> for IdleTransition<V> {
  fn start_value(&self) -> V {
    self.0.start_value()
  }

  fn goal(&self) -> V {
    self.0.goal()
  }

  fn value(&self) -> V {
    self.0.value()
  }

  fn latest(&self) -> Option<V> {
    self.0.latest()
  }

  fn add_listener(&self, listener: Arc<dyn TransitionListener<V>>) {
    self.0.add_listener(listener);
  }

  fn remove_listener(&self, listener: &Arc<dyn TransitionListener<V>>) -> bool {
    self.0.remove_listener(listener)
  }
}

#[cfg(test)]
mod tests {
  use the_transition_event::ImmediateEventHandler;

  use super::*;
  use crate::{
    clock::NANOS_PER_MILLI,
    test_util::Recorder,
  };

  #[test]
  fn holds_value_for_duration() {
    let idle = IdleTransition::build(
      TimedBuilder::idle("held")
        .duration_ms(40)
        .fps(100.0)
        .event_handler(Arc::new(ImmediateEventHandler))
        .optimize_events(false),
    )
    .unwrap();
    let recorder = Recorder::<&str>::new();
    idle.add_listener(recorder.clone());

    assert_eq!(idle.start(0).unwrap(), 10 * NANOS_PER_MILLI);
    assert_eq!(idle.proceed(0, 25 * NANOS_PER_MILLI).unwrap(), 5 * NANOS_PER_MILLI);
    assert_eq!(idle.value(), "held");
    assert_eq!(idle.proceed(25 * NANOS_PER_MILLI, 40 * NANOS_PER_MILLI).unwrap(), 0);
    assert_eq!(idle.state(), TransitionState::Finished);
    assert_eq!(recorder.adjusted(), vec!["held"; 4]);
  }

  #[test]
  fn zero_duration_completes_immediately() {
    let idle = IdleTransition::new(1.5, Duration::ZERO).unwrap();
    assert_eq!(idle.duration(), Duration::ZERO);
    assert_eq!(idle.start(100).unwrap(), 0);
    assert_eq!(idle.proceed(100, 100).unwrap(), 0);
    assert_eq!(idle.state(), TransitionState::Finished);
    assert_eq!(idle.goal(), 1.5);
  }

  #[test]
  fn debug_names_the_held_value() {
    let idle = IdleTransition::build(
      TimedBuilder::idle(3.5).event_handler(Arc::new(ImmediateEventHandler)),
    )
    .unwrap();
    let debug = format!("{idle:?}");
    assert!(debug.starts_with("IdleTransition(TimedTransition"));
    assert!(debug.contains("start: 3.5"));
  }
}
