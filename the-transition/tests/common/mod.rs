#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use the_transition::{
  Easing,
  ImmediateEventHandler,
  Nanos,
  TimedTransition,
  TransitionListener,
  TransitionState,
  Value,
  clock::NANOS_PER_MILLI,
};

pub const MS: Nanos = NANOS_PER_MILLI;

pub fn init_logging() {
  let _ = env_logger::builder().is_test(true).try_init();
}

/// Linear `start -> goal` transition with 10ms frames and inline events.
pub fn linear(start: f64, goal: f64, millis: u64) -> TimedTransition<f64> {
  TimedTransition::builder(start, goal)
    .duration_ms(millis)
    .fps(100.0)
    .easing(Easing::Linear)
    .event_handler(Arc::new(ImmediateEventHandler))
    .optimize_events(false)
    .build()
    .unwrap()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Seen<V> {
  Started(V),
  Adjusted(V),
  Finished(V),
  Aborted(V),
  Reset(V),
  Changed(TransitionState, TransitionState),
}

pub struct Log<V> {
  seen: Mutex<Vec<Seen<V>>>,
}

impl<V: Value> Log<V> {
  pub fn new() -> Arc<Self> {
    Arc::new(Self {
      seen: Mutex::new(Vec::new()),
    })
  }

  pub fn seen(&self) -> Vec<Seen<V>> {
    self.seen.lock().clone()
  }

  pub fn adjusted(&self) -> Vec<V> {
    self
      .seen
      .lock()
      .iter()
      .filter_map(|seen| match seen {
        Seen::Adjusted(value) => Some(value.clone()),
        _ => None,
      })
      .collect()
  }

  pub fn clear(&self) {
    self.seen.lock().clear();
  }

  fn push(&self, seen: Seen<V>) {
    self.seen.lock().push(seen);
  }
}

impl<V: Value> TransitionListener<V> for Log<V> {
  fn started(&self, value: &V) {
    self.push(Seen::Started(value.clone()));
  }

  fn adjusted(&self, value: &V) {
    self.push(Seen::Adjusted(value.clone()));
  }

  fn finished(&self, value: &V) {
    self.push(Seen::Finished(value.clone()));
  }

  fn aborted(&self, value: &V) {
    self.push(Seen::Aborted(value.clone()));
  }

  fn reset(&self, value: &V) {
    self.push(Seen::Reset(value.clone()));
  }

  fn state_changed(&self, _value: &V, previous: TransitionState, current: TransitionState) {
    self.push(Seen::Changed(previous, current));
  }
}
