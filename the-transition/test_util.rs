use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  listener::TransitionListener,
  state::TransitionState,
  transition::Value,
};

/// Listener that records every notification it receives.
pub struct Recorder<V> {
  names:    Mutex<Vec<String>>,
  adjusted: Mutex<Vec<V>>,
}

impl<V: Value> Recorder<V> {
  pub fn new() -> Arc<Self> {
    Arc::new(Self {
      names:    Mutex::new(Vec::new()),
      adjusted: Mutex::new(Vec::new()),
    })
  }

  /// Every notification except `adjusted`, formatted as `name(value, ...)`.
  pub fn names(&self) -> Vec<String> {
    self.names.lock().clone()
  }

  pub fn count(&self, name: &str) -> usize {
    self.names.lock().iter().filter(|known| *known == name).count()
  }

  pub fn adjusted(&self) -> Vec<V> {
    self.adjusted.lock().clone()
  }

  pub fn clear(&self) {
    self.names.lock().clear();
    self.adjusted.lock().clear();
  }

  fn push(&self, name: &str, value: &V) {
    self.names.lock().push(format!("{name}({value:?})"));
  }
}

impl<V: Value> TransitionListener<V> for Recorder<V> {
  fn started(&self, value: &V) {
    self.push("started", value);
  }

  fn adjusted(&self, value: &V) {
    self.adjusted.lock().push(value.clone());
  }

  fn finished(&self, value: &V) {
    self.push("finished", value);
  }

  fn aborted(&self, value: &V) {
    self.push("aborted", value);
  }

  fn reset(&self, value: &V) {
    self.push("reset", value);
  }

  fn state_changed(&self, value: &V, previous: TransitionState, current: TransitionState) {
    self
      .names
      .lock()
      .push(format!("state_changed({value:?}, {previous}, {current})"));
  }
}
