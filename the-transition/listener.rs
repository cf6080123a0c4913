use std::sync::Arc;

use crate::state::TransitionState;

/// Receives lifecycle and value notifications from a transition.
///
/// Every method has an empty default so listeners only implement what they
/// need; a painter usually cares about `adjusted` alone.
pub trait TransitionListener<V>: Send + Sync {
  fn started(&self, _value: &V) {}

  fn adjusted(&self, _value: &V) {}

  fn finished(&self, _value: &V) {}

  fn aborted(&self, _value: &V) {}

  fn reset(&self, _value: &V) {}

  fn state_changed(&self, _value: &V, _previous: TransitionState, _current: TransitionState) {}
}

struct AdjustListener<F>(F);

impl<V, F> TransitionListener<V> for AdjustListener<F>
where
  F: Fn(&V) + Send + Sync,
{
  fn adjusted(&self, value: &V) {
    (self.0)(value)
  }
}

/// Listener that only reacts to value changes.
pub fn on_adjusted<V, F>(f: F) -> Arc<dyn TransitionListener<V>>
where
  V: 'static,
  F: Fn(&V) + Send + Sync + 'static,
{
  Arc::new(AdjustListener(f))
}
