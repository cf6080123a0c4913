//! State machine and event plumbing shared by every transition kind.

use std::{
  fmt,
  sync::{
    Arc,
    atomic::{
      AtomicBool,
      Ordering,
    },
  },
};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use the_transition_event::EventHandler;

use crate::{
  error::{
    Result,
    TransitionError,
  },
  listener::TransitionListener,
  state::TransitionState,
  transition::Value,
};

type Listeners<V> = Vec<Arc<dyn TransitionListener<V>>>;

/// Lifecycle state, last emitted value and listeners of one transition.
///
/// Transitions embed a core and drive it through [`TransitionCore::set_state`]
/// and [`TransitionCore::fire_adjusted`]. The core validates every state
/// change against [`TransitionState::can_become`] and turns it into listener
/// events, which it hands to the transition's [`EventHandler`]. Listeners of
/// one event are notified in the order they were added.
pub struct TransitionCore<V> {
  state:           Mutex<TransitionState>,
  latest:          Mutex<Option<V>>,
  listeners:       ArcSwap<Listeners<V>>,
  events:          Arc<dyn EventHandler>,
  optimize_events: AtomicBool,
}

impl<V: Value> TransitionCore<V> {
  pub fn new(events: Arc<dyn EventHandler>, optimize_events: bool) -> Self {
    Self {
      state: Mutex::new(TransitionState::Constructed),
      latest: Mutex::new(None),
      listeners: ArcSwap::from_pointee(Vec::new()),
      events,
      optimize_events: AtomicBool::new(optimize_events),
    }
  }

  pub fn state(&self) -> TransitionState {
    *self.state.lock()
  }

  /// Last value emitted through started, adjusted or finished events.
  /// `None` after a reset.
  pub fn latest(&self) -> Option<V> {
    self.latest.lock().clone()
  }

  pub fn optimize_events(&self) -> bool {
    self.optimize_events.load(Ordering::Relaxed)
  }

  /// When set, an adjusted value equal to the previously emitted one is not
  /// delivered.
  pub fn set_optimize_events(&self, optimize: bool) {
    self.optimize_events.store(optimize, Ordering::Relaxed);
  }

  pub fn event_handler(&self) -> &Arc<dyn EventHandler> {
    &self.events
  }

  /// Add a listener. Adding the same listener twice has no effect.
  pub fn add_listener(&self, listener: Arc<dyn TransitionListener<V>>) {
    self.listeners.rcu(|current| {
      let mut next = Listeners::clone(current);
      if !next.iter().any(|known| Arc::ptr_eq(known, &listener)) {
        next.push(listener.clone());
      }
      next
    });
  }

  /// Remove a listener by identity, returns whether it was registered.
  pub fn remove_listener(&self, listener: &Arc<dyn TransitionListener<V>>) -> bool {
    let previous = self.listeners.rcu(|current| {
      current
        .iter()
        .filter(|known| !Arc::ptr_eq(known, listener))
        .cloned()
        .collect::<Listeners<V>>()
    });
    previous.iter().any(|known| Arc::ptr_eq(known, listener))
  }

  pub fn listener_count(&self) -> usize {
    self.listeners.load().len()
  }

  /// Move to `next`, then fire `state_changed` followed by the event of the
  /// new phase.
  ///
  /// `value` is the value reported with the events: the start value when
  /// playing or resetting, the goal when finishing and the latest value when
  /// aborting.
  pub fn set_state(&self, next: TransitionState, value: &V) -> Result<()> {
    let previous = {
      let mut state = self.state.lock();
      let previous = *state;
      if !previous.can_become(next) {
        return Err(TransitionError::IllegalState {
          from: previous,
          to:   next,
        });
      }
      *state = next;
      previous
    };
    log::debug!("transition state {previous} -> {next}");

    self.fire_state_changed(value, previous, next);
    match next {
      TransitionState::Playing => self.fire_started(value),
      TransitionState::Finished => self.fire_finished(value),
      TransitionState::Aborted => self.fire_aborted(value),
      TransitionState::Ready if previous.is_done() => self.fire_reset(value),
      TransitionState::Ready | TransitionState::Constructed => {},
    }
    Ok(())
  }

  pub fn fire_state_changed(&self, value: &V, previous: TransitionState, current: TransitionState) {
    self.deliver(value.clone(), move |listener, value| {
      listener.state_changed(value, previous, current)
    });
  }

  pub fn fire_started(&self, value: &V) {
    *self.latest.lock() = Some(value.clone());
    self.deliver(value.clone(), |listener, value| listener.started(value));
  }

  /// Emit a new value; elided when optimizing and equal to the last one.
  pub fn fire_adjusted(&self, value: V) {
    {
      let mut latest = self.latest.lock();
      if self.optimize_events() && latest.as_ref() == Some(&value) {
        return;
      }
      *latest = Some(value.clone());
    }
    self.deliver(value, |listener, value| listener.adjusted(value));
  }

  pub fn fire_finished(&self, value: &V) {
    *self.latest.lock() = Some(value.clone());
    self.deliver(value.clone(), |listener, value| listener.finished(value));
  }

  pub fn fire_aborted(&self, value: &V) {
    self.deliver(value.clone(), |listener, value| listener.aborted(value));
  }

  pub fn fire_reset(&self, value: &V) {
    *self.latest.lock() = None;
    self.deliver(value.clone(), |listener, value| listener.reset(value));
  }

  fn deliver<F>(&self, value: V, notify: F)
  where
    F: Fn(&dyn TransitionListener<V>, &V) + Send + 'static,
  {
    let listeners = self.listeners.load_full();
    if listeners.is_empty() {
      return;
    }
    self.events.dispatch(Box::new(move || {
      for listener in listeners.iter() {
        notify(listener.as_ref(), &value);
      }
    }));
  }
}

impl<V> fmt::Debug for TransitionCore<V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TransitionCore")
      .field("state", &*self.state.lock())
      .field("listeners", &self.listeners.load().len())
      .field("optimize_events", &self.optimize_events.load(Ordering::Relaxed))
      .finish()
  }
}
