//! Sequential composition of transitions.

use std::{
  fmt,
  sync::{
    Arc,
    atomic::{
      AtomicBool,
      Ordering,
    },
  },
  time::Duration,
};

use parking_lot::{
  Mutex,
  RwLock,
};
use the_transition_event::{
  EventHandler,
  default_handler,
};

use crate::{
  clock::Nanos,
  config::TransitionConfig,
  core::TransitionCore,
  error::{
    Result,
    TransitionError,
  },
  frame_rate::{
    FixedFrameRate,
    FrameRate,
    QueueFrameRate,
  },
  idle::IdleTransition,
  listener::TransitionListener,
  state::TransitionState,
  timed::TimedBuilder,
  transition::{
    Timeline,
    Transition,
    Value,
  },
};

type Element<V> = Arc<dyn Transition<V>>;
type Elements<V> = Arc<Vec<Element<V>>>;

/// Cursor over the element snapshot taken by the last reset.
struct QueueRun<V> {
  elements:   Elements<V>,
  cursor:     usize,
  start_time: Option<Nanos>,
  /// Instant the head element asked to be proceeded at next.
  next_due:   Nanos,
}

impl<V> QueueRun<V> {
  fn new() -> Self {
    Self::over(Arc::new(Vec::new()))
  }

  fn over(elements: Elements<V>) -> Self {
    Self {
      elements,
      cursor: 0,
      start_time: None,
      next_due: 0,
    }
  }

  fn head(&self) -> Option<&Element<V>> {
    self.elements.get(self.cursor)
  }

  /// Move to the next element, wrapping around when `looped`.
  fn advance(&mut self, looped: bool) -> Option<Element<V>> {
    self.cursor += 1;
    if self.cursor >= self.elements.len() {
      if !looped {
        return None;
      }
      self.cursor = 0;
    }
    self.head().cloned()
  }
}

/// Plays its elements one after another, optionally forever.
///
/// The element list is append-only. Every reset takes a snapshot of it, so
/// elements added while a run is in flight join from the next run on. When an
/// element completes, the overshoot it reports is handed to the next element:
/// the next one starts at the instant the previous one ended, and any of its
/// frames already due are delivered right away.
///
/// A late `proceed` steps the active element once per frame boundary it
/// missed, so queue listeners see an adjusted event for every frame of every
/// element, plus one with the initial value of each element taking over.
pub struct QueueTransition<V> {
  core:     TransitionCore<V>,
  elements: RwLock<Elements<V>>,
  run:      Mutex<QueueRun<V>>,
  looped:   AtomicBool,
}

impl<V: Value> QueueTransition<V> {
  pub fn builder() -> QueueBuilder<V> {
    QueueBuilder::new()
  }

  pub fn core(&self) -> &TransitionCore<V> {
    &self.core
  }

  pub fn set_optimize_events(&self, optimize: bool) {
    self.core.set_optimize_events(optimize);
  }

  pub fn looped(&self) -> bool {
    self.looped.load(Ordering::Relaxed)
  }

  pub fn set_looped(&self, looped: bool) {
    self.looped.store(looped, Ordering::Relaxed);
  }

  /// Append an element. It takes part from the next reset or start on.
  pub fn add(&self, element: impl Transition<V> + 'static) {
    self.add_shared(Arc::new(element));
  }

  pub fn add_shared(&self, element: Element<V>) {
    let mut elements = self.elements.write();
    let mut next = Vec::clone(&elements);
    next.push(element);
    *elements = Arc::new(next);
  }

  pub fn len(&self) -> usize {
    self.elements.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.elements.read().is_empty()
  }

  /// Element currently being played.
  pub fn current(&self) -> Option<Element<V>> {
    let run = self.run.lock();
    if self.core.state() != TransitionState::Playing {
      return None;
    }
    run.head().cloned()
  }

  fn first(&self) -> Element<V> {
    // never empty: checked when built, append-only afterwards
    self.elements.read()[0].clone()
  }

  fn last(&self) -> Element<V> {
    let elements = self.elements.read();
    elements[elements.len() - 1].clone()
  }

  fn abort_locked(&self, run: &QueueRun<V>) -> Result<()> {
    if self.core.state() != TransitionState::Playing {
      return Ok(());
    }
    if let Some(head) = run.head() {
      head.abort()?;
    }
    let value = self
      .core
      .latest()
      .unwrap_or_else(|| self.first().start_value());
    self.core.set_state(TransitionState::Aborted, &value)
  }

  fn reset_locked(&self, run: &mut QueueRun<V>) -> Result<()> {
    let elements = self.elements.read().clone();
    let Some(first) = elements.first().cloned() else {
      return Err(TransitionError::EmptyQueue);
    };
    if self.core.state() == TransitionState::Playing {
      self.abort_locked(run)?;
    }
    for element in run.elements.iter() {
      element.reset()?;
    }
    *run = QueueRun::over(elements);
    match self.core.state() {
      TransitionState::Ready => Ok(()),
      _ => self
        .core
        .set_state(TransitionState::Ready, &first.start_value()),
    }
  }
}

impl<V: Value> Timeline for QueueTransition<V> {
  fn state(&self) -> TransitionState {
    self.core.state()
  }

  fn frame_rate(&self) -> Arc<dyn FrameRate> {
    let run = self.run.lock();
    let elements = self.elements.read().clone();
    let current = match self.core.state() {
      TransitionState::Playing => run.head().cloned(),
      TransitionState::Finished | TransitionState::Aborted => run.elements.last().cloned(),
      TransitionState::Constructed | TransitionState::Ready => None,
    }
    .or_else(|| elements.first().cloned());

    let rates: Vec<_> = elements.iter().map(|element| element.frame_rate()).collect();
    let current = match current {
      Some(element) => element.frame_rate(),
      None => return Arc::new(FixedFrameRate::default()),
    };
    Arc::new(QueueFrameRate::resolve(
      current.as_ref(),
      rates.iter().map(|rate| rate.as_ref()),
    ))
  }

  fn start_time(&self) -> Option<Nanos> {
    let run = self.run.lock();
    match (self.core.state(), run.head()) {
      (TransitionState::Playing, Some(head)) => head.start_time(),
      _ => run.start_time,
    }
  }

  fn start(&self, current_frame: Nanos) -> Result<Nanos> {
    let mut run = self.run.lock();
    self.reset_locked(&mut run)?;
    let head = run.head().cloned().ok_or(TransitionError::EmptyQueue)?;
    run.start_time = Some(current_frame);
    self
      .core
      .set_state(TransitionState::Playing, &head.start_value())?;
    let delay = head.start(current_frame)?;
    run.next_due = current_frame.saturating_add(delay);
    Ok(delay)
  }

  fn proceed(&self, previous_frame: Nanos, current_frame: Nanos) -> Result<Nanos> {
    let mut run = self.run.lock();
    if self.core.state() != TransitionState::Playing {
      return Ok(0);
    }

    let looped = self.looped();
    let mut previous = previous_frame;
    // consecutive elements that began and ended at the same instant
    let mut instant_handoffs = 0;
    loop {
      if run.next_due > current_frame {
        return Ok(run.next_due - current_frame);
      }
      let Some(head) = run.head().cloned() else {
        return Ok(0);
      };
      let frame = run.next_due;
      let delay = head.proceed(previous, frame)?;
      self.core.fire_adjusted(head.value());
      previous = frame;
      if delay > 0 || head.state() == TransitionState::Playing {
        run.next_due = frame.saturating_add(delay.max(1));
        continue;
      }

      let finished_at = frame.saturating_add(delay);
      if head.start_time() == Some(finished_at) {
        instant_handoffs += 1;
      } else {
        instant_handoffs = 0;
      }

      let Some(next) = run.advance(looped) else {
        self
          .core
          .set_state(TransitionState::Finished, &head.goal())?;
        return Ok(finished_at - current_frame);
      };
      let first_delay = next.start(finished_at)?;
      self.core.fire_adjusted(next.value());

      if instant_handoffs >= run.elements.len() {
        log::trace!("looped queue completed a cycle without elapsed time");
        let wait = first_delay.max(next.frame_rate().frame_delay()).max(1);
        run.next_due = current_frame.saturating_add(wait);
        return Ok(wait);
      }
      run.next_due = finished_at.saturating_add(first_delay);
      previous = finished_at;
    }
  }

  fn abort(&self) -> Result<()> {
    let run = self.run.lock();
    self.abort_locked(&run)
  }

  fn reset(&self) -> Result<()> {
    let mut run = self.run.lock();
    self.reset_locked(&mut run)
  }
}

impl<V: Value> Transition<V> for QueueTransition<V> {
  fn start_value(&self) -> V {
    self.first().start_value()
  }

  fn goal(&self) -> V {
    self.last().goal()
  }

  fn value(&self) -> V {
    match self.core.state() {
      TransitionState::Playing => {
        let head = self.run.lock().head().cloned();
        match head {
          Some(head) => head.value(),
          None => self.start_value(),
        }
      },
      TransitionState::Finished => self.core.latest().unwrap_or_else(|| self.goal()),
      TransitionState::Aborted => self.core.latest().unwrap_or_else(|| self.start_value()),
      TransitionState::Constructed | TransitionState::Ready => self.start_value(),
    }
  }

  fn latest(&self) -> Option<V> {
    self.core.latest()
  }

  fn add_listener(&self, listener: Arc<dyn TransitionListener<V>>) {
    self.core.add_listener(listener);
  }

  fn remove_listener(&self, listener: &Arc<dyn TransitionListener<V>>) -> bool {
    self.core.remove_listener(listener)
  }
}

impl<V: Value> fmt::Debug for QueueTransition<V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("QueueTransition")
      .field("elements", &self.len())
      .field("looped", &self.looped())
      .field("core", &self.core)
      .finish()
  }
}

/// An entry of a queue under construction.
enum Planned<V> {
  Element(Element<V>),
  /// Hold the goal of whatever precedes it.
  Delay(Duration),
}

/// Builder for [`QueueTransition`].
pub struct QueueBuilder<V> {
  plan:            Vec<Planned<V>>,
  looped:          bool,
  optimize_events: bool,
  events:          Option<Arc<dyn EventHandler>>,
  fault:           Option<TransitionError>,
}

impl<V: Value> QueueBuilder<V> {
  pub fn new() -> Self {
    Self {
      plan:            Vec::new(),
      looped:          false,
      optimize_events: true,
      events:          None,
      fault:           None,
    }
  }

  pub fn add(self, element: impl Transition<V> + 'static) -> Self {
    self.add_shared(Arc::new(element))
  }

  pub fn add_shared(mut self, element: Element<V>) -> Self {
    self.plan.push(Planned::Element(element));
    self
  }

  /// Hold the previous element's goal for `duration`.
  ///
  /// The pause runs at the previous element's frame rate and dispatches
  /// through the queue's event handler, whenever that is set. Without a
  /// previous element the queue fails to build with
  /// [`TransitionError::EmptyQueue`].
  pub fn delay(mut self, duration: Duration) -> Self {
    if self.plan.is_empty() {
      return self.fail(TransitionError::EmptyQueue);
    }
    self.plan.push(Planned::Delay(duration));
    self
  }

  /// Remember the first fault; reported by [`QueueBuilder::build`].
  fn fail(mut self, err: TransitionError) -> Self {
    if self.fault.is_none() {
      self.fault = Some(err);
    }
    self
  }

  /// Take event optimization from `config`; elements keep their own timing.
  pub fn config(mut self, config: &TransitionConfig) -> Self {
    self.optimize_events = config.optimize_events;
    self
  }

  pub fn looped(mut self, looped: bool) -> Self {
    self.looped = looped;
    self
  }

  pub fn optimize_events(mut self, optimize: bool) -> Self {
    self.optimize_events = optimize;
    self
  }

  pub fn event_handler(mut self, events: Arc<dyn EventHandler>) -> Self {
    self.events = Some(events);
    self
  }

  pub fn build(self) -> Result<QueueTransition<V>> {
    if let Some(fault) = self.fault {
      return Err(fault);
    }
    if self.plan.is_empty() {
      return Err(TransitionError::EmptyQueue);
    }
    let events = self.events.unwrap_or_else(default_handler);

    let mut elements: Vec<Element<V>> = Vec::with_capacity(self.plan.len());
    for planned in self.plan {
      let element: Element<V> = match planned {
        Planned::Element(element) => element,
        Planned::Delay(duration) => {
          let previous = elements.last().ok_or(TransitionError::EmptyQueue)?;
          let idle = TimedBuilder::idle(previous.goal())
            .duration(duration)
            .frame_rate(previous.frame_rate())
            .event_handler(events.clone());
          Arc::new(IdleTransition::build(idle)?)
        },
      };
      elements.push(element);
    }

    let queue = QueueTransition {
      core:     TransitionCore::new(events, self.optimize_events),
      elements: RwLock::new(Arc::new(elements)),
      run:      Mutex::new(QueueRun::new()),
      looped:   AtomicBool::new(self.looped),
    };
    {
      let mut run = queue.run.lock();
      queue.reset_locked(&mut run)?;
    }
    Ok(queue)
  }
}

impl<V: Value> Default for QueueBuilder<V> {
  fn default() -> Self {
    Self::new()
  }
}
