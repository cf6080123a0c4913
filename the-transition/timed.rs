//! Time based interpolation between two values.

use std::{
  fmt,
  sync::Arc,
  time::Duration,
};

use parking_lot::Mutex;
use the_transition_event::{
  EventHandler,
  default_handler,
};

use crate::{
  clock::{
    Nanos,
    to_duration,
    to_nanos,
  },
  config::TransitionConfig,
  core::TransitionCore,
  easing::{
    Ease,
    Easing,
  },
  error::Result,
  frame_rate::{
    DEFAULT_FPS,
    FixedFrameRate,
    FrameRate,
  },
  interpolate::{
    Interpolable,
    InterpolationRegistry,
    Interpolator,
    interpolator,
  },
  listener::TransitionListener,
  state::TransitionState,
  transition::{
    Timeline,
    Transition,
    Value,
  },
};

pub const DEFAULT_DURATION: Duration = Duration::from_millis(360);

/// Per-run bookkeeping, guarded by the transition lock.
#[derive(Debug, Clone, Copy, Default)]
struct Run {
  start_time: Option<Nanos>,
  /// Last frame boundary delivered to listeners.
  last_frame: Nanos,
}

/// Interpolates from `start` to `goal` over a fixed duration.
///
/// Frames fall on boundaries one frame delay apart, counted from the frame
/// the run started at; the last boundary is clamped to the end of the
/// duration. Each boundary the driver reaches is delivered as an adjusted
/// event carrying the eased value at that boundary, including boundaries a
/// slow driver skipped over.
pub struct TimedTransition<V> {
  core:         TransitionCore<V>,
  start:        V,
  goal:         V,
  easing:       Arc<dyn Ease>,
  interpolator: Interpolator<V>,
  duration:     Nanos,
  frame_rate:   Arc<dyn FrameRate>,
  run:          Mutex<Run>,
}

impl<V: Value + Interpolable> TimedTransition<V> {
  pub fn builder(start: V, goal: V) -> TimedBuilder<V> {
    TimedBuilder::new(start, goal)
  }

  /// Transition with every option at its default.
  pub fn new(start: V, goal: V) -> Result<Self> {
    Self::builder(start, goal).build()
  }
}

impl<V: Value> TimedTransition<V> {
  pub fn duration(&self) -> Duration {
    to_duration(self.duration)
  }

  pub fn core(&self) -> &TransitionCore<V> {
    &self.core
  }

  pub fn set_optimize_events(&self, optimize: bool) {
    self.core.set_optimize_events(optimize);
  }

  /// Value of the current run's curve at `frame`, without emitting anything.
  ///
  /// Before the first run this is the start value.
  pub fn value_at(&self, frame: Nanos) -> V {
    match self.run.lock().start_time {
      Some(start_time) => self.sample(start_time, frame),
      None => self.start.clone(),
    }
  }

  fn sample(&self, start_time: Nanos, frame: Nanos) -> V {
    let progress = if self.duration <= 0 {
      1.0
    } else {
      (frame.saturating_sub(start_time) as f64 / self.duration as f64).clamp(0.0, 1.0)
    };
    self.interpolate(progress)
  }

  fn interpolate(&self, progress: f64) -> V {
    if progress <= 0.0 {
      return self.start.clone();
    }
    if progress >= 1.0 {
      return self.goal.clone();
    }
    (self.interpolator)(&self.start, &self.goal, self.easing.ease(progress))
  }

  fn abort_locked(&self) -> Result<()> {
    if self.core.state() != TransitionState::Playing {
      return Ok(());
    }
    let value = self.core.latest().unwrap_or_else(|| self.start.clone());
    self.core.set_state(TransitionState::Aborted, &value)
  }

  fn reset_locked(&self, run: &mut Run) -> Result<()> {
    match self.core.state() {
      TransitionState::Ready => return Ok(()),
      TransitionState::Playing => self.abort_locked()?,
      TransitionState::Constructed | TransitionState::Finished | TransitionState::Aborted => {},
    }
    *run = Run::default();
    self.core.set_state(TransitionState::Ready, &self.start)
  }
}

impl<V: Value> Timeline for TimedTransition<V> {
  fn state(&self) -> TransitionState {
    self.core.state()
  }

  fn frame_rate(&self) -> Arc<dyn FrameRate> {
    self.frame_rate.clone()
  }

  fn start_time(&self) -> Option<Nanos> {
    self.run.lock().start_time
  }

  fn start(&self, current_frame: Nanos) -> Result<Nanos> {
    let mut run = self.run.lock();
    self.reset_locked(&mut run)?;
    run.start_time = Some(current_frame);
    run.last_frame = current_frame;
    self.core.set_state(TransitionState::Playing, &self.start)?;
    Ok(self.frame_rate.frame_delay().min(self.duration))
  }

  fn proceed(&self, previous_frame: Nanos, current_frame: Nanos) -> Result<Nanos> {
    let mut run = self.run.lock();
    if self.core.state() != TransitionState::Playing {
      return Ok(0);
    }
    let Some(start_time) = run.start_time else {
      return Ok(0);
    };
    let end = start_time.saturating_add(self.duration);

    let frame_delay = self.frame_rate.frame_delay().max(1);
    if current_frame.saturating_sub(previous_frame) > frame_delay {
      log::trace!(
        "transition catching up {} frame(s)",
        current_frame.saturating_sub(run.last_frame) / frame_delay
      );
    }

    loop {
      let boundary = run
        .last_frame
        .saturating_add(self.frame_rate.frame_delay().max(1))
        .min(end);
      if boundary > current_frame {
        return Ok(boundary - current_frame);
      }

      run.last_frame = boundary;
      self.core.fire_adjusted(self.sample(start_time, boundary));

      if boundary >= end {
        self.core.set_state(TransitionState::Finished, &self.goal)?;
        return Ok(end - current_frame);
      }
    }
  }

  fn abort(&self) -> Result<()> {
    let _run = self.run.lock();
    self.abort_locked()
  }

  fn reset(&self) -> Result<()> {
    let mut run = self.run.lock();
    self.reset_locked(&mut run)
  }
}

impl<V: Value> Transition<V> for TimedTransition<V> {
  fn start_value(&self) -> V {
    self.start.clone()
  }

  fn goal(&self) -> V {
    self.goal.clone()
  }

  fn value(&self) -> V {
    match self.core.state() {
      TransitionState::Playing => {
        let run = *self.run.lock();
        match run.start_time {
          Some(start_time) => self.sample(start_time, run.last_frame),
          None => self.start.clone(),
        }
      },
      TransitionState::Finished => self.goal.clone(),
      TransitionState::Aborted => self.core.latest().unwrap_or_else(|| self.start.clone()),
      TransitionState::Constructed | TransitionState::Ready => self.start.clone(),
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

impl<V: Value> fmt::Debug for TimedTransition<V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TimedTransition")
      .field("start", &self.start)
      .field("goal", &self.goal)
      .field("duration", &self.duration())
      .field("core", &self.core)
      .finish()
  }
}

/// Builder for [`TimedTransition`].
///
/// Defaults: 360ms, cubic in/out easing, fixed 60 frames per second, the
/// shared FIFO event handler, optimized adjusted events.
pub struct TimedBuilder<V> {
  start:           V,
  goal:            V,
  interpolator:    Interpolator<V>,
  easing:          Arc<dyn Ease>,
  duration:        Duration,
  fps:             f64,
  frame_rate:      Option<Arc<dyn FrameRate>>,
  events:          Option<Arc<dyn EventHandler>>,
  optimize_events: bool,
}

impl<V: Value + Interpolable> TimedBuilder<V> {
  pub fn new(start: V, goal: V) -> Self {
    Self::with_interpolator(start, goal, interpolator::<V>())
  }
}

impl<V: Value> TimedBuilder<V> {
  pub fn with_interpolator(start: V, goal: V, interpolator: Interpolator<V>) -> Self {
    Self {
      start,
      goal,
      interpolator,
      easing: Arc::new(Easing::default()),
      duration: DEFAULT_DURATION,
      fps: DEFAULT_FPS,
      frame_rate: None,
      events: None,
      optimize_events: true,
    }
  }

  /// Use the rule registered for `V`; fails if there is none.
  pub fn from_registry(start: V, goal: V, registry: &InterpolationRegistry) -> Result<Self> {
    Ok(Self::with_interpolator(start, goal, registry.get::<V>()?))
  }

  /// A transition that holds `value` for its duration.
  pub fn idle(value: V) -> Self {
    let keep: Interpolator<V> = Arc::new(|start: &V, _: &V, _: f64| start.clone());
    Self::with_interpolator(value.clone(), value, keep).easing(Easing::Linear)
  }

  /// Take duration, frame rate, easing and event optimization from `config`.
  pub fn config(mut self, config: &TransitionConfig) -> Self {
    self.duration = config.duration();
    self.fps = config.fps;
    self.frame_rate = None;
    self.easing = Arc::new(config.easing);
    self.optimize_events = config.optimize_events;
    self
  }

  pub fn easing(mut self, easing: impl Ease + 'static) -> Self {
    self.easing = Arc::new(easing);
    self
  }

  pub fn duration(mut self, duration: Duration) -> Self {
    self.duration = duration;
    self
  }

  pub fn duration_ms(self, millis: u64) -> Self {
    self.duration(Duration::from_millis(millis))
  }

  /// Fixed frames per second; validated by [`TimedBuilder::build`].
  pub fn fps(mut self, fps: f64) -> Self {
    self.fps = fps;
    self.frame_rate = None;
    self
  }

  pub fn frame_rate(mut self, frame_rate: Arc<dyn FrameRate>) -> Self {
    self.frame_rate = Some(frame_rate);
    self
  }

  pub fn event_handler(mut self, events: Arc<dyn EventHandler>) -> Self {
    self.events = Some(events);
    self
  }

  pub fn optimize_events(mut self, optimize: bool) -> Self {
    self.optimize_events = optimize;
    self
  }

  pub fn build(self) -> Result<TimedTransition<V>> {
    let frame_rate = match self.frame_rate {
      Some(frame_rate) => frame_rate,
      None => Arc::new(FixedFrameRate::new(self.fps)?),
    };
    let events = self.events.unwrap_or_else(default_handler);
    let transition = TimedTransition {
      core: TransitionCore::new(events, self.optimize_events),
      start: self.start,
      goal: self.goal,
      easing: self.easing,
      interpolator: self.interpolator,
      duration: to_nanos(self.duration),
      frame_rate,
      run: Mutex::new(Run::default()),
    };
    transition
      .core
      .set_state(TransitionState::Ready, &transition.start)?;
    Ok(transition)
  }
}
