//! Background driver that plays transitions in real time.

use std::{
  io,
  panic::{
    self,
    AssertUnwindSafe,
  },
  sync::{
    Arc,
    atomic::{
      AtomicUsize,
      Ordering,
    },
  },
  thread::{
    self,
    JoinHandle,
  },
};

use crossbeam::channel::{
  self,
  Receiver,
  RecvTimeoutError,
  Sender,
};

use crate::{
  clock::{
    self,
    Nanos,
    to_duration,
  },
  error::Result,
  state::TransitionState,
  transition::Timeline,
};

enum Command {
  Play(Arc<dyn Timeline>),
  Stop(Arc<dyn Timeline>),
  Shutdown,
}

struct Scheduled {
  timeline: Arc<dyn Timeline>,
  previous: Nanos,
  due:      Nanos,
}

/// Owns a thread that starts timelines and keeps proceeding them at the
/// cadence they ask for, until they stop playing.
///
/// A timeline that returns a fault, or whose listeners panic while it is
/// being driven, is logged and dropped; the driver keeps serving the others. Dropping the animator aborts whatever is still playing.
pub struct Animator {
  tx:     Sender<Command>,
  active: Arc<AtomicUsize>,
  worker: Option<JoinHandle<()>>,
}

impl Animator {
  pub fn spawn() -> io::Result<Self> {
    Self::named("transition-animator")
  }

  pub fn named(name: impl Into<String>) -> io::Result<Self> {
    let (tx, rx) = channel::unbounded();
    let active = Arc::new(AtomicUsize::new(0));
    let worker = {
      let active = active.clone();
      thread::Builder::new()
        .name(name.into())
        .spawn(move || run(rx, active))?
    };
    Ok(Self {
      tx,
      active,
      worker: Some(worker),
    })
  }

  /// Start `timeline` now. Playing a timeline that is already running
  /// restarts it.
  pub fn play(&self, timeline: Arc<dyn Timeline>) {
    self.send(Command::Play(timeline));
  }

  /// Abort `timeline` and stop driving it.
  pub fn stop(&self, timeline: &Arc<dyn Timeline>) {
    self.send(Command::Stop(timeline.clone()));
  }

  /// Number of timelines being driven, as of the driver's last iteration.
  pub fn active(&self) -> usize {
    self.active.load(Ordering::Acquire)
  }

  /// Abort everything still playing and join the driver thread.
  pub fn shutdown(&mut self) {
    let Some(worker) = self.worker.take() else {
      return;
    };
    let _ = self.tx.send(Command::Shutdown);
    if worker.thread().id() == thread::current().id() {
      return;
    }
    if worker.join().is_err() {
      log::warn!("animator thread terminated abnormally");
    }
  }

  fn send(&self, command: Command) {
    if self.tx.send(command).is_err() {
      log::warn!("animator thread is gone, dropping command");
    }
  }
}

impl Drop for Animator {
  fn drop(&mut self) {
    self.shutdown();
  }
}

fn run(rx: Receiver<Command>, active: Arc<AtomicUsize>) {
  let mut scheduled: Vec<Scheduled> = Vec::new();
  log::debug!("animator started");

  loop {
    let command = match scheduled.iter().map(|entry| entry.due).min() {
      Some(due) => {
        let wait = to_duration(due.saturating_sub(clock::now()));
        match rx.recv_timeout(wait) {
          Ok(command) => Some(command),
          Err(RecvTimeoutError::Timeout) => None,
          Err(RecvTimeoutError::Disconnected) => break,
        }
      },
      None => match rx.recv() {
        Ok(command) => Some(command),
        Err(_) => break,
      },
    };

    match command {
      Some(Command::Play(timeline)) => {
        scheduled.retain(|entry| !Arc::ptr_eq(&entry.timeline, &timeline));
        let now = clock::now();
        if let Some(delay) = guarded("start", || timeline.start(now)) {
          scheduled.push(Scheduled {
            timeline,
            previous: now,
            due: now.saturating_add(delay.max(0)),
          });
        }
      },
      Some(Command::Stop(timeline)) => {
        scheduled.retain(|entry| !Arc::ptr_eq(&entry.timeline, &timeline));
        guarded("abort", || timeline.abort());
      },
      Some(Command::Shutdown) => break,
      None => {},
    }

    let now = clock::now();
    scheduled.retain_mut(|entry| proceed(entry, now));
    active.store(scheduled.len(), Ordering::Release);
  }

  for entry in scheduled.drain(..) {
    guarded("abort", || entry.timeline.abort());
  }
  active.store(0, Ordering::Release);
  log::debug!("animator stopped");
}

/// Proceed `entry` if it is due; returns whether it stays scheduled.
fn proceed(entry: &mut Scheduled, now: Nanos) -> bool {
  if entry.due > now {
    return true;
  }
  let previous = entry.previous;
  let Some(delay) = guarded("proceed", || entry.timeline.proceed(previous, now)) else {
    log::error!("dropping transition");
    return false;
  };
  entry.previous = now;
  entry.due = now.saturating_add(delay.max(1));
  entry.timeline.state() == TransitionState::Playing
}

/// Run one timeline operation, logging a fault or a panic raised by it or by
/// a listener it notified inline.
fn guarded<T>(operation: &str, f: impl FnOnce() -> Result<T>) -> Option<T> {
  match panic::catch_unwind(AssertUnwindSafe(f)) {
    Ok(Ok(value)) => Some(value),
    Ok(Err(err)) => {
      log::error!("transition {operation} failed: {err}");
      None
    },
    Err(_) => {
      log::error!("transition {operation} panicked");
      None
    },
  }
}

#[cfg(test)]
mod tests {
  use std::time::{
    Duration,
    Instant,
  };

  use the_transition_event::ImmediateEventHandler;

  use super::*;
  use crate::{
    error::{
      Result,
      TransitionError,
    },
    frame_rate::{
      FixedFrameRate,
      FrameRate,
    },
    test_util::Recorder,
    timed::TimedTransition,
    transition::Transition,
  };

  fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
      if condition() {
        return true;
      }
      thread::sleep(Duration::from_millis(2));
    }
    condition()
  }

  fn timed(millis: u64) -> Arc<TimedTransition<f64>> {
    Arc::new(
      TimedTransition::builder(0.0, 1.0)
        .duration_ms(millis)
        .fps(200.0)
        .event_handler(Arc::new(ImmediateEventHandler))
        .build()
        .unwrap(),
    )
  }

  #[test]
  fn plays_to_completion() {
    let animator = Animator::spawn().unwrap();
    let transition = timed(40);
    let recorder = Recorder::<f64>::new();
    transition.add_listener(recorder.clone());

    animator.play(transition.clone());
    assert!(wait_until(|| transition.state() == TransitionState::Finished));
    assert_eq!(transition.value(), 1.0);
    assert_eq!(recorder.count("finished(1.0)"), 1);
    assert!(!recorder.adjusted().is_empty());
    assert!(wait_until(|| animator.active() == 0));
  }

  #[test]
  fn stop_aborts_playing_timeline() {
    let animator = Animator::named("stop-test").unwrap();
    let transition = timed(60_000);
    let timeline: Arc<dyn Timeline> = transition.clone();

    animator.play(timeline.clone());
    assert!(wait_until(|| animator.active() == 1));
    animator.stop(&timeline);
    assert!(wait_until(|| transition.state() == TransitionState::Aborted));
    assert!(wait_until(|| animator.active() == 0));
  }

  #[derive(Debug)]
  struct Faulty;

  impl Timeline for Faulty {
    fn state(&self) -> TransitionState {
      TransitionState::Playing
    }

    fn frame_rate(&self) -> Arc<dyn FrameRate> {
      Arc::new(FixedFrameRate::default())
    }

    fn start_time(&self) -> Option<Nanos> {
      None
    }

    fn start(&self, _current_frame: Nanos) -> Result<Nanos> {
      Ok(0)
    }

    fn proceed(&self, _previous_frame: Nanos, _current_frame: Nanos) -> Result<Nanos> {
      Err(TransitionError::EmptyQueue)
    }

    fn abort(&self) -> Result<()> {
      Ok(())
    }

    fn reset(&self) -> Result<()> {
      Ok(())
    }
  }

  #[test]
  fn faulty_timeline_is_dropped() {
    let animator = Animator::spawn().unwrap();
    let transition = timed(30);
    animator.play(Arc::new(Faulty));
    animator.play(transition.clone());
    assert!(wait_until(|| transition.state() == TransitionState::Finished));
    assert!(wait_until(|| animator.active() == 0));
  }

  #[test]
  fn panicking_listener_does_not_stop_the_driver() {
    let animator = Animator::spawn().unwrap();
    let broken = timed(30);
    broken.add_listener(crate::listener::on_adjusted(|_: &f64| {
      panic!("listener failure");
    }));
    let healthy = timed(30);

    animator.play(broken.clone());
    animator.play(healthy.clone());
    assert!(wait_until(|| healthy.state() == TransitionState::Finished));
    assert_eq!(healthy.value(), 1.0);
    assert!(wait_until(|| animator.active() == 0));

    // the driver still accepts work afterwards
    let later = timed(20);
    animator.play(later.clone());
    assert!(wait_until(|| later.state() == TransitionState::Finished));
  }

  #[test]
  fn shutdown_aborts_remaining_timelines() {
    let mut animator = Animator::spawn().unwrap();
    let transition = timed(60_000);
    animator.play(transition.clone());
    assert!(wait_until(|| transition.state() == TransitionState::Playing));

    animator.shutdown();
    assert_eq!(transition.state(), TransitionState::Aborted);
    assert_eq!(animator.active(), 0);
    // commands after shutdown are ignored
    animator.play(timed(10));
    animator.shutdown();
  }
}
