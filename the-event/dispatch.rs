use std::{
  io,
  panic::{
    AssertUnwindSafe,
    catch_unwind,
  },
  sync::Arc,
  thread::{
    self,
    JoinHandle,
  },
  time::Duration,
};

use crossbeam::channel::{
  self,
  Receiver,
  Sender,
};
use once_cell::sync::Lazy;

/// A deferred listener notification.
pub type Event = Box<dyn FnOnce() + Send + 'static>;

/// Decides where listener notifications run.
///
/// Implementations must run the events of a single caller in the order they
/// were dispatched, and `dispatch` must return promptly: it is called from the
/// thread that drives the transition's frame loop.
pub trait EventHandler: Send + Sync {
  fn dispatch(&self, event: Event);
}

/// Runs every event on the calling thread before `dispatch` returns.
///
/// Useful for tests and single threaded hosts. Listeners run while the
/// dispatching transition holds its lock, so they must not call back into it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateEventHandler;

impl EventHandler for ImmediateEventHandler {
  fn dispatch(&self, event: Event) {
    event();
  }
}

enum Message {
  Run(Event),
  Flush(Sender<()>),
}

/// Runs events one by one on a dedicated worker thread.
///
/// The queue is unbounded so `dispatch` never blocks. Events are delivered in
/// the order they were dispatched. A panicking event is logged and dropped,
/// the worker keeps going. Dropping the handler delivers everything still
/// queued and joins the worker.
pub struct FifoEventHandler {
  tx:     Option<Sender<Message>>,
  worker: Option<JoinHandle<()>>,
}

impl FifoEventHandler {
  /// Spawn a handler whose worker thread carries `name`.
  pub fn spawn(name: impl Into<String>) -> io::Result<Self> {
    let (tx, rx) = channel::unbounded();
    let worker = thread::Builder::new()
      .name(name.into())
      .spawn(move || run(rx))?;
    Ok(Self {
      tx:     Some(tx),
      worker: Some(worker),
    })
  }

  /// Number of events waiting to run.
  pub fn pending(&self) -> usize {
    self.tx.as_ref().map_or(0, Sender::len)
  }

  /// Block until every event dispatched before this call has run.
  ///
  /// Returns `false` if that did not happen within `timeout`, or when called
  /// from the worker thread itself (which would otherwise wait on itself).
  pub fn flush(&self, timeout: Duration) -> bool {
    if self.is_worker_thread() {
      return false;
    }
    let Some(tx) = &self.tx else {
      return false;
    };
    let (done_tx, done_rx) = channel::bounded(1);
    if tx.send(Message::Flush(done_tx)).is_err() {
      return false;
    }
    done_rx.recv_timeout(timeout).is_ok()
  }

  fn is_worker_thread(&self) -> bool {
    self
      .worker
      .as_ref()
      .is_some_and(|worker| worker.thread().id() == thread::current().id())
  }
}

impl EventHandler for FifoEventHandler {
  fn dispatch(&self, event: Event) {
    let Some(tx) = &self.tx else {
      return;
    };
    if tx.send(Message::Run(event)).is_err() {
      log::warn!("event worker is gone, dropping transition event");
    }
  }
}

impl Drop for FifoEventHandler {
  fn drop(&mut self) {
    // closing the channel lets the worker drain what is left and exit
    self.tx.take();
    if let Some(worker) = self.worker.take() {
      if worker.thread().id() == thread::current().id() {
        return;
      }
      if worker.join().is_err() {
        log::warn!("event worker terminated abnormally");
      }
    }
  }
}

fn run(rx: Receiver<Message>) {
  for message in rx {
    match message {
      Message::Run(event) => {
        if catch_unwind(AssertUnwindSafe(event)).is_err() {
          log::warn!("transition listener panicked, event dropped");
        }
      },
      Message::Flush(done) => {
        let _ = done.send(());
      },
    }
  }
  log::debug!("event worker stopped");
}

static DEFAULT_HANDLER: Lazy<Arc<dyn EventHandler>> = Lazy::new(|| {
  match FifoEventHandler::spawn("transition-events") {
    Ok(handler) => Arc::new(handler),
    Err(err) => {
      log::warn!("failed to spawn event worker, dispatching inline: {err}");
      Arc::new(ImmediateEventHandler)
    },
  }
});

/// Shared FIFO handler used when a transition is built without one.
pub fn default_handler() -> Arc<dyn EventHandler> {
  DEFAULT_HANDLER.clone()
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{
    AtomicUsize,
    Ordering,
  };

  use parking_lot::Mutex;

  use super::*;

  const TIMEOUT: Duration = Duration::from_secs(5);

  #[test]
  fn immediate_handler_runs_inline() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    ImmediateEventHandler.dispatch(Box::new(move || {
      counter.fetch_add(1, Ordering::SeqCst);
    }));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn fifo_handler_preserves_order() {
    let handler = FifoEventHandler::spawn("fifo-order").unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    for i in 0..200 {
      let seen = seen.clone();
      handler.dispatch(Box::new(move || seen.lock().push(i)));
    }
    assert!(handler.flush(TIMEOUT));
    assert_eq!(*seen.lock(), (0..200).collect::<Vec<_>>());
    assert_eq!(handler.pending(), 0);
  }

  #[test]
  fn fifo_handler_survives_panicking_listener() {
    let handler = FifoEventHandler::spawn("fifo-panic").unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    handler.dispatch(Box::new(|| panic!("listener failure")));
    let counter = hits.clone();
    handler.dispatch(Box::new(move || {
      counter.fetch_add(1, Ordering::SeqCst);
    }));
    assert!(handler.flush(TIMEOUT));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn dropping_handler_drains_queue() {
    let hits = Arc::new(AtomicUsize::new(0));
    {
      let handler = FifoEventHandler::spawn("fifo-drain").unwrap();
      for _ in 0..50 {
        let counter = hits.clone();
        handler.dispatch(Box::new(move || {
          counter.fetch_add(1, Ordering::SeqCst);
        }));
      }
    }
    assert_eq!(hits.load(Ordering::SeqCst), 50);
  }

  #[test]
  fn dispatch_does_not_wait_for_slow_listener() {
    let handler = FifoEventHandler::spawn("fifo-slow").unwrap();
    let (release_tx, release_rx) = channel::bounded::<()>(0);
    handler.dispatch(Box::new(move || {
      let _ = release_rx.recv_timeout(TIMEOUT);
    }));
    // the worker is parked inside the first event, dispatch still returns
    handler.dispatch(Box::new(|| {}));
    release_tx.send(()).unwrap();
    assert!(handler.flush(TIMEOUT));
  }

  #[test]
  fn default_handler_is_shared() {
    let a = default_handler();
    let b = default_handler();
    assert!(Arc::ptr_eq(&a, &b));
  }
}
