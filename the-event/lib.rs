//! Listener event dispatch for transitions.
//!
//! Transitions never call their listeners directly. Every notification is
//! packaged as an [`Event`] and handed to an [`EventHandler`], which decides
//! where and when it runs. This keeps the frame loop that drives a transition
//! independent of how long a listener (usually a repaint) takes.

mod dispatch;

pub use dispatch::{
  Event,
  EventHandler,
  FifoEventHandler,
  ImmediateEventHandler,
  default_handler,
};
