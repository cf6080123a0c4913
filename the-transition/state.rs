use std::fmt;

/// Lifecycle position of a transition.
///
/// ```text
/// Constructed -> Ready -> Playing -> Finished -> Ready -> ...
///                                 \-> Aborted  -/
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionState {
  Constructed,
  Ready,
  Playing,
  Finished,
  Aborted,
}

impl TransitionState {
  pub const ALL: [TransitionState; 5] = [
    TransitionState::Constructed,
    TransitionState::Ready,
    TransitionState::Playing,
    TransitionState::Finished,
    TransitionState::Aborted,
  ];

  /// Whether moving from `self` to `next` is a legal lifecycle step.
  pub fn can_become(self, next: TransitionState) -> bool {
    use TransitionState::*;
    matches!(
      (self, next),
      (Constructed, Ready)
        | (Ready, Playing)
        | (Playing, Finished)
        | (Playing, Aborted)
        | (Finished, Ready)
        | (Aborted, Ready)
    )
  }

  /// Finished or aborted: the run is over and only a reset is allowed.
  pub fn is_done(self) -> bool {
    matches!(self, TransitionState::Finished | TransitionState::Aborted)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      TransitionState::Constructed => "constructed",
      TransitionState::Ready => "ready",
      TransitionState::Playing => "playing",
      TransitionState::Finished => "finished",
      TransitionState::Aborted => "aborted",
    }
  }
}

impl fmt::Display for TransitionState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
