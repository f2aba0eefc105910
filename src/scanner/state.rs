use serde::{Deserialize, Serialize};
use tracing::trace;

/// Lifecycle of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanState {
    NotStarted,
    StepIterating { step: usize, path: usize },
    Vulnerable,
    Completed,
    Done,
}

impl ScanState {
    pub fn can_transition_to(&self, next: &ScanState) -> bool {
        use ScanState::*;
        matches!(
            (self, next),
            (NotStarted, StepIterating { .. })
                | (NotStarted, Completed)
                | (StepIterating { .. }, StepIterating { .. })
                | (StepIterating { .. }, Vulnerable)
                | (StepIterating { .. }, Completed)
                | (Vulnerable, Done)
                | (Completed, Done)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanState::Done)
    }
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not-started"),
            Self::StepIterating { step, path } => write!(f, "step-iterating({}, {})", step, path),
            Self::Vulnerable => write!(f, "vulnerable"),
            Self::Completed => write!(f, "completed"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Tracks the current state of a running scan and logs each transition.
#[derive(Debug)]
pub(crate) struct ScanTracker {
    state: ScanState,
}

impl ScanTracker {
    pub fn new() -> Self {
        Self {
            state: ScanState::NotStarted,
        }
    }

    pub fn advance(&mut self, next: ScanState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "illegal scan transition {} -> {}",
            self.state,
            next
        );
        trace!(from = %self.state, to = %next, "Scan state transition");
        self.state = next;
    }

    pub fn state(&self) -> ScanState {
        self.state
    }
}
