//! Session lifecycle states for the bridge worker.

use tracing::warn;

/// Where the worker stands in the hub session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Discovering,
    Connecting,
    Connected,
    Disconnected,
    Failed,
}

impl LinkState {
    /// Whether moving to `next` is a legal lifecycle step.
    pub fn can_transition_to(self, next: LinkState) -> bool {
        use LinkState::*;

        self == next
            || matches!(
                (self, next),
                (Idle, Discovering)
                    | (Discovering, Connecting)
                    | (Discovering, Failed)
                    | (Connecting, Connected)
                    | (Connecting, Failed)
                    | (Connected, Disconnected)
                    | (Connected, Failed)
            )
    }
}

/// Tracks the worker's position in the lifecycle. An illegal move points
/// at a worker bug: it is logged and refused, never fatal.
#[derive(Debug)]
pub(super) struct LinkTracker {
    state: LinkState,
}

impl LinkTracker {
    pub fn new() -> Self {
        Self {
            state: LinkState::Idle,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn advance(&mut self, next: LinkState) -> bool {
        if self.state.can_transition_to(next) {
            self.state = next;
            true
        } else {
            warn!("illegal link transition {:?} -> {:?}", self.state, next);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LinkState::*;

    #[test]
    fn test_nominal_lifecycle_is_legal() {
        let mut link = LinkTracker::new();
        for next in [Discovering, Connecting, Connected, Disconnected] {
            assert!(link.advance(next), "{next:?} should be reachable");
        }
    }

    #[test]
    fn test_every_active_state_can_fail() {
        for from in [Discovering, Connecting, Connected] {
            assert!(from.can_transition_to(Failed));
        }
    }

    #[test]
    fn test_terminal_states_stay_terminal() {
        for from in [Disconnected, Failed] {
            for to in [Idle, Discovering, Connecting, Connected] {
                assert!(!from.can_transition_to(to), "{from:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn test_illegal_transition_is_refused_not_fatal() {
        let mut link = LinkTracker::new();
        assert!(!link.advance(Connected));
        assert_eq!(link.state(), Idle);
    }

    #[test]
    fn test_skipping_discovery_is_illegal() {
        assert!(!Idle.can_transition_to(Connecting));
        assert!(!Idle.can_transition_to(Connected));
    }
}
