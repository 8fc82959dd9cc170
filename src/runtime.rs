use tracing::trace;
use zagadki_core::GameState;

/// Who may originate `update-state`. Viewers only mirror.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Role {
    Authority,
    #[default]
    Viewer,
}

/// Outbound side of a session. Publishing never blocks and never fails
/// visibly; an undelivered update is simply not observed.
pub trait StatePublisher {
    fn publish(&self, state: &GameState);
}

/// Publisher for sessions with no relay attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalPublisher;

impl StatePublisher for LocalPublisher {
    fn publish(&self, state: &GameState) {
        trace!(view = state.view, "local session, nothing to publish");
    }
}
