use tracing::{debug, info, warn};
use zagadki_core::catalog::{catalog_for, resolve, Answer, PuzzleConfig, PuzzleKind};
use zagadki_core::placement::{apply_layout, is_solved, layout_of, place, reconcile, Item};
use zagadki_core::{decode_state, project, CoreAction, DropRecord, Extra, GameState, PuzzleView, StateError};

use crate::runtime::{Role, StatePublisher};
use crate::sync_channel::{SyncChannel, SyncEvent};
use crate::transport::Transport;

/// Owns one participant's copy of the replicated state.
pub struct SessionController<P: StatePublisher> {
    kind: PuzzleKind,
    role: Role,
    state: GameState,
    items: Vec<Item>,
    solved: bool,
    publisher: P,
}

impl<P: StatePublisher> SessionController<P> {
    pub fn new(kind: PuzzleKind, role: Role, publisher: P) -> Self {
        let state = GameState::new();
        let config = resolve(kind, state.view);
        let items = config.default_items();
        let solved = is_solved(&config.answer, &items, state.selected());
        Self {
            kind,
            role,
            state,
            items,
            solved,
            publisher,
        }
    }

    pub fn kind(&self) -> PuzzleKind {
        self.kind
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn solved(&self) -> bool {
        self.solved
    }

    pub fn config(&self) -> &'static PuzzleConfig {
        resolve(self.kind, self.state.view)
    }

    pub fn projection(&self) -> PuzzleView {
        project(self.kind, &self.state, &self.items)
    }

    pub fn place(&mut self, item_id: u32, container: &str) -> bool {
        self.apply_local(CoreAction::Place {
            item_id,
            container: container.to_string(),
        })
    }

    pub fn select(&mut self, asset: &str) -> bool {
        self.apply_local(CoreAction::Select {
            asset: asset.to_string(),
        })
    }

    pub fn switch_view(&mut self, view: u32) -> bool {
        self.apply_local(CoreAction::SwitchView { view })
    }

    pub fn dismiss(&mut self) -> bool {
        self.apply_local(CoreAction::Dismiss)
    }

    /// Applies a local action, publishes the resulting state and adopts it.
    /// Returns false when the action changed nothing.
    pub fn apply_local(&mut self, action: CoreAction) -> bool {
        if self.role == Role::Viewer {
            debug!(?action, "viewer ignores local action");
            return false;
        }
        let Some((state, items)) = self.next_for(action) else {
            return false;
        };
        self.publisher.publish(&state);
        self.adopt(state, items);
        true
    }

    fn next_for(&self, action: CoreAction) -> Option<(GameState, Vec<Item>)> {
        let config = self.config();
        match action {
            CoreAction::Place { item_id, container } => {
                if !matches!(config.answer, Answer::Sorting(_)) {
                    return None;
                }
                if !config.accepts_container(&container) {
                    debug!(%container, "drop on unknown container ignored");
                    return None;
                }
                if !self.items.iter().any(|item| item.id == item_id) {
                    return None;
                }
                let items = place(&self.items, item_id, &container);
                let state = GameState {
                    view: self.state.view,
                    extra: Extra::Dropped(DropRecord {
                        item: item_id,
                        container,
                        layout: layout_of(&items),
                    }),
                };
                Some((state, items))
            }
            CoreAction::Select { asset } => {
                if !matches!(config.answer, Answer::Pick(_)) {
                    return None;
                }
                if !config.assets.contains(&asset.as_str()) {
                    debug!(%asset, "selection outside the puzzle ignored");
                    return None;
                }
                let state = GameState {
                    view: self.state.view,
                    extra: Extra::Selected(asset),
                };
                Some((state, self.items.clone()))
            }
            CoreAction::SwitchView { view } => {
                if view == self.state.view {
                    return None;
                }
                let state = GameState {
                    view,
                    extra: Extra::Empty,
                };
                let items = reconcile(&self.items, resolve(self.kind, view));
                Some((state, items))
            }
            CoreAction::Dismiss => {
                if !self.solved {
                    return None;
                }
                match config.answer {
                    Answer::Sorting(_) => {
                        let view = catalog_for(self.kind).next_view(self.state.view);
                        self.next_for(CoreAction::SwitchView { view })
                    }
                    Answer::Pick(_) => {
                        let state = GameState {
                            view: self.state.view,
                            extra: Extra::Empty,
                        };
                        Some((state, self.items.clone()))
                    }
                }
            }
        }
    }

    /// Replaces the local state with an inbound payload. Never publishes.
    pub fn apply_remote(&mut self, payload: &[u8]) -> Result<(), StateError> {
        let state = decode_state(payload)?;
        state.validate_for(self.kind)?;
        let config = resolve(self.kind, state.view);
        let mut items = reconcile(&self.items, config);
        if let Some(layout) = state.layout() {
            items = apply_layout(&items, layout);
        }
        self.adopt(state, items);
        Ok(())
    }

    fn adopt(&mut self, state: GameState, items: Vec<Item>) {
        let config = resolve(self.kind, state.view);
        let solved = is_solved(&config.answer, &items, state.selected());
        if solved && !self.solved {
            info!(kind = %self.kind, view = state.view, "puzzle solved");
        }
        self.state = state;
        self.items = items;
        self.solved = solved;
    }

    /// Returns true when the event changed what should be rendered.
    pub fn handle_event(&mut self, event: &SyncEvent) -> bool {
        match event {
            SyncEvent::UpdateState(payload) => match self.apply_remote(payload) {
                Ok(()) => {
                    debug!(view = self.state.view, "state replaced from relay");
                    true
                }
                Err(err) => {
                    warn!(%err, "discarding inbound update-state");
                    false
                }
            },
            SyncEvent::PeerConnected => {
                info!("a user connected");
                false
            }
            SyncEvent::PeerDisconnected => {
                info!("a user disconnected");
                false
            }
            SyncEvent::Connected | SyncEvent::Disconnected => false,
        }
    }

    /// Feeds channel events into the controller until the link goes away,
    /// rendering once up front and after every accepted change.
    pub async fn run<T: Transport>(
        &mut self,
        channel: &mut SyncChannel<T>,
        mut on_render: impl FnMut(&PuzzleView),
    ) {
        on_render(&self.projection());
        while let Some(event) = channel.next_event().await {
            if self.handle_event(&event) {
                on_render(&self.projection());
            }
            if event == SyncEvent::Disconnected {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use zagadki_core::{encode_state, Placement, HEAP};

    use super::*;
    use crate::runtime::LocalPublisher;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<GameState>>>);

    impl StatePublisher for Recorder {
        fn publish(&self, state: &GameState) {
            self.0.borrow_mut().push(state.clone());
        }
    }

    #[test]
    fn local_place_publishes_full_state() {
        let recorder = Recorder::default();
        let mut session = SessionController::new(PuzzleKind::Sorting, Role::Authority, recorder.clone());
        assert!(session.place(2, "3"));

        let published = recorder.0.borrow();
        assert_eq!(published.len(), 1);
        assert_eq!(&published[0], session.state());
        let Extra::Dropped(record) = &published[0].extra else {
            panic!("expected a drop record");
        };
        assert_eq!(record.item, 2);
        assert_eq!(record.container, "3");
        assert_eq!(record.layout.len(), 3);
    }

    #[test]
    fn stale_item_and_unknown_container_are_ignored() {
        let recorder = Recorder::default();
        let mut session = SessionController::new(PuzzleKind::Sorting, Role::Authority, recorder.clone());
        assert!(!session.place(42, "1"));
        assert!(!session.place(1, "attic"));
        assert!(recorder.0.borrow().is_empty());
        assert!(session.items().iter().all(|item| item.container == HEAP));
    }

    #[test]
    fn viewer_never_originates_updates() {
        let recorder = Recorder::default();
        let mut session = SessionController::new(PuzzleKind::SinglePick, Role::Viewer, recorder.clone());
        assert!(!session.select("img/a2.png"));
        assert!(!session.switch_view(1));
        assert!(recorder.0.borrow().is_empty());
        assert_eq!(session.state(), &GameState::new());
    }

    #[test]
    fn sorting_win_and_dismiss_advances_view() {
        let mut session = SessionController::new(PuzzleKind::Sorting, Role::Authority, LocalPublisher);
        assert!(!session.dismiss());
        session.place(1, "1");
        session.place(2, "3");
        assert!(!session.solved());
        session.place(3, "2");
        assert!(session.solved());
        assert_eq!(session.projection().celebration.as_deref(), Some("img/d1.svg"));

        assert!(session.dismiss());
        assert_eq!(session.state().view, 1);
        assert!(!session.solved());
        assert_eq!(session.items()[0].source, "img/giraffe.svg");
        assert!(session.items().iter().all(|item| item.container == HEAP));
    }

    #[test]
    fn pick_dismiss_clears_selection() {
        let mut session = SessionController::new(PuzzleKind::OddOneOut, Role::Authority, LocalPublisher);
        assert!(session.select("img/c4.svg"));
        assert!(session.solved());
        assert!(session.dismiss());
        assert_eq!(session.state().extra, Extra::Empty);
        assert_eq!(session.state().view, 0);
    }

    #[test]
    fn inbound_update_replaces_without_publishing() {
        let recorder = Recorder::default();
        let mut session = SessionController::new(PuzzleKind::SinglePick, Role::Authority, recorder.clone());
        session.select("img/a3.png");
        recorder.0.borrow_mut().clear();

        let incoming = GameState {
            view: 1,
            extra: Extra::Selected("img/e3.png".to_string()),
        };
        let payload = encode_state(&incoming).expect("state should encode");
        assert!(session.handle_event(&SyncEvent::UpdateState(payload)));

        assert_eq!(session.state(), &incoming);
        assert!(session.solved());
        assert!(recorder.0.borrow().is_empty());
    }

    #[test]
    fn inbound_layout_rebuilds_items() {
        let mut authority = SessionController::new(PuzzleKind::Sorting, Role::Authority, LocalPublisher);
        authority.switch_view(1);
        authority.place(3, "2");
        let payload = encode_state(authority.state()).expect("state should encode");

        let mut viewer = SessionController::new(PuzzleKind::Sorting, Role::Viewer, LocalPublisher);
        assert!(viewer.handle_event(&SyncEvent::UpdateState(payload)));
        assert_eq!(viewer.items(), authority.items());
        assert_eq!(viewer.projection(), authority.projection());
    }

    #[test]
    fn mismatched_payload_is_discarded() {
        let mut session = SessionController::new(PuzzleKind::Sorting, Role::Viewer, LocalPublisher);
        let foreign = GameState {
            view: 1,
            extra: Extra::Selected("img/e3.png".to_string()),
        };
        let payload = encode_state(&foreign).expect("state should encode");
        assert!(!session.handle_event(&SyncEvent::UpdateState(payload)));
        assert!(!session.handle_event(&SyncEvent::UpdateState(vec![1, 2])));
        assert_eq!(session.state(), &GameState::new());
    }

    #[test]
    fn switching_to_the_current_view_is_a_no_op() {
        let recorder = Recorder::default();
        let mut session = SessionController::new(PuzzleKind::Sorting, Role::Authority, recorder.clone());
        session.place(1, "1");
        assert!(!session.switch_view(0));
        assert_eq!(recorder.0.borrow().len(), 1);

        // Whatever was published last must rebuild the same board elsewhere.
        let last = recorder.0.borrow().last().cloned().expect("one publish");
        let mut late = SessionController::new(PuzzleKind::Sorting, Role::Viewer, LocalPublisher);
        late.apply_remote(&encode_state(&last).expect("state should encode"))
            .expect("published state is valid");
        assert_eq!(late.items(), session.items());
    }

    #[test]
    fn inbound_state_outside_the_puzzle_is_discarded() {
        let mut pick = SessionController::new(PuzzleKind::SinglePick, Role::Viewer, LocalPublisher);
        let stray = GameState {
            view: 1,
            extra: Extra::Selected("img/not-in-puzzle.png".to_string()),
        };
        let payload = encode_state(&stray).expect("state should encode");
        assert!(!pick.handle_event(&SyncEvent::UpdateState(payload)));
        assert_eq!(pick.state(), &GameState::new());

        let mut sorting = SessionController::new(PuzzleKind::Sorting, Role::Viewer, LocalPublisher);
        let stray = GameState {
            view: 0,
            extra: Extra::Dropped(DropRecord {
                item: 1,
                container: "attic".to_string(),
                layout: vec![
                    Placement {
                        item: 1,
                        container: "attic".to_string(),
                    },
                    Placement {
                        item: 99,
                        container: "1".to_string(),
                    },
                ],
            }),
        };
        let payload = encode_state(&stray).expect("state should encode");
        assert_eq!(
            sorting.apply_remote(&payload),
            Err(StateError::UnknownContainer {
                container: "attic".to_string(),
            })
        );
        assert!(sorting.items().iter().all(|item| item.container == HEAP));
    }
}
