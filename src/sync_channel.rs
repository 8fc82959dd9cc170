use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite;
use tracing::{debug, info, trace, warn};
use zagadki_core::{decode, encode, encode_state, ClientMsg, GameState, ServerMsg};

use crate::runtime::StatePublisher;
use crate::transport::Transport;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("invalid relay url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("could not reach relay: {0}")]
    Connect(#[from] tungstenite::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// What a session sees coming out of the channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncEvent {
    Connected,
    PeerConnected,
    PeerDisconnected,
    UpdateState(Vec<u8>),
    Disconnected,
}

impl SyncEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SyncEvent::Connected => "connect",
            SyncEvent::PeerConnected => "peer-connected",
            SyncEvent::PeerDisconnected => "peer-disconnected",
            SyncEvent::UpdateState(_) => "update-state",
            SyncEvent::Disconnected => "disconnect",
        }
    }
}

impl From<ServerMsg> for SyncEvent {
    fn from(msg: ServerMsg) -> Self {
        match msg {
            ServerMsg::PeerConnected => SyncEvent::PeerConnected,
            ServerMsg::PeerDisconnected => SyncEvent::PeerDisconnected,
            ServerMsg::UpdateState { payload } => SyncEvent::UpdateState(payload),
        }
    }
}

struct Shared {
    status: LinkStatus,
    outbound: Option<mpsc::UnboundedSender<Vec<u8>>>,
    // Bumped on every connect/close so a stale reader cannot touch a newer link.
    epoch: u64,
}

/// Cheap handle for sending over whatever link the channel currently holds.
#[derive(Clone)]
pub struct ChannelHandle {
    shared: Arc<Mutex<Shared>>,
}

impl ChannelHandle {
    fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                status: LinkStatus::Disconnected,
                outbound: None,
                epoch: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> LinkStatus {
        self.lock().status
    }

    /// Queues a frame; returns false when there is no open link.
    pub fn send(&self, msg: &ClientMsg) -> bool {
        let shared = self.lock();
        let Some(outbound) = shared.outbound.as_ref() else {
            trace!(event = msg.event_name(), "no open link, dropping");
            return false;
        };
        let Some(bytes) = encode(msg) else {
            warn!(event = msg.event_name(), "failed to encode frame");
            return false;
        };
        outbound.send(bytes).is_ok()
    }
}

impl StatePublisher for ChannelHandle {
    fn publish(&self, state: &GameState) {
        let Some(payload) = encode_state(state) else {
            warn!(view = state.view, "failed to encode game state");
            return;
        };
        if self.send(&ClientMsg::UpdateState { payload }) {
            debug!(view = state.view, "published update-state");
        }
    }
}

pub struct SyncChannel<T: Transport> {
    transport: T,
    handle: ChannelHandle,
    events: Option<mpsc::UnboundedReceiver<SyncEvent>>,
    reader: Option<JoinHandle<()>>,
}

impl<T: Transport> SyncChannel<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            handle: ChannelHandle::new(),
            events: None,
            reader: None,
        }
    }

    pub fn handle(&self) -> ChannelHandle {
        self.handle.clone()
    }

    pub fn status(&self) -> LinkStatus {
        self.handle.status()
    }

    /// Opens a fresh link, dropping any previous one, and says hello.
    pub async fn connect(&mut self) -> Result<(), ChannelError> {
        self.close();
        let epoch = {
            let mut shared = self.handle.lock();
            shared.status = LinkStatus::Connecting;
            shared.epoch
        };

        let link = match self.transport.open().await {
            Ok(link) => link,
            Err(err) => {
                self.handle.lock().status = LinkStatus::Disconnected;
                return Err(err);
            }
        };

        {
            let mut shared = self.handle.lock();
            shared.status = LinkStatus::Connected;
            shared.outbound = Some(link.outbound);
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let _ = events_tx.send(SyncEvent::Connected);
        self.events = Some(events_rx);
        self.reader = Some(tokio::spawn(read_frames(
            link.inbound,
            events_tx,
            self.handle.shared.clone(),
            epoch,
        )));

        info!("connect");
        self.handle.send(&ClientMsg::Hello);
        Ok(())
    }

    /// Next inbound event, or `None` once the channel is closed.
    pub async fn next_event(&mut self) -> Option<SyncEvent> {
        let event = self.events.as_mut()?.recv().await;
        if event.is_none() {
            self.events = None;
        }
        event
    }

    pub fn close(&mut self) {
        {
            let mut shared = self.handle.lock();
            shared.epoch = shared.epoch.wrapping_add(1);
            shared.outbound = None;
            if shared.status != LinkStatus::Disconnected {
                info!("disconnect");
            }
            shared.status = LinkStatus::Disconnected;
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.events = None;
    }
}

impl<T: Transport> Drop for SyncChannel<T> {
    fn drop(&mut self) {
        self.close();
    }
}

async fn read_frames(
    mut inbound: mpsc::UnboundedReceiver<Vec<u8>>,
    events: mpsc::UnboundedSender<SyncEvent>,
    shared: Arc<Mutex<Shared>>,
    epoch: u64,
) {
    while let Some(bytes) = inbound.recv().await {
        let Some(msg) = decode::<ServerMsg>(&bytes) else {
            warn!(len = bytes.len(), "dropping undecodable relay frame");
            continue;
        };
        debug!(event = msg.event_name(), "received");
        if events.send(SyncEvent::from(msg)).is_err() {
            return;
        }
    }

    {
        let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
        if shared.epoch != epoch {
            return;
        }
        shared.status = LinkStatus::Disconnected;
        shared.outbound = None;
    }
    info!("disconnect");
    let _ = events.send(SyncEvent::Disconnected);
}
