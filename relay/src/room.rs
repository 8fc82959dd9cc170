use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use zagadki_core::{decode, encode, ClientMsg, ServerMsg};

pub type PeerId = u64;

struct RoomRuntime {
    peers: HashMap<PeerId, mpsc::UnboundedSender<Vec<u8>>>,
    last_state: Option<Vec<u8>>,
    next_peer_id: PeerId,
    replay_last_state: bool,
}

impl RoomRuntime {
    fn new(replay_last_state: bool) -> Self {
        Self {
            peers: HashMap::new(),
            last_state: None,
            next_peer_id: 1,
            replay_last_state,
        }
    }

    fn send_to(&self, peer: PeerId, msg: &ServerMsg) {
        let Some(tx) = self.peers.get(&peer) else {
            return;
        };
        if let Some(bytes) = encode(msg) {
            let _ = tx.send(bytes);
        }
    }

    fn broadcast_except(&mut self, from: PeerId, msg: &ServerMsg) {
        let Some(bytes) = encode(msg) else {
            return;
        };
        self.peers.retain(|_, tx| !tx.is_closed());
        for (peer, tx) in &self.peers {
            if *peer == from {
                continue;
            }
            let _ = tx.send(bytes.clone());
        }
    }
}

/// The shared relay point. Cloning shares the same room.
#[derive(Clone)]
pub struct RoomHandle {
    inner: Arc<Mutex<RoomRuntime>>,
}

impl RoomHandle {
    pub fn new(replay_last_state: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RoomRuntime::new(replay_last_state))),
        }
    }

    fn runtime(&self) -> MutexGuard<'_, RoomRuntime> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a peer and returns the queue of frames addressed to it.
    pub fn join(&self) -> (PeerId, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut runtime = self.runtime();
        let peer = runtime.next_peer_id;
        runtime.next_peer_id += 1;
        runtime.peers.insert(peer, tx);
        runtime.broadcast_except(peer, &ServerMsg::PeerConnected);
        if runtime.replay_last_state {
            if let Some(payload) = runtime.last_state.clone() {
                runtime.send_to(peer, &ServerMsg::UpdateState { payload });
            }
        }
        info!(peer, peers = runtime.peers.len(), "peer joined");
        (peer, rx)
    }

    pub fn leave(&self, peer: PeerId) {
        let mut runtime = self.runtime();
        if runtime.peers.remove(&peer).is_none() {
            return;
        }
        runtime.broadcast_except(peer, &ServerMsg::PeerDisconnected);
        info!(peer, peers = runtime.peers.len(), "peer left");
    }

    pub fn handle_frame(&self, peer: PeerId, bytes: &[u8]) {
        let Some(msg) = decode::<ClientMsg>(bytes) else {
            warn!(peer, len = bytes.len(), "dropping undecodable frame");
            return;
        };
        let mut runtime = self.runtime();
        if !runtime.peers.contains_key(&peer) {
            debug!(peer, event = msg.event_name(), "frame from departed peer");
            return;
        }
        match msg {
            ClientMsg::Hello => {
                info!(peer, "hello");
            }
            ClientMsg::UpdateState { payload } => {
                debug!(peer, len = payload.len(), "relaying update-state");
                runtime.last_state = Some(payload.clone());
                runtime.broadcast_except(peer, &ServerMsg::UpdateState { payload });
            }
        }
    }

    pub fn peer_count(&self) -> usize {
        self.runtime().peers.len()
    }

    pub fn last_state(&self) -> Option<Vec<u8>> {
        self.runtime().last_state.clone()
    }
}
