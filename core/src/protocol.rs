use rkyv::{Archive, Deserialize, Serialize};

/// Frames an endpoint sends to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum ClientMsg {
    Hello,
    UpdateState { payload: Vec<u8> },
}

/// Frames the relay delivers to an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum ServerMsg {
    PeerConnected,
    PeerDisconnected,
    UpdateState { payload: Vec<u8> },
}

impl ClientMsg {
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientMsg::Hello => "hello",
            ClientMsg::UpdateState { .. } => "update-state",
        }
    }
}

impl ServerMsg {
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerMsg::PeerConnected => "peer-connected",
            ServerMsg::PeerDisconnected => "peer-disconnected",
            ServerMsg::UpdateState { .. } => "update-state",
        }
    }
}
