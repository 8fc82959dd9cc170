use std::future::Future;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;
use url::Url;
use zagadki_relay::RoomHandle;

use crate::sync_channel::ChannelError;

/// A pair of byte-frame queues bound to one relay connection.
pub struct Link {
    pub outbound: mpsc::UnboundedSender<Vec<u8>>,
    pub inbound: mpsc::UnboundedReceiver<Vec<u8>>,
}

pub trait Transport {
    fn open(&self) -> impl Future<Output = Result<Link, ChannelError>> + Send;
}

/// Joins a relay room living in the same process.
#[derive(Clone)]
pub struct LocalTransport {
    room: RoomHandle,
}

impl LocalTransport {
    pub fn new(room: RoomHandle) -> Self {
        Self { room }
    }
}

impl Transport for LocalTransport {
    fn open(&self) -> impl Future<Output = Result<Link, ChannelError>> + Send {
        let room = self.room.clone();
        async move {
            let (peer, inbound) = room.join();
            let (outbound, mut frames) = mpsc::unbounded_channel::<Vec<u8>>();
            tokio::spawn(async move {
                while let Some(bytes) = frames.recv().await {
                    room.handle_frame(peer, &bytes);
                }
                room.leave(peer);
            });
            Ok(Link { outbound, inbound })
        }
    }
}

/// Connects to a relay over WebSocket, one binary message per frame.
#[derive(Clone, Debug)]
pub struct WsTransport {
    url: Url,
}

impl WsTransport {
    pub fn new(url: &str) -> Result<Self, ChannelError> {
        Ok(Self {
            url: Url::parse(url.trim())?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Transport for WsTransport {
    fn open(&self) -> impl Future<Output = Result<Link, ChannelError>> + Send {
        let url = self.url.clone();
        async move {
            let (ws, _response) = tokio_tungstenite::connect_async(url.as_str()).await?;
            let (mut write, mut read) = ws.split();
            let (outbound, mut frames) = mpsc::unbounded_channel::<Vec<u8>>();
            let (inbound_tx, inbound) = mpsc::unbounded_channel::<Vec<u8>>();

            tokio::spawn(async move {
                while let Some(bytes) = frames.recv().await {
                    if write.send(Message::Binary(bytes.into())).await.is_err() {
                        break;
                    }
                }
                let _ = write.close().await;
            });

            tokio::spawn(async move {
                while let Some(message) = read.next().await {
                    match message {
                        Ok(Message::Binary(bytes)) => {
                            if inbound_tx.send(bytes.to_vec()).is_err() {
                                break;
                            }
                        }
                        Ok(Message::Close(frame)) => {
                            debug!(?frame, "relay closed websocket");
                            break;
                        }
                        Ok(_) => {}
                        Err(err) => {
                            debug!(%err, "websocket read failed");
                            break;
                        }
                    }
                }
            });

            Ok(Link { outbound, inbound })
        }
    }
}
