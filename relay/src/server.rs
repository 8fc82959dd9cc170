use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

use crate::room::RoomHandle;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("failed to bind relay on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("accept failed: {0}")]
    Accept(#[from] std::io::Error),
    #[error("websocket handshake failed: {0}")]
    Handshake(#[from] tungstenite::Error),
}

pub async fn bind(addr: &str) -> Result<TcpListener, RelayError> {
    TcpListener::bind(addr).await.map_err(|source| RelayError::Bind {
        addr: addr.to_string(),
        source,
    })
}

/// Accepts WebSocket peers forever, routing every frame through `room`.
pub async fn serve(listener: TcpListener, room: RoomHandle) -> Result<(), RelayError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "relay listening");
    }
    loop {
        let (stream, addr) = listener.accept().await?;
        let room = room.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, room).await {
                warn!(%addr, %err, "connection closed with error");
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, room: RoomHandle) -> Result<(), RelayError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut write, mut read) = ws.split();
    let (peer, mut outbound) = room.join();

    let writer = tokio::spawn(async move {
        while let Some(bytes) = outbound.recv().await {
            if write.send(Message::Binary(bytes.into())).await.is_err() {
                break;
            }
        }
        let _ = write.close().await;
    });

    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Binary(bytes)) => room.handle_frame(peer, &bytes),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                debug!(peer, %err, "read failed");
                break;
            }
        }
    }

    room.leave(peer);
    writer.abort();
    Ok(())
}
