pub mod config;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod sync_channel;
pub mod transport;

pub use runtime::{LocalPublisher, Role, StatePublisher};
pub use session::SessionController;
pub use sync_channel::{ChannelError, ChannelHandle, LinkStatus, SyncChannel, SyncEvent};
pub use transport::{Link, LocalTransport, Transport, WsTransport};
