//! Channel Relay Server
//!
//! A WebSocket connection broker: clients join named channels and every
//! message they publish is relayed to the other members of the same channel.
//!
//! # Features
//!
//! - **Named channels**: created implicitly on first join, membership unique
//! - **Broadcast fan-out**: every member except the sender, at most once each
//! - **Acknowledgments**: join and publish acks echo the client request id
//! - **Lifecycle notifications**: join and departure events for each channel
//! - **Best-effort delivery**: slow or closed peers never stall a sender
//!
//! # Modules
//!
//! - `protocol`: inbound/outbound wire frames (tagged JSON objects)
//! - `connection`: handle over one live transport session
//! - `registry`: channel name → member set, behind one mutex
//! - `router`: per-frame dispatch (join, publish) against the registry
//! - `lifecycle`: open/close wiring, exactly-once departure fan-out
//! - `api`: axum transport adapter (`/ws` endpoint, CORS, health check)
//! - `config`: listen address from environment variables

pub mod api;
pub mod config;
pub mod connection;
pub mod lifecycle;
pub mod protocol;
pub mod registry;
pub mod router;

// Re-export commonly used items at crate root
pub use api::{create_router, AppState};
pub use config::ServerConfig;
pub use connection::ConnectionHandle;
pub use lifecycle::LifecycleCoordinator;
pub use protocol::{InboundFrame, OutboundFrame};
pub use registry::ChannelRegistry;
pub use router::MessageRouter;

/// Result alias for fallible startup paths.
pub type RelayResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
