//! WebSocket transport adapter
//!
//! Exposes the relay core over a WebSocket endpoint at `/ws`. The handler
//! owns connection upgrade and the per-socket read/write pumps; everything
//! protocol-level lives in the core modules.

pub mod handler;
pub mod state;

pub use state::AppState;
