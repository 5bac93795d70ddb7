//! API module for the HTTP and WebSocket endpoints

pub mod http;
pub mod websocket;

pub use http::create_router;
pub use websocket::AppState;
