//! WebSocket relay: wire frames, broadcast hub, connection handler.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Clients (asky chat)                     │
//! │  - One WebSocket connection per participant                  │
//! │  - Publishes and receives the single chat Frame kind         │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ WebSocket (GET /api/ws)
//! ┌──────────────────────────────▼───────────────────────────────┐
//! │                          ChatHub                             │
//! │  - Connection registry owned by one actor task               │
//! │  - Every publish fans out to every connection, sender        │
//! │    included, before the next command is handled              │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod handler;
mod hub;
mod types;

pub use handler::ws_handler;
pub use hub::{ChatHub, ConnectionId, NewConnection};
pub use types::Frame;
