//! Wire protocol types for the chat relay.
//!
//! Exactly one logical event kind travels over the channel, in both
//! directions. The payload is an opaque display string; the relay never
//! parses it.

use serde::{Deserialize, Serialize};

/// A frame exchanged between client and server over the WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// Chat traffic. The payload is the full `"<identity>: <body>"` string.
    ChatMessage { payload: String },
}
