//! Per-session client state: identity and the received-message log.

/// Identity used when none was supplied at session start.
pub const ANONYMOUS_IDENTITY: &str = "anonymous";

/// Resolve the display identity for a session.
///
/// Resolved once at session start and never renegotiated; absent or empty
/// input falls back to the anonymous placeholder.
pub fn resolve_identity(requested: Option<&str>) -> String {
    match requested.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => ANONYMOUS_IDENTITY.to_string(),
    }
}

/// Format a message for the wire: `"<identity>: <body>"`.
pub fn display_message(identity: &str, body: &str) -> String {
    format!("{}: {}", identity, body)
}

/// Ordered, append-only log of received messages.
///
/// Fed exclusively by the round-trip receive path; the client never appends
/// its own messages locally. Never reorders, never deduplicates, lost when
/// the session ends.
#[derive(Debug, Default)]
pub struct SessionLog {
    messages: Vec<String>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a received message. Existing entries are never touched.
    pub fn append(&mut self, message: String) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
