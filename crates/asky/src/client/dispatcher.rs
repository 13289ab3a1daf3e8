//! Command dispatcher: intercepts command-prefixed drafts and orchestrates
//! the bot reply.
//!
//! The dispatcher is a synchronous two-state machine; the relay client's
//! event loop drives the asynchronous part (the completion call) and feeds
//! the settled outcome back in. At most one completion is outstanding per
//! session because submissions are rejected while one is pending.

use log::warn;

use crate::completion::CompletionOutcome;

use super::session::display_message;

/// Identity attached to generated replies.
pub const BOT_IDENTITY: &str = "Asky";

/// Literal, case-sensitive command prefix.
pub const COMMAND_PREFIX: &str = "Asky: ";

/// Reply substituted when the completion call fails.
pub const FALLBACK_REPLY: &str = "Sorry, I could not come up with a reply.";

/// Bot parameters, fixed for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct BotProfile {
    pub prefix: String,
    pub identity: String,
    pub fallback_reply: String,
}

impl Default for BotProfile {
    fn default() -> Self {
        Self {
            prefix: COMMAND_PREFIX.to_string(),
            identity: BOT_IDENTITY.to_string(),
            fallback_reply: FALLBACK_REPLY.to_string(),
        }
    }
}

/// Dispatcher states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    AwaitingCompletion,
}

/// What a submission resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAction {
    /// Empty or whitespace-only draft; nothing is published.
    Ignore,
    /// A command reply is still outstanding; submission is disabled.
    Reject,
    /// Publish the identity-prefixed payload. When `command` is set, the
    /// dispatcher has moved to `AwaitingCompletion` and the caller must run
    /// the completion call and feed the outcome to [`CommandDispatcher::settle`].
    Publish {
        payload: String,
        command: Option<String>,
    },
}

/// Per-session command dispatcher.
pub struct CommandDispatcher {
    identity: String,
    bot: BotProfile,
    state: DispatcherState,
}

impl CommandDispatcher {
    pub fn new(identity: impl Into<String>) -> Self {
        Self::with_profile(identity, BotProfile::default())
    }

    pub fn with_profile(identity: impl Into<String>, bot: BotProfile) -> Self {
        Self {
            identity: identity.into(),
            bot,
            state: DispatcherState::Idle,
        }
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    /// Handle one draft submission.
    ///
    /// The raw user message is always published first, before any command
    /// handling; the command text is everything after the fixed-length
    /// prefix, trimmed.
    pub fn submit(&mut self, draft: &str) -> SubmitAction {
        let body = draft.trim();
        if body.is_empty() {
            return SubmitAction::Ignore;
        }
        if self.state == DispatcherState::AwaitingCompletion {
            return SubmitAction::Reject;
        }

        let command = body
            .strip_prefix(self.bot.prefix.as_str())
            .map(|rest| rest.trim().to_string());
        if command.is_some() {
            self.state = DispatcherState::AwaitingCompletion;
        }

        SubmitAction::Publish {
            payload: display_message(&self.identity, body),
            command,
        }
    }

    /// Handle the settled completion call, success or failure.
    ///
    /// Re-enables submission unconditionally and returns the bot-prefixed
    /// reply payload to publish. The fallback substitution happens here, in
    /// the open, not inside the adapter.
    pub fn settle(&mut self, outcome: CompletionOutcome) -> String {
        self.state = DispatcherState::Idle;

        let reply = match outcome {
            CompletionOutcome::Reply(text) => text,
            CompletionOutcome::Failed(reason) => {
                warn!("substituting fallback reply: {}", reason);
                self.bot.fallback_reply.clone()
            }
        };
        display_message(&self.bot.identity, &reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> CommandDispatcher {
        CommandDispatcher::new("Alice")
    }

    #[test]
    fn test_whitespace_draft_is_ignored() {
        let mut d = dispatcher();
        assert_eq!(d.submit(""), SubmitAction::Ignore);
        assert_eq!(d.submit("   \t "), SubmitAction::Ignore);
        assert_eq!(d.state(), DispatcherState::Idle);
    }

    #[test]
    fn test_plain_message_publishes_once() {
        let mut d = dispatcher();
        assert_eq!(
            d.submit("hi"),
            SubmitAction::Publish {
                payload: "Alice: hi".to_string(),
                command: None,
            }
        );
        assert_eq!(d.state(), DispatcherState::Idle);
    }

    #[test]
    fn test_draft_is_trimmed_before_publish() {
        let mut d = dispatcher();
        assert_eq!(
            d.submit("  hi there  "),
            SubmitAction::Publish {
                payload: "Alice: hi there".to_string(),
                command: None,
            }
        );
    }

    #[test]
    fn test_command_publishes_raw_message_and_extracts_prompt() {
        let mut d = dispatcher();
        assert_eq!(
            d.submit("Asky: what is 2+2?"),
            SubmitAction::Publish {
                payload: "Alice: Asky: what is 2+2?".to_string(),
                command: Some("what is 2+2?".to_string()),
            }
        );
        assert_eq!(d.state(), DispatcherState::AwaitingCompletion);
    }

    #[test]
    fn test_command_text_is_trimmed() {
        let mut d = dispatcher();
        let SubmitAction::Publish { command, .. } = d.submit("Asky:   spaced out  ") else {
            panic!("expected publish");
        };
        assert_eq!(command, Some("spaced out".to_string()));
    }

    #[test]
    fn test_prefix_match_is_case_sensitive() {
        let mut d = dispatcher();
        let SubmitAction::Publish { command, .. } = d.submit("asky: lowercase") else {
            panic!("expected publish");
        };
        assert_eq!(command, None);
        assert_eq!(d.state(), DispatcherState::Idle);
    }

    #[test]
    fn test_prefix_mid_message_is_not_a_command() {
        let mut d = dispatcher();
        let SubmitAction::Publish { command, .. } = d.submit("ask Asky: something") else {
            panic!("expected publish");
        };
        assert_eq!(command, None);
    }

    #[test]
    fn test_submission_rejected_while_awaiting_completion() {
        let mut d = dispatcher();
        d.submit("Asky: first");
        assert_eq!(d.submit("second"), SubmitAction::Reject);
        assert_eq!(d.submit("Asky: third"), SubmitAction::Reject);
        assert_eq!(d.state(), DispatcherState::AwaitingCompletion);
    }

    #[test]
    fn test_settle_success_publishes_bot_reply() {
        let mut d = dispatcher();
        d.submit("Asky: what is 2+2?");
        let payload = d.settle(CompletionOutcome::Reply("4".to_string()));
        assert_eq!(payload, "Asky: 4");
        assert_eq!(d.state(), DispatcherState::Idle);
    }

    #[test]
    fn test_settle_failure_substitutes_fallback() {
        let mut d = dispatcher();
        d.submit("Asky: what is 2+2?");
        let payload = d.settle(CompletionOutcome::Failed("connection refused".to_string()));
        assert_eq!(payload, format!("Asky: {}", FALLBACK_REPLY));
        assert_eq!(d.state(), DispatcherState::Idle);
    }

    #[test]
    fn test_submission_reenabled_after_settle() {
        let mut d = dispatcher();
        d.submit("Asky: first");
        d.settle(CompletionOutcome::Reply("ok".to_string()));
        assert!(matches!(d.submit("second"), SubmitAction::Publish { .. }));
    }

    #[test]
    fn test_bare_prefix_is_not_a_command() {
        // "Asky: " trims to "Asky:", which no longer carries the literal
        // prefix including its trailing space.
        let mut d = dispatcher();
        let SubmitAction::Publish { command, .. } = d.submit("Asky: ") else {
            panic!("expected publish");
        };
        assert_eq!(command, None);
        assert_eq!(d.state(), DispatcherState::Idle);
    }

    #[test]
    fn test_prompt_after_extra_spaces() {
        let mut d = dispatcher();
        let SubmitAction::Publish { command, .. } = d.submit("Asky:   ?") else {
            panic!("expected publish");
        };
        assert_eq!(command, Some("?".to_string()));
        assert_eq!(d.state(), DispatcherState::AwaitingCompletion);
    }
}
