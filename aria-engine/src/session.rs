use aria_core::{ChatId, Message};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    AwaitingWelcome,
    Active,
    Finalizing,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::Idle
    }
}

/// The whole of a chat session, owned by the controller.
///
/// `messages` is append-only and mutated exclusively by the controller's
/// completion handlers; capture and playback never touch it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub chat_id: Option<ChatId>,
    pub turn_id: u32,
    pub messages: Vec<Message>,
    pub status: SessionStatus,

    // Displayed above the history; intentionally never appended to
    // `messages` (it can still be replayed through the playback arbiter).
    pub welcome: Option<String>,
}

impl Session {
    pub fn fresh() -> Self {
        Self::default()
    }

    /// `chat_id` is present exactly while the session is Active or
    /// Finalizing.
    pub fn invariants_hold(&self) -> bool {
        let bound = matches!(self.status, SessionStatus::Active | SessionStatus::Finalizing);
        self.chat_id.is_some() == bound
    }
}

pub fn status_label(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Idle => "idle",
        SessionStatus::AwaitingWelcome => "awaiting_welcome",
        SessionStatus::Active => "active",
        SessionStatus::Finalizing => "finalizing",
    }
}

/// What `finalize` did. Local state lands in a fresh session in every case
/// except `NoChat`; the remote result only flavors the notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// No chat was active; nothing to do.
    NoChat,

    Reset { remote_error: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_holds_the_chat_id_invariant() {
        let s = Session::fresh();
        assert_eq!(s.status, SessionStatus::Idle);
        assert!(s.chat_id.is_none());
        assert!(s.invariants_hold());
    }

    #[test]
    fn active_without_chat_id_breaks_the_invariant() {
        let s = Session {
            status: SessionStatus::Active,
            ..Session::fresh()
        };
        assert!(!s.invariants_hold());
    }

    #[test]
    fn status_labels_are_stable() {
        assert_eq!(status_label(SessionStatus::Idle), "idle");
        assert_eq!(status_label(SessionStatus::AwaitingWelcome), "awaiting_welcome");
        assert_eq!(status_label(SessionStatus::Active), "active");
        assert_eq!(status_label(SessionStatus::Finalizing), "finalizing");
    }
}
