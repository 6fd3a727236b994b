use crate::playback::PlaybackArbiter;
use crate::session::{FinalizeOutcome, Session, SessionStatus, status_label};
use crate::traits::CompanionApi;
use aria_core::{ClientError, Message, UserId};
use aria_providers::error::ApiError;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("another exchange is already in flight")]
    ExchangeInFlight,

    #[error("no active chat")]
    NotActive,

    #[error("empty prompt")]
    EmptyPrompt,

    #[error("user id must not be empty")]
    MissingUser,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl EngineError {
    /// The user-facing notification kind, where one applies.
    pub fn as_client_error(&self) -> Option<ClientError> {
        match self {
            EngineError::Api(e) => Some(e.as_client_error()),
            _ => None,
        }
    }
}

/// Owns chat/turn identity and message history, and sequences every network
/// exchange for the session.
///
/// A single in-flight-exchange guard gates the whole controller: while any
/// welcome/turn/finalize request is outstanding, further calls are rejected
/// with `ExchangeInFlight` instead of queueing, so overlapping requests can
/// never race the turn id. The guard is scoped and releases on every exit
/// path. Capture and playback run outside the guard; they own independent
/// state machines and may legitimately overlap a settled session.
pub struct SessionController {
    api: Arc<dyn CompanionApi>,
    playback: Option<Arc<PlaybackArbiter>>,
    user_id: UserId,
    inner: Mutex<Session>,

    // The in-flight-exchange flag, held as a try-lock mutex.
    exchange: Mutex<()>,
}

impl SessionController {
    pub fn new(user_id: UserId, api: Arc<dyn CompanionApi>) -> Self {
        Self {
            api,
            playback: None,
            user_id,
            inner: Mutex::new(Session::fresh()),
            exchange: Mutex::new(()),
        }
    }

    pub fn with_playback(mut self, playback: Arc<PlaybackArbiter>) -> Self {
        self.playback = Some(playback);
        self
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub async fn snapshot(&self) -> Session {
        self.inner.lock().await.clone()
    }

    /// Fetch the welcome message and bind a fresh chat id.
    ///
    /// Idle -> AwaitingWelcome -> Active on success. On failure the session
    /// drops back to Idle with no chat id; the caller may retry.
    pub async fn initialize(&self) -> Result<(), EngineError> {
        let _guard = self
            .exchange
            .try_lock()
            .map_err(|_| EngineError::ExchangeInFlight)?;

        self.fetch_welcome().await
    }

    async fn fetch_welcome(&self) -> Result<(), EngineError> {
        if self.user_id.as_str().trim().is_empty() {
            return Err(EngineError::MissingUser);
        }

        {
            let mut s = self.inner.lock().await;
            s.status = SessionStatus::AwaitingWelcome;
        }

        match self.api.welcome(&self.user_id).await {
            Ok(welcome) => {
                {
                    let mut s = self.inner.lock().await;
                    s.chat_id = Some(welcome.chat_id.clone());
                    s.welcome = Some(welcome.message.clone());
                    s.status = SessionStatus::Active;
                }

                log::info!(
                    "chat {} ready for {}",
                    welcome.chat_id.as_str(),
                    self.user_id.as_str()
                );

                self.speak_if_enabled(&welcome.message).await;
                Ok(())
            }
            Err(e) => {
                let mut s = self.inner.lock().await;
                s.chat_id = None;
                s.status = SessionStatus::Idle;
                Err(e.into())
            }
        }
    }

    /// Send one turn. On success exactly two messages are appended (User
    /// then Agent) and the turn id advances by one; on failure nothing
    /// changes and the caller keeps its composition buffer.
    pub async fn submit_text(&self, raw: &str) -> Result<String, EngineError> {
        let _guard = self
            .exchange
            .try_lock()
            .map_err(|_| EngineError::ExchangeInFlight)?;

        let prompt = raw.trim();
        if prompt.is_empty() {
            return Err(EngineError::EmptyPrompt);
        }

        let (chat, turn_id) = {
            let s = self.inner.lock().await;
            match (&s.chat_id, s.status) {
                (Some(chat), SessionStatus::Active) => (chat.clone(), s.turn_id),
                (_, status) => {
                    log::warn!("submit rejected while {}", status_label(status));
                    return Err(EngineError::NotActive);
                }
            }
        };

        let reply = self
            .api
            .exchange(&self.user_id, &chat, prompt, turn_id)
            .await?;

        {
            let mut s = self.inner.lock().await;
            s.messages.push(Message::user(prompt));
            s.messages.push(Message::agent(reply.clone()));
            s.turn_id += 1;
        }

        log::debug!("turn {turn_id} complete");
        self.speak_if_enabled(&reply).await;
        Ok(reply)
    }

    /// Voice input converges on the typed-text path and its invariants.
    pub async fn submit_transcript(&self, transcript: &str) -> Result<String, EngineError> {
        self.submit_text(transcript).await
    }

    /// Finalize the current chat and land in a fresh one.
    ///
    /// Locally optimistic: the session is reset and re-initialized no matter
    /// what the remote said; its outcome only flavors the notification.
    pub async fn finalize(&self) -> Result<FinalizeOutcome, EngineError> {
        let _guard = self
            .exchange
            .try_lock()
            .map_err(|_| EngineError::ExchangeInFlight)?;

        let chat = {
            let mut s = self.inner.lock().await;
            let Some(chat) = s.chat_id.clone() else {
                return Ok(FinalizeOutcome::NoChat);
            };
            s.status = SessionStatus::Finalizing;
            chat
        };

        let remote = self.api.finalize(&self.user_id, &chat).await;
        if let Err(e) = &remote {
            log::warn!("remote finalize failed: {e}");
        }

        {
            let mut s = self.inner.lock().await;
            *s = Session::fresh();
        }

        if let Err(e) = self.fetch_welcome().await {
            log::warn!("re-initialize after finalize failed: {e}");
        }

        Ok(FinalizeOutcome::Reset {
            remote_error: remote.err().map(|e| e.to_string()),
        })
    }

    /// Replay a message (or the welcome text) through the playback arbiter.
    pub async fn replay(&self, text: &str) {
        self.speak_if_enabled(text).await;
    }

    async fn speak_if_enabled(&self, text: &str) {
        if let Some(playback) = &self.playback {
            playback.speak(text).await;
        }
    }
}
