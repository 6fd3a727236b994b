use aria_core::{ChatId, UserId};
use aria_providers::error::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A complete, finalized audio recording ready for transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Welcome {
    pub message: String,
    pub chat_id: ChatId,
}

/// A synthesis voice as enumerated by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceProfile {
    pub name: String,
    pub language: String,
}

#[async_trait]
pub trait CompanionApi: Send + Sync {
    async fn welcome(&self, user: &UserId) -> Result<Welcome, ApiError>;

    async fn exchange(
        &self,
        user: &UserId,
        chat: &ChatId,
        prompt: &str,
        turn_id: u32,
    ) -> Result<String, ApiError>;

    async fn finalize(&self, user: &UserId, chat: &ChatId) -> Result<(), ApiError>;
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &AudioArtifact) -> Result<String, ApiError>;
}

/// Platform speech synthesis.
///
/// `speak` resolves when the utterance ends, naturally or via `cancel`; the
/// arbiter decides what a completion means. `cancel` must take effect
/// immediately and is safe to call with nothing playing.
#[async_trait]
pub trait SpeechSynth: Send + Sync {
    fn voices(&self) -> Vec<VoiceProfile>;

    async fn speak(&self, text: &str, voice: Option<&VoiceProfile>) -> anyhow::Result<()>;

    fn cancel(&self);
}
