use aria_core::{ChatId, UserId};
use aria_engine::traits::{AudioArtifact, CompanionApi, Transcriber, Welcome};
use aria_providers::companion::{
    AudioUpload, build_finalize_request, build_turn_request, build_voice_to_text_request,
    build_welcome_request,
};
use aria_providers::error::ApiError;
use aria_providers::parse::{parse_transcription, parse_turn_reply, parse_welcome};
use aria_providers::runtime::{ensure_success, execute};

/// Production implementation of the companion endpoints.
#[derive(Debug, Clone)]
pub struct HttpCompanionApi {
    base_url: String,
}

impl HttpCompanionApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl CompanionApi for HttpCompanionApi {
    async fn welcome(&self, user: &UserId) -> Result<Welcome, ApiError> {
        let req = build_welcome_request(&self.base_url, user);
        let resp = ensure_success(execute(&req).await?)?;
        let w = parse_welcome(&resp.body)?;
        Ok(Welcome {
            message: w.message,
            chat_id: ChatId::new(w.chat_id),
        })
    }

    async fn exchange(
        &self,
        user: &UserId,
        chat: &ChatId,
        prompt: &str,
        turn_id: u32,
    ) -> Result<String, ApiError> {
        let req = build_turn_request(&self.base_url, user, chat, prompt, turn_id);
        let resp = ensure_success(execute(&req).await?)?;
        parse_turn_reply(&resp.body)
    }

    async fn finalize(&self, user: &UserId, chat: &ChatId) -> Result<(), ApiError> {
        let req = build_finalize_request(&self.base_url, user, chat);
        ensure_success(execute(&req).await?)?;
        Ok(())
    }
}

/// Uploads finished artifacts to the voice-to-text endpoint.
#[derive(Debug, Clone)]
pub struct HttpTranscriber {
    base_url: String,
}

impl HttpTranscriber {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, audio: &AudioArtifact) -> Result<String, ApiError> {
        let upload = AudioUpload {
            filename: audio.filename.clone(),
            mime_type: audio.mime_type.clone(),
            bytes: audio.bytes.clone(),
        };

        let req = build_voice_to_text_request(&self.base_url, &upload);
        let resp = ensure_success(execute(&req).await?)?;
        parse_transcription(&resp.body)
    }
}
