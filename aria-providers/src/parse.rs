use crate::error::ApiError;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
    pub chat_id: String,
}

pub fn parse_welcome(body: &[u8]) -> Result<WelcomeResponse, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::Payload(format!("decode welcome JSON: {e}")))
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    message: String,
}

pub fn parse_transcription(body: &[u8]) -> Result<String, ApiError> {
    let resp: TranscriptionResponse = serde_json::from_slice(body)
        .map_err(|e| ApiError::Payload(format!("decode transcription JSON: {e}")))?;
    Ok(resp.message)
}

/// The turn endpoint replies with the agent's text either as a JSON string
/// or as a plain UTF-8 body.
pub fn parse_turn_reply(body: &[u8]) -> Result<String, ApiError> {
    if let Ok(s) = serde_json::from_slice::<String>(body) {
        if s.trim().is_empty() {
            return Err(ApiError::Payload("empty turn reply".into()));
        }
        return Ok(s);
    }

    let text = std::str::from_utf8(body)
        .map_err(|_| ApiError::Payload("turn reply is not UTF-8".into()))?;
    let text = text.trim();
    if text.is_empty() {
        return Err(ApiError::Payload("empty turn reply".into()));
    }
    Ok(text.to_string())
}
