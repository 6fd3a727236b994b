use crate::request::{Body, HttpRequest};
use aria_core::{ChatId, UserId};
use serde_json::json;

/// A finalized recording packaged for the voice-to-text endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioUpload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub fn build_welcome_request(base_url: &str, user: &UserId) -> HttpRequest {
    HttpRequest {
        method: "POST".into(),
        url: join_url(
            base_url,
            &format!("api/ai/mental_health/welcome/{}", user.as_str()),
        ),
        headers: vec![("Accept".into(), "application/json".into())],
        body: Body::Empty,
    }
}

pub fn build_turn_request(
    base_url: &str,
    user: &UserId,
    chat: &ChatId,
    prompt: &str,
    turn_id: u32,
) -> HttpRequest {
    let payload = json!({
        "prompt": prompt,
        "turn_id": turn_id,
    });

    HttpRequest {
        method: "POST".into(),
        url: join_url(
            base_url,
            &format!("api/ai/mental_health/{}/{}", user.as_str(), chat.as_str()),
        ),
        headers: vec![("Content-Type".into(), "application/json".into())],
        body: Body::Json(payload.to_string()),
    }
}

pub fn build_finalize_request(base_url: &str, user: &UserId, chat: &ChatId) -> HttpRequest {
    HttpRequest {
        method: "PATCH".into(),
        url: join_url(
            base_url,
            &format!(
                "api/ai/mental_health/finalize/{}/{}",
                user.as_str(),
                chat.as_str()
            ),
        ),
        headers: vec![("Content-Type".into(), "application/json".into())],
        body: Body::Empty,
    }
}

pub fn build_voice_to_text_request(base_url: &str, audio: &AudioUpload) -> HttpRequest {
    let boundary = format!("Boundary-{}", uuid::Uuid::new_v4());

    let mut body: Vec<u8> = Vec::new();
    append_file(
        &mut body,
        &boundary,
        "audio",
        &audio.filename,
        &audio.mime_type,
        &audio.bytes,
    );
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    HttpRequest {
        method: "POST".into(),
        url: join_url(base_url, "api/ai/mental_health/voice-to-text"),
        headers: vec![
            (
                "Content-Type".into(),
                format!("multipart/form-data; boundary={}", boundary),
            ),
            ("Accept".into(), "application/json".into()),
        ],
        body: Body::MultipartFormData {
            boundary,
            bytes: body,
        },
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

fn append_file(
    body: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    filename: &str,
    mime_type: &str,
    bytes: &[u8],
) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            name, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
}
