use crate::error::ApiError;
use crate::request::{Body, HttpRequest};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Execute a request as-is. Transport failures (unreachable endpoint, broken
/// connection) surface as `ApiError::Transport`; status handling is left to
/// `ensure_success` so callers can keep the error body.
pub async fn execute(req: &HttpRequest) -> Result<HttpResponse, ApiError> {
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    for (k, v) in &req.headers {
        let name = HeaderName::from_bytes(k.as_bytes())
            .map_err(|_| ApiError::Request(format!("invalid header name: {k}")))?;
        let value = HeaderValue::from_str(v)
            .map_err(|_| ApiError::Request(format!("invalid header value for {k}")))?;
        headers.insert(name, value);
    }

    let builder = match req.method.as_str() {
        "GET" => client.get(&req.url),
        "POST" => client.post(&req.url),
        "PUT" => client.put(&req.url),
        "PATCH" => client.patch(&req.url),
        "DELETE" => client.delete(&req.url),
        other => return Err(ApiError::Request(format!("unsupported method: {other}"))),
    }
    .headers(headers);

    let builder = match &req.body {
        Body::Empty => builder,
        Body::Json(s) => builder.body(s.clone()),
        Body::MultipartFormData { bytes, .. } => builder.body(bytes.clone()),
    };

    let resp = builder.send().await?;
    let status = resp.status().as_u16();
    let body = resp.bytes().await?.to_vec();

    Ok(HttpResponse { status, body })
}

pub fn ensure_success(resp: HttpResponse) -> Result<HttpResponse, ApiError> {
    if (200..=299).contains(&resp.status) {
        Ok(resp)
    } else {
        Err(ApiError::Status {
            status: resp.status,
            body: String::from_utf8_lossy(&resp.body).into_owned(),
        })
    }
}
