use serde::Serialize;
use serde_json::Value;
use std::{error::Error as StdError, fmt};

const BODY_PREVIEW_LIMIT: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiHttpErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Decode,
    Status,
    Unknown,
}

impl AiHttpErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Decode => "decode",
            Self::Status => "status",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AiHttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct AiHttpError {
    kind: AiHttpErrorKind,
    status: Option<u16>,
    url: Option<String>,
    message: String,
    source: Option<anyhow::Error>,
}

impl AiHttpError {
    pub fn kind(&self) -> AiHttpErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn from_reqwest(err: reqwest::Error, url: String) -> Self {
        let kind = if err.is_timeout() {
            AiHttpErrorKind::Timeout
        } else if err.is_connect() {
            AiHttpErrorKind::Connect
        } else if err.is_request() {
            AiHttpErrorKind::Request
        } else if err.is_body() {
            AiHttpErrorKind::Body
        } else if err.is_decode() {
            AiHttpErrorKind::Decode
        } else {
            AiHttpErrorKind::Unknown
        };
        let status = err.status().map(|s| s.as_u16());
        let message = err.to_string();
        AiHttpError {
            kind,
            status,
            url: Some(url),
            message,
            source: Some(anyhow::Error::new(err)),
        }
    }

    fn status_error(status: u16, url: String, preview: String) -> Self {
        AiHttpError {
            kind: AiHttpErrorKind::Status,
            status: Some(status),
            url: Some(url),
            message: preview,
            source: None,
        }
    }

    fn decode_error(status: u16, url: String, err: serde_json::Error, preview: String) -> Self {
        let message = format!("failed to decode response body: {} | body={}", err, preview);
        AiHttpError {
            kind: AiHttpErrorKind::Decode,
            status: Some(status),
            url: Some(url),
            message,
            source: Some(anyhow::Error::new(err)),
        }
    }
}

impl fmt::Display for AiHttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "aiservice http error kind={}", self.kind)?;
        if let Some(status) = self.status {
            write!(f, " status={}", status)?;
        }
        if let Some(url) = &self.url {
            write!(f, " url={}", url)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl StdError for AiHttpError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}

pub(crate) fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out = String::new();
    let mut truncated = false;
    for (idx, ch) in trimmed.chars().enumerate() {
        if idx >= BODY_PREVIEW_LIMIT {
            truncated = true;
            break;
        }
        out.push(ch);
    }

    if truncated {
        out.push_str("...");
    }

    out
}

async fn parse_json_response(resp: reqwest::Response) -> anyhow::Result<Value> {
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp
        .text()
        .await
        .map_err(|err| AiHttpError::from_reqwest(err, url.clone()))?;

    if !status.is_success() {
        let preview = preview_body(&body);
        return Err(AiHttpError::status_error(status.as_u16(), url, preview).into());
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str::<Value>(&body).map_err(|err| {
        let preview = preview_body(&body);
        AiHttpError::decode_error(status.as_u16(), url, err, preview).into()
    })
}

/// Pulls the completion text out of the response shapes we accept:
/// `{stdout}`, `{text}`, or OpenAI-style `{choices[0].message.content}`.
pub(crate) fn extract_textish(v: &Value) -> Option<String> {
    if let Some(s) = v.get("stdout").and_then(|x| x.as_str()) {
        return Some(s.to_string());
    }
    if let Some(s) = v.get("text").and_then(|x| x.as_str()) {
        return Some(s.to_string());
    }
    // OpenAI-ish: { choices: [ { message: { content: "..." } } ] }
    if let Some(s) = v
        .get("choices")
        .and_then(|x| x.get(0))
        .and_then(|x| x.get("message"))
        .and_then(|x| x.get("content"))
        .and_then(|x| x.as_str())
    {
        return Some(s.to_string());
    }
    None
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
    response_format: Value,
}

/// Minimal chat-completions client for the AI service.
#[derive(Clone)]
pub struct HttpClient {
    api_key: String,
    model: String,
    http: reqwest::Client,
    // Pre-built URL endpoint
    url_chat: String,
}

impl HttpClient {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        timeout_ms: u64,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()?;
        let normalized = base_url.trim_end_matches('/');
        Ok(Self {
            api_key,
            model,
            http,
            url_chat: format!("{}/v1/chat/completions", normalized),
        })
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.trim().is_empty() {
            req
        } else {
            req.bearer_auth(&self.api_key)
        }
    }

    /// Sends one system + user exchange asking for a JSON object and returns
    /// the completion text.
    pub async fn complete_json(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> anyhow::Result<String> {
        let url = &self.url_chat;
        tracing::debug!(
            target: "taskforge.aiservice",
            stage = "aiservice.http.chat.in",
            url = %url,
            model = %self.model,
            prompt_len = user.len()
        );
        let mut messages = Vec::with_capacity(2);
        if !system.trim().is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: user,
        });
        let body = ChatRequest {
            model: &self.model,
            temperature,
            messages,
            response_format: serde_json::json!({ "type": "json_object" }),
        };

        let req = self.http.post(url).json(&body);
        let resp = self
            .auth(req)
            .send()
            .await
            .map_err(|err| AiHttpError::from_reqwest(err, url.clone()))?;
        let status = resp.status();
        let v = parse_json_response(resp).await?;
        tracing::debug!(
            target: "taskforge.aiservice",
            stage = "aiservice.http.chat.out",
            status = %status
        );

        extract_textish(&v).ok_or_else(|| {
            anyhow::anyhow!(
                "response has no completion text: {}",
                preview_body(&v.to_string())
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use mockito::Server;

    fn client(url: String, key: &str) -> HttpClient {
        HttpClient::new(url, key.to_string(), "test-model".to_string(), 1_000).unwrap()
    }

    #[test]
    fn test_preview_body_empty() {
        assert_eq!(preview_body("   "), "<empty body>");
    }

    #[test]
    fn test_preview_body_truncates() {
        let body = "a".repeat(BODY_PREVIEW_LIMIT + 10);
        let preview = preview_body(&body);
        assert!(preview.ends_with("..."));
        assert!(preview.len() <= BODY_PREVIEW_LIMIT + 3);
    }

    #[test]
    fn test_extract_textish_shapes() {
        let openai = serde_json::json!({"choices": [{"message": {"content": "hi"}}]});
        assert_eq!(extract_textish(&openai).as_deref(), Some("hi"));
        let text = serde_json::json!({"text": "plain"});
        assert_eq!(extract_textish(&text).as_deref(), Some("plain"));
        assert_eq!(extract_textish(&serde_json::json!({"other": 1})), None);
    }

    #[test]
    fn test_http_error_display_status() {
        let err = AiHttpError::status_error(
            502,
            "https://example.com/v1/chat/completions".to_string(),
            "bad gateway".to_string(),
        );
        let msg = err.to_string();
        assert!(msg.contains("kind=status"));
        assert!(msg.contains("status=502"));
        assert!(msg.contains("bad gateway"));
    }

    #[tokio::test]
    async fn test_complete_json_returns_content() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "test-model",
                "response_format": {"type": "json_object"}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"{\"output\":\"ok\"}"}}]}"#)
            .create_async()
            .await;

        let text = client(server.url(), "")
            .complete_json("sys", "user", 0.2)
            .await
            .unwrap();
        assert_eq!(text, r#"{"output":"ok"}"#);
    }

    #[tokio::test]
    async fn test_status_error_is_typed() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let err = client(server.url(), "")
            .complete_json("", "user", 0.2)
            .await
            .unwrap_err();
        let http_err = err
            .downcast_ref::<AiHttpError>()
            .expect("expected AiHttpError");
        assert_eq!(http_err.kind(), AiHttpErrorKind::Status);
        assert_eq!(http_err.status(), Some(503));
        assert!(http_err
            .url()
            .unwrap_or_default()
            .contains("/v1/chat/completions"));
    }

    #[tokio::test]
    async fn test_auth_header_included_when_api_key_set() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer secret-token")
            .with_status(200)
            .with_body(r#"{"text":"{}"}"#)
            .create_async()
            .await;

        client(server.url(), "secret-token")
            .complete_json("", "user", 0.2)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_auth_header_absent_when_api_key_empty() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"text":"{}"}"#)
            .create_async()
            .await;

        client(server.url(), "")
            .complete_json("", "user", 0.2)
            .await
            .unwrap();
    }
}
