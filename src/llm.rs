use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("completion envelope is not JSON: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error("completion response has no choices")]
    NoChoices,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct LlmClient {
    pub base: String,
    pub token: String,
    pub model: String,
}

impl LlmClient {
    #[must_use]
    pub const fn new(base: String, token: String, model: String) -> Self {
        Self { base, token, model }
    }

    /// Send `prompt` as a single user message and return the text of the
    /// first choice, untouched.
    ///
    /// # Errors
    ///
    /// Will return err if the request fails, the endpoint answers with a
    /// non-success status, or the envelope carries no choice content.
    pub async fn complete(
        &self,
        http: &reqwest::Client,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Body<'a> {
            model: &'a str,
            messages: [Msg<'a>; 1],
            temperature: f32,
            max_tokens: u32,
        }

        let url = format!("{}/chat/completions", self.base.trim_end_matches('/'));

        let body = Body {
            model: &self.model,
            messages: [Msg {
                role: "user",
                content: prompt,
            }],
            temperature,
            max_tokens,
        };

        let mut req = http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&body);

        if !self.token.trim().is_empty() {
            req = req.bearer_auth(&self.token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(LlmError::Status { status, body: text });
        }

        let envelope: JsonValue = serde_json::from_str(&text)?;
        let content = envelope
            .pointer("/choices/0/message/content")
            .and_then(JsonValue::as_str)
            .ok_or(LlmError::NoChoices)?;

        tracing::debug!(model = %self.model, chars = content.len(), "completion received");
        Ok(content.trim().to_string())
    }
}
