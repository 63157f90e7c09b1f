use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{Classifier, InsightUnavailable};

/// Longest upstream error body kept in [`InsightUnavailable::Status`].
const MAX_ERROR_BODY: usize = 2048;

/// OpenAI-compatible `POST {endpoint}/chat/completions` client.
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl HttpClassifier {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Result<Self, InsightUnavailable> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(InsightUnavailable::NotConfigured("endpoint is empty".into()));
        }
        if api_key.trim().is_empty() {
            return Err(InsightUnavailable::NotConfigured("API key is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(InsightUnavailable::Transport)?;
        Ok(Self::with_client(client, endpoint, api_key, timeout))
    }

    fn with_client(client: reqwest::Client, endpoint: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            timeout,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }

    fn transport_error(&self, e: reqwest::Error) -> InsightUnavailable {
        if e.is_timeout() {
            InsightUnavailable::Timeout {
                after: self.timeout,
            }
        } else {
            InsightUnavailable::Transport(e)
        }
    }
}

impl Classifier for HttpClassifier {
    async fn complete(&self, body: &Value) -> Result<String, InsightUnavailable> {
        let url = self.completions_url();
        debug!(url = %url, "POST chat completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate(&mut body, MAX_ERROR_BODY);
            return Err(InsightUnavailable::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        message_content(&text)
    }
}

#[derive(Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// Pull the first choice's message content out of a completion envelope.
fn message_content(envelope: &str) -> Result<String, InsightUnavailable> {
    let completion: Completion = serde_json::from_str(envelope)
        .map_err(|e| InsightUnavailable::Schema(format!("malformed completion envelope: {e}")))?;
    let message = completion
        .choices
        .into_iter()
        .next()
        .ok_or(InsightUnavailable::EmptyResponse)?
        .message;

    if let Some(refusal) = message.refusal.filter(|r| !r.trim().is_empty()) {
        return Err(InsightUnavailable::Schema(format!("classifier refused: {refusal}")));
    }
    match message.content {
        Some(c) if !c.trim().is_empty() => Ok(c),
        _ => Err(InsightUnavailable::EmptyResponse),
    }
}

fn truncate(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}
