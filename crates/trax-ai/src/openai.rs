//! OpenAI chat-completions client for report analysis.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use trax_core::DocumentDate;

use crate::prompt::build_prompt;
use crate::{AnalysisError, ReportAnalyzer};

const INITIAL_BACKOFF_MS: u64 = 750;
const MAX_BACKOFF_MS: u64 = 5_000;

/// Settings for [`OpenAiAnalyzer`]. The API key is passed in by the caller.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    /// Like `https://api.openai.com/v1` (no trailing slash needed).
    pub base_url: String,
    pub max_retries: usize,
    pub max_prompt_chars: usize,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            max_retries: 3,
            max_prompt_chars: 15_000,
            temperature: 0.01,
            max_tokens: 6_000,
        }
    }
}

/// [`ReportAnalyzer`] backed by the OpenAI chat-completions endpoint.
pub struct OpenAiAnalyzer {
    client: reqwest::Client,
    config: OpenAiConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiAnalyzer {
    /// Create an analyzer. Fails if the API key is blank.
    pub fn new(mut config: OpenAiConfig) -> Result<Self, AnalysisError> {
        if config.api_key.trim().is_empty() {
            return Err(AnalysisError::MissingCredentials);
        }
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self {
            client: reqwest::Client::new(),
            config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Send one prompt, retrying rate limits, server errors, and transport
    /// failures with exponential backoff.
    async fn complete(&self, prompt: &str) -> Result<String, AnalysisError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        let url = self.endpoint();
        let attempts = self.config.max_retries.max(1);
        let mut delay_ms = INITIAL_BACKOFF_MS;

        for attempt in 1..=attempts {
            info!(url = %url, model = %self.config.model, attempt, "requesting analysis");
            let last = attempt == attempts;

            let resp = match self
                .client
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) if !last => {
                    warn!(error = %e, attempt, "analysis request failed, retrying");
                    backoff(&mut delay_ms).await;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = resp.status();
            if status.is_success() {
                let parsed: ChatResponse = serde_json::from_str(&resp.text().await?)?;
                let content = parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .filter(|content| !content.trim().is_empty())
                    .ok_or(AnalysisError::EmptyCompletion)?;
                info!(chars = content.len(), "analysis received");
                return Ok(content);
            }

            let body = resp.text().await.unwrap_or_default();
            let retryable = status.as_u16() == 429 || status.is_server_error();
            if retryable && !last {
                warn!(status = status.as_u16(), attempt, "analysis service busy, retrying");
                backoff(&mut delay_ms).await;
                continue;
            }
            return Err(AnalysisError::Server {
                status: status.as_u16(),
                body,
            });
        }

        // Unreachable: the final attempt always returns.
        Err(AnalysisError::EmptyCompletion)
    }
}

async fn backoff(delay_ms: &mut u64) {
    tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
    *delay_ms = ((*delay_ms as f64) * 1.75).min(MAX_BACKOFF_MS as f64) as u64;
}

#[async_trait]
impl ReportAnalyzer for OpenAiAnalyzer {
    async fn analyze(
        &self,
        text: &str,
        document_date: DocumentDate,
        filename: &str,
    ) -> Result<String, AnalysisError> {
        let prompt = build_prompt(text, document_date, filename, self.config.max_prompt_chars);
        self.complete(&prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve the canned `(status, body)` responses in order, one connection
    /// each, and count the requests received.
    async fn serve(responses: Vec<(u16, String)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                read_request(&mut socket).await;
                counter.fetch_add(1, Ordering::SeqCst);
                let reply = format!(
                    "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });

        (format!("http://{addr}/v1/"), hits)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    return;
                }
            }
        }
    }

    fn completion(content: &str) -> String {
        serde_json::json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
            .to_string()
    }

    fn analyzer(base_url: String, max_retries: usize) -> OpenAiAnalyzer {
        let mut config = OpenAiConfig::new("sk-test");
        config.base_url = base_url;
        config.max_retries = max_retries;
        OpenAiAnalyzer::new(config).unwrap()
    }

    fn date() -> DocumentDate {
        DocumentDate::from_ymd(2024, 1, 2).unwrap()
    }

    #[test]
    fn blank_key_rejected() {
        let result = OpenAiAnalyzer::new(OpenAiConfig::new("  "));
        assert!(matches!(result, Err(AnalysisError::MissingCredentials)));
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let analyzer = analyzer("http://localhost:8080/v1/".into(), 1);
        assert_eq!(analyzer.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn request_body_shape() {
        let body = ChatRequest {
            model: "gpt-4o",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            temperature: 0.5,
            max_tokens: 10,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "gpt-4o");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hello");
        assert_eq!(value["max_tokens"], 10);
    }

    #[tokio::test]
    async fn returns_completion_text() {
        let (url, hits) = serve(vec![(200, completion("{\"a\": 1} narrative"))]).await;
        let text = analyzer(url, 1)
            .analyze("report", date(), "r.pdf")
            .await
            .unwrap();
        assert_eq!(text, "{\"a\": 1} narrative");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_server_errors() {
        let (url, hits) = serve(vec![
            (500, "{}".to_string()),
            (200, completion("ok")),
        ])
        .await;
        let text = analyzer(url, 3)
            .analyze("report", date(), "r.pdf")
            .await
            .unwrap();
        assert_eq!(text, "ok");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn client_error_not_retried() {
        let (url, hits) = serve(vec![(401, "{\"error\":\"bad key\"}".to_string())]).await;
        let err = analyzer(url, 3)
            .analyze("report", date(), "r.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Server { status: 401, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_completion_is_error() {
        let body = serde_json::json!({"choices": [{"message": {"content": null}}]}).to_string();
        let (url, _) = serve(vec![(200, body)]).await;
        let err = analyzer(url, 1)
            .analyze("report", date(), "r.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyCompletion));
    }
}
