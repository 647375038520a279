use std::time::Duration;

use common::config::{key_is_configured, LlmConfig};
use reqwest::Client;
use tokio::time::sleep;
use tracing::{debug, instrument};

use crate::rate_limit::RequestLimiter;
use crate::types::{decode_completion, ChatError, ChatMessage, ChatRequest};

const DEFAULT_MAX_RETRIES: u32 = 2;

/// OpenRouter chat-completions client.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: Client,
    base_url: String,
    api_key: String,
    referer: String,
    max_retries: u32,
    limiter: RequestLimiter,
}

impl OpenRouterClient {
    pub fn new(cfg: &LlmConfig, api_key: &str) -> Result<Self, ChatError> {
        let client = Client::builder()
            .user_agent("prop-gem/0.1")
            .build()
            .map_err(|e| ChatError::ApiError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: cfg.base_url.clone(),
            api_key: api_key.trim().to_string(),
            referer: cfg.referer.clone(),
            max_retries: DEFAULT_MAX_RETRIES,
            limiter: RequestLimiter::per_minute(cfg.requests_per_minute),
        })
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn is_configured(&self) -> bool {
        key_is_configured(&self.api_key)
    }

    /// Send one chat completion and return the first choice's text.
    ///
    /// 429s, timeouts and transport errors are retried with linear backoff.
    #[instrument(skip(self, messages), fields(model = %model))]
    pub async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        temperature: Option<f64>,
        timeout: Duration,
    ) -> Result<String, ChatError> {
        if !self.is_configured() {
            return Err(ChatError::NotConfigured);
        }

        let payload = ChatRequest {
            model: model.to_string(),
            messages,
            temperature,
        };

        let mut attempt = 0u32;
        loop {
            self.limiter.wait().await;

            let send_result = self
                .client
                .post(&self.base_url)
                .bearer_auth(&self.api_key)
                .header("HTTP-Referer", &self.referer)
                .header("content-type", "application/json")
                .timeout(timeout)
                .json(&payload)
                .send()
                .await;

            match send_result {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        if status.as_u16() == 429 && attempt < self.max_retries {
                            attempt += 1;
                            debug!("rate limited, retry {} of {}", attempt, self.max_retries);
                            sleep(Duration::from_millis(150 * u64::from(attempt))).await;
                            continue;
                        }
                        return Err(ChatError::HttpStatus {
                            status: status.as_u16(),
                            body: body.chars().take(500).collect(),
                        });
                    }

                    let text = response
                        .text()
                        .await
                        .map_err(|e| ChatError::ApiError(e.to_string()))?;
                    return decode_completion(&text);
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        attempt += 1;
                        debug!("request failed ({}), retry {} of {}", e, attempt, self.max_retries);
                        sleep(Duration::from_millis(150 * u64::from(attempt))).await;
                        continue;
                    }
                    if e.is_timeout() {
                        return Err(ChatError::Timeout);
                    }
                    return Err(ChatError::ApiError(e.to_string()));
                }
            }
        }
    }
}
