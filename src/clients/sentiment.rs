use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::SentimentConfig;
use crate::constants::sentiment::{NEGATIVE_TAG, POSITIVE_TAG};
use crate::services::sentiment::{Annotation, SentimentAnnotator};

const SYSTEM_PROMPT: &str = "You are a sentiment analysis assistant. You identify positive and negative sentiment in text and mark them with HTML span tags.";

const ANALYSIS_PROMPT: &str = r#"Analyze the following text for sentiment and identify words or phrases that convey positive or negative emotions.

Return the text with HTML span tags around sentiment words:
- Use <span class="positive">word</span> for positive sentiment words
- Use <span class="negative">word</span> for negative sentiment words
- Leave neutral words unmarked

Only return the marked-up HTML text, nothing else. Do not add any explanation or additional text.

Text to analyze:
"#;

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Chat-completions client that asks a language model to wrap sentiment
/// words in span tags. Annotation is strictly best-effort: any failure on
/// this path degrades to the unannotated content.
pub struct GithubModelsClient {
    client: Client,
    api_url: String,
    model: String,
    token: Option<String>,
    timeout: Duration,
}

impl GithubModelsClient {
    #[must_use]
    pub fn new(config: &SentimentConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent("Kokoro/1.0")
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            token: config.api_token.clone(),
            timeout: Duration::from_secs(config.request_timeout_seconds),
        }
    }

    async fn request_markup(&self, token: &str, content: &str) -> anyhow::Result<String> {
        let user_content = format!("{ANALYSIS_PROMPT}{content}");

        let payload = ChatRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_content,
                },
            ],
            model: &self.model,
            temperature: 0.3,
            max_tokens: 2000,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(token)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Sentiment API error: {} - {}", status, body));
        }

        let response: ChatResponse = response.json().await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("Sentiment API response had no message content"))
    }
}

#[async_trait]
impl SentimentAnnotator for GithubModelsClient {
    async fn annotate(&self, content: &str) -> Annotation {
        let Some(token) = self.token.clone() else {
            error!("Sentiment API token not configured; storing entry without annotation");
            return Annotation::neutral(content);
        };

        match self.request_markup(&token, content).await {
            Ok(markup) => {
                let analyzed_content = strip_code_fences(&markup).to_string();
                let positive_count = count_markers(&analyzed_content, POSITIVE_TAG);
                let negative_count = count_markers(&analyzed_content, NEGATIVE_TAG);

                info!(
                    "Sentiment analysis completed: {positive_count} positive, {negative_count} negative markers"
                );

                Annotation {
                    analyzed_content,
                    positive_count,
                    negative_count,
                }
            }
            Err(e) => {
                error!("Sentiment analysis failed, storing entry without annotation: {e:#}");
                Annotation::neutral(content)
            }
        }
    }
}

/// Models often wrap their answer in a markdown code fence despite being
/// told not to. Peel one layer of fencing off either end.
fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```html") {
        text = rest;
    }
    if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Count non-overlapping occurrences of the literal opening tag. Only the
/// exact tag form counts; anything else the model invents is ignored.
fn count_markers(text: &str, tag: &str) -> i32 {
    i32::try_from(text.matches(tag).count()).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_code_fence() {
        let fenced = "```html\n<span class=\"positive\">good</span>\n```";

        assert_eq!(
            strip_code_fences(fenced),
            "<span class=\"positive\">good</span>"
        );
    }

    #[test]
    fn test_strip_plain_code_fence() {
        let fenced = "```\nplain text\n```";

        assert_eq!(strip_code_fences(fenced), "plain text");
    }

    #[test]
    fn test_unfenced_text_is_untouched() {
        assert_eq!(strip_code_fences("  already clean  "), "already clean");
    }

    #[test]
    fn test_count_markers_counts_exact_tags_only() {
        let markup = r#"I felt <span class="positive">happy</span> but also <span class="negative">tired</span> and <span class="negative">anxious</span>. A <span class="unknown">mystery</span> tag does not count."#;

        assert_eq!(count_markers(markup, POSITIVE_TAG), 1);
        assert_eq!(count_markers(markup, NEGATIVE_TAG), 2);
    }

    #[test]
    fn test_count_markers_on_plain_text_is_zero() {
        assert_eq!(count_markers("nothing marked here", POSITIVE_TAG), 0);
    }

    #[tokio::test]
    async fn test_missing_token_degrades_to_neutral() {
        let client = GithubModelsClient::new(&SentimentConfig {
            api_token: None,
            ..SentimentConfig::default()
        });

        let annotation = client.annotate("Quiet day at the office.").await;

        assert_eq!(annotation, Annotation::neutral("Quiet day at the office."));
    }

    #[tokio::test]
    async fn test_unreachable_api_degrades_to_neutral() {
        // Port 1 refuses connections, so the request fails fast.
        let client = GithubModelsClient::new(&SentimentConfig {
            api_url: "http://127.0.0.1:1/chat/completions".to_string(),
            api_token: Some("test-token".to_string()),
            request_timeout_seconds: 2,
            ..SentimentConfig::default()
        });

        let annotation = client.annotate("Quiet day at the office.").await;

        assert_eq!(annotation, Annotation::neutral("Quiet day at the office."));
    }
}
