use log::{info, warn};
use market_data::config::WebhookFormat;
use reqwest::Client;
use serde::Serialize;

use crate::error::NotifyError;

/// Longest embed description we send.
pub const EMBED_DESCRIPTION_LIMIT: usize = 3900;
/// Chat providers reject plain content above this.
pub const CONTENT_LIMIT: usize = 2000;

#[derive(Serialize)]
#[serde(untagged)]
enum WebhookPayload<'a> {
    Content { content: &'a str },
    Embeds { embeds: [Embed<'a>; 1] },
}

#[derive(Serialize)]
struct Embed<'a> {
    title: &'a str,
    description: &'a str,
}

/// One-way delivery to a chat webhook. No retries, and the response body is
/// never consumed beyond logging.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    format: WebhookFormat,
}

impl WebhookNotifier {
    pub fn new(client: Client, url: String, format: WebhookFormat) -> Self {
        Self { client, url, format }
    }

    pub async fn send(&self, title: &str, text: &str) -> Result<(), NotifyError> {
        let payload = match self.format {
            WebhookFormat::Content => {
                let content = truncate_chars(text, CONTENT_LIMIT);
                if content.len() < text.len() {
                    warn!("Message truncated to {} characters", CONTENT_LIMIT);
                }
                WebhookPayload::Content { content }
            }
            WebhookFormat::Embed => WebhookPayload::Embeds {
                embeds: [Embed {
                    title,
                    description: truncate_chars(text, EMBED_DESCRIPTION_LIMIT),
                }],
            },
        };

        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        if status.is_success() {
            info!("Webhook accepted message ({})", status);
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!("Webhook responded with {}: {}", status, body);
        }
        Ok(())
    }
}

/// Prefix of `text` holding at most `limit` characters.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    #[test]
    fn truncation_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("━━━━", 2), "━━");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[tokio::test]
    async fn posts_plain_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(json!({ "content": "hello" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(
            Client::new(),
            format!("{}/hook", server.uri()),
            WebhookFormat::Content,
        );
        notifier.send("title", "hello").await.unwrap();
    }

    #[tokio::test]
    async fn embed_description_is_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(
            Client::new(),
            format!("{}/hook", server.uri()),
            WebhookFormat::Embed,
        );
        let long = "あ".repeat(5000);
        notifier.send("US Market Review", &long).await.unwrap();

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let description = body["embeds"][0]["description"].as_str().unwrap();
        assert_eq!(body["embeds"][0]["title"], "US Market Review");
        assert_eq!(description.chars().count(), EMBED_DESCRIPTION_LIMIT);
    }

    #[tokio::test]
    async fn long_content_is_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(
            Client::new(),
            format!("{}/hook", server.uri()),
            WebhookFormat::Content,
        );
        let long = "━".repeat(5000);
        notifier.send("title", &long).await.unwrap();

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let content = body["content"].as_str().unwrap();
        assert_eq!(content.chars().count(), CONTENT_LIMIT);
    }

    #[tokio::test]
    async fn rejected_delivery_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad payload"))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(Client::new(), server.uri(), WebhookFormat::Content);
        assert!(notifier.send("title", "hello").await.is_ok());
    }
}
