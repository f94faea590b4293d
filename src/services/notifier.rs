// src/services/notifier.rs

//! Outbound alert delivery.

use async_trait::async_trait;

use crate::error::{AppError, Result};

/// Delivers one composed alert message to an external channel.
///
/// Fire-and-forget from the engine's point of view: errors are surfaced so
/// the caller can log them, but they never roll back store mutations.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, content: &str) -> Result<()>;
}

/// Webhook-backed notifier; POSTs the message as a JSON `content` body.
pub struct WebhookNotifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, webhook_url: Option<String>) -> Self {
        Self {
            client,
            webhook_url,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, content: &str) -> Result<()> {
        let Some(url) = &self.webhook_url else {
            return Err(AppError::delivery("no webhook URL configured"));
        };

        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await
            .map_err(AppError::delivery)?;

        if !response.status().is_success() {
            return Err(AppError::delivery(format!(
                "webhook returned {}",
                response.status()
            )));
        }

        log::info!("notification sent!");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_posts_content_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(
                serde_json::json!({ "content": "available now alert!!!\nThe Road" }),
            ))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(
            reqwest::Client::new(),
            Some(format!("{}/hook", server.uri())),
        );
        notifier
            .send("available now alert!!!\nThe Road")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_failure_is_delivery_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(
            reqwest::Client::new(),
            Some(format!("{}/hook", server.uri())),
        );
        let result = notifier.send("boom").await;
        assert!(matches!(result.unwrap_err(), AppError::DeliveryFailed(_)));
    }

    #[tokio::test]
    async fn test_send_without_url_is_delivery_error() {
        let notifier = WebhookNotifier::new(reqwest::Client::new(), None);
        assert!(matches!(
            notifier.send("x").await.unwrap_err(),
            AppError::DeliveryFailed(_)
        ));
    }
}
