use reqwest::Client;
use serde::Deserialize;

use crate::error::{ChatError, Result};

/// Wire shape of `POST /message`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub response_type: String,
    pub response: String,
}

impl MessageResponse {
    /// Backend-reported failure, surfaced as a blocking dialog rather than a
    /// transcript entry.
    pub fn is_error(&self) -> bool {
        self.response_type == "error"
    }
}

/// Wire shape of `GET /system`.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemContent {
    pub content: String,
}

/// Wire shape of `POST /system`.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemSaved {
    pub message: String,
}

/// HTTP client for the chat backend.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Send one user turn. `action` is forwarded verbatim; its semantics
    /// belong to the backend.
    pub async fn send_message(&self, input: &str, action: &str) -> Result<MessageResponse> {
        let url = format!("{}/message", self.base_url);

        let response = self
            .client
            .post(&url)
            .form(&[("input", input), ("action", action)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ChatError::BackendStatus(response.status()));
        }

        Ok(response.json::<MessageResponse>().await?)
    }

    /// Fetch the current system prompt text.
    pub async fn get_system(&self) -> Result<SystemContent> {
        let url = format!("{}/system", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ChatError::BackendStatus(response.status()));
        }

        Ok(response.json::<SystemContent>().await?)
    }

    /// Replace the system prompt text. Returns the backend's status message.
    pub async fn set_system(&self, content: &str) -> Result<SystemSaved> {
        let url = format!("{}/system", self.base_url);

        let response = self
            .client
            .post(&url)
            .form(&[("content", content)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ChatError::BackendStatus(response.status()));
        }

        Ok(response.json::<SystemSaved>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_tag_is_exact() {
        let err = MessageResponse {
            response_type: "error".into(),
            response: "boom".into(),
        };
        assert!(err.is_error());

        // Anything else counts as success, matching the backend's contract.
        for tag in ["success", "ok", "ERROR", ""] {
            let resp = MessageResponse {
                response_type: tag.into(),
                response: "hi".into(),
            };
            assert!(!resp.is_error(), "tag {tag:?} should not be an error");
        }
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = BackendClient::new("http://localhost:5000/");
        assert_eq!(client.base_url, "http://localhost:5000");
    }
}
