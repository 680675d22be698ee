//! Outbound transport boundary.
//!
//! The engine talks to the messaging network only through [`Gateway`], so
//! dispatch logic is testable without a live connection. The production
//! implementation is [`BridgeClient`], an HTTP client for the sidecar
//! WhatsApp bridge that owns the session and credentials.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Chat presence states the bot publishes while handling a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Composing,
    Paused,
    Available,
}

/// Send/read/presence operations on the messaging network.
///
/// Send operations return the transport message id of the sent message.
pub trait Gateway: Send + Sync {
    fn send_text(
        &self,
        chat_id: &str,
        text: &str,
    ) -> impl Future<Output = Result<String, String>> + Send;

    fn send_image(
        &self,
        chat_id: &str,
        image_url: &str,
        caption: &str,
    ) -> impl Future<Output = Result<String, String>> + Send;

    fn edit_text(
        &self,
        chat_id: &str,
        message_id: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), String>> + Send;

    fn send_contact(
        &self,
        chat_id: &str,
        display_name: &str,
        phone_number: &str,
    ) -> impl Future<Output = Result<String, String>> + Send;

    fn mark_read(
        &self,
        chat_id: &str,
        message_id: &str,
    ) -> impl Future<Output = Result<(), String>> + Send;

    fn set_presence(
        &self,
        chat_id: &str,
        presence: Presence,
    ) -> impl Future<Output = Result<(), String>> + Send;
}

#[derive(Serialize)]
struct TextRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    chat_id: &'a str,
    image_url: &'a str,
    caption: &'a str,
}

#[derive(Serialize)]
struct EditRequest<'a> {
    chat_id: &'a str,
    message_id: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct ContactRequest<'a> {
    chat_id: &'a str,
    display_name: &'a str,
    phone_number: &'a str,
}

#[derive(Serialize)]
struct ReadRequest<'a> {
    chat_id: &'a str,
    message_id: &'a str,
}

#[derive(Serialize)]
struct PresenceRequest<'a> {
    chat_id: &'a str,
    presence: Presence,
}

#[derive(Deserialize)]
struct SendResponse {
    message_id: String,
}

/// HTTP client for the WhatsApp bridge.
pub struct BridgeClient {
    base_url: String,
    client: reqwest::Client,
}

impl BridgeClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self { base_url, client }
    }

    async fn post_send<B: Serialize>(&self, path: &str, body: &B) -> Result<String, String> {
        let response: SendResponse = self.post(path, body).await?;
        Ok(response.message_id)
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, String> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("bridge request to {path} failed: {e}");
                warn!("{}", msg);
                msg
            })?;

        let status = response.status();
        if !status.is_success() {
            let msg = format!("bridge {path} returned {status}");
            warn!("{}", msg);
            return Err(msg);
        }

        response
            .json()
            .await
            .map_err(|e| format!("bad bridge response from {path}: {e}"))
    }

    async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<(), String> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("bridge request to {path} failed: {e}");
                warn!("{}", msg);
                msg
            })?;

        let status = response.status();
        if !status.is_success() {
            let msg = format!("bridge {path} returned {status}");
            warn!("{}", msg);
            return Err(msg);
        }

        Ok(())
    }
}

impl Gateway for BridgeClient {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<String, String> {
        self.post_send("/messages/text", &TextRequest { chat_id, text }).await
    }

    async fn send_image(
        &self,
        chat_id: &str,
        image_url: &str,
        caption: &str,
    ) -> Result<String, String> {
        self.post_send("/messages/image", &ImageRequest { chat_id, image_url, caption })
            .await
    }

    async fn edit_text(&self, chat_id: &str, message_id: &str, text: &str) -> Result<(), String> {
        self.post_unit("/messages/edit", &EditRequest { chat_id, message_id, text })
            .await
    }

    async fn send_contact(
        &self,
        chat_id: &str,
        display_name: &str,
        phone_number: &str,
    ) -> Result<String, String> {
        self.post_send(
            "/messages/contact",
            &ContactRequest { chat_id, display_name, phone_number },
        )
        .await
    }

    async fn mark_read(&self, chat_id: &str, message_id: &str) -> Result<(), String> {
        self.post_unit("/chats/read", &ReadRequest { chat_id, message_id }).await
    }

    async fn set_presence(&self, chat_id: &str, presence: Presence) -> Result<(), String> {
        self.post_unit("/chats/presence", &PresenceRequest { chat_id, presence })
            .await
    }
}
