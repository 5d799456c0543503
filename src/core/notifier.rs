//! Owns the dashboard message and the transient broadcast alerts.
//!
//! The chat platform sits behind the `ChatClient` trait so the policy can
//! be exercised against a recording fake. `DiscordClient` is the real
//! implementation over the Discord REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tokio::time;

use crate::core::ent::{AlertPolicy, DisplayPayload, StatusLevel};

const DISCORD_API: &str = "https://discord.com/api/v10";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("chat api returned {status}: {body}")]
    Api { status: u16, body: String },
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Confirms the configured channel exists and is visible to the bot.
    async fn resolve_channel(&self) -> Result<(), NotifyError>;
    /// Sends a dashboard message, returning the new message id.
    async fn send_message(&self, payload: &DisplayPayload) -> Result<String, NotifyError>;
    /// Edits an existing dashboard message in place.
    async fn edit_message(
        &self,
        message_id: &str,
        payload: &DisplayPayload,
    ) -> Result<(), NotifyError>;
    async fn delete_message(&self, message_id: &str) -> Result<(), NotifyError>;
    /// Sends an @everyone broadcast, returning its message id.
    async fn send_broadcast(&self, content: &str) -> Result<String, NotifyError>;
}

pub struct DiscordClient {
    http: reqwest::Client,
    token: String,
    channel_id: String,
    base_url: String,
}

impl DiscordClient {
    pub fn new(token: String, channel_id: String) -> DiscordClient {
        DiscordClient {
            http: reqwest::Client::new(),
            token,
            channel_id,
            base_url: DISCORD_API.to_string(),
        }
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.token)
    }

    fn dashboard_body(payload: &DisplayPayload) -> serde_json::Value {
        json!({
            "embeds": [{
                "description": payload.content,
                "color": payload.color,
            }]
        })
    }

    async fn ok_or_api_error(resp: reqwest::Response) -> Result<reqwest::Response, NotifyError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(NotifyError::Api {
            status: status.as_u16(),
            body,
        })
    }

    async fn message_id(resp: reqwest::Response) -> Result<String, NotifyError> {
        let body: serde_json::Value = resp.json().await?;
        Ok(body["id"].as_str().unwrap_or_default().to_string())
    }
}

#[async_trait]
impl ChatClient for DiscordClient {
    async fn resolve_channel(&self) -> Result<(), NotifyError> {
        let resp = self
            .http
            .get(format!("{}/channels/{}", self.base_url, self.channel_id))
            .header("Authorization", self.auth())
            .send()
            .await?;
        Self::ok_or_api_error(resp).await?;
        Ok(())
    }

    async fn send_message(&self, payload: &DisplayPayload) -> Result<String, NotifyError> {
        let resp = self
            .http
            .post(format!(
                "{}/channels/{}/messages",
                self.base_url, self.channel_id
            ))
            .header("Authorization", self.auth())
            .json(&Self::dashboard_body(payload))
            .send()
            .await?;
        Self::message_id(Self::ok_or_api_error(resp).await?).await
    }

    async fn edit_message(
        &self,
        message_id: &str,
        payload: &DisplayPayload,
    ) -> Result<(), NotifyError> {
        let resp = self
            .http
            .patch(format!(
                "{}/channels/{}/messages/{}",
                self.base_url, self.channel_id, message_id
            ))
            .header("Authorization", self.auth())
            .json(&Self::dashboard_body(payload))
            .send()
            .await?;
        Self::ok_or_api_error(resp).await?;
        Ok(())
    }

    async fn delete_message(&self, message_id: &str) -> Result<(), NotifyError> {
        let resp = self
            .http
            .delete(format!(
                "{}/channels/{}/messages/{}",
                self.base_url, self.channel_id, message_id
            ))
            .header("Authorization", self.auth())
            .send()
            .await?;
        Self::ok_or_api_error(resp).await?;
        Ok(())
    }

    async fn send_broadcast(&self, content: &str) -> Result<String, NotifyError> {
        let resp = self
            .http
            .post(format!(
                "{}/channels/{}/messages",
                self.base_url, self.channel_id
            ))
            .header("Authorization", self.auth())
            .json(&json!({
                "content": format!("@everyone {content}"),
                "allowed_mentions": { "parse": ["everyone"] },
            }))
            .send()
            .await?;
        Self::message_id(Self::ok_or_api_error(resp).await?).await
    }
}

pub struct Notifier {
    client: Arc<dyn ChatClient>,
    policy: AlertPolicy,
    alert_delete_after: Duration,
}

impl Notifier {
    pub fn new(
        client: Arc<dyn ChatClient>,
        policy: AlertPolicy,
        alert_delete_after: Duration,
    ) -> Notifier {
        Notifier {
            client,
            policy,
            alert_delete_after,
        }
    }

    /// Edit-or-create upsert of the dashboard message. A stored id that can
    /// no longer be edited (deleted message, lost permission, network error)
    /// is replaced by a freshly created message, never kept dangling.
    pub async fn publish(
        &self,
        payload: &DisplayPayload,
        message_id: Option<&str>,
    ) -> Result<String, NotifyError> {
        if let Some(id) = message_id {
            match self.client.edit_message(id, payload).await {
                Ok(()) => return Ok(id.to_string()),
                Err(err) => {
                    tracing::warn!("dashboard message {id} not editable, recreating: {err}");
                }
            }
        }
        self.client.send_message(payload).await
    }

    /// Sends a broadcast alert when the transition qualifies under the
    /// policy. The alert is best effort: send failures are logged, and the
    /// delayed cleanup runs detached so its outcome never reaches a cycle.
    pub async fn maybe_alert(
        &self,
        new: StatusLevel,
        previous: Option<StatusLevel>,
        payload: &DisplayPayload,
    ) {
        if !self.policy.should_alert(new, previous) {
            return;
        }
        match self.client.send_broadcast(&payload.content).await {
            Ok(id) => {
                tracing::info!("alert sent for {previous:?} -> {new:?}");
                let client = Arc::clone(&self.client);
                let delay = self.alert_delete_after;
                tokio::spawn(async move {
                    time::sleep(delay).await;
                    if let Err(err) = client.delete_message(&id).await {
                        tracing::debug!("alert message {id} cleanup failed: {err}");
                    }
                });
            }
            Err(err) => tracing::warn!("alert send failed: {err}"),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Send(String),
        Edit(String),
        Delete(String),
        Broadcast(String),
    }

    /// Recording fake; `fail_edit` simulates a deleted dashboard message.
    #[derive(Default)]
    pub struct FakeClient {
        pub fail_edit: bool,
        pub calls: Mutex<Vec<Call>>,
        pub next_id: AtomicU64,
    }

    impl FakeClient {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatClient for FakeClient {
        async fn resolve_channel(&self) -> Result<(), NotifyError> {
            Ok(())
        }

        async fn send_message(&self, payload: &DisplayPayload) -> Result<String, NotifyError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Send(payload.content.clone()));
            Ok(format!("msg-{}", self.next_id.fetch_add(1, Ordering::SeqCst)))
        }

        async fn edit_message(
            &self,
            message_id: &str,
            _payload: &DisplayPayload,
        ) -> Result<(), NotifyError> {
            if self.fail_edit {
                return Err(NotifyError::Api {
                    status: 404,
                    body: "Unknown Message".to_string(),
                });
            }
            self.calls
                .lock()
                .unwrap()
                .push(Call::Edit(message_id.to_string()));
            Ok(())
        }

        async fn delete_message(&self, message_id: &str) -> Result<(), NotifyError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Delete(message_id.to_string()));
            Ok(())
        }

        async fn send_broadcast(&self, content: &str) -> Result<String, NotifyError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Broadcast(content.to_string()));
            Ok(format!("alert-{}", self.next_id.fetch_add(1, Ordering::SeqCst)))
        }
    }

    fn payload() -> DisplayPayload {
        DisplayPayload {
            content: "status".to_string(),
            color: 0,
        }
    }

    fn notifier(client: Arc<FakeClient>) -> Notifier {
        Notifier::new(client, AlertPolicy::default(), Duration::from_millis(10))
    }

    #[tokio::test]
    async fn publish_without_id_sends_new_message() {
        let client = Arc::new(FakeClient::default());
        let id = notifier(client.clone())
            .publish(&payload(), None)
            .await
            .unwrap();
        assert_eq!(id, "msg-0");
        assert_eq!(client.calls(), vec![Call::Send("status".to_string())]);
    }

    #[tokio::test]
    async fn publish_with_id_edits_in_place() {
        let client = Arc::new(FakeClient::default());
        let id = notifier(client.clone())
            .publish(&payload(), Some("123"))
            .await
            .unwrap();
        assert_eq!(id, "123");
        assert_eq!(client.calls(), vec![Call::Edit("123".to_string())]);
    }

    #[tokio::test]
    async fn publish_falls_back_to_create_when_edit_fails() {
        let client = Arc::new(FakeClient {
            fail_edit: true,
            ..FakeClient::default()
        });
        let id = notifier(client.clone())
            .publish(&payload(), Some("stale"))
            .await
            .unwrap();
        assert_eq!(id, "msg-0");
        assert_eq!(client.calls(), vec![Call::Send("status".to_string())]);
    }

    #[tokio::test]
    async fn alert_fires_once_on_degrade_and_cleans_up() {
        let client = Arc::new(FakeClient::default());
        notifier(client.clone())
            .maybe_alert(StatusLevel::Down, Some(StatusLevel::Ok), &payload())
            .await;
        assert_eq!(client.calls(), vec![Call::Broadcast("status".to_string())]);

        // Delayed delete runs detached from the caller.
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            client.calls(),
            vec![
                Call::Broadcast("status".to_string()),
                Call::Delete("alert-0".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn no_alert_without_previous_status() {
        let client = Arc::new(FakeClient::default());
        notifier(client.clone())
            .maybe_alert(StatusLevel::Down, None, &payload())
            .await;
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn no_alert_when_status_repeats() {
        let client = Arc::new(FakeClient::default());
        notifier(client.clone())
            .maybe_alert(StatusLevel::Warn, Some(StatusLevel::Warn), &payload())
            .await;
        assert!(client.calls().is_empty());
    }
}
