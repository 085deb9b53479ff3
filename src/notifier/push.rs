use crate::error::{Result, TeamLedgerError};
use crate::notifier::traits::{PushMessage, PushSender};
use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Serialize)]
struct GatewayRequest<'a> {
    message: GatewayMessage<'a>,
}

#[derive(Serialize)]
struct GatewayMessage<'a> {
    token: &'a str,
    notification: GatewayNotification<'a>,
    data: &'a BTreeMap<String, String>,
}

#[derive(Serialize)]
struct GatewayNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct GatewayResponse {
    name: String,
}

/// 通过 HTTP 推送网关发送设备通知
#[derive(Clone)]
pub struct HttpPushSender {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpPushSender {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl PushSender for HttpPushSender {
    async fn send(&self, message: &PushMessage) -> Result<String> {
        let payload = GatewayRequest {
            message: GatewayMessage {
                token: &message.token,
                notification: GatewayNotification {
                    title: &message.title,
                    body: &message.body,
                },
                data: &message.data,
            },
        };

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TeamLedgerError::PushRejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: GatewayResponse = response.json().await?;
        debug!("Push gateway accepted message: {}", body.name);
        Ok(body.name)
    }
}

/// 未配置推送网关时使用，只记录日志
#[derive(Debug, Clone, Default)]
pub struct DryRunPushSender;

#[async_trait]
impl PushSender for DryRunPushSender {
    async fn send(&self, message: &PushMessage) -> Result<String> {
        let id = format!("dry-run-{}", uuid::Uuid::new_v4());
        info!(
            "📨 [dry-run] push to {}: {} | {}",
            message.token, message.title, message.body
        );
        Ok(id)
    }
}
