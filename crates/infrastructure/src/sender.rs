//! 出站消息通道的HTTP适配器
//!
//! 真正的消息网关（含传输层重试/退避）在本系统之外；这里只把
//! 每条消息POST到配置的webhook地址，按HTTP状态码判定成败。

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use campaign_config::SenderConfig;
use campaign_domain::{Contact, MessageSender, SchedulerError, SchedulerResult};

#[derive(Serialize)]
struct OutboundMessage<'a> {
    company_id: i64,
    user_id: i64,
    contact_id: i64,
    phone_number: &'a str,
    content: &'a str,
}

pub struct WebhookMessageSender {
    client: reqwest::Client,
    webhook_url: String,
}

impl WebhookMessageSender {
    pub fn new(config: &SenderConfig) -> SchedulerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| SchedulerError::Configuration(format!("创建HTTP客户端失败: {e}")))?;
        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
        })
    }
}

#[async_trait]
impl MessageSender for WebhookMessageSender {
    async fn send(
        &self,
        company_id: i64,
        user_id: i64,
        contact: &Contact,
        content: &str,
    ) -> SchedulerResult<()> {
        let payload = OutboundMessage {
            company_id,
            user_id,
            contact_id: contact.id,
            phone_number: &contact.phone_number,
            content,
        };

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SchedulerError::send_failed(contact.id, e.to_string()))?;

        if !response.status().is_success() {
            return Err(SchedulerError::send_failed(
                contact.id,
                format!("网关返回状态码 {}", response.status()),
            ));
        }
        debug!("消息已发送: contact_id={}", contact.id);
        Ok(())
    }
}
