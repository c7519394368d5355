use std::time::Duration;

use anyhow::Context;

use reqwest::Client;

use serde::{Deserialize, Serialize};

use secrecy::Secret;

use thiserror::Error;

use url::Url;

use crate::domain::PhoneNumber;

/// Identity the gateway sends from, either a purchased number or a messaging service
#[derive(Debug, Clone, PartialEq)]
pub enum MessageSender {
    Number(String),
    MessagingService(String),
}

#[derive(Debug)]
pub struct SmsClient {
    client: Client,
    sender: MessageSender,

    account_sid: String,
    api_send_message_url: Url,
    api_auth_token: Secret<String>,
}

impl SmsClient {
    pub fn new(
        sender: MessageSender,
        api_timeout: Duration,
        api_base_url: Url,
        account_sid: String,
        api_auth_token: Secret<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let api_send_message_url = api_base_url
            .join(&format!("2010-04-01/Accounts/{}/Messages.json", account_sid))
            .context("Failed to create send message endpoint URL")?;

        Ok(Self {
            client,
            sender,
            account_sid,
            api_send_message_url,
            api_auth_token,
        })
    }

    #[tracing::instrument(name = "Send a text message via API", skip(self))]
    pub async fn send(&self, message: &TextMessage) -> Result<MessageReceipt, SmsError> {
        use secrecy::ExposeSecret;

        let body = message.as_request(&self.sender);

        let response = self
            .client
            .post(self.api_send_message_url.clone())
            .basic_auth(&self.account_sid, Some(self.api_auth_token.expose_secret()))
            .form(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        // Error pages are not always JSON
        let reply: GatewayReply = serde_json::from_str(&text).unwrap_or_default();

        if !status.is_success() || reply.error_code.is_some() {
            return Err(SmsError::Rejected {
                message: reply.message.unwrap_or(text),
                code: reply.error_code.or(reply.code),
            });
        }

        Ok(MessageReceipt { sid: reply.sid })
    }
}

/// Outbound text message
#[derive(Debug, Clone)]
pub struct TextMessage {
    pub recipient: PhoneNumber,
    pub body: String,
}

impl TextMessage {
    fn as_request<'m>(&'m self, sender: &'m MessageSender) -> SendMessageRequest<'m> {
        let (from, messaging_service_sid) = match sender {
            MessageSender::Number(number) => (Some(number.as_str()), None),
            MessageSender::MessagingService(sid) => (None, Some(sid.as_str())),
        };

        SendMessageRequest {
            to: self.recipient.as_ref(),
            body: &self.body,
            from,
            messaging_service_sid,
        }
    }
}

/// Gateway acknowledgement of an accepted message
#[derive(Debug, Clone, PartialEq)]
pub struct MessageReceipt {
    pub sid: Option<String>,
}

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("Failed to reach messaging gateway: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Messaging gateway rejected message: {message}")]
    Rejected { message: String, code: Option<i64> },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendMessageRequest<'a> {
    to: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    messaging_service_sid: Option<&'a str>,
}

/// Both message resources (`error_code`) and error documents (`code`) come back through here
#[derive(Debug, Default, Deserialize)]
struct GatewayReply {
    sid: Option<String>,
    error_code: Option<i64>,
    code: Option<i64>,
    message: Option<String>,
}
