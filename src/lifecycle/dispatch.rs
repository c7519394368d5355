use crate::client::{MessageReceipt, SmsClient, SmsError, TextMessage};
use crate::domain::PhoneNumber;
use crate::model::Order;

/// Result of one notification attempt
#[derive(Debug)]
pub enum Delivery {
    /// Accepted by the gateway
    Sent(MessageReceipt),
    /// Messaging is switched off or unconfigured, nothing was sent
    Disabled { reason: &'static str },
    /// The gateway could not be reached or refused the message
    Failed(SmsError),
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }
}

#[derive(Debug)]
enum Gateway {
    Enabled(SmsClient),
    Disabled(&'static str),
}

/// Composes guest notifications and sends them once, without retrying
#[derive(Debug)]
pub struct Notifier {
    gateway: Gateway,
    country_code: String,
}

impl Notifier {
    pub fn new(client: SmsClient, country_code: String) -> Self {
        Self {
            gateway: Gateway::Enabled(client),
            country_code,
        }
    }

    /// A notifier that reports every send as disabled
    pub fn disabled(reason: &'static str) -> Self {
        Self {
            gateway: Gateway::Disabled(reason),
            country_code: crate::domain::DEFAULT_COUNTRY_CODE.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.gateway, Gateway::Enabled(_))
    }

    /// Tell the guest their drink is ready
    pub async fn notify_ready(&self, order: &Order) -> Delivery {
        let body = ready_message(order);
        self.deliver(order, body).await
    }

    /// Follow up on a ready drink that has not been picked up
    pub async fn notify_reminder(&self, order: &Order) -> Delivery {
        let body = reminder_message(order);
        self.deliver(order, body).await
    }

    #[tracing::instrument(name = "Deliver order notification", skip(self, order, body), fields(order_id = %order.id))]
    async fn deliver(&self, order: &Order, body: String) -> Delivery {
        let client = match &self.gateway {
            Gateway::Enabled(client) => client,
            Gateway::Disabled(reason) => {
                tracing::info!("Skipping notification: {}", reason);
                return Delivery::Disabled { reason: *reason };
            }
        };

        let message = TextMessage {
            recipient: PhoneNumber::normalize(&order.phone, &self.country_code),
            body,
        };

        match client.send(&message).await {
            Ok(receipt) => Delivery::Sent(receipt),
            Err(error) => {
                tracing::warn!(error.cause_chain = ?error, "Failed to notify guest");
                Delivery::Failed(error)
            }
        }
    }
}

fn ready_message(order: &Order) -> String {
    format!(
        "Hi {}! Your {} is ready. Pick it up at the bar.",
        order.name, order.drink_name
    )
}

fn reminder_message(order: &Order) -> String {
    format!(
        "Reminder: Hi {}! Your {} is waiting for you at the bar.",
        order.name, order.drink_name
    )
}
