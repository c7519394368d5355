use actix_web::dev::HttpServiceFactory;
use actix_web::{post, web, HttpResponse, Responder};

use chrono::Utc;

use serde::{Deserialize, Serialize};

use sqlx::PgPool;

use uuid::Uuid;

use crate::client::SmsError;
use crate::error::{RestError, RestResult};
use crate::lifecycle::{complete_order, send_reminder, Delivery, Notifier, OrderPolicy};
use crate::read_model::{CommandResult, OrderCommand, OrderFeed};

#[derive(Debug, Deserialize)]
pub struct OrderIdBody {
    id: Option<Uuid>,
}

impl OrderIdBody {
    fn id(&self) -> RestResult<Uuid> {
        self.id
            .ok_or_else(|| RestError::ParseError("Order id is required".into()))
    }
}

/// How a notification attempt went, as reported to staff
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct DeliveryReport {
    ok: bool,
    /// `sms`, `disabled`, or `none` when nothing was attempted
    channel: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    already: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<i64>,
}

impl DeliveryReport {
    /// The order was already ready, so no one was notified
    fn already_ready() -> Self {
        Self {
            ok: true,
            channel: "none",
            already: Some(true),
            ..Default::default()
        }
    }

    /// A disabled gateway still counts as success for the ready transition
    fn for_ready(delivery: Delivery) -> Self {
        match delivery {
            Delivery::Disabled { reason } => Self {
                ok: true,
                channel: "disabled",
                reason: Some(reason),
                ..Default::default()
            },
            other => Self::from(other),
        }
    }
}

impl From<Delivery> for DeliveryReport {
    fn from(delivery: Delivery) -> Self {
        match delivery {
            Delivery::Sent(receipt) => Self {
                ok: true,
                channel: "sms",
                sid: receipt.sid,
                ..Default::default()
            },
            Delivery::Disabled { reason } => Self {
                ok: false,
                channel: "disabled",
                reason: Some(reason),
                ..Default::default()
            },
            Delivery::Failed(error) => {
                let error_code = match &error {
                    SmsError::Rejected { code, .. } => *code,
                    SmsError::Transport(_) => None,
                };
                Self {
                    ok: false,
                    channel: "sms",
                    error: Some(error.to_string()),
                    error_code,
                    ..Default::default()
                }
            }
        }
    }
}

#[tracing::instrument(name = "Mark order ready and notify guest", skip(pool, notifier, feed))]
#[post("/notify")]
async fn notify(
    body: web::Json<OrderIdBody>,
    pool: web::Data<PgPool>,
    notifier: web::Data<Notifier>,
    feed: web::Data<OrderFeed>,
) -> RestResult<impl Responder> {
    let id = body.id()?;
    let now = Utc::now();

    let pending = feed.begin(OrderCommand::MarkReady(id), now);
    let outcome = match complete_order(pool.get_ref(), notifier.get_ref(), id, now).await {
        Ok(outcome) => outcome,
        Err(error) => {
            feed.finish(pending, CommandResult::Rejected(error.to_string()));
            return Err(error.into());
        }
    };
    feed.finish(
        pending,
        CommandResult::Applied(outcome.transition.order().clone()),
    );

    let report = match outcome.delivery {
        Some(delivery) => DeliveryReport::for_ready(delivery),
        None => DeliveryReport::already_ready(),
    };

    Ok(HttpResponse::Ok().json(report))
}

#[tracing::instrument(name = "Send order reminder", skip(pool, notifier, policy, feed))]
#[post("/remind")]
async fn remind(
    body: web::Json<OrderIdBody>,
    pool: web::Data<PgPool>,
    notifier: web::Data<Notifier>,
    policy: web::Data<OrderPolicy>,
    feed: web::Data<OrderFeed>,
) -> RestResult<impl Responder> {
    let id = body.id()?;
    let now = Utc::now();

    let pending = feed.begin(OrderCommand::Remind(id), now);
    let outcome = match send_reminder(
        pool.get_ref(),
        notifier.get_ref(),
        policy.get_ref(),
        id,
        now,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(error) => {
            feed.finish(pending, CommandResult::Rejected(error.to_string()));
            return Err(error.into());
        }
    };
    // A failed or disabled send comes back without `reminded_at`, rolling the board back
    feed.finish(pending, CommandResult::Applied(outcome.order.clone()));

    Ok(HttpResponse::Ok().json(DeliveryReport::from(outcome.delivery)))
}

/// Staff notification endpoints
pub fn services() -> impl HttpServiceFactory {
    (notify, remind)
}
