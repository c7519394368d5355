use actix_web::dev::HttpServiceFactory;
use actix_web::http::header::{CacheControl, CacheDirective};
use actix_web::web::Bytes;
use actix_web::{get, post, web, HttpResponse, Responder};

use chrono::{DateTime, Utc};

use serde::Deserialize;

use sqlx::PgPool;

use crate::domain::{OrderStatus, PersonName, PhoneNumber};
use crate::error::{RestError, RestResult};
use crate::lifecycle::OrderPolicy;
use crate::model::{Drink, NewOrder, Order};
use crate::read_model::{OrderFeed, OrderFilter};
use crate::repo::{DrinksRepo, OrdersRepo};
use crate::session::GuestSession;
use crate::views::{guest_orders, pending_queue, ranking, ready_log, recently_ready};

#[derive(Debug, Deserialize)]
pub struct PlaceOrderBody {
    drink_id: Option<i32>,
    /// Walk-up guests give their name and phone inline instead of a profile
    name: Option<String>,
    phone: Option<String>,
    photo_url: Option<String>,
}

/// Who an order is for
#[derive(Debug)]
enum Orderer {
    Guest(GuestSession),
    WalkUp {
        name: PersonName,
        phone: PhoneNumber,
        photo_url: Option<String>,
    },
}

impl Orderer {
    fn resolve(session: Option<GuestSession>, body: PlaceOrderBody) -> RestResult<Self> {
        if let Some(session) = session {
            return Ok(Self::Guest(session));
        }

        let (name, phone) = match (body.name, body.phone) {
            (None, None) => return Err(RestError::Unregistered),
            (name, phone) => (name.unwrap_or_default(), phone.unwrap_or_default()),
        };

        Ok(Self::WalkUp {
            name: name.parse().map_err(RestError::ParseError)?,
            phone: phone.parse().map_err(RestError::ParseError)?,
            photo_url: body.photo_url.filter(|url| !url.trim().is_empty()),
        })
    }

    fn order(self, drink: &Drink) -> NewOrder {
        match self {
            Self::Guest(session) => NewOrder::for_guest(session.profile(), drink),
            Self::WalkUp {
                name,
                phone,
                photo_url,
            } => NewOrder::walk_up(&name, phone, photo_url, drink),
        }
    }
}

#[tracing::instrument(
    name = "Place order",
    skip(session, pool),
    fields(profile_id = ?session.as_ref().map(|s| s.profile().id))
)]
#[post("")]
async fn place(
    session: Option<GuestSession>,
    body: web::Json<PlaceOrderBody>,
    pool: web::Data<PgPool>,
) -> RestResult<impl Responder> {
    let body = body.into_inner();
    let drink_id = body
        .drink_id
        .ok_or_else(|| RestError::ParseError("Drink id is required".into()))?;
    let orderer = Orderer::resolve(session, body)?;

    let drink = DrinksRepo::fetch_by_id(pool.get_ref(), drink_id)
        .await?
        .ok_or_else(|| RestError::NotFound(format!("Drink {} not found", drink_id)))?;
    if !drink.available {
        return Err(RestError::Conflict(format!("{} is not available", drink.name)));
    }

    let order = OrdersRepo::insert(pool.get_ref(), &orderer.order(&drink)).await?;

    Ok(HttpResponse::Created().json(order))
}

#[tracing::instrument(name = "Fetch pending queue", skip(pool))]
#[get("/pending")]
async fn pending(pool: web::Data<PgPool>) -> RestResult<impl Responder> {
    let orders = OrdersRepo::fetch_by_status(pool.get_ref(), OrderStatus::New).await?;

    Ok(HttpResponse::Ok().json(pending_queue(&orders)))
}

#[tracing::instrument(name = "Fetch recently ready orders", skip(pool, policy))]
#[get("/ready")]
async fn ready(
    pool: web::Data<PgPool>,
    policy: web::Data<OrderPolicy>,
) -> RestResult<impl Responder> {
    let now = Utc::now();
    let orders = OrdersRepo::fetch_ready_since(pool.get_ref(), now - policy.ready_window).await?;

    Ok(HttpResponse::Ok().json(recently_ready(&orders, now, policy.get_ref())))
}

#[tracing::instrument(name = "Fetch guest orders", skip(session, pool), fields(profile_id = %session.profile().id))]
#[get("/mine")]
async fn mine(session: GuestSession, pool: web::Data<PgPool>) -> RestResult<impl Responder> {
    let orders = OrdersRepo::fetch_by_phone(pool.get_ref(), session.phone()).await?;

    Ok(HttpResponse::Ok().json(guest_orders(&orders)))
}

#[tracing::instrument(name = "Fetch ready log", skip(pool))]
#[get("/log")]
async fn log(pool: web::Data<PgPool>) -> RestResult<impl Responder> {
    let orders = OrdersRepo::fetch_by_status(pool.get_ref(), OrderStatus::Ready).await?;

    Ok(HttpResponse::Ok().json(ready_log(&orders)))
}

#[tracing::instrument(name = "Fetch guest ranking", skip(pool))]
#[get("/ranking")]
async fn leaderboard(pool: web::Data<PgPool>) -> RestResult<impl Responder> {
    let orders = OrdersRepo::fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(ranking(&orders)))
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedView {
    All,
    Pending,
    Ready,
    Mine,
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    view: Option<FeedView>,
}

/// Live snapshots as server-sent events, one `orders` event per change
#[tracing::instrument(name = "Subscribe to order events", skip(session, feed, policy))]
#[get("/events")]
async fn events(
    query: web::Query<EventsQuery>,
    session: Option<GuestSession>,
    feed: web::Data<OrderFeed>,
    policy: web::Data<OrderPolicy>,
) -> RestResult<impl Responder> {
    let view = query.view.unwrap_or(FeedView::All);
    let filter = match view {
        FeedView::All => OrderFilter::All,
        FeedView::Pending => OrderFilter::Pending,
        FeedView::Ready => OrderFilter::RecentlyReady,
        FeedView::Mine => {
            let session = session.ok_or(RestError::Unregistered)?;
            OrderFilter::Guest(session.phone().to_string())
        }
    };

    let policy = *policy.get_ref();
    let subscription = feed.subscribe(filter);
    let stream = futures_util::stream::unfold(subscription, move |mut subscription| async move {
        let snapshot = subscription.next().await?;
        let event = render_event(view, &snapshot, Utc::now(), &policy);
        Some((event, subscription))
    });

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(CacheControl(vec![CacheDirective::NoCache]))
        .streaming(stream))
}

fn render_event(
    view: FeedView,
    orders: &[Order],
    now: DateTime<Utc>,
    policy: &OrderPolicy,
) -> serde_json::Result<Bytes> {
    let data = match view {
        FeedView::All => serde_json::to_string(orders)?,
        FeedView::Pending => serde_json::to_string(&pending_queue(orders))?,
        FeedView::Ready => serde_json::to_string(&recently_ready(orders, now, policy))?,
        FeedView::Mine => serde_json::to_string(&guest_orders(orders))?,
    };

    Ok(Bytes::from(format!("event: orders\ndata: {}\n\n", data)))
}

/// Order endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/orders")
        .service(place)
        .service(pending)
        .service(ready)
        .service(mine)
        .service(log)
        .service(leaderboard)
        .service(events)
}
