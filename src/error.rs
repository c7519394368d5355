use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use serde_json::json;

use thiserror::Error;

use crate::client::StorageError;
use crate::lifecycle::{LifecycleError, RemindError, ReminderEligibility};

pub type RestResult<T> = Result<T, RestError>;

#[derive(Debug, Error)]
pub enum RestError {
    #[error("{0}")]
    ParseError(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Profile registration required")]
    Unregistered,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal Server Error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for RestError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error.cause_chain = ?e, "Database query failed");
        Self::InternalError("Database error".into())
    }
}

impl From<LifecycleError> for RestError {
    fn from(e: LifecycleError) -> Self {
        match e {
            LifecycleError::NotFound(id) => Self::NotFound(format!("Order {} not found", id)),
            LifecycleError::DatabaseError(e) => e.into(),
        }
    }
}

impl From<RemindError> for RestError {
    fn from(e: RemindError) -> Self {
        match e {
            RemindError::NotFound(id) => Self::NotFound(format!("Order {} not found", id)),
            RemindError::Ineligible(ReminderEligibility::NotReady) => {
                Self::BadRequest("Order is not ready yet".into())
            }
            RemindError::Ineligible(ReminderEligibility::AlreadyReminded) => {
                Self::Conflict("Reminder already sent".into())
            }
            RemindError::Ineligible(ReminderEligibility::CoolingDown { remaining }) => {
                Self::Conflict(format!(
                    "Reminder available in {} seconds",
                    remaining.num_seconds().max(1)
                ))
            }
            RemindError::Ineligible(ReminderEligibility::Eligible) => {
                Self::InternalError("Reminder rejected while eligible".into())
            }
            RemindError::DatabaseError(e) => e.into(),
        }
    }
}

impl From<StorageError> for RestError {
    fn from(e: StorageError) -> Self {
        tracing::error!(error.cause_chain = ?e, "Avatar upload failed");
        Self::InternalError("Storage error".into())
    }
}

impl ResponseError for RestError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ParseError(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unregistered => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InternalError(_) | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            Self::Other(e) => {
                tracing::error!(error.cause_chain = ?e, "Unhandled error");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "ok": false, "error": error }))
    }
}
