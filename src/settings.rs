use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;

use config::{Config, Environment, File};

use secrecy::{ExposeSecret, Secret};

use serde::Deserialize;
use serde_aux::prelude::*;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

use url::Url;

use crate::client::{AvatarStore, MessageSender, SmsClient};
use crate::lifecycle::{Notifier, OrderPolicy};

#[derive(Debug)]
pub enum Runtime {
    Dev,
    Prod,
}

impl Runtime {
    pub fn as_str(&self) -> &str {
        match self {
            Runtime::Dev => "dev",
            Runtime::Prod => "prod",
        }
    }
}

impl TryFrom<String> for Runtime {
    type Error = anyhow::Error;

    fn try_from(s: String) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            other => anyhow::bail!("{} is not a valid runtime environment", other),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: ApplicationSettings,
    pub database: DatabaseSettings,
    pub sms: SmsSettings,
    pub storage: StorageSettings,
    pub queue: QueueSettings,
    pub log: LogSettings,
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        let path = env::current_dir()?.join("settings");

        let runtime: Runtime = env::var("APP_ENV")
            .unwrap_or_else(|_| "dev".into())
            .try_into()?;

        Self::load_from(runtime, &path)
    }

    pub fn load_from(runtime: Runtime, base_path: &Path) -> anyhow::Result<Self> {
        Config::builder()
            .add_source(File::from(base_path.join("base")).required(true))
            .add_source(File::from(base_path.join(runtime.as_str())).required(true))
            .add_source(
                Environment::with_prefix("app")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
            .context("Failed to load/deserialize settings")
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplicationSettings {
    host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    port: u16,
}

impl ApplicationSettings {
    pub fn addr(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    port: u16,
    host: String,
    name: String,
    username: String,
    password: Secret<String>,
    require_ssl: bool,
}

impl DatabaseSettings {
    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .port(self.port)
            .host(&self.host)
            .ssl_mode(ssl_mode)
            .username(&self.username)
            .password(self.password.expose_secret())
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.name)
    }
}

/// Text message gateway. Missing credentials disable messaging instead of failing startup.
#[derive(Debug, Deserialize)]
pub struct SmsSettings {
    enabled: bool,
    api_base_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    api_timeout_milliseconds: u64,
    default_country_code: String,

    #[serde(default)]
    account_sid: Option<String>,
    #[serde(default)]
    auth_token: Option<Secret<String>>,
    #[serde(default)]
    from_number: Option<String>,
    #[serde(default)]
    messaging_service_sid: Option<String>,
}

impl SmsSettings {
    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_milliseconds)
    }

    /// A sender number wins over a messaging service
    pub fn sender(&self) -> Option<MessageSender> {
        non_blank(&self.from_number)
            .map(MessageSender::Number)
            .or_else(|| non_blank(&self.messaging_service_sid).map(MessageSender::MessagingService))
    }

    pub fn notifier(&self) -> anyhow::Result<Notifier> {
        if !self.enabled {
            tracing::info!("Text messages are disabled");
            return Ok(Notifier::disabled("messaging disabled"));
        }

        let auth_token = self
            .auth_token
            .clone()
            .filter(|token| !token.expose_secret().trim().is_empty());

        let (Some(account_sid), Some(auth_token), Some(sender)) =
            (non_blank(&self.account_sid), auth_token, self.sender())
        else {
            tracing::warn!("Messaging gateway credentials are incomplete, text messages are disabled");
            return Ok(Notifier::disabled("messaging not configured"));
        };

        let api_base_url =
            Url::parse(&self.api_base_url).context("Failed to parse messaging base URL")?;
        let client = SmsClient::new(
            sender,
            self.api_timeout(),
            api_base_url,
            account_sid,
            auth_token,
        )?;

        Ok(Notifier::new(client, self.default_country_code.clone()))
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[derive(Debug, Deserialize)]
pub struct StorageSettings {
    api_base_url: String,
    bucket: String,
    service_key: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    api_timeout_milliseconds: u64,
}

impl StorageSettings {
    pub fn avatar_store(&self) -> anyhow::Result<AvatarStore> {
        let api_base_url =
            Url::parse(&self.api_base_url).context("Failed to parse storage base URL")?;

        AvatarStore::new(
            api_base_url,
            self.bucket.clone(),
            Duration::from_millis(self.api_timeout_milliseconds),
            self.service_key.clone(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct QueueSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    reminder_cooldown_seconds: i64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    ready_window_seconds: i64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    poll_interval_seconds: u64,
}

impl QueueSettings {
    pub fn policy(&self) -> OrderPolicy {
        OrderPolicy {
            reminder_cooldown: chrono::Duration::seconds(self.reminder_cooldown_seconds),
            ready_window: chrono::Duration::seconds(self.ready_window_seconds),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds.max(1))
    }
}

#[derive(Debug, Deserialize)]
pub struct LogSettings {
    pub filter: String,
}
