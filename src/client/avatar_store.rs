use std::time::Duration;

use anyhow::Context;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use secrecy::Secret;

use thiserror::Error;

use url::Url;

use crate::domain::AvatarImage;

/// REST client for the object storage bucket that holds guest photos
#[derive(Debug)]
pub struct AvatarStore {
    client: Client,
    bucket: String,

    api_base_url: Url,
    api_service_key: Secret<String>,
}

impl AvatarStore {
    pub fn new(
        api_base_url: Url,
        bucket: String,
        api_timeout: Duration,
        api_service_key: Secret<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        Ok(Self {
            client,
            bucket,
            api_base_url,
            api_service_key,
        })
    }

    /// Upload (or overwrite) an avatar and return its public URL
    #[tracing::instrument(name = "Upload avatar to storage", skip(self, image), fields(path = image.object_path()))]
    pub async fn upload(&self, image: AvatarImage) -> Result<Url, StorageError> {
        use secrecy::ExposeSecret;

        let object_url = self.api_base_url.join(&format!(
            "storage/v1/object/{}/{}",
            self.bucket,
            image.object_path()
        ))?;
        let public_url = self.public_url(image.object_path())?;

        let content_type = image.content_type();
        self.client
            .post(object_url)
            .bearer_auth(self.api_service_key.expose_secret())
            .header("apikey", self.api_service_key.expose_secret())
            .header("x-upsert", "true")
            .header(CONTENT_TYPE, content_type)
            .body(image.into_bytes())
            .send()
            .await?
            .error_for_status()?;

        Ok(public_url)
    }

    /// Publicly readable URL of an object in the bucket
    pub fn public_url(&self, object_path: &str) -> Result<Url, url::ParseError> {
        self.api_base_url.join(&format!(
            "storage/v1/object/public/{}/{}",
            self.bucket, object_path
        ))
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to build storage URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to upload to storage: {0}")]
    Request(#[from] reqwest::Error),
}
