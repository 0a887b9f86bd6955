//! Post-merge celebration
//!
//! Purely cosmetic. Any failure falls back to a plain comment.

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Public random-dog endpoint
const DOG_API: &str = "https://dog.ceo/api/breeds/image/random";

/// Comment used when no image can be fetched
pub const FALLBACK_CELEBRATION: &str = ":tada: Merged!";

/// Source of a celebratory image
#[async_trait]
pub trait Celebration: Send + Sync {
    /// URL of an image to post
    async fn image_url(&self) -> Result<String>;
}

/// Render the comment body for an image
pub fn celebration_comment(image_url: &str) -> String {
    format!(r#"<p align="center"><img src="{image_url}"></p>"#)
}

#[derive(Deserialize)]
struct DogResponse {
    message: String,
}

/// Random dog pictures from dog.ceo
pub struct DogCeo {
    client: Client,
    url: String,
}

impl DogCeo {
    /// Client for the public endpoint
    pub fn new() -> Result<Self> {
        Self::with_url(DOG_API)
    }

    /// Client for an explicit endpoint
    pub fn with_url(url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Internal(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Celebration for DogCeo {
    async fn image_url(&self) -> Result<String> {
        let response: DogResponse = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.message)
    }
}
