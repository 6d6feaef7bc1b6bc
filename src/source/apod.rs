//! NASA APOD endpoint implementation of [`ApodSource`].
//!
//! Requests are plain `GET {base_url}?api_key=KEY[&date=YYYY-MM-DD]`.  The
//! response body is parsed by [`NasaApod::parse_body`], a pure function so
//! tests can exercise decoding without the network.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Url};

use super::{ApodResponse, ApodSource, RemoteItem};
use crate::config::EndpointConfig;
use crate::error::{ConfigError, SourceError};

/// The public NASA APOD endpoint.
pub struct NasaApod {
    client: Client,
    base_url: Url,
    api_key: String,
    timeout: Duration,
}

impl NasaApod {
    /// Build a source from validated endpoint settings.
    ///
    /// The per-request timeout is applied to the whole request, so a hung
    /// connection surfaces as [`SourceError::Timeout`].
    pub fn new(endpoint: &EndpointConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&endpoint.base_url).map_err(|e| ConfigError::BadUrl {
            url: endpoint.base_url.clone(),
            reason: e.to_string(),
        })?;
        let timeout = endpoint.request_timeout();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("terralens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key: endpoint.api_key.clone(),
            timeout,
        })
    }

    /// Full request URL for `date` (`None` = today's entry).
    pub fn request_url(&self, date: Option<NaiveDate>) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("api_key", &self.api_key);
            if let Some(date) = date {
                query.append_pair("date", &date.format("%Y-%m-%d").to_string());
            }
        }
        url
    }

    /// Decode a 200 response body into a [`RemoteItem`].
    pub fn parse_body(body: &str) -> Result<RemoteItem, SourceError> {
        let raw: ApodResponse =
            serde_json::from_str(body).map_err(|e| SourceError::Decode(e.to_string()))?;
        Ok(RemoteItem::from(raw))
    }

    fn classify(&self, err: reqwest::Error) -> SourceError {
        if err.is_timeout() {
            SourceError::Timeout(self.timeout)
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl ApodSource for NasaApod {
    fn name(&self) -> &str {
        "NASA APOD"
    }

    async fn fetch(&self, date: Option<NaiveDate>) -> Result<RemoteItem, SourceError> {
        let url = self.request_url(date);
        tracing::debug!(date = ?date, host = url.host_str().unwrap_or(""), "requesting APOD");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::from_status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        Self::parse_body(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
