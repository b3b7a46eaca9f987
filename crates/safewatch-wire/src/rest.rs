//! Minimal REST surface of the monitoring backend.
//!
//! Used exactly once per connection: the engine fetches a baseline
//! snapshot (dashboard counters + tourist roster) before the event
//! channel starts pushing deltas. Everything after that arrives over
//! the channel.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::error::Error;

/// Dashboard counters returned by `/api/dashboard/stats`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub active_tourists: u32,

    #[serde(default)]
    pub active_alerts: u32,

    #[serde(default)]
    pub iot_devices: u32,
}

/// One tourist from `/api/tourists`.
#[derive(Debug, Clone, Deserialize)]
pub struct TouristRecord {
    pub tourist_id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TouristsResponse {
    #[serde(default)]
    tourists: Vec<TouristRecord>,
}

/// Blocking-free client for the backend's REST endpoints.
pub struct RestClient {
    http: reqwest::Client,
    base: Url,
    bearer: Option<SecretString>,
}

impl RestClient {
    pub fn new(base: Url, bearer: Option<SecretString>, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base, bearer })
    }

    /// Build a client around an existing `reqwest::Client` (tests).
    pub fn from_reqwest(base: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base: base.parse()?,
            bearer: None,
        })
    }

    /// Fetch the aggregate dashboard counters.
    pub async fn fetch_dashboard_stats(&self) -> Result<DashboardStats, Error> {
        self.get_json("api/dashboard/stats").await
    }

    /// Fetch the tourist roster.
    pub async fn fetch_tourists(&self) -> Result<Vec<TouristRecord>, Error> {
        let response: TouristsResponse = self.get_json("api/tourists").await?;
        Ok(response.tourists)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.base.join(path)?;

        let mut request = self.http.get(url);
        if let Some(ref token) = self.bearer {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::Api {
                message: body,
                status: status.as_u16(),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}
