// src/ingest/upstream.rs
//! Shared upstream HTTP plumbing: one reusable client and the base URL of every
//! source, overridable so tests can point adapters at a local mock server.

use metrics::{counter, histogram};
use reqwest::{Client, RequestBuilder};

use crate::error::{GatewayError, Result};

pub const USER_AGENT: &str = "social-feed-gateway/0.1";

/// Base URL per source (no trailing slash).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub github: String,
    pub twitter: String,
    pub lastfm: String,
    pub medium: String,
    pub instagram: String,
    pub setlistfm: String,
    pub strava: String,
    pub rescuetime: String,
    pub goodreads: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            github: "https://api.github.com".into(),
            twitter: "https://api.twitter.com".into(),
            lastfm: "https://ws.audioscrobbler.com".into(),
            medium: "https://medium.com".into(),
            instagram: "https://www.instagram.com".into(),
            setlistfm: "https://api.setlist.fm".into(),
            strava: "https://www.strava.com".into(),
            rescuetime: "https://www.rescuetime.com".into(),
            goodreads: "https://www.goodreads.com".into(),
        }
    }
}

impl Endpoints {
    /// Every source served from one host (mock servers, local proxies).
    pub fn all(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            github: base.clone(),
            twitter: base.clone(),
            lastfm: base.clone(),
            medium: base.clone(),
            instagram: base.clone(),
            setlistfm: base.clone(),
            strava: base.clone(),
            rescuetime: base.clone(),
            goodreads: base,
        }
    }
}

/// Cheap to clone; `reqwest::Client` is reference counted internally.
#[derive(Clone)]
pub struct Upstream {
    http: Client,
    pub endpoints: Endpoints,
}

impl Upstream {
    pub fn new(endpoints: Endpoints) -> anyhow::Result<Self> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http, endpoints })
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Send `req` and return the body of a 2xx response.
    ///
    /// Transport failures and non-2xx statuses become typed errors; the router
    /// logs and counts them along with every other failure.
    pub async fn fetch_text(&self, provider: &'static str, req: RequestBuilder) -> Result<String> {
        let t0 = std::time::Instant::now();
        counter!("upstream_requests_total", "source" => provider).increment(1);

        let result = send(provider, req).await;

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("upstream_fetch_ms", "source" => provider).record(ms);
        result
    }
}

async fn send(provider: &'static str, req: RequestBuilder) -> Result<String> {
    let resp = req
        .send()
        .await
        .map_err(|error| transport(provider, error))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(GatewayError::UpstreamStatus {
            provider,
            status: status.as_u16(),
        });
    }
    resp.text().await.map_err(|error| transport(provider, error))
}

/// The request URL carries query-string credentials for some sources; it
/// never reaches the error message.
fn transport(provider: &'static str, error: reqwest::Error) -> GatewayError {
    GatewayError::Transport {
        provider,
        error: error.without_url(),
    }
}
