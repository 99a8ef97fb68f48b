// src/ingest/providers/strava.rs
//! Fitness activities and athlete totals.
//!
//! The athlete is whoever owns the configured access token, so neither view
//! takes a subject from the path.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{require, GatewayConfig, StravaCredentials};
use crate::error::{GatewayError, Result};
use crate::ingest::types::{CanonicalItem, SourceAdapter};
use crate::ingest::upstream::Upstream;
use crate::ingest::{map_items, unwrap, Shape, MAX_ITEMS};

use super::endpoint;

const NAME: &str = "strava";
const WEB_BASE: &str = "https://www.strava.com";

/// Map thumbnail served by the CDN; `{id}` is the activity id.
pub const DEFAULT_THUMBNAIL_TEMPLATE: &str = "https://d3o5xota0a1fcr.cloudfront.net/v6/maps/{id}";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StravaReport {
    #[default]
    Activities,
}

#[derive(Debug, Deserialize)]
struct Activity {
    id: u64,
    #[serde(default)]
    name: String,
    /// meters
    #[serde(default)]
    distance: f64,
    /// seconds
    #[serde(default)]
    moving_time: u64,
    /// meters per second
    #[serde(default)]
    average_speed: f64,
}

#[derive(Debug, Deserialize)]
struct Athlete {
    id: u64,
}

/// Round half away from zero to two decimals.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// `3725` -> `"01:02:05"`. Hours keep counting past 99.
pub fn format_duration(secs: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

pub fn meters_to_km(meters: f64) -> f64 {
    round2(meters / 1000.0)
}

pub fn mps_to_kmh(mps: f64) -> f64 {
    round2(mps * 3.6)
}

pub struct StravaAdapter {
    upstream: Upstream,
    access_token: String,
    thumbnail_template: String,
}

impl StravaAdapter {
    pub fn new(upstream: Upstream, creds: &StravaCredentials) -> Self {
        Self {
            upstream,
            access_token: creds.access_token.clone(),
            thumbnail_template: creds
                .thumbnail_template
                .clone()
                .unwrap_or_else(|| DEFAULT_THUMBNAIL_TEMPLATE.to_string()),
        }
    }

    pub fn from_config(upstream: &Upstream, cfg: &GatewayConfig) -> Result<Self> {
        let creds = require(cfg.strava.as_ref())?;
        Ok(Self::new(upstream.clone(), creds))
    }

    fn map_activity(&self, a: Activity) -> CanonicalItem {
        let sub = format!(
            "{} km · {} · {} km/h",
            meters_to_km(a.distance),
            format_duration(a.moving_time),
            mps_to_kmh(a.average_speed)
        );
        let thumb = self.thumbnail_template.replace("{id}", &a.id.to_string());
        CanonicalItem::new(a.name, format!("{WEB_BASE}/activities/{}", a.id))
            .with_sub(Some(sub))
            .with_image(Some(thumb))
    }

    async fn get_json(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Value> {
        let url = endpoint(&self.upstream.endpoints.strava, segments)?;
        let req = self
            .upstream
            .http()
            .get(url)
            .query(query)
            .bearer_auth(&self.access_token);
        let body = self.upstream.fetch_text(NAME, req).await?;
        unwrap::json(&body).map_err(|e| GatewayError::payload(NAME, e))
    }

    /// Athlete totals exactly as upstream reports them; not canonical items.
    /// Two round trips: the token's athlete id, then its stats.
    pub async fn stats(&self) -> Result<Value> {
        tracing::debug!(provider = NAME, "fetching athlete stats");
        let athlete = self.get_json(&["api", "v3", "athlete"], &[]).await?;
        let athlete =
            Athlete::deserialize(&athlete).map_err(|e| GatewayError::payload(NAME, e))?;
        let id = athlete.id.to_string();
        self.get_json(&["api", "v3", "athletes", id.as_str(), "stats"], &[])
            .await
    }
}

#[async_trait]
impl SourceAdapter for StravaAdapter {
    type Report = StravaReport;

    async fn fetch(&self, _subject: &str, report: StravaReport) -> Result<Vec<CanonicalItem>> {
        let StravaReport::Activities = report;
        tracing::debug!(provider = NAME, "fetching activities");
        let per_page = MAX_ITEMS.to_string();
        let tree = self
            .get_json(
                &["api", "v3", "athlete", "activities"],
                &[("per_page", per_page.as_str())],
            )
            .await?;

        map_items(NAME, Some(&tree), Shape::List, |a: Activity, _| {
            self.map_activity(a)
        })
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
