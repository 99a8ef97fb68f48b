// src/ingest/providers/rescuetime.rs
//! Daily time-tracking summaries as a percentage breakdown per category.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{require, GatewayConfig, RescuetimeCredentials};
use crate::error::{GatewayError, Result};
use crate::ingest::extract::{lookup_f64, Segment::Key};
use crate::ingest::types::{CanonicalItem, DataPoint, SourceAdapter};
use crate::ingest::upstream::Upstream;
use crate::ingest::{map_items, unwrap, Shape};

use super::endpoint;

const NAME: &str = "rescuetime";

/// Category-hour fields of a daily summary, in output order.
pub const CATEGORIES: [&str; 11] = [
    "software_development_hours",
    "communication_and_scheduling_hours",
    "social_networking_hours",
    "reference_and_learning_hours",
    "design_and_composition_hours",
    "entertainment_hours",
    "news_hours",
    "shopping_hours",
    "utilities_hours",
    "business_hours",
    "uncategorized_hours",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RescuetimeReport {
    #[default]
    Daily,
}

#[derive(Debug, Deserialize)]
struct Day {
    date: String,
    #[serde(default)]
    total_hours: Option<f64>,
    #[serde(default)]
    productivity_pulse: Option<f64>,
}

/// Each category as a share of the day's largest category (largest = 100).
///
/// An all-zero day has no largest category; its scale is 0, so every value
/// comes out 0 instead of dividing by zero.
pub fn breakdown(day: &Value) -> Vec<DataPoint> {
    let hours: Vec<(&str, f64)> = CATEGORIES
        .iter()
        .map(|&c| (c, lookup_f64(day, &[Key(c)]).unwrap_or(0.0)))
        .collect();
    let max = hours.iter().map(|&(_, h)| h).fold(0.0_f64, f64::max);
    let scale = if max > 0.0 { 100.0 / max } else { 0.0 };

    hours
        .into_iter()
        .map(|(c, h)| DataPoint {
            label: c.replace('_', " "),
            value: (h * scale).round(),
        })
        .collect()
}

fn day_title(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%a %d %b %Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

fn map_day(d: Day, raw: &Value) -> CanonicalItem {
    let sub = match (d.total_hours, d.productivity_pulse) {
        (Some(h), Some(p)) => Some(format!("{h} hours · pulse {p}")),
        (Some(h), None) => Some(format!("{h} hours")),
        _ => None,
    };
    CanonicalItem::new(day_title(&d.date), "")
        .with_sub(sub)
        .with_data(breakdown(raw))
}

pub struct RescuetimeAdapter {
    upstream: Upstream,
    key: String,
}

impl RescuetimeAdapter {
    pub fn new(upstream: Upstream, creds: &RescuetimeCredentials) -> Self {
        Self {
            upstream,
            key: creds.key.clone(),
        }
    }

    pub fn from_config(upstream: &Upstream, cfg: &GatewayConfig) -> Result<Self> {
        let creds = require(cfg.rescuetime.as_ref())?;
        Ok(Self::new(upstream.clone(), creds))
    }
}

#[async_trait]
impl SourceAdapter for RescuetimeAdapter {
    type Report = RescuetimeReport;

    async fn fetch(&self, _subject: &str, report: RescuetimeReport) -> Result<Vec<CanonicalItem>> {
        let RescuetimeReport::Daily = report;
        let url = endpoint(
            &self.upstream.endpoints.rescuetime,
            &["anapi", "daily_summary_feed"],
        )?;
        tracing::debug!(provider = NAME, "fetching daily summaries");

        let req = self
            .upstream
            .http()
            .get(url)
            .query(&[("key", self.key.as_str())]);
        let body = self.upstream.fetch_text(NAME, req).await?;
        let tree = unwrap::json(&body).map_err(|e| GatewayError::payload(NAME, e))?;

        map_items(NAME, Some(&tree), Shape::List, map_day)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
