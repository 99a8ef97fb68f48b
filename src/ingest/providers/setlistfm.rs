// src/ingest/providers/setlistfm.rs
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{require, GatewayConfig, SetlistfmCredentials};
use crate::error::{GatewayError, Result};
use crate::ingest::extract::{lookup, lookup_str, Path, Segment::Key};
use crate::ingest::types::{CanonicalItem, SourceAdapter};
use crate::ingest::upstream::Upstream;
use crate::ingest::{map_items, unwrap, Shape};

use super::endpoint;

const NAME: &str = "setlistfm";
const SETLISTS: Path = &[Key("setlist")];

/// Concerts the subject marked as attended; the only view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SetlistfmReport {
    #[default]
    Attended,
}

#[derive(Debug, Deserialize)]
struct Setlist {
    #[serde(rename = "eventDate")]
    event_date: String,
    #[serde(default)]
    url: String,
    artist: Named,
    venue: Named,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

pub struct SetlistfmAdapter {
    upstream: Upstream,
    apikey: String,
}

impl SetlistfmAdapter {
    pub fn new(upstream: Upstream, creds: &SetlistfmCredentials) -> Self {
        Self {
            upstream,
            apikey: creds.apikey.clone(),
        }
    }

    pub fn from_config(upstream: &Upstream, cfg: &GatewayConfig) -> Result<Self> {
        let creds = require(cfg.setlistfm.as_ref())?;
        Ok(Self::new(upstream.clone(), creds))
    }
}

fn map_setlist(s: Setlist, raw: &Value) -> CanonicalItem {
    let title = format!("{} @ {} / {}", s.artist.name, s.venue.name, s.event_date);
    let city = lookup_str(raw, &[Key("venue"), Key("city"), Key("name")]);
    let country = lookup_str(raw, &[Key("venue"), Key("city"), Key("country"), Key("name")]);
    let place = match (city, country) {
        (Some(c), Some(k)) => Some(format!("{c}, {k}")),
        (Some(c), None) => Some(c.to_string()),
        _ => None,
    };
    CanonicalItem::new(title, s.url).with_sub(place)
}

#[async_trait]
impl SourceAdapter for SetlistfmAdapter {
    type Report = SetlistfmReport;

    async fn fetch(&self, subject: &str, report: SetlistfmReport) -> Result<Vec<CanonicalItem>> {
        let SetlistfmReport::Attended = report;
        let url = endpoint(
            &self.upstream.endpoints.setlistfm,
            &["rest", "1.0", "user", subject, "attended"],
        )?;
        tracing::debug!(provider = NAME, subject, "fetching attended concerts");

        let req = self
            .upstream
            .http()
            .get(url)
            .query(&[("p", "1")])
            .header("x-api-key", &self.apikey)
            .header("Accept", "application/json");
        let body = self.upstream.fetch_text(NAME, req).await?;
        let tree = unwrap::json(&body).map_err(|e| GatewayError::payload(NAME, e))?;

        map_items(NAME, lookup(&tree, SETLISTS), Shape::List, map_setlist)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
