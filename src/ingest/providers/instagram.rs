// src/ingest/providers/instagram.rs
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{GatewayError, Result};
use crate::ingest::extract::{lookup, lookup_str, Path, Segment::Key};
use crate::ingest::types::{CanonicalItem, SourceAdapter};
use crate::ingest::upstream::Upstream;
use crate::ingest::{map_items, unwrap, Shape};

use super::endpoint;

const NAME: &str = "instagram";
const ITEMS: Path = &[Key("items")];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InstagramReport {
    #[default]
    RecentMedia,
}

impl InstagramReport {
    pub fn parse(_raw: &str) -> Self {
        Self::RecentMedia
    }
}

#[derive(Debug, Deserialize)]
struct Media {
    #[serde(default)]
    link: String,
}

pub struct InstagramAdapter {
    upstream: Upstream,
}

impl InstagramAdapter {
    pub fn new(upstream: Upstream) -> Self {
        Self { upstream }
    }
}

fn map_media(m: Media, raw: &Value) -> CanonicalItem {
    let caption = lookup_str(raw, &[Key("caption"), Key("text")]).unwrap_or_default();
    let image = lookup_str(raw, &[Key("images"), Key("low_resolution"), Key("url")]);
    CanonicalItem::new(caption, m.link).with_image(image.map(str::to_string))
}

#[async_trait]
impl SourceAdapter for InstagramAdapter {
    type Report = InstagramReport;

    async fn fetch(&self, subject: &str, report: InstagramReport) -> Result<Vec<CanonicalItem>> {
        let InstagramReport::RecentMedia = report;
        let url = endpoint(&self.upstream.endpoints.instagram, &[subject, "media", ""])?;
        tracing::debug!(provider = NAME, subject, "fetching media");

        let req = self.upstream.http().get(url);
        let body = self.upstream.fetch_text(NAME, req).await?;
        let tree = unwrap::json(&body).map_err(|e| GatewayError::payload(NAME, e))?;

        map_items(NAME, lookup(&tree, ITEMS), Shape::List, map_media)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
