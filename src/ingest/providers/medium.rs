// src/ingest/providers/medium.rs
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{GatewayError, Result};
use crate::ingest::extract::{lookup, lookup_str, Path, Segment::Key};
use crate::ingest::types::{CanonicalItem, SourceAdapter};
use crate::ingest::upstream::Upstream;
use crate::ingest::{map_items, unwrap, Shape};

use super::endpoint;

const NAME: &str = "medium";
const WEB_BASE: &str = "https://medium.com";

/// Posts are keyed by id under `payload.references.Post`.
const POSTS: Path = &[Key("payload"), Key("references"), Key("Post")];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MediumReport {
    #[default]
    Latest,
}

impl MediumReport {
    /// The profile only exposes one listing worth normalizing.
    pub fn parse(_raw: &str) -> Self {
        Self::Latest
    }
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    #[serde(rename = "uniqueSlug")]
    unique_slug: String,
}

/// Needs no credentials; the profile JSON is public.
pub struct MediumAdapter {
    upstream: Upstream,
}

impl MediumAdapter {
    pub fn new(upstream: Upstream) -> Self {
        Self { upstream }
    }
}

fn normalize(user: &str, tree: &Value) -> Result<Vec<CanonicalItem>> {
    map_items(NAME, lookup(tree, POSTS), Shape::Keyed, |post: Post, raw| {
        let subtitle = lookup_str(raw, &[Key("content"), Key("subtitle")]).map(str::to_string);
        CanonicalItem::new(post.title, format!("{WEB_BASE}/@{user}/{}", post.unique_slug))
            .with_sub(subtitle)
    })
}

#[async_trait]
impl SourceAdapter for MediumAdapter {
    type Report = MediumReport;

    async fn fetch(&self, subject: &str, report: MediumReport) -> Result<Vec<CanonicalItem>> {
        let MediumReport::Latest = report;
        let handle = format!("@{subject}");
        let url = endpoint(&self.upstream.endpoints.medium, &[handle.as_str(), "latest"])?;
        tracing::debug!(provider = NAME, subject, "fetching posts");

        let req = self
            .upstream
            .http()
            .get(url)
            .query(&[("format", "json")])
            .header("Accept", "application/json");
        let body = self.upstream.fetch_text(NAME, req).await?;
        let tree = unwrap::guarded_json(&body).map_err(|e| GatewayError::payload(NAME, e))?;

        normalize(subject, &tree)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
