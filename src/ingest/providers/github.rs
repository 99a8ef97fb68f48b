// src/ingest/providers/github.rs
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::{require, GatewayConfig, GithubCredentials};
use crate::error::{GatewayError, Result};
use crate::ingest::types::{CanonicalItem, SourceAdapter};
use crate::ingest::upstream::Upstream;
use crate::ingest::{map_items, unwrap, Shape, MAX_ITEMS};

use super::endpoint;

const NAME: &str = "github";

#[derive(Debug, Deserialize)]
struct Repo {
    full_name: String,
    html_url: String,
    #[serde(default)]
    description: Option<String>,
}

/// The only view: the subject's repositories, most recently pushed first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GithubReport {
    #[default]
    RecentlyPushed,
}

impl GithubReport {
    /// Every path value selects the same view.
    pub fn parse(_raw: &str) -> Self {
        Self::RecentlyPushed
    }
}

pub struct GithubAdapter {
    upstream: Upstream,
    token: String,
}

impl GithubAdapter {
    pub fn new(upstream: Upstream, creds: &GithubCredentials) -> Self {
        Self {
            upstream,
            token: creds.token.clone(),
        }
    }

    pub fn from_config(upstream: &Upstream, cfg: &GatewayConfig) -> Result<Self> {
        let creds = require(cfg.github.as_ref())?;
        Ok(Self::new(upstream.clone(), creds))
    }
}

fn map_repo(repo: Repo, _raw: &serde_json::Value) -> CanonicalItem {
    CanonicalItem::new(repo.full_name, repo.html_url).with_sub(repo.description)
}

#[async_trait]
impl SourceAdapter for GithubAdapter {
    type Report = GithubReport;

    async fn fetch(&self, subject: &str, report: GithubReport) -> Result<Vec<CanonicalItem>> {
        let GithubReport::RecentlyPushed = report;
        let url = endpoint(&self.upstream.endpoints.github, &["users", subject, "repos"])?;
        tracing::debug!(provider = NAME, subject, "fetching repositories");

        let per_page = MAX_ITEMS.to_string();
        let req = self
            .upstream
            .http()
            .get(url)
            .query(&[("sort", "pushed"), ("per_page", per_page.as_str())])
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github+json");
        let body = self.upstream.fetch_text(NAME, req).await?;
        let tree = unwrap::json(&body).map_err(|e| GatewayError::payload(NAME, e))?;

        map_items(NAME, Some(&tree), Shape::List, map_repo)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
