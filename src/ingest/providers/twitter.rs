// src/ingest/providers/twitter.rs
//! Microblogging timeline and favorites.
//!
//! Uses app-only auth: every request first trades the consumer key/secret for
//! a bearer token, then reads the selected list. Nothing is kept between
//! requests.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{require, GatewayConfig, TwitterCredentials};
use crate::error::{GatewayError, Result};
use crate::ingest::extract::{lookup_str, Segment::Key};
use crate::ingest::types::{CanonicalItem, SourceAdapter};
use crate::ingest::upstream::Upstream;
use crate::ingest::{map_items, unwrap, Shape, MAX_ITEMS};

use super::endpoint;

const NAME: &str = "twitter";
const WEB_BASE: &str = "https://twitter.com";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TwitterReport {
    #[default]
    Timeline,
    Favorites,
}

impl TwitterReport {
    /// `favorites` selects liked posts; anything else is the own timeline.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("favorites") {
            Self::Favorites
        } else {
            Self::Timeline
        }
    }

    fn path(self) -> &'static [&'static str] {
        match self {
            Self::Timeline => &["1.1", "statuses", "user_timeline.json"],
            Self::Favorites => &["1.1", "favorites", "list.json"],
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id_str: String,
    #[serde(alias = "full_text")]
    text: String,
    user: Author,
}

#[derive(Debug, Deserialize)]
struct Author {
    screen_name: String,
}

pub struct TwitterAdapter {
    upstream: Upstream,
    key: String,
    secret: String,
}

impl TwitterAdapter {
    pub fn new(upstream: Upstream, creds: &TwitterCredentials) -> Self {
        Self {
            upstream,
            key: creds.key.clone(),
            secret: creds.secret.clone(),
        }
    }

    pub fn from_config(upstream: &Upstream, cfg: &GatewayConfig) -> Result<Self> {
        let creds = require(cfg.twitter.as_ref())?;
        Ok(Self::new(upstream.clone(), creds))
    }

    async fn bearer_token(&self) -> Result<String> {
        let url = endpoint(&self.upstream.endpoints.twitter, &["oauth2", "token"])?;
        let req = self
            .upstream
            .http()
            .post(url)
            .basic_auth(&self.key, Some(&self.secret))
            .form(&[("grant_type", "client_credentials")]);
        let body = self.upstream.fetch_text(NAME, req).await?;
        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| GatewayError::payload(NAME, e))?;
        Ok(token.access_token)
    }
}

/// The permalink is built from the post's own author: favorites belong to
/// other people, not to the queried subject.
fn map_tweet(t: Tweet, raw: &Value) -> CanonicalItem {
    let url = format!("{WEB_BASE}/{}/status/{}", t.user.screen_name, t.id_str);
    let avatar = lookup_str(raw, &[Key("user"), Key("profile_image_url_https")])
        .or_else(|| lookup_str(raw, &[Key("user"), Key("profile_image_url")]))
        .map(str::to_string);
    CanonicalItem::new(t.text, url).with_image(avatar)
}

#[async_trait]
impl SourceAdapter for TwitterAdapter {
    type Report = TwitterReport;

    async fn fetch(&self, subject: &str, report: TwitterReport) -> Result<Vec<CanonicalItem>> {
        let token = self.bearer_token().await?;
        let url = endpoint(&self.upstream.endpoints.twitter, report.path())?;
        tracing::debug!(provider = NAME, subject, ?report, "fetching posts");

        let count = MAX_ITEMS.to_string();
        let req = self
            .upstream
            .http()
            .get(url)
            .query(&[("screen_name", subject), ("count", count.as_str())])
            .bearer_auth(token);
        let body = self.upstream.fetch_text(NAME, req).await?;
        let tree = unwrap::json(&body).map_err(|e| GatewayError::payload(NAME, e))?;

        map_items(NAME, Some(&tree), Shape::List, map_tweet)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
