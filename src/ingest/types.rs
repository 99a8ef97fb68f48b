// src/ingest/types.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The one record shape every source converges to.
///
/// `title` and `url` always serialize (possibly as ""); the optional keys are
/// omitted entirely when absent rather than written as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<DataPoint>>,
}

impl CanonicalItem {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_sub(mut self, sub: Option<String>) -> Self {
        self.sub = sub.filter(|s| !s.is_empty());
        self
    }

    pub fn with_image(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url.filter(|s| !s.is_empty());
        self
    }

    pub fn with_data(mut self, data: Vec<DataPoint>) -> Self {
        self.data = Some(data);
        self
    }
}

/// One entry of a breakdown series (time-tracking only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String,
    pub value: f64,
}

/// A third-party service reshaped into canonical items.
///
/// `Report` is the closed set of views the source offers; the router parses
/// the path segment into it before the adapter ever runs.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    type Report: Send + Sync;

    async fn fetch(&self, subject: &str, report: Self::Report) -> Result<Vec<CanonicalItem>>;
    fn name(&self) -> &'static str;
}
