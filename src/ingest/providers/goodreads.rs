// src/ingest/providers/goodreads.rs
//! Book shelves. The only XML source: the response is turned into a tree by
//! the XML unwrapper, so every field is reached through the extractor.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{require, GatewayConfig, GoodreadsCredentials};
use crate::error::{GatewayError, Result};
use crate::ingest::extract::{
    lookup, Path,
    Segment::{Index, Key},
};
use crate::ingest::types::{CanonicalItem, SourceAdapter};
use crate::ingest::upstream::Upstream;
use crate::ingest::{map_items, unwrap, Shape, MAX_ITEMS};

use super::endpoint;

const NAME: &str = "goodreads";
const REVIEWS: Path = &[
    Key("GoodreadsResponse"),
    Key("reviews"),
    Index(0),
    Key("review"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoodreadsShelf {
    Read,
    CurrentlyReading,
    ToRead,
    /// Custom or misspelled shelf; answers with an empty list.
    Unsupported,
}

impl GoodreadsShelf {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "read" => Self::Read,
            "currently-reading" => Self::CurrentlyReading,
            "to-read" => Self::ToRead,
            _ => Self::Unsupported,
        }
    }

    fn as_param(self) -> Option<&'static str> {
        match self {
            Self::Read => Some("read"),
            Self::CurrentlyReading => Some("currently-reading"),
            Self::ToRead => Some("to-read"),
            Self::Unsupported => None,
        }
    }
}

/// An element as the XML tree shows it: an object when it has attributes
/// or children, a bare string otherwise (including an empty element).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Xml<T> {
    Element(T),
    Text(String),
}

impl<T> Xml<T> {
    fn element(&self) -> Option<&T> {
        match self {
            Self::Element(e) => Some(e),
            Self::Text(_) => None,
        }
    }
}

/// Text-only element that may carry attributes (`<image_url nophoto="false">`).
#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "_", default)]
    text: String,
}

type Text = Vec<Xml<TextNode>>;

/// Trimmed text of the first occurrence, if any.
fn first_text(nodes: &Text) -> Option<String> {
    let text = match nodes.first()? {
        Xml::Element(n) => n.text.as_str(),
        Xml::Text(s) => s.as_str(),
    }
    .trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn first<T>(nodes: &[Xml<T>]) -> Option<&T> {
    nodes.first().and_then(Xml::element)
}

#[derive(Debug, Deserialize)]
struct Review {
    #[serde(default)]
    book: Vec<Xml<Book>>,
    #[serde(default)]
    rating: Text,
}

#[derive(Debug, Deserialize)]
struct Book {
    #[serde(default)]
    title: Text,
    #[serde(default)]
    link: Text,
    #[serde(default)]
    image_url: Text,
    #[serde(default)]
    authors: Vec<Xml<Authors>>,
}

#[derive(Debug, Deserialize)]
struct Authors {
    #[serde(default)]
    author: Vec<Xml<Author>>,
}

#[derive(Debug, Deserialize)]
struct Author {
    #[serde(default)]
    name: Text,
}

fn map_review(review: Xml<Review>, _raw: &Value) -> CanonicalItem {
    let review = review.element();
    let book = review.and_then(|r| first(&r.book));

    let title = book.and_then(|b| first_text(&b.title)).unwrap_or_default();
    let author = book
        .and_then(|b| first(&b.authors))
        .and_then(|a| first(&a.author))
        .and_then(|a| first_text(&a.name));
    let link = book.and_then(|b| first_text(&b.link)).unwrap_or_default();
    let image = book.and_then(|b| first_text(&b.image_url));
    let rating = review
        .and_then(|r| first_text(&r.rating))
        .and_then(|r| r.parse::<f64>().ok())
        .filter(|r| *r > 0.0)
        .map(|r| format!("rated {r:.0}/5"));

    let title = match author {
        Some(a) => format!("{title} by {a}"),
        None => title,
    };
    CanonicalItem::new(title, link).with_sub(rating).with_image(image)
}

pub struct GoodreadsAdapter {
    upstream: Upstream,
    key: String,
}

impl GoodreadsAdapter {
    pub fn new(upstream: Upstream, creds: &GoodreadsCredentials) -> Self {
        Self {
            upstream,
            key: creds.key.clone(),
        }
    }

    pub fn from_config(upstream: &Upstream, cfg: &GatewayConfig) -> Result<Self> {
        let creds = require(cfg.goodreads.as_ref())?;
        Ok(Self::new(upstream.clone(), creds))
    }
}

fn normalize(tree: &Value) -> Result<Vec<CanonicalItem>> {
    map_items(NAME, lookup(tree, REVIEWS), Shape::List, map_review)
}

#[async_trait]
impl SourceAdapter for GoodreadsAdapter {
    type Report = GoodreadsShelf;

    async fn fetch(&self, subject: &str, shelf: GoodreadsShelf) -> Result<Vec<CanonicalItem>> {
        let Some(shelf_param) = shelf.as_param() else {
            tracing::debug!(provider = NAME, ?shelf, "unsupported shelf; empty result");
            return Ok(Vec::new());
        };
        let file = format!("{subject}.xml");
        let url = endpoint(
            &self.upstream.endpoints.goodreads,
            &["review", "list", file.as_str()],
        )?;
        tracing::debug!(provider = NAME, subject, shelf = shelf_param, "fetching shelf");

        let per_page = MAX_ITEMS.to_string();
        let req = self.upstream.http().get(url).query(&[
            ("key", self.key.as_str()),
            ("v", "2"),
            ("shelf", shelf_param),
            ("per_page", per_page.as_str()),
        ]);
        let body = self.upstream.fetch_text(NAME, req).await?;
        let tree = unwrap::xml_tree(&body).map_err(|e| GatewayError::payload(NAME, e))?;

        normalize(&tree)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
