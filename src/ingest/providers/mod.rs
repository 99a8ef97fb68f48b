// src/ingest/providers/mod.rs
pub mod github;
pub mod goodreads;
pub mod instagram;
pub mod lastfm;
pub mod medium;
pub mod rescuetime;
pub mod setlistfm;
pub mod strava;
pub mod twitter;

use reqwest::Url;

use crate::error::{GatewayError, Result};

/// `base` + path segments, each segment percent-encoded on its own so
/// subject ids can never escape their slot in the path.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| GatewayError::Config(format!("invalid base url {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| GatewayError::Config(format!("base url {base} cannot take a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
