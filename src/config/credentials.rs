// src/config/credentials.rs
use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{GatewayError, Result};

/// Prefix marking a credential that lives in the environment, e.g. `ENV:GITHUB_TOKEN`.
pub const ENV_PREFIX: &str = "ENV:";

fn default_max_age_secs() -> u64 {
    300
}
fn default_s_maxage_secs() -> u64 {
    600
}

/// Shared surface of every per-source credential block.
pub trait CredentialBlock {
    /// Provider name used in errors and logs.
    const PROVIDER: &'static str;

    /// All required secrets are present and non-blank.
    fn is_complete(&self) -> bool;

    /// Swap `ENV:NAME` placeholders for the variable's value.
    fn resolve_env(&mut self) -> anyhow::Result<()>;
}

/// Look up a block, treating both "absent" and "present but blank" as missing.
pub fn require<T: CredentialBlock>(block: Option<&T>) -> Result<&T> {
    match block {
        Some(b) if b.is_complete() => Ok(b),
        _ => Err(GatewayError::MissingCredentials {
            provider: T::PROVIDER,
        }),
    }
}

fn resolve_secret(value: &mut String) -> anyhow::Result<()> {
    if let Some(name) = value.trim().strip_prefix(ENV_PREFIX) {
        let name = name.trim();
        *value = env::var(name).map_err(|_| anyhow::anyhow!("Missing {name} env var"))?;
    }
    Ok(())
}

fn filled(s: &str) -> bool {
    !s.trim().is_empty()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubCredentials {
    pub token: String,
}

impl CredentialBlock for GithubCredentials {
    const PROVIDER: &'static str = "github";
    fn is_complete(&self) -> bool {
        filled(&self.token)
    }
    fn resolve_env(&mut self) -> anyhow::Result<()> {
        resolve_secret(&mut self.token)
    }
}

/// App-only consumer credentials; exchanged for a bearer token per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwitterCredentials {
    pub key: String,
    pub secret: String,
}

impl CredentialBlock for TwitterCredentials {
    const PROVIDER: &'static str = "twitter";
    fn is_complete(&self) -> bool {
        filled(&self.key) && filled(&self.secret)
    }
    fn resolve_env(&mut self) -> anyhow::Result<()> {
        resolve_secret(&mut self.key)?;
        resolve_secret(&mut self.secret)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastfmCredentials {
    pub apikey: String,
}

impl CredentialBlock for LastfmCredentials {
    const PROVIDER: &'static str = "lastfm";
    fn is_complete(&self) -> bool {
        filled(&self.apikey)
    }
    fn resolve_env(&mut self) -> anyhow::Result<()> {
        resolve_secret(&mut self.apikey)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodreadsCredentials {
    pub key: String,
}

impl CredentialBlock for GoodreadsCredentials {
    const PROVIDER: &'static str = "goodreads";
    fn is_complete(&self) -> bool {
        filled(&self.key)
    }
    fn resolve_env(&mut self) -> anyhow::Result<()> {
        resolve_secret(&mut self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetlistfmCredentials {
    pub apikey: String,
}

impl CredentialBlock for SetlistfmCredentials {
    const PROVIDER: &'static str = "setlistfm";
    fn is_complete(&self) -> bool {
        filled(&self.apikey)
    }
    fn resolve_env(&mut self) -> anyhow::Result<()> {
        resolve_secret(&mut self.apikey)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StravaCredentials {
    pub access_token: String,
    /// Thumbnail URL template; `{id}` is replaced by the activity id.
    #[serde(default)]
    pub thumbnail_template: Option<String>,
}

impl CredentialBlock for StravaCredentials {
    const PROVIDER: &'static str = "strava";
    fn is_complete(&self) -> bool {
        filled(&self.access_token)
    }
    fn resolve_env(&mut self) -> anyhow::Result<()> {
        resolve_secret(&mut self.access_token)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescuetimeCredentials {
    pub key: String,
}

impl CredentialBlock for RescuetimeCredentials {
    const PROVIDER: &'static str = "rescuetime";
    fn is_complete(&self) -> bool {
        filled(&self.key)
    }
    fn resolve_env(&mut self) -> anyhow::Result<()> {
        resolve_secret(&mut self.key)
    }
}

/// Lifetimes advertised to intermediaries through `Cache-Control`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
    #[serde(default = "default_s_maxage_secs")]
    pub s_maxage_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_secs: default_max_age_secs(),
            s_maxage_secs: default_s_maxage_secs(),
        }
    }
}

impl CacheConfig {
    pub fn header_value(&self) -> String {
        format!(
            "public, max-age={}, s-maxage={}",
            self.max_age_secs, self.s_maxage_secs
        )
    }
}
