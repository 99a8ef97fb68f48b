// src/config/mod.rs
//! Gateway configuration: one optional credential block per source plus the
//! cache directive. Built once at startup and handed to adapters by value.

pub mod credentials;
pub mod load;

use serde::{Deserialize, Serialize};

pub use credentials::{
    require, CacheConfig, CredentialBlock, GithubCredentials, GoodreadsCredentials,
    LastfmCredentials, RescuetimeCredentials, SetlistfmCredentials, StravaCredentials,
    TwitterCredentials,
};
pub use load::{load_default, load_from, ENV_CONFIG, ENV_CONFIG_PATH};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub github: Option<GithubCredentials>,
    pub twitter: Option<TwitterCredentials>,
    pub lastfm: Option<LastfmCredentials>,
    pub goodreads: Option<GoodreadsCredentials>,
    pub setlistfm: Option<SetlistfmCredentials>,
    pub strava: Option<StravaCredentials>,
    pub rescuetime: Option<RescuetimeCredentials>,
    pub cache: CacheConfig,
}

impl GatewayConfig {
    /// Resolve `ENV:NAME` placeholders in every present block.
    pub fn resolve_env(&mut self) -> anyhow::Result<()> {
        fn one<T: CredentialBlock>(b: &mut Option<T>) -> anyhow::Result<()> {
            match b {
                Some(b) => b.resolve_env(),
                None => Ok(()),
            }
        }
        one(&mut self.github)?;
        one(&mut self.twitter)?;
        one(&mut self.lastfm)?;
        one(&mut self.goodreads)?;
        one(&mut self.setlistfm)?;
        one(&mut self.strava)?;
        one(&mut self.rescuetime)?;
        Ok(())
    }

    /// Names of sources whose credential block is absent or blank.
    pub fn missing_blocks(&self) -> Vec<&'static str> {
        fn gap<T: CredentialBlock>(b: Option<&T>) -> Option<&'static str> {
            require(b).err().map(|_| T::PROVIDER)
        }
        [
            gap(self.github.as_ref()),
            gap(self.twitter.as_ref()),
            gap(self.lastfm.as_ref()),
            gap(self.goodreads.as_ref()),
            gap(self.setlistfm.as_ref()),
            gap(self.strava.as_ref()),
            gap(self.rescuetime.as_ref()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Log (never the secrets) which sources will fail on first use.
    pub fn log_validation(&self) {
        let missing = self.missing_blocks();
        if missing.is_empty() {
            tracing::info!("all source credentials configured");
        } else {
            tracing::warn!(?missing, "sources without credentials will answer 500");
        }
    }
}
