//! Social feed gateway binary entrypoint.
//! Loads configuration, wires the adapters behind the Axum router and hands
//! it to the Shuttle runtime.

use shuttle_axum::ShuttleAxum;
use shuttle_runtime::SecretStore;

use social_feed_gateway::config::{self, ENV_CONFIG};
use social_feed_gateway::metrics::Metrics;

#[shuttle_runtime::main]
async fn axum(#[shuttle_runtime::Secrets] secrets: SecretStore) -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    social_feed_gateway::init_tracing();

    // Remote-managed config (deployment secret) first, local files as fallback.
    let cfg = config::load_default(secrets.get(ENV_CONFIG))?;

    let metrics = Metrics::init(cfg.cache.max_age_secs)?;
    let router = social_feed_gateway::create_router(cfg)?.merge(metrics.router());

    Ok(router.into())
}
