use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use metrics::{counter, gauge};
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::{CacheConfig, GatewayConfig};
use crate::error::{GatewayError, Result};
use crate::ingest::ensure_metrics_described;
use crate::ingest::providers::{
    github::{GithubAdapter, GithubReport},
    goodreads::{GoodreadsAdapter, GoodreadsShelf},
    instagram::{InstagramAdapter, InstagramReport},
    lastfm::{LastfmAdapter, LastfmReport},
    medium::{MediumAdapter, MediumReport},
    rescuetime::{RescuetimeAdapter, RescuetimeReport},
    setlistfm::{SetlistfmAdapter, SetlistfmReport},
    strava::{StravaAdapter, StravaReport},
    twitter::{TwitterAdapter, TwitterReport},
};
use crate::ingest::types::{CanonicalItem, SourceAdapter};
use crate::ingest::upstream::{Endpoints, Upstream};

/// Read-only after startup; cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    config: Arc<GatewayConfig>,
    upstream: Upstream,
}

impl AppState {
    pub fn new(config: GatewayConfig, endpoints: Endpoints) -> anyhow::Result<Self> {
        config.log_validation();
        Ok(Self {
            config: Arc::new(config),
            upstream: Upstream::new(endpoints)?,
        })
    }

    pub fn cache(&self) -> CacheConfig {
        self.config.cache
    }
}

/// Successful adapter output: always 201 with the item list.
type Created = (StatusCode, Json<Vec<CanonicalItem>>);

pub fn router(state: AppState) -> Router {
    ensure_metrics_described();
    let cache = state.cache();
    gauge!("gateway_cache_max_age_secs").set(cache.max_age_secs as f64);
    let cache_control = HeaderValue::from_str(&cache.header_value())
        .unwrap_or_else(|_| HeaderValue::from_static("public, max-age=300, s-maxage=600"));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/medium/{user}/{type}", get(medium))
        .route("/github/{user}/{type}", get(github))
        .route("/twitter/{user}/{type}", get(twitter))
        .route("/lastfm/{user}/{type}", get(lastfm))
        .route("/instagram/{user}/{type}", get(instagram))
        .route("/goodreads/{user}/{shelf}", get(goodreads))
        .route("/setlistfm/{user}", get(setlistfm))
        .route("/strava/activities", get(strava_activities))
        .route("/strava/stats", get(strava_stats))
        .route("/rescuetime/daily", get(rescuetime_daily))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            cache_control,
        ))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Config-driven router with the real upstream hosts.
pub fn create_router(config: GatewayConfig) -> anyhow::Result<Router> {
    let state = AppState::new(config, Endpoints::default())?;
    Ok(router(state))
}

fn record_failure<T>(provider: &'static str, res: Result<T>) -> Result<T> {
    if let Err(e) = &res {
        tracing::warn!(provider, kind = e.kind(), error = %e, "adapter failed");
        counter!("upstream_errors_total", "source" => provider, "kind" => e.kind()).increment(1);
    }
    res
}

async fn run<A: SourceAdapter>(
    adapter: Result<A>,
    subject: &str,
    report: A::Report,
) -> Result<Created> {
    let adapter = adapter?;
    let res = adapter.fetch(subject, report).await;
    let items = record_failure(adapter.name(), res)?;
    Ok((StatusCode::CREATED, Json(items)))
}

/// Credential errors are logged too, they surface on first use.
fn adapter<A>(built: Result<A>) -> Result<A> {
    if let Err(e @ GatewayError::MissingCredentials { .. }) = &built {
        tracing::warn!(kind = e.kind(), error = %e, "route hit without credentials");
    }
    built
}

async fn medium(
    State(s): State<AppState>,
    Path((user, kind)): Path<(String, String)>,
) -> Result<Created> {
    let a = Ok(MediumAdapter::new(s.upstream.clone()));
    run(a, &user, MediumReport::parse(&kind)).await
}

async fn github(
    State(s): State<AppState>,
    Path((user, kind)): Path<(String, String)>,
) -> Result<Created> {
    let a = adapter(GithubAdapter::from_config(&s.upstream, &s.config));
    run(a, &user, GithubReport::parse(&kind)).await
}

async fn twitter(
    State(s): State<AppState>,
    Path((user, kind)): Path<(String, String)>,
) -> Result<Created> {
    let a = adapter(TwitterAdapter::from_config(&s.upstream, &s.config));
    run(a, &user, TwitterReport::parse(&kind)).await
}

async fn lastfm(
    State(s): State<AppState>,
    Path((user, kind)): Path<(String, String)>,
) -> Result<Created> {
    let a = adapter(LastfmAdapter::from_config(&s.upstream, &s.config));
    run(a, &user, LastfmReport::parse(&kind)).await
}

async fn instagram(
    State(s): State<AppState>,
    Path((user, kind)): Path<(String, String)>,
) -> Result<Created> {
    let a = Ok(InstagramAdapter::new(s.upstream.clone()));
    run(a, &user, InstagramReport::parse(&kind)).await
}

async fn goodreads(
    State(s): State<AppState>,
    Path((user, shelf)): Path<(String, String)>,
) -> Result<Created> {
    let a = adapter(GoodreadsAdapter::from_config(&s.upstream, &s.config));
    run(a, &user, GoodreadsShelf::parse(&shelf)).await
}

async fn setlistfm(State(s): State<AppState>, Path(user): Path<String>) -> Result<Created> {
    let a = adapter(SetlistfmAdapter::from_config(&s.upstream, &s.config));
    run(a, &user, SetlistfmReport::Attended).await
}

async fn strava_activities(State(s): State<AppState>) -> Result<Created> {
    let a = adapter(StravaAdapter::from_config(&s.upstream, &s.config));
    run(a, "athlete", StravaReport::Activities).await
}

/// Raw upstream totals, deliberately not canonical items.
async fn strava_stats(State(s): State<AppState>) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let a = adapter(StravaAdapter::from_config(&s.upstream, &s.config))?;
    let stats = record_failure("strava", a.stats().await)?;
    Ok((StatusCode::CREATED, Json(stats)))
}

async fn rescuetime_daily(State(s): State<AppState>) -> Result<Created> {
    let a = adapter(RescuetimeAdapter::from_config(&s.upstream, &s.config));
    run(a, "self", RescuetimeReport::Daily).await
}
