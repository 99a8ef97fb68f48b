// tests/api_http.rs
//
// HTTP-level tests for the public Router without opening a listening socket
// for the gateway itself. Upstreams are served by a local mockito server and
// the router is driven via tower::ServiceExt::oneshot.

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use mockito::{Matcher, ServerGuard};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use social_feed_gateway::config::{
    GatewayConfig, GithubCredentials, GoodreadsCredentials, LastfmCredentials,
    RescuetimeCredentials, StravaCredentials, TwitterCredentials,
};
use social_feed_gateway::ingest::unwrap::GUARD_PREFIX;
use social_feed_gateway::ingest::upstream::Endpoints;
use social_feed_gateway::{api, AppState};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

const ARTIST_CHART: &str = include_str!("fixtures/lastfm_weekly_artist_chart.json");
const RESCUETIME_DAILY: &str = include_str!("fixtures/rescuetime_daily.json");
const GOODREADS_SHELF: &str = include_str!("fixtures/goodreads_shelf.xml");

fn full_config() -> GatewayConfig {
    GatewayConfig {
        github: Some(GithubCredentials {
            token: "gh-token".into(),
        }),
        twitter: Some(TwitterCredentials {
            key: "ck".into(),
            secret: "cs".into(),
        }),
        lastfm: Some(LastfmCredentials {
            apikey: "lfm-key".into(),
        }),
        goodreads: Some(GoodreadsCredentials {
            key: "gr-key".into(),
        }),
        strava: Some(StravaCredentials {
            access_token: "st-token".into(),
            thumbnail_template: None,
        }),
        rescuetime: Some(RescuetimeCredentials { key: "rt".into() }),
        ..GatewayConfig::default()
    }
}

/// Build the same Router the binary uses, pointed at the mock server.
fn test_router(server: &ServerGuard, cfg: GatewayConfig) -> Router {
    let state = AppState::new(cfg, Endpoints::all(&server.url())).expect("app state");
    api::router(state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, headers, v)
}

#[tokio::test]
async fn health_returns_200_and_ok_body() {
    let server = mockito::Server::new_async().await;
    let app = test_router(&server, GatewayConfig::default());

    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");
    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    assert_eq!(String::from_utf8_lossy(&bytes), "ok");
}

#[tokio::test]
async fn lastfm_weekly_artist_chart_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    let upstream = server
        .mock("GET", "/2.0/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("method".into(), "user.getweeklyartistchart".into()),
            Matcher::UrlEncoded("user".into(), "alice".into()),
            Matcher::UrlEncoded("api_key".into(), "lfm-key".into()),
            Matcher::UrlEncoded("format".into(), "json".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ARTIST_CHART)
        .create_async()
        .await;

    let app = test_router(&server, full_config());
    let (status, headers, v) = get(app, "/lastfm/alice/getWeeklyArtistChart").await;
    upstream.assert_async().await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        headers.get("cache-control").and_then(|h| h.to_str().ok()),
        Some("public, max-age=300, s-maxage=600")
    );

    let items = v.as_array().expect("array body");
    assert_eq!(items.len(), 3);
    let expected = [
        ("Low", "https://www.last.fm/music/Low"),
        ("Slint", "https://www.last.fm/music/Slint"),
        ("Duster", "https://www.last.fm/music/Duster"),
    ];
    for (item, (title, url)) in items.iter().zip(expected) {
        assert_eq!(item, &json!({ "title": title, "url": url }));
        assert!(item.get("sub").is_none());
        assert!(item.get("image_url").is_none());
    }
}

#[tokio::test]
async fn lastfm_unknown_report_is_empty_without_upstream_call() {
    let mut server = mockito::Server::new_async().await;
    let upstream = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let app = test_router(&server, full_config());
    let (status, _, v) = get(app, "/lastfm/alice/getLovedTracks").await;
    upstream.assert_async().await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(v, json!([]));
}

#[tokio::test]
async fn missing_credentials_answer_500_with_kind() {
    let server = mockito::Server::new_async().await;
    let app = test_router(&server, GatewayConfig::default());

    let (status, _, v) = get(app, "/github/octo/repos").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(v["error"], "missing_credentials");
    assert_eq!(v["source"], "github");
}

#[tokio::test]
async fn upstream_failure_answers_502_with_kind() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/users/octo/repos")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let app = test_router(&server, full_config());
    let (status, headers, v) = get(app, "/github/octo/repos").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(v["error"], "upstream_status");
    assert_eq!(v["source"], "github");
    assert!(v["message"].as_str().unwrap().contains("503"));
    // the cache directive is global, errors included
    assert!(headers.contains_key("cache-control"));
}

#[tokio::test]
async fn transport_failure_never_echoes_the_api_key() {
    // nothing listens on port 9; the key travels in the query string
    let mut cfg = full_config();
    cfg.lastfm = Some(LastfmCredentials {
        apikey: "SECRET-LFM-KEY".into(),
    });
    let state = AppState::new(cfg, Endpoints::all("http://127.0.0.1:9")).expect("app state");
    let app = api::router(state);

    let (status, _, v) = get(app, "/lastfm/alice/getRecentTracks").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(v["error"], "upstream_transport");
    assert_eq!(v["source"], "lastfm");
    assert!(!v.to_string().contains("SECRET-LFM-KEY"), "{v}");
}

#[tokio::test]
async fn malformed_payload_answers_502_payload_shape() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/2.0/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"weeklyartistchart":{"artist":[{"url":"no name"}]}}"#)
        .create_async()
        .await;

    let app = test_router(&server, full_config());
    let (status, _, v) = get(app, "/lastfm/alice/getWeeklyArtistChart").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(v["error"], "payload_shape");
}

#[tokio::test]
async fn twitter_favorites_link_each_item_to_its_author() {
    let mut server = mockito::Server::new_async().await;
    let _token = server
        .mock("POST", "/oauth2/token")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"token_type":"bearer","access_token":"app-token"}"#)
        .create_async()
        .await;
    let _favs = server
        .mock("GET", "/1.1/favorites/list.json")
        .match_query(Matcher::UrlEncoded("screen_name".into(), "alice".into()))
        .with_status(200)
        .with_body(r#"[{"id_str":"5","text":"hi","user":{"screen_name":"bob"}}]"#)
        .create_async()
        .await;

    let app = test_router(&server, full_config());
    let (status, _, v) = get(app, "/twitter/alice/favorites").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(v, json!([{ "title": "hi", "url": "https://twitter.com/bob/status/5" }]));
}

#[tokio::test]
async fn medium_guarded_profile_through_router() {
    let mut server = mockito::Server::new_async().await;
    let body = format!(
        "{GUARD_PREFIX}{}",
        r#"{"payload":{"references":{"Post":{"p1":{"title":"Hello","uniqueSlug":"hello-p1"}}}}}"#
    );
    let _m = server
        .mock("GET", "/@alice/latest")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let app = test_router(&server, GatewayConfig::default());
    let (status, _, v) = get(app, "/medium/alice/latest").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        v,
        json!([{ "title": "Hello", "url": "https://medium.com/@alice/hello-p1" }])
    );
}

#[tokio::test]
async fn rescuetime_daily_emits_percentage_series() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/anapi/daily_summary_feed")
        .match_query(Matcher::UrlEncoded("key".into(), "rt".into()))
        .with_status(200)
        .with_body(RESCUETIME_DAILY)
        .create_async()
        .await;

    let app = test_router(&server, full_config());
    let (status, _, v) = get(app, "/rescuetime/daily").await;
    assert_eq!(status, StatusCode::CREATED);

    let days = v.as_array().unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0]["title"], "Mon 02 Jan 2017");
    assert_eq!(days[0]["url"], "");
    let series = days[0]["data"].as_array().unwrap();
    let value = |label: &str| {
        series
            .iter()
            .find(|p| p["label"] == label)
            .map(|p| p["value"].as_f64().unwrap())
            .unwrap()
    };
    assert_eq!(value("software development hours"), 100.0);
    assert_eq!(value("social networking hours"), 50.0);
    assert_eq!(value("communication and scheduling hours"), 13.0);

    // the all-zero day still produces a full, all-zero series
    let zero = days[1]["data"].as_array().unwrap();
    assert!(zero.iter().all(|p| p["value"].as_f64() == Some(0.0)));
}

#[tokio::test]
async fn strava_stats_are_passed_through() {
    let mut server = mockito::Server::new_async().await;
    let _athlete = server
        .mock("GET", "/api/v3/athlete")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"id":99}"#)
        .create_async()
        .await;
    let _stats = server
        .mock("GET", "/api/v3/athletes/99/stats")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"recent_run_totals":{"count":2,"distance":8000.0}}"#)
        .create_async()
        .await;

    let app = test_router(&server, full_config());
    let (status, _, v) = get(app, "/strava/stats").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(v, json!({ "recent_run_totals": { "count": 2, "distance": 8000.0 } }));
}

#[tokio::test]
async fn goodreads_xml_shelf_through_router() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/review/list/alice.xml")
        .match_query(Matcher::UrlEncoded("shelf".into(), "read".into()))
        .with_status(200)
        .with_body(GOODREADS_SHELF)
        .create_async()
        .await;

    let app = test_router(&server, full_config());
    let (status, _, v) = get(app, "/goodreads/alice/read").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        v,
        json!([{
            "title": "Dune (Dune, #1) by Frank Herbert",
            "sub": "rated 4/5",
            "url": "https://www.goodreads.com/book/show/234225.Dune",
            "image_url": "https://images.gr-assets.com/books/1434908555m/234225.jpg"
        }])
    );
}

#[tokio::test]
async fn every_route_caps_items_at_ten() {
    let mut server = mockito::Server::new_async().await;
    let repos: Vec<Json> = (0..30)
        .map(|i| json!({ "full_name": format!("octo/r{i}"), "html_url": format!("https://github.com/octo/r{i}") }))
        .collect();
    let _m = server
        .mock("GET", "/users/octo/repos")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(Json::Array(repos).to_string())
        .create_async()
        .await;

    let app = test_router(&server, full_config());
    let (status, _, v) = get(app, "/github/octo/whatever").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(v.as_array().unwrap().len(), 10);
    assert_eq!(v[0]["title"], "octo/r0");
}
