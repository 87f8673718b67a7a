use std::sync::Arc;
use std::time::Duration;

use actix_web::{http::StatusCode, test, web, App};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use survive_base::api::{routes, AppState, Sources};
use survive_base::collector::CollectPlan;
use survive_base::model::{AppId, Categories, GameRecord, Price, Reviews};
use survive_base::sources::{
    DetailSource, SourceError, SpyGame, StoreGame, TagSource, TokioPacer,
};
use survive_base::store::{CacheStore, Fallback};
use tempfile::TempDir;

const SECRET: &str = "cron-test-secret";

struct FakeSpy {
    fail: bool,
}

#[async_trait]
impl TagSource for FakeSpy {
    async fn fetch_by_tag(&self, tag: &str) -> Result<Vec<SpyGame>, SourceError> {
        if self.fail {
            return Err(SourceError::Status {
                provider: "fake",
                status: 503,
                url: tag.to_string(),
            });
        }
        Ok(vec![SpyGame {
            app_id: 900,
            name: "Fresh Survival".into(),
            positive: 75,
            negative: 25,
            owners: "20,000 .. 50,000".into(),
            average_playtime: 120,
            tags: vec!["Crafting".into()],
        }])
    }
}

struct FakeStore;

#[async_trait]
impl DetailSource for FakeStore {
    async fn fetch_detail(&self, app_id: AppId) -> Result<Option<StoreGame>, SourceError> {
        Ok(Some(StoreGame {
            app_id,
            name: "Fresh Survival".into(),
            description: "new".into(),
            header_image: String::new(),
            screenshots: vec![],
            price: Price::new(1_100_000, 1_100_000, 0, false),
            release_date: "Mar 1, 2026".into(),
            genres: vec!["Indie".into()],
            categories: Categories {
                singleplayer: true,
                multiplayer: false,
                coop: false,
            },
        }))
    }
}

fn record(appid: AppId, name: &str, tags: &[&str], positive: u64, negative: u64) -> GameRecord {
    GameRecord {
        appid,
        name: name.into(),
        description: String::new(),
        header_image: String::new(),
        screenshots: vec![],
        price: Price::new(2_000_000, 2_000_000, 0, false),
        reviews: Reviews::new(positive, negative),
        release_date: String::new(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        genres: vec![],
        categories: Categories::default(),
        owners: String::new(),
        playtime: 0,
        updated_at: Utc::now(),
    }
}

fn seed() -> Vec<GameRecord> {
    vec![
        record(1, "Valheim", &["Survival", "Crafting", "Co-op"], 95, 5),
        record(2, "Raft", &["Survival", "Crafting"], 90, 10),
        record(3, "Forest", &["Survival", "Horror"], 80, 20),
        record(4, "Racer", &["Racing"], 50, 50),
    ]
}

struct Fixture {
    _dir: TempDir,
    state: web::Data<AppState>,
}

async fn fixture(secret: Option<&str>, seeded: bool, spy_fails: bool) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(dir.path().join("games.json")).with_fallback(Fallback::Disabled);
    if seeded {
        cache.write(&seed()).await.unwrap();
    }
    let plan = CollectPlan {
        tags: vec!["Survival".into()],
        max_games: None,
        spy_delay: Duration::ZERO,
        store_delay: Duration::ZERO,
    };
    let sources = Sources {
        spy: Arc::new(FakeSpy { fail: spy_fails }),
        store: Arc::new(FakeStore),
        pacer: Arc::new(TokioPacer),
    };
    let state = web::Data::new(AppState::new(
        cache,
        plan,
        secret.map(str::to_string),
        sources,
    ));
    Fixture { _dir: dir, state }
}

macro_rules! app {
    ($fx:expr) => {
        test::init_service(
            App::new()
                .app_data($fx.state.clone())
                .configure(routes::configure_routes),
        )
        .await
    };
}

fn ids(body: &Value) -> Vec<u64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|g| g["appid"].as_u64().unwrap())
        .collect()
}

#[actix_web::test]
async fn health_reports_cache_state() {
    let fx = fixture(None, true, false).await;
    let app = app!(fx);
    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["cache"]["exists"], true);
    assert_eq!(body["cache"]["recordCount"], 4);
}

#[actix_web::test]
async fn lists_full_catalog_as_array() {
    let fx = fixture(None, true, false).await;
    let app = app!(fx);
    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/games").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(ids(&body), vec![1, 2, 3, 4]);
    assert_eq!(body[0]["reviews"]["score"], 95);
    assert_eq!(body[0]["headerImage"], "");
}

#[actix_web::test]
async fn filters_and_sorts_catalog() {
    let fx = fixture(None, true, false).await;
    let app = app!(fx);
    let req = test::TestRequest::get()
        .uri("/api/games?tags=crafting&sort=rating")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(&body), vec![1, 2]);

    let req = test::TestRequest::get().uri("/api/games?search=for").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(&body), vec![3]);
}

#[actix_web::test]
async fn rejects_unknown_sort() {
    let fx = fixture(None, true, false).await;
    let app = app!(fx);
    let req = test::TestRequest::get().uri("/api/games?sort=random").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("random"));
}

#[actix_web::test]
async fn empty_cache_without_fallback_is_an_empty_list() {
    let fx = fixture(None, false, false).await;
    let app = app!(fx);
    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/games").to_request(),
    )
    .await;
    assert_eq!(body, serde_json::json!([]));
}

#[actix_web::test]
async fn game_by_id_and_missing_game() {
    let fx = fixture(None, true, false).await;
    let app = app!(fx);
    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/games/2").to_request(),
    )
    .await;
    assert_eq!(body["name"], "Raft");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/games/999").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "game 999 not found");
}

#[actix_web::test]
async fn unparseable_id_and_limit_answer_json_400() {
    let fx = fixture(None, true, false).await;
    let app = app!(fx);
    for uri in [
        "/api/games/abc",
        "/api/games/abc/similar",
        "/api/games/1/similar?limit=-1",
        "/api/tags?limit=x",
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string(), "{uri}");
    }
}

#[actix_web::test]
async fn similar_games_exclude_target() {
    let fx = fixture(None, true, false).await;
    let app = app!(fx);
    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/games/1/similar?limit=5")
            .to_request(),
    )
    .await;
    assert_eq!(ids(&body), vec![2, 3]);
    assert!(body[0]["similarity"].as_f64().unwrap() > body[1]["similarity"].as_f64().unwrap());
    assert_eq!(body[0]["similarityLabel"], "Similar");
}

#[actix_web::test]
async fn tag_counts() {
    let fx = fixture(None, true, false).await;
    let app = app!(fx);
    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/tags?limit=2").to_request(),
    )
    .await;
    assert_eq!(
        body,
        serde_json::json!([
            {"name": "Survival", "count": 3},
            {"name": "Crafting", "count": 2}
        ])
    );
}

#[actix_web::test]
async fn cron_requires_configured_secret() {
    let fx = fixture(None, true, false).await;
    let app = app!(fx);
    let req = test::TestRequest::post()
        .uri("/api/cron/collect-data")
        .insert_header(("Authorization", format!("Bearer {SECRET}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn cron_rejects_bad_token() {
    let fx = fixture(Some(SECRET), true, false).await;
    let app = app!(fx);
    for header in [None, Some("Bearer wrong"), Some(SECRET)] {
        let mut req = test::TestRequest::get().uri("/api/cron/collect-data");
        if let Some(h) = header {
            req = req.insert_header(("Authorization", h));
        }
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }
    // Nothing was collected.
    assert_eq!(fx.state.cache.read().await.len(), 4);
}

#[actix_web::test]
async fn cron_runs_collection_and_rewrites_cache() {
    let fx = fixture(Some(SECRET), true, false).await;
    let app = app!(fx);
    let req = test::TestRequest::get()
        .uri("/api/cron/collect-data")
        .insert_header(("Authorization", format!("Bearer {SECRET}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["summary"]["recordsWritten"], 1);
    assert!(body["timestamp"].is_string());

    let records = fx.state.cache.read().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].appid, 900);
    assert_eq!(records[0].tags, vec!["Survival", "Crafting", "Indie"]);
    assert_eq!(records[0].reviews.score(), 75);
}

#[actix_web::test]
async fn cron_failure_returns_500_and_keeps_cache() {
    let fx = fixture(Some(SECRET), true, true).await;
    let app = app!(fx);
    let req = test::TestRequest::post()
        .uri("/api/cron/collect-data")
        .insert_header(("Authorization", format!("Bearer {SECRET}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Data collection failed");
    assert!(body["error"].is_string());
    assert_eq!(fx.state.cache.read().await.len(), 4);
}
