use reqwest::Client;
use reviewlens_core::sentiment::SentimentAnalyzer;
use reviewlens_core::storage::{save_snapshot, ReviewStore, StoreOptions};
use reviewlens_core::Review;
use reviewlens_server::api::create_router;
use reviewlens_server::api::handlers::AppState;
use std::sync::Arc;
use tempfile::TempDir;

async fn spawn_app() -> (String, TempDir) {
    spawn_app_with(&[]).await
}

async fn spawn_app_with(seed: &[Review]) -> (String, TempDir) {
    let tmp_dir = TempDir::new().expect("Failed to create temp dir");
    if !seed.is_empty() {
        save_snapshot(seed, tmp_dir.path()).expect("Failed to seed reviews");
    }
    let base_url = serve(&tmp_dir).await;
    (base_url, tmp_dir)
}

async fn serve(tmp_dir: &TempDir) -> String {
    let store = ReviewStore::open(tmp_dir.path(), StoreOptions::default())
        .expect("Failed to open review store");

    let prometheus_handle =
        match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
            Ok(handle) => handle,
            Err(_) => metrics_exporter_prometheus::PrometheusBuilder::new()
                .build_recorder()
                .handle(),
        };

    let state = AppState {
        store: Arc::new(store),
        analyzer: SentimentAnalyzer::default(),
        prometheus_handle,
        start_time: std::time::Instant::now(),
    };

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn client() -> Client {
    Client::new()
}

fn review(id: &str, location: &str, body: &str, ts: &str) -> Review {
    Review::with_id(id.into(), location.into(), body.into(), ts.into())
}

fn ny_seed() -> Vec<Review> {
    vec![
        review("r1", "NY", "Terrible service.", "2024-01-02 10:00:00"),
        review("r2", "NY", "I love this place!", "2024-01-01 10:00:00"),
        review("r3", "LA", "The tacos were great", "2024-01-03 10:00:00"),
        review("r4", "NY", "The table was by the window", "2024-01-04 10:00:00"),
    ]
}

async fn get_json(url: String) -> serde_json::Value {
    let resp = client().get(url).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

fn ids(body: &serde_json::Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

async fn create_form(base_url: &str, fields: &[(&str, &str)]) -> reqwest::Response {
    client()
        .post(format!("{}/reviews", base_url))
        .form(fields)
        .send()
        .await
        .expect("Failed to create review")
}

#[tokio::test]
async fn health_returns_ok() {
    let (base_url, _tmp) = spawn_app_with(&ny_seed()).await;

    let body = get_json(format!("{}/health", base_url)).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["reviews"], 4);
}

#[tokio::test]
async fn list_all_is_insertion_order_without_sentiment() {
    let (base_url, _tmp) = spawn_app_with(&ny_seed()).await;

    let body = get_json(format!("{}/reviews", base_url)).await;
    assert_eq!(ids(&body), vec!["r1", "r2", "r3", "r4"]);
    let first = &body[0];
    assert_eq!(first["location"], "NY");
    assert_eq!(first["body"], "Terrible service.");
    assert_eq!(first["timestamp"], "2024-01-02 10:00:00");
    assert!(first.get("sentiment").is_none());
}

#[tokio::test]
async fn unknown_params_do_not_switch_to_ranking() {
    let (base_url, _tmp) = spawn_app_with(&ny_seed()).await;

    let body = get_json(format!("{}/reviews?page=2", base_url)).await;
    assert_eq!(ids(&body), vec!["r1", "r2", "r3", "r4"]);
    assert!(body[0].get("sentiment").is_none());
}

#[tokio::test]
async fn location_filter_ranks_by_sentiment() {
    let (base_url, _tmp) = spawn_app_with(&ny_seed()).await;

    let body = get_json(format!("{}/reviews?location=NY", base_url)).await;
    assert_eq!(ids(&body), vec!["r2", "r4", "r1"]);

    let love = &body[0]["sentiment"];
    assert!(love["compound"].as_f64().unwrap() > 0.0);
    let neutral = &body[1]["sentiment"];
    assert_eq!(neutral["compound"].as_f64().unwrap(), 0.0);
    assert_eq!(neutral["neutral"].as_f64().unwrap(), 1.0);
    let terrible = &body[2]["sentiment"];
    assert!(terrible["compound"].as_f64().unwrap() < 0.0);

    for r in body.as_array().unwrap() {
        let s = &r["sentiment"];
        let sum = s["negative"].as_f64().unwrap()
            + s["neutral"].as_f64().unwrap()
            + s["positive"].as_f64().unwrap();
        assert!((sum - 1.0).abs() < 1e-6);
    }
}

#[tokio::test]
async fn date_range_filter_is_inclusive() {
    let (base_url, _tmp) = spawn_app_with(&ny_seed()).await;

    let body = get_json(format!(
        "{}/reviews?start_date=2024-01-02%2010:00:00&end_date=2024-01-03%2010:00:00",
        base_url
    ))
    .await;
    assert_eq!(ids(&body), vec!["r3", "r1"]);
}

#[tokio::test]
async fn combined_filters() {
    let (base_url, _tmp) = spawn_app_with(&ny_seed()).await;

    let body = get_json(format!(
        "{}/reviews?location=NY&start_date=2024-01-02",
        base_url
    ))
    .await;
    assert_eq!(ids(&body), vec!["r4", "r1"]);
}

#[tokio::test]
async fn blank_param_selects_ranked_view_without_constraint() {
    let (base_url, _tmp) = spawn_app_with(&ny_seed()).await;

    let body = get_json(format!("{}/reviews?location=", base_url)).await;
    assert_eq!(body.as_array().unwrap().len(), 4);
    assert!(body[0].get("sentiment").is_some());
}

#[tokio::test]
async fn ranked_route_scores_everything() {
    let (base_url, _tmp) = spawn_app_with(&ny_seed()).await;

    let body = get_json(format!("{}/reviews/ranked", base_url)).await;
    let compounds: Vec<f64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["sentiment"]["compound"].as_f64().unwrap())
        .collect();
    assert_eq!(compounds.len(), 4);
    assert!(compounds.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(body[3]["id"], "r1");
}

#[tokio::test]
async fn ranked_route_with_no_match_is_empty() {
    let (base_url, _tmp) = spawn_app_with(&ny_seed()).await;

    let body = get_json(format!("{}/reviews/ranked?location=Paris", base_url)).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn create_review_form_returns_created() {
    let (base_url, _tmp) = spawn_app().await;

    let resp = create_form(&base_url, &[("Location", "LA"), ("ReviewBody", "ok")]).await;
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["location"], "LA");
    assert_eq!(body["body"], "ok");
    assert!(!body["id"].as_str().unwrap().is_empty());
    assert_eq!(body["timestamp"].as_str().unwrap().len(), 19);
    assert!(body.get("sentiment").is_none());

    let listed = get_json(format!("{}/reviews", base_url)).await;
    assert_eq!(ids(&listed), vec![body["id"].as_str().unwrap().to_string()]);
}

#[tokio::test]
async fn create_review_json() {
    let (base_url, _tmp) = spawn_app().await;

    let resp = client()
        .post(format!("{}/reviews", base_url))
        .json(&serde_json::json!({ "location": "SF", "body": "Fantastic brunch" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["location"], "SF");
}

#[tokio::test]
async fn create_twice_gives_distinct_ids() {
    let (base_url, _tmp) = spawn_app().await;

    let a: serde_json::Value = create_form(&base_url, &[("location", "LA"), ("body", "ok")])
        .await
        .json()
        .await
        .unwrap();
    let b: serde_json::Value = create_form(&base_url, &[("location", "LA"), ("body", "ok")])
        .await
        .json()
        .await
        .unwrap();
    assert_ne!(a["id"], b["id"]);
    assert!(a["timestamp"].as_str().unwrap() <= b["timestamp"].as_str().unwrap());

    let listed = get_json(format!("{}/reviews", base_url)).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn create_with_empty_location_is_rejected() {
    let (base_url, _tmp) = spawn_app_with(&ny_seed()).await;

    let resp = create_form(&base_url, &[("Location", ""), ("ReviewBody", "great")]).await;
    assert_eq!(resp.status(), 400);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));
    assert_eq!(
        resp.text().await.unwrap(),
        "Location and ReviewBody are required fields"
    );

    let listed = get_json(format!("{}/reviews", base_url)).await;
    assert_eq!(listed.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn create_with_missing_fields_is_rejected() {
    let (base_url, _tmp) = spawn_app().await;

    let resp = create_form(&base_url, &[("Location", "NY")]).await;
    assert_eq!(resp.status(), 400);

    let resp = client()
        .post(format!("{}/reviews", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn create_with_malformed_json_is_rejected() {
    let (base_url, _tmp) = spawn_app().await;

    let resp = client()
        .post(format!("{}/reviews", base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(resp.text().await.unwrap().starts_with("Malformed JSON body"));
}

#[tokio::test]
async fn created_reviews_survive_restart() {
    let (base_url, tmp) = spawn_app().await;

    let created: serde_json::Value = create_form(&base_url, &[("location", "NY"), ("body", "good")])
        .await
        .json()
        .await
        .unwrap();

    // Second server over the same data directory replays the WAL.
    let restarted = serve(&tmp).await;
    let listed = get_json(format!("{}/reviews", restarted)).await;
    assert_eq!(listed[0], created);
}

#[tokio::test]
async fn compact_endpoint_rewrites_snapshot() {
    let (base_url, tmp) = spawn_app().await;
    create_form(&base_url, &[("location", "NY"), ("body", "good")]).await;

    let resp = client()
        .post(format!("{}/admin/compact", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["reviews"], 1);

    let health = get_json(format!("{}/health", base_url)).await;
    assert_eq!(health["wal_size_bytes"], 0);
    let csv = std::fs::read_to_string(tmp.path().join("reviews.csv")).unwrap();
    assert!(csv.starts_with("ReviewId,Location,ReviewBody,Timestamp"));
    assert!(csv.contains(",NY,good,"));
}

#[tokio::test]
async fn metrics_endpoint_renders() {
    let (base_url, _tmp) = spawn_app().await;

    let resp = client()
        .get(format!("{}/metrics", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let (base_url, _tmp) = spawn_app().await;

    let resp = client()
        .get(format!("{}/reviews", base_url))
        .send()
        .await
        .unwrap();
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (base_url, _tmp) = spawn_app().await;

    let resp = client()
        .get(format!("{}/nope", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
