use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use cinematch_core::{CatalogItem, IndexConfig, Snapshot};
use cinematch_server::{build_app, AppState, SnapshotSource};
use http_body_util::BodyExt;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;
use tower::ServiceExt;

fn movie(title: &str, year: &str, description: &str) -> CatalogItem {
    CatalogItem {
        id: title.to_lowercase(),
        title: title.into(),
        year: year.into(),
        description: description.into(),
        genre: None,
    }
}

fn tiny_snapshot() -> Snapshot {
    let items = vec![
        movie("Treasure Planet", "2002", "a story about space pirates"),
        movie("Brief Encounter", "1945", "a tale of love and loss"),
        movie("Captain Blood", "1935", "pirates sailing the seven seas"),
    ];
    Snapshot::build(items, IndexConfig::default()).unwrap()
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn recommend_returns_ranked_results() {
    let app = build_app(AppState::new(tiny_snapshot()));

    let (status, json) = call(app, get("/recommend?q=space%20pirates&k=2")).await;
    assert_eq!(status, StatusCode::OK);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["title"], "Treasure Planet");
    assert_eq!(arr[1]["title"], "Captain Blood");
    let reply = json["reply"].as_str().unwrap();
    assert!(reply.starts_with("Similar movies:\n🎬 Treasure Planet (2002)"));
}

#[tokio::test]
async fn unmatched_query_gets_apology() {
    let app = build_app(AppState::new(tiny_snapshot()));
    let (status, json) = call(app, get("/recommend?q=zeppelin")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["results"].as_array().unwrap().is_empty());
    assert_eq!(json["reply"], cinematch_server::reply::NO_MATCHES);
}

#[tokio::test]
async fn zero_k_is_a_bad_request() {
    let app = build_app(AppState::new(tiny_snapshot()));
    let (status, json) = call(app, get("/recommend?q=pirates&k=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["reply"], cinematch_server::reply::FAILURE);
}

#[tokio::test]
async fn k_is_capped() {
    let mut state = AppState::new(tiny_snapshot());
    state.max_k = 1;
    let (_, json) = call(build_app(state), get("/recommend?q=pirates&k=50")).await;
    assert_eq!(json["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn items_are_addressable_by_position() {
    let app = build_app(AppState::new(tiny_snapshot()));
    let (status, json) = call(app.clone(), get("/items/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Brief Encounter");

    let (status, _) = call(app, get("/items/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reload_requires_token_and_swaps_snapshot() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("movies.csv");
    fs::write(&csv, "title,year,description\nJaws,1975,a shark terrorizes a beach town\n").unwrap();

    let state = AppState::new(tiny_snapshot())
        .with_source(SnapshotSource::Catalog { path: csv, url: None }, IndexConfig::default())
        .with_admin_token(Some("secret".into()));
    let app = build_app(state);

    let (status, _) = call(app.clone(), Request::post("/admin/reload").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::post("/admin/reload").header("X-ADMIN-TOKEN", "secret").body(Body::empty()).unwrap();
    let (status, json) = call(app.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_docs"], 1);
    assert_eq!(json["previous_num_docs"], 3);

    let (_, json) = call(app, get("/recommend?q=shark")).await;
    assert_eq!(json["results"][0]["title"], "Jaws");
}

#[tokio::test]
async fn reload_without_source_conflicts() {
    let state = AppState::new(tiny_snapshot()).with_admin_token(Some("secret".into()));
    let req = Request::post("/admin/reload").header("X-ADMIN-TOKEN", "secret").body(Body::empty()).unwrap();
    let (status, _) = call(build_app(state), req).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn concurrent_reloads_publish_one_after_another() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("movies.csv");
    fs::write(&csv, "title,year,description\nJaws,1975,a shark terrorizes a beach town\n").unwrap();

    let state = AppState::new(tiny_snapshot())
        .with_source(SnapshotSource::Catalog { path: csv, url: None }, IndexConfig::default())
        .with_admin_token(Some("secret".into()));
    let app = build_app(state);
    let reload = || Request::post("/admin/reload").header("X-ADMIN-TOKEN", "secret").body(Body::empty()).unwrap();

    let ((s1, a), (s2, b)) = tokio::join!(call(app.clone(), reload()), call(app.clone(), reload()));
    assert_eq!((s1, s2), (StatusCode::OK, StatusCode::OK));

    // Serialized reloads: exactly one of them replaced the original three-movie snapshot.
    let mut previous = vec![a["previous_num_docs"].as_u64().unwrap(), b["previous_num_docs"].as_u64().unwrap()];
    previous.sort_unstable();
    assert_eq!(previous, vec![1, 3]);
}
