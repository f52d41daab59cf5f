use cinematch_core::IndexConfig;
use cinematch_server::{fetch_catalog, refresh_catalog, SnapshotSource};
use std::fs;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CSV: &str = "title,year,genre,description\nAlien,1979,\"Horror, Sci-Fi\",a crew meets a deadly creature\n";

async fn serve(status: u16, body: &str) -> (MockServer, String) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movies.csv"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    let url = format!("{}/movies.csv", server.uri());
    (server, url)
}

#[tokio::test]
async fn downloads_and_writes_catalog() {
    let (_server, url) = serve(200, CSV).await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("data/movies.csv");

    let rows = fetch_catalog(&reqwest::Client::new(), &url, &dest).await.unwrap();
    assert_eq!(rows, 1);
    assert_eq!(fs::read_to_string(&dest).unwrap(), CSV);
}

#[tokio::test]
async fn failed_download_keeps_existing_file() {
    let (_server, url) = serve(500, "boom").await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("movies.csv");
    fs::write(&dest, CSV).unwrap();

    refresh_catalog(&reqwest::Client::new(), &url, &dest).await.unwrap();
    assert_eq!(fs::read_to_string(&dest).unwrap(), CSV);
}

#[tokio::test]
async fn invalid_csv_is_not_written() {
    let (_server, url) = serve(200, "name,plot\nAlien,creature\n").await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("movies.csv");
    fs::write(&dest, CSV).unwrap();

    assert!(fetch_catalog(&reqwest::Client::new(), &url, &dest).await.is_err());
    refresh_catalog(&reqwest::Client::new(), &url, &dest).await.unwrap();
    assert_eq!(fs::read_to_string(&dest).unwrap(), CSV);
}

#[tokio::test]
async fn failure_without_local_copy_is_an_error() {
    let (_server, url) = serve(404, "").await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("movies.csv");
    assert!(refresh_catalog(&reqwest::Client::new(), &url, &dest).await.is_err());
    assert!(!dest.exists());
}

#[tokio::test]
async fn header_only_download_keeps_existing_file() {
    let (_server, url) = serve(200, "title,year,description\n").await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("movies.csv");
    fs::write(&dest, CSV).unwrap();

    assert!(fetch_catalog(&reqwest::Client::new(), &url, &dest).await.is_err());
    refresh_catalog(&reqwest::Client::new(), &url, &dest).await.unwrap();
    assert_eq!(fs::read_to_string(&dest).unwrap(), CSV);
}

#[tokio::test]
async fn header_only_download_still_loads_previous_catalog() {
    let (_server, url) = serve(200, "title,year,description\n").await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("movies.csv");
    fs::write(&dest, CSV).unwrap();

    let source = SnapshotSource::Catalog { path: dest.clone(), url: Some(url) };
    let snapshot = source.load(&reqwest::Client::new(), IndexConfig::default()).await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.items()[0].title, "Alien");
}

#[tokio::test]
async fn replacement_leaves_no_staging_files() {
    let newer = "title,year,description\nHeat,1995,a heist goes wrong\nUp,2009,balloons lift a house\n";
    let (_server, url) = serve(200, newer).await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("movies.csv");
    fs::write(&dest, CSV).unwrap();

    let rows = fetch_catalog(&reqwest::Client::new(), &url, &dest).await.unwrap();
    assert_eq!(rows, 2);
    assert_eq!(fs::read_to_string(&dest).unwrap(), newer);
    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("movies.csv")]);
}
