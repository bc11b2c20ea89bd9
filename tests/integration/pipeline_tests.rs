use chrono::{TimeZone, Utc};
use feed_scotty::config::load_config;
use feed_scotty::navigation::RetryPolicy;
use feed_scotty::output::FeedWriter;
use feed_scotty::reconcile::{FsSnapshotStore, HttpSnapshotStore};
use feed_scotty::{Batch, Config, Entry, FeedData, HttpEngine, SnapshotCache};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NEWS_PAGE: &str = r#"<html><head><title>News</title>
<link rel="icon" href="/static/icon.png"></head><body>
<article><h2>First</h2><a href="/news/first">more</a><p>One</p></article>
<article><h2>Second</h2><a href="/news/second">more</a><p>Two</p></article>
<article><h2>Third</h2><a href="/news/third">more</a><p>Three</p></article>
</body></html>"#;

/// Writes `content` as feeds.toml in `dir` and loads it
fn write_config(dir: &Path, content: &str) -> Config {
    let path = dir.join("feeds.toml");
    std::fs::write(&path, content).unwrap();
    load_config(&path).unwrap()
}

fn news_feed(base_url: &str) -> String {
    format!(
        r#"
[news]
title = "News"
url = "{}/news"
entrySelector = "article"
titleSelector = "h2"
linkSelector = "a"
contentSelector = "p"
timeout = 5
"#,
        base_url
    )
}

fn broken_feed(base_url: &str, on_fail: &str) -> String {
    format!(
        r#"
[broken]
title = "Broken"
url = "{}/broken"
entrySelector = "article"
titleSelector = "h2"
timeout = 5
onFail = "{}"
"#,
        base_url, on_fail
    )
}

async fn serve_news(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(NEWS_PAGE)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn serve_broken(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 1,
        backoff_base: Duration::from_millis(1),
    }
}

fn batch(config: Config, snapshots: SnapshotCache, out: &Path) -> Batch {
    Batch::new(
        config,
        Arc::new(HttpEngine::default()),
        snapshots,
        FeedWriter::new(out),
    )
    .with_policy(fast_policy())
}

fn read_feed(dir: &Path, id: &str) -> FeedData {
    let json = std::fs::read_to_string(dir.join(format!("{}.json", id))).unwrap();
    FeedData::from_json(&json).unwrap()
}

/// A previous snapshot for the broken feed, with one entry
fn previous_broken() -> FeedData {
    let mut feed = FeedData::new("Broken", "http://localhost/broken");
    feed.entries.push(
        Entry::new(
            Some("Old".to_string()),
            "old".to_string(),
            Some("http://localhost/broken/old".to_string()),
            Utc.timestamp_millis_opt(1_600_000_000_000).unwrap(),
            None,
        )
        .unwrap(),
    );
    feed
}

#[tokio::test]
async fn test_full_run_writes_feeds_and_combined_feed() {
    let server = MockServer::start().await;
    serve_news(&server).await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("public");
    let config = write_config(dir.path(), &news_feed(&server.uri()));

    let report = batch(config, SnapshotCache::disabled(), &out)
        .with_root_url(Some("https://feeds.example.org/".to_string()))
        .run()
        .await
        .unwrap();

    assert_eq!(report.written_ids(), vec!["news", "all"]);

    let news = read_feed(&out, "news");
    assert_eq!(news.title, "News");
    assert_eq!(
        news.favicon.as_deref(),
        Some(format!("{}/static/icon.png", server.uri()).as_str())
    );
    assert_eq!(news.entries.len(), 3);
    assert_eq!(news.entries[0].title.as_deref(), Some("First"));
    assert_eq!(news.entries[0].contents, "One");
    assert_eq!(
        news.entries[0].link.as_deref(),
        Some(format!("{}/news/first", server.uri()).as_str())
    );
    assert!(news.entries.iter().all(|e| e.id.starts_with("link-")));

    let xml = std::fs::read_to_string(out.join("news.xml")).unwrap();
    assert!(xml.contains("<feed"));

    let all = read_feed(&out, "all");
    assert_eq!(all.title, "Combined feed");
    assert_eq!(all.url, "https://feeds.example.org/all.xml");
    assert_eq!(all.entries.len(), 3);
    assert_eq!(all.entries[1].title.as_deref(), Some("Second (News)"));
    assert_eq!(all.entries[1].id, news.entries[1].id);
}

#[tokio::test]
async fn test_second_run_preserves_retrieved_timestamps() {
    let server = MockServer::start().await;
    serve_news(&server).await;

    let dir = TempDir::new().unwrap();
    let first_out = dir.path().join("first");
    let second_out = dir.path().join("second");
    let config = write_config(dir.path(), &news_feed(&server.uri()));

    batch(config.clone(), SnapshotCache::disabled(), &first_out)
        .run()
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;

    let snapshots = SnapshotCache::new(FsSnapshotStore::new(&first_out));
    batch(config, snapshots, &second_out).run().await.unwrap();

    assert_eq!(read_feed(&first_out, "news"), read_feed(&second_out, "news"));
    assert_eq!(read_feed(&first_out, "all"), read_feed(&second_out, "all"));
}

#[tokio::test]
async fn test_snapshots_read_from_published_site() {
    let server = MockServer::start().await;
    serve_news(&server).await;

    let dir = TempDir::new().unwrap();
    let first_out = dir.path().join("first");
    let config = write_config(dir.path(), &news_feed(&server.uri()));

    batch(config.clone(), SnapshotCache::disabled(), &first_out)
        .run()
        .await
        .unwrap();

    let published = std::fs::read_to_string(first_out.join("news.json")).unwrap();
    Mock::given(method("GET"))
        .and(path("/pages/news.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(published)
                .insert_header("content-type", "application/json"),
        )
        .mount(&server)
        .await;

    let second_out = dir.path().join("second");
    let store = HttpSnapshotStore::new(&format!("{}/pages", server.uri())).unwrap();
    batch(config, SnapshotCache::new(store), &second_out)
        .run()
        .await
        .unwrap();

    assert_eq!(read_feed(&first_out, "news"), read_feed(&second_out, "news"));
}

#[tokio::test]
async fn test_stale_feed_republishes_previous_snapshot() {
    let server = MockServer::start().await;
    serve_news(&server).await;
    serve_broken(&server).await;

    let dir = TempDir::new().unwrap();
    let previous_dir = dir.path().join("previous");
    std::fs::create_dir_all(&previous_dir).unwrap();
    std::fs::write(
        previous_dir.join("broken.json"),
        previous_broken().to_json().unwrap(),
    )
    .unwrap();

    let out = dir.path().join("public");
    let config = write_config(
        dir.path(),
        &format!("{}{}", news_feed(&server.uri()), broken_feed(&server.uri(), "stale")),
    );

    let report = batch(config, SnapshotCache::new(FsSnapshotStore::new(&previous_dir)), &out)
        .run()
        .await
        .unwrap();

    assert_eq!(report.stale, vec!["broken".to_string()]);
    assert_eq!(read_feed(&out, "broken"), previous_broken());

    let all = read_feed(&out, "all");
    assert_eq!(all.entries.len(), 4);
    assert_eq!(all.entries[3].title.as_deref(), Some("Old (Broken)"));
}

#[tokio::test]
async fn test_excluded_feed_produces_no_output() {
    let server = MockServer::start().await;
    serve_news(&server).await;
    serve_broken(&server).await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("public");
    let config = write_config(
        dir.path(),
        &format!("{}{}", news_feed(&server.uri()), broken_feed(&server.uri(), "exclude")),
    );

    let report = batch(config, SnapshotCache::disabled(), &out)
        .run()
        .await
        .unwrap();

    assert_eq!(report.excluded, vec!["broken".to_string()]);
    assert_eq!(report.written_ids(), vec!["news", "all"]);
    assert!(!out.join("broken.xml").exists());
    assert_eq!(read_feed(&out, "all").entries.len(), 3);
}

#[tokio::test]
async fn test_failing_feed_fails_batch_after_writing_others() {
    let server = MockServer::start().await;
    serve_news(&server).await;
    serve_broken(&server).await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("public");
    let config = write_config(
        dir.path(),
        &format!("{}{}", broken_feed(&server.uri(), "error"), news_feed(&server.uri())),
    );

    let result = batch(config, SnapshotCache::disabled(), &out).run().await;

    assert!(result.is_err());
    assert!(out.join("news.xml").exists());
    assert!(out.join("all.xml").exists());
    assert!(!out.join("broken.xml").exists());
}

#[tokio::test]
async fn test_scheduled_run_publishes_placeholder_for_failing_feed() {
    let server = MockServer::start().await;
    serve_broken(&server).await;

    let dir = TempDir::new().unwrap();
    let previous_dir = dir.path().join("previous");
    std::fs::create_dir_all(&previous_dir).unwrap();
    std::fs::write(
        previous_dir.join("broken.json"),
        previous_broken().to_json().unwrap(),
    )
    .unwrap();

    let out = dir.path().join("public");
    let config = write_config(dir.path(), &broken_feed(&server.uri(), "error"));

    let report = batch(config, SnapshotCache::new(FsSnapshotStore::new(&previous_dir)), &out)
        .scheduled(true)
        .run()
        .await
        .unwrap();

    assert_eq!(report.suppressed, vec!["broken".to_string()]);
    let xml = std::fs::read_to_string(out.join("broken.xml")).unwrap();
    assert!(xml.contains("<title>Broken</title>"));
    assert!(!xml.contains("<entry>"));
    assert_eq!(read_feed(&out, "broken"), previous_broken());
}
