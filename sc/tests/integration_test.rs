//! Integration tests for Scrappit
//!
//! These tests drive the scheduler end-to-end against a local HTTP server.

use std::time::{Duration, Instant};

use scrappit::config::Config;
use scrappit::domain::{Cursor, Params, SubredditSort, TimeWindow};
use scrappit::scheduler::{Scheduler, SchedulerState, TaskResult};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.client.base_url = server.uri();
    config.client.timeout_secs = 5;
    config.client.user_agents = vec!["scrappit-test/1.0".to_string()];
    config.scheduler.idle_sleep_ms = 5.0;
    config
}

fn limited(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("x-ratelimit-remaining", "99.0")
        .insert_header("x-ratelimit-reset", "60")
        .set_body_json(body)
}

async fn collect(scheduler: &Scheduler, count: usize) -> Vec<TaskResult> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut results = Vec::new();
    while results.len() < count && Instant::now() < deadline {
        match scheduler.poll_result() {
            Some(result) => results.push(result),
            None => tokio::time::sleep(Duration::from_millis(10)).await,
        }
    }
    results
}

// =============================================================================
// Scheduler + HTTP
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_subreddit_listing_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/rust/top.json"))
        .and(query_param("raw_json", "1"))
        .and(query_param("limit", "100"))
        .and(query_param("t", "week"))
        .and(query_param("after", "t3_abc"))
        .respond_with(limited(json!({"kind": "Listing", "data": {"children": []}})))
        .expect(1)
        .mount(&server)
        .await;

    let scheduler = Scheduler::from_config(&config_for(&server)).expect("Failed to create scheduler");
    let handle = scheduler.subreddit(
        "rust",
        SubredditSort::Top,
        TimeWindow::Week,
        Some(Cursor::After("t3_abc".into())),
        None,
    );
    scheduler.start().expect("Failed to start scheduler");

    let results = collect(&scheduler, 1).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id(), handle.id);
    assert_eq!(results[0].value.as_ref().unwrap()["kind"], "Listing");

    scheduler.stop();
    scheduler.join().expect("Failed to join worker");
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_requests_follow_priority_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(limited(json!({})))
        .mount(&server)
        .await;

    let scheduler = Scheduler::from_config(&config_for(&server)).expect("Failed to create scheduler");
    scheduler.get("/first", Params::new(), Some(1.0));
    scheduler.get("/second", Params::new(), Some(1.0));
    scheduler.get("/urgent", Params::new(), Some(0.0));
    scheduler.start().expect("Failed to start scheduler");

    let results = collect(&scheduler, 3).await;
    assert_eq!(results.len(), 3);
    scheduler.stop();
    scheduler.join().expect("Failed to join worker");

    let paths: Vec<String> = server
        .received_requests()
        .await
        .expect("Request recording disabled")
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(paths, vec!["/urgent.json", "/first.json", "/second.json"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_error_is_reported_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/ghost/about.json"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/rust/about.json"))
        .respond_with(limited(json!({"kind": "t5"})))
        .expect(1)
        .mount(&server)
        .await;

    let scheduler = Scheduler::from_config(&config_for(&server)).expect("Failed to create scheduler");
    scheduler.user_about("ghost", Some(0.0));
    scheduler.subreddit_about("rust", Some(1.0));
    scheduler.start().expect("Failed to start scheduler");

    let results = collect(&scheduler, 2).await;
    assert_eq!(results.len(), 2);

    let err = results[0].value.as_ref().unwrap_err();
    assert_eq!(err.client().and_then(|e| e.status()), Some(404));
    assert_eq!(results[1].value.as_ref().unwrap()["kind"], "t5");

    scheduler.stop();
    scheduler.join().expect("Failed to join worker");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_rate_limit_headers_fail_the_task() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let scheduler = Scheduler::from_config(&config_for(&server)).expect("Failed to create scheduler");
    scheduler.get("/r/rust", Params::new(), None);
    scheduler.start().expect("Failed to start scheduler");

    let results = collect(&scheduler, 1).await;
    assert_eq!(results.len(), 1);
    let err = results[0].value.as_ref().unwrap_err();
    assert!(err.to_string().contains("x-ratelimit-remaining"), "unexpected error: {err}");

    scheduler.stop();
    scheduler.join().expect("Failed to join worker");
}

#[test]
fn test_config_file_drives_scheduler() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("scrappit.yml");
    std::fs::write(
        &path,
        "client:\n  base-url: http://localhost:9\n  max-attempts: 2\npriorities:\n  operations:\n    user_about: 7.0\n",
    )
    .expect("Failed to write config");

    let config = Config::load(Some(&path)).expect("Failed to load config");
    config.validate().expect("Config should be valid");
    let scheduler = Scheduler::from_config(&config).expect("Failed to create scheduler");

    let handle = scheduler.user_about("spez", None);
    assert_eq!(handle.priority, 7.0);
    assert_eq!(scheduler.pending(), 1);
    assert_eq!(scheduler.state(), SchedulerState::NotStarted);
}
