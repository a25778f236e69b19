mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{StubBackend, PASSWORD, USERNAME};
use tokio::runtime::Handle;
use vigil_api_client::{discover, fetch_series, ApiClient, PollEvent, Poller, RetryConfig};
use vigil_core::testing::{export_body, export_line};
use vigil_core::{Selection, SeriesKey};

async fn logged_in(stub: &StubBackend) -> ApiClient {
    let api = stub.client();
    api.login(USERNAME, PASSWORD).await.unwrap();
    api
}

fn quick_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 2,
        delays: vec![Duration::from_millis(10)],
    }
}

#[tokio::test]
async fn discovery_reads_envelope_and_bare_list() {
    let stub = StubBackend::start().await;
    let api = logged_in(&stub).await;

    let found = discover(&api, &RetryConfig::none()).await;

    assert_eq!(found.metric_names, vec!["node_load1", "up"]);
    assert_eq!(found.jobs, vec!["node", "vmagent"]);
    assert!(found.errors.is_empty());
    assert_eq!(found.error_summary(), None);
}

#[tokio::test]
async fn discovery_retries_transient_failures() {
    let stub = StubBackend::start().await;
    let api = logged_in(&stub).await;
    stub.state.label_failures.store(2, Ordering::SeqCst);

    let found = discover(&api, &quick_retry()).await;

    assert!(found.errors.is_empty(), "{:?}", found.errors);
    assert_eq!(found.metric_names.len(), 2);
    assert_eq!(found.jobs.len(), 2);
}

#[tokio::test]
async fn discovery_without_session_reports_both_lists() {
    let stub = StubBackend::start().await;
    let api = stub.client();

    let found = discover(&api, &RetryConfig::none()).await;

    assert!(found.metric_names.is_empty());
    assert!(found.jobs.is_empty());
    assert_eq!(found.errors.len(), 2);
    assert!(found.session_expired());
    let summary = found.error_summary().unwrap();
    assert!(summary.contains("metric names"), "{summary}");
    assert!(summary.contains("jobs"), "{summary}");
}

#[tokio::test]
async fn series_fetch_sends_selector_and_skips_bad_lines() {
    let stub = StubBackend::start().await;
    let api = logged_in(&stub).await;
    stub.set_export_body(export_body([
        export_line("up", "a", &[(1_000, 1.0), (2_000, 1.0)]),
        "{not json".to_string(),
        export_line("node_load1", "a", &[(1_000, 0.5)]),
    ]));

    let selection = Selection::new(
        ["up".to_string(), "node_load1".to_string()],
        Some("node".to_string()),
    );
    let series = fetch_series(&api, &selection).await.unwrap();

    assert_eq!(
        stub.selectors(),
        vec![r#"{__name__=~"up|node_load1",job="node"}"#]
    );
    assert_eq!(series.len(), 2);
    let up = &series[&SeriesKey::new("up", "a")];
    assert_eq!(up.values(), &[1.0, 1.0]);
    assert!(series.contains_key(&SeriesKey::new("node_load1", "a")));
}

#[tokio::test]
async fn empty_selection_makes_no_request() {
    let stub = StubBackend::start().await;
    let api = logged_in(&stub).await;

    let series = fetch_series(&api, &Selection::default()).await.unwrap();

    assert!(series.is_empty());
    assert!(stub.selectors().is_empty());
}

#[tokio::test]
async fn poller_delivers_series_from_backend() {
    let stub = StubBackend::start().await;
    let api = logged_in(&stub).await;
    stub.set_export_body(export_body([export_line("up", "a", &[(1_000, 1.0)])]));

    let (mut poller, mut rx) =
        Poller::new(Arc::new(api), Duration::from_millis(50), Handle::current());
    let epoch = poller.restart(&Selection::new(["up".to_string()], None));

    let series = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Some(PollEvent::Updated { epoch: e, series }) if e == epoch => break series,
                Some(PollEvent::Failed { error, .. }) => panic!("poll failed: {error}"),
                Some(_) => continue,
                None => panic!("poller channel closed"),
            }
        }
    })
    .await
    .expect("no series within timeout");

    assert_eq!(series.len(), 1);
    poller.stop();
}
