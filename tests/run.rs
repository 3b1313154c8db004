use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::routing::get;
use axum::Router;
use http_benchmark::{run, CancelSignal, RequestError, RunConfig};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};

const BODY_LEN: usize = 100;

#[derive(Clone, Default)]
struct Server {
    flaky_hits: Arc<AtomicUsize>,
    /// Handlers currently executing on `/held`.
    active: Arc<AtomicUsize>,
}

struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn flaky(State(server): State<Server>) -> &'static str {
    // The first two callers stall past the client timeout
    if server.flaky_hits.fetch_add(1, Ordering::SeqCst) < 2 {
        sleep(Duration::from_secs(5)).await;
    }
    "ok"
}

async fn held(State(server): State<Server>) -> &'static str {
    server.active.fetch_add(1, Ordering::SeqCst);
    let _guard = ActiveGuard(Arc::clone(&server.active));
    sleep(Duration::from_millis(200)).await;
    "held"
}

/// Sends headers and a first chunk, then fails the body stream.
async fn truncated() -> Body {
    let chunks = futures_util::stream::unfold(0u8, |step| async move {
        match step {
            0 => Some((Ok(Bytes::from_static(b"partial")), 1)),
            1 => {
                sleep(Duration::from_millis(50)).await;
                Some((Err(io::Error::other("stream aborted")), 2))
            }
            _ => None,
        }
    });
    Body::from_stream(chunks)
}

async fn spawn_server() -> (String, Server) {
    let server = Server::default();
    let app = Router::new()
        .route("/ok", get(|| async { "x".repeat(BODY_LEN) }))
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "not found") }),
        )
        .route("/redirect", get(|| async { Redirect::temporary("/ok") }))
        .route("/flaky", get(flaky))
        .route("/held", get(held))
        .route("/truncated", get(truncated))
        .with_state(server.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), server)
}

fn config(target: String, concurrency: usize, requests: usize) -> RunConfig {
    RunConfig {
        target,
        concurrency,
        requests,
        request_timeout: Duration::from_secs(1),
        max_redirects: 10,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_token_produces_one_outcome() {
    let (base, _) = spawn_server().await;

    for _ in 0..5 {
        let report = run(config(format!("{}/ok", base), 16, 200), CancelSignal::new()).await;
        assert_eq!(report.total, 200);
        assert_eq!(report.successful, 200);
        assert_eq!(report.failed, 0);
        assert_eq!(report.total_bytes, 200 * BODY_LEN as u64);
        assert!(!report.cancelled);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn single_worker_sequential_run() {
    let (base, _) = spawn_server().await;

    let report = run(config(format!("{}/ok", base), 1, 10), CancelSignal::new()).await;
    assert_eq!(report.total, 10);
    assert_eq!(report.successful, 10);
    assert_eq!(report.status_counts.get(&200), Some(&10));

    let latency = report.latency.expect("latency for a non-empty run");
    assert!(latency.min <= latency.p50);
    assert!(latency.p50 <= latency.p90);
    assert!(latency.p90 <= latency.p95);
    assert!(latency.p95 <= latency.p99);
    assert!(latency.p99 <= latency.max);
    assert!(report.throughput_bytes_per_sec.unwrap() > 0.0);
    assert!(report.requests_per_sec > 0.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn timeouts_are_recorded_as_failures() {
    let (base, _) = spawn_server().await;

    let report = run(config(format!("{}/flaky", base), 5, 5), CancelSignal::new()).await;
    assert_eq!(report.total, 5);
    assert_eq!(report.successful, 3);
    assert_eq!(report.failed, 2);
    assert_eq!(report.errors, 2);
    assert_eq!(report.success_rate, Some(60.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_errors_fail_without_transport_error() {
    let (base, _) = spawn_server().await;

    let report = run(config(format!("{}/missing", base), 2, 6), CancelSignal::new()).await;
    assert_eq!(report.total, 6);
    assert_eq!(report.failed, 6);
    assert_eq!(report.errors, 0);
    assert_eq!(report.status_counts.get(&404), Some(&6));
    assert_eq!(report.success_rate, Some(0.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn redirects_count_final_response_only() {
    let (base, _) = spawn_server().await;

    let followed = run(config(format!("{}/redirect", base), 2, 4), CancelSignal::new()).await;
    assert_eq!(followed.status_counts.get(&200), Some(&4));
    assert_eq!(followed.total_bytes, 4 * BODY_LEN as u64);

    let mut no_follow = config(format!("{}/redirect", base), 2, 4);
    no_follow.max_redirects = 0;
    let report = run(no_follow, CancelSignal::new()).await;
    assert_eq!(report.status_counts.get(&307), Some(&4));
    assert_eq!(report.successful, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancellation_mid_run_truncates_work() {
    let (base, server) = spawn_server().await;
    let cancel = CancelSignal::new();
    let concurrency = 10;

    // Cancel once every worker has a request in flight
    let trigger = cancel.clone();
    let active = Arc::clone(&server.active);
    tokio::spawn(async move {
        let all_in_flight = async {
            while active.load(Ordering::SeqCst) < concurrency {
                sleep(Duration::from_millis(2)).await;
            }
        };
        timeout(Duration::from_secs(10), all_in_flight).await.ok();
        trigger.trigger();
    });

    let mut config = config(format!("{}/held", base), concurrency, 100);
    config.request_timeout = Duration::from_secs(5);
    let report = run(config, cancel).await;

    assert!(report.cancelled);
    assert!(report.total < 100, "total {} should be truncated", report.total);
    assert!(
        report.total >= concurrency as u64,
        "in-flight requests must finish, got {}",
        report.total
    );
    assert_eq!(report.successful + report.failed, report.total);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn body_read_failure_keeps_status_without_error() {
    let (base, _) = spawn_server().await;

    let report = run(config(format!("{}/truncated", base), 2, 4), CancelSignal::new()).await;
    assert_eq!(report.total, 4);
    assert_eq!(report.status_counts.get(&200), Some(&4));
    assert_eq!(report.total_bytes, 0);
    assert_eq!(report.errors, 0);
    assert_eq!(report.successful, 4);
}

#[tokio::test]
async fn cancellation_before_start_reports_nothing() {
    let (base, _) = spawn_server().await;
    let cancel = CancelSignal::new();
    cancel.trigger();

    let report = run(config(format!("{}/ok", base), 4, 40), cancel).await;
    assert_eq!(report.total, 0);
    assert_eq!(report.successful, 0);
    assert_eq!(report.failed, 0);
    assert!(report.latency.is_none());
    assert!(report.throughput_bytes_per_sec.is_none());
    assert!(report.success_rate.is_none());
}

#[tokio::test]
async fn unreachable_target_fails_every_request() {
    // Bind and release a port so nothing is listening on it
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let report = run(config(format!("http://{}", addr), 2, 4), CancelSignal::new()).await;
    assert_eq!(report.total, 4);
    assert_eq!(report.failed, 4);
    assert_eq!(report.errors, 4);
    assert!(report.status_counts.is_empty());
    assert!(report.latency.is_some());
}

#[tokio::test]
async fn malformed_target_is_not_fatal() {
    let report = run(config("http://".to_string(), 2, 3), CancelSignal::new()).await;
    assert_eq!(report.total, 3);
    assert_eq!(report.errors, 3);

    // Classification is exposed on the error type too
    assert!(matches!(
        url::Url::parse("http://").map_err(RequestError::from),
        Err(RequestError::InvalidUrl(_))
    ));
}
