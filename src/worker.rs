use crate::cancel::CancelSignal;
use crate::config::RunConfig;
use crate::error::RequestError;
use crate::outcome::Outcome;
use crate::work::WorkSource;
use reqwest::{redirect, Client, Response};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

// =============================================================================
// HTTP Request
// =============================================================================

fn build_client(config: &RunConfig) -> Result<Client, RequestError> {
    let policy = match config.max_redirects {
        0 => redirect::Policy::none(),
        n => redirect::Policy::limited(n),
    };

    Client::builder()
        .timeout(config.request_timeout)
        .redirect(policy)
        .build()
        .map_err(RequestError::from)
}

/// Reads and discards the body. A read failure counts as zero bytes.
async fn drain_body(id: usize, response: &mut Response) -> u64 {
    let mut bytes = 0u64;
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => bytes += chunk.len() as u64,
            Ok(None) => return bytes,
            Err(e) => {
                debug!("Worker {} failed to read body: {}", id, e);
                return 0;
            }
        }
    }
}

/// Issues one GET and measures it from issuance to full body read.
async fn execute(
    id: usize,
    client: &Result<Client, RequestError>,
    target: &Result<Url, url::ParseError>,
) -> Outcome {
    let start = Instant::now();

    let (client, url) = match (client, target) {
        (Ok(client), Ok(url)) => (client, url),
        (Err(e), _) => return Outcome::failed(e.clone(), start.elapsed()),
        (_, Err(e)) => return Outcome::failed(RequestError::from(*e), start.elapsed()),
    };

    let mut response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!("Worker {} request failed: {}", id, e);
            return Outcome::failed(e.into(), start.elapsed());
        }
    };

    let status = response.status().as_u16();
    let bytes = drain_body(id, &mut response).await;

    Outcome::completed(status, start.elapsed(), bytes)
}

// =============================================================================
// Worker Pool
// =============================================================================

/// Builds one client per worker on the blocking pool.
///
/// Client construction loads TLS roots synchronously, so it must stay off the
/// runtime threads and out of the measured window.
pub async fn build_clients(config: &Arc<RunConfig>) -> Vec<Result<Client, RequestError>> {
    let builds = (0..config.concurrency).map(|_| {
        let config = Arc::clone(config);
        tokio::task::spawn_blocking(move || build_client(&config))
    });

    futures_util::future::join_all(builds)
        .await
        .into_iter()
        .enumerate()
        .map(|(id, built)| {
            let client = built.unwrap_or_else(|e| Err(RequestError::Build(e.to_string())));
            if let Err(e) = &client {
                warn!("Worker {} could not build HTTP client: {}", id, e);
            }
            client
        })
        .collect()
}

/// Pulls tokens until the source is exhausted or cancellation is observed.
/// Returns the number of tokens this worker consumed.
async fn run_worker(
    id: usize,
    client: Result<Client, RequestError>,
    target: Arc<Result<Url, url::ParseError>>,
    source: WorkSource,
    cancel: CancelSignal,
    outcomes: mpsc::UnboundedSender<Outcome>,
) -> usize {
    let mut consumed = 0;

    loop {
        if cancel.is_triggered() {
            let dropped = source.close();
            debug!(
                "Worker {} observed cancellation, discarded {} tokens",
                id, dropped
            );
            break;
        }

        if source.take().await.is_none() {
            break;
        }
        consumed += 1;

        let outcome = execute(id, &client, &target).await;
        if outcomes.send(outcome).is_err() {
            debug!("Worker {} outcome stream closed", id);
            break;
        }
    }

    debug!("Worker {} exiting after {} requests", id, consumed);
    consumed
}

/// Spawns one worker per client plus a completion watcher.
///
/// The watcher holds the last outcome sender and drops it only after every
/// worker has exited, so the stream closes exactly once. It resolves to the
/// total number of tokens consumed.
pub fn spawn_pool(
    config: &RunConfig,
    clients: Vec<Result<Client, RequestError>>,
    source: WorkSource,
    cancel: CancelSignal,
) -> (mpsc::UnboundedReceiver<Outcome>, JoinHandle<usize>) {
    let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
    let target = Arc::new(Url::parse(&config.target));

    let workers: Vec<JoinHandle<usize>> = clients
        .into_iter()
        .enumerate()
        .map(|(id, client)| {
            tokio::spawn(run_worker(
                id,
                client,
                Arc::clone(&target),
                source.clone(),
                cancel.clone(),
                outcome_tx.clone(),
            ))
        })
        .collect();

    let watcher = tokio::spawn(async move {
        let results = futures_util::future::join_all(workers).await;

        let mut consumed = 0;
        for (id, result) in results.into_iter().enumerate() {
            match result {
                Ok(n) => consumed += n,
                Err(e) => warn!("Worker {} terminated abnormally: {}", id, e),
            }
        }

        drop(outcome_tx);
        debug!("All workers finished, outcome stream closed");
        consumed
    });

    (outcome_rx, watcher)
}
