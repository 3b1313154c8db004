use crate::error::RequestError;
use std::time::Duration;

/// Status recorded when the request never produced an HTTP response.
pub const NO_STATUS: u16 = 0;

/// Result of one request attempt. Created by a worker right after the attempt
/// finishes and consumed exactly once by the collector.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// HTTP status, or [`NO_STATUS`] when the request did not complete.
    pub status_code: u16,
    /// Issuance to full body read, or to the failure.
    pub duration: Duration,
    /// Response body bytes read.
    pub bytes: u64,
    pub error: Option<RequestError>,
}

impl Outcome {
    pub fn completed(status_code: u16, duration: Duration, bytes: u64) -> Self {
        Self {
            status_code,
            duration,
            bytes,
            error: None,
        }
    }

    pub fn failed(error: RequestError, duration: Duration) -> Self {
        Self {
            status_code: NO_STATUS,
            duration,
            bytes: 0,
            error: Some(error),
        }
    }

    /// Any error, or an HTTP status of 400 and above, counts as a failure.
    pub fn is_failure(&self) -> bool {
        self.error.is_some() || self.status_code >= 400
    }

    pub fn is_success(&self) -> bool {
        !self.is_failure()
    }
}
