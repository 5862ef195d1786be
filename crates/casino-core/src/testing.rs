//! Recording transport for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{OutgoingRequest, Transport, TransportResponse};
use crate::error::ApiError;

/// Replays queued responses in order and records every request it receives.
/// An empty queue answers `404` with an empty body.
#[derive(Default)]
pub struct RecordingTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, ApiError>>>,
    requests: Mutex<Vec<OutgoingRequest>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: TransportResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn push_error(&self, error: ApiError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<OutgoingRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<OutgoingRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<TransportResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(TransportResponse::new(404, "")))
    }
}
