use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use quill_http::{HttpRequest, HttpResponse, TransportError};

/// Identifier of one dispatched request, `req_<millis>_<seq>`.
pub type RequestId = String;

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(0);

/// Returns a fresh request id; unique within the process.
pub fn next_request_id() -> RequestId {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let seq = REQUEST_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("req_{millis}_{seq:09}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Success,
    Error,
}

/// Snapshot of a transport failure carried by a settled lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestFailure {
    pub message: String,
    pub status: u16,
}

impl From<&TransportError> for RequestFailure {
    fn from(err: &TransportError) -> Self {
        Self {
            message: err.to_string(),
            status: err.status(),
        }
    }
}

/// Record of one request from dispatch to settlement.
#[derive(Debug, Clone)]
pub struct RequestLifecycle {
    pub id: RequestId,
    pub request: HttpRequest,
    pub start_time: SystemTime,
    pub end_time: Option<SystemTime>,
    pub duration: Option<Duration>,
    pub success: Option<bool>,
    pub response: Option<HttpResponse>,
    pub error: Option<RequestFailure>,
    pub status: RequestStatus,
}

impl RequestLifecycle {
    pub fn new(request: HttpRequest) -> Self {
        Self {
            id: next_request_id(),
            request,
            start_time: SystemTime::now(),
            end_time: None,
            duration: None,
            success: None,
            response: None,
            error: None,
            status: RequestStatus::Pending,
        }
    }

    pub fn succeed(&mut self, response: HttpResponse) {
        self.settle(true);
        self.response = Some(response);
        self.status = RequestStatus::Success;
    }

    pub fn fail(&mut self, err: &TransportError) {
        self.settle(false);
        self.error = Some(RequestFailure::from(err));
        self.status = RequestStatus::Error;
    }

    pub fn is_settled(&self) -> bool {
        self.status != RequestStatus::Pending
    }

    fn settle(&mut self, success: bool) {
        let end = SystemTime::now();
        self.duration = Some(end.duration_since(self.start_time).unwrap_or_default());
        self.end_time = Some(end);
        self.success = Some(success);
    }
}
