//! Request-scoped trace id.
//!
//! `RequestTrace` stores the id in the request extensions and runs the rest
//! of the request inside [`with_trace_id`], so error responses built deep in
//! a handler can stamp the same id without it being passed around. Engine
//! code does not read it.

use std::cell::RefCell;
use std::future::Future;

use actix_web::HttpMessage;
use tokio::task_local;

pub const UNKNOWN_TRACE_ID: &str = "unknown";

task_local! {
    static TRACE_ID: RefCell<Option<String>>;
}

/// Trace id as stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(pub String);

impl TraceId {
    /// Reads the id `RequestTrace` attached to `req`.
    pub fn from_request(req: &impl HttpMessage) -> String {
        req.extensions()
            .get::<TraceId>()
            .map(|id| id.0.clone())
            .unwrap_or_else(|| UNKNOWN_TRACE_ID.to_string())
    }
}

/// Current task's trace id, or `"unknown"` outside a request.
pub fn trace_id() -> String {
    TRACE_ID
        .try_with(|cell| cell.borrow().clone())
        .ok()
        .flatten()
        .unwrap_or_else(|| UNKNOWN_TRACE_ID.to_string())
}

pub async fn with_trace_id<F, R>(trace_id: String, future: F) -> R
where
    F: Future<Output = R>,
{
    TRACE_ID.scope(RefCell::new(Some(trace_id)), future).await
}
