use std::future::{ready, Ready};
use std::time::Instant;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use actix_web::Error as ActixError;
use futures_util::future::LocalBoxFuture;
use tracing::{debug, error, info, info_span, warn, Instrument, Level};

use crate::trace_ctx::TraceId;

/// Emits one `request_completed` event per request and runs the handler in
/// a `request` span carrying the trace id.
///
/// Wrap it inside `RequestTrace` so the trace id is already set.
pub struct StructuredLogger;

/// Health probes arrive every few seconds; keep them out of `info`.
fn completion_level(path: &str, status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::ERROR
    } else if status.is_client_error() {
        Level::WARN
    } else if path.starts_with("/health") {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

impl<S, B> Transform<S, ServiceRequest> for StructuredLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type InitError = ();
    type Transform = StructuredLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StructuredLoggerMiddleware { service }))
    }
}

pub struct StructuredLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for StructuredLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        // Route template keeps group ids out of the field, e.g. `/api/admin/groups/{id}`.
        let route = req.match_pattern().unwrap_or_else(|| path.clone());
        let trace_id = TraceId::from_request(&req);

        let span = info_span!("request", trace_id = %trace_id, method = %method, route = %route);
        let fut = self.service.call(req).instrument(span);

        Box::pin(async move {
            let result = fut.await;

            let status = match &result {
                Ok(res) => res.status(),
                Err(err) => err.as_response_error().status_code(),
            };
            let duration_us = start.elapsed().as_micros() as u64;
            let status_code = status.as_u16();

            match completion_level(&path, status) {
                Level::ERROR => error!(http.method = %method, url.path = %path, http.route = %route, http.status_code = status_code, duration_us, trace_id = %trace_id, message = "request_completed"),
                Level::WARN => warn!(http.method = %method, url.path = %path, http.route = %route, http.status_code = status_code, duration_us, trace_id = %trace_id, message = "request_completed"),
                Level::DEBUG => debug!(http.method = %method, url.path = %path, http.status_code = status_code, duration_us, message = "request_completed"),
                _ => info!(http.method = %method, url.path = %path, http.route = %route, http.status_code = status_code, duration_us, trace_id = %trace_id, message = "request_completed"),
            }

            result
        })
    }
}
