use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    HttpMessage,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::trace_ctx::{with_trace_id, TraceId};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

static INBOUND_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]{8,64}$").expect("request id pattern"));

/// Picks the trace id for a request: a well-formed `x-request-id` sent by
/// the client (e.g. the admin console correlating its own calls), or a
/// fresh v4 uuid.
pub fn resolve_trace_id(inbound: Option<&HeaderValue>) -> String {
    inbound
        .and_then(|value| value.to_str().ok())
        .filter(|id| INBOUND_ID.is_match(id))
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Runs each request under its trace id and echoes it as `x-request-id`.
pub struct RequestTrace;

impl<S, B> Transform<S, ServiceRequest> for RequestTrace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RequestTraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestTraceMiddleware { service }))
    }
}

pub struct RequestTraceMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestTraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = resolve_trace_id(req.headers().get(REQUEST_ID_HEADER));
        req.extensions_mut().insert(TraceId(trace_id.clone()));
        let echoed = HeaderValue::from_str(&trace_id).ok();

        let fut = self.service.call(req);
        Box::pin(with_trace_id(trace_id, async move {
            let mut res = fut.await?;
            if let Some(value) = echoed {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }
            Ok(res)
        }))
    }
}
