//! Per-request span, request id and access log.

mod parent_context;
mod request_ids;
mod spans;

use std::time::{Duration, Instant};

use salvo::{
    Request, handler,
    http::StatusCode,
    prelude::{Depot, FlowCtrl, Response},
};
use tracing::{Instrument as _, Span, error, info, warn};
use tracing_opentelemetry::OpenTelemetrySpanExt as _;

use super::{metrics, settings};

const REQUEST_ID_DEPOT_KEY: &str = "request_id";

/// Probe endpoints scraped every few seconds; logging them is noise.
const UNLOGGED_PATHS: [&str; 2] = ["/metrics", "/healthcheck"];

/// What the access log needs once the handler chain has run.
#[derive(Debug)]
struct RequestInfo {
    request_id: String,
    method: String,
    path: String,
    route: String,
}

#[handler]
pub(crate) async fn request_logging(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    if UNLOGGED_PATHS.contains(&req.uri().path()) {
        ctrl.call_next(req, depot, res).await;
        return;
    }

    let started = Instant::now();

    let request_id =
        request_ids::resolve_request_id(req.header::<String>(request_ids::REQUEST_ID_HEADER));

    depot.insert(REQUEST_ID_DEPOT_KEY, request_id.clone());
    request_ids::set_request_id_header(res, &request_id);

    let method = req.method().to_string();
    let path = req.uri().path().to_owned();
    let spans::RequestSpanName {
        otel_path,
        otel_span_name,
    } = spans::request_span_name(&method, &path);

    let info = RequestInfo {
        request_id,
        method,
        path,
        route: otel_path,
    };

    let span = tracing::info_span!(
        parent: None,
        "http.request",
        otel.name = %otel_span_name,
        otel.kind = "server",
        request_id = %info.request_id,
        method = %info.method,
        path = %info.path,
        remote_addr = %req.remote_addr(),
        status = tracing::field::Empty,
        duration_ms = tracing::field::Empty
    );

    if settings::otel_parent_propagation_enabled()
        && let Some(parent) = parent_context::extract_parent_context(req.headers())
        && let Err(source) = span.set_parent(parent)
    {
        warn!("failed to attach propagated trace context: {source}");
    }

    {
        let _in_flight = metrics::InFlightRequestGuard::track();

        ctrl.call_next(req, depot, res)
            .instrument(span.clone())
            .await;
    }

    let status = request_ids::response_status_or_ok(res.status_code);
    let elapsed = started.elapsed();

    metrics::observe_request(
        &info.method,
        &info.route,
        status.as_u16(),
        elapsed.as_secs_f64(),
    );

    span.in_scope(|| log_outcome(&span, &info, status, elapsed));
}

fn log_outcome(span: &Span, info: &RequestInfo, status: StatusCode, elapsed: Duration) {
    let duration_ms = elapsed.as_millis();
    let threshold_ms = u128::from(settings::slow_request_threshold_ms());
    let code = status.as_u16();

    span.record("status", code);
    span.record("duration_ms", duration_ms);

    info!(status = code, duration_ms, "request.completed");

    if status.is_server_error() {
        error!(
            status = code,
            method = %info.method,
            path = %info.path,
            request_id = %info.request_id,
            "request failed"
        );
    } else if status.is_client_error() {
        warn!(
            status = code,
            method = %info.method,
            path = %info.path,
            request_id = %info.request_id,
            "request rejected"
        );
    }

    if duration_ms > threshold_ms {
        warn!(
            method = %info.method,
            route = %info.route,
            request_id = %info.request_id,
            duration_ms,
            threshold_ms,
            "slow request"
        );
    }
}
