//! W3C trace context from inbound headers.

use opentelemetry::{Context, global, propagation::Extractor, trace::TraceContextExt as _};
use salvo::http::HeaderMap;

/// The caller's trace context, if it sent a valid `traceparent`.
pub(super) fn extract_parent_context(headers: &HeaderMap) -> Option<Context> {
    let extracted = global::get_text_map_propagator(|propagator| {
        // Start from an empty context so a missing header yields no parent at all.
        propagator.extract_with_context(&Context::new(), &Headers(headers))
    });

    extracted
        .span()
        .span_context()
        .is_valid()
        .then_some(extracted)
}

#[derive(Debug)]
struct Headers<'a>(&'a HeaderMap);

impl Extractor for Headers<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}
