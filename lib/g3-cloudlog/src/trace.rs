/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use http::HeaderName;
use uuid::Uuid;

use crate::RequestContext;

pub const CLOUD_TRACE_CONTEXT: HeaderName = HeaderName::from_static("x-cloud-trace-context");
pub const TRACEPARENT: HeaderName = HeaderName::from_static("traceparent");

pub fn default_trace_headers() -> Vec<HeaderName> {
    vec![CLOUD_TRACE_CONTEXT, TRACEPARENT]
}

/// A fresh trace id, 32 lowercase hex digits.
pub fn new_trace_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Reuse the first recognised propagation header verbatim, or generate a new id.
pub fn derive_trace_id(request: &RequestContext, recognised: &[HeaderName]) -> String {
    recognised
        .iter()
        .filter_map(|name| request.header(name))
        .find(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(new_trace_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, Method, Uri};

    fn request() -> RequestContext {
        RequestContext::new(Method::GET, Uri::from_static("/"))
    }

    #[test]
    fn reuse_header_verbatim() {
        let ctx = request().with_header(
            CLOUD_TRACE_CONTEXT,
            HeaderValue::from_static("105445aa7843bc8bf206b12000100000/1;o=1"),
        );
        assert_eq!(
            derive_trace_id(&ctx, &default_trace_headers()),
            "105445aa7843bc8bf206b12000100000/1;o=1"
        );
    }

    #[test]
    fn header_priority() {
        let ctx = request()
            .with_header(TRACEPARENT, HeaderValue::from_static("00-abc-def-01"))
            .with_header(CLOUD_TRACE_CONTEXT, HeaderValue::from_static("abc123"));
        assert_eq!(derive_trace_id(&ctx, &default_trace_headers()), "abc123");
        assert_eq!(derive_trace_id(&ctx, &[TRACEPARENT]), "00-abc-def-01");
    }

    #[test]
    fn empty_header_generates() {
        let ctx = request().with_header(CLOUD_TRACE_CONTEXT, HeaderValue::from_static(""));
        let id = derive_trace_id(&ctx, &default_trace_headers());
        assert_eq!(id.len(), 32);
        assert!(id.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_ids_differ() {
        let ctx = request();
        let id1 = derive_trace_id(&ctx, &default_trace_headers());
        let id2 = derive_trace_id(&ctx, &default_trace_headers());
        assert_ne!(id1, id2);
    }

    #[test]
    fn unrecognised_header_ignored() {
        let ctx = request().with_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("req-1"),
        );
        assert_ne!(derive_trace_id(&ctx, &default_trace_headers()), "req-1");
    }
}
