/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{self, Write};
#[cfg(test)]
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use http::HeaderName;

use crate::{FlushError, HttpRequestInfo, LogEntry, Logger, RequestContext, Severity};

enum LocalEcho {
    Stderr,
    #[cfg(test)]
    Buf(Arc<Mutex<Vec<u8>>>),
}

impl LocalEcho {
    fn write_line(&self, severity: Severity, payload: &str) {
        match self {
            LocalEcho::Stderr => {
                let mut stderr = io::stderr().lock();
                let _ = writeln!(stderr, "{severity}: {payload}");
            }
            #[cfg(test)]
            LocalEcho::Buf(buf) => {
                let mut buf = buf.lock().unwrap();
                let _ = writeln!(buf, "{severity}: {payload}");
            }
        }
    }
}

/// Request scoped logger.
///
/// Every entry is written to the entry logger tagged with the trace id of
/// the request and its http block, without status and latency. [`finish`](ScopedLogger::finish) then writes one summary
/// entry to the parent logger, carrying the highest severity seen, the
/// request and its latency, so the backend can group the child entries
/// under it.
///
/// `finish` consumes the logger, so nothing can be emitted after it and it
/// can not be called twice. A logger dropped without `finish` writes no
/// summary, its entries stay individual ones.
///
/// The emit methods take `&mut self`; the logger is meant to be owned by the
/// single task that handles the request.
pub struct ScopedLogger {
    entry_logger: Logger,
    parent_logger: Logger,
    request: RequestContext,
    child_http: HttpRequestInfo,
    trace_id: String,
    severities: Vec<Severity>,
    response_status: Option<u16>,
    start_instant: Instant,
    local: Option<LocalEcho>,
}

impl ScopedLogger {
    pub fn new(
        entry_logger: Logger,
        parent_logger: Logger,
        request: RequestContext,
        trace_headers: &[HeaderName],
    ) -> Self {
        let trace_id = crate::trace::derive_trace_id(&request, trace_headers);
        let child_http = request.http_info();
        ScopedLogger {
            entry_logger,
            parent_logger,
            request,
            child_http,
            trace_id,
            severities: Vec::new(),
            response_status: None,
            start_instant: Instant::now(),
            local: None,
        }
    }

    /// Also print every entry as `<SEVERITY>: <payload>` to stderr.
    pub fn enable_local(&mut self, flag: bool) {
        self.local = if flag { Some(LocalEcho::Stderr) } else { None };
    }

    #[cfg(test)]
    fn echo_to_buf(&mut self, buf: Arc<Mutex<Vec<u8>>>) {
        self.local = Some(LocalEcho::Buf(buf));
    }

    pub fn set_response_status(&mut self, status: u16) {
        self.response_status = Some(status);
    }

    #[inline]
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    #[inline]
    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start_instant.elapsed()
    }

    pub fn max_severity(&self) -> Severity {
        Severity::max_of(self.severities.iter().copied())
    }

    pub fn emit<T: Into<String>>(&mut self, payload: T, severity: Severity) {
        let payload = payload.into();
        if let Some(local) = &self.local {
            local.write_line(severity, &payload);
        }
        let entry = self
            .entry_logger
            .build_entry(payload, severity)
            .with_trace(self.trace_id.clone())
            .with_http_request(self.child_http.clone());
        self.entry_logger.submit(entry);
        self.severities.push(severity);
    }

    impl_severity_methods!(mut);

    fn summary_entry(&self, latency: Option<Duration>) -> LogEntry {
        let mut http_info = self.request.http_info();
        http_info.latency = latency;
        http_info.status = self.response_status;
        self.parent_logger
            .build_entry(String::new(), self.max_severity())
            .with_trace(self.trace_id.clone())
            .with_http_request(http_info)
    }

    /// Write an interim summary entry without latency.
    ///
    /// Meant for long running requests, so the backend can show the entries
    /// collected so far. This does not flush.
    pub fn partial_finish(&self) {
        self.parent_logger.submit(self.summary_entry(None));
    }

    /// Write the summary entry and flush the parent sink.
    pub fn finish(self) -> Result<(), FlushError> {
        let latency = self.start_instant.elapsed();
        self.parent_logger.submit(self.summary_entry(Some(latency)));
        self.parent_logger.flush()
    }
}
