/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::sink::{ArcLogSink, ErrorReporter};
use crate::{FlushError, LogEntry, MonitoredResource, Severity};

/// Named logger writing individual entries to a sink.
///
/// All emit methods are fire-and-forget: an entry the sink refuses is
/// dropped, counted by the sink and reported to the process log, but never
/// returned to the caller and never retried.
pub struct Logger {
    sink: ArcLogSink,
    log_name: String,
    labels: Arc<BTreeMap<String, String>>,
    resource: Option<Arc<MonitoredResource>>,
    reporter: ErrorReporter,
}

impl Logger {
    pub fn new(sink: ArcLogSink, log_name: String) -> Self {
        Logger {
            sink,
            log_name,
            labels: Arc::new(BTreeMap::new()),
            resource: None,
            reporter: ErrorReporter::new("cloud logger"),
        }
    }

    pub fn with_labels(mut self, labels: Arc<BTreeMap<String, String>>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_resource(mut self, resource: Arc<MonitoredResource>) -> Self {
        self.resource = Some(resource);
        self
    }

    #[inline]
    pub fn log_name(&self) -> &str {
        &self.log_name
    }

    pub(crate) fn build_entry<T: Into<String>>(&self, payload: T, severity: Severity) -> LogEntry {
        LogEntry::new(severity, payload)
            .with_log_name(self.log_name.clone())
            .with_labels(&self.labels)
            .with_resource(self.resource.as_deref())
    }

    pub(crate) fn submit(&self, entry: LogEntry) {
        self.reporter.check(&self.log_name, self.sink.submit(entry));
    }

    pub fn emit<T: Into<String>>(&self, payload: T, severity: Severity) {
        self.submit(self.build_entry(payload, severity));
    }

    impl_severity_methods!();

    pub fn flush(&self) -> Result<(), FlushError> {
        self.sink.flush()
    }
}
