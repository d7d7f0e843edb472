/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use crate::{FlushError, LogEntry, SubmitError};

mod report;
pub(crate) use report::ErrorReporter;

mod discard;
pub use discard::DiscardSink;

mod stream;
pub use stream::{JsonStreamSink, StreamTarget};

#[cfg(test)]
mod buf;
#[cfg(test)]
pub(crate) use buf::BufLogSink;

/// Destination of structured log entries.
///
/// `submit` hands the entry over and may return before it is delivered.
/// `flush` blocks until every entry accepted before the call has been
/// handed off, or reports why that did not happen.
pub trait LogSink {
    fn submit(&self, entry: LogEntry) -> Result<(), SubmitError>;

    fn flush(&self) -> Result<(), FlushError>;
}

pub type ArcLogSink = Arc<dyn LogSink + Send + Sync>;

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn submit(&self, entry: LogEntry) -> Result<(), SubmitError> {
        self.as_ref().submit(entry)
    }

    fn flush(&self) -> Result<(), FlushError> {
        self.as_ref().flush()
    }
}
