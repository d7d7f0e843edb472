/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::LogSink;
use crate::{FlushError, LogEntry, SubmitError};

#[derive(Default)]
pub(crate) struct BufLogSink {
    entries: Mutex<Vec<LogEntry>>,
    flush_count: AtomicUsize,
    fail_submit: AtomicBool,
    fail_flush: AtomicBool,
}

impl BufLogSink {
    pub(crate) fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub(crate) fn flush_count(&self) -> usize {
        self.flush_count.load(Ordering::Relaxed)
    }

    pub(crate) fn set_fail_submit(&self, fail: bool) {
        self.fail_submit.store(fail, Ordering::Relaxed);
    }

    pub(crate) fn set_fail_flush(&self, fail: bool) {
        self.fail_flush.store(fail, Ordering::Relaxed);
    }
}

impl LogSink for BufLogSink {
    fn submit(&self, entry: LogEntry) -> Result<(), SubmitError> {
        if self.fail_submit.load(Ordering::Relaxed) {
            return Err(SubmitError::ChannelClosed);
        }
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn flush(&self) -> Result<(), FlushError> {
        self.flush_count.fetch_add(1, Ordering::Relaxed);
        if self.fail_flush.load(Ordering::Relaxed) {
            Err(FlushError::Closed)
        } else {
            Ok(())
        }
    }
}
