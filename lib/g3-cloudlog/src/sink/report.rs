/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{info, warn};

const REPORT_MASK: usize = (1 << 10) - 1;

/// Report errors to the process log, sampled.
///
/// The first two errors of a streak are reported, then every 1024th one.
pub(crate) struct ErrorReporter {
    kind: &'static str,
    error_count: AtomicUsize,
}

impl ErrorReporter {
    pub(crate) const fn new(kind: &'static str) -> Self {
        ErrorReporter {
            kind,
            error_count: AtomicUsize::new(0),
        }
    }

    pub(crate) fn check<E: fmt::Display>(&self, name: &str, r: Result<(), E>) {
        match r {
            Ok(_) => {
                let error_count = self.error_count.swap(0, Ordering::Relaxed);
                if error_count != 0 {
                    info!(
                        "{} {name} back to work after {error_count} errors",
                        self.kind
                    );
                }
            }
            Err(e) => {
                let old_count = self.error_count.fetch_add(1, Ordering::Relaxed);
                match old_count {
                    0 | 1 => warn!("{} {name} failed: {e}", self.kind),
                    _ => {
                        if (old_count & REPORT_MASK) == 0 {
                            warn!(
                                "{} {name} has seen {old_count} errors, latest: {e}",
                                self.kind
                            );
                        }
                    }
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }
}
