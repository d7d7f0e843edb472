/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use super::LogSink;
use crate::{FlushError, LogEntry, SubmitError};

pub struct DiscardSink;

impl LogSink for DiscardSink {
    fn submit(&self, _entry: LogEntry) -> Result<(), SubmitError> {
        Ok(())
    }

    fn flush(&self) -> Result<(), FlushError> {
        Ok(())
    }
}
