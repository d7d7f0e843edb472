/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("format failed: {0}")]
    FormatFailed(#[from] serde_json::Error),
    #[error("channel overflow")]
    ChannelOverflow,
    #[error("channel closed")]
    ChannelClosed,
}

#[derive(Debug, Error)]
pub enum FlushError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("sink closed")]
    Closed,
    #[error("io failed: {0:?}")]
    IoFailed(#[from] io::Error),
}
