// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job service configuration

use std::time::Duration;

/// Tunables of the job service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Similar-job cache window. Zero disables the cache.
    pub cache: Duration,
    /// Wall-clock limit on one analyzer run; expiry kills the child and
    /// fails the job with message `"timeout"`. `None` means no limit.
    pub timeout: Option<Duration>,
    /// Maximum number of concurrently running analyzer subprocesses.
    pub pool_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache: Duration::ZERO,
            timeout: None,
            pool_size: 4,
        }
    }
}
