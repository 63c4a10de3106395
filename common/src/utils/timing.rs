// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::time::{Duration, Instant};

/// Optional wall-clock measurement of a pipeline step.
///
/// Disabled stopwatches cost nothing and report nothing, which keeps the
/// `--timing` checks out of the call sites.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Option<Instant>,
}

impl Stopwatch {
    pub fn start(enabled: bool) -> Self {
        Self {
            started: enabled.then(Instant::now),
        }
    }

    /// Elapsed time since `start`, `None` when timing is disabled.
    pub fn elapsed(&self) -> Option<Duration> {
        self.started.map(|s| s.elapsed())
    }
}

/// Tracks how many status checks a polling loop has issued.
#[derive(Debug, Clone, Copy)]
pub struct PollBudget {
    max_attempts: Option<u32>,
    attempts: u32,
}

impl PollBudget {
    /// `None` means the loop may run until a terminal state is reached.
    pub fn new(max_attempts: Option<u32>) -> Self {
        Self {
            max_attempts,
            attempts: 0,
        }
    }

    /// Records one more attempt. Returns `false` once the cap is exhausted,
    /// in which case no attempt was recorded.
    pub fn try_consume(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.attempts += 1;
        true
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_attempts.is_some_and(|max| self.attempts >= max)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
