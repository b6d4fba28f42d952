// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Rate threshold consulted on every logging call.
//!
//! An event is recorded when its rate class is at least the threshold, so a
//! higher threshold filters out more of the low-rate events.

use crate::store::TimelineStore;

/// Threshold that filters out every event. Event rate classes are limited to
/// `0..RATE_FILTER_ALL`, so nothing passes it.
pub const RATE_FILTER_ALL: u8 = u8::MAX;

impl TimelineStore {
    pub fn rate(&self) -> u8 {
        self.rate_cell().get()
    }

    /// Only the single writer of this store may change the threshold.
    pub fn set_rate(&self, rate: u8) {
        self.rate_cell().set(rate);
    }
}
