// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Process-wide timeline configuration.

use std::sync::OnceLock;

/// Turns the timeline on or off for the whole process.
pub const ENV_ENABLED: &str = "DD_TIMELINE_ENABLED";
/// Overrides the number of ring entries.
pub const ENV_NUM_ENTRIES: &str = "DD_TIMELINE_NUM_ENTRIES";
/// Overrides the size of the string arena in bytes.
pub const ENV_STRING_BYTES: &str = "DD_TIMELINE_STRING_BYTES";

/// Default number of 64 byte slots in the entry ring.
pub const DEFAULT_NUM_ENTRIES: usize = 1_000_000;
/// Default size of the interned string arena.
pub const DEFAULT_STRING_BYTES: usize = 1_000_000;

pub mod parse_env {
    use std::{env, str::FromStr};

    pub fn int<T: FromStr>(name: &str) -> Option<T> {
        env::var(name).ok()?.trim().parse::<T>().ok()
    }

    pub fn bool(name: &str) -> Option<bool> {
        match env::var(name).ok()?.as_str() {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
            _ => Some(false),
        }
    }
}

/// Settings consumed when a timeline is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineConfig {
    enabled: bool,
    num_entries: usize,
    string_bytes: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            num_entries: DEFAULT_NUM_ENTRIES,
            string_bytes: DEFAULT_STRING_BYTES,
        }
    }
}

impl TimelineConfig {
    /// Reads the configuration from the environment, falling back to the
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: parse_env::bool(ENV_ENABLED).unwrap_or(defaults.enabled),
            num_entries: parse_env::int(ENV_NUM_ENTRIES).unwrap_or(defaults.num_entries),
            string_bytes: parse_env::int(ENV_STRING_BYTES).unwrap_or(defaults.string_bytes),
        }
    }

    /// The configuration of this process, read from the environment the
    /// first time it is asked for and fixed afterwards.
    pub fn global() -> &'static TimelineConfig {
        static GLOBAL: OnceLock<TimelineConfig> = OnceLock::new();
        GLOBAL.get_or_init(Self::from_env)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_num_entries(mut self, num_entries: usize) -> Self {
        self.num_entries = num_entries;
        self
    }

    pub fn with_string_bytes(mut self, string_bytes: usize) -> Self {
        self.string_bytes = string_bytes;
        self
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn num_entries(&self) -> usize {
        self.num_entries
    }

    pub fn string_bytes(&self) -> usize {
        self.string_bytes
    }
}
