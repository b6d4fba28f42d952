// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for `libdd-timeline`.
//!
//! Only structural problems are errors: a region that cannot be obtained, a
//! layout that cannot be expressed, or an event catalog that does not parse.
//! Running out of string arena space and overwriting old ring entries are
//! normal outcomes and never surface here.

use std::io;
use thiserror::Error;

/// Errors that can occur while creating a timeline or loading events into it.
#[derive(Debug, Error)]
pub enum TimelineError {
    /// The backing shared memory region could not be obtained at the
    /// requested size.
    #[error("failed to allocate a {size} byte timeline region: {source}")]
    Allocation {
        /// Total number of bytes requested (header + ring + string arena).
        size: usize,
        /// The underlying operating system error.
        #[source]
        source: io::Error,
    },

    /// The requested sizes cannot be represented by the binary layout.
    #[error("invalid timeline size: {0}")]
    InvalidSize(String),

    /// An event definition in a spec text is malformed.
    #[error("event spec syntax error on line {line}: {reason}")]
    SpecSyntax {
        /// 1-based line number within the spec text.
        line: usize,
        /// What is wrong with the line.
        reason: String,
    },

    /// A fixed-arity entry point was requested with the wrong argument count.
    #[error("event {event} declares {declared} arguments, requested {requested}")]
    ArityMismatch {
        /// Name of the event, without category.
        event: String,
        /// Argument count declared in the event definition.
        declared: usize,
        /// Argument count the caller asked for.
        requested: usize,
    },

    /// No event with this name was loaded into the catalog.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// Reading a spec file or saving a snapshot failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TimelineError {
    pub(crate) fn syntax(line: usize, reason: impl Into<String>) -> Self {
        TimelineError::SpecSyntax {
            line,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TimelineError>;
