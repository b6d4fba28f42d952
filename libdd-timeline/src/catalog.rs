// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Event catalogs: textual event definitions compiled into bound events.
//!
//! A spec text is a list of definitions. Each one starts with a header line
//!
//! ```text
//! priority,rate|event_name: arg0 arg1 ...
//! ```
//!
//! followed by free-form description lines up to the next header. A line is
//! a header when it starts with `digits,digits|`; anything else, including a
//! line that merely starts with a digit, belongs to the description above
//! it. Blank lines may appear anywhere, other text before the first header
//! is an error.
//!
//! Loading a catalog interns one message per event,
//!
//! ```text
//! priority,rate|category.event_name key=value ...: arg0 arg1 ...
//! description
//! ```
//!
//! which is what readers of the region see as the event's format string.

use crate::error::{Result, TimelineError};
use crate::event::{BoundEvent, Event};
use crate::layout::MAX_ARGS;
use crate::rate::RATE_FILTER_ALL;
use crate::store::Timeline;
use hashbrown::HashMap;
use std::path::Path;
use tracing::debug;

/// One event definition from a spec text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct EventSpec<'a> {
    pub line: usize,
    pub priority: u8,
    pub rate: u8,
    pub name: &'a str,
    /// Everything after the colon on the header line, verbatim.
    pub signature: &'a str,
    pub arity: usize,
    pub description: Vec<&'a str>,
}

impl EventSpec<'_> {
    /// The string interned for this event.
    pub(crate) fn message(&self, category: &str, attributes: &[(&str, &str)]) -> String {
        let mut message = format!("{},{}|", self.priority, self.rate);
        if !category.is_empty() {
            message.push_str(category);
            message.push('.');
        }
        message.push_str(self.name);
        for (key, value) in attributes {
            message.push(' ');
            message.push_str(key);
            message.push('=');
            message.push_str(value);
        }
        message.push(':');
        message.push_str(self.signature);
        for line in &self.description {
            message.push('\n');
            message.push_str(line);
        }
        message
    }
}

/// Splits `priority,rate|rest` when the line starts like a header.
fn split_header(line: &str) -> Option<(&str, &str, &str)> {
    let (levels, rest) = line.split_once('|')?;
    let (priority, rate) = levels.split_once(',')?;
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    (digits(priority) && digits(rate)).then_some((priority, rate, rest))
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn parse_header<'a>(
    line: usize,
    priority: &str,
    rate: &str,
    rest: &'a str,
) -> Result<EventSpec<'a>> {
    let priority: u8 = priority
        .parse::<u8>()
        .map_err(|_| TimelineError::syntax(line, format!("invalid priority {priority:?}")))?;
    let rate: u8 = rate
        .parse::<u8>()
        .ok()
        .filter(|&rate| rate < RATE_FILTER_ALL)
        .ok_or_else(|| TimelineError::syntax(line, format!("invalid rate {rate:?}")))?;

    let (name, signature) = rest
        .split_once(':')
        .ok_or_else(|| TimelineError::syntax(line, "missing ':' after event name"))?;
    if !is_valid_name(name) {
        return Err(TimelineError::syntax(
            line,
            format!("invalid event name {name:?}"),
        ));
    }
    let signature = signature.trim_end();
    let arity = signature.split_whitespace().count();
    if arity > MAX_ARGS {
        return Err(TimelineError::syntax(
            line,
            format!("event {name} declares {arity} arguments, at most {MAX_ARGS} are allowed"),
        ));
    }

    Ok(EventSpec {
        line,
        priority,
        rate,
        name,
        signature,
        arity,
        description: Vec::new(),
    })
}

fn finish(spec: &mut EventSpec<'_>) {
    while spec.description.last().is_some_and(|l| l.trim().is_empty()) {
        spec.description.pop();
    }
}

/// Splits a spec text into event definitions.
pub(crate) fn parse(text: &str) -> Result<Vec<EventSpec<'_>>> {
    let mut specs: Vec<EventSpec<'_>> = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let raw = raw.trim_end();
        if let Some((priority, rate, rest)) = split_header(raw) {
            if let Some(previous) = specs.last_mut() {
                finish(previous);
            }
            let spec = parse_header(line, priority, rate, rest)?;
            if let Some(first) = specs.iter().find(|s| s.name == spec.name) {
                return Err(TimelineError::syntax(
                    line,
                    format!(
                        "event {} is already defined on line {}",
                        spec.name, first.line
                    ),
                ));
            }
            specs.push(spec);
        } else if let Some(current) = specs.last_mut() {
            if !(current.description.is_empty() && raw.trim().is_empty()) {
                current.description.push(raw);
            }
        } else if !raw.trim().is_empty() {
            return Err(TimelineError::syntax(
                line,
                "expected an event definition of the form priority,rate|name: args",
            ));
        }
    }
    if let Some(last) = specs.last_mut() {
        finish(last);
    }
    Ok(specs)
}

/// Bound events of one category, keyed by event name.
#[derive(Debug)]
pub struct EventCatalog<'t> {
    category: String,
    events: HashMap<String, BoundEvent<'t>>,
}

impl<'t> EventCatalog<'t> {
    /// Parses `spec`, interns every event's message and binds it to
    /// `timeline`.
    ///
    /// `attributes` are spliced into every message in order, which lets
    /// several instances of one component tell their events apart.
    /// Syntax errors are reported before anything is interned. Defining the
    /// same event name twice in one spec text is a syntax error rather than
    /// the later definition silently replacing the earlier one.
    pub fn load(
        timeline: &'t Timeline,
        category: &str,
        spec: &str,
        attributes: &[(&str, &str)],
    ) -> Result<Self> {
        let specs = parse(spec)?;
        let store = timeline.store();
        let events: HashMap<String, BoundEvent<'t>> = specs
            .iter()
            .map(|spec| {
                let id = timeline.intern(&spec.message(category, attributes));
                let name = spec.name.to_owned();
                let event = BoundEvent::new(store, name.clone(), id, spec.rate, spec.arity);
                (name, event)
            })
            .collect();
        debug!(
            category,
            events = events.len(),
            enabled = timeline.is_enabled(),
            "loaded timeline events"
        );
        Ok(Self {
            category: category.to_owned(),
            events,
        })
    }

    /// [`load`](Self::load) with the spec text read from `path`.
    pub fn load_file(
        timeline: &'t Timeline,
        category: &str,
        path: impl AsRef<Path>,
        attributes: &[(&str, &str)],
    ) -> Result<Self> {
        let spec = std::fs::read_to_string(path)?;
        Self::load(timeline, category, &spec, attributes)
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn get(&self, name: &str) -> Option<&BoundEvent<'t>> {
        self.events.get(name)
    }

    /// Fixed-arity entry point for `name`, see [`BoundEvent::typed`].
    pub fn event<const N: usize>(&self, name: &str) -> Result<Event<'t, N>> {
        self.get(name)
            .ok_or_else(|| TimelineError::UnknownEvent(name.to_owned()))?
            .typed::<N>()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundEvent<'t>)> {
        self.events.iter().map(|(name, event)| (name.as_str(), event))
    }
}
