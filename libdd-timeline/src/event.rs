// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Entry points produced by loading an event catalog.

use crate::error::{Result, TimelineError};
use crate::layout::MAX_ARGS;
use crate::store::TimelineStore;
use crate::string_table::StringId;

/// An event bound to a timeline, callable with its declared arguments.
///
/// On a disabled timeline the event holds no store and every call is a
/// no-op.
#[derive(Clone, Debug)]
pub struct BoundEvent<'t> {
    store: Option<&'t TimelineStore>,
    name: String,
    id: StringId,
    rate: u8,
    arity: usize,
}

impl<'t> BoundEvent<'t> {
    pub(crate) fn new(
        store: Option<&'t TimelineStore>,
        name: String,
        id: StringId,
        rate: u8,
        arity: usize,
    ) -> Self {
        debug_assert!(arity <= MAX_ARGS);
        Self {
            store,
            name,
            id,
            rate,
            arity,
        }
    }

    /// Event name as declared, without category or attributes.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Interned message id; [`StringId::OVERFLOW`] if the arena was full or
    /// the timeline is disabled.
    pub fn id(&self) -> StringId {
        self.id
    }

    pub fn rate(&self) -> u8 {
        self.rate
    }

    /// Number of arguments declared in the event definition.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Records the event. The first [`arity`](Self::arity) values of `args`
    /// are stored; missing ones are recorded as `0.0` and extra ones are
    /// ignored. Use [`typed`](Self::typed) to have the argument count
    /// checked up front.
    #[inline]
    pub fn log(&self, args: &[f64]) {
        if let Some(store) = self.store {
            let mut slots = [0.0; MAX_ARGS];
            let n = args.len().min(self.arity);
            slots[..n].copy_from_slice(&args[..n]);
            store.log(self.rate, self.id, slots);
        }
    }

    /// Fixed-arity entry point taking exactly `N` arguments.
    ///
    /// Fails if `N` differs from the declared argument count. On a disabled
    /// timeline any `N` is accepted since the result does nothing.
    pub fn typed<const N: usize>(&self) -> Result<Event<'t, N>> {
        const { assert!(N <= MAX_ARGS, "events take at most 6 arguments") };
        if self.store.is_some() && N != self.arity {
            return Err(TimelineError::ArityMismatch {
                event: self.name.clone(),
                declared: self.arity,
                requested: N,
            });
        }
        Ok(Event {
            store: self.store,
            id: self.id,
            rate: self.rate,
        })
    }
}

/// A bound event whose argument count is part of its type.
#[derive(Clone, Copy, Debug)]
pub struct Event<'t, const N: usize> {
    store: Option<&'t TimelineStore>,
    id: StringId,
    rate: u8,
}

impl<const N: usize> Event<'_, N> {
    #[inline(always)]
    pub fn log(&self, args: [f64; N]) {
        if let Some(store) = self.store {
            let mut slots = [0.0; MAX_ARGS];
            slots[..N].copy_from_slice(&args);
            store.log(self.rate, self.id, slots);
        }
    }

    pub fn id(&self) -> StringId {
        self.id
    }

    pub fn rate(&self) -> u8 {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimelineConfig;
    use crate::region::HeapRegion;
    use crate::store::Timeline;

    fn timeline() -> Timeline {
        let config = TimelineConfig::default()
            .with_num_entries(4)
            .with_string_bytes(256);
        Timeline::create_in(HeapRegion::new(1024), &config).unwrap()
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn dynamic_log_pads_and_truncates() {
        let timeline = timeline();
        let store = timeline.store().unwrap();
        let event = BoundEvent::new(Some(store), "two".to_owned(), StringId::new(0), 0, 2);

        event.log(&[1.0]);
        assert_eq!(store.entry(0).unwrap().args, [1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

        event.log(&[1.0, 2.0, 3.0]);
        assert_eq!(store.entry(1).unwrap().args, [1.0, 2.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn typed_checks_arity() {
        let timeline = timeline();
        let store = timeline.store().unwrap();
        let event = BoundEvent::new(Some(store), "two".to_owned(), StringId::new(0), 0, 2);

        assert!(matches!(
            event.typed::<3>(),
            Err(TimelineError::ArityMismatch {
                declared: 2,
                requested: 3,
                ..
            })
        ));
        let typed = event.typed::<2>().unwrap();
        typed.log([7.0, 8.0]);
        assert_eq!(store.entry(0).unwrap().args[..2], [7.0, 8.0]);
        assert_eq!(store.next_entry(), 1);
    }

    #[test]
    fn disabled_event_accepts_anything() {
        let event = BoundEvent::new(None, "two".to_owned(), StringId::OVERFLOW, 0, 2);
        event.log(&[]);
        event.log(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        event.typed::<0>().unwrap().log([]);
        event.typed::<6>().unwrap().log([0.0; 6]);
    }
}
