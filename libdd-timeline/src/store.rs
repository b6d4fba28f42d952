// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The timeline store: header, entry ring and string arena over one region.
//!
//! # Single writer
//!
//! A store has exactly one writer. The cursors (`next_entry`, the string
//! arena cursor and the rate threshold) are plain [`Cell`]s, so a
//! [`TimelineStore`] is `Send` but not `Sync`: it can be created on one
//! thread and handed to the thread that logs, but never shared between two
//! writers. Nothing stops two *processes* from opening the same region and
//! both writing to it; doing so silently corrupts the log. Readers in other
//! processes may map the region at any time and must tolerate torn entries.

use crate::config::TimelineConfig;
use crate::error::{Result, TimelineError};
use crate::layout::{Entry, Header, ENTRY_SIZE, HEADER_SIZE, STRING_ALIGN};
use crate::rate::RATE_FILTER_ALL;
use crate::region::SharedRegion;
use crate::string_table::{StringId, StringTable, MAX_STRINGS_BYTES};
use core::cell::Cell;
use core::fmt;
use core::ptr::NonNull;
use std::path::Path;
use tracing::{info, warn};

/// Sizes of the three parts of a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RegionLayout {
    pub num_entries: usize,
    pub log_bytes: u32,
    pub strings_bytes: u32,
}

impl RegionLayout {
    pub(crate) fn new(num_entries: usize, strings_bytes: usize) -> Result<Self> {
        if num_entries == 0 {
            return Err(TimelineError::InvalidSize(
                "the entry ring needs at least one entry".to_owned(),
            ));
        }
        let log_bytes = num_entries
            .checked_mul(ENTRY_SIZE)
            .and_then(|bytes| u32::try_from(bytes).ok())
            .ok_or_else(|| {
                TimelineError::InvalidSize(format!(
                    "{num_entries} entries do not fit in a 32-bit ring size"
                ))
            })?;
        if strings_bytes % STRING_ALIGN != 0 {
            return Err(TimelineError::InvalidSize(format!(
                "string arena size {strings_bytes} is not a multiple of {STRING_ALIGN}"
            )));
        }
        if strings_bytes > MAX_STRINGS_BYTES {
            return Err(TimelineError::InvalidSize(format!(
                "string arena size {strings_bytes} exceeds the {MAX_STRINGS_BYTES} bytes a 16-bit id can address"
            )));
        }
        Ok(Self {
            num_entries,
            log_bytes,
            // Bounded by MAX_STRINGS_BYTES above.
            strings_bytes: strings_bytes as u32,
        })
    }

    pub(crate) fn total_size(&self) -> usize {
        HEADER_SIZE + self.log_bytes as usize + self.strings_bytes as usize
    }
}

/// A live timeline bound to a mapped region.
pub struct TimelineStore {
    base: NonNull<u8>,
    entries: NonNull<Entry>,
    num_entries: usize,
    size: usize,
    next_entry: Cell<usize>,
    rate: Cell<u8>,
    strings: StringTable,
    _region: Box<dyn SharedRegion + Send>,
}

// SAFETY: the store owns its region; the cursors make it !Sync, which is
// what enforces a single writer within the process.
unsafe impl Send for TimelineStore {}

impl TimelineStore {
    fn new(region: Box<dyn SharedRegion + Send>, layout: RegionLayout) -> Result<Self> {
        let block = region.region();
        let size = layout.total_size();
        if block.len() < size {
            return Err(TimelineError::InvalidSize(format!(
                "region of {} bytes cannot hold a {size} byte timeline",
                block.len()
            )));
        }
        let base = block.cast::<u8>();
        if base.as_ptr() as usize % core::mem::align_of::<Entry>() != 0 {
            return Err(TimelineError::InvalidSize(
                "region is not 8-byte aligned".to_owned(),
            ));
        }

        // SAFETY: the region holds at least `size` bytes and is aligned for
        // Header and Entry; offsets below stay within `size`.
        let (entries, strings) = unsafe {
            core::ptr::write_bytes(base.as_ptr(), 0, size);
            base.cast::<Header>()
                .as_ptr()
                .write(Header::new(layout.log_bytes, layout.strings_bytes));
            let entries = base.add(HEADER_SIZE).cast::<Entry>();
            let arena = base.add(HEADER_SIZE + layout.log_bytes as usize);
            (
                entries,
                StringTable::new(arena, layout.strings_bytes as usize),
            )
        };

        Ok(Self {
            base,
            entries,
            num_entries: layout.num_entries,
            size,
            next_entry: Cell::new(0),
            rate: Cell::new(0),
            strings,
            _region: region,
        })
    }

    /// Number of slots in the entry ring.
    pub fn num_entries(&self) -> usize {
        self.num_entries
    }

    /// Slot the next logged event will be written to.
    pub fn next_entry(&self) -> usize {
        self.next_entry.get()
    }

    /// Bytes of the string arena used so far (a multiple of 16).
    pub fn next_string(&self) -> usize {
        self.strings.used()
    }

    pub fn strings_bytes(&self) -> usize {
        self.strings.capacity()
    }

    /// Total size of the region in use: header, ring and arena.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn header(&self) -> Header {
        // SAFETY: written in `new`, never modified afterwards.
        unsafe { self.base.cast::<Header>().as_ptr().read() }
    }

    /// Copy of ring slot `index`.
    pub fn entry(&self, index: usize) -> Option<Entry> {
        if index >= self.num_entries {
            return None;
        }
        // SAFETY: index is in bounds of the ring.
        Some(unsafe { self.entries.as_ptr().add(index).read() })
    }

    /// Interns `s` in the string arena, returning [`StringId::OVERFLOW`]
    /// when there is no room left.
    pub fn intern(&self, s: &str) -> StringId {
        self.strings.intern(s)
    }

    /// Text of an interned string; `None` for the overflow id.
    pub fn string(&self, id: StringId) -> Option<&str> {
        self.strings.get(id)
    }

    /// Byte-exact copy of the region as a reader would see it.
    pub fn snapshot(&self) -> Vec<u8> {
        // SAFETY: the region is valid for `size` bytes; the copy is taken
        // while no write can happen since writes need this thread.
        let bytes = unsafe { core::slice::from_raw_parts(self.base.as_ptr(), self.size) };
        bytes.to_vec()
    }

    /// Writes a snapshot of the region to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.snapshot())?;
        Ok(())
    }

    pub(crate) fn rate_cell(&self) -> &Cell<u8> {
        &self.rate
    }

    pub(crate) fn next_entry_cell(&self) -> &Cell<usize> {
        &self.next_entry
    }

    pub(crate) fn entries_ptr(&self) -> NonNull<Entry> {
        self.entries
    }
}

impl fmt::Debug for TimelineStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineStore")
            .field("num_entries", &self.num_entries)
            .field("next_entry", &self.next_entry.get())
            .field("next_string", &self.strings.used())
            .field("strings_bytes", &self.strings.capacity())
            .field("rate", &self.rate.get())
            .finish()
    }
}

/// A timeline, or the no-op stand-in used when tracing is turned off.
#[derive(Debug)]
pub enum Timeline {
    Enabled(TimelineStore),
    Disabled,
}

impl Timeline {
    /// Creates a timeline backed by a file mapped at `path`.
    ///
    /// Returns [`Timeline::Disabled`] without touching the filesystem when
    /// `config` has tracing turned off.
    #[cfg(unix)]
    pub fn create(path: impl AsRef<Path>, config: &TimelineConfig) -> Result<Timeline> {
        if !config.enabled() {
            return Ok(Timeline::Disabled);
        }
        let path = path.as_ref();
        let layout = RegionLayout::new(config.num_entries(), config.string_bytes())?;
        let size = layout.total_size();
        let region = crate::region::FileRegion::create(path, size)
            .map_err(|source| TimelineError::Allocation { size, source })?;
        let store = TimelineStore::new(Box::new(region), layout)?;
        info!(
            path = %path.display(),
            num_entries = layout.num_entries,
            strings_bytes = layout.strings_bytes,
            "created timeline"
        );
        Ok(Timeline::Enabled(store))
    }

    /// Creates a timeline in a caller-provided region.
    pub fn create_in<R>(region: R, config: &TimelineConfig) -> Result<Timeline>
    where
        R: SharedRegion + Send + 'static,
    {
        if !config.enabled() {
            return Ok(Timeline::Disabled);
        }
        let layout = RegionLayout::new(config.num_entries(), config.string_bytes())?;
        let store = TimelineStore::new(Box::new(region), layout)?;
        info!(
            num_entries = layout.num_entries,
            strings_bytes = layout.strings_bytes,
            "created timeline"
        );
        Ok(Timeline::Enabled(store))
    }

    /// Like [`create`](Self::create), but falls back to a disabled timeline
    /// when the store cannot be created. Tracing never takes the process down.
    #[cfg(unix)]
    pub fn create_or_disable(path: impl AsRef<Path>, config: &TimelineConfig) -> Timeline {
        let path = path.as_ref();
        match Self::create(path, config) {
            Ok(timeline) => timeline,
            Err(e) => {
                warn!(path = %path.display(), "timeline disabled: {e}");
                Timeline::Disabled
            }
        }
    }

    pub fn disabled() -> Timeline {
        Timeline::Disabled
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Timeline::Enabled(_))
    }

    pub fn store(&self) -> Option<&TimelineStore> {
        match self {
            Timeline::Enabled(store) => Some(store),
            Timeline::Disabled => None,
        }
    }

    /// See [`TimelineStore::intern`]. A disabled timeline stores nothing and
    /// always answers [`StringId::OVERFLOW`].
    pub fn intern(&self, s: &str) -> StringId {
        match self {
            Timeline::Enabled(store) => store.intern(s),
            Timeline::Disabled => StringId::OVERFLOW,
        }
    }

    /// Current rate threshold, or [`RATE_FILTER_ALL`] when disabled.
    pub fn rate(&self) -> u8 {
        self.store().map_or(RATE_FILTER_ALL, TimelineStore::rate)
    }

    /// Sets the rate threshold. No-op when disabled.
    pub fn set_rate(&self, rate: u8) {
        if let Some(store) = self.store() {
            store.set_rate(rate);
        }
    }
}
