// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Bump-allocated string arena with 16-bit ids.
//!
//! Strings are stored null-terminated, each starting on a 16 byte boundary,
//! so the id of a string is its byte offset divided by 16. A 16-bit id thus
//! addresses at most `0xFFFF * 16` bytes; the id `0xFFFF` itself is reserved
//! to mean "the arena was full, the text is lost".
//!
//! The arena only ever grows. De-duplication uses a process-local side table
//! that never touches the shared region, so readers never see it.

use crate::layout::STRING_ALIGN;
use core::cell::{Cell, RefCell};
use core::ptr::NonNull;
use hashbrown::HashMap;
use tracing::warn;

/// Largest arena addressable by a [`StringId`].
pub const MAX_STRINGS_BYTES: usize = StringId::OVERFLOW.0 as usize * STRING_ALIGN;

/// Id of an interned string: its arena offset divided by 16.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
#[repr(transparent)]
pub struct StringId(u16);

impl StringId {
    /// Returned when the arena has no room left for a new string.
    pub const OVERFLOW: StringId = StringId(0xFFFF);

    pub const fn new(raw: u16) -> Self {
        StringId(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn is_overflow(self) -> bool {
        self.0 == Self::OVERFLOW.0
    }

    /// Offset of the string from the start of the arena.
    pub const fn byte_offset(self) -> usize {
        self.0 as usize * STRING_ALIGN
    }
}

pub(crate) struct StringTable {
    base: NonNull<u8>,
    capacity: usize,
    next: Cell<usize>,
    cache: RefCell<HashMap<Box<str>, StringId>>,
}

impl StringTable {
    /// # Safety
    /// `base` must be valid for writes of `capacity` bytes for the lifetime
    /// of the table, and nothing else may write to that range. `capacity`
    /// must be a multiple of 16 and at most [`MAX_STRINGS_BYTES`].
    pub(crate) unsafe fn new(base: NonNull<u8>, capacity: usize) -> Self {
        debug_assert!(capacity % STRING_ALIGN == 0);
        debug_assert!(capacity <= MAX_STRINGS_BYTES);
        Self {
            base,
            capacity,
            next: Cell::new(0),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn intern(&self, s: &str) -> StringId {
        if let Some(&id) = self.cache.borrow().get(s) {
            return id;
        }

        let offset = self.next.get();
        let needed = s.len() + 1;
        if needed > self.capacity - offset {
            warn!(
                len = s.len(),
                used = offset,
                capacity = self.capacity,
                "timeline string arena is full"
            );
            return StringId::OVERFLOW;
        }

        // SAFETY: offset + needed <= capacity, checked above.
        unsafe {
            let dst = self.base.as_ptr().add(offset);
            core::ptr::copy_nonoverlapping(s.as_ptr(), dst, s.len());
            dst.add(s.len()).write(0);
        }

        // Cannot pass capacity: it is a multiple of 16 and offset + needed fits.
        let next = (offset + needed).next_multiple_of(STRING_ALIGN);
        self.next.set(next);

        // offset < capacity <= 0xFFFF * 16, so the id is at most 0xFFFE.
        let id = StringId((offset / STRING_ALIGN) as u16);
        self.cache.borrow_mut().insert(s.into(), id);
        id
    }

    /// Resolves an id produced by [`intern`](Self::intern).
    pub(crate) fn get(&self, id: StringId) -> Option<&str> {
        let offset = id.byte_offset();
        if id.is_overflow() || offset >= self.next.get() {
            return None;
        }
        // SAFETY: [offset, next) was written by intern and is never rewritten.
        let bytes = unsafe {
            core::slice::from_raw_parts(self.base.as_ptr().add(offset), self.next.get() - offset)
        };
        let len = bytes.iter().position(|&b| b == 0)?;
        core::str::from_utf8(&bytes[..len]).ok()
    }

    /// Bytes consumed so far, always a multiple of 16.
    pub(crate) fn used(&self) -> usize {
        self.next.get()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}
