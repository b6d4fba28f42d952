// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Binary layout of a timeline region.
//!
//! ```text
//! +----------+--------------------------------+--------------------------+
//! |  Header  |  Entry ring                    |  String arena            |
//! |  64 B    |  num_entries * 64 B            |  strings_bytes           |
//! +----------+--------------------------------+--------------------------+
//! ```
//!
//! All fields are native-endian. Readers in other processes map the same
//! bytes, so these records must not change shape within a major version.

use core::mem;

/// Identifies a timeline region.
pub const MAGIC: u64 = 0xa3ff_7223_441d_0001;
pub const MAJOR_VERSION: u16 = 1;
pub const MINOR_VERSION: u16 = 0;

pub const HEADER_SIZE: usize = 64;
pub const ENTRY_SIZE: usize = 64;

/// Interned strings start on this boundary, and an id is `offset / 16`.
pub const STRING_ALIGN: usize = 16;

/// Number of `f64` argument slots in an entry.
pub const MAX_ARGS: usize = 6;

/// Region header, written once at creation.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Header {
    pub magic: u64,
    pub major: u16,
    pub minor: u16,
    /// Size of the entry ring in bytes.
    pub log_bytes: u32,
    /// Size of the string arena in bytes.
    pub strings_bytes: u32,
    pub reserved: [u8; 44],
}

impl Header {
    pub fn new(log_bytes: u32, strings_bytes: u32) -> Self {
        Self {
            magic: MAGIC,
            major: MAJOR_VERSION,
            minor: MINOR_VERSION,
            log_bytes,
            strings_bytes,
            reserved: [0; 44],
        }
    }

    pub fn num_entries(&self) -> usize {
        self.log_bytes as usize / ENTRY_SIZE
    }

    /// Total region size described by this header.
    pub fn region_size(&self) -> usize {
        HEADER_SIZE + self.log_bytes as usize + self.strings_bytes as usize
    }
}

/// One ring slot.
///
/// The timestamp is written last; a slot whose `tsc` is still `0.0` has
/// never been written since the region was created.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Entry {
    pub tsc: f64,
    pub msgid: u16,
    /// Low 12 bits: core, high 4 bits: NUMA node.
    pub core_numa: u16,
    pub reserved: u32,
    pub args: [f64; MAX_ARGS],
}

const _: () = assert!(mem::size_of::<Header>() == HEADER_SIZE);
const _: () = assert!(mem::size_of::<Entry>() == ENTRY_SIZE);
const _: () = assert!(mem::align_of::<Entry>() == 8);
const _: () = assert!(HEADER_SIZE % mem::align_of::<Entry>() == 0);

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::offset_of;

    #[test]
    fn header_field_offsets() {
        assert_eq!(offset_of!(Header, magic), 0);
        assert_eq!(offset_of!(Header, major), 8);
        assert_eq!(offset_of!(Header, minor), 10);
        assert_eq!(offset_of!(Header, log_bytes), 12);
        assert_eq!(offset_of!(Header, strings_bytes), 16);
        assert_eq!(offset_of!(Header, reserved), 20);
    }

    #[test]
    fn entry_field_offsets() {
        assert_eq!(offset_of!(Entry, tsc), 0);
        assert_eq!(offset_of!(Entry, msgid), 8);
        assert_eq!(offset_of!(Entry, core_numa), 10);
        assert_eq!(offset_of!(Entry, reserved), 12);
        assert_eq!(offset_of!(Entry, args), 16);
    }

    #[test]
    fn header_sizes() {
        let header = Header::new(4 * 64, 1024);
        assert_eq!(header.num_entries(), 4);
        assert_eq!(header.region_size(), 64 + 256 + 1024);
        assert_eq!(header.magic, MAGIC);
    }
}
