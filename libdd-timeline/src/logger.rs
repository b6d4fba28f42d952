// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The append path into the entry ring.
//!
//! This is what every bound event ends up calling, potentially millions of
//! times per second. It does not allocate, cannot fail, and costs one
//! comparison when the event is filtered out. Old entries are overwritten
//! once the ring wraps; nobody is told.

use crate::clock;
use crate::layout::MAX_ARGS;
use crate::store::TimelineStore;
use crate::string_table::StringId;
use core::ptr::addr_of_mut;
use core::sync::atomic::{compiler_fence, Ordering};

impl TimelineStore {
    #[inline(always)]
    pub(crate) fn log(&self, rate: u8, id: StringId, args: [f64; MAX_ARGS]) {
        if rate < self.rate() {
            return;
        }

        let cursor = self.next_entry_cell();
        let index = cursor.get();
        let next = index + 1;
        cursor.set(if next == self.num_entries() { 0 } else { next });

        // SAFETY: index < num_entries, so the slot lies inside the ring. Only
        // this thread writes the ring (the store is !Sync).
        unsafe {
            let entry = self.entries_ptr().as_ptr().add(index);
            addr_of_mut!((*entry).msgid).write(id.raw());
            addr_of_mut!((*entry).args).write(args);
            // Stores go msgid, args, core/NUMA, tsc: the core id comes out of
            // the same rdtscp as the timestamp, so it is written after the
            // args instead of before them. Readers only rely on tsc being
            // the last store into the slot.
            let (tsc, core_numa) = clock::read();
            addr_of_mut!((*entry).core_numa).write(core_numa);
            compiler_fence(Ordering::Release);
            addr_of_mut!((*entry).tsc).write(tsc as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::TimelineConfig;
    use crate::region::HeapRegion;
    use crate::store::{Timeline, TimelineStore};
    use crate::string_table::StringId;

    fn timeline(num_entries: usize) -> Timeline {
        let config = TimelineConfig::default()
            .with_num_entries(num_entries)
            .with_string_bytes(256);
        Timeline::create_in(HeapRegion::new(64 + num_entries * 64 + 256), &config).unwrap()
    }

    fn store(timeline: &Timeline) -> &TimelineStore {
        timeline.store().unwrap()
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn writes_every_field() {
        let timeline = timeline(4);
        let store = store(&timeline);
        let id = store.intern("6,5|test.event: a b c d e f");
        store.log(5, id, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let entry = store.entry(0).unwrap();
        assert_eq!(entry.msgid, id.raw());
        assert_eq!(entry.args, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(entry.reserved, 0);
        assert!(entry.tsc > 0.0);
        #[cfg(not(target_arch = "x86_64"))]
        assert_eq!(entry.core_numa, 0);
        assert_eq!(store.next_entry(), 1);
    }

    #[test]
    #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
    #[cfg_attr(miri, ignore)]
    fn core_numa_is_the_pinned_cpu_id() {
        // Pin this thread so every counter read lands on one CPU.
        unsafe {
            let cpu = libc::sched_getcpu();
            assert!(cpu >= 0);
            let mut set: libc::cpu_set_t = std::mem::zeroed();
            libc::CPU_SET(cpu as usize, &mut set);
            assert_eq!(
                libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set),
                0
            );
        }

        let timeline = timeline(4);
        let store = store(&timeline);
        store.log(0, StringId::new(0), [0.0; 6]);
        store.log(0, StringId::new(0), [0.0; 6]);
        let (_, aux) = crate::clock::read();

        assert_eq!(store.entry(0).unwrap().core_numa, aux);
        assert_eq!(store.entry(1).unwrap().core_numa, aux);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn timestamps_do_not_go_backwards() {
        let timeline = timeline(8);
        let store = store(&timeline);
        for i in 0..8 {
            store.log(0, StringId::new(0), [i as f64; 6]);
        }
        let stamps: Vec<f64> = (0..8).map(|i| store.entry(i).unwrap().tsc).collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn suppressed_calls_leave_ring_untouched() {
        let timeline = timeline(4);
        let store = store(&timeline);
        store.set_rate(4);
        store.log(3, StringId::new(0), [9.0; 6]);
        assert_eq!(store.next_entry(), 0);
        assert_eq!(store.entry(0).unwrap().tsc, 0.0);

        store.log(4, StringId::new(0), [9.0; 6]);
        assert_eq!(store.next_entry(), 1);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn wraps_around() {
        let timeline = timeline(3);
        let store = store(&timeline);
        for i in 0..30 {
            assert_eq!(store.next_entry(), i % 3);
            store.log(0, StringId::new(0), [i as f64; 6]);
        }
        assert_eq!(store.next_entry(), 0);
        // Slot 2 was last written by call 29.
        assert_eq!(store.entry(2).unwrap().args, [29.0; 6]);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn overflow_id_is_still_logged() {
        let timeline = timeline(2);
        let store = store(&timeline);
        store.log(0, StringId::OVERFLOW, [0.0; 6]);
        assert_eq!(store.entry(0).unwrap().msgid, 0xFFFF);
        assert_eq!(store.next_entry(), 1);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn single_entry_ring() {
        let timeline = timeline(1);
        let store = store(&timeline);
        store.log(0, StringId::new(0), [1.0; 6]);
        store.log(0, StringId::new(0), [2.0; 6]);
        assert_eq!(store.next_entry(), 0);
        assert_eq!(store.entry(0).unwrap().args, [2.0; 6]);
    }
}
