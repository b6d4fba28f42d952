// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Cycle counter used to timestamp ring entries.
//!
//! On x86_64 this is `rdtscp`, which also returns `IA32_TSC_AUX`. Linux loads
//! that register with `node << 12 | cpu`, so its low 16 bits are the packed
//! core/NUMA identifier stored in every entry.

/// Reads the cycle counter and the packed core/NUMA id of the current CPU.
#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub fn read() -> (u64, u16) {
    let mut aux = 0u32;
    // SAFETY: rdtscp is available on every x86_64 CPU this crate targets and
    // has no memory side effects beyond writing `aux`.
    let tsc = unsafe { core::arch::x86_64::__rdtscp(&mut aux) };
    (tsc, aux as u16)
}

#[cfg(target_arch = "aarch64")]
#[inline(always)]
pub fn read() -> (u64, u16) {
    let cnt: u64;
    // SAFETY: cntvct_el0 is readable from EL0 on Linux and macOS.
    unsafe {
        core::arch::asm!("mrs {}, cntvct_el0", out(reg) cnt, options(nomem, nostack));
    }
    (cnt, 0)
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline(always)]
pub fn read() -> (u64, u16) {
    use std::sync::OnceLock;
    use std::time::Instant;

    static ANCHOR: OnceLock<Instant> = OnceLock::new();
    let nanos = ANCHOR.get_or_init(Instant::now).elapsed().as_nanos();
    (nanos as u64, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore)]
    fn monotonic_on_one_thread() {
        let (first, _) = read();
        let mut last = first;
        for _ in 0..1000 {
            let (now, _) = read();
            assert!(now >= last);
            last = now;
        }
    }
}
