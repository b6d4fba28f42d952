// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0
#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

//! A shared-memory event timeline for packet-processing hot loops.
//!
//! Code records timestamped events with up to six `f64` arguments into a
//! fixed-size ring inside a memory region that other processes can map and
//! read after the fact. Recording an event costs a rate check, a cursor
//! bump, a handful of stores and one cycle counter read.
//!
//! - [`Timeline`]: the store (header + entry ring + string arena, see
//!   [`layout`]) or the disabled no-op stand-in.
//! - [`EventCatalog`]: compiles a textual list of event definitions into
//!   [`BoundEvent`]s tied to one timeline.
//! - [`region`]: where the bytes come from (mapped file, POSIX shared memory,
//!   heap).
//!
//! A store has a single writer. It is `Send` but not `Sync`, and bound
//! events borrow it, so they stay on the thread that owns the store. Two
//! processes writing into the same region corrupt the log without any
//! error.
//!
//! ```
//! use libdd_timeline::region::HeapRegion;
//! use libdd_timeline::{EventCatalog, Timeline, TimelineConfig};
//!
//! let config = TimelineConfig::default()
//!     .with_num_entries(1024)
//!     .with_string_bytes(4096);
//! let timeline = Timeline::create_in(HeapRegion::new(128 * 1024), &config)?;
//!
//! let events = EventCatalog::load(
//!     &timeline,
//!     "nic",
//!     "6,3|got_packet: pktid len\nA packet arrived.\n",
//!     &[("id", "0")],
//! )?;
//! let got_packet = events.event::<2>("got_packet")?;
//! got_packet.log([1.0, 64.0]);
//!
//! assert_eq!(timeline.store().map(|s| s.next_entry()), Some(1));
//! # Ok::<(), libdd_timeline::TimelineError>(())
//! ```

pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod layout;
mod logger;
pub mod rate;
pub mod region;
pub mod store;
pub mod string_table;

pub use catalog::EventCatalog;
pub use config::TimelineConfig;
pub use error::{Result, TimelineError};
pub use event::{BoundEvent, Event};
pub use layout::{Entry, Header};
pub use rate::RATE_FILTER_ALL;
pub use store::{Timeline, TimelineStore};
pub use string_table::StringId;
