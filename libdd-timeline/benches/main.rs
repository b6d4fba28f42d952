// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use criterion::*;
use libdd_timeline::region::HeapRegion;
use libdd_timeline::{EventCatalog, Timeline, TimelineConfig};

const EVENTS: &str = "\
6,3|got_packet: pktid len
A packet was received.
5,1|sleep: usec
";

fn timeline(num_entries: usize) -> Timeline {
    let config = TimelineConfig::default()
        .with_num_entries(num_entries)
        .with_string_bytes(4096);
    let region = HeapRegion::new(64 + num_entries * 64 + 4096);
    Timeline::create_in(region, &config).unwrap()
}

pub fn log_events(c: &mut Criterion) {
    let timeline = timeline(1 << 16);
    let events = EventCatalog::load(&timeline, "bench", EVENTS, &[]).unwrap();
    let got_packet = events.event::<2>("got_packet").unwrap();
    let dynamic = events.get("got_packet").unwrap();

    timeline.set_rate(0);
    c.bench_function("log typed event", |b| {
        b.iter(|| got_packet.log(black_box([1.0, 64.0])))
    });
    c.bench_function("log dynamic event", |b| {
        b.iter(|| dynamic.log(black_box(&[1.0, 64.0])))
    });

    // got_packet has rate 3, so every call is filtered out.
    timeline.set_rate(4);
    c.bench_function("log suppressed event", |b| {
        b.iter(|| got_packet.log(black_box([1.0, 64.0])))
    });

    let disabled = Timeline::disabled();
    let events = EventCatalog::load(&disabled, "bench", EVENTS, &[]).unwrap();
    let noop = events.event::<2>("got_packet").unwrap();
    c.bench_function("log on disabled timeline", |b| {
        b.iter(|| noop.log(black_box([1.0, 64.0])))
    });
}

pub fn intern_strings(c: &mut Criterion) {
    let messages: Vec<String> = (0..100)
        .map(|i| format!("6,3|bench.event_{i}: a b"))
        .collect();
    c.bench_function("intern 100 strings twice", |b| {
        b.iter(|| {
            let timeline = timeline(16);
            for message in &messages {
                black_box(timeline.intern(message));
            }
            // Second pass hits the cache.
            for message in &messages {
                black_box(timeline.intern(message));
            }
        })
    });
}

criterion_group!(benches, log_events, intern_strings);
criterion_main!(benches);
