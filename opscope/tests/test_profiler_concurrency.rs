use std::collections::HashSet;
use std::sync::Barrier;

use opscope::profiling::EventProfiler;
use opscope_common::ProfileRecord;

#[test]
fn test_concurrent_registration_yields_one_container_per_thread() {
    const THREADS: usize = 8;

    let profiler = EventProfiler::new();
    let barrier = Barrier::new(THREADS);

    std::thread::scope(|scope| {
        for _ in 0..THREADS {
            let profiler = &profiler;
            let barrier = &barrier;
            scope.spawn(move || {
                // Maximize the chance that first-time registrations race.
                barrier.wait();
                let handle = profiler.container();
                let again = profiler.container();
                assert_eq!(handle.thread_index(), again.thread_index());

                handle.start_event("0");
                handle.end_event("0").expect("event was started");
            });
        }
    });

    assert_eq!(profiler.thread_count(), THREADS);

    let mut out = Vec::new();
    profiler.write_to_stream(&mut out).expect("all events finished");
    let records = ProfileRecord::parse_lines(&String::from_utf8(out).unwrap()).unwrap();

    // One line per event, one distinct registration index per thread.
    assert_eq!(records.len(), THREADS);
    let indices: HashSet<u32> = records.iter().map(|r| r.thread_index).collect();
    assert_eq!(indices.len(), THREADS);
    assert!(indices.iter().all(|&i| (i as usize) < THREADS));
}

#[test]
fn test_clear_resets_registrations_across_threads() {
    let profiler = EventProfiler::new();

    std::thread::scope(|scope| {
        for _ in 0..3 {
            let profiler = &profiler;
            scope.spawn(move || {
                let handle = profiler.container();
                handle.start_event("1");
                handle.end_event("1").unwrap();
            });
        }
    });
    assert_eq!(profiler.thread_count(), 3);

    profiler.clear();
    assert_eq!(profiler.thread_count(), 0);

    // A previously registered thread re-registers into the fresh window.
    let handle = profiler.container();
    assert!(handle.with(|container| container.is_empty()));
    assert_eq!(profiler.thread_count(), 1);
}
