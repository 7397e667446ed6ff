//! Profiler registry: thread identity → event container.
//!
//! The registry mutex is the only cross-thread synchronization point, and it
//! is touched only when a thread asks for its container. Steady-state
//! recording goes through [`ContainerHandle`], which owns a reference to the
//! calling thread's container alone, so tracing inside the operator execution
//! loop never contends with other threads.
//!
//! Export and analysis read paths must run only after the measured window has
//! ended; reading while workers are still recording is unsupported.

use std::collections::HashMap;
use std::io::Write;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::ThreadId;
use std::time::Instant;

use chrono::Local;
use log::info;
use opscope_common::ProfileRecord;

use super::container::EventContainer;
use crate::domain::{ExportError, OperatorIndex, ProfileError, ThreadIndex};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Registry {
    /// Zero-reference for all exported relative times.
    epoch: Instant,
    by_thread: HashMap<ThreadId, ThreadIndex>,
    containers: Vec<Arc<Mutex<EventContainer>>>,
}

impl Registry {
    fn new() -> Self {
        Self { epoch: Instant::now(), by_thread: HashMap::new(), containers: Vec::new() }
    }
}

/// Event profiler for one execution session.
///
/// Created once per session and passed by reference to operators (recording),
/// the exporter, and the visualizer (reading). A measurement window spans from
/// construction or the last [`clear`](Self::clear) to the next `clear`.
pub struct EventProfiler {
    inner: Mutex<Registry>,
}

impl Default for EventProfiler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventProfiler {
    #[must_use]
    pub fn new() -> Self {
        Self { inner: Mutex::new(Registry::new()) }
    }

    /// The calling thread's container handle, registering the thread on its
    /// first call in this window.
    ///
    /// Exactly one container exists per distinct thread identity, no matter
    /// how many threads register concurrently; repeated calls from one thread
    /// return handles to the same container. This is the only recording-path
    /// operation that takes the registry lock.
    pub fn container(&self) -> ContainerHandle {
        let thread_id = std::thread::current().id();
        let mut registry = lock(&self.inner);
        let next_index = ThreadIndex(registry.containers.len() as u32);
        let thread_index = *registry.by_thread.entry(thread_id).or_insert(next_index);
        if thread_index == next_index {
            registry.containers.push(Arc::new(Mutex::new(EventContainer::new())));
        }
        ContainerHandle {
            thread_index,
            container: Arc::clone(&registry.containers[thread_index.as_usize()]),
            not_send: PhantomData,
        }
    }

    /// Number of threads registered in the current window.
    #[must_use]
    pub fn thread_count(&self) -> usize {
        lock(&self.inner).containers.len()
    }

    /// The current window's zero-reference time.
    #[must_use]
    pub fn epoch(&self) -> Instant {
        lock(&self.inner).epoch
    }

    /// Visit every registered container in registration order.
    pub fn visit_containers(&self, mut f: impl FnMut(ThreadIndex, &EventContainer)) {
        let registry = lock(&self.inner);
        for (index, container) in registry.containers.iter().enumerate() {
            f(ThreadIndex(index as u32), &lock(container));
        }
    }

    /// Write one flat record per recorded event: threads in registration
    /// order, tags in lexicographic order, events in call order.
    ///
    /// # Errors
    ///
    /// [`ExportError::UnfinishedEvent`] on the first event missing its
    /// `end_event` — an instrumentation bug the export surfaces instead of
    /// dropping; [`ExportError::Io`] on writer failure.
    pub fn write_to_stream<W: Write>(&self, out: &mut W) -> Result<(), ExportError> {
        let registry = lock(&self.inner);
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let mut exported = 0usize;
        for (index, container) in registry.containers.iter().enumerate() {
            let thread_index = ThreadIndex(index as u32);
            for (tag, line) in lock(container).lines() {
                for event in line {
                    if !event.is_finished {
                        return Err(ExportError::UnfinishedEvent {
                            thread_index,
                            tag: tag.to_string(),
                        });
                    }
                    let record = ProfileRecord {
                        timestamp: timestamp.clone(),
                        thread_index: thread_index.0,
                        tag: tag.to_string(),
                        payload: event.payload.0 as u64,
                        start_secs: event
                            .start_time
                            .saturating_duration_since(registry.epoch)
                            .as_secs_f64(),
                        end_secs: event
                            .end_time
                            .saturating_duration_since(registry.epoch)
                            .as_secs_f64(),
                    };
                    writeln!(out, "{}", record.to_csv_line())?;
                    exported += 1;
                }
            }
        }
        info!("exported {exported} events from {} threads", registry.containers.len());
        Ok(())
    }

    /// Start a fresh measurement window: new epoch, all containers discarded.
    ///
    /// Threads registered in the previous window obtain fresh empty
    /// containers on their next [`container`](Self::container) call.
    pub fn clear(&self) {
        let mut registry = lock(&self.inner);
        let discarded = registry.containers.len();
        *registry = Registry::new();
        info!("profiling window reset, discarded {discarded} containers");
    }
}

/// A thread's private handle to its own event container.
///
/// Recording through the handle locks only the owning thread's container,
/// which is uncontended while the single-writer discipline holds. The handle
/// is deliberately `!Send`: moving it to another thread would break that
/// discipline, so each thread must obtain its own via
/// [`EventProfiler::container`].
#[derive(Debug, Clone)]
pub struct ContainerHandle {
    thread_index: ThreadIndex,
    container: Arc<Mutex<EventContainer>>,
    not_send: PhantomData<*const ()>,
}

impl ContainerHandle {
    /// Registration index of the owning thread.
    #[must_use]
    pub fn thread_index(&self) -> ThreadIndex {
        self.thread_index
    }

    /// Append a new open event to `tag`'s line.
    pub fn start_event(&self, tag: &str) {
        lock(&self.container).start_event(tag);
    }

    /// Attach a payload to the most recent event for `tag`.
    ///
    /// # Errors
    ///
    /// [`ProfileError::NoSuchEvent`] when the tag has no recorded events.
    pub fn set_payload(&self, tag: &str, payload: OperatorIndex) -> Result<(), ProfileError> {
        lock(&self.container).set_payload(tag, payload)
    }

    /// Finish the most recent open event for `tag`.
    ///
    /// # Errors
    ///
    /// [`ProfileError::NoOpenEvent`] when no started, unfinished event exists.
    pub fn end_event(&self, tag: &str) -> Result<(), ProfileError> {
        lock(&self.container).end_event(tag)
    }

    /// Read access to the underlying container.
    pub fn with<R>(&self, f: impl FnOnce(&EventContainer) -> R) -> R {
        f(&lock(&self.container))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_finished(handle: &ContainerHandle, tag: &str) {
        handle.start_event(tag);
        handle.end_event(tag).unwrap();
    }

    #[test]
    fn test_same_thread_gets_same_container() {
        let profiler = EventProfiler::new();
        let first = profiler.container();
        let second = profiler.container();

        record_finished(&first, "0");
        assert_eq!(second.with(|c| c.event_line("0").len()), 1);
        assert_eq!(first.thread_index(), second.thread_index());
        assert_eq!(profiler.thread_count(), 1);
    }

    #[test]
    fn test_export_emits_one_line_per_event() {
        let profiler = EventProfiler::new();
        let handle = profiler.container();
        record_finished(&handle, "0");
        record_finished(&handle, "0");
        record_finished(&handle, "1");

        let mut out = Vec::new();
        profiler.write_to_stream(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3);

        let records = ProfileRecord::parse_lines(&text).unwrap();
        assert_eq!(records.iter().filter(|r| r.tag == "0").count(), 2);
        assert!(records.iter().all(|r| r.thread_index == 0));
        assert!(records.iter().all(|r| r.end_secs >= r.start_secs));
    }

    #[test]
    fn test_export_fails_on_unfinished_event() {
        let profiler = EventProfiler::new();
        let handle = profiler.container();
        handle.start_event("3");

        let mut out = Vec::new();
        let err = profiler.write_to_stream(&mut out).unwrap_err();
        assert!(matches!(err, ExportError::UnfinishedEvent { ref tag, .. } if tag == "3"));
    }

    #[test]
    fn test_clear_starts_fresh_window() {
        let profiler = EventProfiler::new();
        let handle = profiler.container();
        record_finished(&handle, "0");

        profiler.clear();
        assert_eq!(profiler.thread_count(), 0);

        let fresh = profiler.container();
        assert!(fresh.with(EventContainer::is_empty));

        // Relative times are measured against the new epoch.
        record_finished(&fresh, "0");
        let mut out = Vec::new();
        profiler.write_to_stream(&mut out).unwrap();
        let records = ProfileRecord::parse_lines(&String::from_utf8(out).unwrap()).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].start_secs < 5.0);
    }

    #[test]
    fn test_payload_reaches_export() {
        let profiler = EventProfiler::new();
        let handle = profiler.container();
        handle.start_event("6");
        handle.set_payload("6", OperatorIndex(6)).unwrap();
        handle.end_event("6").unwrap();

        let mut out = Vec::new();
        profiler.write_to_stream(&mut out).unwrap();
        let records = ProfileRecord::parse_lines(&String::from_utf8(out).unwrap()).unwrap();
        assert_eq!(records[0].payload, 6);
    }
}
