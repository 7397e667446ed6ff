//! Per-thread event timelines.
//!
//! An [`EventContainer`] holds one append-only sequence of [`EventInfo`] per
//! tag, in call order. A container belongs to exactly one recording thread
//! for the lifetime of a measurement window; nothing in here synchronizes.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::domain::{OperatorIndex, ProfileError};

/// One timed event on a tag's timeline.
///
/// `end_time` is meaningful only once `is_finished` is set; a finished event
/// always satisfies `end_time >= start_time`.
#[derive(Debug, Clone, Copy)]
pub struct EventInfo {
    pub start_time: Instant,
    pub end_time: Instant,
    pub is_finished: bool,
    /// Originating plan node, exported alongside the timing data.
    pub payload: OperatorIndex,
}

impl EventInfo {
    fn started_at(start_time: Instant) -> Self {
        Self { start_time, end_time: start_time, is_finished: false, payload: OperatorIndex(0) }
    }

    /// Elapsed seconds, or `None` while the event is still open.
    #[must_use]
    pub fn duration_secs(&self) -> Option<f64> {
        self.is_finished.then(|| (self.end_time - self.start_time).as_secs_f64())
    }
}

/// Append-only mapping from tag to its chronological event line.
///
/// Tags are created lazily on first `start_event`. The ordered map keeps the
/// export deterministic: threads iterate in registration order, tags in
/// lexicographic order, events in call order.
#[derive(Debug, Default)]
pub struct EventContainer {
    events: BTreeMap<String, Vec<EventInfo>>,
}

impl EventContainer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new open event to `tag`'s line, creating the line if unseen.
    pub fn start_event(&mut self, tag: &str) {
        self.events.entry(tag.to_string()).or_default().push(EventInfo::started_at(Instant::now()));
    }

    /// Attach a payload to the most recently appended event for `tag`.
    ///
    /// # Errors
    ///
    /// [`ProfileError::NoSuchEvent`] when the tag has no recorded events.
    pub fn set_payload(&mut self, tag: &str, payload: OperatorIndex) -> Result<(), ProfileError> {
        let event = self
            .events
            .get_mut(tag)
            .and_then(|line| line.last_mut())
            .ok_or_else(|| ProfileError::NoSuchEvent { tag: tag.to_string() })?;
        event.payload = payload;
        Ok(())
    }

    /// Finish the most recently appended event for `tag`.
    ///
    /// The tail of a tag's line acts as its in-flight slot: it must hold a
    /// started, not-yet-finished event for this call to succeed.
    ///
    /// # Errors
    ///
    /// [`ProfileError::NoOpenEvent`] when the tag was never started or its
    /// latest event is already finished.
    pub fn end_event(&mut self, tag: &str) -> Result<(), ProfileError> {
        let event = self
            .events
            .get_mut(tag)
            .and_then(|line| line.last_mut())
            .filter(|event| !event.is_finished)
            .ok_or_else(|| ProfileError::NoOpenEvent { tag: tag.to_string() })?;
        event.end_time = Instant::now();
        event.is_finished = true;
        Ok(())
    }

    /// The full chronological event line for `tag`, empty if unseen.
    #[must_use]
    pub fn event_line(&self, tag: &str) -> &[EventInfo] {
        self.events.get(tag).map_or(&[], Vec::as_slice)
    }

    /// All event lines in lexicographic tag order.
    pub fn lines(&self) -> impl Iterator<Item = (&str, &[EventInfo])> {
        self.events.iter().map(|(tag, line)| (tag.as_str(), line.as_slice()))
    }

    /// Total number of recorded events across all tags.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
