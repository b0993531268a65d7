//! Routing events: the windows in which flow routing runs.

use sluice_core::time::calendar;

use crate::EventWindow;

/// A `[start, end)` window in decimal days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub start: f64,
    pub end: f64,
}

impl Event {
    #[must_use]
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn contains(&self, days: f64) -> bool {
        self.start <= days && days < self.end
    }
}

impl From<&EventWindow> for Event {
    fn from(window: &EventWindow) -> Self {
        Self::new(
            calendar::to_decimal_days(window.start),
            calendar::to_decimal_days(window.end),
        )
    }
}

/// Chronological, non-overlapping routing events and a cursor into them.
///
/// A schedule with no events routes at every step. Otherwise the scheduler
/// starts out between events and only routes while the current time lies
/// inside the next pending event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSchedule {
    events: Vec<Event>,
    next: usize,
    between: bool,
}

impl EventSchedule {
    /// Sorts `events` by start time and resolves overlaps by ending each
    /// event where the next one starts.
    #[must_use]
    pub fn new(mut events: Vec<Event>) -> Self {
        events.sort_by(|a, b| a.start.total_cmp(&b.start));
        for i in 1..events.len() {
            let next_start = events[i].start;
            let event = &mut events[i - 1];
            if event.end > next_start {
                log::warn!(
                    "routing event [{}, {}) overlaps the next one; ending it at {next_start}",
                    event.start,
                    event.end
                );
                event.end = next_start;
            }
        }
        let between = !events.is_empty();
        Self {
            events,
            next: 0,
            between,
        }
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns `true` while routing is suspended between events.
    #[must_use]
    pub fn is_between_events(&self) -> bool {
        self.between
    }

    /// Returns the event that is running or will run next.
    #[must_use]
    pub fn next_event(&self) -> Option<&Event> {
        self.events.get(self.next)
    }

    /// Returns the start of the next pending event, or infinity when every
    /// event has passed.
    #[must_use]
    pub fn next_start(&self) -> f64 {
        self.next_event().map_or(f64::INFINITY, |event| event.start)
    }

    /// Moves the cursor to `days` and returns whether routing is suspended.
    ///
    /// Events that have ended are passed over. Once the last event ends,
    /// routing stays suspended.
    pub fn advance(&mut self, days: f64) -> bool {
        if self.events.is_empty() {
            return false;
        }
        while self.next_event().is_some_and(|event| days >= event.end) {
            self.next += 1;
        }
        self.between = !self.next_event().is_some_and(|event| event.contains(days));
        self.between
    }
}
