use super::errors::SimError;
use super::types::SimTime;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug)]
pub struct ScheduledEvent<E> {
    pub time: SimTime,
    pub sequence_num: u64,
    pub event: E,
}

impl<E> PartialEq for ScheduledEvent<E> {
    fn eq(&self, other: &Self) -> bool {
        self.time.total_cmp(&other.time) == Ordering::Equal && self.sequence_num == other.sequence_num
    }
}

impl<E> Eq for ScheduledEvent<E> {}

impl<E> PartialOrd for ScheduledEvent<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for ScheduledEvent<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

/// Logical clock with a pending-event queue.
///
/// Events are ordered by `(time, insertion sequence)`, so events due at the same
/// instant come out in the order they were scheduled.
#[derive(Debug)]
pub struct SimClock<E> {
    now: SimTime,
    event_queue: BinaryHeap<ScheduledEvent<E>>,
    sequence_counter: u64,
    processed: u64,
}

impl<E> SimClock<E> {
    /// Create a clock at time zero with an empty queue
    pub fn new() -> Self {
        Self {
            now: 0.0,
            event_queue: BinaryHeap::new(),
            sequence_counter: 0,
            processed: 0,
        }
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Number of events handed out so far
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Schedule an event `delay` time units from now
    pub fn schedule(&mut self, delay: SimTime, event: E) -> Result<u64, SimError> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(SimError::schedule(
                "clock",
                format!("delay must be finite and non-negative, got {}", delay),
            ));
        }
        self.push(self.now + delay, event)
    }

    /// Schedule an event at an absolute time, which may not lie in the past
    pub fn schedule_at(&mut self, time: SimTime, event: E) -> Result<u64, SimError> {
        if !time.is_finite() || time < self.now {
            return Err(SimError::schedule(
                "clock",
                format!("cannot schedule at {} when the clock reads {}", time, self.now),
            ));
        }
        self.push(time, event)
    }

    fn push(&mut self, time: SimTime, event: E) -> Result<u64, SimError> {
        let sequence_num = self.sequence_counter;
        self.event_queue.push(ScheduledEvent {
            time,
            sequence_num,
            event,
        });
        self.sequence_counter += 1;
        Ok(sequence_num)
    }

    /// Check if there are any events remaining in the queue
    pub fn has_events(&self) -> bool {
        !self.event_queue.is_empty()
    }

    /// Number of queued events
    pub fn pending(&self) -> usize {
        self.event_queue.len()
    }

    /// Time of the earliest pending event
    pub fn peek_next_time(&self) -> Option<SimTime> {
        self.event_queue.peek().map(|event| event.time)
    }

    /// Pop the earliest event if it is due at or before `until`, moving time to it
    pub fn pop_due(&mut self, until: SimTime) -> Option<ScheduledEvent<E>> {
        match self.peek_next_time() {
            Some(time) if time <= until => {
                let scheduled = self.event_queue.pop()?;
                self.now = scheduled.time;
                self.processed += 1;
                Some(scheduled)
            }
            _ => None,
        }
    }

    /// Pop every event at the earliest pending time, in scheduling order
    pub fn advance(&mut self) -> Vec<E> {
        let mut events = Vec::new();

        if let Some(next_time) = self.peek_next_time() {
            while let Some(scheduled) = self.pop_due(next_time) {
                events.push(scheduled.event);
            }
        }

        events
    }

    /// Hand every event due at or before `until` to `handler`.
    ///
    /// The handler may schedule further events; those are picked up in the same run
    /// when they fall inside the window. Returns the number of events handled.
    pub fn run<F>(&mut self, until: SimTime, mut handler: F) -> Result<usize, SimError>
    where
        F: FnMut(&mut SimClock<E>, E) -> Result<(), SimError>,
    {
        if until < self.now {
            return Err(SimError::schedule(
                "clock",
                format!("cannot run until {} when the clock reads {}", until, self.now),
            ));
        }

        let mut handled = 0;
        while let Some(scheduled) = self.pop_due(until) {
            handler(self, scheduled.event)?;
            handled += 1;
        }
        self.advance_to(until);
        Ok(handled)
    }

    /// Move an idle clock forward. Never moves time backwards.
    pub fn advance_to(&mut self, time: SimTime) {
        if time > self.now {
            self.now = time;
        }
    }

    /// Drop every pending event, returning how many were discarded
    pub fn cancel_pending(&mut self) -> usize {
        let discarded = self.event_queue.len();
        self.event_queue.clear();
        discarded
    }
}

impl<E> Default for SimClock<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;

    #[test]
    fn test_same_time_events_are_fifo() {
        let mut clock = SimClock::new();
        clock.schedule(2.0, "b1").unwrap();
        clock.schedule(1.0, "a").unwrap();
        clock.schedule(2.0, "b2").unwrap();
        clock.schedule(2.0, "b3").unwrap();

        assert_eq!(clock.advance(), vec!["a"]);
        assert_eq!(clock.now(), 1.0);
        assert_eq!(clock.advance(), vec!["b1", "b2", "b3"]);
        assert_eq!(clock.now(), 2.0);
        assert!(clock.advance().is_empty());
    }

    #[test]
    fn test_negative_delay_is_rejected() {
        let mut clock: SimClock<()> = SimClock::new();
        let err = clock.schedule(-0.5, ()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSchedule);
        assert!(clock.schedule(f64::NAN, ()).is_err());
    }

    #[test]
    fn test_schedule_into_past_is_rejected() {
        let mut clock = SimClock::new();
        clock.schedule(3.0, 1).unwrap();
        clock.advance();
        let err = clock.schedule_at(2.0, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSchedule);
        assert!(clock.schedule_at(3.0, 3).is_ok());
    }

    #[test]
    fn test_run_includes_events_at_until() {
        let mut clock = SimClock::new();
        clock.schedule(1.0, 1u32).unwrap();
        clock.schedule(5.0, 5u32).unwrap();
        clock.schedule(6.0, 6u32).unwrap();

        let mut seen = Vec::new();
        let handled = clock
            .run(5.0, |_, event| {
                seen.push(event);
                Ok(())
            })
            .unwrap();

        assert_eq!(handled, 2);
        assert_eq!(seen, vec![1, 5]);
        assert_eq!(clock.now(), 5.0);
        assert_eq!(clock.pending(), 1);
    }

    #[test]
    fn test_handler_can_reschedule_within_window() {
        let mut clock = SimClock::new();
        clock.schedule(1.0, 0u32).unwrap();

        let mut fired = Vec::new();
        clock
            .run(3.5, |clock, hop| {
                fired.push((clock.now(), hop));
                clock.schedule(1.0, hop + 1)?;
                Ok(())
            })
            .unwrap();

        assert_eq!(fired, vec![(1.0, 0), (2.0, 1), (3.0, 2)]);
        assert_eq!(clock.now(), 3.5);
    }

    #[test]
    fn test_cancel_pending_discards_everything() {
        let mut clock = SimClock::new();
        clock.schedule(1.0, ()).unwrap();
        clock.schedule(2.0, ()).unwrap();
        assert_eq!(clock.cancel_pending(), 2);
        assert!(!clock.has_events());
    }
}
