//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ops::Add;
use std::time::Duration;

use derive_new::new;
use serde::{Deserialize, Serialize};

/// Point in simulated time, measured from the start of the simulation.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct SimTime(Duration);

/// Handle of a scheduled event. It can be used to cancel the event before it
/// fires.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, new)]
#[derive(Deserialize, Serialize)]
pub struct TimerId(u64);

/// Simulated clock and timer facility.
///
/// Methods take `&self` so that a single scheduler can be shared (through an
/// `Rc`) by all components of a node. Implementations are expected to use
/// interior mutability.
pub trait Scheduler<E> {
    /// Returns the current simulated time.
    fn now(&self) -> SimTime;

    /// Schedules `event` to fire `delay` after the current simulated time.
    fn schedule(&self, delay: Duration, event: E) -> TimerId;

    /// Cancels a previously scheduled event. Cancelling an event that already
    /// fired is a no-op.
    fn cancel(&self, timer: TimerId);
}

/// A single-threaded discrete-event queue.
///
/// Events are returned in time order. Events scheduled for the same instant
/// are returned in scheduling order.
#[derive(Debug)]
pub struct EventQueue<E> {
    inner: RefCell<EventQueueInner<E>>,
}

#[derive(Debug)]
struct EventQueueInner<E> {
    now: SimTime,
    next_id: u64,
    events: BTreeMap<(SimTime, TimerId), E>,
    index: BTreeMap<TimerId, SimTime>,
}

// ===== impl SimTime =====

impl SimTime {
    pub const ZERO: SimTime = SimTime(Duration::ZERO);

    pub const fn from_secs(secs: u64) -> SimTime {
        SimTime(Duration::from_secs(secs))
    }

    pub const fn from_millis(millis: u64) -> SimTime {
        SimTime(Duration::from_millis(millis))
    }

    pub const fn from_duration(duration: Duration) -> SimTime {
        SimTime(duration)
    }

    pub const fn as_duration(&self) -> Duration {
        self.0
    }

    // Whole seconds elapsed since the start of the simulation.
    pub const fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }

    // Same as `as_secs`, saturated to the 32-bit range used by LSA timestamps.
    pub fn as_secs_u32(&self) -> u32 {
        u32::try_from(self.0.as_secs()).unwrap_or(u32::MAX)
    }

    pub fn saturating_sub(&self, earlier: SimTime) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: Duration) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl std::fmt::Display for SimTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

// ===== impl EventQueue =====

impl<E> EventQueue<E> {
    pub fn new() -> EventQueue<E> {
        EventQueue {
            inner: RefCell::new(EventQueueInner {
                now: SimTime::ZERO,
                next_id: 0,
                events: Default::default(),
                index: Default::default(),
            }),
        }
    }

    /// Removes the next event from the queue and advances the clock to its
    /// firing time.
    pub fn pop(&self) -> Option<(SimTime, E)> {
        let mut inner = self.inner.borrow_mut();
        let ((time, id), event) = inner.events.pop_first()?;
        inner.index.remove(&id);
        inner.now = time;
        Some((time, event))
    }

    /// Same as [`EventQueue::pop`], but only for events due at or before
    /// `deadline`. When no such event exists, the clock is advanced to
    /// `deadline` and `None` is returned.
    pub fn pop_until(&self, deadline: SimTime) -> Option<(SimTime, E)> {
        let next_time = {
            let inner = self.inner.borrow();
            inner.events.first_key_value().map(|((time, _), _)| *time)
        };
        match next_time {
            Some(time) if time <= deadline => self.pop(),
            _ => {
                self.advance(deadline);
                None
            }
        }
    }

    /// Moves the clock forward without firing any event. The clock never
    /// goes backwards.
    pub fn advance(&self, time: SimTime) {
        let mut inner = self.inner.borrow_mut();
        if time > inner.now {
            inner.now = time;
        }
    }

    /// Returns the firing time of the next pending event.
    pub fn next_time(&self) -> Option<SimTime> {
        let inner = self.inner.borrow();
        inner.events.first_key_value().map(|((time, _), _)| *time)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().events.is_empty()
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> EventQueue<E> {
        EventQueue::new()
    }
}

impl<E> Scheduler<E> for EventQueue<E> {
    fn now(&self) -> SimTime {
        self.inner.borrow().now
    }

    fn schedule(&self, delay: Duration, event: E) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        let id = TimerId::new(inner.next_id);
        inner.next_id += 1;
        let time = inner.now + delay;
        inner.events.insert((time, id), event);
        inner.index.insert(id, time);
        id
    }

    fn cancel(&self, timer: TimerId) {
        let mut inner = self.inner.borrow_mut();
        if let Some(time) = inner.index.remove(&timer) {
            inner.events.remove(&(time, timer));
        }
    }
}

// ===== unit tests =====
