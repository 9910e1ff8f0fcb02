use embassy_time::{Duration, Instant};
use heapless::Deque;

use crate::cache::SlotCache;
use crate::message::{Message, SNAPSHOT_LEN, Snapshot};
use crate::utils::Interval;

/// Capacity of the outbound queue
pub const OUTBOUND_CAPACITY: usize = 16;

/// Outbound queue entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outbound {
    Message(Message),
    /// Configuration push, emitted as consecutive messages
    Snapshot(Snapshot),
    /// Marker replaced by a configuration push after the post-connect settle window
    DeferredSync,
}

impl Outbound {
    fn is_periodic(&self) -> bool {
        matches!(self, Outbound::Message(message) if message.is_periodic())
    }
}

/// Work selected for a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    Send(Message),
    /// Wait for the peer to settle, then push the configuration
    Sync,
}

/// Priority-ordered source of outbound frames
///
/// Queued items always go first. A snapshot goes out whole, one message per tick, with nothing
/// in between. Telemetry is produced only from an empty queue, at most once per telemetry
/// interval and never from an empty cache.
pub struct Scheduler {
    queue: Deque<Outbound, OUTBOUND_CAPACITY>,
    /// Snapshot being emitted and the position of its next message
    current: Option<(Snapshot, usize)>,
    telemetry: Interval,
}

impl Scheduler {
    pub const fn new(telemetry_interval: Duration) -> Self {
        Self {
            queue: Deque::new(),
            current: None,
            telemetry: Interval::new(telemetry_interval),
        }
    }

    /// Appends an item.
    ///
    /// Anything but a periodic report may evict the oldest queued periodic report. A periodic
    /// report arriving at a full queue is dropped.
    pub fn push(&mut self, item: Outbound) -> bool {
        if self.queue.is_full() && !item.is_periodic() {
            self.evict_periodic();
        }
        if self.queue.push_back(item).is_err() {
            warn!("outbound queue full, item dropped");
            return false;
        }
        true
    }

    pub fn push_message(&mut self, message: Message) -> bool {
        self.push(Outbound::Message(message))
    }

    /// Queues a configuration push.
    ///
    /// A snapshot still waiting in the queue is updated in place instead, so bursts of requests
    /// never pile up and peers always receive the latest configuration.
    pub fn push_snapshot(&mut self, snapshot: Snapshot) -> bool {
        for item in self.queue.iter_mut() {
            if let Outbound::Snapshot(queued) = item {
                *queued = snapshot;
                return true;
            }
        }
        self.push(Outbound::Snapshot(snapshot))
    }

    pub fn push_sync(&mut self) -> bool {
        self.push(Outbound::DeferredSync)
    }

    /// Number of pending items, counting each message left of a snapshot in progress
    pub fn len(&self) -> usize {
        let remaining = self
            .current
            .map_or(0, |(_, index)| SNAPSHOT_LEN.saturating_sub(index));
        self.queue.len() + remaining
    }

    fn evict_periodic(&mut self) {
        let Some(index) = self.queue.iter().position(Outbound::is_periodic) else {
            return;
        };
        // Rotate the queue once, skipping the oldest periodic report
        for i in 0..self.queue.len() {
            let Some(item) = self.queue.pop_front() else {
                break;
            };
            if i == index {
                trace!("outbound report evicted");
                continue;
            }
            if self.queue.push_back(item).is_err() {
                break;
            }
        }
    }

    /// Selects the single piece of work for this tick.
    pub fn next(&mut self, now: Instant, cache: &SlotCache) -> Option<Dispatch> {
        if let Some(message) = self.next_snapshot_message() {
            return Some(Dispatch::Send(message));
        }
        match self.queue.pop_front() {
            Some(Outbound::Message(message)) => return Some(Dispatch::Send(message)),
            Some(Outbound::DeferredSync) => return Some(Dispatch::Sync),
            Some(Outbound::Snapshot(snapshot)) => {
                self.current = Some((snapshot, 0));
                return self.next_snapshot_message().map(Dispatch::Send);
            }
            None => {}
        }
        if cache.is_empty() || !self.telemetry.poll(now) {
            return None;
        }
        Some(Dispatch::Send(Message::Values(cache.values())))
    }

    fn next_snapshot_message(&mut self) -> Option<Message> {
        let (snapshot, index) = self.current.as_mut()?;
        let message = snapshot.message(*index);
        *index += 1;
        if message.is_none() || snapshot.message(*index).is_none() {
            self.current = None;
        }
        message
    }
}
