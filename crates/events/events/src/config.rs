//! Publisher configuration.

use std::time::Duration;

/// What `publish` does when the target channel is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackpressurePolicy {
    /// Wait up to `timeout` for room, then fail with an admission timeout.
    BoundedWait { timeout: Duration },
    /// Fail immediately.
    FailFast,
}

impl Default for BackpressurePolicy {
    fn default() -> Self {
        Self::BoundedWait {
            timeout: Duration::from_secs(3),
        }
    }
}

/// Registration publisher configuration.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Capacity of each partition channel.
    pub capacity: usize,
    /// Number of consumer workers. One worker keeps a single global order;
    /// more workers keep order per application and path.
    pub worker_count: usize,
    /// Admission policy for full channels.
    pub backpressure: BackpressurePolicy,
    /// Deadline for applying one event.
    pub consume_timeout: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            capacity: 4096,
            worker_count: 1,
            backpressure: BackpressurePolicy::default(),
            consume_timeout: Duration::from_secs(30),
        }
    }
}

impl PublisherConfig {
    /// Creates a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-partition channel capacity.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the worker count.
    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Sets the backpressure policy.
    pub fn backpressure(mut self, policy: BackpressurePolicy) -> Self {
        self.backpressure = policy;
        self
    }

    /// Waits up to `timeout` for channel room.
    pub fn admission_timeout(self, timeout: Duration) -> Self {
        self.backpressure(BackpressurePolicy::BoundedWait { timeout })
    }

    /// Sets the per-event deadline.
    pub fn consume_timeout(mut self, timeout: Duration) -> Self {
        self.consume_timeout = timeout;
        self
    }
}
