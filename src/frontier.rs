//! C3: URL Frontier — a bounded priority queue with per-host politeness and
//! dedupe.
//!
//! `next()` uses a scan-and-requeue strategy: O(queue size) worst case,
//! and it must never hand back a URL whose host is still rate-limited
//! (§4.3). Time is abstracted behind a `Clock` trait so politeness can be
//! tested deterministically instead of sleeping in real time.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::canonical;
use crate::types::CrawlUrl;

/// Abstracts "now" so frontier politeness tests don't need real sleeps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Wall-clock implementation, anchored at construction time.
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock { epoch: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// A settable virtual clock for tests.
#[derive(Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock { millis: AtomicU64::new(0) }
    }

    pub fn set(&self, t: Duration) {
        self.millis.store(t.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AddOutcome {
    Added,
    Duplicate,
    Full,
}

struct HostGate {
    ready_at: Duration,
}

/// The frontier itself. Intended to sit behind a single `Mutex` shared by
/// the fetcher pool (§5): every operation here is synchronous and cheap
/// enough under bounded queue sizes to hold the lock for its duration.
pub struct Frontier {
    queued: VecDeque<CrawlUrl>,
    queued_set: HashSet<String>,
    visited: HashSet<String>,
    host_gates: std::collections::HashMap<String, HostGate>,
    per_host_delay: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl Frontier {
    pub fn new(per_host_delay: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Frontier {
            queued: VecDeque::new(),
            queued_set: HashSet::new(),
            visited: HashSet::new(),
            host_gates: std::collections::HashMap::new(),
            per_host_delay,
            capacity,
            clock,
        }
    }

    pub fn with_system_clock(per_host_delay: Duration, capacity: usize) -> Self {
        Self::new(per_host_delay, capacity, Arc::new(SystemClock::new()))
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    /// Canonicalize, dedupe against `queued ∪ visited`, and enqueue.
    pub fn add(&mut self, url: &str, priority: u8, source_url: Option<String>) -> AddOutcome {
        let Some(canonical_url) = canonical::canonicalize(url) else {
            return AddOutcome::Duplicate;
        };
        if self.visited.contains(&canonical_url) || self.queued_set.contains(&canonical_url) {
            return AddOutcome::Duplicate;
        }
        if self.queued.len() >= self.capacity {
            return AddOutcome::Full;
        }
        let Some(host) = canonical::host_of(&canonical_url) else {
            return AddOutcome::Duplicate;
        };
        self.queued_set.insert(canonical_url.clone());
        self.queued
            .push_back(CrawlUrl::new(canonical_url, host, priority, source_url));
        AddOutcome::Added
    }

    /// Return a URL whose host is past its ready-time, advancing that
    /// host's gate to `now + per_host_delay`. Highest priority first;
    /// ties broken by FIFO (earliest-enqueued first). `None` if every
    /// queued URL is currently rate-limited.
    pub fn next(&mut self) -> Option<String> {
        let now = self.clock.now();
        let mut best_index: Option<usize> = None;

        for (index, candidate) in self.queued.iter().enumerate() {
            let ready = self
                .host_gates
                .get(&candidate.host)
                .map(|g| g.ready_at)
                .unwrap_or(Duration::ZERO);
            if ready > now {
                continue;
            }
            match best_index {
                None => best_index = Some(index),
                Some(current_best) => {
                    let best_priority = self.queued[current_best].priority;
                    if candidate.priority > best_priority {
                        best_index = Some(index);
                    }
                }
            }
        }

        let index = best_index?;
        let picked = self.queued.remove(index)?;
        self.queued_set.remove(&picked.url);
        self.host_gates.insert(
            picked.host.clone(),
            HostGate {
                ready_at: now + self.per_host_delay,
            },
        );
        Some(picked.url)
    }

    /// Add to the visited set and drop from the queue (if still present).
    pub fn mark_visited(&mut self, url: &str) {
        if let Some(canonical_url) = canonical::canonicalize(url) {
            self.queued_set.remove(&canonical_url);
            self.queued.retain(|c| c.url != canonical_url);
            self.visited.insert(canonical_url);
        }
    }

    /// Drop from the queue only; the URL may be re-added and retried.
    pub fn mark_failed(&mut self, url: &str) {
        if let Some(canonical_url) = canonical::canonicalize(url) {
            self.queued_set.remove(&canonical_url);
            self.queued.retain(|c| c.url != canonical_url);
        }
    }

    pub fn is_visited(&self, url: &str) -> bool {
        canonical::canonicalize(url)
            .map(|c| self.visited.contains(&c))
            .unwrap_or(false)
    }
}
