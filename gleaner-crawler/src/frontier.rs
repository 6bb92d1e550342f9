//! The frontier: a bounded FIFO of discovered-but-unfetched URLs plus the
//! visited set, keyed by normalized form so equivalent URLs collapse.

use crate::normalize;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: usize,
    pub from_sitemap: bool,
}

/// Owned by the orchestrator for the duration of one crawl; workers reach
/// it only through the crawl's single mutex, so pop-and-mark is atomic.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
    capacity: usize,
}

impl Frontier {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            visited: HashSet::new(),
            capacity: capacity.max(1),
        }
    }

    /// Queues a URL unless its normalized form was already seen or the
    /// queue is at capacity. Enqueued URLs are marked visited immediately,
    /// so two concurrent discoveries of the same page race on one slot.
    pub fn push(&mut self, url: String, depth: usize, from_sitemap: bool) -> bool {
        if self.queue.len() >= self.capacity {
            debug!("Frontier at capacity ({}), dropping {}", self.capacity, url);
            return false;
        }
        let canonical = normalize::normalize(&url);
        if !self.visited.insert(canonical) {
            return false;
        }
        self.queue.push_back(FrontierEntry {
            url,
            depth,
            from_sitemap,
        });
        true
    }

    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
