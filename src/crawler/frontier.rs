//! Crawl frontier: the visit queue plus the seen-set
//!
//! Targets move `Pending -> InFlight -> Visited | Failed`. A target is
//! admitted to the queue at most once: membership is tested against the
//! seen-set (which covers both queued and already-dequeued targets) in the
//! same operation that inserts, so concurrent workers discovering the same
//! link cannot double-enqueue it. Failed targets stay in the seen-set and
//! are never retried within the run.

use std::collections::{HashSet, VecDeque};

use crate::CrawlTarget;

/// FIFO frontier with cycle-safe admission
///
/// FIFO order gives breadth-first traversal when a single worker drains the
/// queue; with more workers the order is best-effort FIFO only.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<CrawlTarget>,
    seen: HashSet<String>,
    visited: usize,
    failed: usize,
    limit: Option<usize>,
    limit_logged: bool,
}

impl Frontier {
    /// Creates a frontier seeded with the root target
    ///
    /// # Arguments
    ///
    /// * `root` - The normalized root URL, which enters `Pending`
    /// * `limit` - Optional ceiling on how many targets are ever admitted;
    ///   the original design is unbounded, so `None` reproduces it
    pub fn new(root: CrawlTarget, limit: Option<usize>) -> Self {
        let mut frontier = Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
            visited: 0,
            failed: 0,
            limit,
            limit_logged: false,
        };
        frontier.try_enqueue(root);
        frontier
    }

    /// Admits a target unless it was already seen or the page ceiling is
    /// reached. Check-then-act is a single call under the caller's lock,
    /// which is what makes admission atomic across workers.
    ///
    /// Returns true if the target was enqueued.
    pub fn try_enqueue(&mut self, target: CrawlTarget) -> bool {
        if self.seen.contains(target.as_str()) {
            return false;
        }

        if let Some(limit) = self.limit {
            if self.seen.len() >= limit {
                if !self.limit_logged {
                    tracing::warn!(
                        "Page ceiling of {} reached, no further targets will be admitted",
                        limit
                    );
                    self.limit_logged = true;
                }
                return false;
            }
        }

        self.seen.insert(target.as_str().to_string());
        self.queue.push_back(target);
        true
    }

    /// Dequeues the next pending target in FIFO order (`Pending -> InFlight`)
    pub fn pop(&mut self) -> Option<CrawlTarget> {
        self.queue.pop_front()
    }

    /// Records a successful render (`InFlight -> Visited`)
    pub fn mark_visited(&mut self) {
        self.visited += 1;
    }

    /// Records a terminal failure (`InFlight -> Failed`). The target stays
    /// in the seen-set, so it is never retried.
    pub fn mark_failed(&mut self) {
        self.failed += 1;
    }

    /// Number of targets still pending
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// True if no targets are pending
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of successfully rendered pages
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Number of terminally failed targets
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Total targets ever admitted (pending + in flight + finished)
    pub fn seen(&self) -> usize {
        self.seen.len()
    }
}
