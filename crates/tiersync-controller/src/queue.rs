//! Per-identity work queue.
//!
//! A key is held at most once in the queue and is never handed to two
//! workers at the same time. Keys added while being processed are queued
//! again when the worker calls [`WorkQueue::done`].
//!
//! Delayed adds are scheduled on a spawned timer task, so workers never sleep.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::trace;

/// First retry delay after a failed reconcile.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(5);
/// Upper bound for the per-key failure backoff.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(1000);

#[derive(Debug, Default)]
struct QueueState {
    queue: VecDeque<String>,
    /// Keys waiting to be processed, queued or deferred.
    dirty: HashSet<String>,
    processing: HashSet<String>,
    failures: HashMap<String, u32>,
    shutting_down: bool,
}

#[derive(Debug)]
pub struct WorkQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    base_delay: Duration,
    max_delay: Duration,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::with_backoff(DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY)
    }

    pub fn with_backoff(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            base_delay,
            max_delay,
        }
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // Every mutation is a single collection operation.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Marks `key` as needing processing.
    pub fn add(&self, key: &str) {
        let mut state = self.lock();
        if state.shutting_down || state.dirty.contains(key) {
            return;
        }
        state.dirty.insert(key.to_string());
        if state.processing.contains(key) {
            trace!(key, "deferring add of key being processed");
            return;
        }
        state.queue.push_back(key.to_string());
        drop(state);
        self.notify.notify_one();
    }

    /// Adds `key` once `delay` has elapsed.
    pub fn add_after(self: &Arc<Self>, key: &str, delay: Duration) {
        if delay.is_zero() {
            self.add(key);
            return;
        }
        let queue = Arc::clone(self);
        let key = key.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(&key);
        });
    }

    /// Adds `key` after its exponential failure backoff and records one more failure.
    pub fn add_rate_limited(self: &Arc<Self>, key: &str) {
        let delay = {
            let mut state = self.lock();
            let failures = state.failures.entry(key.to_string()).or_insert(0);
            let delay = backoff(self.base_delay, self.max_delay, *failures);
            *failures = failures.saturating_add(1);
            delay
        };
        self.add_after(key, delay);
    }

    /// Clears the failure history of `key`.
    pub fn forget(&self, key: &str) {
        self.lock().failures.remove(key);
    }

    pub fn num_requeues(&self, key: &str) -> u32 {
        self.lock().failures.get(key).copied().unwrap_or(0)
    }

    /// Waits for the next key. Returns `None` once the queue is shut down.
    pub async fn get(&self) -> Option<String> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if state.shutting_down {
                    return None;
                }
                if let Some(key) = state.queue.pop_front() {
                    state.dirty.remove(&key);
                    state.processing.insert(key.clone());
                    let more = !state.queue.is_empty();
                    drop(state);
                    if more {
                        self.notify.notify_one();
                    }
                    return Some(key);
                }
            }

            notified.await;
        }
    }

    /// Marks `key` as processed. A deferred add is queued now.
    pub fn done(&self, key: &str) {
        let mut state = self.lock();
        state.processing.remove(key);
        if state.dirty.contains(key) && !state.shutting_down {
            state.queue.push_back(key.to_string());
            drop(state);
            self.notify.notify_one();
        }
    }

    /// Stops handing out keys and wakes every waiting worker.
    pub fn shutdown(&self) {
        self.lock().shutting_down = true;
        self.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.lock().shutting_down
    }

    /// Number of keys ready to be handed out.
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn backoff(base: Duration, max: Duration, failures: u32) -> Duration {
    let factor = 2u32.checked_pow(failures).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backoff(DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, 0), Duration::from_millis(5));
        assert_eq!(backoff(DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, 1), Duration::from_millis(10));
        assert_eq!(backoff(DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, 4), Duration::from_millis(80));
        assert_eq!(backoff(DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, 40), DEFAULT_MAX_DELAY);
    }

    #[tokio::test]
    async fn test_add_deduplicates() {
        let queue = WorkQueue::new();
        queue.add("alice");
        queue.add("alice");
        queue.add("bob");
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.get().await.as_deref(), Some("alice"));
        assert_eq!(queue.get().await.as_deref(), Some("bob"));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_add_while_processing_is_deferred() {
        let queue = WorkQueue::new();
        queue.add("alice");
        let key = queue.get().await.unwrap();

        queue.add("alice");
        assert!(queue.is_empty());

        queue.done(&key);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get().await.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_done_without_readd_drops_key() {
        let queue = WorkQueue::new();
        queue.add("alice");
        let key = queue.get().await.unwrap();
        queue.done(&key);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_wakes_waiters() {
        let queue = WorkQueue::new_shared();
        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.get().await })
        };
        tokio::task::yield_now().await;

        queue.shutdown();
        assert_eq!(waiter.await.unwrap(), None);
        queue.add("alice");
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_after_waits_for_delay() {
        let queue = WorkQueue::new_shared();
        queue.add_after("alice", Duration::from_secs(5));
        tokio::task::yield_now().await;
        assert!(queue.is_empty());

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(queue.is_empty());

        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_counts_and_forget() {
        let queue = WorkQueue::new_shared();
        queue.add_rate_limited("alice");
        queue.add_rate_limited("alice");
        assert_eq!(queue.num_requeues("alice"), 2);

        tokio::time::advance(Duration::from_millis(10)).await;
        tokio::task::yield_now().await;
        assert_eq!(queue.get().await.as_deref(), Some("alice"));

        queue.forget("alice");
        assert_eq!(queue.num_requeues("alice"), 0);
    }
}
