use crate::message::{Message, DEFAULT_DOMAIN_CAPACITY, DEFAULT_RAW_CAPACITY};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

const DEFAULT_MAX_IDLE: usize = 1024;

/// Free list of pre-sized [`Message`] objects shared between request
/// handlers.
///
/// `acquire` hands out a message with zero-length buffers but retained
/// capacity; `release` gives it back. The pool never holds more than
/// `max_idle` idle messages, extra ones are dropped.
pub struct MessagePool {
    free: Mutex<Vec<Message<'static>>>,
    max_idle: usize,
    raw_capacity: usize,
    domain_capacity: usize,
    total_created: AtomicU64,
    total_reused: AtomicU64,
    total_dropped: AtomicU64,
}

impl Default for MessagePool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IDLE)
    }
}

impl MessagePool {
    pub fn new(max_idle: usize) -> Self {
        Self::with_capacity(max_idle, DEFAULT_RAW_CAPACITY, DEFAULT_DOMAIN_CAPACITY)
    }

    pub fn with_capacity(max_idle: usize, raw_capacity: usize, domain_capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(max_idle.min(DEFAULT_MAX_IDLE))),
            max_idle,
            raw_capacity,
            domain_capacity,
            total_created: AtomicU64::new(0),
            total_reused: AtomicU64::new(0),
            total_dropped: AtomicU64::new(0),
        }
    }

    pub fn acquire(&self) -> Message<'static> {
        let reused = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();

        match reused {
            Some(mut msg) => {
                self.total_reused.fetch_add(1, Ordering::Relaxed);
                msg.reset();
                msg
            }
            None => {
                self.total_created.fetch_add(1, Ordering::Relaxed);
                Message::with_capacity(self.raw_capacity, self.domain_capacity)
            }
        }
    }

    /// Returns `msg` to the pool. Contents are not cleared here; the next
    /// `acquire` truncates them.
    pub fn release(&self, msg: Message<'_>) {
        let msg = msg.detach();
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.max_idle {
            free.push(msg);
        } else {
            drop(free);
            self.total_dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            total_created: self.total_created.load(Ordering::Relaxed),
            total_reused: self.total_reused.load(Ordering::Relaxed),
            total_dropped: self.total_dropped.load(Ordering::Relaxed),
            idle: self.free.lock().unwrap_or_else(PoisonError::into_inner).len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub total_created: u64,
    pub total_reused: u64,
    /// Messages released while the pool was already full.
    pub total_dropped: u64,
    pub idle: usize,
}

impl PoolStats {
    pub fn reuse_rate(&self) -> f64 {
        let total = self.total_created + self.total_reused;
        if total == 0 {
            0.0
        } else {
            self.total_reused as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_keeps_capacity() {
        let pool = MessagePool::new(4);
        let mut msg = pool.acquire();
        msg.parse_copied(b"\x00\x01\x00\x00\x00\x01\x00\x00\x00\x00\x00\x00\x01a\x00\x00\x01\x00\x01")
            .unwrap();
        pool.release(msg);

        let msg = pool.acquire();
        assert!(msg.raw().is_empty());
        assert_eq!(msg.domain(), "");

        let stats = pool.stats();
        assert_eq!(stats.total_created, 1);
        assert_eq!(stats.total_reused, 1);
    }

    #[test]
    fn test_release_beyond_max_idle_drops() {
        let pool = MessagePool::new(1);
        let a = pool.acquire();
        let b = pool.acquire();
        pool.release(a);
        pool.release(b);
        let stats = pool.stats();
        assert_eq!(stats.idle, 1);
        assert_eq!(stats.total_dropped, 1);
    }
}
