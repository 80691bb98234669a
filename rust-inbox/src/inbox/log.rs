//! Capacity-limited, append-only message log.
//!
//! The log is a cloneable handle around a single mutex-guarded deque, so it
//! can be shared across request handlers the same way the rest of the
//! application state is.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::types::{Message, MAX_MESSAGES};

/// Bounded in-memory log of received messages.
///
/// Entries are stored oldest first. When an append pushes the length past
/// the capacity, the oldest surplus is dropped as one contiguous prefix.
#[derive(Clone)]
pub struct BoundedLog {
    inner: Arc<LogInner>,
}

struct LogInner {
    capacity: usize,
    entries: Mutex<VecDeque<Message>>,
}

impl BoundedLog {
    /// Create an empty log holding at most `capacity` messages.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(LogInner {
                capacity,
                entries: Mutex::new(VecDeque::with_capacity(capacity.min(MAX_MESSAGES))),
            }),
        }
    }

    /// Append a message at the newest position, evicting the oldest entries
    /// if the log is over capacity.
    pub fn append(&self, message: Message) {
        let mut entries = self.inner.entries.lock();
        entries.push_back(message);

        if entries.len() > self.inner.capacity {
            let excess = entries.len() - self.inner.capacity;
            entries.drain(..excess);
        }
    }

    /// Copy of the current contents, newest first.
    pub fn snapshot(&self) -> Vec<Message> {
        let entries = self.inner.entries.lock();
        entries.iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

impl Default for BoundedLog {
    fn default() -> Self {
        Self::new(MAX_MESSAGES)
    }
}
