use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use web_time::Instant;

/// Cancellation handle for a delayed post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DelayToken(u64);

struct Inner<C> {
    immediate: VecDeque<C>,
    delayed: Vec<(Instant, DelayToken, C)>,
    next_token: u64,
}

/// "Run this on the update thread, optionally after a delay" — the host
/// engine's main-thread scheduling primitive.
///
/// Handles are cheap to clone and may be posted to from any thread; commands
/// are only ever delivered when the update thread calls [`UpdateQueue::drain`],
/// so the receiving side needs no further locking.
pub struct UpdateQueue<C> {
    inner: Arc<Mutex<Inner<C>>>,
}

impl<C> Clone for UpdateQueue<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> Default for UpdateQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> UpdateQueue<C> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                immediate: VecDeque::new(),
                delayed: Vec::new(),
                next_token: 0,
            })),
        }
    }

    pub fn post(&self, command: C) {
        self.inner.lock().immediate.push_back(command);
    }

    pub fn post_delayed(&self, command: C, delay: Duration, now: Instant) -> DelayToken {
        let mut inner = self.inner.lock();
        let token = DelayToken(inner.next_token);
        inner.next_token += 1;
        inner.delayed.push((now + delay, token, command));
        token
    }

    /// Removes a pending delayed command. Returns false if it already ran.
    pub fn cancel(&self, token: DelayToken) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.delayed.len();
        inner.delayed.retain(|(_, t, _)| *t != token);
        inner.delayed.len() != before
    }

    pub fn is_empty(&self) -> bool {
        let inner = self.inner.lock();
        inner.immediate.is_empty() && inner.delayed.is_empty()
    }

    /// Takes everything due by `now`: all immediate posts, then due delayed
    /// posts in deadline order.
    pub fn drain(&self, now: Instant) -> Vec<C> {
        let mut inner = self.inner.lock();
        let mut out: Vec<C> = inner.immediate.drain(..).collect();
        let mut due: Vec<(Instant, DelayToken, C)> = Vec::new();
        let mut idx = 0;
        while idx < inner.delayed.len() {
            if inner.delayed[idx].0 <= now {
                due.push(inner.delayed.swap_remove(idx));
            } else {
                idx += 1;
            }
        }
        due.sort_by_key(|(deadline, token, _)| (*deadline, token.0));
        out.extend(due.into_iter().map(|(_, _, c)| c));
        out
    }
}
