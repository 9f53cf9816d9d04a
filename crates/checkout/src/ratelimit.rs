//! Order-placement rate limiting.
//!
//! One sliding window of recent attempts per user. The admission check and
//! the recording of the admitted attempt happen under a single lock, so two
//! concurrent requests from the same user cannot both observe "one slot
//! left" and slip past the limit.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use common::UserId;

use crate::clock::Clock;

/// Admission policy for order placement.
pub trait RateLimitPolicy: Send + Sync {
    /// Records the attempt and returns whether it is admitted.
    fn try_acquire(&self, user_id: UserId) -> bool;
}

/// Admits everything. Useful where a caller composes its own throttling.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

impl RateLimitPolicy for Unlimited {
    fn try_acquire(&self, _user_id: UserId) -> bool {
        true
    }
}

const DEFAULT_MAX_TRACKED_USERS: usize = 10_000;

/// Sliding-window limiter: at most `limit` admitted attempts per user
/// within the rolling `window`.
///
/// The per-user map is bounded: once it outgrows `max_tracked_users`,
/// users whose whole window has expired are dropped before new entries are
/// accepted.
pub struct SlidingWindowLimiter<C: Clock> {
    limit: usize,
    window: Duration,
    max_tracked_users: usize,
    clock: C,
    attempts: Mutex<HashMap<UserId, VecDeque<DateTime<Utc>>>>,
}

impl<C: Clock> SlidingWindowLimiter<C> {
    /// Creates a limiter admitting `limit` attempts per `window` per user.
    pub fn new(limit: usize, window: Duration, clock: C) -> Self {
        Self {
            limit,
            window,
            max_tracked_users: DEFAULT_MAX_TRACKED_USERS,
            clock,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides the tracked-user bound.
    pub fn with_max_tracked_users(mut self, max_tracked_users: usize) -> Self {
        self.max_tracked_users = max_tracked_users;
        self
    }

    /// Returns the number of users currently tracked.
    pub fn tracked_users(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }
}

impl<C: Clock> RateLimitPolicy for SlidingWindowLimiter<C> {
    fn try_acquire(&self, user_id: UserId) -> bool {
        let now = self.clock.now();
        let cutoff = now - self.window;
        let mut attempts = self.attempts.lock().unwrap();

        if attempts.len() >= self.max_tracked_users && !attempts.contains_key(&user_id) {
            attempts.retain(|_, window| window.back().is_some_and(|last| *last > cutoff));
        }

        let window = attempts.entry(user_id).or_default();
        while window.front().is_some_and(|first| *first <= cutoff) {
            window.pop_front();
        }

        if window.len() >= self.limit {
            return false;
        }
        window.push_back(now);
        true
    }
}
