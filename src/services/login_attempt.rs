//! Failed-login counter per username
//!
//! Bounded table with write-based expiry: every recorded attempt restarts the
//! entry's window, reads do not. When capacity is exceeded the entry written
//! longest ago is evicted first, no matter how often it was read since.

use crate::config::LoginAttemptConfig;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

struct AttemptEntry {
    count: u32,
    written_at: Instant,
    seq: u64,
}

/// 计数表：`write_order` 按写入序号排列，最旧的写入在最前
#[derive(Default)]
struct AttemptTable {
    entries: HashMap<String, AttemptEntry>,
    write_order: BTreeMap<u64, String>,
    next_seq: u64,
}

impl AttemptTable {
    /// 窗口固定，写入顺序即过期顺序，只需从最旧一端清理
    fn purge_expired(&mut self, now: Instant, window: Duration) {
        while let Some((&seq, username)) = self.write_order.first_key_value() {
            let expired = self
                .entries
                .get(username)
                .map_or(true, |entry| now.duration_since(entry.written_at) >= window);
            if !expired {
                break;
            }
            let username = username.clone();
            self.write_order.remove(&seq);
            self.entries.remove(&username);
        }
    }

    fn record(&mut self, username: &str, now: Instant, capacity: usize) -> u32 {
        let seq = self.next_seq;
        self.next_seq += 1;

        let count = match self.entries.get_mut(username) {
            Some(entry) => {
                self.write_order.remove(&entry.seq);
                entry.count = entry.count.saturating_add(1);
                entry.written_at = now;
                entry.seq = seq;
                entry.count
            }
            None => {
                self.entries.insert(
                    username.to_string(),
                    AttemptEntry {
                        count: 1,
                        written_at: now,
                        seq,
                    },
                );
                1
            }
        };
        self.write_order.insert(seq, username.to_string());

        while self.entries.len() > capacity {
            let Some((_, oldest)) = self.write_order.pop_first() else {
                break;
            };
            tracing::debug!(username = %oldest, "Login attempt entry evicted");
            self.entries.remove(&oldest);
        }

        count
    }

    fn remove(&mut self, username: &str) {
        if let Some(entry) = self.entries.remove(username) {
            self.write_order.remove(&entry.seq);
        }
    }
}

pub struct LoginAttemptService {
    max_attempts: u32,
    window: Duration,
    capacity: usize,
    table: Mutex<AttemptTable>,
}

impl LoginAttemptService {
    pub fn new(max_attempts: u32, window: Duration, capacity: u64) -> Self {
        Self {
            max_attempts,
            window,
            capacity: usize::try_from(capacity).unwrap_or(usize::MAX).max(1),
            table: Mutex::new(AttemptTable::default()),
        }
    }

    pub fn from_config(config: &LoginAttemptConfig) -> Self {
        Self::new(config.max_attempts, config.window(), config.capacity)
    }

    // 计数只影响锁定判断，锁被污染时继续使用现有数据
    fn table(&self) -> MutexGuard<'_, AttemptTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one more failed attempt and restart the expiry window
    pub fn record_attempt(&self, username: &str) {
        let now = Instant::now();
        let attempts = {
            let mut table = self.table();
            table.purge_expired(now, self.window);
            table.record(username, now, self.capacity)
        };

        tracing::debug!(username, attempts, "Login attempt recorded");
    }

    /// Current count; absent or expired entries count as zero. Never refreshes
    /// the entry's window or its eviction position.
    pub fn attempts(&self, username: &str) -> u32 {
        let now = Instant::now();
        self.table()
            .entries
            .get(username)
            .filter(|entry| now.duration_since(entry.written_at) < self.window)
            .map_or(0, |entry| entry.count)
    }

    pub fn has_exceeded_limit(&self, username: &str) -> bool {
        self.attempts(username) >= self.max_attempts
    }

    /// Drop the entry immediately, regardless of expiry
    pub fn clear(&self, username: &str) {
        self.table().remove(username);
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Number of tracked usernames once expired entries are dropped
    pub fn tracked(&self) -> u64 {
        let mut table = self.table();
        table.purge_expired(Instant::now(), self.window);
        table.entries.len() as u64
    }
}

impl Default for LoginAttemptService {
    fn default() -> Self {
        Self::from_config(&LoginAttemptConfig::default())
    }
}
