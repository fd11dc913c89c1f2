//! Keyed store with time-based staleness.
//!
//! Every key carries the sequence number of the last operation that touched
//! it. A fetch takes a [`FetchTicket`] before going to the network and its
//! result is only stored if no newer fetch, patch, invalidation or removal
//! happened in the meantime.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub fetched_at: Instant,
    pub stale_after: Duration,
    pub invalidated: bool,
}

impl<V> CacheEntry<V> {
    pub fn is_fresh(&self, now: Instant) -> bool {
        !self.invalidated && now.saturating_duration_since(self.fetched_at) < self.stale_after
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket<K> {
    key: K,
    seq: u64,
}

impl<K> FetchTicket<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

#[derive(Debug)]
pub struct KeyedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    entries: HashMap<K, CacheEntry<V>>,
    latest: HashMap<K, u64>,
    next_seq: u64,
    stale_after: Duration,
}

impl<K, V> KeyedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(stale_after: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            latest: HashMap::new(),
            next_seq: 0,
            stale_after,
        }
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// Cached value regardless of freshness.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    pub fn entry(&self, key: &K) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    /// Cached value only while inside its staleness window.
    pub fn fresh(&self, key: &K, now: Instant) -> Option<&V> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| &entry.value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn bump(&mut self, key: &K) -> u64 {
        self.next_seq += 1;
        self.latest.insert(key.clone(), self.next_seq);
        self.next_seq
    }

    pub fn begin_fetch(&mut self, key: K) -> FetchTicket<K> {
        let seq = self.bump(&key);
        FetchTicket { key, seq }
    }

    /// Stores a fetched value. Returns `false` and drops the value when the
    /// ticket has been superseded.
    pub fn complete_fetch(&mut self, ticket: FetchTicket<K>, value: V, now: Instant) -> bool {
        if self.latest.get(&ticket.key) != Some(&ticket.seq) {
            return false;
        }

        self.entries.insert(
            ticket.key,
            CacheEntry {
                value,
                fetched_at: now,
                stale_after: self.stale_after,
                invalidated: false,
            },
        );
        true
    }

    /// Seeds a value that is visible to `peek` but forces the next read to refetch.
    pub fn insert_stale(&mut self, key: K, value: V, now: Instant) {
        self.bump(&key);
        self.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: now,
                stale_after: self.stale_after,
                invalidated: true,
            },
        );
    }

    /// Rewrites an existing entry in place. `fetched_at` is left untouched.
    ///
    /// The key is bumped even when nothing is cached, so a fetch already in
    /// flight cannot store a value older than this write.
    pub fn patch<F>(&mut self, key: &K, f: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        self.bump(key);
        match self.entries.get_mut(key) {
            Some(entry) => {
                f(&mut entry.value);
                true
            }
            None => false,
        }
    }

    pub fn invalidate(&mut self, key: &K) {
        self.bump(key);
        if let Some(entry) = self.entries.get_mut(key) {
            entry.invalidated = true;
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.bump(key);
        self.entries.remove(key).map(|entry| entry.value)
    }

    /// Drops entries that have been stale for longer than `grace`, along
    /// with the sequence numbers of keys that no longer hold a value.
    pub fn prune(&mut self, now: Instant, grace: Duration) -> usize {
        let before = self.entries.len();
        let ttl = self.stale_after + grace;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.fetched_at) < ttl);

        let entries = &self.entries;
        self.latest.retain(|key, _| entries.contains_key(key));

        before - self.entries.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.latest.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(key, entry)| (key, &entry.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(120);

    fn cache() -> KeyedCache<String, u32> {
        KeyedCache::new(WINDOW)
    }

    #[test]
    fn fresh_within_window_then_stale() {
        let mut cache = cache();
        let now = Instant::now();

        let ticket = cache.begin_fetch("a".to_string());
        assert!(cache.complete_fetch(ticket, 1, now));

        assert_eq!(cache.fresh(&"a".to_string(), now + Duration::from_secs(119)), Some(&1));
        assert_eq!(cache.fresh(&"a".to_string(), now + WINDOW), None);
        assert_eq!(cache.peek(&"a".to_string()), Some(&1));
    }

    #[test]
    fn superseded_fetch_is_discarded() {
        let mut cache = cache();
        let now = Instant::now();

        let older = cache.begin_fetch("a".to_string());
        let newer = cache.begin_fetch("a".to_string());

        assert!(cache.complete_fetch(newer, 2, now));
        assert!(!cache.complete_fetch(older, 1, now));
        assert_eq!(cache.peek(&"a".to_string()), Some(&2));
    }

    #[test]
    fn tickets_do_not_cross_keys() {
        let mut cache = cache();
        let now = Instant::now();

        let a = cache.begin_fetch("a".to_string());
        let b = cache.begin_fetch("b".to_string());

        assert!(cache.complete_fetch(b, 20, now));
        assert!(cache.complete_fetch(a, 10, now));
        assert_eq!(cache.peek(&"a".to_string()), Some(&10));
        assert_eq!(cache.peek(&"b".to_string()), Some(&20));
    }

    #[test]
    fn patch_supersedes_in_flight_fetch() {
        let mut cache = cache();
        let now = Instant::now();

        let first = cache.begin_fetch("a".to_string());
        cache.complete_fetch(first, 1, now);

        let in_flight = cache.begin_fetch("a".to_string());
        assert!(cache.patch(&"a".to_string(), |v| *v = 5));
        assert!(!cache.complete_fetch(in_flight, 1, now));
        assert_eq!(cache.peek(&"a".to_string()), Some(&5));
    }

    #[test]
    fn patch_of_missing_key_is_a_no_op() {
        let mut cache = cache();
        assert!(!cache.patch(&"missing".to_string(), |v| *v = 1));
        assert!(cache.is_empty());
    }

    #[test]
    fn patch_of_missing_key_still_supersedes_first_fetch() {
        let mut cache = cache();
        let now = Instant::now();

        let first = cache.begin_fetch("a".to_string());
        assert!(!cache.patch(&"a".to_string(), |v| *v = 5));

        assert!(!cache.complete_fetch(first, 1, now));
        assert!(!cache.contains(&"a".to_string()));
    }

    #[test]
    fn invalidate_keeps_value_but_forces_refetch() {
        let mut cache = cache();
        let now = Instant::now();

        let ticket = cache.begin_fetch("a".to_string());
        cache.complete_fetch(ticket, 1, now);
        cache.invalidate(&"a".to_string());

        assert_eq!(cache.fresh(&"a".to_string(), now), None);
        assert_eq!(cache.peek(&"a".to_string()), Some(&1));
    }

    #[test]
    fn removal_discards_late_responses() {
        let mut cache = cache();
        let now = Instant::now();

        let in_flight = cache.begin_fetch("a".to_string());
        cache.remove(&"a".to_string());

        assert!(!cache.complete_fetch(in_flight, 1, now));
        assert!(!cache.contains(&"a".to_string()));
    }

    #[test]
    fn stale_seed_is_visible_but_not_fresh() {
        let mut cache = cache();
        let now = Instant::now();

        cache.insert_stale("a".to_string(), 7, now);
        assert_eq!(cache.peek(&"a".to_string()), Some(&7));
        assert_eq!(cache.fresh(&"a".to_string(), now), None);
    }

    #[test]
    fn prune_drops_long_stale_entries() {
        let mut cache = cache();
        let now = Instant::now();

        let ticket = cache.begin_fetch("a".to_string());
        cache.complete_fetch(ticket, 1, now);

        assert_eq!(cache.prune(now + WINDOW, Duration::from_secs(60)), 0);
        assert_eq!(cache.prune(now + WINDOW + Duration::from_secs(60), Duration::from_secs(60)), 1);
    }

    #[test]
    fn prune_forgets_sequences_of_empty_keys() {
        let mut cache = cache();
        let now = Instant::now();

        let ticket = cache.begin_fetch("kept".to_string());
        cache.complete_fetch(ticket, 1, now);
        cache.remove(&"gone".to_string());
        cache.patch(&"never".to_string(), |v| *v = 2);
        assert_eq!(cache.tracked_keys(), 3);

        assert_eq!(cache.prune(now, Duration::ZERO), 0);
        assert_eq!(cache.tracked_keys(), 1);
        assert_eq!(cache.peek(&"kept".to_string()), Some(&1));
    }
}
