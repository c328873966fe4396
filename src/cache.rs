use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Index sentinel for the intrusive list.
const NIL: usize = usize::MAX;

struct Slot<K, V> {
    key: K,
    value: V,
    created_at: Instant,
    ttl: Option<Duration>,
    last_access: Instant,
    /// Access count within the current sliding window, used by the
    /// adaptive wrapper to decide promotion.
    heat: u32,
    heat_window_start: Instant,
    prev: usize,
    next: usize,
}

/// A bounded LRU cache with O(1) lookup, touch and eviction.
///
/// Backed by a `HashMap` from key to slot index plus a doubly linked
/// list threaded through a slab of slots, so `get`/`insert` relink in
/// constant time and eviction pops the tail. TTL is checked lazily on
/// read; [`LruCache::expire_batch`] offers a bounded sweep for callers
/// that want proactive cleanup.
pub struct LruCache<K, V> {
    map: HashMap<K, usize>,
    slots: Vec<Option<Slot<K, V>>>,
    free: Vec<usize>,
    /// Most recently used
    head: usize,
    /// Least recently used
    tail: usize,
    max_size: usize,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        LruCache {
            map: HashMap::with_capacity(max_size),
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            max_size,
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Look up a key, refreshing its recency. Expired entries are
    /// removed on access and reported as misses.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        let now = Instant::now();
        if self.expired(idx, now) {
            self.remove_index(idx);
            return None;
        }
        self.detach(idx);
        self.attach_front(idx);
        let slot = self.slots[idx].as_mut().expect("linked slot");
        slot.last_access = now;
        Some(&slot.value)
    }

    /// Look up without refreshing recency or removing expired entries.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        if self.expired(idx, Instant::now()) {
            return None;
        }
        Some(&self.slot(idx).value)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.peek(key).is_some()
    }

    /// Insert or update a key at the head of the recency order.
    ///
    /// Inserting a new key into a full cache evicts the tail; the
    /// evicted entry is returned so tiered callers can relocate it.
    pub fn insert(&mut self, key: K, value: V, ttl: Option<Duration>) -> Option<(K, V, Instant)> {
        self.insert_at(key, value, ttl, Instant::now())
    }

    /// `insert` with an explicit creation time. Tiered callers use this
    /// to move an entry between tiers without restarting its TTL.
    pub fn insert_at(
        &mut self,
        key: K,
        value: V,
        ttl: Option<Duration>,
        created_at: Instant,
    ) -> Option<(K, V, Instant)> {
        let now = Instant::now();
        if let Some(&idx) = self.map.get(&key) {
            self.detach(idx);
            self.attach_front(idx);
            let slot = self.slots[idx].as_mut().expect("linked slot");
            slot.value = value;
            slot.created_at = created_at;
            slot.ttl = ttl;
            slot.last_access = now;
            return None;
        }

        let evicted = if self.map.len() >= self.max_size {
            let tail = self.tail;
            Some(self.remove_index(tail))
        } else {
            None
        };

        let slot = Slot {
            key: key.clone(),
            value,
            created_at,
            ttl,
            last_access: now,
            heat: 0,
            heat_window_start: now,
            prev: NIL,
            next: NIL,
        };
        let idx = self.alloc(slot);
        self.attach_front(idx);
        self.map.insert(key, idx);
        evicted
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Some(self.take_entry(key)?.1)
    }

    /// Remove a key, returning the value together with its creation
    /// time so the entry can be re-inserted elsewhere with its TTL
    /// deadline intact.
    pub fn take_entry<Q>(&mut self, key: &Q) -> Option<(K, V, Instant)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        Some(self.remove_index(idx))
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.slots.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    /// Bump the sliding-window access counter for a present key and
    /// return the new count. The window restarts once `window` elapses.
    pub fn heat<Q>(&mut self, key: &Q, window: Duration) -> u32
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&idx) = self.map.get(key) else {
            return 0;
        };
        let now = Instant::now();
        let slot = self.slots[idx].as_mut().expect("linked slot");
        if now.duration_since(slot.heat_window_start) > window {
            slot.heat = 0;
            slot.heat_window_start = now;
        }
        slot.heat += 1;
        slot.heat
    }

    /// Remove up to `limit` expired entries, scanning from the LRU end.
    pub fn expire_batch(&mut self, limit: usize) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        let mut cursor = self.tail;
        let mut visited = 0;
        while cursor != NIL && visited < limit {
            let prev = self.slot(cursor).prev;
            if self.expired(cursor, now) {
                self.remove_index(cursor);
                removed += 1;
            }
            cursor = prev;
            visited += 1;
        }
        removed
    }

    /// Pop up to `limit` entries whose last access is older than
    /// `idle`, starting from the LRU end. Recency order means the scan
    /// stops at the first sufficiently fresh entry.
    pub fn pop_idle(&mut self, idle: Duration, limit: usize) -> Vec<(K, V, Instant)> {
        let now = Instant::now();
        let mut popped = Vec::new();
        while popped.len() < limit && self.tail != NIL {
            let slot = self.slot(self.tail);
            if now.duration_since(slot.last_access) < idle {
                break;
            }
            let tail = self.tail;
            popped.push(self.remove_index(tail));
        }
        popped
    }

    fn expired(&self, idx: usize, now: Instant) -> bool {
        let slot = self.slot(idx);
        slot.ttl
            .is_some_and(|t| now.duration_since(slot.created_at) >= t)
    }

    fn slot(&self, idx: usize) -> &Slot<K, V> {
        self.slots[idx].as_ref().expect("linked slot")
    }

    fn remove_index(&mut self, idx: usize) -> (K, V, Instant) {
        self.detach(idx);
        self.free.push(idx);
        let slot = self.slots[idx].take().expect("linked slot");
        self.map.remove(&slot.key);
        (slot.key, slot.value, slot.created_at)
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let slot = self.slot(idx);
            (slot.prev, slot.next)
        };
        if prev != NIL {
            self.slots[prev].as_mut().expect("linked slot").next = next;
        } else if self.head == idx {
            self.head = next;
        }
        if next != NIL {
            self.slots[next].as_mut().expect("linked slot").prev = prev;
        } else if self.tail == idx {
            self.tail = prev;
        }
    }

    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let slot = self.slots[idx].as_mut().expect("linked slot");
            slot.prev = NIL;
            slot.next = old_head;
        }
        if old_head != NIL {
            self.slots[old_head].as_mut().expect("linked slot").prev = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }

    fn alloc(&mut self, slot: Slot<K, V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                idx
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        }
    }
}

/// Read-only cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub promotions: u64,
    pub demotions: u64,
    pub hit_rate: f64,
}

/// Two-tier adaptive cache: a small `hot` LRU in front of a larger
/// `cold` LRU.
///
/// New entries start cold. A cold entry crossing the promotion
/// threshold within its sliding window moves to the hot tier; hot
/// entries idle past the demotion threshold move back to cold during
/// maintenance. Per-entry lifecycle: cold, hot, cold, removed.
pub struct AdaptiveCache<K, V> {
    hot: LruCache<K, V>,
    cold: LruCache<K, V>,
    promotion_threshold: u32,
    demotion_idle: Duration,
    ttl: Option<Duration>,
    hits: u64,
    misses: u64,
    promotions: u64,
    demotions: u64,
    writes: u64,
}

/// Maintenance cadence in writes between bounded cleanup passes.
const MAINTENANCE_INTERVAL: u64 = 64;

impl<K: Hash + Eq + Clone, V: Clone> AdaptiveCache<K, V> {
    pub fn new(
        hot_size: usize,
        cold_size: usize,
        promotion_threshold: u32,
        demotion_idle: Duration,
        ttl: Option<Duration>,
    ) -> Self {
        AdaptiveCache {
            hot: LruCache::new(hot_size),
            cold: LruCache::new(cold_size),
            promotion_threshold: promotion_threshold.max(1),
            demotion_idle,
            ttl,
            hits: 0,
            misses: 0,
            promotions: 0,
            demotions: 0,
            writes: 0,
        }
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        if let Some(value) = self.hot.get(key) {
            self.hits += 1;
            return Some(value.clone());
        }
        let Some(value) = self.cold.get(key).cloned() else {
            self.misses += 1;
            return None;
        };
        self.hits += 1;
        if self.cold.heat(key, self.demotion_idle) >= self.promotion_threshold {
            // Tier moves keep the original creation time, so the TTL
            // deadline stays absolute
            if let Some((k, v, created)) = self.cold.take_entry(key) {
                self.promotions += 1;
                if let Some((lru_key, lru_value, lru_created)) =
                    self.hot.insert_at(k, v, self.ttl, created)
                {
                    // A full hot tier demotes its own LRU entry instead
                    // of dropping it
                    self.demotions += 1;
                    self.cold.insert_at(lru_key, lru_value, self.ttl, lru_created);
                }
            }
        }
        Some(value)
    }

    pub fn set(&mut self, key: K, value: V) {
        if self.hot.contains(&key) {
            self.hot.insert(key, value, self.ttl);
        } else {
            self.cold.insert(key, value, self.ttl);
        }
        self.writes += 1;
        if self.writes % MAINTENANCE_INTERVAL == 0 {
            self.maintain();
        }
    }

    pub fn delete(&mut self, key: &K) -> bool {
        let in_hot = self.hot.remove(key).is_some();
        let in_cold = self.cold.remove(key).is_some();
        in_hot || in_cold
    }

    pub fn contains(&self, key: &K) -> bool {
        self.hot.contains(key) || self.cold.contains(key)
    }

    pub fn len(&self) -> usize {
        self.hot.len() + self.cold.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries. Statistics survive, they describe the cache
    /// lifetime rather than its current contents.
    pub fn clear(&mut self) {
        self.hot.clear();
        self.cold.clear();
    }

    /// Bounded cleanup pass: expire a batch capped at 10% of each tier
    /// and demote idle hot entries. Runs automatically every
    /// `MAINTENANCE_INTERVAL` writes; callers may also invoke it
    /// directly.
    pub fn maintain(&mut self) {
        let cold_limit = (self.cold.len() / 10).max(1);
        self.cold.expire_batch(cold_limit);
        let hot_limit = (self.hot.len() / 10).max(1);
        self.hot.expire_batch(hot_limit);
        for (key, value, created) in self.hot.pop_idle(self.demotion_idle, hot_limit) {
            self.demotions += 1;
            self.cold.insert_at(key, value, self.ttl, created);
        }
    }

    pub fn stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        CacheStats {
            size: self.len(),
            hits: self.hits,
            misses: self.misses,
            promotions: self.promotions,
            demotions: self.demotions,
            hit_rate: if total == 0 {
                0.0
            } else {
                self.hits as f64 / total as f64
            },
        }
    }
}
