use crate::{
    core::constants::{DEFAULT_CACHE_CAPACITY, MIN_CACHE_CAPACITY},
    tiles::address::TileAddress,
};
use lru::LruCache;
use std::{hash::Hash, num::NonZeroUsize};

/// Bounded recency list of loaded tiles.
///
/// The cache only tracks *which* tiles are resident; the caller owns the tiles
/// themselves and releases whatever [`insert`](TileCache::insert) evicts.
/// Capacity is never below two, so inserting a tile cannot evict the tile
/// that was used just before it.
#[derive(Debug)]
pub struct TileCache<K: Hash + Eq = TileAddress> {
    entries: LruCache<K, ()>,
    capacity: usize,
}

impl<K: Hash + Eq> TileCache<K> {
    /// Create a new cache; capacities below two are raised to two
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CACHE_CAPACITY);
        let bound = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(bound),
            capacity,
        }
    }

    /// Adds a tile as most recently used and returns the tile it displaced.
    ///
    /// Inserting a tile that is already resident only refreshes it.
    pub fn insert(&mut self, key: K) -> Option<K> {
        if self.entries.contains(&key) {
            self.entries.promote(&key);
            return None;
        }
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_lru().map(|(evicted, _)| evicted)
        } else {
            None
        };
        if evicted.is_some() {
            log::debug!("tile cache full at {}, evicted oldest entry", self.capacity);
        }
        self.entries.put(key, ());
        evicted
    }

    /// Marks a resident tile as most recently used. Returns false if it is not resident.
    pub fn refresh(&mut self, key: &K) -> bool {
        if !self.entries.contains(key) {
            return false;
        }
        self.entries.promote(key);
        true
    }

    /// Removes a tile without counting it as an eviction
    pub fn remove(&mut self, key: &K) -> bool {
        self.entries.pop(key).is_some()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    /// The tile the next full insert would evict
    pub fn peek_oldest(&self) -> Option<&K> {
        self.entries.peek_lru().map(|(key, _)| key)
    }

    /// Resident tiles, most recently used first
    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: Hash + Eq> Default for TileCache<K> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(col: u32) -> TileAddress {
        TileAddress::new(10, col, 0)
    }

    #[test]
    fn test_tile_cache_basic_operations() {
        let mut cache = TileCache::new(3);
        assert!(cache.is_empty());

        assert_eq!(cache.insert(tile(1)), None);
        assert_eq!(cache.insert(tile(2)), None);
        assert_eq!(cache.insert(tile(3)), None);
        assert_eq!(cache.len(), 3);
        assert!(cache.contains(&tile(2)));

        // least recently used goes first
        assert_eq!(cache.insert(tile(4)), Some(tile(1)));
        assert!(!cache.contains(&tile(1)));

        assert!(cache.remove(&tile(3)));
        assert!(!cache.remove(&tile(3)));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_refresh_changes_eviction_order() {
        let mut cache = TileCache::new(2);
        cache.insert(tile(1));
        cache.insert(tile(2));
        assert_eq!(cache.peek_oldest(), Some(&tile(1)));

        assert!(cache.refresh(&tile(1)));
        assert_eq!(cache.insert(tile(3)), Some(tile(2)));
        assert!(!cache.refresh(&tile(2)));
        assert_eq!(cache.iter().copied().collect::<Vec<_>>(), vec![tile(3), tile(1)]);
    }

    #[test]
    fn test_reinsert_refreshes() {
        let mut cache = TileCache::new(2);
        cache.insert(tile(1));
        cache.insert(tile(2));
        assert_eq!(cache.insert(tile(1)), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.insert(tile(3)), Some(tile(2)));
    }

    #[test]
    fn test_capacity_is_clamped() {
        let mut cache = TileCache::new(0);
        assert_eq!(cache.capacity(), MIN_CACHE_CAPACITY);
        cache.insert(tile(1));
        assert_eq!(cache.insert(tile(2)), None);
        assert_eq!(cache.insert(tile(3)), Some(tile(1)));
        assert_eq!(TileCache::<TileAddress>::default().capacity(), DEFAULT_CACHE_CAPACITY);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::VecDeque;

        #[derive(Debug, Clone)]
        enum Op {
            Insert(u32),
            Refresh(u32),
            Remove(u32),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u32..12).prop_map(Op::Insert),
                (0u32..12).prop_map(Op::Refresh),
                (0u32..12).prop_map(Op::Remove),
            ]
        }

        proptest! {
            #[test]
            fn cache_matches_a_recency_list(capacity in 0usize..6, ops in prop::collection::vec(op(), 0..80)) {
                let mut cache = TileCache::new(capacity);
                let capacity = cache.capacity();
                // front is least recently used
                let mut model: VecDeque<u32> = VecDeque::new();

                for op in ops {
                    match op {
                        Op::Insert(col) => {
                            let evicted = cache.insert(tile(col));
                            if let Some(pos) = model.iter().position(|&c| c == col) {
                                model.remove(pos);
                                model.push_back(col);
                                prop_assert_eq!(evicted, None);
                            } else {
                                let expected = if model.len() >= capacity { model.pop_front() } else { None };
                                model.push_back(col);
                                prop_assert_eq!(evicted, expected.map(tile));
                            }
                        }
                        Op::Refresh(col) => {
                            let found = cache.refresh(&tile(col));
                            match model.iter().position(|&c| c == col) {
                                Some(pos) => {
                                    model.remove(pos);
                                    model.push_back(col);
                                    prop_assert!(found);
                                }
                                None => prop_assert!(!found),
                            }
                        }
                        Op::Remove(col) => {
                            let removed = cache.remove(&tile(col));
                            let pos = model.iter().position(|&c| c == col);
                            prop_assert_eq!(removed, pos.is_some());
                            if let Some(pos) = pos {
                                model.remove(pos);
                            }
                        }
                    }
                    prop_assert!(cache.len() <= capacity);
                    prop_assert_eq!(cache.len(), model.len());
                    prop_assert_eq!(cache.peek_oldest().copied(), model.front().copied().map(tile));
                }
            }
        }
    }
}
