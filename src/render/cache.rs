//! Memoization of rendered waveform bitmaps.
//!
//! Entries live in insertion order. Keys map to a *logical* index that
//! keeps growing; the physical slot is `logical - removed`. When the store
//! grows past capacity the oldest tenth is dropped in one go and `removed`
//! advances, turning every key below it into a permanent miss.

use std::collections::{HashMap, VecDeque};
use std::fmt::{self, Display, Write as _};

use image::RgbaImage;

/// Default number of bitmaps kept before bulk eviction kicks in.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Bounded key → value store with bulk FIFO eviction.
#[derive(Debug)]
pub struct RenderCache<V = RgbaImage> {
    items: VecDeque<V>,
    index: HashMap<String, usize>,
    removed: usize,
    capacity: usize,
}

impl<V> Default for RenderCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<V> RenderCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            index: HashMap::new(),
            removed: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored values (including ones shadowed by a re-added key).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of entries evicted so far.
    pub fn removed_count(&self) -> usize {
        self.removed
    }

    /// Store `value` under `key`, taking ownership.
    ///
    /// Re-adding a key points it at the new value.
    pub fn add(&mut self, key: impl Into<String>, value: V) {
        let logical = self.removed + self.items.len();
        self.items.push_back(value);
        self.index.insert(key.into(), logical);

        if self.items.len() > self.capacity {
            self.evict();
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.slot(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.slot(key).and_then(|slot| self.items.get(slot))
    }

    fn slot(&self, key: &str) -> Option<usize> {
        let logical = *self.index.get(key)?;
        logical.checked_sub(self.removed)
    }

    fn evict(&mut self) {
        let count = (self.capacity / 10).max(1).min(self.items.len());
        self.items.drain(..count);
        self.removed += count;

        let removed = self.removed;
        self.index.retain(|_, logical| *logical >= removed);
        log::debug!(
            "render cache evicted {} entries ({} evicted in total, {} live)",
            count,
            removed,
            self.items.len()
        );
    }
}

/// Hit/miss counters for one draw label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups served from the cache (0.0 when never queried).
    pub fn hit_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}

/// Per-label statistics, for diagnostics only.
#[derive(Debug, Clone, Default)]
pub struct CacheStatsTable {
    labels: HashMap<String, CacheStats>,
}

impl CacheStatsTable {
    pub fn record_hit(&mut self, label: &str) {
        self.entry(label).hits += 1;
    }

    pub fn record_miss(&mut self, label: &str) {
        self.entry(label).misses += 1;
    }

    pub fn get(&self, label: &str) -> CacheStats {
        self.labels.get(label).copied().unwrap_or_default()
    }

    fn entry(&mut self, label: &str) -> &mut CacheStats {
        self.labels.entry(label.to_string()).or_default()
    }
}

impl Display for CacheStatsTable {
    /// One `label: NN% hit rate` line per label, sorted by label.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut labels: Vec<_> = self.labels.iter().collect();
        labels.sort_by(|a, b| a.0.cmp(b.0));
        for (i, (label, stats)) in labels.into_iter().enumerate() {
            if i > 0 {
                f.write_char('\n')?;
            }
            write!(f, "{}: {:.0}% hit rate", label, stats.hit_rate() * 100.0)?;
        }
        Ok(())
    }
}

/// Builds opaque cache keys from every input that affects a render.
///
/// # Example
/// ```
/// use squash_preview::render::CacheKey;
///
/// let key = CacheKey::new("song.wav").part(-12.0).part(4).part(3u64).build();
/// assert_eq!(key, "song.wav, -12, 4, 3");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CacheKey {
    key: String,
}

impl CacheKey {
    pub fn new(identity: impl Display) -> Self {
        Self {
            key: identity.to_string(),
        }
    }

    pub fn part(mut self, part: impl Display) -> Self {
        let _ = write!(self.key, ", {}", part);
        self
    }

    pub fn build(self) -> String {
        self.key
    }
}
