#![forbid(unsafe_code)]

//! Text size estimation and the per-text size cache.
//!
//! Layout never touches a real font. A node's width is the estimated
//! advance of its longest line plus horizontal padding, clamped to
//! `[min_node_width, max_node_width]`. Its height follows from the number of
//! wrapped lines at that width and is only clamped from below: a long label
//! grows downward without bound.
//!
//! Character advances come from the Unicode display width: narrow characters
//! use `latin_char_factor`, wide (CJK / full-width) characters use
//! `wide_char_factor`, zero-width characters contribute nothing.
//!
//! # Cache
//!
//! [`SizeCache`] memoizes sizes by `(text, font size)` fingerprint so that a
//! relayout after an edit only measures the text that actually changed. Each
//! entry keeps its text, so a fingerprint collision is a miss, never another
//! label's size. Entries are tagged with a generation;
//! [`SizeCache::invalidate_all`] makes them stale in O(1) when the metrics in
//! [`LayoutConfig`] change.
//!
//! A full cache evicts an eighth of its entries at once (stale first, then
//! least frequently used), so the eviction scan is amortized over many misses.

use std::hash::{Hash, Hasher};

use mindmap_core::geometry::Size;
use rustc_hash::{FxHashMap, FxHasher};
use unicode_width::UnicodeWidthChar;

use crate::config::LayoutConfig;

/// Guards `ceil` against `1.0000000001` from float division.
const WRAP_EPSILON: f64 = 1e-9;

/// A full cache drops `len / EVICTION_DIVISOR` entries (at least one).
const EVICTION_DIVISOR: usize = 8;

/// Estimated advance of one line of text.
#[must_use]
pub fn estimate_line_width(line: &str, font_size: f64, config: &LayoutConfig) -> f64 {
    line.chars()
        .map(|c| match c.width() {
            Some(0) | None => 0.0,
            Some(1) => config.latin_char_factor,
            Some(_) => config.wide_char_factor,
        })
        .sum::<f64>()
        * font_size
}

/// Estimated node size for `text` at `font_size`.
///
/// Explicit newlines start a new line; each line wraps independently.
#[must_use]
pub fn estimate_node_size(text: &str, font_size: f64, config: &LayoutConfig) -> Size {
    let line_widths: Vec<f64> = text
        .split('\n')
        .map(|line| estimate_line_width(line, font_size, config))
        .collect();
    let longest = line_widths.iter().copied().fold(0.0_f64, f64::max);

    let width = (longest + 2.0 * config.padding_x)
        .max(config.min_node_width)
        .min(config.max_node_width);

    let inner = (width - 2.0 * config.padding_x).max(1.0);
    let lines: f64 = line_widths
        .iter()
        .map(|&w| (w / inner - WRAP_EPSILON).ceil().max(1.0))
        .sum();

    let height = (lines * font_size * config.line_height_factor + 2.0 * config.padding_y)
        .max(config.min_node_height);

    Size::new(width, height)
}

/// Key for size cache lookups.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MeasureKey {
    /// Hash fingerprint of the text.
    pub text_hash: u64,
    /// Text length in bytes; cheap extra discrimination.
    pub text_len: usize,
    /// Font size bits.
    pub font_size_bits: u64,
}

impl MeasureKey {
    #[must_use]
    pub fn new(text: &str, font_size: f64) -> Self {
        let mut hasher = FxHasher::default();
        text.hash(&mut hasher);
        Self {
            text_hash: hasher.finish(),
            text_len: text.len(),
            font_size_bits: font_size.to_bits(),
        }
    }
}

#[derive(Clone, Debug)]
struct CachedSize {
    text: Box<str>,
    size: Size,
    generation: u64,
    access_count: u32,
}

/// Statistics about size cache performance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeCacheStats {
    /// Number of entries currently in the cache.
    pub entries: usize,
    /// Total cache hits since creation or last reset.
    pub hits: u64,
    /// Total cache misses since creation or last reset.
    pub misses: u64,
    /// Hit rate as a fraction (0.0 to 1.0).
    pub hit_rate: f64,
}

/// Bounded memo of estimated node sizes.
///
/// When full, the least frequently accessed entries are evicted in a batch.
#[derive(Debug)]
pub struct SizeCache {
    entries: FxHashMap<MeasureKey, CachedSize>,
    generation: u64,
    max_entries: usize,
    hits: u64,
    misses: u64,
}

impl SizeCache {
    /// Create a cache holding at most `max_entries` sizes.
    #[inline]
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: FxHashMap::with_capacity_and_hasher(max_entries.min(4096), Default::default()),
            generation: 0,
            max_entries,
            hits: 0,
            misses: 0,
        }
    }

    /// Cached size for `text`, estimating and caching it on a miss.
    pub fn get_or_measure(&mut self, text: &str, font_size: f64, config: &LayoutConfig) -> Size {
        let key = MeasureKey::new(text, font_size);
        if let Some(entry) = self.entries.get_mut(&key)
            && entry.generation == self.generation
            && *entry.text == *text
        {
            self.hits += 1;
            entry.access_count = entry.access_count.saturating_add(1);
            return entry.size;
        }

        self.misses += 1;
        let size = estimate_node_size(text, font_size, config);

        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            self.evict_lfu();
        }
        self.entries.insert(
            key,
            CachedSize {
                text: text.into(),
                size,
                generation: self.generation,
                access_count: 1,
            },
        );
        size
    }

    /// Make every entry stale (O(1)); call when the text metrics change.
    #[inline]
    pub fn invalidate_all(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Current hit/miss statistics.
    #[must_use]
    pub fn stats(&self) -> SizeCacheStats {
        let total = self.hits + self.misses;
        SizeCacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            hit_rate: if total > 0 {
                self.hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    #[inline]
    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }

    /// Drop all entries and free their memory.
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    fn evict_lfu(&mut self) {
        let count = (self.entries.len() / EVICTION_DIVISOR).max(1);
        // Stale generations go first.
        let generation = self.generation;
        let mut ranked: Vec<((bool, u32), MeasureKey)> = self
            .entries
            .iter()
            .map(|(k, e)| ((e.generation == generation, e.access_count), *k))
            .collect();
        if count < ranked.len() {
            ranked.select_nth_unstable_by_key(count, |&(rank, _)| rank);
            ranked.truncate(count);
        }
        for (_, key) in ranked {
            self.entries.remove(&key);
        }
    }
}

impl Default for SizeCache {
    /// Room for the texts of a ~16k node tree.
    fn default() -> Self {
        Self::new(16_384)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_clamps_to_min_width() {
        let config = LayoutConfig::default();
        let size = estimate_node_size("Root", config.font_size, &config);
        assert_eq!(size.width, config.min_node_width);
        // One line: 14 * 1.5 + 2 * 10 = 41.
        assert!((size.height - 41.0).abs() < 1e-9);
    }

    #[test]
    fn long_ascii_clamps_width_and_grows_height() {
        let config = LayoutConfig::default();
        let text = "a".repeat(200);
        let size = estimate_node_size(&text, 14.0, &config);
        assert_eq!(size.width, 220.0);
        assert!(size.height > config.min_node_height);
        // 200 * 8.4 = 1680 over an inner width of 188 -> 9 lines.
        assert!((size.height - (9.0 * 21.0 + 20.0)).abs() < 1e-9);
    }

    #[test]
    fn wide_characters_are_wider() {
        let config = LayoutConfig::default();
        let latin = estimate_line_width("abcd", 14.0, &config);
        let cjk = estimate_line_width("思维导图", 14.0, &config);
        assert!(cjk > latin);
        assert!((cjk - 4.0 * 14.0).abs() < 1e-9);
    }

    #[test]
    fn explicit_newlines_wrap_independently() {
        let config = LayoutConfig::default();
        let one = estimate_node_size("alpha", 14.0, &config);
        let three = estimate_node_size("alpha\nbeta\ngamma", 14.0, &config);
        assert_eq!(one.width, three.width);
        assert!((three.height - (3.0 * 21.0 + 20.0)).abs() < 1e-9);
    }

    #[test]
    fn empty_text_is_one_line() {
        let config = LayoutConfig::default();
        let size = estimate_node_size("", 14.0, &config);
        assert_eq!(size.width, config.min_node_width);
        assert!((size.height - 41.0).abs() < 1e-9);
    }

    #[test]
    fn exact_fit_does_not_add_a_line() {
        let config = LayoutConfig {
            latin_char_factor: 1.0,
            ..LayoutConfig::default()
        };
        // 188 inner width / 14 per char is not integral, so build one exactly:
        // 13 chars * 14 = 182 -> width 214, inner 182, exactly one line.
        let size = estimate_node_size(&"x".repeat(13), 14.0, &config);
        assert_eq!(size.width, 214.0);
        assert!((size.height - 41.0).abs() < 1e-9);
    }

    #[test]
    fn cache_hits_on_repeat() {
        let config = LayoutConfig::default();
        let mut cache = SizeCache::new(8);
        let a = cache.get_or_measure("hello", 14.0, &config);
        let b = cache.get_or_measure("hello", 14.0, &config);
        assert_eq!(a, b);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn font_size_is_part_of_key() {
        let config = LayoutConfig::default();
        let mut cache = SizeCache::new(8);
        cache.get_or_measure("hello", 14.0, &config);
        cache.get_or_measure("hello", 20.0, &config);
        assert_eq!(cache.stats().misses, 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn invalidate_all_forces_remeasure() {
        let config = LayoutConfig::default();
        let mut cache = SizeCache::new(8);
        cache.get_or_measure("hello", 14.0, &config);
        cache.invalidate_all();
        cache.get_or_measure("hello", 14.0, &config);
        assert_eq!(cache.stats().misses, 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn colliding_fingerprint_is_a_miss() {
        let config = LayoutConfig::default();
        let mut cache = SizeCache::new(8);
        let short = cache.get_or_measure("ab", 14.0, &config);
        // Plant the short label's size under another text's key.
        let long_text = "a much longer label that needs more room";
        let planted = CachedSize {
            text: "ab".into(),
            size: short,
            generation: cache.generation,
            access_count: 1,
        };
        cache.entries.insert(MeasureKey::new(long_text, 14.0), planted);
        let measured = cache.get_or_measure(long_text, 14.0, &config);
        assert_eq!(measured, estimate_node_size(long_text, 14.0, &config));
        assert_ne!(measured, short);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn eviction_keeps_frequently_used_entries() {
        let config = LayoutConfig::default();
        let mut cache = SizeCache::new(16);
        for _ in 0..5 {
            cache.get_or_measure("hot", 14.0, &config);
        }
        for i in 0..100 {
            cache.get_or_measure(&format!("cold {i}"), 14.0, &config);
        }
        assert!(cache.len() <= 16);
        let misses = cache.stats().misses;
        cache.get_or_measure("hot", 14.0, &config);
        assert_eq!(cache.stats().misses, misses);
    }

    #[test]
    fn capacity_is_bounded() {
        let config = LayoutConfig::default();
        let mut cache = SizeCache::new(4);
        for i in 0..20 {
            cache.get_or_measure(&format!("text {i}"), 14.0, &config);
        }
        assert!(cache.len() <= 4);
        assert_eq!(cache.capacity(), 4);
        cache.clear();
        assert!(cache.is_empty());
    }
}
