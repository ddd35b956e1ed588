/// 0-based reference coordinate, `-1` when absent (BAM convention).
pub type Pos = i32;
/// Multimap (`HI`) index, `-1` when the tag is absent.
pub type HitIndex = i32;

/// `(read name, multimap index)`; the key shared by pairing and accuracy tables.
pub type PairKey = (String, HitIndex);

// Fast hash maps using AHash instead of the default SipHash.
// Import `HashMapExt` alongside when you need `::new()` or `::with_capacity()`.
pub type HashMap<K, V> = ahash::HashMap<K, V>;
pub use ahash::HashMapExt;
