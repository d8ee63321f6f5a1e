//! Collection aliases used by the graph and triangulation code.
//!
//! All hashing goes through `rustc_hash::FxHasher`: keys are point indices and
//! sorted index tuples produced by the crate itself, never attacker-controlled.

use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Inline capacity for per-point edge lists and simplex vertex lists.
///
/// A d-simplex has `d + 1` vertices and a point of a Gabriel graph in low
/// dimensions typically has fewer than eight incident edges, so both stay on
/// the stack for the common 2D–7D cases.
pub const INLINE_CAPACITY: usize = 8;

/// `HashMap` backed by `FxHasher`.
///
/// # Examples
///
/// ```rust
/// use empty_space::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<u64, usize> = FastHashMap::default();
/// map.insert(123, 456);
/// assert_eq!(map.get(&123), Some(&456));
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// `HashSet` backed by `FxHasher`.
pub type FastHashSet<T> = FxHashSet<T>;

/// Small-optimized Vec that stays on the stack for up to `N` elements.
///
/// # Examples
///
/// ```rust
/// use empty_space::core::collections::SmallBuffer;
///
/// let mut buffer: SmallBuffer<usize, 8> = SmallBuffer::new();
/// buffer.extend([0, 1, 2]);
/// assert!(!buffer.spilled());
/// ```
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Creates a [`FastHashMap`] with pre-allocated capacity.
#[inline]
#[must_use]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, FxBuildHasher)
}

/// Creates a [`FastHashSet`] with pre-allocated capacity.
#[inline]
#[must_use]
pub fn fast_hash_set_with_capacity<T>(capacity: usize) -> FastHashSet<T> {
    FastHashSet::with_capacity_and_hasher(capacity, FxBuildHasher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_helpers_produce_empty_collections() {
        let map = fast_hash_map_with_capacity::<usize, usize>(16);
        let set = fast_hash_set_with_capacity::<usize>(16);
        assert!(map.is_empty() && map.capacity() >= 16);
        assert!(set.is_empty() && set.capacity() >= 16);
    }
}
