//! Hash collections used across Strata.

pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_ahash() {
        let mut map = HashMap::new();
        map.insert((1u64, 2u64, 0u32), "bind group");
        assert_eq!(map.get(&(1, 2, 0)), Some(&"bind group"));
    }

    #[test]
    fn test_hashset_ahash() {
        let mut set = HashSet::new();
        set.insert(42u64);
        assert!(set.contains(&42));
    }
}
