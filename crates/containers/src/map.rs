//! Chained hash table with a fixed bucket count.
//!
//! The bucket count is set at construction and never changes: there is no
//! rehashing, so the load factor is unbounded. That is an accepted scaling
//! limitation at clinic scale, not a bug — chains simply grow. Collisions
//! are resolved by a singly linked chain per bucket, with new keys inserted
//! at the chain head so insertion stays O(1).

use crate::sequence::Sequence;

/// Hashing seam for map keys.
///
/// Rather than pulling in a general-purpose hasher, keys declare the bucket
/// code the table folds modulo its bucket count: strings sum their character
/// code points, integers hash to their own value, `char` to its code point.
/// Domain id newtypes implement this by delegating to their inner string.
pub trait BucketKey: Eq {
    /// Raw code folded into a bucket index.
    fn bucket_code(&self) -> u64;
}

impl BucketKey for String {
    fn bucket_code(&self) -> u64 {
        self.chars().map(|ch| ch as u64).sum()
    }
}

impl BucketKey for char {
    fn bucket_code(&self) -> u64 {
        *self as u64
    }
}

impl BucketKey for u32 {
    fn bucket_code(&self) -> u64 {
        u64::from(*self)
    }
}

impl BucketKey for u64 {
    fn bucket_code(&self) -> u64 {
        *self
    }
}

impl BucketKey for usize {
    fn bucket_code(&self) -> u64 {
        *self as u64
    }
}

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    next: Option<Box<Node<K, V>>>,
}

type Bucket<K, V> = Option<Box<Node<K, V>>>;

/// A chained key→value store over [`Sequence`]-backed buckets.
#[derive(Debug)]
pub struct ChainMap<K, V> {
    buckets: Sequence<Bucket<K, V>>,
    len: usize,
}

impl<K: BucketKey, V> ChainMap<K, V> {
    /// Creates a map with `bucket_count` buckets for its whole lifetime.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_count` is zero; a bucketless table cannot place
    /// any key and is a construction-time programming error.
    pub fn new(bucket_count: usize) -> Self {
        assert!(bucket_count > 0, "ChainMap requires at least one bucket");
        let mut buckets = Sequence::with_capacity(bucket_count);
        for _ in 0..bucket_count {
            buckets.append(None);
        }
        Self { buckets, len: 0 }
    }

    /// Number of key→value pairs stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the map holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The bucket count fixed at construction.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn bucket_index(&self, key: &K) -> usize {
        (key.bucket_code() % self.buckets.len() as u64) as usize
    }

    /// Inserts or overwrites the value for `key`, returning the previous
    /// value if the key was already present.
    ///
    /// Existing keys are overwritten in place; new keys become the head of
    /// their bucket chain.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let index = self.bucket_index(&key);
        let head = self.buckets.get_mut(index)?;

        let mut current = head.as_mut();
        while let Some(node) = current {
            if node.key == key {
                return Some(std::mem::replace(&mut node.value, value));
            }
            current = node.next.as_mut();
        }

        let node = Box::new(Node {
            key,
            value,
            next: head.take(),
        });
        *head = Some(node);
        self.len += 1;
        None
    }

    /// Returns a reference to the value for `key`, if present.
    pub fn get(&self, key: &K) -> Option<&V> {
        let index = self.bucket_index(key);
        let mut current = self.buckets.get(index)?.as_deref();
        while let Some(node) = current {
            if node.key == *key {
                return Some(&node.value);
            }
            current = node.next.as_deref();
        }
        None
    }

    /// Returns a mutable reference to the value for `key`, if present.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let index = self.bucket_index(key);
        let mut current = self.buckets.get_mut(index)?.as_mut();
        while let Some(node) = current {
            if node.key == *key {
                return Some(&mut node.value);
            }
            current = node.next.as_mut();
        }
        None
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Unlinks the first node matching `key` and returns its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let index = self.bucket_index(key);
        let mut cursor = self.buckets.get_mut(index)?;
        loop {
            let found = match cursor.as_ref() {
                Some(node) => node.key == *key,
                None => return None,
            };
            if found {
                let node = cursor.take()?;
                *cursor = node.next;
                self.len -= 1;
                return Some(node.value);
            }
            cursor = match cursor.as_mut() {
                Some(node) => &mut node.next,
                None => return None,
            };
        }
    }

    /// Iterates over every pair: buckets in index order, each chain from
    /// head to tail (most recently inserted first).
    ///
    /// This is a snapshot walk only — no ordering contract beyond the above.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: &self.buckets,
            bucket: 0,
            node: None,
        }
    }

    /// Iterates over every value in [`ChainMap::iter`] order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }
}

/// Iterator over the pairs of a [`ChainMap`].
pub struct Iter<'a, K, V> {
    buckets: &'a Sequence<Bucket<K, V>>,
    bucket: usize,
    node: Option<&'a Node<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.node {
                self.node = node.next.as_deref();
                return Some((&node.key, &node.value));
            }
            if self.bucket >= self.buckets.len() {
                return None;
            }
            self.node = self.buckets.get(self.bucket)?.as_deref();
            self.bucket += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_returns_value() {
        let mut map: ChainMap<String, i32> = ChainMap::new(8);
        map.put("alpha".to_string(), 1);
        map.put("beta".to_string(), 2);

        assert_eq!(map.get(&"alpha".to_string()), Some(&1));
        assert_eq!(map.get(&"beta".to_string()), Some(&2));
        assert_eq!(map.get(&"gamma".to_string()), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn put_overwrites_without_changing_count() {
        let mut map: ChainMap<String, i32> = ChainMap::new(4);
        assert_eq!(map.put("key".to_string(), 1), None);
        assert_eq!(map.put("key".to_string(), 2), Some(1));

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&"key".to_string()), Some(&2));
    }

    #[test]
    fn remove_unlinks_and_reports_presence() {
        let mut map: ChainMap<String, i32> = ChainMap::new(4);
        map.put("key".to_string(), 7);

        assert_eq!(map.remove(&"key".to_string()), Some(7));
        assert_eq!(map.remove(&"key".to_string()), None);
        assert_eq!(map.get(&"key".to_string()), None);
        assert!(map.is_empty());
    }

    #[test]
    fn colliding_keys_chain_within_one_bucket() {
        // "ab" and "ba" share a character-code sum, so they always collide.
        let mut map: ChainMap<String, i32> = ChainMap::new(16);
        map.put("ab".to_string(), 1);
        map.put("ba".to_string(), 2);

        assert_eq!(map.get(&"ab".to_string()), Some(&1));
        assert_eq!(map.get(&"ba".to_string()), Some(&2));

        // Removing the chain head keeps the tail reachable.
        assert_eq!(map.remove(&"ba".to_string()), Some(2));
        assert_eq!(map.get(&"ab".to_string()), Some(&1));
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut map: ChainMap<u64, String> = ChainMap::new(4);
        map.put(5, "old".to_string());

        if let Some(value) = map.get_mut(&5) {
            *value = "new".to_string();
        }
        assert_eq!(map.get(&5).map(String::as_str), Some("new"));
    }

    #[test]
    fn iter_walks_buckets_head_to_tail() {
        // One bucket forces a single chain; the last insert is the head.
        let mut map: ChainMap<String, i32> = ChainMap::new(1);
        map.put("first".to_string(), 1);
        map.put("second".to_string(), 2);
        map.put("third".to_string(), 3);

        let keys: Vec<&str> = map.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["third", "second", "first"]);
        assert_eq!(map.values().copied().sum::<i32>(), 6);
    }

    #[test]
    #[should_panic(expected = "at least one bucket")]
    fn zero_buckets_is_rejected() {
        let _ = ChainMap::<String, i32>::new(0);
    }
}
