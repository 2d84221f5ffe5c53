//! Exact-match character trie.
//!
//! Used to answer "does this exact phone number / national id already
//! belong to someone" in O(key length). Each node keys its children by
//! single character through a small [`ChainMap`]; a terminal flag marks
//! the end of a stored key so that stored keys which are prefixes of one
//! another stay independent. Despite the family name, this is not a
//! prefix-search facility — lookups are exact-match only.

use crate::map::ChainMap;

/// Bucket count for each node's child map. Keys here are single
/// characters, so a small fixed table is plenty.
const CHILD_BUCKETS: usize = 10;

#[derive(Debug)]
struct TrieNode<V> {
    children: ChainMap<char, TrieNode<V>>,
    terminal: bool,
    value: Option<V>,
}

impl<V> TrieNode<V> {
    fn new() -> Self {
        Self {
            children: ChainMap::new(CHILD_BUCKETS),
            terminal: false,
            value: None,
        }
    }
}

/// Exact-match trie mapping string keys to a payload.
#[derive(Debug)]
pub struct Trie<V> {
    root: TrieNode<V>,
    len: usize,
}

impl<V> Trie<V> {
    /// Creates an empty trie.
    pub fn new() -> Self {
        Self {
            root: TrieNode::new(),
            len: 0,
        }
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the trie holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `key` with `value`, creating one node per character.
    ///
    /// A pre-existing key has its payload silently overwritten.
    pub fn insert(&mut self, key: &str, value: V) {
        let mut node = &mut self.root;
        for ch in key.chars() {
            if !node.children.contains(&ch) {
                node.children.put(ch, TrieNode::new());
            }
            node = match node.children.get_mut(&ch) {
                Some(child) => child,
                // Just inserted above; absent only if the map misbehaves.
                None => return,
            };
        }
        if !node.terminal {
            self.len += 1;
        }
        node.terminal = true;
        node.value = Some(value);
    }

    /// Looks up the payload stored under exactly `key`.
    ///
    /// A missing edge, or a final node that is only an interior prefix of
    /// some longer key, both answer `None`.
    pub fn search(&self, key: &str) -> Option<&V> {
        let mut node = &self.root;
        for ch in key.chars() {
            node = node.children.get(&ch)?;
        }
        if node.terminal {
            node.value.as_ref()
        } else {
            None
        }
    }

    /// Removes `key`, returning whether it was present.
    ///
    /// Nodes left childless and non-terminal by the removal are pruned
    /// bottom-up; pruning stops at the first node that must remain because
    /// it still serves another key.
    pub fn remove(&mut self, key: &str) -> bool {
        let chars: Vec<char> = key.chars().collect();
        let removed = Self::remove_below(&mut self.root, &chars);
        if removed {
            self.len -= 1;
        }
        removed
    }

    fn remove_below(node: &mut TrieNode<V>, key: &[char]) -> bool {
        let Some((&ch, rest)) = key.split_first() else {
            if !node.terminal {
                return false;
            }
            node.terminal = false;
            node.value = None;
            return true;
        };

        let Some(child) = node.children.get_mut(&ch) else {
            return false;
        };
        let removed = Self::remove_below(child, rest);
        if removed && child.children.is_empty() && !child.terminal {
            node.children.remove(&ch);
        }
        removed
    }
}

impl<V> Default for Trie<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_search_round_trip() {
        let mut trie = Trie::new();
        trie.insert("0901234567", "P0001");

        assert_eq!(trie.search("0901234567"), Some(&"P0001"));
        assert_eq!(trie.search("0901234"), None);
        assert_eq!(trie.search("0909999999"), None);
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn insert_overwrites_existing_key() {
        let mut trie = Trie::new();
        trie.insert("123", "old");
        trie.insert("123", "new");

        assert_eq!(trie.search("123"), Some(&"new"));
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn prefix_of_stored_key_is_not_a_match() {
        let mut trie = Trie::new();
        trie.insert("123456", "long");

        assert_eq!(trie.search("123"), None);

        trie.insert("123", "short");
        assert_eq!(trie.search("123"), Some(&"short"));
        assert_eq!(trie.search("123456"), Some(&"long"));
    }

    #[test]
    fn remove_reports_presence_and_clears_payload() {
        let mut trie = Trie::new();
        trie.insert("555", "value");

        assert!(trie.remove("555"));
        assert_eq!(trie.search("555"), None);
        assert!(trie.is_empty());

        assert!(!trie.remove("555"));
        assert!(!trie.remove("never-stored"));
    }

    #[test]
    fn remove_of_interior_prefix_fails_without_damage() {
        let mut trie = Trie::new();
        trie.insert("123456", "long");

        // "123" exists only as interior nodes, not as a stored key.
        assert!(!trie.remove("123"));
        assert_eq!(trie.search("123456"), Some(&"long"));
    }

    #[test]
    fn remove_prunes_only_unshared_suffix() {
        let mut trie = Trie::new();
        trie.insert("1234", "a");
        trie.insert("1299", "b");

        assert!(trie.remove("1234"));
        assert_eq!(trie.search("1234"), None);
        assert_eq!(trie.search("1299"), Some(&"b"));
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn remove_keeps_shorter_stored_prefix() {
        let mut trie = Trie::new();
        trie.insert("12", "short");
        trie.insert("1234", "long");

        assert!(trie.remove("1234"));
        assert_eq!(trie.search("12"), Some(&"short"));
    }
}
