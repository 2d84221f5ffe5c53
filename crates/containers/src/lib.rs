//! # mediq Containers
//!
//! From-scratch storage structures backing the mediq clinic queue system:
//!
//! - [`Sequence`] — a growable, index-addressable array with amortised O(1)
//!   append and capacity management
//! - [`ChainMap`] — a chained hash table with a bucket count fixed at
//!   construction
//! - [`Trie`] — an exact-match character trie used to deduplicate natural
//!   keys (phone numbers, national ids)
//!
//! **Deliberately not a general-purpose container library.** The structures
//! implement exactly the operations the queue system needs; in particular the
//! trie has no prefix search and the hash table never rehashes. Domain logic
//! belongs in `mediq-core`.

pub mod error;
pub mod map;
pub mod sequence;
pub mod trie;

pub use error::ContainerError;
pub use map::{BucketKey, ChainMap};
pub use sequence::Sequence;
pub use trie::Trie;
