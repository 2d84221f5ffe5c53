//! Growable, index-addressable sequence.
//!
//! `Sequence` manages its own backing buffer: capacity doubles when an
//! append finds the buffer full, and halves when a removal leaves the
//! sequence below a quarter of capacity, never dropping under a fixed
//! floor so alternating insert/remove traffic does not thrash the
//! allocator. Every other structure in this workspace is built on top of
//! it — the hash table stores its buckets in one, the scheduling queue
//! keeps its heap in one.

use crate::error::ContainerError;

/// Capacity never shrinks below this floor.
pub const MIN_CAPACITY: usize = 10;

/// A growable array with contiguous logical positions `0..len`.
#[derive(Debug, Clone)]
pub struct Sequence<T> {
    buf: Box<[Option<T>]>,
    len: usize,
}

fn alloc_buf<T>(capacity: usize) -> Box<[Option<T>]> {
    let mut buf = Vec::with_capacity(capacity);
    buf.resize_with(capacity, || None);
    buf.into_boxed_slice()
}

impl<T> Sequence<T> {
    /// Creates an empty sequence with the default starting capacity.
    pub fn new() -> Self {
        Self::with_capacity(MIN_CAPACITY)
    }

    /// Creates an empty sequence with at least `capacity` slots.
    ///
    /// A zero capacity is bumped to one so the first growth step has a
    /// well-defined doubling base.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: alloc_buf(capacity.max(1)),
            len: 0,
        }
    }

    /// Number of elements currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the sequence holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current slot count of the backing buffer.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn resize(&mut self, new_capacity: usize) {
        let mut new_buf = alloc_buf(new_capacity);
        for (slot, item) in new_buf.iter_mut().zip(self.buf.iter_mut()) {
            *slot = item.take();
        }
        self.buf = new_buf;
    }

    fn grow_if_full(&mut self) {
        if self.len == self.buf.len() {
            self.resize(self.buf.len() * 2);
        }
    }

    fn shrink_if_sparse(&mut self) {
        let capacity = self.buf.len();
        if self.len < capacity / 4 && capacity > MIN_CAPACITY {
            self.resize((capacity / 2).max(MIN_CAPACITY));
        }
    }

    /// Appends an element at the end. Amortised O(1).
    pub fn append(&mut self, item: T) {
        self.grow_if_full();
        self.buf[self.len] = Some(item);
        self.len += 1;
    }

    /// Returns a reference to the element at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len {
            self.buf[index].as_ref()
        } else {
            None
        }
    }

    /// Returns a mutable reference to the element at `index`, if in range.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len {
            self.buf[index].as_mut()
        } else {
            None
        }
    }

    /// Overwrites the element at `index`.
    ///
    /// # Errors
    ///
    /// [`ContainerError::IndexOutOfRange`] if `index >= len`.
    pub fn set(&mut self, index: usize, item: T) -> Result<(), ContainerError> {
        self.replace(index, item).map(|_| ())
    }

    /// Overwrites the element at `index` and returns the previous value.
    ///
    /// # Errors
    ///
    /// [`ContainerError::IndexOutOfRange`] if `index >= len`.
    pub fn replace(&mut self, index: usize, item: T) -> Result<T, ContainerError> {
        if index >= self.len {
            return Err(ContainerError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        match self.buf[index].replace(item) {
            Some(previous) => Ok(previous),
            // Slots below len are always occupied.
            None => Err(ContainerError::IndexOutOfRange {
                index,
                len: self.len,
            }),
        }
    }

    /// Inserts `item` at `index`, shifting later elements right.
    ///
    /// `index == len` is valid and behaves like [`Sequence::append`].
    ///
    /// # Errors
    ///
    /// [`ContainerError::IndexOutOfRange`] if `index > len`.
    pub fn insert(&mut self, index: usize, item: T) -> Result<(), ContainerError> {
        if index > self.len {
            return Err(ContainerError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        self.grow_if_full();
        let mut position = self.len;
        while position > index {
            self.buf[position] = self.buf[position - 1].take();
            position -= 1;
        }
        self.buf[index] = Some(item);
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the element at `index`, shifting later elements
    /// left and shrinking the buffer once it is mostly empty.
    ///
    /// # Errors
    ///
    /// [`ContainerError::Empty`] on an empty sequence,
    /// [`ContainerError::IndexOutOfRange`] if `index >= len`.
    pub fn remove(&mut self, index: usize) -> Result<T, ContainerError> {
        if self.is_empty() {
            return Err(ContainerError::Empty);
        }
        if index >= self.len {
            return Err(ContainerError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        let item = self.buf[index].take();
        for position in index..self.len - 1 {
            self.buf[position] = self.buf[position + 1].take();
        }
        self.len -= 1;
        self.shrink_if_sparse();
        match item {
            Some(item) => Ok(item),
            None => Err(ContainerError::IndexOutOfRange {
                index,
                len: self.len,
            }),
        }
    }

    /// Removes and returns the last element.
    ///
    /// # Errors
    ///
    /// [`ContainerError::Empty`] on an empty sequence.
    pub fn pop_last(&mut self) -> Result<T, ContainerError> {
        if self.is_empty() {
            return Err(ContainerError::Empty);
        }
        self.remove(self.len - 1)
    }

    /// Swaps the elements at indices `a` and `b`.
    ///
    /// # Errors
    ///
    /// [`ContainerError::IndexOutOfRange`] if either index is out of range.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<(), ContainerError> {
        let out_of_range = |index| ContainerError::IndexOutOfRange {
            index,
            len: self.len,
        };
        if a >= self.len {
            return Err(out_of_range(a));
        }
        if b >= self.len {
            return Err(out_of_range(b));
        }
        self.buf.swap(a, b);
        Ok(())
    }

    /// Iterates over the elements in index order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buf[..self.len].iter().filter_map(|slot| slot.as_ref())
    }
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for Sequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut sequence = Sequence::new();
        for item in iter {
            sequence.append(item);
        }
        sequence
    }
}

impl<'a, T> IntoIterator for &'a Sequence<T> {
    type Item = &'a T;
    type IntoIter = std::iter::FilterMap<
        std::slice::Iter<'a, Option<T>>,
        fn(&'a Option<T>) -> Option<&'a T>,
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.buf[..self.len]
            .iter()
            .filter_map(Option::as_ref as fn(&'a Option<T>) -> Option<&'a T>)
    }
}

/// Owning iterator over a [`Sequence`].
pub struct IntoIter<T> {
    buf: Box<[Option<T>]>,
    position: usize,
    len: usize,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        while self.position < self.len {
            let item = self.buf[self.position].take();
            self.position += 1;
            if item.is_some() {
                return item;
            }
        }
        None
    }
}

impl<T> IntoIterator for Sequence<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            len: self.len,
            buf: self.buf,
            position: 0,
        }
    }
}

impl<T: PartialEq> PartialEq for Sequence<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for Sequence<T> {}

impl<T: serde::Serialize> serde::Serialize for Sequence<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T: serde::Deserialize<'de>> serde::Deserialize<'de> for Sequence<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct SeqVisitor<T>(std::marker::PhantomData<T>);

        impl<'de, T: serde::Deserialize<'de>> serde::de::Visitor<'de> for SeqVisitor<T> {
            type Value = Sequence<T>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a sequence of elements")
            }

            fn visit_seq<A>(self, mut access: A) -> Result<Sequence<T>, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut sequence = Sequence::new();
                while let Some(item) = access.next_element()? {
                    sequence.append(item);
                }
                Ok(sequence)
            }
        }

        deserializer.deserialize_seq(SeqVisitor(std::marker::PhantomData))
    }
}
