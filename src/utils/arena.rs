//! Append-only storage addressed by plain integer indices.
//!
//! Cross references between scene records (triangle to material, node to
//! children, model to root node) are [ArenaIndex] values into one of these,
//! so the contents stay valid when the backing storage reallocates.

pub type ArenaIndex = usize;

#[derive(Debug, Clone)]
pub struct Arena<T> {
    store: Vec<T>,
}

impl<T> Arena<T> {
    /// Creates a new Arena.
    pub fn new() -> Self {
        Self { store: Vec::new() }
    }

    /// Creates a new Arena with space for `capacity` amount of elements
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: Vec::with_capacity(capacity),
        }
    }

    /// Adds the item to the arena, returning its index.
    pub fn add(&mut self, item: T) -> ArenaIndex {
        let index = self.store.len();
        self.store.push(item);
        index
    }

    /// Appends every item of `items`, returning the index range they occupy.
    pub fn extend<I>(&mut self, items: I) -> std::ops::Range<ArenaIndex>
    where
        I: IntoIterator<Item = T>,
    {
        let start = self.store.len();
        self.store.extend(items);
        start..self.store.len()
    }

    /// Returns a reference to the element at the provided index, if any.
    pub fn get(&self, index: ArenaIndex) -> Option<&T> {
        self.store.get(index)
    }

    /// Returns a mutable reference to the element at the provided index, if any.
    pub fn get_mut(&mut self, index: ArenaIndex) -> Option<&mut T> {
        self.store.get_mut(index)
    }

    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.store.last_mut()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.store
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.store
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.store.iter()
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::ops::Index<ArenaIndex> for Arena<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if the position is out of bounds.
    fn index(&self, index: ArenaIndex) -> &Self::Output {
        &self.store[index]
    }
}

impl<T> std::ops::IndexMut<ArenaIndex> for Arena<T> {
    fn index_mut(&mut self, index: ArenaIndex) -> &mut Self::Output {
        &mut self.store[index]
    }
}
