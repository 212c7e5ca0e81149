/// Fixed-capacity history that always holds exactly `capacity` values.
///
/// Starts filled with `T::default()`, so a snapshot is full length from the
/// first tick. Each push overwrites the oldest slot.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    /// Index of the oldest value, which is also the next slot to overwrite.
    head: usize,
}

impl<T: Clone + Default> RingBuffer<T> {
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        Self {
            slots: vec![T::default(); capacity],
            head: 0,
        }
    }

    pub fn push(&mut self, value: T) {
        self.slots[self.head] = value;
        self.head = (self.head + 1) % self.slots.len();
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Always equal to the capacity.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Oldest → newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    /// Owned copy of the whole history, oldest → newest.
    pub fn snapshot(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    /// Owned copy of the newest `n` values (all of them if `n >= len`).
    pub fn tail(&self, n: usize) -> Vec<T> {
        let skip = self.len().saturating_sub(n);
        self.iter().skip(skip).cloned().collect()
    }

    pub fn latest(&self) -> &T {
        let idx = (self.head + self.slots.len() - 1) % self.slots.len();
        &self.slots[idx]
    }
}
