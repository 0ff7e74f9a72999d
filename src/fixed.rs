use core::{
    fmt::{self, Debug},
    hash::{BuildHasher, Hash},
};
use std::collections::hash_map::RandomState;

use crate::{
    error::{Error, Result},
    raw::{
        util::{fold_hash, good_size, make_hash, MAX_TABLE_SIZE},
        RawTable, Slot,
    },
    Equivalent,
};

/// Backing arrays for a [`FixedMap`].
///
/// A `Storage` is meant to live in the stack frame of the function that builds the
/// map. The map borrows it mutably, so the map can never escape that frame and the
/// storage can back a new map once the old one is gone.
///
/// ```
/// use fixed_mode::{FixedMap, Storage};
///
/// let mut storage = Storage::<u32, u32>::new();
/// let mut map = FixedMap::<_, _>::with_storage(8, &mut storage);
/// assert!(map.try_add(1, 10));
/// assert_eq!(map.try_get(&1), Some(10));
/// ```
pub struct Storage<K, V> {
    buckets: [i32; MAX_TABLE_SIZE],
    entries: [Slot<K, V>; MAX_TABLE_SIZE],
}

impl<K, V> Storage<K, V> {
    #[inline]
    pub const fn new() -> Self {
        Self {
            buckets: [0; MAX_TABLE_SIZE],
            entries: [const { Slot::VACANT }; MAX_TABLE_SIZE],
        }
    }
}

impl<K, V> Default for Storage<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// What an insert does when the key is already present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InsertionBehavior {
    /// Leave the stored value alone and report that nothing was inserted.
    Reject,
    Overwrite,
    FailOnExisting,
}

/// A hash map of `Copy` keys and values that never allocates and never grows.
///
/// The map is built with a `u8` capacity. Inserting a new key once `capacity` keys
/// are present fails with a return value instead of resizing. Collisions are
/// resolved by chaining through slot indices, and removed slots are reused
/// through a free list.
///
/// A map built with capacity 0 borrows no storage at all: every lookup misses and
/// every insert is refused.
pub struct FixedMap<'a, K, V, S = RandomState> {
    raw: RawTable<'a, K, V>,
    hash_builder: S,
}

impl<K, V, S> Debug for FixedMap<'_, K, V, S>
where
    K: Copy,
    V: Copy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedMap")
            .field("count", &self.count())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

impl<K: Copy, V: Copy, S: Default> Default for FixedMap<'_, K, V, S> {
    /// Creates a zero-capacity map.
    #[inline]
    fn default() -> Self {
        Self::zero_capacity_with_hasher(Default::default())
    }
}

impl<'a, K: Copy, V: Copy, S: Default> FixedMap<'a, K, V, S> {
    /// Creates a map able to hold `capacity` keys in the given storage.
    ///
    /// The table length is rounded up to the next prime of an internal size table.
    /// A capacity of 0 leaves `storage` untouched.
    #[inline]
    pub fn with_storage(capacity: u8, storage: &'a mut Storage<K, V>) -> Self {
        Self::with_storage_and_hasher(capacity, storage, Default::default())
    }

    /// Creates a map that holds nothing and borrows nothing.
    #[inline]
    pub fn zero_capacity() -> Self {
        Self::zero_capacity_with_hasher(Default::default())
    }
}

impl<'a, K: Copy, V: Copy, S> FixedMap<'a, K, V, S> {
    /// Creates a map able to hold `capacity` keys in the given storage, using
    /// `hash_builder` to hash the keys.
    ///
    /// ```
    /// use core::hash::BuildHasherDefault;
    ///
    /// use fixed_mode::{FixedMap, Storage};
    ///
    /// let s = BuildHasherDefault::<ahash::AHasher>::default();
    /// let mut storage = Storage::new();
    /// let mut map = FixedMap::with_storage_and_hasher(4, &mut storage, s);
    /// assert!(map.set(1, 2));
    /// ```
    #[inline]
    pub fn with_storage_and_hasher(
        capacity: u8,
        storage: &'a mut Storage<K, V>,
        hash_builder: S,
    ) -> Self {
        if capacity == 0 {
            return Self::zero_capacity_with_hasher(hash_builder);
        }
        let size = good_size(capacity);
        let Storage { buckets, entries } = storage;
        Self {
            raw: RawTable::new(capacity, &mut buckets[..size], &mut entries[..size]),
            hash_builder,
        }
    }

    #[inline]
    pub fn zero_capacity_with_hasher(hash_builder: S) -> Self {
        Self {
            raw: RawTable::empty(),
            hash_builder,
        }
    }

    /// Number of keys currently in the map.
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub fn count(&self) -> u8 {
        // Never more than `capacity`, itself a u8.
        self.raw.len() as u8
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// The capacity the map was built with.
    #[inline]
    pub fn capacity(&self) -> u8 {
        self.raw.capacity()
    }

    /// Length of the bucket and slot arrays, a prime no smaller than `capacity`.
    #[inline]
    pub fn table_size(&self) -> usize {
        self.raw.table_size()
    }

    #[inline]
    pub fn is_zero_capacity(&self) -> bool {
        self.raw.is_zero_capacity()
    }

    /// Removes every entry, keeping the borrowed storage.
    #[inline]
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    #[inline]
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }
}

impl<K, V, S> FixedMap<'_, K, V, S>
where
    K: Copy + Eq + Hash,
    V: Copy,
    S: BuildHasher,
{
    /// Returns the value stored for `k`.
    ///
    /// ```
    /// use fixed_mode::{Error, FixedMap, Storage};
    ///
    /// let mut storage = Storage::new();
    /// let mut map = FixedMap::<_, _>::with_storage(2, &mut storage);
    /// map.set('a', 1);
    /// assert_eq!(map.get(&'a'), Ok(1));
    /// assert_eq!(map.get(&'b'), Err(Error::KeyNotFound));
    /// ```
    #[inline]
    pub fn get<Q>(&self, k: &Q) -> Result<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        match self.find(k) {
            Some(index) => Ok(self.raw.value(index)),
            None => Err(Error::KeyNotFound),
        }
    }

    #[inline]
    pub fn try_get<Q>(&self, k: &Q) -> Option<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        // Avoid `Option::map` because it bloats LLVM IR.
        match self.find(k) {
            Some(index) => Some(self.raw.value(index)),
            None => None,
        }
    }

    /// Returns a mutable reference to the value stored for `k`.
    #[inline]
    pub fn get_mut<Q>(&mut self, k: &Q) -> Option<&mut V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        match self.find(k) {
            Some(index) => Some(self.raw.value_mut(index)),
            None => None,
        }
    }

    #[inline]
    pub fn contains_key<Q>(&self, k: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.find(k).is_some()
    }

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// Returns `false` only when `key` is new and the map is full.
    #[inline]
    pub fn set(&mut self, key: K, value: V) -> bool {
        self.insert(key, value, InsertionBehavior::Overwrite).is_ok()
    }

    /// Inserts `key` only if it is absent. Returns `false` if the key was already
    /// present or the map is full.
    #[inline]
    pub fn try_add(&mut self, key: K, value: V) -> bool {
        matches!(self.insert(key, value, InsertionBehavior::Reject), Ok(true))
    }

    /// Inserts `key`, failing with [`Error::DuplicateKey`] if it is present and
    /// with [`Error::TableFull`] if there is no slot left.
    #[inline]
    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        self.insert(key, value, InsertionBehavior::FailOnExisting)
            .map(|_| ())
    }

    /// Returns a mutable reference to the value of `key`, inserting `default`
    /// first if the key is absent. Returns `None` if the key is absent and the map
    /// is full.
    ///
    /// ```
    /// use fixed_mode::{FixedMap, Storage};
    ///
    /// let mut storage = Storage::new();
    /// let mut counts = FixedMap::<_, _>::with_storage(4, &mut storage);
    /// for c in "abca".chars() {
    ///     *counts.get_or_insert(c, 0).unwrap() += 1;
    /// }
    /// assert_eq!(counts.try_get(&'a'), Some(2));
    /// ```
    #[inline]
    pub fn get_or_insert(&mut self, key: K, default: V) -> Option<&mut V> {
        let hash = self.hash_of(&key);
        let index = match self.raw.find(hash, |x| *x == key) {
            Some(index) => index,
            None => self.raw.insert_new(hash, key, default)?,
        };
        Some(self.raw.value_mut(index))
    }

    /// Removes `k`, returning whether it was present.
    #[inline]
    pub fn remove<Q>(&mut self, k: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.take(k).is_some()
    }

    /// Removes `k`, returning the value it held.
    #[inline]
    pub fn take<Q>(&mut self, k: &Q) -> Option<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let hash = self.hash_of(k);
        self.raw.remove(hash, |x| k.equivalent(x))
    }

    #[inline]
    fn find<Q>(&self, k: &Q) -> Option<usize>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        if self.is_empty() {
            return None;
        }
        self.raw.find(self.hash_of(k), |x| k.equivalent(x))
    }

    #[inline]
    fn insert(&mut self, key: K, value: V, behavior: InsertionBehavior) -> Result<bool> {
        let hash = self.hash_of(&key);
        match self.raw.find(hash, |x| *x == key) {
            Some(index) => match behavior {
                InsertionBehavior::Overwrite => {
                    *self.raw.value_mut(index) = value;
                    Ok(true)
                }
                InsertionBehavior::Reject => Ok(false),
                InsertionBehavior::FailOnExisting => Err(Error::DuplicateKey),
            },
            None => match self.raw.insert_new(hash, key, value) {
                Some(_) => Ok(true),
                None => Err(Error::TableFull),
            },
        }
    }

    #[inline]
    fn hash_of<Q: ?Sized + Hash>(&self, k: &Q) -> u32 {
        fold_hash(make_hash::<Q, S>(&self.hash_builder, k))
    }
}
