use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

use hashbrown::HashMap;
use log::{debug, trace};

use crate::{
    error::{Error, Result},
    raw::util::make_hash,
    FixedMap, Storage,
};

/// Inputs up to this many elements are counted in a [`FixedMap`]; longer ones in a
/// heap map. Tied to the `u8` capacity of the fixed map.
pub const SMALL_INPUT_LIMIT: usize = u8::MAX as usize;

/// The most frequent element of a sequence and how often its key occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode<T> {
    pub count: usize,
    pub element: T,
}

/// Projects an element to the key it is counted under.
pub trait KeyOf<T, K> {
    fn key_of(&mut self, item: &T) -> K;
}

/// Counts elements by themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<T: Clone> KeyOf<T, T> for Identity {
    #[inline]
    fn key_of(&mut self, item: &T) -> T {
        item.clone()
    }
}

impl<T, K, P> KeyOf<T, K> for P
where
    P: FnMut(&T) -> K,
{
    #[inline]
    fn key_of(&mut self, item: &T) -> K {
        self(item)
    }
}

/// Decides whether an element takes part in the count.
pub trait Filter<T> {
    fn keep(&mut self, item: &T) -> bool;
}

/// Keeps every element.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unfiltered;

impl<T> Filter<T> for Unfiltered {
    #[inline]
    fn keep(&mut self, _: &T) -> bool {
        true
    }
}

impl<T, F> Filter<T> for F
where
    F: FnMut(&T) -> bool,
{
    #[inline]
    fn keep(&mut self, item: &T) -> bool {
        self(item)
    }
}

/// Picks the leader when an element's count catches up with the current one.
pub trait TieBreak<T> {
    fn resolve(&mut self, leader: T, challenger: T) -> T;
}

/// Keeps whichever element reached the count first.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepFirst;

impl<T> TieBreak<T> for KeepFirst {
    #[inline]
    fn resolve(&mut self, leader: T, _: T) -> T {
        leader
    }
}

impl<T, R> TieBreak<T> for R
where
    R: FnMut(T, T) -> T,
{
    #[inline]
    fn resolve(&mut self, leader: T, challenger: T) -> T {
        self(leader, challenger)
    }
}

/// Finds the most frequent element of a sequence.
///
/// Sequences of at most [`SMALL_INPUT_LIMIT`] elements are counted without heap
/// allocation in a [`FixedMap`] keyed by the 64-bit hash of each key, so two keys
/// with the same hash are counted together. Longer sequences are counted exactly
/// in a `hashbrown::HashMap`.
///
/// The length decides the strategy. It is taken from [`ModeFinder::known_len`],
/// else from an exact `size_hint`, else by buffering the input.
///
/// ```
/// use fixed_mode::{Mode, ModeFinder};
///
/// let words = ["apple", "fig", "kiwi", "pear", "plum", "date"];
/// let mode = ModeFinder::new(words)
///     .key_by(|w| w.len())
///     .resolve_ties(|_, latest| latest)
///     .find()
///     .unwrap();
/// assert_eq!(mode, Some(Mode { count: 4, element: "date" }));
/// ```
#[must_use = "a ModeFinder does nothing until `find` is called"]
pub struct ModeFinder<I, P = Identity, F = Unfiltered, R = KeepFirst, S = RandomState> {
    source: I,
    key_of: P,
    filter: F,
    ties: R,
    known_len: Option<usize>,
    hash_builder: S,
}

impl<I: IntoIterator> ModeFinder<I> {
    #[inline]
    pub fn new(source: I) -> Self {
        Self {
            source,
            key_of: Identity,
            filter: Unfiltered,
            ties: KeepFirst,
            known_len: None,
            hash_builder: RandomState::new(),
        }
    }
}

impl<I: IntoIterator, P, F, R, S> ModeFinder<I, P, F, R, S> {
    /// Counts elements under the key returned by `key_of`.
    #[inline]
    pub fn key_by<K, P2>(self, key_of: P2) -> ModeFinder<I, P2, F, R, S>
    where
        P2: FnMut(&I::Item) -> K,
    {
        ModeFinder {
            source: self.source,
            key_of,
            filter: self.filter,
            ties: self.ties,
            known_len: self.known_len,
            hash_builder: self.hash_builder,
        }
    }

    /// Skips elements for which `filter` returns `false`.
    #[inline]
    pub fn filter<F2>(self, filter: F2) -> ModeFinder<I, P, F2, R, S>
    where
        F2: FnMut(&I::Item) -> bool,
    {
        ModeFinder {
            source: self.source,
            key_of: self.key_of,
            filter,
            ties: self.ties,
            known_len: self.known_len,
            hash_builder: self.hash_builder,
        }
    }

    /// Calls `ties(leader, challenger)` whenever an element draws level with the
    /// leader and adopts its result. Without it the earlier leader stays.
    #[inline]
    pub fn resolve_ties<R2>(self, ties: R2) -> ModeFinder<I, P, F, R2, S>
    where
        R2: FnMut(I::Item, I::Item) -> I::Item,
    {
        ModeFinder {
            source: self.source,
            key_of: self.key_of,
            filter: self.filter,
            ties,
            known_len: self.known_len,
            hash_builder: self.hash_builder,
        }
    }

    /// Number of elements in the source, counted before filtering.
    ///
    /// Saves buffering an input whose iterator cannot report its length. A hint of
    /// at most [`SMALL_INPUT_LIMIT`] that turns out to hold more distinct keys than
    /// the hint makes [`find`](Self::find) fail with [`Error::InvalidArgument`].
    #[inline]
    pub fn known_len(mut self, len: usize) -> Self {
        self.known_len = Some(len);
        self
    }

    /// Hashes keys with `hash_builder` in both counting strategies.
    #[inline]
    pub fn with_hasher<S2>(self, hash_builder: S2) -> ModeFinder<I, P, F, R, S2> {
        ModeFinder {
            source: self.source,
            key_of: self.key_of,
            filter: self.filter,
            ties: self.ties,
            known_len: self.known_len,
            hash_builder,
        }
    }

    /// Runs the count. Returns `Ok(None)` when no element passes the filter.
    pub fn find<K>(self) -> Result<Option<Mode<I::Item>>>
    where
        P: KeyOf<I::Item, K>,
        K: Hash + Eq,
        F: Filter<I::Item>,
        R: TieBreak<I::Item>,
        S: BuildHasher + Clone,
    {
        let Self {
            source,
            key_of,
            filter,
            ties,
            known_len,
            hash_builder,
        } = self;
        let pass = Pass {
            key_of,
            filter,
            ties,
            hash_builder,
        };

        let items = source.into_iter();
        let exact_len = match items.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(lower),
            _ => None,
        };
        match known_len.or(exact_len) {
            Some(len) => pass.run(items, len),
            None => {
                let buffered: Vec<_> = items.collect();
                let len = buffered.len();
                pass.run(buffered.into_iter(), len)
            }
        }
    }
}

/// Finds the most frequent element of `source`, keeping the first one to reach
/// the top count on ties.
///
/// ```
/// use fixed_mode::{mode_of, Mode};
///
/// assert_eq!(mode_of([1, 2, 2, 3, 2]).unwrap(), Some(Mode { count: 3, element: 2 }));
/// assert_eq!(mode_of(Vec::<u8>::new()).unwrap(), None);
/// ```
#[inline]
pub fn mode_of<I>(source: I) -> Result<Option<Mode<I::Item>>>
where
    I: IntoIterator,
    I::Item: Hash + Eq + Clone,
{
    ModeFinder::new(source).find()
}

/// Mode finding on anything iterable.
pub trait ModeExt: IntoIterator + Sized {
    /// Starts a [`ModeFinder`] over `self`.
    #[inline]
    fn mode_finder(self) -> ModeFinder<Self> {
        ModeFinder::new(self)
    }

    /// Shorthand for [`mode_of`].
    #[inline]
    fn mode(self) -> Result<Option<Mode<Self::Item>>>
    where
        Self::Item: Hash + Eq + Clone,
    {
        mode_of(self)
    }
}

impl<I: IntoIterator> ModeExt for I {}

/// The per-call policies of a count, split from the source.
struct Pass<P, F, R, S> {
    key_of: P,
    filter: F,
    ties: R,
    hash_builder: S,
}

impl<P, F, R, S> Pass<P, F, R, S> {
    fn run<T, K, J>(self, items: J, len: usize) -> Result<Option<Mode<T>>>
    where
        J: Iterator<Item = T>,
        P: KeyOf<T, K>,
        K: Hash + Eq,
        F: Filter<T>,
        R: TieBreak<T>,
        S: BuildHasher + Clone,
    {
        match u8::try_from(len) {
            Ok(capacity) => self.by_hash(items, capacity),
            Err(_) => self.by_key(items, len),
        }
    }

    fn by_hash<T, K, J>(self, items: J, capacity: u8) -> Result<Option<Mode<T>>>
    where
        J: Iterator<Item = T>,
        P: KeyOf<T, K>,
        K: Hash,
        F: Filter<T>,
        R: TieBreak<T>,
        S: BuildHasher + Clone,
    {
        let Self {
            mut key_of,
            mut filter,
            mut ties,
            hash_builder,
        } = self;

        let mut items = items.filter(|item| filter.keep(item));
        // Nothing is set up for a sequence that filters down to nothing.
        let Some(first) = items.next() else {
            return Ok(None);
        };
        trace!("counting up to {capacity} elements by hash in a fixed map");

        let mut storage = Storage::<u64, usize>::new();
        let mut counts =
            FixedMap::with_storage_and_hasher(capacity, &mut storage, hash_builder.clone());
        let mut leader = Leader::new();
        for item in core::iter::once(first).chain(items) {
            let hash = make_hash::<K, S>(&hash_builder, &key_of.key_of(&item));
            let Some(count) = counts.get_or_insert(hash, 0) else {
                debug!("more than {capacity} distinct keys in an input declared to hold {capacity}");
                return Err(Error::InvalidArgument(
                    "sequence holds more elements than its known length",
                ));
            };
            *count += 1;
            let count = *count;
            leader.observe(count, item, &mut ties);
        }
        Ok(leader.into_mode())
    }

    fn by_key<T, K, J>(self, items: J, len: usize) -> Result<Option<Mode<T>>>
    where
        J: Iterator<Item = T>,
        P: KeyOf<T, K>,
        K: Hash + Eq,
        F: Filter<T>,
        R: TieBreak<T>,
        S: BuildHasher,
    {
        let Self {
            mut key_of,
            mut filter,
            mut ties,
            hash_builder,
        } = self;
        trace!("counting {len} elements by key in a heap map");

        let mut counts = HashMap::<K, usize, S>::with_hasher(hash_builder);
        let mut leader = Leader::new();
        for item in items {
            if !filter.keep(&item) {
                continue;
            }
            let count = counts.entry(key_of.key_of(&item)).or_insert(0);
            *count += 1;
            let count = *count;
            leader.observe(count, item, &mut ties);
        }
        Ok(leader.into_mode())
    }
}

/// Running leader of a single pass.
struct Leader<T> {
    element: Option<T>,
    count: usize,
}

impl<T> Leader<T> {
    #[inline]
    fn new() -> Self {
        Self {
            element: None,
            count: 0,
        }
    }

    #[inline]
    fn observe<R: TieBreak<T>>(&mut self, count: usize, item: T, ties: &mut R) {
        if count > self.count {
            self.count = count;
            self.element = Some(item);
        } else if count == self.count {
            if let Some(leader) = self.element.take() {
                self.element = Some(ties.resolve(leader, item));
            }
        }
    }

    #[inline]
    fn into_mode(self) -> Option<Mode<T>> {
        match self.element {
            Some(element) => Some(Mode {
                count: self.count,
                element,
            }),
            None => None,
        }
    }
}
