//! A fixed-capacity hash map that never touches the heap, and a mode finder built
//! on it.
//!
//! [`FixedMap`] stores `Copy` keys and values in a [`Storage`] owned by the
//! caller, normally a local of the function doing the work. Its capacity is a
//! `u8` fixed at construction. When the map is full, inserts fail with a return
//! value and the map never grows.
//!
//! [`ModeFinder`] counts how often each key of a sequence occurs and reports the
//! most frequent element. Short sequences are counted in a [`FixedMap`]. Longer
//! ones go to a `hashbrown::HashMap`.
//!
//! ```
//! use fixed_mode::{FixedMap, Mode, ModeExt, Storage};
//!
//! let mut storage = Storage::new();
//! let mut map = FixedMap::<u32, u32>::with_storage(3, &mut storage);
//! assert!(map.try_add(1, 1));
//! assert!(map.try_add(2, 2));
//! assert!(map.try_add(3, 3));
//! assert!(!map.try_add(4, 4));
//!
//! assert_eq!([3, 1, 3].mode().unwrap(), Some(Mode { count: 2, element: 3 }));
//! ```

mod error;
mod fixed;
mod mode;
mod raw;

#[cfg(test)]
mod proptests;
#[cfg(feature = "serde")]
mod serde;

pub use hashbrown::Equivalent;

pub use crate::{
    error::{Error, Result},
    fixed::{FixedMap, Storage},
    mode::{
        mode_of, Filter, Identity, KeepFirst, KeyOf, Mode, ModeExt, ModeFinder, TieBreak,
        Unfiltered, SMALL_INPUT_LIMIT,
    },
};

/// Largest table length a [`FixedMap`] uses, reached for capacities above 239.
pub const MAX_TABLE_SIZE: usize = raw::util::MAX_TABLE_SIZE;

#[cfg(feature = "fxhash")]
pub type FxFixedMap<'a, K, V> =
    FixedMap<'a, K, V, core::hash::BuildHasherDefault<rustc_hash::FxHasher>>;
#[cfg(feature = "ahash")]
pub type AFixedMap<'a, K, V> =
    FixedMap<'a, K, V, core::hash::BuildHasherDefault<ahash::AHasher>>;
