// Branch prediction hint, an identity function on stable.
pub(crate) use core::convert::identity as unlikely;
use core::hash::{BuildHasher, Hash, Hasher};

#[inline]
pub(crate) fn make_hash<Q, S>(hash_builder: &S, val: &Q) -> u64
where
    Q: Hash + ?Sized,
    S: BuildHasher,
{
    let mut state = hash_builder.build_hasher();
    val.hash(&mut state);
    state.finish()
}

/// Folds a 64-bit hash into the 32-bit code stored in every slot.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn fold_hash(hash: u64) -> u32 {
    (hash ^ (hash >> 32)) as u32 // truncation
}

/// Table lengths that spread common hash functions well, one per growth step.
/// The last entry is the first one able to hold `u8::MAX` slots.
pub(crate) const GOOD_SIZES: [u16; 17] = [
    3, 7, 11, 17, 23, 29, 37, 47, 59, 71, 89, 107, 131, 163, 197, 239, 293,
];

/// Largest table any fixed map can use.
pub(crate) const MAX_TABLE_SIZE: usize = GOOD_SIZES[GOOD_SIZES.len() - 1] as usize;

/// Smallest good table size that is at least `capacity`.
#[inline]
pub(crate) fn good_size(capacity: u8) -> usize {
    let wanted = u16::from(capacity);
    match GOOD_SIZES.iter().find(|&&size| size >= wanted) {
        Some(&size) => usize::from(size),
        None => MAX_TABLE_SIZE,
    }
}
