use core::mem::MaybeUninit;

use crate::raw::util::unlikely;

pub mod util;

/// `next` value of the last slot in a collision chain.
const END_OF_CHAIN: i32 = -1;
/// Free-list links are stored in `next` as `START_OF_FREE_LIST - index`, so -2 ends
/// the free list, -3 points at slot 0, -4 at slot 1 and so on.
const START_OF_FREE_LIST: i32 = -3;

/// One fixed position in the entry array.
///
/// `key` and `value` are initialized exactly when the slot is linked into a
/// bucket chain. Free and never-used slots hold zeroed or uninit bytes.
pub(crate) struct Slot<K, V> {
    hash: u32,
    next: i32,
    key: MaybeUninit<K>,
    value: MaybeUninit<V>,
}

impl<K, V> Slot<K, V> {
    pub(crate) const VACANT: Self = Self {
        hash: 0,
        next: END_OF_CHAIN,
        key: MaybeUninit::uninit(),
        value: MaybeUninit::uninit(),
    };
}

/// Chained hash table over borrowed bucket and slot arrays.
///
/// The table never grows. Slots are handed out from the free list first and then
/// in order until `capacity` slots have been used.
pub(crate) struct RawTable<'a, K, V> {
    /// 1-based slot index of each chain head, 0 when the bucket is empty.
    buckets: &'a mut [i32],
    entries: &'a mut [Slot<K, V>],
    capacity: u8,
    /// Slots ever handed out; only `clear` lowers it.
    count: usize,
    free_list: i32,
    free_count: usize,
}

impl<'a, K: Copy, V: Copy> RawTable<'a, K, V> {
    /// A table that owns no storage and refuses every insert.
    #[inline]
    pub(crate) fn empty() -> Self {
        Self {
            buckets: Default::default(),
            entries: Default::default(),
            capacity: 0,
            count: 0,
            free_list: -1,
            free_count: 0,
        }
    }

    /// Takes over the given arrays, which must have the same non-zero length.
    #[inline]
    pub(crate) fn new(capacity: u8, buckets: &'a mut [i32], entries: &'a mut [Slot<K, V>]) -> Self {
        debug_assert_eq!(buckets.len(), entries.len());
        debug_assert!(usize::from(capacity) <= entries.len());
        buckets.fill(0);
        Self {
            buckets,
            entries,
            capacity,
            count: 0,
            free_list: -1,
            free_count: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.count - self.free_count
    }

    #[inline]
    pub(crate) fn capacity(&self) -> u8 {
        self.capacity
    }

    #[inline]
    pub(crate) fn table_size(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub(crate) fn is_zero_capacity(&self) -> bool {
        self.buckets.is_empty()
    }

    #[inline]
    fn bucket_of(&self, hash: u32) -> usize {
        hash as usize % self.buckets.len()
    }

    /// Searches the chain of `hash` for a key accepted by `eq`.
    #[inline]
    pub(crate) fn find(&self, hash: u32, mut eq: impl FnMut(&K) -> bool) -> Option<usize> {
        if unlikely(self.is_zero_capacity()) {
            return None;
        }
        let mut index = self.buckets[self.bucket_of(hash)] - 1;
        let mut hops = 0;
        while index >= 0 {
            if unlikely(hops == self.entries.len()) {
                chain_overrun();
            }
            hops += 1;

            let slot = &self.entries[index as usize];
            // SAFETY: every slot reachable from a bucket holds an initialized key.
            if slot.hash == hash && eq(unsafe { slot.key.assume_init_ref() }) {
                return Some(index as usize);
            }
            index = slot.next;
        }
        None
    }

    /// Links a new entry at the head of its chain without looking for an
    /// existing one. Returns `None` when no slot is left.
    #[inline]
    pub(crate) fn insert_new(&mut self, hash: u32, key: K, value: V) -> Option<usize> {
        let index = if self.free_count > 0 {
            let index = self.free_list as usize;
            self.free_list = START_OF_FREE_LIST - self.entries[index].next;
            self.free_count -= 1;
            index
        } else if self.count < usize::from(self.capacity) {
            self.count += 1;
            self.count - 1
        } else {
            return None;
        };

        let bucket = self.bucket_of(hash);
        let slot = &mut self.entries[index];
        slot.hash = hash;
        slot.next = self.buckets[bucket] - 1;
        slot.key = MaybeUninit::new(key);
        slot.value = MaybeUninit::new(value);
        self.buckets[bucket] = index as i32 + 1;
        Some(index)
    }

    /// Unlinks the entry accepted by `eq`, puts its slot on the free list and
    /// returns the value it held.
    pub(crate) fn remove(&mut self, hash: u32, mut eq: impl FnMut(&K) -> bool) -> Option<V> {
        if unlikely(self.is_zero_capacity()) {
            return None;
        }
        let bucket = self.bucket_of(hash);
        let mut last = END_OF_CHAIN;
        let mut index = self.buckets[bucket] - 1;
        let mut hops = 0;
        while index >= 0 {
            if unlikely(hops == self.entries.len()) {
                chain_overrun();
            }
            hops += 1;

            let slot = &mut self.entries[index as usize];
            // SAFETY: every slot reachable from a bucket holds an initialized key.
            if slot.hash == hash && eq(unsafe { slot.key.assume_init_ref() }) {
                let next = slot.next;
                // SAFETY: as above, linked slots hold an initialized value.
                let value = unsafe { slot.value.assume_init() };
                slot.hash = 0;
                slot.next = START_OF_FREE_LIST - self.free_list;
                slot.key = MaybeUninit::zeroed();
                slot.value = MaybeUninit::zeroed();

                if last < 0 {
                    self.buckets[bucket] = next + 1;
                } else {
                    self.entries[last as usize].next = next;
                }
                self.free_list = index;
                self.free_count += 1;
                return Some(value);
            }
            last = index;
            index = slot.next;
        }
        None
    }

    /// Copies out the value of a slot returned by `find` or `insert_new`.
    #[inline]
    pub(crate) fn value(&self, index: usize) -> V {
        // SAFETY: callers only pass indices of linked slots.
        unsafe { self.entries[index].value.assume_init() }
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, index: usize) -> &mut V {
        // SAFETY: callers only pass indices of linked slots.
        unsafe { self.entries[index].value.assume_init_mut() }
    }

    pub(crate) fn clear(&mut self) {
        if self.count == 0 {
            return;
        }
        self.buckets.fill(0);
        for slot in &mut self.entries[..self.count] {
            slot.hash = 0;
            slot.next = END_OF_CHAIN;
            slot.key = MaybeUninit::zeroed();
            slot.value = MaybeUninit::zeroed();
        }
        self.count = 0;
        self.free_list = -1;
        self.free_count = 0;
    }
}

#[cold]
#[inline(never)]
fn chain_overrun() -> ! {
    panic!("fixed map chain exceeded table size; concurrent mutation or corruption")
}
