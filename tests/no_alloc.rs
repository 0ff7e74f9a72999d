use std::{
    alloc::{GlobalAlloc, Layout, System},
    cell::Cell,
    collections::hash_map::RandomState,
};

use fixed_mode::{mode_of, FixedMap, Mode, ModeFinder, Storage};

#[global_allocator]
static ALLOCATOR: AllocationTracker = AllocationTracker;

thread_local! {
    // `None` while the current thread is not being tracked.
    static ALLOCATIONS: Cell<Option<usize>> = const { Cell::new(None) };
}

struct AllocationTracker;

unsafe impl GlobalAlloc for AllocationTracker {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = ALLOCATIONS.try_with(|count| {
            if let Some(n) = count.get() {
                count.set(Some(n + 1));
            }
        });
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
    }
}

/// Runs `f` and returns its result with the number of heap allocations it made on
/// this thread.
fn allocations_during<R>(f: impl FnOnce() -> R) -> (R, usize) {
    // Seed the per-thread hash keys outside the measured region.
    let _ = RandomState::new();
    ALLOCATIONS.with(|count| count.set(Some(0)));
    let result = f();
    let count = ALLOCATIONS.with(|count| count.take()).unwrap_or_default();
    (result, count)
}

#[test]
fn fixed_map_never_allocates() {
    let ((), allocations) = allocations_during(|| {
        let mut storage = Storage::new();
        let mut map = FixedMap::<u32, u32>::with_storage(u8::MAX, &mut storage);
        for k in 0..255 {
            assert!(map.try_add(k, k));
        }
        assert!(!map.try_add(255, 255));
        for k in (0..255).step_by(2) {
            assert!(map.remove(&k));
        }
        for k in 1000..1128 {
            assert!(map.set(k, 0));
        }
        assert_eq!(map.count(), 255);
        map.clear();
    });
    assert_eq!(allocations, 0, "FixedMap must not allocate on the heap");
}

#[test]
fn small_inputs_are_counted_without_allocating() {
    let items: Vec<u32> = (0..200).map(|i| i % 17).collect();
    let (mode, allocations) = allocations_during(|| mode_of(items.iter().copied()));
    assert_eq!(allocations, 0, "counting 200 elements must stay off the heap");
    assert_eq!(mode, Ok(Some(Mode { count: 12, element: 0 })));
}

#[test]
fn filtered_out_inputs_allocate_nothing() {
    let items = [3u64; 100];
    let (mode, allocations) =
        allocations_during(|| ModeFinder::new(items).filter(|_| false).find());
    assert_eq!(allocations, 0);
    assert_eq!(mode, Ok(None));
}

#[test]
fn large_inputs_use_the_heap() {
    let items: Vec<u32> = (0..300).map(|i| i % 17).collect();
    let (mode, allocations) = allocations_during(|| mode_of(items.iter().copied()));
    assert!(allocations > 0, "inputs above 255 elements are counted in a heap map");
    assert_eq!(mode.unwrap().unwrap().count, 18);
}
