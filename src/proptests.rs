use std::collections::HashMap;

use proptest::prelude::*;

use crate::{mode_of, FixedMap, Mode, ModeFinder, Storage};

#[derive(Clone, Debug)]
enum Op {
    Set(u8, u16),
    TryAdd(u8, u16),
    Remove(u8),
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..64, any::<u16>()).prop_map(|(k, v)| Op::Set(k, v)),
        3 => (0u8..64, any::<u16>()).prop_map(|(k, v)| Op::TryAdd(k, v)),
        4 => (0u8..64).prop_map(Op::Remove),
        1 => Just(Op::Clear),
    ]
}

/// Count and element a single pass should report, computed from running counts.
/// The leader is the element at the first position whose key reaches the top
/// count, or at the last such position when the latest element wins ties.
fn naive_mode(items: &[u8], latest_wins_ties: bool) -> Option<(usize, u8)> {
    let mut counts = HashMap::new();
    let running: Vec<usize> = items
        .iter()
        .map(|&x| {
            let count = counts.entry(x).or_insert(0);
            *count += 1;
            *count
        })
        .collect();
    let top = running.iter().copied().max()?;
    let position = if latest_wins_ties {
        running.iter().rposition(|&c| c == top)
    } else {
        running.iter().position(|&c| c == top)
    }?;
    Some((top, items[position]))
}

fn pair(mode: Option<Mode<u8>>) -> Option<(usize, u8)> {
    mode.map(|m| (m.count, m.element))
}

proptest! {
    #[test]
    fn fixed_map_matches_model(
        capacity in 1u8..=48,
        ops in prop::collection::vec(op(), 0..300),
    ) {
        let mut storage = Storage::new();
        let mut map = FixedMap::<u8, u16>::with_storage(capacity, &mut storage);
        let mut model = HashMap::new();

        for op in ops {
            let full = model.len() == usize::from(capacity);
            match op {
                Op::Set(k, v) => {
                    let fits = !full || model.contains_key(&k);
                    prop_assert_eq!(map.set(k, v), fits);
                    if fits {
                        model.insert(k, v);
                    }
                }
                Op::TryAdd(k, v) => {
                    let added = !full && !model.contains_key(&k);
                    prop_assert_eq!(map.try_add(k, v), added);
                    if added {
                        model.insert(k, v);
                    }
                }
                Op::Remove(k) => {
                    prop_assert_eq!(map.take(&k), model.remove(&k));
                }
                Op::Clear => {
                    map.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(usize::from(map.count()), model.len());
        }

        for k in 0..64u8 {
            prop_assert_eq!(map.try_get(&k), model.get(&k).copied());
            prop_assert_eq!(map.contains_key(&k), model.contains_key(&k));
        }
    }

    #[test]
    fn inserted_pairs_read_back(
        pairs in prop::collection::hash_map(any::<u32>(), any::<u64>(), 0..=255),
    ) {
        let capacity = u8::try_from(pairs.len()).unwrap();
        let mut storage = Storage::new();
        let mut map = FixedMap::<u32, u64>::with_storage(capacity, &mut storage);

        for (&k, &v) in &pairs {
            prop_assert!(map.try_add(k, v));
        }
        prop_assert_eq!(map.count(), capacity);
        for (&k, &v) in &pairs {
            prop_assert_eq!(map.try_get(&k), Some(v));
            prop_assert!(map.contains_key(&k));
        }
    }

    #[test]
    fn removed_keys_can_be_added_again(
        keys in prop::collection::hash_set(any::<i64>(), 1..64),
    ) {
        let keys: Vec<i64> = keys.into_iter().collect();
        let capacity = u8::try_from(keys.len()).unwrap();
        let mut storage = Storage::new();
        let mut map = FixedMap::<i64, i64>::with_storage(capacity, &mut storage);
        for &k in &keys {
            prop_assert!(map.try_add(k, k));
        }

        let (gone, kept) = keys.split_at(keys.len() / 2);
        for k in gone {
            prop_assert!(map.remove(k));
            prop_assert!(!map.contains_key(k));
        }
        for k in kept {
            prop_assert_eq!(map.try_get(k), Some(*k));
        }
        // Every freed slot is handed out again, and no more.
        for &k in gone {
            prop_assert!(map.try_add(k, -k));
        }
        prop_assert_eq!(usize::from(map.count()), keys.len());
        let fresh = (0..).find(|k| !keys.contains(k)).unwrap();
        prop_assert!(!map.try_add(fresh, 0));
    }

    #[test]
    fn mode_matches_naive_count(items in prop::collection::vec(0u8..24, 0..600)) {
        prop_assert_eq!(pair(mode_of(items.clone()).unwrap()), naive_mode(&items, false));

        let latest = ModeFinder::new(items.clone())
            .resolve_ties(|_, y| y)
            .find()
            .unwrap();
        prop_assert_eq!(pair(latest), naive_mode(&items, true));
    }

    #[test]
    fn filtered_mode_matches_naive_count(items in prop::collection::vec(0u8..24, 0..600)) {
        let kept: Vec<u8> = items.iter().copied().filter(|x| x % 3 != 0).collect();
        let found = ModeFinder::new(items).filter(|x| x % 3 != 0).find().unwrap();
        prop_assert_eq!(pair(found), naive_mode(&kept, false));
    }
}
