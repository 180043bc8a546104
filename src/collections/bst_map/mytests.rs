use crate::collections::bst_map::*;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::cmp::Ordering;

const REP: usize = if cfg!(miri) { 2 } else { 20 };
const N: usize = if cfg!(miri) { 100 } else { 2000 };

fn build(keys: &[i32]) -> BstMap<i32, i32> {
    let mut map = BstMap::new();
    for &k in keys {
        map.insert(k, k);
    }
    map.check();
    map
}

fn key_list(map: &BstMap<i32, i32>) -> Vec<i32> {
    map.keys().copied().collect()
}

// Minimal height for n nodes: ceil(log2(n+1)).
fn min_height(n: usize) -> usize {
    (usize::BITS - n.leading_zeros()) as usize
}

#[test]
fn duplicate_insert_keeps_existing_value() {
    let mut map = BstMap::new();
    assert!(map.insert(8, 8).1);
    assert!(map.insert(10, 10).1);
    let (pos, inserted) = map.insert(8, 9);
    assert!(!inserted);
    assert_eq!(pos.key_value(), Some((&8, &8)));
    assert_eq!(map.find(&8).value(), Some(&8));
    assert_eq!(map.len(), 2);
}

#[test]
fn inorder_traversal_is_sorted() {
    let map = build(&[8, 6, 10, 3, 7, 2, 15, 4, 12]);
    assert_eq!(key_list(&map), vec![2, 3, 4, 6, 7, 8, 10, 12, 15]);
}

#[test]
fn erase_two_children_node() {
    let mut map = build(&[8, 6, 10, 3, 7, 2, 15, 4, 12]);
    assert!(map.erase(&8));
    map.check();
    assert_eq!(key_list(&map), vec![2, 3, 4, 6, 7, 10, 12, 15]);
    assert!(map.find(&8).is_end());
}

#[test]
fn erase_root_of_single_node_tree() {
    let mut map = BstMap::new();
    map.insert(1, 1);
    assert!(map.erase(&1));
    map.check();
    assert!(map.is_empty());
    assert!(map.front() == map.end());
    assert!(map.iter().next().is_none());
}

#[test]
fn entry_or_default_inserts() {
    let mut map: BstMap<i32, i32> = BstMap::new();
    map.insert(1, 1);
    let v = map.entry(5).or_default();
    assert_eq!(*v, 0);
    *v = 50;
    assert_eq!(map.find(&5).value(), Some(&50));
    // Occupied side: no second insert.
    assert_eq!(*map.entry(5).or_default(), 50);
    assert_eq!(map.len(), 2);
    map.check();
}

#[test]
fn balance_of_balanced_tree_is_stable() {
    let mut map = build(&[4, 2, 6, 1, 3, 5, 7]);
    assert_eq!(map.height(), 3);
    let before = key_list(&map);
    map.balance();
    map.check();
    assert_eq!(key_list(&map), before);
    assert_eq!(map.height(), 3);
}

#[test]
fn removal_topologies() {
    // Leaf removal.
    let mut map = build(&[8, 6, 10, 3, 7, 2, 15, 4, 12]);
    assert!(map.erase(&4));
    map.check();
    assert_eq!(key_list(&map), vec![2, 3, 6, 7, 8, 10, 12, 15]);

    // One child: 15 owns only 12.
    assert!(map.erase(&15));
    map.check();
    assert_eq!(key_list(&map), vec![2, 3, 6, 7, 8, 10, 12]);

    // Two children where the successor is the right child itself.
    assert!(map.erase(&6));
    map.check();
    assert_eq!(key_list(&map), vec![2, 3, 7, 8, 10, 12]);

    // Two children where the successor sits deep in the right subtree and
    // has a right child of its own: successor of 80 is 90, which must leave
    // 95 behind in its old slot.
    let mut map = build(&[80, 40, 120, 100, 140, 90, 95]);
    assert!(map.erase(&80));
    map.check();
    assert_eq!(key_list(&map), vec![40, 90, 95, 100, 120, 140]);

    // Root with one child.
    let mut map = build(&[5, 3]);
    assert!(map.erase(&5));
    map.check();
    assert_eq!(key_list(&map), vec![3]);

    // Absent key and empty tree report failure, not errors.
    assert!(!map.erase(&99));
    map.clear();
    assert!(!map.erase(&3));
    map.check();
}

#[test]
fn size_conservation() {
    let mut map = build(&[5, 3, 8]);
    let len = map.len();
    assert!(!map.insert(5, 500).1);
    assert_eq!(map.len(), len);
    assert!(map.insert(6, 6).1);
    assert_eq!(map.len(), len + 1);
    assert!(!map.erase(&99));
    assert_eq!(map.len(), len + 1);
    assert!(map.erase(&6));
    assert_eq!(map.len(), len);
}

#[test]
fn find_erase_coupling() {
    let mut map = build(&[8, 6, 10, 3, 7]);
    for k in [8, 6, 10, 3, 7] {
        assert_eq!(map.find(&k).key(), Some(&k));
    }
    for k in [6, 8, 3, 10, 7] {
        assert!(map.erase(&k));
        map.check();
        assert!(map.find(&k).is_end());
    }
    assert!(map.is_empty());
}

#[test]
fn balance_height_and_roundtrip() {
    let mut rng = StdRng::seed_from_u64(7);
    for n in [0usize, 1, 2, 3, 7, 10, 100, 1000] {
        let mut keys: Vec<i32> = (0..n as i32).collect();
        keys.shuffle(&mut rng);
        let mut map = build(&keys);
        let before: Vec<(i32, i32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        map.balance();
        map.check();
        let after: Vec<(i32, i32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(before, after);
        assert_eq!(map.height(), min_height(n));
    }
}

#[test]
fn deep_copy_independence() {
    let source = build(&[8, 6, 10, 3, 7, 2, 15, 4, 12]);
    let snapshot = key_list(&source);
    let mut copy = source.clone();
    copy.insert(100, 100);
    assert!(copy.erase(&8));
    copy.balance();
    copy.check();
    assert_eq!(key_list(&source), snapshot);
    assert_eq!(source.find(&8).value(), Some(&8));
    assert!(copy.find(&8).is_end());
}

#[test]
fn cursor_walk() {
    let mut map = BstMap::new();
    map.insert(2, 20);
    map.insert(1, 10);
    let (pos, inserted) = map.insert(3, 30);
    assert!(inserted);
    assert_eq!(pos.key_value(), Some((&3, &30)));

    let mut cursor = map.front();
    let mut seen = Vec::new();
    while let Some((k, _v)) = cursor.key_value() {
        seen.push(*k);
        cursor.move_next();
    }
    assert_eq!(seen, vec![1, 2, 3]);
    assert!(cursor.is_end());
    assert!(cursor == map.end());
    // Stepping the end cursor stays at end.
    cursor.move_next();
    assert!(cursor.is_end());
}

#[test]
fn iter_is_exact_size() {
    let map = build(&[8, 6, 10, 3, 7]);
    let mut it = map.iter();
    assert_eq!(it.len(), 5);
    it.next();
    assert_eq!(it.len(), 4);
    assert_eq!(it.size_hint(), (4, Some(4)));
    assert_eq!(it.count(), 4);
}

#[test]
fn first_last_key_value() {
    let map = build(&[8, 6, 10, 3, 7, 2, 15, 4, 12]);
    assert_eq!(map.first_key_value(), Some((&2, &2)));
    assert_eq!(map.last_key_value(), Some((&15, &15)));
    let empty: BstMap<i32, i32> = BstMap::new();
    assert_eq!(empty.first_key_value(), None);
    assert_eq!(empty.last_key_value(), None);
}

#[test]
fn display_ordered_dump() {
    let mut map = BstMap::new();
    map.insert(2, 20);
    map.insert(1, 10);
    map.insert(3, 30);
    assert_eq!(map.to_string(), "1: 10\n2: 20\n3: 30\n");
    let empty: BstMap<i32, i32> = BstMap::new();
    assert_eq!(empty.to_string(), "");
}

#[test]
fn from_array_index_and_eq() {
    let map = BstMap::from([(3, 30), (1, 10), (2, 20)]);
    assert_eq!(map[&2], 20);
    let other: BstMap<i32, i32> = [(1, 10), (2, 20), (3, 30)].into_iter().collect();
    assert!(map == other);
    assert_eq!(other.clone().into_keys().collect::<Vec<i32>>(), vec![1, 2, 3]);
    assert_eq!(other.into_values().collect::<Vec<i32>>(), vec![10, 20, 30]);
    let into: Vec<(i32, i32)> = map.into_iter().collect();
    assert_eq!(into, vec![(1, 10), (2, 20), (3, 30)]);
}

#[derive(Clone, Copy, Debug)]
struct Descending;
impl KeyOrder<i32> for Descending {
    fn order(&self, a: &i32, b: &i32) -> Ordering {
        b.cmp(a)
    }
}

#[test]
fn custom_order_descending() {
    let mut map = BstMap::with_order(Descending);
    for k in [3, 1, 4, 1, 5, 9, 2, 6] {
        map.insert(k, k * 10);
    }
    map.check();
    assert_eq!(map.len(), 7); // second 1 rejected
    let keys: Vec<i32> = map.keys().copied().collect();
    assert_eq!(keys, vec![9, 6, 5, 4, 3, 2, 1]);
    map.balance();
    map.check();
    assert_eq!(map.keys().copied().collect::<Vec<i32>>(), keys);
    assert_eq!(map.first_key_value(), Some((&9, &90)));
}

#[test]
fn exp_clear_test() {
    let n = N;
    let mut map = BstMap::new();
    for i in 0..n {
        map.insert(i as u32, 1u8);
    }
    map.clear();
    assert!(map.len() == 0);
    assert!(map.front() == map.end());
}

#[test]
fn exp_model_test() {
    let mut rng = StdRng::seed_from_u64(42);
    for rep in 0..REP {
        let mut map = BstMap::new();
        let mut model = std::collections::BTreeMap::new();
        for _ in 0..N {
            let k: u16 = rng.gen_range(0..500);
            if rng.gen_bool(0.6) {
                let v: u32 = rng.gen();
                let inserted = map.insert(k, v).1;
                assert_eq!(inserted, !model.contains_key(&k));
                model.entry(k).or_insert(v);
            } else {
                assert_eq!(map.remove(&k), model.remove(&k));
            }
        }
        if rep % 2 == 0 {
            map.balance();
        }
        map.check();
        assert_eq!(map.len(), model.len());
        assert!(map.iter().eq(model.iter()));
        assert!(map.keys().eq(model.keys()));
        assert!(map.values().eq(model.values()));
    }
}

#[test]
#[cfg(feature = "serde")]
fn exp_serde_test() {
    let mut map = BstMap::new();
    for i in 0..1000u32 {
        map.insert(i * 7 % 1000, i);
    }
    let ser = bincode::serialize(&map).unwrap();
    let de: BstMap<u32, u32> = bincode::deserialize(&ser).unwrap();
    de.check();
    assert!(map.iter().eq(de.iter()));
}

mod quick {
    use super::*;
    use quickcheck::{Arbitrary, Gen};

    /// The kinds of things to do to a map in a quickcheck run.
    #[derive(Copy, Clone, Debug)]
    enum Op {
        Insert(u8, u16),
        Remove(u8),
        Balance,
    }

    impl Arbitrary for Op {
        fn arbitrary(g: &mut Gen) -> Self {
            match *g.choose(&[0, 0, 0, 1, 1, 2]).unwrap() {
                0 => Op::Insert(u8::arbitrary(g), u16::arbitrary(g)),
                1 => Op::Remove(u8::arbitrary(g)),
                2 => Op::Balance,
                _ => unreachable!(),
            }
        }
    }

    quickcheck::quickcheck! {
        fn behaves_like_model(ops: Vec<Op>) -> bool {
            let mut map = BstMap::new();
            let mut model = std::collections::BTreeMap::new();
            for op in ops {
                match op {
                    Op::Insert(k, v) => {
                        let inserted = map.insert(k, v).1;
                        if inserted == model.contains_key(&k) {
                            return false;
                        }
                        model.entry(k).or_insert(v);
                    }
                    Op::Remove(k) => {
                        if map.remove(&k) != model.remove(&k) {
                            return false;
                        }
                    }
                    Op::Balance => map.balance(),
                }
                map.check();
            }
            map.len() == model.len() && map.iter().eq(model.iter())
        }
    }
}
