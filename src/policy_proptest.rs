#![cfg(test)]

// Property tests for LruCore kept inside the crate so they can drive the
// recency clock and compaction directly.

use crate::config::{Capacity, Config, Mode};
use crate::entry_store::{Entry, Handle};
use crate::holder::ReleaseHook;
use crate::policy::{LruCore, COMPACTION_FACTOR};
use proptest::prelude::*;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};

#[derive(Clone, Debug)]
enum Op {
    Put(u8, u32),
    Touch(u8),
    Peek(u8),
    Remove(u8),
    PopOldest,
    Snapshot,
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<Op>)> {
    let key = 0u8..12;
    let op = prop_oneof![
        4 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Put(k, v)),
        2 => key.clone().prop_map(Op::Touch),
        1 => key.clone().prop_map(Op::Peek),
        1 => key.prop_map(Op::Remove),
        1 => Just(Op::PopOldest),
        1 => Just(Op::Snapshot),
    ];
    (1usize..=4, proptest::collection::vec(op, 1..80))
}

fn no_hook(_: Handle, _: u64) -> ReleaseHook {
    Box::new(|| {})
}

/// Recency model: keys with their values, oldest first.
#[derive(Default)]
struct Model {
    order: Vec<(u8, u32)>,
}

impl Model {
    fn position(&self, k: u8) -> Option<usize> {
        self.order.iter().position(|&(key, _)| key == k)
    }

    fn put(&mut self, k: u8, v: u32, capacity: usize) -> Vec<u8> {
        if let Some(i) = self.position(k) {
            self.order.remove(i);
            self.order.push((k, v));
            return Vec::new();
        }
        self.order.push((k, v));
        if self.order.len() > capacity * COMPACTION_FACTOR {
            let cut = self.order.len() - capacity;
            return self.order.drain(..cut).map(|(key, _)| key).collect();
        }
        Vec::new()
    }

    fn touch(&mut self, k: u8) -> Option<u32> {
        let i = self.position(k)?;
        let entry = self.order.remove(i);
        self.order.push(entry);
        Some(entry.1)
    }
}

fn run<S: BuildHasher>(capacity: usize, ops: Vec<Op>, hasher: S) -> Result<(), TestCaseError> {
    let config = Config::new(Capacity::new(capacity).unwrap()).mode(Mode::Strong);
    let mut sut: LruCore<u8, u32, S> = LruCore::new(config, hasher);
    let mut model = Model::default();

    for op in ops {
        match op {
            Op::Put(k, v) => {
                let hash = sut.hash_of(&k);
                let seized = sut.seize(v).unwrap();
                let out = sut.put(hash, |k, e| e.key == *k, k, seized.holder, no_hook);
                let expected = model.put(k, v, capacity);
                if expected.is_empty() {
                    // Either nothing left or the displaced holder of `k`.
                    prop_assert!(out.len() <= 1);
                } else {
                    let evicted: Vec<u8> = out.iter().map(|e| e.key).collect();
                    prop_assert_eq!(evicted, expected, "evicted oldest first");
                }
            }
            Op::Touch(k) => {
                let hash = sut.hash_of(&k);
                prop_assert_eq!(sut.touch(hash, |e| e.key == k), model.touch(k));
            }
            Op::Peek(k) => {
                let hash = sut.hash_of(&k);
                prop_assert_eq!(sut.peek(hash, |e| e.key == k), model.position(k).is_some());
            }
            Op::Remove(k) => {
                let hash = sut.hash_of(&k);
                let removed = sut.remove(hash, |e| e.key == k).map(|e| e.key);
                let expected = model.position(k).map(|i| model.order.remove(i).0);
                prop_assert_eq!(removed, expected);
            }
            Op::PopOldest => {
                let popped = sut.pop_oldest().map(|e: Entry<u8, u32>| e.key);
                let expected = if model.order.is_empty() {
                    None
                } else {
                    Some(model.order.remove(0).0)
                };
                prop_assert_eq!(popped, expected);
            }
            Op::Snapshot => {
                let keys: Vec<u8> = sut
                    .snapshot()
                    .into_iter()
                    .filter_map(|h| sut.entry(h).map(|e| e.key))
                    .collect();
                let expected: Vec<u8> = model.order.iter().map(|&(k, _)| k).collect();
                prop_assert_eq!(keys, expected);
            }
        }

        prop_assert_eq!(sut.len(), model.order.len());
        prop_assert!(sut.len() <= capacity * COMPACTION_FACTOR);
    }
    Ok(())
}

// Property: LruCore matches a recency-list model.
// - Puts overwrite in place and refresh; touches refresh; peeks do not.
// - The put that pushes size past 2 * capacity evicts exactly the oldest
//   entries down to `capacity`, and reports them oldest first.
// - Snapshot order is recency order.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_recency_model((capacity, ops) in arb_scenario()) {
        run(capacity, ops, RandomState::new())?;
    }
}

#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: same model under worst-case collisions.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_recency_model_with_collisions((capacity, ops) in arb_scenario()) {
        run(capacity, ops, ConstBuildHasher)?;
    }
}
