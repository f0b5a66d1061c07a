// LruMap test suite.
//
// Each test notes the behavior verified. The invariants exercised:
// - Bound: size never exceeds 2 * capacity; the insert that crosses it
//   compacts to the `capacity` most recently used entries.
// - Liveness (weak mode): an entry is present iff some owner outside the
//   map keeps its value alive.
// - Overwrite: re-inserting a key replaces the value without growing.
// - Not-found is silent: removing or reading an absent key never fails.
// - Fail-fast iteration: a structural change invalidates open iterators.
use rc_lru::{Capacity, Config, Error, LruMap, Mode, Tracked};
use std::cell::{Cell, RefCell};
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

fn values(n: i32) -> Vec<Tracked<i32>> {
    (0..n).map(Tracked::new).collect()
}

// Test: capacity 3, nine keys inserted in order.
// Verifies: the oldest key is gone and the newest is present.
#[test]
fn nine_keys_into_capacity_three() {
    let m = LruMap::new(3).unwrap();
    let held = values(9);
    for (i, v) in held.iter().enumerate() {
        m.insert(i.to_string(), v.clone()).unwrap();
        assert!(m.len() <= 6);
    }
    assert!(!m.contains_key("0"));
    assert!(m.contains_key("8"));
}

// Test: 3 * capacity distinct keys strictly in order.
// Verifies: size bound holds throughout; first key absent, last present.
#[test]
fn stress_three_times_capacity() {
    let capacity = 1000;
    let m = LruMap::new(capacity).unwrap();
    let held = values(capacity * 3);
    for (i, v) in held.iter().enumerate() {
        m.insert(i.to_string(), v.clone()).unwrap();
    }
    assert!(m.len() <= 2 * capacity as usize);
    assert!(!m.contains_key("0"));
    assert!(m.contains_key(&(capacity * 3 - 1).to_string()));
}

// Test: overwrite keeps size and returns the newest value.
#[test]
fn overwrite_does_not_grow() {
    let m = LruMap::new(2).unwrap();
    let (v1, v2) = (Tracked::new(1), Tracked::new(2));
    m.insert("a", v1.clone()).unwrap();
    m.insert("a", v2.clone()).unwrap();
    assert_eq!(m.len(), 1);
    assert_eq!(m.get("a"), Some(v2));
}

// Test: weak liveness.
// Verifies: dropping the sole owner removes the entry from lookups,
// iteration and len.
#[test]
fn dropping_sole_owner_removes_entry() {
    let m = LruMap::new(3).unwrap();
    let a = Tracked::new(1);
    let b = Tracked::new(2);
    m.insert("a", a.clone()).unwrap();
    m.insert("b", b.clone()).unwrap();
    assert_eq!(m.len(), 2);

    drop(a);
    assert_eq!(m.len(), 1);
    assert!(!m.contains_key("a"));
    assert_eq!(m.get("a"), None);
    let keys: Vec<&str> = m.keys().collect::<Result<_, _>>().unwrap();
    assert_eq!(keys, ["b"]);
}

// Test: weak liveness through an indirect owner.
// Verifies: a value kept alive by another structure stays present; the
// entry goes once that structure is dropped.
#[test]
fn indirect_owner_keeps_entry_alive() {
    struct Container {
        _value: Tracked<i32>,
    }

    let m = LruMap::new(3).unwrap();
    let v = Tracked::new(1);
    let container = Container { _value: v.clone() };
    m.insert("a", v).unwrap();
    assert_eq!(m.len(), 1);

    drop(container);
    assert_eq!(m.len(), 0);
}

// Test: the map never extends a value's lifetime in weak mode.
#[test]
fn weak_map_does_not_own_values() {
    let m = LruMap::new(3).unwrap();
    let v = Tracked::new(String::from("x"));
    m.insert(1, v.clone()).unwrap();
    assert_eq!(Tracked::strong_count(&v), 1);
}

// Test: values that cannot be observed weakly.
// Verifies: NotObservable, and the map is unchanged.
#[test]
fn weak_map_rejects_plain_values() {
    let m: LruMap<&str, i32> = LruMap::new(3).unwrap();
    let err = m.insert("a", 1).unwrap_err();
    assert!(matches!(err, Error::NotObservable { type_name } if type_name == "i32"));
    assert_eq!(m.len(), 0);

    let ok: LruMap<&str, Tracked<i32>> = LruMap::new(3).unwrap();
    let v = Tracked::new(1);
    ok.insert("a", v.clone()).unwrap();
    let strings: LruMap<&str, String> = LruMap::new(3).unwrap();
    assert!(strings.insert("a", "s".to_string()).is_err());
    assert!(strings.is_empty());
    assert_eq!(ok.len(), 1);
}

// Test: strong mode accepts any payload and keeps it regardless of
// outside owners.
#[test]
fn strong_map_owns_values() {
    let m = LruMap::strong(3).unwrap();
    m.insert("n", 1).unwrap();
    assert_eq!(m.get("n"), Some(1));

    let t = LruMap::strong(3).unwrap();
    let v = Tracked::new(5);
    t.insert("t", v.clone()).unwrap();
    drop(v);
    assert_eq!(t.len(), 1);
    assert_eq!(t.get("t").map(|v| *v), Some(5));
}

// Test: strong mode stores std values that carry no observer.
#[test]
fn strong_map_stores_std_values() {
    let arrays = LruMap::strong(2).unwrap();
    arrays.insert("a", [1u8; 4]).unwrap();
    assert_eq!(arrays.get("a"), Some([1u8; 4]));

    let timeouts = LruMap::strong(2).unwrap();
    timeouts.insert("t", Duration::from_secs(3)).unwrap();
    assert_eq!(timeouts.get("t"), Some(Duration::from_secs(3)));

    let paths = LruMap::strong(2).unwrap();
    paths.insert(1, PathBuf::from("/var/cache")).unwrap();
    paths.insert(2, PathBuf::from("/tmp")).unwrap();
    assert_eq!(paths.len(), 2);

    let weak: LruMap<&str, Duration> = LruMap::new(2).unwrap();
    assert!(matches!(
        weak.insert("t", Duration::ZERO),
        Err(Error::NotObservable { .. })
    ));
}

// Test: capacity validation.
#[test]
fn invalid_capacities_are_rejected() {
    assert_eq!(
        LruMap::<u8, u8>::strong(0).unwrap_err(),
        Error::InvalidCapacity { requested: 0 }
    );
    assert_eq!(
        LruMap::<u8, u8>::strong(-1).unwrap_err(),
        Error::InvalidCapacity { requested: -1 }
    );
    assert_eq!(
        LruMap::<u8, u8>::strong(-7i64).unwrap_err(),
        Error::InvalidCapacity { requested: -7 }
    );
    assert!(LruMap::<u8, u8>::strong(5u32).is_ok());
}

// Test: explicit configuration.
#[test]
fn config_selects_mode() {
    let cap = Capacity::new(4).unwrap();
    let m: LruMap<u8, u8> = LruMap::with_config(Config::new(cap).mode(Mode::Strong));
    assert_eq!(m.capacity(), 4);
    assert_eq!(m.mode(), Mode::Strong);
    assert!(!m.is_weak());

    let w: LruMap<u8, Tracked<u8>> = LruMap::with_config(cap.into());
    assert!(w.is_weak());
}

// Test: removal semantics.
// Verifies: delete of a present key removes it; delete of an absent key
// is a silent no-op.
#[test]
fn remove_present_and_absent() {
    let m = LruMap::new(3).unwrap();
    let (v1, v2) = (Tracked::new(1), Tracked::new(2));
    m.insert("a", v1.clone()).unwrap();
    m.insert("b", v2.clone()).unwrap();

    assert_eq!(m.remove("a"), Some(v1));
    assert!(!m.contains_key("a"));
    assert_eq!(m.len(), 1);
    assert_eq!(m.remove("nonexistent"), None);
    assert_eq!(m.remove("a"), None);
}

// Test: get with default.
#[test]
fn get_or_falls_back() {
    let m = LruMap::strong(2).unwrap();
    m.insert("a", 1).unwrap();
    assert_eq!(m.get_or("a", 0), 1);
    assert_eq!(m.get_or("b", 0), 0);
}

// Test: update runs every pair through insert, so reads between updates
// refresh recency and compaction can run mid-sequence.
// Verifies: after the update that crosses 2 * capacity, the first key is
// gone and the most recent entries remain.
#[test]
fn update_in_steps() {
    let capacity = 3;
    let m = LruMap::new(capacity).unwrap();
    let (v1, v2, v3, v4) = (
        Tracked::new(1),
        Tracked::new(2),
        Tracked::new(3),
        Tracked::new(4),
    );

    m.update([("a", v1.clone())]).unwrap();
    assert!(m.len() <= capacity);
    assert_eq!(m.get("a"), Some(v1.clone()));

    m.update([("b", v2.clone()), ("c", v3.clone())]).unwrap();
    assert!(m.len() <= capacity);
    assert_eq!(m.get("b"), Some(v2.clone()));
    assert_eq!(m.get("c"), Some(v3.clone()));

    m.update([("d", v4.clone())]).unwrap();
    assert!(m.len() <= capacity * 2);
    assert_eq!(m.get("d"), Some(v4.clone()));

    m.update([("e", v1.clone())]).unwrap();
    m.update([("f", v2.clone())]).unwrap();
    assert!(m.len() <= capacity * 2);
    assert_eq!(m.get("e"), Some(v1.clone()));
    assert_eq!(m.get("f"), Some(v2.clone()));

    m.update([("g", v3.clone())]).unwrap();
    assert!(m.len() <= capacity * 3);
    assert!(!m.contains_key("a"));
    let keys: Vec<&str> = m.keys().collect::<Result<_, _>>().unwrap();
    assert_eq!(keys, ["e", "f", "g"]);
}

// Test: one value under several keys.
// Verifies: dropping its owner removes every entry that observed it.
#[test]
fn shared_value_under_many_keys() {
    let m = LruMap::new(4).unwrap();
    let v = Tracked::new(0);
    for k in ["a", "b", "c"] {
        m.insert(k, v.clone()).unwrap();
    }
    assert_eq!(m.len(), 3);
    drop(v);
    assert!(m.is_empty());
}

// Test: pop_oldest takes from the least recently used end.
#[test]
fn pop_oldest_respects_touches() {
    let m = LruMap::strong(3).unwrap();
    m.update([("x", 1), ("y", 2), ("z", 3)]).unwrap();
    assert!(m.contains_key("x"));
    assert_eq!(m.pop_oldest(), Some(("y", 2)));
    assert_eq!(m.pop_oldest(), Some(("z", 3)));
    assert_eq!(m.pop_oldest(), Some(("x", 1)));
    assert_eq!(m.pop_oldest(), None);
}

// Test: views iterate oldest first and agree with each other.
#[test]
fn views_follow_recency() {
    let m = LruMap::strong(4).unwrap();
    m.update([(1, 'a'), (2, 'b'), (3, 'c')]).unwrap();
    m.get(&1);

    let keys: Vec<i32> = m.keys().map(Result::unwrap).collect();
    let vals: Vec<char> = m.values().map(Result::unwrap).collect();
    let items: Vec<(i32, char)> = (&m).into_iter().map(Result::unwrap).collect();
    assert_eq!(keys, [2, 3, 1]);
    assert_eq!(vals, ['b', 'c', 'a']);
    assert_eq!(items, [(2, 'b'), (3, 'c'), (1, 'a')]);
    assert_eq!(m.to_vec(), items);
}

// Test: fail-fast iteration.
// Verifies: an insert during iteration makes the next step fail, and the
// iterator stays exhausted afterwards.
#[test]
fn insert_during_iteration_fails() {
    let m = LruMap::strong(3).unwrap();
    m.update([("a", 1), ("b", 2)]).unwrap();
    let mut items = m.items();
    assert_eq!(items.next(), Some(Ok(("a", 1))));
    m.insert("c", 3).unwrap();
    assert_eq!(items.next(), Some(Err(Error::ConcurrentModification)));
    assert_eq!(items.next(), None);

    // A fresh iterator sees the new state.
    assert_eq!(m.keys().count(), 3);
}

// Test: a release while iterating is a structural change too.
#[test]
fn release_during_iteration_fails() {
    let m = LruMap::new(3).unwrap();
    let (a, b) = (Tracked::new(1), Tracked::new(2));
    m.insert("a", a.clone()).unwrap();
    m.insert("b", b.clone()).unwrap();
    let mut keys = m.keys();
    assert_eq!(keys.next(), Some(Ok("a")));
    drop(b);
    assert_eq!(keys.next(), Some(Err(Error::ConcurrentModification)));
}

// Test: clear drops every entry and frees strongly held values.
#[test]
fn clear_releases_everything() {
    let m = LruMap::strong(3).unwrap();
    let v = Tracked::new(1);
    m.insert("a", v.clone()).unwrap();
    assert_eq!(Tracked::strong_count(&v), 2);
    m.clear();
    assert!(m.is_empty());
    assert_eq!(Tracked::strong_count(&v), 1);
}

// Test: string forms.
#[test]
fn debug_and_display() {
    let m = LruMap::strong(3).unwrap();
    assert_eq!(format!("{:?}", m), "LruMap(capacity=3, weak=false, size=0)");
    assert_eq!(m.to_string(), "{}");

    m.insert("0", 0).unwrap();
    m.insert("1", 1).unwrap();
    assert_eq!(format!("{:?}", m), "LruMap(capacity=3, weak=false, size=2)");
    assert_eq!(m.to_string(), r#"{"0": 0, "1": 1}"#);

    let w: LruMap<u8, Tracked<u8>> = LruMap::new(5).unwrap();
    assert_eq!(format!("{:?}", w), "LruMap(capacity=5, weak=true, size=0)");
}

// Test: values whose last owner lives in another value of the same map.
// Verifies: dropping the outer owner cascades through both entries.
#[test]
fn cascading_release() {
    let m: LruMap<&str, Tracked<Option<Tracked<u8>>>> = LruMap::new(4).unwrap();
    let child = Tracked::new(None);
    let parent = Tracked::new(Some(Tracked::new(7u8)));
    m.insert("child", child.clone()).unwrap();
    m.insert("parent", parent.clone()).unwrap();

    let grandchild = match &*parent {
        Some(g) => g.clone(),
        None => unreachable!(),
    };
    let hold: LruMap<&str, Tracked<u8>> = LruMap::new(4).unwrap();
    hold.insert("g", grandchild.clone()).unwrap();
    drop(grandchild);
    assert_eq!(hold.len(), 1);

    drop(parent);
    assert_eq!(m.len(), 1);
    assert!(hold.is_empty());
    drop(child);
    assert!(m.is_empty());
}

// Test: a release triggered from user code while the map is mid-operation.
// Assumes: key equality runs while the map's storage is borrowed.
// Verifies: the release is deferred, not lost, and lands before the next
// operation observes the map.
#[test]
fn release_from_key_equality_is_deferred() {
    #[derive(Clone)]
    struct Trap {
        id: u32,
        armed: Rc<Cell<bool>>,
        stash: Rc<RefCell<Vec<Tracked<u32>>>>,
    }
    impl PartialEq for Trap {
        fn eq(&self, other: &Self) -> bool {
            if self.armed.replace(false) {
                self.stash.borrow_mut().clear();
            }
            self.id == other.id
        }
    }
    impl Eq for Trap {}
    impl Hash for Trap {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.id.hash(state)
        }
    }

    let armed = Rc::new(Cell::new(false));
    let stash = Rc::new(RefCell::new(Vec::new()));
    let key = |id| Trap {
        id,
        armed: Rc::clone(&armed),
        stash: Rc::clone(&stash),
    };

    let m = LruMap::new(4).unwrap();
    let kept = Tracked::new(1);
    m.insert(key(1), kept.clone()).unwrap();
    let doomed = Tracked::new(2);
    stash.borrow_mut().push(doomed.clone());
    m.insert(key(2), doomed).unwrap();
    assert_eq!(m.len(), 2);

    armed.set(true);
    m.insert(key(1), kept.clone()).unwrap();
    assert!(!armed.get());
    assert!(stash.borrow().is_empty());
    assert_eq!(m.len(), 1);
    assert!(m.contains_key(&key(1)));
    assert!(!m.contains_key(&key(2)));
}
