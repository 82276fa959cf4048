//! Restore Atomicity Tests
//!
//! A filter set is either applied in full or not at all. These tests build
//! random filter sets, poison one entry, and compare the dimensional index
//! before and after the failed restore.

use dimfilter::{
    filter::{SerializedFilter, SerializedFilterSet},
    index::{Accessor, DimensionId, DimensionalIndex, GroupId, GroupRow},
    types::{Record, Value},
    Filter, FilterStorage, Reducer,
};
use proptest::prelude::*;

const KEYS: [&str; 3] = ["a", "b", "c"];

struct Fixture {
    index: DimensionalIndex,
    storage: FilterStorage,
    dimensions: Vec<DimensionId>,
    group: GroupId,
}

fn fixture() -> Fixture {
    let records: Vec<Record> = (0..60i64)
        .map(|i| {
            let mut r = Record::new();
            r.insert("a".to_string(), Value::from(i));
            r.insert("b".to_string(), Value::from(i % 7));
            r.insert("c".to_string(), Value::from(vec![i % 2, i % 3]));
            r
        })
        .collect();
    let mut index = DimensionalIndex::new(records);
    let mut storage = FilterStorage::new();
    let dimensions: Vec<DimensionId> = KEYS
        .iter()
        .map(|key| {
            let dim = index.dimension(Accessor::field(*key));
            storage.bind(*key, dim);
            dim
        })
        .collect();
    let chart = index.dimension(Accessor::field("b"));
    let group = index.group(chart, Reducer::Count).unwrap();
    Fixture {
        index,
        storage,
        dimensions,
        group,
    }
}

type Snapshot = (Vec<Option<Filter>>, usize, Vec<GroupRow>);

fn snapshot(f: &Fixture) -> Snapshot {
    let filters = f
        .dimensions
        .iter()
        .map(|&dim| f.index.filter_of(dim).unwrap().cloned())
        .collect();
    (
        filters,
        f.index.selected_count(),
        f.index.group_rows(f.group).unwrap(),
    )
}

fn valid_entry(key: &str, low: i64, width: i64) -> SerializedFilter {
    match key {
        "c" => SerializedFilter::new("TwoDimensionalFilter", vec![low % 2, width % 3]),
        _ => SerializedFilter::new("RangedFilter", vec![low, low + width]),
    }
}

fn poisoned_entry(which: u8) -> SerializedFilter {
    match which % 4 {
        0 => SerializedFilter::new("NoSuchFilter", vec![1, 2]),
        1 => SerializedFilter::new("RangedFilter", vec![1]),
        2 => SerializedFilter::new("TwoDimensionalFilter", Value::from("x")),
        _ => SerializedFilter::new("HierarchyFilter", Value::Null),
    }
}

proptest! {
    #[test]
    fn prop_failed_restore_changes_nothing(
        prior in prop::collection::vec((0usize..3, 0i64..60, 1i64..30), 0..3),
        next in prop::collection::vec((0usize..3, 0i64..60, 1i64..30), 0..3),
        poisoned_key in 0usize..3,
        which in any::<u8>(),
    ) {
        let mut f = fixture();

        let prior_set: SerializedFilterSet = prior
            .iter()
            .map(|&(k, low, width)| (KEYS[k].to_string(), valid_entry(KEYS[k], low, width)))
            .collect();
        f.storage.restore(&mut f.index, &prior_set).unwrap();
        let before = snapshot(&f);
        let stored_before = f.storage.filters().clone();

        let mut next_set: SerializedFilterSet = next
            .iter()
            .map(|&(k, low, width)| (KEYS[k].to_string(), valid_entry(KEYS[k], low, width)))
            .collect();
        next_set.insert(KEYS[poisoned_key].to_string(), poisoned_entry(which));

        prop_assert!(f.storage.restore(&mut f.index, &next_set).is_err());
        prop_assert_eq!(snapshot(&f), before);
        prop_assert_eq!(f.storage.filters(), &stored_before);
    }

    #[test]
    fn prop_successful_restore_matches_fresh_restore(
        prior in prop::collection::vec((0usize..3, 0i64..60, 1i64..30), 0..3),
        next in prop::collection::vec((0usize..3, 0i64..60, 1i64..30), 0..3),
    ) {
        let to_set = |entries: &[(usize, i64, i64)]| -> SerializedFilterSet {
            entries
                .iter()
                .map(|&(k, low, width)| (KEYS[k].to_string(), valid_entry(KEYS[k], low, width)))
                .collect()
        };

        let mut reused = fixture();
        reused.storage.restore(&mut reused.index, &to_set(prior.as_slice())).unwrap();
        reused.storage.restore(&mut reused.index, &to_set(next.as_slice())).unwrap();

        let mut fresh = fixture();
        fresh.storage.restore(&mut fresh.index, &to_set(next.as_slice())).unwrap();

        prop_assert_eq!(snapshot(&reused), snapshot(&fresh));
    }
}

#[test]
fn test_poisoned_entry_under_unbound_key_aborts() {
    let mut f = fixture();
    let mut set = SerializedFilterSet::new();
    set.insert("a".to_string(), valid_entry("a", 0, 10));
    set.insert("unbound".to_string(), poisoned_entry(0));

    assert!(f.storage.restore(&mut f.index, &set).is_err());
    assert_eq!(f.index.selected_count(), 60);
    assert!(f.storage.is_empty());
}

#[test]
fn test_group_observes_every_filter() {
    let mut f = fixture();
    let mut set = SerializedFilterSet::new();
    set.insert("a".to_string(), valid_entry("a", 0, 14));
    set.insert("b".to_string(), valid_entry("b", 0, 3));
    f.storage.restore(&mut f.index, &set).unwrap();

    let rows = f.index.group_rows(f.group).unwrap();
    let keys: Vec<Value> = rows.iter().map(|row| row.key.clone()).collect();
    assert_eq!(keys, vec![Value::from(0), Value::from(1), Value::from(2)]);
    assert!(rows.iter().all(|row| row.value == 2.0));
}
