//! Behavioral tests for the store facade.
//!
//! Every adapter must pass the same suite: point operations, range
//! iteration in both directions, batches and concurrent use all behave
//! identically whichever engine sits underneath.

use std::thread;

use unikv::{EngineCursor, Error, KeyRange, KeyValue, KvEngine, RangeIterator, Result, Store};

/// A test harness trait for running the suite against a store.
pub trait StoreHarness {
    /// The engine the store runs over.
    type Engine: KvEngine;

    /// Create a new, empty store for testing.
    fn create_store() -> Result<Store<Self::Engine>>;
}

/// Run the standard test suite against a store.
pub fn run_store_suite<H: StoreHarness>() {
    test_point_reads::<H>();
    test_overwrite_and_delete::<H>();
    test_empty_keys_rejected::<H>();
    test_full_scans::<H>();
    test_bounded_scans::<H>();
    test_empty_ranges::<H>();
    test_scans_stay_in_range::<H>();
    test_batch_last_write_wins::<H>();
    test_batch_applies_nothing_until_commit::<H>();
    test_released_iterator::<H>();
    test_exhausted_iterator_stays_invalid::<H>();
    test_iterator_reads_a_snapshot::<H>();
    test_concurrent_writers::<H>();
    test_concurrent_readers::<H>();
}

fn open<H: StoreHarness>() -> Store<H::Engine> {
    H::create_store().expect("failed to create store")
}

/// Drain an iterator into owned entries.
pub fn collect<C: EngineCursor>(iter: RangeIterator<C>) -> Vec<KeyValue> {
    iter.collect::<Result<Vec<_>>>().expect("iteration failed")
}

fn keys_of(entries: &[KeyValue]) -> Vec<Vec<u8>> {
    entries.iter().map(|(key, _)| key.clone()).collect()
}

fn entries(pairs: &[(&str, &str)]) -> Vec<KeyValue> {
    pairs.iter().map(|(k, v)| (k.as_bytes().to_vec(), v.as_bytes().to_vec())).collect()
}

fn abc<H: StoreHarness>() -> Store<H::Engine> {
    let store = open::<H>();
    store.set(b"a", b"1").expect("failed to set");
    store.set(b"b", b"2").expect("failed to set");
    store.set(b"c", b"3").expect("failed to set");
    store
}

fn test_point_reads<H: StoreHarness>() {
    let store = open::<H>();
    store.set(b"a", b"1").expect("failed to set");
    store.set(b"b", b"").expect("failed to set");

    assert_eq!(store.get(b"a").expect("failed to get"), Some(b"1".to_vec()));
    assert_eq!(store.get(b"b").expect("failed to get"), Some(Vec::new()));
    assert_eq!(store.get(b"c").expect("failed to get"), None);

    assert!(store.has(b"a").expect("failed to check key"));
    assert!(store.has(b"b").expect("failed to check key"));
    assert!(!store.has(b"c").expect("failed to check key"));
}

fn test_overwrite_and_delete<H: StoreHarness>() {
    let store = open::<H>();
    store.set(b"k", b"old").expect("failed to set");
    store.set(b"k", b"new").expect("failed to set");
    store.set(b"k", b"new").expect("failed to set");
    assert_eq!(store.get(b"k").expect("failed to get"), Some(b"new".to_vec()));

    store.set_durable(b"d", b"v").expect("failed to set durably");
    store.delete_durable(b"d").expect("failed to delete durably");
    assert!(!store.has(b"d").expect("failed to check key"));

    store.delete(b"k").expect("failed to delete");
    store.delete(b"k").expect("delete of an absent key succeeds");
    store.delete(b"never-written").expect("delete of an absent key succeeds");
    assert_eq!(store.get(b"k").expect("failed to get"), None);
}

fn test_empty_keys_rejected<H: StoreHarness>() {
    let store = open::<H>();

    assert!(matches!(store.get(b""), Err(Error::KeyEmpty)));
    assert!(matches!(store.has(b""), Err(Error::KeyEmpty)));
    assert!(matches!(store.set(b"", b"v"), Err(Error::KeyEmpty)));
    assert!(matches!(store.set_durable(b"", b"v"), Err(Error::KeyEmpty)));
    assert!(matches!(store.delete(b""), Err(Error::KeyEmpty)));
    assert!(matches!(store.delete_durable(b""), Err(Error::KeyEmpty)));

    let empty_end = KeyRange::bounds(Some(b"a".as_slice()), Some(b"".as_slice()));
    assert!(matches!(store.iterator(&empty_end), Err(Error::KeyEmpty)));
    assert!(matches!(store.reverse_iterator(&empty_end), Err(Error::KeyEmpty)));

    let mut batch = store.new_batch();
    assert!(matches!(batch.set(b"", b"v"), Err(Error::KeyEmpty)));
    assert!(matches!(batch.delete(b""), Err(Error::KeyEmpty)));
    batch.commit().expect("failed to commit");

    // Nothing was written by any rejected call
    assert!(collect(store.iterator(&KeyRange::all()).expect("failed to open iterator")).is_empty());
}

fn test_full_scans<H: StoreHarness>() {
    let store = abc::<H>();

    let forward = collect(store.iterator(&KeyRange::all()).expect("failed to open iterator"));
    assert_eq!(forward, entries(&[("a", "1"), ("b", "2"), ("c", "3")]));

    let reverse = collect(store.reverse_iterator(&KeyRange::all()).expect("failed to open iterator"));
    assert_eq!(reverse, entries(&[("c", "3"), ("b", "2"), ("a", "1")]));
}

fn test_bounded_scans<H: StoreHarness>() {
    let store = abc::<H>();

    let from_b = collect(store.iterator(&KeyRange::starting_at(b"b")).expect("failed to open iterator"));
    assert_eq!(from_b, entries(&[("b", "2"), ("c", "3")]));

    let before_b = collect(store.iterator(&KeyRange::ending_before(b"b")).expect("failed to open iterator"));
    assert_eq!(before_b, entries(&[("a", "1")]));

    // The end bound is exclusive in both directions
    let reverse_before_c =
        collect(store.reverse_iterator(&KeyRange::ending_before(b"c")).expect("failed to open iterator"));
    assert_eq!(reverse_before_c, entries(&[("b", "2"), ("a", "1")]));

    // Bounds between stored keys
    let between = collect(store.iterator(&KeyRange::new(b"a0", b"bz")).expect("failed to open iterator"));
    assert_eq!(between, entries(&[("b", "2")]));
    let reverse_between =
        collect(store.reverse_iterator(&KeyRange::new(b"a0", b"bz")).expect("failed to open iterator"));
    assert_eq!(reverse_between, entries(&[("b", "2")]));

    // Bounds past either end of the data
    let past_end = collect(store.reverse_iterator(&KeyRange::new(b"b", b"zzz")).expect("failed to open iterator"));
    assert_eq!(past_end, entries(&[("c", "3"), ("b", "2")]));
    let before_start = collect(store.iterator(&KeyRange::new(b"0", b"b")).expect("failed to open iterator"));
    assert_eq!(before_start, entries(&[("a", "1")]));
}

fn test_empty_ranges<H: StoreHarness>() {
    let store = abc::<H>();

    for range in [KeyRange::new(b"b", b"b"), KeyRange::new(b"c", b"a"), KeyRange::starting_at(b"d")] {
        let iter = store.iterator(&range).expect("failed to open iterator");
        assert!(!iter.is_valid());
        assert!(iter.error().is_none());
        assert!(collect(iter).is_empty());

        let reverse = store.reverse_iterator(&range).expect("failed to open iterator");
        assert!(!reverse.is_valid());
        assert!(collect(reverse).is_empty());
    }

    let empty = open::<H>();
    assert!(!empty.iterator(&KeyRange::all()).expect("failed to open iterator").is_valid());
    assert!(!empty.reverse_iterator(&KeyRange::all()).expect("failed to open iterator").is_valid());
}

fn test_scans_stay_in_range<H: StoreHarness>() {
    let store = open::<H>();
    for i in 0u32..200 {
        store.set(format!("key:{i:03}").as_bytes(), &i.to_be_bytes()).expect("failed to set");
    }

    let range = KeyRange::new(b"key:050", b"key:150");
    let forward = keys_of(&collect(store.iterator(&range).expect("failed to open iterator")));
    let reverse = keys_of(&collect(store.reverse_iterator(&range).expect("failed to open iterator")));

    assert_eq!(forward.len(), 100);
    assert!(forward.iter().all(|key| range.contains(key)));
    assert!(forward.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(reverse.windows(2).all(|pair| pair[0] > pair[1]));

    let mut reversed = reverse;
    reversed.reverse();
    assert_eq!(forward, reversed);
}

fn test_batch_last_write_wins<H: StoreHarness>() {
    let store = open::<H>();
    let mut batch = store.new_batch();
    batch.set(b"x", b"1").expect("failed to set");
    batch.delete(b"x").expect("failed to delete");
    batch.set(b"x", b"2").expect("failed to set");
    batch.set(b"y", b"").expect("failed to set");
    batch.commit().expect("failed to commit");

    assert_eq!(store.get(b"x").expect("failed to get"), Some(b"2".to_vec()));
    assert_eq!(store.get(b"y").expect("failed to get"), Some(Vec::new()));

    let mut removal = store.new_batch();
    removal.set(b"x", b"3").expect("failed to set");
    removal.delete(b"x").expect("failed to delete");
    removal.commit_durable().expect("failed to commit");
    assert!(!store.has(b"x").expect("failed to check key"));

    assert!(matches!(removal.commit(), Err(Error::BatchClosed)));
}

fn test_batch_applies_nothing_until_commit<H: StoreHarness>() {
    let store = abc::<H>();
    let mut batch = store.new_batch();
    batch.delete(b"a").expect("failed to delete");
    batch.set(b"d", b"4").expect("failed to set");

    assert_eq!(store.get(b"a").expect("failed to get"), Some(b"1".to_vec()));
    assert!(!store.has(b"d").expect("failed to check key"));

    batch.discard();
    assert!(matches!(batch.set(b"e", b"5"), Err(Error::BatchClosed)));
    assert_eq!(store.get(b"a").expect("failed to get"), Some(b"1".to_vec()));
    assert!(!store.has(b"d").expect("failed to check key"));
}

fn test_released_iterator<H: StoreHarness>() {
    let store = abc::<H>();
    let mut iter = store.iterator(&KeyRange::all()).expect("failed to open iterator");
    assert!(iter.is_valid());
    assert_eq!(iter.key(), b"a".to_vec());

    iter.release();
    iter.release();
    assert!(!iter.is_valid());
    assert!(iter.error().is_none());
    assert!(iter.next().is_none());
}

fn test_exhausted_iterator_stays_invalid<H: StoreHarness>() {
    let store = abc::<H>();

    let mut forward = store.iterator(&KeyRange::all()).expect("failed to open iterator");
    let mut reverse = store.reverse_iterator(&KeyRange::all()).expect("failed to open iterator");
    assert_eq!(keys_of(&forward.by_ref().collect::<Result<Vec<_>>>().expect("iteration failed")).len(), 3);
    assert_eq!(keys_of(&reverse.by_ref().collect::<Result<Vec<_>>>().expect("iteration failed")).len(), 3);
    assert!(!forward.is_valid());
    assert!(!reverse.is_valid());

    // New keys on either side of the data, inside the iterators' range
    store.set(b"0", b"before").expect("failed to set");
    store.set(b"bb", b"between").expect("failed to set");
    store.set(b"z", b"after").expect("failed to set");
    let mut batch = store.new_batch();
    batch.set(b"zz", b"batched").expect("failed to buffer set");
    batch.commit().expect("failed to commit");

    for iter in [&mut forward, &mut reverse] {
        assert!(!iter.is_valid());
        assert!(iter.error().is_none());
        assert!(iter.next().is_none());
        assert!(!iter.is_valid());
        assert!(iter.next().is_none());
    }
}

fn test_iterator_reads_a_snapshot<H: StoreHarness>() {
    let store = abc::<H>();
    store.set(b"d", b"4").expect("failed to set");

    let mut forward = store.iterator(&KeyRange::all()).expect("failed to open iterator");
    let mut reverse = store.reverse_iterator(&KeyRange::all()).expect("failed to open iterator");
    assert_eq!(forward.key(), b"a".to_vec());
    assert_eq!(reverse.key(), b"d".to_vec());

    store.set(b"bb", b"new").expect("failed to set");
    let mut batch = store.new_batch();
    batch.set(b"c", b"changed").expect("failed to buffer set");
    batch.delete(b"d").expect("failed to buffer delete");
    batch.commit().expect("failed to commit");

    let before = entries(&[("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")]);
    assert_eq!(forward.by_ref().collect::<Result<Vec<_>>>().expect("iteration failed"), before);
    let mut reversed = before;
    reversed.reverse();
    assert_eq!(reverse.by_ref().collect::<Result<Vec<_>>>().expect("iteration failed"), reversed);

    let latest = collect(store.iterator(&KeyRange::all()).expect("failed to open iterator"));
    assert_eq!(latest, entries(&[("a", "1"), ("b", "2"), ("bb", "new"), ("c", "changed")]));
}

fn test_concurrent_writers<H: StoreHarness>() {
    let store = open::<H>();

    thread::scope(|scope| {
        for writer in 0u8..4 {
            let store = &store;
            scope.spawn(move || {
                for i in 0u8..25 {
                    store.set(&[b'w', writer, i], &[i]).expect("failed to set");
                }
                let mut batch = store.new_batch();
                batch.set(&[b'b', writer], &[writer]).expect("failed to set");
                batch.commit().expect("failed to commit");
            });
        }
    });

    let all = collect(store.iterator(&KeyRange::all()).expect("failed to open iterator"));
    assert_eq!(all.len(), 4 * 25 + 4);
    for writer in 0u8..4 {
        assert_eq!(store.get(&[b'b', writer]).expect("failed to get"), Some(vec![writer]));
    }
}

fn test_concurrent_readers<H: StoreHarness>() {
    let store = abc::<H>();

    thread::scope(|scope| {
        for _ in 0..4 {
            let store = &store;
            scope.spawn(move || {
                let forward = keys_of(&collect(store.iterator(&KeyRange::all()).expect("failed to open iterator")));
                let reverse =
                    keys_of(&collect(store.reverse_iterator(&KeyRange::all()).expect("failed to open iterator")));
                assert_eq!(forward.len(), 3);
                assert_eq!(reverse.len(), 3);
            });
        }
    });
}
