use super::*;
use syncboard_shared::Point;

fn segment(n: u32) -> Segment {
    let x = n as f64;
    Segment {
        previous_point: Point::new(x, 0.0),
        current_point: Point::new(x + 1.0, 1.0),
        color: "#000".into(),
        stroke_width: 2.0,
    }
}

fn sequences(store: &HistoryStore) -> Vec<u64> {
    store.snapshot().iter().map(|operation| operation.sequence).collect()
}

#[test]
fn new_store_is_empty_and_clean() {
    let store = HistoryStore::new(10);
    assert!(store.is_empty());
    assert!(!store.is_dirty());
    assert_eq!(store.next_sequence(), 1);
}

#[test]
fn batch_gets_contiguous_ordinals_in_order() {
    let mut store = HistoryStore::new(10);
    store.append([segment(0)]);
    let range = store.append([segment(1), segment(2), segment(3)]);
    assert_eq!(range, 2..5);

    let snapshot = store.snapshot();
    assert_eq!(sequences(&store), vec![1, 2, 3, 4]);
    assert_eq!(snapshot[1].segment, segment(1));
    assert_eq!(snapshot[3].segment, segment(3));
}

#[test]
fn empty_append_changes_nothing() {
    let mut store = HistoryStore::new(10);
    let range = store.append(Vec::<Segment>::new());
    assert!(range.is_empty());
    assert!(!store.is_dirty());
}

#[test]
fn clear_truncates_but_ordinals_keep_rising() {
    let mut store = HistoryStore::new(10);
    store.append([segment(0), segment(1)]);
    store.clear();
    assert!(store.snapshot().is_empty());

    store.append([segment(2)]);
    assert_eq!(sequences(&store), vec![3]);
    assert_eq!(store.snapshot()[0].segment, segment(2));
}

#[test]
fn oldest_operations_evicted_past_cap() {
    let mut store = HistoryStore::new(3);
    for n in 0..5 {
        store.append([segment(n)]);
        assert!(store.len() <= 3);
    }
    assert_eq!(sequences(&store), vec![3, 4, 5]);
}

#[test]
fn oversized_batch_keeps_newest_tail() {
    let mut store = HistoryStore::new(2);
    let range = store.append((0..5).map(segment));
    assert_eq!(range, 1..6);
    assert_eq!(sequences(&store), vec![4, 5]);
}

#[test]
fn reference_cap_bounds_snapshot() {
    let mut store = HistoryStore::default();
    store.append((0..(DEFAULT_HISTORY_CAP as u32 + 25)).map(segment));
    assert_eq!(store.len(), DEFAULT_HISTORY_CAP);
    assert_eq!(store.snapshot().first().map(|operation| operation.sequence), Some(26));
}

#[test]
fn take_dirty_clears_flag_until_next_change() {
    let mut store = HistoryStore::new(10);
    store.append([segment(0)]);

    let data = store.take_dirty().expect("store should be dirty after append");
    assert_eq!(data.next_sequence, 2);
    assert_eq!(data.operations.len(), 1);
    assert!(store.take_dirty().is_none());

    store.mark_dirty();
    assert!(store.take_dirty().is_some());
}

#[test]
fn restore_continues_ordinals_and_applies_cap() {
    let mut original = HistoryStore::new(10);
    original.append((0..4).map(segment));
    let data = original.take_dirty().unwrap();

    let mut restored = HistoryStore::restore(data, 2);
    assert!(!restored.is_dirty());
    assert_eq!(sequences(&restored), vec![3, 4]);

    restored.append([segment(9)]);
    assert_eq!(sequences(&restored), vec![4, 5]);
}

#[test]
fn restore_trusts_highest_stored_ordinal() {
    let data = HistoryFileData {
        next_sequence: 0,
        operations: vec![
            DrawOperation { sequence: 8, segment: segment(1) },
            DrawOperation { sequence: 5, segment: segment(0) },
        ],
    };
    let restored = HistoryStore::restore(data, 10);
    assert_eq!(sequences(&restored), vec![5, 8]);
    assert_eq!(restored.next_sequence(), 9);
}
