//! Resource tracking tests: allocation ceilings, unwinding on failed
//! growth, and heap statistics.

use chalk::{
    ChalkTrait, ErrorKind, Heap, LimitedTracker, ResourceLimits, create_integer, create_list,
    create_string, list_add,
};

fn limited_heap(max_allocations: usize) -> Heap<LimitedTracker> {
    Heap::with_tracker(LimitedTracker::new(ResourceLimits {
        max_allocations: Some(max_allocations),
        max_memory: None,
    }))
}

// =============================================================================
// 1. Allocation Ceilings
// =============================================================================

/// Constructors fail with allocation-failure once the budget is exhausted.
#[test]
fn constructors_fail_past_the_budget() {
    let mut heap = limited_heap(2);
    let first = create_string(&mut heap, b"one").unwrap();
    let second = create_string(&mut heap, b"two").unwrap();

    let err = create_string(&mut heap, b"three").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AllocationFailure);

    first.drop_with_heap(&mut heap);
    second.drop_with_heap(&mut heap);
}

/// Aggregate growth counts against the same budget.
#[test]
fn list_growth_counts_against_budget() {
    let mut heap = limited_heap(3);
    let list = create_list(&mut heap, &[]).unwrap();
    let id = list.as_heap_id().unwrap();

    chalk::list_push(&mut heap, id, create_integer(1)).unwrap();
    chalk::list_push(&mut heap, id, create_integer(2)).unwrap();
    let err = chalk::list_push(&mut heap, id, create_integer(3)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AllocationFailure);
    assert_eq!(list.ck_len(&heap), Some(2));

    list.drop_with_heap(&mut heap);
}

// =============================================================================
// 2. Failed Growth Unwinds
// =============================================================================

/// A failed list extension leaves the destination's length unchanged.
#[test]
fn failed_extension_leaves_destination_unchanged() {
    let mut heap = limited_heap(4);
    let destination = create_list(&mut heap, &[create_integer(1)]).unwrap();
    let addition = create_list(
        &mut heap,
        &[create_integer(2), create_integer(3), create_integer(4)],
    )
    .unwrap();

    let err = list_add(
        &mut heap,
        destination.as_heap_id().unwrap(),
        addition.as_heap_id().unwrap(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AllocationFailure);
    assert_eq!(
        destination.ck_len(&heap),
        Some(1),
        "partial extension must be unwound"
    );

    destination.drop_with_heap(&mut heap);
    addition.drop_with_heap(&mut heap);
}

// =============================================================================
// 3. Heap Statistics
// =============================================================================

/// Stats report live objects by type and satisfy the slot invariant.
#[test]
fn stats_report_types_and_slots() {
    let mut heap = Heap::new();
    let text = create_string(&mut heap, b"s").unwrap();
    let list = create_list(&mut heap, &[]).unwrap();
    let dict = chalk::create_dict(&mut heap, None).unwrap();

    let stats = heap.stats();
    assert_eq!(stats.live_objects, 3);
    assert_eq!(stats.objects_by_type.get("string"), Some(&1));
    assert_eq!(stats.objects_by_type.get("list"), Some(&1));
    assert_eq!(stats.objects_by_type.get("dict"), Some(&1));
    assert_eq!(stats.total_slots, stats.live_objects + stats.free_slots);

    text.drop_with_heap(&mut heap);
    let after = heap.stats();
    assert_eq!(after.live_objects, 2);
    assert_eq!(after.free_slots, 1);
    assert_eq!(after.total_slots, 3);

    list.drop_with_heap(&mut heap);
    dict.drop_with_heap(&mut heap);
}

/// The limited tracker's counters are visible through stats.
#[test]
fn tracker_counters_surface_in_stats() {
    let mut heap = limited_heap(10);
    let value = create_string(&mut heap, b"tracked").unwrap();
    let stats = heap.stats();
    assert_eq!(stats.tracker_allocations, Some(1));
    assert!(stats.tracker_memory_bytes.unwrap() > 0);
    value.drop_with_heap(&mut heap);
}
