//! Reference counting conservation tests.
//!
//! Verifies that values are destroyed exactly when their net reference
//! count reaches zero, that aggregates hold one owning reference per
//! contained value, and that destruction releases everything transitively.

use chalk::{Heap, Value, create_list, create_reference, create_string, dict_set};

// =============================================================================
// 1. Retain / Release on a Single Object
// =============================================================================

/// A value with N outstanding references survives N-1 releases and dies on
/// the Nth.
#[test]
fn destroyed_exactly_at_zero() {
    let mut heap = Heap::new();
    let text = create_string(&mut heap, b"persist").unwrap();
    let id = text.as_heap_id().unwrap();

    let second = text.clone_with_heap(&heap);
    let third = text.clone_with_heap(&heap);
    assert_eq!(heap.refcount(id), 3);

    second.drop_with_heap(&mut heap);
    third.drop_with_heap(&mut heap);
    assert_eq!(heap.refcount(id), 1, "object must stay live while reachable");
    assert!(heap.get_if_live(id).is_some());

    text.drop_with_heap(&mut heap);
    assert_eq!(heap.refcount(id), 0);
    assert!(heap.get_if_live(id).is_none(), "last release destroys the object");
}

/// Releasing a null handle is a legal no-op.
#[test]
fn release_on_null_is_a_no_op() {
    let mut heap = Heap::new();
    Value::Null.drop_with_heap(&mut heap);
    assert_eq!(heap.stats().live_objects, 0);
}

// =============================================================================
// 2. Aggregates Own Their Contents
// =============================================================================

/// Creating a list retains each supplied element once.
#[test]
fn list_elements_hold_one_reference_each() {
    let mut heap = Heap::new();
    let element = create_string(&mut heap, b"shared").unwrap();
    let element_id = element.as_heap_id().unwrap();

    let list = create_list(&mut heap, std::slice::from_ref(&element)).unwrap();
    assert_eq!(heap.refcount(element_id), 2, "list holds its own reference");

    element.drop_with_heap(&mut heap);
    assert_eq!(heap.refcount(element_id), 1, "list keeps the element alive");

    list.drop_with_heap(&mut heap);
    assert_eq!(heap.refcount(element_id), 0, "list destruction releases elements");
}

/// Destroying a dict releases both keys and values.
#[test]
fn dict_destruction_releases_keys_and_values() {
    let mut heap = Heap::new();
    let key = create_string(&mut heap, b"k").unwrap();
    let value = create_string(&mut heap, b"v").unwrap();
    let key_id = key.as_heap_id().unwrap();
    let value_id = value.as_heap_id().unwrap();

    let dict = chalk::create_dict(&mut heap, None).unwrap();
    let dict_id = dict.as_heap_id().unwrap();
    let key_clone = key.clone_with_heap(&heap);
    let value_clone = value.clone_with_heap(&heap);
    dict_set(&mut heap, dict_id, key_clone, value_clone).unwrap();
    assert_eq!(heap.refcount(key_id), 2);
    assert_eq!(heap.refcount(value_id), 2);

    dict.drop_with_heap(&mut heap);
    assert_eq!(heap.refcount(key_id), 1);
    assert_eq!(heap.refcount(value_id), 1);

    key.drop_with_heap(&mut heap);
    value.drop_with_heap(&mut heap);
    assert_eq!(heap.stats().live_objects, 0);
}

/// Destroying nested aggregates releases transitively.
#[test]
fn nested_destruction_is_transitive() {
    let mut heap = Heap::new();
    let leaf = create_string(&mut heap, b"leaf").unwrap();
    let inner = create_list(&mut heap, std::slice::from_ref(&leaf)).unwrap();
    let outer = create_list(&mut heap, std::slice::from_ref(&inner)).unwrap();
    let leaf_id = leaf.as_heap_id().unwrap();

    leaf.drop_with_heap(&mut heap);
    inner.drop_with_heap(&mut heap);
    assert_eq!(heap.refcount(leaf_id), 1, "outer -> inner -> leaf chain keeps it live");

    outer.drop_with_heap(&mut heap);
    assert_eq!(heap.stats().live_objects, 0, "everything freed transitively");
}

// =============================================================================
// 3. Reference Cells
// =============================================================================

/// A reference cell owns its target and releases it on destruction.
#[test]
fn reference_cell_owns_target() {
    let mut heap = Heap::new();
    let boxed = create_string(&mut heap, b"boxed").unwrap();
    let boxed_id = boxed.as_heap_id().unwrap();

    let cell = create_reference(&mut heap, &boxed).unwrap();
    assert_eq!(heap.refcount(boxed_id), 2);

    boxed.drop_with_heap(&mut heap);
    assert_eq!(heap.refcount(boxed_id), 1);

    cell.drop_with_heap(&mut heap);
    assert_eq!(heap.refcount(boxed_id), 0);
}

// =============================================================================
// 4. Slot Reuse
// =============================================================================

/// Freed slots are recycled by later allocations.
#[test]
fn freed_slots_are_reused() {
    let mut heap = Heap::new();
    let first = create_string(&mut heap, b"one").unwrap();
    let first_id = first.as_heap_id().unwrap();
    first.drop_with_heap(&mut heap);

    let second = create_string(&mut heap, b"two").unwrap();
    assert_eq!(
        second.as_heap_id().unwrap(),
        first_id,
        "allocation should pop the freed slot"
    );
    let stats = heap.stats();
    assert_eq!(stats.live_objects, 1);
    assert_eq!(stats.total_slots, 1);
    second.drop_with_heap(&mut heap);
}
