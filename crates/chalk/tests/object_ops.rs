//! Object operation tests: deep copy, comparison, addition, rendering.

use std::cmp::Ordering;

use chalk::{
    ChalkTrait, Heap, Value, compare, create_dict, create_integer, create_list, create_string,
    deep_copy, dict_set, list_add, list_lookup, list_set, render, string_add,
};
use pretty_assertions::assert_eq;

fn render_to_string(heap: &Heap<chalk::NoLimitTracker>, value: &Value) -> String {
    let mut out = Vec::new();
    render(heap, value, 0, &mut out);
    String::from_utf8(out).expect("test values render as UTF-8")
}

// =============================================================================
// 1. Deep Copy Independence
// =============================================================================

/// A deep copy compares equal to its source.
#[test]
fn copy_compares_equal_to_source() {
    let mut heap = Heap::new();
    let key = create_string(&mut heap, b"inner").unwrap();
    let nested = create_list(&mut heap, &[create_integer(1), create_integer(2)]).unwrap();
    let dict = create_dict(&mut heap, None).unwrap();
    let dict_id = dict.as_heap_id().unwrap();
    let key_clone = key.clone_with_heap(&heap);
    let nested_clone = nested.clone_with_heap(&heap);
    dict_set(&mut heap, dict_id, key_clone, nested_clone).unwrap();

    let copy = deep_copy(&mut heap, &dict).unwrap();
    assert_eq!(compare(&heap, &dict, &copy), Ordering::Equal);

    key.drop_with_heap(&mut heap);
    nested.drop_with_heap(&mut heap);
    dict.drop_with_heap(&mut heap);
    copy.drop_with_heap(&mut heap);
}

/// Mutating a deep copy leaves the source unchanged.
#[test]
fn mutating_copy_leaves_source_unchanged() {
    let mut heap = Heap::new();
    let list = create_list(&mut heap, &[create_integer(1), create_integer(2)]).unwrap();
    let copy = deep_copy(&mut heap, &list).unwrap();

    list_set(
        &mut heap,
        copy.as_heap_id().unwrap(),
        0,
        create_integer(99),
    )
    .unwrap();

    assert_eq!(render_to_string(&heap, &list), "[1, 2]");
    assert_eq!(render_to_string(&heap, &copy), "[99, 2]");

    list.drop_with_heap(&mut heap);
    copy.drop_with_heap(&mut heap);
}

/// A copied dict restarts its generation at zero.
#[test]
fn copied_dict_generation_restarts() {
    let mut heap = Heap::new();
    let dict = create_dict(&mut heap, None).unwrap();
    let dict_id = dict.as_heap_id().unwrap();
    for name in [&b"a"[..], b"b", b"c"] {
        let key = create_string(&mut heap, name).unwrap();
        dict_set(&mut heap, dict_id, key, create_integer(0)).unwrap();
    }

    let copy = create_dict(&mut heap, Some(&dict)).unwrap();
    let chalk::HeapData::Dict(copied) = heap.get(copy.as_heap_id().unwrap()) else {
        panic!("expected a dict");
    };
    assert_eq!(copied.generation(), 0);
    assert_eq!(copied.len(), 3);

    dict.drop_with_heap(&mut heap);
    copy.drop_with_heap(&mut heap);
}

// =============================================================================
// 2. Compare Is a Total Order
// =============================================================================

/// Antisymmetry and reflexivity over a mixed sample of values.
#[test]
fn compare_is_antisymmetric_and_reflexive() {
    let mut heap = Heap::new();
    let samples = vec![
        Value::Null,
        create_integer(-5),
        create_integer(0),
        create_integer(7),
        create_string(&mut heap, b"").unwrap(),
        create_string(&mut heap, b"abc").unwrap(),
        create_string(&mut heap, b"abd").unwrap(),
        create_list(&mut heap, &[]).unwrap(),
        create_list(&mut heap, &[create_integer(1)]).unwrap(),
        create_dict(&mut heap, None).unwrap(),
    ];

    for a in &samples {
        assert_eq!(compare(&heap, a, a), Ordering::Equal, "reflexivity");
        for b in &samples {
            assert_eq!(
                compare(&heap, a, b),
                compare(&heap, b, a).reverse(),
                "antisymmetry"
            );
        }
    }

    for value in samples {
        value.drop_with_heap(&mut heap);
    }
}

/// The documented list comparison scenarios.
#[test]
fn list_comparison_scenarios() {
    let mut heap = Heap::new();
    let a = create_list(
        &mut heap,
        &[create_integer(1), create_integer(2), create_integer(3)],
    )
    .unwrap();
    let b = create_list(
        &mut heap,
        &[create_integer(1), create_integer(2), create_integer(4)],
    )
    .unwrap();
    let short = create_list(&mut heap, &[create_integer(1), create_integer(2)]).unwrap();
    let padded = create_list(
        &mut heap,
        &[create_integer(1), create_integer(2), create_integer(0)],
    )
    .unwrap();
    let empty_a = create_list(&mut heap, &[]).unwrap();
    let empty_b = create_list(&mut heap, &[]).unwrap();

    assert_eq!(compare(&heap, &a, &b), Ordering::Less);
    assert_eq!(compare(&heap, &short, &padded), Ordering::Less, "shorter is smaller");
    assert_eq!(compare(&heap, &empty_a, &empty_b), Ordering::Equal);

    for value in [a, b, short, padded, empty_a, empty_b] {
        value.drop_with_heap(&mut heap);
    }
}

/// Strings compare byte-lexicographically with shorter-prefix-smaller.
#[test]
fn string_comparison_is_lexicographic() {
    let mut heap = Heap::new();
    let ab = create_string(&mut heap, b"ab").unwrap();
    let abc = create_string(&mut heap, b"abc").unwrap();
    let b = create_string(&mut heap, b"b").unwrap();

    assert_eq!(compare(&heap, &ab, &abc), Ordering::Less);
    assert_eq!(compare(&heap, &abc, &b), Ordering::Less);
    assert_eq!(compare(&heap, &ab, &b), Ordering::Less);

    for value in [ab, abc, b] {
        value.drop_with_heap(&mut heap);
    }
}

/// Functions compare by identity: equal only to themselves.
#[test]
fn functions_compare_by_identity() {
    let mut heap = Heap::new();
    let params = create_list(&mut heap, &[]).unwrap();
    let body = chalk::FunctionBody::Scripted {
        body: chalk::NodeHandle::new(0),
        script: chalk::Scripts::new().load("f.ck", Vec::new()),
    };
    let f = chalk::create_function(&mut heap, &params, body).unwrap();
    let g = chalk::create_function(&mut heap, &params, body).unwrap();
    let f_again = f.clone_with_heap(&heap);

    assert_eq!(compare(&heap, &f, &f_again), Ordering::Equal);
    assert_ne!(compare(&heap, &f, &g), Ordering::Equal);

    for value in [params, f, g, f_again] {
        value.drop_with_heap(&mut heap);
    }
}

// =============================================================================
// 3. Addition
// =============================================================================

/// String concatenation produces a fresh string and leaves operands alone.
#[test]
fn string_add_concatenates() {
    let mut heap = Heap::new();
    let left = create_string(&mut heap, b"foo").unwrap();
    let right = create_string(&mut heap, b"bar").unwrap();
    let joined = string_add(&mut heap, &left, &right).unwrap();

    assert_eq!(render_to_string(&heap, &joined), "foobar");
    assert_eq!(render_to_string(&heap, &left), "foo");
    assert_eq!(render_to_string(&heap, &right), "bar");

    for value in [left, right, joined] {
        value.drop_with_heap(&mut heap);
    }
}

/// Concatenating the empty string is an identity.
#[test]
fn string_add_empty_is_identity() {
    let mut heap = Heap::new();
    let original = create_string(&mut heap, b"same").unwrap();
    let empty = create_string(&mut heap, b"").unwrap();
    let joined = string_add(&mut heap, &original, &empty).unwrap();

    assert_eq!(compare(&heap, &joined, &original), Ordering::Equal);

    for value in [original, empty, joined] {
        value.drop_with_heap(&mut heap);
    }
}

/// Adding an empty list leaves the destination's length and an empty dict
/// the destination's count and generation unchanged.
#[test]
fn adding_empty_aggregates_is_identity() {
    let mut heap = Heap::new();
    let list = create_list(&mut heap, &[create_integer(1)]).unwrap();
    let empty_list = create_list(&mut heap, &[]).unwrap();
    list_add(
        &mut heap,
        list.as_heap_id().unwrap(),
        empty_list.as_heap_id().unwrap(),
    )
    .unwrap();
    assert_eq!(list.ck_len(&heap), Some(1));

    let dict = create_dict(&mut heap, None).unwrap();
    let dict_id = dict.as_heap_id().unwrap();
    let key = create_string(&mut heap, b"k").unwrap();
    dict_set(&mut heap, dict_id, key, create_integer(1)).unwrap();
    let generation_before = {
        let chalk::HeapData::Dict(data) = heap.get(dict_id) else {
            panic!("expected a dict");
        };
        data.generation()
    };

    let empty_dict = create_dict(&mut heap, None).unwrap();
    chalk::dict_add(&mut heap, dict_id, empty_dict.as_heap_id().unwrap()).unwrap();

    let chalk::HeapData::Dict(data) = heap.get(dict_id) else {
        panic!("expected a dict");
    };
    assert_eq!(data.len(), 1);
    assert_eq!(data.generation(), generation_before);

    for value in [list, empty_list, dict, empty_dict] {
        value.drop_with_heap(&mut heap);
    }
}

/// Appending a list to itself doubles it.
#[test]
fn list_add_to_itself_doubles() {
    let mut heap = Heap::new();
    let list = create_list(&mut heap, &[create_integer(1), create_integer(2)]).unwrap();
    let id = list.as_heap_id().unwrap();
    list_add(&mut heap, id, id).unwrap();
    assert_eq!(render_to_string(&heap, &list), "[1, 2, 1, 2]");
    list.drop_with_heap(&mut heap);
}

// =============================================================================
// 4. List Indexed Access
// =============================================================================

/// The documented append-through-set scenario: l = [1,2]; l += [3,4].
#[test]
fn list_extend_and_index() {
    let mut heap = Heap::new();
    let list = create_list(&mut heap, &[create_integer(1), create_integer(2)]).unwrap();
    let addition = create_list(&mut heap, &[create_integer(3), create_integer(4)]).unwrap();
    list_add(
        &mut heap,
        list.as_heap_id().unwrap(),
        addition.as_heap_id().unwrap(),
    )
    .unwrap();

    assert_eq!(list.ck_len(&heap), Some(4));
    let third = list_lookup(&heap, list.as_heap_id().unwrap(), 2)
        .unwrap()
        .expect("index 2 exists");
    assert!(matches!(third, Value::Int(3)));
    third.drop_with_heap(&mut heap);

    list.drop_with_heap(&mut heap);
    addition.drop_with_heap(&mut heap);
}

/// Lookup past the end returns no value rather than an error.
#[test]
fn list_lookup_out_of_range_is_none() {
    let mut heap = Heap::new();
    let list = create_list(&mut heap, &[create_integer(1)]).unwrap();
    let missing = list_lookup(&heap, list.as_heap_id().unwrap(), 5).unwrap();
    assert!(missing.is_none());
    list.drop_with_heap(&mut heap);
}

/// Set at count appends; set past count is index-out-of-range; set in range
/// replaces without changing the length.
#[test]
fn list_set_boundaries() {
    let mut heap = Heap::new();
    let list = create_list(&mut heap, &[create_integer(1)]).unwrap();
    let id = list.as_heap_id().unwrap();

    list_set(&mut heap, id, 1, create_integer(2)).unwrap();
    assert_eq!(list.ck_len(&heap), Some(2));

    list_set(&mut heap, id, 0, create_integer(10)).unwrap();
    assert_eq!(list.ck_len(&heap), Some(2), "replacement keeps the length");
    assert_eq!(render_to_string(&heap, &list), "[10, 2]");

    let err = list_set(&mut heap, id, 9, create_integer(3)).unwrap_err();
    assert_eq!(err.kind(), chalk::ErrorKind::IndexOutOfRange);

    list.drop_with_heap(&mut heap);
}

// =============================================================================
// 5. Canonical Rendering
// =============================================================================

/// The documented dict printing scenario.
#[test]
fn dict_renders_in_insertion_order() {
    let mut heap = Heap::new();
    let dict = create_dict(&mut heap, None).unwrap();
    let dict_id = dict.as_heap_id().unwrap();
    let x = create_string(&mut heap, b"x").unwrap();
    let y = create_string(&mut heap, b"y").unwrap();
    dict_set(&mut heap, dict_id, x, create_integer(1)).unwrap();
    dict_set(&mut heap, dict_id, y, create_integer(2)).unwrap();

    assert_eq!(render_to_string(&heap, &dict), "{\"x\": 1, \"y\": 2}");
    dict.drop_with_heap(&mut heap);
}

/// Deep nesting truncates with an ellipsis instead of recursing forever.
#[test]
fn rendering_truncates_past_depth_cap() {
    let mut heap = Heap::new();
    let list = create_list(&mut heap, &[]).unwrap();
    let id = list.as_heap_id().unwrap();
    // A list containing itself: the canonical refcount cycle.
    let list_clone = list.clone_with_heap(&heap);
    chalk::list_push(&mut heap, id, list_clone).unwrap();

    let rendered = render_to_string(&heap, &list);
    assert!(rendered.starts_with('['));
    assert!(rendered.contains("..."), "cycle rendering must truncate: {rendered}");

    // Break the cycle so the heap can reclaim it.
    chalk::list_clear(&mut heap, id).unwrap();
    list.drop_with_heap(&mut heap);
    assert_eq!(heap.stats().live_objects, 0);
}

/// Functions render as an opaque token.
#[test]
fn functions_render_opaquely() {
    let mut heap = Heap::new();
    let params = create_list(&mut heap, &[]).unwrap();
    let function = chalk::create_function(
        &mut heap,
        &params,
        chalk::FunctionBody::Scripted {
            body: chalk::NodeHandle::new(3),
            script: chalk::Scripts::new().load("f.ck", Vec::new()),
        },
    )
    .unwrap();
    assert_eq!(render_to_string(&heap, &function), "<function>");
    params.drop_with_heap(&mut heap);
    function.drop_with_heap(&mut heap);
}

// =============================================================================
// 6. Boolean Consistency
// =============================================================================

/// bool(x) is false exactly for null, zero, and the empty aggregates.
#[test]
fn boolean_consistency() {
    let mut heap = Heap::new();
    let falsy = vec![
        Value::Null,
        create_integer(0),
        create_string(&mut heap, b"").unwrap(),
        create_list(&mut heap, &[]).unwrap(),
        create_dict(&mut heap, None).unwrap(),
    ];
    for value in &falsy {
        assert!(!value.ck_bool(&heap), "{value:?} must be false");
    }
    for value in falsy {
        value.drop_with_heap(&mut heap);
    }

    let truthy = vec![
        create_integer(-1),
        create_string(&mut heap, b"\0").unwrap(),
        create_list(&mut heap, &[create_integer(0)]).unwrap(),
    ];
    for value in &truthy {
        assert!(value.ck_bool(&heap), "{value:?} must be true");
    }
    for value in truthy {
        value.drop_with_heap(&mut heap);
    }
}
