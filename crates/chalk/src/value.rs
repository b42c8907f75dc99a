use std::cmp::Ordering;

use crate::{
    error::{RunError, RunResult},
    heap::{DropWithHeap, Heap, HeapData, HeapId},
    resource::ResourceTracker,
    types::{ChalkTrait, Dict, Function, FunctionBody, List, Reference, Str, Type},
};

/// Primary value type representing Chalk objects at runtime.
///
/// This enum uses a hybrid design: the small immediate values (null,
/// integers) are stored inline, while values with interior structure
/// (strings, lists, dicts, functions, reference cells) live in the heap
/// arena and are referenced via `Ref(HeapId)`.
///
/// NOTE: `Clone` is intentionally NOT derived. Use `clone_with_heap()` to
/// share a value; direct cloning would bypass reference counting and leak
/// or double-free heap values.
#[derive(Debug)]
pub enum Value {
    Null,
    Int(i64),
    Ref(HeapId),
}

impl Value {
    /// Shares this value, adding a reference for heap values (retain).
    pub fn clone_with_heap(&self, heap: &Heap<impl ResourceTracker>) -> Self {
        match self {
            Self::Null => Self::Null,
            Self::Int(v) => Self::Int(*v),
            Self::Ref(id) => {
                heap.inc_ref(*id);
                Self::Ref(*id)
            }
        }
    }

    /// Releases this value's reference (release). A no-op for immediates,
    /// including null, so releasing a null handle is always legal.
    pub fn drop_with_heap(self, heap: &mut Heap<impl ResourceTracker>) {
        if let Self::Ref(id) = self {
            heap.dec_ref(id);
        }
    }

    /// The heap id behind this value, if it is heap-allocated.
    pub fn as_heap_id(&self) -> Option<HeapId> {
        match self {
            Self::Ref(id) => Some(*id),
            _ => None,
        }
    }
}

impl DropWithHeap for Value {
    fn drop_with_heap(self, heap: &mut Heap<impl ResourceTracker>) {
        Self::drop_with_heap(self, heap);
    }
}

impl ChalkTrait for Value {
    fn ck_type(&self, heap: &Heap<impl ResourceTracker>) -> Type {
        match self {
            Self::Null => Type::Null,
            Self::Int(_) => Type::Integer,
            Self::Ref(id) => heap.get(*id).type_of(),
        }
    }

    fn ck_bool(&self, heap: &Heap<impl ResourceTracker>) -> bool {
        match self {
            Self::Null => false,
            Self::Int(v) => *v != 0,
            Self::Ref(id) => heap.get(*id).ck_bool(heap),
        }
    }

    fn ck_len(&self, heap: &Heap<impl ResourceTracker>) -> Option<usize> {
        match self {
            Self::Null | Self::Int(_) => None,
            Self::Ref(id) => heap.get(*id).ck_len(heap),
        }
    }

    fn ck_estimate_size(&self) -> usize {
        // Immediate values are stack-allocated; heap data is sized when allocated.
        0
    }
}

/// Creates a null value.
///
/// Null is an immediate, so no allocation happens and callers observe the
/// documented contract that null instances may or may not be shared.
pub fn create_null() -> Value {
    Value::Null
}

/// Creates an integer value.
pub fn create_integer(value: i64) -> Value {
    Value::Int(value)
}

/// Creates a string object from an independent copy of `bytes`.
pub fn create_string(heap: &mut Heap<impl ResourceTracker>, bytes: &[u8]) -> RunResult<Value> {
    let id = heap.allocate(HeapData::Str(Str::new(bytes)))?;
    Ok(Value::Ref(id))
}

/// Creates a zero-filled string of the given length, the form used when the
/// caller supplies no initial contents.
pub fn create_zeroed_string(heap: &mut Heap<impl ResourceTracker>, len: usize) -> RunResult<Value> {
    let id = heap.allocate(HeapData::Str(Str::zeroed(len)))?;
    Ok(Value::Ref(id))
}

/// Creates a list object. Every supplied element is retained into the new
/// list; the caller keeps its own references.
pub fn create_list(heap: &mut Heap<impl ResourceTracker>, initial: &[Value]) -> RunResult<Value> {
    let mut items = Vec::with_capacity(initial.len());
    for value in initial {
        items.push(value.clone_with_heap(heap));
    }
    let id = heap.allocate(HeapData::List(List::from_values(items)))?;
    Ok(Value::Ref(id))
}

/// Creates a dict object: empty, or a deep copy of `source`'s entries.
/// The copy's generation starts at 0 regardless of the source's.
pub fn create_dict(
    heap: &mut Heap<impl ResourceTracker>,
    source: Option<&Value>,
) -> RunResult<Value> {
    let Some(source) = source else {
        let id = heap.allocate(HeapData::Dict(Dict::new()))?;
        return Ok(Value::Ref(id));
    };
    let source_id = match source {
        Value::Ref(id) if matches!(heap.get(*id), HeapData::Dict(_)) => *id,
        other => {
            return Err(RunError::type_error(format!(
                "cannot create a dict from a {}",
                other.ck_type(heap)
            )));
        }
    };
    let copy = copy_dict(heap, source_id)?;
    let id = heap.allocate(HeapData::Dict(copy))?;
    Ok(Value::Ref(id))
}

/// Creates a function object. The parameter list is retained; a scripted
/// body is borrowed from its owning script and never freed here.
pub fn create_function(
    heap: &mut Heap<impl ResourceTracker>,
    params: &Value,
    body: FunctionBody,
) -> RunResult<Value> {
    if !matches!(params, Value::Ref(id) if matches!(heap.get(*id), HeapData::List(_))) {
        return Err(RunError::type_error(format!(
            "function parameters must be a list, not a {}",
            params.ck_type(heap)
        )));
    }
    let params = params.clone_with_heap(heap);
    let id = heap.allocate(HeapData::Function(Function::from_parts(params, body)))?;
    Ok(Value::Ref(id))
}

/// Creates a reference cell boxing `target`, retaining it.
pub fn create_reference(heap: &mut Heap<impl ResourceTracker>, target: &Value) -> RunResult<Value> {
    let target = target.clone_with_heap(heap);
    let id = heap.allocate(HeapData::Reference(Reference::new(target)))?;
    Ok(Value::Ref(id))
}

/// Creates a deep copy of the given value.
///
/// The copy shares nothing with the source: aggregates are copied
/// element-wise, dict copies restart their generation at 0, and function
/// copies deep-copy the parameter list while aliasing the body and script.
/// Copying through a reference cell copies the target, not the cell.
pub fn deep_copy(heap: &mut Heap<impl ResourceTracker>, source: &Value) -> RunResult<Value> {
    match source {
        Value::Null => Ok(Value::Null),
        Value::Int(v) => Ok(Value::Int(*v)),
        Value::Ref(id) => deep_copy_heap(heap, *id),
    }
}

fn deep_copy_heap(heap: &mut Heap<impl ResourceTracker>, id: HeapId) -> RunResult<Value> {
    match heap.get(id) {
        HeapData::Str(s) => {
            let bytes = s.as_bytes().to_vec();
            let copy = heap.allocate(HeapData::Str(Str::new(bytes)))?;
            Ok(Value::Ref(copy))
        }
        HeapData::List(list) => {
            let count = list.len();
            let mut items = Vec::with_capacity(count);
            for index in 0..count {
                let element = {
                    let HeapData::List(list) = heap.get(id) else {
                        unreachable!("type tag is immutable");
                    };
                    list.items()[index].clone_with_heap(heap)
                };
                let copied = deep_copy(heap, &element);
                element.drop_with_heap(heap);
                match copied {
                    Ok(value) => items.push(value),
                    Err(err) => {
                        items.drop_with_heap(heap);
                        return Err(err);
                    }
                }
            }
            let copy = heap.allocate(HeapData::List(List::from_values(items)))?;
            Ok(Value::Ref(copy))
        }
        HeapData::Dict(_) => {
            let copy = copy_dict(heap, id)?;
            let copy = heap.allocate(HeapData::Dict(copy))?;
            Ok(Value::Ref(copy))
        }
        HeapData::Function(function) => {
            let body = function.body();
            let params = function.params().clone_with_heap(heap);
            let params_copy = deep_copy(heap, &params);
            params.drop_with_heap(heap);
            let params_copy = params_copy?;
            let copy = heap.allocate(HeapData::Function(Function::from_parts(params_copy, body)))?;
            Ok(Value::Ref(copy))
        }
        HeapData::Reference(reference) => {
            let target = reference.value().clone_with_heap(heap);
            let copied = deep_copy(heap, &target);
            target.drop_with_heap(heap);
            copied
        }
    }
}

/// Deep-copies a dict's entries into a fresh `Dict` with generation 0.
fn copy_dict(heap: &mut Heap<impl ResourceTracker>, source: HeapId) -> RunResult<Dict> {
    let count = match heap.get(source) {
        HeapData::Dict(dict) => dict.len(),
        _ => unreachable!("callers check the type tag"),
    };
    let mut pairs: Vec<(Value, Value)> = Vec::with_capacity(count);
    for index in 0..count {
        let (key, value) = {
            let HeapData::Dict(dict) = heap.get(source) else {
                unreachable!("type tag is immutable");
            };
            let entry = &dict.entries()[index];
            (
                entry.key().clone_with_heap(heap),
                entry.value().clone_with_heap(heap),
            )
        };
        let key_copy = deep_copy(heap, &key);
        key.drop_with_heap(heap);
        let key_copy = match key_copy {
            Ok(copy) => copy,
            Err(err) => {
                value.drop_with_heap(heap);
                drop_pairs(heap, pairs);
                return Err(err);
            }
        };
        let value_copy = deep_copy(heap, &value);
        value.drop_with_heap(heap);
        let value_copy = match value_copy {
            Ok(copy) => copy,
            Err(err) => {
                key_copy.drop_with_heap(heap);
                drop_pairs(heap, pairs);
                return Err(err);
            }
        };
        pairs.push((key_copy, value_copy));
    }
    Ok(Dict::from_entries(pairs))
}

fn drop_pairs(heap: &mut Heap<impl ResourceTracker>, pairs: Vec<(Value, Value)>) {
    for (key, value) in pairs {
        key.drop_with_heap(heap);
        value.drop_with_heap(heap);
    }
}

/// Compares two values, defining a total order.
///
/// Same-type operands compare by content (strings byte-lexicographically,
/// lists element-wise then by length, dicts by count then pairwise key and
/// value in insertion order, functions by identity). Mismatched types order
/// by their type tag. Reference cells are transparently dereferenced first.
pub fn compare(heap: &Heap<impl ResourceTracker>, left: &Value, right: &Value) -> Ordering {
    let left = chase_reference(heap, left);
    let right = chase_reference(heap, right);

    let left_type = left.ck_type(heap);
    let right_type = right.ck_type(heap);
    if left_type != right_type {
        return left_type.tag().cmp(&right_type.tag());
    }

    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Ref(a), Value::Ref(b)) => {
            if a == b {
                return Ordering::Equal;
            }
            match (heap.get(*a), heap.get(*b)) {
                (HeapData::Str(x), HeapData::Str(y)) => x.as_bytes().cmp(y.as_bytes()),
                (HeapData::List(x), HeapData::List(y)) => compare_lists(heap, x, y),
                (HeapData::Dict(x), HeapData::Dict(y)) => compare_dicts(heap, x, y),
                (HeapData::Function(_), HeapData::Function(_)) => a.index().cmp(&b.index()),
                _ => unreachable!("type tags already matched"),
            }
        }
        _ => unreachable!("type tags already matched"),
    }
}

fn compare_lists(heap: &Heap<impl ResourceTracker>, left: &List, right: &List) -> Ordering {
    for (a, b) in left.items().iter().zip(right.items()) {
        let order = compare(heap, a, b);
        if order != Ordering::Equal {
            return order;
        }
    }
    left.len().cmp(&right.len())
}

fn compare_dicts(heap: &Heap<impl ResourceTracker>, left: &Dict, right: &Dict) -> Ordering {
    let by_count = left.len().cmp(&right.len());
    if by_count != Ordering::Equal {
        return by_count;
    }
    for (a, b) in left.entries().iter().zip(right.entries()) {
        let by_key = compare(heap, a.key(), b.key());
        if by_key != Ordering::Equal {
            return by_key;
        }
        let by_value = compare(heap, a.value(), b.value());
        if by_value != Ordering::Equal {
            return by_value;
        }
    }
    Ordering::Equal
}

/// Follows reference cells to the value they box.
fn chase_reference<'h>(heap: &'h Heap<impl ResourceTracker>, value: &'h Value) -> &'h Value {
    let mut current = value;
    while let Value::Ref(id) = current {
        match heap.get(*id) {
            HeapData::Reference(reference) => current = reference.value(),
            _ => break,
        }
    }
    current
}

/// Concatenates two strings into a fresh string object; the operands are
/// unchanged.
pub fn string_add(
    heap: &mut Heap<impl ResourceTracker>,
    left: &Value,
    right: &Value,
) -> RunResult<Value> {
    let joined = match (left, right) {
        (Value::Ref(a), Value::Ref(b)) => match (heap.get(*a), heap.get(*b)) {
            (HeapData::Str(x), HeapData::Str(y)) => x.concat(y),
            _ => {
                return Err(string_add_type_error(heap, left, right));
            }
        },
        _ => {
            return Err(string_add_type_error(heap, left, right));
        }
    };
    let id = heap.allocate(HeapData::Str(joined))?;
    Ok(Value::Ref(id))
}

fn string_add_type_error(
    heap: &Heap<impl ResourceTracker>,
    left: &Value,
    right: &Value,
) -> RunError {
    RunError::type_error(format!(
        "cannot concatenate a {} and a {}",
        left.ck_type(heap),
        right.ck_type(heap)
    ))
}

/// Nesting depth past which the canonical printer truncates with an
/// ellipsis, bounding output on cyclic aggregates.
pub const MAX_RENDER_DEPTH: u32 = 32;

/// Renders a value into `out` in canonical form.
///
/// `depth` is 0 at top level: a top-level string is written raw so printing
/// `"hi"` yields `hi`, while nested strings are quoted with `\"`, `\\`, and
/// `\xNN` escapes. Lists render as `[a, b]`, dicts as `{key: value}` in
/// insertion order, functions as `<function>`. Depths past
/// [`MAX_RENDER_DEPTH`] render as `...`.
pub fn render(
    heap: &Heap<impl ResourceTracker>,
    value: &Value,
    depth: u32,
    out: &mut Vec<u8>,
) {
    if depth > MAX_RENDER_DEPTH {
        out.extend_from_slice(b"...");
        return;
    }
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Int(v) => out.extend_from_slice(v.to_string().as_bytes()),
        Value::Ref(id) => match heap.get(*id) {
            HeapData::Str(s) => {
                if depth == 0 {
                    out.extend_from_slice(s.as_bytes());
                } else {
                    render_quoted(s.as_bytes(), out);
                }
            }
            HeapData::List(list) => {
                out.push(b'[');
                for (index, element) in list.items().iter().enumerate() {
                    if index > 0 {
                        out.extend_from_slice(b", ");
                    }
                    render(heap, element, depth + 1, out);
                }
                out.push(b']');
            }
            HeapData::Dict(dict) => {
                out.push(b'{');
                for (index, entry) in dict.entries().iter().enumerate() {
                    if index > 0 {
                        out.extend_from_slice(b", ");
                    }
                    render(heap, entry.key(), depth + 1, out);
                    out.extend_from_slice(b": ");
                    render(heap, entry.value(), depth + 1, out);
                }
                out.push(b'}');
            }
            HeapData::Function(_) => out.extend_from_slice(b"<function>"),
            HeapData::Reference(reference) => render(heap, reference.value(), depth, out),
        },
    }
}

/// Writes a quoted string: printable bytes verbatim, quotes and backslashes
/// escaped, everything else as `\xNN`.
fn render_quoted(bytes: &[u8], out: &mut Vec<u8>) {
    out.push(b'"');
    for &byte in bytes {
        match byte {
            b'"' => out.extend_from_slice(b"\\\""),
            b'\\' => out.extend_from_slice(b"\\\\"),
            0x20..=0x7e => out.push(byte),
            _ => {
                out.extend_from_slice(format!("\\x{byte:02x}").as_bytes());
            }
        }
    }
    out.push(b'"');
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::*;

    #[test]
    fn null_and_zero_are_false() {
        let heap = Heap::new();
        assert!(!create_null().ck_bool(&heap));
        assert!(!create_integer(0).ck_bool(&heap));
        assert!(create_integer(-3).ck_bool(&heap));
    }

    #[test]
    fn empty_aggregates_are_false() {
        let mut heap = Heap::new();
        let empty = create_string(&mut heap, b"").unwrap();
        let full = create_string(&mut heap, b"x").unwrap();
        assert!(!empty.ck_bool(&heap));
        assert!(full.ck_bool(&heap));
        empty.drop_with_heap(&mut heap);
        full.drop_with_heap(&mut heap);
    }

    #[test]
    fn mismatched_types_order_by_tag() {
        let mut heap = Heap::new();
        let number = create_integer(99);
        let text = create_string(&mut heap, b"a").unwrap();
        assert_eq!(compare(&heap, &number, &text), Ordering::Less);
        assert_eq!(compare(&heap, &text, &number), Ordering::Greater);
        text.drop_with_heap(&mut heap);
    }

    #[test]
    fn reference_cells_compare_as_their_target() {
        let mut heap = Heap::new();
        let target = create_integer(5);
        let cell = create_reference(&mut heap, &target).unwrap();
        assert_eq!(compare(&heap, &cell, &create_integer(5)), Ordering::Equal);
        cell.drop_with_heap(&mut heap);
    }

    #[test]
    fn render_escapes_nested_strings() {
        let mut heap = Heap::new();
        let text = create_string(&mut heap, b"a\"b\\c\x01").unwrap();
        let list = create_list(&mut heap, std::slice::from_ref(&text)).unwrap();

        let mut top = Vec::new();
        render(&heap, &text, 0, &mut top);
        assert_eq!(top, b"a\"b\\c\x01");

        let mut nested = Vec::new();
        render(&heap, &list, 0, &mut nested);
        assert_eq!(nested, b"[\"a\\\"b\\\\c\\x01\"]");

        text.drop_with_heap(&mut heap);
        list.drop_with_heap(&mut heap);
    }
}
