use smallvec::SmallVec;

use crate::{
    error::{RunError, RunResult},
    heap::{Heap, HeapData, HeapId},
    resource::ResourceTracker,
    value::Value,
};

/// A Chalk list: an ordered sequence of owned values.
///
/// Every element holds one strong reference, released when the element is
/// replaced, removed, or the list is destroyed.
///
/// The generation counter mirrors the dict's: it is bumped on every
/// structural mutation (append, extend, clear) and lets in-flight iterators
/// detect that the list changed underneath them. In-place replacement of an
/// existing slot is not structural and does not bump it.
#[derive(Debug, Default)]
pub struct List {
    items: Vec<Value>,
    generation: u64,
}

impl List {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            generation: 0,
        }
    }

    /// Wraps already-owned values without touching reference counts; the
    /// caller transfers ownership of every element.
    pub(crate) fn from_values(items: Vec<Value>) -> Self {
        Self {
            items,
            generation: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Returns the element at `index` with its reference count incremented,
    /// or `None` when the index is out of range (not an error).
    pub fn lookup(&self, heap: &Heap<impl ResourceTracker>, index: usize) -> Option<Value> {
        self.items.get(index).map(|value| value.clone_with_heap(heap))
    }

    /// Stores `value` at `index`, taking ownership of it.
    ///
    /// An index below the count replaces in place, releasing the previous
    /// element; an index equal to the count appends; anything past that is
    /// `index-out-of-range` and the value is released.
    pub fn set(
        &mut self,
        heap: &mut Heap<impl ResourceTracker>,
        index: usize,
        value: Value,
    ) -> RunResult<()> {
        if index < self.items.len() {
            let old = std::mem::replace(&mut self.items[index], value);
            old.drop_with_heap(heap);
            Ok(())
        } else if index == self.items.len() {
            self.push(heap, value)
        } else {
            let count = self.items.len();
            value.drop_with_heap(heap);
            Err(RunError::index_out_of_range(format!(
                "list index {index} past end of list of length {count}"
            )))
        }
    }

    /// Appends `value`, taking ownership of it. Structural.
    pub fn push(&mut self, heap: &mut Heap<impl ResourceTracker>, value: Value) -> RunResult<()> {
        if let Err(err) = heap.container_insert_check() {
            value.drop_with_heap(heap);
            return Err(err.into());
        }
        self.items.push(value);
        self.generation += 1;
        Ok(())
    }

    /// Releases every element and empties the list. Structural; this is also
    /// the operation that breaks reference cycles through the list.
    pub fn clear(&mut self, heap: &mut Heap<impl ResourceTracker>) {
        for value in self.items.drain(..) {
            value.drop_with_heap(heap);
        }
        self.generation += 1;
    }

    /// Appends already-owned values. The caller has done the budget checks.
    pub(crate) fn extend_owned(&mut self, values: Vec<Value>) {
        if values.is_empty() {
            return;
        }
        self.items.extend(values);
        self.generation += 1;
    }

    pub(crate) fn dec_ref_ids(&self, out: &mut SmallVec<[HeapId; 8]>) {
        for value in &self.items {
            if let Value::Ref(id) = value {
                out.push(*id);
            }
        }
    }

    pub(crate) fn estimate_size(&self) -> usize {
        self.items.len() * std::mem::size_of::<Value>()
    }
}

/// Looks up `index` in the list object, returning the element with an
/// incremented reference count, or `None` when the index does not exist.
pub fn list_lookup(
    heap: &Heap<impl ResourceTracker>,
    list: HeapId,
    index: usize,
) -> RunResult<Option<Value>> {
    match heap.get(list) {
        HeapData::List(data) => Ok(data.lookup(heap, index)),
        other => Err(RunError::type_error(format!(
            "cannot index a {}",
            other.type_name()
        ))),
    }
}

/// Stores `value` at `index` in the list object; see [`List::set`].
pub fn list_set(
    heap: &mut Heap<impl ResourceTracker>,
    list: HeapId,
    index: usize,
    value: Value,
) -> RunResult<()> {
    if !matches!(heap.get(list), HeapData::List(_)) {
        let name = heap.get(list).type_name();
        value.drop_with_heap(heap);
        return Err(RunError::type_error(format!("cannot index a {name}")));
    }
    heap.with_entry_mut(list, |heap, data| {
        let HeapData::List(data) = data else {
            unreachable!("type tag checked above");
        };
        data.set(heap, index, value)
    })
}

/// Appends `value` to the list object, taking ownership of it.
pub fn list_push(
    heap: &mut Heap<impl ResourceTracker>,
    list: HeapId,
    value: Value,
) -> RunResult<()> {
    if !matches!(heap.get(list), HeapData::List(_)) {
        let name = heap.get(list).type_name();
        value.drop_with_heap(heap);
        return Err(RunError::type_error(format!("cannot append to a {name}")));
    }
    heap.with_entry_mut(list, |heap, data| {
        let HeapData::List(data) = data else {
            unreachable!("type tag checked above");
        };
        data.push(heap, value)
    })
}

/// Releases every element of the list object and empties it.
pub fn list_clear(heap: &mut Heap<impl ResourceTracker>, list: HeapId) -> RunResult<()> {
    if !matches!(heap.get(list), HeapData::List(_)) {
        return Err(RunError::type_error(format!(
            "cannot clear a {}",
            heap.get(list).type_name()
        )));
    }
    heap.with_entry_mut(list, |heap, data| {
        let HeapData::List(data) = data else {
            unreachable!("type tag checked above");
        };
        data.clear(heap);
    });
    Ok(())
}

/// Appends every element of `addition` to `destination` in place, retaining
/// each appended element; `addition` is unchanged. The destructive `+`
/// operator on lists.
///
/// On failure the destination's length is unchanged: the growth budget is
/// checked for the whole batch before anything is appended.
pub fn list_add(
    heap: &mut Heap<impl ResourceTracker>,
    destination: HeapId,
    addition: HeapId,
) -> RunResult<()> {
    let count = match heap.get(addition) {
        HeapData::List(source) => source.len(),
        other => {
            return Err(RunError::type_error(format!(
                "cannot add a {} to a list",
                other.type_name()
            )));
        }
    };
    if !matches!(heap.get(destination), HeapData::List(_)) {
        return Err(RunError::type_error(format!(
            "cannot add a list to a {}",
            heap.get(destination).type_name()
        )));
    }

    // Snapshot with added references first so `l += l` reads a stable source.
    let mut cloned = Vec::with_capacity(count);
    {
        let HeapData::List(source) = heap.get(addition) else {
            unreachable!("type tag checked above");
        };
        for value in source.items() {
            cloned.push(value.clone_with_heap(heap));
        }
    }

    for _ in 0..count {
        if let Err(err) = heap.container_insert_check() {
            for value in cloned {
                value.drop_with_heap(heap);
            }
            return Err(err.into());
        }
    }

    heap.with_entry_mut(destination, |_heap, data| {
        let HeapData::List(data) = data else {
            unreachable!("type tag checked above");
        };
        data.extend_owned(cloned);
    });
    Ok(())
}
