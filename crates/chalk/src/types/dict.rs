use smallvec::SmallVec;

use crate::{
    error::{RunError, RunResult},
    heap::{Heap, HeapData, HeapId},
    resource::ResourceTracker,
    value::{Value, compare},
};

/// One key/value pair in a dict. Both sides hold a strong reference.
#[derive(Debug)]
pub struct DictEntry {
    key: Value,
    value: Value,
}

impl DictEntry {
    #[inline]
    pub fn key(&self) -> &Value {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// An l-value handle to a dict slot, returned by [`Dict::set`] for use as a
/// later assignment target.
///
/// The handle records the generation it was minted under; any structural
/// mutation of the dict afterwards invalidates it, and writing through a
/// stale handle fails with `mutated-during-iteration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictSlot {
    index: usize,
    generation: u64,
}

/// A Chalk dict: an insertion-ordered mapping from object keys to object
/// values.
///
/// Keys are arbitrary objects compared with the runtime's total order, so
/// lookup is a linear scan over the entries in insertion order. Keys and
/// values each hold one strong reference.
///
/// The generation counter increases on every structural mutation (insert of
/// a new key, delete, clear, bulk extend); replacing the value of an
/// existing key is not structural. Iterators and l-value slots capture the
/// generation and refuse to operate once it has moved on.
#[derive(Debug, Default)]
pub struct Dict {
    entries: Vec<DictEntry>,
    generation: u64,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            generation: 0,
        }
    }

    /// Wraps already-owned entries without touching reference counts. Keys
    /// must be distinct; callers build from a source that guarantees it.
    pub(crate) fn from_entries(entries: Vec<(Value, Value)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, value)| DictEntry { key, value })
                .collect(),
            generation: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The entries in insertion order.
    #[inline]
    pub fn entries(&self) -> &[DictEntry] {
        &self.entries
    }

    /// Finds the entry index for `key`, comparing keys with the runtime's
    /// total order.
    pub fn find(&self, heap: &Heap<impl ResourceTracker>, key: &Value) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| compare(heap, &entry.key, key).is_eq())
    }

    /// Returns the entry for `key`, or `None` when absent.
    ///
    /// The entry is borrowed; it is invalidated by any structural mutation
    /// of the dict (the borrow checker enforces the stronger rule that no
    /// mutation at all may intervene).
    pub fn lookup(&self, heap: &Heap<impl ResourceTracker>, key: &Value) -> Option<&DictEntry> {
        self.find(heap, key).map(|index| &self.entries[index])
    }

    /// Inserts or replaces the value for `key`, taking ownership of both.
    ///
    /// Replacing an existing key keeps its position and does not bump the
    /// generation; the duplicate key and the previous value are released.
    /// A new key is appended in insertion order and bumps the generation.
    /// Returns an l-value slot for the stored value.
    pub fn set(
        &mut self,
        heap: &mut Heap<impl ResourceTracker>,
        key: Value,
        value: Value,
    ) -> RunResult<DictSlot> {
        if let Some(index) = self.find(heap, &key) {
            key.drop_with_heap(heap);
            let old = std::mem::replace(&mut self.entries[index].value, value);
            old.drop_with_heap(heap);
            return Ok(DictSlot {
                index,
                generation: self.generation,
            });
        }
        if let Err(err) = heap.container_insert_check() {
            key.drop_with_heap(heap);
            value.drop_with_heap(heap);
            return Err(err.into());
        }
        self.entries.push(DictEntry { key, value });
        self.generation += 1;
        Ok(DictSlot {
            index: self.entries.len() - 1,
            generation: self.generation,
        })
    }

    /// Insert-or-replace that skips the growth budget; used by bulk extend
    /// after the whole batch has been checked.
    pub(crate) fn set_prechecked(
        &mut self,
        heap: &mut Heap<impl ResourceTracker>,
        key: Value,
        value: Value,
    ) {
        if let Some(index) = self.find(heap, &key) {
            key.drop_with_heap(heap);
            let old = std::mem::replace(&mut self.entries[index].value, value);
            old.drop_with_heap(heap);
        } else {
            self.entries.push(DictEntry { key, value });
            self.generation += 1;
        }
    }

    /// The value a slot currently addresses, if the slot is still valid.
    pub fn slot_value(&self, slot: DictSlot) -> RunResult<&Value> {
        if slot.generation != self.generation {
            return Err(RunError::mutated_during_iteration());
        }
        Ok(&self.entries[slot.index].value)
    }

    /// Writes `value` through an l-value slot, releasing the previous value.
    ///
    /// Fails without taking ownership side effects beyond releasing `value`
    /// when the slot is stale.
    pub fn write_slot(
        &mut self,
        heap: &mut Heap<impl ResourceTracker>,
        slot: DictSlot,
        value: Value,
    ) -> RunResult<()> {
        if slot.generation != self.generation {
            value.drop_with_heap(heap);
            return Err(RunError::mutated_during_iteration());
        }
        let old = std::mem::replace(&mut self.entries[slot.index].value, value);
        old.drop_with_heap(heap);
        Ok(())
    }

    /// Removes the entry for `key`, releasing the stored key and value.
    /// Structural. Returns whether an entry existed.
    pub fn remove(&mut self, heap: &mut Heap<impl ResourceTracker>, key: &Value) -> bool {
        let Some(index) = self.find(heap, key) else {
            return false;
        };
        let entry = self.entries.remove(index);
        entry.key.drop_with_heap(heap);
        entry.value.drop_with_heap(heap);
        self.generation += 1;
        true
    }

    /// Releases every entry and empties the dict. Structural; this is also
    /// the operation that breaks reference cycles through the dict.
    pub fn clear(&mut self, heap: &mut Heap<impl ResourceTracker>) {
        for entry in self.entries.drain(..) {
            entry.key.drop_with_heap(heap);
            entry.value.drop_with_heap(heap);
        }
        self.generation += 1;
    }

    pub(crate) fn dec_ref_ids(&self, out: &mut SmallVec<[HeapId; 8]>) {
        for entry in &self.entries {
            if let Value::Ref(id) = entry.key {
                out.push(id);
            }
            if let Value::Ref(id) = entry.value {
                out.push(id);
            }
        }
    }

    pub(crate) fn estimate_size(&self) -> usize {
        self.entries.len() * std::mem::size_of::<DictEntry>()
    }
}

/// Returns the entry for `key` in the dict object, or `None` when absent.
/// The entry borrows from the heap and is released by any mutation.
pub fn dict_lookup<'h>(
    heap: &'h Heap<impl ResourceTracker>,
    dict: HeapId,
    key: &Value,
) -> RunResult<Option<&'h DictEntry>> {
    match heap.get(dict) {
        HeapData::Dict(data) => Ok(data.lookup(heap, key)),
        other => Err(RunError::type_error(format!(
            "cannot key into a {}",
            other.type_name()
        ))),
    }
}

/// Inserts or replaces `key` in the dict object; see [`Dict::set`].
pub fn dict_set(
    heap: &mut Heap<impl ResourceTracker>,
    dict: HeapId,
    key: Value,
    value: Value,
) -> RunResult<DictSlot> {
    if !matches!(heap.get(dict), HeapData::Dict(_)) {
        let name = heap.get(dict).type_name();
        key.drop_with_heap(heap);
        value.drop_with_heap(heap);
        return Err(RunError::type_error(format!("cannot key into a {name}")));
    }
    heap.with_entry_mut(dict, |heap, data| {
        let HeapData::Dict(data) = data else {
            unreachable!("type tag checked above");
        };
        data.set(heap, key, value)
    })
}

/// Writes through an l-value slot of the dict object; see [`Dict::write_slot`].
pub fn dict_write_slot(
    heap: &mut Heap<impl ResourceTracker>,
    dict: HeapId,
    slot: DictSlot,
    value: Value,
) -> RunResult<()> {
    if !matches!(heap.get(dict), HeapData::Dict(_)) {
        let name = heap.get(dict).type_name();
        value.drop_with_heap(heap);
        return Err(RunError::type_error(format!("cannot key into a {name}")));
    }
    heap.with_entry_mut(dict, |heap, data| {
        let HeapData::Dict(data) = data else {
            unreachable!("type tag checked above");
        };
        data.write_slot(heap, slot, value)
    })
}

/// Removes `key` from the dict object; see [`Dict::remove`].
pub fn dict_remove(
    heap: &mut Heap<impl ResourceTracker>,
    dict: HeapId,
    key: &Value,
) -> RunResult<bool> {
    if !matches!(heap.get(dict), HeapData::Dict(_)) {
        return Err(RunError::type_error(format!(
            "cannot key into a {}",
            heap.get(dict).type_name()
        )));
    }
    Ok(heap.with_entry_mut(dict, |heap, data| {
        let HeapData::Dict(data) = data else {
            unreachable!("type tag checked above");
        };
        data.remove(heap, key)
    }))
}

/// Releases every entry of the dict object and empties it.
pub fn dict_clear(heap: &mut Heap<impl ResourceTracker>, dict: HeapId) -> RunResult<()> {
    if !matches!(heap.get(dict), HeapData::Dict(_)) {
        return Err(RunError::type_error(format!(
            "cannot clear a {}",
            heap.get(dict).type_name()
        )));
    }
    heap.with_entry_mut(dict, |heap, data| {
        let HeapData::Dict(data) = data else {
            unreachable!("type tag checked above");
        };
        data.clear(heap);
    });
    Ok(())
}

/// Inserts every entry of `addition` into `destination` in place with
/// insert-or-replace semantics per key; `addition` is unchanged. The
/// destructive `+` operator on dicts.
///
/// Newly introduced keys keep the source's order and bump the destination's
/// generation once each; existing keys retain their position and only have
/// their values replaced. The growth budget for the new keys is checked
/// before anything is inserted.
pub fn dict_add(
    heap: &mut Heap<impl ResourceTracker>,
    destination: HeapId,
    addition: HeapId,
) -> RunResult<()> {
    let count = match heap.get(addition) {
        HeapData::Dict(source) => source.len(),
        other => {
            return Err(RunError::type_error(format!(
                "cannot add a {} to a dict",
                other.type_name()
            )));
        }
    };
    if !matches!(heap.get(destination), HeapData::Dict(_)) {
        return Err(RunError::type_error(format!(
            "cannot add a dict to a {}",
            heap.get(destination).type_name()
        )));
    }

    // Snapshot with added references first so `d += d` reads a stable source.
    let mut pairs = Vec::with_capacity(count);
    let mut new_keys = 0usize;
    {
        let HeapData::Dict(source) = heap.get(addition) else {
            unreachable!("type tag checked above");
        };
        let HeapData::Dict(dest) = heap.get(destination) else {
            unreachable!("type tag checked above");
        };
        for entry in source.entries() {
            if dest.find(heap, entry.key()).is_none() {
                new_keys += 1;
            }
            pairs.push((
                entry.key().clone_with_heap(heap),
                entry.value().clone_with_heap(heap),
            ));
        }
    }

    for _ in 0..new_keys {
        if let Err(err) = heap.container_insert_check() {
            for (key, value) in pairs {
                key.drop_with_heap(heap);
                value.drop_with_heap(heap);
            }
            return Err(err.into());
        }
    }

    heap.with_entry_mut(destination, |heap, data| {
        let HeapData::Dict(data) = data else {
            unreachable!("type tag checked above");
        };
        for (key, value) in pairs {
            data.set_prechecked(heap, key, value);
        }
    });
    Ok(())
}
