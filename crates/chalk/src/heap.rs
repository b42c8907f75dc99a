use std::{cell::Cell as RefCount, collections::BTreeMap};

use smallvec::SmallVec;

use crate::{
    resource::{ResourceError, ResourceTracker},
    types::{ChalkTrait, Dict, Function, List, Reference, Str, Type},
};

/// Unique identifier for values stored inside the heap arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapId(usize);

impl HeapId {
    /// Returns the raw slot index. Function comparison uses this as the
    /// pointer-identity integer.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Every heap-resident value representation.
///
/// Immediate values (null, integers) live inline in
/// [`Value`](crate::value::Value); everything with interior structure or
/// identity lives here, behind a [`HeapId`].
#[derive(Debug)]
pub enum HeapData {
    Str(Str),
    List(List),
    Dict(Dict),
    Function(Function),
    /// Internal l-value box; see [`Reference`].
    Reference(Reference),
}

impl HeapData {
    /// The dynamic type tag of this payload. Immutable for the value's
    /// whole lifetime.
    pub fn type_of(&self) -> Type {
        match self {
            Self::Str(_) => Type::String,
            Self::List(_) => Type::List,
            Self::Dict(_) => Type::Dict,
            Self::Function(_) => Type::Function,
            Self::Reference(_) => Type::Reference,
        }
    }

    /// The canonical type name, e.g. for error messages.
    pub fn type_name(&self) -> &'static str {
        self.type_of().name()
    }

    /// Consumes the payload, releasing every reference it holds. Used when a
    /// payload built for allocation never makes it into the arena.
    fn reclaim(self, heap: &mut Heap<impl ResourceTracker>) {
        let mut child_ids = SmallVec::<[HeapId; 8]>::new();
        self.dec_ref_ids(&mut child_ids);
        drop(self);
        for child_id in child_ids {
            heap.dec_ref(child_id);
        }
    }

    /// Collects the heap ids of every value this payload holds a reference
    /// on, for release when the payload dies.
    fn dec_ref_ids(&self, out: &mut SmallVec<[HeapId; 8]>) {
        match self {
            Self::Str(_) => {}
            Self::List(list) => list.dec_ref_ids(out),
            Self::Dict(dict) => dict.dec_ref_ids(out),
            Self::Function(function) => function.dec_ref_ids(out),
            Self::Reference(reference) => reference.dec_ref_ids(out),
        }
    }
}

impl ChalkTrait for HeapData {
    fn ck_type(&self, _heap: &Heap<impl ResourceTracker>) -> Type {
        self.type_of()
    }

    fn ck_bool(&self, heap: &Heap<impl ResourceTracker>) -> bool {
        match self {
            Self::Str(s) => !s.is_empty(),
            Self::List(list) => !list.is_empty(),
            Self::Dict(dict) => !dict.is_empty(),
            Self::Function(_) => true,
            Self::Reference(reference) => reference.value().ck_bool(heap),
        }
    }

    fn ck_len(&self, heap: &Heap<impl ResourceTracker>) -> Option<usize> {
        match self {
            Self::Str(s) => Some(s.len()),
            Self::List(list) => Some(list.len()),
            Self::Dict(dict) => Some(dict.len()),
            Self::Function(_) => None,
            Self::Reference(reference) => reference.value().ck_len(heap),
        }
    }

    fn ck_estimate_size(&self) -> usize {
        let payload = match self {
            Self::Str(s) => s.estimate_size(),
            Self::List(list) => list.estimate_size(),
            Self::Dict(dict) => dict.estimate_size(),
            Self::Function(function) => function.estimate_size(),
            Self::Reference(reference) => reference.estimate_size(),
        };
        std::mem::size_of::<Self>() + payload
    }
}

/// One arena slot: the reference count and the payload.
///
/// The count uses interior mutability so sharing a value (`inc_ref`) only
/// needs shared access to the heap; the runtime is single-threaded by
/// contract, so a plain non-atomic counter is sufficient.
///
/// The payload is an `Option` to support temporary borrowing: when
/// `with_entry_mut` needs mutable access to both the payload and the heap,
/// it takes the payload out (leaving `None`), passes `&mut Heap` to the
/// caller, then restores it.
#[derive(Debug)]
struct HeapValue {
    refcount: RefCount<usize>,
    data: Option<HeapData>,
}

/// Snapshot of heap state at a point in time.
///
/// Captures object counts and per-type breakdowns for monitoring heap
/// growth. The `objects_by_type` map uses `BTreeMap` for deterministic
/// iteration order, making snapshots suitable for display and comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapStats {
    /// Total number of live objects on the heap.
    pub live_objects: usize,
    /// Number of free (recycled) slots available for reuse.
    pub free_slots: usize,
    /// Total heap capacity (live + free).
    pub total_slots: usize,
    /// Breakdown of live objects by type name.
    pub objects_by_type: BTreeMap<&'static str, usize>,
    /// Resource tracker allocation count, if the tracker records one.
    pub tracker_allocations: Option<usize>,
    /// Resource tracker memory usage in bytes, if the tracker records one.
    pub tracker_memory_bytes: Option<usize>,
}

/// Reference-counted arena that backs all heap-only runtime values.
///
/// Uses a free list to reuse slots from freed values, keeping memory usage
/// constant for workloads that repeatedly allocate and free. When a value is
/// freed via `dec_ref`, its slot id joins the free list; new allocations pop
/// from it when available, otherwise append.
///
/// Generic over `T: ResourceTracker`; with
/// [`NoLimitTracker`](crate::resource::NoLimitTracker) all resource checks
/// compile away to no-ops.
#[derive(Debug)]
pub struct Heap<T: ResourceTracker> {
    entries: Vec<Option<HeapValue>>,
    /// Ids of freed slots available for reuse. Populated by `dec_ref`,
    /// consumed by `allocate`.
    free_list: Vec<HeapId>,
    tracker: T,
}

impl Heap<crate::resource::NoLimitTracker> {
    /// Creates an unrestricted heap.
    pub fn new() -> Self {
        Self::with_tracker(crate::resource::NoLimitTracker)
    }
}

impl Default for Heap<crate::resource::NoLimitTracker> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ResourceTracker> Heap<T> {
    /// Creates a heap governed by the given resource tracker.
    pub fn with_tracker(tracker: T) -> Self {
        Self {
            entries: Vec::new(),
            free_list: Vec::new(),
            tracker,
        }
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Allocates a new heap entry with a reference count of 1.
    ///
    /// Returns `Err(ResourceError)` if the allocation would exceed the
    /// tracker's configured limits; a rejected payload has the references it
    /// holds released, so constructor failures never leak.
    pub fn allocate(&mut self, data: HeapData) -> Result<HeapId, ResourceError> {
        if let Err(err) = self.tracker.on_allocate(|| data.ck_estimate_size()) {
            data.reclaim(self);
            return Err(err);
        }
        let new_entry = HeapValue {
            refcount: RefCount::new(1),
            data: Some(data),
        };
        let id = if let Some(id) = self.free_list.pop() {
            self.entries[id.index()] = Some(new_entry);
            id
        } else {
            let id = HeapId(self.entries.len());
            self.entries.push(Some(new_entry));
            id
        };
        Ok(id)
    }

    /// Checks the growth budget for inserting one item into an existing
    /// aggregate.
    pub(crate) fn container_insert_check(&mut self) -> Result<(), ResourceError> {
        self.tracker.on_container_insert()
    }

    /// Increments the reference count for an existing heap entry (retain).
    ///
    /// Interior mutability on the count means only shared access to the heap
    /// is required, which avoids borrow conflicts while reading values.
    ///
    /// # Panics
    /// Panics if the id is invalid or the value has already been freed.
    pub fn inc_ref(&self, id: HeapId) {
        let entry = self
            .entries
            .get(id.index())
            .expect("Heap::inc_ref: slot missing")
            .as_ref()
            .expect("Heap::inc_ref: object already freed");
        entry.refcount.set(entry.refcount.get() + 1);
    }

    /// Decrements the reference count and frees the value once it hits zero
    /// (release).
    ///
    /// A freed value releases the one reference it held on each contained
    /// value, recursively, and its slot joins the free list for reuse.
    ///
    /// # Panics
    /// Panics if the id is invalid or the value has already been freed.
    pub fn dec_ref(&mut self, id: HeapId) {
        let value = {
            let slot = self
                .entries
                .get_mut(id.index())
                .expect("Heap::dec_ref: slot missing");
            let entry = slot.as_mut().expect("Heap::dec_ref: object already freed");
            let count = entry.refcount.get();
            if count > 1 {
                entry.refcount.set(count - 1);
                return;
            }
            slot.take().expect("Heap::dec_ref: object already freed")
        };

        self.free_list.push(id);

        if let Some(data) = value.data {
            self.tracker.on_free(|| data.ck_estimate_size());
            let mut child_ids = SmallVec::<[HeapId; 8]>::new();
            data.dec_ref_ids(&mut child_ids);
            drop(data);
            for child_id in child_ids {
                self.dec_ref(child_id);
            }
        }
    }

    /// Returns an immutable reference to the heap data stored at the given id.
    ///
    /// # Panics
    /// Panics if the id is invalid, the value has already been freed, or the
    /// data is currently borrowed via `with_entry_mut`.
    #[must_use]
    pub fn get(&self, id: HeapId) -> &HeapData {
        self.entries
            .get(id.index())
            .expect("Heap::get: slot missing")
            .as_ref()
            .expect("Heap::get: object already freed")
            .data
            .as_ref()
            .expect("Heap::get: data currently borrowed")
    }

    /// Returns heap data if the slot is live, `None` otherwise.
    #[must_use]
    pub fn get_if_live(&self, id: HeapId) -> Option<&HeapData> {
        self.entries.get(id.index())?.as_ref()?.data.as_ref()
    }

    /// Returns a mutable reference to the heap data stored at the given id.
    ///
    /// # Panics
    /// Panics if the id is invalid, the value has already been freed, or the
    /// data is currently borrowed via `with_entry_mut`.
    pub fn get_mut(&mut self, id: HeapId) -> &mut HeapData {
        self.entries
            .get_mut(id.index())
            .expect("Heap::get_mut: slot missing")
            .as_mut()
            .expect("Heap::get_mut: object already freed")
            .data
            .as_mut()
            .expect("Heap::get_mut: data currently borrowed")
    }

    /// Returns mutable heap data if the slot is live, `None` otherwise.
    #[must_use]
    pub fn get_mut_if_live(&mut self, id: HeapId) -> Option<&mut HeapData> {
        self.entries.get_mut(id.index())?.as_mut()?.data.as_mut()
    }

    /// The current reference count for a live heap value, or 0 when freed.
    pub fn refcount(&self, id: HeapId) -> usize {
        self.entries
            .get(id.index())
            .and_then(Option::as_ref)
            .map_or(0, |entry| entry.refcount.get())
    }

    /// Runs `f` with mutable access to both the heap and the payload at
    /// `id`, by temporarily taking the payload out of its slot.
    ///
    /// This is how aggregate mutations that need the heap (releasing
    /// replaced values, comparing keys) get both borrows at once. While `f`
    /// runs, accessing the borrowed slot through the heap panics, and the
    /// caller must not release the aggregate's last reference.
    pub fn with_entry_mut<R>(
        &mut self,
        id: HeapId,
        f: impl FnOnce(&mut Self, &mut HeapData) -> R,
    ) -> R {
        let mut data = self
            .entries
            .get_mut(id.index())
            .expect("Heap::with_entry_mut: slot missing")
            .as_mut()
            .expect("Heap::with_entry_mut: object already freed")
            .data
            .take()
            .expect("Heap::with_entry_mut: data currently borrowed");
        let result = f(self, &mut data);
        let slot = self
            .entries
            .get_mut(id.index())
            .expect("Heap::with_entry_mut: slot missing")
            .as_mut()
            .expect("Heap::with_entry_mut: object freed during borrow");
        slot.data = Some(data);
        result
    }

    /// Takes a snapshot of heap state.
    pub fn stats(&self) -> HeapStats {
        let mut objects_by_type = BTreeMap::new();
        let mut live_objects = 0;
        for entry in self.entries.iter().flatten() {
            live_objects += 1;
            if let Some(data) = &entry.data {
                *objects_by_type.entry(data.type_name()).or_insert(0) += 1;
            }
        }
        HeapStats {
            live_objects,
            free_slots: self.free_list.len(),
            total_slots: self.entries.len(),
            objects_by_type,
            tracker_allocations: self.tracker.allocation_count(),
            tracker_memory_bytes: self.tracker.current_memory_bytes(),
        }
    }
}

/// Releases every reference a composite value owns.
///
/// Implemented by owners of counted values ([`Value`](crate::value::Value),
/// argument bundles, plain collections) so error paths can unwind without
/// leaking references.
pub trait DropWithHeap {
    fn drop_with_heap(self, heap: &mut Heap<impl ResourceTracker>);
}

impl<V: DropWithHeap> DropWithHeap for Vec<V> {
    fn drop_with_heap(self, heap: &mut Heap<impl ResourceTracker>) {
        for value in self {
            value.drop_with_heap(heap);
        }
    }
}

impl<V: DropWithHeap> DropWithHeap for Option<V> {
    fn drop_with_heap(self, heap: &mut Heap<impl ResourceTracker>) {
        if let Some(value) = self {
            value.drop_with_heap(heap);
        }
    }
}
