use crate::{heap::Heap, resource::ResourceTracker, types::Type};

/// Common operations every runtime value supports.
///
/// Implemented by both [`Value`](crate::value::Value) (immediate values
/// dispatch directly, heap values through the arena) and
/// [`HeapData`](crate::heap::HeapData). Methods take the heap because a
/// value may need to follow heap references to answer.
pub trait ChalkTrait {
    /// The dynamic type tag of this value.
    fn ck_type(&self, heap: &Heap<impl ResourceTracker>) -> Type;

    /// Boolean coercion: false for null, zero, and empty aggregates;
    /// true otherwise. A reference cell coerces as its target.
    fn ck_bool(&self, heap: &Heap<impl ResourceTracker>) -> bool;

    /// The length of this value: byte length for strings, element count for
    /// lists, entry count for dicts. `None` for everything else.
    fn ck_len(&self, heap: &Heap<impl ResourceTracker>) -> Option<usize>;

    /// Approximate heap footprint in bytes, used for resource accounting.
    fn ck_estimate_size(&self) -> usize;
}
