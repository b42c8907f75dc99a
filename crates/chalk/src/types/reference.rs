use smallvec::SmallVec;

use crate::{
    heap::{Heap, HeapId},
    resource::ResourceTracker,
    value::Value,
};

/// The internal reference variant: an assignable storage cell.
///
/// The evaluator models l-values (`a[b] = c`, `d.k += 1`) as cells pointing
/// at the stored value. A cell holds one strong reference on its target,
/// released when the cell is destroyed. Cells are never visible to scripts:
/// boolean coercion, comparison, and printing all see through to the target.
#[derive(Debug)]
pub struct Reference {
    value: Value,
}

impl Reference {
    /// Wraps a target the caller already owns; no reference is added here.
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Replaces the target, releasing the previous one. Takes ownership of
    /// the new value.
    pub fn set(&mut self, heap: &mut Heap<impl ResourceTracker>, value: Value) {
        let old = std::mem::replace(&mut self.value, value);
        old.drop_with_heap(heap);
    }

    pub(crate) fn dec_ref_ids(&self, out: &mut SmallVec<[HeapId; 8]>) {
        if let Value::Ref(id) = self.value {
            out.push(id);
        }
    }

    pub(crate) fn estimate_size(&self) -> usize {
        0
    }
}
