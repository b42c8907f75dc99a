//! Iteration over lists and dicts with change detection.
//!
//! Both aggregates share one context shape: a cursor plus the aggregate's
//! generation captured at init. Advancing validates the generation first, so
//! a structural mutation between steps fails cleanly instead of walking a
//! changed aggregate. Index-based state (rather than a Rust iterator) keeps
//! the context decoupled from heap borrows between steps.
//!
//! Yielded values are borrowed from the heap with no reference count added;
//! the borrow ends at the next heap mutation. The context itself borrows the
//! aggregate: the caller keeps the aggregate alive for the iteration's
//! duration, and dropping the context ends the iteration.

use crate::{
    error::{RunError, RunResult},
    heap::{Heap, HeapData, HeapId},
    resource::ResourceTracker,
    value::Value,
};

/// Iteration state over a list or dict.
#[derive(Debug)]
pub struct AggregateIter {
    target: HeapId,
    index: usize,
    generation: u64,
}

/// Prepares to iterate over the given aggregate.
///
/// Lists yield their elements in positional order; dicts yield their keys in
/// insertion order. Anything else is a `type-error`.
pub fn init_iterator(
    heap: &Heap<impl ResourceTracker>,
    aggregate: HeapId,
) -> RunResult<AggregateIter> {
    let generation = match heap.get(aggregate) {
        HeapData::List(list) => list.generation(),
        HeapData::Dict(dict) => dict.generation(),
        other => {
            return Err(RunError::type_error(format!(
                "cannot iterate over a {}",
                other.type_name()
            )));
        }
    };
    Ok(AggregateIter {
        target: aggregate,
        index: 0,
        generation,
    })
}

impl AggregateIter {
    /// The aggregate this context iterates over.
    pub fn target(&self) -> HeapId {
        self.target
    }

    /// Retrieves the next element (list) or key (dict), or `None` at the
    /// end. Fails with `mutated-during-iteration` when the aggregate was
    /// structurally mutated since the iterator was initialized.
    ///
    /// The returned value is borrowed; no reference is added.
    pub fn advance<'h>(
        &mut self,
        heap: &'h Heap<impl ResourceTracker>,
    ) -> RunResult<Option<&'h Value>> {
        match heap.get(self.target) {
            HeapData::List(list) => {
                if list.generation() != self.generation {
                    return Err(RunError::mutated_during_iteration());
                }
                let item = list.items().get(self.index);
                if item.is_some() {
                    self.index += 1;
                }
                Ok(item)
            }
            HeapData::Dict(dict) => {
                if dict.generation() != self.generation {
                    return Err(RunError::mutated_during_iteration());
                }
                let key = dict.entries().get(self.index).map(super::DictEntry::key);
                if key.is_some() {
                    self.index += 1;
                }
                Ok(key)
            }
            other => Err(RunError::type_error(format!(
                "cannot iterate over a {}",
                other.type_name()
            ))),
        }
    }
}
