//! Implementation of the get() builtin.

use crate::{
    error::{RunError, RunResult},
    heap::{DropWithHeap, HeapData},
    host::HostCall,
    resource::ResourceTracker,
    types::ChalkTrait,
    value::Value,
};

/// `get(dict, key, default = null)`: the value stored under `key` with a
/// reference added, or the default when the key is absent. The first
/// argument must be a dict.
pub fn builtin_get<T: ResourceTracker>(call: &mut HostCall<'_, T>) -> RunResult<Value> {
    let args = call.take_args();
    let (dict, key, default) = args.get_two_three_args("get", call.heap)?;

    let Value::Ref(id) = &dict else {
        let name = dict.ck_type(call.heap).name();
        dict.drop_with_heap(call.heap);
        key.drop_with_heap(call.heap);
        default.drop_with_heap(call.heap);
        return Err(RunError::type_error(format!(
            "get() takes a dict, not a {name}"
        )));
    };
    let found = match call.heap.get(*id) {
        HeapData::Dict(data) => data
            .lookup(call.heap, &key)
            .map(|entry| entry.value().clone_with_heap(call.heap)),
        other => {
            let name = other.type_name();
            dict.drop_with_heap(call.heap);
            key.drop_with_heap(call.heap);
            default.drop_with_heap(call.heap);
            return Err(RunError::type_error(format!(
                "get() takes a dict, not a {name}"
            )));
        }
    };

    dict.drop_with_heap(call.heap);
    key.drop_with_heap(call.heap);
    match found {
        Some(value) => {
            default.drop_with_heap(call.heap);
            Ok(value)
        }
        None => Ok(default.unwrap_or(Value::Null)),
    }
}
