//! Implementation of the len() builtin.

use crate::{
    error::{RunError, RunResult},
    host::HostCall,
    resource::ResourceTracker,
    types::ChalkTrait,
    value::Value,
};

/// Returns the byte length of a string, the element count of a list, or the
/// entry count of a dict. Anything else is a `type-error`.
pub fn builtin_len<T: ResourceTracker>(call: &mut HostCall<'_, T>) -> RunResult<Value> {
    let args = call.take_args();
    let value = args.get_one_arg("len", call.heap)?;
    let result = match value.ck_len(call.heap) {
        Some(len) => Ok(Value::Int(len as i64)),
        None => Err(RunError::type_error(format!(
            "len() takes a string, list, or dict, not a {}",
            value.ck_type(call.heap)
        ))),
    };
    value.drop_with_heap(call.heap);
    result
}
