//! Implementation of the print() builtin.

use crate::{
    error::RunResult,
    host::HostCall,
    resource::ResourceTracker,
    value::{Value, render},
};

/// Renders each argument at depth 0, separated by single spaces and
/// terminated by a newline. Returns null.
///
/// The whole call is rendered into one buffer before anything is written,
/// so a print is atomic with respect to the output sink.
pub fn builtin_print<T: ResourceTracker>(call: &mut HostCall<'_, T>) -> RunResult<Value> {
    let args = call.take_args();
    let mut output = Vec::new();
    let mut first = true;
    for value in args {
        if first {
            first = false;
        } else {
            output.push(b' ');
        }
        render(call.heap, &value, 0, &mut output);
        value.drop_with_heap(call.heap);
    }
    output.push(b'\n');
    call.writer.write_all(&output)?;
    Ok(Value::Null)
}
