//! The calling convention between scripted code and compiled host routines.
//!
//! A host routine is registered once with a name, a parameter-name list, and
//! a pointer-sized opaque context word; scripted code reaches it through a
//! function object whose body carries the routine's id. Invocation hands the
//! routine a [`HostCall`] — the interpreter handle through which it reads
//! its arguments, allocates results, and writes output. On success the
//! routine returns a value owned by the caller; on failure it returns a
//! [`RunError`] whose `host-error` status code is surfaced unchanged, and no
//! result exists.

use ahash::AHashMap;

use crate::{
    args::ArgValues,
    error::{RunError, RunResult},
    heap::{DropWithHeap, Heap, HeapData},
    io::PrintWriter,
    resource::ResourceTracker,
    script::{NodeHandle, ScriptId},
    types::{ChalkTrait, FunctionBody},
    value::{Value, create_function, create_string},
};

/// Identifier of a routine registered in a [`HostRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostFunctionId(usize);

impl HostFunctionId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// The interpreter handle a host routine receives for the duration of one
/// call: the heap, the print sink, the call's arguments, and the opaque
/// context the routine was registered with.
pub struct HostCall<'a, T: ResourceTracker> {
    pub heap: &'a mut Heap<T>,
    pub writer: &'a mut dyn PrintWriter,
    args: ArgValues,
    context: usize,
}

impl<'a, T: ResourceTracker> HostCall<'a, T> {
    pub fn new(
        heap: &'a mut Heap<T>,
        writer: &'a mut dyn PrintWriter,
        args: ArgValues,
        context: usize,
    ) -> Self {
        Self {
            heap,
            writer,
            args,
            context,
        }
    }

    /// The pointer-sized context word registered with the routine.
    pub fn context(&self) -> usize {
        self.context
    }

    /// Takes ownership of the call's arguments. The routine must release
    /// every value it takes, on success and failure paths alike.
    pub fn take_args(&mut self) -> ArgValues {
        std::mem::replace(&mut self.args, ArgValues::Empty)
    }
}

/// A compiled routine reachable from scripted code.
///
/// Implemented for any `Fn(&mut HostCall<T>) -> RunResult<Value>` closure.
pub trait HostRoutine<T: ResourceTracker> {
    fn invoke(&self, call: &mut HostCall<'_, T>) -> RunResult<Value>;
}

impl<T: ResourceTracker, F> HostRoutine<T> for F
where
    F: Fn(&mut HostCall<'_, T>) -> RunResult<Value>,
{
    fn invoke(&self, call: &mut HostCall<'_, T>) -> RunResult<Value> {
        self(call)
    }
}

struct RegisteredRoutine<T: ResourceTracker> {
    name: String,
    params: Vec<String>,
    routine: Box<dyn HostRoutine<T>>,
}

/// The set of host routines an interpreter exposes to scripts.
///
/// Routines are stored in registration order; a name maps to the most
/// recent registration under it.
pub struct HostRegistry<T: ResourceTracker> {
    routines: Vec<RegisteredRoutine<T>>,
    by_name: AHashMap<String, HostFunctionId>,
}

impl<T: ResourceTracker> Default for HostRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ResourceTracker> HostRegistry<T> {
    pub fn new() -> Self {
        Self {
            routines: Vec::new(),
            by_name: AHashMap::new(),
        }
    }

    /// Registers a routine under `name` with the given parameter names.
    pub fn register(
        &mut self,
        name: &str,
        params: &[&str],
        routine: impl HostRoutine<T> + 'static,
    ) -> HostFunctionId {
        let id = HostFunctionId(self.routines.len());
        self.routines.push(RegisteredRoutine {
            name: name.to_owned(),
            params: params.iter().map(|&p| p.to_owned()).collect(),
            routine: Box::new(routine),
        });
        self.by_name.insert(name.to_owned(), id);
        id
    }

    /// Looks up a routine id by name.
    pub fn lookup(&self, name: &str) -> Option<HostFunctionId> {
        self.by_name.get(name).copied()
    }

    /// The name a routine was registered under.
    ///
    /// # Panics
    /// Panics if the id did not come from this registry.
    pub fn name(&self, id: HostFunctionId) -> &str {
        &self.routines[id.index()].name
    }

    /// The parameter names a routine was registered with.
    ///
    /// # Panics
    /// Panics if the id did not come from this registry.
    pub fn params(&self, id: HostFunctionId) -> impl Iterator<Item = &str> {
        self.routines[id.index()].params.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }

    /// Dispatches to a registered routine.
    ///
    /// # Panics
    /// Panics if the id did not come from this registry.
    pub fn invoke(&self, id: HostFunctionId, call: &mut HostCall<'_, T>) -> RunResult<Value> {
        self.routines[id.index()].routine.invoke(call)
    }
}

impl<T: ResourceTracker> std::fmt::Debug for HostRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostRegistry")
            .field("routines", &self.routines.iter().map(|r| &r.name).collect::<Vec<_>>())
            .finish()
    }
}

/// The result of invoking a function object.
#[derive(Debug)]
pub enum CallOutcome {
    /// A host routine ran to completion; the value is owned by the caller.
    Completed(Value),
    /// The function has a scripted body: the evaluator walks `body` within
    /// the owning script's environment, binding `args` positionally.
    Scripted {
        body: NodeHandle,
        script: ScriptId,
        args: ArgValues,
    },
}

/// Invokes a function object uniformly.
///
/// A host body dispatches synchronously through the registry; a scripted
/// body is handed back with its arguments for the evaluator to walk. Calling
/// anything that is not a function releases the arguments and fails with
/// `type-error`.
pub fn call_function<T: ResourceTracker>(
    registry: &HostRegistry<T>,
    heap: &mut Heap<T>,
    writer: &mut dyn PrintWriter,
    function: &Value,
    args: ArgValues,
) -> RunResult<CallOutcome> {
    let body = match function {
        Value::Ref(id) => match heap.get(*id) {
            HeapData::Function(f) => f.body(),
            other => {
                let name = other.type_name();
                args.drop_with_heap(heap);
                return Err(RunError::type_error(format!("a {name} is not callable")));
            }
        },
        other => {
            let name = other.ck_type(heap).name();
            args.drop_with_heap(heap);
            return Err(RunError::type_error(format!("a {name} is not callable")));
        }
    };
    match body {
        FunctionBody::Host { routine, context } => {
            let mut call = HostCall::new(heap, writer, args, context);
            let value = registry.invoke(routine, &mut call)?;
            Ok(CallOutcome::Completed(value))
        }
        FunctionBody::Scripted { body, script } => Ok(CallOutcome::Scripted {
            body,
            script,
            args,
        }),
    }
}

/// Builds a function object bound to a registered host routine.
///
/// The parameter-name list is materialized from the registration as a list
/// of strings; `context` is stored alongside the routine id.
pub fn create_host_function<T: ResourceTracker>(
    heap: &mut Heap<T>,
    registry: &HostRegistry<T>,
    routine: HostFunctionId,
    context: usize,
) -> RunResult<Value> {
    let names: Vec<String> = registry.params(routine).map(str::to_owned).collect();
    let mut params = Vec::with_capacity(names.len());
    for name in &names {
        match create_string(heap, name.as_bytes()) {
            Ok(value) => params.push(value),
            Err(err) => {
                params.drop_with_heap(heap);
                return Err(err);
            }
        }
    }
    let param_list = crate::value::create_list(heap, &params);
    params.drop_with_heap(heap);
    let param_list = param_list?;
    let function = create_function(
        heap,
        &param_list,
        FunctionBody::Host { routine, context },
    );
    param_list.drop_with_heap(heap);
    function
}
