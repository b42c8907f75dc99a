use smallvec::SmallVec;

use crate::{
    heap::HeapId,
    host::HostFunctionId,
    script::{NodeHandle, ScriptId},
    value::Value,
};

/// What runs when a function is called: a parse-tree body the evaluator
/// walks, or a compiled host routine. Exactly one, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionBody {
    /// A scripted body. The node handle is borrowed from the owning script
    /// and must not outlive it; destroying the function does not free it.
    Scripted { body: NodeHandle, script: ScriptId },
    /// A registered host routine plus the pointer-sized opaque context it
    /// was registered with.
    Host { routine: HostFunctionId, context: usize },
}

/// A callable value: a parameter-name list plus a body.
///
/// The parameter list is a list-of-strings object the function holds one
/// strong reference on. Parameters are bound positionally at call time.
#[derive(Debug)]
pub struct Function {
    params: Value,
    body: FunctionBody,
}

impl Function {
    /// Assembles a function from a parameter list the caller already owns.
    /// Public construction goes through
    /// [`create_function`](crate::value::create_function), which retains the
    /// list on the caller's behalf.
    pub(crate) fn from_parts(params: Value, body: FunctionBody) -> Self {
        Self { params, body }
    }

    /// The parameter-name list object.
    #[inline]
    pub fn params(&self) -> &Value {
        &self.params
    }

    #[inline]
    pub fn body(&self) -> FunctionBody {
        self.body
    }

    /// True when calling this function dispatches to a host routine.
    pub fn is_host(&self) -> bool {
        matches!(self.body, FunctionBody::Host { .. })
    }

    pub(crate) fn dec_ref_ids(&self, out: &mut SmallVec<[HeapId; 8]>) {
        if let Value::Ref(id) = self.params {
            out.push(id);
        }
    }

    pub(crate) fn estimate_size(&self) -> usize {
        0
    }
}
