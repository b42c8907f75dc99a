//! The interpreter-native builtin functions.
//!
//! Each builtin has its own submodule; the [`Builtin`] enum names them and
//! [`register_builtins`] wires them into a host registry. Together the three
//! builtins exercise every object kind the runtime supports.

mod get;
mod len;
mod print;

pub use get::builtin_get;
pub use len::builtin_len;
pub use print::builtin_print;

use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    error::{RunError, RunResult},
    heap::Heap,
    host::{HostCall, HostRegistry, create_host_function},
    resource::ResourceTracker,
    value::Value,
};

/// The builtin functions every interpreter instance provides.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and
/// `Into<&'static str>` implementations; variants serialize to lowercase,
/// matching the names scripts call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Builtin {
    Print,
    Len,
    Get,
}

impl Builtin {
    pub const ALL: [Self; 3] = [Self::Print, Self::Len, Self::Get];

    /// The name scripts use to call this builtin.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// The parameter names registered for this builtin's function object.
    pub fn params(self) -> &'static [&'static str] {
        match self {
            Self::Print => &["values"],
            Self::Len => &["object"],
            Self::Get => &["dict", "key", "default"],
        }
    }

    /// Dispatches a call to this builtin.
    pub fn call<T: ResourceTracker>(self, call: &mut HostCall<'_, T>) -> RunResult<Value> {
        match self {
            Self::Print => builtin_print(call),
            Self::Len => builtin_len(call),
            Self::Get => builtin_get(call),
        }
    }
}

/// Registers every builtin into the given registry.
pub fn register_builtins<T: ResourceTracker>(registry: &mut HostRegistry<T>) {
    for builtin in Builtin::ALL {
        registry.register(builtin.name(), builtin.params(), move |call: &mut HostCall<'_, T>| {
            builtin.call(call)
        });
    }
}

/// Builds the function object for a builtin, which must already be
/// registered (see [`register_builtins`]).
pub fn create_builtin_function<T: ResourceTracker>(
    heap: &mut Heap<T>,
    registry: &HostRegistry<T>,
    builtin: Builtin,
) -> RunResult<Value> {
    let id = registry.lookup(builtin.name()).ok_or_else(|| {
        RunError::type_error(format!("builtin '{builtin}' is not registered"))
    })?;
    create_host_function(heap, registry, id, 0)
}
