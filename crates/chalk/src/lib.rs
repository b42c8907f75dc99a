#![doc = include_str!("../../../README.md")]

mod args;
mod builtins;
mod error;
mod heap;
mod host;
mod io;
mod resource;
mod script;
mod syntax;
mod types;
mod value;

pub use crate::{
    args::ArgValues,
    builtins::{Builtin, builtin_get, builtin_len, builtin_print, create_builtin_function, register_builtins},
    error::{ErrorKind, RunError, RunResult},
    heap::{DropWithHeap, Heap, HeapData, HeapId, HeapStats},
    host::{
        CallOutcome, HostCall, HostFunctionId, HostRegistry, HostRoutine, call_function,
        create_host_function,
    },
    io::{CollectPrint, NoPrint, PrintWriter, StdPrint},
    resource::{LimitedTracker, NoLimitTracker, ResourceError, ResourceLimits, ResourceTracker},
    script::{NodeHandle, ParserHandle, Script, ScriptId, Scripts},
    syntax::{NODE_BASE, NodeKind, SyntaxKind, TOKEN_BASE, TokenKind},
    types::{
        AggregateIter, ChalkTrait, Dict, DictEntry, DictSlot, Function, FunctionBody, List,
        Reference, Str, Type, init_iterator,
        dict::{dict_add, dict_clear, dict_lookup, dict_remove, dict_set, dict_write_slot},
        list::{list_add, list_clear, list_lookup, list_push, list_set},
    },
    value::{
        MAX_RENDER_DEPTH, Value, compare, create_dict, create_function, create_integer,
        create_list, create_null, create_reference, create_string, create_zeroed_string,
        deep_copy, render, string_add,
    },
};
