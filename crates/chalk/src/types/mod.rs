/// Type definitions for Chalk runtime values.
///
/// This module contains the structured payloads behind heap-allocated
/// values and the [`ChalkTrait`] interface they share with immediate values.
pub mod chalk_trait;
pub mod dict;
pub mod function;
pub mod iter;
pub mod list;
pub mod reference;
pub mod str;
pub mod r#type;

pub use chalk_trait::ChalkTrait;
pub use dict::{Dict, DictEntry, DictSlot};
pub use function::{Function, FunctionBody};
pub use iter::{AggregateIter, init_iterator};
pub use list::List;
pub use reference::Reference;
pub use r#type::Type;
pub use str::Str;
