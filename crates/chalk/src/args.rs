use smallvec::{SmallVec, smallvec};

use crate::{
    error::{RunError, RunResult},
    heap::{DropWithHeap, Heap},
    resource::ResourceTracker,
    value::Value,
};

/// Positional arguments for a function call.
///
/// Uses dedicated variants for the common cases (0-2 arguments) so most
/// calls avoid a heap allocation for the argument vector; Chalk binds
/// parameters positionally and has no keyword arguments.
///
/// The bundle owns its values: whoever consumes it releases them, including
/// on error paths (the checked extractors below do this).
#[derive(Debug)]
pub enum ArgValues {
    Empty,
    One(Value),
    Two(Value, Value),
    Many(SmallVec<[Value; 4]>),
}

impl ArgValues {
    /// Builds an argument bundle, normalizing small counts into the
    /// dedicated variants.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        let mut values: SmallVec<[Value; 4]> = values.into_iter().collect();
        match values.len() {
            0 => Self::Empty,
            1 => Self::One(values.remove(0)),
            2 => {
                let second = values.remove(1);
                Self::Two(values.remove(0), second)
            }
            _ => Self::Many(values),
        }
    }

    /// The number of arguments.
    pub fn count(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::One(_) => 1,
            Self::Two(_, _) => 2,
            Self::Many(values) => values.len(),
        }
    }

    /// Checks that zero arguments were passed.
    ///
    /// On error, releases all contained values.
    pub fn check_zero_args(
        self,
        name: &str,
        heap: &mut Heap<impl ResourceTracker>,
    ) -> RunResult<()> {
        match self {
            Self::Empty => Ok(()),
            other => {
                let count = other.count();
                other.drop_with_heap(heap);
                Err(RunError::arg_count(name, 0, count))
            }
        }
    }

    /// Checks that exactly one argument was passed, returning it.
    ///
    /// On error, releases all contained values.
    pub fn get_one_arg(self, name: &str, heap: &mut Heap<impl ResourceTracker>) -> RunResult<Value> {
        match self {
            Self::One(a) => Ok(a),
            other => {
                let count = other.count();
                other.drop_with_heap(heap);
                Err(RunError::arg_count(name, 1, count))
            }
        }
    }

    /// Checks that exactly two arguments were passed, returning them.
    ///
    /// On error, releases all contained values.
    pub fn get_two_args(
        self,
        name: &str,
        heap: &mut Heap<impl ResourceTracker>,
    ) -> RunResult<(Value, Value)> {
        match self {
            Self::Two(a, b) => Ok((a, b)),
            other => {
                let count = other.count();
                other.drop_with_heap(heap);
                Err(RunError::arg_count(name, 2, count))
            }
        }
    }

    /// Checks that two or three arguments were passed, the third optional.
    ///
    /// On error, releases all contained values.
    pub fn get_two_three_args(
        self,
        name: &str,
        heap: &mut Heap<impl ResourceTracker>,
    ) -> RunResult<(Value, Value, Option<Value>)> {
        match self {
            Self::Two(a, b) => Ok((a, b, None)),
            Self::Many(values) if values.len() == 3 => {
                let mut iter = values.into_iter();
                let a = iter.next().expect("length checked");
                let b = iter.next().expect("length checked");
                let c = iter.next().expect("length checked");
                Ok((a, b, Some(c)))
            }
            other => {
                let count = other.count();
                other.drop_with_heap(heap);
                Err(RunError::arg_range(name, 2, 3, count))
            }
        }
    }
}

impl DropWithHeap for ArgValues {
    fn drop_with_heap(self, heap: &mut Heap<impl ResourceTracker>) {
        for value in self {
            value.drop_with_heap(heap);
        }
    }
}

impl IntoIterator for ArgValues {
    type Item = Value;
    type IntoIter = smallvec::IntoIter<[Value; 4]>;

    fn into_iter(self) -> Self::IntoIter {
        let values: SmallVec<[Value; 4]> = match self {
            Self::Empty => smallvec![],
            Self::One(a) => smallvec![a],
            Self::Two(a, b) => smallvec![a, b],
            Self::Many(values) => values,
        };
        values.into_iter()
    }
}
