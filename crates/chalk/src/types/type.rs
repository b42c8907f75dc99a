use strum::{Display, EnumString, IntoStaticStr};

/// The dynamic type of a runtime value.
///
/// Discriminants are fixed: type-mismatched comparisons order operands by
/// this tag, so the numeric values are part of the observable total order.
/// `Reference` is the internal l-value box; it never appears in evaluation
/// results and never participates in mismatch ordering (comparisons see
/// through it to the target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum Type {
    Null = 1,
    Integer,
    String,
    Dict,
    List,
    Function,
    Reference,
}

impl Type {
    /// The numeric tag used for type-mismatch ordering.
    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// The canonical type name, e.g. for error messages.
    pub fn name(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_order_is_stable() {
        assert!(Type::Null.tag() < Type::Integer.tag());
        assert!(Type::Integer.tag() < Type::String.tag());
        assert!(Type::String.tag() < Type::Dict.tag());
        assert!(Type::Dict.tag() < Type::List.tag());
        assert!(Type::List.tag() < Type::Function.tag());
    }

    #[test]
    fn names_are_lowercase() {
        assert_eq!(Type::Integer.name(), "integer");
        assert_eq!(Type::Dict.to_string(), "dict");
    }
}
