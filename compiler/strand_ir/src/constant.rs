//! Literal constants shared by the script tree, signature defaults and
//! constant graph nodes.

use std::fmt;

use crate::{Name, StringInterner};

/// A literal value known at compile time.
///
/// Floats are stored as raw bits so the type stays `Eq + Hash` and can key
/// the constant memo table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Constant {
    Int(i64),
    Float(u64),
    Bool(bool),
    Str(Name),
    None,
}

impl Constant {
    #[inline]
    pub fn float(value: f64) -> Self {
        Constant::Float(value.to_bits())
    }

    /// The float payload, if this is a float constant.
    #[inline]
    pub fn as_float(self) -> Option<f64> {
        match self {
            Constant::Float(bits) => Some(f64::from_bits(bits)),
            _ => None,
        }
    }

    /// Arithmetic negation for numeric constants.
    ///
    /// Returns `None` for non-numeric constants and for `i64::MIN`.
    pub fn negate(self) -> Option<Constant> {
        match self {
            Constant::Int(v) => v.checked_neg().map(Constant::Int),
            Constant::Float(bits) => Some(Constant::float(-f64::from_bits(bits))),
            Constant::Bool(_) | Constant::Str(_) | Constant::None => None,
        }
    }

    /// Render using `interner` for string payloads.
    pub fn display<'a>(&'a self, interner: &'a StringInterner) -> ConstantDisplay<'a> {
        ConstantDisplay {
            constant: self,
            interner,
        }
    }
}

pub struct ConstantDisplay<'a> {
    constant: &'a Constant,
    interner: &'a StringInterner,
}

impl fmt::Display for ConstantDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self.constant {
            Constant::Int(v) => write!(f, "{v}"),
            Constant::Float(bits) => {
                let v = f64::from_bits(bits);
                if v.fract() == 0.0 && v.is_finite() {
                    write!(f, "{v:.1}")
                } else {
                    write!(f, "{v}")
                }
            }
            Constant::Bool(true) => f.write_str("True"),
            Constant::Bool(false) => f.write_str("False"),
            Constant::Str(name) => write!(f, "{:?}", self.interner.lookup(name)),
            Constant::None => f.write_str("None"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn negate_numbers() {
        assert_eq!(Constant::Int(3).negate(), Some(Constant::Int(-3)));
        assert_eq!(Constant::Int(i64::MIN).negate(), None);
        assert_eq!(Constant::float(1.5).negate(), Some(Constant::float(-1.5)));
        assert_eq!(Constant::Bool(true).negate(), None);
    }

    #[test]
    fn display_literals() {
        let interner = StringInterner::new();
        let s = Constant::Str(interner.intern("cpu"));
        assert_eq!(s.display(&interner).to_string(), "\"cpu\"");
        assert_eq!(Constant::float(2.0).display(&interner).to_string(), "2.0");
        assert_eq!(Constant::float(0.25).display(&interner).to_string(), "0.25");
        assert_eq!(Constant::Bool(false).display(&interner).to_string(), "False");
        assert_eq!(Constant::None.display(&interner).to_string(), "None");
    }
}
