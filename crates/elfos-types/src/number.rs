//! Numeric value representation with a four-level promotion tower.
//!
//! Arithmetic between two [`Number`]s first determines the common kind of the
//! result, symmetrically in operand order:
//!
//! | Operands | Result |
//! |---|---|
//! | `Integer` + `Integer` | `Integer`, widened to `Long` on overflow |
//! | either operand `Long` | `Long` |
//! | either operand `Float` | `Float` |
//! | either operand `Double` | `Double` |
//!
//! `Double` wins over `Float`, `Float` wins over both integer kinds.

use serde::{Deserialize, Serialize};

use crate::VarType;

/// A numeric value of one of four machine kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Number {
    /// 32-bit signed integer.
    Integer(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// Single-precision float.
    Float(f32),
    /// Double-precision float.
    Double(f64),
}

impl Number {
    /// The [`VarType`] kind of this number.
    pub fn kind(&self) -> VarType {
        match self {
            Number::Integer(_) => VarType::Integer,
            Number::Long(_) => VarType::Long,
            Number::Float(_) => VarType::Float,
            Number::Double(_) => VarType::Double,
        }
    }

    /// Widen to `i64`.  Only meaningful for the integer kinds; float kinds
    /// are truncated.
    pub fn as_i64(&self) -> i64 {
        match self {
            Number::Integer(i) => *i as i64,
            Number::Long(l) => *l,
            Number::Float(f) => *f as i64,
            Number::Double(d) => *d as i64,
        }
    }

    /// Widen to `f32`.
    pub fn as_f32(&self) -> f32 {
        match self {
            Number::Integer(i) => *i as f32,
            Number::Long(l) => *l as f32,
            Number::Float(f) => *f,
            Number::Double(d) => *d as f32,
        }
    }

    /// Widen to `f64`.
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Long(l) => *l as f64,
            Number::Float(f) => *f as f64,
            Number::Double(d) => *d,
        }
    }

    /// The common result kind for a binary operation over `a` and `b`.
    ///
    /// Symmetric by construction: the wider kind always wins, with the
    /// ordering `Integer < Long < Float < Double`.
    fn common_kind(a: Number, b: Number) -> VarType {
        fn rank(k: VarType) -> u8 {
            match k {
                VarType::Integer => 0,
                VarType::Long => 1,
                VarType::Float => 2,
                VarType::Double => 3,
                // Only numeric kinds reach this function.
                _ => unreachable!("non-numeric kind in promotion"),
            }
        }
        let (ka, kb) = (a.kind(), b.kind());
        if rank(ka) >= rank(kb) { ka } else { kb }
    }

    /// `self + rhs` under the promotion tower.
    ///
    /// Two `Integer` operands stay `Integer` unless the sum overflows i32,
    /// in which case the result widens to `Long`.
    pub fn add(self, rhs: Number) -> Number {
        match Number::common_kind(self, rhs) {
            VarType::Integer => {
                let (Number::Integer(a), Number::Integer(b)) = (self, rhs) else {
                    unreachable!("common kind Integer implies two Integer operands");
                };
                match a.checked_add(b) {
                    Some(v) => Number::Integer(v),
                    None => Number::Long(a as i64 + b as i64),
                }
            }
            VarType::Long => Number::Long(self.as_i64().wrapping_add(rhs.as_i64())),
            VarType::Float => Number::Float(self.as_f32() + rhs.as_f32()),
            _ => Number::Double(self.as_f64() + rhs.as_f64()),
        }
    }

    /// `self - rhs` under the promotion tower (same widening rules as
    /// [`Number::add`]).
    pub fn sub(self, rhs: Number) -> Number {
        match Number::common_kind(self, rhs) {
            VarType::Integer => {
                let (Number::Integer(a), Number::Integer(b)) = (self, rhs) else {
                    unreachable!("common kind Integer implies two Integer operands");
                };
                match a.checked_sub(b) {
                    Some(v) => Number::Integer(v),
                    None => Number::Long(a as i64 - b as i64),
                }
            }
            VarType::Long => Number::Long(self.as_i64().wrapping_sub(rhs.as_i64())),
            VarType::Float => Number::Float(self.as_f32() - rhs.as_f32()),
            _ => Number::Double(self.as_f64() - rhs.as_f64()),
        }
    }

    /// Arithmetic negation.  `Integer::MIN` widens to `Long`.
    pub fn neg(self) -> Number {
        match self {
            Number::Integer(i) => match i.checked_neg() {
                Some(v) => Number::Integer(v),
                None => Number::Long(-(i as i64)),
            },
            Number::Long(l) => Number::Long(l.wrapping_neg()),
            Number::Float(f) => Number::Float(-f),
            Number::Double(d) => Number::Double(-d),
        }
    }

    /// Strict `self < rhs` comparison at the common kind.
    pub fn lt(self, rhs: Number) -> bool {
        match Number::common_kind(self, rhs) {
            VarType::Integer | VarType::Long => self.as_i64() < rhs.as_i64(),
            VarType::Float => self.as_f32() < rhs.as_f32(),
            _ => self.as_f64() < rhs.as_f64(),
        }
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Integer(value)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Long(value)
    }
}

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        Number::Float(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Double(value)
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{i}"),
            Number::Long(l) => write!(f, "{l}"),
            Number::Float(x) => write!(f, "{x}"),
            Number::Double(d) => write!(f, "{d}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_plus_integer_stays_integer() {
        let sum = Number::Integer(1).add(Number::Integer(2));
        assert_eq!(sum, Number::Integer(3));
    }

    #[test]
    fn integer_overflow_widens_to_long() {
        let sum = Number::Integer(i32::MAX).add(Number::Integer(1));
        assert_eq!(sum, Number::Long(i32::MAX as i64 + 1));
    }

    #[test]
    fn integer_underflow_widens_to_long() {
        let diff = Number::Integer(i32::MIN).sub(Number::Integer(1));
        assert_eq!(diff, Number::Long(i32::MIN as i64 - 1));
    }

    #[test]
    fn integer_plus_long_is_long() {
        assert_eq!(Number::Integer(1).add(Number::Long(2)), Number::Long(3));
        assert_eq!(Number::Long(2).add(Number::Integer(1)), Number::Long(3));
    }

    #[test]
    fn float_wins_over_long() {
        let a = Number::Float(1.5).add(Number::Long(2));
        let b = Number::Long(2).add(Number::Float(1.5));
        assert_eq!(a.kind(), VarType::Float);
        assert_eq!(a, b);
    }

    #[test]
    fn double_wins_over_float() {
        let a = Number::Float(1.5).add(Number::Double(2.0));
        let b = Number::Double(2.0).add(Number::Float(1.5));
        assert_eq!(a.kind(), VarType::Double);
        assert_eq!(b.kind(), VarType::Double);
        assert!((a.as_f64() - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn promotion_is_commutative_in_result_kind() {
        let samples = [
            Number::Integer(7),
            Number::Long(7),
            Number::Float(7.0),
            Number::Double(7.0),
        ];
        for a in samples {
            for b in samples {
                assert_eq!(
                    a.add(b).kind(),
                    b.add(a).kind(),
                    "kind mismatch for {a:?} + {b:?}"
                );
                assert_eq!(a.add(b), b.add(a), "magnitude mismatch for {a:?} + {b:?}");
            }
        }
    }

    #[test]
    fn unary_negation() {
        assert_eq!(Number::Float(1.0).neg(), Number::Float(-1.0));
        assert_eq!(Number::Integer(5).neg(), Number::Integer(-5));
        assert_eq!(Number::Integer(i32::MIN).neg(), Number::Long(-(i32::MIN as i64)));
    }

    #[test]
    fn less_than_at_common_kind() {
        assert!(Number::Integer(1).lt(Number::Long(2)));
        assert!(Number::Float(1.5).lt(Number::Integer(2)));
        assert!(!Number::Double(2.0).lt(Number::Double(2.0)));
    }

    #[test]
    fn serialization_roundtrip() {
        let n = Number::Long(42);
        let json = serde_json::to_string(&n).unwrap();
        let back: Number = serde_json::from_str(&json).unwrap();
        assert_eq!(n, back);
    }
}
