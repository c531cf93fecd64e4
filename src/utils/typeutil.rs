//! Element type classification for matrices
//!
//! Transformers that behave differently for numbers and strings dispatch on
//! [`MatrixElement::KIND`] instead of inspecting values at runtime.

use crate::error::{KolosalError, Result};
use ndarray::{Array, ArrayBase, Data, Dimension};

/// Broad category of a matrix element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Integers and floats
    Numeric,
    /// Strings
    Lexical,
    /// Anything else (booleans, ...)
    Other,
}

/// Element types a transformer can be asked to work on.
///
/// `multiply_all` and `join_all` fail with a type error naming
/// [`Self::DTYPE`] for kinds that do not support the operation.
pub trait MatrixElement: Clone {
    /// Human readable dtype name
    const DTYPE: &'static str;
    /// Category used for code path selection
    const KIND: ElementKind;

    /// Product of the given factors; the empty product is the multiplicative identity
    fn multiply_all(_factors: &[&Self]) -> Result<Self> {
        Err(unsupported_type::<Self>())
    }

    /// Concatenation of the given fragments with `separator` between them
    fn join_all(_fragments: &[&Self], _separator: &str) -> Result<Self> {
        Err(unsupported_type::<Self>())
    }

    /// Value as a float, for numeric kinds only
    fn to_f64(&self) -> Option<f64> {
        None
    }
}

/// Error for an element type a transformer cannot handle
pub fn unsupported_type<A: MatrixElement>() -> KolosalError {
    KolosalError::TypeError(format!("Unsupported matrix type {}", A::DTYPE))
}

macro_rules! impl_float_element {
    ($($t:ty => $name:literal),* $(,)?) => {
        $(
            impl MatrixElement for $t {
                const DTYPE: &'static str = $name;
                const KIND: ElementKind = ElementKind::Numeric;

                fn multiply_all(factors: &[&Self]) -> Result<Self> {
                    Ok(factors.iter().fold(1.0, |acc, &&v| acc * v))
                }

                fn to_f64(&self) -> Option<f64> {
                    Some(*self as f64)
                }
            }
        )*
    };
}

// Integer products are checked: an overflow is an error, not a wrapped value
macro_rules! impl_integer_element {
    ($($t:ty => $name:literal),* $(,)?) => {
        $(
            impl MatrixElement for $t {
                const DTYPE: &'static str = $name;
                const KIND: ElementKind = ElementKind::Numeric;

                fn multiply_all(factors: &[&Self]) -> Result<Self> {
                    factors
                        .iter()
                        .try_fold(1 as $t, |acc, &&v| acc.checked_mul(v))
                        .ok_or_else(|| {
                            KolosalError::ComputationError(format!(
                                "Product overflows {}",
                                $name
                            ))
                        })
                }

                fn to_f64(&self) -> Option<f64> {
                    Some(*self as f64)
                }
            }
        )*
    };
}

impl_float_element!(
    f64 => "float64",
    f32 => "float32",
);

impl_integer_element!(
    i8 => "int8",
    i16 => "int16",
    i32 => "int32",
    i64 => "int64",
    isize => "intp",
    u8 => "uint8",
    u16 => "uint16",
    u32 => "uint32",
    u64 => "uint64",
    usize => "uintp",
);

impl MatrixElement for String {
    const DTYPE: &'static str = "str";
    const KIND: ElementKind = ElementKind::Lexical;

    fn join_all(fragments: &[&Self], separator: &str) -> Result<Self> {
        Ok(fragments
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(separator))
    }
}

impl MatrixElement for bool {
    const DTYPE: &'static str = "bool";
    const KIND: ElementKind = ElementKind::Other;
}

/// Owned float64 copy of a numeric matrix, in logical order.
///
/// Non-numeric element types fail with a type error.
pub fn to_float_array<A, S, D>(matrix: &ArrayBase<S, D>) -> Result<Array<f64, D>>
where
    A: MatrixElement,
    S: Data<Elem = A>,
    D: Dimension,
{
    if A::KIND != ElementKind::Numeric {
        return Err(unsupported_type::<A>());
    }

    let values = matrix
        .iter()
        .map(|v| v.to_f64().ok_or_else(unsupported_type::<A>))
        .collect::<Result<Vec<f64>>>()?;
    Ok(Array::from_shape_vec(matrix.raw_dim(), values)?)
}

/// True when the matrix holds numbers
pub fn is_numeric_matrix<A, S, D>(_matrix: &ArrayBase<S, D>) -> bool
where
    A: MatrixElement,
    S: Data<Elem = A>,
    D: Dimension,
{
    A::KIND == ElementKind::Numeric
}

/// True when the matrix holds strings
pub fn is_lexical_matrix<A, S, D>(_matrix: &ArrayBase<S, D>) -> bool
where
    A: MatrixElement,
    S: Data<Elem = A>,
    D: Dimension,
{
    A::KIND == ElementKind::Lexical
}
