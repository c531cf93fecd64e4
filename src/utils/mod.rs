//! Utility functions and types

pub mod labeled_matrix;
pub mod typeutil;

pub use labeled_matrix::LabeledMatrix;
pub use typeutil::{
    is_lexical_matrix, is_numeric_matrix, to_float_array, unsupported_type, ElementKind, MatrixElement,
};
