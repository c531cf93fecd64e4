//! Feature engineering module
//!
//! Polynomial and interaction feature expansion for numeric and lexical
//! matrices. The generator implements [`crate::preprocessing::Preprocess`].

mod polynomial;

pub use polynomial::{PolynomialConfig, PolynomialFeatures, LEXICAL_SEPARATOR};
