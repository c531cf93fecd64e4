//! Kolosal Transforms - matrix transformers for preprocessing pipelines
//!
//! This crate provides fit/transform style transformers that run before
//! model training:
//! - Standard normal form along an axis, with inverse
//! - Decile binning of a matrix, its columns or its rows
//! - Seeded row/column shuffling of labeled matrices, with inverse
//! - Polynomial and interaction features for numeric and string matrices
//!
//! # Modules
//!
//! - [`preprocessing`] - Transformer contract, standardization, binning, shuffling
//! - [`feature_engineering`] - Polynomial feature generation
//! - [`utils`] - Labeled matrices and element type classification
//!
//! # Example
//!
//! ```
//! use kolosal_transforms::prelude::*;
//! use ndarray::array;
//!
//! let x = array![[2.0, 7.0, 9.0], [6.0, 9.0, 2.0], [4.0, 0.0, 2.0], [7.0, 2.0, 5.0]];
//!
//! let mut scaler = Standardize::new(0);
//! let scaled = scaler.fit_transform(&x)?;
//! let restored = scaler.reverse_transform(&scaled)?;
//! assert!((restored[[0, 0]] - 2.0).abs() < 1e-10);
//!
//! let mut binner = Bin::new(1, None)?;
//! let binned = binner.fit_transform(&x)?;
//! assert_eq!(binned.row(0).to_vec(), vec![1.0, 8.0, 10.0]);
//! # Ok::<(), kolosal_transforms::KolosalError>(())
//! ```

// Core error handling
pub mod error;

// Transformers
pub mod preprocessing;
pub mod feature_engineering;

// Utilities
pub mod utils;

pub use error::{KolosalError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{KolosalError, Result};

    // Transformer contract
    pub use crate::preprocessing::{Preprocess, PreprocessInPlace};

    // Transformers
    pub use crate::preprocessing::{Bin, BinAxis, Shuffler, Standardize};
    pub use crate::feature_engineering::{PolynomialConfig, PolynomialFeatures};

    // Configuration
    pub use crate::preprocessing::{BinConfig, ShufflerConfig, StandardizeConfig, TransformerConfig};

    // Data types
    pub use crate::utils::{is_lexical_matrix, is_numeric_matrix, LabeledMatrix, MatrixElement};
}
