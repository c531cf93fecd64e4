//! Data preprocessing module
//!
//! Provides fit/transform style matrix transformers:
//! - Standard normal form along an axis (`Standardize`)
//! - Decile binning of the whole matrix, per column or per row (`Bin`)
//! - Seeded row/column shuffling of labeled matrices (`Shuffler`)
//!
//! Polynomial feature expansion lives in [`crate::feature_engineering`] and
//! implements the same [`Preprocess`] contract.

mod config;
mod scaler;
pub mod binning;
pub mod shuffle;

pub use config::{BinConfig, ShufflerConfig, StandardizeConfig, TransformerConfig};
pub use scaler::{mean_and_std, reverse_standardize, standardize, Standardize, NEAR_ZERO};
pub use binning::{bin_by_decile, get_deciles, Bin, BinAxis, N_DECILES};
pub use shuffle::{
    get_batch_shuffle_indices, get_shuffle_indices, inverse_permutation, seeded_shuffle_indices,
    Shuffler,
};

use crate::error::{KolosalError, Result};

/// Shared contract of every transformer.
///
/// `transform` and `reverse_transform` always allocate their output; the
/// input is never aliased. Transformers that can work on the caller's buffer
/// additionally implement [`PreprocessInPlace`].
pub trait Preprocess<M: ?Sized> {
    /// Value produced by `transform`
    type Output;

    /// Compute and store parameters from `matrix`
    fn fit(&mut self, matrix: &M) -> Result<&mut Self>;

    /// Apply the stored parameters to `matrix`
    fn transform(&self, matrix: &M) -> Result<Self::Output>;

    /// Fit and transform in one step
    fn fit_transform(&mut self, matrix: &M) -> Result<Self::Output> {
        self.fit(matrix)?;
        self.transform(matrix)
    }

    /// Undo `transform` using the stored parameters
    fn reverse_transform(&self, _matrix: &M) -> Result<Self::Output> {
        Err(KolosalError::NotSupported(
            "reverse_transform is not supported by this transformer".to_string(),
        ))
    }
}

/// In-place variant of [`Preprocess`]; mutates the caller's buffer.
pub trait PreprocessInPlace<M: ?Sized>: Preprocess<M> {
    fn transform_inplace(&self, matrix: &mut M) -> Result<()>;

    fn reverse_transform_inplace(&self, matrix: &mut M) -> Result<()>;

    fn fit_transform_inplace(&mut self, matrix: &mut M) -> Result<()> {
        self.fit(&*matrix)?;
        self.transform_inplace(matrix)
    }
}
