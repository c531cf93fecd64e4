//! Standard normal form: `(x - mean) / std` along one axis

use super::config::StandardizeConfig;
use super::{Preprocess, PreprocessInPlace};
use crate::error::{KolosalError, Result};
use crate::utils::{to_float_array, MatrixElement};
use ndarray::{Array, ArrayBase, ArrayD, Axis, Data, DataMut, Dimension};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Standard deviations closer to zero than this are rejected at fit time
pub const NEAR_ZERO: f64 = 1e-12;

/// Z-score normalization along an axis.
///
/// Any numeric element type can be fitted and transformed; the output is
/// always float64. The in-place variants need a float64 buffer.
///
/// Mean and standard deviation keep the fit axis as a singleton dimension,
/// so they broadcast against any matrix of the same rank whose other
/// dimensions match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Standardize {
    axis: usize,
    mean: Option<ArrayD<f64>>,
    std: Option<ArrayD<f64>>,
}

impl Default for Standardize {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Standardize {
    /// Create a new standardizer for `axis`
    pub fn new(axis: usize) -> Self {
        Self {
            axis,
            mean: None,
            std: None,
        }
    }

    pub fn from_config(config: &StandardizeConfig) -> Self {
        Self::new(config.axis)
    }

    pub fn axis(&self) -> usize {
        self.axis
    }

    /// Fitted means, with the fit axis kept as length 1
    pub fn mean(&self) -> Option<&ArrayD<f64>> {
        self.mean.as_ref()
    }

    /// Fitted population standard deviations, with the fit axis kept as length 1
    pub fn std(&self) -> Option<&ArrayD<f64>> {
        self.std.as_ref()
    }

    fn params(&self) -> Result<(&ArrayD<f64>, &ArrayD<f64>)> {
        match (&self.mean, &self.std) {
            (Some(mean), Some(std)) => Ok((mean, std)),
            _ => Err(KolosalError::ModelNotFitted),
        }
    }
}

impl<A, S, D> Preprocess<ArrayBase<S, D>> for Standardize
where
    A: MatrixElement,
    S: Data<Elem = A>,
    D: Dimension,
{
    type Output = Array<f64, D>;

    fn fit(&mut self, matrix: &ArrayBase<S, D>) -> Result<&mut Self> {
        let (mean, std) = mean_and_std(&to_float_array(matrix)?, self.axis)?;
        debug!(axis = self.axis, shape = ?mean.shape(), "Fitted standardizer");
        self.mean = Some(mean);
        self.std = Some(std);
        Ok(self)
    }

    fn transform(&self, matrix: &ArrayBase<S, D>) -> Result<Array<f64, D>> {
        let (mean, std) = self.params()?;
        let mut result = to_float_array(matrix)?;
        standardize(&mut result, mean, std)?;
        Ok(result)
    }

    fn reverse_transform(&self, matrix: &ArrayBase<S, D>) -> Result<Array<f64, D>> {
        let (mean, std) = self.params()?;
        let mut result = to_float_array(matrix)?;
        reverse_standardize(&mut result, mean, std)?;
        Ok(result)
    }
}

impl<S, D> PreprocessInPlace<ArrayBase<S, D>> for Standardize
where
    S: DataMut<Elem = f64>,
    D: Dimension,
{
    fn transform_inplace(&self, matrix: &mut ArrayBase<S, D>) -> Result<()> {
        let (mean, std) = self.params()?;
        standardize(matrix, mean, std)
    }

    fn reverse_transform_inplace(&self, matrix: &mut ArrayBase<S, D>) -> Result<()> {
        let (mean, std) = self.params()?;
        reverse_standardize(matrix, mean, std)
    }
}

fn check_matrix<S, D>(matrix: &ArrayBase<S, D>) -> Result<()>
where
    S: Data,
    D: Dimension,
{
    if matrix.ndim() == 0 {
        return Err(KolosalError::InvalidInput("Matrix has zero dimensions".to_string()));
    }
    if matrix.is_empty() {
        return Err(KolosalError::InvalidInput("Matrix is empty".to_string()));
    }
    Ok(())
}

/// Per-slice mean and population standard deviation along `axis`.
///
/// Both results keep `axis` as a length-1 dimension.
pub fn mean_and_std<S, D>(matrix: &ArrayBase<S, D>, axis: usize) -> Result<(ArrayD<f64>, ArrayD<f64>)>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    check_matrix(matrix)?;
    if axis >= matrix.ndim() {
        return Err(KolosalError::InvalidInput(format!(
            "Axis {} is out of range for a matrix with {} dimensions",
            axis,
            matrix.ndim()
        )));
    }

    let view = matrix.view().into_dyn();
    let mean = view
        .mean_axis(Axis(axis))
        .ok_or_else(|| KolosalError::InvalidInput("Matrix is empty".to_string()))?
        .insert_axis(Axis(axis));
    let std = view.std_axis(Axis(axis), 0.0).insert_axis(Axis(axis));

    if std.iter().any(|s| !(s.abs() >= NEAR_ZERO)) {
        return Err(KolosalError::ComputationError(
            "Standard deviation calculation has near zero values".to_string(),
        ));
    }

    Ok((mean, std))
}

fn broadcast_params<'a, S, D>(
    matrix: &ArrayBase<S, D>,
    mean: &'a ArrayD<f64>,
    std: &'a ArrayD<f64>,
) -> Result<(ndarray::ArrayViewD<'a, f64>, ndarray::ArrayViewD<'a, f64>)>
where
    S: Data,
    D: Dimension,
{
    check_matrix(matrix)?;
    if mean.ndim() != matrix.ndim() || std.ndim() != matrix.ndim() {
        return Err(KolosalError::InvalidInput(format!(
            "Parameters have {} dimensions but the matrix has {}",
            mean.ndim(),
            matrix.ndim()
        )));
    }

    let shape_error = || KolosalError::ShapeError {
        expected: format!("shape compatible with {:?}", mean.shape()),
        actual: format!("{:?}", matrix.shape()),
    };
    let mean = mean.broadcast(matrix.shape()).ok_or_else(shape_error)?;
    let std = std.broadcast(matrix.shape()).ok_or_else(shape_error)?;
    Ok((mean, std))
}

/// Standardize `matrix` in place with precomputed parameters
pub fn standardize<S, D>(matrix: &mut ArrayBase<S, D>, mean: &ArrayD<f64>, std: &ArrayD<f64>) -> Result<()>
where
    S: DataMut<Elem = f64>,
    D: Dimension,
{
    let (mean, std) = broadcast_params(matrix, mean, std)?;
    matrix.zip_mut_with(&mean, |x, &m| *x -= m);
    matrix.zip_mut_with(&std, |x, &s| *x /= s);
    Ok(())
}

/// Undo [`standardize`] in place
pub fn reverse_standardize<S, D>(
    matrix: &mut ArrayBase<S, D>,
    mean: &ArrayD<f64>,
    std: &ArrayD<f64>,
) -> Result<()>
where
    S: DataMut<Elem = f64>,
    D: Dimension,
{
    let (mean, std) = broadcast_params(matrix, mean, std)?;
    matrix.zip_mut_with(&std, |x, &s| *x *= s);
    matrix.zip_mut_with(&mean, |x, &m| *x += m);
    Ok(())
}
