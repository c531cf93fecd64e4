//! Decile binning / discretization
//!
//! Each value is replaced by the index of the first decile it does not
//! exceed, offset by a configurable `bin_start`. The last decile is always
//! `+inf`, so every finite value lands in one of ten bins. That sentinel is
//! left out of the serialized state and restored on load.

use super::config::BinConfig;
use super::Preprocess;
use crate::error::{KolosalError, Result};
use crate::utils::{to_float_array, MatrixElement};
use ndarray::{Array, Array2, ArrayBase, ArrayView1, Data, Dimension, Ix2, Zip};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of breakpoints per binned slice
pub const N_DECILES: usize = 10;

/// Which slices of the matrix get their own deciles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinAxis {
    /// One set of deciles for the whole matrix
    All,
    /// One set of deciles per column (axis 0)
    Columns,
    /// One set of deciles per row (axis 1)
    Rows,
}

impl BinAxis {
    /// Map a numeric axis onto a binning mode
    pub fn from_axis(axis: Option<usize>) -> Result<Self> {
        match axis {
            None => Ok(BinAxis::All),
            Some(0) => Ok(BinAxis::Columns),
            Some(1) => Ok(BinAxis::Rows),
            Some(other) => Err(KolosalError::NotSupported(format!(
                "Axis={} is not yet implemented",
                other
            ))),
        }
    }
}

/// Decile binner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bin {
    bin_start: i64,
    axis: BinAxis,
    #[serde(with = "finite_deciles")]
    deciles: Option<Vec<[f64; N_DECILES]>>,
}

/// Serializes each decile set without its trailing `+inf`, which JSON
/// cannot represent.
mod finite_deciles {
    use super::N_DECILES;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(deciles: &Option<Vec<[f64; N_DECILES]>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        deciles
            .as_ref()
            .map(|slices| slices.iter().map(|d| &d[..N_DECILES - 1]).collect::<Vec<_>>())
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<[f64; N_DECILES]>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let stored: Option<Vec<Vec<f64>>> = Option::deserialize(deserializer)?;
        stored
            .map(|slices| {
                slices
                    .into_iter()
                    .map(|finite| {
                        if finite.len() != N_DECILES - 1 {
                            return Err(D::Error::invalid_length(finite.len(), &"9 deciles"));
                        }
                        let mut deciles = [f64::INFINITY; N_DECILES];
                        deciles[..N_DECILES - 1].copy_from_slice(&finite);
                        Ok(deciles)
                    })
                    .collect::<Result<Vec<_>, D::Error>>()
            })
            .transpose()
    }
}

impl Bin {
    /// Create a new binner; only `None`, `Some(0)` and `Some(1)` are valid axes
    pub fn new(bin_start: i64, axis: Option<usize>) -> Result<Self> {
        Ok(Self::with_axis(bin_start, BinAxis::from_axis(axis)?))
    }

    pub fn with_axis(bin_start: i64, axis: BinAxis) -> Self {
        Self {
            bin_start,
            axis,
            deciles: None,
        }
    }

    pub fn from_config(config: &BinConfig) -> Result<Self> {
        Self::new(config.bin_start, config.axis)
    }

    pub fn bin_start(&self) -> i64 {
        self.bin_start
    }

    pub fn axis(&self) -> BinAxis {
        self.axis
    }

    /// Fitted deciles: one entry for [`BinAxis::All`], else one per column or row
    pub fn deciles(&self) -> Option<&[[f64; N_DECILES]]> {
        self.deciles.as_deref()
    }

    fn fitted_deciles(&self) -> Result<&[[f64; N_DECILES]]> {
        self.deciles.as_deref().ok_or(KolosalError::ModelNotFitted)
    }

    fn bin_lanes<'a, I>(
        &self,
        lanes: I,
        deciles: &[[f64; N_DECILES]],
        out: &mut Array2<f64>,
        by_column: bool,
    ) -> Result<()>
    where
        I: ExactSizeIterator<Item = ArrayView1<'a, f64>>,
    {
        if lanes.len() != deciles.len() {
            let what = if by_column { "columns" } else { "rows" };
            return Err(KolosalError::ShapeError {
                expected: format!("{} {}", deciles.len(), what),
                actual: format!("{} {}", lanes.len(), what),
            });
        }

        for (i, (lane, lane_deciles)) in lanes.zip(deciles).enumerate() {
            let binned = bin_by_decile(&lane, lane_deciles, self.bin_start)?;
            if by_column {
                out.column_mut(i).assign(&binned);
            } else {
                out.row_mut(i).assign(&binned);
            }
        }
        Ok(())
    }
}

fn as_two_dimensional<S, D>(matrix: &ArrayBase<S, D>) -> Result<ndarray::ArrayView2<'_, f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    matrix.view().into_dimensionality::<Ix2>().map_err(|_| {
        KolosalError::InvalidInput(format!(
            "Per-axis binning needs a 2D matrix, got {} dimensions",
            matrix.ndim()
        ))
    })
}

impl<A, S, D> Preprocess<ArrayBase<S, D>> for Bin
where
    A: MatrixElement,
    S: Data<Elem = A>,
    D: Dimension,
{
    type Output = Array<f64, D>;

    fn fit(&mut self, matrix: &ArrayBase<S, D>) -> Result<&mut Self> {
        let values = to_float_array(matrix)?;
        let deciles = match self.axis {
            BinAxis::All => vec![get_deciles(&values)?],
            BinAxis::Columns => as_two_dimensional(&values)?
                .columns()
                .into_iter()
                .map(|col| get_deciles(&col))
                .collect::<Result<Vec<_>>>()?,
            BinAxis::Rows => as_two_dimensional(&values)?
                .rows()
                .into_iter()
                .map(|row| get_deciles(&row))
                .collect::<Result<Vec<_>>>()?,
        };

        debug!(axis = ?self.axis, slices = deciles.len(), "Fitted decile binner");
        self.deciles = Some(deciles);
        Ok(self)
    }

    fn transform(&self, matrix: &ArrayBase<S, D>) -> Result<Array<f64, D>> {
        let deciles = self.fitted_deciles()?;
        let values = to_float_array(matrix)?;

        let result = match self.axis {
            BinAxis::All => bin_by_decile(&values, &deciles[0], self.bin_start)?,
            BinAxis::Columns | BinAxis::Rows => {
                let view = as_two_dimensional(&values)?;
                let mut out = Array2::zeros(view.raw_dim());
                if self.axis == BinAxis::Columns {
                    self.bin_lanes(view.columns().into_iter(), deciles, &mut out, true)?;
                } else {
                    self.bin_lanes(view.rows().into_iter(), deciles, &mut out, false)?;
                }
                out.into_dimensionality::<D>()?
            }
        };

        debug_assert_eq!(result.shape(), matrix.shape());
        Ok(result)
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

/// Linear-interpolated percentile of sorted data, `q` in [0, 100]
fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// The 10th through 90th percentiles of all values, followed by `+inf`.
///
/// Every value must be finite.
pub fn get_deciles<S, D>(matrix: &ArrayBase<S, D>) -> Result<[f64; N_DECILES]>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    check_matrix(matrix)?;
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(KolosalError::InvalidInput(
            "Cannot compute deciles of data containing NaN or infinite values".to_string(),
        ));
    }

    let mut sorted: Vec<f64> = matrix.iter().copied().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut deciles = [f64::INFINITY; N_DECILES];
    for (i, decile) in deciles.iter_mut().take(N_DECILES - 1).enumerate() {
        *decile = percentile_sorted(&sorted, ((i + 1) * 10) as f64);
    }
    Ok(deciles)
}

/// Label each value with `bin_start + i`, `i` being the lowest decile index
/// with `value <= deciles[i]`.
///
/// Values above every decile keep label 0 and NaN values stay NaN. Labels
/// saturate at the `i64` range.
pub fn bin_by_decile<S, D>(matrix: &ArrayBase<S, D>, deciles: &[f64], bin_start: i64) -> Result<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    check_matrix(matrix)?;
    if deciles.len() != N_DECILES {
        return Err(KolosalError::InvalidInput(format!(
            "Expected {} deciles, got {}",
            N_DECILES,
            deciles.len()
        )));
    }

    let mut binned = Array::zeros(matrix.raw_dim());
    Zip::from(&mut binned).and(matrix).for_each(|label, &value| {
        if value.is_nan() {
            *label = f64::NAN;
        } else if let Some(i) = deciles.iter().position(|&d| value <= d) {
            *label = (i as i64).saturating_add(bin_start) as f64;
        }
    });
    Ok(binned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> Array2<f64> {
        array![[2.0, 7.0, 9.0], [6.0, 9.0, 2.0], [4.0, 0.0, 2.0], [7.0, 2.0, 5.0]]
    }

    #[test]
    fn test_deciles_of_sample() {
        let deciles = get_deciles(&sample()).unwrap();
        let expected = [2.0, 2.0, 2.0, 2.8, 4.5, 5.6, 6.7, 7.0, 8.8];
        for (d, e) in deciles.iter().zip(expected.iter()) {
            assert!((d - e).abs() < 1e-10, "{} != {}", d, e);
        }
        assert_eq!(deciles[9], f64::INFINITY);
    }

    #[test]
    fn test_bin_whole_matrix() {
        let mut binner = Bin::new(1, None).unwrap();
        let binned = binner.fit_transform(&sample()).unwrap();

        let expected = array![[1.0, 8.0, 10.0], [7.0, 10.0, 1.0], [5.0, 1.0, 1.0], [8.0, 1.0, 6.0]];
        assert_eq!(binned, expected);
        assert_eq!(binner.deciles().unwrap().len(), 1);
    }

    #[test]
    fn test_bin_out_of_range_values() {
        let mut binner = Bin::new(1, None).unwrap();
        binner.fit(&sample()).unwrap();

        let binned = binner.transform(&array![-1.0, 6.0, 20.0]).unwrap();
        assert_eq!(binned, array![1.0, 7.0, 10.0]);
    }

    #[test]
    fn test_bin_start_offset() {
        let mut binner = Bin::new(0, None).unwrap();
        let binned = binner.fit_transform(&sample()).unwrap();
        assert!(binned.iter().all(|&v| (0.0..=9.0).contains(&v)));
        assert_eq!(binned[[0, 2]], 9.0);
    }

    #[test]
    fn test_bin_columns() {
        let x = array![[1.0, 100.0], [2.0, 200.0], [3.0, 300.0], [4.0, 400.0]];
        let mut binner = Bin::new(0, Some(0)).unwrap();
        let binned = binner.fit_transform(&x).unwrap();

        assert_eq!(binner.deciles().unwrap().len(), 2);
        assert_eq!(binned.shape(), x.shape());
        // Columns are scaled copies of each other, so their labels match
        assert_eq!(binned.column(0), binned.column(1));
    }

    #[test]
    fn test_bin_rows() {
        let x = array![[1.0, 2.0, 3.0, 4.0], [40.0, 30.0, 20.0, 10.0]];
        let mut binner = Bin::new(0, Some(1)).unwrap();
        let binned = binner.fit_transform(&x).unwrap();

        assert_eq!(binner.deciles().unwrap().len(), 2);
        let first: Vec<f64> = binned.row(0).to_vec();
        let mut second: Vec<f64> = binned.row(1).to_vec();
        second.reverse();
        assert_eq!(first, second);
    }

    #[test]
    fn test_per_axis_shape_mismatch() {
        let mut binner = Bin::new(0, Some(0)).unwrap();
        binner.fit(&sample()).unwrap();

        let result = binner.transform(&array![[1.0, 2.0]]);
        assert!(matches!(result, Err(KolosalError::ShapeError { .. })));
    }

    #[test]
    fn test_per_axis_requires_2d() {
        let mut binner = Bin::new(0, Some(1)).unwrap();
        let result = binner.fit(&array![1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(KolosalError::InvalidInput(_))));
    }

    #[test]
    fn test_unimplemented_axis() {
        let result = Bin::new(0, Some(2));
        assert!(matches!(result, Err(KolosalError::NotSupported(_))));
    }

    #[test]
    fn test_reverse_not_supported() {
        let mut binner = Bin::new(0, None).unwrap();
        binner.fit(&sample()).unwrap();
        assert!(matches!(
            binner.reverse_transform(&sample()),
            Err(KolosalError::NotSupported(_))
        ));
    }

    #[test]
    fn test_empty_rejected() {
        let mut binner = Bin::new(0, None).unwrap();
        let empty = ndarray::Array1::<f64>::zeros(0);
        assert!(matches!(binner.fit(&empty), Err(KolosalError::InvalidInput(_))));
    }

    #[test]
    fn test_transform_before_fit() {
        let binner = Bin::new(0, None).unwrap();
        assert!(matches!(binner.transform(&sample()), Err(KolosalError::ModelNotFitted)));
    }

    #[test]
    fn test_bin_by_decile_requires_ten() {
        let result = bin_by_decile(&sample(), &[1.0, 2.0, 3.0], 0);
        assert!(matches!(result, Err(KolosalError::InvalidInput(_))));
    }

    #[test]
    fn test_nan_handling() {
        let mut binner = Bin::new(0, None).unwrap();
        assert!(binner.fit(&array![1.0, f64::NAN]).is_err());

        binner.fit(&sample()).unwrap();
        let binned = binner.transform(&array![f64::NAN, 0.0]).unwrap();
        assert!(binned[0].is_nan());
        assert_eq!(binned[1], 0.0);
    }

    #[test]
    fn test_infinite_values_rejected_at_fit() {
        let mut binner = Bin::new(0, Some(0)).unwrap();
        let x = array![[1.0, 2.0], [f64::INFINITY, 3.0]];
        assert!(matches!(binner.fit(&x), Err(KolosalError::InvalidInput(_))));
        assert!(binner.deciles().is_none());
    }

    #[test]
    fn test_bin_start_saturates() {
        let mut binner = Bin::new(i64::MAX - 2, None).unwrap();
        let binned = binner.fit_transform(&sample()).unwrap();

        // Top label would be i64::MAX + 7 without saturation
        assert_eq!(binned[[0, 2]], i64::MAX as f64);
        assert!(binned.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_integer_input() {
        let ints = array![[2_i64, 7, 9], [6, 9, 2], [4, 0, 2], [7, 2, 5]];
        let mut binner = Bin::new(1, None).unwrap();
        let binned = binner.fit_transform(&ints).unwrap();

        let expected = array![[1.0, 8.0, 10.0], [7.0, 10.0, 1.0], [5.0, 1.0, 1.0], [8.0, 1.0, 6.0]];
        assert_eq!(binned, expected);

        let mut by_column = Bin::new(0, Some(0)).unwrap();
        let from_ints = by_column.fit_transform(&ints.mapv(|v| v as u16)).unwrap();
        let from_floats = Bin::new(0, Some(0)).unwrap().fit_transform(&sample()).unwrap();
        assert_eq!(from_ints, from_floats);
    }

    #[test]
    fn test_serialize_fitted_state() {
        let mut binner = Bin::new(1, Some(0)).unwrap();
        binner.fit(&sample()).unwrap();

        let json = serde_json::to_string(&binner).unwrap();
        assert!(!json.contains("null"));
        let restored: Bin = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.deciles(), binner.deciles());
        assert_eq!(restored.deciles().unwrap()[0][N_DECILES - 1], f64::INFINITY);
        assert_eq!(
            restored.transform(&sample()).unwrap(),
            binner.transform(&sample()).unwrap()
        );
    }

    #[test]
    fn test_serialize_unfitted_state() {
        let binner = Bin::new(3, None).unwrap();
        let json = serde_json::to_string(&binner).unwrap();
        let restored: Bin = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.bin_start(), 3);
        assert_eq!(restored.axis(), BinAxis::All);
        assert!(restored.deciles().is_none());
    }

    #[test]
    fn test_deserialize_rejects_wrong_decile_count() {
        let json = r#"{"bin_start":0,"axis":"All","deciles":[[1.0,2.0]]}"#;
        assert!(serde_json::from_str::<Bin>(json).is_err());
    }
}
