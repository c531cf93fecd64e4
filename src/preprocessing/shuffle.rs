//! Seeded row/column shuffling of labeled matrices

use super::config::ShufflerConfig;
use super::{Preprocess, PreprocessInPlace};
use crate::error::{KolosalError, Result};
use crate::utils::LabeledMatrix;
use ndarray::Axis;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

/// A uniformly random permutation of `0..size`
pub fn get_shuffle_indices<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..size).collect();
    indices.shuffle(rng);
    indices
}

/// One permutation per entry of `sizes`, drawn in order from the same generator
pub fn get_batch_shuffle_indices<R: Rng + ?Sized>(sizes: &[usize], rng: &mut R) -> Vec<Vec<usize>> {
    sizes.iter().map(|&size| get_shuffle_indices(size, rng)).collect()
}

/// A permutation of `0..size` drawn from a fresh generator seeded with `seed`
pub fn seeded_shuffle_indices(size: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    get_shuffle_indices(size, &mut rng)
}

/// The permutation that undoes `indices` (argsort of a permutation)
pub fn inverse_permutation(indices: &[usize]) -> Vec<usize> {
    let mut inverse = vec![0; indices.len()];
    for (position, &index) in indices.iter().enumerate() {
        inverse[index] = position;
    }
    inverse
}

fn is_permutation(indices: &[usize], size: usize) -> bool {
    if indices.len() != size {
        return false;
    }
    let mut seen = vec![false; size];
    for &index in indices {
        if index >= size || seen[index] {
            return false;
        }
        seen[index] = true;
    }
    true
}

/// Reorders rows and/or columns of a [`LabeledMatrix`] by a fixed permutation.
///
/// Each shuffler owns its generator, seeded at construction, so two shufflers
/// built with the same seed and flags draw the same permutations for the
/// same shapes regardless of how their calls interleave.
///
/// Permutations passed in by the caller are kept as given and must match the
/// fitted shape. Drawn permutations are kept across refits of the same shape
/// and redrawn when the shape changes.
#[derive(Debug, Clone)]
pub struct Shuffler {
    shuffle_rows: bool,
    shuffle_columns: bool,
    row_indices: Option<Vec<usize>>,
    column_indices: Option<Vec<usize>>,
    explicit_rows: bool,
    explicit_columns: bool,
    seed: u64,
    rng: ChaCha8Rng,
    is_fitted: bool,
}

impl Default for Shuffler {
    fn default() -> Self {
        Self::new()
    }
}

impl Shuffler {
    /// Shuffle rows only, seed 0
    pub fn new() -> Self {
        Self {
            shuffle_rows: true,
            shuffle_columns: false,
            row_indices: None,
            column_indices: None,
            explicit_rows: false,
            explicit_columns: false,
            seed: 0,
            rng: ChaCha8Rng::seed_from_u64(0),
            is_fitted: false,
        }
    }

    pub fn from_config(config: &ShufflerConfig) -> Self {
        let mut shuffler = Self::new()
            .with_rows(config.shuffle_rows)
            .with_columns(config.shuffle_columns)
            .with_seed(config.seed);
        if let Some(indices) = &config.row_indices {
            shuffler = shuffler.with_row_indices(indices.clone());
        }
        if let Some(indices) = &config.column_indices {
            shuffler = shuffler.with_column_indices(indices.clone());
        }
        shuffler
    }

    pub fn with_rows(mut self, shuffle_rows: bool) -> Self {
        self.shuffle_rows = shuffle_rows;
        self
    }

    pub fn with_columns(mut self, shuffle_columns: bool) -> Self {
        self.shuffle_columns = shuffle_columns;
        self
    }

    /// Use this row permutation instead of drawing one
    pub fn with_row_indices(mut self, indices: Vec<usize>) -> Self {
        self.row_indices = Some(indices);
        self.explicit_rows = true;
        self
    }

    /// Use this column permutation instead of drawing one
    pub fn with_column_indices(mut self, indices: Vec<usize>) -> Self {
        self.column_indices = Some(indices);
        self.explicit_columns = true;
        self
    }

    /// Reseed the shuffler's generator
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn row_indices(&self) -> Option<&[usize]> {
        self.row_indices.as_deref()
    }

    pub fn column_indices(&self) -> Option<&[usize]> {
        self.column_indices.as_deref()
    }

    fn check_fitted(&self) -> Result<()> {
        if self.is_fitted {
            Ok(())
        } else {
            Err(KolosalError::ModelNotFitted)
        }
    }

    fn reorder<A: Clone>(
        &self,
        matrix: &mut LabeledMatrix<A>,
        row_order: Option<&[usize]>,
        column_order: Option<&[usize]>,
    ) -> Result<()> {
        // Both orders are checked before the matrix is touched
        if let Some(order) = row_order {
            check_length("rows", order, matrix.nrows())?;
        }
        if let Some(order) = column_order {
            check_length("columns", order, matrix.ncols())?;
        }

        if let Some(order) = row_order {
            matrix.data = matrix.data.select(Axis(0), order);
            matrix.rowlabels = matrix.rowlabels.select(Axis(0), order);
        }
        if let Some(order) = column_order {
            matrix.data = matrix.data.select(Axis(1), order);
            matrix.columnlabels = matrix.columnlabels.select(Axis(0), order);
        }
        Ok(())
    }

    fn active_indices(&self) -> (Option<&[usize]>, Option<&[usize]>) {
        let rows = if self.shuffle_rows { self.row_indices() } else { None };
        let columns = if self.shuffle_columns { self.column_indices() } else { None };
        (rows, columns)
    }
}

fn check_length(what: &str, order: &[usize], size: usize) -> Result<()> {
    if order.len() != size {
        return Err(KolosalError::ShapeError {
            expected: format!("{} {}", order.len(), what),
            actual: format!("{} {}", size, what),
        });
    }
    Ok(())
}

fn check_explicit_indices(name: &str, indices: Option<&[usize]>, size: usize) -> Result<()> {
    match indices {
        Some(indices) if !is_permutation(indices, size) => Err(KolosalError::InvalidParameter {
            name: name.to_string(),
            value: format!("{:?}", indices),
            reason: format!("must be a permutation of 0..{}", size),
        }),
        _ => Ok(()),
    }
}

fn draw_indices(indices: &mut Option<Vec<usize>>, size: usize, rng: &mut ChaCha8Rng) {
    let reusable = matches!(indices.as_deref(), Some(existing) if existing.len() == size);
    if !reusable {
        *indices = Some(get_shuffle_indices(size, rng));
    }
}

impl<A: Clone> Preprocess<LabeledMatrix<A>> for Shuffler {
    type Output = LabeledMatrix<A>;

    fn fit(&mut self, matrix: &LabeledMatrix<A>) -> Result<&mut Self> {
        if !self.shuffle_rows && !self.shuffle_columns {
            warn!("Shuffler has neither rows nor columns enabled; transform is the identity");
        }
        if self.shuffle_rows && self.explicit_rows {
            check_explicit_indices("row_indices", self.row_indices(), matrix.nrows())?;
        }
        if self.shuffle_columns && self.explicit_columns {
            check_explicit_indices("column_indices", self.column_indices(), matrix.ncols())?;
        }

        if self.shuffle_rows && !self.explicit_rows {
            draw_indices(&mut self.row_indices, matrix.nrows(), &mut self.rng);
        }
        if self.shuffle_columns && !self.explicit_columns {
            draw_indices(&mut self.column_indices, matrix.ncols(), &mut self.rng);
        }

        debug!(
            rows = matrix.nrows(),
            columns = matrix.ncols(),
            shuffle_rows = self.shuffle_rows,
            shuffle_columns = self.shuffle_columns,
            "Fitted shuffler"
        );
        self.is_fitted = true;
        Ok(self)
    }

    fn transform(&self, matrix: &LabeledMatrix<A>) -> Result<LabeledMatrix<A>> {
        let mut result = matrix.clone();
        self.transform_inplace(&mut result)?;
        Ok(result)
    }

    fn reverse_transform(&self, matrix: &LabeledMatrix<A>) -> Result<LabeledMatrix<A>> {
        let mut result = matrix.clone();
        self.reverse_transform_inplace(&mut result)?;
        Ok(result)
    }
}

impl<A: Clone> PreprocessInPlace<LabeledMatrix<A>> for Shuffler {
    fn transform_inplace(&self, matrix: &mut LabeledMatrix<A>) -> Result<()> {
        self.check_fitted()?;
        let (rows, columns) = self.active_indices();
        self.reorder(matrix, rows, columns)
    }

    fn reverse_transform_inplace(&self, matrix: &mut LabeledMatrix<A>) -> Result<()> {
        self.check_fitted()?;
        let (rows, columns) = self.active_indices();
        let rows = rows.map(inverse_permutation);
        let columns = columns.map(inverse_permutation);
        self.reorder(matrix, rows.as_deref(), columns.as_deref())
    }
}
