//! Matrix with row and column labels

use crate::error::{KolosalError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A 2D matrix whose rows and columns carry labels.
///
/// Labels travel with their data: reordering rows also reorders
/// `rowlabels`, and likewise for columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledMatrix<A> {
    pub data: Array2<A>,
    pub rowlabels: Array1<String>,
    pub columnlabels: Array1<String>,
}

impl<A> LabeledMatrix<A> {
    /// Create a labeled matrix, checking that labels align with the data
    pub fn new(
        data: Array2<A>,
        rowlabels: Array1<String>,
        columnlabels: Array1<String>,
    ) -> Result<Self> {
        if rowlabels.len() != data.nrows() {
            return Err(KolosalError::ShapeError {
                expected: format!("{} row labels", data.nrows()),
                actual: format!("{} row labels", rowlabels.len()),
            });
        }
        if columnlabels.len() != data.ncols() {
            return Err(KolosalError::ShapeError {
                expected: format!("{} column labels", data.ncols()),
                actual: format!("{} column labels", columnlabels.len()),
            });
        }

        Ok(Self {
            data,
            rowlabels,
            columnlabels,
        })
    }

    /// Label rows and columns by position ("0", "1", ...)
    pub fn from_data(data: Array2<A>) -> Self {
        let rowlabels = (0..data.nrows()).map(|i| i.to_string()).collect();
        let columnlabels = (0..data.ncols()).map(|i| i.to_string()).collect();
        Self {
            data,
            rowlabels,
            columnlabels,
        }
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_data_labels() {
        let m = LabeledMatrix::from_data(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(m.rowlabels, array!["0".to_string(), "1".to_string()]);
        assert_eq!(m.columnlabels.len(), 3);
        assert_eq!(m.nrows(), 2);
        assert_eq!(m.ncols(), 3);
    }

    #[test]
    fn test_new_rejects_misaligned_labels() {
        let result = LabeledMatrix::new(
            array![[1.0, 2.0], [3.0, 4.0]],
            array!["r0".to_string()],
            array!["c0".to_string(), "c1".to_string()],
        );
        assert!(matches!(result, Err(KolosalError::ShapeError { .. })));
    }

    #[test]
    fn test_clone_is_independent() {
        let m = LabeledMatrix::from_data(array![[1.0, 2.0]]);
        let mut copy = m.clone();
        copy.data[[0, 0]] = 9.0;
        assert_eq!(m.data[[0, 0]], 1.0);
    }
}
