//! Transformer configuration

use crate::error::Result;
use crate::feature_engineering::PolynomialConfig;
use serde::{Deserialize, Serialize};

/// Configuration for [`super::Standardize`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardizeConfig {
    /// Axis along which mean and std are computed
    pub axis: usize,
}

impl Default for StandardizeConfig {
    fn default() -> Self {
        Self { axis: 0 }
    }
}

impl StandardizeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the axis
    pub fn with_axis(mut self, axis: usize) -> Self {
        self.axis = axis;
        self
    }
}

/// Configuration for [`super::Bin`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinConfig {
    /// Label given to the lowest bin
    pub bin_start: i64,
    /// `None` bins the whole matrix, `0` per column, `1` per row
    pub axis: Option<usize>,
}

impl Default for BinConfig {
    fn default() -> Self {
        Self {
            bin_start: 0,
            axis: None,
        }
    }
}

impl BinConfig {
    pub fn new(bin_start: i64) -> Self {
        Self {
            bin_start,
            ..Default::default()
        }
    }

    /// Builder method to set the axis
    pub fn with_axis(mut self, axis: Option<usize>) -> Self {
        self.axis = axis;
        self
    }
}

/// Configuration for [`super::Shuffler`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShufflerConfig {
    pub shuffle_rows: bool,
    pub shuffle_columns: bool,
    /// Explicit row permutation; drawn at fit time when absent
    pub row_indices: Option<Vec<usize>>,
    /// Explicit column permutation; drawn at fit time when absent
    pub column_indices: Option<Vec<usize>>,
    /// Seed for the shuffler's own generator
    pub seed: u64,
}

impl Default for ShufflerConfig {
    fn default() -> Self {
        Self {
            shuffle_rows: true,
            shuffle_columns: false,
            row_indices: None,
            column_indices: None,
            seed: 0,
        }
    }
}

impl ShufflerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to toggle row shuffling
    pub fn with_rows(mut self, shuffle_rows: bool) -> Self {
        self.shuffle_rows = shuffle_rows;
        self
    }

    /// Builder method to toggle column shuffling
    pub fn with_columns(mut self, shuffle_columns: bool) -> Self {
        self.shuffle_columns = shuffle_columns;
        self
    }

    /// Builder method to set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Configuration of any transformer, tagged by kind.
///
/// ```json
/// {"type": "bin", "bin_start": 1, "axis": 0}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformerConfig {
    Standardize(StandardizeConfig),
    Bin(BinConfig),
    Shuffler(ShufflerConfig),
    PolynomialFeatures(PolynomialConfig),
}

impl TransformerConfig {
    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
