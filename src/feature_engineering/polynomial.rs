//! Polynomial feature generation

use crate::error::{KolosalError, Result};
use crate::preprocessing::Preprocess;
use crate::utils::{unsupported_type, ElementKind, MatrixElement};
use ndarray::{Array2, ArrayBase, Data, Ix2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Separator between fragments of a lexical term of degree two or more
pub const LEXICAL_SEPARATOR: &str = "*";

/// Configuration for polynomial features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolynomialConfig {
    /// Maximum polynomial degree
    pub degree: usize,
    /// Include interaction terms only (no powers > 1 of same feature)
    pub interaction_only: bool,
    /// Include bias term (constant 1, or the empty string for lexical input)
    pub include_bias: bool,
}

impl Default for PolynomialConfig {
    fn default() -> Self {
        Self {
            degree: 2,
            interaction_only: false,
            include_bias: true,
        }
    }
}

/// Polynomial feature generator.
///
/// Output columns follow combination order: by increasing degree (starting
/// at the bias term when enabled), lexicographic within a degree. Numeric
/// input yields products of the selected columns; string input yields their
/// concatenation, joined with [`LEXICAL_SEPARATOR`] for terms of degree two
/// or more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolynomialFeatures {
    config: PolynomialConfig,
    n_input_features: Option<usize>,
    n_output_features: Option<usize>,
}

impl PolynomialFeatures {
    /// Create new polynomial feature generator
    pub fn new(degree: usize) -> Self {
        Self {
            config: PolynomialConfig {
                degree,
                ..Default::default()
            },
            n_input_features: None,
            n_output_features: None,
        }
    }

    pub fn from_config(config: &PolynomialConfig) -> Self {
        Self::new(config.degree).with_config(config.clone())
    }

    /// Set configuration
    pub fn with_config(mut self, config: PolynomialConfig) -> Self {
        self.config = config;
        self
    }

    /// Include bias term
    pub fn with_bias(mut self, include: bool) -> Self {
        self.config.include_bias = include;
        self
    }

    /// Set interaction only mode
    pub fn interaction_only(mut self, only: bool) -> Self {
        self.config.interaction_only = only;
        self
    }

    pub fn config(&self) -> &PolynomialConfig {
        &self.config
    }

    pub fn n_input_features(&self) -> Option<usize> {
        self.n_input_features
    }

    pub fn n_output_features(&self) -> Option<usize> {
        self.n_output_features
    }

    /// Feature index combinations, in output column order
    pub fn combinations(&self, n_features: usize) -> Vec<Vec<usize>> {
        let mut combinations = Vec::new();
        let start = if self.config.include_bias { 0 } else { 1 };

        for degree in start..=self.config.degree {
            self.push_combinations(n_features, degree, 0, &mut Vec::new(), &mut combinations);
        }

        combinations
    }

    fn push_combinations(
        &self,
        n_features: usize,
        remaining_degree: usize,
        start_idx: usize,
        current: &mut Vec<usize>,
        result: &mut Vec<Vec<usize>>,
    ) {
        if remaining_degree == 0 {
            result.push(current.clone());
            return;
        }

        for i in start_idx..n_features {
            current.push(i);
            // Repeating a feature is only allowed for powers
            let next = if self.config.interaction_only { i + 1 } else { i };
            self.push_combinations(n_features, remaining_degree - 1, next, current, result);
            current.pop();
        }
    }

    fn fitted_input_features(&self) -> Result<usize> {
        self.n_input_features.ok_or(KolosalError::ModelNotFitted)
    }

    /// Exponent of each input feature in each output feature,
    /// shape (n_output_features, n_input_features)
    pub fn powers(&self) -> Result<Array2<usize>> {
        let n_input = self.fitted_input_features()?;
        let combinations = self.combinations(n_input);

        let mut powers = Array2::zeros((combinations.len(), n_input));
        for (row, combination) in combinations.iter().enumerate() {
            for &feature in combination {
                powers[[row, feature]] += 1;
            }
        }
        Ok(powers)
    }

    /// Names of the output features, e.g. `1`, `a`, `a^2`, `a * b`.
    ///
    /// Inputs are named `x0`, `x1`, ... unless names are given.
    pub fn feature_names(&self, input_names: Option<&[String]>) -> Result<Vec<String>> {
        let n_input = self.fitted_input_features()?;
        if let Some(names) = input_names {
            if names.len() != n_input {
                return Err(KolosalError::ShapeError {
                    expected: format!("{} feature names", n_input),
                    actual: format!("{} feature names", names.len()),
                });
            }
        }

        let name_of = |idx: usize| {
            input_names
                .map(|names| names[idx].clone())
                .unwrap_or_else(|| format!("x{}", idx))
        };

        let names = self
            .combinations(n_input)
            .iter()
            .map(|combination| {
                if combination.is_empty() {
                    return "1".to_string();
                }

                let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
                for &idx in combination {
                    *counts.entry(idx).or_insert(0) += 1;
                }

                counts
                    .iter()
                    .map(|(&idx, &count)| {
                        if count == 1 {
                            name_of(idx)
                        } else {
                            format!("{}^{}", name_of(idx), count)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" * ")
            })
            .collect();

        Ok(names)
    }
}

impl Default for PolynomialFeatures {
    fn default() -> Self {
        Self::new(2)
    }
}

fn check_matrix<S: Data>(matrix: &ArrayBase<S, Ix2>) -> Result<()> {
    if matrix.is_empty() {
        return Err(KolosalError::InvalidInput("Matrix is empty".to_string()));
    }
    Ok(())
}

impl<A, S> Preprocess<ArrayBase<S, Ix2>> for PolynomialFeatures
where
    A: MatrixElement,
    S: Data<Elem = A>,
{
    type Output = Array2<A>;

    fn fit(&mut self, matrix: &ArrayBase<S, Ix2>) -> Result<&mut Self> {
        check_matrix(matrix)?;

        let n_features = matrix.ncols();
        let n_output = self.combinations(n_features).len();
        debug!(
            n_input = n_features,
            n_output,
            degree = self.config.degree,
            "Fitted polynomial features"
        );

        self.n_input_features = Some(n_features);
        self.n_output_features = Some(n_output);
        Ok(self)
    }

    fn transform(&self, matrix: &ArrayBase<S, Ix2>) -> Result<Array2<A>> {
        let n_input = self.fitted_input_features()?;
        check_matrix(matrix)?;

        let (n_samples, n_features) = matrix.dim();
        if n_features != n_input {
            return Err(KolosalError::ShapeError {
                expected: format!("{} features", n_input),
                actual: format!("{} features", n_features),
            });
        }
        if A::KIND == ElementKind::Other {
            return Err(unsupported_type::<A>());
        }

        let combinations = self.combinations(n_features);
        let mut values = Vec::with_capacity(n_samples * combinations.len());

        for row in matrix.rows() {
            for combination in &combinations {
                let selected: Vec<&A> = combination.iter().map(|&c| &row[c]).collect();
                let value = match A::KIND {
                    ElementKind::Numeric => A::multiply_all(&selected),
                    ElementKind::Lexical => {
                        let separator = if combination.len() > 1 { LEXICAL_SEPARATOR } else { "" };
                        A::join_all(&selected, separator)
                    }
                    ElementKind::Other => Err(unsupported_type::<A>()),
                };
                values.push(value?);
            }
        }

        Ok(Array2::from_shape_vec((n_samples, combinations.len()), values)?)
    }
}
