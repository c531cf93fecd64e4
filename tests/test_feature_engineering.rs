//! Integration test: polynomial features and preprocessing chains

use kolosal_transforms::feature_engineering::{PolynomialConfig, PolynomialFeatures};
use kolosal_transforms::preprocessing::{Bin, Preprocess};
use kolosal_transforms::utils::{is_lexical_matrix, is_numeric_matrix};
use kolosal_transforms::KolosalError;
use ndarray::{array, Array2};

fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}

/// Number of terms counted from closed forms, independent of the generator
fn expected_feature_count(n: usize, degree: usize, interaction_only: bool, include_bias: bool) -> usize {
    let start = if include_bias { 0 } else { 1 };
    (start..=degree)
        .map(|d| {
            if interaction_only {
                binomial(n, d)
            } else {
                binomial(n + d - 1, d)
            }
        })
        .sum()
}

#[test]
fn test_feature_count_matches_closed_form() {
    for n in 1..6 {
        for degree in 0..4 {
            for interaction_only in [false, true] {
                for include_bias in [false, true] {
                    let config = PolynomialConfig {
                        degree,
                        interaction_only,
                        include_bias,
                    };
                    let mut poly = PolynomialFeatures::from_config(&config);
                    let x = Array2::<f64>::ones((2, n));
                    poly.fit(&x).unwrap();

                    assert_eq!(
                        poly.n_output_features(),
                        Some(expected_feature_count(n, degree, interaction_only, include_bias)),
                        "n={} degree={} interaction_only={} include_bias={}",
                        n,
                        degree,
                        interaction_only,
                        include_bias
                    );
                }
            }
        }
    }
}

#[test]
fn test_output_width_matches_fitted_count() {
    let x = array![[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]];
    let mut poly = PolynomialFeatures::new(3).interaction_only(true);
    let out = poly.fit_transform(&x).unwrap();

    assert_eq!(Some(out.ncols()), poly.n_output_features());
    assert_eq!(out.nrows(), 2);
    // Last term is x1 * x2 * x3 for the second row
    assert_eq!(out[[1, out.ncols() - 1]], 6.0 * 7.0 * 8.0);
}

#[test]
fn test_bin_then_expand() {
    let x = array![[2.0, 7.0, 9.0], [6.0, 9.0, 2.0], [4.0, 0.0, 2.0], [7.0, 2.0, 5.0]];
    assert!(is_numeric_matrix(&x));
    assert!(!is_lexical_matrix(&x));

    let mut binner = Bin::new(1, None).unwrap();
    let binned = binner.fit_transform(&x).unwrap();

    let mut poly = PolynomialFeatures::new(2).with_bias(false).interaction_only(true);
    let expanded = poly.fit_transform(&binned).unwrap();

    let expected = array![
        [1.0, 8.0, 10.0, 8.0, 10.0, 80.0],
        [7.0, 10.0, 1.0, 70.0, 7.0, 10.0],
        [5.0, 1.0, 1.0, 5.0, 5.0, 1.0],
        [8.0, 1.0, 6.0, 8.0, 48.0, 6.0]
    ];
    assert_eq!(expanded, expected);
}

#[test]
fn test_bias_column_prepended() {
    let x = array![[1.0, 8.0, 10.0], [7.0, 10.0, 1.0]];
    let without = PolynomialFeatures::new(2).with_bias(false).fit_transform(&x).unwrap();
    let with = PolynomialFeatures::new(2).fit_transform(&x).unwrap();

    assert_eq!(with.ncols(), without.ncols() + 1);
    assert!(with.column(0).iter().all(|&v| v == 1.0));
    assert_eq!(with.slice(ndarray::s![.., 1..]), without);
}

#[test]
fn test_lexical_expansion() {
    let x = array![["a".to_string(), "b".to_string(), "c".to_string()]];
    assert!(is_lexical_matrix(&x));

    let mut poly = PolynomialFeatures::default();
    let out = poly.fit_transform(&x).unwrap();
    assert_eq!(
        out.row(0).to_vec(),
        vec!["", "a", "b", "c", "a*a", "a*b", "a*c", "b*b", "b*c", "c*c"]
    );

    let names = poly.feature_names(None).unwrap();
    assert_eq!(names.len(), out.ncols());
}

#[test]
fn test_lexical_transform_rejects_width_change() {
    let mut poly = PolynomialFeatures::default();
    poly.fit(&array![["a".to_string(), "b".to_string()]]).unwrap();

    let result = poly.transform(&array![["a".to_string()]]);
    assert!(matches!(result, Err(KolosalError::ShapeError { .. })));
}
