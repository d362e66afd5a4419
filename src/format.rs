//! Conversion of feature rows into the engine's line-oriented text format.
//!
//! A labeled line has the shape `"<label> <weight> |<namespace> <idx>:<value> ..."`
//! with 1-based feature indices and exact zeros omitted. Labels and weights
//! default to 1 when not supplied; the default namespace is the empty string.
//! Conversion is stateless and has no side effects beyond the output vector.
use ndarray::Array2;

use crate::error::EstimatorError;

/// Features without an explicit namespace go into the empty-named group.
pub const DEFAULT_NAMESPACE: &str = "";

/// Characters reserved by the engine's input grammar.
const RESERVED_CHARS: [char; 4] = ['|', ':', ' ', '\n'];

/// A batch of feature rows accepted by the estimators.
///
/// Dense and sparse inputs are encoded through the same sparse-dump step;
/// `Lines` carries pre-formatted engine text and is passed through
/// untouched (used when `convert_to_vw` is off).
#[derive(Debug, Clone, PartialEq)]
pub enum VwInput {
    /// Dense matrix, n_samples x n_features.
    Dense(Array2<f64>),
    /// Sparse rows as 0-based (column, value) pairs.
    Sparse {
        n_cols: usize,
        rows: Vec<Vec<(usize, f64)>>,
    },
    /// Already-formatted labeled lines.
    Lines(Vec<String>),
}

impl VwInput {
    /// Promote a single 1-D row to a 1 x F matrix.
    pub fn from_row(row: Vec<f64>) -> Self {
        let n_cols = row.len();
        VwInput::Dense(Array2::from_shape_vec((1, n_cols), row).expect("1 x F shape is always valid"))
    }

    /// Build a dense input from rectangular nested rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, EstimatorError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, |r| r.len());
        let mut flat = Vec::with_capacity(n_rows * n_cols);
        for row in &rows {
            if row.len() != n_cols {
                return Err(EstimatorError::ShapeMismatch {
                    expected: n_cols,
                    actual: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        let x = Array2::from_shape_vec((n_rows, n_cols), flat).map_err(|e| {
            EstimatorError::UnsupportedType(format!("cannot shape input matrix: {}", e))
        })?;
        Ok(VwInput::Dense(x))
    }

    /// Build a dense input from string-typed rows.
    ///
    /// Each entry is sanitized (reserved delimiter runs collapse to `.`)
    /// and then coerced to a number; entries that still fail to parse
    /// yield [`EstimatorError::UnsupportedType`].
    pub fn from_text_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Self, EstimatorError> {
        let mut numeric = Vec::with_capacity(rows.len());
        for row in rows {
            let mut values = Vec::with_capacity(row.len());
            for entry in row {
                values.push(coerce_feature(entry.as_ref())?);
            }
            numeric.push(values);
        }
        VwInput::from_rows(numeric)
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        VwInput::Lines(lines)
    }

    pub fn n_rows(&self) -> usize {
        match self {
            VwInput::Dense(x) => x.nrows(),
            VwInput::Sparse { rows, .. } => rows.len(),
            VwInput::Lines(lines) => lines.len(),
        }
    }
}

impl From<Array2<f64>> for VwInput {
    fn from(x: Array2<f64>) -> Self {
        VwInput::Dense(x)
    }
}

/// Replace any run of engine-reserved delimiter characters with a single `.`.
pub fn sanitize_feature(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_run = false;
    for c in raw.chars() {
        if RESERVED_CHARS.contains(&c) {
            if !in_run {
                out.push('.');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Sanitize a string-typed feature entry and coerce it to a number.
pub fn coerce_feature(raw: &str) -> Result<f64, EstimatorError> {
    sanitize_feature(raw)
        .parse::<f64>()
        .map_err(|_| EstimatorError::UnsupportedType(raw.to_string()))
}

/// Encode one row of 0-based (column, value) pairs as a labeled line.
///
/// Label and weight default to 1; exact zeros are dropped by the dump
/// step; values keep their default decimal representation.
pub fn encode_row(
    pairs: &[(usize, f64)],
    label: Option<f64>,
    weight: Option<f64>,
    namespace: &str,
) -> String {
    let label = label.unwrap_or(1.0);
    let weight = weight.unwrap_or(1.0);
    let mut line = format!("{} {} |{}", label, weight, namespace);
    for &(col, value) in pairs {
        if value != 0.0 {
            line.push_str(&format!(" {}:{}", col + 1, value));
        }
    }
    line
}

/// Convert row `idx` of `x` into a labeled line.
///
/// `Lines` input is already formatted and is returned as-is; sparse rows
/// are ordered by column before encoding, and a pair whose column falls
/// outside the declared width fails with
/// [`EstimatorError::ShapeMismatch`].
pub fn convert_row(
    x: &VwInput,
    idx: usize,
    label: Option<f64>,
    weight: Option<f64>,
) -> Result<String, EstimatorError> {
    match x {
        VwInput::Dense(m) => {
            let pairs: Vec<(usize, f64)> = m.row(idx).iter().copied().enumerate().collect();
            Ok(encode_row(&pairs, label, weight, DEFAULT_NAMESPACE))
        }
        VwInput::Sparse { n_cols, rows } => {
            let mut pairs = rows[idx].clone();
            pairs.sort_unstable_by_key(|&(col, _)| col);
            if let Some(&(col, _)) = pairs.last() {
                if col >= *n_cols {
                    return Err(EstimatorError::ShapeMismatch {
                        expected: *n_cols,
                        actual: col + 1,
                    });
                }
            }
            Ok(encode_row(&pairs, label, weight, DEFAULT_NAMESPACE))
        }
        VwInput::Lines(lines) => Ok(lines[idx].clone()),
    }
}

/// Convert a batch of feature rows into labeled lines, one per row, in
/// input order.
///
/// Fails with [`EstimatorError::ShapeMismatch`] when a provided label or
/// weight vector disagrees with the row count.
pub fn convert(
    x: &VwInput,
    labels: Option<&[f64]>,
    weights: Option<&[f64]>,
) -> Result<Vec<String>, EstimatorError> {
    let n_rows = x.n_rows();
    check_len(labels, n_rows)?;
    check_len(weights, n_rows)?;

    let mut out = Vec::with_capacity(n_rows);
    for idx in 0..n_rows {
        out.push(convert_row(
            x,
            idx,
            labels.map(|l| l[idx]),
            weights.map(|w| w[idx]),
        )?);
    }
    Ok(out)
}

pub(crate) fn check_len(values: Option<&[f64]>, n_rows: usize) -> Result<(), EstimatorError> {
    match values {
        Some(v) if v.len() != n_rows => Err(EstimatorError::ShapeMismatch {
            expected: n_rows,
            actual: v.len(),
        }),
        _ => Ok(()),
    }
}
