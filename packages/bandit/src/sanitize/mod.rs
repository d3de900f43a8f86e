//! Numeric guards for LinUCB: context checks, factor refresh policy and
//! health diagnostics.

use nalgebra::{Cholesky, DMatrix, Dyn};
use serde::{Deserialize, Serialize};

use crate::error::{BanditError, Result};
use crate::types::ContextVector;

/// Smallest acceptable diagonal entry of a Cholesky factor.
pub const MIN_FACTOR_DIAG: f64 = 1e-6;

/// Rank-one updated factors are rebuilt from `A` at this cadence.
pub const FACTOR_REFRESH_INTERVAL: u64 = 100;

/// Diagonal ratio of the factor above which it is rebuilt early.
pub const MAX_DIAG_RATIO: f64 = 1e8;

/// Condition estimate above which a model is reported unhealthy.
pub const MAX_CONDITION: f64 = 1e12;

const EPSILON: f64 = 1e-10;

/// Health report for one arm's model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub is_healthy: bool,
    pub has_nan: bool,
    pub has_inf: bool,
    pub condition_number: f64,
    pub min_diagonal: f64,
    pub max_diagonal: f64,
    pub message: String,
}

/// Reject vectors LinUCB cannot fold into `A` without poisoning it.
pub fn validate_context(x: &ContextVector) -> Result<()> {
    if x.dim() == 0 {
        return Err(BanditError::invalid_input("context vector is empty"));
    }
    if !x.is_finite() {
        return Err(BanditError::invalid_input(
            "context vector contains NaN or infinite values",
        ));
    }
    Ok(())
}

/// Whether the incrementally maintained factor should be rebuilt from `A`.
pub fn needs_factor_refresh(update_count: u64, factor: &Cholesky<f64, Dyn>) -> bool {
    if update_count % FACTOR_REFRESH_INTERVAL == 0 {
        return true;
    }

    let diag = factor.l_dirty().diagonal();
    if diag
        .iter()
        .any(|&v| !v.is_finite() || v < MIN_FACTOR_DIAG)
    {
        return true;
    }

    let (min_diag, max_diag) = diag_range(diag.as_slice());
    min_diag > 0.0 && max_diag / min_diag > MAX_DIAG_RATIO
}

/// Inspect `A` and its factor for NaN/Inf and conditioning.
pub fn diagnose(a: &DMatrix<f64>, factor: &Cholesky<f64, Dyn>) -> DiagnosticResult {
    let has_nan = a.iter().any(|v| v.is_nan());
    let has_inf = a.iter().any(|v| v.is_infinite());

    let diag = factor.l_dirty().diagonal();
    let finite: Vec<f64> = diag
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect();
    let has_nan = has_nan || diag.iter().any(|v| v.is_nan());
    let has_inf = has_inf || diag.iter().any(|v| v.is_infinite());

    let (min_diagonal, max_diagonal) = if finite.is_empty() {
        (0.0, 0.0)
    } else {
        diag_range(&finite)
    };

    // cond(A) = cond(L)^2, estimated from the factor's diagonal
    let condition_number = if min_diagonal > EPSILON {
        (max_diagonal / min_diagonal).powi(2)
    } else {
        f64::MAX
    };

    let is_healthy = !has_nan && !has_inf && condition_number < MAX_CONDITION;

    let message = if is_healthy {
        "Model is healthy".to_string()
    } else if has_nan {
        "Model contains NaN values".to_string()
    } else if has_inf {
        "Model contains infinite values".to_string()
    } else {
        format!("Model has high condition number: {:.2e}", condition_number)
    };

    DiagnosticResult {
        is_healthy,
        has_nan,
        has_inf,
        condition_number,
        min_diagonal,
        max_diagonal,
        message,
    }
}

fn diag_range(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}
