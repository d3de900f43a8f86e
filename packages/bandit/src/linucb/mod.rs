//! Disjoint LinUCB: one ridge-regression model per arm.
//!
//! Each arm keeps `A = lambda * I + sum(x x^T)` and `b = sum(r x)`. Scores are
//! `theta^T x + alpha * sqrt(x^T A^-1 x)` with `theta = A^-1 b`. Solves go
//! through a Cholesky factor of `A` that is rank-one updated after each
//! observation and periodically rebuilt from `A`.

use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::LinUcbConfig;
use crate::error::{BanditError, Result};
use crate::sanitize::{diagnose, needs_factor_refresh, validate_context, DiagnosticResult};
use crate::strategy::{ensure_candidates, ensure_finite_reward, Strategy};
use crate::types::{ArmId, ContextMap, ContextVector};

/// Score breakdown for one (arm, context) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UcbStats {
    /// Ridge coefficients `A^-1 b`
    pub theta: Vec<f64>,
    /// Point prediction `theta^T x`
    pub exploitation: f64,
    /// Confidence width `alpha * sqrt(x^T A^-1 x)`
    pub width: f64,
    pub score: f64,
}

/// Per-arm ridge-regression state.
#[derive(Debug, Clone)]
pub struct ArmModel {
    /// Covariance `A` (d x d, symmetric positive-definite)
    a: DMatrix<f64>,
    /// Reward-weighted feature sum `b` (d)
    b: DVector<f64>,
    /// Lower Cholesky factor of `a`
    factor: Cholesky<f64, Dyn>,
    update_count: u64,
}

impl ArmModel {
    fn new(d: usize, lambda: f64) -> Self {
        let a = DMatrix::<f64>::identity(d, d) * lambda;
        // lambda > 0 is enforced by the config, so lambda * I is positive-definite.
        let factor = Cholesky::new_unchecked(a.clone());
        Self {
            a,
            b: DVector::zeros(d),
            factor,
            update_count: 0,
        }
    }

    pub fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    pub fn b(&self) -> &DVector<f64> {
        &self.b
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    pub fn theta(&self) -> DVector<f64> {
        self.factor.solve(&self.b)
    }

    fn stats(&self, x: &DVector<f64>, alpha: f64) -> UcbStats {
        let theta = self.theta();
        let exploitation = theta.dot(x);
        // x^T A^-1 x is non-negative in exact arithmetic; clamp rounding noise.
        let quadratic = x.dot(&self.factor.solve(x)).max(0.0);
        let width = alpha * quadratic.sqrt();
        UcbStats {
            theta: theta.as_slice().to_vec(),
            exploitation,
            width,
            score: exploitation + width,
        }
    }

    fn observe(&mut self, x: &DVector<f64>, reward: f64) {
        // A += x x^T
        self.a.ger(1.0, x, x, 1.0);
        // b += r x
        self.b.axpy(reward, x, 1.0);
        self.update_count += 1;

        self.factor.rank_one_update(x, 1.0);
        if needs_factor_refresh(self.update_count, &self.factor) {
            self.refresh_factor();
        }
    }

    fn refresh_factor(&mut self) {
        match Cholesky::new(self.a.clone()) {
            Some(factor) => {
                tracing::debug!(updates = self.update_count, "LinUCB factor rebuilt from A");
                self.factor = factor;
            }
            None => {
                tracing::warn!(
                    updates = self.update_count,
                    "LinUCB refactorization failed, keeping rank-one updated factor"
                );
            }
        }
    }
}

/// LinUCB over lazily discovered arms sharing one context dimension.
#[derive(Debug, Clone)]
pub struct LinUcb {
    config: LinUcbConfig,
    dimension: Option<usize>,
    arms: HashMap<ArmId, ArmModel>,
}

impl LinUcb {
    pub fn new(config: LinUcbConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            dimension: config.dimension,
            config,
            arms: HashMap::new(),
        })
    }

    pub fn with_alpha(alpha: f64) -> Result<Self> {
        Self::new(LinUcbConfig {
            alpha,
            ..Default::default()
        })
    }

    pub fn alpha(&self) -> f64 {
        self.config.alpha
    }

    pub fn lambda(&self) -> f64 {
        self.config.lambda
    }

    /// Context dimension in use; `None` until the first vector is seen.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn arm_count(&self) -> usize {
        self.arms.len()
    }

    pub fn arm_model(&self, arm: &ArmId) -> Option<&ArmModel> {
        self.arms.get(arm)
    }

    pub fn theta(&self, arm: &ArmId) -> Option<Vec<f64>> {
        self.arms.get(arm).map(|m| m.theta().as_slice().to_vec())
    }

    /// Score breakdown for `arm` under context `x` without touching state.
    pub fn ucb_stats(&self, arm: &ArmId, x: &ContextVector) -> Result<UcbStats> {
        let v = self.to_vector(x)?;
        let stats = match self.arms.get(arm) {
            Some(model) => model.stats(&v, self.config.alpha),
            None => ArmModel::new(v.len(), self.config.lambda).stats(&v, self.config.alpha),
        };
        Ok(stats)
    }

    pub fn confidence_width(&self, arm: &ArmId, x: &ContextVector) -> Result<f64> {
        Ok(self.ucb_stats(arm, x)?.width)
    }

    pub fn diagnose(&self, arm: &ArmId) -> Option<DiagnosticResult> {
        self.arms.get(arm).map(|m| diagnose(&m.a, &m.factor))
    }

    fn to_vector(&self, x: &ContextVector) -> Result<DVector<f64>> {
        validate_context(x)?;
        if let Some(d) = self.dimension {
            if x.dim() != d {
                return Err(BanditError::invalid_input(format!(
                    "context dimension {} does not match {d}",
                    x.dim()
                )));
            }
        }
        Ok(DVector::from_column_slice(x.as_slice()))
    }

    /// Like `to_vector`, but fixes the run's dimension on first use.
    fn bind_vector(&mut self, x: &ContextVector) -> Result<DVector<f64>> {
        let v = self.to_vector(x)?;
        if self.dimension.is_none() {
            self.dimension = Some(v.len());
        }
        Ok(v)
    }

    fn ensure_arm(&mut self, arm: &ArmId, d: usize) -> &mut ArmModel {
        let lambda = self.config.lambda;
        self.arms
            .entry(arm.clone())
            .or_insert_with(|| ArmModel::new(d, lambda))
    }
}

impl Strategy for LinUcb {
    fn name(&self) -> &str {
        "LinUCB"
    }

    fn requires_context(&self) -> bool {
        true
    }

    fn context_dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn select(&mut self, candidates: &[ArmId], contexts: Option<&ContextMap>) -> Result<ArmId> {
        ensure_candidates(candidates)?;
        let contexts = contexts.ok_or_else(|| {
            BanditError::invalid_input("LinUCB requires a context vector for every candidate")
        })?;

        // Check every candidate before touching any state.
        let mut vectors = Vec::with_capacity(candidates.len());
        for arm in candidates {
            let x = contexts.get(arm).ok_or_else(|| {
                BanditError::invalid_input(format!("missing context for candidate {arm}"))
            })?;
            vectors.push(self.to_vector(x)?);
        }
        let d = vectors[0].len();
        if let Some((arm, v)) = candidates.iter().zip(&vectors).find(|(_, v)| v.len() != d) {
            return Err(BanditError::invalid_input(format!(
                "context for {arm} has dimension {}, expected {d}",
                v.len()
            )));
        }
        if self.dimension.is_none() {
            self.dimension = Some(d);
        }

        let alpha = self.config.alpha;
        let mut best = &candidates[0];
        let mut best_score = f64::NEG_INFINITY;
        for (arm, v) in candidates.iter().zip(&vectors) {
            let stats = self.ensure_arm(arm, d).stats(v, alpha);
            if stats.score > best_score {
                best_score = stats.score;
                best = arm;
            }
        }

        Ok(best.clone())
    }

    fn update(&mut self, arm: &ArmId, reward: f64, context: Option<&ContextVector>) -> Result<()> {
        ensure_finite_reward(reward)?;
        let x = context.ok_or_else(|| {
            BanditError::invalid_input(format!("LinUCB update for {arm} needs its context vector"))
        })?;
        let v = self.bind_vector(x)?;
        self.ensure_arm(arm, v.len()).observe(&v, reward);
        Ok(())
    }

    fn reset(&mut self) {
        self.arms.clear();
        self.dimension = self.config.dimension;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arm(id: &str) -> ArmId {
        ArmId::from(id)
    }

    fn ctx(values: &[f64]) -> ContextVector {
        ContextVector::new(values.to_vec())
    }

    fn contexts(pairs: &[(&str, &[f64])]) -> ContextMap {
        pairs.iter().map(|(a, v)| (arm(a), ctx(v))).collect()
    }

    /// Deterministic pseudo-random vectors for long update sequences.
    fn lcg_vector(state: &mut u64, d: usize) -> Vec<f64> {
        (0..d)
            .map(|_| {
                *state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((*state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
            })
            .collect()
    }

    #[test]
    fn test_fresh_arm_scores_pure_width() {
        let linucb = LinUcb::with_alpha(0.5).unwrap();
        let stats = linucb.ucb_stats(&arm("a"), &ctx(&[3.0, 4.0])).unwrap();
        // A = I, b = 0: theta = 0, width = 0.5 * |x| = 2.5
        assert!(stats.exploitation.abs() < 1e-12);
        assert!((stats.width - 2.5).abs() < 1e-12);
        assert!((stats.score - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_theta_matches_closed_form_ridge() {
        let mut linucb = LinUcb::with_alpha(1.0).unwrap();
        let x = [0.6, -0.2, 1.0];
        let r = 1.0;
        let k = 25;
        for _ in 0..k {
            linucb.update(&arm("a"), r, Some(&ctx(&x))).unwrap();
        }

        // (lambda I + k x x^T)^-1 k r x = k r x / (lambda + k |x|^2)
        let norm_sq: f64 = x.iter().map(|v| v * v).sum();
        let scale = k as f64 * r / (1.0 + k as f64 * norm_sq);
        let theta = linucb.theta(&arm("a")).unwrap();
        for (got, xi) in theta.iter().zip(x.iter()) {
            assert!((got - scale * xi).abs() < 1e-10, "{got} vs {}", scale * xi);
        }
    }

    #[test]
    fn test_incremental_factor_matches_exact_solve() {
        let mut linucb = LinUcb::with_alpha(1.0).unwrap();
        let mut state = 17u64;
        for i in 0..250 {
            let x = lcg_vector(&mut state, 5);
            let reward = if i % 3 == 0 { 1.0 } else { 0.0 };
            linucb.update(&arm("a"), reward, Some(&ctx(&x))).unwrap();
        }

        let model = linucb.arm_model(&arm("a")).unwrap();
        assert_eq!(model.update_count(), 250);
        let exact = model
            .a()
            .clone()
            .try_inverse()
            .expect("ridge matrix is invertible")
            * model.b();
        let theta = model.theta();
        for i in 0..5 {
            assert!((theta[i] - exact[i]).abs() < 1e-8);
        }

        let a = model.a();
        for i in 0..5 {
            for j in 0..5 {
                assert_eq!(a[(i, j)], a[(j, i)]);
            }
        }
        assert!(linucb.diagnose(&arm("a")).unwrap().is_healthy);
    }

    #[test]
    fn test_width_shrinks_with_observations() {
        let mut linucb = LinUcb::with_alpha(1.0).unwrap();
        let x = ctx(&[0.3, 0.7, 0.1]);
        let mut last = linucb.confidence_width(&arm("a"), &x).unwrap();
        assert!(last > 0.0);

        for _ in 0..40 {
            linucb.update(&arm("a"), 0.0, Some(&x)).unwrap();
            let width = linucb.confidence_width(&arm("a"), &x).unwrap();
            assert!(width >= 0.0);
            assert!(width < last, "width {width} did not shrink below {last}");
            last = width;
        }
    }

    #[test]
    fn test_zero_alpha_is_pure_exploitation() {
        let linucb = LinUcb::with_alpha(0.0).unwrap();
        let stats = linucb.ucb_stats(&arm("a"), &ctx(&[1.0, 1.0])).unwrap();
        assert_eq!(stats.width, 0.0);
    }

    #[test]
    fn test_select_prefers_learned_arm() {
        let mut linucb = LinUcb::with_alpha(0.1).unwrap();
        let x = [1.0, 0.0];
        for _ in 0..10 {
            linucb.update(&arm("good"), 1.0, Some(&ctx(&x))).unwrap();
            linucb.update(&arm("bad"), 0.0, Some(&ctx(&x))).unwrap();
        }
        let map = contexts(&[("bad", &x), ("good", &x)]);
        let picked = linucb.select(&[arm("bad"), arm("good")], Some(&map)).unwrap();
        assert_eq!(picked, arm("good"));
    }

    #[test]
    fn test_unseen_arm_explored_first() {
        let mut linucb = LinUcb::with_alpha(1.0).unwrap();
        let x = [1.0, 0.0];
        for _ in 0..20 {
            linucb.update(&arm("old"), 0.0, Some(&ctx(&x))).unwrap();
        }
        let map = contexts(&[("old", &x), ("new", &x)]);
        let picked = linucb.select(&[arm("old"), arm("new")], Some(&map)).unwrap();
        assert_eq!(picked, arm("new"));
        assert_eq!(linucb.arm_count(), 2);
    }

    #[test]
    fn test_select_requires_contexts() {
        let mut linucb = LinUcb::with_alpha(1.0).unwrap();
        let err = linucb.select(&[arm("a")], None).unwrap_err();
        assert!(err.is_invalid_input());

        let map = contexts(&[("a", &[1.0])]);
        let err = linucb.select(&[arm("a"), arm("b")], Some(&map)).unwrap_err();
        assert!(err.is_invalid_input());

        assert!(linucb.select(&[], Some(&map)).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_failed_select_leaves_state_untouched() {
        let mut linucb = LinUcb::with_alpha(1.0).unwrap();
        let map = contexts(&[("a", &[1.0, 0.0])]);
        let err = linucb.select(&[arm("a"), arm("b")], Some(&map)).unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(linucb.dimension(), None);
        assert_eq!(linucb.arm_count(), 0);

        let ragged = contexts(&[("a", &[1.0, 0.0]), ("b", &[1.0])]);
        assert!(linucb.select(&[arm("a"), arm("b")], Some(&ragged)).is_err());
        assert_eq!(linucb.dimension(), None);
        assert_eq!(linucb.arm_count(), 0);
    }

    #[test]
    fn test_update_requires_context() {
        let mut linucb = LinUcb::with_alpha(1.0).unwrap();
        assert!(linucb.update(&arm("a"), 1.0, None).unwrap_err().is_invalid_input());
        assert!(linucb
            .update(&arm("a"), 1.0, Some(&ctx(&[f64::NAN])))
            .unwrap_err()
            .is_invalid_input());
    }

    #[test]
    fn test_dimension_fixed_after_first_context() {
        let mut linucb = LinUcb::with_alpha(1.0).unwrap();
        assert_eq!(linucb.dimension(), None);
        linucb.update(&arm("a"), 1.0, Some(&ctx(&[1.0, 2.0]))).unwrap();
        assert_eq!(linucb.dimension(), Some(2));
        let err = linucb.update(&arm("b"), 1.0, Some(&ctx(&[1.0, 2.0, 3.0]))).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_configured_dimension_enforced() {
        let config = LinUcbConfig {
            dimension: Some(3),
            ..Default::default()
        };
        let mut linucb = LinUcb::new(config).unwrap();
        assert!(linucb.update(&arm("a"), 0.0, Some(&ctx(&[1.0]))).is_err());
        assert!(linucb.update(&arm("a"), 0.0, Some(&ctx(&[1.0, 0.0, 0.0]))).is_ok());
    }

    #[test]
    fn test_collinear_contexts_stay_invertible() {
        let mut linucb = LinUcb::with_alpha(1.0).unwrap();
        for _ in 0..500 {
            linucb.update(&arm("a"), 1.0, Some(&ctx(&[1.0, 1.0, 0.0]))).unwrap();
        }
        let diag = linucb.diagnose(&arm("a")).unwrap();
        assert!(!diag.has_nan && !diag.has_inf);
        let width = linucb.confidence_width(&arm("a"), &ctx(&[0.0, 0.0, 1.0])).unwrap();
        // The untouched direction keeps its prior width.
        assert!((width - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_restores_configured_dimension() {
        let mut linucb = LinUcb::with_alpha(1.0).unwrap();
        linucb.update(&arm("a"), 1.0, Some(&ctx(&[1.0, 2.0]))).unwrap();
        linucb.reset();
        assert_eq!(linucb.arm_count(), 0);
        assert_eq!(linucb.dimension(), None);
    }
}
