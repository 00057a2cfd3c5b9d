//! QUEST adaptive threshold estimation (Watson & Pelli, 1983).
//!
//! The observer is modelled by a Weibull psychometric function on an
//! abstract intensity axis, usually log10 contrast:
//!
//! `p(x) = δγ + (1 − δ)(1 − (1 − γ)·exp(−10^(β(x + x_threshold))))`
//!
//! A discretized posterior over the threshold starts as a Gaussian around
//! the guess and is multiplied by the likelihood of each response. The
//! posterior mean, mode and quantiles give trial placements and the final
//! estimate.

use crate::error::{Result, TachyError};

const EPS: f64 = 2.2204e-16;

/// Table size used when no intensity range is given.
const DEFAULT_DIM: usize = 500;

/// Intensities are clamped to this magnitude before indexing the table.
const MAX_INTENSITY: f64 = 1e10;

/// Replayed histories are renormalized this often to avoid underflow.
const RENORMALIZE_EVERY: usize = 100;

/// Prior and psychometric-function parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuestParams {
    /// Prior threshold estimate.
    pub t_guess: f64,
    /// Standard deviation of the Gaussian prior around `t_guess`.
    pub t_guess_sd: f64,
    /// Probability of a positive response at threshold.
    pub p_threshold: f64,
    /// Steepness of the Weibull function. Typically 3.5.
    pub beta: f64,
    /// Fraction of trials answered blindly. Typically 0.01.
    pub delta: f64,
    /// Probability of a positive response at zero intensity; 0.5 for
    /// two-alternative forced choice.
    pub gamma: f64,
    /// Table step on the intensity axis.
    pub grain: f64,
    /// Span of intensities the posterior covers, centered on `t_guess`.
    /// Intensities outside it have zero prior probability.
    pub range: Option<f64>,
}

impl QuestParams {
    pub fn new(t_guess: f64, t_guess_sd: f64, p_threshold: f64, beta: f64, delta: f64, gamma: f64) -> Self {
        Self {
            t_guess,
            t_guess_sd,
            p_threshold,
            beta,
            delta,
            gamma,
            grain: 0.01,
            range: None,
        }
    }

    pub fn with_grain(mut self, grain: f64) -> Self {
        self.grain = grain;
        self
    }

    pub fn with_range(mut self, range: f64) -> Self {
        self.range = Some(range);
        self
    }
}

/// One completed trial.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuestTrial {
    pub intensity: f64,
    pub response: bool,
}

/// Result of re-running the posterior with β as a free parameter.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BetaAnalysis {
    /// Threshold mean under the most likely β.
    pub t: f64,
    pub sd: f64,
    pub beta_mean: f64,
    pub beta_sd: f64,
    /// Posterior mean of 1/β.
    pub inverse_beta_mean: f64,
    pub inverse_beta_sd: f64,
    pub gamma: f64,
}

impl BetaAnalysis {
    /// β estimate, `1 / inverse_beta_mean`.
    pub fn beta(&self) -> f64 {
        1.0 / self.inverse_beta_mean
    }
}

/// Bayesian staircase state.
#[derive(Debug, Clone)]
pub struct Quest {
    params: QuestParams,
    dim: usize,

    /// Threshold offsets from `t_guess`, `dim + 1` entries.
    x: Vec<f64>,
    /// Unnormalized posterior over `x`.
    pdf: Vec<f64>,

    /// Intensity offsets from threshold, `2·dim + 1` entries.
    x2: Vec<f64>,
    /// Psychometric function sampled on `x2`.
    p2: Vec<f64>,
    /// Likelihood tables for negative and positive responses, reversed.
    s2: [Vec<f64>; 2],

    x_threshold: f64,
    quantile_order: f64,
    history: Vec<QuestTrial>,
}

impl Quest {
    /// Builds the prior and the psychometric tables.
    ///
    /// Fails with `InvalidConfig` for a non-positive range, grain or prior
    /// sd, and when the psychometric function never crosses `p_threshold`.
    /// A `gamma` above `p_threshold` is reduced to 0.5 with a warning.
    pub fn new(params: QuestParams) -> Result<Self> {
        if !(params.grain.is_finite() && params.grain > 0.0) {
            return Err(invalid(format!("grain must be positive, got {}", params.grain)));
        }
        if !(params.t_guess_sd.is_finite() && params.t_guess_sd > 0.0) {
            return Err(invalid(format!("prior sd must be positive, got {}", params.t_guess_sd)));
        }
        if !params.t_guess.is_finite() {
            return Err(invalid(format!("threshold guess must be finite, got {}", params.t_guess)));
        }
        let dim = match params.range {
            None => DEFAULT_DIM,
            Some(range) if range.is_finite() && range > 0.0 => table_dim(range, params.grain)?,
            Some(range) => return Err(invalid(format!("range must be positive, got {range}"))),
        };

        let mut quest = Self {
            params,
            dim,
            x: Vec::new(),
            pdf: Vec::new(),
            x2: Vec::new(),
            p2: Vec::new(),
            s2: [Vec::new(), Vec::new()],
            x_threshold: 0.0,
            quantile_order: 0.5,
            history: Vec::new(),
        };
        quest.recompute()?;
        Ok(quest)
    }

    /// Rebuilds the psychometric tables from the current parameters and
    /// replays the trial history into a fresh prior.
    pub fn recompute(&mut self) -> Result<()> {
        if self.params.gamma > self.params.p_threshold {
            log::warn!("reducing gamma from {:.2} to 0.5", self.params.gamma);
            self.params.gamma = 0.5;
        }
        let QuestParams {
            t_guess_sd,
            p_threshold,
            beta,
            delta,
            gamma,
            grain,
            ..
        } = self.params;

        let half = self.dim as i64 / 2;
        self.x = (-half..=half).map(|i| i as f64 * grain).collect();
        self.pdf = self.x.iter().map(|x| (-0.5 * (x / t_guess_sd).powi(2)).exp()).collect();
        normalize(&mut self.pdf);

        let dim = self.dim as i64;
        self.x2 = (-dim..=dim).map(|i| i as f64 * grain).collect();
        let weibull = |x: f64| delta * gamma + (1.0 - delta) * (1.0 - (1.0 - gamma) * (-(10f64.powf(beta * x))).exp());

        let p2: Vec<f64> = self.x2.iter().map(|&x| weibull(x)).collect();
        let (first, last) = (p2[0], p2[p2.len() - 1]);
        if first > p_threshold || last < p_threshold {
            return Err(invalid(format!(
                "psychometric function range [{first:.2} {last:.2}] omits {p_threshold:.2} threshold"
            )));
        }
        if p2.iter().any(|p| !p.is_finite()) {
            return Err(invalid("psychometric function is not finite".to_string()));
        }
        let rising: Vec<usize> = (0..p2.len() - 1).filter(|&k| p2[k + 1] != p2[k]).collect();
        if rising.len() < 2 {
            return Err(invalid(format!(
                "psychometric function has only {} strictly monotonic points",
                rising.len()
            )));
        }
        let xp: Vec<f64> = rising.iter().map(|&k| p2[k]).collect();
        let fp: Vec<f64> = rising.iter().map(|&k| self.x2[k]).collect();
        self.x_threshold = interp(p_threshold, &xp, &fp);

        let x_threshold = self.x_threshold;
        self.p2 = self.x2.iter().map(|&x| weibull(x + x_threshold)).collect();
        if self.p2.iter().any(|p| !p.is_finite()) {
            return Err(invalid("psychometric function is not finite".to_string()));
        }
        self.s2 = [
            self.p2.iter().rev().map(|p| 1.0 - p).collect(),
            self.p2.iter().rev().copied().collect(),
        ];

        let (pl, ph) = (self.p2[0], self.p2[self.p2.len() - 1]);
        let entropy = ph * (ph + EPS).ln() - pl * (pl + EPS).ln() + (1.0 - ph + EPS) * (1.0 - ph + EPS).ln()
            - (1.0 - pl + EPS) * (1.0 - pl + EPS).ln();
        let pe = 1.0 / (1.0 + (entropy / (pl - ph)).exp());
        self.quantile_order = (pe - pl) / (ph - pl);

        let history = std::mem::take(&mut self.history);
        for (k, trial) in history.iter().enumerate() {
            self.apply_likelihood(trial.intensity, trial.response, false);
            if (k + 1) % RENORMALIZE_EVERY == 0 {
                normalize(&mut self.pdf);
            }
        }
        self.history = history;
        normalize(&mut self.pdf);
        if self.pdf.iter().any(|p| !p.is_finite()) {
            return Err(TachyError::DegeneratePosterior("pdf is not finite".to_string()));
        }
        Ok(())
    }

    /// Folds one trial into the posterior and records it.
    ///
    /// Intensities outside `t_guess ± dim/2·grain` are applied at the
    /// nearest edge of the table, with a warning.
    pub fn update(&mut self, intensity: f64, response: bool) -> Result<()> {
        if intensity.is_nan() {
            return Err(invalid("trial intensity is NaN".to_string()));
        }
        self.apply_likelihood(intensity, response, true);
        normalize(&mut self.pdf);
        self.history.push(QuestTrial { intensity, response });
        Ok(())
    }

    fn apply_likelihood(&mut self, intensity: f64, response: bool, warn: bool) {
        let intensity = intensity.clamp(-MAX_INTENSITY, MAX_INTENSITY);
        let shift = alt_round((intensity - self.params.t_guess) / self.params.grain);
        let dim = self.dim as i64;
        let columns = 2 * dim + 1;

        // Column of the likelihood table lined up with pdf[0].
        let mut start = dim / 2 - shift;
        if start < 0 || start + dim >= columns {
            if warn {
                let reach = (dim / 2) as f64 * self.params.grain;
                log::warn!(
                    "intensity {intensity:.2} out of range {:.2} to {:.2}; pdf will be inexact",
                    self.params.t_guess - reach,
                    self.params.t_guess + reach
                );
            }
            start = if start < 0 { 0 } else { columns - 1 - dim };
        }

        let table = &self.s2[usize::from(response)];
        let start = start as usize;
        for (p, l) in self.pdf.iter_mut().zip(&table[start..]) {
            *p *= l;
        }
    }

    /// Posterior mean threshold.
    pub fn mean(&self) -> f64 {
        self.params.t_guess + dot(&self.pdf, &self.x) / self.pdf.iter().sum::<f64>()
    }

    /// Posterior mode threshold and the unnormalized density there.
    pub fn mode(&self) -> (f64, f64) {
        let (i, p) = self
            .pdf
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best });
        (self.x[i] + self.params.t_guess, p)
    }

    /// Posterior standard deviation.
    pub fn sd(&self) -> f64 {
        let total: f64 = self.pdf.iter().sum();
        let m1 = dot(&self.pdf, &self.x) / total;
        let m2 = self.pdf.iter().zip(&self.x).map(|(p, x)| p * x * x).sum::<f64>() / total;
        (m2 - m1 * m1).max(0.0).sqrt()
    }

    /// Probability of a positive response at intensity `x` relative to
    /// threshold. Clamped to the ends of the table.
    pub fn probability(&self, x: f64) -> f64 {
        interp(x, &self.x2, &self.p2)
    }

    /// Unnormalized posterior density at candidate threshold `t`. Values
    /// beyond the table read its edge.
    pub fn pdf_at(&self, t: f64) -> f64 {
        let i = alt_round((t - self.params.t_guess) / self.params.grain) + self.dim as i64 / 2;
        let i = i.clamp(0, self.pdf.len() as i64 - 1) as usize;
        self.pdf[i]
    }

    /// Recommended intensity for the next trial: the posterior quantile at
    /// the most informative order.
    pub fn quantile(&self) -> Result<f64> {
        self.quantile_at(self.quantile_order)
    }

    /// Posterior quantile, e.g. 0.5 for the median.
    pub fn quantile_at(&self, order: f64) -> Result<f64> {
        let cumulative: Vec<f64> = self
            .pdf
            .iter()
            .scan(0.0, |acc, p| {
                *acc += p;
                Some(*acc)
            })
            .collect();
        let total = cumulative.last().copied().unwrap_or(0.0);
        if !total.is_finite() {
            return Err(TachyError::DegeneratePosterior("pdf is not finite".to_string()));
        }
        if total == 0.0 {
            return Err(TachyError::DegeneratePosterior("pdf is all zero".to_string()));
        }

        let mut previous = -1.0;
        let rising: Vec<usize> = (0..cumulative.len())
            .filter(|&k| {
                let up = cumulative[k] > previous;
                previous = cumulative[k];
                up
            })
            .collect();
        if rising.len() < 2 {
            return Err(TachyError::DegeneratePosterior(format!(
                "pdf has only {} nonzero point(s)",
                rising.len()
            )));
        }
        let xp: Vec<f64> = rising.iter().map(|&k| cumulative[k]).collect();
        let fp: Vec<f64> = rising.iter().map(|&k| self.x[k]).collect();
        Ok(self.params.t_guess + interp(order * total, &xp, &fp))
    }

    /// Response of a simulated observer whose threshold is `t_actual`.
    ///
    /// `uniform` is a sample from `[0, 1)`; the response is positive when
    /// it falls below the psychometric function at `t_test - t_actual`.
    pub fn simulate(&self, t_test: f64, t_actual: f64, uniform: f64) -> bool {
        let (a, b) = (self.x2[0], self.x2[self.x2.len() - 1]);
        let t = (t_test - t_actual).clamp(a.min(b), a.max(b));
        interp(t, &self.x2, &self.p2) > uniform
    }

    /// Re-estimates the threshold under 16 values of β from 2^(1/4) to 16
    /// on a coarser table, weighting each by its posterior density.
    pub fn beta_analysis(&self) -> Result<BetaAnalysis> {
        let mut candidates = Vec::with_capacity(16);
        for k in 1..=16 {
            let mut q = self.clone();
            q.params.beta = 2f64.powf(f64::from(k) / 4.0);
            q.params.grain = 0.02;
            q.dim = 250;
            q.recompute()?;
            let t = q.mean();
            candidates.push((q.pdf_at(t), q.params.beta, t, q));
        }

        let best = candidates
            .iter()
            .enumerate()
            .fold(0, |best, (i, c)| if c.0 > candidates[best].0 { i } else { best });
        let total: f64 = candidates.iter().map(|c| c.0).sum();
        let moment = |f: &dyn Fn(f64) -> f64| candidates.iter().map(|c| c.0 * f(c.1)).sum::<f64>() / total;

        let beta_mean = moment(&|b| b);
        let inverse_beta_mean = moment(&|b| 1.0 / b);
        Ok(BetaAnalysis {
            t: candidates[best].2,
            sd: candidates[best].3.sd(),
            beta_mean,
            beta_sd: (moment(&|b| b * b) - beta_mean * beta_mean).max(0.0).sqrt(),
            inverse_beta_mean,
            inverse_beta_sd: (moment(&|b| 1.0 / (b * b)) - inverse_beta_mean * inverse_beta_mean)
                .max(0.0)
                .sqrt(),
            gamma: self.params.gamma,
        })
    }

    pub fn params(&self) -> &QuestParams {
        &self.params
    }

    /// Quantile order `quantile()` uses.
    pub fn quantile_order(&self) -> f64 {
        self.quantile_order
    }

    /// Offset that puts `p_threshold` at zero on the intensity axis.
    pub fn x_threshold(&self) -> f64 {
        self.x_threshold
    }

    pub fn history(&self) -> &[QuestTrial] {
        &self.history
    }

    /// Posterior density over `t_guess + x`, normalized.
    pub fn pdf(&self) -> &[f64] {
        &self.pdf
    }
}

/// Seeded xorshift32 generator, a reproducible uniform source for
/// `Quest::simulate`.
#[derive(Debug, Clone)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    /// A zero seed is forced odd; xorshift never leaves the zero state.
    pub fn new(seed: u32) -> Self {
        Self { state: seed | 1 }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform sample in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }
}

fn invalid(msg: String) -> TachyError {
    TachyError::InvalidConfig(msg)
}

/// Even table size covering `range` at `grain`.
fn table_dim(range: f64, grain: f64) -> Result<usize> {
    let half = (range / grain / 2.0).ceil();
    if !(1.0..=1e7).contains(&half) {
        return Err(invalid(format!("range {range} at grain {grain} gives an unusable table")));
    }
    Ok(2 * half as usize)
}

/// Rounds half away from zero: 0.5 → 1, -0.5 → -1, 2.5 → 3.
fn alt_round(v: f64) -> i64 {
    v.round() as i64
}

fn normalize(pdf: &mut [f64]) {
    let total: f64 = pdf.iter().sum();
    for p in pdf.iter_mut() {
        *p /= total;
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(a, b)| a * b).sum()
}

/// Piecewise-linear interpolation through `(xp, fp)`, `xp` increasing.
/// Outside `xp` the end values are returned.
fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len().min(fp.len());
    if n == 0 {
        return f64::NAN;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }
    let j = xp[..n].partition_point(|&v| v <= x);
    let (x0, x1, f0, f1) = (xp[j - 1], xp[j], fp[j - 1], fp[j]);
    f0 + (f1 - f0) * (x - x0) / (x1 - x0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_afc() -> QuestParams {
        QuestParams::new(0.9, 2.0, 0.82, 3.5, 0.01, 0.5)
    }

    // ── helpers ───────────────────────────────────────────────────────────

    #[test]
    fn ties_round_away_from_zero() {
        assert_eq!(alt_round(0.5), 1);
        assert_eq!(alt_round(-0.5), -1);
        assert_eq!(alt_round(2.5), 3);
        assert_eq!(alt_round(0.49), 0);
    }

    #[test]
    fn interp_clamps_and_interpolates() {
        let xp = [0.0, 1.0, 3.0];
        let fp = [10.0, 20.0, 40.0];
        assert_eq!(interp(-1.0, &xp, &fp), 10.0);
        assert_eq!(interp(0.5, &xp, &fp), 15.0);
        assert_eq!(interp(1.0, &xp, &fp), 20.0);
        assert_eq!(interp(2.0, &xp, &fp), 30.0);
        assert_eq!(interp(9.0, &xp, &fp), 40.0);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = XorShift32::new(0xDEAD_BEEF);
        let mut b = XorShift32::new(0xDEAD_BEEF);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
        assert_ne!(XorShift32::new(0).next_u32(), 0);
    }

    #[test]
    fn uniform_samples_stay_in_unit_interval() {
        let mut rng = XorShift32::new(7);
        let samples: Vec<f64> = (0..10_000).map(|_| rng.next_f64()).collect();
        assert!(samples.iter().all(|v| (0.0..1.0).contains(v)));
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        assert!((mean - 0.5).abs() < 0.02);
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn prior_is_centered_on_the_guess() {
        let q = Quest::new(two_afc()).unwrap();
        assert!((q.mean() - 0.9).abs() < 1e-9);
        let (mode, density) = q.mode();
        assert!((mode - 0.9).abs() < 1e-9);
        assert_eq!(q.pdf_at(0.9), density);
        assert!(q.sd() > 1.0 && q.sd() < 2.0);
        assert_eq!(q.pdf().len(), DEFAULT_DIM + 1);
    }

    #[test]
    fn threshold_criterion_sits_at_zero() {
        let q = Quest::new(two_afc()).unwrap();
        assert!((q.probability(0.0) - 0.82).abs() < 1e-3);
        assert!(q.probability(-100.0) < 0.51);
        assert!(q.probability(100.0) > 0.99);
        assert!(q.quantile_order() > 0.0 && q.quantile_order() < 1.0);
    }

    #[test]
    fn range_sets_table_size() {
        let q = Quest::new(two_afc().with_range(5.0)).unwrap();
        assert_eq!(q.pdf().len(), 501);
        let q = Quest::new(two_afc().with_range(0.05).with_grain(0.02)).unwrap();
        assert_eq!(q.pdf().len(), 5);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        for params in [
            two_afc().with_range(0.0),
            two_afc().with_range(-1.0),
            two_afc().with_grain(0.0),
            QuestParams::new(0.9, 0.0, 0.82, 3.5, 0.01, 0.5),
            // Threshold above the function's ceiling of δγ + (1 − δ).
            QuestParams::new(0.9, 2.0, 0.999, 3.5, 0.01, 0.5),
        ] {
            assert!(matches!(Quest::new(params), Err(TachyError::InvalidConfig(_))), "{params:?}");
        }
    }

    #[test]
    fn gamma_above_threshold_is_reduced() {
        let q = Quest::new(QuestParams::new(0.0, 1.0, 0.75, 3.5, 0.01, 0.9)).unwrap();
        assert_eq!(q.params().gamma, 0.5);
    }

    // ── updates ───────────────────────────────────────────────────────────

    #[test]
    fn responses_move_the_estimate() {
        let mut q = Quest::new(two_afc()).unwrap();
        let prior = q.mean();
        q.update(0.9, true).unwrap();
        assert!(q.mean() < prior);

        let mut q = Quest::new(two_afc()).unwrap();
        q.update(0.9, false).unwrap();
        assert!(q.mean() > prior);
        assert_eq!(q.history(), &[QuestTrial { intensity: 0.9, response: false }]);
    }

    #[test]
    fn out_of_range_intensities_use_the_table_edge() {
        let mut q = Quest::new(two_afc()).unwrap();
        q.update(1e12, true).unwrap();
        q.update(f64::NEG_INFINITY, false).unwrap();
        assert!(q.pdf().iter().all(|p| p.is_finite()));
        assert!(q.quantile().unwrap().is_finite());
        assert!(matches!(q.update(f64::NAN, true), Err(TachyError::InvalidConfig(_))));
        assert_eq!(q.history().len(), 2);
    }

    #[test]
    fn recompute_replays_history() {
        let mut q = Quest::new(two_afc()).unwrap();
        for (t, r) in [(0.5, true), (1.2, false), (0.8, true), (1.0, true)] {
            q.update(t, r).unwrap();
        }
        let before = (q.mean(), q.sd());
        q.recompute().unwrap();
        assert!((q.mean() - before.0).abs() < 1e-9);
        assert!((q.sd() - before.1).abs() < 1e-9);
    }

    #[test]
    fn quantiles_are_ordered() {
        let q = Quest::new(two_afc()).unwrap();
        let lo = q.quantile_at(0.05).unwrap();
        let median = q.quantile_at(0.5).unwrap();
        let hi = q.quantile_at(0.95).unwrap();
        assert!(lo < median && median < hi);
        assert!((median - 0.9).abs() < 0.05);
    }

    // ── simulated observer ────────────────────────────────────────────────

    #[test]
    fn simulated_observer_answers_by_the_psychometric_function() {
        let q = Quest::new(two_afc()).unwrap();
        assert!(q.simulate(10.0, 0.0, 0.98));
        assert!(!q.simulate(-10.0, 0.0, 0.6));
    }

    #[test]
    fn staircase_converges_on_the_simulated_threshold() {
        let t_actual = 2.0;
        let mut q = Quest::new(two_afc()).unwrap();
        let mut rng = XorShift32::new(0x5EED);

        for _ in 0..400 {
            let jitter = [-0.1, 0.0, 0.1][(rng.next_u32() % 3) as usize];
            let t_test = q.quantile().unwrap() + jitter;
            let response = q.simulate(t_test, t_actual, rng.next_f64());
            q.update(t_test, response).unwrap();
        }

        assert!((q.mean() - t_actual).abs() < 0.3, "mean {}", q.mean());
        assert!(q.sd() < 0.3, "sd {}", q.sd());
    }

    #[test]
    fn beta_analysis_weighs_candidate_slopes() {
        let mut q = Quest::new(two_afc()).unwrap();
        let mut rng = XorShift32::new(11);
        for _ in 0..100 {
            let t_test = q.quantile().unwrap();
            let response = q.simulate(t_test, 1.5, rng.next_f64());
            q.update(t_test, response).unwrap();
        }

        let analysis = q.beta_analysis().unwrap();
        assert!(analysis.t.is_finite() && analysis.sd.is_finite());
        assert!(analysis.beta() >= 2f64.powf(0.25) && analysis.beta() <= 16.0);
        assert!(analysis.beta_mean >= 2f64.powf(0.25) && analysis.beta_mean <= 16.0);
        assert_eq!(analysis.gamma, 0.5);
    }
}
