//! Population Metrics
//!
//! Pure functions over belief and trust values. Insufficient data yields a
//! defined fallback, never an error.

use std::collections::BTreeMap;

use infoflow_events::{SourceType, StepMetrics};

use crate::components::citizen::Citizen;

const POLARIZATION_BINS: usize = 10;
/// Share of the smoothed mass a bin needs to count as a peak
const PEAK_MIN_MASS: f64 = 0.05;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance; 0 for empty input.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Bimodality of the belief distribution in [0, 1].
///
/// 0 means consensus (a single density peak). Two well separated, equally
/// weighted peaks give values close to 1.
pub fn polarization(beliefs: &[f64]) -> f64 {
    if beliefs.len() < 3 {
        return 0.0;
    }

    let mut histogram = [0.0f64; POLARIZATION_BINS];
    for &b in beliefs {
        let bin = ((b.clamp(0.0, 1.0) * POLARIZATION_BINS as f64) as usize).min(POLARIZATION_BINS - 1);
        histogram[bin] += 1.0;
    }

    let mut smoothed = [0.0f64; POLARIZATION_BINS];
    for i in 0..POLARIZATION_BINS {
        let left = if i > 0 { histogram[i - 1] } else { 0.0 };
        let right = if i + 1 < POLARIZATION_BINS { histogram[i + 1] } else { 0.0 };
        smoothed[i] = (left + 2.0 * histogram[i] + right) / 4.0;
    }
    let total: f64 = smoothed.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let mut peaks: Vec<(usize, f64)> = Vec::new();
    for i in 0..POLARIZATION_BINS {
        let mass = smoothed[i] / total;
        let left = if i > 0 { smoothed[i - 1] } else { f64::NEG_INFINITY };
        let right = if i + 1 < POLARIZATION_BINS { smoothed[i + 1] } else { f64::NEG_INFINITY };
        // First bin of a plateau wins
        if smoothed[i] > left && smoothed[i] >= right && mass >= PEAK_MIN_MASS {
            peaks.push((i, mass));
        }
    }
    if peaks.len() < 2 {
        return 0.0;
    }

    peaks.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    let (first, second) = (peaks[0], peaks[1]);
    let separation = first.0.abs_diff(second.0) as f64 / (POLARIZATION_BINS - 1) as f64;
    let balance = second.1.min(first.1) / second.1.max(first.1);

    (separation * balance).clamp(0.0, 1.0)
}

/// Number of belief groups separated by gaps wider than `threshold`.
pub fn opinion_clusters(beliefs: &[f64], threshold: f64) -> usize {
    if beliefs.is_empty() {
        return 0;
    }
    let mut sorted = beliefs.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    1 + sorted.windows(2).filter(|w| w[1] - w[0] > threshold).count()
}

/// How closely beliefs track a reference truth: 1 is perfect agreement.
pub fn truth_alignment(beliefs: &[f64], ground_truth: f64) -> Option<f64> {
    if beliefs.is_empty() {
        return None;
    }
    let g = ground_truth.clamp(0.0, 1.0);
    let worst = g.max(1.0 - g);
    let error = beliefs.iter().map(|b| (b - g).abs()).sum::<f64>() / beliefs.len() as f64;
    Some((1.0 - error / worst).clamp(0.0, 1.0))
}

/// Pearson correlation between beliefs and per-item truth values.
///
/// `None` when lengths differ, fewer than two points exist, or either side
/// has no variance.
pub fn truth_correlation(beliefs: &[f64], truths: &[f64]) -> Option<f64> {
    if beliefs.len() != truths.len() || beliefs.len() < 2 {
        return None;
    }
    let mb = mean(beliefs);
    let mt = mean(truths);
    let mut covariance = 0.0;
    let mut var_b = 0.0;
    let mut var_t = 0.0;
    for (b, t) in beliefs.iter().zip(truths) {
        covariance += (b - mb) * (t - mt);
        var_b += (b - mb).powi(2);
        var_t += (t - mt).powi(2);
    }
    if var_b == 0.0 || var_t == 0.0 {
        return None;
    }
    Some(covariance / (var_b.sqrt() * var_t.sqrt()))
}

/// Measures a population of citizens at `step`.
///
/// Flow counters (publications, outcomes, shares) are left at zero for the
/// caller to fill in.
pub fn measure_population(
    step: u64,
    citizens: &[&Citizen],
    cluster_threshold: f64,
    ground_truth: Option<f64>,
) -> StepMetrics {
    if citizens.is_empty() {
        return StepMetrics::empty(step);
    }

    let beliefs: Vec<f64> = citizens.iter().map(|c| c.belief).collect();

    let mut avg_trust = BTreeMap::new();
    let mut trust_variance = BTreeMap::new();
    for source in SourceType::ALL {
        let trust: Vec<f64> = citizens.iter().map(|c| c.trust.get(source)).collect();
        avg_trust.insert(source, mean(&trust));
        trust_variance.insert(source, variance(&trust));
    }

    let mut metrics = StepMetrics::empty(step);
    metrics.avg_belief = mean(&beliefs);
    metrics.belief_variance = variance(&beliefs);
    metrics.avg_trust = avg_trust;
    metrics.trust_variance = trust_variance;
    metrics.polarization = polarization(&beliefs);
    metrics.opinion_clusters = opinion_clusters(&beliefs, cluster_threshold);
    metrics.truth_alignment = ground_truth.and_then(|g| truth_alignment(&beliefs, g));
    metrics
}
