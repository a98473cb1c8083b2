//! Factor score normalization: winsorize, orient so higher is better, z-score.

/// Fraction clipped from each tail before scoring
pub const WINSORIZE_PCT: f64 = 0.005;

/// Share of non-positive values above which inversion negates instead of taking the reciprocal
const NONPOSITIVE_NEGATE_THRESHOLD: f64 = 0.1;

/// Quantile with linear interpolation between order statistics. `sorted` must be ascending.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (ddof = 1); `None` below two observations
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Clip every present value into the [pct, 1 - pct] quantile band
pub fn winsorize(values: &mut [Option<f64>], pct: f64) {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() || pct <= 0.0 {
        return;
    }
    present.sort_by(|a, b| a.total_cmp(b));
    let (Some(lower), Some(upper)) = (quantile(&present, pct), quantile(&present, 1.0 - pct)) else {
        return;
    };
    for v in values.iter_mut().flatten() {
        *v = v.clamp(lower, upper);
    }
}

/// Flip a lower-is-better factor so larger numbers rank first
pub fn invert(values: &mut [Option<f64>]) {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let nonpositive_frac = if present.is_empty() {
        0.0
    } else {
        present.iter().filter(|v| **v <= 0.0).count() as f64 / present.len() as f64
    };

    if nonpositive_frac > NONPOSITIVE_NEGATE_THRESHOLD {
        for v in values.iter_mut().flatten() {
            *v = -*v;
        }
    } else {
        for slot in values.iter_mut() {
            *slot = match *slot {
                Some(v) if v != 0.0 => Some(1.0 / v),
                _ => None,
            };
        }
    }
}

/// Standardize in place; a degenerate spread only demeans
pub fn zscore(values: &mut [Option<f64>]) {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let Some(m) = mean(&present) else {
        return;
    };
    let std = sample_std(&present).filter(|s| *s != 0.0 && s.is_finite());
    for v in values.iter_mut().flatten() {
        *v = match std {
            Some(s) => (*v - m) / s,
            None => *v - m,
        };
    }
}

/// Normalize raw factor values keyed by ticker.
///
/// Non-finite inputs are treated as missing. Tickers whose score is missing
/// after normalization are dropped, and the input order is preserved.
pub fn normalize_scores(
    raw: &[(String, Option<f64>)],
    higher_is_better: bool,
) -> Vec<(String, f64)> {
    let mut values: Vec<Option<f64>> = raw
        .iter()
        .map(|(_, v)| v.filter(|x| x.is_finite()))
        .collect();

    winsorize(&mut values, WINSORIZE_PCT);
    if !higher_is_better {
        invert(&mut values);
    }
    zscore(&mut values);

    raw.iter()
        .zip(values)
        .filter_map(|((ticker, _), v)| v.filter(|x| x.is_finite()).map(|x| (ticker.clone(), x)))
        .collect()
}
