//! Performance metrics for yearly backtest series.
//!
//! Portfolio returns are decimals (0.12 = 12%). Benchmark inputs follow the
//! benchmark table and are in percent unless a function says otherwise.

use serde::{Deserialize, Serialize};

use crate::normalize::{mean, sample_std};
use crate::rebalance::BacktestResult;

/// Mean active return over tracking error. `None` with fewer than two
/// observations or a zero tracking error.
pub fn information_ratio(portfolio: &[f64], benchmark: &[f64]) -> Option<f64> {
    let active: Vec<f64> = portfolio
        .iter()
        .zip(benchmark)
        .map(|(p, b)| p - b)
        .collect();
    let tracking_error = sample_std(&active)?;
    if tracking_error == 0.0 || !tracking_error.is_finite() {
        return None;
    }
    Some(mean(&active)? / tracking_error)
}

/// Geometric mean yearly return
pub fn annualized_return(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let growth: f64 = returns.iter().map(|r| 1.0 + r).product();
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(1.0 / returns.len() as f64) - 1.0
}

/// Sample standard deviation of yearly returns
pub fn annualized_volatility(returns: &[f64]) -> f64 {
    sample_std(returns).unwrap_or(0.0)
}

/// Standard deviation of portfolio minus benchmark returns
pub fn active_volatility(portfolio: &[f64], benchmark: &[f64]) -> f64 {
    let active: Vec<f64> = portfolio
        .iter()
        .zip(benchmark)
        .map(|(p, b)| p - b)
        .collect();
    annualized_volatility(&active)
}

pub fn cagr(start_value: f64, end_value: f64, periods: usize) -> f64 {
    if periods == 0 || start_value <= 0.0 || end_value < 0.0 {
        return 0.0;
    }
    (end_value / start_value).powf(1.0 / periods as f64) - 1.0
}

pub fn total_return(start_value: f64, end_value: f64) -> f64 {
    if start_value == 0.0 {
        0.0
    } else {
        end_value / start_value - 1.0
    }
}

/// Value path of `initial` compounded at benchmark returns given in percent
pub fn benchmark_values(initial: f64, benchmark_pct: &[f64]) -> Vec<f64> {
    let mut values = Vec::with_capacity(benchmark_pct.len() + 1);
    let mut v = initial;
    values.push(v);
    for r in benchmark_pct {
        v *= 1.0 + r / 100.0;
        values.push(v);
    }
    values
}

/// Excess of the final portfolio value over the final benchmark value
pub fn alpha(final_value: f64, benchmark_final: f64) -> f64 {
    if benchmark_final == 0.0 {
        0.0
    } else {
        final_value / benchmark_final - 1.0
    }
}

/// Largest peak-to-trough decline as a fraction
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0;
    for &v in values {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            let dd = (peak - v) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Excess return over volatility on yearly data, no annualization
pub fn sharpe_ratio(returns: &[f64], risk_free: f64) -> Option<f64> {
    let std = sample_std(returns)?;
    if std == 0.0 || !std.is_finite() {
        return None;
    }
    Some((mean(returns)? - risk_free) / std)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyComparison {
    pub year: i32,
    pub portfolio_return_pct: f64,
    pub benchmark_return_pct: f64,
    pub win: bool,
}

pub fn yearly_comparisons(years: &[i32], returns: &[f64], benchmark_pct: &[f64]) -> Vec<YearlyComparison> {
    years
        .iter()
        .zip(returns.iter().zip(benchmark_pct))
        .map(|(&year, (&r, &b))| {
            let portfolio_return_pct = r * 100.0;
            YearlyComparison {
                year,
                portfolio_return_pct,
                benchmark_return_pct: b,
                win: portfolio_return_pct > b,
            }
        })
        .collect()
}

pub fn win_rate(comparisons: &[YearlyComparison]) -> f64 {
    if comparisons.is_empty() {
        0.0
    } else {
        comparisons.iter().filter(|c| c.win).count() as f64 / comparisons.len() as f64
    }
}

/// Headline and risk statistics of a backtest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub start_year: i32,
    pub end_year: i32,
    pub initial_value: f64,
    pub final_value: f64,
    pub total_return_pct: f64,
    pub cagr_pct: f64,
    pub benchmark_final_value: f64,
    pub alpha_pct: f64,
    pub information_ratio: Option<f64>,
    pub annualized_return_pct: f64,
    pub annualized_volatility_pct: f64,
    pub active_volatility_pct: f64,
    pub max_drawdown_portfolio: f64,
    pub max_drawdown_benchmark: f64,
    pub sharpe_portfolio: Option<f64>,
    pub sharpe_benchmark: Option<f64>,
    pub risk_free_rate: f64,
    pub risk_free_rate_source: String,
    pub win_rate: f64,
    pub yearly_comparisons: Vec<YearlyComparison>,
}

impl PerformanceSummary {
    pub fn from_result(result: &BacktestResult, risk_free: f64, risk_free_source: &str) -> Self {
        let initial_value = result.portfolio_values.first().copied().unwrap_or(0.0);
        let final_value = result.final_value;
        let periods = result.yearly_returns.len();

        let bench_decimal: Vec<f64> = result.benchmark_returns.iter().map(|b| b / 100.0).collect();
        let bench_values = benchmark_values(initial_value, &result.benchmark_returns);
        let benchmark_final_value = bench_values.last().copied().unwrap_or(initial_value);

        let comparisons = yearly_comparisons(&result.years, &result.yearly_returns, &result.benchmark_returns);

        Self {
            start_year: result.years.first().copied().unwrap_or_default(),
            end_year: result.years.last().copied().unwrap_or_default(),
            initial_value,
            final_value,
            total_return_pct: total_return(initial_value, final_value) * 100.0,
            cagr_pct: cagr(initial_value, final_value, periods) * 100.0,
            benchmark_final_value,
            alpha_pct: alpha(final_value, benchmark_final_value) * 100.0,
            information_ratio: information_ratio(&result.yearly_returns, &bench_decimal),
            annualized_return_pct: annualized_return(&result.yearly_returns) * 100.0,
            annualized_volatility_pct: annualized_volatility(&result.yearly_returns) * 100.0,
            active_volatility_pct: active_volatility(&result.yearly_returns, &bench_decimal) * 100.0,
            max_drawdown_portfolio: max_drawdown(&result.portfolio_values),
            max_drawdown_benchmark: max_drawdown(&bench_values),
            sharpe_portfolio: sharpe_ratio(&result.yearly_returns, risk_free),
            sharpe_benchmark: sharpe_ratio(&bench_decimal, risk_free),
            risk_free_rate: risk_free,
            risk_free_rate_source: risk_free_source.to_string(),
            win_rate: win_rate(&comparisons),
            yearly_comparisons: comparisons,
        }
    }
}
