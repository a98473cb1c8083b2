//! Annual rebalancing loop
//!
//! Each year the AUM is split across the selected factors, holdings are
//! formed at that year's prices and valued at the next year's prices. The end
//! value is reinvested the following year.

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::benchmark::Benchmark;
use crate::display::format_year_growth;
use crate::error::{BacktestError, Result};
use crate::factors::Factor;
use crate::holdings::{
    calculate_growth, calculate_holdings, calculate_holdings_percent, Growth, Portfolio, Side,
    Weighting,
};
use crate::market::{MarketData, MarketObject};

#[derive(Debug, Clone, Default)]
pub struct RebalanceOptions {
    pub weighting: Weighting,
    pub benchmark: Benchmark,
}

/// Holdings of one factor sleeve in one year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearHoldings {
    pub year: i32,
    pub factor: Factor,
    pub portfolio: Portfolio,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub factors: Vec<Factor>,
    /// `start..=end`
    pub years: Vec<i32>,
    /// One value per year, starting with the initial AUM
    pub portfolio_values: Vec<f64>,
    /// Decimal return for each year in `start..end`
    pub yearly_returns: Vec<f64>,
    /// Benchmark return in percent for each year in `start..end`
    pub benchmark_returns: Vec<f64>,
    pub final_value: f64,
    pub holdings: Vec<YearHoldings>,
}

fn validate(factors: &[Factor], start_year: i32, end_year: i32, initial_aum: f64) -> Result<()> {
    if factors.is_empty() {
        return Err(BacktestError::Config("At least one factor is required".to_string()));
    }
    if start_year > end_year {
        return Err(BacktestError::Config(format!(
            "Start year {} is after end year {}",
            start_year, end_year
        )));
    }
    if !(initial_aum > 0.0 && initial_aum.is_finite()) {
        return Err(BacktestError::Config(format!(
            "Initial AUM must be positive, got {}",
            initial_aum
        )));
    }
    Ok(())
}

/// Non-negative weights scaled to sum to one; all-zero input gives equal weights
pub fn normalize_weights(weights: &[f64]) -> Vec<f64> {
    let cleaned: Vec<f64> = weights
        .iter()
        .map(|w| if w.is_finite() { w.abs() } else { 0.0 })
        .collect();
    let total: f64 = cleaned.iter().sum();
    if total > 0.0 {
        cleaned.iter().map(|w| w / total).collect()
    } else if weights.is_empty() {
        Vec::new()
    } else {
        vec![1.0 / weights.len() as f64; weights.len()]
    }
}

/// Equal-split backtest over `start_year..=end_year`
pub fn rebalance_portfolio(
    data: &MarketData,
    factors: &[Factor],
    start_year: i32,
    end_year: i32,
    initial_aum: f64,
    options: &RebalanceOptions,
) -> Result<BacktestResult> {
    let weights = vec![1.0; factors.len()];
    rebalance_portfolio_weighted(data, factors, &weights, start_year, end_year, initial_aum, options)
}

/// Growth of the whole `aum`: capital the sleeves left uninvested is carried
/// into next year as cash
fn grow_with_cash(
    sleeves: &[Portfolio],
    aum: f64,
    next_market: &MarketObject,
    market: &MarketObject,
) -> Growth {
    let g = calculate_growth(sleeves, next_market, market);
    let cash = (aum - g.start_value).max(0.0);
    let end_value = g.end_value + cash;
    Growth {
        growth: if aum > 0.0 { end_value / aum - 1.0 } else { 0.0 },
        start_value: aum,
        end_value,
    }
}

/// Backtest where each factor sleeve receives its share of AUM by weight
pub fn rebalance_portfolio_weighted(
    data: &MarketData,
    factors: &[Factor],
    weights: &[f64],
    start_year: i32,
    end_year: i32,
    initial_aum: f64,
    options: &RebalanceOptions,
) -> Result<BacktestResult> {
    validate(factors, start_year, end_year, initial_aum)?;
    if weights.len() != factors.len() {
        return Err(BacktestError::Config(format!(
            "{} weights given for {} factors",
            weights.len(),
            factors.len()
        )));
    }
    let weights = normalize_weights(weights);

    let mut aum = initial_aum;
    let mut years = vec![start_year];
    let mut portfolio_values = vec![aum];
    let mut yearly_returns = Vec::new();
    let mut benchmark_returns = Vec::new();
    let mut holdings = Vec::new();

    let mut market = data.market_for_year(start_year);
    for year in start_year..end_year {
        let next_market = data.market_for_year(year + 1);

        let sleeves: Vec<Portfolio> = factors
            .par_iter()
            .zip(weights.par_iter())
            .map(|(factor, w)| calculate_holdings(*factor, aum * w, &market, options.weighting))
            .collect();

        let growth = if sleeves.iter().all(Portfolio::is_empty) {
            warn!("No holdings formed in {}, carrying {:.2} forward as cash", year, aum);
            0.0
        } else {
            for ((factor, w), sleeve) in factors.iter().zip(&weights).zip(&sleeves) {
                if sleeve.is_empty() && *w > 0.0 {
                    warn!("{} formed no holdings in {}, holding {:.2} as cash", factor, year, aum * w);
                }
            }
            let g = grow_with_cash(&sleeves, aum, &next_market, &market);
            debug!("{}", format_year_growth(year, g.growth, g.start_value, g.end_value));
            aum = g.end_value;
            g.growth
        };

        yearly_returns.push(growth);
        benchmark_returns.push(options.benchmark.return_pct(year));
        portfolio_values.push(aum);
        years.push(year + 1);
        holdings.extend(
            factors
                .iter()
                .zip(sleeves)
                .map(|(factor, portfolio)| YearHoldings {
                    year,
                    factor: *factor,
                    portfolio,
                }),
        );

        market = next_market;
    }

    info!(
        "Final Portfolio Value after {}: ${:.2} (from ${:.2})",
        end_year, aum, initial_aum
    );

    Ok(BacktestResult {
        factors: factors.to_vec(),
        years,
        portfolio_values,
        yearly_returns,
        benchmark_returns,
        final_value: aum,
        holdings,
    })
}

// ============================================================================
// COHORTS
// ============================================================================

/// Selection diagnostics for one year of one cohort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortYear {
    pub year: i32,
    pub n_selected: usize,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortSide {
    pub side: Side,
    pub portfolio_values: Vec<f64>,
    pub yearly_returns: Vec<f64>,
    pub per_year: Vec<CohortYear>,
}

impl CohortSide {
    pub fn final_value(&self) -> f64 {
        self.portfolio_values.last().copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortResult {
    pub n_percent: f64,
    pub years: Vec<i32>,
    pub initial_aum: f64,
    pub benchmark_returns: Vec<f64>,
    pub top: CohortSide,
    pub bottom: Option<CohortSide>,
}

fn run_cohort(
    markets: &[MarketObject],
    factors: &[Factor],
    initial_aum: f64,
    n_percent: f64,
    side: Side,
    weighting: Weighting,
) -> CohortSide {
    let mut aum = initial_aum;
    let mut portfolio_values = vec![aum];
    let mut yearly_returns = Vec::new();
    let mut per_year = Vec::new();
    let share = 1.0 / factors.len() as f64;

    for pair in markets.windows(2) {
        let (market, next_market) = (&pair[0], &pair[1]);
        let sleeves: Vec<Portfolio> = factors
            .iter()
            .map(|f| calculate_holdings_percent(*f, aum * share, market, n_percent, side, weighting))
            .collect();
        let n_selected = sleeves.iter().map(Portfolio::len).sum();

        let (growth, start, end) = if n_selected == 0 {
            warn!(
                "No {:?} cohort holdings formed in {}, carrying {:.2} forward as cash",
                side, market.year, aum
            );
            (0.0, aum, aum)
        } else {
            for (factor, sleeve) in factors.iter().zip(&sleeves) {
                if sleeve.is_empty() {
                    warn!(
                        "{} formed no {:?} cohort holdings in {}, holding {:.2} as cash",
                        factor, side, market.year, aum * share
                    );
                }
            }
            let g = grow_with_cash(&sleeves, aum, next_market, market);
            (g.growth, g.start_value, g.end_value)
        };
        debug!(
            "{:?} {}% cohort {}: {} names, {:.2} -> {:.2}",
            side, n_percent, market.year, n_selected, start, end
        );

        aum = end;
        yearly_returns.push(growth);
        portfolio_values.push(aum);
        per_year.push(CohortYear {
            year: market.year,
            n_selected,
            start,
            end,
        });
    }

    CohortSide {
        side,
        portfolio_values,
        yearly_returns,
        per_year,
    }
}

/// Track the top and, optionally, bottom `n_percent` cohorts as separate portfolios
#[allow(clippy::too_many_arguments)]
pub fn rebalance_portfolio_percent(
    data: &MarketData,
    factors: &[Factor],
    start_year: i32,
    end_year: i32,
    initial_aum: f64,
    n_percent: f64,
    include_bottom: bool,
    options: &RebalanceOptions,
) -> Result<CohortResult> {
    validate(factors, start_year, end_year, initial_aum)?;
    let n_percent = if n_percent.is_finite() {
        n_percent.clamp(1.0, 100.0)
    } else {
        10.0
    };
    // at 100% both cohorts are the whole universe
    let include_bottom = include_bottom && n_percent < 100.0;

    let markets: Vec<MarketObject> = (start_year..=end_year)
        .map(|y| data.market_for_year(y))
        .collect();

    let (top, bottom) = rayon::join(
        || run_cohort(&markets, factors, initial_aum, n_percent, Side::Top, options.weighting),
        || {
            include_bottom.then(|| {
                run_cohort(&markets, factors, initial_aum, n_percent, Side::Bottom, options.weighting)
            })
        },
    );

    info!(
        "Top {}% final value ${:.2}{}",
        n_percent,
        top.final_value(),
        bottom
            .as_ref()
            .map(|b| format!(", bottom {}% final value ${:.2}", n_percent, b.final_value()))
            .unwrap_or_default()
    );

    Ok(CohortResult {
        n_percent,
        years: (start_year..=end_year).collect(),
        initial_aum,
        benchmark_returns: (start_year..end_year)
            .map(|y| options.benchmark.return_pct(y))
            .collect(),
        top,
        bottom,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::StockRecord;

    /// Two-year universe where every price doubles
    fn doubling_data(n: usize) -> MarketData {
        let mut records = Vec::new();
        for year in [2002, 2003, 2004] {
            let mult = 2f64.powi(year - 2002);
            for i in 0..n {
                records.push(
                    StockRecord::new(&format!("T{:02}", i), year, Some(10.0 * mult))
                        .with_factor(Factor::RoeUsing930, i as f64)
                        .with_factor(Factor::Momentum12m, (n - i) as f64),
                );
            }
        }
        MarketData::new(records)
    }

    /// Universe where only ROE is reported and every price moves by `step` a year
    fn roe_only_data(n: usize, step: f64) -> MarketData {
        let mut records = Vec::new();
        for year in [2002, 2003, 2004] {
            let price = 10.0 * step.powi(year - 2002);
            for i in 0..n {
                records.push(
                    StockRecord::new(&format!("T{:02}", i), year, Some(price))
                        .with_factor(Factor::RoeUsing930, i as f64),
                );
            }
        }
        MarketData::new(records)
    }

    fn assert_returns_match_values(values: &[f64], returns: &[f64]) {
        assert_eq!(values.len(), returns.len() + 1);
        for (w, r) in values.windows(2).zip(returns) {
            assert!((w[1] / w[0] - 1.0 - r).abs() < 1e-9, "{:?} vs {:?}", values, returns);
        }
    }

    #[test]
    fn test_empty_sleeve_keeps_its_capital() {
        let data = roe_only_data(20, 1.0);
        let factors = [Factor::RoeUsing930, Factor::Momentum12m];
        let r = rebalance_portfolio(&data, &factors, 2002, 2004, 1000.0, &RebalanceOptions::default()).unwrap();
        assert!((r.final_value - 1000.0).abs() < 1e-9);
        assert!(r.portfolio_values.iter().all(|v| (v - 1000.0).abs() < 1e-9));
        assert_returns_match_values(&r.portfolio_values, &r.yearly_returns);
    }

    #[test]
    fn test_empty_sleeve_growth_on_full_aum() {
        let data = roe_only_data(20, 2.0);
        let factors = [Factor::RoeUsing930, Factor::Momentum12m];
        let r = rebalance_portfolio(&data, &factors, 2002, 2003, 1000.0, &RebalanceOptions::default()).unwrap();
        // invested half doubles, cash half stays
        assert!((r.final_value - 1500.0).abs() < 1e-9);
        assert!((r.yearly_returns[0] - 0.5).abs() < 1e-9);
        assert_returns_match_values(&r.portfolio_values, &r.yearly_returns);
    }

    #[test]
    fn test_cohort_empty_sleeve_keeps_its_capital() {
        let data = roe_only_data(20, 1.0);
        let factors = [Factor::RoeUsing930, Factor::Momentum12m];
        let r = rebalance_portfolio_percent(&data, &factors, 2002, 2004, 1000.0, 10.0, true, &RebalanceOptions::default()).unwrap();
        for side in [Some(&r.top), r.bottom.as_ref()].into_iter().flatten() {
            assert!((side.final_value() - 1000.0).abs() < 1e-9);
            assert_returns_match_values(&side.portfolio_values, &side.yearly_returns);
            assert!((side.per_year[0].start - 1000.0).abs() < 1e-9);
        }

        let rising = roe_only_data(20, 2.0);
        let r = rebalance_portfolio_percent(&rising, &factors, 2002, 2003, 1000.0, 10.0, false, &RebalanceOptions::default()).unwrap();
        assert!((r.top.final_value() - 1500.0).abs() < 1e-9);
        assert_returns_match_values(&r.top.portfolio_values, &r.top.yearly_returns);
    }

    #[test]
    fn test_lengths_and_growth() {
        let data = doubling_data(20);
        let r = rebalance_portfolio(&data, &[Factor::RoeUsing930], 2002, 2004, 1000.0, &RebalanceOptions::default()).unwrap();
        assert_eq!(r.years, vec![2002, 2003, 2004]);
        assert_eq!(r.portfolio_values.len(), 3);
        assert_eq!(r.yearly_returns.len(), 2);
        assert!((r.final_value - 4000.0).abs() < 1e-6);
        assert_eq!(r.benchmark_returns, vec![34.62, 17.48]);
        assert_eq!(r.holdings.len(), 2);
    }

    #[test]
    fn test_single_year() {
        let data = doubling_data(20);
        let r = rebalance_portfolio(&data, &[Factor::RoeUsing930], 2003, 2003, 500.0, &RebalanceOptions::default()).unwrap();
        assert_eq!(r.years, vec![2003]);
        assert_eq!(r.portfolio_values, vec![500.0]);
        assert!(r.yearly_returns.is_empty());
    }

    #[test]
    fn test_invalid_config() {
        let data = doubling_data(5);
        let opts = RebalanceOptions::default();
        assert!(rebalance_portfolio(&data, &[], 2002, 2003, 1000.0, &opts).is_err());
        assert!(rebalance_portfolio(&data, &[Factor::RoeUsing930], 2004, 2002, 1000.0, &opts).is_err());
        assert!(rebalance_portfolio(&data, &[Factor::RoeUsing930], 2002, 2003, 0.0, &opts).is_err());
    }

    #[test]
    fn test_missing_year_carries_cash() {
        let data = doubling_data(20);
        let r = rebalance_portfolio(&data, &[Factor::RoeUsing930], 2004, 2006, 1000.0, &RebalanceOptions::default()).unwrap();
        // 2005 has no data: 2004 holdings liquidate at entry, then 2005 has nothing to buy
        assert_eq!(r.portfolio_values.len(), 3);
        assert!(r.portfolio_values.iter().all(|v| (v - 1000.0).abs() < 1e-6));
    }

    #[test]
    fn test_weighted_split() {
        let data = doubling_data(20);
        let r = rebalance_portfolio_weighted(
            &data,
            &[Factor::RoeUsing930, Factor::Momentum12m],
            &[3.0, 1.0],
            2002,
            2003,
            1000.0,
            &RebalanceOptions::default(),
        )
        .unwrap();
        let m = data.market_for_year(2002);
        let roe = r.holdings.iter().find(|h| h.factor == Factor::RoeUsing930).unwrap();
        assert!((roe.portfolio.present_value(&m) - 750.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_weights() {
        assert_eq!(normalize_weights(&[1.0, 3.0]), vec![0.25, 0.75]);
        assert_eq!(normalize_weights(&[0.0, 0.0]), vec![0.5, 0.5]);
        assert_eq!(normalize_weights(&[-1.0, 1.0]), vec![0.5, 0.5]);
    }

    #[test]
    fn test_cohort_top_and_bottom() {
        let data = doubling_data(25);
        let r = rebalance_portfolio_percent(&data, &[Factor::RoeUsing930], 2002, 2004, 1000.0, 10.0, true, &RebalanceOptions::default()).unwrap();
        assert_eq!(r.years.len(), 3);
        assert_eq!(r.top.per_year.len(), 2);
        assert_eq!(r.top.per_year[0].n_selected, 5);
        let bottom = r.bottom.as_ref().unwrap();
        assert!((bottom.final_value() - 4000.0).abs() < 1e-6);
        assert!((r.top.final_value() - 4000.0).abs() < 1e-6);
    }

    #[test]
    fn test_cohort_full_universe_has_no_bottom() {
        let data = doubling_data(10);
        let r = rebalance_portfolio_percent(&data, &[Factor::RoeUsing930], 2002, 2003, 1000.0, 150.0, true, &RebalanceOptions::default()).unwrap();
        assert_eq!(r.n_percent, 100.0);
        assert!(r.bottom.is_none());
        assert_eq!(r.top.per_year[0].n_selected, 10);
    }
}
