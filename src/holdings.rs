//! Portfolio construction
//!
//! Ranks one year's universe by a normalized factor score and sizes positions
//! for the selected names. Also values a set of portfolios from one year to
//! the next.

use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::factors::Factor;
use crate::market::MarketObject;
use crate::normalize::normalize_scores;

/// How capital is spread across the selected names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Weighting {
    #[default]
    Equal,
    MarketCap,
}

impl Weighting {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "equal" => Ok(Self::Equal),
            "cap" | "market-cap" | "marketcap" => Ok(Self::MarketCap),
            _ => Err(format!("Unknown weighting: {}", s)),
        }
    }
}

/// Which end of the ranking a cohort takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Top,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub ticker: String,
    pub shares: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub name: String,
    pub investments: Vec<Investment>,
}

impl Portfolio {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            investments: Vec::new(),
        }
    }

    pub fn add_investment(&mut self, ticker: &str, shares: f64) {
        self.investments.push(Investment {
            ticker: ticker.to_string(),
            shares,
        });
    }

    /// Remove every position in `ticker`; unknown tickers are ignored
    pub fn remove_investment(&mut self, ticker: &str) {
        self.investments.retain(|inv| inv.ticker != ticker);
    }

    pub fn len(&self) -> usize {
        self.investments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.investments.is_empty()
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.investments.iter().map(|i| i.ticker.as_str()).collect()
    }

    /// Value at `market` prices; unpriced holdings count as zero
    pub fn present_value(&self, market: &MarketObject) -> f64 {
        self.investments
            .iter()
            .filter_map(|inv| market.get_price(&inv.ticker).map(|p| p * inv.shares))
            .sum()
    }
}

// ============================================================================
// SELECTION
// ============================================================================

fn by_score_desc(a: &(String, f64), b: &(String, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

fn by_score_asc(a: &(String, f64), b: &(String, f64)) -> Ordering {
    a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0))
}

/// Normalized scores for tickers with a valid price
fn priced_scores(factor: Factor, market: &MarketObject) -> Vec<(String, f64)> {
    normalize_scores(&market.factor_values(factor), factor.higher_is_better())
        .into_iter()
        .filter(|(ticker, _)| market.get_price(ticker).is_some())
        .collect()
}

/// Tickers whose suffix marks them as bankrupt, delisted or pink-sheet
pub fn looks_delisted(ticker: &str) -> bool {
    ticker.ends_with('Q') || ticker.contains(".XX") || ticker.ends_with(".PK")
}

/// Share count for a percentile cohort over a universe of `n` names
pub fn cohort_size(n: usize, n_percent: f64) -> usize {
    if n == 0 {
        return 0;
    }
    let target = ((n as f64 * n_percent / 100.0).round() as usize).max(1);
    let floor = if n >= 50 {
        10
    } else if n >= 20 {
        5
    } else {
        3
    };
    target.max(floor).min(n)
}

/// Size positions for `selected` tickers at `market` prices
fn allocate(
    name: String,
    selected: &[(String, f64)],
    aum: f64,
    market: &MarketObject,
    weighting: Weighting,
) -> Portfolio {
    let mut portfolio = Portfolio::new(&name);
    if selected.is_empty() {
        return portfolio;
    }

    let caps: Vec<Option<f64>> = selected
        .iter()
        .map(|(t, _)| market.get_market_cap(t))
        .collect();
    let cap_total: f64 = caps.iter().flatten().sum();

    let weights: Vec<f64> = match weighting {
        Weighting::MarketCap if cap_total > 0.0 => caps
            .iter()
            .map(|c| c.unwrap_or(0.0) / cap_total)
            .collect(),
        Weighting::MarketCap => {
            debug!("No market caps among selected names in {}, using equal weights", market.year);
            vec![1.0 / selected.len() as f64; selected.len()]
        }
        Weighting::Equal => vec![1.0 / selected.len() as f64; selected.len()],
    };

    for ((ticker, _), w) in selected.iter().zip(weights) {
        if w <= 0.0 {
            continue;
        }
        if let Some(price) = market.get_price(ticker) {
            portfolio.add_investment(ticker, aum * w / price);
        }
    }
    portfolio
}

/// Top-decile portfolio: the best `max(1, n / 10)` priced names by score
pub fn calculate_holdings(
    factor: Factor,
    aum: f64,
    market: &MarketObject,
    weighting: Weighting,
) -> Portfolio {
    let mut scores = priced_scores(factor, market);
    scores.sort_by(by_score_desc);
    let n = scores.len();
    if n == 0 {
        debug!("{} - no scored names in {}", factor, market.year);
        return Portfolio::new(&format!("Portfolio_{}", market.year));
    }
    let k = (n / 10).max(1);
    debug!("{} {}: selecting {} of {} names", factor, market.year, k, n);
    allocate(
        format!("Portfolio_{}", market.year),
        &scores[..k],
        aum,
        market,
        weighting,
    )
}

/// Top or bottom `n_percent` of the universe, skipping delisted tickers and
/// keeping a minimum number of holdings
pub fn calculate_holdings_percent(
    factor: Factor,
    aum: f64,
    market: &MarketObject,
    n_percent: f64,
    side: Side,
    weighting: Weighting,
) -> Portfolio {
    let mut scores: Vec<(String, f64)> = priced_scores(factor, market)
        .into_iter()
        .filter(|(t, _)| !looks_delisted(t))
        .collect();
    let name = format!("Portfolio_{}", market.year);
    if scores.is_empty() {
        return Portfolio::new(&name);
    }

    match side {
        Side::Top => scores.sort_by(by_score_desc),
        Side::Bottom => scores.sort_by(by_score_asc),
    }
    let count = cohort_size(scores.len(), n_percent);
    debug!(
        "{} {:?} {}%: universe {}, selecting {}",
        factor,
        side,
        n_percent,
        scores.len(),
        count
    );
    allocate(name, &scores[..count], aum, market, weighting)
}

// ============================================================================
// GROWTH
// ============================================================================

/// Growth of a set of portfolios from `current` to `next` prices
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Growth {
    pub growth: f64,
    pub start_value: f64,
    pub end_value: f64,
}

/// Value held portfolios a year later. Holdings absent next year are
/// liquidated at their entry price.
pub fn calculate_growth(
    portfolios: &[Portfolio],
    next_market: &MarketObject,
    current_market: &MarketObject,
) -> Growth {
    let start_value: f64 = portfolios
        .iter()
        .map(|p| p.present_value(current_market))
        .sum();

    let mut end_value = 0.0;
    for inv in portfolios.iter().flat_map(|p| p.investments.iter()) {
        match next_market.get_price(&inv.ticker) {
            Some(price) => end_value += inv.shares * price,
            None => {
                if let Some(entry) = current_market.get_price(&inv.ticker) {
                    end_value += inv.shares * entry;
                    debug!(
                        "{} - missing in {}, liquidating at entry price: {}",
                        inv.ticker, next_market.year, entry
                    );
                }
            }
        }
    }

    let growth = if start_value != 0.0 {
        (end_value - start_value) / start_value
    } else {
        0.0
    };
    Growth {
        growth,
        start_value,
        end_value,
    }
}
