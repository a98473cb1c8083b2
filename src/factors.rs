//! Factor catalogue
//!
//! The thirteen factors a portfolio can be ranked on, with the column each one
//! reads, its category, its direction and a short investment thesis.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BacktestError;

/// Broad family a factor belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactorCategory {
    Momentum,
    Value,
    Quality,
    Growth,
    Profitability,
}

impl fmt::Display for FactorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Momentum => "Momentum",
            Self::Value => "Value",
            Self::Quality => "Quality",
            Self::Growth => "Growth",
            Self::Profitability => "Profitability",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Factor {
    RoeUsing930,
    RoaUsing930,
    RoaPct,
    Momentum12m,
    Momentum6m,
    Momentum1m,
    PriceToBook,
    BookToPrice,
    NextFyEarningsYield,
    AccrualsToAssets,
    PriceVol1y,
    AssetGrowth1y,
    CapexGrowth1y,
}

/// (factor, cli key, column, category, higher_is_better, thesis)
static CATALOGUE: [(Factor, &str, &str, FactorCategory, bool, &str); 13] = [
    (
        Factor::RoeUsing930,
        "roe",
        "ROE using 9/30 Data",
        FactorCategory::Profitability,
        true,
        "Firms with higher return on equity generate more profit from shareholder capital, indicating efficient capital allocation and stronger profitability prospects.",
    ),
    (
        Factor::RoaUsing930,
        "roa",
        "ROA using 9/30 Data",
        FactorCategory::Profitability,
        true,
        "Return on assets measures how efficiently a company uses its assets to generate earnings; higher ROA typically signals better operational efficiency.",
    ),
    (
        Factor::Momentum12m,
        "mom-12m",
        "12-Mo Momentum %",
        FactorCategory::Momentum,
        true,
        "Stocks that have performed well over the past 12 months tend to keep outperforming in the near term as investor behaviour and trends persist.",
    ),
    (
        Factor::Momentum6m,
        "mom-6m",
        "6-Mo Momentum %",
        FactorCategory::Momentum,
        true,
        "Strong 6-month performance often continues in the short term; this captures intermediate-term momentum.",
    ),
    (
        Factor::Momentum1m,
        "mom-1m",
        "1-Mo Momentum %",
        FactorCategory::Momentum,
        true,
        "One-month momentum captures very short-term trend continuation; higher recent returns indicate near-term strength.",
    ),
    (
        Factor::PriceToBook,
        "p2b",
        "Price to Book Using 9/30 Data",
        FactorCategory::Value,
        false,
        "A lower price-to-book ratio means the stock is cheap relative to its book value, so the factor is inverted before ranking.",
    ),
    (
        Factor::NextFyEarningsYield,
        "next-fy-ep",
        "Next FY Earns/P",
        FactorCategory::Value,
        true,
        "Earnings yield on next fiscal year earnings shows how cheaply the market prices future profits; higher values are more attractive.",
    ),
    (
        Factor::PriceVol1y,
        "price-vol",
        "1-Yr Price Vol %",
        FactorCategory::Quality,
        false,
        "High trailing price volatility signals risk or mispricing; lower volatility is preferred here.",
    ),
    (
        Factor::AccrualsToAssets,
        "accruals",
        "Accruals/Assets",
        FactorCategory::Quality,
        false,
        "High accruals relative to assets point to lower earnings quality, so lower accrual ratios rank higher.",
    ),
    (
        Factor::RoaPct,
        "roa-pct",
        "ROA %",
        FactorCategory::Profitability,
        true,
        "Return on assets as a percentage measures profitability against the asset base; higher ROA suggests better operating performance.",
    ),
    (
        Factor::AssetGrowth1y,
        "asset-growth",
        "1-Yr Asset Growth %",
        FactorCategory::Growth,
        true,
        "Asset growth signals expansion and investment opportunity; higher growth is treated as more attractive.",
    ),
    (
        Factor::CapexGrowth1y,
        "capex-growth",
        "1-Yr CapEX Growth %",
        FactorCategory::Growth,
        true,
        "Rising capital expenditure indicates investment in future growth and is treated as positive for growth strategies.",
    ),
    (
        Factor::BookToPrice,
        "book-price",
        "Book/Price",
        FactorCategory::Value,
        true,
        "Book-to-price is the inverse of price-to-book: higher values mean cheaper relative to book value.",
    ),
];

impl Factor {
    /// All factors in documentation order
    pub fn all() -> Vec<Factor> {
        CATALOGUE.iter().map(|e| e.0).collect()
    }

    /// Row of the factor in `CATALOGUE`
    fn index(&self) -> usize {
        match self {
            Factor::RoeUsing930 => 0,
            Factor::RoaUsing930 => 1,
            Factor::Momentum12m => 2,
            Factor::Momentum6m => 3,
            Factor::Momentum1m => 4,
            Factor::PriceToBook => 5,
            Factor::NextFyEarningsYield => 6,
            Factor::PriceVol1y => 7,
            Factor::AccrualsToAssets => 8,
            Factor::RoaPct => 9,
            Factor::AssetGrowth1y => 10,
            Factor::CapexGrowth1y => 11,
            Factor::BookToPrice => 12,
        }
    }

    fn entry(&self) -> &'static (Factor, &'static str, &'static str, FactorCategory, bool, &'static str) {
        &CATALOGUE[self.index()]
    }

    pub fn key(&self) -> &'static str {
        self.entry().1
    }

    /// Display column the factor reads from the standardized table
    pub fn column_name(&self) -> &'static str {
        self.entry().2
    }

    pub fn category(&self) -> FactorCategory {
        self.entry().3
    }

    pub fn higher_is_better(&self) -> bool {
        self.entry().4
    }

    pub fn thesis(&self) -> &'static str {
        self.entry().5
    }

    /// Parse a factor from its CLI key or display column, ignoring case
    pub fn from_str(s: &str) -> Result<Self, BacktestError> {
        let needle = s.trim();
        CATALOGUE
            .iter()
            .find(|e| e.1.eq_ignore_ascii_case(needle) || e.2.eq_ignore_ascii_case(needle))
            .map(|e| e.0)
            .ok_or_else(|| BacktestError::Config(format!("Unknown factor: {}", s)))
    }

    /// Parse a comma separated factor list, e.g. "roe,mom-12m"
    pub fn parse_list(s: &str) -> Result<Vec<Self>, BacktestError> {
        let mut factors = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let factor = Self::from_str(part)?;
            if !factors.contains(&factor) {
                factors.push(factor);
            }
        }
        if factors.is_empty() {
            return Err(BacktestError::Config("No factors selected".to_string()));
        }
        Ok(factors)
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Numbered factor list with direction and thesis
pub fn format_factor_docs() -> String {
    let mut out = String::new();
    for (i, factor) in Factor::all().iter().enumerate() {
        let direction = if factor.higher_is_better() {
            "Higher is better"
        } else {
            "Lower is better (factor is inverted)"
        };
        out.push_str(&format!(
            "{}. {} [{}] ({}) - {}\n   Thesis: {}\n\n",
            i + 1,
            factor.column_name(),
            factor.key(),
            factor.category(),
            direction,
            factor.thesis()
        ));
    }
    out
}

pub fn print_factor_docs() {
    print!("{}", format_factor_docs());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_complete() {
        let all = Factor::all();
        assert_eq!(all.len(), 13);
        for f in &all {
            assert_eq!(f.entry().0, *f);
        }
    }

    #[test]
    fn test_each_factor_reads_its_own_row() {
        let mut indices: Vec<usize> = Factor::all().iter().map(Factor::index).collect();
        indices.sort();
        indices.dedup();
        assert_eq!(indices.len(), CATALOGUE.len());
        assert_eq!(Factor::PriceToBook.column_name(), "Price to Book Using 9/30 Data");
        assert_eq!(Factor::BookToPrice.key(), "book-price");
        assert!(!Factor::AccrualsToAssets.higher_is_better());
    }

    #[test]
    fn test_inverted_factors() {
        let inverted: Vec<Factor> = Factor::all()
            .into_iter()
            .filter(|f| !f.higher_is_better())
            .collect();
        assert_eq!(
            inverted,
            vec![Factor::PriceToBook, Factor::PriceVol1y, Factor::AccrualsToAssets]
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!(Factor::from_str("ROE").unwrap(), Factor::RoeUsing930);
        assert_eq!(Factor::from_str("12-mo momentum %").unwrap(), Factor::Momentum12m);
        assert!(Factor::from_str("dividend-yield").is_err());
    }

    #[test]
    fn test_parse_list_dedups() {
        let list = Factor::parse_list("roe, mom-12m,roe").unwrap();
        assert_eq!(list, vec![Factor::RoeUsing930, Factor::Momentum12m]);
        assert!(Factor::parse_list(" , ").is_err());
    }

    #[test]
    fn test_docs_mention_every_factor() {
        let docs = format_factor_docs();
        for f in Factor::all() {
            assert!(docs.contains(f.column_name()));
        }
        assert!(docs.starts_with("1. "));
    }
}
