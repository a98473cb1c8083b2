//! Factor-based equity portfolio backtester.
//!
//! Loads yearly fundamentals from Supabase or a CSV file, builds top-decile
//! factor portfolios, rebalances them annually and measures the result
//! against the Russell 2000.

pub mod benchmark;
pub mod config;
pub mod display;
pub mod error;
pub mod factors;
pub mod holdings;
pub mod market;
pub mod metrics;
pub mod normalize;
pub mod optimizer;
pub mod rebalance;
pub mod report;
pub mod source;

pub use benchmark::Benchmark;
pub use config::{BacktestConfig, ConfigInput, PathConfig, SectorConfig};
pub use error::{BacktestError, Result};
pub use factors::{print_factor_docs, Factor, FactorCategory};
pub use holdings::{
    calculate_growth, calculate_holdings, calculate_holdings_percent, Investment, Portfolio, Side,
    Weighting,
};
pub use market::{LoadFilters, MarketData, MarketObject, RawTable, StockRecord};
pub use metrics::PerformanceSummary;
pub use optimizer::{optimize_factor_weights, OptimizationResult, OptimizerConfig};
pub use rebalance::{
    rebalance_portfolio, rebalance_portfolio_percent, rebalance_portfolio_weighted, BacktestResult,
    CohortResult, RebalanceOptions,
};
pub use source::{load_data, LoadOptions, SourceKind, SupabaseClient, SupabaseConfig};

#[cfg(test)]
mod tests;
