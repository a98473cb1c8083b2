//! Report writers
//!
//! CSV tables through polars, a JSON performance summary, and console
//! summaries in box-drawing style.

use chrono::Local;
use log::info;
use polars::prelude::*;
use std::error::Error as StdError;
use std::fs::File;
use std::path::Path;

use crate::factors::Factor;
use crate::metrics::PerformanceSummary;
use crate::optimizer::OptimizationResult;
use crate::rebalance::{BacktestResult, CohortResult};

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), Box<dyn StdError>> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).finish(df)?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// `portfolio_performance_YYYYmmdd_HHMMSS.csv`
pub fn timestamped_filename(prefix: &str) -> String {
    format!("{}_{}.csv", prefix, Local::now().format("%Y%m%d_%H%M%S"))
}

// ============================================================================
// BACKTEST TABLES
// ============================================================================

pub fn year_by_year_frame(result: &BacktestResult) -> Result<DataFrame, Box<dyn StdError>> {
    let years: Vec<i32> = result.years.clone();
    let values: Vec<f64> = result.portfolio_values.clone();
    let yoy: Vec<Option<f64>> = std::iter::once(None)
        .chain(result.portfolio_values.windows(2).map(|w| {
            if w[0] != 0.0 {
                Some((w[1] / w[0] - 1.0) * 100.0)
            } else {
                None
            }
        }))
        .collect();
    let bench: Vec<Option<f64>> = std::iter::once(None)
        .chain(result.benchmark_returns.iter().map(|b| Some(*b)))
        .collect();

    let df = df! {
        "Year" => years,
        "Portfolio Value" => values,
        "YoY Return (%)" => yoy,
        "Benchmark Return (%)" => bench,
    }?;
    Ok(df)
}

pub fn save_year_by_year_csv(result: &BacktestResult, path: &Path) -> Result<(), Box<dyn StdError>> {
    let mut df = year_by_year_frame(result)?;
    write_csv(&mut df, path)
}

pub fn save_holdings_csv(result: &BacktestResult, path: &Path) -> Result<(), Box<dyn StdError>> {
    let rows: Vec<(i32, &str, &str, f64)> = result
        .holdings
        .iter()
        .flat_map(|h| {
            h.portfolio
                .investments
                .iter()
                .map(move |inv| (h.year, h.factor.column_name(), inv.ticker.as_str(), inv.shares))
        })
        .collect();

    let mut df = df! {
        "year" => rows.iter().map(|r| r.0).collect::<Vec<i32>>(),
        "factor" => rows.iter().map(|r| r.1.to_string()).collect::<Vec<String>>(),
        "ticker" => rows.iter().map(|r| r.2.to_string()).collect::<Vec<String>>(),
        "shares" => rows.iter().map(|r| r.3).collect::<Vec<f64>>(),
    }?;
    write_csv(&mut df, path)
}

pub fn save_yearly_comparisons_csv(
    summary: &PerformanceSummary,
    path: &Path,
) -> Result<(), Box<dyn StdError>> {
    let c = &summary.yearly_comparisons;
    let mut df = df! {
        "year" => c.iter().map(|x| x.year).collect::<Vec<i32>>(),
        "portfolio_return_pct" => c.iter().map(|x| x.portfolio_return_pct).collect::<Vec<f64>>(),
        "benchmark_return_pct" => c.iter().map(|x| x.benchmark_return_pct).collect::<Vec<f64>>(),
        "win" => c.iter().map(|x| x.win).collect::<Vec<bool>>(),
    }?;
    write_csv(&mut df, path)
}

/// Write every backtest report into `output_dir` and print the console summary
pub fn save_all_reports(
    result: &BacktestResult,
    summary: &PerformanceSummary,
    output_dir: &Path,
    json_only: bool,
) -> Result<(), Box<dyn StdError>> {
    std::fs::create_dir_all(output_dir)?;

    save_year_by_year_csv(result, &output_dir.join("year_by_year.csv"))?;
    save_holdings_csv(result, &output_dir.join("holdings.csv"))?;
    save_yearly_comparisons_csv(summary, &output_dir.join("yearly_comparisons.csv"))?;

    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(output_dir.join("performance_summary.json"), json)?;

    if !json_only {
        print_performance_summary(summary);
    }
    Ok(())
}

// ============================================================================
// COHORT AND OPTIMIZER TABLES
// ============================================================================

pub fn cohort_frame(cohort: &CohortResult) -> Result<DataFrame, Box<dyn StdError>> {
    let selected = |side: Option<&crate::rebalance::CohortSide>| -> Vec<Option<u32>> {
        cohort
            .years
            .iter()
            .map(|y| {
                side.and_then(|s| s.per_year.iter().find(|p| p.year == *y))
                    .map(|p| p.n_selected as u32)
            })
            .collect()
    };
    let bottom_values: Vec<Option<f64>> = match &cohort.bottom {
        Some(b) => b.portfolio_values.iter().map(|v| Some(*v)).collect(),
        None => vec![None; cohort.years.len()],
    };

    let df = df! {
        "year" => cohort.years.clone(),
        "top_value" => cohort.top.portfolio_values.clone(),
        "bottom_value" => bottom_values,
        "top_selected" => selected(Some(&cohort.top)),
        "bottom_selected" => selected(cohort.bottom.as_ref()),
    }?;
    Ok(df)
}

pub fn save_cohort_csv(cohort: &CohortResult, path: &Path) -> Result<(), Box<dyn StdError>> {
    let mut df = cohort_frame(cohort)?;
    write_csv(&mut df, path)
}

pub fn save_pareto_csv(
    result: &OptimizationResult,
    factors: &[Factor],
    path: &Path,
) -> Result<(), Box<dyn StdError>> {
    let front = &result.pareto_front;
    let mut columns: Vec<Column> = factors
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let weights: Vec<f64> = front.iter().map(|s| s.weights[i]).collect();
            Column::new(f.key().into(), weights)
        })
        .collect();
    columns.push(Column::new("cagr_pct".into(), front.iter().map(|s| s.cagr).collect::<Vec<f64>>()));
    columns.push(Column::new("sharpe".into(), front.iter().map(|s| s.sharpe).collect::<Vec<f64>>()));
    columns.push(Column::new(
        "volatility_pct".into(),
        front.iter().map(|s| s.volatility).collect::<Vec<f64>>(),
    ));
    let mut df = DataFrame::new(columns)?;
    write_csv(&mut df, path)
}

// ============================================================================
// CONSOLE
// ============================================================================

fn fmt_money(val: f64) -> String {
    let sign = if val < 0.0 { "-" } else { "" };
    let cents = (val.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}.{:02}", sign, grouped, cents % 100)
}

fn fmt_opt(val: Option<f64>) -> String {
    val.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "n/a".to_string())
}

pub fn print_performance_summary(summary: &PerformanceSummary) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║              PORTFOLIO PERFORMANCE SUMMARY                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝");

    println!("\n┌─ Portfolio Value ({} - {}) ─────────────────────────────────┐", summary.start_year, summary.end_year);
    println!("│  Initial Value:            ${:>17}                │", fmt_money(summary.initial_value));
    println!("│  Final Value:              ${:>17}                │", fmt_money(summary.final_value));
    println!("│  Total Return:              {:>17.2}%               │", summary.total_return_pct);
    println!("│  CAGR:                      {:>17.2}%               │", summary.cagr_pct);
    println!("└──────────────────────────────────────────────────────────────┘");

    println!("\n┌─ Versus Benchmark ───────────────────────────────────────────┐");
    println!("│  Benchmark Final:          ${:>17}                │", fmt_money(summary.benchmark_final_value));
    println!("│  Alpha:                     {:>17.2}%               │", summary.alpha_pct);
    println!("│  Information Ratio:         {:>17}                │", fmt_opt(summary.information_ratio));
    println!("│  Yearly Win Rate:           {:>17.2}%               │", summary.win_rate * 100.0);
    println!("└──────────────────────────────────────────────────────────────┘");

    println!("\n┌─ Risk Metrics ───────────────────────────────────────────────┐");
    println!("│  Annualized Return:         {:>17.2}%               │", summary.annualized_return_pct);
    println!("│  Annualized Volatility:     {:>17.2}%               │", summary.annualized_volatility_pct);
    println!("│  Active Volatility:         {:>17.2}%               │", summary.active_volatility_pct);
    println!("│  Max Drawdown:              {:>17.2}%               │", summary.max_drawdown_portfolio * 100.0);
    println!("│  Max Drawdown (Benchmark):  {:>17.2}%               │", summary.max_drawdown_benchmark * 100.0);
    println!("│  Sharpe Ratio:              {:>17}                │", fmt_opt(summary.sharpe_portfolio));
    println!("│  Sharpe Ratio (Benchmark):  {:>17}                │", fmt_opt(summary.sharpe_benchmark));
    println!("│  Risk-Free Rate:            {:>16.2}% ({})", summary.risk_free_rate * 100.0, summary.risk_free_rate_source);
    println!("└──────────────────────────────────────────────────────────────┘");

    if !summary.yearly_comparisons.is_empty() {
        println!("\n┌─ Yearly Win/Loss vs Benchmark ───────────────────────────────┐");
        println!("│  {:<6} {:>14} {:>14} {:>12}              │", "Year", "Portfolio", "Benchmark", "Outperformed");
        for c in &summary.yearly_comparisons {
            println!(
                "│  {:<6} {:>13.2}% {:>13.2}% {:>12}              │",
                c.year,
                c.portfolio_return_pct,
                c.benchmark_return_pct,
                if c.win { "Yes" } else { "No" }
            );
        }
        println!("└──────────────────────────────────────────────────────────────┘\n");
    }
}

pub fn print_cohort_summary(cohort: &CohortResult) {
    println!("\n┌─ Cohort Analysis: top vs bottom {:.0}% ──────────────────────┐", cohort.n_percent);
    println!("│  {:<6} {:>16} {:>16} {:>8} {:>8}   │", "Year", "Top", "Bottom", "Top #", "Bot #");
    for (i, year) in cohort.years.iter().enumerate() {
        let top = cohort.top.portfolio_values.get(i).copied().unwrap_or(0.0);
        let bottom = cohort
            .bottom
            .as_ref()
            .and_then(|b| b.portfolio_values.get(i).copied())
            .map(fmt_money)
            .unwrap_or_else(|| "-".to_string());
        let top_n = cohort
            .top
            .per_year
            .get(i)
            .map(|p| p.n_selected.to_string())
            .unwrap_or_else(|| "-".to_string());
        let bot_n = cohort
            .bottom
            .as_ref()
            .and_then(|b| b.per_year.get(i))
            .map(|p| p.n_selected.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("│  {:<6} {:>16} {:>16} {:>8} {:>8}   │", year, fmt_money(top), bottom, top_n, bot_n);
    }
    println!("└──────────────────────────────────────────────────────────────┘\n");
}

pub fn print_optimization_summary(result: &OptimizationResult, factors: &[Factor]) {
    println!("\n┌─ Factor Weight Optimization ─────────────────────────────────┐");
    println!("│  Pareto solutions: {:<6}                                    │", result.pareto_front.len());
    println!("│  Best weights (by Sharpe):                                   │");
    for (f, w) in factors.iter().zip(&result.best_weights) {
        println!("│    {:<32} {:>8.2}%              │", f.column_name(), w * 100.0);
    }
    if let Some(best) = result
        .pareto_front
        .iter()
        .max_by(|a, b| a.sharpe.total_cmp(&b.sharpe))
    {
        println!("│  CAGR: {:>8.2}%   Sharpe: {:>8.4}   Volatility: {:>8.2}%   │", best.cagr, best.sharpe, best.volatility);
    }
    println!("└──────────────────────────────────────────────────────────────┘\n");
}
