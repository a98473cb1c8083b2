/// Display and formatting utilities for backtester output
use chrono::Local;

use crate::factors::Factor;

/// Format progress message for one rebalance year
pub fn format_year_growth(year: i32, growth: f64, start_value: f64, end_value: f64) -> String {
    format!(
        "Year {} to {}: Growth: {:.2}%, Start Value: ${:.2}, End Value: ${:.2}",
        year,
        year + 1,
        growth * 100.0,
        start_value,
        end_value
    )
}

/// Format message for a finished data load
pub fn format_load_summary(records: usize, years: &[i32]) -> String {
    match (years.first(), years.last()) {
        (Some(first), Some(last)) => format!(
            "[{}] Loaded {} records covering {} - {}",
            Local::now().format("%H:%M:%S"),
            records,
            first,
            last
        ),
        _ => format!("[{}] Loaded {} records", Local::now().format("%H:%M:%S"), records),
    }
}

/// Format error message for a Supabase failure that falls back to the data file
pub fn format_fallback_warning(error: &dyn std::error::Error) -> String {
    format!("Error loading from Supabase ({}), falling back to data file", error)
}

/// Format error message for report save failure
pub fn format_save_error(error: &dyn std::error::Error) -> String {
    format!("Error saving reports (check the output folder): {}", error)
}

/// Format header for a backtest run
pub fn format_run_header(factors: &[Factor], start: i32, end: i32, aum: f64) -> String {
    let names: Vec<&str> = factors.iter().map(Factor::column_name).collect();
    format!(
        "Backtesting [{}] from {} to {} with ${:.2}",
        names.join(", "),
        start,
        end,
        aum
    )
}
