// End-to-end test suite for the factor backtester
// Run with: cargo test
// Run specific test: cargo test test_name -- --nocapture

use super::*;
use polars::prelude::*;
use std::path::PathBuf;

// ============================================================================
// TEST DATA FIXTURES
// ============================================================================

const FIXTURE_TICKERS: usize = 20;
const FIXTURE_YEARS: [i32; 3] = [2002, 2003, 2004];

/// Twenty tickers over three years. Ticker `i` has factor values `i` and its
/// price grows `i`% a year, so the ranking and the realised returns agree.
fn create_universe_frame() -> DataFrame {
    let mut ticker_region = Vec::new();
    let mut date = Vec::new();
    let mut price = Vec::new();
    let mut cap = Vec::new();
    let mut momentum = Vec::new();
    let mut roe = Vec::new();
    let mut industry = Vec::new();
    let mut sector = Vec::new();

    for (k, year) in FIXTURE_YEARS.iter().enumerate() {
        for i in 0..FIXTURE_TICKERS {
            ticker_region.push(format!("T{:02}-US", i));
            date.push(format!("{}-09-30", year));
            price.push((10.0 + i as f64) * (1.0 + i as f64 / 100.0).powi(k as i32));
            cap.push(1_000.0 * (i as f64 + 1.0));
            momentum.push(i as f64);
            roe.push(i as f64);
            industry.push(if i == 0 { "Integrated Oil" } else { "Software" }.to_string());
            sector.push(market::SECTORS[i % market::SECTORS.len()].to_string());
        }
    }

    df! {
        "Ticker-Region" => ticker_region,
        "Date" => date,
        "Ending_Price" => price,
        "Market Capitalization" => cap,
        "12-Mo_Momentum" => momentum,
        "ROE using 9/30 Data" => roe,
        "FactSet Industry" => industry,
        "Scott's Sector (5)" => sector,
    }
    .unwrap()
}

fn write_fixture(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("factor_backtester_tests");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let mut df = create_universe_frame();
    let mut file = std::fs::File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(&mut df).unwrap();
    path
}

fn file_options(path: PathBuf, filters: LoadFilters) -> LoadOptions {
    LoadOptions {
        source: SourceKind::File,
        data_path: Some(path),
        supabase_url: None,
        supabase_key: None,
        table: None,
        filters,
    }
}

fn load_fixture(name: &str, filters: LoadFilters) -> MarketData {
    let path = write_fixture(name);
    load_data(&file_options(path, filters)).unwrap()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {}, got {}",
        expected,
        actual
    );
}

// ============================================================================
// LOADING TESTS
// ============================================================================

#[cfg(test)]
mod loading_tests {
    use super::*;

    #[test]
    fn test_load_csv_standardizes_columns() {
        let data = load_fixture("standardize.csv", LoadFilters::default());
        assert_eq!(data.len(), FIXTURE_TICKERS * FIXTURE_YEARS.len());
        assert_eq!(data.years(), FIXTURE_YEARS.to_vec());

        let market = data.market_for_year(2002);
        assert_eq!(market.len(), FIXTURE_TICKERS);
        assert_eq!(market.get_price("T05"), Some(15.0));
        assert_eq!(market.get("T07").and_then(|r| r.factor(Factor::Momentum12m)), Some(7.0));
        println!("✓ CSV columns mapped onto display names");
    }

    #[test]
    fn test_fossil_filter_removes_oil() {
        let filters = LoadFilters {
            restrict_fossil_fuels: true,
            ..Default::default()
        };
        let data = load_fixture("fossil.csv", filters);
        assert_eq!(data.len(), (FIXTURE_TICKERS - 1) * FIXTURE_YEARS.len());
        assert!(data.market_for_year(2003).get("T00").is_none());
        println!("✓ Fossil filter drops Integrated Oil");
    }

    #[test]
    fn test_sector_and_year_filters() {
        let filters = LoadFilters {
            restrict_fossil_fuels: false,
            sectors: Some(vec!["Technology".to_string()]),
            year_range: Some((2003, 2004)),
        };
        let data = load_fixture("sector.csv", filters);
        assert_eq!(data.years(), vec![2003, 2004]);
        let market = data.market_for_year(2003);
        let mut tickers: Vec<&str> = market.stocks().iter().map(|r| r.ticker.as_str()).collect();
        tickers.sort();
        assert_eq!(tickers, vec!["T01", "T06", "T11", "T16"]);
        println!("✓ Sector and year filters applied");
    }

    #[test]
    fn test_missing_file_without_supabase_fails() {
        let options = file_options(PathBuf::from("/nonexistent/universe.csv"), LoadFilters::default());
        assert!(load_data(&options).is_err());
    }

    #[test]
    fn test_dataframe_to_table_keeps_nulls() {
        let df = df! {
            "ticker" => &["AAA", "BBB"],
            "ending_price" => &[Some(1.5), None],
        }
        .unwrap();
        let table = source::dataframe_to_table(&df).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1][1], None);
        println!("✓ DataFrame nulls become missing cells");
    }
}

// ============================================================================
// BACKTEST TESTS
// ============================================================================

#[cfg(test)]
mod backtest_tests {
    use super::*;

    #[test]
    fn test_top_decile_backtest() {
        let data = load_fixture("backtest.csv", LoadFilters::default());
        let result = rebalance_portfolio(
            &data,
            &[Factor::Momentum12m],
            2002,
            2004,
            1000.0,
            &RebalanceOptions::default(),
        )
        .unwrap();

        assert_eq!(result.years, vec![2002, 2003, 2004]);
        assert_eq!(result.portfolio_values.len(), 3);
        // top 2 of 20 names grow 19% and 18%
        for r in &result.yearly_returns {
            assert_close(*r, 0.185);
        }
        assert_close(result.final_value, 1000.0 * 1.185 * 1.185);
        assert_eq!(result.benchmark_returns, vec![34.62, 17.48]);

        let first_year: Vec<&str> = result
            .holdings
            .iter()
            .filter(|h| h.year == 2002)
            .flat_map(|h| h.portfolio.tickers())
            .collect();
        assert_eq!(first_year, vec!["T19", "T18"]);
        println!("✓ Top-decile backtest compounds as expected");
    }

    #[test]
    fn test_multi_factor_split() {
        let data = load_fixture("multi.csv", LoadFilters::default());
        let result = rebalance_portfolio_weighted(
            &data,
            &[Factor::Momentum12m, Factor::RoeUsing930],
            &[3.0, 1.0],
            2002,
            2004,
            1000.0,
            &RebalanceOptions::default(),
        )
        .unwrap();
        assert_close(result.final_value, 1000.0 * 1.185 * 1.185);
        assert_eq!(result.holdings.len(), 4);
    }

    #[test]
    fn test_factor_without_data_holds_cash() {
        // the fixture has no price-to-book column, so that sleeve stays in cash
        let data = load_fixture("cash_sleeve.csv", LoadFilters::default());
        let result = rebalance_portfolio(
            &data,
            &[Factor::Momentum12m, Factor::PriceToBook],
            2002,
            2004,
            1000.0,
            &RebalanceOptions::default(),
        )
        .unwrap();

        let mut expected = 1000.0;
        for (i, r) in result.yearly_returns.iter().enumerate() {
            expected = expected / 2.0 * 1.185 + expected / 2.0;
            assert_close(result.portfolio_values[i + 1], expected);
            assert_close(
                *r,
                result.portfolio_values[i + 1] / result.portfolio_values[i] - 1.0,
            );
        }
        assert_close(result.final_value, expected);

        let summary = PerformanceSummary::from_result(&result, 0.0, "constant");
        assert_close(summary.annualized_return_pct, summary.cagr_pct);
        println!("✓ Empty factor sleeve carried as cash");
    }

    #[test]
    fn test_summary_and_reports() {
        let data = load_fixture("reports.csv", LoadFilters::default());
        let result = rebalance_portfolio(
            &data,
            &[Factor::Momentum12m],
            2002,
            2004,
            1000.0,
            &RebalanceOptions::default(),
        )
        .unwrap();
        let summary = PerformanceSummary::from_result(&result, 0.0, "constant");
        assert_close(summary.cagr_pct, 18.5);
        assert_eq!(summary.max_drawdown_portfolio, 0.0);
        assert!(summary.annualized_volatility_pct < 1e-6);
        assert_eq!(summary.win_rate, 0.5);

        let dir = std::env::temp_dir().join("factor_backtester_tests").join("reports");
        report::save_all_reports(&result, &summary, &dir, true).unwrap();
        let year_by_year = std::fs::read_to_string(dir.join("year_by_year.csv")).unwrap();
        assert!(year_by_year.starts_with("Year,Portfolio Value,YoY Return (%),Benchmark Return (%)"));
        assert_eq!(year_by_year.lines().count(), 4);
        println!("✓ Summary and reports written");
    }

    #[test]
    fn test_cohort_backtest() {
        let data = load_fixture("cohort.csv", LoadFilters::default());
        let cohort = rebalance_portfolio_percent(
            &data,
            &[Factor::Momentum12m],
            2002,
            2004,
            1000.0,
            10.0,
            true,
            &RebalanceOptions::default(),
        )
        .unwrap();

        // 20 names at 10% still hold the 5-name minimum
        assert_eq!(cohort.top.per_year[0].n_selected, 5);
        assert_close(cohort.top.yearly_returns[0], 0.17);
        let bottom = cohort.bottom.as_ref().unwrap();
        assert_close(bottom.yearly_returns[0], 0.02);
        assert!(cohort.top.final_value() > bottom.final_value());

        let dir = std::env::temp_dir().join("factor_backtester_tests");
        let path = dir.join("cohort_report.csv");
        report::save_cohort_csv(&cohort, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("year,top_value,bottom_value,top_selected,bottom_selected"));
        println!("✓ Cohort analysis separates top and bottom");
    }

    #[test]
    fn test_optimizer_on_fixture() {
        let data = load_fixture("optimize.csv", LoadFilters::default());
        let factors = [Factor::Momentum12m, Factor::RoeUsing930];
        let config = OptimizerConfig {
            population_size: 6,
            generations: 2,
            seed: 7,
        };
        let result = optimize_factor_weights(
            &data,
            &factors,
            2002,
            2004,
            1000.0,
            &config,
            &RebalanceOptions::default(),
        )
        .unwrap();
        assert!(!result.pareto_front.is_empty());
        let total: f64 = result.best_weights.iter().sum();
        assert_close(total, 1.0);
        assert_close(result.pareto_front[0].cagr, 18.5);
    }
}

// ============================================================================
// CONFIG TESTS
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_config_to_backtest() {
        let path = write_fixture("config.csv");
        let config = BacktestConfig::new(ConfigInput {
            data: Some(path.to_string_lossy().to_string()),
            source: Some("file".to_string()),
            factors: Some("mom-12m".to_string()),
            start: Some(2002),
            end: Some(2003),
            aum: Some(500.0),
            sectors: Some("all".to_string()),
            ..Default::default()
        })
        .unwrap();

        let data = load_data(&config.load).unwrap();
        assert_eq!(data.years(), vec![2002, 2003]);
        let result = rebalance_portfolio(
            &data,
            &config.factors,
            config.start_year,
            config.end_year,
            config.initial_aum,
            &config.rebalance_options(),
        )
        .unwrap();
        assert_close(result.final_value, 500.0 * 1.185);
    }
}
