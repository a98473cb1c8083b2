use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::error::Error as StdError;

use factor_backtester::config::{BacktestConfig, ConfigInput};
use factor_backtester::display::{format_load_summary, format_run_header, format_save_error};
use factor_backtester::metrics::PerformanceSummary;
use factor_backtester::report;
use factor_backtester::source::{SourceKind, SupabaseClient, SupabaseConfig};
use factor_backtester::{
    load_data, optimize_factor_weights, print_factor_docs, rebalance_portfolio,
    rebalance_portfolio_percent, OptimizerConfig,
};

/// Factor backtester - annual top-decile portfolios against the Russell 2000
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,

    /// Enable verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Data source: 'supabase' or 'file'
    #[arg(long, global = true)]
    source: Option<String>,

    /// CSV data file (also the fallback when Supabase fails)
    #[arg(short, long, global = true)]
    data: Option<String>,

    /// Supabase table name
    #[arg(long, global = true)]
    table: Option<String>,

    #[arg(long, global = true)]
    supabase_url: Option<String>,

    #[arg(long, global = true)]
    supabase_key: Option<String>,

    /// Exclude oil, gas, coal and other fossil-fuel industries
    #[arg(long, global = true)]
    fossil_free: bool,

    /// Comma separated sectors to keep (e.g. Technology,Healthcare)
    #[arg(long, global = true)]
    sectors: Option<String>,

    #[arg(long, global = true)]
    start: Option<i32>,

    #[arg(long, global = true)]
    end: Option<i32>,

    /// Initial assets under management
    #[arg(long, global = true)]
    aum: Option<f64>,

    /// Comma separated factor keys (see the 'factors' command)
    #[arg(short, long, global = true)]
    factors: Option<String>,

    /// Position sizing: 'equal' or 'cap'
    #[arg(short, long, global = true)]
    weighting: Option<String>,

    /// CSV with year,return_pct rows replacing the Russell 2000 table
    #[arg(long, global = true)]
    benchmark: Option<String>,

    /// Risk-free rate as a decimal (e.g. 0.02)
    #[arg(long, global = true)]
    risk_free: Option<f64>,

    /// Output folder for reports
    #[arg(short, long, global = true)]
    output: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an annually rebalanced top-decile backtest
    Run {
        /// Write reports without printing the console summary
        #[arg(long)]
        json_only: bool,

        /// Also write a timestamped portfolio_performance CSV
        #[arg(long)]
        timestamped: bool,
    },
    /// Compare top and bottom factor cohorts
    Cohort {
        /// Cohort size in percent of the universe
        #[arg(short = 'n', long, default_value_t = 10.0)]
        percent: f64,

        /// Skip the bottom cohort
        #[arg(long)]
        no_bottom: bool,
    },
    /// Search factor weights with NSGA-II
    Optimize {
        #[arg(long, default_value_t = 30)]
        population: usize,

        #[arg(long, default_value_t = 50)]
        generations: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Describe the available factors
    Factors {
        /// List factor-like columns found in the Supabase table
        #[arg(long)]
        available: bool,
    },
    /// List the years present in the data source
    Years,
}

impl CommonArgs {
    fn into_input(self) -> ConfigInput {
        ConfigInput {
            source: self.source,
            data: self.data,
            table: self.table,
            supabase_url: self.supabase_url,
            supabase_key: self.supabase_key,
            fossil_free: self.fossil_free,
            sectors: self.sectors,
            start: self.start,
            end: self.end,
            aum: self.aum,
            factors: self.factors,
            weighting: self.weighting,
            benchmark: self.benchmark,
            risk_free: self.risk_free,
            output: self.output,
            output_suffix: None,
        }
    }
}

fn run_backtest(config: &BacktestConfig, json_only: bool, timestamped: bool) -> Result<(), Box<dyn StdError>> {
    let data = load_data(&config.load)?;
    info!("{}", format_load_summary(data.len(), &data.years()));
    info!(
        "{}",
        format_run_header(&config.factors, config.start_year, config.end_year, config.initial_aum)
    );

    let result = rebalance_portfolio(
        &data,
        &config.factors,
        config.start_year,
        config.end_year,
        config.initial_aum,
        &config.rebalance_options(),
    )?;
    let summary = PerformanceSummary::from_result(&result, config.risk_free_rate, &config.risk_free_source);

    let output_dir = config.paths.output_dir();
    if let Err(e) = report::save_all_reports(&result, &summary, &output_dir, json_only) {
        eprintln!("{}", format_save_error(&*e));
        return Err(e);
    }
    if timestamped {
        report::save_year_by_year_csv(&result, &config.paths.performance_file())?;
    }
    info!("Reports saved to: {}", output_dir.display());
    Ok(())
}

fn run_cohort(config: &BacktestConfig, percent: f64, include_bottom: bool) -> Result<(), Box<dyn StdError>> {
    let data = load_data(&config.load)?;
    info!("{}", format_load_summary(data.len(), &data.years()));

    let cohort = rebalance_portfolio_percent(
        &data,
        &config.factors,
        config.start_year,
        config.end_year,
        config.initial_aum,
        percent,
        include_bottom,
        &config.rebalance_options(),
    )?;

    std::fs::create_dir_all(config.paths.output_dir())?;
    report::save_cohort_csv(&cohort, &config.paths.cohort_file())?;
    report::print_cohort_summary(&cohort);
    Ok(())
}

fn run_optimize(config: &BacktestConfig, optimizer: &OptimizerConfig) -> Result<(), Box<dyn StdError>> {
    let data = load_data(&config.load)?;
    info!("{}", format_load_summary(data.len(), &data.years()));

    let result = optimize_factor_weights(
        &data,
        &config.factors,
        config.start_year,
        config.end_year,
        config.initial_aum,
        optimizer,
        &config.rebalance_options(),
    )?;

    std::fs::create_dir_all(config.paths.output_dir())?;
    report::save_pareto_csv(&result, &config.factors, &config.paths.pareto_file())?;
    report::print_optimization_summary(&result, &config.factors);
    Ok(())
}

fn list_available_factors(config: &BacktestConfig) -> Result<(), Box<dyn StdError>> {
    let load = &config.load;
    let client = SupabaseClient::new(SupabaseConfig::resolve(
        load.supabase_url.clone(),
        load.supabase_key.clone(),
        load.table.clone(),
    )?)?;
    for column in client.available_factors()? {
        println!("{}", column);
    }
    Ok(())
}

fn list_years(config: &BacktestConfig) -> Result<(), Box<dyn StdError>> {
    let mut load = config.load.clone();
    load.filters.year_range = None;

    let years = if load.source == SourceKind::Supabase {
        let remote = SupabaseConfig::resolve(
            load.supabase_url.clone(),
            load.supabase_key.clone(),
            load.table.clone(),
        )
        .and_then(SupabaseClient::new)
        .and_then(|client| client.available_years());
        match remote {
            Ok(years) => years,
            Err(e) => {
                warn!("Could not query years from Supabase: {}", e);
                load_data(&load)?.years()
            }
        }
    } else {
        load_data(&load)?.years()
    };

    if years.is_empty() {
        eprintln!("No years found in data source");
        return Ok(());
    }
    for year in years {
        println!("{}", year);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn StdError>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Command::Factors { available: false } = cli.command {
        print_factor_docs();
        return Ok(());
    }

    let config = BacktestConfig::new(cli.common.into_input())?;
    info!("Output folder: {}", config.paths.output_dir().display());

    match cli.command {
        Command::Run { json_only, timestamped } => run_backtest(&config, json_only, timestamped)?,
        Command::Cohort { percent, no_bottom } => run_cohort(&config, percent, !no_bottom)?,
        Command::Optimize {
            population,
            generations,
            seed,
        } => {
            let optimizer = OptimizerConfig {
                population_size: population,
                generations,
                seed,
            };
            run_optimize(&config, &optimizer)?
        }
        Command::Factors { .. } => list_available_factors(&config)?,
        Command::Years => list_years(&config)?,
    }

    info!("Done!");
    Ok(())
}
