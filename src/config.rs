// Configuration module for the factor backtester
// Turns command-line values and environment variables into a validated run configuration

use std::{env, error::Error as StdError, path::PathBuf};

use crate::benchmark::Benchmark;
use crate::factors::Factor;
use crate::holdings::Weighting;
use crate::market::{canonical_sector, LoadFilters, SECTORS};
use crate::rebalance::RebalanceOptions;
use crate::report::timestamped_filename;
use crate::source::{LoadOptions, SourceKind};

pub const DEFAULT_START_YEAR: i32 = 2002;
pub const DEFAULT_END_YEAR: i32 = 2023;
pub const DEFAULT_AUM: f64 = 1000.0;

/// Output layout for report files
#[derive(Debug, Clone)]
pub struct PathConfig {
    pub base: PathBuf,
    /// Optional run label; reports go to `{base}/{label}` when set
    pub output_suffix: Option<String>,
}

impl PathConfig {
    pub fn new(base: PathBuf, output_suffix: Option<String>) -> Self {
        Self { base, output_suffix }
    }

    pub fn output_dir(&self) -> PathBuf {
        match &self.output_suffix {
            Some(label) => self.base.join(label),
            None => self.base.clone(),
        }
    }

    pub fn year_by_year_file(&self) -> PathBuf {
        self.output_dir().join("year_by_year.csv")
    }

    pub fn holdings_file(&self) -> PathBuf {
        self.output_dir().join("holdings.csv")
    }

    pub fn summary_file(&self) -> PathBuf {
        self.output_dir().join("performance_summary.json")
    }

    pub fn cohort_file(&self) -> PathBuf {
        self.output_dir().join("cohort.csv")
    }

    pub fn pareto_file(&self) -> PathBuf {
        self.output_dir().join("pareto_front.csv")
    }

    /// `portfolio_performance_YYYYmmdd_HHMMSS.csv` in the output directory
    pub fn performance_file(&self) -> PathBuf {
        self.output_dir().join(timestamped_filename("portfolio_performance"))
    }
}

/// Sector shorthand and validation
pub struct SectorConfig;

impl SectorConfig {
    /// Shorthand names expanding to several sectors
    const DEFINITIONS: &'static [(&'static str, &'static [&'static str])] = &[
        ("all", SECTORS),
        ("cyclical", &["Consumer", "Financials", "Industrials"]),
        ("defensive", &["Healthcare", "Technology"]),
    ];

    /// Parse `a,b` into canonical sector names, expanding shorthand
    pub fn parse(list: &str) -> Result<Vec<String>, String> {
        let mut out: Vec<String> = Vec::new();
        for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let expanded: Vec<&str> = match Self::DEFINITIONS
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(item))
            {
                Some((_, sectors)) => sectors.to_vec(),
                None => vec![canonical_sector(item).ok_or_else(|| {
                    format!("Unknown sector '{}'. Valid sectors: {}", item, SECTORS.join(", "))
                })?],
            };
            for s in expanded {
                if !out.iter().any(|o| o == s) {
                    out.push(s.to_string());
                }
            }
        }
        if out.is_empty() {
            return Err("No sectors given".to_string());
        }
        Ok(out)
    }
}

/// Raw values collected from the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigInput {
    pub source: Option<String>,
    pub data: Option<String>,
    pub table: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub fossil_free: bool,
    pub sectors: Option<String>,
    pub start: Option<i32>,
    pub end: Option<i32>,
    pub aum: Option<f64>,
    pub factors: Option<String>,
    pub weighting: Option<String>,
    pub benchmark: Option<String>,
    pub risk_free: Option<f64>,
    pub output: Option<String>,
    pub output_suffix: Option<String>,
}

/// Main configuration for a backtest run
#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub paths: PathConfig,
    pub load: LoadOptions,
    pub factors: Vec<Factor>,
    pub weighting: Weighting,
    pub start_year: i32,
    pub end_year: i32,
    pub initial_aum: f64,
    pub benchmark: Benchmark,
    pub risk_free_rate: f64,
    pub risk_free_source: String,
}

impl BacktestConfig {
    /// Build configuration from command-line values and environment
    pub fn new(input: ConfigInput) -> Result<Self, Box<dyn StdError>> {
        // Output directory from args, then environment, then ./output
        let output = input
            .output
            .or_else(|| env::var("BACKTEST_OUTPUT_DIR").ok())
            .unwrap_or_else(|| String::from("output"));

        let data_path = input
            .data
            .or_else(|| env::var("BACKTEST_DATA_FILE").ok())
            .map(PathBuf::from);

        // Without credentials or an explicit choice, a data file means file mode
        let source = match input.source {
            Some(s) => SourceKind::from_str(&s).map_err(|e| format!("Invalid source: {}", e))?,
            None if data_path.is_some() && env::var("SUPABASE_URL").is_err() => SourceKind::File,
            None => SourceKind::Supabase,
        };

        let factors = match input.factors {
            Some(list) => Factor::parse_list(&list)?,
            None => vec![Factor::Momentum12m],
        };

        let weighting = match input.weighting {
            Some(w) => Weighting::from_str(&w).map_err(|e| format!("Invalid weighting: {}", e))?,
            None => Weighting::Equal,
        };

        let sectors = match input.sectors {
            Some(list) => Some(SectorConfig::parse(&list)?),
            None => None,
        };

        let start_year = input.start.unwrap_or(DEFAULT_START_YEAR);
        let end_year = input.end.unwrap_or(DEFAULT_END_YEAR);
        if start_year > end_year {
            return Err(format!("Start year {} is after end year {}", start_year, end_year).into());
        }

        let initial_aum = input.aum.unwrap_or(DEFAULT_AUM);
        if !(initial_aum.is_finite() && initial_aum > 0.0) {
            return Err(format!("Initial AUM must be positive, got {}", initial_aum).into());
        }

        let benchmark = match input.benchmark {
            Some(path) => Benchmark::from_csv(&path)?,
            None => Benchmark::russell_2000(),
        };

        let (risk_free_rate, risk_free_source) = match input.risk_free {
            Some(rate) if rate.is_finite() => (rate, "cli".to_string()),
            Some(rate) => return Err(format!("Invalid risk-free rate: {}", rate).into()),
            None => (0.0, "constant".to_string()),
        };

        Ok(Self {
            paths: PathConfig::new(PathBuf::from(output), input.output_suffix),
            load: LoadOptions {
                source,
                data_path,
                supabase_url: input.supabase_url,
                supabase_key: input.supabase_key,
                table: input.table,
                filters: LoadFilters {
                    restrict_fossil_fuels: input.fossil_free,
                    sectors,
                    year_range: Some((start_year, end_year)),
                },
            },
            factors,
            weighting,
            start_year,
            end_year,
            initial_aum,
            benchmark,
            risk_free_rate,
            risk_free_source,
        })
    }

    pub fn rebalance_options(&self) -> RebalanceOptions {
        RebalanceOptions {
            weighting: self.weighting,
            benchmark: self.benchmark.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_parse() {
        let sectors = SectorConfig::parse("technology, HEALTHCARE").unwrap();
        assert_eq!(sectors, vec!["Technology".to_string(), "Healthcare".to_string()]);
        assert_eq!(SectorConfig::parse("all").unwrap().len(), 5);
        assert!(SectorConfig::parse("Utilities").is_err());
        assert!(SectorConfig::parse(" , ").is_err());
    }

    #[test]
    fn test_sector_parse_dedups_shorthand() {
        let sectors = SectorConfig::parse("Consumer,cyclical").unwrap();
        assert_eq!(sectors, vec!["Consumer", "Financials", "Industrials"]);
    }

    #[test]
    fn test_config_defaults() {
        let config = BacktestConfig::new(ConfigInput {
            source: Some("file".to_string()),
            data: Some("data.csv".to_string()),
            output: Some("out".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.start_year, 2002);
        assert_eq!(config.end_year, 2023);
        assert_eq!(config.initial_aum, 1000.0);
        assert_eq!(config.factors, vec![Factor::Momentum12m]);
        assert_eq!(config.weighting, Weighting::Equal);
        assert_eq!(config.load.source, SourceKind::File);
        assert_eq!(config.load.filters.year_range, Some((2002, 2023)));
        assert_eq!(config.risk_free_source, "constant");
        assert_eq!(config.paths.holdings_file(), PathBuf::from("out/holdings.csv"));
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let bad_years = ConfigInput {
            source: Some("file".to_string()),
            start: Some(2010),
            end: Some(2005),
            ..Default::default()
        };
        assert!(BacktestConfig::new(bad_years).is_err());

        let bad_aum = ConfigInput {
            source: Some("file".to_string()),
            aum: Some(0.0),
            ..Default::default()
        };
        assert!(BacktestConfig::new(bad_aum).is_err());

        let bad_factor = ConfigInput {
            source: Some("file".to_string()),
            factors: Some("roe,nonsense".to_string()),
            ..Default::default()
        };
        assert!(BacktestConfig::new(bad_factor).is_err());
    }

    #[test]
    fn test_path_config_suffix() {
        let paths = PathConfig::new(PathBuf::from("reports"), Some("run1".to_string()));
        assert_eq!(paths.cohort_file(), PathBuf::from("reports/run1/cohort.csv"));
        let perf = paths.performance_file();
        assert!(perf.starts_with("reports/run1"));
    }
}
