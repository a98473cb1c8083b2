//! Data sources: Supabase (PostgREST over HTTPS) and local CSV files.

use log::{debug, info, warn};
use polars::prelude::*;
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::display::format_fallback_warning;
use crate::error::{BacktestError, Result};
use crate::market::{require_essential_columns, LoadFilters, MarketData, RawTable};

pub const DEFAULT_TABLE: &str = "Full Precision Test";
pub const PAGE_SIZE: usize = 1000;

const FACTOR_KEYWORDS: &[&str] = &[
    "momentum", "roe", "roa", "price", "book", "earns", "vol", "accrual", "growth", "return",
];

// ============================================================================
// CSV
// ============================================================================

/// Read a CSV with every column kept as text
pub fn read_csv_table<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    info!("Loading data file from: {}", path.display());
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    dataframe_to_table(&df)
}

/// Convert a DataFrame into a raw table of stringified cells
pub fn dataframe_to_table(df: &DataFrame) -> Result<RawTable> {
    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|c| c.to_string())
        .collect();
    let mut table = RawTable::new(columns);
    table.rows = vec![Vec::with_capacity(df.width()); df.height()];

    for column in df.get_columns() {
        let series = column.as_materialized_series().cast(&DataType::String)?;
        let values = series.str()?;
        for (row, value) in table.rows.iter_mut().zip(values.into_iter()) {
            row.push(value.map(str::to_string));
        }
    }
    Ok(table)
}

// ============================================================================
// SUPABASE
// ============================================================================

/// Connection settings for the Supabase REST endpoint
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub key: String,
    pub table: String,
}

impl SupabaseConfig {
    /// Resolve settings from explicit values, falling back to
    /// SUPABASE_URL, SUPABASE_KEY and SUPABASE_TABLE
    pub fn resolve(
        url: Option<String>,
        key: Option<String>,
        table: Option<String>,
    ) -> Result<Self> {
        let url = url.or_else(|| env::var("SUPABASE_URL").ok());
        let key = key.or_else(|| env::var("SUPABASE_KEY").ok());
        let (Some(url), Some(key)) = (url, key) else {
            return Err(BacktestError::Config(
                "Supabase URL and key required. Set SUPABASE_URL and SUPABASE_KEY".to_string(),
            ));
        };
        let table = table
            .or_else(|| env::var("SUPABASE_TABLE").ok())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TABLE.to_string());
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            key,
            table,
        })
    }
}

pub struct SupabaseClient {
    config: SupabaseConfig,
    http: reqwest::blocking::Client,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { config, http })
    }

    pub fn table(&self) -> &str {
        &self.config.table
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url, self.config.table)
    }

    fn get(&self, query: &[(&str, String)]) -> Result<Vec<Value>> {
        let response = self
            .http
            .get(self.endpoint())
            .header("apikey", &self.config.key)
            .header("Authorization", format!("Bearer {}", self.config.key))
            .query(query)
            .send()?
            .error_for_status()?;
        let rows: Vec<Value> = response.json()?;
        Ok(rows)
    }

    /// Fetch every row, paging by ID in blocks of [`PAGE_SIZE`]
    pub fn fetch_all(&self, sectors: Option<&[String]>) -> Result<Vec<Value>> {
        let mut rows = Vec::new();
        let mut offset = 0usize;
        loop {
            let query = page_query(offset, PAGE_SIZE, sectors);
            let batch = self.get(&query)?;
            let n = batch.len();
            debug!("Fetched {} rows at offset {} from '{}'", n, offset, self.config.table);
            rows.extend(batch);
            if n < PAGE_SIZE {
                break;
            }
            offset += PAGE_SIZE;
        }
        info!("Fetched {} rows from Supabase table '{}'", rows.len(), self.config.table);
        Ok(rows)
    }

    pub fn load_table(&self, sectors: Option<&[String]>) -> Result<RawTable> {
        let rows = self.fetch_all(sectors)?;
        json_rows_to_table(&rows)
    }

    /// Distinct years present in the table
    pub fn available_years(&self) -> Result<Vec<i32>> {
        let rows = self.fetch_all(None)?;
        let table = json_rows_to_table(&rows)?;
        let data = MarketData::from_raw(table, &LoadFilters::default());
        Ok(data.years())
    }

    /// Factor-like columns found in the first row
    pub fn available_factors(&self) -> Result<Vec<String>> {
        let rows = self.get(&[("select", "*".to_string()), ("limit", "1".to_string())])?;
        Ok(rows.first().map(factor_like_columns).unwrap_or_default())
    }
}

/// Query string for one page, with an optional server-side sector filter
pub fn page_query(offset: usize, limit: usize, sectors: Option<&[String]>) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("select", "*".to_string()),
        ("order", "ID.asc".to_string()),
        ("offset", offset.to_string()),
        ("limit", limit.to_string()),
    ];
    if let Some(sectors) = sectors.filter(|s| !s.is_empty()) {
        let quoted: Vec<String> = sectors.iter().map(|s| format!("\"{}\"", s)).collect();
        query.push(("Scotts_Sector_5", format!("in.({})", quoted.join(","))));
    }
    query
}

fn value_to_cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Flatten JSON objects into a table. Columns are the union of keys in first-seen order.
pub fn json_rows_to_table(rows: &[Value]) -> Result<RawTable> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        let obj = row
            .as_object()
            .ok_or_else(|| BacktestError::NoData("Supabase row is not a JSON object".to_string()))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut table = RawTable::new(columns);
    for row in rows {
        let obj = row.as_object();
        let cells = table
            .columns
            .iter()
            .map(|c| obj.and_then(|o| o.get(c)).and_then(value_to_cell))
            .collect();
        table.rows.push(cells);
    }
    Ok(table)
}

fn factor_like_columns(row: &Value) -> Vec<String> {
    row.as_object()
        .map(|obj| {
            obj.keys()
                .filter(|k| {
                    let lower = k.to_lowercase();
                    FACTOR_KEYWORDS.iter().any(|kw| lower.contains(kw))
                })
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// LOADING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Supabase,
    File,
}

impl SourceKind {
    pub fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "supabase" => Ok(Self::Supabase),
            "file" | "csv" => Ok(Self::File),
            _ => Err(format!("Unknown data source: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub source: SourceKind,
    pub data_path: Option<PathBuf>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub table: Option<String>,
    pub filters: LoadFilters,
}

fn load_file(options: &LoadOptions) -> Result<MarketData> {
    let path = options.data_path.as_ref().ok_or_else(|| {
        BacktestError::Config("File fallback unavailable: provide a data path".to_string())
    })?;
    let table = read_csv_table(path)?;
    require_essential_columns(&table)?;
    Ok(MarketData::from_raw(table, &options.filters))
}

fn load_supabase(options: &LoadOptions) -> Result<MarketData> {
    let config = SupabaseConfig::resolve(
        options.supabase_url.clone(),
        options.supabase_key.clone(),
        options.table.clone(),
    )?;
    let client = SupabaseClient::new(config)?;
    info!("Using Supabase table: '{}'", client.table());
    let table = client.load_table(options.filters.sectors.as_deref())?;
    if table.is_empty() {
        warn!("No data loaded from Supabase. Check your table and connection.");
        return Ok(MarketData::default());
    }
    require_essential_columns(&table)?;
    Ok(MarketData::from_raw(table, &options.filters))
}

/// Load market data, falling back to the CSV file when Supabase fails
pub fn load_data(options: &LoadOptions) -> Result<MarketData> {
    match options.source {
        SourceKind::File => load_file(options),
        SourceKind::Supabase => match load_supabase(options) {
            Ok(data) => Ok(data),
            Err(e) => {
                if options.data_path.is_none() {
                    warn!("Error loading from Supabase: {}", e);
                    return Err(e);
                }
                warn!("{}", format_fallback_warning(&e));
                load_file(options)
            }
        },
    }
}
