//! Market data model
//!
//! Raw rows from any source land in a [`RawTable`] of optional strings. The
//! table is standardized onto the display column names, filtered, and turned
//! into typed [`StockRecord`]s held by [`MarketData`]. A [`MarketObject`] is
//! the slice of one year, keyed by ticker.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{BacktestError, Result};
use crate::factors::Factor;

/// Standardized column names
pub mod columns {
    pub const ID: &str = "ID";
    pub const TICKER: &str = "Ticker";
    pub const TICKER_REGION: &str = "Ticker-Region";
    pub const DATE: &str = "Date";
    pub const YEAR: &str = "Year";
    pub const ENDING_PRICE: &str = "Ending Price";
    pub const MARKET_CAP: &str = "Market Capitalization";
    pub const INDUSTRY: &str = "FactSet Industry";
    pub const SECTOR: &str = "Scott's Sector (5)";
}

/// Source spellings mapped onto display names. Supabase underscore names first,
/// then the snake_case database schema.
const COLUMN_ALIASES: &[(&str, &str)] = &[
    ("Security_Name", "Security Name"),
    ("Russell_2000_Port_Weight", "Russell 2000 Port. Weight"),
    ("Ending_Price", "Ending Price"),
    ("Market_Capitalization", "Market Capitalization"),
    ("FactSet_Industry", "FactSet Industry"),
    ("Scotts_Sector_5", "Scott's Sector (5)"),
    ("ROE_using_9-30_Data", "ROE using 9/30 Data"),
    ("ROA_using_9-30_Data", "ROA using 9/30 Data"),
    ("Price_to_Book_Using_9-30_Data", "Price to Book Using 9/30 Data"),
    ("Next_FY_Earns-P", "Next FY Earns/P"),
    ("12-Mo_Momentum", "12-Mo Momentum %"),
    ("6-Mo_Momentum", "6-Mo Momentum %"),
    ("1-Mo_Momentum", "1-Mo Momentum %"),
    ("1-Yr_Price_Vol", "1-Yr Price Vol %"),
    ("Accruals-Assets", "Accruals/Assets"),
    ("ROA", "ROA %"),
    ("1-Yr_Asset_Growth", "1-Yr Asset Growth %"),
    ("1-Yr_CapEX_Growth", "1-Yr CapEX Growth %"),
    ("Book-Price", "Book/Price"),
    ("Next-Years_Return", "Next-Year's Return %"),
    ("Next-Years_Active_Return", "Next-Year's Active Return %"),
    ("id", "ID"),
    ("security_name", "Security Name"),
    ("ticker", "Ticker"),
    ("ticker_region", "Ticker-Region"),
    ("russell_2000_port_weight", "Russell 2000 Port. Weight"),
    ("ending_price", "Ending Price"),
    ("market_capitalization", "Market Capitalization"),
    ("date", "Date"),
    ("year", "Year"),
    ("factset_industry", "FactSet Industry"),
    ("scotts_sector_5", "Scott's Sector (5)"),
    ("roe_using_9_30_data", "ROE using 9/30 Data"),
    ("roa_using_9_30_data", "ROA using 9/30 Data"),
    ("momentum_12m_pct", "12-Mo Momentum %"),
    ("momentum_6m_pct", "6-Mo Momentum %"),
    ("momentum_1m_pct", "1-Mo Momentum %"),
    ("price_to_book_using_9_30_data", "Price to Book Using 9/30 Data"),
    ("next_fy_earns_p", "Next FY Earns/P"),
    ("price_vol_1yr_pct", "1-Yr Price Vol %"),
    ("accruals_assets", "Accruals/Assets"),
    ("roa_pct", "ROA %"),
    ("asset_growth_1yr_pct", "1-Yr Asset Growth %"),
    ("capex_growth_1yr_pct", "1-Yr CapEX Growth %"),
    ("book_price", "Book/Price"),
    ("next_year_return_pct", "Next-Year's Return %"),
    ("next_year_active_return_pct", "Next-Year's Active Return %"),
];

const NULL_SENTINELS: &[&str] = &["--", "N/A", "#N/A", "", "NULL", "null"];

const FOSSIL_KEYWORDS: &[&str] = &["oil", "gas", "coal", "energy", "fossil"];

/// Sectors available in the "Scott's Sector (5)" column
pub const SECTORS: &[&str] = &[
    "Consumer",
    "Technology",
    "Financials",
    "Industrials",
    "Healthcare",
];

/// Canonical sector name for user input, ignoring case
pub fn canonical_sector(name: &str) -> Option<&'static str> {
    SECTORS
        .iter()
        .find(|s| s.eq_ignore_ascii_case(name.trim()))
        .copied()
}

// ============================================================================
// RAW TABLE
// ============================================================================

/// Untyped rows as delivered by a data source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell value, `None` when the column is absent or the cell is missing
    pub fn cell<'a>(&'a self, row: &'a [Option<String>], name: &str) -> Option<&'a str> {
        self.column_index(name)
            .and_then(|i| row.get(i))
            .and_then(|v| v.as_deref())
    }

    fn push_column(&mut self, name: &str, values: Vec<Option<String>>) {
        self.columns.push(name.to_string());
        for (row, v) in self.rows.iter_mut().zip(values) {
            row.push(v);
        }
    }

    fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&RawTable, &[Option<String>]) -> bool,
    {
        let table: &RawTable = self;
        let mask: Vec<bool> = table.rows.iter().map(|r| keep(table, r)).collect();
        let mut mask = mask.into_iter();
        self.rows.retain(|_| mask.next().unwrap_or(false));
    }

    fn tickers(&self) -> HashSet<String> {
        self.rows
            .iter()
            .filter_map(|r| self.cell(r, columns::TICKER).map(str::to_string))
            .collect()
    }
}

// ============================================================================
// STANDARDIZATION
// ============================================================================

fn display_name(raw: &str) -> String {
    let trimmed = raw.trim();
    COLUMN_ALIASES
        .iter()
        .find(|(from, _)| *from == trimmed)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Fail when a raw table lacks a price, a ticker or a year source column
pub fn require_essential_columns(raw: &RawTable) -> Result<()> {
    let names: HashSet<String> = raw.columns.iter().map(|c| display_name(c)).collect();
    let required: [(&str, &[&str]); 3] = [
        (columns::ENDING_PRICE, &[columns::ENDING_PRICE]),
        (columns::TICKER, &[columns::TICKER, columns::TICKER_REGION]),
        (columns::YEAR, &[columns::YEAR, columns::DATE]),
    ];
    for (label, candidates) in required {
        if !candidates.iter().any(|c| names.contains(*c)) {
            return Err(BacktestError::MissingColumn(label.to_string()));
        }
    }
    Ok(())
}

fn clean_cell(cell: Option<String>) -> Option<String> {
    cell.and_then(|v| {
        let t = v.trim();
        if NULL_SENTINELS.contains(&t) {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Parse a year from a date in one of the formats the sources produce
pub fn parse_year(value: &str) -> Option<i32> {
    let v = value.trim();
    if let Ok(d) = NaiveDate::parse_from_str(v, "%Y-%m-%d") {
        return Some(d.year());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(v, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.year());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(v, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.year());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
        return Some(dt.year());
    }
    if let Ok(d) = NaiveDate::parse_from_str(v, "%m/%d/%Y") {
        return Some(d.year());
    }
    parse_year_number(v)
}

fn parse_year_number(v: &str) -> Option<i32> {
    let n: f64 = v.trim().parse().ok()?;
    if n.is_finite() && n.fract() == 0.0 && (1800.0..=2200.0).contains(&n) {
        Some(n as i32)
    } else {
        None
    }
}

/// Rename columns to display names, normalize null sentinels, and derive
/// `Ticker` and `Year` when the source only carries `Ticker-Region` and `Date`.
pub fn standardize(raw: RawTable) -> RawTable {
    let mut seen = HashSet::new();
    let mut keep_idx = Vec::new();
    let mut names = Vec::new();
    for (i, c) in raw.columns.iter().enumerate() {
        let name = display_name(c);
        if seen.insert(name.clone()) {
            keep_idx.push(i);
            names.push(name);
        } else {
            debug!("Dropping duplicate column '{}'", c);
        }
    }

    let mut table = RawTable::new(names);
    for row in raw.rows {
        let mut row = row;
        let cleaned: Vec<Option<String>> = keep_idx
            .iter()
            .map(|&i| clean_cell(row.get_mut(i).and_then(Option::take)))
            .collect();
        table.rows.push(cleaned);
    }

    if !table.has_column(columns::TICKER) && table.has_column(columns::TICKER_REGION) {
        let tickers: Vec<Option<String>> = table
            .rows
            .iter()
            .map(|r| {
                table
                    .cell(r, columns::TICKER_REGION)
                    .and_then(|tr| tr.split('-').next())
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
            })
            .collect();
        table.push_column(columns::TICKER, tickers);
    }

    if !table.has_column(columns::YEAR) && table.has_column(columns::DATE) {
        let years: Vec<Option<String>> = table
            .rows
            .iter()
            .map(|r| {
                table
                    .cell(r, columns::DATE)
                    .and_then(parse_year)
                    .map(|y| y.to_string())
            })
            .collect();
        table.push_column(columns::YEAR, years);
    }

    table
}

// ============================================================================
// FILTERS
// ============================================================================

/// Row filters applied after standardization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadFilters {
    pub restrict_fossil_fuels: bool,
    pub sectors: Option<Vec<String>>,
    pub year_range: Option<(i32, i32)>,
}

fn is_fossil_industry(industry: &str) -> bool {
    let lower = industry.to_lowercase();
    FOSSIL_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Drop oil, gas, coal and other fossil-fuel industries. Rows without an industry stay.
pub fn apply_fossil_filter(table: &mut RawTable) {
    if !table.has_column(columns::INDUSTRY) {
        warn!("'{}' column not found. Fossil fuel filtering skipped.", columns::INDUSTRY);
        return;
    }
    let before = table.tickers();
    table.retain_rows(|t, r| !t.cell(r, columns::INDUSTRY).is_some_and(is_fossil_industry));
    let after = table.tickers();

    let mut removed: Vec<&String> = before.difference(&after).collect();
    removed.sort();
    let shown: Vec<&str> = removed.iter().take(25).map(|s| s.as_str()).collect();
    info!(
        "Fossil filter removed {} tickers: {}{}",
        removed.len(),
        shown.join(", "),
        if removed.len() > 25 { " ..." } else { "" }
    );
}

/// Keep only rows whose sector is in `sectors`
pub fn apply_sector_filter(table: &mut RawTable, sectors: &[String]) {
    if sectors.is_empty() {
        return;
    }
    if !table.has_column(columns::SECTOR) {
        warn!("'{}' column not found. Sector filtering skipped.", columns::SECTOR);
        return;
    }
    let before = table.len();
    table.retain_rows(|t, r| {
        t.cell(r, columns::SECTOR)
            .is_some_and(|s| sectors.iter().any(|want| want.trim().eq_ignore_ascii_case(s)))
    });
    info!(
        "Sector filter kept {} rows and removed {}",
        table.len(),
        before - table.len()
    );
}

pub fn drop_duplicate_rows(table: &mut RawTable) -> usize {
    let before = table.len();
    let mut seen = HashSet::new();
    let rows = std::mem::take(&mut table.rows);
    table.rows = rows.into_iter().filter(|r| seen.insert(r.clone())).collect();
    before - table.len()
}

// ============================================================================
// RECORDS
// ============================================================================

/// One security in one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub ticker: String,
    pub ticker_region: Option<String>,
    pub year: i32,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub industry: Option<String>,
    pub sector: Option<String>,
    pub factors: HashMap<Factor, f64>,
}

impl StockRecord {
    pub fn new(ticker: &str, year: i32, price: Option<f64>) -> Self {
        Self {
            ticker: ticker.to_string(),
            ticker_region: None,
            year,
            price,
            market_cap: None,
            industry: None,
            sector: None,
            factors: HashMap::new(),
        }
    }

    pub fn with_factor(mut self, factor: Factor, value: f64) -> Self {
        self.factors.insert(factor, value);
        self
    }

    pub fn with_market_cap(mut self, cap: f64) -> Self {
        self.market_cap = Some(cap);
        self
    }

    pub fn factor(&self, factor: Factor) -> Option<f64> {
        self.factors.get(&factor).copied()
    }
}

fn parse_number(v: Option<&str>) -> Option<f64> {
    v.and_then(|s| s.replace(',', "").trim().parse::<f64>().ok())
        .filter(|x| x.is_finite())
}

/// Build a record when the row carries a positive price, a ticker and a year
fn record_from_row(table: &RawTable, row: &[Option<String>]) -> Option<StockRecord> {
    let price = parse_number(table.cell(row, columns::ENDING_PRICE)).filter(|p| *p > 0.0)?;
    let ticker = table
        .cell(row, columns::TICKER)
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != "--")?;
    let year = table.cell(row, columns::YEAR).and_then(parse_year_number)?;

    let mut factors = HashMap::new();
    for f in Factor::all() {
        if let Some(v) = parse_number(table.cell(row, f.column_name())) {
            factors.insert(f, v);
        }
    }

    Some(StockRecord {
        ticker: ticker.to_string(),
        ticker_region: table.cell(row, columns::TICKER_REGION).map(str::to_string),
        year,
        price: Some(price),
        market_cap: parse_number(table.cell(row, columns::MARKET_CAP)),
        industry: table.cell(row, columns::INDUSTRY).map(str::to_string),
        sector: table.cell(row, columns::SECTOR).map(str::to_string),
        factors,
    })
}

// ============================================================================
// MARKET DATA
// ============================================================================

/// All cleaned records across every year
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    pub records: Vec<StockRecord>,
}

impl MarketData {
    pub fn new(records: Vec<StockRecord>) -> Self {
        Self { records }
    }

    /// Standardize, filter and type a raw table
    pub fn from_raw(raw: RawTable, filters: &LoadFilters) -> Self {
        let mut table = standardize(raw);

        if filters.restrict_fossil_fuels {
            apply_fossil_filter(&mut table);
        }
        if let Some(sectors) = filters.sectors.as_ref() {
            apply_sector_filter(&mut table, sectors);
        }

        let before_total = table.len();
        let dup_removed = drop_duplicate_rows(&mut table);

        let mut records: Vec<StockRecord> = table
            .rows
            .iter()
            .filter_map(|r| record_from_row(&table, r))
            .collect();
        let nulls_removed = table.len() - records.len();
        if dup_removed > 0 || nulls_removed > 0 {
            info!(
                "Removed {} duplicate rows and {} rows with missing essential data (out of {} rows)",
                dup_removed, nulls_removed, before_total
            );
        }

        if let Some((start, end)) = filters.year_range {
            records.retain(|r| r.year >= start && r.year <= end);
        }

        let data = Self { records };
        info!("Loaded {} records", data.len());
        data.log_rows_per_year();
        data
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn years(&self) -> Vec<i32> {
        self.rows_per_year().into_keys().collect()
    }

    pub fn rows_per_year(&self) -> BTreeMap<i32, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.records {
            *counts.entry(r.year).or_insert(0) += 1;
        }
        counts
    }

    fn log_rows_per_year(&self) {
        let summary: Vec<String> = self
            .rows_per_year()
            .iter()
            .map(|(y, c)| format!("{}: {}", y, c))
            .collect();
        info!("Rows per Year: {}", summary.join(", "));
    }

    pub fn market_for_year(&self, year: i32) -> MarketObject {
        MarketObject::new(
            year,
            self.records.iter().filter(|r| r.year == year).cloned().collect(),
        )
    }
}

// ============================================================================
// MARKET OBJECT
// ============================================================================

/// Securities available in a single year, keyed by ticker
#[derive(Debug, Clone)]
pub struct MarketObject {
    pub year: i32,
    stocks: Vec<StockRecord>,
    index: HashMap<String, usize>,
}

impl MarketObject {
    pub fn new(year: i32, records: Vec<StockRecord>) -> Self {
        let mut stocks = Vec::with_capacity(records.len());
        let mut index = HashMap::new();
        for r in records {
            if index.contains_key(&r.ticker) {
                debug!("{} - duplicate ticker in {}, keeping first", r.ticker, year);
                continue;
            }
            index.insert(r.ticker.clone(), stocks.len());
            stocks.push(r);
        }
        Self { year, stocks, index }
    }

    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }

    pub fn stocks(&self) -> &[StockRecord] {
        &self.stocks
    }

    pub fn get(&self, ticker: &str) -> Option<&StockRecord> {
        self.index.get(ticker).map(|&i| &self.stocks[i])
    }

    /// Positive ending price, or `None` for unknown, missing or non-positive prices
    pub fn get_price(&self, ticker: &str) -> Option<f64> {
        match self.get(ticker).and_then(|s| s.price) {
            Some(p) if p > 0.0 && p.is_finite() => Some(p),
            other => {
                debug!("{} - invalid or missing price ({:?}) for {}", ticker, other, self.year);
                None
            }
        }
    }

    pub fn get_market_cap(&self, ticker: &str) -> Option<f64> {
        self.get(ticker)
            .and_then(|s| s.market_cap)
            .filter(|c| *c > 0.0)
    }

    /// Raw factor value for every stock, in table order
    pub fn factor_values(&self, factor: Factor) -> Vec<(String, Option<f64>)> {
        self.stocks
            .iter()
            .map(|s| (s.ticker.clone(), s.factor(factor)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_essential_columns() {
        let ok = RawTable::new(vec!["ticker_region".into(), "Date".into(), "Ending_Price".into()]);
        assert!(require_essential_columns(&ok).is_ok());

        let no_price = RawTable::new(vec!["Ticker".into(), "Year".into()]);
        match require_essential_columns(&no_price) {
            Err(BacktestError::MissingColumn(c)) => assert_eq!(c, "Ending Price"),
            other => panic!("expected missing price column, got {:?}", other),
        }
    }

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    fn supabase_table() -> RawTable {
        RawTable {
            columns: vec![
                "Ticker-Region".into(),
                "Date".into(),
                "Ending_Price".into(),
                "FactSet_Industry".into(),
                "Scotts_Sector_5".into(),
                "12-Mo_Momentum".into(),
            ],
            rows: vec![
                vec![s("AAA-US"), s("2002-09-30"), s("10.0"), s("Software"), s("Technology"), s("12.5")],
                vec![s("BBB-US"), s("2002-09-30"), s("20.0"), s("Integrated Oil"), s("Industrials"), s("3.0")],
                vec![s("CCC-US"), s("2002-09-30"), s("--"), s("Banks"), s("Financials"), s("1.0")],
                vec![s("DDD-US"), s("2003-09-30"), s("5.0"), None, s("Consumer"), s("N/A")],
                vec![s("AAA-US"), s("2002-09-30"), s("10.0"), s("Software"), s("Technology"), s("12.5")],
            ],
        }
    }

    #[test]
    fn test_standardize_derives_ticker_and_year() {
        let t = standardize(supabase_table());
        assert!(t.has_column("Ending Price"));
        assert!(t.has_column("12-Mo Momentum %"));
        assert_eq!(t.cell(&t.rows[0], "Ticker"), Some("AAA"));
        assert_eq!(t.cell(&t.rows[3], "Year"), Some("2003"));
        // "--" is a null sentinel
        assert_eq!(t.cell(&t.rows[2], "Ending Price"), None);
    }

    #[test]
    fn test_from_raw_filters_and_dedups() {
        let data = MarketData::from_raw(supabase_table(), &LoadFilters::default());
        // duplicate AAA row dropped, CCC has no price
        assert_eq!(data.len(), 3);
        assert_eq!(data.years(), vec![2002, 2003]);
        let aaa = &data.records[0];
        assert_eq!(aaa.factor(Factor::Momentum12m), Some(12.5));
        let ddd = data.records.iter().find(|r| r.ticker == "DDD").unwrap();
        assert_eq!(ddd.factor(Factor::Momentum12m), None);
    }

    #[test]
    fn test_fossil_filter() {
        let filters = LoadFilters {
            restrict_fossil_fuels: true,
            ..Default::default()
        };
        let data = MarketData::from_raw(supabase_table(), &filters);
        assert!(data.records.iter().all(|r| r.ticker != "BBB"));
        // missing industry is kept
        assert!(data.records.iter().any(|r| r.ticker == "DDD"));
    }

    #[test]
    fn test_sector_filter() {
        let filters = LoadFilters {
            sectors: Some(vec!["technology".into(), "Consumer".into()]),
            ..Default::default()
        };
        let data = MarketData::from_raw(supabase_table(), &filters);
        let tickers: Vec<&str> = data.records.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAA", "DDD"]);
    }

    #[test]
    fn test_year_range_filter() {
        let filters = LoadFilters {
            year_range: Some((2003, 2005)),
            ..Default::default()
        };
        let data = MarketData::from_raw(supabase_table(), &filters);
        assert_eq!(data.len(), 1);
        assert_eq!(data.records[0].ticker, "DDD");
    }

    #[test]
    fn test_parse_year_formats() {
        assert_eq!(parse_year("2002-09-30"), Some(2002));
        assert_eq!(parse_year("2010-09-30 00:00:00"), Some(2010));
        assert_eq!(parse_year("2011-09-30T00:00:00+00:00"), Some(2011));
        assert_eq!(parse_year("09/30/2012"), Some(2012));
        assert_eq!(parse_year("2013"), Some(2013));
        assert_eq!(parse_year("2014.0"), Some(2014));
        assert_eq!(parse_year("yesterday"), None);
    }

    #[test]
    fn test_market_object_prices() {
        let m = MarketObject::new(
            2002,
            vec![
                StockRecord::new("AAA", 2002, Some(10.0)),
                StockRecord::new("BBB", 2002, Some(0.0)),
                StockRecord::new("CCC", 2002, None),
                StockRecord::new("AAA", 2002, Some(99.0)),
            ],
        );
        assert_eq!(m.len(), 3);
        assert_eq!(m.get_price("AAA"), Some(10.0));
        assert_eq!(m.get_price("BBB"), None);
        assert_eq!(m.get_price("CCC"), None);
        assert_eq!(m.get_price("ZZZ"), None);
    }

    #[test]
    fn test_canonical_sector() {
        assert_eq!(canonical_sector(" healthcare "), Some("Healthcare"));
        assert_eq!(canonical_sector("Energy"), None);
    }
}
