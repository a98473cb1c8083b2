//! Benchmark index returns (Russell 2000, September to September, in percent)

use log::{debug, info};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{BacktestError, Result};

const RUSSELL_2000: &[(i32, f64)] = &[
    (2002, 34.62),
    (2003, 17.48),
    (2004, 16.56),
    (2005, 8.65),
    (2006, 11.01),
    (2007, -15.63),
    (2008, -11.08),
    (2009, 11.89),
    (2010, -4.73),
    (2011, 30.01),
    (2012, 28.22),
    (2013, 2.6),
    (2014, -0.09),
    (2015, 13.71),
    (2016, 19.11),
    (2017, 13.8),
    (2018, -10.21),
    (2019, -1.03),
    (2020, 46.21),
    (2021, -24.48),
    (2022, 7.23),
];

#[derive(Debug, Deserialize)]
struct BenchmarkRow {
    year: i32,
    return_pct: f64,
}

/// Yearly benchmark returns in percent; years without data return 0
#[derive(Debug, Clone)]
pub struct Benchmark {
    pub name: String,
    returns: BTreeMap<i32, f64>,
}

impl Default for Benchmark {
    fn default() -> Self {
        Self::russell_2000()
    }
}

impl Benchmark {
    pub fn russell_2000() -> Self {
        Self {
            name: "Russell 2000".to_string(),
            returns: RUSSELL_2000.iter().copied().collect(),
        }
    }

    pub fn from_returns(name: &str, returns: impl IntoIterator<Item = (i32, f64)>) -> Self {
        Self {
            name: name.to_string(),
            returns: returns.into_iter().collect(),
        }
    }

    /// Load a `year,return_pct` CSV that replaces the built-in table
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)?;
        let mut returns = BTreeMap::new();
        for row in reader.deserialize() {
            let row: BenchmarkRow = row?;
            returns.insert(row.year, row.return_pct);
        }
        if returns.is_empty() {
            return Err(BacktestError::NoData(format!(
                "benchmark file {} has no rows",
                path.display()
            )));
        }
        info!("Loaded {} benchmark years from {}", returns.len(), path.display());
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Custom".to_string());
        Ok(Self { name, returns })
    }

    /// Return for the year starting in `year`, in percent
    pub fn return_pct(&self, year: i32) -> f64 {
        match self.returns.get(&year) {
            Some(r) => *r,
            None => {
                debug!("No {} return for {}, using 0", self.name, year);
                0.0
            }
        }
    }

    pub fn years(&self) -> Vec<i32> {
        self.returns.keys().copied().collect()
    }
}
