// In-memory example data
//
// Tables for the bundled datasets, read once from CSV at startup. Figures pull
// their trace columns from here; nothing is read at request time.

use crate::dataset::SelectionKey;
use crate::dispatcher::dispatch;
use crate::{DashError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// One CSV field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Cell::Number(n),
            _ => Cell::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(_) => None,
        }
    }

    /// Display form; whole numbers print without a fraction (`1952`, not `1952.0`)
    pub fn label(&self) -> String {
        match self {
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

/// Row-major table with named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Every row must have one cell per header
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let ragged = rows.iter().enumerate().find(|(_, r)| r.len() != headers.len());
        if let Some((i, row)) = ragged {
            return Err(DashError::Data(format!(
                "row {} has {} fields, expected {}",
                i,
                row.len(),
                headers.len()
            )));
        }
        Ok(Self { headers, rows })
    }

    /// Parse CSV with a header line
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(Cell::parse).collect());
        }
        Self::new(headers, rows)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// True when the column exists, has rows, and every cell is a number
    pub fn is_numeric(&self, name: &str) -> bool {
        match self.column_index(name) {
            Some(idx) => {
                !self.rows.is_empty() && self.rows.iter().all(|r| r[idx].as_f64().is_some())
            }
            None => false,
        }
    }

    /// Distinct labels of a column. Values listed in `order` come first, in
    /// that order; the rest follow in first-seen order.
    pub fn distinct(&self, name: &str, order: Option<&[String]>) -> Vec<String> {
        let Some(idx) = self.column_index(name) else {
            return Vec::new();
        };
        let mut seen: Vec<String> = Vec::new();
        for row in &self.rows {
            let label = row[idx].label();
            if !seen.contains(&label) {
                seen.push(label);
            }
        }
        match order {
            Some(order) => {
                let mut out: Vec<String> =
                    order.iter().filter(|v| seen.contains(v)).cloned().collect();
                out.extend(seen.into_iter().filter(|v| !order.contains(v)));
                out
            }
            None => seen,
        }
    }
}

/// Loaded tables, keyed by dataset
#[derive(Debug, Clone, Default)]
pub struct DataStore {
    tables: HashMap<SelectionKey, Table>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a table after checking it has every column its chart binds
    pub fn insert(&mut self, key: SelectionKey, table: Table) -> Result<()> {
        let chart = dispatch(key).chart;
        if let Some(missing) = chart
            .bindings
            .values()
            .find(|field| table.column_index(field).is_none())
        {
            return Err(DashError::Data(format!("{key}: missing column {missing:?}")));
        }
        if table.len() != key.info().rows {
            warn!(
                target: "data",
                key = %key,
                rows = table.len(),
                expected = key.info().rows,
                "Row count differs from the documented size"
            );
        }
        self.tables.insert(key, table);
        Ok(())
    }

    pub fn get(&self, key: SelectionKey) -> Option<&Table> {
        self.tables.get(&key)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Read `<dir>/<key>.csv` for every dataset.
    ///
    /// Missing files (or a missing directory) are skipped with a warning; the
    /// chart for that dataset is drawn without points. Files that exist but do
    /// not parse, or lack a bound column, are errors.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut store = Self::new();
        if !dir.is_dir() {
            warn!(target: "data", dir = %dir.display(), "Data directory not found; charts will have no points");
            return Ok(store);
        }

        for key in SelectionKey::ALL {
            let path = dir.join(format!("{key}.csv"));
            if !path.exists() {
                warn!(target: "data", path = %path.display(), "Dataset file missing");
                continue;
            }
            let table = Table::from_path(&path)?;
            info!(target: "data", key = %key, rows = table.len(), "Loaded dataset");
            store.insert(key, table)?;
        }
        Ok(store)
    }
}
