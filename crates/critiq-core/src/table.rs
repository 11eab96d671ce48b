//! In-memory tabular model and the delimited-file reader that builds it.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::TableError;

/// Tokens read as a missing value, matching the usual spreadsheet/CSV conventions.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single scalar value in a [`Table`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Coerce a raw delimited field into the narrowest cell type.
    #[must_use]
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        if NA_TOKENS.contains(&trimmed) {
            return Cell::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Cell::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return Cell::Float(f);
            }
        }
        Cell::Text(trimmed.to_string())
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Cell::Text(_))
    }

    /// True when the cell is a number or text that parses as one.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        match self {
            Cell::Int(_) | Cell::Float(_) => true,
            Cell::Text(s) => s.trim().parse::<f64>().is_ok_and(|v| !v.is_nan()),
            Cell::Null => false,
        }
    }

    /// String rendering of a non-null cell; `None` for [`Cell::Null`].
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) => Some(format_float(*f)),
            Cell::Text(s) => Some(s.clone()),
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(v) => write!(f, "{}", format_float(*v)),
            Cell::Text(s) => write!(f, "{s}"),
        }
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// Iterate over non-null cells in row order.
    pub fn non_null(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| !c.is_null())
    }
}

/// Ordered, named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    /// Build a table from columns, padding short columns with [`Cell::Null`].
    #[must_use]
    pub fn new(mut columns: Vec<Column>) -> Self {
        let n_rows = columns.iter().map(|c| c.cells.len()).max().unwrap_or(0);
        for column in &mut columns {
            column.cells.resize(n_rows, Cell::Null);
        }
        Self { columns, n_rows }
    }

    /// Build a table from a header row and row-major cells.
    #[must_use]
    pub fn from_rows(headers: &[String], rows: Vec<Vec<Cell>>) -> Self {
        let names = dedupe_headers(headers);
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect();

        let n_rows = rows.len();
        for row in rows {
            let mut cells = row.into_iter();
            for column in &mut columns {
                column.cells.push(cells.next().unwrap_or(Cell::Null));
            }
        }

        Self { columns, n_rows }
    }

    /// Read a delimited table. The first record is the header row.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if the input cannot be read or is not valid
    /// delimited text.
    pub fn from_reader<R: Read>(reader: R, format: TableFormat) -> Result<Self, TableError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(format.delimiter())
            .from_reader(reader);

        let headers = rdr
            .headers()?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(Cell::coerce).collect());
        }

        Ok(Self::from_rows(&headers, rows))
    }

    /// Read a delimited table from disk, picking the delimiter from the extension.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnsupportedFormat`] for unknown extensions, or an
    /// I/O or parse error.
    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let format = TableFormat::detect(name, None)?;
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, format)
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Concatenate rows of several tables, aligning columns by name.
    ///
    /// Column order is first-seen order across inputs; cells missing from a
    /// table are [`Cell::Null`].
    #[must_use]
    pub fn concat(tables: &[Table]) -> Self {
        let mut order: Vec<String> = Vec::new();
        for table in tables {
            for column in &table.columns {
                if !order.contains(&column.name) {
                    order.push(column.name.clone());
                }
            }
        }

        let total: usize = tables.iter().map(Table::n_rows).sum();
        let mut merged: Vec<Column> = order
            .iter()
            .map(|name| Column::new(name.clone(), Vec::with_capacity(total)))
            .collect();

        for table in tables {
            for column in &mut merged {
                match table.column(&column.name) {
                    Some(source) => column.cells.extend(source.cells.iter().cloned()),
                    None => column
                        .cells
                        .extend(std::iter::repeat_n(Cell::Null, table.n_rows())),
                }
            }
        }

        Self {
            columns: merged,
            n_rows: total,
        }
    }
}

/// Supported delimited formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
}

impl TableFormat {
    #[must_use]
    pub fn delimiter(self) -> u8 {
        match self {
            TableFormat::Csv => b',',
            TableFormat::Tsv => b'\t',
        }
    }

    /// Pick a format from a file name, falling back to a content-type hint.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnsupportedFormat`] for spreadsheets and anything
    /// else that is not comma- or tab-delimited text.
    pub fn detect(file_name: &str, content_type: Option<&str>) -> Result<Self, TableError> {
        let lower = file_name.to_lowercase();
        let content_type = content_type.unwrap_or_default().to_lowercase();

        if lower.ends_with(".tsv") || content_type.contains("tab-separated") {
            return Ok(TableFormat::Tsv);
        }
        if lower.ends_with(".csv") || content_type.contains("csv") {
            return Ok(TableFormat::Csv);
        }

        let described = if content_type.is_empty() {
            file_name.to_string()
        } else {
            format!("{file_name} ({content_type})")
        };
        Err(TableError::UnsupportedFormat(described))
    }
}

/// Disambiguate repeated header names as `name`, `name.1`, `name.2`, ...
fn dedupe_headers(headers: &[String]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut out = Vec::with_capacity(headers.len());
    for header in headers {
        let count = seen.entry(header.as_str()).or_insert(0);
        if *count == 0 {
            out.push(header.clone());
        } else {
            out.push(format!("{header}.{count}"));
        }
        *count += 1;
    }
    out
}

#[cfg(test)]
#[path = "table_test.rs"]
mod tests;
