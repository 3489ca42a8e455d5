use anyhow::{anyhow, bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::{io::Read, path::Path};

/// Which CSV column holds the waveform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Index(usize),
    Name(String),
}

impl Default for Column {
    fn default() -> Self {
        Column::Index(0)
    }
}

impl Column {
    /// Numeric selectors are indices, anything else is a header name.
    pub fn parse(selector: &str) -> Self {
        match selector.trim().parse::<usize>() {
            Ok(idx) => Column::Index(idx),
            Err(_) => Column::Name(selector.trim().to_string()),
        }
    }
}

/// Read one numeric column from a CSV file. A first row that does not parse
/// as numbers in the selected column is taken as the header.
pub fn read_csv_column(path: &Path, column: &Column) -> Result<Vec<f64>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    parse_csv_column(file, column).with_context(|| format!("parsing {}", path.display()))
}

pub fn parse_csv_column<R: Read>(reader: R, column: &Column) -> Result<Vec<f64>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut records = reader.records();
    let first = match records.next() {
        Some(record) => record.context("reading first CSV row")?,
        None => bail!("CSV input is empty"),
    };

    let (idx, header) = resolve_column(&first, column)?;
    let mut samples = Vec::new();
    if !header {
        samples.push(cell(&first, idx, 1)?);
    }
    for (row, record) in records.enumerate() {
        let record = record.with_context(|| format!("reading CSV row {}", row + 2))?;
        samples.push(cell(&record, idx, row + 2)?);
    }
    if samples.is_empty() {
        bail!("no numeric samples found in column {:?}", column);
    }
    Ok(samples)
}

fn resolve_column(first: &StringRecord, column: &Column) -> Result<(usize, bool)> {
    match column {
        Column::Name(name) => {
            let idx = first
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| anyhow!("no column named `{}` in header", name))?;
            Ok((idx, true))
        }
        Column::Index(idx) => {
            let value = first
                .get(*idx)
                .ok_or_else(|| anyhow!("row 1 has no column {}", idx))?;
            Ok((*idx, value.parse::<f64>().is_err()))
        }
    }
}

fn cell(record: &StringRecord, idx: usize, row: usize) -> Result<f64> {
    let raw = record
        .get(idx)
        .ok_or_else(|| anyhow!("row {} has no column {}", row, idx))?;
    let value: f64 = raw
        .parse()
        .with_context(|| format!("row {}: `{}` is not a number", row, raw))?;
    if !value.is_finite() {
        bail!("row {}: sample `{}` is not finite", row, raw);
    }
    Ok(value)
}
