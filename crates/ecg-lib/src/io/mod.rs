pub mod csv;
pub mod text;

use anyhow::Result;
use std::path::Path;

pub use self::csv::Column;

/// Load a waveform from disk: `.csv` files go through the CSV reader using
/// `column`, everything else is treated as newline-delimited text.
pub fn read_samples(path: &Path, column: &Column) -> Result<Vec<f64>> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if is_csv {
        self::csv::read_csv_column(path, column)
    } else {
        text::read_f64_series(path)
    }
}
