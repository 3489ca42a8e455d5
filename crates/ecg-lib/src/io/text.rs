use anyhow::{bail, Context, Result};
use std::path::Path;

/// Parse a newline-delimited sample series. Blank lines and `#` comments are
/// skipped; anything else must be a number.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let mut samples = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let value: f64 = trimmed
            .parse()
            .with_context(|| format!("line {}: `{}` is not a number", lineno + 1, trimmed))?;
        if !value.is_finite() {
            bail!("line {}: sample `{}` is not finite", lineno + 1, trimmed);
        }
        samples.push(value);
    }
    if samples.is_empty() {
        bail!("no numeric samples found");
    }
    Ok(samples)
}

pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_f64_series(&text).with_context(|| format!("parsing {}", path.display()))
}

/// One sample per line, full precision.
pub fn format_f64_series(samples: &[f64]) -> String {
    let mut out = String::with_capacity(samples.len() * 20);
    for sample in samples {
        out.push_str(&sample.to_string());
        out.push('\n');
    }
    out
}
