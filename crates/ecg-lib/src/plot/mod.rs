//! Backend-independent figure descriptions for the pipeline outputs.

use crate::{
    metrics::spectrum::Spectrum,
    signal::{PeakSet, RRSeries, TimeSeries},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

/// Isolated points, e.g. R-peak markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub radius: u32,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    Markers(MarkerSeries),
}

impl Series {
    pub fn points(&self) -> &[[f64; 2]] {
        match self {
            Series::Line(line) => &line.points,
            Series::Markers(markers) => &markers.points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn with_axes(mut self, x: &str, y: &str) -> Self {
        self.x.label = Some(x.into());
        self.y.label = Some(y.into());
        self
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// `(x_min, x_max, y_min, y_max)` over all series, or `None` when empty.
    /// Degenerate ranges are widened so a backend always gets a usable span.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self.series.iter().flat_map(|s| s.points().iter());
        let first = points.next()?;
        let (mut x0, mut x1, mut y0, mut y1) = (first[0], first[0], first[1], first[1]);
        for p in points {
            x0 = x0.min(p[0]);
            x1 = x1.max(p[0]);
            y0 = y0.min(p[1]);
            y1 = y1.max(p[1]);
        }
        if x1 <= x0 {
            x1 = x0 + 1.0;
        }
        if y1 <= y0 {
            y0 -= 0.5;
            y1 += 0.5;
        }
        Some((x0, x1, y0, y1))
    }
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        result.push(points[start]);
    }
    result
}

fn line(name: &str, points: Vec<[f64; 2]>, width: f32, color: u32) -> Series {
    Series::Line(LineSeries {
        name: name.into(),
        points,
        style: Style {
            width,
            color: Color(color),
        },
    })
}

fn time_points(series: &TimeSeries) -> Vec<[f64; 2]> {
    let dt = 1.0 / series.fs;
    series
        .data
        .iter()
        .enumerate()
        .map(|(i, value)| [i as f64 * dt, *value])
        .collect()
}

pub fn figure_from_timeseries(
    title: &str,
    series: &TimeSeries,
    max_points: usize,
    color: u32,
) -> Figure {
    figure_overlay(title, &[(title, series, color)], max_points)
}

/// Several waveforms on a shared time axis, drawn in the given order.
pub fn figure_overlay(
    title: &str,
    traces: &[(&str, &TimeSeries, u32)],
    max_points: usize,
) -> Figure {
    let mut fig = Figure::new(Some(title.into())).with_axes("Time (s)", "Amplitude");
    for (name, series, color) in traces {
        fig.add_series(line(
            name,
            decimate_points(&time_points(series), max_points),
            1.4,
            *color,
        ));
    }
    fig
}

/// Filtered waveform with a marker on every detected R-peak. Peaks are never
/// decimated.
pub fn figure_with_peaks(filtered: &TimeSeries, peaks: &PeakSet, max_points: usize) -> Figure {
    let mut fig = figure_from_timeseries("R-peak detection", filtered, max_points, 0x1F77B4);
    let dt = 1.0 / filtered.fs;
    let points = peaks
        .indices
        .iter()
        .filter_map(|&i| filtered.data.get(i).map(|v| [i as f64 * dt, *v]))
        .collect();
    fig.add_series(Series::Markers(MarkerSeries {
        name: "R-peaks".into(),
        points,
        radius: 4,
        color: Color(0xD62728),
    }));
    fig
}

pub fn figure_from_rr(rr: &RRSeries) -> Figure {
    let mut fig =
        Figure::new(Some("RR intervals".into())).with_axes("Beat number", "RR interval (s)");
    let points = rr
        .rr
        .iter()
        .enumerate()
        .map(|(i, value)| [i as f64, *value])
        .collect();
    fig.add_series(line("RR", points, 2.0, 0xFF0077));
    fig
}

pub fn figure_from_spectrum(spectrum: &Spectrum, max_points: usize) -> Figure {
    let mut fig = Figure::new(Some("Frequency spectrum".into()))
        .with_axes("Frequency (Hz)", "Magnitude");
    let points: Vec<[f64; 2]> = spectrum
        .frequencies_hz
        .iter()
        .zip(&spectrum.magnitudes)
        .map(|(f, m)| [*f, *m])
        .collect();
    fig.add_series(line(
        "|X(f)|",
        decimate_points(&points, max_points),
        1.2,
        0x2CA02C,
    ));
    fig
}
