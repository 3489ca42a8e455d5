use crate::{
    error::{EcgError, Result},
    signal::TimeSeries,
};
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};

/// One-sided magnitude spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    pub frequencies_hz: Vec<f64>,
    pub magnitudes: Vec<f64>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.frequencies_hz.len()
    }
    pub fn is_empty(&self) -> bool {
        self.frequencies_hz.is_empty()
    }

    /// Frequency of the largest non-DC bin, if any.
    pub fn dominant_frequency(&self) -> Option<f64> {
        self.magnitudes
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| self.frequencies_hz[i])
    }
}

/// Raw |DFT| of the whole record for bins `0..N/2`, no window or scaling.
/// A single sample yields the lone DC bin.
pub fn spectrum(ts: &TimeSeries) -> Result<Spectrum> {
    let sampling = ts.sampling()?;
    let n = ts.len();
    if n == 0 {
        return Err(EcgError::EmptySignal);
    }
    if n == 1 {
        return Ok(Spectrum {
            frequencies_hz: vec![0.0],
            magnitudes: vec![ts.data[0].abs()],
        });
    }

    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(n);
    let mut buffer = ts.data.clone();
    let mut output = r2c.make_output_vec();
    r2c.process(&mut buffer, &mut output)
        .map_err(|e| EcgError::Fft(e.to_string()))?;

    let bins = n / 2;
    let bin_hz = sampling.fs() / n as f64;
    Ok(Spectrum {
        frequencies_hz: (0..bins).map(|i| i as f64 * bin_hz).collect(),
        magnitudes: output[..bins].iter().map(|c| c.norm()).collect(),
    })
}

/// Alias for [`spectrum`].
pub fn analyze(ts: &TimeSeries) -> Result<Spectrum> {
    spectrum(ts)
}
