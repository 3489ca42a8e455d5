pub mod butterworth;
pub mod zero_phase;

use crate::{
    error::{EcgError, Result},
    signal::{SamplingContext, TimeSeries},
};
use butterworth::{design_bandpass, Biquad};
use serde::{Deserialize, Serialize};

/// Band-pass configuration: cutoffs in Hz and the prototype order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub low_cutoff_hz: f64,
    pub high_cutoff_hz: f64,
    pub order: usize,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            low_cutoff_hz: 0.5,
            high_cutoff_hz: 50.0,
            order: 2,
        }
    }
}

impl FilterSpec {
    pub fn new(low_cutoff_hz: f64, high_cutoff_hz: f64, order: usize) -> Self {
        Self {
            low_cutoff_hz,
            high_cutoff_hz,
            order,
        }
    }

    /// Cutoffs as fractions of Nyquist, checked to satisfy `0 < low < high < 1`.
    pub fn normalized(&self, sampling: &SamplingContext) -> Result<(f64, f64)> {
        if self.order == 0 {
            return Err(EcgError::InvalidFilterSpec("order must be at least 1".into()));
        }
        let nyquist = sampling.nyquist();
        let low = self.low_cutoff_hz / nyquist;
        let high = self.high_cutoff_hz / nyquist;
        if !low.is_finite() || !high.is_finite() {
            return Err(EcgError::InvalidFilterSpec(format!(
                "cutoffs must be finite, got {} Hz and {} Hz",
                self.low_cutoff_hz, self.high_cutoff_hz
            )));
        }
        if low <= 0.0 || high >= 1.0 {
            return Err(EcgError::InvalidFilterSpec(format!(
                "cutoffs {} Hz and {} Hz must lie strictly between 0 and the {} Hz Nyquist frequency",
                self.low_cutoff_hz, self.high_cutoff_hz, nyquist
            )));
        }
        if low >= high {
            return Err(EcgError::InvalidFilterSpec(format!(
                "low cutoff {} Hz must be below high cutoff {} Hz",
                self.low_cutoff_hz, self.high_cutoff_hz
            )));
        }
        Ok((low, high))
    }

    /// Second-order sections for this spec at `sampling`.
    pub fn design(&self, sampling: &SamplingContext) -> Result<Vec<Biquad>> {
        let (low, high) = self.normalized(sampling)?;
        Ok(design_bandpass(low, high, self.order))
    }

    /// Shortest signal, exclusive, the two-pass filter accepts.
    pub fn min_samples(&self) -> usize {
        3 * (2 * self.order + 1)
    }
}

/// Design the band-pass for `signal.fs` and apply it forward and backward.
/// The output has the input's length and no phase shift.
pub fn design_and_apply(signal: &TimeSeries, spec: &FilterSpec) -> Result<TimeSeries> {
    let sampling = signal.sampling()?;
    let sections = spec.design(&sampling)?;
    let required = zero_phase::pad_len(&sections);
    if signal.len() <= required {
        return Err(EcgError::InsufficientSamples {
            len: signal.len(),
            required,
            order: spec.order,
        });
    }
    Ok(signal.with_data(zero_phase::filtfilt(&sections, &signal.data)))
}

/// Zero-phase band-pass filter; see [`design_and_apply`].
pub fn filter(signal: &TimeSeries, spec: &FilterSpec) -> Result<TimeSeries> {
    design_and_apply(signal, spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sines(fs: f64, seconds: f64, parts: &[(f64, f64)]) -> TimeSeries {
        let n = (fs * seconds) as usize;
        let data = (0..n)
            .map(|i| {
                let t = i as f64 / fs;
                parts
                    .iter()
                    .map(|(freq, amp)| amp * (2.0 * PI * freq * t).sin())
                    .sum()
            })
            .collect();
        TimeSeries { fs, data }
    }

    fn interior_peak(data: &[f64], skip: usize) -> f64 {
        data[skip..data.len() - skip]
            .iter()
            .fold(0.0f64, |acc, x| acc.max(x.abs()))
    }

    #[test]
    fn inverted_cutoffs_are_rejected() {
        let ts = TimeSeries {
            fs: 500.0,
            data: vec![0.0; 1000],
        };
        let err = filter(&ts, &FilterSpec::new(50.0, 0.5, 2)).unwrap_err();
        assert!(matches!(err, EcgError::InvalidFilterSpec(_)), "{err}");
    }

    #[test]
    fn cutoffs_must_stay_below_nyquist() {
        let ts = TimeSeries {
            fs: 100.0,
            data: vec![0.0; 1000],
        };
        // 50 Hz is exactly Nyquist at 100 Hz.
        assert!(matches!(
            filter(&ts, &FilterSpec::default()),
            Err(EcgError::InvalidFilterSpec(_))
        ));
        assert!(matches!(
            filter(&ts, &FilterSpec::new(0.0, 20.0, 2)),
            Err(EcgError::InvalidFilterSpec(_))
        ));
        assert!(matches!(
            filter(&ts, &FilterSpec::new(1.0, 20.0, 0)),
            Err(EcgError::InvalidFilterSpec(_))
        ));
        assert!(matches!(
            filter(&ts, &FilterSpec::new(f64::NAN, 20.0, 2)),
            Err(EcgError::InvalidFilterSpec(_))
        ));
    }

    #[test]
    fn short_signals_are_rejected() {
        let spec = FilterSpec::default();
        let short = TimeSeries {
            fs: 500.0,
            data: vec![1.0; spec.min_samples()],
        };
        assert_eq!(
            filter(&short, &spec),
            Err(EcgError::InsufficientSamples {
                len: 15,
                required: 15,
                order: 2
            })
        );
        let ok = short.with_data(vec![1.0; spec.min_samples() + 1]);
        assert_eq!(filter(&ok, &spec).unwrap().len(), 16);
    }

    #[test]
    fn constant_signal_filters_to_zero() {
        let ts = TimeSeries {
            fs: 250.0,
            data: vec![2.5; 2000],
        };
        let out = filter(&ts, &FilterSpec::default()).unwrap();
        assert_eq!(out.len(), ts.len());
        assert!(out.data.iter().all(|y| y.abs() < 1e-9));
    }

    #[test]
    fn passband_tone_keeps_amplitude_and_phase() {
        let fs = 500.0;
        let ts = sines(fs, 20.0, &[(10.0, 1.0)]);
        let out = filter(&ts, &FilterSpec::default()).unwrap();
        let skip = (5.0 * fs) as usize;
        let peak = interior_peak(&out.data, skip);
        assert!((peak - 1.0).abs() < 0.01, "passband amplitude {peak}");
        for i in skip..out.len() - skip {
            assert!((out.data[i] - ts.data[i]).abs() < 0.01, "sample {i}");
        }
    }

    #[test]
    fn stopband_tone_is_attenuated() {
        let fs = 500.0;
        let ts = sines(fs, 20.0, &[(100.0, 1.0)]);
        let out = filter(&ts, &FilterSpec::default()).unwrap();
        let peak = interior_peak(&out.data, (5.0 * fs) as usize);
        assert!(peak < 0.1, "stopband amplitude {peak}");
    }

    #[test]
    fn reversed_input_gives_reversed_output() {
        let fs = 250.0;
        let ts = sines(fs, 30.0, &[(1.3, 1.0), (12.0, 0.5), (60.0, 0.2)]);
        let spec = FilterSpec::default();
        let forward = filter(&ts, &spec).unwrap();

        let mut reversed = ts.data.clone();
        reversed.reverse();
        let mut backward = filter(&ts.with_data(reversed), &spec).unwrap().data;
        backward.reverse();

        let skip = (5.0 * fs) as usize;
        for i in skip..forward.len() - skip {
            assert!(
                (forward.data[i] - backward[i]).abs() < 1e-3,
                "sample {i}: {} vs {}",
                forward.data[i],
                backward[i]
            );
        }
    }
}
