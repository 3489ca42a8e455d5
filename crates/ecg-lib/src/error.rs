use thiserror::Error;

/// Failures raised by the signal-processing stages.
///
/// Every variant is a precondition failure detected before a stage does any
/// work; none of them are transient.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EcgError {
    #[error("sampling frequency must be finite and positive, got {0} Hz")]
    InvalidSamplingRate(f64),
    #[error("invalid filter spec: {0}")]
    InvalidFilterSpec(String),
    #[error(
        "signal has {len} samples but an order-{order} zero-phase filter needs more than {required}"
    )]
    InsufficientSamples {
        len: usize,
        required: usize,
        order: usize,
    },
    #[error("heart rate needs at least two beats, detected {found}")]
    InsufficientBeats { found: usize },
    #[error("unrecognized noise kind `{0}` (expected `gaussian` or `uniform`)")]
    InvalidNoiseKind(String),
    #[error("noise level must be finite and non-negative, got {0}")]
    InvalidNoiseLevel(f64),
    #[error("invalid detection policy: {0}")]
    InvalidDetectionPolicy(String),
    #[error("signal is empty")]
    EmptySignal,
    #[error("fft failed: {0}")]
    Fft(String),
}

pub type Result<T> = std::result::Result<T, EcgError>;
