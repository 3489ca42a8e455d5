pub mod ecg;

pub use ecg::{detect_beats, detect_beats_with_policy, BeatDetection, DetectionPolicy};
