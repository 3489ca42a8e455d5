pub mod spectrum;

pub use spectrum::{spectrum, Spectrum};
