pub mod band;
pub mod config;
pub mod constants;
pub mod error;
pub mod geo;
pub mod output;
pub mod pipeline;
pub mod upload;

pub use config::AugmentConfig;
pub use error::{PathError, Result};
pub use pipeline::{AugmentedRow, Augmenter, SpotReader, SpotRow, compute_path};
