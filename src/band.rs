//! Amateur band classification
//!
//! Bands are labelled by wavelength in metres, except the 70 cm and 23 cm
//! bands which keep their centimetre labels. The lookup key is the
//! frequency in MHz times ten, truncated toward zero, which places every
//! WSPR sub-band on a single key (60 m and the European 60 m allocation
//! sit on two adjacent keys).

use crate::constants::DEFAULT_BAND;
use crate::error::{PathError, Result};

/// `(frequency key, band label)` sorted by key.
static BAND_TABLE: [(u32, u32); 18] = [
    (1, 2200),
    (4, 630),
    (18, 160),
    (35, 80),
    (52, 60),
    (53, 60),
    (70, 40),
    (101, 30),
    (140, 20),
    (181, 17),
    (210, 15),
    (249, 12),
    (281, 10),
    (502, 6),
    (700, 4),
    (1444, 2),
    (4323, 70),
    (12965, 23),
];

/// Lookup key for a frequency in MHz, or `None` for values that cannot be
/// keyed (negative, NaN or infinite).
pub fn band_key(frequency_mhz: f64) -> Option<u32> {
    let key = (frequency_mhz * 10.0).trunc();
    if key.is_finite() && key >= 0.0 && key <= f64::from(u32::MAX) {
        Some(key as u32)
    } else {
        None
    }
}

/// Band label for a frequency in MHz, or [`DEFAULT_BAND`] if the frequency
/// is outside every band in the table.
pub fn classify(frequency_mhz: f64) -> u32 {
    band_key(frequency_mhz)
        .and_then(|key| {
            BAND_TABLE
                .binary_search_by_key(&key, |&(k, _)| k)
                .ok()
                .map(|i| BAND_TABLE[i].1)
        })
        .unwrap_or(DEFAULT_BAND)
}

/// Parse a frequency field in MHz.
pub fn parse_frequency(field: &str) -> Result<f64> {
    let trimmed = field.trim();
    match trimmed.parse::<f64>() {
        Ok(mhz) if mhz.is_finite() => Ok(mhz),
        _ => Err(PathError::InvalidFrequency(trimmed.to_string())),
    }
}
