//! Great-circle geometry on a spherical earth
//!
//! Angles are carried in degrees at module boundaries and converted to
//! radians only inside the trigonometry.

pub mod bearing;
pub mod locator;
pub mod vertex;

use std::fmt;

use serde::Serialize;

pub use bearing::{BearingPair, bearings, initial_bearing};
pub use locator::{LocatorPrecision, decode, encode};
pub use vertex::vertex;

/// A position on the sphere in degrees.
///
/// Latitude is in [-90, 90], longitude in (-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns whichever point lies further from the equator.
    ///
    /// On equal absolute latitude `self` wins.
    pub fn poleward(self, other: GeoPoint) -> GeoPoint {
        if other.lat.abs() > self.lat.abs() {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.lat, self.lon)
    }
}
