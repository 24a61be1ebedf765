//! Maidenhead grid locators
//!
//! A locator is built from pairs of characters, longitude first:
//!
//! | Pair      | Characters | Longitude step | Latitude step |
//! |-----------|------------|----------------|---------------|
//! | field     | `A`..=`R`  | 20°            | 10°           |
//! | square    | `0`..=`9`  | 2°             | 1°            |
//! | subsquare | `a`..=`x`  | 5'             | 2.5'          |
//!
//! Decoding returns the centre of the smallest cell the locator resolves.
//!
//! # Example
//! ```
//! use wsprpath::geo::decode;
//!
//! let p = decode("FN20").unwrap();
//! assert_eq!((p.lat, p.lon), (40.5, -75.0));
//! ```

use super::GeoPoint;
use crate::error::{PathError, Result};

const FIELD_LON_DEGREES: f64 = 20.0;
const FIELD_LAT_DEGREES: f64 = 10.0;
const SQUARE_LON_DEGREES: f64 = 2.0;
const SQUARE_LAT_DEGREES: f64 = 1.0;
const SUBSQUARES_PER_SQUARE: f64 = 24.0;

/// Keeps encoded points at the antimeridian and the north pole inside the
/// last grid cell.
const EDGE_EPSILON: f64 = 1e-9;

/// Number of character pairs to produce when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorPrecision {
    /// Four characters, 2° x 1° cells
    Square,
    /// Six characters, 5' x 2.5' cells
    Subsquare,
}

/// Decode a 4 or 6 character locator to the centre of its cell.
///
/// Surrounding whitespace is ignored. Field letters are accepted in either
/// case, as are subsquare letters (checked per character, since real spot
/// data mixes `JO01AB` and `JO01ab` styles).
pub fn decode(locator: &str) -> Result<GeoPoint> {
    let trimmed = locator.trim();
    let bytes = trimmed.as_bytes();

    if !trimmed.is_ascii() {
        return Err(PathError::invalid_locator(locator, "non-ASCII character"));
    }
    if bytes.len() != 4 && bytes.len() != 6 {
        return Err(PathError::invalid_locator(
            locator,
            format!("expected 4 or 6 characters, got {}", bytes.len()),
        ));
    }

    let field_lon = field_index(bytes[0])
        .ok_or_else(|| PathError::invalid_locator(locator, "field letter must be A-R"))?;
    let field_lat = field_index(bytes[1])
        .ok_or_else(|| PathError::invalid_locator(locator, "field letter must be A-R"))?;
    let square_lon = digit_index(bytes[2])
        .ok_or_else(|| PathError::invalid_locator(locator, "square must be a digit"))?;
    let square_lat = digit_index(bytes[3])
        .ok_or_else(|| PathError::invalid_locator(locator, "square must be a digit"))?;

    let mut lat = f64::from(field_lat) * FIELD_LAT_DEGREES
        + f64::from(square_lat) * SQUARE_LAT_DEGREES
        + SQUARE_LAT_DEGREES / 2.0
        - 90.0;
    let mut lon = f64::from(field_lon) * FIELD_LON_DEGREES
        + f64::from(square_lon) * SQUARE_LON_DEGREES
        + SQUARE_LON_DEGREES / 2.0
        - 180.0;

    if bytes.len() == 6 {
        let sub_lon = subsquare_index(bytes[4])
            .ok_or_else(|| PathError::invalid_locator(locator, "subsquare letter must be A-X"))?;
        let sub_lat = subsquare_index(bytes[5])
            .ok_or_else(|| PathError::invalid_locator(locator, "subsquare letter must be A-X"))?;

        let sub_lat_step = SQUARE_LAT_DEGREES / SUBSQUARES_PER_SQUARE;
        let sub_lon_step = SQUARE_LON_DEGREES / SUBSQUARES_PER_SQUARE;

        // Step back from the square centre to its corner, then forward to
        // the centre of the subsquare.
        lat = lat - SQUARE_LAT_DEGREES / 2.0
            + f64::from(sub_lat + 1) / SUBSQUARES_PER_SQUARE * SQUARE_LAT_DEGREES
            - sub_lat_step / 2.0;
        lon = lon - SQUARE_LON_DEGREES / 2.0
            + f64::from(sub_lon + 1) / SUBSQUARES_PER_SQUARE * SQUARE_LON_DEGREES
            - sub_lon_step / 2.0;
    }

    Ok(GeoPoint::new(lat, lon))
}

/// Encode a point as the locator of the cell containing it.
///
/// Subsquare letters are written in lower case.
pub fn encode(point: GeoPoint, precision: LocatorPrecision) -> Result<String> {
    if !(-90.0..=90.0).contains(&point.lat) || !(-180.0..=180.0).contains(&point.lon) {
        return Err(PathError::InvalidCoordinate {
            lat: point.lat,
            lon: point.lon,
        });
    }

    let lon = (point.lon + 180.0).min(360.0 - EDGE_EPSILON);
    let lat = (point.lat + 90.0).min(180.0 - EDGE_EPSILON);

    let field_lon = ((lon / FIELD_LON_DEGREES) as u8).min(17);
    let field_lat = ((lat / FIELD_LAT_DEGREES) as u8).min(17);
    let square_lon = (((lon % FIELD_LON_DEGREES) / SQUARE_LON_DEGREES) as u8).min(9);
    let square_lat = (((lat % FIELD_LAT_DEGREES) / SQUARE_LAT_DEGREES) as u8).min(9);

    let mut out = String::with_capacity(6);
    out.push(char::from(b'A' + field_lon));
    out.push(char::from(b'A' + field_lat));
    out.push(char::from(b'0' + square_lon));
    out.push(char::from(b'0' + square_lat));

    if precision == LocatorPrecision::Subsquare {
        let sub_lon = (((lon % SQUARE_LON_DEGREES) / SQUARE_LON_DEGREES * SUBSQUARES_PER_SQUARE)
            as u8)
            .min(23);
        let sub_lat = (((lat % SQUARE_LAT_DEGREES) / SQUARE_LAT_DEGREES * SUBSQUARES_PER_SQUARE)
            as u8)
            .min(23);
        out.push(char::from(b'a' + sub_lon));
        out.push(char::from(b'a' + sub_lat));
    }

    Ok(out)
}

fn field_index(c: u8) -> Option<u8> {
    match c.to_ascii_uppercase() {
        u @ b'A'..=b'R' => Some(u - b'A'),
        _ => None,
    }
}

fn digit_index(c: u8) -> Option<u8> {
    c.is_ascii_digit().then(|| c - b'0')
}

fn subsquare_index(c: u8) -> Option<u8> {
    match c {
        b'a'..=b'x' => Some(c - b'a'),
        b'A'..=b'X' => Some(c - b'A'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_decode_square_centre() {
        let p = decode("FN20").unwrap();
        assert_abs_diff_eq!(p.lat, 40.5, epsilon = 1e-12);
        assert_abs_diff_eq!(p.lon, -75.0, epsilon = 1e-12);

        let p = decode("JJ00").unwrap();
        assert_abs_diff_eq!(p.lat, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(p.lon, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_decode_subsquare_centre() {
        let p = decode("JJ00AA").unwrap();
        assert_abs_diff_eq!(p.lat, 1.0 / 48.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.lon, 1.0 / 24.0, epsilon = 1e-12);

        // Last subsquare of the square sits half a step below its far corner
        let p = decode("JJ00xx").unwrap();
        assert_abs_diff_eq!(p.lat, 1.0 - 1.0 / 48.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.lon, 2.0 - 1.0 / 24.0, epsilon = 1e-12);
    }

    #[test]
    fn test_decode_extreme_cells() {
        let p = decode("AA00").unwrap();
        assert_abs_diff_eq!(p.lat, -89.5, epsilon = 1e-12);
        assert_abs_diff_eq!(p.lon, -179.0, epsilon = 1e-12);

        let p = decode("RR99").unwrap();
        assert_abs_diff_eq!(p.lat, 89.5, epsilon = 1e-12);
        assert_abs_diff_eq!(p.lon, 179.0, epsilon = 1e-12);
    }

    #[test]
    fn test_decode_subsquare_case_per_character() {
        let lower = decode("IO91wm").unwrap();
        let upper = decode("IO91WM").unwrap();
        let mixed = decode("IO91Wm").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower, mixed);
    }

    #[test]
    fn test_decode_trims_whitespace() {
        assert_eq!(decode("  FN20 ").unwrap(), decode("FN20").unwrap());
        assert_eq!(decode("JO01ab\t").unwrap(), decode("JO01ab").unwrap());
    }

    #[test]
    fn test_decode_rejects_bad_length() {
        for bad in ["", "FN", "FN2", "FN20a", "FN20abc", "FN20ab12"] {
            assert!(
                matches!(decode(bad), Err(PathError::InvalidLocator { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_decode_reports_non_ascii() {
        for bad in ["FN2ö", "FN20aé"] {
            match decode(bad) {
                Err(PathError::InvalidLocator { reason, .. }) => {
                    assert_eq!(reason, "non-ASCII character", "{bad:?}")
                }
                other => panic!("{bad:?}: unexpected {other:?}"),
            }
        }
        match decode("FN2") {
            Err(PathError::InvalidLocator { reason, .. }) => {
                assert_eq!(reason, "expected 4 or 6 characters, got 3")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_bad_characters() {
        for bad in ["SN20", "F120", "FNA0", "FN2x", "FN20yy", "FN20a1", "FN2ö"] {
            assert!(
                matches!(decode(bad), Err(PathError::InvalidLocator { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_encode_known_cells() {
        let p = GeoPoint::new(51.4779, -0.0015);
        assert_eq!(encode(p, LocatorPrecision::Square).unwrap(), "IO91");
        assert_eq!(encode(p, LocatorPrecision::Subsquare).unwrap(), "IO91xl");

        let p = GeoPoint::new(40.5, -75.0);
        assert_eq!(encode(p, LocatorPrecision::Square).unwrap(), "FN20");
    }

    #[test]
    fn test_encode_clamps_edges() {
        assert_eq!(
            encode(GeoPoint::new(90.0, 180.0), LocatorPrecision::Subsquare).unwrap(),
            "RR99xx"
        );
        assert_eq!(
            encode(GeoPoint::new(-90.0, -180.0), LocatorPrecision::Subsquare).unwrap(),
            "AA00aa"
        );
    }

    #[test]
    fn test_encode_rejects_out_of_range() {
        assert!(encode(GeoPoint::new(91.0, 0.0), LocatorPrecision::Square).is_err());
        assert!(encode(GeoPoint::new(0.0, -181.0), LocatorPrecision::Square).is_err());
        assert!(encode(GeoPoint::new(f64::NAN, 0.0), LocatorPrecision::Square).is_err());
    }

    #[test]
    fn test_decode_encode_round_trip() {
        let p = decode("JJ00AA").unwrap();
        let code = encode(p, LocatorPrecision::Subsquare).unwrap();
        assert!(code.eq_ignore_ascii_case("JJ00AA"), "got {code}");

        let back = decode(&code).unwrap();
        assert_abs_diff_eq!(back.lat, p.lat, epsilon = 1.0 / 48.0);
        assert_abs_diff_eq!(back.lon, p.lon, epsilon = 1.0 / 24.0);
    }
}
