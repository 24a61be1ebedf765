use super::GeoPoint;

/// Initial bearings at both ends of a great-circle path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BearingPair {
    /// Bearing in degrees (0-360) at `b` looking toward `a`
    pub forward: f64,
    /// Bearing in degrees (0-360) at `a` looking toward `b`
    pub reverse: f64,
}

/// Compute the azimuth seen at each end of the great circle through `a`
/// and `b`.
///
/// For a spot path call this with `a` = transmitter and `b` = receiver:
/// `forward` is then the azimuth at the receiver, `reverse` the azimuth at
/// the transmitter.
pub fn bearings(a: GeoPoint, b: GeoPoint) -> BearingPair {
    BearingPair {
        forward: initial_bearing(b, a),
        reverse: initial_bearing(a, b),
    }
}

/// Initial great-circle bearing from `from` toward `to`, in degrees within
/// [0, 360).
///
/// Coincident and antipodal points have no defined direction; they yield
/// whatever `atan2` returns for the degenerate vector (0° for coincident
/// points).
pub fn initial_bearing(from: GeoPoint, to: GeoPoint) -> f64 {
    let phi_from = from.lat.to_radians();
    let phi_to = to.lat.to_radians();
    let delta_lambda = to.lon.to_radians() - from.lon.to_radians();

    let y = delta_lambda.sin() * phi_to.cos();
    let x = phi_from.cos() * phi_to.sin() - phi_from.sin() * phi_to.cos() * delta_lambda.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

/// Wrap an angle into [0, 360).
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_cardinal_bearings() {
        let origin = GeoPoint::new(0.0, 0.0);
        assert_abs_diff_eq!(initial_bearing(origin, GeoPoint::new(10.0, 0.0)), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(initial_bearing(origin, GeoPoint::new(0.0, 10.0)), 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            initial_bearing(origin, GeoPoint::new(-10.0, 0.0)),
            180.0,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            initial_bearing(origin, GeoPoint::new(0.0, -10.0)),
            270.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_pair_matches_individual_bearings() {
        let tx = GeoPoint::new(40.5, -75.0);
        let rx = GeoPoint::new(51.5, -1.0);
        let pair = bearings(tx, rx);
        assert_eq!(pair.forward, initial_bearing(rx, tx));
        assert_eq!(pair.reverse, initial_bearing(tx, rx));
    }

    #[test]
    fn test_transatlantic_bearings() {
        // New Jersey to southern England, well-known ~51° outbound and
        // ~289° inbound
        let tx = GeoPoint::new(40.5, -75.0);
        let rx = GeoPoint::new(51.5, -1.0);
        let pair = bearings(tx, rx);
        assert!((pair.reverse - 51.0).abs() < 2.0, "tx azimuth {}", pair.reverse);
        assert!((pair.forward - 289.0).abs() < 2.0, "rx azimuth {}", pair.forward);
    }

    #[test]
    fn test_bearings_within_range() {
        let points = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(89.5, 179.0),
            GeoPoint::new(-89.5, -179.0),
            GeoPoint::new(-33.9, 18.4),
            GeoPoint::new(35.7, 139.7),
            GeoPoint::new(64.1, -21.9),
        ];
        for &a in &points {
            for &b in &points {
                let pair = bearings(a, b);
                assert!((0.0..360.0).contains(&pair.forward), "{a} {b}: {pair:?}");
                assert!((0.0..360.0).contains(&pair.reverse), "{a} {b}: {pair:?}");
            }
        }
    }

    #[test]
    fn test_coincident_points_are_deterministic() {
        let p = GeoPoint::new(12.0, 34.0);
        let pair = bearings(p, p);
        assert_eq!(pair.forward, 0.0);
        assert_eq!(pair.reverse, 0.0);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_abs_diff_eq!(normalize_degrees(-90.0), 270.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_degrees(450.0), 90.0, epsilon = 1e-12);
        assert_eq!(normalize_degrees(-1e-17), 0.0);
    }
}
