//! Vertex of a great-circle path
//!
//! The vertex is the highest-latitude point of the great circle through the
//! two ends of a path. When that point does not fall between the endpoints
//! the path never reaches it, and the endpoint nearer a pole is reported
//! instead.
//!
//! ## Known limitations
//!
//! - The on-track test compares plain longitudes, so paths crossing the
//!   antimeridian almost always fall back to an endpoint.
//! - The analytic vertex is always reported in the northern hemisphere; the
//!   southern vertex is its mirror image (latitude negated, longitude + 180°).

use super::GeoPoint;

/// Locate the vertex of the path from `b` to `a`.
///
/// `bearing_from_b` is the initial bearing at `b` toward `a`, in degrees.
///
/// Paths along a meridian return the shared longitude and the latitude of
/// the endpoint further from the equator. Ties between endpoints of equal
/// absolute latitude resolve to `a`.
pub fn vertex(a: GeoPoint, b: GeoPoint, bearing_from_b: f64) -> GeoPoint {
    if a.lon == b.lon {
        return GeoPoint::new(a.poleward(b).lat, a.lon);
    }

    let phi_b = b.lat.to_radians();

    // Clairaut: cos(vertex latitude) = |sin(bearing) * cos(latitude)|
    let mut v_lat = (bearing_from_b.to_radians().sin() * phi_b.cos())
        .clamp(-1.0, 1.0)
        .acos()
        .to_degrees();
    if v_lat > 90.0 {
        v_lat = 180.0 - v_lat;
    }

    // Longitude offset of the vertex from b. NaN for paths on the equator,
    // where every point is a vertex.
    let ratio = phi_b.tan() / v_lat.to_radians().tan();
    let offset = ratio.clamp(-1.0, 1.0).acos().to_degrees();

    let mut v_lon = if bearing_from_b < 180.0 {
        b.lon + offset
    } else {
        b.lon - offset
    };
    v_lon = (v_lon + 360.0).rem_euclid(360.0);
    if v_lon > 180.0 {
        v_lon = -(360.0 - v_lon);
    }

    let on_track = v_lon >= a.lon.min(b.lon) && v_lon <= a.lon.max(b.lon);
    if !on_track {
        log::trace!(
            "vertex ({:.3}, {:.3}) off track between {} and {}",
            v_lat,
            v_lon,
            a,
            b
        );
        return a.poleward(b);
    }

    GeoPoint::new(v_lat, v_lon)
}
