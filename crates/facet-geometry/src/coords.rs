//! Geographic <-> solid-space conversion on the reference sphere.

use glam::{DVec2, DVec3};

/// Equatorial radius of WGS84 in metres. Every solid is built at this scale.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Convert `(lon, lat)` in degrees to a point on the reference sphere.
///
/// `lon = 0, lat = 0` maps to `+X`, the north pole to `+Y`, and `lon = 90`
/// to `-Z`.
#[inline]
#[must_use]
pub fn geo_to_xyz(lon_lat: DVec2) -> DVec3 {
    let (sin_lat, cos_lat) = lon_lat.y.to_radians().sin_cos();
    let (sin_lon, cos_lon) = lon_lat.x.to_radians().sin_cos();
    DVec3::new(
        EARTH_RADIUS * cos_lat * cos_lon,
        EARTH_RADIUS * sin_lat,
        -EARTH_RADIUS * cos_lat * sin_lon,
    )
}

/// Inverse of [`geo_to_xyz`] for any non-zero point; the radius is ignored.
///
/// The origin has no direction and maps to `(0, 0)`.
#[inline]
#[must_use]
pub fn xyz_to_geo(point: DVec3) -> DVec2 {
    let radius = point.length();
    if radius == 0.0 {
        return DVec2::ZERO;
    }
    let lat = 90.0 - (point.y / radius).clamp(-1.0, 1.0).acos().to_degrees();
    let lon = (-point.z).atan2(point.x).to_degrees();
    DVec2::new(lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_cardinal_points() {
        let cases = [
            (DVec2::new(0.0, 0.0), DVec3::X),
            (DVec2::new(0.0, 90.0), DVec3::Y),
            (DVec2::new(0.0, -90.0), DVec3::NEG_Y),
            (DVec2::new(90.0, 0.0), DVec3::NEG_Z),
            (DVec2::new(-90.0, 0.0), DVec3::Z),
        ];
        for (geo, dir) in cases {
            let p = geo_to_xyz(geo);
            assert!(
                (p - dir * EARTH_RADIUS).length() < 1e-6,
                "{geo:?} should map to {dir:?}, got {p:?}"
            );
        }
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..10_000 {
            let geo = DVec2::new(rng.random_range(-180.0..=180.0), rng.random_range(-90.0..=90.0));
            let p = geo_to_xyz(geo);
            let back = geo_to_xyz(xyz_to_geo(p));
            assert!(
                (p - back).length() < 1e-6 * EARTH_RADIUS,
                "round trip drifted for {geo:?}: {p:?} vs {back:?}"
            );
        }
    }

    #[test]
    fn test_round_trip_recovers_angles_off_singularities() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..1_000 {
            let geo = DVec2::new(rng.random_range(-179.9..179.9), rng.random_range(-89.9..89.9));
            let back = xyz_to_geo(geo_to_xyz(geo));
            assert!((geo - back).abs().max_element() < 1e-6, "{geo:?} -> {back:?}");
        }
    }

    #[test]
    fn test_radius_is_ignored() {
        let geo = DVec2::new(12.5, -33.0);
        let back = xyz_to_geo(geo_to_xyz(geo) / EARTH_RADIUS * 3.0);
        assert!((geo - back).length() < 1e-9);
        assert_eq!(xyz_to_geo(DVec3::ZERO), DVec2::ZERO);
    }
}
