//! Geographic bounding boxes and WKT output for tile bounds.

use glam::DVec2;

/// Axis-aligned box in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoBBox {
    pub min: DVec2,
    pub max: DVec2,
}

impl GeoBBox {
    pub const WORLD: Self = Self {
        min: DVec2::new(-180.0, -90.0),
        max: DVec2::new(180.0, 90.0),
    };

    #[must_use]
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min: DVec2::new(min_lon, min_lat),
            max: DVec2::new(max_lon, max_lat),
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    #[must_use]
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) / 2.0
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, p: DVec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    #[must_use]
    pub fn intersects(&self, other: &GeoBBox) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// `[minx, miny, maxx, maxy]`
    #[must_use]
    pub fn to_array(&self) -> [f64; 4] {
        [self.min.x, self.min.y, self.max.x, self.max.y]
    }
}

/// Bounding box of a ring; `None` when it is empty.
#[must_use]
pub fn ring_bbox(ring: &[DVec2]) -> Option<GeoBBox> {
    let first = *ring.first()?;
    let (min, max) = ring
        .iter()
        .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p)));
    Some(GeoBBox { min, max })
}

/// One `POLYGON((...))` string per ring, each closed.
#[must_use]
pub fn rings_to_wkt(rings: &[Vec<DVec2>]) -> Vec<String> {
    rings
        .iter()
        .filter(|ring| !ring.is_empty())
        .map(|ring| {
            let closed = ring.first() == ring.last();
            let points: Vec<String> = ring
                .iter()
                .chain((!closed).then_some(&ring[0]))
                .map(|p| format!("{} {}", p.x, p.y))
                .collect();
            format!("POLYGON(({}))", points.join(", "))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_bbox() {
        let ring = [
            DVec2::new(-10.0, 5.0),
            DVec2::new(20.0, -3.0),
            DVec2::new(4.0, 40.0),
        ];
        let bbox = ring_bbox(&ring).unwrap();
        assert_eq!(bbox.to_array(), [-10.0, -3.0, 20.0, 40.0]);
        assert_eq!(bbox.center(), DVec2::new(5.0, 18.5));
        assert!(ring_bbox(&[]).is_none());
    }

    #[test]
    fn test_wkt_closes_ring() {
        let ring = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.5),
        ];
        let wkt = rings_to_wkt(&[ring]);
        assert_eq!(wkt, vec!["POLYGON((0 0, 1 0, 1 1.5, 0 0))".to_string()]);

        let closed = vec![DVec2::new(-180.0, -45.0), DVec2::new(-90.0, 45.0), DVec2::new(-180.0, -45.0)];
        let both = rings_to_wkt(&[closed, Vec::new()]);
        assert_eq!(both, vec!["POLYGON((-180 -45, -90 45, -180 -45))".to_string()], "closed rings kept, empty rings skipped");
    }

    #[test]
    fn test_wkt_keeps_closed_ring() {
        let ring = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(0.0, 0.0),
        ];
        assert_eq!(rings_to_wkt(&[ring])[0], "POLYGON((0 0, 1 0, 0 1, 0 0))");
    }

    #[test]
    fn test_intersects() {
        let a = GeoBBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&GeoBBox::new(5.0, 5.0, 20.0, 20.0)));
        assert!(!a.intersects(&GeoBBox::new(11.0, 0.0, 20.0, 10.0)));
        assert!(GeoBBox::WORLD.contains(DVec2::new(180.0, -90.0)));
    }
}
