use glam::{DAffine2, DVec2};

/// One connected run of points.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubPath {
    pub points: Vec<DVec2>,
    pub closed: bool,
}

/// A sequence of sub-paths, built like a 2D context path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    subpaths: Vec<SubPath>,
}

impl Path {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Axis-aligned rectangle as a closed sub-path.
    #[must_use]
    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::polygon(&[
            DVec2::new(x, y),
            DVec2::new(x + width, y),
            DVec2::new(x + width, y + height),
            DVec2::new(x, y + height),
        ])
    }

    #[must_use]
    pub fn polygon(points: &[DVec2]) -> Self {
        let mut path = Self::new();
        path.add_ring(points, true);
        path
    }

    pub fn move_to(&mut self, p: DVec2) -> &mut Self {
        self.subpaths.push(SubPath {
            points: vec![p],
            closed: false,
        });
        self
    }

    /// Starts a sub-path when none is open.
    pub fn line_to(&mut self, p: DVec2) -> &mut Self {
        match self.subpaths.last_mut() {
            Some(sub) if !sub.closed => sub.points.push(p),
            _ => {
                self.move_to(p);
            }
        }
        self
    }

    pub fn close(&mut self) -> &mut Self {
        if let Some(sub) = self.subpaths.last_mut() {
            sub.closed = true;
        }
        self
    }

    /// Append `points` as a new sub-path; a repeated closing point is dropped.
    pub fn add_ring(&mut self, points: &[DVec2], closed: bool) -> &mut Self {
        let mut points = points.to_vec();
        if closed && points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if !points.is_empty() {
            self.subpaths.push(SubPath { points, closed });
        }
        self
    }

    #[must_use]
    pub fn subpaths(&self) -> &[SubPath] {
        &self.subpaths
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subpaths.iter().all(|s| s.points.is_empty())
    }

    #[must_use]
    pub fn transformed(&self, transform: &DAffine2) -> Self {
        Self {
            subpaths: self
                .subpaths
                .iter()
                .map(|sub| SubPath {
                    points: sub.points.iter().map(|p| transform.transform_point2(*p)).collect(),
                    closed: sub.closed,
                })
                .collect(),
        }
    }

    /// Rings for filling: every sub-path is implicitly closed.
    #[must_use]
    pub fn rings(&self) -> Vec<Vec<DVec2>> {
        self.subpaths
            .iter()
            .filter(|s| s.points.len() >= 3)
            .map(|s| s.points.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let mut path = Path::new();
        path.move_to(DVec2::ZERO)
            .line_to(DVec2::X)
            .line_to(DVec2::ONE)
            .close()
            .line_to(DVec2::Y);
        assert_eq!(path.subpaths().len(), 2, "line_to after close starts a new sub-path");
        assert!(path.subpaths()[0].closed);
        assert_eq!(path.rings().len(), 1);
    }

    #[test]
    fn test_add_ring_drops_closing_point() {
        let ring = [DVec2::ZERO, DVec2::X, DVec2::ONE, DVec2::ZERO];
        let path = Path::polygon(&ring);
        assert_eq!(path.subpaths()[0].points.len(), 3);
    }

    #[test]
    fn test_transformed() {
        let path = Path::rect(0.0, 0.0, 2.0, 1.0);
        let moved = path.transformed(&DAffine2::from_translation(DVec2::new(10.0, 5.0)));
        assert_eq!(moved.subpaths()[0].points[2], DVec2::new(12.0, 6.0));
    }
}
