use std::fmt;
use std::str::FromStr;

use crate::error::UnknownShape;
use crate::shape::{Butterfly, Crane, Cube, Flexicube, Icosahedron, Lily, Lotus, Pyramid, Spinner};
use crate::strategy::ShapeStrategy;

/// The closed set of solids a globe can be folded into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    Icosahedron,
    Cube,
    Pyramid,
    Crane,
    Lotus,
    Butterfly,
    Spinner,
    Lily,
    Flexicube,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 9] = [
        ShapeKind::Icosahedron,
        ShapeKind::Cube,
        ShapeKind::Pyramid,
        ShapeKind::Crane,
        ShapeKind::Lotus,
        ShapeKind::Butterfly,
        ShapeKind::Spinner,
        ShapeKind::Lily,
        ShapeKind::Flexicube,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Icosahedron => "icosahedron",
            ShapeKind::Cube => "cube",
            ShapeKind::Pyramid => "pyramid",
            ShapeKind::Crane => "crane",
            ShapeKind::Lotus => "lotus",
            ShapeKind::Butterfly => "butterfly",
            ShapeKind::Spinner => "spinner",
            ShapeKind::Lily => "lily",
            ShapeKind::Flexicube => "flexicube",
        }
    }

    /// The strategy implementing this shape.
    #[must_use]
    pub fn strategy(self) -> &'static dyn ShapeStrategy {
        match self {
            ShapeKind::Icosahedron => &Icosahedron,
            ShapeKind::Cube => &Cube,
            ShapeKind::Pyramid => &Pyramid,
            ShapeKind::Crane => &Crane,
            ShapeKind::Lotus => &Lotus,
            ShapeKind::Butterfly => &Butterfly,
            ShapeKind::Spinner => &Spinner,
            ShapeKind::Lily => &Lily,
            ShapeKind::Flexicube => &Flexicube,
        }
    }

    #[inline]
    #[must_use]
    pub fn max_zoom(self) -> u32 {
        self.strategy().max_zoom()
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeKind {
    type Err = UnknownShape;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| UnknownShape(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in ShapeKind::ALL {
            assert_eq!(kind.name().parse::<ShapeKind>(), Ok(kind), "{kind} parses back");
            assert_eq!(kind.strategy().kind(), kind, "{kind} dispatches to its own strategy");
        }
    }

    #[test]
    fn test_unknown_shape_is_an_error() {
        assert_eq!(
            "dodecahedron".parse::<ShapeKind>(),
            Err(UnknownShape("dodecahedron".to_string()))
        );
        assert_eq!(" Cube ".parse::<ShapeKind>(), Ok(ShapeKind::Cube));
    }

    #[test]
    fn test_max_zoom() {
        assert_eq!(ShapeKind::Icosahedron.max_zoom(), 4);
        assert_eq!(ShapeKind::Cube.max_zoom(), 2);
    }
}
