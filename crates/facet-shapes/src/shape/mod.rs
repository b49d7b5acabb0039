//! The nine shape strategies.

mod butterfly;
mod crane;
mod cube;
mod flexicube;
mod icosahedron;
mod lily;
mod lotus;
mod pyramid;
mod spinner;

pub use butterfly::Butterfly;
pub use crane::Crane;
pub use cube::Cube;
pub use flexicube::Flexicube;
pub use icosahedron::Icosahedron;
pub use lily::Lily;
pub use lotus::Lotus;
pub use pyramid::Pyramid;
pub use spinner::Spinner;
