//! Shape strategies, tile identities and the tiling engine.
//!
//! A [`ShapeKind`] names one of the nine solids. Its strategy supplies the
//! solid topology, splits faces into tiles, maps geographic coordinates into
//! tile raster space and lays rendered tiles out as printable nets. A
//! [`ShapeContext`] owns the built solid and the tile cache for one shape
//! selection; [`TilingEngine`] wraps it for the view.

mod context;
mod densify;
mod error;
mod kind;
mod print;
mod shape;
mod strategy;
mod tile;
mod tiling;

pub use context::{ShapeContext, TilingParams};
pub use densify::Densify;
pub use error::{PrintError, UnknownShape};
pub use kind::ShapeKind;
pub use print::PrintSheet;
pub use strategy::{ShapeStrategy, TransformKind};
pub use tile::{Neighbor, PlaneMap, Tile, TileFrame, TileId, TileModel, TileQuery, TileSize};
pub use tiling::TilingEngine;
