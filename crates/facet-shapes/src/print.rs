//! Print sheet helpers shared by the per-shape net layouts.

use facet_raster::{Canvas, Color, Path, StrokeStyle};
use glam::{DVec2, DVec3};
use image::RgbaImage;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::PrintError;
use crate::tile::{Tile, TileSize};

pub(crate) const PAGE_BORDER: Color = Color::rgb(0x77, 0x77, 0x77);
pub(crate) const SHEET_BORDER: Color = Color::BLACK;

/// Rendered tiles ready for layout, index-aligned.
#[derive(Clone, Copy, Debug)]
pub struct PrintSheet<'a> {
    pub tiles: &'a [Tile],
    pub sizes: &'a [TileSize],
    pub textures: &'a [RgbaImage],
}

impl<'a> PrintSheet<'a> {
    #[must_use]
    pub fn new(tiles: &'a [Tile], sizes: &'a [TileSize], textures: &'a [RgbaImage]) -> Self {
        Self { tiles, sizes, textures }
    }

    #[must_use]
    pub fn texture(&self, index: usize) -> Option<&'a RgbaImage> {
        self.textures.get(index)
    }

    /// Dimensions of a texture that page sizes are derived from.
    pub(crate) fn reference(&self, index: usize) -> Result<(f64, f64), PrintError> {
        if self.textures.is_empty() {
            return Err(PrintError::Empty);
        }
        self.texture(index)
            .map(|t| (f64::from(t.width()), f64::from(t.height())))
            .ok_or(PrintError::MissingTexture(index))
    }
}

/// White sheet of at least one pixel.
pub(crate) fn blank(width: f64, height: f64) -> Result<Canvas, PrintError> {
    let mut canvas = Canvas::new(width.max(1.0) as u32, height.max(1.0) as u32)?;
    canvas.clear(Color::WHITE);
    Ok(canvas)
}

pub(crate) fn border(canvas: &mut Canvas, color: Color) {
    let (w, h) = (f64::from(canvas.width()), f64::from(canvas.height()));
    canvas.stroke_rect(0.0, 0.0, w, h, &StrokeStyle::default(), color);
}

/// Draw texture `index` after translating to `at` and rotating by `degrees`.
///
/// `anchor` offsets the image by fractions of its own size, so
/// `(-0.5, 0.0)` hangs it from its top center.
pub(crate) fn place(canvas: &mut Canvas, sheet: &PrintSheet<'_>, index: usize, at: DVec2, degrees: f64, anchor: DVec2) {
    let Some(texture) = sheet.texture(index) else {
        return;
    };
    let (w, h) = (f64::from(texture.width()), f64::from(texture.height()));
    canvas.save();
    canvas.translate(at.x, at.y);
    canvas.rotate(degrees);
    canvas.draw_image(texture, anchor.x * w, anchor.y * h, w, h);
    canvas.restore();
}

/// Paste pages left to right, top to bottom, `columns` per row.
pub(crate) fn grid(pages: &[Canvas], columns: usize, cell: f64, rows: usize) -> Result<Canvas, PrintError> {
    let mut sheet = blank(cell * columns as f64, cell * rows as f64)?;
    for (idx, page) in pages.iter().enumerate() {
        let (row, col) = (idx / columns, idx % columns);
        let (w, h) = (f64::from(page.width()), f64::from(page.height()));
        sheet.draw_image(page.image(), col as f64 * cell, row as f64 * cell, w, h);
    }
    border(&mut sheet, SHEET_BORDER);
    Ok(sheet)
}

const PAIR_ROTATIONS: [f64; 3] = [-150.0, -30.0, -270.0];
const STRIPS_PER_PAGE: usize = 10;

/// Net of any triangle-tiled solid as glue strips: every pair of adjacent
/// tiles is drawn hinged on a `2w x w` strip, ten strips to a `4w x 5w` page.
pub(crate) fn edge_pairs(sheet: &PrintSheet<'_>) -> Result<Vec<Canvas>, PrintError> {
    let size = sheet.sizes.first().ok_or(PrintError::Empty)?;
    let (w, h) = (size.width, size.height);
    let margin = w - h;
    let index: FxHashMap<_, usize> = sheet.tiles.iter().enumerate().map(|(i, t)| (t.id, i)).collect();

    let mut paired = FxHashSet::default();
    let mut strips = Vec::new();
    for (current_idx, current) in sheet.tiles.iter().enumerate() {
        for (slot, neighbor) in current.neighbors.iter().enumerate() {
            let Some(&near_idx) = index.get(&neighbor.id) else {
                continue;
            };
            let key = if current.id < neighbor.id {
                (current.id, neighbor.id)
            } else {
                (neighbor.id, current.id)
            };
            if !paired.insert(key) {
                continue;
            }
            let near = &sheet.tiles[near_idx];
            let mut strip = blank(w * 2.0, w)?;
            fold_guides(&mut strip, w, margin);

            let first = DVec2::new(margin + h + h / 3.0, w / 2.0);
            let second = DVec2::new(margin + h * 2.0 / 3.0, w / 2.0);
            if current.face() != near.face() {
                let turn = PAIR_ROTATIONS[slot % 3];
                draw_scaled(&mut strip, sheet, current_idx, first, turn, (w, h), -2.0 / 3.0);
                let shared = corner_rotation(&near.surface, &current.surface, current_scale(current));
                draw_scaled(&mut strip, sheet, near_idx, second, turn + shared, (w, h), -2.0 / 3.0);
            } else if current.up {
                draw_scaled(&mut strip, sheet, current_idx, first, -30.0, (w, h), -2.0 / 3.0);
                draw_scaled(&mut strip, sheet, near_idx, second, -30.0, (w, h), -1.0 / 3.0);
            } else {
                draw_scaled(&mut strip, sheet, current_idx, first, 30.0, (w, h), -1.0 / 3.0);
                draw_scaled(&mut strip, sheet, near_idx, second, 30.0, (w, h), -2.0 / 3.0);
            }
            strips.push(strip);
        }
    }

    strips
        .chunks(STRIPS_PER_PAGE)
        .map(|chunk| {
            let mut page = blank(w * 4.0, w * 5.0)?;
            for (idx, strip) in chunk.iter().enumerate() {
                let (col, row) = ((idx % 2) as f64, (idx % 5) as f64);
                page.draw_image(strip.image(), col * w * 2.0, row * w, w * 2.0, w);
            }
            Ok(page)
        })
        .collect()
}

fn fold_guides(strip: &mut Canvas, w: f64, margin: f64) {
    let style = StrokeStyle {
        dash: vec![10.0, 5.0],
        ..StrokeStyle::default()
    };
    let mut path = Path::polygon(&[
        DVec2::ZERO,
        DVec2::new(w * 2.0, 0.0),
        DVec2::new(w * 2.0, w),
        DVec2::new(0.0, w),
    ]);
    path.move_to(DVec2::new(margin, 0.0)).line_to(DVec2::new(margin, w));
    path.move_to(DVec2::new(w * 2.0 - margin, 0.0))
        .line_to(DVec2::new(w * 2.0 - margin, w));
    strip.stroke_path(&path, &style, PAGE_BORDER);
}

fn draw_scaled(
    canvas: &mut Canvas,
    sheet: &PrintSheet<'_>,
    index: usize,
    at: DVec2,
    degrees: f64,
    (w, h): (f64, f64),
    lift: f64,
) {
    let Some(texture) = sheet.texture(index) else {
        return;
    };
    canvas.save();
    canvas.translate(at.x, at.y);
    canvas.rotate(degrees);
    canvas.draw_image(texture, -w / 2.0, h * lift, w, h);
    canvas.restore();
}

fn current_scale(tile: &Tile) -> f64 {
    tile.surface
        .first()
        .map_or(1.0, |p| p.length().max(1.0))
}

/// Extra turn so a neighbor's texture lines up with the shared edge, keyed
/// by which of its corners coincide with which of the current tile's.
fn corner_rotation(near: &[DVec3], current: &[DVec3], scale: f64) -> f64 {
    let tolerance = scale * 1e-9;
    let mut shared = [[false; 3]; 3];
    for (i, a) in near.iter().take(3).enumerate() {
        for (j, b) in current.iter().take(3).enumerate() {
            shared[i][j] = a.distance(*b) <= tolerance;
        }
    }
    const T: bool = true;
    const F: bool = false;
    match shared {
        [[F, T, F], [T, F, F], [F, F, F]] => 180.0,
        [[T, F, F], [F, F, F], [F, T, F]] => 60.0,
        [[F, F, F], [F, F, T], [F, T, F]] => 180.0,
        [[F, F, T], [F, F, F], [T, F, F]] => 180.0,
        [[T, F, F], [F, F, T], [F, F, F]] => -60.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_rotation_patterns() {
        let a = DVec3::X;
        let b = DVec3::Y;
        let c = DVec3::Z;
        let (x, y) = (DVec3::NEG_X, DVec3::NEG_Y);
        assert_eq!(corner_rotation(&[b, a, x], &[a, b, c], 1.0), 180.0);
        assert_eq!(corner_rotation(&[a, x, b], &[a, b, c], 1.0), 60.0);
        assert_eq!(corner_rotation(&[a, c, y], &[a, b, c], 1.0), -60.0);
        assert_eq!(corner_rotation(&[x, y, DVec3::ONE], &[a, b, c], 1.0), 0.0);
    }

    #[test]
    fn test_grid_places_pages() {
        let mut red = blank(4.0, 4.0).expect("canvas");
        red.fill_rect(0.0, 0.0, 4.0, 4.0, Color::rgb(255, 0, 0));
        let white = blank(4.0, 4.0).expect("canvas");
        let sheet = grid(&[white, red], 2, 4.0, 1).expect("sheet");
        assert_eq!((sheet.width(), sheet.height()), (8, 4));
        assert_eq!(sheet.pixel(6, 2), Color::rgb(255, 0, 0), "second page lands in column two");
        assert_eq!(sheet.pixel(2, 2), Color::WHITE);
    }

    #[test]
    fn test_reference_errors() {
        let sheet = PrintSheet::new(&[], &[], &[]);
        assert!(matches!(sheet.reference(0), Err(PrintError::Empty)));
        let textures = [RgbaImage::new(2, 3)];
        let sheet = PrintSheet::new(&[], &[], &textures);
        assert_eq!(sheet.reference(0).ok(), Some((2.0, 3.0)));
        assert!(matches!(sheet.reference(4), Err(PrintError::MissingTexture(4))));
    }
}
