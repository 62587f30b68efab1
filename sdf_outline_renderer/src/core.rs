use crate::outline::{Outline, Point};
use crate::SdfGlyphError;

/// The largest buffered bitmap side length (in px) that will be rendered.
pub const MAX_BITMAP_SIDE: usize = 4096;

/// A signed distance field for a single glyph, along with the glyph's pixel metrics.
#[derive(Clone, Debug, PartialEq)]
pub struct SdfGlyph {
    /// The buffered distance field, flattened row by row starting with the top row.
    /// Values are in the range [-1.0, 1.0] as a fraction of the radius; negative values
    /// are inside the glyph.
    pub sdf: Vec<f64>,
    pub metrics: GlyphMetrics,
}

/// Bounding box metrics for a rendered glyph, rounded to whole pixels.
///
/// A glyph without any ink (a space, for example) has all metrics set to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlyphMetrics {
    /// The unbuffered width of the glyph in px.
    pub width: usize,

    /// The unbuffered height of the glyph in px.
    pub height: usize,

    /// The distance from the origin to the left edge of the glyph in px.
    pub left_bearing: i32,

    /// The distance from the baseline to the top edge of the glyph in px.
    pub top_bearing: i32,

    /// The number of pixels buffering the glyph on all sides.
    pub buffer: usize,
}

impl GlyphMetrics {
    #[must_use]
    pub fn buffered_width(&self) -> usize {
        self.width + self.buffer + self.buffer
    }

    #[must_use]
    pub fn buffered_height(&self) -> usize {
        self.height + self.buffer + self.buffer
    }
}

/// Render a signed distance field for the given outline, recording distances
/// out to `radius` pixels from the shape outline (the rest will be clamped).
///
/// The glyph bounding box is rounded to whole pixels and padded with `buffer` pixels on
/// every side, so the outline never touches the edge of the field. Each sample is taken at
/// the centre of its pixel. Whether a sample lies inside the glyph is decided with the
/// non-zero winding rule, so overlapping contours render as a single shape.
pub fn render_sdf_from_outline(
    outline: &Outline,
    buffer: usize,
    radius: usize,
) -> Result<SdfGlyph, SdfGlyphError> {
    if radius == 0 {
        return Err(SdfGlyphError::InvalidRadius);
    }

    let Some(bounds) = outline.bounds() else {
        return Ok(SdfGlyph {
            sdf: Vec::new(),
            metrics: GlyphMetrics::default(),
        });
    };

    let x_min = bounds.x_min.round();
    let y_min = bounds.y_min.round();
    let x_max = bounds.x_max.round();
    let y_max = bounds.y_max.round();

    let width = (x_max - x_min) as usize;
    let height = (y_max - y_min) as usize;
    if width == 0 || height == 0 {
        // Hairlines have no area to render
        return Ok(SdfGlyph {
            sdf: Vec::new(),
            metrics: GlyphMetrics::default(),
        });
    }

    let metrics = GlyphMetrics {
        width,
        height,
        left_bearing: x_min as i32,
        top_bearing: y_max as i32,
        buffer,
    };
    let buffered_width = metrics.buffered_width();
    let buffered_height = metrics.buffered_height();
    if buffered_width > MAX_BITMAP_SIDE || buffered_height > MAX_BITMAP_SIDE {
        return Err(SdfGlyphError::GlyphTooLarge(buffered_width, buffered_height));
    }

    // Shift the outline so that the bounding box starts at (buffer, buffer)
    let dx = buffer as f64 - x_min;
    let dy = buffer as f64 - y_min;
    let edges: Vec<(Point, Point)> = outline
        .edges()
        .filter(|(a, b)| a != b)
        .map(|(a, b)| {
            (
                Point::new(a.x + dx, a.y + dy),
                Point::new(b.x + dx, b.y + dy),
            )
        })
        .collect();

    let radius = radius as f64;
    let grid = EdgeGrid::new(&edges, buffered_width, buffered_height, radius);
    let mut sdf = vec![0f64; buffered_width * buffered_height];
    let mut crossings = Vec::new();

    for y in 0..buffered_height {
        let sample_y = y as f64 + 0.5;
        collect_crossings(&edges, sample_y, &mut crossings);

        // Font outlines have y pointing up, while the bitmap starts with the top row
        let row = (buffered_height - y - 1) * buffered_width;
        let mut crossing = 0;
        let mut winding = 0;

        for x in 0..buffered_width {
            let sample = Point::new(x as f64 + 0.5, sample_y);
            while crossing < crossings.len() && crossings[crossing].0 < sample.x {
                winding += crossings[crossing].1;
                crossing += 1;
            }

            let distance = grid.min_distance(&edges, sample).min(radius);
            let signed = if winding != 0 { -distance } else { distance };
            sdf[row + x] = (signed / radius).clamp(-1.0, 1.0);
        }
    }

    Ok(SdfGlyph { sdf, metrics })
}

/// Gathers the points where a horizontal line at `y` crosses the outline, together with
/// the winding direction of each crossing edge, sorted from left to right.
fn collect_crossings(edges: &[(Point, Point)], y: f64, crossings: &mut Vec<(f64, i32)>) {
    crossings.clear();
    for (a, b) in edges {
        let direction = if a.y <= y && b.y > y {
            1
        } else if b.y <= y && a.y > y {
            -1
        } else {
            continue;
        };
        let x = a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y);
        crossings.push((x, direction));
    }
    crossings.sort_by(|a, b| a.0.total_cmp(&b.0));
}

fn squared_distance_to_edge(p: Point, v: Point, w: Point) -> f64 {
    let dx = w.x - v.x;
    let dy = w.y - v.y;
    let length_squared = dx * dx + dy * dy;

    let t = if length_squared == 0.0 {
        0.0
    } else {
        (((p.x - v.x) * dx + (p.y - v.y) * dy) / length_squared).clamp(0.0, 1.0)
    };
    let nearest_x = v.x + t * dx - p.x;
    let nearest_y = v.y + t * dy - p.y;
    nearest_x * nearest_x + nearest_y * nearest_y
}

/// A uniform spatial index over the outline edges.
///
/// Cells are `radius` pixels wide, and every edge is registered with each cell that its
/// bounding box (grown by `radius`) overlaps. Any edge within `radius` of a sample is
/// therefore listed in the cell containing the sample.
struct EdgeGrid {
    cell_size: f64,
    columns: usize,
    rows: usize,
    cells: Vec<Vec<usize>>,
}

impl EdgeGrid {
    fn new(edges: &[(Point, Point)], width: usize, height: usize, radius: f64) -> EdgeGrid {
        let cell_size = radius;
        let columns = (width as f64 / cell_size).ceil() as usize + 1;
        let rows = (height as f64 / cell_size).ceil() as usize + 1;
        let mut cells = vec![Vec::new(); columns * rows];

        let cell_of = |value: f64, limit: usize| -> usize {
            ((value / cell_size).floor().max(0.0) as usize).min(limit - 1)
        };

        for (index, (a, b)) in edges.iter().enumerate() {
            let col_start = cell_of(a.x.min(b.x) - radius, columns);
            let col_end = cell_of(a.x.max(b.x) + radius, columns);
            let row_start = cell_of(a.y.min(b.y) - radius, rows);
            let row_end = cell_of(a.y.max(b.y) + radius, rows);

            for row in row_start..=row_end {
                for col in col_start..=col_end {
                    cells[row * columns + col].push(index);
                }
            }
        }

        EdgeGrid {
            cell_size,
            columns,
            rows,
            cells,
        }
    }

    /// Returns the distance to the nearest edge, or infinity when no edge is within range.
    fn min_distance(&self, edges: &[(Point, Point)], p: Point) -> f64 {
        let col = ((p.x / self.cell_size) as usize).min(self.columns - 1);
        let row = ((p.y / self.cell_size) as usize).min(self.rows - 1);

        self.cells[row * self.columns + col]
            .iter()
            .map(|&index| {
                let (v, w) = edges[index];
                squared_distance_to_edge(p, v, w)
            })
            .fold(f64::INFINITY, f64::min)
            .sqrt()
    }
}

/// Compresses a `Vec<f64>` into a `Vec<u8>` for efficiency.
///
/// The highest `cutoff` percent of values in the range (0-255) will be used to encode
/// negative values (points inside the glyph). This can be tuned based on the intended
/// application.
///
/// The `cutoff` value must be in the range (0, 1) - non-inclusive on both sides.
/// Values outside this range make no sense and will result in an error.
pub fn clamp_to_u8(sdf: &[f64], cutoff: f64) -> Result<Vec<u8>, SdfGlyphError> {
    if cutoff <= 0.0 || cutoff >= 1.0 {
        return Err(SdfGlyphError::InvalidCutoff(cutoff));
    }
    Ok(sdf
        .iter()
        .map(|v| {
            // Note: casting from a float to an integer performs a saturating
            // cast in Rust, removing the need for special logic.
            // See https://doc.rust-lang.org/nomicon/casts.html.
            (255.0 - 255.0 * (v + cutoff)) as u8
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{clamp_to_u8, render_sdf_from_outline, GlyphMetrics};
    use crate::{Outline, OutlineBuilder, SdfGlyphError};

    fn rectangle(x0: f64, y0: f64, x1: f64, y1: f64) -> Outline {
        let mut builder = OutlineBuilder::default();
        builder.move_to(x0, y0);
        builder.line_to(x1, y0);
        builder.line_to(x1, y1);
        builder.line_to(x0, y1);
        builder.finish()
    }

    #[test]
    fn test_empty_glyph() {
        // A space has no outline at all
        let glyph = render_sdf_from_outline(&Outline::default(), 3, 8).unwrap();

        assert_eq!(glyph.sdf, Vec::new());
        assert_eq!(glyph.metrics, GlyphMetrics::default());
        assert_eq!(clamp_to_u8(&glyph.sdf, 0.25).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_rectangle_metrics() {
        let glyph = render_sdf_from_outline(&rectangle(1.2, -2.0, 11.0, 17.4), 3, 8).unwrap();

        assert_eq!(
            glyph.metrics,
            GlyphMetrics {
                width: 10,
                height: 19,
                left_bearing: 1,
                top_bearing: 17,
                buffer: 3,
            }
        );
        assert_eq!(glyph.sdf.len(), 16 * 25);
    }

    #[test]
    fn test_rectangle_sign() {
        // 10x10 square with a 3px buffer -> 16x16 field
        let glyph = render_sdf_from_outline(&rectangle(0.0, 0.0, 10.0, 10.0), 3, 8).unwrap();
        let width = glyph.metrics.buffered_width();
        let at = |x: usize, y: usize| glyph.sdf[y * width + x];

        // The centre of the square is 5px from every edge
        assert!((at(8, 8) + 4.5 / 8.0).abs() < 1e-9);
        // The corner samples sit outside, at the distance to the nearest corner
        let corner = (2.5f64 * 2.5 + 2.5 * 2.5).sqrt() / 8.0;
        assert!((at(0, 0) - corner).abs() < 1e-9);
        // First pixel inside the top edge
        assert!((at(8, 3) + 0.5 / 8.0).abs() < 1e-9);
        // First pixel outside the top edge
        assert!((at(8, 2) - 0.5 / 8.0).abs() < 1e-9);

        let inside = glyph.sdf.iter().filter(|v| **v < 0.0).count();
        assert_eq!(inside, 100);
    }

    #[test]
    fn test_distances_clamp_to_radius() {
        let glyph = render_sdf_from_outline(&rectangle(0.0, 0.0, 40.0, 40.0), 3, 2).unwrap();

        assert!(glyph.sdf.iter().all(|v| (-1.0..=1.0).contains(v)));
        assert!(glyph.sdf.iter().any(|v| *v == -1.0));
        assert!(glyph.sdf.iter().any(|v| *v == 1.0));
    }

    #[test]
    fn test_counter_is_outside() {
        // An "O": outer ring clockwise, inner ring counter-clockwise
        let mut builder = OutlineBuilder::default();
        builder.move_to(0.0, 0.0);
        builder.line_to(0.0, 20.0);
        builder.line_to(20.0, 20.0);
        builder.line_to(20.0, 0.0);
        builder.move_to(6.0, 6.0);
        builder.line_to(14.0, 6.0);
        builder.line_to(14.0, 14.0);
        builder.line_to(6.0, 14.0);
        let glyph = render_sdf_from_outline(&builder.finish(), 3, 8).unwrap();
        let width = glyph.metrics.buffered_width();

        // Centre of the counter is 3.5px away from the inner ring
        assert!((glyph.sdf[13 * width + 13] - 3.5 / 8.0).abs() < 1e-9);
        // Middle of the stroke
        assert!(glyph.sdf[13 * width + 5] < 0.0);
    }

    #[test]
    fn test_overlapping_contours_fill() {
        // Two overlapping squares with the same orientation stay filled in the overlap
        let mut builder = OutlineBuilder::default();
        for offset in [0.0, 5.0] {
            builder.move_to(offset, offset);
            builder.line_to(offset + 10.0, offset);
            builder.line_to(offset + 10.0, offset + 10.0);
            builder.line_to(offset, offset + 10.0);
        }
        let glyph = render_sdf_from_outline(&builder.finish(), 3, 8).unwrap();
        let width = glyph.metrics.buffered_width();
        let height = glyph.metrics.buffered_height();

        // Sample at (7.5, 7.5) in outline space
        let x = 3 + 7;
        let y = height - 1 - (3 + 7);
        assert!(glyph.sdf[y * width + x] < 0.0);
    }

    #[test]
    fn test_deterministic() {
        let outline = rectangle(0.3, 0.7, 9.1, 12.9);
        let first = render_sdf_from_outline(&outline, 3, 8).unwrap();
        let second = render_sdf_from_outline(&outline, 3, 8).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_parameters() {
        let outline = rectangle(0.0, 0.0, 10.0, 10.0);
        assert!(matches!(
            render_sdf_from_outline(&outline, 3, 0),
            Err(SdfGlyphError::InvalidRadius)
        ));
        assert!(matches!(
            render_sdf_from_outline(&rectangle(0.0, 0.0, 5000.0, 10.0), 3, 8),
            Err(SdfGlyphError::GlyphTooLarge(5006, 16))
        ));
        assert!(matches!(
            clamp_to_u8(&[0.0], 1.0),
            Err(SdfGlyphError::InvalidCutoff(_))
        ));
    }

    #[test]
    fn test_clamp_to_u8() {
        let sdf = [1.0, 0.5, 0.0, -0.25, -1.0];
        let clamped = clamp_to_u8(&sdf, 0.25).unwrap();

        assert_eq!(clamped, vec![0, 63, 191, 255, 255]);

        // 191 = 255 (max value of a u8) - 25% of 256 (range), so every value at or above
        // it encodes a point on or inside the outline
        let glyph = render_sdf_from_outline(&rectangle(0.0, 0.0, 10.0, 10.0), 3, 8).unwrap();
        assert_eq!(
            clamp_to_u8(&glyph.sdf, 0.25)
                .unwrap()
                .into_iter()
                .filter(|x| *x > 191)
                .count(),
            glyph.sdf.iter().filter(|x| **x < 0.0).count()
        );
    }
}
