/// Maximum distance (in px) between a flattened curve and its true position.
pub const DEFAULT_TOLERANCE: f64 = 0.05;

/// Upper bound on the number of line segments a single curve is split into.
const MAX_CURVE_STEPS: usize = 64;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

/// The axis-aligned extent of an outline, in px.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

/// A glyph outline, flattened into closed polylines ("rings").
///
/// Coordinates are in px with the y axis pointing up, as font outlines are
/// usually described. Every ring is closed: its last point equals its first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outline {
    rings: Vec<Vec<Point>>,
}

impl Outline {
    #[must_use]
    pub fn rings(&self) -> &[Vec<Point>] {
        &self.rings
    }

    /// True when the outline has no ring with at least one edge (e.g. a space).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rings.iter().all(|ring| ring.len() < 2)
    }

    /// Computes the bounding box of every point in the outline, or `None` if it is empty.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        if self.is_empty() {
            return None;
        }

        let mut bounds = Bounds {
            x_min: f64::INFINITY,
            y_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_max: f64::NEG_INFINITY,
        };
        for point in self.rings.iter().flatten() {
            bounds.x_min = bounds.x_min.min(point.x);
            bounds.y_min = bounds.y_min.min(point.y);
            bounds.x_max = bounds.x_max.max(point.x);
            bounds.y_max = bounds.y_max.max(point.y);
        }

        Some(bounds)
    }

    /// Iterates over every edge of every ring.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.rings
            .iter()
            .flat_map(|ring| ring.windows(2).map(|pair| (pair[0], pair[1])))
    }
}

/// Receives path commands from an outline decoder and flattens them into an [`Outline`].
///
/// The command set mirrors what TrueType (quadratic) and CFF (cubic) outlines need,
/// so any decoder can forward its drawing callbacks here directly.
#[derive(Debug)]
pub struct OutlineBuilder {
    rings: Vec<Vec<Point>>,
    ring: Vec<Point>,
    tolerance: f64,
}

impl Default for OutlineBuilder {
    fn default() -> Self {
        OutlineBuilder::new(DEFAULT_TOLERANCE)
    }
}

impl OutlineBuilder {
    #[must_use]
    pub fn new(tolerance: f64) -> OutlineBuilder {
        OutlineBuilder {
            rings: Vec::new(),
            ring: Vec::new(),
            tolerance: tolerance.max(f64::EPSILON),
        }
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.close();
        self.ring.push(Point::new(x, y));
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.ring.push(Point::new(x, y));
    }

    /// Appends a quadratic Bézier curve from the current point.
    pub fn quad_to(&mut self, x1: f64, y1: f64, x: f64, y: f64) {
        let Some(&p0) = self.ring.last() else {
            // A curve without a start point has nothing to attach to
            self.move_to(x, y);
            return;
        };
        let p1 = Point::new(x1, y1);
        let p2 = Point::new(x, y);

        // The flattening error of a quadratic is bounded by |p0 - 2p1 + p2| / (8 n^2)
        let deviation = (p0.x - 2.0 * p1.x + p2.x).hypot(p0.y - 2.0 * p1.y + p2.y);
        let steps = self.steps_for(deviation / 8.0);

        for step in 1..steps {
            let t = step as f64 / steps as f64;
            let a = p0.lerp(p1, t);
            let b = p1.lerp(p2, t);
            self.ring.push(a.lerp(b, t));
        }
        self.ring.push(p2);
    }

    /// Appends a cubic Bézier curve from the current point.
    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        let Some(&p0) = self.ring.last() else {
            self.move_to(x, y);
            return;
        };
        let p1 = Point::new(x1, y1);
        let p2 = Point::new(x2, y2);
        let p3 = Point::new(x, y);

        let deviation = (p0.x - 2.0 * p1.x + p2.x)
            .hypot(p0.y - 2.0 * p1.y + p2.y)
            .max((p1.x - 2.0 * p2.x + p3.x).hypot(p1.y - 2.0 * p2.y + p3.y));
        let steps = self.steps_for(deviation * 0.75);

        for step in 1..steps {
            let t = step as f64 / steps as f64;
            let a = p0.lerp(p1, t);
            let b = p1.lerp(p2, t);
            let c = p2.lerp(p3, t);
            let ab = a.lerp(b, t);
            let bc = b.lerp(c, t);
            self.ring.push(ab.lerp(bc, t));
        }
        self.ring.push(p3);
    }

    /// Closes the current ring, if any. Rings are closed implicitly by
    /// [`Self::move_to`] and [`Self::finish`] as well.
    pub fn close(&mut self) {
        if self.ring.is_empty() {
            return;
        }

        let first = self.ring[0];
        if self.ring.last() != Some(&first) {
            self.ring.push(first);
        }
        self.rings.push(std::mem::take(&mut self.ring));
    }

    #[must_use]
    pub fn finish(mut self) -> Outline {
        self.close();
        Outline { rings: self.rings }
    }

    fn steps_for(&self, error_scale: f64) -> usize {
        let steps = (error_scale / self.tolerance).sqrt().ceil();
        if steps.is_finite() {
            (steps as usize).clamp(1, MAX_CURVE_STEPS)
        } else {
            MAX_CURVE_STEPS
        }
    }
}
