/// An axis-aligned face bounding box in frame pixel coordinates.
///
/// Coordinates may be negative or extend past the frame edge as reported
/// by a detector; callers clamp before indexing into pixel data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Euclidean distance between the centers of two regions.
    pub fn center_distance(&self, other: &Region) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        let dx = (ax - bx) as f64;
        let dy = (ay - by) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// Whether the centers of two regions lie within `tolerance` pixels.
    pub fn is_near(&self, other: &Region, tolerance: i32) -> bool {
        self.center_distance(other) <= tolerance as f64
    }

    /// Intersection of this region with a `frame_w` x `frame_h` frame.
    ///
    /// A region entirely outside the frame collapses to an empty box on
    /// the nearest edge.
    pub fn clamped(&self, frame_w: u32, frame_h: u32) -> Region {
        let fw = frame_w as i32;
        let fh = frame_h as i32;
        let x1 = self.x.clamp(0, fw);
        let y1 = self.y.clamp(0, fh);
        let x2 = (self.x + self.width).clamp(0, fw);
        let y2 = (self.y + self.height).clamp(0, fh);
        Region::new(x1, y1, x2 - x1, y2 - y1)
    }
}
