//! Scene-space geometry used for actor hit regions and movement.

use serde::{Deserialize, Serialize};
use tableau_data::PointDef;

/// A point or offset in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Move from `self` toward `target` by at most `step` units.
    ///
    /// Never overshoots: returns `target` once it is within reach.
    pub fn step_toward(self, target: Vec2, step: f32) -> Vec2 {
        let dist = self.distance(target);
        if dist <= step || dist <= f32::EPSILON {
            return target;
        }
        let t = step / dist;
        Vec2::new(self.x + (target.x - self.x) * t, self.y + (target.y - self.y) * t)
    }
}

impl From<PointDef> for Vec2 {
    fn from(p: PointDef) -> Self {
        Vec2::new(p.x, p.y)
    }
}

/// A polygonal hit region. Vertices are relative to `position`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Vec2>,
    pub position: Vec2,
}

impl Polygon {
    pub fn new(position: Vec2, vertices: Vec<Vec2>) -> Self {
        Self { vertices, position }
    }

    /// Axis-aligned rectangle with its lower-left corner at `position`.
    pub fn rect(position: Vec2, width: f32, height: f32) -> Self {
        Self::new(
            position,
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(width, 0.0),
                Vec2::new(width, height),
                Vec2::new(0.0, height),
            ],
        )
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Vertices translated into scene coordinates.
    pub fn transformed_vertices(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.vertices
            .iter()
            .map(|v| Vec2::new(v.x + self.position.x, v.y + self.position.y))
    }

    /// Even-odd point-in-polygon test. Regions with fewer than three vertices never contain a point.
    pub fn contains(&self, point: Vec2) -> bool {
        if self.vertices.len() < 3 {
            return false;
        }
        let verts: Vec<Vec2> = self.transformed_vertices().collect();
        let mut inside = false;
        let mut j = verts.len() - 1;
        for i in 0..verts.len() {
            let (a, b) = (verts[i], verts[j]);
            if (a.y > point.y) != (b.y > point.y) {
                let cross_x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
                if point.x < cross_x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_interior_point_only() {
        let poly = Polygon::rect(Vec2::new(10.0, 10.0), 5.0, 5.0);
        assert!(poly.contains(Vec2::new(12.0, 12.0)));
        assert!(!poly.contains(Vec2::new(2.0, 2.0)));
        assert!(!poly.contains(Vec2::new(16.0, 12.0)));
    }

    #[test]
    fn contains_follows_position() {
        let mut poly = Polygon::rect(Vec2::default(), 1.0, 1.0);
        assert!(poly.contains(Vec2::new(0.5, 0.5)));
        poly.set_position(Vec2::new(100.0, 0.0));
        assert!(!poly.contains(Vec2::new(0.5, 0.5)));
        assert!(poly.contains(Vec2::new(100.5, 0.5)));
    }

    #[test]
    fn concave_polygon_excludes_notch() {
        // U shape: notch between x=1..2 above y=1
        let poly = Polygon::new(
            Vec2::default(),
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(3.0, 0.0),
                Vec2::new(3.0, 3.0),
                Vec2::new(2.0, 3.0),
                Vec2::new(2.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(1.0, 3.0),
                Vec2::new(0.0, 3.0),
            ],
        );
        assert!(poly.contains(Vec2::new(0.5, 2.0)));
        assert!(!poly.contains(Vec2::new(1.5, 2.0)));
        assert!(poly.contains(Vec2::new(1.5, 0.5)));
    }

    #[test]
    fn empty_region_never_hits() {
        let poly = Polygon::default();
        assert!(!poly.contains(Vec2::default()));
    }

    #[test]
    fn step_toward_does_not_overshoot() {
        let start = Vec2::new(0.0, 0.0);
        let target = Vec2::new(10.0, 0.0);
        assert_eq!(start.step_toward(target, 4.0), Vec2::new(4.0, 0.0));
        assert_eq!(start.step_toward(target, 40.0), target);
    }
}
