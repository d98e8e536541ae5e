//! Planar geometry used for zone membership.
//!
//! All coordinates are pixels in a single coordinate space; y grows downward
//! as in image space.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// One ring edge with its extents cached for the candidate test.
#[derive(Clone, Copy, Debug)]
struct Edge {
    from: Point2D,
    to: Point2D,
    y_min: f64,
    y_max: f64,
    x_max: f64,
}

impl Edge {
    fn new(from: Point2D, to: Point2D) -> Self {
        Self {
            from,
            to,
            y_min: from.y.min(to.y),
            y_max: from.y.max(to.y),
            x_max: from.x.max(to.x),
        }
    }

    fn is_horizontal(&self) -> bool {
        self.from.y == self.to.y
    }

    fn is_vertical(&self) -> bool {
        self.from.x == self.to.x
    }

    /// Half-open in y: `y_min < y <= y_max`, and not entirely left of the point.
    fn is_candidate(&self, point: Point2D) -> bool {
        self.y_min < point.y && point.y <= self.y_max && point.x <= self.x_max
    }

    fn crosses_ray(&self, point: Point2D) -> bool {
        if !self.is_candidate(point) || self.is_horizontal() {
            return false;
        }
        if self.is_vertical() {
            return true;
        }
        let x_cross =
            (point.y - self.from.y) * (self.to.x - self.from.x) / (self.to.y - self.from.y)
                + self.from.x;
        point.x <= x_cross
    }
}

/// Closed polygon ring (the last vertex connects back to the first).
///
/// Construction rejects rings that cannot be classified against: fewer than
/// three vertices, non-finite vertices, or zero enclosed area.
#[derive(Clone, Debug)]
pub struct Polygon {
    vertices: Vec<Point2D>,
    edges: Vec<Edge>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point2D>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(anyhow!(
                "polygon needs at least 3 vertices, got {}",
                vertices.len()
            ));
        }
        if let Some(bad) = vertices.iter().position(|v| !v.is_finite()) {
            return Err(anyhow!("polygon vertex {} is not a finite point", bad));
        }
        if signed_area(&vertices).abs() < f64::EPSILON {
            return Err(anyhow!(
                "polygon is degenerate (collinear vertices enclose no area)"
            ));
        }
        let edges = vertices
            .iter()
            .zip(vertices.iter().cycle().skip(1))
            .map(|(from, to)| Edge::new(*from, *to))
            .collect();
        Ok(Self { vertices, edges })
    }

    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self> {
        Self::new(pairs.iter().copied().map(Point2D::from).collect())
    }

    pub fn vertices(&self) -> &[Point2D] {
        &self.vertices
    }

    /// Even-odd ray cast toward +x.
    ///
    /// Points on the boundary have no single correct answer under this rule.
    /// What falls out of the half-open edge test: for an axis-aligned
    /// rectangle the bottom and right sides are inside, the top and left sides
    /// are outside. A horizontal edge shared by two rings belongs to the ring
    /// above it.
    pub fn contains(&self, point: Point2D) -> bool {
        self.edges
            .iter()
            .filter(|edge| edge.crosses_ray(point))
            .fold(false, |inside, _| !inside)
    }

    /// Copy of this polygon with every vertex multiplied per axis.
    pub fn scaled(&self, scale_x: f64, scale_y: f64) -> Result<Self> {
        Self::new(
            self.vertices
                .iter()
                .map(|v| Point2D::new(v.x * scale_x, v.y * scale_y))
                .collect(),
        )
    }

}

/// Point-in-polygon test.
pub fn contains(point: Point2D, polygon: &Polygon) -> bool {
    polygon.contains(point)
}

fn signed_area(vertices: &[Point2D]) -> f64 {
    let twice: f64 = vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    twice / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::from_pairs(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]).unwrap()
    }

    #[test]
    fn convex_polygon_contains_interior_point() {
        let poly = square();
        assert!(contains(Point2D::new(5.0, 5.0), &poly));
        assert!(contains(Point2D::new(0.5, 9.5), &poly));
    }

    #[test]
    fn far_outside_points_are_rejected() {
        let poly = square();
        for p in [(-100.0, 5.0), (500.0, 5.0), (5.0, -300.0), (5.0, 1e9)] {
            assert!(!poly.contains(p.into()), "{:?} should be outside", p);
        }
    }

    #[test]
    fn concave_ring_excludes_notch() {
        // U shape opening upward; the notch spans x 4..6, y 0..6.
        let poly = Polygon::from_pairs(&[
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 6.0),
            (6.0, 6.0),
            (6.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
        ])
        .unwrap();
        assert!(!poly.contains(Point2D::new(5.0, 3.0)));
        assert!(poly.contains(Point2D::new(2.0, 3.0)));
        assert!(poly.contains(Point2D::new(8.0, 3.0)));
        assert!(poly.contains(Point2D::new(5.0, 8.0)));
    }

    #[test]
    fn rectangle_boundary_behavior() {
        let poly = square();
        assert!(poly.contains(Point2D::new(5.0, 10.0)), "bottom side");
        assert!(poly.contains(Point2D::new(10.0, 5.0)), "right side");
        assert!(!poly.contains(Point2D::new(5.0, 0.0)), "top side");
        assert!(!poly.contains(Point2D::new(0.0, 5.0)), "left side");
    }

    #[test]
    fn shared_horizontal_edge_belongs_to_upper_ring() {
        let upper = Polygon::from_pairs(&[
            (400.0, 0.0),
            (1024.0, 0.0),
            (1024.0, 300.0),
            (600.0, 200.0),
            (400.0, 200.0),
        ])
        .unwrap();
        let lower = Polygon::from_pairs(&[
            (400.0, 576.0),
            (400.0, 200.0),
            (600.0, 200.0),
            (1024.0, 300.0),
            (1024.0, 576.0),
        ])
        .unwrap();

        let on_edge = Point2D::new(500.0, 200.0);
        assert!(upper.contains(on_edge));
        assert!(!lower.contains(on_edge));

        let just_below = Point2D::new(500.0, 200.0001);
        assert!(!upper.contains(just_below));
        assert!(lower.contains(just_below));

        // Same y as the horizontal edge but left of both rings.
        assert!(!upper.contains(Point2D::new(300.0, 200.0)));
        assert!(!lower.contains(Point2D::new(300.0, 200.0)));
    }

    #[test]
    fn nan_point_is_never_inside() {
        assert!(!square().contains(Point2D::new(f64::NAN, 5.0)));
        assert!(!square().contains(Point2D::new(5.0, f64::NAN)));
    }

    #[test]
    fn rejects_degenerate_rings() {
        assert!(Polygon::from_pairs(&[(0.0, 0.0), (1.0, 1.0)]).is_err());
        assert!(Polygon::from_pairs(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]).is_err());
        assert!(Polygon::from_pairs(&[(0.0, 0.0), (f64::NAN, 1.0), (2.0, 0.0)]).is_err());
    }

    #[test]
    fn scaled_polygon_keeps_membership() {
        let poly = square();
        let big = poly.scaled(4.0, 2.0).unwrap();
        assert!(big.contains(Point2D::new(20.0, 10.0)));
        assert!(!big.contains(Point2D::new(41.0, 10.0)));
        assert_eq!(big.vertices()[2], Point2D::new(40.0, 20.0));
    }
}
