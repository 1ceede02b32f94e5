//! Link curve geometry and hit-testing.

use egui::epaint::CubicBezierShape;
use egui::{Color32, Painter, Pos2, Stroke, Vec2};

/// Number of straight segments used when measuring distance to a curve.
const HIT_SEGMENTS: usize = 32;

/// Control points of the curve between `src` and `dst`. Both control points
/// are pushed out horizontally by half the horizontal distance, but never by
/// less than `min_bend`, which keeps backwards links readable.
pub fn link_points(src: Pos2, dst: Pos2, min_bend: f32) -> [Pos2; 4] {
    let control_scale = ((dst.x - src.x).abs() / 2.0).max(min_bend);
    let src_control = src + Vec2::X * control_scale;
    let dst_control = dst - Vec2::X * control_scale;
    [src, src_control, dst_control, dst]
}

/// Evaluates the cubic bezier defined by `points` at `t` in `[0, 1]`.
pub fn sample(points: &[Pos2; 4], t: f32) -> Pos2 {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Pos2::new(
        a * points[0].x + b * points[1].x + c * points[2].x + d * points[3].x,
        a * points[0].y + b * points[1].y + c * points[2].y + d * points[3].y,
    )
}

fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Approximate distance from `p` to the curve.
pub fn distance_to_curve(p: Pos2, points: &[Pos2; 4]) -> f32 {
    let mut prev = points[0];
    let mut best = f32::INFINITY;
    for i in 1..=HIT_SEGMENTS {
        let next = sample(points, i as f32 / HIT_SEGMENTS as f32);
        best = best.min(distance_to_segment(p, prev, next));
        prev = next;
    }
    best
}

/// True if `p` lies within `radius` of the link curve between `src` and `dst`.
pub fn link_hit(p: Pos2, src: Pos2, dst: Pos2, min_bend: f32, radius: f32) -> bool {
    distance_to_curve(p, &link_points(src, dst, min_bend)) < radius
}

pub fn draw_link(painter: &Painter, src: Pos2, dst: Pos2, min_bend: f32, stroke: Stroke) {
    let bezier = CubicBezierShape::from_points_stroke(
        link_points(src, dst, min_bend),
        false,
        Color32::TRANSPARENT,
        stroke,
    );
    painter.add(bezier);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_passes_through_endpoints() {
        let points = link_points(Pos2::new(0.0, 0.0), Pos2::new(100.0, 50.0), 30.0);
        assert_eq!(sample(&points, 0.0), points[0]);
        assert!(sample(&points, 1.0).distance(points[3]) < 1e-4);
    }

    #[test]
    fn control_points_scale_with_horizontal_distance() {
        let near = link_points(Pos2::ZERO, Pos2::new(10.0, 80.0), 30.0);
        assert_eq!(near[1], Pos2::new(30.0, 0.0));
        let far = link_points(Pos2::ZERO, Pos2::new(200.0, 80.0), 30.0);
        assert_eq!(far[1], Pos2::new(100.0, 0.0));
        assert_eq!(far[2], Pos2::new(100.0, 80.0));
    }

    #[test]
    fn hit_test_tolerance() {
        let src = Pos2::new(0.0, 0.0);
        let dst = Pos2::new(100.0, 0.0);
        // Straight horizontal curve.
        assert!(link_hit(Pos2::new(50.0, 2.0), src, dst, 30.0, 2.5));
        assert!(!link_hit(Pos2::new(50.0, 10.0), src, dst, 30.0, 2.5));
    }

    #[test]
    fn degenerate_segment_distance() {
        let p = Pos2::new(3.0, 4.0);
        assert_eq!(distance_to_segment(p, Pos2::ZERO, Pos2::ZERO), 5.0);
    }
}
