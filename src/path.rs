use std::f64::consts::PI;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::pattern::{BreathPattern, Phase};

/// Logical coordinate space the breath curve is generated in. Marker
/// positions are scaled from this box to the rendered viewport size.
pub const VIEW_BOX: Viewport = Viewport {
    width: 400.0,
    height: 220.0,
};

const EDGE_INSET: f64 = 20.0;
const BASELINE_OFFSET: f64 = 30.0;
const PEAK_Y: f64 = 40.0;

/// Rendered viewports narrower than this get a coarser, flatter curve.
const CONSTRAINED_WIDTH: f64 = 480.0;

const SPLINE_SUBDIVISIONS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Rendered size of the drawing surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn is_constrained(&self) -> bool {
        self.width < CONSTRAINED_WIDTH
    }
}

struct CurveParams {
    samples: usize,
    tension: f64,
    hold_top_amp: f64,
    hold_bottom_amp: f64,
}

impl CurveParams {
    fn for_viewport(viewport: &Viewport) -> Self {
        if viewport.is_constrained() {
            Self {
                samples: 30,
                tension: 0.35,
                hold_top_amp: 1.2,
                hold_bottom_amp: 0.6,
            }
        } else {
            Self {
                samples: 50,
                tension: 0.5,
                hold_top_amp: 2.0,
                hold_bottom_amp: 1.0,
            }
        }
    }
}

/// Cached curve for one full breath cycle, with an arc-length table so cycle
/// progress maps to a point by distance traveled along the curve.
#[derive(Debug, Clone)]
pub struct PathGeometry {
    points: Vec<Point>,
    cumulative: Vec<f64>,
    total_len: f64,
}

impl PathGeometry {
    /// Builds the curve for `pattern` in viewBox coordinates. The rendered
    /// viewport only selects the sampling density and wobble amplitudes;
    /// pixel mapping happens later in [`PathGeometry::to_pixels`].
    pub fn build(pattern: &BreathPattern, viewport: &Viewport) -> Self {
        let start_x = EDGE_INSET;
        let end_x = VIEW_BOX.width - EDGE_INSET;
        let base_y = VIEW_BOX.height - BASELINE_OFFSET;

        if pattern.is_degenerate() {
            // Flat two-point line; no smoothing so the degenerate shape stays
            // exactly two points.
            let points = vec![
                Point { x: start_x, y: base_y },
                Point { x: end_x, y: base_y },
            ];
            return Self::from_points(points);
        }

        let params = CurveParams::for_viewport(viewport);
        let total = pattern.total_secs();
        let mut control = Vec::with_capacity(params.samples + 1);

        for i in 0..=params.samples {
            let progress = i as f64 / params.samples as f64;
            let x = start_x + (end_x - start_x) * progress;
            let (phase, phase_progress) = phase_at(pattern, progress * total);

            let y = match phase {
                Phase::Inhale => base_y - (base_y - PEAK_Y) * ease_in_out_quad(phase_progress),
                Phase::HoldHigh => PEAK_Y + (phase_progress * PI * 4.0).sin() * params.hold_top_amp,
                Phase::Exhale => PEAK_Y + (base_y - PEAK_Y) * ease_in_out_quad(phase_progress),
                Phase::HoldLow => {
                    base_y + (phase_progress * PI * 3.0).sin() * params.hold_bottom_amp
                }
            };

            control.push(Point { x, y });
        }

        let smoothed = cardinal_spline(&control, params.tension);
        debug!(
            "rebuilt breath path: {} control points, {} smoothed, constrained={}",
            control.len(),
            smoothed.len(),
            viewport.is_constrained()
        );
        Self::from_points(smoothed)
    }

    fn from_points(points: Vec<Point>) -> Self {
        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                total += points[i - 1].distance(*p);
            }
            cumulative.push(total);
        }
        Self {
            points,
            cumulative,
            total_len: total,
        }
    }

    pub fn total_len(&self) -> f64 {
        self.total_len
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Point at `distance` along the curve, clamped to the curve's ends.
    /// Returns `None` when the geometry is unusable (fewer than two points or
    /// zero length); callers treat that as "no position update this frame".
    pub fn point_at_length(&self, distance: f64) -> Option<Point> {
        if self.points.len() < 2 || self.total_len <= 0.0 {
            return None;
        }
        let d = distance.clamp(0.0, self.total_len);
        let idx = self
            .cumulative
            .partition_point(|&len| len < d)
            .clamp(1, self.points.len() - 1);

        let seg_start = self.cumulative[idx - 1];
        let seg_len = self.cumulative[idx] - seg_start;
        let t = if seg_len > 0.0 { (d - seg_start) / seg_len } else { 0.0 };

        let a = self.points[idx - 1];
        let b = self.points[idx];
        Some(Point {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        })
    }

    /// Maps a viewBox-space point to pixel space for the rendered viewport.
    pub fn to_pixels(point: Point, viewport: &Viewport) -> Point {
        Point {
            x: point.x * viewport.width / VIEW_BOX.width,
            y: point.y * viewport.height / VIEW_BOX.height,
        }
    }
}

/// Which phase a cycle time falls into, plus normalized progress within it.
fn phase_at(pattern: &BreathPattern, target_time: f64) -> (Phase, f64) {
    let mut accumulated = 0.0;
    for phase in Phase::ALL {
        let duration = pattern.duration(phase);
        if target_time <= accumulated + duration {
            let progress = if duration > 0.0 {
                (target_time - accumulated) / duration
            } else {
                0.0
            };
            return (phase, progress);
        }
        accumulated += duration;
    }
    (Phase::HoldLow, 1.0)
}

/// Ease-in-out quadratic: `2x²` below the midpoint, mirrored above it.
pub fn ease_in_out_quad(x: f64) -> f64 {
    if x < 0.5 {
        2.0 * x * x
    } else {
        1.0 - (-2.0 * x + 2.0).powi(2) / 2.0
    }
}

/// Cardinal-spline smoothing: Hermite interpolation between consecutive
/// control points with tangents scaled by `tension` (0.5 is Catmull-Rom;
/// smaller values hug the control polygon more tightly).
fn cardinal_spline(control: &[Point], tension: f64) -> Vec<Point> {
    if control.len() < 3 {
        return control.to_vec();
    }

    let mut out = Vec::with_capacity((control.len() - 1) * SPLINE_SUBDIVISIONS + 1);
    out.push(control[0]);

    for i in 0..control.len() - 1 {
        let p0 = control[i.saturating_sub(1)];
        let p1 = control[i];
        let p2 = control[i + 1];
        let p3 = control[(i + 2).min(control.len() - 1)];

        let m1 = Point {
            x: tension * (p2.x - p0.x),
            y: tension * (p2.y - p0.y),
        };
        let m2 = Point {
            x: tension * (p3.x - p1.x),
            y: tension * (p3.y - p1.y),
        };

        for step in 1..=SPLINE_SUBDIVISIONS {
            let t = step as f64 / SPLINE_SUBDIVISIONS as f64;
            let t2 = t * t;
            let t3 = t2 * t;
            let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
            let h10 = t3 - 2.0 * t2 + t;
            let h01 = -2.0 * t3 + 3.0 * t2;
            let h11 = t3 - t2;
            out.push(Point {
                x: h00 * p1.x + h10 * m1.x + h01 * p2.x + h11 * m2.x,
                y: h00 * p1.y + h10 * m1.y + h01 * p2.y + h11 * m2.y,
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{BreathPattern, PatternId};

    const WIDE: Viewport = Viewport {
        width: 800.0,
        height: 440.0,
    };
    const NARROW: Viewport = Viewport {
        width: 360.0,
        height: 200.0,
    };

    #[test]
    fn degenerate_pattern_is_a_two_point_flat_line() {
        let p = BreathPattern::new([0.0; 4], ["", "", "", ""]);
        let geometry = PathGeometry::build(&p, &WIDE);
        assert_eq!(geometry.point_count(), 2);
        assert!(geometry.total_len() > 0.0);
        let start = geometry.point_at_length(0.0).unwrap();
        let end = geometry.point_at_length(geometry.total_len()).unwrap();
        assert_eq!(start.y, end.y);
    }

    #[test]
    fn curve_starts_at_baseline_and_reaches_the_peak() {
        let geometry = PathGeometry::build(&PatternId::Box.preset(), &WIDE);
        let base_y = VIEW_BOX.height - 30.0;

        let start = geometry.point_at_length(0.0).unwrap();
        assert!((start.y - base_y).abs() < 1.0);

        // The upper hold should sit near the peak height, within the wobble
        // amplitude plus spline overshoot.
        let mut min_y = f64::INFINITY;
        for i in 0..=200 {
            let d = geometry.total_len() * i as f64 / 200.0;
            min_y = min_y.min(geometry.point_at_length(d).unwrap().y);
        }
        assert!((min_y - 40.0).abs() < 6.0, "min_y = {}", min_y);
    }

    #[test]
    fn constrained_viewport_uses_fewer_samples() {
        let pattern = PatternId::Box.preset();
        let wide = PathGeometry::build(&pattern, &WIDE);
        let narrow = PathGeometry::build(&pattern, &NARROW);
        assert!(narrow.point_count() < wide.point_count());
    }

    #[test]
    fn point_at_length_clamps_out_of_range_lookups() {
        let geometry = PathGeometry::build(&PatternId::Box.preset(), &WIDE);
        let before = geometry.point_at_length(-5.0).unwrap();
        let after = geometry.point_at_length(geometry.total_len() + 5.0).unwrap();
        assert_eq!(before.x, EDGE_INSET);
        assert!((after.x - (VIEW_BOX.width - EDGE_INSET)).abs() < 1e-9);
    }

    #[test]
    fn x_advances_with_arc_length() {
        let geometry = PathGeometry::build(&PatternId::Relax.preset(), &WIDE);
        let mut last_x = f64::NEG_INFINITY;
        for i in 0..=20 {
            let d = geometry.total_len() * i as f64 / 20.0;
            let p = geometry.point_at_length(d).unwrap();
            assert!(p.x >= last_x - 1.0, "x regressed at sample {}", i);
            last_x = p.x;
        }
    }

    #[test]
    fn pixel_mapping_scales_by_viewport_ratio() {
        let p = Point { x: 200.0, y: 110.0 };
        let px = PathGeometry::to_pixels(p, &WIDE);
        assert_eq!(px.x, 400.0);
        assert_eq!(px.y, 220.0);
    }

    #[test]
    fn easing_endpoints_and_midpoint() {
        assert_eq!(ease_in_out_quad(0.0), 0.0);
        assert_eq!(ease_in_out_quad(0.5), 0.5);
        assert_eq!(ease_in_out_quad(1.0), 1.0);
        assert!(ease_in_out_quad(0.25) < 0.25);
        assert!(ease_in_out_quad(0.75) > 0.75);
    }
}
