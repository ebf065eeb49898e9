//! Easing curves applied to tween progress

use serde::{Deserialize, Serialize};

/// Overshoot used by the `Back` curves
const BACK_OVERSHOOT: f32 = 1.701_58;

/// Easing function applied to normalized progress
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    QuartIn,
    QuartOut,
    QuartInOut,
    SineIn,
    SineOut,
    SineInOut,
    BackIn,
    BackOut,
    BackInOut,
    /// CSS-style cubic bezier with control points (x1, y1) and (x2, y2)
    CubicBezier(f32, f32, f32, f32),
}

impl Easing {
    /// Map progress `t` in `[0, 1]` onto the curve.
    ///
    /// Every curve maps 0 to 0 and 1 to 1; `Back` curves leave the range in
    /// between.
    pub fn apply(&self, t: f32) -> f32 {
        use std::f32::consts::PI;

        match *self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => 1.0 - (1.0 - t).powi(2),
            Easing::QuadInOut => in_out(t, 2),
            Easing::CubicIn => t.powi(3),
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
            Easing::CubicInOut => in_out(t, 3),
            Easing::QuartIn => t.powi(4),
            Easing::QuartOut => 1.0 - (1.0 - t).powi(4),
            Easing::QuartInOut => in_out(t, 4),
            Easing::SineIn => 1.0 - (t * PI / 2.0).cos(),
            Easing::SineOut => (t * PI / 2.0).sin(),
            Easing::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
            Easing::BackIn => back_in(t),
            Easing::BackOut => 1.0 - back_in(1.0 - t),
            Easing::BackInOut => {
                if t < 0.5 {
                    back_in(2.0 * t) / 2.0
                } else {
                    1.0 - back_in(2.0 - 2.0 * t) / 2.0
                }
            }
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(t, x1, y1, x2, y2),
        }
    }
}

/// Symmetric polynomial ease-in-out of the given degree
fn in_out(t: f32, degree: i32) -> f32 {
    if t < 0.5 {
        2f32.powi(degree - 1) * t.powi(degree)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(degree) / 2.0
    }
}

fn back_in(t: f32) -> f32 {
    let c3 = BACK_OVERSHOOT + 1.0;
    c3 * t.powi(3) - BACK_OVERSHOOT * t * t
}

/// Coarse grid used to bracket the bezier parameter before refining
const BEZIER_SEGMENTS: u32 = 16;

const BEZIER_TOLERANCE: f64 = 1e-7;

/// One axis of a unit cubic bezier in power form, endpoints fixed at 0 and 1
#[derive(Clone, Copy)]
struct BezierAxis {
    a: f64,
    b: f64,
    c: f64,
}

impl BezierAxis {
    fn new(p1: f32, p2: f32) -> Self {
        let (p1, p2) = (f64::from(p1), f64::from(p2));
        let c = 3.0 * p1;
        let b = 3.0 * (p2 - p1) - c;
        Self {
            a: 1.0 - c - b,
            b,
            c,
        }
    }

    #[inline]
    fn at(&self, s: f64) -> f64 {
        ((self.a * s + self.b) * s + self.c) * s
    }

    #[inline]
    fn slope(&self, s: f64) -> f64 {
        (3.0 * self.a * s + 2.0 * self.b) * s + self.c
    }
}

/// Find the curve parameter whose x is `t` and return its y.
///
/// The root is bracketed on a coarse grid, then refined with Newton steps
/// that fall back to halving the bracket whenever a step would leave it.
fn cubic_bezier(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    // x control points stay in [0, 1] so x(s) is monotonic, as in CSS.
    let xs = BezierAxis::new(x1.clamp(0.0, 1.0), x2.clamp(0.0, 1.0));
    let ys = BezierAxis::new(y1, y2);
    let x = f64::from(t);

    let width = 1.0 / f64::from(BEZIER_SEGMENTS);
    let mut lo = 0.0;
    for i in 1..BEZIER_SEGMENTS {
        let edge = f64::from(i) * width;
        if xs.at(edge) >= x {
            break;
        }
        lo = edge;
    }
    let mut hi = (lo + width).min(1.0);

    let (x_lo, x_hi) = (xs.at(lo), xs.at(hi));
    let mut s = lo + (hi - lo) * (x - x_lo) / (x_hi - x_lo).max(f64::EPSILON);
    for _ in 0..32 {
        let err = xs.at(s) - x;
        if err.abs() < BEZIER_TOLERANCE {
            break;
        }
        if err < 0.0 {
            lo = s;
        } else {
            hi = s;
        }
        let next = s - err / xs.slope(s);
        s = if next > lo && next < hi {
            next
        } else {
            0.5 * (lo + hi)
        };
    }

    ys.at(s) as f32
}
