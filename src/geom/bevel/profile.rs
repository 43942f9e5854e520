//! Profile curves: the 2D cross-section of a bevel and its placement in 3D.
//!
//! Profiles live in the unit square: `(0, 1)` is the start, `(1, 0)` the end and the
//! superellipse `x^r + y^r = 1` bulges toward `(1, 1)` for `r > 1`. Samples are spaced by
//! equal chord length, then mapped into 3D with an affine map built from the profile's
//! start, middle and end control points and finally projected onto the profile plane.

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, SQRT_2};

use crate::geom::core::{Tolerance, Transform, Vec3, intersect_line_plane};

use super::options::{BevelParams, VMeshMethod};

pub(crate) const PRO_SQUARE_R: f64 = 1e4;
pub(crate) const PRO_CIRCLE_R: f64 = 2.0;
pub(crate) const PRO_LINE_R: f64 = 1.0;
pub(crate) const PRO_SQUARE_IN_R: f64 = 0.0;

const BEVEL_EPSILON_ANG: f64 = 2.0 * std::f64::consts::PI / 180.0;

/// Point on the superellipse at parameter `x`, mirrored across `y = x` when `!rbig`.
fn superellipse_co(x: f64, r: f64, rbig: bool) -> f64 {
    if rbig {
        (1.0 - x.powf(r)).powf(1.0 / r)
    } else {
        1.0 - (1.0 - (1.0 - x).powf(r)).powf(1.0 / r)
    }
}

/// Find `x` such that the chord from `(x0, y(x0))` to `(x, y(x))` has length `dtarget`,
/// by Illinois-style false position.
fn superellipse_chord_endpoint(x0: f64, dtarget: f64, r: f64, rbig: bool) -> f64 {
    const TOL: f64 = 1e-13;
    const MAX_ITER: usize = 10;

    let y0 = superellipse_co(x0, r, rbig);
    let chord_err = |x: f64| {
        let y = superellipse_co(x, r, rbig);
        (x - x0).hypot(y - y0) - dtarget
    };

    // With slopes in [-1, 1] the answer lies in [x0 + d/sqrt(2), x0 + d].
    let mut xmin = (x0 + FRAC_1_SQRT_2 * dtarget).min(1.0);
    let mut xmax = (x0 + dtarget).min(1.0);
    let mut dmaxerr = chord_err(xmax);
    let mut dminerr = chord_err(xmin);

    let mut xnew = xmax - dmaxerr * (xmax - xmin) / (dmaxerr - dminerr);
    let mut last_updated_upper = true;
    for _ in 0..MAX_ITER {
        let dnewerr = chord_err(xnew);
        if dnewerr.abs() < TOL {
            break;
        }
        if dnewerr < 0.0 {
            xmin = xnew;
            dminerr = dnewerr;
            xnew = if last_updated_upper {
                xmax - dmaxerr * (xmax - xmin) / (dmaxerr - dminerr)
            } else {
                (dmaxerr / 2.0 * xmin - dminerr * xmax) / (dmaxerr / 2.0 - dminerr)
            };
            last_updated_upper = false;
        } else {
            xmax = xnew;
            dmaxerr = dnewerr;
            xnew = if last_updated_upper {
                (dmaxerr * xmin - dminerr / 2.0 * xmax) / (dmaxerr - dminerr / 2.0)
            } else {
                xmax - dmaxerr * (xmax - xmin) / (dmaxerr - dminerr)
            };
            last_updated_upper = true;
        }
    }
    xnew
}

/// Equal-chord samples for a general exponent. Only half the curve is searched; the
/// rest is mirrored across `y = x`.
fn even_chords_general(seg: usize, r: f64) -> (Vec<f64>, Vec<f64>) {
    const SMOOTH_ITER_MAX: usize = 10;
    const ERROR_TOL: f64 = 1e-7;

    let mut xs = vec![0.0; seg + 1];
    let mut ys = vec![0.0; seg + 1];
    let imax = seg.div_ceil(2) - 1;
    let seg_odd = seg % 2 == 1;

    let rbig = r > 1.0;
    let mx = if rbig { 0.5f64.powf(1.0 / r) } else { 1.0 - 0.5f64.powf(1.0 / r) };

    for i in 0..=imax {
        xs[i] = i as f64 * mx / seg as f64 * 2.0;
        ys[i] = superellipse_co(xs[i], r, rbig);
    }
    ys[0] = 1.0;

    for _ in 0..SMOOTH_ITER_MAX {
        let mut sum = 0.0;
        let mut dmin: f64 = 2.0;
        let mut dmax: f64 = 0.0;
        for i in 0..imax {
            let d = (xs[i + 1] - xs[i]).hypot(ys[i + 1] - ys[i]);
            sum += d;
            dmax = dmax.max(d);
            dmin = dmin.min(d);
        }
        let davg = if seg_odd {
            sum += FRAC_1_SQRT_2 * (ys[imax] - xs[imax]);
            sum / (imax as f64 + 0.5)
        } else {
            sum += (xs[imax] - mx).hypot(ys[imax] - mx);
            sum / (imax as f64 + 1.0)
        };
        if dmax - davg <= ERROR_TOL && davg - dmin <= ERROR_TOL {
            break;
        }
        for i in 1..=imax {
            xs[i] = superellipse_chord_endpoint(xs[i - 1], davg, r, rbig);
            ys[i] = superellipse_co(xs[i], r, rbig);
        }
    }

    if !seg_odd {
        xs[imax + 1] = mx;
        ys[imax + 1] = mx;
    }
    for i in imax + 1..=seg {
        ys[i] = xs[seg - i];
        xs[i] = ys[seg - i];
    }

    if !rbig {
        for i in 0..=seg {
            let x = xs[i];
            xs[i] = 1.0 - ys[i];
            ys[i] = 1.0 - x;
        }
    }
    (xs, ys)
}

/// `n + 1` points on the superellipse with exponent `r`, evenly spaced by chord length,
/// from `(0, 1)` to `(1, 0)`.
#[must_use]
pub fn even_superellipse_chords(n: usize, r: f64) -> (Vec<f64>, Vec<f64>) {
    let n = n.max(1);
    let seg_odd = n % 2 == 1;
    let n2 = n / 2;
    let mut xs = vec![0.0; n + 1];
    let mut ys = vec![0.0; n + 1];

    if r == PRO_LINE_R {
        for i in 0..=n {
            xs[i] = i as f64 / n as f64;
            ys[i] = 1.0 - i as f64 / n as f64;
        }
    } else if r == PRO_CIRCLE_R {
        let step = FRAC_PI_2 / n as f64;
        for i in 0..=n {
            xs[i] = (i as f64 * step).sin();
            ys[i] = (i as f64 * step).cos();
        }
    } else if r == PRO_SQUARE_IN_R || r == PRO_SQUARE_R {
        // Straight legs, with one diagonal chord across the corner when n is odd.
        let step = if seg_odd {
            1.0 / (n2 as f64 + SQRT_2 / 2.0)
        } else {
            1.0 / n2 as f64
        };
        for i in 0..=n2 {
            if r == PRO_SQUARE_R {
                xs[i] = i as f64 * step;
                ys[i] = 1.0;
            } else {
                xs[i] = 0.0;
                ys[i] = 1.0 - i as f64 * step;
            }
            xs[n - i] = ys[i];
            ys[n - i] = xs[i];
        }
    } else {
        return even_chords_general(n, r);
    }
    (xs, ys)
}

/// Sample tables shared by every profile of one bevel run.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProfileSpacing {
    pub xvals: Vec<f64>,
    pub yvals: Vec<f64>,
    /// Samples for `seg_2`, the power of two `>= max(seg, 4)` used by subdivision.
    pub xvals_2: Vec<f64>,
    pub yvals_2: Vec<f64>,
    pub seg_2: usize,
    /// How far the profile bulges out, used to place the center of a vertex patch.
    pub fullness: f64,
}

impl ProfileSpacing {
    /// Empty for a single segment; profiles are then straight.
    pub fn new(params: &BevelParams, use_custom: bool) -> Self {
        let seg = params.seg;
        if seg <= 1 {
            return Self::default();
        }
        let seg_2 = seg.next_power_of_two().max(4);
        let sample = |n: usize| match (&params.custom_profile, use_custom) {
            (Some(custom), true) => custom.sample(n),
            _ => even_superellipse_chords(n, params.pro_super_r),
        };
        let (xvals, yvals) = sample(seg);
        let (xvals_2, yvals_2) = if seg_2 == seg {
            (xvals.clone(), yvals.clone())
        } else {
            sample(seg_2)
        };
        Self {
            xvals,
            yvals,
            xvals_2,
            yvals_2,
            seg_2,
            fullness: 0.0,
        }
    }
}

/// Fullness fitted to make a cube corner closest to a sphere, or the mean sample height
/// of a custom profile.
pub(crate) fn profile_fullness(params: &BevelParams, spacing: &ProfileSpacing) -> f64 {
    const CIRCLE_FULLNESS: [f64; 11] = [
        0.0, 0.559, 0.642, 0.551, 0.646, 0.624, 0.646, 0.619, 0.647, 0.639, 0.647,
    ];
    let nseg = params.seg;
    if params.is_custom() {
        if spacing.xvals.len() < nseg {
            return 0.0;
        }
        return (0..nseg)
            .map(|i| (spacing.xvals[i] + spacing.yvals[i]) / (2.0 * nseg as f64))
            .sum();
    }
    let r = params.pro_super_r;
    if r == PRO_LINE_R {
        0.0
    } else if r == PRO_CIRCLE_R && (1..=CIRCLE_FULLNESS.len()).contains(&nseg) {
        CIRCLE_FULLNESS[nseg - 1]
    } else if nseg % 2 == 0 {
        2.4506 * params.profile - 0.000_003 * nseg as f64 - 0.6266
    } else {
        2.3635 * params.profile + 0.000_152 * nseg as f64 - 0.6060
    }
}

/// Affine map taking the unit square corners `(0,1,0)`, `(1,1,0)`, `(1,0,0)` to `va`,
/// `vmid`, `vb`, and `(0,1,1)` one unit off the parallelogram plane.
/// `None` when the parallelogram is degenerate.
pub(crate) fn unit_square_map(va: Vec3, vmid: Vec3, vb: Vec3) -> Option<Transform> {
    let va_vmid = vmid - va;
    let vb_vmid = vmid - vb;
    if Tolerance::ZERO_LENGTH.is_zero_vec3(va_vmid) || Tolerance::ZERO_LENGTH.is_zero_vec3(vb_vmid)
    {
        return None;
    }
    if (va_vmid.angle_to(vb_vmid) - std::f64::consts::PI).abs() <= BEVEL_EPSILON_ANG {
        return None;
    }
    let vo = va - vb_vmid;
    let vd = vo + vb_vmid.cross(va_vmid).normalize_or_zero().0;
    Some(Transform::from_axes(
        va + vb - vmid,
        vmid - va,
        vmid - vb,
        vmid + vd - va - vb,
    ))
}

/// Affine map taking `(1,0,0)`, `(0,1,0)`, `(0,0,1)`, `(1,1,1)` to `va`, `vb`, `vc`, `vd`.
pub(crate) fn unit_cube_map(va: Vec3, vb: Vec3, vc: Vec3, vd: Vec3) -> Transform {
    Transform::from_axes(
        (va + vb + vc - vd) * 0.5,
        (va - vb - vc + vd) * 0.5,
        (vb - va - vc + vd) * 0.5,
        (vc - va - vb + vd) * 0.5,
    )
}

/// Snap a direction onto the superellipsoid `x^r + y^r + z^r = 1` in the positive octant.
/// For the square shapes only 2D input is expected; `midline` snaps to both legs.
pub(crate) fn snap_to_superellipsoid(co: Vec3, r: f64, midline: bool) -> Vec3 {
    if r == PRO_CIRCLE_R {
        return co.normalize_or_zero().0;
    }
    let a = co.x.max(0.0);
    let b = co.y.max(0.0);
    let c = co.z.max(0.0);

    if r == PRO_SQUARE_R || r == PRO_SQUARE_IN_R {
        let mut x = a.min(1.0);
        let mut y = b.min(1.0);
        if r == PRO_SQUARE_R {
            if 1.0 - x < 1.0 - y {
                x = 1.0;
                if midline {
                    y = 1.0;
                }
            } else {
                y = 1.0;
                if midline {
                    x = 1.0;
                }
            }
        } else if x < y {
            x = 0.0;
            if midline {
                y = 0.0;
            }
        } else {
            y = 0.0;
            if midline {
                x = 0.0;
            }
        }
        return Vec3::new(x, y, 0.0);
    }

    let rinv = 1.0 / r;
    if a == 0.0 {
        if b == 0.0 {
            Vec3::new(0.0, 0.0, c.powf(rinv))
        } else {
            let y = (1.0 / (1.0 + (c / b).powf(r))).powf(rinv);
            Vec3::new(0.0, y, c * y / b)
        }
    } else {
        let x = (1.0 / (1.0 + (b / a).powf(r) + (c / a).powf(r))).powf(rinv);
        Vec3::new(x, b * x / a, c * x / a)
    }
}

/// Profile between a boundary point and the next one around the vertex patch.
#[derive(Debug, Clone)]
pub(crate) struct Profile {
    pub super_r: f64,
    /// Height of the cutoff side faces.
    pub height: f64,
    pub start: Vec3,
    pub middle: Vec3,
    pub end: Vec3,
    pub plane_no: Vec3,
    pub plane_co: Vec3,
    /// Projection direction onto the plane; zero means no projection.
    pub proj_dir: Vec3,
    /// `seg + 1` points.
    pub prof_co: Vec<Vec3>,
    /// `seg_2 + 1` points.
    pub prof_co_2: Vec<Vec3>,
    /// Parameters were set by a special case and must not be recomputed.
    pub special_params: bool,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            super_r: PRO_LINE_R,
            height: 0.0,
            start: Vec3::ZERO,
            middle: Vec3::ZERO,
            end: Vec3::ZERO,
            plane_no: Vec3::ZERO,
            plane_co: Vec3::ZERO,
            proj_dir: Vec3::ZERO,
            prof_co: Vec::new(),
            prof_co_2: Vec::new(),
            special_params: false,
        }
    }
}

impl Profile {
    /// Compute the 3D sample points. No-op for a single segment.
    pub fn calculate(
        &mut self,
        params: &BevelParams,
        spacing: &ProfileSpacing,
        seg_2: usize,
        reversed: bool,
    ) {
        let seg = params.seg;
        if seg == 1 {
            return;
        }
        let map = if !params.is_custom() && self.super_r == PRO_LINE_R {
            None
        } else {
            unit_square_map(self.start, self.middle, self.end)
        };

        if params.vmesh_method == VMeshMethod::Cutoff {
            if let Some(map) = map {
                let bottom = map.apply_point(Vec3::ZERO);
                let top = map.apply_point(Vec3::new(1.0, 1.0, 0.0));
                self.height = bottom.distance(top);
            }
        }

        self.prof_co = self.segment_points(map, reversed, seg, &spacing.xvals, &spacing.yvals);
        self.prof_co_2 = if seg_2 == seg {
            self.prof_co.clone()
        } else {
            self.segment_points(map, reversed, seg_2, &spacing.xvals_2, &spacing.yvals_2)
        };
    }

    fn segment_points(
        &self,
        map: Option<Transform>,
        reversed: bool,
        ns: usize,
        xvals: &[f64],
        yvals: &[f64],
    ) -> Vec<Vec3> {
        (0..=ns)
            .map(|k| {
                let co = if k == 0 {
                    self.start
                } else if k == ns {
                    self.end
                } else if let Some(map) = map {
                    let p = if reversed {
                        Vec3::new(yvals[ns - k], xvals[ns - k], 0.0)
                    } else {
                        Vec3::new(xvals[k], yvals[k], 0.0)
                    };
                    map.apply_point(p)
                } else {
                    self.start.lerp(self.end, k as f64 / ns as f64)
                };
                if Tolerance::ZERO_LENGTH.is_zero_vec3(self.proj_dir) {
                    co
                } else {
                    intersect_line_plane(co, co + self.proj_dir, self.plane_co, self.plane_no)
                        .unwrap_or(co)
                }
            })
            .collect()
    }

    /// Point `i` of `nseg`, where `nseg` is either the run's segment count or a power of
    /// two no larger than `seg_2`.
    pub fn point(&self, params: &BevelParams, seg_2: usize, i: usize, nseg: usize) -> Vec3 {
        if params.seg == 1 {
            return if i == 0 { self.start } else { self.end };
        }
        if nseg == params.seg {
            return self.prof_co[i];
        }
        let stride = seg_2 / nseg.max(1);
        self.prof_co_2[i * stride]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chords(xs: &[f64], ys: &[f64]) -> Vec<f64> {
        xs.windows(2)
            .zip(ys.windows(2))
            .map(|(x, y)| (x[1] - x[0]).hypot(y[1] - y[0]))
            .collect()
    }

    #[test]
    fn circle_samples_lie_on_unit_circle() {
        let (xs, ys) = even_superellipse_chords(5, PRO_CIRCLE_R);
        for (x, y) in xs.iter().zip(&ys) {
            assert!((x.hypot(*y) - 1.0).abs() < 1e-12);
        }
        assert!(xs[0].abs() < 1e-12 && (ys[0] - 1.0).abs() < 1e-12);
        assert!((xs[5] - 1.0).abs() < 1e-12 && ys[5].abs() < 1e-12);
    }

    #[test]
    fn general_exponent_gives_even_chords() {
        for &r in &[1.5, 3.0, 0.6] {
            for n in [4, 5, 8] {
                let (xs, ys) = even_superellipse_chords(n, r);
                assert_eq!(xs.len(), n + 1);
                assert!(xs[0].abs() < 1e-9 && (ys[0] - 1.0).abs() < 1e-9);
                assert!((xs[n] - 1.0).abs() < 1e-9 && ys[n].abs() < 1e-9);
                let d = chords(&xs, &ys);
                let max = d.iter().copied().fold(f64::MIN, f64::max);
                let min = d.iter().copied().fold(f64::MAX, f64::min);
                assert!(max - min < 1e-3, "r={r} n={n} spread {}", max - min);
            }
        }
    }

    #[test]
    fn square_even_and_odd() {
        let (xs, ys) = even_superellipse_chords(4, PRO_SQUARE_R);
        assert_eq!(xs, vec![0.0, 0.5, 1.0, 1.0, 1.0]);
        assert_eq!(ys, vec![1.0, 1.0, 1.0, 0.5, 0.0]);

        let (xs, ys) = even_superellipse_chords(3, PRO_SQUARE_IN_R);
        assert_eq!(xs[0], 0.0);
        assert_eq!(ys[3], 0.0);
        assert!(xs[1].abs() < 1e-12);
        let corner_chord = (xs[2] - xs[1]).hypot(ys[2] - ys[1]);
        let leg = 1.0 - ys[1];
        assert!((corner_chord - leg).abs() < 1e-12);
    }

    #[test]
    fn unit_square_map_hits_control_points() {
        let va = Vec3::new(0.0, 1.0, 0.0);
        let vmid = Vec3::new(0.0, 0.0, 0.0);
        let vb = Vec3::new(1.0, 0.0, 0.0);
        let map = unit_square_map(va, vmid, vb).expect("non-degenerate");
        assert!(Tolerance::BEVEL.approx_eq_vec3(map.apply_point(Vec3::new(0.0, 1.0, 0.0)), va));
        assert!(Tolerance::BEVEL.approx_eq_vec3(map.apply_point(Vec3::new(1.0, 1.0, 0.0)), vmid));
        assert!(Tolerance::BEVEL.approx_eq_vec3(map.apply_point(Vec3::new(1.0, 0.0, 0.0)), vb));
        assert!(unit_square_map(va, va, vb).is_none());
    }

    #[test]
    fn unit_cube_map_hits_corners() {
        let va = Vec3::new(2.0, 0.0, 0.0);
        let vb = Vec3::new(0.0, 2.0, 0.0);
        let vc = Vec3::new(0.0, 0.0, 2.0);
        let vd = Vec3::new(1.0, 1.0, 1.0);
        let map = unit_cube_map(va, vb, vc, vd);
        assert!(Tolerance::BEVEL.approx_eq_vec3(map.apply_point(Vec3::X), va));
        assert!(Tolerance::BEVEL.approx_eq_vec3(map.apply_point(Vec3::Y), vb));
        assert!(Tolerance::BEVEL.approx_eq_vec3(map.apply_point(Vec3::Z), vc));
        assert!(Tolerance::BEVEL.approx_eq_vec3(map.apply_point(Vec3::splat(1.0)), vd));
    }

    #[test]
    fn superellipsoid_snap_lands_on_surface() {
        let r = 3.0;
        let p = snap_to_superellipsoid(Vec3::new(0.3, 0.5, 0.2), r, false);
        let s = p.x.powf(r) + p.y.powf(r) + p.z.powf(r);
        assert!((s - 1.0).abs() < 1e-9);
        let q = snap_to_superellipsoid(Vec3::new(0.9, 0.3, 0.0), PRO_SQUARE_R, false);
        assert_eq!(q, Vec3::new(1.0, 0.3, 0.0));
        let m = snap_to_superellipsoid(Vec3::new(0.9, 0.3, 0.0), PRO_SQUARE_R, true);
        assert_eq!(m, Vec3::new(1.0, 1.0, 0.0));
    }
}
