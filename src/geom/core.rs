use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

// ─────────────────────────────────────────────────────────────────────────────
// Vec3
// ─────────────────────────────────────────────────────────────────────────────

/// A 3D vector, also used for positions.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Vector with all three components set to `v`.
    #[must_use]
    pub const fn splat(v: f64) -> Self {
        Self::new(v, v, v)
    }

    #[must_use]
    pub const fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Component by axis index (0 = x, 1 = y, anything else = z).
    #[must_use]
    pub const fn get(self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Copy with the component at `axis` replaced.
    #[must_use]
    pub const fn with(self, axis: usize, value: f64) -> Self {
        match axis {
            0 => Self::new(value, self.y, self.z),
            1 => Self::new(self.x, value, self.z),
            _ => Self::new(self.x, self.y, value),
        }
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    #[must_use]
    pub const fn length_squared(self) -> f64 {
        self.dot(self)
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        (self - other).length_squared()
    }

    #[must_use]
    pub const fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[must_use]
    pub const fn cross(self, rhs: Self) -> Self {
        Self {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        if len.is_finite() && len > 0.0 {
            Some(self / len)
        } else {
            None
        }
    }

    /// Unit vector and the original length. Zero-length input yields `(ZERO, 0.0)`.
    #[must_use]
    pub fn normalize_or_zero(self) -> (Self, f64) {
        let len = self.length();
        if len.is_finite() && len > 1e-35 {
            (self / len, len)
        } else {
            (Self::ZERO, 0.0)
        }
    }

    /// Returns `self * (1 - t) + rhs * t`.
    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        Self::new(
            self.x + (rhs.x - self.x) * t,
            self.y + (rhs.y - self.y) * t,
            self.z + (rhs.z - self.z) * t,
        )
    }

    #[must_use]
    pub fn midpoint(self, rhs: Self) -> Self {
        (self + rhs) * 0.5
    }

    /// `self + dir * t`.
    #[must_use]
    pub fn madd(self, dir: Self, t: f64) -> Self {
        Self::new(self.x + dir.x * t, self.y + dir.y * t, self.z + dir.z * t)
    }

    /// Any unit vector perpendicular to `self` (which must be non-zero).
    #[must_use]
    pub fn any_orthogonal(self) -> Self {
        let axis = if self.x.abs() < self.y.abs() { Self::X } else { Self::Y };
        self.cross(axis).normalize_or_zero().0
    }

    /// Angle between two vectors in radians, robust for nearly parallel input.
    #[must_use]
    pub fn angle_to(self, other: Self) -> f64 {
        let (a, _) = self.normalize_or_zero();
        let (b, _) = other.normalize_or_zero();
        if a.dot(b) >= 0.0 {
            2.0 * safe_asin((a - b).length() / 2.0)
        } else {
            std::f64::consts::PI - 2.0 * safe_asin((a + b).length() / 2.0)
        }
    }

    #[must_use]
    pub fn min(self, rhs: Self) -> Self {
        Self::new(self.x.min(rhs.x), self.y.min(rhs.y), self.z.min(rhs.z))
    }

    #[must_use]
    pub fn max(self, rhs: Self) -> Self {
        Self::new(self.x.max(rhs.x), self.y.max(rhs.y), self.z.max(rhs.z))
    }

    #[must_use]
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(arr: [f64; 3]) -> Self {
        Self::from_array(arr)
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(v: Vec3) -> Self {
        v.to_array()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Vec3> for f64 {
    type Output = Vec3;
    fn mul(self, rhs: Vec3) -> Self::Output {
        Vec3::new(self * rhs.x, self * rhs.y, self * rhs.z)
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

fn safe_asin(v: f64) -> f64 {
    v.clamp(-1.0, 1.0).asin()
}

// ─────────────────────────────────────────────────────────────────────────────
// Transform
// ─────────────────────────────────────────────────────────────────────────────

/// Affine 4x4 transform stored row-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    m: [[f64; 4]; 4],
}

impl Transform {
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            m: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Affine map sending the unit axes to `x_axis`, `y_axis`, `z_axis` and the
    /// origin to `origin`. The axes need not be orthogonal or unit length.
    #[must_use]
    pub const fn from_axes(origin: Vec3, x_axis: Vec3, y_axis: Vec3, z_axis: Vec3) -> Self {
        Self {
            m: [
                [x_axis.x, y_axis.x, z_axis.x, origin.x],
                [x_axis.y, y_axis.y, z_axis.y, origin.y],
                [x_axis.z, y_axis.z, z_axis.z, origin.z],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// `self * other`: applies `other` first.
    #[must_use]
    pub fn compose(self, other: Self) -> Self {
        let mut result = Self::identity();
        for i in 0..4 {
            for j in 0..4 {
                result.m[i][j] = (0..4).map(|k| self.m[i][k] * other.m[k][j]).sum();
            }
        }
        result
    }

    /// Inverse by the adjugate method; `None` when the matrix is singular.
    #[must_use]
    pub fn inverse(self) -> Option<Self> {
        let m = &self.m;

        let s0 = m[0][0] * m[1][1] - m[1][0] * m[0][1];
        let s1 = m[0][0] * m[1][2] - m[1][0] * m[0][2];
        let s2 = m[0][0] * m[1][3] - m[1][0] * m[0][3];
        let s3 = m[0][1] * m[1][2] - m[1][1] * m[0][2];
        let s4 = m[0][1] * m[1][3] - m[1][1] * m[0][3];
        let s5 = m[0][2] * m[1][3] - m[1][2] * m[0][3];

        let c5 = m[2][2] * m[3][3] - m[3][2] * m[2][3];
        let c4 = m[2][1] * m[3][3] - m[3][1] * m[2][3];
        let c3 = m[2][1] * m[3][2] - m[3][1] * m[2][2];
        let c2 = m[2][0] * m[3][3] - m[3][0] * m[2][3];
        let c1 = m[2][0] * m[3][2] - m[3][0] * m[2][2];
        let c0 = m[2][0] * m[3][1] - m[3][0] * m[2][1];

        let det = s0 * c5 - s1 * c4 + s2 * c3 + s3 * c2 - s4 * c1 + s5 * c0;
        if !det.is_finite() || det.abs() < 1e-15 {
            return None;
        }
        let inv = 1.0 / det;

        Some(Self {
            m: [
                [
                    (m[1][1] * c5 - m[1][2] * c4 + m[1][3] * c3) * inv,
                    (-m[0][1] * c5 + m[0][2] * c4 - m[0][3] * c3) * inv,
                    (m[3][1] * s5 - m[3][2] * s4 + m[3][3] * s3) * inv,
                    (-m[2][1] * s5 + m[2][2] * s4 - m[2][3] * s3) * inv,
                ],
                [
                    (-m[1][0] * c5 + m[1][2] * c2 - m[1][3] * c1) * inv,
                    (m[0][0] * c5 - m[0][2] * c2 + m[0][3] * c1) * inv,
                    (-m[3][0] * s5 + m[3][2] * s2 - m[3][3] * s1) * inv,
                    (m[2][0] * s5 - m[2][2] * s2 + m[2][3] * s1) * inv,
                ],
                [
                    (m[1][0] * c4 - m[1][1] * c2 + m[1][3] * c0) * inv,
                    (-m[0][0] * c4 + m[0][1] * c2 - m[0][3] * c0) * inv,
                    (m[3][0] * s4 - m[3][1] * s2 + m[3][3] * s0) * inv,
                    (-m[2][0] * s4 + m[2][1] * s2 - m[2][3] * s0) * inv,
                ],
                [
                    (-m[1][0] * c3 + m[1][1] * c1 - m[1][2] * c0) * inv,
                    (m[0][0] * c3 - m[0][1] * c1 + m[0][2] * c0) * inv,
                    (-m[3][0] * s3 + m[3][1] * s1 - m[3][2] * s0) * inv,
                    (m[2][0] * s3 - m[2][1] * s1 + m[2][2] * s0) * inv,
                ],
            ],
        })
    }

    #[must_use]
    pub fn apply_point(self, p: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3::new(
            m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z + m[0][3],
            m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z + m[1][3],
            m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z + m[2][3],
        )
    }

    #[must_use]
    pub fn translation(self) -> Vec3 {
        Vec3::new(self.m[0][3], self.m[1][3], self.m[2][3])
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Transform {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BBox
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BBox {
    #[must_use]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), Self::expand_point))
    }

    #[must_use]
    pub fn center(self) -> Vec3 {
        self.min.midpoint(self.max)
    }

    #[must_use]
    pub fn expand_point(self, p: Vec3) -> Self {
        Self::new(self.min.min(p), self.max.max(p))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tolerance
// ─────────────────────────────────────────────────────────────────────────────

/// Named tolerances, kept in one place to avoid epsilon scatter.
///
/// - `Tolerance::DEFAULT` general comparisons (1e-9)
/// - `Tolerance::ZERO_LENGTH` degenerate vectors (1e-12)
/// - `Tolerance::BEVEL` bevel geometry: coincident points, collinearity (1e-6)
/// - `Tolerance::BEVEL_BIG` coarse bevel checks such as plane membership (1e-4)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub eps: f64,
}

impl Tolerance {
    pub const DEFAULT: Self = Self { eps: 1e-9 };
    pub const ZERO_LENGTH: Self = Self { eps: 1e-12 };
    pub const BEVEL: Self = Self { eps: 1e-6 };
    pub const BEVEL_BIG: Self = Self { eps: 1e-4 };

    #[must_use]
    pub const fn new(eps: f64) -> Self {
        Self { eps }
    }

    #[must_use]
    pub const fn eps_squared(self) -> f64 {
        self.eps * self.eps
    }

    #[must_use]
    pub fn approx_eq_vec3(self, a: Vec3, b: Vec3) -> bool {
        (a - b).length_squared() <= self.eps_squared()
    }

    #[must_use]
    pub fn is_zero_vec3(self, v: Vec3) -> bool {
        v.length_squared() <= self.eps_squared()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Geometry queries
// ─────────────────────────────────────────────────────────────────────────────

/// Angle at `b` in the corner `a`-`b`-`c`.
#[must_use]
pub fn angle_at(a: Vec3, b: Vec3, c: Vec3) -> f64 {
    (a - b).angle_to(c - b)
}

/// Result of intersecting two infinite 3D lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineIntersection {
    Parallel,
    /// The lines cross at this point.
    Point(Vec3),
    /// Skew lines: closest point on the first line, closest point on the second.
    Skew(Vec3, Vec3),
}

impl LineIntersection {
    /// Point on the first line, if the lines are not parallel.
    #[must_use]
    pub fn first(self) -> Option<Vec3> {
        match self {
            Self::Parallel => None,
            Self::Point(p) | Self::Skew(p, _) => Some(p),
        }
    }

    /// Crossing point, or the midpoint of the closest points for skew lines.
    #[must_use]
    pub fn meet(self) -> Option<Vec3> {
        match self {
            Self::Parallel => None,
            Self::Point(p) => Some(p),
            Self::Skew(p, q) => Some(p.midpoint(q)),
        }
    }
}

/// Intersect the line through `a1`,`a2` with the line through `b1`,`b2`.
#[must_use]
pub fn intersect_lines(a1: Vec3, a2: Vec3, b1: Vec3, b2: Vec3) -> LineIntersection {
    const COPLANAR_EPS: f64 = 1e-6;
    let a = a2 - a1;
    let b = b2 - b1;
    let c = b1 - a1;
    let ab = a.cross(b);
    let d = c.dot(ab);
    let div = ab.dot(ab);
    if div == 0.0 {
        return LineIntersection::Parallel;
    }
    if d.abs() <= COPLANAR_EPS {
        let cb = c.cross(b);
        return LineIntersection::Point(a1 + a * (cb.dot(ab) / div));
    }
    // Shift the second line into the plane of the first, intersect, then shift back.
    let t = ab * (d / div);
    let b1t = b1 - t;
    let b2t = b2 - t;
    let c = b1t - a1;
    let b = b2t - b1t;
    let ab = a.cross(b);
    let cb = c.cross(b);
    let denom = ab.dot(ab);
    if denom == 0.0 {
        return LineIntersection::Parallel;
    }
    let p = a1 + a * (cb.dot(ab) / denom);
    LineIntersection::Skew(p, p + t)
}

/// Closest point to `p` on the infinite line `l1`-`l2`, with its parameter
/// (0 at `l1`, 1 at `l2`).
#[must_use]
pub fn closest_on_line(p: Vec3, l1: Vec3, l2: Vec3) -> (Vec3, f64) {
    let u = l2 - l1;
    let len_sq = u.length_squared();
    let lambda = if len_sq > f64::EPSILON * f64::EPSILON {
        (p - l1).dot(u) / len_sq
    } else {
        0.0
    };
    (l1.madd(u, lambda), lambda)
}

#[must_use]
pub fn closest_on_segment(p: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let (_, lambda) = closest_on_line(p, a, b);
    if lambda <= 0.0 {
        a
    } else if lambda >= 1.0 {
        b
    } else {
        a.lerp(b, lambda)
    }
}

#[must_use]
pub fn dist_squared_to_segment(p: Vec3, a: Vec3, b: Vec3) -> f64 {
    p.distance_squared(closest_on_segment(p, a, b))
}

/// Orthogonal projection of `p` onto the plane through `plane_co` with normal `plane_no`.
#[must_use]
pub fn closest_on_plane(p: Vec3, plane_co: Vec3, plane_no: Vec3) -> Vec3 {
    let len_sq = plane_no.length_squared();
    if len_sq == 0.0 {
        return p;
    }
    p - plane_no * ((p - plane_co).dot(plane_no) / len_sq)
}

/// Intersection of the line `l1`-`l2` with a plane, `None` when they are parallel.
#[must_use]
pub fn intersect_line_plane(l1: Vec3, l2: Vec3, plane_co: Vec3, plane_no: Vec3) -> Option<Vec3> {
    let u = l2 - l1;
    let dot = plane_no.dot(u);
    if dot.abs() > f64::from(f32::EPSILON) {
        let lambda = -plane_no.dot(l1 - plane_co) / dot;
        Some(l1.madd(u, lambda))
    } else {
        None
    }
}

/// Orthonormal 2D frame of the plane with normal `normal`, used to flatten polygons.
#[must_use]
pub fn plane_frame(normal: Vec3) -> (Vec3, Vec3) {
    let n = normal.normalized().unwrap_or(Vec3::Z);
    let u = n.any_orthogonal();
    (u, n.cross(u))
}

/// Signed area of a closed 2D polygon (positive for counter-clockwise).
#[must_use]
pub fn polygon_area_2d(points: &[[f64; 2]]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        area += p[0] * q[1] - q[0] * p[1];
    }
    area * 0.5
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operators() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(2.0 * a, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(-a, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(a.with(1, 9.0), Vec3::new(1.0, 9.0, 3.0));
        assert_eq!(a.get(2), 3.0);
    }

    #[test]
    fn test_angle_to_handles_parallel_and_opposite() {
        assert!(Vec3::X.angle_to(Vec3::X * 3.0).abs() < 1e-12);
        assert!((Vec3::X.angle_to(-Vec3::X) - std::f64::consts::PI).abs() < 1e-12);
        assert!((Vec3::X.angle_to(Vec3::Y) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        let corner = angle_at(Vec3::X, Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));
        assert!((corner - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn test_transform_from_axes_inverse() {
        let t = Transform::from_axes(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 0.5),
        );
        let inv = t.inverse().expect("invertible");
        let p = Vec3::new(0.3, -0.7, 2.0);
        let back = inv.apply_point(t.apply_point(p));
        assert!(Tolerance::DEFAULT.approx_eq_vec3(p, back));
        assert_eq!(t.apply_point(Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.translation(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_transform_singular_has_no_inverse() {
        let t = Transform::from_axes(Vec3::ZERO, Vec3::X, Vec3::X, Vec3::Z);
        assert!(t.inverse().is_none());
    }

    #[test]
    fn test_intersect_lines_crossing_and_skew() {
        let hit = intersect_lines(
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert_eq!(hit, LineIntersection::Point(Vec3::ZERO));

        let skew = intersect_lines(
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, -1.0, 1.0),
            Vec3::new(0.0, 1.0, 1.0),
        );
        match skew {
            LineIntersection::Skew(p, q) => {
                assert!(Tolerance::BEVEL.approx_eq_vec3(p, Vec3::ZERO));
                assert!(Tolerance::BEVEL.approx_eq_vec3(q, Vec3::Z));
            }
            other => panic!("expected skew lines, got {other:?}"),
        }

        let parallel = intersect_lines(Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Y + Vec3::X);
        assert_eq!(parallel, LineIntersection::Parallel);
    }

    #[test]
    fn test_closest_points() {
        let (p, lambda) = closest_on_line(Vec3::new(0.5, 1.0, 0.0), Vec3::ZERO, Vec3::X * 2.0);
        assert!((lambda - 0.25).abs() < 1e-12);
        assert_eq!(p, Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(closest_on_segment(Vec3::new(5.0, 1.0, 0.0), Vec3::ZERO, Vec3::X), Vec3::X);
        let q = closest_on_plane(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::Z * 4.0);
        assert_eq!(q, Vec3::new(1.0, 2.0, 0.0));
        let hit = intersect_line_plane(Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, Vec3::Z);
        assert_eq!(hit, Some(Vec3::ZERO));
    }

    #[test]
    fn test_polygon_area_and_bbox() {
        let square = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]];
        assert!((polygon_area_2d(&square) - 4.0).abs() < 1e-12);
        let bbox = BBox::from_points([Vec3::ZERO, Vec3::new(1.0, -2.0, 3.0)]).expect("points");
        assert_eq!(bbox.min, Vec3::new(0.0, -2.0, 0.0));
        assert_eq!(bbox.center(), Vec3::new(0.5, -1.0, 1.5));
    }
}
