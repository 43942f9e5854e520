//! Interior grids for vertex patches.
//!
//! A [`Grid`] holds positions for one patch before any mesh vertex exists. Patches with
//! more than two segments start from a coarse two-segment grid and are refined by cubic
//! subdivision with boundary rules that keep the edges on the profiles, then resampled
//! to the requested segment count. Cube corners, straight pipes and the square profile
//! have their own constructions.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, SQRT_2};

use crate::geom::core::{
    LineIntersection, Tolerance, Vec3, angle_at, closest_on_plane, closest_on_segment, intersect_lines,
};
use crate::geom::poly_mesh::PolyMesh;

use super::context::{
    BEVEL_EPSILON, BEVEL_EPSILON_ANG, BEVEL_EPSILON_BIG, BEVEL_EPSILON_SQ, BEVEL_SMALL_ANG, BevVertId,
    BevelContext, BvId,
};
use super::meet::AngleKind;
use super::profile::{
    PRO_SQUARE_IN_R, PRO_SQUARE_R, Profile, snap_to_superellipsoid, unit_cube_map, unit_square_map,
};

/// Positions for a patch of `count` sides, indexed like the patch's vertex grid:
/// `(i, j, k)` with ring `j` in `0..=seg/2` and sample `k` in `0..=seg`.
///
/// Points shared by neighbouring sides are stored once at their canonical index and
/// copied to the others by [`Grid::copy_equiv`].
#[derive(Debug, Clone)]
pub(crate) struct Grid {
    pub count: usize,
    pub seg: usize,
    co: Vec<Vec3>,
    /// Profile leaving each side's first boundary point.
    pub profiles: Vec<Profile>,
}

impl Grid {
    pub fn new(count: usize, seg: usize, profiles: Vec<Profile>) -> Self {
        Self {
            count,
            seg,
            co: vec![Vec3::ZERO; count * (seg / 2 + 1) * (seg + 1)],
            profiles,
        }
    }

    #[inline]
    fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (i * (self.seg / 2 + 1) + j) * (self.seg + 1) + k
    }

    #[inline]
    pub fn co(&self, i: usize, j: usize, k: usize) -> Vec3 {
        self.co[self.index(i, j, k)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, co: Vec3) {
        let idx = self.index(i, j, k);
        self.co[idx] = co;
    }

    /// Canonical index of `(i, j, k)` for any `j, k` in `0..=seg`.
    pub fn canon(&self, i: usize, j: usize, k: usize) -> (usize, usize, usize) {
        canon_index(self.count, self.seg, i, j, k)
    }

    pub fn canon_co(&self, i: usize, j: usize, k: usize) -> Vec3 {
        let (ci, cj, ck) = self.canon(i, j, k);
        self.co(ci, cj, ck)
    }

    pub fn set_canon(&mut self, i: usize, j: usize, k: usize, co: Vec3) {
        let (ci, cj, ck) = self.canon(i, j, k);
        self.set(ci, cj, ck, co);
    }

    pub fn is_canon(&self, i: usize, j: usize, k: usize) -> bool {
        is_canon_index(self.seg, i, j, k)
    }

    /// Copy every canonical point to its equivalent indices.
    pub fn copy_equiv(&mut self) {
        let ns2 = self.seg / 2;
        for i in 0..self.count {
            for j in 0..=ns2 {
                for k in 0..=self.seg {
                    if !self.is_canon(i, j, k) {
                        let co = self.canon_co(i, j, k);
                        self.set(i, j, k, co);
                    }
                }
            }
        }
    }

    /// Centroid of the center polygon (odd) or the center point (even).
    pub fn center(&self) -> Vec3 {
        let ns2 = self.seg / 2;
        if self.seg % 2 == 1 {
            let sum = (0..self.count).fold(Vec3::ZERO, |acc, i| acc + self.co(i, ns2, ns2));
            sum / self.count as f64
        } else {
            self.co(0, ns2, ns2)
        }
    }

    fn map_points(&mut self, f: impl Fn(Vec3) -> Vec3) {
        for co in &mut self.co {
            *co = f(*co);
        }
    }
}

/// Canonical index of `(i, j, k)` in a patch of `count` sides and `seg` segments.
///
/// Each point of the patch interior is reachable from up to three sides; the canonical
/// copy lives on the side whose lower-left quadrant contains it.
pub(crate) fn canon_index(count: usize, seg: usize, i: usize, j: usize, k: usize) -> (usize, usize, usize) {
    let ns2 = seg / 2;
    let odd = seg % 2;
    if odd == 0 && j == ns2 && k == ns2 {
        (0, j, k)
    } else if j + 1 <= ns2 + odd && k <= ns2 {
        (i, j, k)
    } else if k <= ns2 {
        ((i + count - 1) % count, k, seg - j)
    } else {
        ((i + 1) % count, seg - k, j)
    }
}

pub(crate) fn is_canon_index(seg: usize, i: usize, j: usize, k: usize) -> bool {
    let ns2 = seg / 2;
    if seg % 2 == 1 {
        j <= ns2 && k <= ns2
    } else {
        (j < ns2 && k <= ns2) || (j == ns2 && k == ns2 && i == 0)
    }
}

/// How well a three-sided patch matches a cube corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TriCornerFit {
    Unsuitable,
    /// Close enough to borrow the cube corner shape.
    Similar,
    /// Three beveled edges at right angles.
    Exact,
}

fn avg4(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> Vec3 {
    (a + b + c + d) * 0.25
}

fn bilinear(quad: [Vec3; 4], u: f64, v: f64) -> Vec3 {
    quad[0] * ((1.0 - u) * (1.0 - v)) + quad[1] * (u * (1.0 - v)) + quad[2] * (u * v) + quad[3] * ((1.0 - u) * v)
}

/// Center weight for Catmull-Clark with Sabin's modification at an `n`-valent point.
pub(crate) fn sabin_gamma(n: usize) -> f64 {
    match n {
        0..=2 => 0.0,
        3 => 0.065_247_584,
        4 => 0.25,
        5 => 0.401_983_447,
        6 => 0.523_423_277,
        _ => {
            let k = (PI / n as f64).cos();
            // Real root of x^3 + (4k^2 - 3)x - 2k = 0.
            let k2 = k * k;
            let k4 = k2 * k2;
            let k6 = k4 * k2;
            let y = (3f64.sqrt() * (64.0 * k6 - 144.0 * k4 + 135.0 * k2 - 27.0).sqrt() + 9.0 * k).cbrt();
            let x = 0.480_749_856_769_136 * y - (0.231_120_424_783_545 * (12.0 * k2 - 9.0)) / y;
            (k * x + 2.0 * k2 - 1.0) / (x * x * (k * x + 1.0))
        }
    }
}

/// Normalize cumulative lengths in place; a zero total puts everything at the start.
fn normalize_fracs(frac: &mut [f64]) {
    let Some(&total) = frac.last() else {
        return;
    };
    if total > 0.0 {
        for f in frac.iter_mut().skip(1) {
            *f /= total;
        }
    } else if let Some(last) = frac.last_mut() {
        *last = 1.0;
    }
}

/// Arc-length fractions along ring 0 of side `i`.
fn vmesh_fracs(grid: &Grid, i: usize) -> Vec<f64> {
    let ns = grid.seg;
    let mut frac = Vec::with_capacity(ns + 1);
    let mut total = 0.0;
    frac.push(0.0);
    for k in 0..ns {
        total += grid.co(i, 0, k).distance(grid.co(i, 0, k + 1));
        frac.push(total);
    }
    normalize_fracs(&mut frac);
    frac
}

/// Index `i` with `frac[i] <= f <= frac[i + 1]` and the fraction of the way between them.
pub(crate) fn interp_range(frac: &[f64], n: usize, f: f64) -> (usize, f64) {
    for i in 0..n {
        if f <= frac[i + 1] {
            let rest = f - frac[i];
            let rest = if rest == 0.0 { 0.0 } else { rest / (frac[i + 1] - frac[i]) };
            if i == n - 1 && rest == 1.0 {
                return (n, 0.0);
            }
            return (i, rest);
        }
    }
    (n, 0.0)
}

/// Unit cube corner with flat sides: three quarter squares.
fn cube_corner_square(nseg: usize) -> Grid {
    let ns2 = nseg / 2;
    let mut grid = Grid::new(3, nseg, Vec::new());
    for i in 0..3 {
        for j in 0..=ns2 {
            for k in 0..=ns2 {
                if !grid.is_canon(i, j, k) {
                    continue;
                }
                let mut co = [0.0; 3];
                co[i] = 1.0;
                co[(i + 1) % 3] = k as f64 * 2.0 / nseg as f64;
                co[(i + 2) % 3] = j as f64 * 2.0 / nseg as f64;
                grid.set(i, j, k, Vec3::from_array(co));
            }
        }
    }
    grid.copy_equiv();
    grid
}

/// Unit cube corner with inward flat sides. Only ring 0 is filled: the sides weld
/// together, leaving at most a small center polygon.
fn cube_corner_square_in(nseg: usize) -> Grid {
    let ns2 = nseg / 2;
    let b = if nseg % 2 == 1 {
        2.0 / (2.0 * ns2 as f64 + SQRT_2)
    } else {
        2.0 / nseg as f64
    };
    let mut grid = Grid::new(3, nseg, Vec::new());
    for i in 0..3 {
        for k in 0..=ns2 {
            let t = 1.0 - k as f64 * b;
            let mut co = [0.0; 3];
            co[i] = t;
            grid.set(i, 0, k, Vec3::from_array(co));
            let mut co = [0.0; 3];
            co[(i + 1) % 3] = t;
            grid.set(i, 0, nseg - k, Vec3::from_array(co));
        }
    }
    grid
}

impl BevelContext {
    fn grid_point(&self, pro: &Profile, k: usize, ns: usize) -> Vec3 {
        pro.point(&self.params, self.seg_2(), k, ns)
    }

    /// Arc-length fractions of `ns` samples along side `i`'s profile.
    fn profile_fracs(&self, grid: &Grid, i: usize, ns: usize) -> Vec<f64> {
        let mut frac = Vec::with_capacity(ns + 1);
        let mut co = grid.co(i, 0, 0);
        let mut total = 0.0;
        frac.push(0.0);
        for k in 0..ns {
            let next = self.grid_point(&grid.profiles[i], k + 1, ns);
            total += co.distance(next);
            frac.push(total);
            co = next;
        }
        normalize_fracs(&mut frac);
        frac
    }

    fn profile_points_of(&self, bv: BevVertId) -> Vec<Profile> {
        self.boundary(bv)
            .into_iter()
            .map(|b| self.bound_verts[b].profile.clone())
            .collect()
    }

    /// Resample `grid` to `nseg` segments per side by bilinear lookup in the source
    /// quads, matched by arc length along the profiles.
    pub(crate) fn interp_vmesh(&self, grid: &Grid, nseg: usize) -> Grid {
        let n = grid.count;
        let ns_in = grid.seg;
        let nseg2 = nseg / 2;
        let odd = nseg % 2;
        let mut out = Grid::new(n, nseg, grid.profiles.clone());

        let mut prev_frac = vmesh_fracs(grid, n - 1);
        let mut prev_new_frac = self.profile_fracs(grid, n - 1, nseg);
        for i in 0..n {
            let frac = vmesh_fracs(grid, i);
            let new_frac = self.profile_fracs(grid, i, nseg);
            for j in 0..nseg2 + odd {
                for k in 0..=nseg2 {
                    let (k_in, restk) = interp_range(&frac, ns_in, new_frac[k]);
                    let (k_in_prev, restkprev) = interp_range(&prev_frac, ns_in, prev_new_frac[nseg - j]);
                    let mut j_in = ns_in - k_in_prev;
                    let mut restj = -restkprev;
                    if restj > -BEVEL_EPSILON {
                        restj = 0.0;
                    } else {
                        j_in -= 1;
                        restj += 1.0;
                    }
                    let co = if restj < BEVEL_EPSILON && restk < BEVEL_EPSILON {
                        grid.canon_co(i, j_in, k_in)
                    } else {
                        let j0inc = usize::from(!(restj < BEVEL_EPSILON || j_in == ns_in));
                        let k0inc = usize::from(!(restk < BEVEL_EPSILON || k_in == ns_in));
                        let quad = [
                            grid.canon_co(i, j_in, k_in),
                            grid.canon_co(i, j_in, k_in + k0inc),
                            grid.canon_co(i, j_in + j0inc, k_in + k0inc),
                            grid.canon_co(i, j_in + j0inc, k_in),
                        ];
                        bilinear(quad, restk, restj)
                    };
                    out.set(i, j, k, co);
                }
            }
            prev_frac = frac;
            prev_new_frac = new_frac;
        }
        if odd == 0 {
            out.set(0, nseg2, nseg2, grid.center());
        }
        out.copy_equiv();
        out
    }

    /// One Catmull-Clark step doubling the segment count, after Levin's combined
    /// subdivision for filling n-sided holes. `grid.seg` must be even.
    pub(crate) fn cubic_subdiv(&self, mut grid: Grid) -> Grid {
        let n = grid.count;
        let ns_in = grid.seg;
        let ns_in2 = ns_in / 2;
        let ns_out = 2 * ns_in;
        let smooth_boundary = !self.params.is_custom();
        let smooth = |co: Vec3, co1: Vec3, co2: Vec3| co - (co1 + co2 - co * 2.0) / 6.0;
        let mut out = Grid::new(n, ns_out, grid.profiles.clone());

        // Boundary: smoothed even points, then odd points from the profiles.
        for i in 0..n {
            out.set(i, 0, 0, grid.co(i, 0, 0));
            for k in 1..ns_in {
                let mut co = grid.co(i, 0, k);
                if smooth_boundary {
                    co = smooth(co, grid.co(i, 0, k - 1), grid.co(i, 0, k + 1));
                }
                out.set_canon(i, 0, 2 * k, co);
            }
        }
        for i in 0..n {
            for k in (1..ns_out).step_by(2) {
                let mut co = self.grid_point(&out.profiles[i], k, ns_out);
                if smooth_boundary {
                    co = smooth(co, out.canon_co(i, 0, k - 1), out.canon_co(i, 0, k + 1));
                }
                out.set_canon(i, 0, k, co);
            }
        }
        out.copy_equiv();
        for i in 0..n {
            for k in 0..ns_in {
                grid.set(i, 0, k, out.co(i, 0, 2 * k));
            }
        }
        grid.copy_equiv();

        // Face points.
        for i in 0..n {
            for j in 0..ns_in2 {
                for k in 0..ns_in2 {
                    let co = avg4(
                        grid.co(i, j, k),
                        grid.co(i, j, k + 1),
                        grid.co(i, j + 1, k),
                        grid.co(i, j + 1, k + 1),
                    );
                    out.set(i, 2 * j + 1, 2 * k + 1, co);
                }
            }
        }
        // Points on edges running between rings.
        for i in 0..n {
            for j in 0..ns_in2 {
                for k in 1..=ns_in2 {
                    let co = avg4(
                        grid.co(i, j, k),
                        grid.co(i, j + 1, k),
                        out.canon_co(i, 2 * j + 1, 2 * k - 1),
                        out.canon_co(i, 2 * j + 1, 2 * k + 1),
                    );
                    out.set(i, 2 * j + 1, 2 * k, co);
                }
            }
        }
        // Points on edges along a ring.
        for i in 0..n {
            for j in 1..ns_in2 {
                for k in 0..ns_in2 {
                    let co = avg4(
                        grid.co(i, j, k),
                        grid.co(i, j, k + 1),
                        out.canon_co(i, 2 * j - 1, 2 * k + 1),
                        out.canon_co(i, 2 * j + 1, 2 * k + 1),
                    );
                    out.set(i, 2 * j, 2 * k + 1, co);
                }
            }
        }
        // Old interior points, all of valence four.
        let gamma = 0.25;
        let beta = -gamma;
        for i in 0..n {
            for j in 1..ns_in2 {
                for k in 1..=ns_in2 {
                    let edges = avg4(
                        out.canon_co(i, 2 * j, 2 * k - 1),
                        out.canon_co(i, 2 * j, 2 * k + 1),
                        out.canon_co(i, 2 * j - 1, 2 * k),
                        out.canon_co(i, 2 * j + 1, 2 * k),
                    );
                    let faces = avg4(
                        out.canon_co(i, 2 * j - 1, 2 * k - 1),
                        out.canon_co(i, 2 * j + 1, 2 * k - 1),
                        out.canon_co(i, 2 * j - 1, 2 * k + 1),
                        out.canon_co(i, 2 * j + 1, 2 * k + 1),
                    );
                    out.set(i, 2 * j, 2 * k, edges + faces * beta + grid.co(i, j, k) * gamma);
                }
            }
        }
        out.copy_equiv();

        // The center point has valence n.
        let gamma = sabin_gamma(n);
        let beta = -gamma;
        let mut edge_sum = Vec3::ZERO;
        let mut face_sum = Vec3::ZERO;
        for i in 0..n {
            edge_sum += out.co(i, ns_in, ns_in - 1);
            face_sum += out.co(i, ns_in - 1, ns_in - 1);
            face_sum += out.co(i, ns_in - 1, ns_in + 1);
        }
        let center = edge_sum / n as f64
            + face_sum * (beta / (2.0 * n as f64))
            + grid.co(0, ns_in2, ns_in2) * gamma;
        for i in 0..n {
            out.set(i, ns_in, ns_in, center);
        }

        // Put the boundary back on the profiles.
        for i in 0..n {
            let inext = (i + 1) % n;
            for k in 0..=ns_out {
                let co = self.grid_point(&out.profiles[i], k, ns_out);
                out.set(i, 0, k, co);
                if k >= ns_in && k < ns_out {
                    out.set(inext, ns_out - k, 0, co);
                }
            }
        }
        out
    }

    /// Octant of the unit superellipsoid with corners on the axes, `seg` segments a side.
    pub(crate) fn make_cube_corner_adj_vmesh(&self) -> Grid {
        let nseg = self.params.seg;
        let r = self.params.pro_super_r;
        if !self.params.is_custom() {
            if r == PRO_SQUARE_R {
                return cube_corner_square(nseg);
            }
            if r == PRO_SQUARE_IN_R {
                return cube_corner_square_in(nseg);
            }
        }

        let axes = [Vec3::X, Vec3::Y, Vec3::Z];
        let mut coarse = Grid::new(3, 2, Vec::with_capacity(3));
        for i in 0..3 {
            let start = axes[i];
            let end = axes[(i + 1) % 3];
            let plane_no = start.cross(end);
            let mut pro = Profile {
                super_r: r,
                start,
                middle: start + end,
                end,
                plane_co: start,
                plane_no,
                proj_dir: plane_no,
                ..Profile::default()
            };
            pro.calculate(&self.params, &self.pro_spacing, self.seg_2(), false);
            coarse.set(i, 0, 0, start);
            coarse.set(i, 0, 1, self.grid_point(&pro, 1, 2));
            coarse.profiles.push(pro);
        }
        let mut center = Vec3::splat((1.0f64 / 3.0).sqrt());
        if nseg > 2 {
            if r > 1.5 {
                center = center * 1.4;
            } else if r < 0.75 {
                center = center * 0.6;
            }
        }
        coarse.set(0, 1, 1, center);
        coarse.copy_equiv();

        let mut grid = coarse;
        while grid.seg < nseg {
            grid = self.cubic_subdiv(grid);
        }
        if grid.seg != nseg {
            grid = self.interp_vmesh(&grid, nseg);
        }
        grid.map_points(|co| snap_to_superellipsoid(co, r, false));
        grid
    }

    /// Decide whether `bv` looks enough like a cube corner to borrow its shape.
    pub(crate) fn tri_corner_test(&self, mesh: &PolyMesh, bv: BevVertId) -> TriCornerFit {
        if self.params.vertex_only() || self.params.is_custom() {
            return TriCornerFit::Unsuitable;
        }
        let b = &self.bev_verts[bv];
        if b.vmesh.count != 3 {
            return TriCornerFit::Similar;
        }
        let Some(&first) = b.edges.first() else {
            return TriCornerFit::Unsuitable;
        };
        let offset = self.edge_halves[first].offset_l;
        let mut in_plane = 0;
        let mut total_angle = 0.0;
        for &eh in &b.edges {
            let h = &self.edge_halves[eh];
            let ang = mesh.edge_face_angle_signed(h.e);
            if ang.abs() <= FRAC_PI_4 {
                in_plane += 1;
            } else if ang.abs() >= 3.0 * FRAC_PI_4 {
                return TriCornerFit::Unsuitable;
            }
            if h.is_bev && (h.offset_l - offset).abs() > BEVEL_EPSILON {
                return TriCornerFit::Unsuitable;
            }
            total_angle += ang;
        }
        if in_plane + 3 != b.edgecount {
            return TriCornerFit::Unsuitable;
        }
        let angdiff = (total_angle.abs() - 3.0 * FRAC_PI_2).abs();
        if (self.params.pro_super_r == PRO_SQUARE_R && angdiff > PI / 16.0) || angdiff > FRAC_PI_4 {
            return TriCornerFit::Unsuitable;
        }
        if b.edgecount != 3 || b.selcount != 3 {
            return TriCornerFit::Similar;
        }
        TriCornerFit::Exact
    }

    /// The cube corner grid mapped onto the three boundary points and the vertex.
    pub(crate) fn tri_corner_adj_vmesh(&self, mesh: &PolyMesh, bv: BevVertId) -> Grid {
        let bounds = self.boundary(bv);
        let co = |i: usize| bounds.get(i).map_or(Vec3::ZERO, |&b| self.bnd_co(b));
        let map = unit_cube_map(co(0), co(1), co(2), mesh.position(self.bev_verts[bv].v));
        let mut grid = self.make_cube_corner_adj_vmesh();
        grid.map_points(|p| map.apply_point(p));
        grid.profiles = self.profile_points_of(bv);
        grid
    }

    /// Grid for a general vertex patch: a two-segment control mesh around a center
    /// placed by the profile's fullness, refined to `seg` segments.
    pub(crate) fn adj_vmesh(&self, mesh: &PolyMesh, bv: BevVertId) -> Grid {
        let n = self.bev_verts[bv].vmesh.count;
        if n == 3
            && self.tri_corner_test(mesh, bv) != TriCornerFit::Unsuitable
            && self.params.pro_super_r != PRO_SQUARE_IN_R
        {
            return self.tri_corner_adj_vmesh(mesh, bv);
        }
        let nseg = self.bev_verts[bv].vmesh.seg;
        let bounds = self.boundary(bv);
        let mut coarse = Grid::new(n, 2, self.profile_points_of(bv));
        let mut center = Vec3::ZERO;
        for (i, &b) in bounds.iter().enumerate() {
            let co = self.bnd_co(b);
            coarse.set(i, 0, 0, co);
            coarse.set(i, 0, 1, self.grid_point(&coarse.profiles[i], 1, 2));
            center += co;
        }
        center = center / n as f64;

        // Fullness moves the center toward the original vertex, or for custom profiles
        // from its reflection through the boundary center.
        let original = mesh.position(self.bev_verts[bv].v);
        let negative_fullest = center + (center - original);
        let fullness = self.pro_spacing.fullness;
        let dir = original - center;
        let start = if dir.length_squared() > BEVEL_EPSILON_SQ {
            if self.params.is_custom() {
                negative_fullest.madd(dir, 2.0 * fullness)
            } else {
                center.madd(dir, fullness)
            }
        } else {
            center
        };
        coarse.set(0, 1, 1, start);
        coarse.copy_equiv();

        let mut grid = self.cubic_subdiv(coarse);
        while grid.seg < nseg {
            grid = self.cubic_subdiv(grid);
        }
        if grid.seg != nseg {
            grid = self.interp_vmesh(&grid, nseg);
        }
        grid
    }

    /// Boundary point starting a straight run of beveled edges through `bv`, when every
    /// face around it is parallel to the run.
    pub(crate) fn pipe_test(&self, mesh: &PolyMesh, bv: BevVertId) -> Option<BvId> {
        let b = &self.bev_verts[bv];
        if !(3..=4).contains(&b.vmesh.count) || !(3..=4).contains(&b.selcount) {
            return None;
        }
        let vco = mesh.position(b.v);
        let far = |eh: usize| mesh.position(mesh.edge_other_vert(self.edge_halves[eh].e, b.v));
        let (vpipe, dir1) = self.boundary(bv).into_iter().find_map(|v1| {
            let v2 = self.bound_verts[v1].next;
            let v3 = self.bound_verts[v2].next;
            let (Some(e1), Some(_), Some(e3)) =
                (self.bound_verts[v1].ebev, self.bound_verts[v2].ebev, self.bound_verts[v3].ebev)
            else {
                return None;
            };
            let dir1 = (vco - far(e1)).normalize_or_zero().0;
            let dir3 = (far(e3) - vco).normalize_or_zero().0;
            (dir1.angle_to(dir3) < BEVEL_EPSILON_ANG).then_some((v1, dir1))
        })?;
        let across = b.edges.iter().any(|&eh| {
            self.edge_halves[eh]
                .fnext
                .is_some_and(|f| dir1.dot(mesh.face_normal(f)).abs() > BEVEL_EPSILON_BIG)
        });
        (!across).then_some(vpipe)
    }

    /// Snap `co` onto `vpipe`'s profile, projected into the plane through `co` across the
    /// pipe. `midline` snaps square profiles to their corner.
    fn snap_to_pipe_profile(&self, mesh: &PolyMesh, vpipe: BvId, midline: bool, co: Vec3) -> Vec3 {
        let pro = &self.bound_verts[vpipe].profile;
        if Tolerance::BEVEL.approx_eq_vec3(pro.start, pro.end) {
            return pro.start;
        }
        let Some(ebev) = self.bound_verts[vpipe].ebev else {
            return co;
        };
        let edge = &mesh.edges[self.edge_halves[ebev].e];
        let edir = mesh.position(edge.v1) - mesh.position(edge.v2);
        let start = closest_on_plane(pro.start, co, edir);
        let end = closest_on_plane(pro.end, co, edir);
        let middle = closest_on_plane(pro.middle, co, edir);
        match unit_square_map(start, middle, end).and_then(|m| m.inverse().map(|inv| (m, inv))) {
            Some((m, inv)) => {
                let p = snap_to_superellipsoid(inv.apply_point(co), pro.super_r, midline);
                m.apply_point(p)
            }
            None => closest_on_segment(co, start, end),
        }
    }

    /// Grid for a pipe: the general grid with every interior point pulled onto the
    /// profile across the pipe.
    pub(crate) fn pipe_adj_vmesh(&self, mesh: &PolyMesh, bv: BevVertId, vpipe: BvId) -> Grid {
        let mut grid = self.adj_vmesh(mesh, bv);
        let n = self.bev_verts[bv].vmesh.count;
        let ns = self.bev_verts[bv].vmesh.seg;
        let half = ns / 2;
        let ipipe1 = self.bound_verts[vpipe].index;
        let ipipe2 = self.bound_verts[self.bound_verts[self.bound_verts[vpipe].next].next].index;
        let custom = self.params.is_custom();

        for i in 0..n {
            for j in 1..=half {
                for k in 0..=half {
                    if !grid.is_canon(i, j, k) {
                        continue;
                    }
                    let co = if custom {
                        // Follow the profile shape ring by ring.
                        let (p1, p2, f) = if i == ipipe1 || i == ipipe2 {
                            if n == 3 && i == ipipe1 {
                                let ring = j.max(k);
                                let f = if k < j { j.min(k) } else { 2 * ring - j } as f64 / (2 * ring) as f64;
                                (grid.co(i, ring, 0), grid.co(i, 0, ring), f)
                            } else {
                                let other = if i == ipipe1 { ipipe2 } else { ipipe1 };
                                (grid.co(i, 0, k), grid.co(other, 0, ns - k), j as f64 / ns as f64)
                            }
                        } else {
                            (grid.co(i, j, 0), grid.co(i, j, ns), k as f64 / ns as f64)
                        };
                        p1.lerp(p2, f)
                    } else {
                        let midline = ns % 2 == 0
                            && k == half
                            && ((i == 0 && j == half) || i == ipipe1 || i == ipipe2);
                        self.snap_to_pipe_profile(mesh, vpipe, midline, grid.co(i, j, k))
                    };
                    grid.set(i, j, k, co);
                }
            }
        }
        grid.copy_equiv();
        grid
    }

    /// Grid for square profiles with three or more beveled edges: offset lines parallel
    /// to each beveled edge, meeting on center lines between them.
    pub(crate) fn square_out_adj_vmesh(&self, mesh: &PolyMesh, bv: BevVertId) -> Grid {
        let n = self.bev_verts[bv].vmesh.count;
        let ns = self.bev_verts[bv].vmesh.seg;
        let ns2 = ns / 2;
        let odd = ns % 2;
        let mut ns2inv = 1.0 / ns2 as f64;
        let bounds = self.boundary(bv);
        let vco = mesh.position(self.bev_verts[bv].v);
        let mut grid = Grid::new(n, ns, self.profile_points_of(bv));
        let mut centerline = vec![vec![Vec3::ZERO; ns2 + 1]; n];
        let mut cset = vec![false; n];
        let edge_ends = |eh: usize| {
            let edge = &mesh.edges[self.edge_halves[eh].e];
            (mesh.position(edge.v1), mesh.position(edge.v2))
        };
        let closer = |a: Vec3, b: Vec3| if a.distance_squared(vco) <= b.distance_squared(vco) { a } else { b };

        // Where the offset lines meet on the unbeveled edge between two beveled ones.
        let mut i = 0;
        while i < n {
            let b = bounds[i];
            let bnd = &self.bound_verts[b];
            let bndco = bnd.nv.co;
            if bnd.is_patch_start {
                for _ in 0..2 {
                    if i < n {
                        let b = bounds[i];
                        centerline[i][0] = self.bnd_co(b).midpoint(self.bnd_co(self.bound_verts[b].next));
                        cset[i] = true;
                    }
                    i += 1;
                }
            } else if bnd.is_arc_start {
                centerline[i][0] = bnd.profile.middle;
                cset[i] = true;
                i += 1;
            } else if let (Some(e1), Some(e2)) = (bnd.efirst, bnd.elast) {
                if self.edges_angle_kind(mesh, e1, e2, bv) == AngleKind::Smaller {
                    let (a1, a2) = edge_ends(e1);
                    let (b1, b2) = edge_ends(e2);
                    let co1 = bndco + (a1 - a2);
                    let co2 = bndco + (b1 - b2);
                    let v1co = intersect_lines(a1, a2, bndco, co2).first();
                    let v2co = intersect_lines(b1, b2, bndco, co1).first();
                    let iprev = (i + n - 1) % n;
                    if let Some(v2co) = v2co {
                        centerline[i][0] = if cset[i] { closer(centerline[i][0], v2co) } else { v2co };
                        cset[i] = true;
                    }
                    if let Some(v1co) = v1co {
                        centerline[iprev][0] = if cset[iprev] { closer(centerline[iprev][0], v1co) } else { v1co };
                        cset[iprev] = true;
                    }
                }
            }
            i += 1;
        }
        for (i, &b) in bounds.iter().enumerate() {
            if cset[i] {
                continue;
            }
            let bnd = &self.bound_verts[b];
            let co1 = bnd.nv.co;
            let co2 = self.bnd_co(bnd.next);
            if let Some(e1) = self.bound_verts[bnd.next].efirst {
                let (a1, a2) = edge_ends(e1);
                let prev_arc = self.bound_verts[bnd.prev].is_arc_start;
                if prev_arc && self.bound_verts[bnd.next].is_arc_start {
                    if let Some(meet) = intersect_lines(a1, a2, co1, co2).first() {
                        centerline[i][0] = meet;
                        cset[i] = true;
                    }
                } else {
                    centerline[i][0] = closest_on_segment(if prev_arc { co1 } else { co2 }, a1, a2);
                    cset[i] = true;
                }
            }
            if !cset[i] {
                centerline[i][0] = co1.midpoint(co2);
                cset[i] = true;
            }
        }

        // Center lines run from the edge points toward the vertex.
        for (i, &b) in bounds.iter().enumerate() {
            if odd == 1 {
                let apex = centerline[(i + n - 1) % n][0];
                let ang = 0.5 * angle_at(self.bnd_co(b), apex, self.bnd_co(self.bound_verts[b].next));
                let finalfrac = if ang > BEVEL_SMALL_ANG { (0.5 / ang.sin()).min(0.8) } else { 0.8 };
                ns2inv = 1.0 / (ns2 as f64 + finalfrac);
            }
            let start = centerline[i][0];
            for j in 1..=ns2 {
                centerline[i][j] = start.lerp(vco, j as f64 * ns2inv);
            }
        }

        // Sides and the near-middle lines.
        for (i, &b) in bounds.iter().enumerate() {
            let co1 = self.bnd_co(b);
            let prev_line = centerline[(i + n - 1) % n][0];
            for j in 0..ns2 + odd {
                grid.set(i, j, 0, co1.lerp(prev_line, j as f64 * ns2inv));
            }
            let line = centerline[i][0];
            for k in 1..=ns2 {
                grid.set(i, 0, k, co1.lerp(line, k as f64 * ns2inv));
            }
        }
        if odd == 0 {
            grid.set(0, ns2, ns2, vco);
        }
        grid.copy_equiv();

        // Interior points where the lines from both sides cross.
        for i in 0..n {
            let im1 = (i + n - 1) % n;
            for j in 1..ns2 + odd {
                for k in 1..=ns2 {
                    let a = grid.co(i, 0, k);
                    let c = grid.co(i, j, 0);
                    let co = match intersect_lines(a, centerline[im1][k], c, centerline[i][j]) {
                        LineIntersection::Parallel => a.lerp(centerline[im1][k], j as f64 * ns2inv),
                        hit => hit.meet().unwrap_or(a),
                    };
                    grid.set(i, j, k, co);
                }
            }
        }
        grid.copy_equiv();
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_indices_are_stable() {
        for seg in [2, 3, 4, 5] {
            let grid = Grid::new(4, seg, Vec::new());
            for i in 0..4 {
                for j in 0..=seg / 2 {
                    for k in 0..=seg {
                        let (ci, cj, ck) = grid.canon(i, j, k);
                        assert!(grid.is_canon(ci, cj, ck), "seg {seg}: ({i},{j},{k}) -> ({ci},{cj},{ck})");
                        assert_eq!(grid.canon(ci, cj, ck), (ci, cj, ck));
                    }
                }
            }
        }
    }

    #[test]
    fn shared_boundary_points_agree_after_copy() {
        let mut grid = Grid::new(3, 4, Vec::new());
        for i in 0..3 {
            for j in 0..=2 {
                for k in 0..=4 {
                    if grid.is_canon(i, j, k) {
                        grid.set(i, j, k, Vec3::new(i as f64, j as f64, k as f64));
                    }
                }
            }
        }
        grid.copy_equiv();
        // The end of side 0's ring 0 is the start of side 1.
        assert_eq!(grid.co(0, 0, 4), grid.co(1, 0, 0));
        assert_eq!(grid.co(2, 2, 2), grid.co(0, 2, 2));
    }

    #[test]
    fn sabin_gamma_matches_the_table() {
        assert_eq!(sabin_gamma(4), 0.25);
        assert_eq!(sabin_gamma(2), 0.0);
        // The closed form continues the table smoothly.
        let g6 = sabin_gamma(6);
        let g7 = sabin_gamma(7);
        assert!(g7 > g6 && g7 < 1.0, "gamma(7) = {g7}");
    }

    #[test]
    fn interp_range_finds_the_bracket() {
        let frac = [0.0, 0.25, 0.5, 1.0];
        assert_eq!(interp_range(&frac, 3, 0.0), (0, 0.0));
        let (i, rest) = interp_range(&frac, 3, 0.75);
        assert_eq!(i, 2);
        assert!((rest - 0.5).abs() < 1e-12);
        assert_eq!(interp_range(&frac, 3, 1.0), (3, 0.0));
    }

    #[test]
    fn square_cube_corner_has_flat_faces() {
        let grid = cube_corner_square(4);
        for i in 0..3 {
            for j in 0..=2 {
                for k in 0..=4 {
                    let co = grid.co(i, j, k);
                    let on_face = (co.x - 1.0).abs() < 1e-12 || (co.y - 1.0).abs() < 1e-12 || (co.z - 1.0).abs() < 1e-12;
                    assert!(on_face, "({i},{j},{k}) = {co:?}");
                }
            }
        }
        assert_eq!(grid.co(0, 2, 2), Vec3::splat(1.0));
    }

    #[test]
    fn square_in_corner_ring_runs_between_axes() {
        let grid = cube_corner_square_in(2);
        assert_eq!(grid.co(0, 0, 0), Vec3::X);
        assert_eq!(grid.co(0, 0, 2), Vec3::Y);
        assert_eq!(grid.co(0, 0, 1), Vec3::ZERO);
    }
}
