//! Where offset lines meet around a bevel vertex.
//!
//! Each beveled edge contributes two offset lines, one in each adjacent face. Boundary
//! points sit where the offset lines of neighbouring edges cross, or slide along the
//! unbeveled edges between them.

use std::f64::consts::PI;

use crate::geom::core::{Vec3, closest_on_plane, intersect_lines, LineIntersection};
use crate::geom::poly_mesh::{EdgeId, FaceId, PolyMesh, VertId};

use super::context::{
    BEVEL_EPSILON_ANG, BEVEL_EPSILON_BIG, BEVEL_SMALL_ANG, BevVertId, BevelContext, EhId,
    epsilon_ang_dot,
};
use super::options::OffsetType;

/// Smallest angle (radians) at which an offset line is trusted to cross an edge.
const GOOD_ANGLE: f64 = 0.1;

/// Meeting point of an offset line with an unbeveled edge.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EdgeMeet {
    /// `None` when the angle is too small, straight or reflex.
    pub co: Option<Vec3>,
    /// Angle from the first edge to the second, seen from the vertex normal side.
    pub angle: f64,
}

/// Meeting point placed on an edge between two beveled edges.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EdgeBetweenMeet {
    pub co: Vec3,
    /// Ratio of sines of the two angles, when the point is a compromise between them.
    pub sinratio: Option<f64>,
}

pub(crate) fn nearly_parallel(d1: Vec3, d2: Vec3) -> bool {
    let ang = d1.angle_to(d2);
    ang.abs() < BEVEL_EPSILON_ANG || (ang - PI).abs() < BEVEL_EPSILON_ANG
}

/// Like [`nearly_parallel`] for unit vectors.
pub(crate) fn nearly_parallel_normalized(d1: Vec3, d2: Vec3) -> bool {
    (d1.dot(d2).abs() - 1.0).abs() <= epsilon_ang_dot()
}

/// Point at distance `d` from `v` along edge `e`, kept just short of the far end.
pub(crate) fn slide_dist(mesh: &PolyMesh, e: EdgeId, v: VertId, d: f64) -> Vec3 {
    let co = mesh.position(v);
    let (dir, len) = (co - mesh.position(mesh.edge_other_vert(e, v))).normalize_or_zero();
    let d = if d > len { len - 50.0 * super::context::BEVEL_EPSILON } else { d };
    co.madd(dir, -d)
}

/// The closer end of `e` when `co` lies beyond either end.
fn outside_edge(mesh: &PolyMesh, e: EdgeId, co: Vec3) -> Option<VertId> {
    let edge = &mesh.edges[e];
    let l1 = mesh.position(edge.v1);
    let (u, lenu) = (mesh.position(edge.v2) - l1).normalize_or_zero();
    let lambda = u.dot(co - l1);
    if lambda <= -BEVEL_EPSILON_BIG * lenu {
        Some(edge.v1)
    } else if lambda >= (1.0 + BEVEL_EPSILON_BIG) * lenu {
        Some(edge.v2)
    } else {
        None
    }
}

/// Is the corner from `e1` to `e2` (sweeping counter-clockwise on `f`) under 180 degrees?
fn edge_edge_angle_less_than_180(mesh: &PolyMesh, e1: EdgeId, e2: EdgeId, f: FaceId) -> bool {
    let (a, b) = (&mesh.edges[e1], &mesh.edges[e2]);
    let (v, v1, v2) = if a.v1 == b.v1 {
        (a.v1, a.v2, b.v2)
    } else if a.v1 == b.v2 {
        (a.v1, a.v2, b.v1)
    } else if a.v2 == b.v1 {
        (a.v2, a.v1, b.v2)
    } else if a.v2 == b.v2 {
        (a.v2, a.v1, b.v1)
    } else {
        return false;
    };
    let dir1 = mesh.position(v1) - mesh.position(v);
    let dir2 = mesh.position(v2) - mesh.position(v);
    dir1.cross(dir2).dot(mesh.face_normal(f)) > 0.0
}

/// `1` when `a` then `b` run counter-clockwise on `f`, `-1` when reversed, `0` without a
/// shared face.
pub(crate) fn bev_ccw_test(mesh: &PolyMesh, a: EdgeId, b: EdgeId, f: Option<FaceId>) -> i32 {
    let Some(f) = f else {
        return 0;
    };
    match (mesh.loop_of_face_at_edge(f, a), mesh.loop_of_face_at_edge(f, b)) {
        (Some(la), Some(lb)) => {
            if mesh.loop_next(lb) == la {
                1
            } else {
                -1
            }
        }
        _ => 0,
    }
}

/// Angle class of the corner `e1`-`v`-`e2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AngleKind {
    Smaller,
    Straight,
    Larger,
}

/// Two offset lines, each given by two points, whose crossing is a boundary point.
struct OffsetLines {
    l1a: Vec3,
    l1b: Vec3,
    l2a: Vec3,
    l2b: Vec3,
}

impl BevelContext {
    fn eh_dir_from_vert(&self, mesh: &PolyMesh, eh: EhId, v: VertId) -> Vec3 {
        mesh.position(mesh.edge_other_vert(self.edge_halves[eh].e, v)) - mesh.position(v)
    }

    pub(crate) fn edges_angle_kind(&self, mesh: &PolyMesh, e1: EhId, e2: EhId, bv: BevVertId) -> AngleKind {
        let v = self.bev_verts[bv].v;
        let dir1 = (-self.eh_dir_from_vert(mesh, e1, v)).normalize_or_zero().0;
        let dir2 = (-self.eh_dir_from_vert(mesh, e2, v)).normalize_or_zero().0;
        if nearly_parallel_normalized(dir1, dir2) {
            return AngleKind::Straight;
        }
        let cross = dir1.cross(dir2).normalize_or_zero().0;
        let no = if let Some(f) = self.edge_halves[e1].fnext {
            mesh.face_normal(f)
        } else if let Some(f) = self.edge_halves[e2].fprev {
            mesh.face_normal(f)
        } else {
            self.bev_verts[bv].no
        };
        if cross.dot(no) < 0.0 {
            AngleKind::Larger
        } else {
            AngleKind::Smaller
        }
    }

    /// Is `co` (roughly on face `f`) inside the sweep from `e1` to `e2`?
    fn point_between_edges(&self, mesh: &PolyMesh, co: Vec3, v: VertId, f: FaceId, e1: EhId, e2: EhId) -> bool {
        let vco = mesh.position(v);
        let dir1 = (-self.eh_dir_from_vert(mesh, e1, v)).normalize_or_zero().0;
        let dir2 = (-self.eh_dir_from_vert(mesh, e2, v)).normalize_or_zero().0;
        let dirco = (vco - co).normalize_or_zero().0;
        let fno = mesh.face_normal(f);
        let mut ang11 = dir1.angle_to(dir2);
        let mut ang1co = dir1.angle_to(dirco);
        if dir1.cross(dir2).dot(fno) < 0.0 {
            ang11 = 2.0 * PI - ang11;
        }
        if dir1.cross(dirco).dot(fno) < 0.0 {
            ang1co = 2.0 * PI - ang1co;
        }
        ang11 - ang1co > -BEVEL_EPSILON_ANG
    }

    fn edge_weight(&self, mesh: &PolyMesh, e: EdgeId) -> f64 {
        if self.params.use_weights { mesh.edges[e].bevel_weight } else { 1.0 }
    }

    /// Offset lines measured along the neighbouring legs, for percent and absolute modes.
    /// Falls back to the edges themselves when the legs are not usable.
    fn offset_lines_along_legs(&self, mesh: &PolyMesh, e1: EhId, e2: EhId, v: VertId) -> OffsetLines {
        let h1 = &self.edge_halves[e1];
        let h2 = &self.edge_halves[e2];
        let v1 = mesh.edge_other_vert(h1.e, v);
        let v2 = mesh.edge_other_vert(h2.e, v);
        let fallback = OffsetLines {
            l1a: mesh.position(v),
            l1b: mesh.position(v1),
            l2a: mesh.position(v),
            l2b: mesh.position(v2),
        };
        let (Some(f1), Some(f2)) = (h1.fnext, h2.fprev) else {
            return fallback;
        };
        let legs = (
            mesh.loop_of_face_at_vert(f1, v1).map(|l| mesh.loop_edge(l)),
            mesh.loop_of_face_at_vert(f2, v2).map(|l| mesh.loop_edge(mesh.loop_prev(l))),
            mesh.loop_of_face_at_vert(f1, v).map(|l| mesh.loop_edge(mesh.loop_prev(l))),
            mesh.loop_of_face_at_vert(f2, v).map(|l| mesh.loop_edge(l)),
        );
        let (Some(e0), Some(e3), Some(e4), Some(e5)) = legs else {
            return fallback;
        };
        let visible = edge_edge_angle_less_than_180(mesh, e0, h1.e, f1)
            && edge_edge_angle_less_than_180(mesh, h1.e, e4, f1)
            && edge_edge_angle_less_than_180(mesh, h2.e, e3, f2)
            && edge_edge_angle_less_than_180(mesh, e5, h2.e, f1);
        if !visible {
            return fallback;
        }
        let offset = self.params.offset;
        let leg = |e: EdgeId| {
            if self.params.offset_type == OffsetType::Absolute {
                offset
            } else {
                offset * mesh.edge_length(e) / 100.0
            }
        };
        let w1 = self.edge_weight(mesh, h1.e);
        let w2 = self.edge_weight(mesh, h2.e);
        OffsetLines {
            l1a: slide_dist(mesh, e4, v, leg(e4) * w1),
            l1b: slide_dist(mesh, e0, v1, leg(e0) * w1),
            l2a: slide_dist(mesh, e5, v, leg(e5) * w2),
            l2b: slide_dist(mesh, e3, v2, leg(e3) * w2),
        }
    }

    /// Meeting point of the right offset line of `e1` and the left offset line of `e2`,
    /// where `e1` precedes `e2` counter-clockwise around `bv`. `f` is their shared face.
    ///
    /// With `edges_between`, unbeveled edges separate the two and the point is dropped
    /// onto one of the faces between them, skipping faces next to `e_in_plane`.
    /// Records changed offsets in `offset_r`/`offset_l` of the callers' edges later.
    pub(crate) fn offset_meet(
        &self,
        mesh: &PolyMesh,
        e1: EhId,
        e2: EhId,
        bv: BevVertId,
        f: Option<FaceId>,
        edges_between: bool,
        e_in_plane: Option<EhId>,
    ) -> Vec3 {
        let v = self.bev_verts[bv].v;
        let vno = self.bev_verts[bv].no;
        let vco = mesh.position(v);
        let h1 = &self.edge_halves[e1];
        let h2 = &self.edge_halves[e2];
        let mut dir1 = -self.eh_dir_from_vert(mesh, e1, v);
        let dir2 = self.eh_dir_from_vert(mesh, e2, v);
        let (dir1n, dir2p) = if edges_between {
            (
                self.eh_dir_from_vert(mesh, h1.next, v),
                -self.eh_dir_from_vert(mesh, h2.prev, v),
            )
        } else {
            (Vec3::ZERO, Vec3::ZERO)
        };

        let ang = dir1.angle_to(dir2);
        if ang < BEVEL_EPSILON_ANG {
            // Parallel: go perpendicular to both, in a plane averaged from the faces.
            let norm_v = match f {
                Some(f) => mesh.face_normal(f),
                None => {
                    let mut sum = Vec3::ZERO;
                    let mut count = 0;
                    let mut e = e1;
                    while e != e2 {
                        if let Some(fnext) = self.edge_halves[e].fnext {
                            sum += mesh.face_normal(fnext);
                            count += 1;
                        }
                        e = self.edge_halves[e].next;
                    }
                    if count == 0 { vno } else { sum / count as f64 }
                }
            };
            dir1 += dir2;
            let norm_perp1 = dir1.cross(norm_v).normalize_or_zero().0;
            let d = h1.offset_r.max(h2.offset_l) / (ang / 2.0).cos();
            return vco.madd(norm_perp1, d);
        }
        if (ang - PI).abs() < BEVEL_EPSILON_ANG {
            // Anti-parallel: the bevel folds into a zero-area face.
            let d = h1.offset_r.max(h2.offset_l);
            return slide_dist(mesh, h2.e, v, d);
        }

        let orient = |n: Vec3, face: Option<FaceId>| {
            let reference = face.map_or(vno, |f| mesh.face_normal(f));
            if n.dot(reference) < 0.0 { -n } else { n }
        };
        let (norm_v1, norm_v2) = match f {
            Some(face) if ang < BEVEL_SMALL_ANG => {
                let n = mesh.face_normal(face);
                (n, n)
            }
            _ if !edges_between => {
                let n = orient(dir2.cross(dir1).normalize_or_zero().0, f);
                (n, n)
            }
            _ => (
                orient(dir1n.cross(dir1).normalize_or_zero().0, h1.fnext),
                orient(dir2.cross(dir2p).normalize_or_zero().0, h2.fprev),
            ),
        };
        let norm_perp1 = dir1.cross(norm_v1).normalize_or_zero().0;
        let norm_perp2 = dir2.cross(norm_v2).normalize_or_zero().0;

        let lines = if self.params.percent_or_absolute() {
            self.offset_lines_along_legs(mesh, e1, e2, v)
        } else {
            let l1a = vco.madd(norm_perp1, h1.offset_r);
            let l2a = vco.madd(norm_perp2, h2.offset_l);
            OffsetLines { l1a, l1b: l1a + dir1, l2a, l2b: l2a + dir2 }
        };

        let isect = intersect_lines(lines.l1a, lines.l1b, lines.l2a, lines.l2b);
        let Some(mut meetco) = isect.first() else {
            return lines.l1a;
        };
        // A zero offset must not push the point past the end of its own edge.
        if h1.offset_r == 0.0 {
            if let Some(closer) = outside_edge(mesh, h1.e, meetco) {
                meetco = mesh.position(closer);
            }
        }
        if h2.offset_l == 0.0 {
            if let Some(closer) = outside_edge(mesh, h2.e, meetco) {
                meetco = mesh.position(closer);
            }
        }
        if edges_between && h1.offset_r > 0.0 && h2.offset_l > 0.0 {
            if let LineIntersection::Skew(_, other) = isect {
                meetco = meetco.midpoint(other);
            }
            let mut e = e1;
            while e != e2 {
                let next = self.edge_halves[e].next;
                if let Some(fnext) = self.edge_halves[e].fnext {
                    let fno = mesh.face_normal(fnext);
                    let dropco = closest_on_plane(meetco, vco, fno);
                    let near_in_plane = e_in_plane
                        .and_then(|ep| self.edge_halves[ep].fnext)
                        .is_some_and(|fp| {
                            let a = fno.angle_to(mesh.face_normal(fp));
                            a.abs() < BEVEL_SMALL_ANG || (a - PI).abs() < BEVEL_SMALL_ANG
                        });
                    if !near_in_plane && self.point_between_edges(mesh, dropco, v, fnext, e, next) {
                        meetco = dropco;
                        break;
                    }
                }
                e = next;
            }
        }
        meetco
    }

    /// Where the offset line of whichever of `e1`/`e2` has a nonzero offset meets the other
    /// edge. `e1` precedes `e2` counter-clockwise around `bv`.
    pub(crate) fn offset_meet_edge(&self, mesh: &PolyMesh, e1: EhId, e2: EhId, bv: BevVertId) -> EdgeMeet {
        let v = self.bev_verts[bv].v;
        let dir1 = self.eh_dir_from_vert(mesh, e1, v).normalize_or_zero().0;
        let dir2 = self.eh_dir_from_vert(mesh, e2, v).normalize_or_zero().0;
        let mut ang = dir1.angle_to(dir2);
        if ang.abs() < GOOD_ANGLE {
            return EdgeMeet { co: None, angle: 0.0 };
        }
        if dir1.cross(dir2).dot(self.bev_verts[bv].no) < 0.0 {
            ang = 2.0 * PI - ang;
            return EdgeMeet { co: None, angle: ang };
        }
        if (ang - PI).abs() < GOOD_ANGLE {
            return EdgeMeet { co: None, angle: ang };
        }
        let sinang = ang.sin();
        let vco = mesh.position(v);
        let h1 = &self.edge_halves[e1];
        let co = if h1.offset_r == 0.0 {
            vco.madd(dir1, self.edge_halves[e2].offset_l / sinang)
        } else {
            vco.madd(dir2, h1.offset_r / sinang)
        };
        EdgeMeet { co: Some(co), angle: ang }
    }

    /// Would a point on `emid` look good, i.e. neither side sees a reflex angle?
    pub(crate) fn good_offset_on_edge_between(
        &self,
        mesh: &PolyMesh,
        e1: EhId,
        e2: EhId,
        emid: EhId,
        bv: BevVertId,
    ) -> bool {
        self.offset_meet_edge(mesh, e1, emid, bv).co.is_some()
            && self.offset_meet_edge(mesh, emid, e2, bv).co.is_some()
    }

    /// Best place on the unbeveled `emid` for the offsets of `e1` and `e2` (counter-clockwise
    /// order `e1`, `emid`, `e2`).
    pub(crate) fn offset_on_edge_between(
        &self,
        mesh: &PolyMesh,
        e1: EhId,
        e2: EhId,
        emid: EhId,
        bv: BevVertId,
    ) -> EdgeBetweenMeet {
        let v = self.bev_verts[bv].v;
        let m1 = self.offset_meet_edge(mesh, e1, emid, bv);
        let m2 = self.offset_meet_edge(mesh, emid, e2, bv);
        let sinratio = if m1.angle == 0.0 { 1.0 } else { m2.angle.sin() / m1.angle.sin() };

        if self.params.percent_or_absolute() {
            let vco = mesh.position(v);
            let v2co = mesh.position(mesh.edge_other_vert(self.edge_halves[emid].e, v));
            let co = if self.params.offset_type == OffsetType::Percent {
                let wt = if self.params.use_weights {
                    0.5 * (mesh.edges[self.edge_halves[e1].e].bevel_weight
                        + mesh.edges[self.edge_halves[e2].e].bevel_weight)
                } else {
                    1.0
                };
                vco.lerp(v2co, wt * self.params.offset / 100.0)
            } else {
                vco.madd((v2co - vco).normalize_or_zero().0, self.params.offset)
            };
            return EdgeBetweenMeet { co, sinratio: Some(sinratio) };
        }

        match (m1.co, m2.co) {
            (Some(a), Some(b)) => EdgeBetweenMeet { co: a.midpoint(b), sinratio: Some(sinratio) },
            (Some(a), None) => EdgeBetweenMeet { co: a, sinratio: None },
            (None, Some(b)) => EdgeBetweenMeet { co: b, sinratio: None },
            // All three lines overlap.
            (None, None) => EdgeBetweenMeet {
                co: slide_dist(mesh, self.edge_halves[emid].e, v, self.edge_halves[e1].offset_r),
                sinratio: None,
            },
        }
    }

    /// Offset the vertex end of `eh` by its left (or right) offset in the plane with normal
    /// `plane_no`; an arbitrary plane through the edge when `None`.
    pub(crate) fn offset_in_plane(&self, mesh: &PolyMesh, eh: EhId, plane_no: Option<Vec3>, left: bool) -> Vec3 {
        let h = &self.edge_halves[eh];
        let edge = &mesh.edges[h.e];
        let v = if h.is_rev { edge.v2 } else { edge.v1 };
        let dir = self.eh_dir_from_vert(mesh, eh, v).normalize_or_zero().0;
        let no = plane_no.unwrap_or(if dir.x.abs() < dir.y.abs() { Vec3::X } else { Vec3::Y });
        let fdir = if left { dir.cross(no) } else { no.cross(dir) };
        let offset = if left { h.offset_l } else { h.offset_r };
        mesh.position(v).madd(fdir.normalize_or_zero().0, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> PolyMesh {
        PolyMesh::from_vertices_faces(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            &[vec![0, 1, 2, 3]],
        )
        .expect("valid square")
    }

    #[test]
    fn slide_stops_short_of_far_end() {
        let mesh = square();
        let e = mesh.edge_between(0, 1).expect("edge");
        let p = slide_dist(&mesh, e, 0, 0.25);
        assert!((p.x - 0.25).abs() < 1e-12);
        let q = slide_dist(&mesh, e, 0, 5.0);
        assert!(q.x < 1.0 && q.x > 0.99);
    }

    #[test]
    fn ccw_test_follows_face_winding() {
        let mesh = square();
        let a = mesh.edge_between(0, 1).expect("edge");
        let b = mesh.edge_between(1, 2).expect("edge");
        assert_eq!(bev_ccw_test(&mesh, a, b, Some(0)), -1);
        assert_eq!(bev_ccw_test(&mesh, b, a, Some(0)), 1);
        assert_eq!(bev_ccw_test(&mesh, a, b, None), 0);
    }

    #[test]
    fn parallel_checks() {
        assert!(nearly_parallel(Vec3::X, Vec3::new(-2.0, 0.0, 0.0)));
        assert!(!nearly_parallel(Vec3::X, Vec3::Y));
        assert!(nearly_parallel_normalized(Vec3::Z, -Vec3::Z));
    }
}
