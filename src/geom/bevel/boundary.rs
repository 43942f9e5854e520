//! Boundary loops around bevel vertices and the profiles between their points.
//!
//! `build_boundary` runs twice per vertex: once constructing the loop and choosing the
//! patch pattern, and again after offsets are reconciled to move the points.

use crate::geom::core::{Tolerance, Vec3, intersect_line_plane, intersect_lines};
use crate::geom::poly_mesh::PolyMesh;

use super::attrs::EdgeMark;
use super::context::{BEVEL_EPSILON, BEVEL_EPSILON_BIG, BevVertId, BevelContext, BvId, EhId, MeshPattern};
use super::meet::{AngleKind, nearly_parallel, slide_dist};
use super::options::{InnerMiter, OffsetType, OuterMiter, VMeshMethod};
use super::profile::{PRO_CIRCLE_R, PRO_LINE_R};

impl BevelContext {
    // ------------------------------------------------------------------------
    // Profile parameters
    // ------------------------------------------------------------------------

    /// Set the control points and projection of the profile from `bndv` to its successor.
    pub(crate) fn set_profile_params(&mut self, mesh: &PolyMesh, bv: BevVertId, bndv: BvId) {
        let start = self.bnd_co(bndv);
        let end = self.bnd_co(self.bound_verts[bndv].next);
        let vco = mesh.position(self.bev_verts[bv].v);
        let selcount = self.bev_verts[bv].selcount;
        let pro_super_r = self.params.pro_super_r;
        let vertex_only = self.params.vertex_only();
        let ebev = self.bound_verts[bndv].ebev;
        let is_arc_start = self.bound_verts[bndv].is_arc_start;

        let mut do_linear_interp = true;
        let mut pro = self.bound_verts[bndv].profile.clone();
        if let Some(e) = ebev {
            do_linear_interp = false;
            let half = &self.edge_halves[e];
            let edge = &mesh.edges[half.e];
            let (ev1, ev2) = (mesh.position(edge.v1), mesh.position(edge.v2));
            pro.super_r = pro_super_r;
            let dir = if half.is_rev { ev2 - ev1 } else { ev1 - ev2 };
            pro.proj_dir = dir.normalize_or_zero().0;
            pro.middle = intersect_lines(ev1, ev2, start, end).first().unwrap_or(ev1);
            pro.start = start;
            pro.end = end;
            let mut d1 = (pro.middle - start).normalize_or_zero().0;
            let mut d2 = (pro.middle - end).normalize_or_zero().0;
            pro.plane_no = d1.cross(d2).normalize_or_zero().0;
            if nearly_parallel(d1, d2) {
                // Start, middle and end are collinear: move the profile into the plane of
                // the beveled edge and the two boundary points.
                pro.middle = vco;
                let (prev, next) = (half.prev, half.next);
                if self.edge_halves[prev].is_bev && self.edge_halves[next].is_bev && selcount >= 3 {
                    let edge_dir = |eh: EhId| {
                        let edge = &mesh.edges[self.edge_halves[eh].e];
                        (mesh.position(edge.v1) - mesh.position(edge.v2)).normalize_or_zero().0
                    };
                    let d3 = edge_dir(prev);
                    let d4 = edge_dir(next);
                    if nearly_parallel(d3, d4) {
                        pro.middle = start.midpoint(end);
                        do_linear_interp = true;
                    } else if let Some(meet) = intersect_lines(start, start + d3, end, end + d4).first() {
                        pro.middle = meet;
                    } else {
                        pro.middle = start.midpoint(end);
                        do_linear_interp = true;
                    }
                }
                pro.end = end;
                d1 = (pro.middle - start).normalize_or_zero().0;
                d2 = (pro.middle - end).normalize_or_zero().0;
                pro.plane_no = d1.cross(d2).normalize_or_zero().0;
                if nearly_parallel(d1, d2) {
                    do_linear_interp = true;
                } else {
                    pro.proj_dir = pro.plane_no;
                }
            }
            pro.plane_co = start;
        } else if is_arc_start {
            // `middle` was placed when the miter was made.
            pro.start = start;
            pro.end = end;
            pro.super_r = PRO_CIRCLE_R;
            pro.plane_co = Vec3::ZERO;
            pro.plane_no = Vec3::ZERO;
            pro.proj_dir = Vec3::ZERO;
            do_linear_interp = false;
        } else if vertex_only {
            pro.start = start;
            pro.middle = vco;
            pro.end = end;
            pro.super_r = pro_super_r;
            pro.plane_co = Vec3::ZERO;
            pro.plane_no = Vec3::ZERO;
            pro.proj_dir = Vec3::ZERO;
            do_linear_interp = false;
        }

        if do_linear_interp {
            pro.super_r = PRO_LINE_R;
            pro.start = start;
            pro.end = end;
            pro.middle = start.midpoint(end);
            pro.plane_co = Vec3::ZERO;
            pro.plane_no = Vec3::ZERO;
            pro.proj_dir = Vec3::ZERO;
        }
        self.bound_verts[bndv].profile = pro;
    }

    /// Tilt the profile plane of `bndv` to contain the original vertex, when that keeps
    /// the projection well defined. Marks the parameters as final.
    fn move_profile_plane(&mut self, mesh: &PolyMesh, bndv: BvId, bv: BevVertId) {
        let vco = mesh.position(self.bev_verts[bv].v);
        let pro = &mut self.bound_verts[bndv].profile;
        if Tolerance::ZERO_LENGTH.is_zero_vec3(pro.proj_dir) {
            return;
        }
        let d1 = (vco - pro.start).normalize_or_zero().0;
        let d2 = (vco - pro.end).normalize_or_zero().0;
        let (no, l1) = d1.cross(d2).normalize_or_zero();
        let (no2, l2) = d1.cross(pro.proj_dir).normalize_or_zero();
        let (no3, l3) = d2.cross(pro.proj_dir).normalize_or_zero();
        if l1 > BEVEL_EPSILON_BIG && l2 > BEVEL_EPSILON_BIG && l3 > BEVEL_EPSILON_BIG {
            let dot2 = no.dot(no2);
            let dot3 = no.dot(no3);
            if dot2.abs() < 1.0 - BEVEL_EPSILON_BIG && dot3.abs() < 1.0 - BEVEL_EPSILON_BIG {
                pro.plane_no = no;
            }
        }
        pro.special_params = true;
    }

    /// Move both profile planes of a weld into the plane through the original vertex and
    /// the two boundary points.
    pub(crate) fn move_weld_profile_planes(&mut self, mesh: &PolyMesh, bv: BevVertId, bndv1: BvId, bndv2: BvId) {
        let p1 = self.bound_verts[bndv1].profile.proj_dir;
        let p2 = self.bound_verts[bndv2].profile.proj_dir;
        if Tolerance::ZERO_LENGTH.is_zero_vec3(p1) || Tolerance::ZERO_LENGTH.is_zero_vec3(p2) {
            return;
        }
        let vco = mesh.position(self.bev_verts[bv].v);
        let d1 = vco - self.bnd_co(bndv1);
        let d2 = vco - self.bnd_co(bndv2);
        let (no, l1) = d1.cross(d2).normalize_or_zero();
        let (no2, l2) = d1.cross(p1).normalize_or_zero();
        let (no3, l3) = d2.cross(p2).normalize_or_zero();
        if l1 != 0.0 && (l2 != 0.0 || l3 != 0.0) {
            if (no.dot(no2).abs() - 1.0).abs() > BEVEL_EPSILON {
                self.bound_verts[bndv1].profile.plane_no = no;
            }
            if (no.dot(no3).abs() - 1.0).abs() > BEVEL_EPSILON {
                self.bound_verts[bndv2].profile.plane_no = no;
            }
        }
        self.bound_verts[bndv1].profile.special_params = true;
        self.bound_verts[bndv2].profile.special_params = true;
    }

    /// Sample every profile of `bv`'s boundary.
    pub(crate) fn calculate_vm_profiles(&mut self, mesh: &PolyMesh, bv: BevVertId) {
        for bndv in self.boundary(bv) {
            if !self.bound_verts[bndv].profile.special_params {
                self.set_profile_params(mesh, bv, bndv);
            }
            let (miter, reverse) = if self.params.is_custom() {
                let b = &self.bound_verts[bndv];
                let miter = b.is_arc_start || b.is_patch_start;
                (miter, !b.is_profile_start && !miter)
            } else {
                (false, false)
            };
            self.calculate_profile(bndv, reverse, miter);
        }
    }

    pub(crate) fn calculate_profile(&mut self, bndv: BvId, reversed: bool, miter: bool) {
        let spacing = if miter { &self.pro_spacing_miter } else { &self.pro_spacing };
        let seg_2 = self.pro_spacing.seg_2;
        self.bound_verts[bndv]
            .profile
            .calculate(&self.params, spacing, seg_2, reversed);
    }

    // ------------------------------------------------------------------------
    // Seams
    // ------------------------------------------------------------------------

    fn set_bound_vert_seams(&mut self, mesh: &PolyMesh, bv: BevVertId) {
        let mut any = false;
        for v in self.boundary(bv) {
            let mut seam = false;
            let (first, last) = (self.bound_verts[v].efirst, self.bound_verts[v].elast);
            if let Some(first) = first {
                let mut e = first;
                loop {
                    seam |= self.edge_halves[e].is_seam;
                    if Some(e) == last {
                        break;
                    }
                    e = self.edge_halves[e].next;
                    if e == first {
                        break;
                    }
                }
            }
            self.bound_verts[v].any_seam = seam;
            any |= seam;
        }
        self.bev_verts[bv].any_seam = any;
        if self.params.mark_seam {
            self.check_edge_data_seam_sharp(mesh, bv, EdgeMark::Seam);
        }
        if self.params.mark_sharp {
            self.check_edge_data_seam_sharp(mesh, bv, EdgeMark::Sharp);
        }
    }

    // ------------------------------------------------------------------------
    // Boundary construction
    // ------------------------------------------------------------------------

    fn place_bound_vert(&mut self, bv: BevVertId, existing: Option<BvId>, co: Vec3, construct: bool) -> BvId {
        match (construct, existing) {
            (false, Some(v)) => {
                self.bound_verts[v].nv.co = co;
                v
            }
            _ => self.add_bound_vert(bv, co),
        }
    }

    fn build_boundary_vertex_only(&mut self, mesh: &PolyMesh, bv: BevVertId, construct: bool) {
        let v = self.bev_verts[bv].v;
        for e in self.bev_verts[bv].edges.clone() {
            let co = slide_dist(mesh, self.edge_halves[e].e, v, self.edge_halves[e].offset_l);
            let bndv = self.place_bound_vert(bv, self.edge_halves[e].leftv, co, construct);
            if construct {
                self.bound_verts[bndv].efirst = Some(e);
                self.bound_verts[bndv].elast = Some(e);
                self.edge_halves[e].leftv = Some(bndv);
                self.edge_halves[e].rightv = Some(bndv);
            }
        }
        if construct {
            self.set_bound_vert_seams(mesh, bv);
            let vm = &mut self.bev_verts[bv].vmesh;
            vm.kind = if vm.count == 2 {
                MeshPattern::None
            } else if self.params.seg == 1 {
                MeshPattern::Poly
            } else {
                MeshPattern::Adj { pipe: None }
            };
        }
    }

    /// Only one beveled edge, `efirst`, reaches this vertex.
    fn build_boundary_terminal_edge(&mut self, mesh: &PolyMesh, bv: BevVertId, efirst: EhId, construct: bool) {
        let v = self.bev_verts[bv].v;
        let edgecount = self.bev_verts[bv].edgecount;
        let e = efirst;

        if edgecount == 2 {
            // Close the bevel with an artificial point on the unbeveled edge.
            let (fprev, fnext) = (self.edge_halves[e].fprev, self.edge_halves[e].fnext);
            let no = fprev.or(fnext).map(|f| mesh.face_normal(f));
            let co = self.offset_in_plane(mesh, e, no, true);
            let b = self.place_bound_vert(bv, self.edge_halves[e].leftv, co, construct);
            if construct {
                let bnd = &mut self.bound_verts[b];
                bnd.efirst = Some(e);
                bnd.elast = Some(e);
                bnd.ebev = Some(e);
                self.edge_halves[e].leftv = Some(b);
            }
            let no = fnext.or(fprev).map(|f| mesh.face_normal(f));
            let co = self.offset_in_plane(mesh, e, no, false);
            let b = self.place_bound_vert(bv, self.edge_halves[e].rightv, co, construct);
            if construct {
                self.bound_verts[b].efirst = Some(e);
                self.bound_verts[b].elast = Some(e);
                self.edge_halves[e].rightv = Some(b);
            }
            let enext = self.edge_halves[e].next;
            let co = slide_dist(mesh, self.edge_halves[enext].e, v, self.edge_halves[e].offset_l);
            let b = self.place_bound_vert(bv, self.edge_halves[enext].leftv, co, construct);
            if construct {
                self.bound_verts[b].efirst = Some(enext);
                self.bound_verts[b].elast = Some(enext);
                self.edge_halves[enext].leftv = Some(b);
                self.edge_halves[enext].rightv = Some(b);
            }
        } else {
            // Points on the two neighbouring edges, then slide along the rest.
            let leg_slide = matches!(self.params.offset_type, OffsetType::Percent | OffsetType::Absolute);
            let eprev = self.edge_halves[e].prev;
            let co = if leg_slide {
                slide_dist(mesh, self.edge_halves[eprev].e, v, self.edge_halves[e].offset_l)
            } else {
                self.offset_meet(mesh, eprev, e, bv, self.edge_halves[e].fprev, false, None)
            };
            let b = self.place_bound_vert(bv, self.edge_halves[e].leftv, co, construct);
            if construct {
                let bnd = &mut self.bound_verts[b];
                bnd.efirst = Some(eprev);
                bnd.elast = Some(e);
                bnd.ebev = Some(e);
                self.edge_halves[e].leftv = Some(b);
                self.edge_halves[eprev].leftv = Some(b);
                self.edge_halves[eprev].rightv = Some(b);
            }

            let e1 = self.edge_halves[e].next;
            let co = if leg_slide {
                slide_dist(mesh, self.edge_halves[e1].e, v, self.edge_halves[e].offset_r)
            } else {
                self.offset_meet(mesh, e, e1, bv, self.edge_halves[e1].fprev, false, None)
            };
            let b = self.place_bound_vert(bv, self.edge_halves[e1].leftv, co, construct);
            if construct {
                self.bound_verts[b].efirst = Some(e);
                self.bound_verts[b].elast = Some(e1);
                self.edge_halves[e1].leftv = Some(b);
                self.edge_halves[e1].rightv = Some(b);
                self.edge_halves[e].rightv = Some(b);
            }

            let mut d = self.edge_halves[efirst].offset_l_spec;
            if self.params.is_custom() || self.params.profile < 0.25 {
                // Room for the full profile area.
                d *= std::f64::consts::SQRT_2;
            }
            let mut e3 = self.edge_halves[e1].next;
            while self.edge_halves[e3].next != efirst {
                let co = slide_dist(mesh, self.edge_halves[e3].e, v, d);
                let b = self.place_bound_vert(bv, self.edge_halves[e3].leftv, co, construct);
                if construct {
                    self.bound_verts[b].efirst = Some(e3);
                    self.bound_verts[b].elast = Some(e3);
                    self.edge_halves[e3].leftv = Some(b);
                    self.edge_halves[e3].rightv = Some(b);
                }
                e3 = self.edge_halves[e3].next;
            }
        }

        if edgecount >= 3 {
            // Snap the profile to the plane of the two neighbouring edges.
            if let Some(start) = self.bev_verts[bv].vmesh.boundstart {
                self.set_profile_params(mesh, bv, start);
                self.move_profile_plane(mesh, start, bv);
            }
        }

        if construct {
            self.set_bound_vert_seams(mesh, bv);
            let count = self.bev_verts[bv].vmesh.count;
            let kind = if count == 2 && edgecount == 3 {
                MeshPattern::None
            } else if count == 3 {
                let mut use_tri_fan = true;
                if self.params.is_custom() {
                    // A point in the profile plane would overhang: use a polygon.
                    if let (Some(l), Some(r)) = (self.edge_halves[efirst].leftv, self.edge_halves[efirst].rightv) {
                        let pro = &self.bound_verts[l].profile;
                        let extra = self.bnd_co(self.bound_verts[r].next);
                        let (no, _) = pro.plane_no.normalize_or_zero();
                        let dist = (extra - pro.plane_co).dot(no);
                        if dist * dist < BEVEL_EPSILON_BIG {
                            use_tri_fan = false;
                        }
                    }
                }
                if use_tri_fan { MeshPattern::TriFan } else { MeshPattern::Poly }
            } else {
                MeshPattern::Poly
            };
            self.bev_verts[bv].vmesh.kind = kind;
        }
    }

    /// Place the outer miter points around `emiter` so the miter has some width.
    fn adjust_miter_coords(&mut self, mesh: &PolyMesh, bv: BevVertId, emiter: EhId) {
        let v = self.bev_verts[bv].v;
        let vco = mesh.position(v);
        let Some(v1) = self.edge_halves[emiter].rightv else {
            return;
        };
        let v3 = if self.params.miter_outer == OuterMiter::Patch {
            self.bound_verts[self.bound_verts[v1].next].next
        } else {
            self.bound_verts[v1].next
        };
        let v1prev = self.bound_verts[v1].prev;
        let v3next = self.bound_verts[v3].next;
        let co2 = self.bnd_co(v1);
        if self.bound_verts[v1].is_arc_start {
            self.bound_verts[v1].profile.middle = co2;
        }

        let d = self.params.offset / (self.params.seg as f64 / 2.0);
        let edge_dir = (vco - mesh.position(mesh.edge_other_vert(self.edge_halves[emiter].e, v)))
            .normalize_or_zero()
            .0;
        let line_p = co2.madd(edge_dir, d);
        let co1 = intersect_line_plane(co2, line_p, self.bnd_co(v1prev), edge_dir).unwrap_or(line_p);
        self.bound_verts[v1].nv.co = co1;

        let Some(emiter_other) = self.bound_verts[v3].elast else {
            return;
        };
        let edge_dir = (vco - mesh.position(mesh.edge_other_vert(self.edge_halves[emiter_other].e, v)))
            .normalize_or_zero()
            .0;
        let line_p = co2.madd(edge_dir, d);
        let co3 = intersect_line_plane(co2, line_p, self.bnd_co(v3next), edge_dir).unwrap_or(line_p);
        self.bound_verts[v3].nv.co = co3;
    }

    /// Spread inner arc miters apart along their edges.
    fn adjust_miter_inner_coords(&mut self, mesh: &PolyMesh, bv: BevVertId, emiter: Option<EhId>) {
        let v = self.bev_verts[bv].v;
        let vco = mesh.position(v);
        let Some(vstart) = self.bev_verts[bv].vmesh.boundstart else {
            return;
        };
        let spread = self.params.spread;
        let mut b = vstart;
        loop {
            if self.bound_verts[b].is_arc_start {
                let b3 = self.bound_verts[b].next;
                let e = self.bound_verts[b].efirst;
                if e.is_some() && e != emiter {
                    let co = self.bnd_co(b);
                    let dir_of = |eh: EhId| {
                        (mesh.position(mesh.edge_other_vert(self.edge_halves[eh].e, v)) - vco)
                            .normalize_or_zero()
                            .0
                    };
                    if let Some(e) = e {
                        self.bound_verts[b].nv.co = co.madd(dir_of(e), spread);
                    }
                    if let Some(e3) = self.bound_verts[b3].elast {
                        self.bound_verts[b3].nv.co = co.madd(dir_of(e3), spread);
                    }
                }
                b = self.bound_verts[b3].next;
                if b3 == vstart {
                    break;
                }
            } else {
                b = self.bound_verts[b].next;
            }
            if b == vstart {
                break;
            }
        }
    }

    /// Build (or, when `construct` is false, re-place) the boundary loop of `bv`.
    pub(crate) fn build_boundary(&mut self, mesh: &PolyMesh, bv: BevVertId, construct: bool) {
        if self.bev_verts[bv].edgecount <= 1 {
            return;
        }
        if self.params.vertex_only() {
            self.build_boundary_vertex_only(mesh, bv, construct);
            return;
        }
        let Some(efirst) = self.next_bev(bv, None) else {
            return;
        };
        if self.bev_verts[bv].selcount == 1 {
            self.build_boundary_terminal_edge(mesh, bv, efirst, construct);
            return;
        }

        // Outer miters need at least three beveled edges.
        let miter_outer = if self.bev_verts[bv].selcount >= 3 {
            self.params.miter_outer
        } else {
            OuterMiter::Sharp
        };
        let miter_inner = self.params.miter_inner;
        let mut emiter: Option<EhId> = None;

        let mut e = efirst;
        loop {
            // Classify the unbeveled edges up to the next beveled one.
            let mut in_plane = 0;
            let mut not_in_plane = 0;
            let mut eip = None;
            let mut enip = None;
            let mut e2 = self.edge_halves[e].next;
            while !self.edge_halves[e2].is_bev {
                if self.eh_on_plane(mesh, e2) {
                    in_plane += 1;
                    eip = Some(e2);
                } else {
                    not_in_plane += 1;
                    enip = Some(e2);
                }
                e2 = self.edge_halves[e2].next;
            }

            let mut eon = None;
            let mut sinratio = 1.0;
            let fnext = self.edge_halves[e].fnext;
            let co = match (eip, enip) {
                (None, None) => self.offset_meet(mesh, e, e2, bv, fnext, false, None),
                (_, Some(enip)) => {
                    if self.params.loop_slide
                        && not_in_plane == 1
                        && self.good_offset_on_edge_between(mesh, e, e2, enip, bv)
                    {
                        let m = self.offset_on_edge_between(mesh, e, e2, enip, bv);
                        if let Some(r) = m.sinratio {
                            eon = Some(enip);
                            sinratio = r;
                        }
                        m.co
                    } else {
                        self.offset_meet(mesh, e, e2, bv, None, true, eip)
                    }
                }
                (Some(eip), None) => {
                    if self.params.loop_slide
                        && in_plane == 1
                        && self.good_offset_on_edge_between(mesh, e, e2, eip, bv)
                    {
                        let m = self.offset_on_edge_between(mesh, e, e2, eip, bv);
                        if let Some(r) = m.sinratio {
                            eon = Some(eip);
                            sinratio = r;
                        }
                        m.co
                    } else {
                        // All edges between share a plane: same as no edges between.
                        self.offset_meet(mesh, e, e2, bv, fnext, false, None)
                    }
                }
            };

            let ang_kind = self.edges_angle_kind(mesh, e, e2, bv);
            let miter = (miter_outer != OuterMiter::Sharp && emiter.is_none() && ang_kind == AngleKind::Larger)
                || (miter_inner != InnerMiter::Sharp && ang_kind == AngleKind::Smaller);
            let patch = ang_kind == AngleKind::Larger && miter_outer == OuterMiter::Patch;
            if miter && ang_kind == AngleKind::Larger {
                emiter = Some(e);
            }

            if construct {
                let v = self.add_bound_vert(bv, co);
                {
                    let b = &mut self.bound_verts[v];
                    b.efirst = Some(e);
                    b.elast = Some(e2);
                    b.ebev = Some(e2);
                    b.eon = eon;
                    if eon.is_some() {
                        b.sinratio = sinratio;
                    }
                }
                self.edge_halves[e].rightv = Some(v);
                self.edge_halves[e2].leftv = Some(v);
                let mut e3 = self.edge_halves[e].next;
                while e3 != e2 {
                    self.edge_halves[e3].leftv = Some(v);
                    self.edge_halves[e3].rightv = Some(v);
                    e3 = self.edge_halves[e3].next;
                }
                if miter {
                    self.diagnostics.miter_count += 1;
                    self.construct_miter(bv, v, e, e2, co, patch, in_plane + not_in_plane);
                }
            } else if let Some(v1) = self.edge_halves[e].rightv {
                self.bound_verts[v1].nv.co = co;
                if miter {
                    let v2 = self.bound_verts[v1].next;
                    self.bound_verts[v2].nv.co = co;
                    if patch {
                        let v3 = self.bound_verts[v2].next;
                        self.bound_verts[v3].nv.co = co;
                    }
                }
            }
            e = e2;
            if e == efirst {
                break;
            }
        }

        if miter_inner != InnerMiter::Sharp {
            self.adjust_miter_inner_coords(mesh, bv, emiter);
        }
        if let Some(emiter) = emiter {
            self.adjust_miter_coords(mesh, bv, emiter);
        }

        if construct {
            self.set_bound_vert_seams(mesh, bv);
            let vm = &mut self.bev_verts[bv].vmesh;
            vm.kind = if vm.count == 2 {
                MeshPattern::None
            } else if self.edge_halves[efirst].seg == 1 {
                MeshPattern::Poly
            } else {
                match self.params.vmesh_method {
                    VMeshMethod::Grid => MeshPattern::Adj { pipe: None },
                    VMeshMethod::Cutoff => MeshPattern::Cutoff,
                }
            };
        }
    }

    /// Add the extra boundary points of a miter after `v1`, the point between `e` and `e2`.
    #[allow(clippy::too_many_arguments)]
    fn construct_miter(&mut self, bv: BevVertId, v1: BvId, e: EhId, e2: EhId, co: Vec3, patch: bool, between: usize) {
        self.bound_verts[v1].ebev = None;
        let v2 = if patch { Some(self.add_bound_vert(bv, co)) } else { None };
        let v3 = self.add_bound_vert(bv, co);
        {
            let b3 = &mut self.bound_verts[v3];
            b3.ebev = Some(e2);
            b3.efirst = Some(e2);
            b3.elast = Some(e2);
            b3.eon = None;
        }
        self.edge_halves[e2].leftv = Some(v3);

        if let Some(v2) = v2 {
            self.bound_verts[v1].is_patch_start = true;
            let (eon, sinratio) = (self.bound_verts[v1].eon, self.bound_verts[v1].sinratio);
            {
                let b2 = &mut self.bound_verts[v2];
                b2.eon = eon;
                b2.sinratio = sinratio;
                b2.ebev = None;
            }
            let b1 = &mut self.bound_verts[v1];
            b1.eon = None;
            b1.sinratio = 1.0;
            b1.elast = Some(e);
            let enext = self.edge_halves[e].next;
            if enext == e2 {
                self.bound_verts[v2].efirst = None;
                self.bound_verts[v2].elast = None;
            } else {
                self.bound_verts[v2].efirst = Some(enext);
                let mut e3 = enext;
                while e3 != e2 {
                    self.edge_halves[e3].leftv = Some(v2);
                    self.edge_halves[e3].rightv = Some(v2);
                    self.bound_verts[v2].elast = Some(e3);
                    e3 = self.edge_halves[e3].next;
                }
            }
        } else {
            self.bound_verts[v1].is_arc_start = true;
            self.bound_verts[v1].profile.middle = co;
            let enext = self.edge_halves[e].next;
            if enext == e2 {
                self.bound_verts[v1].elast = self.bound_verts[v1].efirst;
            } else {
                // First half of the edges between attach to the start of the arc, the
                // second half to its end and an odd middle one to its midpoint.
                let bet2 = between / 2;
                let betodd = between % 2 == 1;
                let seg = self.params.seg;
                let mut i = 0;
                let mut e3 = enext;
                while e3 != e2 {
                    self.bound_verts[v1].elast = Some(e3);
                    self.edge_halves[e3].profile_index = if i < bet2 {
                        0
                    } else if betodd && i == bet2 {
                        seg / 2
                    } else {
                        seg
                    };
                    i += 1;
                    e3 = self.edge_halves[e3].next;
                }
            }
        }
    }

    /// Is `eh` between two faces whose normals are parallel?
    pub(crate) fn eh_on_plane(&self, mesh: &PolyMesh, eh: EhId) -> bool {
        let h = &self.edge_halves[eh];
        if let (Some(fp), Some(fnx)) = (h.fprev, h.fnext) {
            let dot = mesh.face_normal(fp).dot(mesh.face_normal(fnx));
            (dot + 1.0).abs() <= BEVEL_EPSILON_BIG || (dot - 1.0).abs() <= BEVEL_EPSILON_BIG
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::bevel::options::{AffectType, BevelOptions, BevelParams};

    fn built(options: BevelOptions, edges: &[(usize, usize)], verts: &[usize]) -> (PolyMesh, BevelContext) {
        let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
        for &(a, b) in edges {
            let e = mesh.edge_between(a, b).expect("cube edge");
            mesh.edges[e].selected = true;
        }
        for &v in verts {
            mesh.vertices[v].selected = true;
        }
        let mut ctx = BevelContext::new(&mesh, BevelParams::from_options(&options));
        for v in 0..8 {
            if ctx.vert_tagged(v) {
                if let Some(bv) = ctx.bevel_vert_construct(&mesh, v) {
                    ctx.build_boundary(&mesh, bv, true);
                }
            }
        }
        (mesh, ctx)
    }

    fn sorted_coords(p: Vec3) -> [f64; 3] {
        let mut c = p.to_array();
        c.sort_by(f64::total_cmp);
        c
    }

    fn assert_loop_links(ctx: &BevelContext, bv: BevVertId) {
        let bounds = ctx.boundary(bv);
        assert_eq!(bounds.len(), ctx.bev_verts[bv].vmesh.count);
        for (i, &b) in bounds.iter().enumerate() {
            assert_eq!(ctx.bound_verts[b].index, i);
            assert_eq!(ctx.bound_verts[ctx.bound_verts[b].next].prev, b);
        }
    }

    #[test]
    fn three_edge_corner_meets_on_each_face() {
        let (_, ctx) = built(BevelOptions::new(0.1, 2), &[(0, 1), (0, 3), (0, 4)], &[0, 1, 3, 4]);
        let bv = ctx.find_bevvert(0).expect("beveled");
        assert_loop_links(&ctx, bv);
        assert_eq!(ctx.bev_verts[bv].vmesh.count, 3);
        assert_eq!(ctx.bev_verts[bv].vmesh.kind, MeshPattern::Adj { pipe: None });
        for b in ctx.boundary(bv) {
            let c = sorted_coords(ctx.bnd_co(b));
            assert!(c[0].abs() < 1e-9, "{c:?}");
            assert!((c[1] - 0.1).abs() < 1e-9 && (c[2] - 0.1).abs() < 1e-9, "{c:?}");
        }
    }

    #[test]
    fn single_segment_corner_is_one_polygon() {
        let (_, ctx) = built(BevelOptions::new(0.1, 1), &[(0, 1), (0, 3), (0, 4)], &[0, 1, 3, 4]);
        let bv = ctx.find_bevvert(0).expect("beveled");
        assert_eq!(ctx.bev_verts[bv].vmesh.kind, MeshPattern::Poly);
    }

    #[test]
    fn terminal_edge_slides_along_its_neighbours() {
        let (_, ctx) = built(BevelOptions::new(0.1, 3), &[(0, 1)], &[0, 1]);
        let bv = ctx.find_bevvert(0).expect("beveled");
        assert_loop_links(&ctx, bv);
        assert_eq!(ctx.bev_verts[bv].vmesh.count, 2);
        assert_eq!(ctx.bev_verts[bv].vmesh.kind, MeshPattern::None);
        for b in ctx.boundary(bv) {
            let c = sorted_coords(ctx.bnd_co(b));
            assert!(c[0].abs() < 1e-9 && c[1].abs() < 1e-9, "{c:?}");
            assert!((c[2] - 0.1).abs() < 1e-9, "{c:?}");
        }
    }

    #[test]
    fn vertex_mode_points_sit_on_the_edges() {
        let options = BevelOptions::new(0.25, 2).with_affect(AffectType::Vertices);
        let (mesh, mut ctx) = built(options, &[], &[6]);
        let bv = ctx.find_bevvert(6).expect("beveled");
        assert_loop_links(&ctx, bv);
        assert_eq!(ctx.bev_verts[bv].vmesh.count, 3);
        for b in ctx.boundary(bv) {
            assert!((ctx.bnd_co(b).distance(Vec3::splat(1.0)) - 0.25).abs() < 1e-9);
        }

        ctx.build_boundary(&mesh, bv, false);
        assert_eq!(ctx.bev_verts[bv].vmesh.count, 3);
    }
}
