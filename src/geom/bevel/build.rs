//! Vertex patch construction: create the patch's mesh vertices from its boundary and
//! grid, then fill it with faces in the pattern the boundary asked for.

use crate::geom::poly_mesh::{EdgeId, FaceId, PolyMesh, VertId};

use super::attrs::{FaceSource, closer_edge, incident_edges};
use super::context::{BEVEL_EPSILON, BevVertId, BevelContext, BvId, EhId, FaceKind, MeshPattern, VMesh};
use super::profile::{PRO_LINE_R, PRO_SQUARE_IN_R, PRO_SQUARE_R};
use super::vmesh::{Grid, TriCornerFit, canon_index, is_canon_index};

impl VMesh {
    fn is_canon(&self, i: usize, j: usize, k: usize) -> bool {
        is_canon_index(self.seg, i, j, k)
    }

    /// Copy every canonical vertex (position and mesh id) to its equivalent indices.
    fn copy_equiv(&mut self) {
        let ns2 = self.seg / 2;
        for i in 0..self.count {
            for j in 0..=ns2 {
                for k in 0..=self.seg {
                    if !self.is_canon(i, j, k) {
                        let from = canon_index(self.count, self.seg, i, j, k);
                        self.copy_vert((i, j, k), from);
                    }
                }
            }
        }
    }
}

/// The corners `idx` of a face source, for splitting one polygon into several.
fn pick_corners(source: &FaceSource, idx: &[usize]) -> FaceSource {
    let pick = |v: &Vec<Option<usize>>| -> Vec<Option<usize>> {
        if v.is_empty() { Vec::new() } else { idx.iter().map(|&i| v.get(i).copied().flatten()).collect() }
    };
    FaceSource {
        rep: source.rep,
        corners: pick(&source.corners),
        snaps: pick(&source.snaps),
    }
}

impl BevelContext {
    fn grid_vert(&self, bv: BevVertId, i: usize, j: usize, k: usize) -> Option<VertId> {
        self.bev_verts[bv].vmesh.at(i, j, k).v
    }

    /// Create the mesh vertex for grid point `(i, j, k)` at its stored position.
    fn create_grid_vert(&mut self, mesh: &mut PolyMesh, bv: BevVertId, i: usize, j: usize, k: usize) -> VertId {
        let co = self.bev_verts[bv].vmesh.co(i, j, k);
        let v = self.create_vert(mesh, co);
        self.bev_verts[bv].vmesh.at_mut(i, j, k).v = Some(v);
        v
    }

    /// Build all new vertices and faces for the patch of `bv`.
    pub(crate) fn build_vmesh(&mut self, mesh: &mut PolyMesh, bv: BevVertId) {
        let bounds = self.boundary(bv);
        let n = bounds.len();
        if n == 0 {
            return;
        }
        self.bev_verts[bv].vmesh.allocate();
        let ns = self.bev_verts[bv].vmesh.seg;
        let weld = self.bev_verts[bv].selcount == 2 && n == 2;
        let mut welds: Vec<BvId> = Vec::with_capacity(2);

        for &b in &bounds {
            let i = self.bound_verts[b].index;
            let co = self.bnd_co(b);
            self.bev_verts[bv].vmesh.set_co(i, 0, 0, co);
            let v = self.create_grid_vert(mesh, bv, i, 0, 0);
            self.bound_verts[b].nv.v = Some(v);
            if weld && self.bound_verts[b].ebev.is_some() {
                welds.push(b);
                if let [w1, w2] = welds[..] {
                    self.set_profile_params(mesh, bv, w1);
                    self.set_profile_params(mesh, bv, w2);
                    self.move_weld_profile_planes(mesh, bv, w1, w2);
                }
            }
        }

        self.calculate_vm_profiles(mesh, bv);

        let adj = matches!(self.bev_verts[bv].vmesh.kind, MeshPattern::Adj { .. });
        let seg_2 = self.seg_2();
        for &b in &bounds {
            let i = self.bound_verts[b].index;
            let next_i = self.bound_verts[self.bound_verts[b].next].index;
            self.bev_verts[bv].vmesh.copy_vert((i, 0, ns), (next_i, 0, 0));
            if adj || self.bound_verts[b].ebev.is_none() {
                continue;
            }
            for k in 1..ns {
                let co = self.bound_verts[b].profile.point(&self.params, seg_2, k, ns);
                self.bev_verts[bv].vmesh.set_co(i, 0, k, co);
                if !weld {
                    self.create_grid_vert(mesh, bv, i, 0, k);
                }
            }
        }
        if !adj && n == 2 {
            // The side without a beveled edge runs along the other side's profile, reversed.
            for &b in &bounds {
                if self.bound_verts[b].ebev.is_some() {
                    continue;
                }
                let i = self.bound_verts[b].index;
                for k in 1..ns {
                    self.bev_verts[bv].vmesh.copy_vert((i, 0, k), (1 - i, 0, ns - k));
                }
            }
        }

        if let [w1, w2] = welds[..] {
            self.build_weld(mesh, bv, w1, w2);
        }

        if matches!(n, 3 | 4) && self.params.seg > 1 {
            if let Some(vpipe) = self.pipe_test(mesh, bv) {
                self.bev_verts[bv].vmesh.kind = MeshPattern::Adj { pipe: Some(vpipe) };
            }
        }

        let kind = self.bev_verts[bv].vmesh.kind;
        log::debug!("bevel: vertex {} patch {kind:?} with {n} sides", self.bev_verts[bv].v);
        self.diagnostics.record_pattern(kind);
        match kind {
            MeshPattern::None => {
                if n == 2 && self.params.vertex_only() {
                    self.vert_two_edges(mesh, bv);
                }
            }
            MeshPattern::Poly => {
                self.build_poly(mesh, bv);
            }
            MeshPattern::TriFan => self.build_trifan(mesh, bv),
            MeshPattern::Adj { pipe } => self.build_rings(mesh, bv, pipe),
            MeshPattern::Cutoff => self.build_cutoff(mesh, bv),
        }
    }

    /// Two beveled edges meeting at a vertex with nothing else: one shared profile.
    fn build_weld(&mut self, mesh: &mut PolyMesh, bv: BevVertId, w1: BvId, w2: BvId) {
        self.bev_verts[bv].vmesh.kind = MeshPattern::None;
        let ns = self.bev_verts[bv].vmesh.seg;
        let (i1, i2) = (self.bound_verts[w1].index, self.bound_verts[w2].index);
        let (r1, r2) = (self.bound_verts[w1].profile.super_r, self.bound_verts[w2].profile.super_r);
        for k in 1..ns {
            let vm = &self.bev_verts[bv].vmesh;
            let (a, b) = (vm.co(i1, 0, k), vm.co(i2, 0, ns - k));
            let co = if self.params.is_custom() {
                a.midpoint(b)
            } else if r1 == PRO_LINE_R && r2 != PRO_LINE_R {
                b
            } else if r2 == PRO_LINE_R && r1 != PRO_LINE_R {
                a
            } else {
                a.midpoint(b)
            };
            self.bev_verts[bv].vmesh.set_co(i1, 0, k, co);
            self.create_grid_vert(mesh, bv, i1, 0, k);
        }
        for k in 1..ns {
            self.bev_verts[bv].vmesh.copy_vert((i2, 0, ns - k), (i1, 0, k));
        }
    }

    /// Vertex-only bevel of a vertex with two edges: a chain of profile points.
    fn vert_two_edges(&mut self, mesh: &mut PolyMesh, bv: BevVertId) {
        let ns = self.bev_verts[bv].vmesh.seg;
        if ns > 1 {
            let Some(start) = self.bev_verts[bv].vmesh.boundstart else {
                return;
            };
            let v1 = self.bev_verts[bv].vmesh.co(0, 0, 0);
            let v2 = self.bev_verts[bv].vmesh.co(1, 0, 0);
            let middle = mesh.position(self.bev_verts[bv].v);
            {
                let pro = &mut self.bound_verts[start].profile;
                pro.super_r = self.params.pro_super_r;
                pro.start = v1;
                pro.end = v2;
                pro.middle = middle;
                pro.plane_co = crate::geom::core::Vec3::ZERO;
                pro.plane_no = crate::geom::core::Vec3::ZERO;
                pro.proj_dir = crate::geom::core::Vec3::ZERO;
            }
            self.calculate_profile(start, false, false);
            let seg_2 = self.seg_2();
            for k in 1..ns {
                let co = self.bound_verts[start].profile.point(&self.params, seg_2, k, ns);
                self.bev_verts[bv].vmesh.set_co(0, 0, k, co);
                self.create_grid_vert(mesh, bv, 0, 0, k);
            }
            self.bev_verts[bv].vmesh.copy_vert((0, 0, ns), (1, 0, 0));
            for k in 1..ns {
                self.bev_verts[bv].vmesh.copy_vert((1, 0, ns - k), (0, 0, k));
            }
        }

        let v = self.bev_verts[bv].v;
        if mesh.vertex_faces(v).is_empty() {
            for k in 0..ns {
                if let (Some(a), Some(b)) = (self.grid_vert(bv, 0, 0, k), self.grid_vert(bv, 0, 0, k + 1)) {
                    if let Err(err) = mesh.add_edge(a, b) {
                        self.diagnostics.add_warning(format!("wire edge not created: {err}"));
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Single polygon and fan
    // ------------------------------------------------------------------------

    /// Corners and interpolation data for the single polygon over the whole boundary.
    fn poly_corners(&self, mesh: &PolyMesh, bv: BevVertId) -> (Vec<VertId>, FaceSource) {
        let repface = if self.bev_verts[bv].any_seam { self.frep_for_center_poly(mesh, bv) } else { None };
        let rep_edges = repface.and_then(|f| incident_edges(mesh, f, self.bev_verts[bv].v));
        let unsnapped = self.face_internal_boundverts(mesh, bv, repface);
        let snap_for = |co| rep_edges.map(|(e1, e2)| closer_edge(mesh, co, e1, e2));

        let mut verts = Vec::new();
        let mut faces = Vec::new();
        let mut snaps: Vec<Option<EdgeId>> = Vec::new();
        for b in self.boundary(bv) {
            let bnd = &self.bound_verts[b];
            let Some(v) = bnd.nv.v else { continue };
            verts.push(v);
            if repface.is_some() {
                faces.push(repface);
                snaps.push(if unsnapped.contains(&b) { None } else { snap_for(bnd.nv.co) });
            } else {
                faces.push(self.boundvert_rep_face(b));
                snaps.push(None);
            }
            let Some(ebev) = bnd.ebev else { continue };
            let seg = self.edge_halves[ebev].seg;
            for k in 1..seg {
                let nv = self.bev_verts[bv].vmesh.at(bnd.index, 0, k);
                let Some(v) = nv.v else { continue };
                verts.push(v);
                if repface.is_some() {
                    faces.push(repface);
                    snaps.push(if k < seg / 2 { None } else { snap_for(nv.co) });
                } else {
                    faces.push(self.boundvert_rep_face(b));
                    snaps.push(None);
                }
            }
        }
        let source = FaceSource { rep: repface, corners: faces, snaps };
        (verts, source)
    }

    fn build_poly(&mut self, mesh: &mut PolyMesh, bv: BevVertId) -> Option<FaceId> {
        let (verts, source) = self.poly_corners(mesh, bv);
        if verts.len() <= 2 {
            return None;
        }
        self.create_ngon(mesh, &verts, &source, FaceKind::Vert)
    }

    /// The polygon split into triangles fanning out from its last corner.
    fn build_trifan(&mut self, mesh: &mut PolyMesh, bv: BevVertId) {
        let (verts, source) = self.poly_corners(mesh, bv);
        let n = verts.len();
        if n <= 3 {
            if n == 3 {
                self.create_ngon(mesh, &verts, &source, FaceKind::Vert);
            }
            return;
        }
        let apex = n - 1;
        for t in 0..n - 2 {
            let idx = [apex, t, t + 1];
            let tri: Vec<VertId> = idx.iter().map(|&i| verts[i]).collect();
            self.create_ngon(mesh, &tri, &pick_corners(&source, &idx), FaceKind::Vert);
        }
    }

    // ------------------------------------------------------------------------
    // Rings
    // ------------------------------------------------------------------------

    /// Fill the patch with rings of quads from the boundary inward, plus a center polygon
    /// for odd segment counts.
    fn build_rings(&mut self, mesh: &mut PolyMesh, bv: BevVertId, vpipe: Option<BvId>) {
        let n = self.bev_verts[bv].vmesh.count;
        let ns = self.bev_verts[bv].vmesh.seg;
        let ns2 = ns / 2;
        let odd = ns % 2 == 1;
        let custom = self.params.is_custom();
        if n < 3 || ns < 2 {
            self.diagnostics.add_warning(format!("vertex {}: patch too small for rings", self.bev_verts[bv].v));
            return;
        }

        let grid = if !custom && self.params.pro_super_r == PRO_SQUARE_R && self.bev_verts[bv].selcount >= 3 && !odd {
            self.square_out_adj_vmesh(mesh, bv)
        } else if let Some(vpipe) = vpipe {
            self.pipe_adj_vmesh(mesh, bv, vpipe)
        } else if self.tri_corner_test(mesh, bv) == TriCornerFit::Exact {
            let grid = self.tri_corner_adj_vmesh(mesh, bv);
            if !custom && self.params.pro_super_r == PRO_SQUARE_IN_R {
                self.build_square_in_vmesh(mesh, bv, &grid);
                return;
            }
            grid
        } else {
            self.adj_vmesh(mesh, bv)
        };

        for i in 0..n {
            for j in 0..=ns2 {
                for k in 0..=ns {
                    if (j == 0 && (k == 0 || k == ns)) || !self.bev_verts[bv].vmesh.is_canon(i, j, k) {
                        continue;
                    }
                    self.bev_verts[bv].vmesh.set_co(i, j, k, grid.co(i, j, k));
                    self.create_grid_vert(mesh, bv, i, j, k);
                }
            }
        }
        self.bev_verts[bv].vmesh.copy_equiv();

        let bounds = self.boundary(bv);
        let rep_faces: Vec<Option<FaceId>> = bounds.iter().map(|&b| self.boundvert_rep_face(b)).collect();
        let edge_mode = !self.params.vertex_only();
        let ties = if odd && edge_mode {
            let center_frep = self.frep_for_center_poly(mesh, bv);
            let beats_next = (0..n)
                .map(|i| {
                    let pair = [rep_faces[i], rep_faces[(i + 1) % n]];
                    self.choose_rep_face(mesh, &pair) == rep_faces[i]
                })
                .collect();
            Some(CenterTies { center_frep, beats_next, rep_faces: rep_faces.clone() })
        } else {
            None
        };
        let mut center_verts: Vec<Option<VertId>> = vec![None; n];
        let mut center_snaps: Vec<Option<EdgeId>> = vec![None; n];
        let mut center_interps: Vec<Option<FaceId>> = vec![None; n];
        let any_seam = self.bev_verts[bv].any_seam;

        for &b in &bounds {
            let bnd = self.bound_verts[b].clone();
            let i = bnd.index;
            let inext = self.bound_verts[bnd.next].index;
            let f = rep_faces[i];
            let f2 = rep_faces[inext];
            let pick = |x: BvId| {
                if edge_mode { self.bound_verts[x].ebev } else { self.bound_verts[x].efirst }
            };
            let (e, eprev, enext) = (pick(b), pick(bnd.prev), pick(bnd.next));
            let edge_of = |eh: Option<EhId>| eh.map(|eh| self.edge_halves[eh].e);
            let seam_edge = |eh: Option<EhId>| {
                eh.filter(|&eh| self.edge_halves[eh].is_seam).map(|eh| self.edge_halves[eh].e)
            };
            let (bme, bmeprev) = (edge_of(e), edge_of(eprev));
            let bme_next_first = edge_of(self.bound_verts[bnd.next].efirst);
            let seams = (seam_edge(eprev), seam_edge(e), seam_edge(enext));
            let e_is_seam = e.is_some_and(|eh| self.edge_halves[eh].is_seam);
            let prev_has_bev = self.bound_verts[bnd.prev].ebev.is_some();
            let fc = ties.as_ref().map(|t| if t.beats_next[i] { f } else { f2 });

            for j in 0..ns2 {
                for k in 0..ns2 + usize::from(odd) {
                    let corners = [(i, j, k), (i, j, k + 1), (i, j + 1, k + 1), (i, j + 1, k)];
                    let vs: Vec<Option<VertId>> =
                        corners.iter().map(|&(a, b, c)| self.grid_vert(bv, a, b, c)).collect();
                    let Some(vs) = vs.into_iter().collect::<Option<Vec<VertId>>>() else {
                        continue;
                    };
                    let mut fr = [f; 4];
                    let mut se: [Option<EdgeId>; 4] = [None; 4];
                    if !edge_mode {
                        fr = [f2; 4];
                        if j < k {
                            if k == ns2 && j + 1 == ns2 {
                                se[2] = bme_next_first;
                                se[3] = bme;
                            }
                        } else if j == k {
                            se[0] = bme;
                            se[2] = bme;
                            if !e_is_seam {
                                fr[3] = f;
                            }
                        }
                    } else if let Some(t) = ties.as_ref() {
                        se = t.snap_edges(i, j, k, ns, seams.0, seams.1, seams.2);
                        if k == ns2 {
                            if e.is_none() || e_is_seam {
                                fr = [fc.flatten(); 4];
                            } else {
                                fr = [f, f2, f2, f];
                            }
                            if j + 1 == ns2 {
                                center_verts[i] = Some(vs[3]);
                                center_snaps[i] = se[3];
                                center_interps[i] = if any_seam { t.center_frep } else { f };
                            }
                        }
                    } else {
                        if k + 1 == ns2 {
                            se[1] = bme;
                        }
                        if j + 1 == ns2 && prev_has_bev {
                            se[3] = bmeprev;
                        }
                        se[2] = se[1].or(se[3]);
                    }
                    let source = FaceSource::corners(fr.to_vec()).with_snaps(se.to_vec());
                    self.create_ngon(mesh, &vs, &source, FaceKind::Vert);
                }
            }
        }

        if odd {
            if edge_mode {
                let frep = if any_seam { self.frep_for_center_poly(mesh, bv) } else { None };
                if let Some(verts) = center_verts.into_iter().collect::<Option<Vec<VertId>>>() {
                    let source = FaceSource { rep: frep, corners: center_interps, snaps: center_snaps };
                    self.create_ngon(mesh, &verts, &source, FaceKind::Vert);
                }
            } else {
                self.build_center_ngon(mesh, bv);
            }
        }
    }

    /// The inward-square profile on a cube corner: the boundary profiles meet pairwise and
    /// no rings remain, only the center polygon for odd segment counts.
    fn build_square_in_vmesh(&mut self, mesh: &mut PolyMesh, bv: BevVertId, grid: &Grid) {
        let n = self.bev_verts[bv].vmesh.count;
        let ns = self.bev_verts[bv].vmesh.seg;
        let ns2 = ns / 2;
        for i in 0..n {
            for k in 1..ns {
                self.bev_verts[bv].vmesh.set_co(i, 0, k, grid.co(i, 0, k));
                let shared = if i > 0 && k <= ns2 {
                    self.grid_vert(bv, i - 1, 0, ns - k)
                } else if i == n - 1 && k > ns2 {
                    self.grid_vert(bv, 0, 0, ns - k)
                } else {
                    None
                };
                match shared {
                    Some(v) => self.bev_verts[bv].vmesh.at_mut(i, 0, k).v = Some(v),
                    None => {
                        self.create_grid_vert(mesh, bv, i, 0, k);
                    }
                }
            }
        }
        if ns % 2 == 1 {
            for i in 0..n {
                self.bev_verts[bv].vmesh.copy_vert((i, ns2, ns2), (i, 0, ns2));
            }
            self.build_center_ngon(mesh, bv);
        }
    }

    /// Polygon through the `(i, ns/2, ns/2)` points of every side.
    fn build_center_ngon(&mut self, mesh: &mut PolyMesh, bv: BevVertId) {
        let ns2 = self.bev_verts[bv].vmesh.seg / 2;
        let frep = if self.bev_verts[bv].any_seam { self.frep_for_center_poly(mesh, bv) } else { None };
        let rep_edges = frep.and_then(|f| incident_edges(mesh, f, self.bev_verts[bv].v));
        let unsnapped = self.face_internal_boundverts(mesh, bv, frep);
        let mut verts = Vec::new();
        let mut faces = Vec::new();
        let mut snaps = Vec::new();
        for b in self.boundary(bv) {
            let i = self.bound_verts[b].index;
            let nv = *self.bev_verts[bv].vmesh.at(i, ns2, ns2);
            let Some(v) = nv.v else { continue };
            verts.push(v);
            if frep.is_some() {
                faces.push(frep);
                snaps.push(if unsnapped.contains(&b) {
                    None
                } else {
                    rep_edges.map(|(e1, e2)| closer_edge(mesh, nv.co, e1, e2))
                });
            } else {
                faces.push(self.boundvert_rep_face(b));
                snaps.push(None);
            }
        }
        let source = FaceSource { rep: frep, corners: faces, snaps };
        self.create_ngon(mesh, &verts, &source, FaceKind::Vert);
    }

    // ------------------------------------------------------------------------
    // Cutoff
    // ------------------------------------------------------------------------

    /// Cap every profile with a flat face dropping below it, and close the bottom.
    fn build_cutoff(&mut self, mesh: &mut PolyMesh, bv: BevVertId) {
        let bounds = self.boundary(bv);
        let n = bounds.len();
        let ns = self.bev_verts[bv].vmesh.seg;
        if ns < 2 {
            return;
        }
        let vno = self.bev_verts[bv].no;
        for &b in &bounds {
            let bnd = &self.bound_verts[b];
            let prev = &self.bound_verts[bnd.prev];
            let mut down = bnd.profile.plane_no.cross(prev.profile.plane_no);
            if down.dot(vno) > 0.0 {
                down = -down;
            }
            let length = (bnd.profile.height / std::f64::consts::SQRT_2
                + prev.profile.height / std::f64::consts::SQRT_2)
                / 2.0;
            let co = bnd.nv.co.madd(down, length);
            let (i, iprev) = (bnd.index, prev.index);
            self.bev_verts[bv].vmesh.set_co(i, 1, 0, co);
            self.bev_verts[bv].vmesh.set_co(iprev, 1, 1, co);
        }

        let vm = &self.bev_verts[bv].vmesh;
        let build_center = n != 3
            || ((0..3).all(|a| {
                let b = (a + 1) % 3;
                vm.co(a, 1, 0).distance_squared(vm.co(b, 1, 0)) > BEVEL_EPSILON
            }));

        if build_center {
            for &b in &bounds {
                let (i, iprev) = (self.bound_verts[b].index, self.bound_verts[self.bound_verts[b].prev].index);
                let v = self.create_grid_vert(mesh, bv, i, 1, 0);
                self.bev_verts[bv].vmesh.at_mut(iprev, 1, 1).v = Some(v);
            }
        } else {
            let v = self.create_grid_vert(mesh, bv, 0, 1, 0);
            for i in 1..n {
                self.bev_verts[bv].vmesh.at_mut(i, 1, 0).v = Some(v);
            }
        }

        for &b in &bounds {
            let i = self.bound_verts[b].index;
            let mut verts: Vec<Option<VertId>> = vec![self.grid_vert(bv, i, 1, 0)];
            verts.extend((0..=ns).map(|k| self.grid_vert(bv, i, 0, k)));
            if build_center {
                verts.push(self.grid_vert(bv, i, 1, 1));
            }
            if let Some(verts) = verts.into_iter().collect::<Option<Vec<VertId>>>() {
                self.create_ngon(mesh, &verts, &FaceSource::default(), FaceKind::Vert);
            }
        }
        if build_center {
            let bottom: Option<Vec<VertId>> = (0..n).map(|i| self.grid_vert(bv, i, 1, 0)).collect();
            if let Some(bottom) = bottom {
                self.create_ngon(mesh, &bottom, &FaceSource::default(), FaceKind::Vert);
            }
        }
    }
}

/// Tie-breaking data for odd segment counts in edge mode, where the center row and
/// column of a side could interpolate in either neighbouring face.
struct CenterTies {
    center_frep: Option<FaceId>,
    /// Side `i`'s face wins over side `i + 1`'s.
    beats_next: Vec<bool>,
    rep_faces: Vec<Option<FaceId>>,
}

impl CenterTies {
    fn center_snap(&self, i: usize, eprev: Option<EdgeId>, enext: Option<EdgeId>) -> Option<EdgeId> {
        let n = self.beats_next.len();
        let previ = (i + n - 1) % n;
        let nexti = (i + 1) % n;
        if self.beats_next[previ] && self.rep_faces[previ] == self.center_frep {
            eprev
        } else if !self.beats_next[i] && self.rep_faces[nexti] == self.center_frep {
            enext
        } else {
            None
        }
    }

    /// Snap edges for the corners of the quad with lower-left corner `(i, j, k)`. Only seam
    /// edges are passed in, so non-seam corners never snap.
    #[allow(clippy::too_many_arguments)]
    fn snap_edges(
        &self,
        i: usize,
        j: usize,
        k: usize,
        ns: usize,
        prev_seam: Option<EdgeId>,
        seam: Option<EdgeId>,
        next_seam: Option<EdgeId>,
    ) -> [Option<EdgeId>; 4] {
        let mut out = [None; 4];
        if ns % 2 == 0 {
            return out;
        }
        let n = self.beats_next.len();
        let ns2 = ns / 2;
        let previ = (i + n - 1) % n;
        for (corner, snap) in out.iter_mut().enumerate() {
            let jj = if corner < 2 { j } else { j + 1 };
            let kk = if corner == 0 || corner == 3 { k } else { k + 1 };
            *snap = if jj < ns2 && kk < ns2 {
                None
            } else if jj < ns2 && kk == ns2 {
                if self.beats_next[i] { None } else { seam }
            } else if jj < ns2 && kk == ns2 + 1 {
                if self.beats_next[i] { seam } else { None }
            } else if jj == ns2 && kk < ns2 {
                if self.beats_next[previ] { prev_seam } else { None }
            } else if jj == ns2 && kk == ns2 {
                self.center_snap(i, prev_seam, seam)
            } else if jj == ns2 && kk == ns2 + 1 {
                self.center_snap((i + 1) % n, seam, next_seam)
            } else {
                None
            };
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::bevel::options::{BevelOptions, BevelParams};

    #[test]
    fn vmesh_copy_equiv_shares_ids() {
        let mut vm = VMesh::new(3, 4, None);
        vm.at_mut(0, 1, 0).v = Some(42);
        vm.copy_equiv();
        // Past the middle of side 2's profile lies side 0's first ring.
        assert_eq!(vm.at(2, 0, 3).v, Some(42));
        vm.at_mut(0, 2, 2).v = Some(7);
        vm.copy_equiv();
        assert_eq!(vm.at(2, 2, 2).v, Some(7));
    }

    #[test]
    fn odd_ties_snap_center_row_to_the_winning_side() {
        let ties = CenterTies {
            center_frep: Some(0),
            beats_next: vec![true, false, false],
            rep_faces: vec![Some(0), Some(1), Some(2)],
        };
        // Side 1, corner on ring ns/2 below the center column: previous side wins.
        let se = ties.snap_edges(1, 0, 0, 3, Some(10), Some(11), Some(12));
        assert_eq!(se[3], Some(10));
        assert_eq!(se[0], None);
        let even = ties.snap_edges(1, 0, 0, 4, Some(10), Some(11), Some(12));
        assert_eq!(even, [None; 4]);
    }

    #[test]
    fn cube_corner_rings_make_quads() {
        let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
        for (a, b) in [(0, 1), (0, 3), (0, 4)] {
            let e = mesh.edge_between(a, b).expect("cube edge");
            mesh.edges[e].selected = true;
        }
        mesh.vertices[0].selected = true;
        let params = BevelParams::from_options(&BevelOptions::new(0.2, 2));
        let mut ctx = BevelContext::new(&mesh, params);
        let bv = ctx.bevel_vert_construct(&mesh, 0).expect("beveled");
        ctx.build_boundary(&mesh, bv, true);
        let before = mesh.faces.len();
        ctx.build_vmesh(&mut mesh, bv);
        let new_faces: Vec<FaceId> = (before..mesh.faces.len()).collect();
        assert_eq!(new_faces.len(), 3);
        assert!(new_faces.iter().all(|&f| mesh.face_len(f) == 4));
        assert!(new_faces.iter().all(|&f| ctx.face_kind(f) == FaceKind::Vert));
    }
}
