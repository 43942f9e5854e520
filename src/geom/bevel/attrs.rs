//! Attributes of the new geometry: representative faces, UV interpolation, seam and
//! sharp propagation, hardened normals and weighted-normal face strength.

use std::collections::HashMap;

use crate::geom::core::{Vec3, closest_on_segment, dist_squared_to_segment, plane_frame, polygon_area_2d};
use crate::geom::poly_mesh::{EdgeId, FaceId, FaceStrength, LoopRef, PolyMesh, VertId};

use super::context::{BEVEL_EPSILON_BIG, BevVertId, BevelContext, BvId, FaceKind, MeshPattern};
use super::options::FaceStrengthMode;

/// Two corner UVs closer than this (squared) count as the same.
const UV_EQUAL_SQ: f64 = 1e-10;

/// Edge flag carried from original edges onto new boundary edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EdgeMark {
    Seam,
    Sharp,
}

impl EdgeMark {
    fn test(self, mesh: &PolyMesh, e: EdgeId) -> bool {
        match self {
            Self::Seam => mesh.edges[e].seam,
            Self::Sharp => mesh.edges[e].sharp,
        }
    }

    fn set(self, mesh: &mut PolyMesh, e: EdgeId) {
        match self {
            Self::Seam => mesh.edges[e].seam = true,
            Self::Sharp => mesh.edges[e].sharp = true,
        }
    }
}

fn uv_eq(a: [f64; 2], b: [f64; 2]) -> bool {
    let (du, dv) = (a[0] - b[0], a[1] - b[1]);
    du * du + dv * dv < UV_EQUAL_SQ
}

/// Whether the corner UVs of `f1` and `f2` agree at both ends of their shared edge `e`.
///
/// Faces wound the same way around `e` never count as contiguous. A mesh without UVs is
/// contiguous everywhere.
pub(crate) fn uv_contiguous_across_edge(mesh: &PolyMesh, e: EdgeId, f1: FaceId, f2: FaceId) -> bool {
    if mesh.faces[f1].uvs.is_none() && mesh.faces[f2].uvs.is_none() {
        return true;
    }
    let (Some(l1), Some(l2)) = (mesh.loop_of_face_at_edge(f1, e), mesh.loop_of_face_at_edge(f2, e)) else {
        return false;
    };
    if mesh.loop_vert(l1) == mesh.loop_vert(l2) {
        return false;
    }
    let pairs = [(l1, mesh.loop_next(l2)), (mesh.loop_next(l1), l2)];
    pairs.iter().all(|&(a, b)| match (mesh.loop_uv(a), mesh.loop_uv(b)) {
        (Some(ua), Some(ub)) => uv_eq(ua, ub),
        _ => false,
    })
}

/// The two edges of `f` incident to `v`.
pub(crate) fn incident_edges(mesh: &PolyMesh, f: FaceId, v: VertId) -> Option<(EdgeId, EdgeId)> {
    let mut found = mesh.faces[f]
        .edges
        .iter()
        .copied()
        .filter(|&e| mesh.edges[e].v1 == v || mesh.edges[e].v2 == v);
    Some((found.next()?, found.next()?))
}

pub(crate) fn closer_edge(mesh: &PolyMesh, co: Vec3, e1: EdgeId, e2: EdgeId) -> EdgeId {
    let d = |e: EdgeId| {
        let edge = &mesh.edges[e];
        dist_squared_to_segment(co, mesh.position(edge.v1), mesh.position(edge.v2))
    };
    if d(e1) <= d(e2) { e1 } else { e2 }
}

/// Where a new face takes its attributes and corner UVs from.
#[derive(Debug, Clone, Default)]
pub(crate) struct FaceSource {
    /// Copies material and smoothing; interpolates every corner unless `corners` is set.
    pub rep: Option<FaceId>,
    /// Per-corner interpolation faces.
    pub corners: Vec<Option<FaceId>>,
    /// Per-corner edges the corner is snapped to before interpolating.
    pub snaps: Vec<Option<EdgeId>>,
}

impl FaceSource {
    pub fn rep(face: Option<FaceId>) -> Self {
        Self { rep: face, ..Self::default() }
    }

    pub fn corners(faces: Vec<Option<FaceId>>) -> Self {
        Self { corners: faces, ..Self::default() }
    }

    #[must_use]
    pub fn with_snaps(mut self, snaps: Vec<Option<EdgeId>>) -> Self {
        self.snaps = snaps;
        self
    }

    fn attr_face(&self) -> Option<FaceId> {
        self.rep.or_else(|| self.corners.first().copied().flatten())
    }

    fn interp_face(&self, i: usize) -> Option<FaceId> {
        if self.corners.is_empty() { self.rep } else { self.corners.get(i).copied().flatten() }
    }
}

impl BevelContext {
    // ------------------------------------------------------------------------
    // New faces
    // ------------------------------------------------------------------------

    /// Create a face and carry attributes over from `source`. Consecutive repeated corners
    /// are dropped together with their per-corner data.
    pub(crate) fn create_ngon(
        &mut self,
        mesh: &mut PolyMesh,
        verts: &[VertId],
        source: &FaceSource,
        kind: FaceKind,
    ) -> Option<FaceId> {
        let mut keep: Vec<usize> = Vec::with_capacity(verts.len());
        for (i, &v) in verts.iter().enumerate() {
            if keep.last().map(|&j| verts[j]) != Some(v) {
                keep.push(i);
            }
        }
        while keep.len() > 1 && verts[keep[0]] == verts[keep[keep.len() - 1]] {
            keep.pop();
        }
        let corners: Vec<VertId> = keep.iter().map(|&i| verts[i]).collect();
        let f = self.create_face(mesh, &corners)?;

        if let Some(src) = source.attr_face() {
            mesh.faces[f].material = mesh.faces[src].material;
            mesh.faces[f].smooth = mesh.faces[src].smooth;
            if self.has_math_layers {
                let uvs = keep
                    .iter()
                    .map(|&i| {
                        let Some(fi) = source.interp_face(i) else {
                            return [0.0, 0.0];
                        };
                        let mut co = mesh.position(verts[i]);
                        if let Some(e) = source.snaps.get(i).copied().flatten() {
                            let edge = &mesh.edges[e];
                            co = closest_on_segment(co, mesh.position(edge.v1), mesh.position(edge.v2));
                        }
                        mesh.face_uv_interp(fi, co).unwrap_or([0.0, 0.0])
                    })
                    .collect();
                mesh.faces[f].uvs = Some(uvs);
            }
        }
        if let Some(material) = self.params.material.filter(|_| kind != FaceKind::Recon) {
            mesh.faces[f].material = material;
        }
        self.record_face_kind(f, kind);
        Some(f)
    }

    // ------------------------------------------------------------------------
    // Representative faces
    // ------------------------------------------------------------------------

    /// Group original faces into UV-contiguous components. Component 0 holds the highest
    /// face and component 1 the lowest, so ties resolve the same way on symmetric inputs.
    pub(crate) fn init_face_components(&mut self, mesh: &PolyMesh) {
        self.has_math_layers = mesh.live_faces().any(|f| mesh.faces[f].uvs.is_some());
        self.face_component.clear();
        if !self.has_math_layers || self.params.seg % 2 == 0 {
            return;
        }
        let mut component: HashMap<FaceId, usize> = HashMap::new();
        let mut count = 0;
        for start in mesh.live_faces() {
            if component.contains_key(&start) {
                continue;
            }
            let mut stack = vec![start];
            while let Some(f) = stack.pop() {
                if component.contains_key(&f) {
                    continue;
                }
                component.insert(f, count);
                for &e in &mesh.faces[f].edges {
                    for &g in &mesh.edges[e].faces {
                        if g != f && !component.contains_key(&g) && uv_contiguous_across_edge(mesh, e, f, g) {
                            stack.push(g);
                        }
                    }
                }
            }
            count += 1;
        }
        if count > 1 {
            let z = |f: FaceId| mesh.face_center_bounds(f).z;
            let faces: Vec<FaceId> = mesh.live_faces().collect();
            let top = faces.iter().copied().fold(None::<FaceId>, |best, f| match best {
                Some(b) if z(b) >= z(f) => Some(b),
                _ => Some(f),
            });
            let bottom = faces.iter().copied().fold(None::<FaceId>, |best, f| match best {
                Some(b) if z(b) <= z(f) => Some(b),
                _ => Some(f),
            });
            if let (Some(top), Some(bottom)) = (top, bottom) {
                let top_c = component[&top];
                swap_components(&mut component, 0, top_c);
                let bottom_c = component[&bottom];
                if bottom_c != 0 {
                    swap_components(&mut component, 1, bottom_c);
                }
            }
        }
        log::debug!("bevel: {count} UV components");
        self.face_component = component;
    }

    /// Deterministic choice among candidate faces: lower UV component, then selected,
    /// then lower material, then lower bounds center by z, x and y. The first key on which
    /// a single face is strictly lowest decides.
    pub(crate) fn choose_rep_face(&self, mesh: &PolyMesh, faces: &[Option<FaceId>]) -> Option<FaceId> {
        let keys: Vec<Option<[f64; 6]>> = faces
            .iter()
            .map(|f| {
                f.map(|f| {
                    let c = mesh.face_center_bounds(f);
                    [
                        self.face_component.get(&f).copied().unwrap_or(0) as f64,
                        if mesh.faces[f].selected { 0.0 } else { 1.0 },
                        f64::from(mesh.faces[f].material),
                        c.z,
                        c.x,
                        c.y,
                    ]
                })
            })
            .collect();
        let mut viable: Vec<bool> = keys.iter().map(Option::is_some).collect();
        let mut num_viable = viable.iter().filter(|&&v| v).count();
        if num_viable == 0 {
            return None;
        }
        if num_viable == 1 {
            return viable.iter().position(|&v| v).and_then(|i| faces[i]);
        }
        let mut best: Option<usize> = None;
        for key in 0..6 {
            if num_viable <= 1 {
                break;
            }
            for i in 0..faces.len() {
                let Some(ki) = keys[i] else { continue };
                if !viable[i] || Some(i) == best {
                    continue;
                }
                let Some(b) = best else {
                    best = Some(i);
                    continue;
                };
                let Some(kb) = keys[b] else { continue };
                if ki[key] < kb[key] {
                    best = Some(i);
                    for flag in viable.iter_mut().take(i) {
                        if *flag {
                            *flag = false;
                            num_viable -= 1;
                        }
                    }
                } else if ki[key] > kb[key] {
                    viable[i] = false;
                    num_viable -= 1;
                }
            }
        }
        faces[best.unwrap_or(0)]
    }

    /// The original face a boundary point's region of the patch interpolates from.
    pub(crate) fn boundvert_rep_face(&self, v: BvId) -> Option<FaceId> {
        let b = &self.bound_verts[v];
        if let Some(ebev) = b.ebev {
            return self.edge_halves[ebev].fprev;
        }
        if let Some(efirst) = b.efirst {
            let first = &self.edge_halves[efirst];
            let last = b.elast.map(|e| &self.edge_halves[e]);
            return first.fprev.or(first.fnext).or_else(|| last.and_then(|l| l.fprev));
        }
        let prev = &self.bound_verts[b.prev];
        if let Some(pl) = prev.elast {
            let frep = self.edge_halves[pl].fnext;
            let next_first = self.bound_verts[b.next].efirst;
            return frep.or_else(|| next_first.and_then(|e| self.edge_halves[e].fprev));
        }
        None
    }

    /// Boundary points of `bv` lying inside face `f` (at most three).
    pub(crate) fn face_internal_boundverts(&self, mesh: &PolyMesh, bv: BevVertId, f: Option<FaceId>) -> Vec<BvId> {
        let Some(f) = f else {
            return Vec::new();
        };
        self.boundary(bv)
            .into_iter()
            .filter(|&v| mesh.face_contains_point(f, self.bnd_co(v)))
            .take(3)
            .collect()
    }

    /// Area of the patch boundary snapped into `f`; tiny areas make useless UV polygons.
    fn projected_boundary_area(&self, mesh: &PolyMesh, bv: BevVertId, f: FaceId) -> f64 {
        let Some((e1, e2)) = incident_edges(mesh, f, self.bev_verts[bv].v) else {
            return 0.0;
        };
        let (u, w) = plane_frame(mesh.face_normal(f));
        let unsnapped = self.face_internal_boundverts(mesh, bv, Some(f));
        let pts: Vec<[f64; 2]> = self
            .boundary(bv)
            .into_iter()
            .map(|v| {
                let co = self.bnd_co(v);
                let p = if unsnapped.contains(&v) {
                    co
                } else {
                    let e = closer_edge(mesh, co, e1, e2);
                    let edge = &mesh.edges[e];
                    closest_on_segment(co, mesh.position(edge.v1), mesh.position(edge.v2))
                };
                [p.dot(u), p.dot(w)]
            })
            .collect();
        polygon_area_2d(&pts).abs()
    }

    /// Representative face for the center polygon of a patch, chosen among the faces a
    /// one-segment corridor would pick around the vertex.
    pub(crate) fn frep_for_center_poly(&self, mesh: &PolyMesh, bv: BevVertId) -> Option<FaceId> {
        let consider_all = self.bev_verts[bv].selcount == 1;
        let mut any = None;
        let mut choices: Vec<Option<FaceId>> = Vec::new();
        for &eh in &self.bev_verts[bv].edges {
            let h = &self.edge_halves[eh];
            if !h.is_bev && !consider_all {
                continue;
            }
            let Some(f) = self.choose_rep_face(mesh, &[h.fprev, h.fnext]) else {
                continue;
            };
            any.get_or_insert(f);
            if choices.contains(&Some(f)) {
                continue;
            }
            if self.has_math_layers && self.projected_boundary_area(mesh, bv, f) < BEVEL_EPSILON_BIG {
                continue;
            }
            choices.push(Some(f));
        }
        if choices.is_empty() {
            return any;
        }
        self.choose_rep_face(mesh, &choices)
    }

    // ------------------------------------------------------------------------
    // Seams and sharp edges
    // ------------------------------------------------------------------------

    /// Record, on the boundary point right of each marked edge, how many beveled edges lie
    /// between it and the next marked edge.
    pub(crate) fn check_edge_data_seam_sharp(&mut self, mesh: &PolyMesh, bv: BevVertId, mark: EdgeMark) {
        let Some(&first) = self.bev_verts[bv].edges.first() else {
            return;
        };
        let has = |ctx: &Self, eh: usize| mark.test(mesh, ctx.edge_halves[eh].e);
        let mut e = first;
        while !has(self, e) {
            e = self.edge_halves[e].next;
            if e == first {
                return;
            }
        }
        let efirst = e;
        loop {
            let mut count = 0;
            let mut ne = self.edge_halves[e].next;
            while !has(self, ne) && ne != efirst {
                if self.edge_halves[ne].is_bev {
                    count += 1;
                }
                ne = self.edge_halves[ne].next;
            }
            if ne == e || (ne == efirst && !has(self, efirst)) {
                break;
            }
            if let Some(r) = self.edge_halves[e].rightv {
                match mark {
                    EdgeMark::Seam => self.bound_verts[r].seam_len = count,
                    EdgeMark::Sharp => self.bound_verts[r].sharp_len = count,
                }
            }
            e = ne;
            if e == efirst {
                break;
            }
        }
    }

    /// Mark the outer ring edges of a patch between marked original edges.
    pub(crate) fn extend_edge_data(&self, mesh: &mut PolyMesh, bv: BevVertId) {
        let vm = &self.bev_verts[bv].vmesh;
        if vm.kind == MeshPattern::TriFan || self.bev_verts[bv].selcount < 2 || vm.count == 0 {
            return;
        }
        for v in self.boundary(bv) {
            let b = &self.bound_verts[v];
            for (mark, len) in [(EdgeMark::Seam, b.seam_len), (EdgeMark::Sharp, b.sharp_len)] {
                for i in b.index..b.index + len {
                    let i = i % vm.count;
                    let mut chain: Vec<Option<VertId>> = (0..vm.seg).map(|k| vm.at(i, 0, k).v).collect();
                    chain.push(vm.at((i + 1) % vm.count, 0, 0).v);
                    for pair in chain.windows(2) {
                        if let (Some(a), Some(b)) = (pair[0], pair[1]) {
                            if let Some(e) = mesh.edge_between(a, b) {
                                mark.set(mesh, e);
                            }
                        }
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Normals
    // ------------------------------------------------------------------------

    /// Mark edges between smooth rebuilt faces and new bevel faces as sharp.
    fn edges_sharp_boundary(&self, mesh: &mut PolyMesh) {
        let mut sharp = Vec::new();
        for f in mesh.live_faces() {
            if !mesh.faces[f].smooth || self.face_kind(f) != FaceKind::Recon {
                continue;
            }
            for &e in &mesh.faces[f].edges {
                let others: Vec<FaceId> = mesh.edges[e].faces.iter().copied().filter(|&g| g != f).collect();
                if let [g] = others.as_slice() {
                    if matches!(self.face_kind(*g), FaceKind::Edge | FaceKind::Vert) {
                        sharp.push(e);
                    }
                }
            }
        }
        for e in sharp {
            mesh.edges[e].sharp = true;
        }
    }

    /// Set per-corner custom normals on new faces so they shade smoothly into the faces
    /// around them.
    pub(crate) fn harden_normals(&self, mesh: &mut PolyMesh) {
        if self.params.offset == 0.0 || !self.params.harden_normals {
            return;
        }
        if !mesh.live_faces().any(|f| mesh.faces[f].custom_normals.is_some()) {
            self.edges_sharp_boundary(mesh);
        }
        let faces: Vec<FaceId> = mesh.live_faces().collect();
        let mut updates: Vec<(LoopRef, Vec3)> = Vec::new();
        for &f in &faces {
            let kind = self.face_kind(f);
            if matches!(kind, FaceKind::Orig | FaceKind::Recon) {
                continue;
            }
            let fno = mesh.face_normal(f);
            for l in mesh.face_loops(f) {
                let lprev = step_fan(mesh, l, mesh.loop_edge(mesh.loop_prev(l)));
                let lnext = step_fan(mesh, l, mesh.loop_edge(l));
                let kind_of = |x: Option<LoopRef>| x.map(|x| self.face_kind(x.face));
                let (kprev, knext) = (kind_of(lprev), kind_of(lnext));
                let long = |x: LoopRef| self.long_loops.contains(&x);
                let normal_of = |x: Option<LoopRef>| x.map(|x| mesh.face_normal(x.face));
                let pnorm = match kind {
                    FaceKind::Edge => {
                        if kprev == Some(FaceKind::Edge) && long(l) {
                            normal_of(lprev).map(|n| fno + n)
                        } else if knext == Some(FaceKind::Edge) && lnext.is_some_and(long) {
                            normal_of(lnext).map(|n| fno + n)
                        } else if kprev == Some(FaceKind::Recon) && long(l) {
                            normal_of(lprev)
                        } else if knext == Some(FaceKind::Recon) && long(mesh.loop_prev(l)) {
                            normal_of(lnext)
                        } else {
                            None
                        }
                    }
                    _ => {
                        if kprev == Some(FaceKind::Vert) && knext == Some(FaceKind::Vert) {
                            Some(mesh.vertex_normal(mesh.loop_vert(l)))
                        } else if kprev == Some(FaceKind::Recon) {
                            normal_of(lprev)
                        } else if knext == Some(FaceKind::Recon) {
                            normal_of(lnext)
                        } else {
                            let lpp = lprev.and_then(|x| step_fan(mesh, x, mesh.loop_edge(mesh.loop_prev(x))));
                            let lnn = lnext.and_then(|x| step_fan(mesh, x, mesh.loop_edge(x)));
                            let (kpp, knn) = (kind_of(lpp), kind_of(lnn));
                            if kprev == Some(FaceKind::Edge) && kpp == Some(FaceKind::Recon) {
                                normal_of(lpp)
                            } else if kprev == Some(FaceKind::Edge)
                                && knext == Some(FaceKind::Vert)
                                && kpp == Some(FaceKind::Edge)
                            {
                                normal_of(lprev).zip(normal_of(lpp)).map(|(a, b)| a + b)
                            } else if knext == Some(FaceKind::Edge)
                                && kprev == Some(FaceKind::Vert)
                                && knn == Some(FaceKind::Edge)
                            {
                                normal_of(lnext).zip(normal_of(lnn)).map(|(a, b)| a + b)
                            } else {
                                None
                            }
                        }
                    }
                };
                if let Some(n) = pnorm.and_then(Vec3::normalized) {
                    updates.push((l, n));
                }
            }
        }
        for (l, n) in updates {
            let face = &mut mesh.faces[l.face];
            let len = face.verts.len();
            let fno = face.custom_normals.get_or_insert_with(|| vec![Vec3::ZERO; len]);
            fno[l.index] = n;
        }
        for &f in &faces {
            let fno = mesh.face_normal(f);
            if let Some(normals) = mesh.faces[f].custom_normals.as_mut() {
                for n in normals.iter_mut().filter(|n| n.length_squared() == 0.0) {
                    *n = fno;
                }
            }
        }
    }

    /// Tag faces for the weighted-normal tool by how they came to be.
    pub(crate) fn set_face_strength(&self, mesh: &mut PolyMesh) {
        let mode = self.params.face_strength_mode;
        if mode == FaceStrengthMode::None {
            return;
        }
        let faces: Vec<FaceId> = mesh.live_faces().collect();
        for f in faces {
            let strength = match self.face_kind(f) {
                FaceKind::Vert => Some(FaceStrength::Weak),
                FaceKind::Edge => Some(FaceStrength::Medium),
                FaceKind::Recon if matches!(mode, FaceStrengthMode::Affected | FaceStrengthMode::All) => {
                    Some(FaceStrength::Strong)
                }
                FaceKind::Orig if mode == FaceStrengthMode::All => Some(FaceStrength::Strong),
                _ => None,
            };
            if let Some(s) = strength {
                mesh.faces[f].strength = s;
            }
        }
    }
}

fn swap_components(component: &mut HashMap<FaceId, usize>, a: usize, b: usize) {
    if a == b {
        return;
    }
    for c in component.values_mut() {
        if *c == a {
            *c = b;
        } else if *c == b {
            *c = a;
        }
    }
}

/// Step around the fan at `l`'s vertex, arriving over `from`: the corner at the same
/// vertex in the face across `l`'s other edge, if that edge has exactly one other face.
fn step_fan(mesh: &PolyMesh, l: LoopRef, from: EdgeId) -> Option<LoopRef> {
    let (e, eprev) = (mesh.loop_edge(l), mesh.loop_edge(mesh.loop_prev(l)));
    let cross = if from == e {
        eprev
    } else if from == eprev {
        e
    } else {
        return None;
    };
    let v = mesh.loop_vert(l);
    let mut others = mesh.edges[cross].faces.iter().copied().filter(|&g| g != l.face);
    let g = others.next()?;
    if others.next().is_some() {
        return None;
    }
    mesh.loop_of_face_at_vert(g, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::bevel::options::{BevelOptions, BevelParams};

    fn quad_pair() -> PolyMesh {
        // Two quads sharing edge 1-4, wound consistently.
        PolyMesh::from_vertices_faces(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [2.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
                [2.0, 1.0, 0.0],
            ],
            &[vec![0, 1, 4, 3], vec![1, 2, 5, 4]],
        )
        .expect("valid quads")
    }

    fn ctx_for(mesh: &PolyMesh, segments: usize) -> BevelContext {
        BevelContext::new(mesh, BevelParams::from_options(&BevelOptions::new(0.1, segments)))
    }

    #[test]
    fn fan_step_crosses_the_other_edge() {
        let mesh = quad_pair();
        // Corner of face 0 at vertex 1; its edges are 0-1 (incoming) and 1-4.
        let l = mesh.loop_of_face_at_vert(0, 1).expect("corner");
        let incoming = mesh.edge_between(0, 1).expect("edge");
        let shared = mesh.edge_between(1, 4).expect("edge");
        assert_eq!(step_fan(&mesh, l, incoming), mesh.loop_of_face_at_vert(1, 1));
        assert_eq!(step_fan(&mesh, l, shared), None);
        let far = mesh.edge_between(2, 5).expect("edge");
        assert_eq!(step_fan(&mesh, l, far), None);
    }

    #[test]
    fn uv_contiguity_follows_corner_uvs() {
        let mut mesh = quad_pair();
        let e = mesh.edge_between(1, 4).expect("shared edge");
        mesh.faces[0].uvs = Some(vec![[0.0, 0.0], [0.5, 0.0], [0.5, 1.0], [0.0, 1.0]]);
        mesh.faces[1].uvs = Some(vec![[0.5, 0.0], [1.0, 0.0], [1.0, 1.0], [0.5, 1.0]]);
        assert!(uv_contiguous_across_edge(&mesh, e, 0, 1));
        mesh.faces[1].uvs = Some(vec![[0.6, 0.0], [1.0, 0.0], [1.0, 1.0], [0.6, 1.0]]);
        assert!(!uv_contiguous_across_edge(&mesh, e, 0, 1));
    }

    #[test]
    fn rep_face_prefers_selected_then_lower_material() {
        let mut mesh = quad_pair();
        let ctx = ctx_for(&mesh, 1);
        mesh.faces[1].selected = true;
        assert_eq!(ctx.choose_rep_face(&mesh, &[Some(0), Some(1)]), Some(1));
        mesh.faces[1].selected = false;
        mesh.faces[0].material = 3;
        assert_eq!(ctx.choose_rep_face(&mesh, &[Some(0), Some(1)]), Some(1));
        mesh.faces[0].material = 0;
        // Same z, so the lower x center wins.
        assert_eq!(ctx.choose_rep_face(&mesh, &[Some(1), Some(0)]), Some(0));
    }

    #[test]
    fn rep_face_with_one_candidate_returns_it() {
        let mesh = quad_pair();
        let ctx = ctx_for(&mesh, 1);
        assert_eq!(ctx.choose_rep_face(&mesh, &[None, Some(1)]), Some(1));
        assert_eq!(ctx.choose_rep_face(&mesh, &[None, None]), None);
    }

    #[test]
    fn components_split_at_uv_seams() {
        let mut mesh = quad_pair();
        mesh.faces[0].uvs = Some(vec![[0.0, 0.0], [0.5, 0.0], [0.5, 1.0], [0.0, 1.0]]);
        mesh.faces[1].uvs = Some(vec![[0.7, 0.0], [1.0, 0.0], [1.0, 1.0], [0.7, 1.0]]);
        let mut ctx = ctx_for(&mesh, 3);
        ctx.init_face_components(&mesh);
        assert!(ctx.has_math_layers);
        assert_ne!(ctx.face_component[&0], ctx.face_component[&1]);

        let mut even = ctx_for(&mesh, 2);
        even.init_face_components(&mesh);
        assert!(even.face_component.is_empty());
    }

    #[test]
    fn create_ngon_interpolates_uvs_and_overrides_material() {
        let mut mesh = quad_pair();
        mesh.faces[0].uvs = Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        mesh.faces[0].material = 2;
        let mut ctx = BevelContext::new(
            &mesh,
            BevelParams::from_options(&BevelOptions::new(0.1, 1).with_material(Some(5))),
        );
        ctx.init_face_components(&mesh);
        let a = ctx.create_vert(&mut mesh, Vec3::new(0.5, 0.0, 0.0));
        let b = ctx.create_vert(&mut mesh, Vec3::new(0.5, 0.5, 0.0));
        let f = ctx
            .create_ngon(&mut mesh, &[0, a, a, b], &FaceSource::rep(Some(0)), FaceKind::Vert)
            .expect("face");
        assert_eq!(mesh.faces[f].verts, vec![0, a, b]);
        assert_eq!(mesh.faces[f].material, 5);
        let uvs = mesh.faces[f].uvs.clone().expect("uvs");
        assert!((uvs[1][0] - 0.5).abs() < 1e-9 && uvs[1][1].abs() < 1e-9);
        assert!((uvs[2][0] - 0.5).abs() < 1e-9 && (uvs[2][1] - 0.5).abs() < 1e-9);
        assert_eq!(ctx.face_kind(f), FaceKind::Vert);
    }

    #[test]
    fn face_strength_follows_mode() {
        let mut mesh = quad_pair();
        let mut ctx = BevelContext::new(
            &mesh,
            BevelParams::from_options(&BevelOptions::new(0.1, 1).with_face_strength(FaceStrengthMode::Affected)),
        );
        ctx.record_face_kind(1, FaceKind::Recon);
        ctx.set_face_strength(&mut mesh);
        assert_eq!(mesh.faces[1].strength, FaceStrength::Strong);
        assert_eq!(mesh.faces[0].strength, FaceStrength::Medium);
    }
}
