//! Rebuild the original faces around beveled vertices so they attach to the new
//! boundary, and reconnect wire edges.

use std::collections::HashSet;

use crate::geom::poly_mesh::{EdgeId, FaceId, PolyMesh, VertId};

use super::attrs::FaceSource;
use super::context::{BevelContext, FaceKind};

impl BevelContext {
    /// Replace every beveled corner of `f` by the boundary points and profile samples it
    /// now spans. Returns the new face, or `None` when `f` has no beveled corner or could
    /// not be rebuilt.
    pub(crate) fn rebuild_polygon(&mut self, mesh: &mut PolyMesh, f: FaceId) -> Option<FaceId> {
        let mut verts: Vec<VertId> = Vec::new();
        let mut edges: Vec<EdgeId> = Vec::new();
        let mut rebuild = false;

        let loops: Vec<_> = mesh.face_loops(f).collect();
        for l in loops {
            let lv = mesh.loop_vert(l);
            let le = mesh.loop_edge(l);
            if !self.vert_tagged(lv) {
                verts.push(lv);
                edges.push(le);
                continue;
            }
            let lprev_edge = mesh.loop_edge(mesh.loop_prev(l));
            let Some(bv) = self.find_bevvert(lv) else {
                verts.push(lv);
                edges.push(le);
                continue;
            };
            let (Some(e), Some(eprev)) = (self.find_edge_half(bv, le), self.find_edge_half(bv, lprev_edge)) else {
                self.diagnostics.add_warning(format!("face {f}: corner at vertex {lv} has no edge halves"));
                return None;
            };
            let he = self.edge_halves[e].clone();
            let hprev = self.edge_halves[eprev].clone();

            let go_ccw = if he.prev == eprev {
                if hprev.prev == e { he.fnext != Some(f) } else { true }
            } else if hprev.prev == e {
                false
            } else {
                self.count_ccw_edges_between(eprev, e) < self.count_ccw_edges_between(e, eprev)
            };

            let mut on_profile_start = false;
            let (vstart, vend) = if go_ccw {
                let (Some(mut vstart), Some(vend)) = (hprev.rightv, he.leftv) else {
                    return None;
                };
                if he.profile_index > 0 {
                    vstart = self.bound_verts[vstart].prev;
                    on_profile_start = true;
                }
                (vstart, vend)
            } else {
                let (Some(mut vstart), Some(vend)) = (hprev.leftv, he.rightv) else {
                    return None;
                };
                if hprev.profile_index > 0 {
                    vstart = self.bound_verts[vstart].next;
                    on_profile_start = true;
                }
                (vstart, vend)
            };

            let vm = &self.bev_verts[bv].vmesh;
            let mut v = vstart;
            if !on_profile_start {
                if let Some(nv) = self.bound_verts[v].nv.v {
                    verts.push(nv);
                    edges.push(he.e);
                }
            }
            let mut guard = vm.count + 1;
            while v != vend && guard > 0 {
                guard -= 1;
                let ks: Vec<usize> = if go_ccw {
                    let kstart = if on_profile_start { he.profile_index } else { 1 };
                    let kend = if hprev.rightv == Some(v) && hprev.profile_index > 0 {
                        hprev.profile_index
                    } else {
                        vm.seg
                    };
                    (kstart..=kend).collect()
                } else {
                    let kstart = if on_profile_start { hprev.profile_index } else { vm.seg.saturating_sub(1) };
                    let vprev = self.bound_verts[v].prev;
                    let kend = if he.rightv == Some(vprev) && he.profile_index > 0 { he.profile_index } else { 0 };
                    (kend..=kstart).rev().collect()
                };
                on_profile_start = false;
                let i = if go_ccw { self.bound_verts[v].index } else { self.bound_verts[self.bound_verts[v].prev].index };
                for k in ks {
                    if let Some(nv) = vm.at(i, 0, k).v {
                        verts.push(nv);
                        edges.push(he.e);
                    }
                }
                v = if go_ccw { self.bound_verts[v].next } else { self.bound_verts[v].prev };
            }
            rebuild = true;
        }

        if !rebuild {
            return None;
        }
        let f_new = self.create_ngon(mesh, &verts, &FaceSource::rep(Some(f)), FaceKind::Recon)?;
        self.copy_rebuilt_edge_marks(mesh, &verts, &edges);
        self.diagnostics.rebuilt_face_count += 1;
        Some(f_new)
    }

    /// Carry seam and sharp flags from the original edges onto the rebuilt boundary. A run
    /// of new edges replacing one corner keeps a flag only when it continues from the
    /// previous original edge.
    fn copy_rebuilt_edge_marks(&self, mesh: &mut PolyMesh, verts: &[VertId], edges: &[EdgeId]) {
        let n = verts.len();
        let Some(&last) = edges.last() else {
            return;
        };
        let mut prev = last;
        for k in 0..n {
            let Some(new_e) = mesh.edge_between(verts[k], verts[(k + 1) % n]) else {
                continue;
            };
            let old = edges[k];
            if old == new_e {
                continue;
            }
            let (seam, sharp) = (mesh.edges[old].seam, mesh.edges[old].sharp);
            mesh.edges[new_e].seam = seam;
            mesh.edges[new_e].sharp = sharp;
            if k + 1 < n && old == edges[k + 1] {
                if seam && !mesh.edges[prev].seam {
                    mesh.edges[new_e].seam = false;
                }
                if sharp && !mesh.edges[prev].sharp {
                    mesh.edges[new_e].sharp = false;
                }
            } else {
                prev = old;
            }
        }
    }

    /// Rebuild every face around `v` that is not in `rebuilt` yet, adding the originals of
    /// the ones rebuilt. The originals stay in the mesh until the caller removes them.
    pub(crate) fn rebuild_existing(&mut self, mesh: &mut PolyMesh, v: VertId, rebuilt: &mut HashSet<FaceId>) {
        for f in mesh.vertex_faces(v) {
            if rebuilt.contains(&f) || self.face_kind(f) != FaceKind::Orig {
                continue;
            }
            if self.rebuild_polygon(mesh, f).is_some() {
                rebuilt.insert(f);
            }
        }
    }

    /// Reconnect the wire edges of `v` to the nearest new boundary point (or pair of
    /// points, when the other end was beveled too).
    pub(crate) fn reattach_wires(&mut self, mesh: &mut PolyMesh, v: VertId) {
        let Some(bv) = self.find_bevvert(v) else {
            return;
        };
        if self.bev_verts[bv].wire_edges.is_empty() || self.bev_verts[bv].vmesh.boundstart.is_none() {
            return;
        }
        let here = self.boundary(bv);
        for e in self.bev_verts[bv].wire_edges.clone() {
            let vother = mesh.edge_other_vert(e, v);
            let other = if self.vert_tagged(vother) {
                match self.find_bevvert(vother) {
                    Some(bvo) if self.bev_verts[bvo].vmesh.boundstart.is_some() => Some(self.boundary(bvo)),
                    _ => return,
                }
            } else {
                None
            };

            let mut closest: Option<(f64, VertId, VertId)> = None;
            for &b in &here {
                let (co, Some(nv)) = (self.bound_verts[b].nv.co, self.bound_verts[b].nv.v) else {
                    continue;
                };
                let candidates: Vec<(f64, VertId)> = match &other {
                    Some(bounds) => bounds
                        .iter()
                        .filter_map(|&o| {
                            let onv = &self.bound_verts[o].nv;
                            onv.v.map(|ov| (onv.co.distance_squared(co), ov))
                        })
                        .collect(),
                    None => vec![(mesh.position(vother).distance_squared(co), vother)],
                };
                for (d, ov) in candidates {
                    if closest.is_none_or(|(best, _, _)| d < best) {
                        closest = Some((d, nv, ov));
                    }
                }
            }
            let Some((_, a, b)) = closest else { continue };
            let (seam, sharp) = (mesh.edges[e].seam, mesh.edges[e].sharp);
            match mesh.add_edge(a, b) {
                Ok(new_e) => {
                    mesh.edges[new_e].seam = seam;
                    mesh.edges[new_e].sharp = sharp;
                }
                Err(err) => self.diagnostics.add_warning(format!("wire edge {e} not reattached: {err}")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::bevel::options::{BevelOptions, BevelParams};
    use crate::geom::core::Vec3;

    fn beveled_corner(mesh: &mut PolyMesh) -> BevelContext {
        let e = mesh.edge_between(0, 1).expect("cube edge");
        mesh.edges[e].selected = true;
        mesh.vertices[0].selected = true;
        mesh.vertices[1].selected = true;
        let params = BevelParams::from_options(&BevelOptions::new(0.25, 1));
        let mut ctx = BevelContext::new(mesh, params);
        for v in [0, 1] {
            let bv = ctx.bevel_vert_construct(mesh, v).expect("beveled");
            ctx.build_boundary(mesh, bv, true);
        }
        for bv in 0..ctx.bev_verts.len() {
            ctx.build_vmesh(mesh, bv);
        }
        ctx
    }

    #[test]
    fn faces_around_a_beveled_vertex_are_rebuilt_once() {
        let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
        let mut ctx = beveled_corner(&mut mesh);
        let mut rebuilt = HashSet::new();
        ctx.rebuild_existing(&mut mesh, 0, &mut rebuilt);
        assert_eq!(rebuilt.len(), 3);
        let count = rebuilt.len();
        ctx.rebuild_existing(&mut mesh, 1, &mut rebuilt);
        // Two faces share the beveled edge and were already rebuilt.
        assert_eq!(rebuilt.len(), count + 1);
        assert_eq!(ctx.diagnostics.rebuilt_face_count, 4);
    }

    #[test]
    fn untouched_face_is_not_rebuilt() {
        let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
        let mut ctx = beveled_corner(&mut mesh);
        // The top face [4, 5, 6, 7] has no beveled corner.
        assert!(ctx.rebuild_polygon(&mut mesh, 1).is_none());
    }

    #[test]
    fn wire_edge_attaches_to_nearest_boundary_point() {
        let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
        let far = mesh.add_vertex(Vec3::new(-1.0, -1.0, -1.0));
        mesh.add_edge(0, far).expect("wire");
        let mut ctx = beveled_corner(&mut mesh);
        let bv = ctx.find_bevvert(0).expect("beveled");
        assert_eq!(ctx.bev_verts[bv].wire_edges.len(), 1);
        let before = mesh.edges.len();
        ctx.reattach_wires(&mut mesh, 0);
        assert_eq!(mesh.edges.len(), before + 1);
        let new_edge = &mesh.edges[before];
        assert!(new_edge.v1 == far || new_edge.v2 == far);
    }
}
