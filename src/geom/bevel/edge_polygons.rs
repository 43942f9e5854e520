//! The corridor of quads replacing a beveled edge, one strip per profile segment.

use crate::geom::poly_mesh::{EdgeId, FaceId, PolyMesh, VertId};

use super::attrs::FaceSource;
use super::context::{BevVertId, BevelContext, EhId, FaceKind};

impl BevelContext {
    /// Two beveled edges crossing straight through a four-valent vertex.
    pub(crate) fn is_weld_cross(&self, bv: BevVertId) -> bool {
        let b = &self.bev_verts[bv];
        if b.edgecount != 4 || b.selcount != 2 || b.edges.len() != 4 {
            return false;
        }
        let bev = |i: usize| self.edge_halves[b.edges[i]].is_bev;
        (bev(0) && bev(2)) || (bev(1) && bev(3))
    }

    /// Let seams and sharp edges continue across a weld cross: the profile edges at side
    /// `vmindex` take the flags of the unbeveled edges, kept only where both agree.
    fn weld_cross_attrs_copy(&self, mesh: &mut PolyMesh, bv: BevVertId, vmindex: usize, eh: EhId) {
        let edges = &self.bev_verts[bv].edges;
        let Some(pos) = edges.iter().position(|&x| x == eh) else {
            return;
        };
        let prev = self.edge_halves[edges[(pos + 3) % 4]].e;
        let next = self.edge_halves[edges[(pos + 1) % 4]].e;
        let seam = mesh.edges[prev].seam && mesh.edges[next].seam;
        let sharp = mesh.edges[prev].sharp && mesh.edges[next].sharp;
        let vm = &self.bev_verts[bv].vmesh;
        for k in 0..self.edge_halves[eh].seg {
            let (Some(a), Some(b)) = (vm.at(vmindex, 0, k).v, vm.at(vmindex, 0, k + 1).v) else {
                continue;
            };
            if let Some(e) = mesh.edge_between(a, b) {
                mesh.edges[e].seam = seam;
                mesh.edges[e].sharp = sharp;
            }
        }
    }

    /// Build the strips along beveled edge `bme`, from the profile at its `v1` end to the
    /// profile at its `v2` end. Non-manifold edges are skipped.
    pub(crate) fn build_edge_polygons(&mut self, mesh: &mut PolyMesh, bme: EdgeId) {
        if !mesh.edge_is_manifold(bme) {
            return;
        }
        let (v1, v2) = (mesh.edges[bme].v1, mesh.edges[bme].v2);
        let (Some(bv1), Some(bv2)) = (self.find_bevvert(v1), self.find_bevvert(v2)) else {
            return;
        };
        let (Some(e1), Some(e2)) = (self.find_edge_half(bv1, bme), self.find_edge_half(bv2, bme)) else {
            return;
        };
        let h1 = self.edge_halves[e1].clone();
        let h2 = self.edge_halves[e2].clone();
        let (Some(l1), Some(r1), Some(l2), Some(r2)) = (h1.leftv, h1.rightv, h2.leftv, h2.rightv) else {
            return;
        };
        let corner = |b: usize| self.bound_verts[b].nv.v;
        let (Some(bmv1), Some(bmv4), Some(bmv2), Some(bmv3)) = (corner(l1), corner(r1), corner(r2), corner(l2))
        else {
            self.diagnostics.add_warning(format!("edge {bme}: corridor ends were not created"));
            return;
        };
        let (f1, f2) = (h1.fprev, h1.fnext);
        let i1 = self.bound_verts[l1].index;
        let i2 = self.bound_verts[l2].index;
        let nseg = h1.seg;
        let odd = nseg % 2 == 1;
        let mid = nseg / 2;

        let mut f_choice: Option<FaceId> = None;
        let mut center_adj_k = None;
        if odd && h1.is_seam {
            f_choice = self.choose_rep_face(mesh, &[f1, f2]);
            if nseg > 1 {
                center_adj_k = Some(if f_choice == f1 { mid + 2 } else { mid });
            }
        }
        let near_v2 = [None, None, Some(bme), Some(bme)];
        let near_v1 = [Some(bme), Some(bme), None, None];

        let mut verts: [VertId; 4] = [bmv1, bmv2, bmv2, bmv1];
        for k in 1..=nseg {
            let (Some(a), Some(b)) = (
                self.bev_verts[bv1].vmesh.at(i1, 0, k).v,
                self.bev_verts[bv2].vmesh.at(i2, 0, nseg - k).v,
            ) else {
                continue;
            };
            verts[3] = a;
            verts[2] = b;
            let source = if odd && k == mid + 1 {
                if h1.is_seam {
                    let snaps = if f_choice == f1 { near_v2 } else { near_v1 };
                    FaceSource::rep(f_choice).with_snaps(snaps.to_vec())
                } else {
                    FaceSource { rep: f_choice, ..FaceSource::corners(vec![f1, f1, f2, f2]) }
                }
            } else if odd && Some(k) == center_adj_k {
                if k == mid {
                    FaceSource::rep(f1).with_snaps(near_v2.to_vec())
                } else {
                    FaceSource::rep(f2).with_snaps(near_v1.to_vec())
                }
            } else if !odd && k == mid {
                FaceSource::rep(f1).with_snaps(near_v2.to_vec())
            } else if !odd && k == mid + 1 {
                FaceSource::rep(f2).with_snaps(near_v1.to_vec())
            } else {
                FaceSource::rep(if k <= mid { f1 } else { f2 })
            };
            if let Some(f) = self.create_ngon(mesh, &verts, &source, FaceKind::Edge) {
                let long: Vec<_> = mesh
                    .face_loops(f)
                    .filter(|&l| {
                        let v = mesh.loop_vert(l);
                        v == verts[0] || v == verts[2]
                    })
                    .collect();
                self.long_loops.extend(long);
            }
            verts[0] = verts[3];
            verts[1] = verts[2];
        }

        let (seam, sharp) = (mesh.edges[bme].seam, mesh.edges[bme].sharp);
        for (a, b) in [(bmv1, bmv2), (bmv3, bmv4)] {
            if let Some(e) = mesh.edge_between(a, b) {
                mesh.edges[e].seam = seam;
                mesh.edges[e].sharp = sharp;
            }
        }

        if self.is_weld_cross(bv1) {
            self.weld_cross_attrs_copy(mesh, bv1, i1, e1);
        }
        if self.is_weld_cross(bv2) {
            self.weld_cross_attrs_copy(mesh, bv2, i2, e2);
        }
        self.diagnostics.beveled_edge_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::bevel::options::{BevelOptions, BevelParams};

    fn prepared(segments: usize, seam: bool) -> (PolyMesh, BevelContext, EdgeId) {
        let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
        let e = mesh.edge_between(0, 1).expect("cube edge");
        mesh.edges[e].selected = true;
        mesh.edges[e].seam = seam;
        mesh.edges[e].sharp = true;
        let params = BevelParams::from_options(&BevelOptions::new(0.2, segments));
        let mut ctx = BevelContext::new(&mesh, params);
        for v in [0, 1] {
            ctx.vert_tags[v] = true;
            let bv = ctx.bevel_vert_construct(&mesh, v).expect("beveled");
            ctx.build_boundary(&mesh, bv, true);
        }
        for bv in 0..ctx.bev_verts.len() {
            ctx.build_vmesh(&mut mesh, bv);
        }
        (mesh, ctx, e)
    }

    #[test]
    fn corridor_has_one_quad_per_segment() {
        let (mut mesh, mut ctx, e) = prepared(3, false);
        let before = mesh.faces.len();
        ctx.build_edge_polygons(&mut mesh, e);
        assert_eq!(mesh.faces.len(), before + 3);
        for f in before..mesh.faces.len() {
            assert_eq!(mesh.face_len(f), 4);
            assert_eq!(ctx.face_kind(f), FaceKind::Edge);
        }
        assert_eq!(ctx.long_loops.len(), 6);
        assert_eq!(ctx.diagnostics.beveled_edge_count, 1);
    }

    #[test]
    fn end_edges_inherit_flags() {
        let (mut mesh, mut ctx, e) = prepared(2, true);
        let before = mesh.faces.len();
        ctx.build_edge_polygons(&mut mesh, e);
        let first = &mesh.faces[before];
        let end_edge = first.edges[0];
        assert!(mesh.edges[end_edge].seam);
        assert!(mesh.edges[end_edge].sharp);
    }

    #[test]
    fn cube_vertex_is_not_a_weld_cross() {
        let (_, ctx, _) = prepared(1, false);
        let bv = ctx.find_bevvert(0).expect("beveled");
        assert!(!ctx.is_weld_cross(bv));
    }
}
