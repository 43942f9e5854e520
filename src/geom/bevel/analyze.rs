//! Vertex analysis: order the edges around a vertex and assign offset specs.

use std::collections::HashSet;
use std::f64::consts::PI;

use crate::geom::core::Vec3;
use crate::geom::poly_mesh::{EdgeId, FaceId, PolyMesh, VertId};

use super::attrs::uv_contiguous_across_edge;
use super::context::{BEVEL_EPSILON, BevVert, BevVertId, BevelContext, EdgeHalf, VMesh};
use super::meet::bev_ccw_test;
use super::options::OffsetType;

/// Upper bound on search steps when the fan around a vertex has internal faces.
const MAX_ORDER_STEPS: usize = 100_000;

/// Angle between the two faces of an edge half (zero unless both exist).
pub(crate) fn edge_face_angle(mesh: &PolyMesh, fprev: Option<FaceId>, fnext: Option<FaceId>) -> f64 {
    match (fprev, fnext) {
        (Some(a), Some(b)) => PI - mesh.face_normal(a).angle_to(mesh.face_normal(b)),
        _ => 0.0,
    }
}

/// Edges adjacent to `e` across one of its faces at `v`.
fn face_successors(mesh: &PolyMesh, v: VertId, e: EdgeId) -> Vec<EdgeId> {
    mesh.edge_loops(e)
        .into_iter()
        .map(|l| {
            if mesh.loop_vert(l) == v {
                mesh.loop_edge(mesh.loop_prev(l))
            } else {
                mesh.loop_edge(mesh.loop_next(l))
            }
        })
        .collect()
}

/// Whether `e1` and `e2` are consecutive around `v` in some face.
fn edges_face_connected_at_vert(mesh: &PolyMesh, v: VertId, e1: EdgeId, e2: EdgeId) -> bool {
    mesh.edge_loops(e1).into_iter().any(|l| {
        let other = if mesh.loop_vert(l) == v {
            mesh.loop_edge(mesh.loop_prev(l))
        } else {
            mesh.loop_edge(mesh.loop_next(l))
        };
        other == e2
    })
}

/// Walks the fan around `v` when every face sits between consecutive edges. Leaves `order`
/// untouched and returns `false` otherwise.
fn fast_edge_order(mesh: &PolyMesh, v: VertId, total: usize, order: &mut Vec<EdgeId>, used: &mut HashSet<EdgeId>) -> bool {
    let Some(&first) = order.first() else {
        return false;
    };
    if mesh.edge_face_count(first) == 0 {
        return false;
    }
    let mut current = first;
    let mut added = Vec::new();
    for i in 1..total {
        let mut shared = 0;
        let mut first_suc = None;
        for &e2 in mesh.vertex_edges(v) {
            if used.contains(&e2) {
                continue;
            }
            for &f in &mesh.edges[e2].faces {
                if mesh.faces[f].edges.contains(&current) {
                    shared += 1;
                    first_suc.get_or_insert(e2);
                }
            }
            if shared >= 3 {
                break;
            }
        }
        match first_suc {
            Some(next) if shared == 1 || (i == 1 && shared == 2) => {
                used.insert(next);
                order.push(next);
                added.push(next);
                current = next;
            }
            _ => {
                for e in added {
                    used.remove(&e);
                }
                order.truncate(1);
                return false;
            }
        }
    }
    true
}

/// Extends `order` from its last edge with the longest run of face-adjacent edges.
///
/// Depth-first over an explicit stack; every path prefix is a candidate. A tie in length is
/// broken in favour of a run whose last edge closes back onto the first edge.
fn extend_edge_order(mesh: &PolyMesh, v: VertId, total: usize, order: &mut Vec<EdgeId>, used: &mut HashSet<EdgeId>) {
    struct Frame {
        sucs: Vec<EdgeId>,
        next: usize,
    }

    let base = order.len();
    let Some(&last) = order.last() else {
        return;
    };
    let first = order[0];
    let mut best: Vec<EdgeId> = Vec::new();
    let mut stack = vec![Frame { sucs: face_successors(mesh, v, last), next: 0 }];
    let mut steps = 0;

    while let Some(frame) = stack.last_mut() {
        steps += 1;
        if steps > MAX_ORDER_STEPS {
            log::debug!("bevel: edge order search at vertex {v} hit the step cap");
            break;
        }
        if frame.next < frame.sucs.len() && order.len() < total {
            let e = frame.sucs[frame.next];
            frame.next += 1;
            if used.contains(&e) {
                continue;
            }
            used.insert(e);
            order.push(e);
            let len = order.len() - base;
            if len > best.len() || (len == best.len() && edges_face_connected_at_vert(mesh, v, e, first)) {
                best = order[base..].to_vec();
            }
            stack.push(Frame { sucs: face_successors(mesh, v, e), next: 0 });
        } else {
            stack.pop();
            if order.len() > base && !stack.is_empty() {
                if let Some(e) = order.pop() {
                    used.remove(&e);
                }
            }
        }
    }
    // Unwind whatever the cap left on the path.
    while order.len() > base {
        if let Some(e) = order.pop() {
            used.remove(&e);
        }
    }
    for e in best {
        used.insert(e);
        order.push(e);
    }
}

/// Result of ordering the edges around a vertex.
struct EdgeOrder {
    edges: Vec<EdgeId>,
    /// Face after each edge (between it and the next one).
    fnext: Vec<Option<FaceId>>,
}

fn find_edge_order(mesh: &PolyMesh, v: VertId, total: usize, first: EdgeId, mut used: HashSet<EdgeId>) -> EdgeOrder {
    let mut order = vec![first];
    used.insert(first);
    if !fast_edge_order(mesh, v, total, &mut order, &mut used) {
        loop {
            extend_edge_order(mesh, v, total, &mut order, &mut used);
            if order.len() >= total {
                break;
            }
            // A gap in the fan: restart from an unused edge, preferring a boundary one.
            let mut next_first = None;
            for &e in mesh.vertex_edges(v) {
                if used.contains(&e) {
                    continue;
                }
                if next_first.is_none() {
                    next_first = Some(e);
                }
                if mesh.edge_face_count(e) == 1 {
                    next_first = Some(e);
                    break;
                }
            }
            let Some(e) = next_first else {
                break;
            };
            used.insert(e);
            order.push(e);
        }
    }

    let n = order.len();
    let mut fnext: Vec<Option<FaceId>> = vec![None; n];
    let mut fprev: Vec<Option<FaceId>> = vec![None; n];
    for i in 0..n {
        let j = (i + 1) % n;
        if fnext[i].is_some() || fprev[j].is_some() {
            continue;
        }
        let (bme, bme2) = (order[i], order[j]);
        let mut bestf = None;
        for l in mesh.edge_loops(bme) {
            let adjacent = mesh.loop_edge(mesh.loop_prev(l)) == bme2 || mesh.loop_edge(mesh.loop_next(l)) == bme2;
            if adjacent && (bestf.is_none() || mesh.loop_vert(l) == v) {
                bestf = Some(l.face);
            }
            if bestf.is_some() {
                fnext[i] = bestf;
                fprev[j] = bestf;
            }
        }
    }
    EdgeOrder { edges: order, fnext }
}

/// Divide `offset` by `z`, falling back to a tiny bevel when `z` vanishes.
fn scaled_offset(offset: f64, z: f64) -> f64 {
    if z < BEVEL_EPSILON { 0.01 * offset } else { offset / z }
}

impl BevelContext {
    /// Analyze vertex `v`: order its edges counter-clockwise, create the edge halves and
    /// set their offset specs. Returns `None` (and untags `v`) when `v` is not beveled.
    pub(crate) fn bevel_vert_construct(&mut self, mesh: &PolyMesh, v: VertId) -> Option<BevVertId> {
        self.diagnostics.analyzed_vertex_count += 1;
        let vertex_only = self.params.vertex_only();

        let mut nsel = 0;
        let mut tot_edges = 0;
        let mut tot_wire = 0;
        let mut first_bme = None;
        let mut used = HashSet::new();
        let mut wire_edges = Vec::new();
        for &bme in mesh.vertex_edges(v) {
            let face_count = mesh.edge_face_count(bme);
            if self.edge_tagged(bme) && !vertex_only {
                nsel += 1;
                first_bme.get_or_insert(bme);
            }
            if face_count == 1 {
                first_bme = Some(bme);
            }
            if face_count > 0 || vertex_only {
                tot_edges += 1;
            }
            if mesh.is_wire(bme) {
                tot_wire += 1;
                wire_edges.push(bme);
                if !vertex_only {
                    used.insert(bme);
                }
            }
        }
        let first_bme = first_bme.or_else(|| mesh.vertex_edges(v).first().copied());

        let skip = (nsel == 0 && !vertex_only) || (tot_edges < 2 && vertex_only);
        let Some(first_bme) = first_bme.filter(|_| !skip) else {
            self.untag_vert(v);
            self.diagnostics.skipped_vertex_count += 1;
            return None;
        };

        let EdgeOrder { mut edges, mut fnext } = find_edge_order(mesh, v, tot_edges, first_bme, used);
        if edges.len() != tot_edges {
            self.diagnostics
                .add_warning(format!("vertex {v}: ordered {} of {tot_edges} edges", edges.len()));
        }
        let tot_edges = edges.len();
        if tot_edges < 2 && vertex_only {
            self.untag_vert(v);
            self.diagnostics.skipped_vertex_count += 1;
            return None;
        }

        // Keep the edges counter-clockwise seen from the normal side.
        if tot_edges > 1 {
            let ccw_sum: i32 = (0..tot_edges)
                .map(|i| bev_ccw_test(mesh, edges[i], edges[(i + 1) % tot_edges], fnext[i]))
                .sum();
            if ccw_sum < 0 {
                edges.reverse();
                // The face after edge i becomes the face before it; shift to realign.
                fnext.reverse();
                fnext.rotate_left(1);
            }
        }

        let bv = self.bev_verts.len();
        let base = self.edge_halves.len();
        let mut bev_offset = self.params.offset;
        if vertex_only && self.params.use_weights {
            bev_offset *= mesh.vertices[v].bevel_weight;
        }
        let vco = mesh.position(v);
        let mut vert_axis = Vec3::ZERO;
        if vertex_only && matches!(self.params.offset_type, OffsetType::Width | OffsetType::Depth) {
            for &e in &edges {
                let v2 = mesh.edge_other_vert(e, v);
                vert_axis += (vco - mesh.position(v2)).normalize_or_zero().0;
            }
        }

        for (i, &e) in edges.iter().enumerate() {
            let is_bev = self.edge_tagged(e) && !vertex_only;
            self.edge_halves.push(EdgeHalf {
                next: base + (i + 1) % tot_edges,
                prev: base + (i + tot_edges - 1) % tot_edges,
                e,
                fprev: fnext[(i + tot_edges - 1) % tot_edges],
                fnext: fnext[i],
                leftv: None,
                rightv: None,
                profile_index: 0,
                seg: if is_bev { self.params.seg } else { 0 },
                offset_l: 0.0,
                offset_r: 0.0,
                offset_l_spec: 0.0,
                offset_r_spec: 0.0,
                is_bev,
                is_rev: mesh.edges[e].v2 == v,
                is_seam: false,
                visited_rpo: false,
                bev_vert: bv,
            });
        }

        for i in 0..tot_edges {
            let eh = base + i;
            let (e, fprev, fnext_f, is_bev) = {
                let h = &self.edge_halves[eh];
                (h.e, h.fprev, h.fnext, h.is_bev)
            };
            let offset = self.params.offset;
            let (mut l_spec, mut r_spec) = (0.0, 0.0);
            if is_bev {
                let angle = edge_face_angle(mesh, fprev, fnext_f);
                match self.params.offset_type {
                    OffsetType::Offset => l_spec = offset,
                    OffsetType::Width => l_spec = scaled_offset(offset, (2.0 * (angle / 2.0).sin()).abs()),
                    OffsetType::Depth => l_spec = scaled_offset(offset, (angle / 2.0).cos().abs()),
                    OffsetType::Percent => {
                        let prev_e = self.edge_halves[self.edge_halves[eh].prev].e;
                        let next_e = self.edge_halves[self.edge_halves[eh].next].e;
                        l_spec = mesh.edge_length(prev_e) * offset / 100.0;
                        r_spec = mesh.edge_length(next_e) * offset / 100.0;
                    }
                    OffsetType::Absolute => {
                        l_spec = offset;
                        r_spec = offset;
                    }
                }
                if !self.params.percent_or_absolute() {
                    r_spec = l_spec;
                }
                if self.params.use_weights {
                    let weight = mesh.edges[e].bevel_weight;
                    l_spec *= weight;
                    r_spec *= weight;
                }
            } else if vertex_only {
                let edge_dir = vco - mesh.position(mesh.edge_other_vert(e, v));
                l_spec = match self.params.offset_type {
                    OffsetType::Offset | OffsetType::Absolute => bev_offset,
                    OffsetType::Width => scaled_offset(offset, (2.0 * vert_axis.angle_to(edge_dir).sin()).abs()),
                    OffsetType::Depth => scaled_offset(offset, vert_axis.angle_to(edge_dir).cos().abs()),
                    OffsetType::Percent => mesh.edge_length(e) * bev_offset / 100.0,
                };
                r_spec = l_spec;
            }

            let is_seam = match (fprev, fnext_f) {
                (Some(a), Some(b)) => !uv_contiguous_across_edge(mesh, e, a, b),
                _ => true,
            };
            let h = &mut self.edge_halves[eh];
            h.offset_l_spec = l_spec;
            h.offset_r_spec = r_spec;
            h.offset_l = l_spec;
            h.offset_r = r_spec;
            h.is_seam = is_seam;
        }

        self.bev_verts.push(BevVert {
            v,
            no: mesh.vertex_normal(v),
            edgecount: tot_edges,
            selcount: nsel,
            wirecount: tot_wire,
            offset: bev_offset,
            any_seam: false,
            visited: false,
            edges: (base..base + tot_edges).collect(),
            wire_edges,
            vmesh: VMesh {
                seg: self.params.seg,
                ..VMesh::default()
            },
        });
        self.vert_map.insert(v, bv);
        self.diagnostics.beveled_vertex_count += 1;
        log::debug!("bevel: vertex {v} has {tot_edges} edges, {nsel} beveled, {tot_wire} wire");
        Some(bv)
    }

    pub(crate) fn untag_vert(&mut self, v: VertId) {
        if let Some(tag) = self.vert_tags.get_mut(v) {
            *tag = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::bevel::options::{BevelOptions, BevelParams};

    fn cube_with_edge_tagged() -> (PolyMesh, BevelContext) {
        let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
        let e = mesh.edge_between(0, 1).expect("cube edge");
        mesh.edges[e].selected = true;
        mesh.vertices[0].selected = true;
        mesh.vertices[1].selected = true;
        let params = BevelParams::from_options(&BevelOptions::new(0.1, 1));
        let ctx = BevelContext::new(&mesh, params);
        (mesh, ctx)
    }

    #[test]
    fn cube_corner_edges_are_ordered_around_shared_faces() {
        let (mesh, mut ctx) = cube_with_edge_tagged();
        let bv = ctx.bevel_vert_construct(&mesh, 0).expect("vertex is beveled");
        let b = &ctx.bev_verts[bv];
        assert_eq!(b.edgecount, 3);
        assert_eq!(b.selcount, 1);
        for &eh in &b.edges {
            let h = &ctx.edge_halves[eh];
            let next = &ctx.edge_halves[h.next];
            let f = h.fnext.expect("closed corner has a face between every pair");
            assert!(mesh.faces[f].edges.contains(&h.e));
            assert!(mesh.faces[f].edges.contains(&next.e));
            assert_eq!(next.fprev, h.fnext);
        }
    }

    #[test]
    fn cube_corner_order_is_counter_clockwise() {
        let (mesh, mut ctx) = cube_with_edge_tagged();
        let bv = ctx.bevel_vert_construct(&mesh, 0).expect("vertex is beveled");
        let edges = ctx.bev_verts[bv].edges.clone();
        let sum: i32 = edges
            .iter()
            .map(|&eh| {
                let h = &ctx.edge_halves[eh];
                bev_ccw_test(&mesh, h.e, ctx.edge_halves[h.next].e, h.fnext)
            })
            .sum();
        assert!(sum > 0);
    }

    #[test]
    fn offset_specs_follow_the_offset_amount() {
        let (mesh, mut ctx) = cube_with_edge_tagged();
        let bv = ctx.bevel_vert_construct(&mesh, 0).expect("vertex is beveled");
        for &eh in &ctx.bev_verts[bv].edges {
            let h = &ctx.edge_halves[eh];
            if h.is_bev {
                assert!((h.offset_l_spec - 0.1).abs() < 1e-12);
                assert!((h.offset_r_spec - 0.1).abs() < 1e-12);
            } else {
                assert_eq!(h.offset_l_spec, 0.0);
            }
        }
    }

    #[test]
    fn width_mode_divides_by_chord_factor() {
        let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
        let e = mesh.edge_between(0, 1).expect("cube edge");
        mesh.edges[e].selected = true;
        let params = BevelParams::from_options(&BevelOptions::new(0.1, 1).with_offset_type(OffsetType::Width));
        let mut ctx = BevelContext::new(&mesh, params);
        let bv = ctx.bevel_vert_construct(&mesh, 0).expect("vertex is beveled");
        let eh = ctx.find_edge_half(bv, e).expect("edge half");
        // Right-angle dihedral: the chord across the bevel is offset * sqrt(2).
        let expected = 0.1 / 2.0_f64.sqrt();
        assert!((ctx.edge_halves[eh].offset_l_spec - expected).abs() < 1e-9);
    }

    #[test]
    fn vertex_without_beveled_edges_is_skipped() {
        let (mesh, mut ctx) = cube_with_edge_tagged();
        ctx.vert_tags[6] = true;
        assert!(ctx.bevel_vert_construct(&mesh, 6).is_none());
        assert!(!ctx.vert_tagged(6));
        assert_eq!(ctx.diagnostics.skipped_vertex_count, 1);
    }

    #[test]
    fn extend_follows_faces_across_an_open_fan() {
        // Two quads around vertex 0, open on both sides.
        let positions = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [-1.0, 1.0, 0.0],
            [-1.0, 0.0, 0.0],
        ];
        let faces = vec![vec![0, 1, 2, 3], vec![0, 3, 4, 5]];
        let mesh = PolyMesh::from_vertices_faces(&positions, &faces).expect("valid mesh");
        let e01 = mesh.edge_between(0, 1).expect("edge");
        let mut order = vec![e01];
        let mut used: HashSet<EdgeId> = order.iter().copied().collect();
        extend_edge_order(&mesh, 0, 3, &mut order, &mut used);
        assert_eq!(order.len(), 3);
        assert_eq!(order[1], mesh.edge_between(0, 3).expect("edge"));
        assert_eq!(order[2], mesh.edge_between(0, 5).expect("edge"));
    }
}
