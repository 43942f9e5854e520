//! Clamp the offset so neighbouring bevels cannot overlap.

use std::f64::consts::PI;

use crate::geom::core::angle_at;
use crate::geom::poly_mesh::{LoopRef, PolyMesh};

use super::context::{BEVEL_EPSILON, BevelContext, EhId};
use super::options::OffsetType;

fn safe_divide(a: f64, b: f64) -> f64 {
    if b == 0.0 { 0.0 } else { a / b }
}

/// Sum of `len * sin(turn)` walking a face from `start` until the walk turns away from
/// the beveled edge. `step` moves one corner, `turn` is the exterior angle at that corner.
fn side_slide(
    mesh: &PolyMesh,
    start: LoopRef,
    first_turn: f64,
    step: impl Fn(LoopRef) -> LoopRef,
    turn: impl Fn(LoopRef) -> f64,
) -> f64 {
    let mut l = start;
    let mut exterior = first_turn;
    let mut slide = mesh.edge_length(mesh.loop_edge(l)) * exterior.sin();
    let mut guard = mesh.face_len(start.face);
    while exterior < 0.0001 && guard > 0 {
        l = step(l);
        exterior += turn(l);
        slide += mesh.edge_length(mesh.loop_edge(l)) * exterior.sin();
        guard -= 1;
    }
    slide
}

impl BevelContext {
    fn no_collide_offset(&self) -> f64 {
        self.params.offset + 1e6
    }

    /// Offset at which the clone of edge `eb` collapses between its neighbours, or slides
    /// past the far corner along an unbeveled neighbour.
    pub(crate) fn geometry_collide_offset(&self, mesh: &PolyMesh, eb: EhId) -> f64 {
        let no_collide = self.no_collide_offset();
        let mut limit = no_collide;
        if self.params.offset == 0.0 {
            return no_collide;
        }
        let hb = &self.edge_halves[eb];
        let mut kb = hb.offset_l_spec;
        let ea = hb.next;
        let ka = self.edge_halves[ea].offset_r_spec;
        let vb = self.eh_vert(eb);
        let mut vc = self.eh_other_vert(mesh, eb);
        let va = self.eh_other_vert(mesh, ea);
        let other = self.other_end_edge_half(mesh, eb);

        if self.params.percent_or_absolute() {
            let other_prev_bev = other.is_some_and(|(eo, _)| self.edge_halves[self.edge_halves[eo].prev].is_bev);
            if self.edge_halves[ea].is_bev && other_prev_bev {
                if self.params.offset_type == OffsetType::Percent {
                    return 50.0;
                }
                // Rough: the exact answer depends on the whole neighbourhood.
                let blen = mesh.edge_length(hb.e);
                return if self.params.offset > blen / 2.0 { blen / 2.0 } else { blen };
            }
            return no_collide;
        }

        let (kc, ec, vd) = match other {
            Some((eo, bvc)) => {
                let ec = self.edge_halves[eo].prev;
                vc = self.bev_verts[bvc].v;
                (self.edge_halves[ec].offset_l_spec, Some(ec), self.eh_other_vert(mesh, ec))
            }
            None => {
                // No bevel vertex at c, so C is not beveled: find it in the shared face.
                let Some(f) = hb.fnext else {
                    return no_collide;
                };
                let Some(lb) = mesh.loop_of_face_at_edge(f, hb.e) else {
                    return no_collide;
                };
                let vd = if mesh.loop_vert(mesh.loop_next(lb)) == vc {
                    mesh.loop_vert(mesh.loop_next(mesh.loop_next(lb)))
                } else if mesh.loop_vert(lb) == vc {
                    mesh.loop_vert(mesh.loop_prev(lb))
                } else {
                    return no_collide;
                };
                (0.0, None, vd)
            }
        };
        if self.edge_halves[ea].e == hb.e || ec.is_some_and(|ec| self.edge_halves[ec].e == hb.e) {
            return no_collide;
        }

        let (pa, pb, pc, pd) = (mesh.position(va), mesh.position(vb), mesh.position(vc), mesh.position(vd));
        let th1 = angle_at(pa, pb, pc);
        let th2 = angle_at(pb, pc, pd);

        // Clones of A, B and C meet in one point when B collapses.
        let projected = safe_divide(ka + th1.cos() * kb, th1.sin()) + safe_divide(kc + th2.cos() * kb, th2.sin());
        if projected > BEVEL_EPSILON {
            let collapse = self.params.offset * (pb.distance(pc) / projected);
            if collapse > BEVEL_EPSILON {
                limit = collapse;
            }
        }

        // B slides along an unbeveled side until the face turns away.
        if kb > f64::EPSILON && (ka == 0.0 || kc == 0.0) {
            kb = self.params.offset / kb;
            let Some(f) = hb.fnext else {
                return limit;
            };
            if ka == 0.0 {
                if let Some(la) = mesh.loop_of_face_at_edge(f, self.edge_halves[ea].e) {
                    let slide = side_slide(
                        mesh,
                        la,
                        PI - th1,
                        |l| mesh.loop_prev(l),
                        |l| {
                            let n = mesh.loop_next(l);
                            PI - angle_at(
                                mesh.position(mesh.loop_vert(l)),
                                mesh.position(mesh.loop_vert(n)),
                                mesh.position(mesh.loop_vert(mesh.loop_next(n))),
                            )
                        },
                    );
                    limit = limit.min(slide * kb);
                }
            }
            if kc == 0.0 {
                if let Some(lc) = mesh.loop_of_face_at_edge(f, hb.e) {
                    let slide = side_slide(
                        mesh,
                        mesh.loop_next(lc),
                        PI - th2,
                        |l| mesh.loop_next(l),
                        |l| {
                            PI - angle_at(
                                mesh.position(mesh.loop_vert(mesh.loop_prev(l))),
                                mesh.position(mesh.loop_vert(l)),
                                mesh.position(mesh.loop_vert(mesh.loop_next(l))),
                            )
                        },
                    );
                    limit = limit.min(slide * kb);
                }
            }
        }
        limit
    }

    /// Offset at which the two vertex-only slides along edge `ea` meet.
    pub(crate) fn vertex_collide_offset(&self, mesh: &PolyMesh, ea: EhId) -> f64 {
        let no_collide = self.no_collide_offset();
        let offset = self.params.offset;
        if offset == 0.0 {
            return no_collide;
        }
        let ka = self.edge_halves[ea].offset_l_spec / offset;
        let kb = self
            .other_end_edge_half(mesh, ea)
            .map_or(0.0, |(eb, _)| self.edge_halves[eb].offset_l_spec / offset);
        let kab = ka + kb;
        if kab <= 0.0 {
            return no_collide;
        }
        mesh.edge_length(self.edge_halves[ea].e) / kab
    }

    /// Scale every offset spec down so no bevel collides with its neighbours. Returns the
    /// factor applied (`1.0` when nothing changed).
    pub(crate) fn limit_offset(&mut self, mesh: &PolyMesh) -> f64 {
        let vertex_only = self.params.vertex_only();
        let mut limited = self.params.offset;
        for bv in 0..self.bev_verts.len() {
            if !self.vert_tagged(self.bev_verts[bv].v) {
                continue;
            }
            for &eh in &self.bev_verts[bv].edges {
                let collide = if vertex_only {
                    self.vertex_collide_offset(mesh, eh)
                } else {
                    self.geometry_collide_offset(mesh, eh)
                };
                limited = limited.min(collide);
            }
        }

        if limited >= self.params.offset {
            return 1.0;
        }
        let factor = limited / self.params.offset;
        for h in &mut self.edge_halves {
            h.offset_l_spec *= factor;
            h.offset_r_spec *= factor;
            h.offset_l *= factor;
            h.offset_r *= factor;
        }
        log::debug!("bevel: offset clamped from {} to {limited}", self.params.offset);
        self.params.offset = limited;
        self.diagnostics.offset_limit_factor = Some(factor);
        factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::bevel::options::{BevelOptions, BevelParams};

    fn tagged_cube(offset: f64, edges: &[(usize, usize)]) -> (PolyMesh, BevelContext) {
        let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
        for &(a, b) in edges {
            let e = mesh.edge_between(a, b).expect("cube edge");
            mesh.edges[e].selected = true;
            mesh.vertices[a].selected = true;
            mesh.vertices[b].selected = true;
        }
        let params = BevelParams::from_options(&BevelOptions::new(offset, 1));
        let mut ctx = BevelContext::new(&mesh, params);
        for v in 0..8 {
            if ctx.vert_tagged(v) {
                ctx.bevel_vert_construct(&mesh, v);
            }
        }
        (mesh, ctx)
    }

    #[test]
    fn small_offset_is_left_alone() {
        let (mesh, mut ctx) = tagged_cube(0.1, &[(0, 1)]);
        assert_eq!(ctx.limit_offset(&mesh), 1.0);
        assert_eq!(ctx.params.offset, 0.1);
        assert!(ctx.diagnostics.offset_limit_factor.is_none());
    }

    #[test]
    fn huge_offset_is_clamped_and_specs_scale_together() {
        let (mesh, mut ctx) = tagged_cube(5.0, &[(0, 1), (1, 2)]);
        let factor = ctx.limit_offset(&mesh);
        assert!(factor < 1.0);
        assert!(ctx.params.offset < 5.0);
        for h in ctx.edge_halves.iter().filter(|h| h.is_bev) {
            assert!((h.offset_l_spec - ctx.params.offset).abs() < 1e-9);
        }
    }

    #[test]
    fn clamping_twice_changes_nothing() {
        let (mesh, mut ctx) = tagged_cube(5.0, &[(0, 1), (1, 2), (2, 3)]);
        let first = ctx.limit_offset(&mesh);
        let limited = ctx.params.offset;
        assert!(first < 1.0);
        let second = ctx.limit_offset(&mesh);
        assert!(second > 1.0 - 1e-9);
        assert!(ctx.params.offset <= limited);
        assert!((ctx.params.offset - limited).abs() < 1e-9);
    }

    #[test]
    fn vertex_slides_meet_halfway() {
        let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
        mesh.vertices[0].selected = true;
        mesh.vertices[1].selected = true;
        let params = BevelParams::from_options(
            &BevelOptions::new(0.8, 1).with_affect(crate::geom::bevel::options::AffectType::Vertices),
        );
        let mut ctx = BevelContext::new(&mesh, params);
        let bv0 = ctx.bevel_vert_construct(&mesh, 0).expect("beveled");
        ctx.bevel_vert_construct(&mesh, 1).expect("beveled");
        let e = mesh.edge_between(0, 1).expect("cube edge");
        let eh = ctx.find_edge_half(bv0, e).expect("edge half");
        assert!((ctx.vertex_collide_offset(&mesh, eh) - 0.5).abs() < 1e-9);
    }
}
