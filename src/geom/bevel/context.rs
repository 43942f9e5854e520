//! Scratch state for one bevel run.
//!
//! Every record lives in an arena vector on [`BevelContext`] and refers to its neighbours
//! by index, so the cyclic edge lists around a vertex and the boundary loops are plain
//! `next`/`prev` indices instead of pointers.

use std::collections::{HashMap, HashSet};

use crate::geom::core::Vec3;
use crate::geom::diagnostics::BevelDiagnostics;
use crate::geom::poly_mesh::{EdgeId, FaceId, LoopRef, PolyMesh, VertId};

use super::options::BevelParams;
use super::profile::{Profile, ProfileSpacing};

pub(crate) const BEVEL_EPSILON: f64 = 1e-6;
pub(crate) const BEVEL_EPSILON_SQ: f64 = 1e-12;
pub(crate) const BEVEL_EPSILON_BIG: f64 = 1e-4;
pub(crate) const BEVEL_EPSILON_BIG_SQ: f64 = 1e-8;
pub(crate) const BEVEL_EPSILON_ANG: f64 = 2.0 * std::f64::consts::PI / 180.0;
pub(crate) const BEVEL_SMALL_ANG: f64 = 10.0 * std::f64::consts::PI / 180.0;

/// `1 - cos(BEVEL_SMALL_ANG)`.
pub(crate) fn small_ang_dot() -> f64 {
    1.0 - BEVEL_SMALL_ANG.cos()
}

/// `1 - cos(BEVEL_EPSILON_ANG)`.
pub(crate) fn epsilon_ang_dot() -> f64 {
    1.0 - BEVEL_EPSILON_ANG.cos()
}

pub(crate) type EhId = usize;
pub(crate) type BvId = usize;
pub(crate) type BevVertId = usize;

/// Position of a new vertex and, once created, its mesh id.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NewVert {
    pub co: Vec3,
    pub v: Option<VertId>,
}

/// One end of an edge as seen from a bevel vertex.
#[derive(Debug, Clone)]
pub(crate) struct EdgeHalf {
    /// Neighbours around the vertex, counter-clockwise.
    pub next: EhId,
    pub prev: EhId,
    pub e: EdgeId,
    /// Face between this edge and `prev`.
    pub fprev: Option<FaceId>,
    /// Face between this edge and `next`.
    pub fnext: Option<FaceId>,
    /// Boundary point on the left, looking along the edge away from the vertex.
    pub leftv: Option<BvId>,
    /// Boundary point on the right; only for beveled edges.
    pub rightv: Option<BvId>,
    /// Profile sample an unbeveled edge attaches to.
    pub profile_index: usize,
    pub seg: usize,
    pub offset_l: f64,
    pub offset_r: f64,
    pub offset_l_spec: f64,
    pub offset_r_spec: f64,
    pub is_bev: bool,
    /// The bevel vertex is `v2` of the edge.
    pub is_rev: bool,
    /// UVs are discontinuous across the edge.
    pub is_seam: bool,
    pub visited_rpo: bool,
    pub bev_vert: BevVertId,
}

/// One point on the loop that replaces a beveled vertex.
#[derive(Debug, Clone)]
pub(crate) struct BoundVert {
    pub next: BvId,
    pub prev: BvId,
    pub nv: NewVert,
    /// First and last edges attached here, counter-clockwise.
    pub efirst: Option<EhId>,
    pub elast: Option<EhId>,
    /// Unbeveled edge this point slides along.
    pub eon: Option<EhId>,
    /// Beveled edge whose left side is attached here.
    pub ebev: Option<EhId>,
    pub index: usize,
    /// Ratio of sines of the angles to `eon`.
    pub sinratio: f64,
    /// Link in an offset adjustment chain or cycle.
    pub adjchain: Option<BvId>,
    /// Profile from this point to `next`.
    pub profile: Profile,
    pub any_seam: bool,
    pub visited: bool,
    pub is_arc_start: bool,
    pub is_patch_start: bool,
    pub is_profile_start: bool,
    pub seam_len: usize,
    pub sharp_len: usize,
}

/// How the interior of a vertex patch is filled. Only the pipe start is carried here;
/// everything else the fill needs lives on the `BevVert`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum MeshPattern {
    /// No faces; the boundary is only two points.
    #[default]
    None,
    /// One polygon over the boundary and profile points.
    Poly,
    /// The polygon, fanned into triangles from one corner.
    TriFan,
    /// Rings of quads from the boundary toward a center point. `pipe` is the boundary
    /// point starting a straight run through the vertex.
    Adj { pipe: Option<BvId> },
    /// A flat cap at the foot of every profile.
    Cutoff,
}

/// Grid of new vertices for one vertex patch, indexed `(i, j, k)`: boundary point `i`,
/// ring `j` in `0..=seg/2` and profile sample `k` in `0..=seg`.
#[derive(Debug, Clone, Default)]
pub(crate) struct VMesh {
    pub mesh: Vec<NewVert>,
    pub boundstart: Option<BvId>,
    pub count: usize,
    pub seg: usize,
    pub kind: MeshPattern,
}

impl VMesh {
    pub fn new(count: usize, seg: usize, boundstart: Option<BvId>) -> Self {
        let len = count * (seg / 2 + 1) * (seg + 1);
        Self {
            mesh: vec![NewVert::default(); len],
            boundstart,
            count,
            seg,
            kind: MeshPattern::Adj { pipe: None },
        }
    }

    /// Allocate the grid for the boundary that is already counted.
    pub fn allocate(&mut self) {
        self.mesh = vec![NewVert::default(); self.count * (self.seg / 2 + 1) * (self.seg + 1)];
    }

    #[inline]
    fn index(&self, i: usize, j: usize, k: usize) -> usize {
        let nj = self.seg / 2 + 1;
        let nk = self.seg + 1;
        i * nk * nj + j * nk + k
    }

    #[inline]
    pub fn at(&self, i: usize, j: usize, k: usize) -> &NewVert {
        &self.mesh[self.index(i, j, k)]
    }

    #[inline]
    pub fn at_mut(&mut self, i: usize, j: usize, k: usize) -> &mut NewVert {
        let idx = self.index(i, j, k);
        &mut self.mesh[idx]
    }

    #[inline]
    pub fn co(&self, i: usize, j: usize, k: usize) -> Vec3 {
        self.at(i, j, k).co
    }

    pub fn set_co(&mut self, i: usize, j: usize, k: usize, co: Vec3) {
        self.at_mut(i, j, k).co = co;
    }

    pub fn copy_vert(&mut self, to: (usize, usize, usize), from: (usize, usize, usize)) {
        let src = *self.at(from.0, from.1, from.2);
        *self.at_mut(to.0, to.1, to.2) = src;
    }
}

/// Everything known about one beveled (or inspected) vertex.
#[derive(Debug, Clone)]
pub(crate) struct BevVert {
    pub v: VertId,
    /// Vertex normal of the original mesh.
    pub no: Vec3,
    pub edgecount: usize,
    pub selcount: usize,
    pub wirecount: usize,
    /// Offset for vertex-only bevels.
    pub offset: f64,
    pub any_seam: bool,
    pub visited: bool,
    /// Counter-clockwise from the vertex normal side.
    pub edges: Vec<EhId>,
    pub wire_edges: Vec<EdgeId>,
    pub vmesh: VMesh,
}

/// What a face is, for attribute and normal passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum FaceKind {
    Orig,
    Vert,
    Edge,
    Recon,
}

pub(crate) struct BevelContext {
    pub params: BevelParams,
    pub edge_halves: Vec<EdgeHalf>,
    pub bound_verts: Vec<BoundVert>,
    pub bev_verts: Vec<BevVert>,
    pub vert_map: HashMap<VertId, BevVertId>,
    pub face_kinds: HashMap<FaceId, FaceKind>,
    /// UV island of each original face; only set when UVs need it.
    pub face_component: HashMap<FaceId, usize>,
    pub has_math_layers: bool,
    /// Corners of corridor faces lying along long edges, for normal hardening.
    pub long_loops: HashSet<LoopRef>,
    /// Vertices still to be beveled (and removed at the end).
    pub vert_tags: Vec<bool>,
    /// Edges selected for beveling.
    pub edge_tags: Vec<bool>,
    pub pro_spacing: ProfileSpacing,
    pub pro_spacing_miter: ProfileSpacing,
    pub diagnostics: BevelDiagnostics,
}

impl BevelContext {
    pub fn new(mesh: &PolyMesh, params: BevelParams) -> Self {
        let pro_spacing = ProfileSpacing::new(&params, params.is_custom());
        let pro_spacing_miter = if params.is_custom() {
            ProfileSpacing::new(&params, false)
        } else {
            ProfileSpacing::default()
        };
        let mut ctx = Self {
            vert_tags: mesh.vertices.iter().map(|v| v.selected && !v.removed).collect(),
            edge_tags: mesh.edges.iter().map(|e| e.selected && !e.removed).collect(),
            params,
            edge_halves: Vec::new(),
            bound_verts: Vec::new(),
            bev_verts: Vec::new(),
            vert_map: HashMap::new(),
            face_kinds: HashMap::new(),
            face_component: HashMap::new(),
            has_math_layers: false,
            long_loops: HashSet::new(),
            pro_spacing,
            pro_spacing_miter,
            diagnostics: BevelDiagnostics::default(),
        };
        if ctx.params.seg > 1 {
            ctx.pro_spacing.fullness = super::profile::profile_fullness(&ctx.params, &ctx.pro_spacing);
        }
        ctx
    }

    pub fn vert_tagged(&self, v: VertId) -> bool {
        self.vert_tags.get(v).copied().unwrap_or(false)
    }

    pub fn edge_tagged(&self, e: EdgeId) -> bool {
        self.edge_tags.get(e).copied().unwrap_or(false)
    }

    pub fn seg_2(&self) -> usize {
        self.pro_spacing.seg_2
    }

    // ------------------------------------------------------------------------
    // Face kinds
    // ------------------------------------------------------------------------

    pub fn record_face_kind(&mut self, f: FaceId, kind: FaceKind) {
        self.face_kinds.insert(f, kind);
    }

    pub fn face_kind(&self, f: FaceId) -> FaceKind {
        self.face_kinds.get(&f).copied().unwrap_or(FaceKind::Orig)
    }

    // ------------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------------

    pub fn find_bevvert(&self, v: VertId) -> Option<BevVertId> {
        self.vert_map.get(&v).copied()
    }

    pub fn find_edge_half(&self, bv: BevVertId, e: EdgeId) -> Option<EhId> {
        self.bev_verts[bv]
            .edges
            .iter()
            .copied()
            .find(|&eh| self.edge_halves[eh].e == e)
    }

    /// The edge half at the other end of `eh`'s edge, when that end is a bevel vertex.
    pub fn other_end_edge_half(&self, mesh: &PolyMesh, eh: EhId) -> Option<(EhId, BevVertId)> {
        let half = &self.edge_halves[eh];
        let edge = &mesh.edges[half.e];
        let other_v = if half.is_rev { edge.v1 } else { edge.v2 };
        let bvo = self.find_bevvert(other_v)?;
        self.find_edge_half(bvo, half.e).map(|eo| (eo, bvo))
    }

    /// The original vertex at this end of the edge.
    pub fn eh_vert(&self, eh: EhId) -> VertId {
        self.bev_verts[self.edge_halves[eh].bev_vert].v
    }

    /// The vertex at the far end of the edge.
    pub fn eh_other_vert(&self, mesh: &PolyMesh, eh: EhId) -> VertId {
        mesh.edge_other_vert(self.edge_halves[eh].e, self.eh_vert(eh))
    }

    /// The first beveled edge at or after `from` (at or after the last edge when `None`).
    pub fn next_bev(&self, bv: BevVertId, from: Option<EhId>) -> Option<EhId> {
        let start = match from {
            Some(e) => e,
            None => *self.bev_verts[bv].edges.last()?,
        };
        let mut e = start;
        loop {
            if self.edge_halves[e].is_bev {
                return Some(e);
            }
            e = self.edge_halves[e].next;
            if e == start {
                return None;
            }
        }
    }

    pub fn count_ccw_edges_between(&self, e1: EhId, e2: EhId) -> usize {
        let mut count = 0;
        let mut e = e1;
        loop {
            if e == e2 {
                break;
            }
            e = self.edge_halves[e].next;
            count += 1;
            if e == e1 {
                break;
            }
        }
        count
    }

    // ------------------------------------------------------------------------
    // Boundary loops
    // ------------------------------------------------------------------------

    /// Append a boundary point to `bv`'s loop.
    pub fn add_bound_vert(&mut self, bv: BevVertId, co: Vec3) -> BvId {
        let id = self.bound_verts.len();
        let vm = &self.bev_verts[bv].vmesh;
        let (index, next, prev) = match vm.boundstart {
            None => (0, id, id),
            Some(start) => {
                let tail = self.bound_verts[start].prev;
                (self.bound_verts[tail].index + 1, start, tail)
            }
        };
        self.bound_verts.push(BoundVert {
            next,
            prev,
            nv: NewVert { co, v: None },
            efirst: None,
            elast: None,
            eon: None,
            ebev: None,
            index,
            sinratio: 1.0,
            adjchain: None,
            profile: Profile::default(),
            any_seam: false,
            visited: false,
            is_arc_start: false,
            is_patch_start: false,
            is_profile_start: false,
            seam_len: 0,
            sharp_len: 0,
        });
        if let Some(start) = vm.boundstart {
            self.bound_verts[prev].next = id;
            self.bound_verts[start].prev = id;
        } else {
            self.bev_verts[bv].vmesh.boundstart = Some(id);
        }
        self.bev_verts[bv].vmesh.count += 1;
        id
    }

    /// Boundary points of `bv` in loop order, starting at `boundstart`.
    pub fn boundary(&self, bv: BevVertId) -> Vec<BvId> {
        let Some(start) = self.bev_verts[bv].vmesh.boundstart else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(self.bev_verts[bv].vmesh.count);
        let mut v = start;
        loop {
            out.push(v);
            v = self.bound_verts[v].next;
            if v == start || out.len() > self.bound_verts.len() {
                break;
            }
        }
        out
    }

    pub fn bnd_co(&self, v: BvId) -> Vec3 {
        self.bound_verts[v].nv.co
    }

    // ------------------------------------------------------------------------
    // Faces
    // ------------------------------------------------------------------------

    /// Create a face, dropping consecutive repeats. Returns `None` (and records a warning)
    /// when fewer than three distinct corners remain or the mesh rejects it.
    pub fn create_face(&mut self, mesh: &mut PolyMesh, verts: &[VertId]) -> Option<FaceId> {
        let mut corners: Vec<VertId> = Vec::with_capacity(verts.len());
        for &v in verts {
            if corners.last() != Some(&v) {
                corners.push(v);
            }
        }
        while corners.len() > 1 && corners.first() == corners.last() {
            corners.pop();
        }
        if corners.len() < 3 {
            return None;
        }
        match mesh.add_face(&corners) {
            Ok(f) => {
                self.diagnostics.created_face_count += 1;
                Some(f)
            }
            Err(err) => {
                log::debug!("bevel: face not created: {err}");
                self.diagnostics.add_warning(format!("face not created: {err}"));
                None
            }
        }
    }

    /// Create a vertex that starts untagged.
    pub fn create_vert(&mut self, mesh: &mut PolyMesh, co: Vec3) -> VertId {
        let v = mesh.add_vertex(co);
        if self.vert_tags.len() <= v {
            self.vert_tags.resize(v + 1, false);
        }
        self.diagnostics.created_vertex_count += 1;
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::bevel::options::{BevelOptions, BevelParams};

    fn empty_ctx() -> (PolyMesh, BevelContext) {
        let mesh = PolyMesh::new();
        let params = BevelParams::from_options(&BevelOptions::new(0.1, 2));
        let ctx = BevelContext::new(&mesh, params);
        (mesh, ctx)
    }

    fn push_bev_vert(ctx: &mut BevelContext) -> BevVertId {
        ctx.bev_verts.push(BevVert {
            v: 0,
            no: Vec3::Z,
            edgecount: 0,
            selcount: 0,
            wirecount: 0,
            offset: 0.0,
            any_seam: false,
            visited: false,
            edges: Vec::new(),
            wire_edges: Vec::new(),
            vmesh: VMesh::default(),
        });
        ctx.bev_verts.len() - 1
    }

    #[test]
    fn bound_verts_form_a_cycle() {
        let (_, mut ctx) = empty_ctx();
        let bv = push_bev_vert(&mut ctx);
        let a = ctx.add_bound_vert(bv, Vec3::X);
        let b = ctx.add_bound_vert(bv, Vec3::Y);
        let c = ctx.add_bound_vert(bv, Vec3::Z);
        assert_eq!(ctx.boundary(bv), vec![a, b, c]);
        assert_eq!(ctx.bound_verts[c].next, a);
        assert_eq!(ctx.bound_verts[a].prev, c);
        assert_eq!(ctx.bound_verts[c].index, 2);
        assert_eq!(ctx.bev_verts[bv].vmesh.count, 3);
    }

    #[test]
    fn vmesh_indexing_is_dense() {
        let mut vm = VMesh::new(3, 4, None);
        assert_eq!(vm.mesh.len(), 3 * 3 * 5);
        vm.set_co(2, 2, 4, Vec3::splat(7.0));
        assert_eq!(vm.mesh.last().map(|nv| nv.co), Some(Vec3::splat(7.0)));
        vm.copy_vert((0, 0, 0), (2, 2, 4));
        assert_eq!(vm.co(0, 0, 0), Vec3::splat(7.0));
    }

    #[test]
    fn spacing_follows_segment_count() {
        let (_, ctx) = empty_ctx();
        assert_eq!(ctx.pro_spacing.seg_2, 4);
        assert_eq!(ctx.pro_spacing.xvals.len(), 3);
        assert_eq!(ctx.pro_spacing.xvals_2.len(), 5);
    }
}
