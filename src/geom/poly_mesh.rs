//! Polygon mesh with stable element ids and explicit adjacency.
//!
//! `PolyMesh` is the mesh the bevel engine edits in place. It stores vertices, edges and
//! n-gon faces in arenas indexed by plain `usize` ids. Removed elements are tombstoned
//! rather than compacted so that ids handed out during an edit stay valid until the
//! caller asks for a dense copy with [`PolyMesh::compacted`].
//!
//! # Conventions
//! - A face lists its corners in winding order; `edges[i]` joins `verts[i]` and
//!   `verts[(i + 1) % n]`.
//! - A corner is addressed by [`LoopRef`]. The loop's edge is the edge leaving its vertex
//!   in winding order.
//! - An edge keeps its creation direction `(v1, v2)`; some bevel rules depend on it.
//! - Adjacency lists (`MeshVertex::edges`, `MeshEdge::faces`) only ever hold live ids.

use std::collections::HashMap;

use super::core::{BBox, Tolerance, Vec3, plane_frame};

pub type VertId = usize;
pub type EdgeId = usize;
pub type FaceId = usize;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("vertex id out of range or removed: {id}")]
    InvalidVertex { id: VertId },

    #[error("edge id out of range or removed: {id}")]
    InvalidEdge { id: EdgeId },

    #[error("face id out of range or removed: {id}")]
    InvalidFace { id: FaceId },

    #[error("face needs at least 3 corners, got {count}")]
    FaceTooSmall { count: usize },

    #[error("face repeats vertex {id}")]
    RepeatedVertex { id: VertId },

    #[error("edge endpoints must differ (vertex {id})")]
    DegenerateEdge { id: VertId },
}

/// Weighted-normal influence of a face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FaceStrength {
    Weak,
    #[default]
    Medium,
    Strong,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MeshVertex {
    pub position: Vec3,
    pub bevel_weight: f64,
    /// Tag consumed by the bevel in vertex mode.
    pub selected: bool,
    pub edges: Vec<EdgeId>,
    pub removed: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MeshEdge {
    pub v1: VertId,
    pub v2: VertId,
    pub faces: Vec<FaceId>,
    pub seam: bool,
    pub sharp: bool,
    pub bevel_weight: f64,
    /// Tag consumed by the bevel in edge mode.
    pub selected: bool,
    pub removed: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MeshFace {
    pub verts: Vec<VertId>,
    pub edges: Vec<EdgeId>,
    /// Per-corner UVs, parallel to `verts`.
    pub uvs: Option<Vec<[f64; 2]>>,
    pub material: u32,
    pub smooth: bool,
    pub selected: bool,
    pub strength: FaceStrength,
    /// Per-corner custom split normals, parallel to `verts`.
    pub custom_normals: Option<Vec<Vec3>>,
    pub removed: bool,
}

impl MeshFace {
    #[must_use]
    pub fn len(&self) -> usize {
        self.verts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
    }
}

/// A face corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoopRef {
    pub face: FaceId,
    pub index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PolyMesh {
    pub vertices: Vec<MeshVertex>,
    pub edges: Vec<MeshEdge>,
    pub faces: Vec<MeshFace>,
}

impl PolyMesh {
    // ========================================================================
    // Constructors
    // ========================================================================

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from raw positions and corner index lists.
    ///
    /// # Errors
    /// Returns [`MeshError`] when a face references a missing vertex, has fewer than
    /// three corners or repeats a corner.
    pub fn from_vertices_faces(
        positions: &[[f64; 3]],
        face_indices: &[Vec<usize>],
    ) -> Result<Self, MeshError> {
        let mut mesh = Self::new();
        for p in positions {
            mesh.add_vertex(Vec3::from_array(*p));
        }
        for face in face_indices {
            mesh.add_face(face)?;
        }
        Ok(mesh)
    }

    /// Axis-aligned box with outward-facing quads.
    #[must_use]
    pub fn box_from_bounds(min: [f64; 3], max: [f64; 3]) -> Self {
        let lo = Vec3::from_array(min).min(Vec3::from_array(max));
        let hi = Vec3::from_array(min).max(Vec3::from_array(max));
        let mut mesh = Self::new();
        for corner in [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
        ] {
            mesh.add_vertex(corner);
        }
        for face in [
            [0, 3, 2, 1],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [1, 2, 6, 5],
            [2, 3, 7, 6],
            [3, 0, 4, 7],
        ] {
            mesh.push_face(&face);
        }
        mesh
    }

    // ========================================================================
    // Element creation and removal
    // ========================================================================

    pub fn add_vertex(&mut self, position: Vec3) -> VertId {
        self.vertices.push(MeshVertex {
            position,
            bevel_weight: 0.0,
            selected: false,
            edges: Vec::new(),
            removed: false,
        });
        self.vertices.len() - 1
    }

    /// Find the edge between `a` and `b`, creating it when missing.
    ///
    /// # Errors
    /// Fails on removed/out-of-range vertices or when `a == b`.
    pub fn add_edge(&mut self, a: VertId, b: VertId) -> Result<EdgeId, MeshError> {
        self.check_vertex(a)?;
        self.check_vertex(b)?;
        if a == b {
            return Err(MeshError::DegenerateEdge { id: a });
        }
        Ok(self.find_or_create_edge(a, b))
    }

    /// Create a face over existing vertices, creating missing edges.
    ///
    /// # Errors
    /// Fails on fewer than three corners, repeated corners or invalid vertex ids.
    pub fn add_face(&mut self, verts: &[VertId]) -> Result<FaceId, MeshError> {
        if verts.len() < 3 {
            return Err(MeshError::FaceTooSmall { count: verts.len() });
        }
        for (i, &v) in verts.iter().enumerate() {
            self.check_vertex(v)?;
            if verts[..i].contains(&v) {
                return Err(MeshError::RepeatedVertex { id: v });
            }
        }
        Ok(self.push_face(verts))
    }

    fn push_face(&mut self, verts: &[VertId]) -> FaceId {
        let id = self.faces.len();
        let n = verts.len();
        let mut edges = Vec::with_capacity(n);
        for i in 0..n {
            let e = self.find_or_create_edge(verts[i], verts[(i + 1) % n]);
            self.edges[e].faces.push(id);
            edges.push(e);
        }
        self.faces.push(MeshFace {
            verts: verts.to_vec(),
            edges,
            uvs: None,
            material: 0,
            smooth: false,
            selected: false,
            strength: FaceStrength::default(),
            custom_normals: None,
            removed: false,
        });
        id
    }

    fn find_or_create_edge(&mut self, a: VertId, b: VertId) -> EdgeId {
        if let Some(e) = self.edge_between(a, b) {
            return e;
        }
        let id = self.edges.len();
        self.edges.push(MeshEdge {
            v1: a,
            v2: b,
            faces: Vec::new(),
            seam: false,
            sharp: false,
            bevel_weight: 0.0,
            selected: false,
            removed: false,
        });
        self.vertices[a].edges.push(id);
        self.vertices[b].edges.push(id);
        id
    }

    /// Remove a face, leaving its edges and vertices in place.
    pub fn remove_face(&mut self, f: FaceId) {
        if self.faces[f].removed {
            return;
        }
        self.faces[f].removed = true;
        for i in 0..self.faces[f].edges.len() {
            let e = self.faces[f].edges[i];
            self.edges[e].faces.retain(|&x| x != f);
        }
    }

    /// Remove an edge together with every face using it.
    pub fn remove_edge(&mut self, e: EdgeId) {
        if self.edges[e].removed {
            return;
        }
        for f in self.edges[e].faces.clone() {
            self.remove_face(f);
        }
        let (a, b) = (self.edges[e].v1, self.edges[e].v2);
        self.vertices[a].edges.retain(|&x| x != e);
        self.vertices[b].edges.retain(|&x| x != e);
        self.edges[e].removed = true;
    }

    /// Remove a vertex together with its edges and faces.
    pub fn remove_vertex(&mut self, v: VertId) {
        if self.vertices[v].removed {
            return;
        }
        for e in self.vertices[v].edges.clone() {
            self.remove_edge(e);
        }
        self.vertices[v].removed = true;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    fn check_vertex(&self, v: VertId) -> Result<(), MeshError> {
        match self.vertices.get(v) {
            Some(vert) if !vert.removed => Ok(()),
            _ => Err(MeshError::InvalidVertex { id: v }),
        }
    }

    /// # Errors
    /// Returns [`MeshError::InvalidEdge`] for removed or out-of-range ids.
    pub fn check_edge(&self, e: EdgeId) -> Result<(), MeshError> {
        match self.edges.get(e) {
            Some(edge) if !edge.removed => Ok(()),
            _ => Err(MeshError::InvalidEdge { id: e }),
        }
    }

    /// # Errors
    /// Returns [`MeshError::InvalidVertex`] for removed or out-of-range ids.
    pub fn validate_vertex(&self, v: VertId) -> Result<(), MeshError> {
        self.check_vertex(v)
    }

    #[must_use]
    pub fn position(&self, v: VertId) -> Vec3 {
        self.vertices[v].position
    }

    pub fn set_position(&mut self, v: VertId, position: Vec3) {
        self.vertices[v].position = position;
    }

    #[must_use]
    pub fn vertex_edges(&self, v: VertId) -> &[EdgeId] {
        &self.vertices[v].edges
    }

    /// Faces around `v`, each listed once.
    #[must_use]
    pub fn vertex_faces(&self, v: VertId) -> Vec<FaceId> {
        let mut faces = Vec::new();
        for &e in &self.vertices[v].edges {
            for &f in &self.edges[e].faces {
                if !faces.contains(&f) {
                    faces.push(f);
                }
            }
        }
        faces
    }

    #[must_use]
    pub fn edge_between(&self, a: VertId, b: VertId) -> Option<EdgeId> {
        self.vertices[a].edges.iter().copied().find(|&e| {
            let edge = &self.edges[e];
            (edge.v1 == a && edge.v2 == b) || (edge.v1 == b && edge.v2 == a)
        })
    }

    #[must_use]
    pub fn edge_other_vert(&self, e: EdgeId, v: VertId) -> VertId {
        let edge = &self.edges[e];
        if edge.v1 == v { edge.v2 } else { edge.v1 }
    }

    #[must_use]
    pub fn edge_face_count(&self, e: EdgeId) -> usize {
        self.edges[e].faces.len()
    }

    #[must_use]
    pub fn is_wire(&self, e: EdgeId) -> bool {
        self.edges[e].faces.is_empty()
    }

    #[must_use]
    pub fn edge_length(&self, e: EdgeId) -> f64 {
        let edge = &self.edges[e];
        self.position(edge.v1).distance(self.position(edge.v2))
    }

    /// True when the edge has exactly two faces.
    #[must_use]
    pub fn edge_is_manifold(&self, e: EdgeId) -> bool {
        self.edges[e].faces.len() == 2
    }

    /// Angle between the normals of a manifold edge's two faces, negative when the edge
    /// is concave. Non-manifold edges report `0.0`.
    #[must_use]
    pub fn edge_face_angle_signed(&self, e: EdgeId) -> f64 {
        let loops = self.edge_loops(e);
        let [l1, l2] = loops.as_slice() else {
            return 0.0;
        };
        let n1 = self.face_normal(l1.face);
        let n2 = self.face_normal(l2.face);
        let angle = n1.angle_to(n2);
        if Tolerance::ZERO_LENGTH.approx_eq_vec3(n1, n2) {
            return angle;
        }
        let dir = self.position(self.loop_vert(self.loop_next(*l1))) - self.position(self.loop_vert(*l1));
        if dir.dot(n1.cross(n2)) > 0.0 { angle } else { -angle }
    }

    /// Whether two edges share a face.
    #[must_use]
    pub fn edges_share_face(&self, a: EdgeId, b: EdgeId) -> bool {
        self.edges[a].faces.iter().any(|f| self.edges[b].faces.contains(f))
    }

    /// Corners of `e` across its faces, one per face.
    #[must_use]
    pub fn edge_loops(&self, e: EdgeId) -> Vec<LoopRef> {
        self.edges[e]
            .faces
            .iter()
            .filter_map(|&f| self.loop_of_face_at_edge(f, e))
            .collect()
    }

    #[must_use]
    pub fn face_len(&self, f: FaceId) -> usize {
        self.faces[f].verts.len()
    }

    pub fn face_loops(&self, f: FaceId) -> impl Iterator<Item = LoopRef> + '_ {
        (0..self.faces[f].verts.len()).map(move |index| LoopRef { face: f, index })
    }

    #[must_use]
    pub fn loop_vert(&self, l: LoopRef) -> VertId {
        self.faces[l.face].verts[l.index]
    }

    /// Edge from this corner's vertex to the next corner's vertex.
    #[must_use]
    pub fn loop_edge(&self, l: LoopRef) -> EdgeId {
        self.faces[l.face].edges[l.index]
    }

    #[must_use]
    pub fn loop_next(&self, l: LoopRef) -> LoopRef {
        let n = self.faces[l.face].verts.len();
        LoopRef { face: l.face, index: (l.index + 1) % n }
    }

    #[must_use]
    pub fn loop_prev(&self, l: LoopRef) -> LoopRef {
        let n = self.faces[l.face].verts.len();
        LoopRef { face: l.face, index: (l.index + n - 1) % n }
    }

    #[must_use]
    pub fn loop_of_face_at_vert(&self, f: FaceId, v: VertId) -> Option<LoopRef> {
        self.faces[f]
            .verts
            .iter()
            .position(|&x| x == v)
            .map(|index| LoopRef { face: f, index })
    }

    #[must_use]
    pub fn loop_of_face_at_edge(&self, f: FaceId, e: EdgeId) -> Option<LoopRef> {
        self.faces[f]
            .edges
            .iter()
            .position(|&x| x == e)
            .map(|index| LoopRef { face: f, index })
    }

    #[must_use]
    pub fn loop_uv(&self, l: LoopRef) -> Option<[f64; 2]> {
        self.faces[l.face].uvs.as_ref().map(|uvs| uvs[l.index])
    }

    #[must_use]
    pub fn face_positions(&self, f: FaceId) -> Vec<Vec3> {
        self.faces[f].verts.iter().map(|&v| self.position(v)).collect()
    }

    /// Newell normal, unit length; `Vec3::Z` for degenerate faces.
    #[must_use]
    pub fn face_normal(&self, f: FaceId) -> Vec3 {
        newell_normal(&self.face_positions(f))
            .normalized()
            .unwrap_or(Vec3::Z)
    }

    #[must_use]
    pub fn face_center(&self, f: FaceId) -> Vec3 {
        let pts = self.face_positions(f);
        let sum = pts.iter().fold(Vec3::ZERO, |acc, &p| acc + p);
        sum / pts.len().max(1) as f64
    }

    /// Center of the face's bounding box.
    #[must_use]
    pub fn face_center_bounds(&self, f: FaceId) -> Vec3 {
        BBox::from_points(self.face_positions(f))
            .map(BBox::center)
            .unwrap_or(Vec3::ZERO)
    }

    #[must_use]
    pub fn face_area(&self, f: FaceId) -> f64 {
        newell_normal(&self.face_positions(f)).length() * 0.5
    }

    /// Angle-weighted average of the surrounding face normals.
    ///
    /// A vertex without faces uses its normalized position, falling back to `Vec3::Z`.
    #[must_use]
    pub fn vertex_normal(&self, v: VertId) -> Vec3 {
        let mut sum = Vec3::ZERO;
        for f in self.vertex_faces(v) {
            let Some(l) = self.loop_of_face_at_vert(f, v) else {
                continue;
            };
            let p = self.position(v);
            let prev = self.position(self.loop_vert(self.loop_prev(l)));
            let next = self.position(self.loop_vert(self.loop_next(l)));
            let angle = (prev - p).angle_to(next - p);
            sum += self.face_normal(f) * angle;
        }
        sum.normalized()
            .or_else(|| self.position(v).normalized())
            .unwrap_or(Vec3::Z)
    }

    /// Whether `p`, projected onto the face plane, falls inside the face polygon.
    #[must_use]
    pub fn face_contains_point(&self, f: FaceId, p: Vec3) -> bool {
        let (u, w) = plane_frame(self.face_normal(f));
        let flat: Vec<[f64; 2]> = self
            .face_positions(f)
            .iter()
            .map(|q| [q.dot(u), q.dot(w)])
            .collect();
        point_in_polygon_2d(&flat, [p.dot(u), p.dot(w)])
    }

    /// UV at `p` interpolated from the corner UVs of `f` with mean-value weights.
    #[must_use]
    pub fn face_uv_interp(&self, f: FaceId, p: Vec3) -> Option<[f64; 2]> {
        let uvs = self.faces[f].uvs.as_ref()?;
        let weights = self.face_interp_weights(f, p);
        let mut uv = [0.0, 0.0];
        for (w, corner) in weights.iter().zip(uvs) {
            uv[0] += w * corner[0];
            uv[1] += w * corner[1];
        }
        Some(uv)
    }

    /// Mean-value weights of `p` with respect to the corners of `f`.
    #[must_use]
    pub fn face_interp_weights(&self, f: FaceId, p: Vec3) -> Vec<f64> {
        let (u, w) = plane_frame(self.face_normal(f));
        let flat: Vec<[f64; 2]> = self
            .face_positions(f)
            .iter()
            .map(|q| [q.dot(u), q.dot(w)])
            .collect();
        mean_value_weights(&flat, [p.dot(u), p.dot(w)])
    }

    #[must_use]
    pub fn bounding_box(&self) -> Option<BBox> {
        BBox::from_points(self.live_vertices().map(|v| self.position(v)))
    }

    /// True when every live edge has at least two faces.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.live_edges().all(|e| self.edges[e].faces.len() >= 2)
    }

    pub fn live_vertices(&self) -> impl Iterator<Item = VertId> + '_ {
        (0..self.vertices.len()).filter(|&v| !self.vertices[v].removed)
    }

    pub fn live_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len()).filter(|&e| !self.edges[e].removed)
    }

    pub fn live_faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.faces.len()).filter(|&f| !self.faces[f].removed)
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.live_vertices().count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.live_edges().count()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.live_faces().count()
    }

    /// Dense copy without tombstones. Attributes are carried over.
    #[must_use]
    pub fn compacted(&self) -> Self {
        let mut vert_map: HashMap<VertId, VertId> = HashMap::new();
        let mut out = Self::new();
        for v in self.live_vertices() {
            let src = &self.vertices[v];
            let id = out.add_vertex(src.position);
            out.vertices[id].bevel_weight = src.bevel_weight;
            out.vertices[id].selected = src.selected;
            vert_map.insert(v, id);
        }
        for f in self.live_faces() {
            let src = &self.faces[f];
            let verts: Vec<VertId> = src.verts.iter().map(|v| vert_map[v]).collect();
            let id = out.push_face(&verts);
            let dst = &mut out.faces[id];
            dst.uvs.clone_from(&src.uvs);
            dst.material = src.material;
            dst.smooth = src.smooth;
            dst.selected = src.selected;
            dst.strength = src.strength;
            dst.custom_normals.clone_from(&src.custom_normals);
        }
        for e in self.live_edges() {
            let src = &self.edges[e];
            let id = out.find_or_create_edge(vert_map[&src.v1], vert_map[&src.v2]);
            let dst = &mut out.edges[id];
            dst.seam = src.seam;
            dst.sharp = src.sharp;
            dst.bevel_weight = src.bevel_weight;
            dst.selected = src.selected;
        }
        out
    }
}

// ============================================================================
// Polygon helpers
// ============================================================================

fn newell_normal(pts: &[Vec3]) -> Vec3 {
    let n = pts.len();
    let mut normal = Vec3::ZERO;
    for i in 0..n {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

/// Even-odd crossing test.
fn point_in_polygon_2d(poly: &[[f64; 2]], p: [f64; 2]) -> bool {
    let n = poly.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (a, b) = (poly[i], poly[j]);
        if (a[1] > p[1]) != (b[1] > p[1]) {
            let x = (b[0] - a[0]) * (p[1] - a[1]) / (b[1] - a[1]) + a[0];
            if p[0] < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Mean-value coordinates of `p` in a planar polygon.
fn mean_value_weights(poly: &[[f64; 2]], p: [f64; 2]) -> Vec<f64> {
    let n = poly.len();
    let eps = Tolerance::DEFAULT.eps;
    let mut weights = vec![0.0; n];
    if n == 0 {
        return weights;
    }
    let s: Vec<[f64; 2]> = poly.iter().map(|q| [q[0] - p[0], q[1] - p[1]]).collect();
    let r: Vec<f64> = s.iter().map(|d| d[0].hypot(d[1])).collect();

    if let Some(i) = r.iter().position(|&ri| ri < eps) {
        weights[i] = 1.0;
        return weights;
    }

    let mut tan_half = vec![0.0; n];
    for i in 0..n {
        let j = (i + 1) % n;
        let cross = s[i][0] * s[j][1] - s[i][1] * s[j][0];
        let dot = s[i][0] * s[j][0] + s[i][1] * s[j][1];
        if cross.abs() < eps * r[i] * r[j] {
            if dot < 0.0 {
                // On the edge itself: linear blend of its endpoints.
                weights[i] = r[j] / (r[i] + r[j]);
                weights[j] = r[i] / (r[i] + r[j]);
                return weights;
            }
            continue;
        }
        tan_half[i] = (r[i] * r[j] - dot) / cross;
    }

    let mut total = 0.0;
    for i in 0..n {
        let prev = (i + n - 1) % n;
        weights[i] = (tan_half[prev] + tan_half[i]) / r[i];
        total += weights[i];
    }
    if total.abs() > eps {
        for w in &mut weights {
            *w /= total;
        }
    } else {
        weights.fill(1.0 / n as f64);
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_value_weights_reproduce_linear_functions() {
        let square = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]];
        let w = mean_value_weights(&square, [0.5, 1.5]);
        let x: f64 = w.iter().zip(&square).map(|(wi, q)| wi * q[0]).sum();
        let y: f64 = w.iter().zip(&square).map(|(wi, q)| wi * q[1]).sum();
        assert!((x - 0.5).abs() < 1e-9);
        assert!((y - 1.5).abs() < 1e-9);
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean_value_weights_on_corner_and_edge() {
        let tri = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        assert_eq!(mean_value_weights(&tri, [1.0, 0.0]), vec![0.0, 1.0, 0.0]);
        let w = mean_value_weights(&tri, [0.25, 0.0]);
        assert!((w[0] - 0.75).abs() < 1e-12);
        assert!((w[1] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_point_in_polygon() {
        let square = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        assert!(point_in_polygon_2d(&square, [0.5, 0.5]));
        assert!(!point_in_polygon_2d(&square, [1.5, 0.5]));
    }
}
