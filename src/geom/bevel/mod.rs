//! Mesh bevel: replace selected vertices or edges of a [`PolyMesh`] by rounded or
//! chamfered geometry.
//!
//! The run is split into phases that all work on one [`BevelContext`]:
//!
//! 1. **analyze**: order the edges around every tagged vertex and compute offsets.
//! 2. **limit** (optional): clamp the offset so neighbouring bevels cannot collide.
//! 3. **boundary**: place the boundary points of each vertex patch, with miters.
//! 4. **adjust** (optional): reconcile offsets along chains of loop-slid edges.
//! 5. **build**: fill each vertex patch with new faces.
//! 6. **edge_polygons**: build the corridor of faces along each beveled edge.
//! 7. **rebuild**: replace the faces around beveled vertices and reconnect wires.
//!
//! Original faces and vertices stay alive until the end so the attribute code can still
//! interpolate from them.
//!
//! # Example
//! ```ignore
//! use bevel_engine::geom::{BevelOptions, PolyMesh, bevel_mesh};
//!
//! let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
//! let e = mesh.edge_between(0, 1).unwrap();
//! mesh.edges[e].selected = true;
//! let (output, diag) = bevel_mesh(&mut mesh, &BevelOptions::new(0.1, 3))?;
//! assert_eq!(output.corridor_faces.len(), 3);
//! ```

mod adjust;
mod analyze;
mod attrs;
mod boundary;
mod build;
mod context;
mod edge_polygons;
mod error;
mod limit;
mod meet;
mod options;
mod profile;
mod rebuild;
mod vmesh;

use std::collections::HashSet;

use super::diagnostics::BevelDiagnostics;
use super::poly_mesh::{FaceId, PolyMesh, VertId};

use context::{BevelContext, FaceKind};

pub(crate) use context::MeshPattern;
pub use error::BevelError;
pub use options::{
    AffectType, BevelOptions, CustomProfile, FaceStrengthMode, InnerMiter, OffsetType, OuterMiter, ProfileType,
    VMeshMethod,
};
pub use profile::even_superellipse_chords;

use options::BevelParams;

/// New faces of a bevel run, by role.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct BevelOutput {
    /// Faces filling the vertex patches.
    pub patch_faces: Vec<FaceId>,
    /// Faces along beveled edges.
    pub corridor_faces: Vec<FaceId>,
    /// Copies of the original faces that touched a beveled vertex.
    pub rebuilt_faces: Vec<FaceId>,
    /// Original vertices removed by the bevel.
    pub removed_vertices: Vec<VertId>,
}

impl BevelOutput {
    fn collect(ctx: &BevelContext, mesh: &PolyMesh, removed_vertices: Vec<VertId>) -> Self {
        let mut out = Self { removed_vertices, ..Self::default() };
        let mut faces: Vec<(FaceId, FaceKind)> = ctx.face_kinds.iter().map(|(&f, &k)| (f, k)).collect();
        faces.sort_unstable();
        for (f, kind) in faces {
            if mesh.faces[f].removed {
                continue;
            }
            match kind {
                FaceKind::Vert => out.patch_faces.push(f),
                FaceKind::Edge => out.corridor_faces.push(f),
                FaceKind::Recon => out.rebuilt_faces.push(f),
                FaceKind::Orig => {}
            }
        }
        out
    }

    /// Every new face.
    #[must_use]
    pub fn new_faces(&self) -> Vec<FaceId> {
        let mut all: Vec<FaceId> =
            self.patch_faces.iter().chain(&self.corridor_faces).chain(&self.rebuilt_faces).copied().collect();
        all.sort_unstable();
        all
    }
}

/// Bevel the selected elements of `mesh` in place.
///
/// In edge mode the selected edges shared by exactly two faces are beveled, together
/// with their end vertices. In vertex mode the selected vertices are beveled. Removed
/// elements are tombstoned; call [`PolyMesh::compacted`] for a dense mesh.
///
/// # Arguments
/// * `mesh` - The mesh to edit, with the elements to bevel marked `selected`.
/// * `options` - Offset, profile, segments and the other bevel settings.
///
/// # Returns
/// The new faces by role, and diagnostics for the run. An offset of zero (or nothing
/// eligible selected) leaves the mesh untouched and returns empty output.
///
/// # Errors
/// Returns [`BevelError`] when `options` are out of range or a selected edge references
/// a removed vertex.
pub fn bevel_mesh(mesh: &mut PolyMesh, options: &BevelOptions) -> Result<(BevelOutput, BevelDiagnostics), BevelError> {
    options.validate()?;
    let params = BevelParams::from_options(options);
    if params.offset <= 0.0 {
        log::debug!("bevel: offset {} is not positive, nothing to do", params.offset);
        return Ok((BevelOutput::default(), BevelDiagnostics::default()));
    }

    let mut ctx = BevelContext::new(mesh, params);
    tag_selection(&mut ctx, mesh)?;

    let tagged: Vec<VertId> = mesh.live_vertices().filter(|&v| ctx.vert_tagged(v)).collect();
    if tagged.is_empty() {
        log::debug!("bevel: nothing selected");
        return Ok((BevelOutput::default(), ctx.diagnostics));
    }
    ctx.init_face_components(mesh);

    for &v in &tagged {
        if let Some(bv) = ctx.bevel_vert_construct(mesh, v) {
            if !ctx.params.limit_offset {
                ctx.build_boundary(mesh, bv, true);
            }
        }
    }
    if ctx.params.limit_offset {
        ctx.limit_offset(mesh);
        for bv in 0..ctx.bev_verts.len() {
            ctx.build_boundary(mesh, bv, true);
        }
    }
    if ctx.params.offset_adjust {
        ctx.adjust_offsets(mesh);
    }
    if ctx.params.is_custom() {
        for e in mesh.live_edges().collect::<Vec<_>>() {
            if ctx.edge_tagged(e) {
                ctx.regularize_profile_orientation(mesh, e);
            }
        }
    }

    for bv in 0..ctx.bev_verts.len() {
        ctx.build_vmesh(mesh, bv);
    }
    if !ctx.params.vertex_only() {
        for e in mesh.live_edges().collect::<Vec<_>>() {
            if ctx.edge_tagged(e) {
                ctx.build_edge_polygons(mesh, e);
            }
        }
    }
    for bv in 0..ctx.bev_verts.len() {
        ctx.extend_edge_data(mesh, bv);
    }

    let beveled: Vec<VertId> = ctx.bev_verts.iter().map(|b| b.v).filter(|&v| ctx.vert_tagged(v)).collect();
    let mut rebuilt: HashSet<FaceId> = HashSet::new();
    for &v in &beveled {
        ctx.rebuild_existing(mesh, v, &mut rebuilt);
        ctx.reattach_wires(mesh, v);
    }
    for &f in &rebuilt {
        mesh.remove_face(f);
    }
    for &v in &beveled {
        mesh.remove_vertex(v);
    }

    if ctx.params.harden_normals {
        ctx.harden_normals(mesh);
    }
    if ctx.params.face_strength_mode != FaceStrengthMode::None {
        ctx.set_face_strength(mesh);
    }
    ctx.long_loops.clear();

    log::debug!("bevel: {}", ctx.diagnostics.summary());
    let output = BevelOutput::collect(&ctx, mesh, beveled);
    Ok((output, ctx.diagnostics))
}

/// Tag the elements to bevel from the selection. Corridors need two faces, so selected
/// edges without exactly two are skipped with a warning.
fn tag_selection(ctx: &mut BevelContext, mesh: &PolyMesh) -> Result<(), BevelError> {
    let vertex_only = ctx.params.vertex_only();
    ctx.edge_tags = vec![false; mesh.edges.len()];
    ctx.vert_tags = vec![false; mesh.vertices.len()];

    if vertex_only {
        for v in mesh.live_vertices() {
            ctx.vert_tags[v] = mesh.vertices[v].selected;
        }
        return Ok(());
    }

    for e in mesh.live_edges() {
        if !mesh.edges[e].selected {
            continue;
        }
        let (v1, v2) = (mesh.edges[e].v1, mesh.edges[e].v2);
        mesh.validate_vertex(v1)?;
        mesh.validate_vertex(v2)?;
        if mesh.edge_face_count(e) != 2 {
            log::warn!("bevel: edge {e} is not shared by two faces, skipped");
            ctx.diagnostics.skipped_corridor_count += 1;
            ctx.diagnostics.add_warning(format!("edge {e}: not manifold, not beveled"));
            continue;
        }
        if ctx.params.use_weights && mesh.edges[e].bevel_weight <= 0.0 {
            continue;
        }
        ctx.edge_tags[e] = true;
        ctx.vert_tags[v1] = true;
        ctx.vert_tags[v2] = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_offset_leaves_mesh_untouched() {
        let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
        mesh.edges[0].selected = true;
        let before = mesh.clone();
        let (output, diag) = bevel_mesh(&mut mesh, &BevelOptions::new(0.0, 3)).expect("bevel");
        assert_eq!(mesh, before);
        assert!(output.new_faces().is_empty());
        assert_eq!(diag.beveled_vertex_count, 0);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
        let err = bevel_mesh(&mut mesh, &BevelOptions::new(0.1, 2).with_profile(1.5));
        assert!(matches!(err, Err(BevelError::InvalidProfile { .. })));
    }

    #[test]
    fn boundary_edge_selection_is_skipped() {
        let mut mesh =
            PolyMesh::from_vertices_faces(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], &[vec![0, 1, 2]])
                .expect("triangle");
        mesh.edges[0].selected = true;
        let (output, diag) = bevel_mesh(&mut mesh, &BevelOptions::new(0.1, 1)).expect("bevel");
        assert!(output.new_faces().is_empty());
        assert_eq!(diag.skipped_corridor_count, 1);
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn single_cube_edge_chamfer() {
        let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
        let e = mesh.edge_between(0, 1).expect("cube edge");
        mesh.edges[e].selected = true;
        let (output, diag) = bevel_mesh(&mut mesh, &BevelOptions::new(0.1, 1)).expect("bevel");
        assert_eq!(mesh.vertex_count(), 10);
        assert_eq!(mesh.edge_count(), 15);
        assert_eq!(mesh.face_count(), 7);
        assert_eq!(output.corridor_faces.len(), 1);
        assert_eq!(output.rebuilt_faces.len(), 4);
        assert_eq!(output.removed_vertices, vec![0, 1]);
        assert_eq!(diag.beveled_edge_count, 1);
        assert!(mesh.is_closed());
    }
}
