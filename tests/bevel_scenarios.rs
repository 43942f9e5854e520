use bevel_engine::BevelEngine;
use bevel_engine::geom::{
    AffectType, BevelOptions, CustomProfile, InnerMiter, OffsetType, OuterMiter, PolyMesh, VMeshMethod,
    bevel_mesh,
};

fn cube() -> PolyMesh {
    PolyMesh::box_from_bounds([0.0; 3], [1.0; 3])
}

fn select_edges(mesh: &mut PolyMesh, edges: &[(usize, usize)]) {
    for &(a, b) in edges {
        let e = mesh.edge_between(a, b).expect("edge exists");
        mesh.edges[e].selected = true;
    }
}

/// A closed, genus-zero result must keep V - E + F = 2 and have no zero-area faces.
fn assert_closed_sphere(mesh: &PolyMesh, label: &str) {
    assert!(mesh.is_closed(), "{label}: mesh has open edges");
    let euler = mesh.vertex_count() as i64 - mesh.edge_count() as i64 + mesh.face_count() as i64;
    assert_eq!(euler, 2, "{label}: euler characteristic {euler}");
    for f in mesh.live_faces() {
        assert!(mesh.face_len(f) >= 3, "{label}: face {f} has fewer than 3 corners");
        assert!(mesh.face_area(f) > 1e-12, "{label}: face {f} is degenerate");
    }
    for v in mesh.live_vertices() {
        assert!(mesh.position(v).is_finite(), "{label}: vertex {v} is not finite");
    }
}

#[test]
fn engine_initializes() {
    let engine = BevelEngine::new();
    assert!(engine.is_initialized());
}

#[test]
fn single_edge_segment_counts() {
    for segments in 1..=6 {
        let mut mesh = cube();
        select_edges(&mut mesh, &[(0, 1)]);
        let (output, _) = bevel_mesh(&mut mesh, &BevelOptions::new(0.15, segments)).expect("bevel");
        assert_eq!(output.corridor_faces.len(), segments);
        assert_eq!(mesh.vertex_count(), 6 + 2 * (segments + 1));
        assert_closed_sphere(&mesh, &format!("edge seg {segments}"));
    }
}

#[test]
fn corner_of_three_edges_for_several_segment_counts() {
    for segments in [1, 2, 3, 4, 5] {
        let mut mesh = cube();
        select_edges(&mut mesh, &[(0, 1), (0, 3), (0, 4)]);
        let (output, diag) = bevel_mesh(&mut mesh, &BevelOptions::new(0.2, segments)).expect("bevel");
        assert_eq!(output.corridor_faces.len(), 3 * segments);
        assert!(!output.patch_faces.is_empty());
        assert_eq!(diag.beveled_edge_count, 3);
        assert_closed_sphere(&mesh, &format!("corner seg {segments}"));
    }
}

#[test]
fn every_cube_edge_rounded() {
    let mut mesh = cube();
    for edge in &mut mesh.edges {
        edge.selected = true;
    }
    let (output, diag) = bevel_mesh(&mut mesh, &BevelOptions::new(0.1, 3)).expect("bevel");
    assert_eq!(diag.beveled_edge_count, 12);
    assert_eq!(diag.beveled_vertex_count, 8);
    assert_eq!(output.corridor_faces.len(), 36);
    assert_eq!(output.removed_vertices.len(), 8);
    assert_closed_sphere(&mesh, "all edges");
}

#[test]
fn cutoff_corner_is_closed() {
    let mut mesh = cube();
    select_edges(&mut mesh, &[(0, 1), (0, 3), (0, 4)]);
    let options = BevelOptions::new(0.2, 3).with_vmesh_method(VMeshMethod::Cutoff);
    let (_, diag) = bevel_mesh(&mut mesh, &options).expect("bevel");
    assert_eq!(diag.cutoff_patch_count, 1);
    assert_closed_sphere(&mesh, "cutoff");
}

#[test]
fn vertex_mode_on_all_corners() {
    let mut mesh = cube();
    for vertex in &mut mesh.vertices {
        vertex.selected = true;
    }
    let options = BevelOptions::new(0.2, 2).with_affect(AffectType::Vertices);
    let (output, diag) = bevel_mesh(&mut mesh, &options).expect("bevel");
    assert_eq!(output.removed_vertices.len(), 8);
    assert_eq!(diag.beveled_edge_count, 0);
    assert_eq!(mesh.vertex_count(), 8 * 7);
    assert_closed_sphere(&mesh, "vertex mode");
}

#[test]
fn offset_types_produce_closed_meshes() {
    for offset_type in [
        OffsetType::Offset,
        OffsetType::Width,
        OffsetType::Depth,
        OffsetType::Percent,
        OffsetType::Absolute,
    ] {
        let mut mesh = cube();
        select_edges(&mut mesh, &[(0, 1), (1, 2)]);
        let amount = if offset_type == OffsetType::Percent { 10.0 } else { 0.1 };
        let options = BevelOptions::new(amount, 2).with_offset_type(offset_type);
        bevel_mesh(&mut mesh, &options).expect("bevel");
        assert_closed_sphere(&mesh, &format!("{offset_type:?}"));
    }
}

#[test]
fn custom_profile_is_sampled_per_segment() {
    let mut mesh = cube();
    select_edges(&mut mesh, &[(0, 1)]);
    let profile = CustomProfile::new(vec![[0.0, 1.0], [0.5, 0.5], [1.0, 0.0]]);
    let options = BevelOptions::new(0.2, 4).with_custom_profile(profile);
    let (output, _) = bevel_mesh(&mut mesh, &options).expect("bevel");
    assert_eq!(output.corridor_faces.len(), 4);
    assert_closed_sphere(&mesh, "custom profile");
}

#[test]
fn reflex_corner_with_arc_miters() {
    let footprint = [[0.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0], [1.0, 2.0], [0.0, 2.0]];
    let n = footprint.len();
    let mut positions = Vec::new();
    for z in [0.0, 1.0] {
        for p in footprint {
            positions.push([p[0], p[1], z]);
        }
    }
    let mut faces: Vec<Vec<usize>> = vec![(0..n).rev().collect(), (n..2 * n).collect()];
    for i in 0..n {
        let j = (i + 1) % n;
        faces.push(vec![i, j, j + n, i + n]);
    }
    let mut mesh = PolyMesh::from_vertices_faces(&positions, &faces).expect("block");
    assert_closed_sphere(&mesh, "block input");

    select_edges(&mut mesh, &[(3, 9), (8, 9), (9, 10)]);
    let options = BevelOptions::new(0.1, 2).with_miters(OuterMiter::Arc, InnerMiter::Arc);
    let (_, diag) = bevel_mesh(&mut mesh, &options).expect("bevel");
    assert!(diag.miter_count > 0);
    assert_eq!(diag.beveled_edge_count, 3);
    assert_closed_sphere(&mesh, "arc miters");
}

/// A 2 x 1 x 1 box cut into two cells at x = 1, so the middle ring of vertices has four
/// edges with a straight run along x.
fn split_box() -> PolyMesh {
    let square = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    let positions: Vec<[f64; 3]> = (0..3_i32)
        .flat_map(|i| square.map(|[y, z]| [f64::from(i), y, z]))
        .collect();
    let mut faces: Vec<Vec<usize>> = vec![vec![0, 3, 2, 1], vec![8, 9, 10, 11]];
    for layer in 0..2 {
        for k in 0..4 {
            let (a, b) = (layer * 4 + k, layer * 4 + (k + 1) % 4);
            faces.push(vec![a, b, b + 4, a + 4]);
        }
    }
    PolyMesh::from_vertices_faces(&positions, &faces).expect("split box")
}

#[test]
fn straight_runs_snap_to_a_pipe() {
    for segments in [2, 3, 4] {
        let mut mesh = split_box();
        assert_closed_sphere(&mesh, "split box input");
        for edge in &mut mesh.edges {
            edge.selected = true;
        }
        let (_, diag) = bevel_mesh(&mut mesh, &BevelOptions::new(0.1, segments)).expect("bevel");
        assert_eq!(diag.pipe_patch_count, 4, "seg {segments}");
        assert_eq!(diag.ring_patch_count, 8, "seg {segments}");
        assert!(diag.warnings.is_empty(), "seg {segments}: {:?}", diag.warnings);
        assert_closed_sphere(&mesh, &format!("pipe seg {segments}"));
    }
}

#[test]
fn width_offsets_are_reconciled_along_a_chain() {
    let mut mesh = cube();
    select_edges(&mut mesh, &[(0, 1), (1, 2)]);
    let options = BevelOptions::new(0.1, 2).with_offset_type(OffsetType::Width);
    let (_, diag) = bevel_mesh(&mut mesh, &options).expect("bevel");
    assert_eq!(diag.adjusted_chain_count, 1);
    assert_closed_sphere(&mesh, "width chain");
}

#[test]
fn closed_edge_ring_is_reconciled_as_a_cycle() {
    let mut mesh = cube();
    select_edges(&mut mesh, &[(4, 5), (5, 6), (6, 7), (7, 4)]);
    let (_, diag) = bevel_mesh(&mut mesh, &BevelOptions::new(0.1, 2)).expect("bevel");
    assert!(diag.adjusted_cycle_count > 0);
    assert_closed_sphere(&mesh, "top ring");
}
