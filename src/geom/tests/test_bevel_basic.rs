use crate::geom::{
    AffectType, BevelOptions, CustomProfile, FaceStrength, FaceStrengthMode, PolyMesh, Vec3, bevel_mesh,
};

fn cube_with_edges(edges: &[(usize, usize)]) -> PolyMesh {
    let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
    for &(a, b) in edges {
        let e = mesh.edge_between(a, b).unwrap();
        mesh.edges[e].selected = true;
    }
    mesh
}

fn on_unit_cube_surface(p: Vec3) -> bool {
    let eps = 1e-9;
    [p.x, p.y, p.z]
        .iter()
        .any(|&c| c.abs() < eps || (c - 1.0).abs() < eps)
}

#[test]
fn chamfer_keeps_vertices_on_the_original_faces() {
    let mut mesh = cube_with_edges(&[(0, 1)]);
    bevel_mesh(&mut mesh, &BevelOptions::new(0.1, 1)).unwrap();

    for v in mesh.live_vertices() {
        let p = mesh.position(v);
        assert!(on_unit_cube_surface(p), "vertex {v} at {p:?} left the cube surface");
    }
    // The chamfer face sits 0.1 in from the removed edge along both faces.
    let chamfer_points = mesh
        .live_vertices()
        .map(|v| mesh.position(v))
        .filter(|p| ((p.y - 0.1).abs() < 1e-9 && p.z.abs() < 1e-9) || (p.y.abs() < 1e-9 && (p.z - 0.1).abs() < 1e-9))
        .count();
    assert_eq!(chamfer_points, 4);
}

#[test]
fn round_profile_follows_a_quarter_circle() {
    let mut mesh = cube_with_edges(&[(0, 1)]);
    let (output, diag) = bevel_mesh(&mut mesh, &BevelOptions::new(0.2, 4)).unwrap();

    assert_eq!(output.corridor_faces.len(), 4);
    assert_eq!(diag.beveled_edge_count, 1);
    assert!(mesh.is_closed());

    let center_yz = (0.2, 0.2);
    let mut profile_points = 0;
    for v in mesh.live_vertices() {
        let p = mesh.position(v);
        if p.y > 1e-9 && p.y < 0.2 - 1e-9 && p.z > 1e-9 && p.z < 0.2 - 1e-9 {
            let r = (p.y - center_yz.0).hypot(p.z - center_yz.1);
            assert!((r - 0.2).abs() < 1e-6, "profile point {p:?} off the arc (r = {r})");
            profile_points += 1;
        }
    }
    // Three inner profile points at each end of the edge.
    assert_eq!(profile_points, 6);
}

#[test]
fn vertex_bevel_cuts_off_a_corner() {
    let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
    mesh.vertices[6].selected = true;
    let options = BevelOptions::new(0.25, 1).with_affect(AffectType::Vertices);
    let (output, _) = bevel_mesh(&mut mesh, &options).unwrap();

    assert_eq!(output.removed_vertices, vec![6]);
    assert_eq!(output.patch_faces.len(), 1);
    assert_eq!(output.rebuilt_faces.len(), 3);
    assert!(output.corridor_faces.is_empty());
    assert_eq!(mesh.vertex_count(), 10);
    assert_eq!(mesh.face_count(), 7);
    assert!(mesh.is_closed());

    let patch = output.patch_faces[0];
    assert_eq!(mesh.face_len(patch), 3);
    for p in mesh.face_positions(patch) {
        assert!((p.distance(Vec3::splat(1.0)) - 0.25).abs() < 1e-9);
    }
    // The cut faces away from the cube.
    assert!(mesh.face_normal(patch).dot(Vec3::splat(1.0)) > 0.0);
}

#[test]
fn three_edge_corner_gets_a_patch() {
    let mut mesh = cube_with_edges(&[(0, 1), (0, 3), (0, 4)]);
    let (output, diag) = bevel_mesh(&mut mesh, &BevelOptions::new(0.1, 1)).unwrap();

    assert_eq!(output.corridor_faces.len(), 3);
    assert_eq!(output.patch_faces.len(), 1);
    assert_eq!(output.rebuilt_faces.len(), 6);
    assert_eq!(mesh.vertex_count(), 13);
    assert_eq!(mesh.face_count(), 10);
    assert_eq!(mesh.edge_count(), 21);
    assert!(mesh.is_closed());
    assert_eq!(diag.beveled_edge_count, 3);
    assert_eq!(diag.beveled_vertex_count, 4);
}

#[test]
fn new_faces_take_the_override_material() {
    let mut mesh = cube_with_edges(&[(0, 1)]);
    for face in &mut mesh.faces {
        face.material = 1;
    }
    let options = BevelOptions::new(0.1, 2).with_material(Some(7));
    let (output, _) = bevel_mesh(&mut mesh, &options).unwrap();

    for &f in &output.corridor_faces {
        assert_eq!(mesh.faces[f].material, 7);
    }
    for &f in &output.rebuilt_faces {
        assert_eq!(mesh.faces[f].material, 1);
    }
}

#[test]
fn affected_face_strength_marks_rebuilt_faces_strong() {
    let mut mesh = cube_with_edges(&[(0, 1)]);
    let options = BevelOptions::new(0.1, 2).with_face_strength(FaceStrengthMode::Affected);
    let (output, _) = bevel_mesh(&mut mesh, &options).unwrap();

    for &f in &output.rebuilt_faces {
        assert_eq!(mesh.faces[f].strength, FaceStrength::Strong);
    }
    for &f in &output.corridor_faces {
        assert_eq!(mesh.faces[f].strength, FaceStrength::Medium);
    }
}

#[test]
fn clamp_overlap_limits_a_huge_offset() {
    let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
    for edge in &mut mesh.edges {
        edge.selected = true;
    }
    let options = BevelOptions::new(2.0, 1).with_clamp_overlap(true);
    let (_, diag) = bevel_mesh(&mut mesh, &options).unwrap();

    let factor = diag.offset_limit_factor.unwrap();
    assert!(factor > 0.0 && factor < 1.0);
    for v in mesh.live_vertices() {
        let p = mesh.position(v);
        for c in [p.x, p.y, p.z] {
            assert!((-1e-9..=1.0 + 1e-9).contains(&c), "vertex {v} at {p:?} escaped the cube");
        }
    }
}

#[test]
fn uvs_are_carried_onto_new_faces() {
    let mut mesh = cube_with_edges(&[(0, 1)]);
    for face in &mut mesh.faces {
        face.uvs = Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
    }
    let (output, _) = bevel_mesh(&mut mesh, &BevelOptions::new(0.1, 2)).unwrap();

    for f in output.new_faces() {
        let uvs = mesh.faces[f].uvs.as_ref().unwrap();
        assert_eq!(uvs.len(), mesh.face_len(f));
        assert!(uvs.iter().flatten().all(|c| c.is_finite()));
    }
}

#[test]
fn single_edge_grows_the_end_faces_by_one_corner() {
    let mut mesh = cube_with_edges(&[(0, 1)]);
    let (output, _) = bevel_mesh(&mut mesh, &BevelOptions::new(0.2, 1)).unwrap();

    assert_eq!(output.corridor_faces.len(), 1);
    assert_eq!(mesh.face_len(output.corridor_faces[0]), 4);
    let mut lens: Vec<usize> = output.rebuilt_faces.iter().map(|&f| mesh.face_len(f)).collect();
    lens.sort_unstable();
    assert_eq!(lens, vec![4, 4, 5, 5]);
}

#[test]
fn round_cube_corner_lies_on_a_sphere() {
    let mut mesh = cube_with_edges(&[(0, 1), (0, 3), (0, 4)]);
    let (_, diag) = bevel_mesh(&mut mesh, &BevelOptions::new(0.2, 4)).unwrap();
    assert_eq!(diag.ring_patch_count, 1);

    let center = Vec3::splat(0.2);
    let mut corner_points = 0;
    for v in mesh.live_vertices() {
        let p = mesh.position(v);
        if p.x <= 0.2 + 1e-9 && p.y <= 0.2 + 1e-9 && p.z <= 0.2 + 1e-9 {
            let r = p.distance(center);
            assert!((r - 0.2).abs() < 1e-6, "corner point {p:?} off the sphere (r = {r})");
            corner_points += 1;
        }
    }
    assert!(corner_points > 3);
}

#[test]
fn custom_profile_with_one_segment_is_a_chamfer() {
    let mut mesh = cube_with_edges(&[(0, 1)]);
    let profile = CustomProfile::new(vec![[0.0, 1.0], [1.0, 0.0]]);
    let options = BevelOptions::new(0.1, 1).with_custom_profile(profile);
    let (output, _) = bevel_mesh(&mut mesh, &options).unwrap();

    assert_eq!(output.corridor_faces.len(), 1);
    assert_eq!(mesh.vertex_count(), 10);
    assert!(mesh.is_closed());
}

#[test]
fn hardened_normals_follow_the_side_faces() {
    let mut mesh = cube_with_edges(&[(0, 1)]);
    let options = BevelOptions::new(0.2, 3).with_harden_normals(true);
    let (output, _) = bevel_mesh(&mut mesh, &options).unwrap();

    let mut side_corners = 0;
    for &f in &output.corridor_faces {
        let normals = mesh.faces[f].custom_normals.clone().unwrap();
        assert_eq!(normals.len(), mesh.face_len(f));
        for l in mesh.face_loops(f) {
            let e = mesh.loop_edge(l);
            let (a, b) = (mesh.edges[e].v1, mesh.edges[e].v2);
            // Only the corners starting a long edge next to a rebuilt face.
            if (mesh.position(a).x - mesh.position(b).x).abs() < 0.5 {
                continue;
            }
            let Some(&g) = mesh.edges[e].faces.iter().find(|&&g| g != f) else {
                continue;
            };
            if output.rebuilt_faces.contains(&g) {
                let n = normals[l.index];
                assert!(n.distance(mesh.face_normal(g)) < 1e-9, "corner {l:?}: {n:?}");
                side_corners += 1;
            }
        }
    }
    assert_eq!(side_corners, 2);

    for f in mesh.live_faces() {
        for n in mesh.faces[f].custom_normals.iter().flatten() {
            assert!((n.length() - 1.0).abs() < 1e-9, "face {f}: {n:?}");
            assert!(n.x.abs() < 1e-9, "face {f}: {n:?} leans along the edge");
        }
    }
}
