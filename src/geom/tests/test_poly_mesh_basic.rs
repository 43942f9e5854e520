use crate::geom::{MeshError, PolyMesh, Vec3};

#[test]
fn box_is_closed_and_consistent() {
    let mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
    assert_eq!(mesh.vertex_count(), 8);
    assert_eq!(mesh.edge_count(), 12);
    assert_eq!(mesh.face_count(), 6);
    assert!(mesh.is_closed());

    for f in mesh.live_faces() {
        let normal = mesh.face_normal(f);
        let outward = mesh.face_center(f) - Vec3::splat(0.5);
        assert!(normal.dot(outward) > 0.0, "face {f} points inward");
    }
    for e in mesh.live_edges() {
        assert!(mesh.edge_is_manifold(e));
    }
}

#[test]
fn add_face_rejects_bad_corners() {
    let mut mesh = PolyMesh::new();
    let a = mesh.add_vertex(Vec3::ZERO);
    let b = mesh.add_vertex(Vec3::X);
    let c = mesh.add_vertex(Vec3::Y);

    assert_eq!(mesh.add_face(&[a, b]), Err(MeshError::FaceTooSmall { count: 2 }));
    assert_eq!(mesh.add_face(&[a, b, a]), Err(MeshError::RepeatedVertex { id: a }));
    assert_eq!(mesh.add_face(&[a, b, 9]), Err(MeshError::InvalidVertex { id: 9 }));
    assert_eq!(mesh.add_edge(c, c), Err(MeshError::DegenerateEdge { id: c }));

    let f = mesh.add_face(&[a, b, c]).unwrap();
    assert_eq!(mesh.face_len(f), 3);
    assert_eq!(mesh.edge_count(), 3);
    assert!(!mesh.is_closed());
}

#[test]
fn shared_edges_are_reused() {
    let mesh = PolyMesh::from_vertices_faces(
        &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        &[vec![0, 1, 2], vec![0, 2, 3]],
    )
    .unwrap();
    assert_eq!(mesh.edge_count(), 5);
    let diagonal = mesh.edge_between(2, 0).unwrap();
    assert_eq!(mesh.edge_face_count(diagonal), 2);
    assert!(mesh.edges_share_face(diagonal, mesh.edge_between(0, 1).unwrap()));
}

#[test]
fn loops_walk_the_face_in_winding_order() {
    let mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
    let l = mesh.loop_of_face_at_vert(0, 3).unwrap();
    assert_eq!(mesh.loop_vert(mesh.loop_next(l)), 2);
    assert_eq!(mesh.loop_vert(mesh.loop_prev(l)), 0);
    assert_eq!(mesh.loop_edge(l), mesh.edge_between(3, 2).unwrap());
    assert_eq!(mesh.face_loops(0).count(), 4);
}

#[test]
fn removing_a_vertex_takes_its_faces_and_compacts() {
    let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
    mesh.faces[1].material = 3;
    mesh.remove_vertex(0);
    assert_eq!(mesh.vertex_count(), 7);
    assert_eq!(mesh.edge_count(), 9);
    assert_eq!(mesh.face_count(), 3);
    assert!(mesh.validate_vertex(0).is_err());

    let dense = mesh.compacted();
    assert_eq!(dense.vertices.len(), 7);
    assert_eq!(dense.faces.len(), 3);
    assert_eq!(dense.edges.len(), 9);
    assert!(dense.faces.iter().flat_map(|f| &f.verts).all(|&v| v < dense.vertices.len()));
    assert_eq!(dense.faces[0].material, 3);
}

#[test]
fn face_area_and_bounds() {
    let mesh = PolyMesh::box_from_bounds([0.0; 3], [2.0, 1.0, 1.0]);
    assert!((mesh.face_area(0) - 2.0).abs() < 1e-12);
    let bbox = mesh.bounding_box().unwrap();
    assert_eq!(bbox.max, Vec3::new(2.0, 1.0, 1.0));
}
