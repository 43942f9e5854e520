mod test_bevel_basic;
mod test_poly_mesh_basic;
