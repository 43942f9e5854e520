mod bevel;
mod core;
mod diagnostics;
mod poly_mesh;

pub use bevel::{
    AffectType, BevelError, BevelOptions, BevelOutput, CustomProfile, FaceStrengthMode, InnerMiter,
    OffsetType, OuterMiter, ProfileType, VMeshMethod, bevel_mesh, even_superellipse_chords,
};
pub use self::core::{BBox, Tolerance, Transform, Vec3};
pub use diagnostics::BevelDiagnostics;
pub use poly_mesh::{
    EdgeId, FaceId, FaceStrength, LoopRef, MeshEdge, MeshError, MeshFace, MeshVertex, PolyMesh,
    VertId,
};

#[cfg(test)]
mod tests;
