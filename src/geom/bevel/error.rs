use crate::geom::poly_mesh::MeshError;

#[derive(Debug, thiserror::Error)]
pub enum BevelError {
    #[error("offset must be finite (and at most 100 for percent offsets), got {offset}")]
    InvalidOffset { offset: f64 },

    #[error("profile must lie in [0, 1], got {profile}")]
    InvalidProfile { profile: f64 },

    #[error("spread must be finite and non-negative, got {spread}")]
    InvalidSpread { spread: f64 },

    #[error("custom profile needs at least 2 finite points, got {count}")]
    InvalidCustomProfile { count: usize },

    #[error(transparent)]
    Mesh(#[from] MeshError),
}
