//! Diagnostics collected during a bevel run.
//!
//! Every phase of the bevel engine records what it did here: how many vertices were
//! analyzed and beveled, which patch pattern each vertex patch used, whether the offset
//! had to be clamped, and any geometry it could not build. Degenerate input never
//! fails a bevel; it shows up as a warning instead.
//!
//! # Example
//!
//! ```ignore
//! use bevel_engine::geom::{BevelOptions, PolyMesh, bevel_mesh};
//!
//! let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
//! mesh.edges[0].selected = true;
//! let (_, diagnostics) = bevel_mesh(&mut mesh, &BevelOptions::new(0.1, 2))?;
//!
//! if !diagnostics.is_clean() {
//!     for warning in &diagnostics.warnings {
//!         eprintln!("Warning: {}", warning);
//!     }
//! }
//! ```

use std::fmt;

use super::bevel::MeshPattern;

/// Counts and warnings for one bevel run.
///
/// # Patch patterns
///
/// Each beveled vertex is filled with one pattern; the `*_patch_count` fields count how
/// often each was chosen.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BevelDiagnostics {
    /// Vertices inspected by the analyzer.
    pub analyzed_vertex_count: usize,

    /// Vertices that received a vertex patch.
    pub beveled_vertex_count: usize,

    /// Tagged vertices dropped because nothing around them could be beveled.
    pub skipped_vertex_count: usize,

    /// Edges that received a corridor of faces.
    pub beveled_edge_count: usize,

    /// Selected edges skipped because they are not shared by exactly two faces.
    pub skipped_corridor_count: usize,

    /// Extra boundary points inserted for miters.
    pub miter_count: usize,

    /// Offset chains and cycles reconciled by the offset solver.
    pub adjusted_chain_count: usize,
    pub adjusted_cycle_count: usize,

    /// Factor applied to every offset by collision limiting, when it had to clamp.
    pub offset_limit_factor: Option<f64>,

    pub empty_patch_count: usize,
    pub poly_patch_count: usize,
    pub fan_patch_count: usize,
    pub ring_patch_count: usize,
    pub pipe_patch_count: usize,
    pub cutoff_patch_count: usize,

    /// Original faces replaced by a rebuilt copy.
    pub rebuilt_face_count: usize,

    pub created_vertex_count: usize,
    pub created_face_count: usize,

    /// Fallbacks taken and geometry that could not be built.
    pub warnings: Vec<String>,
}

impl BevelDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one vertex patch of the given pattern.
    pub(crate) fn record_pattern(&mut self, pattern: MeshPattern) {
        match pattern {
            MeshPattern::None => self.empty_patch_count += 1,
            MeshPattern::Poly => self.poly_patch_count += 1,
            MeshPattern::TriFan => self.fan_patch_count += 1,
            MeshPattern::Adj { pipe: Some(_) } => self.pipe_patch_count += 1,
            MeshPattern::Adj { pipe: None } => self.ring_patch_count += 1,
            MeshPattern::Cutoff => self.cutoff_patch_count += 1,
        }
    }

    /// Total vertex patches built.
    #[must_use]
    pub fn patch_count(&self) -> usize {
        self.empty_patch_count
            + self.poly_patch_count
            + self.fan_patch_count
            + self.ring_patch_count
            + self.pipe_patch_count
            + self.cutoff_patch_count
    }

    /// Returns `true` if nothing was skipped and no warnings were recorded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped_corridor_count == 0 && self.warnings.is_empty()
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Merges another run's diagnostics into this one.
    ///
    /// Counts are summed and warnings appended. The offset limit factor keeps the
    /// smaller (more restrictive) of the two.
    pub fn merge(&mut self, other: &BevelDiagnostics) {
        self.analyzed_vertex_count += other.analyzed_vertex_count;
        self.beveled_vertex_count += other.beveled_vertex_count;
        self.skipped_vertex_count += other.skipped_vertex_count;
        self.beveled_edge_count += other.beveled_edge_count;
        self.skipped_corridor_count += other.skipped_corridor_count;
        self.miter_count += other.miter_count;
        self.adjusted_chain_count += other.adjusted_chain_count;
        self.adjusted_cycle_count += other.adjusted_cycle_count;
        self.offset_limit_factor = match (self.offset_limit_factor, other.offset_limit_factor) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.empty_patch_count += other.empty_patch_count;
        self.poly_patch_count += other.poly_patch_count;
        self.fan_patch_count += other.fan_patch_count;
        self.ring_patch_count += other.ring_patch_count;
        self.pipe_patch_count += other.pipe_patch_count;
        self.cutoff_patch_count += other.cutoff_patch_count;
        self.rebuilt_face_count += other.rebuilt_face_count;
        self.created_vertex_count += other.created_vertex_count;
        self.created_face_count += other.created_face_count;
        self.warnings.extend(other.warnings.iter().cloned());
    }

    /// Returns a short summary string suitable for logging.
    ///
    /// Format: `"BV:{vertices} BE:{edges} NV:{new vertices} NF:{new faces} [extras...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "BV:{} BE:{} NV:{} NF:{}",
            self.beveled_vertex_count, self.beveled_edge_count, self.created_vertex_count, self.created_face_count
        )];
        if self.miter_count > 0 {
            parts.push(format!("miters:{}", self.miter_count));
        }
        if let Some(factor) = self.offset_limit_factor {
            parts.push(format!("clamped:{factor:.4}"));
        }
        if self.adjusted_chain_count + self.adjusted_cycle_count > 0 {
            parts.push(format!("adjusted:{}+{}", self.adjusted_chain_count, self.adjusted_cycle_count));
        }
        if self.skipped_corridor_count > 0 {
            parts.push(format!("skipped-edges:{}", self.skipped_corridor_count));
        }
        if !self.warnings.is_empty() {
            parts.push(format!("warnings:{}", self.warnings.len()));
        }
        parts.join(" ")
    }
}

impl fmt::Display for BevelDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bevel Diagnostics:")?;
        writeln!(
            f,
            "  Vertices: {} analyzed, {} beveled, {} skipped",
            self.analyzed_vertex_count, self.beveled_vertex_count, self.skipped_vertex_count
        )?;
        writeln!(f, "  Edges: {} beveled", self.beveled_edge_count)?;
        writeln!(
            f,
            "  Created: {} vertices, {} faces ({} rebuilt)",
            self.created_vertex_count, self.created_face_count, self.rebuilt_face_count
        )?;

        if self.patch_count() > 0 {
            writeln!(f, "  Patches:")?;
            for (name, count) in [
                ("none", self.empty_patch_count),
                ("polygon", self.poly_patch_count),
                ("fan", self.fan_patch_count),
                ("rings", self.ring_patch_count),
                ("pipe", self.pipe_patch_count),
                ("cutoff", self.cutoff_patch_count),
            ] {
                if count > 0 {
                    writeln!(f, "    - {name}: {count}")?;
                }
            }
        }

        if self.miter_count > 0 {
            writeln!(f, "  Miters: {}", self.miter_count)?;
        }
        if let Some(factor) = self.offset_limit_factor {
            writeln!(f, "  Offset clamped by factor {factor:.4}")?;
        }
        if self.adjusted_chain_count > 0 || self.adjusted_cycle_count > 0 {
            writeln!(
                f,
                "  Offsets adjusted: {} chains, {} cycles",
                self.adjusted_chain_count, self.adjusted_cycle_count
            )?;
        }
        if self.skipped_corridor_count > 0 {
            writeln!(f, "  Skipped non-manifold edges: {}", self.skipped_corridor_count)?;
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {}", warning)?;
            }
        }

        let status = if self.is_clean() { "CLEAN" } else { "ISSUES DETECTED" };
        writeln!(f, "  Status: {}", status)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_clean() {
        let diag = BevelDiagnostics::default();
        assert!(diag.is_clean());
        assert!(!diag.has_warnings());
        assert_eq!(diag.patch_count(), 0);
    }

    #[test]
    fn test_skipped_corridor_not_clean() {
        let diag = BevelDiagnostics {
            skipped_corridor_count: 1,
            ..Default::default()
        };
        assert!(!diag.is_clean());
    }

    #[test]
    fn test_record_pattern() {
        let mut diag = BevelDiagnostics::default();
        diag.record_pattern(MeshPattern::Adj { pipe: None });
        diag.record_pattern(MeshPattern::Adj { pipe: Some(3) });
        diag.record_pattern(MeshPattern::Poly);
        assert_eq!(diag.ring_patch_count, 1);
        assert_eq!(diag.pipe_patch_count, 1);
        assert_eq!(diag.poly_patch_count, 1);
        assert_eq!(diag.patch_count(), 3);
    }

    #[test]
    fn test_merge() {
        let mut diag1 = BevelDiagnostics {
            beveled_vertex_count: 2,
            offset_limit_factor: Some(0.8),
            warnings: vec!["first warning".to_string()],
            ..Default::default()
        };
        let diag2 = BevelDiagnostics {
            beveled_vertex_count: 4,
            offset_limit_factor: Some(0.5),
            skipped_corridor_count: 1,
            warnings: vec!["second warning".to_string()],
            ..Default::default()
        };

        diag1.merge(&diag2);

        assert_eq!(diag1.beveled_vertex_count, 6);
        assert_eq!(diag1.offset_limit_factor, Some(0.5));
        assert_eq!(diag1.skipped_corridor_count, 1);
        assert_eq!(diag1.warnings.len(), 2);
    }

    #[test]
    fn test_summary() {
        let diag = BevelDiagnostics {
            beveled_vertex_count: 2,
            beveled_edge_count: 1,
            created_vertex_count: 4,
            created_face_count: 5,
            miter_count: 1,
            ..Default::default()
        };

        let summary = diag.summary();
        assert!(summary.contains("BV:2"));
        assert!(summary.contains("BE:1"));
        assert!(summary.contains("NF:5"));
        assert!(summary.contains("miters:1"));
        assert!(!summary.contains("clamped"));
    }

    #[test]
    fn test_display() {
        let diag = BevelDiagnostics {
            beveled_vertex_count: 8,
            ring_patch_count: 8,
            warnings: vec!["test warning".to_string()],
            ..Default::default()
        };

        let output = format!("{}", diag);
        assert!(output.contains("8 beveled"));
        assert!(output.contains("rings: 8"));
        assert!(output.contains("test warning"));
        assert!(output.contains("ISSUES DETECTED"));
    }
}
