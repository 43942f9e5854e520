use super::error::BevelError;
use super::profile::{PRO_CIRCLE_R, PRO_LINE_R, PRO_SQUARE_IN_R, PRO_SQUARE_R};

/// How `offset` is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OffsetType {
    /// Distance from the original edge to each new edge.
    #[default]
    Offset,
    /// Width of the new face across the bevel.
    Width,
    /// Perpendicular distance from the original edge to the new face.
    Depth,
    /// Percentage of the adjacent edge lengths.
    Percent,
    /// Exact distance along the adjacent edges.
    Absolute,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AffectType {
    Vertices,
    #[default]
    Edges,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FaceStrengthMode {
    #[default]
    None,
    New,
    Affected,
    All,
}

/// Treatment of reflex corners between beveled edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OuterMiter {
    #[default]
    Sharp,
    Patch,
    Arc,
}

/// Treatment of non-reflex corners between beveled edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum InnerMiter {
    #[default]
    Sharp,
    Arc,
}

/// Pattern used to fill the corner of three or more beveled edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum VMeshMethod {
    #[default]
    Grid,
    Cutoff,
}

/// A user-drawn cross-section running from (0, 1) to (1, 0).
///
/// The polyline is resampled by arc length to the requested segment count.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CustomProfile {
    pub points: Vec<[f64; 2]>,
}

impl CustomProfile {
    #[must_use]
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self { points }
    }

    /// `n + 1` samples evenly spaced by arc length, as parallel x/y arrays.
    #[must_use]
    pub fn sample(&self, n: usize) -> (Vec<f64>, Vec<f64>) {
        let pts = &self.points;
        let mut xs = Vec::with_capacity(n + 1);
        let mut ys = Vec::with_capacity(n + 1);
        if pts.len() < 2 || n == 0 {
            for i in 0..=n {
                let t = if n == 0 { 0.0 } else { i as f64 / n as f64 };
                xs.push(t);
                ys.push(1.0 - t);
            }
            return (xs, ys);
        }

        let mut cumulative = Vec::with_capacity(pts.len());
        cumulative.push(0.0);
        for w in pts.windows(2) {
            let d = (w[1][0] - w[0][0]).hypot(w[1][1] - w[0][1]);
            let last = cumulative.last().copied().unwrap_or(0.0);
            cumulative.push(last + d);
        }
        let total = cumulative.last().copied().unwrap_or(0.0);

        let mut seg = 0;
        for i in 0..=n {
            let target = total * i as f64 / n as f64;
            while seg + 2 < pts.len() && cumulative[seg + 1] < target {
                seg += 1;
            }
            let span = cumulative[seg + 1] - cumulative[seg];
            let t = if span > 0.0 {
                ((target - cumulative[seg]) / span).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let (a, b) = (pts[seg], pts[seg + 1]);
            xs.push(a[0] + (b[0] - a[0]) * t);
            ys.push(a[1] + (b[1] - a[1]) * t);
        }
        (xs, ys)
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ProfileType {
    #[default]
    Superellipse,
    Custom(CustomProfile),
}

/// Parameter bundle for [`super::bevel_mesh`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BevelOptions {
    pub offset: f64,
    pub offset_type: OffsetType,
    pub segments: usize,
    /// Profile shape in `[0, 1]`; 0.5 is a circular arc.
    pub profile: f64,
    pub profile_type: ProfileType,
    pub affect: AffectType,
    /// Limit the offset so neighbouring bevels do not overlap.
    pub clamp_overlap: bool,
    /// Prefer sliding along unbeveled edges over keeping widths even.
    pub loop_slide: bool,
    pub use_weights: bool,
    pub mark_seam: bool,
    pub mark_sharp: bool,
    pub harden_normals: bool,
    pub face_strength_mode: FaceStrengthMode,
    pub miter_outer: OuterMiter,
    pub miter_inner: InnerMiter,
    /// Spread of inner arc miters.
    pub spread: f64,
    /// Material for new faces; `None` keeps the adjacent face's material.
    pub material: Option<u32>,
    pub vmesh_method: VMeshMethod,
}

impl Default for BevelOptions {
    fn default() -> Self {
        Self {
            offset: 0.1,
            offset_type: OffsetType::Offset,
            segments: 1,
            profile: 0.5,
            profile_type: ProfileType::Superellipse,
            affect: AffectType::Edges,
            clamp_overlap: false,
            loop_slide: true,
            use_weights: false,
            mark_seam: false,
            mark_sharp: false,
            harden_normals: false,
            face_strength_mode: FaceStrengthMode::None,
            miter_outer: OuterMiter::Sharp,
            miter_inner: InnerMiter::Sharp,
            spread: 0.1,
            material: None,
            vmesh_method: VMeshMethod::Grid,
        }
    }
}

impl BevelOptions {
    #[must_use]
    pub fn new(offset: f64, segments: usize) -> Self {
        Self {
            offset,
            segments,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_offset_type(mut self, offset_type: OffsetType) -> Self {
        self.offset_type = offset_type;
        self
    }

    #[must_use]
    pub fn with_profile(mut self, profile: f64) -> Self {
        self.profile = profile;
        self
    }

    #[must_use]
    pub fn with_custom_profile(mut self, custom: CustomProfile) -> Self {
        self.profile_type = ProfileType::Custom(custom);
        self
    }

    #[must_use]
    pub fn with_affect(mut self, affect: AffectType) -> Self {
        self.affect = affect;
        self
    }

    #[must_use]
    pub fn with_clamp_overlap(mut self, clamp: bool) -> Self {
        self.clamp_overlap = clamp;
        self
    }

    #[must_use]
    pub fn with_loop_slide(mut self, loop_slide: bool) -> Self {
        self.loop_slide = loop_slide;
        self
    }

    #[must_use]
    pub fn with_weights(mut self, use_weights: bool) -> Self {
        self.use_weights = use_weights;
        self
    }

    #[must_use]
    pub fn with_marks(mut self, seam: bool, sharp: bool) -> Self {
        self.mark_seam = seam;
        self.mark_sharp = sharp;
        self
    }

    #[must_use]
    pub fn with_harden_normals(mut self, harden: bool) -> Self {
        self.harden_normals = harden;
        self
    }

    #[must_use]
    pub fn with_face_strength(mut self, mode: FaceStrengthMode) -> Self {
        self.face_strength_mode = mode;
        self
    }

    #[must_use]
    pub fn with_miters(mut self, outer: OuterMiter, inner: InnerMiter) -> Self {
        self.miter_outer = outer;
        self.miter_inner = inner;
        self
    }

    #[must_use]
    pub fn with_spread(mut self, spread: f64) -> Self {
        self.spread = spread;
        self
    }

    #[must_use]
    pub fn with_material(mut self, material: Option<u32>) -> Self {
        self.material = material;
        self
    }

    #[must_use]
    pub fn with_vmesh_method(mut self, method: VMeshMethod) -> Self {
        self.vmesh_method = method;
        self
    }

    /// # Errors
    /// Returns [`BevelError`] for non-finite numbers, a profile
    /// outside `[0, 1]`, a negative spread or a percentage above 100.
    pub fn validate(&self) -> Result<(), BevelError> {
        if !self.offset.is_finite() {
            return Err(BevelError::InvalidOffset { offset: self.offset });
        }
        if self.offset_type == OffsetType::Percent && self.offset > 100.0 {
            return Err(BevelError::InvalidOffset { offset: self.offset });
        }
        if !self.profile.is_finite() || !(0.0..=1.0).contains(&self.profile) {
            return Err(BevelError::InvalidProfile { profile: self.profile });
        }
        if !self.spread.is_finite() || self.spread < 0.0 {
            return Err(BevelError::InvalidSpread { spread: self.spread });
        }
        if let ProfileType::Custom(custom) = &self.profile_type {
            if custom.points.len() < 2 {
                return Err(BevelError::InvalidCustomProfile { count: custom.points.len() });
            }
            if custom
                .points
                .iter()
                .any(|p| !p[0].is_finite() || !p[1].is_finite())
            {
                return Err(BevelError::InvalidCustomProfile { count: custom.points.len() });
            }
        }
        Ok(())
    }
}

/// Resolved parameters for one bevel run.
#[derive(Debug, Clone)]
pub(crate) struct BevelParams {
    pub offset: f64,
    pub offset_type: OffsetType,
    pub seg: usize,
    pub profile: f64,
    /// Superellipse exponent, snapped to the special constants.
    pub pro_super_r: f64,
    pub custom_profile: Option<CustomProfile>,
    pub affect: AffectType,
    pub use_weights: bool,
    pub loop_slide: bool,
    pub limit_offset: bool,
    pub offset_adjust: bool,
    pub mark_seam: bool,
    pub mark_sharp: bool,
    pub harden_normals: bool,
    pub face_strength_mode: FaceStrengthMode,
    pub miter_outer: OuterMiter,
    pub miter_inner: InnerMiter,
    pub spread: f64,
    pub material: Option<u32>,
    pub vmesh_method: VMeshMethod,
}

impl BevelParams {
    pub fn from_options(options: &BevelOptions) -> Self {
        let vertex_only = options.affect == AffectType::Vertices;
        let custom_profile = match &options.profile_type {
            ProfileType::Superellipse => None,
            ProfileType::Custom(c) => Some(c.clone()),
        };
        let (miter_outer, miter_inner) = if options.vmesh_method == VMeshMethod::Cutoff {
            (OuterMiter::Sharp, InnerMiter::Sharp)
        } else {
            (options.miter_outer, options.miter_inner)
        };
        Self {
            offset: options.offset,
            offset_type: options.offset_type,
            seg: options.segments.max(1),
            profile: options.profile,
            pro_super_r: superellipse_exponent(options.profile),
            custom_profile,
            affect: options.affect,
            use_weights: options.use_weights,
            loop_slide: options.loop_slide,
            limit_offset: options.clamp_overlap,
            offset_adjust: !vertex_only
                && !matches!(options.offset_type, OffsetType::Percent | OffsetType::Absolute),
            mark_seam: options.mark_seam,
            mark_sharp: options.mark_sharp,
            harden_normals: options.harden_normals,
            face_strength_mode: options.face_strength_mode,
            miter_outer,
            miter_inner,
            spread: options.spread,
            material: options.material,
            vmesh_method: options.vmesh_method,
        }
    }

    pub fn vertex_only(&self) -> bool {
        self.affect == AffectType::Vertices
    }

    pub fn is_custom(&self) -> bool {
        self.custom_profile.is_some()
    }

    pub fn percent_or_absolute(&self) -> bool {
        matches!(self.offset_type, OffsetType::Percent | OffsetType::Absolute)
    }
}

/// Map the `[0, 1]` profile shape to a superellipse exponent, snapping near the
/// square, circle, line and inward-square shapes to their exact constants.
pub(crate) fn superellipse_exponent(profile: f64) -> f64 {
    if profile >= 0.95 {
        return PRO_SQUARE_R;
    }
    let r = -std::f64::consts::LN_2 / profile.sqrt().ln();
    if (r - PRO_CIRCLE_R).abs() < 1e-4 {
        PRO_CIRCLE_R
    } else if (r - PRO_LINE_R).abs() < 1e-4 {
        PRO_LINE_R
    } else if r < 1e-4 || !r.is_finite() {
        PRO_SQUARE_IN_R
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponent_snaps_to_special_shapes() {
        assert_eq!(superellipse_exponent(0.5), PRO_CIRCLE_R);
        assert_eq!(superellipse_exponent(0.25), PRO_LINE_R);
        assert_eq!(superellipse_exponent(0.97), PRO_SQUARE_R);
        assert_eq!(superellipse_exponent(0.0), PRO_SQUARE_IN_R);
        let r = superellipse_exponent(0.7);
        assert!(r > 2.0 && r < PRO_SQUARE_R);
    }

    #[test]
    fn cutoff_disables_miters() {
        let options = BevelOptions::default()
            .with_miters(OuterMiter::Arc, InnerMiter::Arc)
            .with_vmesh_method(VMeshMethod::Cutoff);
        let params = BevelParams::from_options(&options);
        assert_eq!(params.miter_outer, OuterMiter::Sharp);
        assert_eq!(params.miter_inner, InnerMiter::Sharp);
    }

    #[test]
    fn validate_rejects_bad_numbers() {
        assert!(BevelOptions::new(f64::NAN, 2).validate().is_err());
        assert!(BevelOptions::new(0.1, 2).with_profile(1.5).validate().is_err());
        assert!(BevelOptions::new(0.1, 2).with_spread(-1.0).validate().is_err());
        assert!(BevelOptions::new(0.1, 2).validate().is_ok());
    }

    #[test]
    fn custom_profile_samples_by_arc_length() {
        let custom = CustomProfile::new(vec![[0.0, 1.0], [0.0, 0.0], [1.0, 0.0]]);
        let (xs, ys) = custom.sample(4);
        assert_eq!(xs.len(), 5);
        assert!((xs[1] - 0.0).abs() < 1e-12 && (ys[1] - 0.5).abs() < 1e-12);
        assert!((xs[2]).abs() < 1e-12 && ys[2].abs() < 1e-12);
        assert!((xs[4] - 1.0).abs() < 1e-12 && ys[4].abs() < 1e-12);
    }
}
