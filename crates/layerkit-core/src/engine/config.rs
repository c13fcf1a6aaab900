use thiserror::Error;

/// Default maximum bond length considered by the enumerator, in Angstroms.
pub const DEFAULT_MAX_DISTANCE: f64 = 3.0;
/// Default tolerance for merging near-duplicate bond lengths, in Angstroms.
pub const DEFAULT_MERGE_TOLERANCE: f64 = 0.008;
/// Default stacking-axis gap that separates two atomic layers, in Angstroms.
pub const DEFAULT_GAP_THRESHOLD: f64 = 1.5;
/// Default fractional tolerance for the primitive-cell reduction search.
pub const DEFAULT_REDUCTION_TOLERANCE: f64 = 1e-3;
/// Default number of hotspots to extract.
pub const DEFAULT_TOP_N: usize = 5;
/// Default minimum hotspot separation, as a fractional distance.
pub const DEFAULT_MIN_SEPARATION: f64 = 0.05;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("invalid value for `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

/// How the layer/vacuum split threshold along the stacking axis is obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GapThreshold {
    /// Derive the threshold from the largest stacking-axis gap (half of it,
    /// capped at [`DEFAULT_GAP_THRESHOLD`]).
    Auto,
    /// Use an externally supplied threshold in Angstroms.
    Fixed(f64),
}

impl Default for GapThreshold {
    fn default() -> Self {
        GapThreshold::Auto
    }
}

/// Parameters for the bond enumerator. Passed explicitly into every analysis
/// call so each run is a pure function of its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct BondConfig {
    /// Maximum bond length considered, in Angstroms.
    pub max_distance: f64,
    /// Tolerance for merging near-duplicate bond lengths, in Angstroms.
    pub merge_tolerance: f64,
    /// Layer/vacuum split mode along the stacking axis.
    pub gap_threshold: GapThreshold,
    /// Override for the stacking axis; detected from the lattice when `None`.
    pub stacking_axis: Option<usize>,
    /// Fractional tolerance for the primitive-cell reduction search.
    pub reduction_tolerance: f64,
}

impl Default for BondConfig {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            merge_tolerance: DEFAULT_MERGE_TOLERANCE,
            gap_threshold: GapThreshold::default(),
            stacking_axis: None,
            reduction_tolerance: DEFAULT_REDUCTION_TOLERANCE,
        }
    }
}

impl BondConfig {
    pub fn builder() -> BondConfigBuilder {
        BondConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct BondConfigBuilder {
    max_distance: Option<f64>,
    merge_tolerance: Option<f64>,
    gap_threshold: Option<GapThreshold>,
    stacking_axis: Option<usize>,
    reduction_tolerance: Option<f64>,
}

impl BondConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_distance(mut self, distance: f64) -> Self {
        self.max_distance = Some(distance);
        self
    }
    pub fn merge_tolerance(mut self, tolerance: f64) -> Self {
        self.merge_tolerance = Some(tolerance);
        self
    }
    pub fn gap_threshold(mut self, mode: GapThreshold) -> Self {
        self.gap_threshold = Some(mode);
        self
    }
    pub fn stacking_axis(mut self, axis: usize) -> Self {
        self.stacking_axis = Some(axis);
        self
    }
    pub fn reduction_tolerance(mut self, tolerance: f64) -> Self {
        self.reduction_tolerance = Some(tolerance);
        self
    }

    pub fn build(self) -> Result<BondConfig, ConfigError> {
        let config = BondConfig {
            max_distance: self.max_distance.unwrap_or(DEFAULT_MAX_DISTANCE),
            merge_tolerance: self.merge_tolerance.unwrap_or(DEFAULT_MERGE_TOLERANCE),
            gap_threshold: self.gap_threshold.unwrap_or_default(),
            stacking_axis: self.stacking_axis,
            reduction_tolerance: self
                .reduction_tolerance
                .unwrap_or(DEFAULT_REDUCTION_TOLERANCE),
        };
        if !(config.max_distance > 0.0) {
            return Err(invalid("max_distance", "must be > 0"));
        }
        if !(config.merge_tolerance > 0.0) {
            return Err(invalid("merge_tolerance", "must be > 0"));
        }
        if let GapThreshold::Fixed(gap) = config.gap_threshold {
            if !(gap > 0.0) {
                return Err(invalid("gap_threshold", "must be > 0"));
            }
        }
        if let Some(axis) = config.stacking_axis {
            if axis > 2 {
                return Err(invalid("stacking_axis", "must be 0, 1, or 2"));
            }
        }
        if !(config.reduction_tolerance > 0.0) {
            return Err(invalid("reduction_tolerance", "must be > 0"));
        }
        Ok(config)
    }
}

/// Parameters for the hotspot extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConfig {
    /// Number of hotspots to extract.
    pub top_n: usize,
    /// Minimum pairwise hotspot separation, as a fractional distance.
    pub min_separation: f64,
    /// Override for the stacking axis; detected from the lattice when `None`.
    pub stacking_axis: Option<usize>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            min_separation: DEFAULT_MIN_SEPARATION,
            stacking_axis: None,
        }
    }
}

impl FieldConfig {
    pub fn builder() -> FieldConfigBuilder {
        FieldConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct FieldConfigBuilder {
    top_n: Option<usize>,
    min_separation: Option<f64>,
    stacking_axis: Option<usize>,
}

impl FieldConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }
    pub fn min_separation(mut self, separation: f64) -> Self {
        self.min_separation = Some(separation);
        self
    }
    pub fn stacking_axis(mut self, axis: usize) -> Self {
        self.stacking_axis = Some(axis);
        self
    }

    pub fn build(self) -> Result<FieldConfig, ConfigError> {
        let config = FieldConfig {
            top_n: self.top_n.unwrap_or(DEFAULT_TOP_N),
            min_separation: self.min_separation.unwrap_or(DEFAULT_MIN_SEPARATION),
            stacking_axis: self.stacking_axis,
        };
        if config.top_n < 1 {
            return Err(invalid("top_n", "must be >= 1"));
        }
        if !(config.min_separation >= 0.0) {
            return Err(invalid("min_separation", "must be >= 0"));
        }
        if let Some(axis) = config.stacking_axis {
            if axis > 2 {
                return Err(invalid("stacking_axis", "must be 0, 1, or 2"));
            }
        }
        Ok(config)
    }
}
