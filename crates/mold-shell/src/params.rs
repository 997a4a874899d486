//! Mold parameters and parameter files.
//!
//! Every field has a default, so a parameter file only needs the values it
//! changes:
//!
//! ```toml
//! plaster_wall_thickness = 25.0
//! spare_height = 40.0
//!
//! [natch]
//! enabled = true
//! count_per_seam = 3
//!
//! [sampling]
//! angle_samples = 360
//! ```

use std::path::Path;

use mold_mesh::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::error::{MoldError, MoldResult};

/// Thinnest shell wall that still prints reliably.
pub const MIN_SHELL_WALL_THICKNESS: f64 = 1.2;

/// Height of the foot interlock.
pub const BASE_MOLD_HEIGHT: f64 = 15.0;

/// Gap between the foot shell's exterior and the wall socket.
pub const FIT_CLEARANCE: f64 = 0.2;

/// Extra cavity radius above the vessel rim.
pub const SPARE_OFFSET: f64 = 15.0;

/// Molds larger than this in any dimension do not fit common printers.
pub const LARGE_MOLD_MM: f64 = 300.0;

/// Registration key settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NatchParams {
    pub enabled: bool,
    /// Diameter of the matching socket in mm.
    pub diameter: f64,
    /// How far the bump protrudes from the seam in mm.
    pub depth: f64,
    /// Radial play between bump and socket in mm.
    pub tolerance: f64,
    pub count_per_seam: usize,
}

impl Default for NatchParams {
    fn default() -> Self {
        Self {
            enabled: false,
            diameter: 8.0,
            depth: 3.0,
            tolerance: 0.2,
            count_per_seam: 2,
        }
    }
}

/// Sampling resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    /// Rows of the profile, bottom to top.
    pub height_samples: usize,
    /// Angular resolution shared by the profile and the bottom grid.
    pub angle_samples: usize,
    /// Radial resolution of the bottom grid.
    pub radial_steps: usize,
    /// Interior columns of each wall shell.
    pub wall_columns: usize,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            height_samples: 256,
            angle_samples: 256,
            radial_steps: 64,
            wall_columns: 64,
        }
    }
}

/// Gap filling and smoothing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseParams {
    /// Deviation from the local median, in mm, above which a sample is a spike.
    pub despike_threshold: f64,
    pub smoothing_passes: usize,
}

impl Default for DenoiseParams {
    fn default() -> Self {
        Self {
            despike_threshold: 2.0,
            smoothing_passes: 3,
        }
    }
}

/// Parameters for a four-part plaster mold.
///
/// All lengths are millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoldParams {
    /// Distance from the vessel's widest point to each wall's flat exterior.
    pub plaster_wall_thickness: f64,
    /// Pour clearance above the vessel rim.
    pub spare_height: f64,
    /// How far the corners between two walls are clipped.
    pub corner_cut_width: f64,
    /// Thickness of every printed skin.
    pub shell_wall_thickness: f64,
    /// Fit gap between the cavity and the vessel surface.
    pub vessel_clearance: f64,
    /// Height of the foot interlock.
    pub base_mold_height: f64,
    pub natch: NatchParams,
    pub sampling: SamplingParams,
    pub denoise: DenoiseParams,
}

impl Default for MoldParams {
    fn default() -> Self {
        Self {
            plaster_wall_thickness: 20.0,
            spare_height: 30.0,
            corner_cut_width: 10.0,
            shell_wall_thickness: 1.5,
            vessel_clearance: 0.1,
            base_mold_height: BASE_MOLD_HEIGHT,
            natch: NatchParams::default(),
            sampling: SamplingParams::default(),
            denoise: DenoiseParams::default(),
        }
    }
}

/// Non-fatal findings about a parameter set and the vessel it is applied to.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamWarning {
    /// The finished mold exceeds [`LARGE_MOLD_MM`] along one axis.
    LargeMold { axis: char, size_mm: f64 },
    /// The corner cut is wider than the register distance and gets clamped.
    CornerCutClamped { requested: f64, effective: f64 },
}

impl std::fmt::Display for ParamWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamWarning::LargeMold { axis, size_mm } => write!(
                f,
                "large mold size: {:.1}mm along {} (over {:.0}mm)",
                size_mm, axis, LARGE_MOLD_MM
            ),
            ParamWarning::CornerCutClamped {
                requested,
                effective,
            } => write!(
                f,
                "corner cut of {:.1}mm clamped to {:.1}mm",
                requested, effective
            ),
        }
    }
}

impl MoldParams {
    /// Check every value, returning the first problem found.
    pub fn validate(&self) -> MoldResult<()> {
        let lengths = [
            ("plaster_wall_thickness", self.plaster_wall_thickness),
            ("spare_height", self.spare_height),
            ("corner_cut_width", self.corner_cut_width),
            ("shell_wall_thickness", self.shell_wall_thickness),
            ("vessel_clearance", self.vessel_clearance),
            ("base_mold_height", self.base_mold_height),
            ("despike_threshold", self.denoise.despike_threshold),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(MoldError::invalid_params(format!(
                    "{} must be a finite non-negative length, got {}",
                    name, value
                )));
            }
        }

        let t = self.shell_wall_thickness;
        if t < MIN_SHELL_WALL_THICKNESS {
            return Err(MoldError::invalid_param(
                "shell_wall_thickness",
                t,
                MIN_SHELL_WALL_THICKNESS,
                format!(
                    "shell thickness below minimum ({:.2}mm < {:.2}mm)",
                    t, MIN_SHELL_WALL_THICKNESS
                ),
            ));
        }
        if 2.0 * t >= self.base_mold_height {
            return Err(MoldError::invalid_param(
                "shell_wall_thickness",
                t,
                self.base_mold_height / 4.0,
                "the foot shell's void collapses: shell thickness must be below half the base height",
            ));
        }
        // Cavity skin and exterior skin both need room at the widest point.
        let min_plaster = 2.0 * t + self.vessel_clearance;
        if self.plaster_wall_thickness <= min_plaster {
            return Err(MoldError::invalid_param(
                "plaster_wall_thickness",
                self.plaster_wall_thickness,
                min_plaster + 2.0 * t,
                "plaster wall too thin to hold two shell skins",
            ));
        }
        if self.spare_height <= 2.0 * t {
            return Err(MoldError::invalid_param(
                "spare_height",
                self.spare_height,
                4.0 * t,
                "spare region too short to hold the top cap",
            ));
        }
        if self.denoise.despike_threshold == 0.0 {
            return Err(MoldError::invalid_params(
                "despike_threshold must be positive",
            ));
        }

        let s = &self.sampling;
        if s.height_samples < 2 || s.angle_samples < 3 || s.radial_steps < 2 || s.wall_columns < 2
        {
            return Err(MoldError::invalid_params(format!(
                "sampling resolution too low: {}x{} profile, {} radial steps, {} wall columns",
                s.height_samples, s.angle_samples, s.radial_steps, s.wall_columns
            )));
        }

        let n = &self.natch;
        if n.enabled {
            if !(n.diameter.is_finite() && n.depth.is_finite() && n.tolerance.is_finite())
                || n.depth <= 0.0
                || n.tolerance < 0.0
                || n.diameter / 2.0 <= n.tolerance
            {
                return Err(MoldError::invalid_params(format!(
                    "natch needs a positive depth and a radius above its tolerance \
                     (diameter {}, depth {}, tolerance {})",
                    n.diameter, n.depth, n.tolerance
                )));
            }
            if n.count_per_seam == 0 {
                return Err(MoldError::invalid_params(
                    "natch.count_per_seam must be at least 1 when natches are enabled",
                ));
            }
        }

        Ok(())
    }

    /// Findings that do not stop generation, for a vessel with the given bounds.
    pub fn warnings(&self, bounds: &BoundingBox) -> Vec<ParamWarning> {
        let mut warnings = Vec::new();

        let register = bounds.max_xz_extent() + self.plaster_wall_thickness;
        let width = 2.0 * register;
        let height = bounds.height() + self.base_mold_height + self.spare_height;
        for (axis, size_mm) in [('x', width), ('y', height), ('z', width)] {
            if size_mm > LARGE_MOLD_MM {
                warnings.push(ParamWarning::LargeMold { axis, size_mm });
            }
        }

        if self.corner_cut_width > register {
            warnings.push(ParamWarning::CornerCutClamped {
                requested: self.corner_cut_width,
                effective: register,
            });
        }

        warnings
    }

    /// Load parameters from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load parameters from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load parameters from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ParamsFileError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save parameters to a TOML file.
    pub fn save_toml(&self, path: impl AsRef<Path>) -> Result<(), ParamsFileError> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Load a `.toml` or `.json` parameter file, chosen by extension.
    pub fn load_file(path: impl AsRef<Path>) -> MoldResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let result = match ext.as_deref() {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => std::fs::read_to_string(path)
                .map_err(ParamsFileError::from)
                .and_then(|s| Self::from_json(&s).map_err(ParamsFileError::from)),
            other => {
                return Err(MoldError::config(
                    path,
                    format!(
                        "unsupported parameter file extension {:?}, expected .toml or .json",
                        other.unwrap_or("")
                    ),
                ));
            }
        };

        result.map_err(|e| MoldError::config(path, e.to_string()))
    }
}

/// Errors that can occur when loading or saving parameter files.
#[derive(Debug)]
pub enum ParamsFileError {
    /// I/O error reading or writing the file.
    Io(std::io::Error),
    /// TOML parsing error.
    TomlParse(toml::de::Error),
    /// TOML serialization error.
    TomlSerialize(toml::ser::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
}

impl std::fmt::Display for ParamsFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::TomlParse(e) => write!(f, "TOML parse error: {}", e),
            Self::TomlSerialize(e) => write!(f, "TOML serialize error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for ParamsFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::TomlParse(e) => Some(e),
            Self::TomlSerialize(e) => Some(e),
            Self::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ParamsFileError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ParamsFileError {
    fn from(e: toml::de::Error) -> Self {
        Self::TomlParse(e)
    }
}

impl From<toml::ser::Error> for ParamsFileError {
    fn from(e: toml::ser::Error) -> Self {
        Self::TomlSerialize(e)
    }
}

impl From<serde_json::Error> for ParamsFileError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MoldRecoverySuggestion;
    use nalgebra::Point3;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let params = MoldParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.base_mold_height, 15.0);
        assert_eq!(params.vessel_clearance, 0.1);
        assert_eq!(params.sampling.height_samples, 256);
        assert_eq!(params.denoise.smoothing_passes, 3);
        assert!(!params.natch.enabled);
    }

    #[test]
    fn test_shell_thickness_below_minimum() {
        let params = MoldParams {
            shell_wall_thickness: 1.0,
            ..Default::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("shell thickness below minimum"));
        assert!(matches!(
            err.recovery_suggestion(),
            MoldRecoverySuggestion::AdjustParameter { suggested, .. } if suggested == 1.2
        ));
    }

    #[test]
    fn test_rejects_non_finite_and_negative() {
        let params = MoldParams {
            spare_height: f64::NAN,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = MoldParams {
            corner_cut_width: -1.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_void_collapse_rejected() {
        let params = MoldParams {
            shell_wall_thickness: 8.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = MoldParams {
            plaster_wall_thickness: 3.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_natch_checked_only_when_enabled() {
        let mut params = MoldParams::default();
        params.natch.depth = 0.0;
        assert!(params.validate().is_ok());

        params.natch.enabled = true;
        assert!(params.validate().is_err());

        params.natch.depth = 2.0;
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_large_mold_warning() {
        let params = MoldParams::default();
        let small = BoundingBox::new(Point3::new(-50.0, 0.0, -50.0), Point3::new(50.0, 120.0, 50.0));
        assert!(params.warnings(&small).is_empty());

        let tall = BoundingBox::new(Point3::new(-50.0, 0.0, -50.0), Point3::new(50.0, 400.0, 50.0));
        let warnings = params.warnings(&tall);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], ParamWarning::LargeMold { axis: 'y', .. }));
        assert!(warnings[0].to_string().contains("large mold size"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut params = MoldParams::default();
        params.plaster_wall_thickness = 25.0;
        params.natch.enabled = true;
        params.sampling.angle_samples = 360;

        let toml_str = params.to_toml().unwrap();
        let parsed = MoldParams::from_toml(&toml_str).unwrap();
        assert_eq!(parsed, params);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut params = MoldParams::default();
        params.corner_cut_width = 5.0;
        params.denoise.despike_threshold = 1.0;

        let json_str = params.to_json().unwrap();
        let parsed = MoldParams::from_json(&json_str).unwrap();
        assert_eq!(parsed, params);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml = r#"
            spare_height = 45.0

            [natch]
            enabled = true
        "#;
        let params = MoldParams::from_toml(toml).unwrap();
        assert_eq!(params.spare_height, 45.0);
        assert_eq!(params.plaster_wall_thickness, 20.0);
        assert!(params.natch.enabled);
        assert_eq!(params.natch.count_per_seam, 2);
    }

    #[test]
    fn test_load_file_by_extension() {
        let dir = TempDir::new().unwrap();
        let params = MoldParams {
            spare_height: 42.0,
            ..Default::default()
        };

        let toml_path = dir.path().join("mold.toml");
        params.save_toml(&toml_path).unwrap();
        assert_eq!(MoldParams::load_file(&toml_path).unwrap(), params);

        let json_path = dir.path().join("mold.json");
        std::fs::write(&json_path, params.to_json().unwrap()).unwrap();
        assert_eq!(MoldParams::load_file(&json_path).unwrap(), params);

        let yaml_path = dir.path().join("mold.yaml");
        std::fs::write(&yaml_path, "spare_height: 1").unwrap();
        let err = MoldParams::load_file(&yaml_path).unwrap_err();
        assert!(matches!(err, MoldError::Config { .. }));
    }

    #[test]
    fn test_load_file_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "spare_height = \"tall\"").unwrap();
        let err = MoldParams::load_file(&path).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }
}
