// Fields of error variants are read by the thiserror Display derive but look
// unused to the compiler.
#![allow(unused_assignments)]

//! Error types for mold generation with rich diagnostics.
//!
//! Codes follow the pattern `MOLD-XXXX` where:
//! - 1xxx = Input and parameter errors
//! - 2xxx = Sampling errors
//! - 3xxx = Pipeline control
//! - 4xxx = Configuration files

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for mold operations.
pub type MoldResult<T> = Result<T, MoldError>;

/// Machine-readable error codes for mold operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoldErrorCode {
    /// MOLD-1001: Input mesh is empty
    EmptyMesh = 1001,
    /// MOLD-1002: Invalid parameters
    InvalidParams = 1002,
    /// MOLD-1003: Underlying mesh error
    Mesh = 1003,

    /// MOLD-2001: No ray hit the vessel
    EmptySampling = 2001,

    /// MOLD-3001: Cancelled through the progress callback
    Cancelled = 3001,

    /// MOLD-4001: Parameter file could not be read or parsed
    Config = 4001,
}

impl MoldErrorCode {
    /// Returns the error code as a string in the format `MOLD-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            MoldErrorCode::EmptyMesh => "MOLD-1001",
            MoldErrorCode::InvalidParams => "MOLD-1002",
            MoldErrorCode::Mesh => "MOLD-1003",
            MoldErrorCode::EmptySampling => "MOLD-2001",
            MoldErrorCode::Cancelled => "MOLD-3001",
            MoldErrorCode::Config => "MOLD-4001",
        }
    }
}

impl std::fmt::Display for MoldErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions for mold errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MoldRecoverySuggestion {
    /// Change one parameter.
    AdjustParameter {
        name: String,
        current: f64,
        suggested: f64,
    },
    /// Check that the vessel is oriented and positioned correctly.
    CheckVesselPlacement,
    /// Fix the parameter file.
    FixConfigFile,
    /// No specific suggestion.
    None,
}

impl std::fmt::Display for MoldRecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoldRecoverySuggestion::AdjustParameter {
                name,
                current,
                suggested,
            } => write!(
                f,
                "Adjust {} from {:.2}mm to {:.2}mm",
                name, current, suggested
            ),
            MoldRecoverySuggestion::CheckVesselPlacement => write!(
                f,
                "Make sure the vessel stands upright along +Y and is a closed surface"
            ),
            MoldRecoverySuggestion::FixConfigFile => {
                write!(f, "Print the defaults with `mold params` and edit from there")
            }
            MoldRecoverySuggestion::None => write!(f, "No specific suggestion available"),
        }
    }
}

/// Errors that can occur while generating a mold.
#[derive(Debug, Error, Diagnostic)]
pub enum MoldError {
    /// Input mesh is empty.
    #[error("input mesh is empty")]
    #[diagnostic(
        code(mold::input::empty),
        help("The vessel must have at least one triangle. Check that it was loaded correctly.")
    )]
    EmptyMesh,

    /// Invalid parameters.
    #[error("invalid mold parameters: {details}")]
    #[diagnostic(
        code(mold::params::invalid),
        help("{}", suggestion.as_ref().map(|s| s.to_string()).unwrap_or_else(|| "Check parameter values against the defaults printed by `mold params`.".to_string()))
    )]
    InvalidParams {
        details: String,
        param_name: Option<String>,
        suggestion: Option<MoldRecoverySuggestion>,
    },

    /// Every sampling ray missed the vessel.
    #[error("no ray hit the vessel surface ({rays} rays cast)")]
    #[diagnostic(
        code(mold::sampling::empty),
        help("The vessel may be offset from the Y axis or lying on its side. Enable centering or reorient it.")
    )]
    EmptySampling { rays: usize },

    /// The progress callback requested cancellation.
    #[error("mold generation cancelled during {stage}")]
    #[diagnostic(code(mold::cancelled))]
    Cancelled { stage: String },

    /// Parameter file could not be read or parsed.
    #[error("failed to load parameters from {path}: {details}")]
    #[diagnostic(code(mold::config::invalid))]
    Config { path: PathBuf, details: String },

    /// Underlying mesh error.
    #[error("mesh operation failed: {0}")]
    #[diagnostic(code(mold::mesh::error))]
    MeshError(#[from] mold_mesh::MeshError),
}

impl MoldError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> MoldErrorCode {
        match self {
            MoldError::EmptyMesh => MoldErrorCode::EmptyMesh,
            MoldError::InvalidParams { .. } => MoldErrorCode::InvalidParams,
            MoldError::EmptySampling { .. } => MoldErrorCode::EmptySampling,
            MoldError::Cancelled { .. } => MoldErrorCode::Cancelled,
            MoldError::Config { .. } => MoldErrorCode::Config,
            MoldError::MeshError(_) => MoldErrorCode::Mesh,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> MoldRecoverySuggestion {
        match self {
            MoldError::EmptyMesh | MoldError::EmptySampling { .. } => {
                MoldRecoverySuggestion::CheckVesselPlacement
            }
            MoldError::InvalidParams { suggestion, .. } => suggestion
                .clone()
                .unwrap_or(MoldRecoverySuggestion::None),
            MoldError::Config { .. } => MoldRecoverySuggestion::FixConfigFile,
            MoldError::Cancelled { .. } | MoldError::MeshError(_) => MoldRecoverySuggestion::None,
        }
    }

    /// Create an invalid params error.
    pub fn invalid_params(details: impl Into<String>) -> Self {
        MoldError::InvalidParams {
            details: details.into(),
            param_name: None,
            suggestion: None,
        }
    }

    /// Create an invalid params error naming the parameter and a better value.
    pub fn invalid_param(
        param_name: impl Into<String>,
        current: f64,
        suggested: f64,
        details: impl Into<String>,
    ) -> Self {
        let name = param_name.into();
        MoldError::InvalidParams {
            details: details.into(),
            suggestion: Some(MoldRecoverySuggestion::AdjustParameter {
                name: name.clone(),
                current,
                suggested,
            }),
            param_name: Some(name),
        }
    }

    /// Create a cancellation error for the named stage.
    pub fn cancelled(stage: impl Into<String>) -> Self {
        MoldError::Cancelled {
            stage: stage.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        MoldError::Config {
            path: path.into(),
            details: details.into(),
        }
    }
}
