//! Error types for mesh input and output.
//!
//! Each error carries a machine-readable code in the format `MESH-XXXX`:
//! - `MESH-1xxx`: I/O errors (file reading, writing, parsing)
//! - `MESH-2xxx`: Validation errors (indices, coordinates, empty input)
//! - `MESH-4xxx`: Format errors

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Machine-readable error codes for mesh operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// MESH-1001: Failed to read file
    IoRead = 1001,
    /// MESH-1002: Failed to write file
    IoWrite = 1002,
    /// MESH-1003: Failed to parse file format
    ParseError = 1003,

    /// MESH-2001: Face references invalid vertex index
    InvalidVertexIndex = 2001,
    /// MESH-2002: Vertex has NaN or Infinity coordinate
    InvalidCoordinate = 2002,
    /// MESH-2003: Mesh has no vertices or faces
    EmptyMesh = 2003,

    /// MESH-4001: Unsupported file format
    UnsupportedFormat = 4001,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `MESH-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::IoRead => "MESH-1001",
            ErrorCode::IoWrite => "MESH-1002",
            ErrorCode::ParseError => "MESH-1003",
            ErrorCode::InvalidVertexIndex => "MESH-2001",
            ErrorCode::InvalidCoordinate => "MESH-2002",
            ErrorCode::EmptyMesh => "MESH-2003",
            ErrorCode::UnsupportedFormat => "MESH-4001",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions for mesh errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Re-export the file from the modelling software.
    ReexportFile { format: Option<String> },
    /// Use a different file format.
    UseDifferentFormat { suggested: Vec<String> },
    /// Check the original mesh or file system.
    CheckSourceMesh { checks: Vec<String> },
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoverySuggestion::ReexportFile { format } => match format {
                Some(fmt) => write!(
                    f,
                    "Try re-exporting the vessel as {} from the modelling software",
                    fmt
                ),
                None => write!(f, "Try re-exporting the vessel from the modelling software"),
            },
            RecoverySuggestion::UseDifferentFormat { suggested } => {
                write!(f, "Try using a different format: {}", suggested.join(", "))
            }
            RecoverySuggestion::CheckSourceMesh { checks } => {
                write!(f, "Check the source for: {}", checks.join(", "))
            }
        }
    }
}

/// Errors that can occur while loading, checking or writing meshes.
#[derive(Debug, Error, Diagnostic)]
pub enum MeshError {
    /// Error reading from a file.
    #[error("failed to read mesh from {path}")]
    #[diagnostic(
        code(mesh::io::read),
        help("Check that the file exists and is readable")
    )]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing to a file.
    #[error("failed to write mesh to {path}")]
    #[diagnostic(
        code(mesh::io::write),
        help("Check that the directory exists and is writable")
    )]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing mesh file format.
    #[error("failed to parse mesh from {path}: {details}")]
    #[diagnostic(
        code(mesh::parse::error),
        help("The file may be corrupted. Try re-exporting it as binary STL.")
    )]
    ParseError { path: PathBuf, details: String },

    /// Unsupported file format.
    #[error("unsupported mesh format: {extension:?}")]
    #[diagnostic(code(mesh::format::unsupported), help("Supported formats: STL, OBJ"))]
    UnsupportedFormat { extension: Option<String> },

    /// Empty mesh (no vertices or faces).
    #[error("mesh is empty: {details}")]
    #[diagnostic(
        code(mesh::validation::empty),
        help("The vessel must have at least one triangle. Check the export settings.")
    )]
    EmptyMesh { details: String },

    /// Invalid vertex index in face data.
    #[error(
        "invalid vertex index: face {face_index} references vertex {vertex_index}, but mesh only has {vertex_count} vertices"
    )]
    #[diagnostic(code(mesh::validation::vertex_index))]
    InvalidVertexIndex {
        face_index: usize,
        vertex_index: u32,
        vertex_count: usize,
    },

    /// Invalid coordinate value (NaN or Infinity).
    #[error("invalid coordinate at vertex {vertex_index}: {coordinate} is {value}")]
    #[diagnostic(code(mesh::validation::coordinate))]
    InvalidCoordinate {
        vertex_index: usize,
        coordinate: &'static str,
        value: f64,
    },
}

impl MeshError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MeshError::IoRead { .. } => ErrorCode::IoRead,
            MeshError::IoWrite { .. } => ErrorCode::IoWrite,
            MeshError::ParseError { .. } => ErrorCode::ParseError,
            MeshError::UnsupportedFormat { .. } => ErrorCode::UnsupportedFormat,
            MeshError::EmptyMesh { .. } => ErrorCode::EmptyMesh,
            MeshError::InvalidVertexIndex { .. } => ErrorCode::InvalidVertexIndex,
            MeshError::InvalidCoordinate { .. } => ErrorCode::InvalidCoordinate,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            MeshError::IoRead { .. } => RecoverySuggestion::CheckSourceMesh {
                checks: vec!["file exists".into(), "file permissions".into()],
            },
            MeshError::IoWrite { .. } => RecoverySuggestion::CheckSourceMesh {
                checks: vec!["directory exists".into(), "write permissions".into()],
            },
            MeshError::ParseError { .. } => RecoverySuggestion::ReexportFile {
                format: Some("binary STL".into()),
            },
            MeshError::UnsupportedFormat { .. } => RecoverySuggestion::UseDifferentFormat {
                suggested: vec!["STL".into(), "OBJ".into()],
            },
            MeshError::EmptyMesh { .. } => RecoverySuggestion::CheckSourceMesh {
                checks: vec!["mesh has geometry".into(), "correct export settings".into()],
            },
            MeshError::InvalidVertexIndex { .. } => RecoverySuggestion::ReexportFile { format: None },
            MeshError::InvalidCoordinate { .. } => RecoverySuggestion::CheckSourceMesh {
                checks: vec!["coordinate values".into(), "export precision".into()],
            },
        }
    }

    /// Create an IoRead error.
    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MeshError::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create an IoWrite error.
    pub fn io_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MeshError::IoWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a ParseError.
    pub fn parse_error(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        MeshError::ParseError {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Create an EmptyMesh error.
    pub fn empty_mesh(details: impl Into<String>) -> Self {
        MeshError::EmptyMesh {
            details: details.into(),
        }
    }

    /// Create an InvalidVertexIndex error.
    pub fn invalid_vertex_index(face_index: usize, vertex_index: u32, vertex_count: usize) -> Self {
        MeshError::InvalidVertexIndex {
            face_index,
            vertex_index,
            vertex_count,
        }
    }

    /// Create an InvalidCoordinate error.
    pub fn invalid_coordinate(vertex_index: usize, coordinate: &'static str, value: f64) -> Self {
        MeshError::InvalidCoordinate {
            vertex_index,
            coordinate,
            value,
        }
    }

    /// Create an UnsupportedFormat error.
    pub fn unsupported_format(extension: Option<String>) -> Self {
        MeshError::UnsupportedFormat { extension }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            MeshError::empty_mesh("no faces").code().as_str(),
            "MESH-2003"
        );
        assert_eq!(
            MeshError::unsupported_format(Some("ply".into())).code(),
            ErrorCode::UnsupportedFormat
        );
        assert_eq!(ErrorCode::IoWrite.to_string(), "MESH-1002");
    }

    #[test]
    fn test_recovery_suggestion_display() {
        let err = MeshError::parse_error("vase.stl", "truncated");
        let suggestion = err.recovery_suggestion().to_string();
        assert!(suggestion.contains("binary STL"));

        let err = MeshError::unsupported_format(Some("3mf".into()));
        assert!(err.recovery_suggestion().to_string().contains("OBJ"));
    }

    #[test]
    fn test_error_display() {
        let err = MeshError::invalid_vertex_index(3, 99, 10);
        let msg = err.to_string();
        assert!(msg.contains("face 3"));
        assert!(msg.contains("vertex 99"));

        let err = MeshError::invalid_coordinate(7, "y", f64::NAN);
        assert!(err.to_string().contains("vertex 7"));
    }
}
