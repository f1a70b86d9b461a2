//! Error types for the contouring pipeline.

use thiserror::Error;

/// Result type alias using ContourError.
pub type ContourResult<T> = Result<T, ContourError>;

/// Primary error type for every pipeline stage.
///
/// None of these are retried: each one aborts the run.
#[derive(Debug, Error)]
pub enum ContourError {
    // === Loader ===
    #[error("Data access failed: {0}")]
    DataAccess(String),

    #[error(
        "Shape mismatch for variable '{variable}': expected {expected:?} (lat, lon), found {found:?}"
    )]
    ShapeMismatch {
        variable: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    // === Geo-adjuster ===
    #[error("Empty selection: {0}")]
    EmptySelection(String),

    // === Contour extractor ===
    #[error("Invalid contour levels: {0}")]
    InvalidLevel(String),

    // === Outputs ===
    #[error("Write failed: {0}")]
    Write(String),

    #[error("Rendering failed: {0}")]
    RenderError(String),

    // === Configuration ===
    #[error("Invalid template '{template}': {message}")]
    InvalidTemplate { template: String, message: String },

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },
}

impl ContourError {
    /// Process exit code reported by the command-line tool.
    pub fn exit_code(&self) -> i32 {
        match self {
            ContourError::InvalidTemplate { .. } | ContourError::InvalidParameter { .. } => 2,
            ContourError::DataAccess(_) => 3,
            ContourError::ShapeMismatch { .. } => 4,
            ContourError::EmptySelection(_) => 5,
            ContourError::InvalidLevel(_) => 6,
            ContourError::Write(_) => 7,
            ContourError::RenderError(_) => 8,
        }
    }

    pub fn invalid_parameter(param: &str, message: impl Into<String>) -> Self {
        ContourError::InvalidParameter {
            param: param.to_string(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ContourError {
    fn from(err: std::io::Error) -> Self {
        ContourError::Write(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            ContourError::DataAccess("x".into()),
            ContourError::ShapeMismatch {
                variable: "b".into(),
                expected: (2, 2),
                found: (3, 2),
            },
            ContourError::EmptySelection("x".into()),
            ContourError::InvalidLevel("x".into()),
            ContourError::Write("x".into()),
            ContourError::RenderError("x".into()),
            ContourError::invalid_parameter("func", "bad"),
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.exit_code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(codes.iter().all(|&c| c != 0));
    }

    #[test]
    fn test_shape_mismatch_message() {
        let err = ContourError::ShapeMismatch {
            variable: "aod550_bc".into(),
            expected: (721, 1440),
            found: (361, 720),
        };
        let msg = err.to_string();
        assert!(msg.contains("aod550_bc"));
        assert!(msg.contains("(721, 1440)"));
    }
}
