//! Error types for the remix engine

use std::fmt;

/// Errors that can occur while decoding, analysing, sequencing or rendering
#[derive(Debug, Clone, PartialEq)]
pub enum RemixError {
    /// Invalid input parameters
    InvalidInput(String),

    /// Raw bytes could not be interpreted as audio
    DecodingError(String),

    /// A decoded or synthesized buffer failed sanity checks
    ValidationError(String),

    /// Tempo, key or frequency analysis failed
    ///
    /// Callers inside the pipeline recover from this with defaults.
    AnalysisError(String),

    /// Offline render construction or execution failed
    RenderError(String),
}

impl RemixError {
    /// Whether the error belongs to the clip-level class that only
    /// invalidates a single clip rather than the whole operation
    pub fn is_clip_level(&self) -> bool {
        matches!(
            self,
            RemixError::DecodingError(_) | RemixError::ValidationError(_) | RemixError::AnalysisError(_)
        )
    }
}

impl fmt::Display for RemixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemixError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            RemixError::DecodingError(msg) => write!(f, "Decoding error: {}", msg),
            RemixError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            RemixError::AnalysisError(msg) => write!(f, "Analysis error: {}", msg),
            RemixError::RenderError(msg) => write!(f, "Render error: {}", msg),
        }
    }
}

impl std::error::Error for RemixError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        let err = RemixError::ValidationError("no clips".to_string());
        assert_eq!(err.to_string(), "Validation error: no clips");

        let err = RemixError::RenderError("graph has a cycle".to_string());
        assert!(err.to_string().starts_with("Render error"));
    }

    #[test]
    fn test_clip_level_classification() {
        assert!(RemixError::DecodingError("x".into()).is_clip_level());
        assert!(!RemixError::RenderError("x".into()).is_clip_level());
        assert!(!RemixError::InvalidInput("x".into()).is_clip_level());
    }
}
