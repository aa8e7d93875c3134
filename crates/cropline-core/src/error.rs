//! Error types module
//!
//! `CropError` is the taxonomy every crop request can end in. Requests that are
//! malformed, forged or point at nothing collapse into one indistinguishable
//! not-found outcome; render and storage failures are operational and keep
//! their diagnostic detail.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for rejected or suspicious requests
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Whether the requester should see this as a plain missing resource
    fn is_not_found(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from the requester
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("Invalid crop path: {0}")]
    InvalidPath(String),

    #[error("Signing token mismatch")]
    TokenMismatch,

    #[error("Source image not found: {0}")]
    SourceNotFound(String),

    #[error("Crop limit of {limit} reached for {source_path}")]
    CropLimitReached { source_path: String, limit: usize },

    #[error("Invalid crop specification: {0}")]
    InvalidSpec(String),

    #[error("Render failed: {0}")]
    Render(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Client message shared by every not-found class so they cannot be told apart.
pub const NOT_FOUND_MESSAGE: &str = "Not found";

/// Static metadata for each variant: (http_status, error_code, not_found, sensitive, log_level).
fn crop_error_static_metadata(err: &CropError) -> (u16, &'static str, bool, bool, LogLevel) {
    match err {
        CropError::InvalidPath(_)
        | CropError::TokenMismatch
        | CropError::SourceNotFound(_)
        | CropError::CropLimitReached { .. } => (404, "NOT_FOUND", true, true, LogLevel::Warn),
        CropError::InvalidSpec(_) => (500, "INVALID_SPEC", false, false, LogLevel::Error),
        CropError::Render(_) => (500, "RENDER_ERROR", false, false, LogLevel::Error),
        CropError::Storage(_) => (500, "STORAGE_ERROR", false, false, LogLevel::Error),
        CropError::Config(_) => (500, "CONFIG_ERROR", false, true, LogLevel::Error),
    }
}

impl CropError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &'static str {
        match self {
            CropError::InvalidPath(_) => "InvalidPath",
            CropError::TokenMismatch => "TokenMismatch",
            CropError::SourceNotFound(_) => "SourceNotFound",
            CropError::CropLimitReached { .. } => "CropLimitReached",
            CropError::InvalidSpec(_) => "InvalidSpec",
            CropError::Render(_) => "Render",
            CropError::Storage(_) => "Storage",
            CropError::Config(_) => "Config",
        }
    }
}

impl ErrorMetadata for CropError {
    fn http_status_code(&self) -> u16 {
        crop_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        crop_error_static_metadata(self).1
    }

    fn is_not_found(&self) -> bool {
        crop_error_static_metadata(self).2
    }

    fn is_sensitive(&self) -> bool {
        crop_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        crop_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            CropError::InvalidPath(_)
            | CropError::TokenMismatch
            | CropError::SourceNotFound(_)
            | CropError::CropLimitReached { .. } => NOT_FOUND_MESSAGE.to_string(),
            CropError::InvalidSpec(ref msg) => format!("Invalid crop specification: {}", msg),
            CropError::Render(ref msg) => format!("Failed to render crop: {}", msg),
            CropError::Storage(ref msg) => format!("Storage failure: {}", msg),
            CropError::Config(_) => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classes_are_indistinguishable() {
        let errors = [
            CropError::InvalidPath("bad".to_string()),
            CropError::TokenMismatch,
            CropError::SourceNotFound("photos/a.jpg".to_string()),
            CropError::CropLimitReached {
                source_path: "photos/a.jpg".to_string(),
                limit: 3,
            },
        ];

        for err in &errors {
            assert_eq!(err.http_status_code(), 404);
            assert_eq!(err.error_code(), "NOT_FOUND");
            assert_eq!(err.client_message(), NOT_FOUND_MESSAGE);
            assert!(err.is_not_found());
            assert!(err.is_sensitive());
        }
    }

    #[test]
    fn test_operational_errors_keep_detail() {
        let err = CropError::Storage("disk full".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "STORAGE_ERROR");
        assert!(!err.is_not_found());
        assert!(err.client_message().contains("disk full"));
        assert_eq!(err.log_level(), LogLevel::Error);

        let err = CropError::Render("corrupt jpeg".to_string());
        assert_eq!(err.error_code(), "RENDER_ERROR");
        assert!(err.client_message().contains("corrupt jpeg"));
    }

    #[test]
    fn test_config_error_hides_detail() {
        let err = CropError::Config("secret missing".to_string());
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Internal server error");
    }
}
