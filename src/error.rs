use std::path::PathBuf;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlacementError>;

/// Everything a single placement request can fail with.
///
/// A request either yields a full `ClassificationResult` or exactly one of
/// these; there are no partial results.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("please complete the form: {0}")]
    MissingInput(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("training data '{}' is unavailable: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("training data is malformed: {0}")]
    SourceMalformed(String),

    #[error("an error occurred while processing the data: {0}")]
    UnexpectedFailure(String),
}

impl PlacementError {
    pub fn kind(&self) -> &'static str {
        match self {
            PlacementError::MissingInput(_) => "missing_input",
            PlacementError::InvalidInput(_) => "invalid_input",
            PlacementError::SourceUnavailable { .. } => "source_unavailable",
            PlacementError::SourceMalformed(_) => "source_malformed",
            PlacementError::UnexpectedFailure(_) => "unexpected_failure",
        }
    }

    /// Client errors are the caller's to fix; everything else is ours.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PlacementError::MissingInput(_) | PlacementError::InvalidInput(_)
        )
    }
}

impl ResponseError for PlacementError {
    fn status_code(&self) -> StatusCode {
        match self {
            PlacementError::MissingInput(_) => StatusCode::BAD_REQUEST,
            PlacementError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PlacementError::SourceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            PlacementError::SourceMalformed(_) | PlacementError::UnexpectedFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_per_kind() {
        assert_eq!(
            PlacementError::MissingInput("name".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PlacementError::InvalidInput("score".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        let unavailable = PlacementError::SourceUnavailable {
            path: PathBuf::from("missing.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unavailable.kind(), "source_unavailable");
        assert!(unavailable.to_string().contains("missing.csv"));
    }

    #[test]
    fn test_unexpected_keeps_detail() {
        let err = PlacementError::UnexpectedFailure("centroids are not finite".into());
        assert!(err.to_string().starts_with("an error occurred"));
        assert!(err.to_string().contains("centroids are not finite"));
        assert!(!err.is_client_error());
        assert_eq!(err.kind(), "unexpected_failure");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
