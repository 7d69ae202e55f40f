//! Mapping from domain errors to HTTP responses.

use axum::http::StatusCode;
use scrumkit_core::CoreError;

/// Handler error: a status and a message for the client.
pub type ApiError = (StatusCode, String);

pub type ApiResult<T> = Result<T, ApiError>;

pub fn api_error(err: CoreError) -> ApiError {
    let status = match &err {
        CoreError::Validation(_) | CoreError::WeakPassword(_) | CoreError::Json(_) => StatusCode::BAD_REQUEST,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::Unauthenticated(_) | CoreError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        CoreError::EmailInUse(_) => StatusCode::CONFLICT,
        CoreError::MissingConfig(_)
        | CoreError::Config(_)
        | CoreError::Backend { .. }
        | CoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

pub fn not_found(entity: &str, id: &str) -> ApiError {
    api_error(CoreError::not_found(entity, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrumkit_store::StoreError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(api_error(CoreError::validation("x")).0, StatusCode::BAD_REQUEST);
        assert_eq!(api_error(CoreError::not_found("Epic", "e1")).0, StatusCode::NOT_FOUND);
        assert_eq!(api_error(CoreError::InvalidCredentials).0, StatusCode::UNAUTHORIZED);

        let backend = CoreError::Backend {
            message: "Could not load the epics.".into(),
            source: StoreError::OperationFailed("timeout".into()),
        };
        assert_eq!(
            api_error(backend),
            (StatusCode::INTERNAL_SERVER_ERROR, "Could not load the epics.".to_string())
        );
    }
}
