use lore_api::Error as ApiError;

/// What handlers fail with: the core error, turned into a response at the edge
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct Error(#[from] pub lore_core::Error);

impl Error {
    pub fn permission_denied() -> Error {
        Error(lore_core::Error::permission_denied())
    }
}

impl From<ApiError> for Error {
    fn from(e: ApiError) -> Error {
        Error(lore_core::Error::Api(e))
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Error {
        Error(lore_core::Error::Anyhow(e))
    }
}

impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let err = self.0.into_api();
        (
            err.status_code(),
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            err.contents(),
        )
            .into_response()
    }
}
