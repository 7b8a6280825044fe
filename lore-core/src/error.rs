use lore_api::{CommentId, EntityType, Error as ApiError, Reason, Uuid};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl Error {
    pub fn permission_denied() -> Error {
        Error::Api(ApiError::PermissionDenied)
    }

    pub fn comment_not_found(id: CommentId) -> Error {
        Error::Api(ApiError::CommentNotFound(id))
    }

    pub fn entity_not_found(entity_type: EntityType, id: i64) -> Error {
        Error::Api(ApiError::EntityNotFound(entity_type, id))
    }

    pub fn invalid(field: &str, reason: Reason) -> Error {
        Error::Api(ApiError::validation(field, reason))
    }

    /// Turns this into what the caller is allowed to see, logging internal failures
    pub fn into_api(self) -> ApiError {
        match self {
            Error::Anyhow(err) => {
                let incident = Uuid::new_v4();
                tracing::error!(%incident, ?err, "internal error");
                ApiError::Unknown(format!("Internal server error, incident {incident}"))
            }
            Error::Api(err) => {
                tracing::info!("returning error to client: {err}");
                err
            }
        }
    }

    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Error::Anyhow(_) => None,
            Error::Api(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_details_stay_in_the_logs() {
        let err = Error::from(anyhow::anyhow!("connecting to db.internal:5432"));
        match err.into_api() {
            ApiError::Unknown(msg) => {
                assert!(msg.contains("incident"));
                assert!(!msg.contains("db.internal"));
            }
            e => panic!("expected an opaque error, got {e:?}"),
        }
        assert_eq!(
            Error::comment_not_found(CommentId(3)).into_api(),
            ApiError::CommentNotFound(CommentId(3))
        );
    }
}
