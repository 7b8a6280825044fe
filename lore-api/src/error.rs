use std::{collections::BTreeMap, fmt};

use anyhow::{anyhow, Context};
use serde_json::json;

use crate::{CommentId, EntityType};

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Comment not found {0}")]
    CommentNotFound(CommentId),

    #[error("Entity not found {0} {1}")]
    EntityNotFound(EntityType, i64),

    #[error("Invalid input: {0}")]
    Validation(ValidationErrors),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum Reason {
    InvalidValue,
    InvalidFormat,
    InvalidCount,
}

/// Field name to reason, collected before any mutation happens
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ValidationErrors(pub BTreeMap<String, Reason>);

impl ValidationErrors {
    pub fn new() -> ValidationErrors {
        ValidationErrors(BTreeMap::new())
    }

    /// Records `reason` for `field` unless `ok` holds. The first failure on a field wins.
    pub fn check(&mut self, field: &str, ok: bool, reason: Reason) -> &mut Self {
        if !ok {
            self.0.entry(String::from(field)).or_insert(reason);
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<Reason> {
        self.0.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), Error> {
        match self.is_empty() {
            true => Ok(()),
            false => Err(Error::Validation(self)),
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, reason) in self.0.iter() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{field}: {reason:?}")?;
        }
        Ok(())
    }
}

impl Error {
    pub fn validation(field: &str, reason: Reason) -> Error {
        let mut errs = ValidationErrors::new();
        errs.check(field, false, reason);
        Error::Validation(errs)
    }

    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::CommentNotFound(_) => StatusCode::NOT_FOUND,
            Error::EntityNotFound(_, _) => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::PermissionDenied => json!({
                "message": "permission denied",
                "type": "permission-denied",
            }),
            Error::CommentNotFound(id) => json!({
                "message": "comment not found",
                "type": "comment-not-found",
                "id": id.0,
            }),
            Error::EntityNotFound(t, id) => json!({
                "message": "entity not found",
                "type": "entity-not-found",
                "entity_type": t,
                "id": id,
            }),
            Error::Validation(errs) => json!({
                "message": "invalid input",
                "type": "validation",
                "fields": errs.0,
            }),
        })
        .expect("serializing error")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let id = || {
            data.get("id")
                .and_then(|id| id.as_i64())
                .ok_or_else(|| anyhow!("not-found error without a proper id"))
        };
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(String::from(
                    data.get("message")
                        .and_then(|msg| msg.as_str())
                        .unwrap_or(""),
                )),
                "permission-denied" => Error::PermissionDenied,
                "comment-not-found" => Error::CommentNotFound(CommentId(id()?)),
                "entity-not-found" => Error::EntityNotFound(
                    serde_json::from_value(
                        data.get("entity_type")
                            .cloned()
                            .ok_or_else(|| anyhow!("entity-not-found error without a type"))?,
                    )
                    .context("parsing entity type of entity-not-found error")?,
                    id()?,
                ),
                "validation" => Error::Validation(ValidationErrors(
                    serde_json::from_value(
                        data.get("fields")
                            .cloned()
                            .ok_or_else(|| anyhow!("validation error without fields"))?,
                    )
                    .context("parsing fields of validation error")?,
                )),
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}
