use crate::{Comment, EntityType, Error, Reason, ValidationErrors};

/// Raw query of the "list threads" use-case
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ThreadQuery {
    pub entity_type: String,
    pub entity_id: i64,
    pub page_size: i64,
    #[serde(default)]
    pub page_index: i64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ValidThreadQuery {
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub page_size: u32,
    pub page_index: u32,
}

impl ThreadQuery {
    pub fn validate(&self) -> Result<ValidThreadQuery, Error> {
        let entity_type = self.entity_type.parse::<EntityType>().ok();
        let page_size = u32::try_from(self.page_size).ok().filter(|s| *s > 0);
        let page_index = u32::try_from(self.page_index).ok();
        let mut errs = ValidationErrors::new();
        errs.check("entity_type", entity_type.is_some(), Reason::InvalidValue)
            .check("entity_id", self.entity_id >= 0, Reason::InvalidValue)
            .check("page_size", page_size.is_some(), Reason::InvalidCount)
            .check("page_index", page_index.is_some(), Reason::InvalidValue);
        match (entity_type, page_size, page_index, errs.is_empty()) {
            (Some(entity_type), Some(page_size), Some(page_index), true) => Ok(ValidThreadQuery {
                entity_type,
                entity_id: self.entity_id,
                page_size,
                page_index,
            }),
            _ => Err(Error::Validation(errs)),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ThreadPage {
    pub threads: Vec<Comment>,

    /// True iff the page was full; the next page may still turn out empty
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(entity_type: &str, entity_id: i64, page_size: i64, page_index: i64) -> ThreadQuery {
        ThreadQuery {
            entity_type: String::from(entity_type),
            entity_id,
            page_size,
            page_index,
        }
    }

    #[test]
    fn valid_query() {
        assert_eq!(
            query("plan", 4, 10, 2).validate(),
            Ok(ValidThreadQuery {
                entity_type: EntityType::Plan,
                entity_id: 4,
                page_size: 10,
                page_index: 2,
            })
        );
    }

    #[test]
    fn every_bad_field_is_reported() {
        let err = match query("spaceship", -1, 0, -3).validate() {
            Err(Error::Validation(errs)) => errs,
            r => panic!("expected a validation error, got {r:?}"),
        };
        assert_eq!(err.get("entity_type"), Some(Reason::InvalidValue));
        assert_eq!(err.get("entity_id"), Some(Reason::InvalidValue));
        assert_eq!(err.get("page_size"), Some(Reason::InvalidCount));
        assert_eq!(err.get("page_index"), Some(Reason::InvalidValue));
    }
}
