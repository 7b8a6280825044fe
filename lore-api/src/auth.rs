use std::str::FromStr;

use uuid::Uuid;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AuthToken(pub Uuid);

impl FromStr for AuthToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<AuthToken, uuid::Error> {
        Uuid::try_parse(s).map(AuthToken)
    }
}
