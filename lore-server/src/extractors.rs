use std::{future::Future, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{self, request},
};
use lore_api::{AuthToken, SessionStore, UserId};
use lore_core::{CommentLifecycle, ThreadPaginator};

use crate::Error;

#[derive(Clone, axum::extract::FromRef)]
pub struct AppState {
    pub lifecycle: CommentLifecycle,
    pub threads: ThreadPaginator,
    pub sessions: Arc<dyn SessionStore>,
    pub request_timeout: RequestTimeout,
}

#[derive(Clone, Copy, Debug)]
pub struct RequestTimeout(pub Duration);

impl RequestTimeout {
    /// Runs `f` to completion or drops it once the deadline is hit
    pub async fn run<T, F>(self, f: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, lore_core::Error>>,
    {
        match tokio::time::timeout(self.0, f).await {
            Ok(res) => Ok(res?),
            Err(_) => Err(Error::from(anyhow!(
                "request did not complete within {:?}",
                self.0
            ))),
        }
    }
}

/// The session token carried by an `Authorization: Bearer <token>` header, if any
pub fn session_token(headers: &http::HeaderMap) -> Option<AuthToken> {
    let value = headers.get(http::header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    token.trim_start().parse().ok()
}

/// The acting user, resolved from the session named by the request's bearer token
///
/// Missing, malformed and unknown tokens are all `PermissionDenied`.
pub struct Auth(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for Auth {
    type Rejection = Error;

    async fn from_request_parts(req: &mut request::Parts, state: &AppState) -> Result<Auth, Error> {
        let token = session_token(&req.headers).ok_or_else(Error::permission_denied)?;
        let user = state
            .request_timeout
            .run(async {
                Ok(state
                    .sessions
                    .resolve_session(token)
                    .await
                    .context("resolving session token")?)
            })
            .await?;
        match user {
            Some(user) => {
                tracing::trace!(%user, "authenticated request");
                Ok(Auth(user))
            }
            None => Err(Error::permission_denied()),
        }
    }
}
