use axum::{
    extract::{Path, Query, State},
    Json,
};
use lore_api::{Comment, CommentEdit, CommentId, NewComment, ThreadPage, ThreadQuery};
use lore_core::{CommentLifecycle, ThreadPaginator};

use crate::{extractors::*, Error};

pub async fn add_comment(
    Auth(user): Auth,
    State(lifecycle): State<CommentLifecycle>,
    State(timeout): State<RequestTimeout>,
    Json(data): Json<NewComment>,
) -> Result<Json<Comment>, Error> {
    Ok(Json(timeout.run(lifecycle.add_comment(data, user)).await?))
}

pub async fn edit_comment(
    Auth(user): Auth,
    State(lifecycle): State<CommentLifecycle>,
    State(timeout): State<RequestTimeout>,
    Path(id): Path<i64>,
    Json(data): Json<CommentEdit>,
) -> Result<Json<bool>, Error> {
    Ok(Json(
        timeout
            .run(lifecycle.edit_comment(CommentId(id), data, user))
            .await?,
    ))
}

pub async fn delete_comment(
    Auth(user): Auth,
    State(lifecycle): State<CommentLifecycle>,
    State(timeout): State<RequestTimeout>,
    Path(id): Path<i64>,
) -> Result<Json<bool>, Error> {
    Ok(Json(
        timeout
            .run(lifecycle.delete_comment(CommentId(id), user))
            .await?,
    ))
}

pub async fn get_threads(
    State(threads): State<ThreadPaginator>,
    State(timeout): State<RequestTimeout>,
    Query(q): Query<ThreadQuery>,
) -> Result<Json<ThreadPage>, Error> {
    Ok(Json(timeout.run(threads.get_threads(&q)).await?))
}

#[derive(serde::Deserialize)]
pub struct ThreadLocation {
    entity_type: String,
    entity_id: i64,
}

pub async fn get_thread(
    State(threads): State<ThreadPaginator>,
    State(timeout): State<RequestTimeout>,
    Path(thread_id): Path<i64>,
    Query(loc): Query<ThreadLocation>,
) -> Result<Json<Vec<Comment>>, Error> {
    Ok(Json(
        timeout
            .run(threads.thread(&loc.entity_type, loc.entity_id, thread_id))
            .await?,
    ))
}
