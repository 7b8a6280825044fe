use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    routing::{get, post, put},
    Router,
};
use lore_core::{ChangeRecorder, CommentLifecycle, ThreadPaginator};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

mod db;
mod error;
mod extractors;
mod handlers;


pub use db::PostgresStore;
pub use error::Error;
use extractors::{AppState, RequestTimeout};

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(structopt::StructOpt)]
struct Opt {
    /// Postgres connection string
    #[structopt(long, env = "DATABASE_URL")]
    database_url: String,

    /// Address to serve the API on
    #[structopt(long, env = "LORE_LISTEN", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    #[structopt(long, env = "LORE_MAX_DB_CONNECTIONS", default_value = "10")]
    max_db_connections: u32,

    /// Deadline for each request, after which its database work is dropped
    #[structopt(long, env = "LORE_REQUEST_TIMEOUT_SECS", default_value = "10")]
    request_timeout_secs: u64,
}

pub async fn create_sqlx_pool(url: &str, max_connections: u32) -> anyhow::Result<sqlx::PgPool> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .with_context(|| format!("Error opening database {url:?}"))
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/comments", post(handlers::add_comment))
        .route(
            "/api/comments/:id",
            put(handlers::edit_comment).delete(handlers::delete_comment),
        )
        .route("/api/threads", get(handlers::get_threads))
        .route("/api/threads/:thread_id", get(handlers::get_thread))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opt = <Opt as structopt::StructOpt>::from_args();

    let pool = create_sqlx_pool(&opt.database_url, opt.max_db_connections).await?;
    MIGRATOR
        .run(&pool)
        .await
        .context("running pending migrations")?;
    let store = Arc::new(PostgresStore::new(pool));

    let (failures, mut failure_feed) = mpsc::unbounded_channel::<lore_core::AuditFailure>();
    tokio::spawn(async move {
        while let Some(f) = failure_feed.recv().await {
            tracing::warn!(
                kind = ?f.kind,
                entity_type = %f.entity_type,
                entity_id = f.entity_id,
                user = %f.user_id,
                reason = %f.reason,
                "audit trail is missing a change"
            );
        }
    });
    let recorder = ChangeRecorder::new(store.clone()).with_failure_feed(failures);

    let state = AppState {
        lifecycle: CommentLifecycle::new(store.clone(), store.clone(), recorder),
        threads: ThreadPaginator::new(store.clone(), store.clone()),
        sessions: store,
        request_timeout: RequestTimeout(Duration::from_secs(opt.request_timeout_secs)),
    };

    tracing::info!("listening on {}", opt.listen);
    axum::Server::bind(&opt.listen)
        .serve(app(state).into_make_service())
        .await
        .context("serving axum webserver")
}
