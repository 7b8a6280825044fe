use anyhow::{anyhow, Context};
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use lore_api::{
    AuditStore, AuthToken, ChangeAction, ChangeLogRecord, Comment, CommentId, CommentStore,
    EntityStore, EntityType, NewChangeLogRecord, NewCommentRow, SessionStore, User, UserId,
    UserStore,
};
use sqlx::{postgres::PgRow, Row};

/// Every collaborator of the core, over a postgres pool
pub struct PostgresStore {
    pool: sqlx::PgPool,
}

impl PostgresStore {
    pub fn new(pool: sqlx::PgPool) -> PostgresStore {
        PostgresStore { pool }
    }
}

const COMMENT_COLUMNS: &str =
    "id, entity_type, entity_id, thread_id, parent_id, user_id, text, title, date, deleted";

fn entity_type_from_row(r: &PgRow) -> anyhow::Result<EntityType> {
    let code: i16 = r
        .try_get("entity_type")
        .context("retrieving entity_type field")?;
    EntityType::from_code(code).ok_or_else(|| anyhow!("unknown entity type code {code}"))
}

fn comment_from_row(r: &PgRow) -> anyhow::Result<Comment> {
    Ok(Comment {
        id: CommentId(r.try_get("id").context("retrieving id field")?),
        entity_type: entity_type_from_row(r)?,
        entity_id: r.try_get("entity_id").context("retrieving entity_id field")?,
        thread_id: CommentId::from_raw(
            r.try_get("thread_id")
                .context("retrieving thread_id field")?,
        ),
        parent_id: CommentId::from_raw(
            r.try_get("parent_id")
                .context("retrieving parent_id field")?,
        ),
        user_id: UserId(r.try_get("user_id").context("retrieving user_id field")?),
        text: r.try_get("text").context("retrieving text field")?,
        title: r.try_get("title").context("retrieving title field")?,
        date: r.try_get("date").context("retrieving date field")?,
        deleted: r.try_get("deleted").context("retrieving deleted field")?,
        points: None,
        user: None,
        children: Vec::new(),
    })
}

async fn collect<T, S>(mut rows: S, parse: fn(&PgRow) -> anyhow::Result<T>) -> anyhow::Result<Vec<T>>
where
    S: Stream<Item = Result<PgRow, sqlx::Error>> + Unpin,
{
    let mut res = Vec::new();
    while let Some(r) = rows.try_next().await.context("fetching next row")? {
        res.push(parse(&r)?);
    }
    Ok(res)
}

#[async_trait]
impl CommentStore for PostgresStore {
    async fn add(&self, c: NewCommentRow) -> anyhow::Result<Comment> {
        let id: i64 = sqlx::query(
            "
                INSERT INTO comments
                    (entity_type, entity_id, thread_id, parent_id, user_id, text, title, date)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING id
            ",
        )
        .bind(c.entity_type.code())
        .bind(c.entity_id)
        .bind(CommentId::raw(c.thread_id))
        .bind(CommentId::raw(c.parent_id))
        .bind(c.user_id.0)
        .bind(&c.text)
        .bind(&c.title)
        .bind(c.date)
        .fetch_one(&self.pool)
        .await
        .context("inserting comment")?
        .try_get("id")
        .context("retrieving id of inserted comment")?;
        Ok(c.into_comment(CommentId(id)))
    }

    async fn update(&self, id: CommentId, text: &str, title: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE comments SET text = $2, title = $3 WHERE id = $1")
            .bind(id.0)
            .bind(text)
            .bind(title)
            .execute(&self.pool)
            .await
            .with_context(|| format!("updating comment {id}"))?;
        Ok(res.rows_affected() == 1)
    }

    async fn delete(&self, id: CommentId) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE comments SET deleted = true WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("soft-deleting comment {id}"))?;
        Ok(res.rows_affected() == 1)
    }

    async fn get(&self, id: CommentId) -> anyhow::Result<Option<Comment>> {
        sqlx::query(&format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("fetching comment {id}"))?
            .map(|r| comment_from_row(&r))
            .transpose()
    }

    async fn get_thread_list(
        &self,
        entity_type: EntityType,
        entity_id: i64,
        count: u32,
        page: u32,
    ) -> anyhow::Result<Vec<Comment>> {
        let query = format!(
            "
                SELECT {COMMENT_COLUMNS}
                    FROM comments
                WHERE entity_type = $1
                AND entity_id = $2
                AND parent_id = 0
                ORDER BY id
                LIMIT $3 OFFSET $4
            "
        );
        let rows = sqlx::query(&query)
            .bind(entity_type.code())
            .bind(entity_id)
            .bind(i64::from(count))
            .bind(i64::from(count) * i64::from(page))
            .fetch(&self.pool);
        collect(rows, comment_from_row)
            .await
            .with_context(|| format!("listing threads of {entity_type} {entity_id}"))
    }

    async fn get_thread(
        &self,
        entity_type: EntityType,
        entity_id: i64,
        thread_id: CommentId,
    ) -> anyhow::Result<Vec<Comment>> {
        let query = format!(
            "
                SELECT {COMMENT_COLUMNS}
                    FROM comments
                WHERE entity_type = $1
                AND entity_id = $2
                AND (id = $3 OR thread_id = $3)
            "
        );
        let rows = sqlx::query(&query)
            .bind(entity_type.code())
            .bind(entity_id)
            .bind(thread_id.0)
            .fetch(&self.pool);
        collect(rows, comment_from_row)
            .await
            .with_context(|| format!("fetching thread {thread_id}"))
    }
}

fn user_from_row(r: &PgRow) -> anyhow::Result<User> {
    let rights: i64 = r.try_get("rights").context("retrieving rights field")?;
    Ok(User {
        id: UserId(r.try_get("id").context("retrieving id field")?),
        name: r.try_get("name").context("retrieving name field")?,
        email: r.try_get("email").context("retrieving email field")?,
        img: r.try_get("img").context("retrieving img field")?,
        rights: u32::try_from(rights).with_context(|| format!("rights {rights} out of range"))?,
    })
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn get_list(&self, ids: &[UserId]) -> anyhow::Result<Vec<User>> {
        let ids = ids.iter().map(|u| u.0).collect::<Vec<i64>>();
        let rows = sqlx::query("SELECT id, name, email, img, rights FROM users WHERE id = ANY($1)")
            .bind(&ids[..])
            .fetch(&self.pool);
        collect(rows, user_from_row)
            .await
            .with_context(|| format!("fetching {} users", ids.len()))
    }
}

fn record_from_row(r: &PgRow) -> anyhow::Result<ChangeLogRecord> {
    let action: i16 = r.try_get("action").context("retrieving action field")?;
    Ok(ChangeLogRecord {
        id: r.try_get("id").context("retrieving id field")?,
        date: r.try_get("date").context("retrieving date field")?,
        action: ChangeAction::from_code(action)
            .ok_or_else(|| anyhow!("unknown action code {action}"))?,
        user_id: UserId(r.try_get("user_id").context("retrieving user_id field")?),
        entity_type: entity_type_from_row(r)?,
        entity_id: r.try_get("entity_id").context("retrieving entity_id field")?,
        diff: r.try_get("diff").context("retrieving diff field")?,
        points: r.try_get("points").context("retrieving points field")?,
    })
}

#[async_trait]
impl AuditStore for PostgresStore {
    async fn add(&self, r: NewChangeLogRecord) -> anyhow::Result<bool> {
        let res = sqlx::query(
            "
                INSERT INTO change_log (action, user_id, entity_type, entity_id, diff)
                VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(r.action.code())
        .bind(r.user_id.0)
        .bind(r.entity_type.code())
        .bind(r.entity_id)
        .bind(&r.diff)
        .execute(&self.pool)
        .await
        .with_context(|| format!("inserting {:?} record", r.action))?;
        Ok(res.rows_affected() == 1)
    }

    async fn list_for(
        &self,
        entity_type: EntityType,
        entity_id: i64,
    ) -> anyhow::Result<Vec<ChangeLogRecord>> {
        let rows = sqlx::query(
            "
                SELECT id, date, action, user_id, entity_type, entity_id, diff, points
                    FROM change_log
                WHERE entity_type = $1
                AND entity_id = $2
                ORDER BY id
            ",
        )
        .bind(entity_type.code())
        .bind(entity_id)
        .fetch(&self.pool);
        collect(rows, record_from_row)
            .await
            .with_context(|| format!("fetching audit trail of {entity_type} {entity_id}"))
    }
}

fn entity_table(t: EntityType) -> &'static str {
    match t {
        EntityType::Plan => "plans",
        EntityType::Topic => "topics",
        EntityType::Project => "projects",
        EntityType::Resource => "resources",
        EntityType::Comment => "comments",
        EntityType::User => "users",
    }
}

#[async_trait]
impl EntityStore for PostgresStore {
    async fn exists(&self, entity_type: EntityType, entity_id: i64) -> anyhow::Result<bool> {
        let query = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1) AS found",
            entity_table(entity_type)
        );
        sqlx::query(&query)
            .bind(entity_id)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("checking existence of {entity_type} {entity_id}"))?
            .try_get("found")
            .context("retrieving found field")
    }
}

#[async_trait]
impl SessionStore for PostgresStore {
    async fn resolve_session(&self, token: AuthToken) -> anyhow::Result<Option<UserId>> {
        Ok(sqlx::query("SELECT user_id FROM sessions WHERE id = $1")
            .bind(token.0)
            .fetch_optional(&self.pool)
            .await
            .context("looking up session")?
            .map(|r| r.try_get("user_id").map(UserId))
            .transpose()
            .context("retrieving user_id field")?)
    }
}
