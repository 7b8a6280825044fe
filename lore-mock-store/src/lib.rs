use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use lore_api::{
    AuditStore, AuthToken, ChangeLogRecord, Comment, CommentId, CommentStore, EntityStore,
    EntityType, NewChangeLogRecord, NewCommentRow, SessionStore, User, UserId, UserStore,
};
use parking_lot::Mutex;

/// In-memory implementation of every store, for tests
///
/// Ids are handed out by plain counters, like a postgres sequence would.
pub struct MockStore(Mutex<State>);

#[derive(Default)]
struct State {
    comments: BTreeMap<CommentId, Comment>,
    last_comment_id: i64,
    users: BTreeMap<UserId, User>,
    entities: BTreeSet<(EntityType, i64)>,
    audit: Vec<ChangeLogRecord>,
    last_audit_id: i64,
    sessions: HashMap<AuthToken, UserId>,

    fail_comments: bool,
    fail_audit: bool,
    user_list_calls: usize,
}

impl MockStore {
    pub fn new() -> MockStore {
        MockStore(Mutex::new(State::default()))
    }

    pub fn add_user(&self, u: User) {
        self.0.lock().users.insert(u.id, u);
    }

    pub fn add_entity(&self, entity_type: EntityType, entity_id: i64) {
        self.0.lock().entities.insert((entity_type, entity_id));
    }

    pub fn add_session(&self, token: AuthToken, user: UserId) {
        self.0.lock().sessions.insert(token, user);
    }

    /// Makes every comment write fail, as if the database were down
    pub fn fail_comments(&self, fail: bool) {
        self.0.lock().fail_comments = fail;
    }

    pub fn fail_audit(&self, fail: bool) {
        self.0.lock().fail_audit = fail;
    }

    /// Number of batched user lookups served so far
    pub fn user_list_calls(&self) -> usize {
        self.0.lock().user_list_calls
    }

    pub fn comment_count(&self) -> usize {
        self.0.lock().comments.len()
    }

    pub fn audit_count(&self) -> usize {
        self.0.lock().audit.len()
    }
}

impl Default for MockStore {
    fn default() -> MockStore {
        MockStore::new()
    }
}

impl State {
    fn check_comment_writes(&self) -> anyhow::Result<()> {
        match self.fail_comments {
            true => Err(anyhow!("mock comment store is failing")),
            false => Ok(()),
        }
    }
}

#[async_trait]
impl CommentStore for MockStore {
    async fn add(&self, c: NewCommentRow) -> anyhow::Result<Comment> {
        let mut s = self.0.lock();
        s.check_comment_writes()?;
        s.last_comment_id += 1;
        let comment = c.into_comment(CommentId(s.last_comment_id));
        s.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update(&self, id: CommentId, text: &str, title: &str) -> anyhow::Result<bool> {
        let mut s = self.0.lock();
        s.check_comment_writes()?;
        Ok(match s.comments.get_mut(&id) {
            Some(c) => {
                c.text = String::from(text);
                c.title = String::from(title);
                true
            }
            None => false,
        })
    }

    async fn delete(&self, id: CommentId) -> anyhow::Result<bool> {
        let mut s = self.0.lock();
        s.check_comment_writes()?;
        Ok(match s.comments.get_mut(&id) {
            Some(c) => {
                c.deleted = true;
                true
            }
            None => false,
        })
    }

    async fn get(&self, id: CommentId) -> anyhow::Result<Option<Comment>> {
        Ok(self.0.lock().comments.get(&id).cloned())
    }

    async fn get_thread_list(
        &self,
        entity_type: EntityType,
        entity_id: i64,
        count: u32,
        page: u32,
    ) -> anyhow::Result<Vec<Comment>> {
        Ok(self
            .0
            .lock()
            .comments
            .values()
            .filter(|c| c.entity_type == entity_type && c.entity_id == entity_id)
            .filter(|c| c.is_top_level())
            .skip(count as usize * page as usize)
            .take(count as usize)
            .cloned()
            .collect())
    }

    async fn get_thread(
        &self,
        entity_type: EntityType,
        entity_id: i64,
        thread_id: CommentId,
    ) -> anyhow::Result<Vec<Comment>> {
        Ok(self
            .0
            .lock()
            .comments
            .values()
            .filter(|c| c.entity_type == entity_type && c.entity_id == entity_id)
            .filter(|c| c.id == thread_id || c.thread_id == Some(thread_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserStore for MockStore {
    async fn get_list(&self, ids: &[UserId]) -> anyhow::Result<Vec<User>> {
        let mut s = self.0.lock();
        s.user_list_calls += 1;
        Ok(ids.iter().filter_map(|id| s.users.get(id).cloned()).collect())
    }
}

#[async_trait]
impl AuditStore for MockStore {
    async fn add(&self, r: NewChangeLogRecord) -> anyhow::Result<bool> {
        let mut s = self.0.lock();
        if s.fail_audit {
            return Err(anyhow!("mock audit store is failing"));
        }
        s.last_audit_id += 1;
        let record = r.into_record(s.last_audit_id, Utc::now());
        s.audit.push(record);
        Ok(true)
    }

    async fn list_for(
        &self,
        entity_type: EntityType,
        entity_id: i64,
    ) -> anyhow::Result<Vec<ChangeLogRecord>> {
        Ok(self
            .0
            .lock()
            .audit
            .iter()
            .filter(|r| r.entity_type == entity_type && r.entity_id == entity_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EntityStore for MockStore {
    async fn exists(&self, entity_type: EntityType, entity_id: i64) -> anyhow::Result<bool> {
        Ok(self.0.lock().entities.contains(&(entity_type, entity_id)))
    }
}

#[async_trait]
impl SessionStore for MockStore {
    async fn resolve_session(&self, token: AuthToken) -> anyhow::Result<Option<UserId>> {
        Ok(self.0.lock().sessions.get(&token).copied())
    }
}
