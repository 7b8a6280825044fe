use std::sync::Arc;

use anyhow::{anyhow, Context};
use lore_api::{AuditStore, ChangeAction, ChangeKind, EntityType, NewChangeLogRecord, UserId};
use tokio::sync::mpsc;

use crate::diff::Revision;

/// A change that could not be written to the audit trail
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuditFailure {
    pub kind: ChangeKind,
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub user_id: UserId,
    pub reason: String,
}

/// Writes the audit trail
///
/// Recording is best-effort: it runs after the primary write, outside of its transaction, and
/// never reports back to the caller. Failures are logged and, if a feed was set with
/// `with_failure_feed`, announced there.
#[derive(Clone)]
pub struct ChangeRecorder {
    audit: Arc<dyn AuditStore>,
    failures: Option<mpsc::UnboundedSender<AuditFailure>>,
}

impl ChangeRecorder {
    pub fn new(audit: Arc<dyn AuditStore>) -> ChangeRecorder {
        ChangeRecorder {
            audit,
            failures: None,
        }
    }

    pub fn with_failure_feed(mut self, feed: mpsc::UnboundedSender<AuditFailure>) -> Self {
        self.failures = Some(feed);
        self
    }

    pub async fn added(&self, entity_type: EntityType, entity_id: i64, user_id: UserId) {
        self.record(ChangeKind::Add, entity_type, entity_id, user_id, None)
            .await
    }

    pub async fn edited(
        &self,
        entity_type: EntityType,
        entity_id: i64,
        user_id: UserId,
        revision: Revision,
    ) {
        self.record(
            ChangeKind::Edit,
            entity_type,
            entity_id,
            user_id,
            Some(revision),
        )
        .await
    }

    pub async fn deleted(&self, entity_type: EntityType, entity_id: i64, user_id: UserId) {
        self.record(ChangeKind::Delete, entity_type, entity_id, user_id, None)
            .await
    }

    async fn record(
        &self,
        kind: ChangeKind,
        entity_type: EntityType,
        entity_id: i64,
        user_id: UserId,
        revision: Option<Revision>,
    ) {
        let res = self
            .try_record(kind, entity_type, entity_id, user_id, revision)
            .await;
        if let Err(err) = res {
            tracing::error!(
                ?err,
                ?kind,
                %entity_type,
                entity_id,
                %user_id,
                "dropping audit record"
            );
            if let Some(feed) = &self.failures {
                // a closed feed only means nobody listens anymore
                let _ = feed.send(AuditFailure {
                    kind,
                    entity_type,
                    entity_id,
                    user_id,
                    reason: format!("{err:#}"),
                });
            }
        }
    }

    async fn try_record(
        &self,
        kind: ChangeKind,
        entity_type: EntityType,
        entity_id: i64,
        user_id: UserId,
        revision: Option<Revision>,
    ) -> anyhow::Result<()> {
        let action = ChangeAction::resolve(entity_type, kind)
            .ok_or_else(|| anyhow!("no audit action for {kind:?} on {entity_type}"))?;
        let diff = match revision {
            None => String::new(),
            Some(r) => {
                anyhow::ensure!(
                    r.entity_type() == entity_type,
                    "revision of a {} recorded as an edit of {entity_type} {entity_id}",
                    r.entity_type(),
                );
                r.serialized_diff()?
            }
        };
        let stored = self
            .audit
            .add(NewChangeLogRecord {
                action,
                user_id,
                entity_type,
                entity_id,
                diff,
            })
            .await
            .with_context(|| format!("storing {action:?} for {entity_type} {entity_id}"))?;
        anyhow::ensure!(stored, "audit store refused {action:?} for {entity_type} {entity_id}");
        Ok(())
    }
}
