use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::auth::Actor;
use crate::database::entities::{mutation_logs, record_mutations, EntityKind, MutationStatus};
use crate::errors::{CoreError, CoreResult};

/// Client correlation data every mutation input carries.
#[derive(Clone, Debug, Default)]
pub struct MutationMeta {
    pub client_mutation_id: Option<String>,
    pub client_mutation_label: Option<String>,
}

/// A registry record created or changed by a mutation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TouchedRecord {
    pub kind: EntityKind,
    pub id: Uuid,
}

impl TouchedRecord {
    pub fn new(kind: EntityKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

/// Result reported to the client for a logged mutation.
#[derive(Clone, Debug)]
pub struct MutationOutcome {
    pub internal_id: Uuid,
    pub client_mutation_id: Option<String>,
    pub status: MutationStatus,
    pub error: Option<String>,
    pub record_ids: Vec<Uuid>,
}

#[derive(Clone, Debug)]
pub struct MutationLogService {
    db: DatabaseConnection,
}

impl MutationLogService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a received mutation.
    pub async fn begin(
        &self,
        mutation_name: &str,
        meta: &MutationMeta,
        actor: &Actor,
    ) -> CoreResult<mutation_logs::Model> {
        let log = mutation_logs::ActiveModel::new(
            mutation_name,
            meta.client_mutation_id.clone(),
            meta.client_mutation_label.clone(),
            actor.user_id,
        )
        .insert(&self.db)
        .await?;

        tracing::info!(
            mutation = mutation_name,
            internal_id = %log.id,
            client_mutation_id = ?log.client_mutation_id,
            "mutation received"
        );
        Ok(log)
    }

    /// Closes `log` with the outcome of the operation. Domain errors are
    /// recorded and reported in the outcome; anything else is recorded and
    /// returned as an error.
    pub async fn finish(
        &self,
        log: mutation_logs::Model,
        result: CoreResult<Vec<TouchedRecord>>,
    ) -> CoreResult<MutationOutcome> {
        let internal_id = log.id;
        let client_mutation_id = log.client_mutation_id.clone();
        let mutation_name = log.mutation_name.clone();
        let active: mutation_logs::ActiveModel = log.into();

        match result {
            Ok(records) => {
                for record in &records {
                    record_mutations::ActiveModel::link(internal_id, record.kind, record.id)
                        .insert(&self.db)
                        .await?;
                }
                active.mark_success().update(&self.db).await?;

                tracing::info!(
                    mutation = %mutation_name,
                    %internal_id,
                    records = records.len(),
                    "mutation succeeded"
                );
                Ok(MutationOutcome {
                    internal_id,
                    client_mutation_id,
                    status: MutationStatus::Success,
                    error: None,
                    record_ids: records.iter().map(|record| record.id).collect(),
                })
            }
            Err(err) if err.is_domain_error() => {
                tracing::error!(
                    mutation = %mutation_name,
                    %internal_id,
                    code = err.kind().code(),
                    "mutation failed: {}",
                    err
                );
                active.mark_error(err.to_string()).update(&self.db).await?;
                Ok(MutationOutcome {
                    internal_id,
                    client_mutation_id,
                    status: MutationStatus::Error,
                    error: Some(err.to_string()),
                    record_ids: Vec::new(),
                })
            }
            Err(err) => {
                tracing::error!(mutation = %mutation_name, %internal_id, "mutation aborted: {}", err);
                active.mark_error(err.to_string()).update(&self.db).await?;
                Err(err)
            }
        }
    }

    /// Logs submitted with `client_mutation_id` and the records each touched,
    /// most recent first.
    pub async fn find_by_client_mutation_id(
        &self,
        client_mutation_id: &str,
    ) -> CoreResult<Vec<(mutation_logs::Model, Vec<record_mutations::Model>)>> {
        let logs = mutation_logs::Entity::find()
            .filter(mutation_logs::Column::ClientMutationId.eq(client_mutation_id))
            .order_by_desc(mutation_logs::Column::RequestDateTime)
            .find_with_related(record_mutations::Entity)
            .all(&self.db)
            .await?;
        Ok(logs)
    }
}

/// Commits `txn` when `result` is `Ok`, rolls it back otherwise.
pub async fn commit_or_rollback<T>(txn: DatabaseTransaction, result: CoreResult<T>) -> CoreResult<T> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!("Rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

/// `CoreError` for ids that do not resolve to a live record.
pub fn missing(kind: EntityKind, id: Uuid) -> CoreError {
    CoreError::not_found(kind.as_str(), id.to_string())
}
