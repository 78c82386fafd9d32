use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use super::common_types::MutationStatus;

/// Audit record of a GraphQL mutation and its outcome.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mutation_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_mutation_id: Option<String>,
    pub client_mutation_label: Option<String>,
    pub mutation_name: String,
    pub status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub error: Option<String>,
    pub user_id: Option<i32>,
    pub request_date_time: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::record_mutations::Entity")]
    RecordMutations,
}

impl Related<super::record_mutations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecordMutations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn new(
        mutation_name: impl Into<String>,
        client_mutation_id: Option<String>,
        client_mutation_label: Option<String>,
        user_id: Option<i32>,
    ) -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            client_mutation_id: Set(client_mutation_id),
            client_mutation_label: Set(client_mutation_label),
            mutation_name: Set(mutation_name.into()),
            status: Set(MutationStatus::Received.as_str().to_string()),
            error: Set(None),
            user_id: Set(user_id),
            request_date_time: Set(chrono::Utc::now()),
        }
    }

    pub fn mark_success(mut self) -> Self {
        self.status = Set(MutationStatus::Success.as_str().to_string());
        self.error = Set(None);
        self
    }

    pub fn mark_error(mut self, message: String) -> Self {
        self.status = Set(MutationStatus::Error.as_str().to_string());
        self.error = Set(Some(message));
        self
    }
}

impl Model {
    pub fn get_status(&self) -> MutationStatus {
        self.status.parse().unwrap_or(MutationStatus::Received)
    }
}
