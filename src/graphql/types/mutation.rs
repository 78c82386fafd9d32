use async_graphql::*;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::database::entities::{mutation_logs, record_mutations, GroupRole, MutationStatus, RecipientType};
use crate::services::{MutationMeta, MutationOutcome, NewMembership};

/// Outcome of a logged mutation.
#[derive(SimpleObject, Clone, Debug)]
pub struct MutationResult {
    pub client_mutation_id: Option<String>,
    /// Id of the mutation log entry.
    pub internal_id: Uuid,
    pub status: MutationStatus,
    pub error: Option<String>,
    pub record_ids: Vec<Uuid>,
}

impl From<MutationOutcome> for MutationResult {
    fn from(outcome: MutationOutcome) -> Self {
        Self {
            client_mutation_id: outcome.client_mutation_id,
            internal_id: outcome.internal_id,
            status: outcome.status,
            error: outcome.error,
            record_ids: outcome.record_ids,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct MutationLog {
    pub id: Uuid,
    pub client_mutation_id: Option<String>,
    pub client_mutation_label: Option<String>,
    pub mutation_name: String,
    pub status: MutationStatus,
    pub error: Option<String>,
    pub user_id: Option<i32>,
    pub request_date_time: DateTime<Utc>,
    pub record_ids: Vec<Uuid>,
}

impl From<(mutation_logs::Model, Vec<record_mutations::Model>)> for MutationLog {
    fn from((log, records): (mutation_logs::Model, Vec<record_mutations::Model>)) -> Self {
        Self {
            status: log.get_status(),
            id: log.id,
            client_mutation_id: log.client_mutation_id,
            client_mutation_label: log.client_mutation_label,
            mutation_name: log.mutation_name,
            error: log.error,
            user_id: log.user_id,
            request_date_time: log.request_date_time,
            record_ids: records.into_iter().map(|record| record.record_id).collect(),
        }
    }
}

fn meta(client_mutation_id: &Option<String>, client_mutation_label: &Option<String>) -> MutationMeta {
    MutationMeta {
        client_mutation_id: client_mutation_id.clone(),
        client_mutation_label: client_mutation_label.clone(),
    }
}

#[derive(InputObject)]
pub struct CreateIndividualInput {
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub json_ext: Option<serde_json::Value>,
    pub client_mutation_id: Option<String>,
    pub client_mutation_label: Option<String>,
}

#[derive(InputObject)]
pub struct UpdateIndividualInput {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub json_ext: Option<serde_json::Value>,
    pub client_mutation_id: Option<String>,
    pub client_mutation_label: Option<String>,
}

/// Soft delete of a list of records.
#[derive(InputObject)]
pub struct DeleteInput {
    pub ids: Vec<Uuid>,
    pub client_mutation_id: Option<String>,
    pub client_mutation_label: Option<String>,
}

#[derive(InputObject)]
pub struct CreateGroupInput {
    pub code: String,
    pub json_ext: Option<serde_json::Value>,
    pub client_mutation_id: Option<String>,
    pub client_mutation_label: Option<String>,
}

#[derive(InputObject)]
pub struct UpdateGroupInput {
    pub id: Uuid,
    pub code: Option<String>,
    pub json_ext: Option<serde_json::Value>,
    pub client_mutation_id: Option<String>,
    pub client_mutation_label: Option<String>,
}

#[derive(InputObject)]
pub struct AddIndividualToGroupInput {
    pub group_id: Uuid,
    pub individual_id: Uuid,
    pub role: Option<GroupRole>,
    pub recipient_type: Option<RecipientType>,
    pub json_ext: Option<serde_json::Value>,
    pub client_mutation_id: Option<String>,
    pub client_mutation_label: Option<String>,
}

#[derive(InputObject)]
pub struct EditIndividualInGroupInput {
    pub id: Uuid,
    pub role: Option<GroupRole>,
    pub recipient_type: Option<RecipientType>,
    pub json_ext: Option<serde_json::Value>,
    pub client_mutation_id: Option<String>,
    pub client_mutation_label: Option<String>,
}

#[derive(InputObject)]
pub struct GroupIndividualDataInput {
    pub individual_id: Uuid,
    pub role: Option<GroupRole>,
    pub recipient_type: Option<RecipientType>,
}

impl From<GroupIndividualDataInput> for NewMembership {
    fn from(input: GroupIndividualDataInput) -> Self {
        Self {
            individual_id: input.individual_id,
            role: input.role,
            recipient_type: input.recipient_type,
        }
    }
}

#[derive(InputObject)]
pub struct CreateGroupIndividualsInput {
    pub code: String,
    pub json_ext: Option<serde_json::Value>,
    pub individuals_data: Vec<GroupIndividualDataInput>,
    pub client_mutation_id: Option<String>,
    pub client_mutation_label: Option<String>,
}

macro_rules! impl_mutation_meta {
    ($($input:ty),* $(,)?) => {
        $(
            impl $input {
                pub fn meta(&self) -> MutationMeta {
                    meta(&self.client_mutation_id, &self.client_mutation_label)
                }
            }
        )*
    };
}

impl_mutation_meta!(
    CreateIndividualInput,
    UpdateIndividualInput,
    DeleteInput,
    CreateGroupInput,
    UpdateGroupInput,
    AddIndividualToGroupInput,
    EditIndividualInGroupInput,
    CreateGroupIndividualsInput,
);
