use async_graphql::dataloader::DataLoader;
use async_graphql::*;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::database::entities::individuals;
use crate::graphql::errors::StructuredError;
use crate::graphql::loaders::{MembershipKey, MembershipLoader};
use crate::graphql::types::GroupIndividual;

#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex)]
pub struct Individual {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub json_ext: Option<serde_json::Value>,
    pub version: i32,
    pub is_deleted: bool,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
    pub user_created: Option<i32>,
    pub user_updated: Option<i32>,
    pub date_valid_from: DateTime<Utc>,
    pub date_valid_to: Option<DateTime<Utc>>,
}

impl From<individuals::Model> for Individual {
    fn from(model: individuals::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            dob: model.dob,
            json_ext: model.json_ext,
            version: model.version,
            is_deleted: model.is_deleted,
            date_created: model.date_created,
            date_updated: model.date_updated,
            user_created: model.user_created,
            user_updated: model.user_updated,
            date_valid_from: model.date_valid_from,
            date_valid_to: model.date_valid_to,
        }
    }
}

#[ComplexObject]
impl Individual {
    /// Active group memberships of this individual.
    async fn groups(&self, ctx: &Context<'_>) -> Result<Vec<GroupIndividual>> {
        let loader = ctx.data::<DataLoader<MembershipLoader>>()?;
        let memberships = loader
            .load_one(MembershipKey::Individual(self.id))
            .await
            .map_err(|e| StructuredError::internal(format!("Failed to load memberships: {}", e)))?
            .unwrap_or_default();

        Ok(memberships.into_iter().map(GroupIndividual::from).collect())
    }
}
