use async_graphql::dataloader::DataLoader;
use async_graphql::*;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::entities::{group_individuals, GroupRole, RecipientType};
use crate::graphql::errors::StructuredError;
use crate::graphql::loaders::{GroupLoader, IndividualLoader};
use crate::graphql::types::{Group, Individual};

#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex)]
pub struct GroupIndividual {
    pub id: Uuid,
    pub group_id: Uuid,
    pub individual_id: Uuid,
    pub role: Option<GroupRole>,
    pub recipient_type: Option<RecipientType>,
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

impl From<group_individuals::Model> for GroupIndividual {
    fn from(model: group_individuals::Model) -> Self {
        Self {
            role: model.get_role(),
            recipient_type: model.get_recipient_type(),
            id: model.id,
            group_id: model.group_id,
            individual_id: model.individual_id,
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
impl GroupIndividual {
    async fn group(&self, ctx: &Context<'_>) -> Result<Option<Group>> {
        let group = ctx
            .data::<DataLoader<GroupLoader>>()?
            .load_one(self.group_id)
            .await
            .map_err(|e| StructuredError::internal(format!("Failed to load group: {}", e)))?;
        Ok(group.map(Group::from))
    }

    async fn individual(&self, ctx: &Context<'_>) -> Result<Option<Individual>> {
        let individual = ctx
            .data::<DataLoader<IndividualLoader>>()?
            .load_one(self.individual_id)
            .await
            .map_err(|e| StructuredError::internal(format!("Failed to load individual: {}", e)))?;
        Ok(individual.map(Individual::from))
    }
}
