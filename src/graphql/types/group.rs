use async_graphql::dataloader::DataLoader;
use async_graphql::*;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::entities::{groups, GroupRole};
use crate::graphql::errors::StructuredError;
use crate::graphql::loaders::{IndividualLoader, MembershipKey, MembershipLoader};
use crate::graphql::types::{GroupIndividual, Individual};

#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex)]
pub struct Group {
    pub id: Uuid,
    pub code: String,
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

impl From<groups::Model> for Group {
    fn from(model: groups::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
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
impl Group {
    /// Active memberships of the group.
    async fn members(&self, ctx: &Context<'_>) -> Result<Vec<GroupIndividual>> {
        let loader = ctx.data::<DataLoader<MembershipLoader>>()?;
        let memberships = loader
            .load_one(MembershipKey::Group(self.id))
            .await
            .map_err(|e| StructuredError::internal(format!("Failed to load members: {}", e)))?
            .unwrap_or_default();

        Ok(memberships.into_iter().map(GroupIndividual::from).collect())
    }

    /// The member with role HEAD, if any.
    async fn head(&self, ctx: &Context<'_>) -> Result<Option<Individual>> {
        let memberships = ctx
            .data::<DataLoader<MembershipLoader>>()?
            .load_one(MembershipKey::Group(self.id))
            .await
            .map_err(|e| StructuredError::internal(format!("Failed to load members: {}", e)))?
            .unwrap_or_default();

        let Some(head) = memberships
            .iter()
            .find(|membership| membership.get_role() == Some(GroupRole::Head))
        else {
            return Ok(None);
        };

        let individual = ctx
            .data::<DataLoader<IndividualLoader>>()?
            .load_one(head.individual_id)
            .await
            .map_err(|e| StructuredError::internal(format!("Failed to load individual: {}", e)))?;

        Ok(individual.map(Individual::from))
    }
}
