use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_graphql::dataloader::Loader;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::database::entities::{group_individuals, groups, individual_data_source_uploads, individuals};

// IndividualLoader - batch load individuals by id
#[derive(Clone)]
pub struct IndividualLoader {
    db: DatabaseConnection,
}

impl IndividualLoader {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl Loader<Uuid> for IndividualLoader {
    type Value = individuals::Model;
    type Error = Arc<DbErr>;

    fn load(
        &self,
        keys: &[Uuid],
    ) -> impl Future<Output = std::result::Result<HashMap<Uuid, Self::Value>, Self::Error>> + Send
    {
        let db = self.db.clone();
        let ids: Vec<Uuid> = keys.to_vec();

        async move {
            if ids.is_empty() {
                return Ok(HashMap::new());
            }

            let rows = individuals::Entity::find()
                .filter(individuals::Column::Id.is_in(ids))
                .all(&db)
                .await
                .map_err(Arc::new)?;

            Ok(rows.into_iter().map(|r| (r.id, r)).collect())
        }
    }
}

// GroupLoader - batch load groups by id
#[derive(Clone)]
pub struct GroupLoader {
    db: DatabaseConnection,
}

impl GroupLoader {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl Loader<Uuid> for GroupLoader {
    type Value = groups::Model;
    type Error = Arc<DbErr>;

    fn load(
        &self,
        keys: &[Uuid],
    ) -> impl Future<Output = std::result::Result<HashMap<Uuid, Self::Value>, Self::Error>> + Send
    {
        let db = self.db.clone();
        let ids: Vec<Uuid> = keys.to_vec();

        async move {
            if ids.is_empty() {
                return Ok(HashMap::new());
            }

            let rows = groups::Entity::find()
                .filter(groups::Column::Id.is_in(ids))
                .all(&db)
                .await
                .map_err(Arc::new)?;

            Ok(rows.into_iter().map(|r| (r.id, r)).collect())
        }
    }
}

// UploadLoader - batch load data source uploads by id
#[derive(Clone)]
pub struct UploadLoader {
    db: DatabaseConnection,
}

impl UploadLoader {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl Loader<Uuid> for UploadLoader {
    type Value = individual_data_source_uploads::Model;
    type Error = Arc<DbErr>;

    fn load(
        &self,
        keys: &[Uuid],
    ) -> impl Future<Output = std::result::Result<HashMap<Uuid, Self::Value>, Self::Error>> + Send
    {
        let db = self.db.clone();
        let ids: Vec<Uuid> = keys.to_vec();

        async move {
            if ids.is_empty() {
                return Ok(HashMap::new());
            }

            let rows = individual_data_source_uploads::Entity::find()
                .filter(individual_data_source_uploads::Column::Id.is_in(ids))
                .all(&db)
                .await
                .map_err(Arc::new)?;

            Ok(rows.into_iter().map(|r| (r.id, r)).collect())
        }
    }
}

/// Key of a membership lookup: by group or by individual.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MembershipKey {
    Group(Uuid),
    Individual(Uuid),
}

// MembershipLoader - live memberships of groups or individuals, oldest first
#[derive(Clone)]
pub struct MembershipLoader {
    db: DatabaseConnection,
}

impl MembershipLoader {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl Loader<MembershipKey> for MembershipLoader {
    type Value = Vec<group_individuals::Model>;
    type Error = Arc<DbErr>;

    fn load(
        &self,
        keys: &[MembershipKey],
    ) -> impl Future<Output = std::result::Result<HashMap<MembershipKey, Self::Value>, Self::Error>>
           + Send {
        let db = self.db.clone();
        let keys: Vec<MembershipKey> = keys.to_vec();

        async move {
            let group_ids: Vec<Uuid> = keys
                .iter()
                .filter_map(|key| match key {
                    MembershipKey::Group(id) => Some(*id),
                    MembershipKey::Individual(_) => None,
                })
                .collect();
            let individual_ids: Vec<Uuid> = keys
                .iter()
                .filter_map(|key| match key {
                    MembershipKey::Individual(id) => Some(*id),
                    MembershipKey::Group(_) => None,
                })
                .collect();

            let mut result: HashMap<MembershipKey, Self::Value> =
                keys.iter().map(|key| (*key, Vec::new())).collect();

            if !group_ids.is_empty() {
                let rows = group_individuals::Entity::find()
                    .filter(group_individuals::Column::GroupId.is_in(group_ids))
                    .filter(group_individuals::Column::IsDeleted.eq(false))
                    .order_by_asc(group_individuals::Column::DateCreated)
                    .all(&db)
                    .await
                    .map_err(Arc::new)?;
                for row in rows {
                    result
                        .entry(MembershipKey::Group(row.group_id))
                        .or_default()
                        .push(row);
                }
            }

            if !individual_ids.is_empty() {
                let rows = group_individuals::Entity::find()
                    .filter(group_individuals::Column::IndividualId.is_in(individual_ids))
                    .filter(group_individuals::Column::IsDeleted.eq(false))
                    .order_by_asc(group_individuals::Column::DateCreated)
                    .all(&db)
                    .await
                    .map_err(Arc::new)?;
                for row in rows {
                    result
                        .entry(MembershipKey::Individual(row.individual_id))
                        .or_default()
                        .push(row);
                }
            }

            Ok(result)
        }
    }
}
