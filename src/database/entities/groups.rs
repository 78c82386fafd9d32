use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use super::common_types::EntityKind;
use super::history::HistoryEntity;

/// A household or other unit of individuals, identified by `code`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub code: String,
    pub json_ext: Option<Json>,
    pub version: i32,
    pub is_deleted: bool,
    pub date_created: ChronoDateTimeUtc,
    pub date_updated: ChronoDateTimeUtc,
    pub user_created: Option<i32>,
    pub user_updated: Option<i32>,
    pub date_valid_from: ChronoDateTimeUtc,
    pub date_valid_to: Option<ChronoDateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_individuals::Entity")]
    GroupIndividuals,
}

impl Related<super::group_individuals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupIndividuals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn new(user_id: Option<i32>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Set(Uuid::new_v4()),
            json_ext: Set(None),
            version: Set(1),
            is_deleted: Set(false),
            date_created: Set(now),
            date_updated: Set(now),
            user_created: Set(user_id),
            user_updated: Set(user_id),
            date_valid_from: Set(now),
            date_valid_to: Set(None),
            ..Default::default()
        }
    }
}

impl HistoryEntity for Entity {
    const KIND: EntityKind = EntityKind::Group;

    fn id_column() -> Column {
        Column::Id
    }

    fn is_deleted_column() -> Column {
        Column::IsDeleted
    }

    fn date_created_column() -> Column {
        Column::DateCreated
    }

    fn date_valid_from_column() -> Column {
        Column::DateValidFrom
    }

    fn date_valid_to_column() -> Column {
        Column::DateValidTo
    }

    fn order_column(field: &str) -> Option<Column> {
        match field {
            "id" => Some(Column::Id),
            "code" => Some(Column::Code),
            "version" => Some(Column::Version),
            "date_created" => Some(Column::DateCreated),
            "date_updated" => Some(Column::DateUpdated),
            "date_valid_from" => Some(Column::DateValidFrom),
            "date_valid_to" => Some(Column::DateValidTo),
            _ => None,
        }
    }
}
