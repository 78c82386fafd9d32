use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use super::common_types::EntityKind;
use super::history::HistoryEntity;

/// One raw row of an upload, optionally resolved to an individual.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "individual_data_sources")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub individual_id: Option<Uuid>,
    pub upload_id: Option<Uuid>,
    pub validations: Option<Json>,
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
    #[sea_orm(
        belongs_to = "super::individuals::Entity",
        from = "Column::IndividualId",
        to = "super::individuals::Column::Id"
    )]
    Individuals,
    #[sea_orm(
        belongs_to = "super::individual_data_source_uploads::Entity",
        from = "Column::UploadId",
        to = "super::individual_data_source_uploads::Column::Id"
    )]
    IndividualDataSourceUploads,
}

impl Related<super::individuals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Individuals.def()
    }
}

impl Related<super::individual_data_source_uploads::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IndividualDataSourceUploads.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn new(user_id: Option<i32>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Set(Uuid::new_v4()),
            individual_id: Set(None),
            upload_id: Set(None),
            validations: Set(None),
            json_ext: Set(None),
            version: Set(1),
            is_deleted: Set(false),
            date_created: Set(now),
            date_updated: Set(now),
            user_created: Set(user_id),
            user_updated: Set(user_id),
            date_valid_from: Set(now),
            date_valid_to: Set(None),
        }
    }
}

impl HistoryEntity for Entity {
    const KIND: EntityKind = EntityKind::IndividualDataSource;

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
            "date_created" => Some(Column::DateCreated),
            "date_updated" => Some(Column::DateUpdated),
            _ => None,
        }
    }
}
