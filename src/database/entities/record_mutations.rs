use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use super::common_types::EntityKind;

/// Link between a logged mutation and a registry record it touched.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "record_mutations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub mutation_id: Uuid,
    pub entity_type: String,
    pub record_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mutation_logs::Entity",
        from = "Column::MutationId",
        to = "super::mutation_logs::Column::Id",
        on_delete = "Cascade"
    )]
    MutationLogs,
}

impl Related<super::mutation_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MutationLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn link(mutation_id: Uuid, kind: EntityKind, record_id: Uuid) -> Self {
        Self {
            mutation_id: Set(mutation_id),
            entity_type: Set(kind.as_str().to_string()),
            record_id: Set(record_id),
            ..Default::default()
        }
    }
}
