//! Predicate builders shared by the registry queries.

pub mod custom;
pub mod lookups;
pub mod ordering;
pub mod validity;

pub use custom::{
    CustomFilter, CustomFilterDefinition, CustomFilterRegistry, CustomFilterWizard,
    JsonExtFilterWizard, Lookup, ValueType,
};
pub use ordering::{apply_ordering, parse_order_by, OrderField};
pub use validity::{append_validity_filter, filter_validity, ValidityArgs};

use sea_orm::sea_query::{Expr, Query};
use sea_orm::{ColumnTrait, Condition};

use crate::database::entities::{mutation_logs, record_mutations, HistoryEntity};

/// Records of `E` linked to a mutation submitted with `client_mutation_id`.
pub fn client_mutation_filter<E: HistoryEntity>(client_mutation_id: &str) -> Condition {
    let linked_records = Query::select()
        .column((record_mutations::Entity, record_mutations::Column::RecordId))
        .from(record_mutations::Entity)
        .inner_join(
            mutation_logs::Entity,
            Expr::col((mutation_logs::Entity, mutation_logs::Column::Id))
                .equals((record_mutations::Entity, record_mutations::Column::MutationId)),
        )
        .and_where(mutation_logs::Column::ClientMutationId.eq(client_mutation_id))
        .and_where(record_mutations::Column::EntityType.eq(E::KIND.as_str()))
        .to_owned();

    Condition::all().add(E::id_column().in_subquery(linked_records))
}

/// AND of every condition in `filters`.
pub fn all_of(filters: Vec<Condition>) -> Condition {
    filters
        .into_iter()
        .fold(Condition::all(), |acc, filter| acc.add(filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entities::individuals;
    use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait};

    #[test]
    fn test_client_mutation_filter_sql() {
        let sql = individuals::Entity::find()
            .filter(client_mutation_filter::<individuals::Entity>("cm-1"))
            .build(DbBackend::Sqlite)
            .to_string();

        assert!(sql.contains(r#""individuals"."id" IN (SELECT"#), "{}", sql);
        assert!(sql.contains("'cm-1'"), "{}", sql);
        assert!(sql.contains("'individual'"), "{}", sql);
    }
}
