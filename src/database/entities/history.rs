use sea_orm::EntityTrait;

use super::common_types::EntityKind;

/// Columns shared by every registry table (soft delete, audit and validity
/// window). Filter and ordering helpers are written against this trait so
/// the five registry queries share one implementation.
pub trait HistoryEntity: EntityTrait {
    const KIND: EntityKind;

    fn id_column() -> Self::Column;
    fn is_deleted_column() -> Self::Column;
    fn date_created_column() -> Self::Column;
    fn date_valid_from_column() -> Self::Column;
    fn date_valid_to_column() -> Self::Column;

    /// Column an `orderBy` entry may sort on, by snake_case field name.
    fn order_column(field: &str) -> Option<Self::Column>;
}
