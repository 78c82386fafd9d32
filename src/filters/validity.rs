use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, Condition};

use crate::database::entities::HistoryEntity;

/// Date-effective arguments accepted by every registry query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidityArgs {
    pub apply_default_validity_filter: bool,
    pub date_valid_from_gte: Option<DateTime<Utc>>,
    pub date_valid_to_lte: Option<DateTime<Utc>>,
}

/// Starting filter list of every registry query.
///
/// Explicit bounds win: when either bound is supplied only the bounds are
/// applied. Without bounds, `apply_default_validity_filter` restricts the
/// result to live records valid at `now`; otherwise nothing is filtered.
pub fn append_validity_filter<E: HistoryEntity>(
    args: &ValidityArgs,
    now: DateTime<Utc>,
) -> Vec<Condition> {
    let mut filters = Vec::new();

    if args.date_valid_from_gte.is_none() && args.date_valid_to_lte.is_none() {
        if args.apply_default_validity_filter {
            filters.extend(filter_validity::<E>(now));
        }
        return filters;
    }

    if let Some(from) = args.date_valid_from_gte {
        filters.push(Condition::all().add(E::date_valid_from_column().gte(from)));
    }
    if let Some(to) = args.date_valid_to_lte {
        filters.push(Condition::all().add(E::date_valid_to_column().lte(to)));
    }
    filters
}

/// Live records whose validity window contains `at`.
pub fn filter_validity<E: HistoryEntity>(at: DateTime<Utc>) -> Vec<Condition> {
    vec![
        Condition::all().add(E::is_deleted_column().eq(false)),
        Condition::all().add(E::date_valid_from_column().lte(at)),
        Condition::any()
            .add(E::date_valid_to_column().is_null())
            .add(E::date_valid_to_column().gte(at)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entities::individuals;

    #[test]
    fn test_no_arguments_adds_nothing() {
        let filters = append_validity_filter::<individuals::Entity>(&ValidityArgs::default(), Utc::now());
        assert!(filters.is_empty());
    }

    #[test]
    fn test_default_validity_filter() {
        let args = ValidityArgs {
            apply_default_validity_filter: true,
            ..Default::default()
        };
        let filters = append_validity_filter::<individuals::Entity>(&args, Utc::now());
        assert_eq!(filters.len(), 3);
    }

    #[test]
    fn test_explicit_bounds_replace_default_filter() {
        let args = ValidityArgs {
            apply_default_validity_filter: true,
            date_valid_from_gte: Some(Utc::now()),
            date_valid_to_lte: None,
        };
        let filters = append_validity_filter::<individuals::Entity>(&args, Utc::now());
        assert_eq!(filters.len(), 1);
    }
}
