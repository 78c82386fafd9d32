use sea_orm::{Order, QueryOrder, Select};

use crate::database::entities::HistoryEntity;
use crate::errors::{CoreError, CoreResult};

/// One `orderBy` entry: `"lastName"` ascending, `"-lastName"` descending.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderField {
    pub field: String,
    pub descending: bool,
}

impl OrderField {
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let raw = raw.trim();
        let (descending, name) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };

        if name.is_empty() {
            return Err(CoreError::invalid_field("orderBy", "empty field name"));
        }

        Ok(Self {
            field: to_snake_case(name),
            descending,
        })
    }
}

/// `dateCreated` -> `date_created`; snake_case input is returned unchanged.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

pub fn parse_order_by(values: &[String]) -> CoreResult<Vec<OrderField>> {
    values.iter().map(|value| OrderField::parse(value)).collect()
}

/// Applies `order`, or newest-first when empty. The primary key is always
/// the final tie-breaker so pagination is stable.
pub fn apply_ordering<E: HistoryEntity>(
    mut select: Select<E>,
    order: &[OrderField],
) -> CoreResult<Select<E>> {
    if order.is_empty() {
        select = select.order_by(E::date_created_column(), Order::Desc);
    }

    for field in order {
        let column = E::order_column(&field.field).ok_or_else(|| {
            CoreError::invalid_field(
                "orderBy",
                format!("cannot order {} by '{}'", E::KIND, field.field),
            )
        })?;
        let direction = if field.descending {
            Order::Desc
        } else {
            Order::Asc
        };
        select = select.order_by(column, direction);
    }

    Ok(select.order_by(E::id_column(), Order::Asc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entities::individuals;
    use sea_orm::{DbBackend, EntityTrait, QueryTrait};

    #[test]
    fn test_parse_direction_and_case() {
        let fields = parse_order_by(&["-dateCreated".to_string(), "last_name".to_string()]).unwrap();
        assert_eq!(
            fields,
            vec![
                OrderField {
                    field: "date_created".to_string(),
                    descending: true
                },
                OrderField {
                    field: "last_name".to_string(),
                    descending: false
                },
            ]
        );
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let order = parse_order_by(&["shoeSize".to_string()]).unwrap();
        let result = apply_ordering(individuals::Entity::find(), &order);
        assert!(result.is_err());
    }

    #[test]
    fn test_ordering_sql() {
        let order = parse_order_by(&["-lastName".to_string()]).unwrap();
        let sql = apply_ordering(individuals::Entity::find(), &order)
            .unwrap()
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(sql.contains(r#"ORDER BY "individuals"."last_name" DESC, "individuals"."id" ASC"#));
    }
}
