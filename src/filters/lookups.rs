use sea_orm::sea_query::{Alias, Expr, Func, LikeExpr, SimpleExpr};

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn like_pattern(prefix: &str, value: &str, suffix: &str) -> LikeExpr {
    LikeExpr::new(format!("{}{}{}", prefix, escape_like(value), suffix)).escape('\\')
}

/// `expr` contains `value`, ignoring case.
pub fn icontains(expr: impl Into<SimpleExpr>, value: &str) -> SimpleExpr {
    Expr::expr(Func::lower(expr.into())).like(like_pattern("%", &value.to_lowercase(), "%"))
}

/// Case-sensitive substring match. SQLite's `LIKE` folds ASCII case, so
/// this goes through `instr`.
pub fn contains(expr: impl Into<SimpleExpr>, value: &str) -> SimpleExpr {
    Expr::expr(
        Func::cust(Alias::new("instr"))
            .arg(expr.into())
            .arg(value.to_string()),
    )
    .gt(0)
}

pub fn istartswith(expr: impl Into<SimpleExpr>, value: &str) -> SimpleExpr {
    Expr::expr(Func::lower(expr.into())).like(like_pattern("", &value.to_lowercase(), "%"))
}

/// Case-sensitive prefix match on the first `value.chars().count()`
/// characters.
pub fn startswith(expr: impl Into<SimpleExpr>, value: &str) -> SimpleExpr {
    let length = value.chars().count() as i64;
    Expr::expr(
        Func::cust(Alias::new("substr"))
            .arg(expr.into())
            .arg(1)
            .arg(length),
    )
    .eq(value.to_string())
}

pub fn iexact(expr: impl Into<SimpleExpr>, value: &str) -> SimpleExpr {
    Expr::expr(Func::lower(expr.into())).eq(value.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::{Query, SqliteQueryBuilder};

    fn where_sql(condition: SimpleExpr) -> String {
        Query::select()
            .column(Alias::new("name"))
            .from(Alias::new("people"))
            .and_where(condition)
            .to_string(SqliteQueryBuilder)
    }

    #[test]
    fn test_case_sensitive_lookups_avoid_like() {
        let sql = where_sql(contains(Expr::col(Alias::new("name")), "Ab"));
        assert!(sql.contains(r#"instr("name", 'Ab') > 0"#), "{}", sql);
        assert!(!sql.contains("LIKE"), "{}", sql);

        let sql = where_sql(startswith(Expr::col(Alias::new("name")), "Ñu"));
        assert!(sql.contains(r#"substr("name", 1, 2) = 'Ñu'"#), "{}", sql);
        assert!(!sql.contains("LIKE"), "{}", sql);
    }

    #[test]
    fn test_like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("plain"), "plain");
    }
}
