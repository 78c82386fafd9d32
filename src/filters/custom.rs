//! Pluggable `customFilters`.
//!
//! A custom filter is a string `field__lookup__type=value`, for example
//! `number_of_children__gte__integer=2`. Wizards registered per
//! `(module_name, object_type)` turn a list of them into a condition.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::sea_query::{Alias, Expr, Func, SimpleExpr};
use sea_orm::Condition;
use serde::Serialize;

use super::lookups;
use crate::config::CustomFilterConfig;
use crate::errors::{CoreError, CoreResult};

static FILTER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<field>[A-Za-z_][A-Za-z0-9_]*)__(?P<lookup>[a-z]+)__(?P<kind>[a-z]+)=(?P<value>.*)$")
        .expect("custom filter pattern is valid")
});

pub const SOCIAL_PROTECTION_MODULE: &str = "social_protection";
pub const BENEFIT_PLAN_OBJECT: &str = "BenefitPlan";
pub const BENEFICIARY_RELATION: &str = "beneficiary";
pub const GROUP_BENEFICIARY_RELATION: &str = "group_beneficiary";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lookup {
    Exact,
    Iexact,
    Contains,
    Icontains,
    Startswith,
    Istartswith,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Lookup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lookup::Exact => "exact",
            Lookup::Iexact => "iexact",
            Lookup::Contains => "contains",
            Lookup::Icontains => "icontains",
            Lookup::Startswith => "startswith",
            Lookup::Istartswith => "istartswith",
            Lookup::Gt => "gt",
            Lookup::Gte => "gte",
            Lookup::Lt => "lt",
            Lookup::Lte => "lte",
        }
    }
}

impl FromStr for Lookup {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Lookup::Exact),
            "iexact" => Ok(Lookup::Iexact),
            "contains" => Ok(Lookup::Contains),
            "icontains" => Ok(Lookup::Icontains),
            "startswith" => Ok(Lookup::Startswith),
            "istartswith" => Ok(Lookup::Istartswith),
            "gt" => Ok(Lookup::Gt),
            "gte" => Ok(Lookup::Gte),
            "lt" => Ok(Lookup::Lt),
            "lte" => Ok(Lookup::Lte),
            other => Err(CoreError::invalid_field(
                "customFilters",
                format!("unknown lookup '{}'", other),
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Integer,
    Numeric,
    String,
    Boolean,
    Date,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Integer => "integer",
            ValueType::Numeric => "numeric",
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::Date => "date",
        }
    }

    /// Lookups that make sense for values of this type.
    pub fn lookups(&self) -> &'static [Lookup] {
        match self {
            ValueType::Integer | ValueType::Numeric | ValueType::Date => &[
                Lookup::Exact,
                Lookup::Gt,
                Lookup::Gte,
                Lookup::Lt,
                Lookup::Lte,
            ],
            ValueType::String => &[
                Lookup::Exact,
                Lookup::Iexact,
                Lookup::Contains,
                Lookup::Icontains,
                Lookup::Startswith,
                Lookup::Istartswith,
            ],
            ValueType::Boolean => &[Lookup::Exact],
        }
    }
}

impl FromStr for ValueType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "integer" => Ok(ValueType::Integer),
            "numeric" | "decimal" | "float" => Ok(ValueType::Numeric),
            "string" => Ok(ValueType::String),
            "boolean" => Ok(ValueType::Boolean),
            "date" => Ok(ValueType::Date),
            other => Err(CoreError::invalid_field(
                "customFilters",
                format!("unknown value type '{}'", other),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
    Integer(i64),
    Numeric(f64),
    String(String),
    Boolean(bool),
    Date(NaiveDate),
}

/// A parsed `field__lookup__type=value` string.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomFilter {
    pub field: String,
    pub lookup: Lookup,
    pub value_type: ValueType,
    pub value: FilterValue,
}

impl CustomFilter {
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let captures = FILTER_PATTERN.captures(raw.trim()).ok_or_else(|| {
            CoreError::invalid_field(
                "customFilters",
                format!("'{}' is not of the form field__lookup__type=value", raw),
            )
        })?;

        let field = captures["field"].to_string();
        let lookup: Lookup = captures["lookup"].parse()?;
        let value_type: ValueType = captures["kind"].parse()?;

        if !value_type.lookups().contains(&lookup) {
            return Err(CoreError::invalid_field(
                "customFilters",
                format!(
                    "lookup '{}' is not supported for {} values",
                    lookup.as_str(),
                    value_type.as_str()
                ),
            ));
        }

        let value = parse_value(value_type, &captures["value"])?;

        Ok(Self {
            field,
            lookup,
            value_type,
            value,
        })
    }

    /// Predicate over the `field` attribute of the JSON column `json_column`.
    pub fn to_condition(&self, json_column: SimpleExpr) -> SimpleExpr {
        let attribute: SimpleExpr = Func::cust(Alias::new("json_extract"))
            .arg(json_column)
            .arg(format!("$.{}", self.field))
            .into();

        match &self.value {
            FilterValue::Integer(v) => {
                compare(Func::cast_as(attribute, Alias::new("INTEGER")).into(), self.lookup, *v)
            }
            FilterValue::Numeric(v) => {
                compare(Func::cast_as(attribute, Alias::new("REAL")).into(), self.lookup, *v)
            }
            FilterValue::Date(v) => compare(attribute, self.lookup, v.format("%Y-%m-%d").to_string()),
            FilterValue::Boolean(v) => Expr::expr(attribute).eq(i64::from(*v)),
            FilterValue::String(v) => match self.lookup {
                Lookup::Iexact => lookups::iexact(attribute, v),
                Lookup::Contains => lookups::contains(attribute, v),
                Lookup::Icontains => lookups::icontains(attribute, v),
                Lookup::Startswith => lookups::startswith(attribute, v),
                Lookup::Istartswith => lookups::istartswith(attribute, v),
                _ => Expr::expr(attribute).eq(v.clone()),
            },
        }
    }
}

fn compare<V>(expr: SimpleExpr, lookup: Lookup, value: V) -> SimpleExpr
where
    V: Into<SimpleExpr>,
{
    let expr = Expr::expr(expr);
    match lookup {
        Lookup::Gt => expr.gt(value),
        Lookup::Gte => expr.gte(value),
        Lookup::Lt => expr.lt(value),
        Lookup::Lte => expr.lte(value),
        _ => expr.eq(value),
    }
}

fn parse_value(value_type: ValueType, raw: &str) -> CoreResult<FilterValue> {
    let invalid = || {
        CoreError::invalid_field(
            "customFilters",
            format!("'{}' is not a valid {} value", raw, value_type.as_str()),
        )
    };

    match value_type {
        ValueType::Integer => raw.parse().map(FilterValue::Integer).map_err(|_| invalid()),
        ValueType::Numeric => raw.parse().map(FilterValue::Numeric).map_err(|_| invalid()),
        ValueType::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(FilterValue::Date)
            .map_err(|_| invalid()),
        ValueType::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(FilterValue::Boolean(true)),
            "false" | "0" => Ok(FilterValue::Boolean(false)),
            _ => Err(invalid()),
        },
        ValueType::String => Ok(FilterValue::String(raw.trim_matches('"').to_string())),
    }
}

/// A field a wizard can filter on, with the lookups its type allows.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CustomFilterDefinition {
    pub field: String,
    pub value_type: ValueType,
    pub lookups: Vec<Lookup>,
}

impl CustomFilterDefinition {
    pub fn new(field: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            field: field.into(),
            value_type,
            lookups: value_type.lookups().to_vec(),
        }
    }
}

/// Builds conditions for the custom filters of one module object.
pub trait CustomFilterWizard: Send + Sync {
    fn module_name(&self) -> &str;

    fn object_type(&self) -> &str;

    fn load_definition(&self) -> Vec<CustomFilterDefinition>;

    fn build_condition(
        &self,
        filters: &[String],
        json_column: SimpleExpr,
        relation: Option<&str>,
    ) -> CoreResult<Condition>;
}

/// Filters on attributes of a `json_ext` column. With a non-empty
/// definition only the defined fields, with their declared type, are
/// accepted.
pub struct JsonExtFilterWizard {
    module_name: String,
    object_type: String,
    definitions: Vec<CustomFilterDefinition>,
}

impl JsonExtFilterWizard {
    pub fn new(
        module_name: impl Into<String>,
        object_type: impl Into<String>,
        definitions: Vec<CustomFilterDefinition>,
    ) -> Self {
        Self {
            module_name: module_name.into(),
            object_type: object_type.into(),
            definitions,
        }
    }

    pub fn from_config(config: &CustomFilterConfig) -> CoreResult<Self> {
        let definitions = config
            .fields
            .iter()
            .map(|field| {
                let value_type: ValueType = field.value_type.parse()?;
                Ok(CustomFilterDefinition::new(field.field.clone(), value_type))
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Self::new(
            config.module_name.clone(),
            config.object_type.clone(),
            definitions,
        ))
    }

    fn check_defined(&self, filter: &CustomFilter) -> CoreResult<()> {
        if self.definitions.is_empty() {
            return Ok(());
        }

        match self.definitions.iter().find(|d| d.field == filter.field) {
            Some(definition) if definition.value_type == filter.value_type => Ok(()),
            Some(definition) => Err(CoreError::invalid_field(
                "customFilters",
                format!(
                    "field '{}' is of type {}",
                    filter.field,
                    definition.value_type.as_str()
                ),
            )),
            None => Err(CoreError::invalid_field(
                "customFilters",
                format!("field '{}' cannot be filtered", filter.field),
            )),
        }
    }
}

impl CustomFilterWizard for JsonExtFilterWizard {
    fn module_name(&self) -> &str {
        &self.module_name
    }

    fn object_type(&self) -> &str {
        &self.object_type
    }

    fn load_definition(&self) -> Vec<CustomFilterDefinition> {
        self.definitions.clone()
    }

    fn build_condition(
        &self,
        filters: &[String],
        json_column: SimpleExpr,
        relation: Option<&str>,
    ) -> CoreResult<Condition> {
        let mut condition = Condition::all();
        for raw in filters {
            let filter = CustomFilter::parse(raw)?;
            self.check_defined(&filter)?;
            tracing::debug!(
                module = %self.module_name,
                object_type = %self.object_type,
                ?relation,
                field = %filter.field,
                lookup = filter.lookup.as_str(),
                "applying custom filter"
            );
            condition = condition.add(filter.to_condition(json_column.clone()));
        }
        Ok(condition)
    }
}

/// Wizards by `(module_name, object_type)`.
#[derive(Clone, Default)]
pub struct CustomFilterRegistry {
    wizards: HashMap<(String, String), Arc<dyn CustomFilterWizard>>,
}

impl fmt::Debug for CustomFilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFilterRegistry")
            .field("wizards", &self.wizards.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CustomFilterRegistry {
    /// Registers a JSON-extension wizard per configured object, plus an
    /// unrestricted one for the beneficiary filters of the individual
    /// query when none is configured.
    pub fn from_config(configs: &[CustomFilterConfig]) -> CoreResult<Self> {
        let mut registry = Self::default();
        for config in configs {
            registry.register(Arc::new(JsonExtFilterWizard::from_config(config)?));
        }

        if registry
            .wizard(SOCIAL_PROTECTION_MODULE, BENEFIT_PLAN_OBJECT)
            .is_none()
        {
            registry.register(Arc::new(JsonExtFilterWizard::new(
                SOCIAL_PROTECTION_MODULE,
                BENEFIT_PLAN_OBJECT,
                Vec::new(),
            )));
        }

        Ok(registry)
    }

    pub fn register(&mut self, wizard: Arc<dyn CustomFilterWizard>) {
        let key = (
            wizard.module_name().to_string(),
            wizard.object_type().to_string(),
        );
        self.wizards.insert(key, wizard);
    }

    pub fn wizard(&self, module_name: &str, object_type: &str) -> Option<&Arc<dyn CustomFilterWizard>> {
        self.wizards
            .get(&(module_name.to_string(), object_type.to_string()))
    }

    /// Condition for `filters`, or `None` when no wizard is registered for
    /// the object (the filters are then ignored).
    pub fn build_custom_filters(
        &self,
        module_name: &str,
        object_type: &str,
        filters: &[String],
        json_column: SimpleExpr,
        relation: Option<&str>,
    ) -> CoreResult<Option<Condition>> {
        if filters.is_empty() {
            return Ok(None);
        }

        match self.wizard(module_name, object_type) {
            Some(wizard) => wizard
                .build_condition(filters, json_column, relation)
                .map(Some),
            None => {
                tracing::warn!(
                    "No custom filter wizard for {}/{}, ignoring {} filter(s)",
                    module_name,
                    object_type,
                    filters.len()
                );
                Ok(None)
            }
        }
    }

    pub fn definitions(&self, module_name: &str, object_type: &str) -> Vec<CustomFilterDefinition> {
        self.wizard(module_name, object_type)
            .map(|wizard| wizard.load_definition())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CustomFilterFieldConfig;
    use crate::errors::CoreErrorKind;
    use sea_orm::sea_query::{Query, SqliteQueryBuilder};

    fn json_column() -> SimpleExpr {
        Expr::col(Alias::new("json_ext")).into()
    }

    fn render(condition: SimpleExpr) -> String {
        Query::select()
            .expr(Expr::val(1))
            .and_where(condition)
            .to_string(SqliteQueryBuilder)
    }

    #[test]
    fn test_parse_integer_filter() {
        let filter = CustomFilter::parse("number_of_children__gte__integer=2").unwrap();
        assert_eq!(filter.field, "number_of_children");
        assert_eq!(filter.lookup, Lookup::Gte);
        assert_eq!(filter.value, FilterValue::Integer(2));
    }

    #[test]
    fn test_malformed_filters_are_validation_errors() {
        for raw in [
            "no_separators",
            "field__gte__integer",
            "field__between__integer=1",
            "field__gte__colour=red",
            "field__icontains__integer=1",
            "age__gt__integer=old",
        ] {
            let err = CustomFilter::parse(raw).unwrap_err();
            assert_eq!(err.kind(), CoreErrorKind::Validation, "{}", raw);
        }
    }

    #[test]
    fn test_integer_condition_casts_json_attribute() {
        let filter = CustomFilter::parse("number_of_children__gte__integer=2").unwrap();
        let sql = render(filter.to_condition(json_column()));
        assert!(sql.contains("json_extract"), "{}", sql);
        assert!(sql.contains("$.number_of_children"), "{}", sql);
        assert!(sql.contains("CAST"), "{}", sql);
        assert!(sql.contains(">= 2"), "{}", sql);
    }

    #[test]
    fn test_configured_wizard_rejects_undefined_fields() {
        let config = CustomFilterConfig {
            module_name: "social_protection".to_string(),
            object_type: "BenefitPlan".to_string(),
            fields: vec![CustomFilterFieldConfig {
                field: "able_bodied".to_string(),
                value_type: "boolean".to_string(),
            }],
        };
        let registry = CustomFilterRegistry::from_config(&[config]).unwrap();

        let ok = registry.build_custom_filters(
            SOCIAL_PROTECTION_MODULE,
            BENEFIT_PLAN_OBJECT,
            &["able_bodied__exact__boolean=true".to_string()],
            json_column(),
            Some(BENEFICIARY_RELATION),
        );
        assert!(ok.unwrap().is_some());

        let err = registry
            .build_custom_filters(
                SOCIAL_PROTECTION_MODULE,
                BENEFIT_PLAN_OBJECT,
                &["income__gt__integer=5".to_string()],
                json_column(),
                None,
            )
            .unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Validation);
    }

    #[test]
    fn test_unknown_wizard_ignores_filters() {
        let registry = CustomFilterRegistry::from_config(&[]).unwrap();
        let result = registry
            .build_custom_filters(
                "other_module",
                "Thing",
                &["a__exact__integer=1".to_string()],
                json_column(),
                None,
            )
            .unwrap();
        assert!(result.is_none());
        assert!(registry.definitions("other_module", "Thing").is_empty());
    }
}
