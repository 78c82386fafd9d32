use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use super::group_individual_service::{GroupIndividualQueryArgs, GroupIndividualService};
use super::group_service::{GroupQueryArgs, GroupService};
use super::individual_service::{IndividualQueryArgs, IndividualService};
use super::query::Page;
use crate::auth::Actor;
use crate::errors::CoreResult;
use crate::export::{flatten_json_ext, to_csv, ExportError};

/// Column selection for an export.
#[derive(Clone, Debug, Default)]
pub struct ExportOptions {
    pub fields: Vec<String>,
    /// JSON object mapping a field to its CSV header.
    pub fields_columns: Option<String>,
}

/// Exports the individual, group and membership queries as CSV, with
/// `json_ext` unfolded into columns.
#[derive(Clone, Debug)]
pub struct ExportService {
    individuals: IndividualService,
    groups: GroupService,
    memberships: GroupIndividualService,
}

impl ExportService {
    pub fn new(
        individuals: IndividualService,
        groups: GroupService,
        memberships: GroupIndividualService,
    ) -> Self {
        Self {
            individuals,
            groups,
            memberships,
        }
    }

    pub async fn export_individuals(
        &self,
        actor: &Actor,
        args: &IndividualQueryArgs,
        options: &ExportOptions,
    ) -> CoreResult<String> {
        let page = self.individuals.query(actor, args, Page::default()).await?;
        render_rows(&page.items, options)
    }

    pub async fn export_groups(
        &self,
        actor: &Actor,
        args: &GroupQueryArgs,
        options: &ExportOptions,
    ) -> CoreResult<String> {
        let page = self.groups.query(actor, args, Page::default()).await?;
        render_rows(&page.items, options)
    }

    pub async fn export_group_individuals(
        &self,
        actor: &Actor,
        args: &GroupIndividualQueryArgs,
        options: &ExportOptions,
    ) -> CoreResult<String> {
        let page = self.memberships.query(actor, args, Page::default()).await?;
        render_rows(&page.items, options)
    }
}

fn render_rows<T: Serialize>(items: &[T], options: &ExportOptions) -> CoreResult<String> {
    let rows = items
        .iter()
        .map(|item| match serde_json::to_value(item) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Ok(Map::new()),
            Err(err) => Err(ExportError::from(err)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let headers = parse_fields_columns(options.fields_columns.as_deref())?;
    let table = flatten_json_ext(rows);

    tracing::debug!(
        rows = table.rows.len(),
        columns = table.columns.len(),
        "rendering export"
    );
    Ok(to_csv::render(&table, &options.fields, &headers)?)
}

fn parse_fields_columns(raw: Option<&str>) -> Result<HashMap<String, String>, ExportError> {
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return Ok(HashMap::new());
    };

    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => map
            .into_iter()
            .map(|(field, header)| match header {
                Value::String(header) => Ok((field, header)),
                other => Err(ExportError::InvalidColumns(format!(
                    "header for '{}' must be a string, got {}",
                    field, other
                ))),
            })
            .collect(),
        _ => Err(ExportError::InvalidColumns(
            "expected a JSON object".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fields_columns() {
        let headers = parse_fields_columns(Some(r#"{"firstName": "First name"}"#)).unwrap();
        assert_eq!(headers.get("firstName").map(String::as_str), Some("First name"));

        assert!(parse_fields_columns(None).unwrap().is_empty());
        assert!(matches!(
            parse_fields_columns(Some("[1, 2]")),
            Err(ExportError::InvalidColumns(_))
        ));
        assert!(parse_fields_columns(Some("{nope")).is_err());
    }
}
