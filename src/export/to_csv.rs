use std::collections::HashMap;

use csv::Writer;
use serde_json::Value;

use super::flatten::FlatTable;
use super::ExportError;
use crate::filters::ordering::to_snake_case;

/// Renders `table` as CSV.
///
/// `fields` selects and orders the columns (camelCase names are matched
/// against snake_case columns); all columns are written when it is empty.
/// `headers` renames columns in the header row.
pub fn render(
    table: &FlatTable,
    fields: &[String],
    headers: &HashMap<String, String>,
) -> Result<String, ExportError> {
    let selected: Vec<(String, String)> = if fields.is_empty() {
        table
            .columns
            .iter()
            .map(|column| (column.clone(), column.clone()))
            .collect()
    } else {
        fields
            .iter()
            .map(|field| resolve_column(table, field).map(|column| (field.clone(), column)))
            .collect::<Result<_, _>>()?
    };

    let mut wtr = Writer::from_writer(vec![]);

    wtr.write_record(selected.iter().map(|(field, column)| {
        headers
            .get(field)
            .or_else(|| headers.get(column))
            .map(String::as_str)
            .unwrap_or(field.as_str())
    }))?;

    for row in &table.rows {
        wtr.write_record(
            selected
                .iter()
                .map(|(_, column)| row.get(column).map(cell).unwrap_or_default()),
        )?;
    }

    let data = wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8(data)?)
}

fn resolve_column(table: &FlatTable, field: &str) -> Result<String, ExportError> {
    if table.columns.iter().any(|column| column == field) {
        return Ok(field.to_string());
    }
    let snake = to_snake_case(field);
    if table.columns.iter().any(|column| *column == snake) {
        return Ok(snake);
    }
    // Attributes absent from every row still get an (empty) column.
    if table.rows.is_empty() || field.contains('.') {
        return Ok(field.to_string());
    }
    Err(ExportError::UnknownField(field.to_string()))
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::flatten::flatten_json_ext;
    use serde_json::{json, Map};

    fn table() -> FlatTable {
        let rows: Vec<Map<String, Value>> = vec![
            json!({"first_name": "Ana", "json_ext": {"income": 100, "tags": ["a", "b"]}}),
            json!({"first_name": "Leo, Jr.", "json_ext": null}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();
        flatten_json_ext(rows)
    }

    #[test]
    fn test_render_all_columns() {
        let csv = render(&table(), &[], &HashMap::new()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "first_name,income,tags");
        assert_eq!(lines[1], r#"Ana,100,"[""a"",""b""]""#);
        assert_eq!(lines[2], r#""Leo, Jr.",,"#);
    }

    #[test]
    fn test_fields_and_headers() {
        let mut headers = HashMap::new();
        headers.insert("firstName".to_string(), "First name".to_string());

        let csv = render(
            &table(),
            &["income".to_string(), "firstName".to_string()],
            &headers,
        )
        .unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "income,First name");
        assert_eq!(lines[1], "100,Ana");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result = render(&table(), &["shoeSize".to_string()], &HashMap::new());
        assert!(matches!(result, Err(ExportError::UnknownField(_))));
    }
}
