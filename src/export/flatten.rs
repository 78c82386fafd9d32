use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};

pub const JSON_EXT_COLUMN: &str = "json_ext";

/// Rows with their `json_ext` attributes unfolded into columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlatTable {
    pub columns: Vec<String>,
    pub rows: Vec<IndexMap<String, Value>>,
}

/// Replaces the `json_ext` object of every row by one column per leaf
/// attribute, nested keys joined with `.`.
///
/// The column set is the union over all rows in first-seen order; a row
/// without a column has no entry for it. An attribute whose name clashes
/// with a record column is kept as `json_ext.<name>`.
pub fn flatten_json_ext(rows: Vec<Map<String, Value>>) -> FlatTable {
    let mut columns: IndexSet<String> = IndexSet::new();
    let mut flat_rows = Vec::with_capacity(rows.len());

    for mut row in rows {
        let json_ext = row.remove(JSON_EXT_COLUMN);

        let mut flat: IndexMap<String, Value> = row.into_iter().collect();
        let mut attributes = IndexMap::new();
        if let Some(Value::Object(ext)) = json_ext {
            flatten_object("", ext, &mut attributes);
        }
        for (key, value) in attributes {
            let key = if flat.contains_key(&key) {
                format!("{}.{}", JSON_EXT_COLUMN, key)
            } else {
                key
            };
            flat.insert(key, value);
        }

        for key in flat.keys() {
            if !columns.contains(key) {
                columns.insert(key.clone());
            }
        }
        flat_rows.push(flat);
    }

    FlatTable {
        columns: columns.into_iter().collect(),
        rows: flat_rows,
    }
}

fn flatten_object(prefix: &str, object: Map<String, Value>, out: &mut IndexMap<String, Value>) {
    for (key, value) in object {
        let path = if prefix.is_empty() {
            key
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(nested) if !nested.is_empty() => flatten_object(&path, nested, out),
            other => {
                out.insert(path, other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_union_of_nested_keys_drops_json_ext() {
        let table = flatten_json_ext(vec![
            row(json!({
                "id": "1",
                "first_name": "Ana",
                "json_ext": {"income": 100, "address": {"city": "Lima"}}
            })),
            row(json!({
                "id": "2",
                "first_name": "Leo",
                "json_ext": {"household_size": 4, "address": {"city": "Cusco", "zip": "08000"}}
            })),
            row(json!({"id": "3", "first_name": "Eva", "json_ext": null})),
        ]);

        assert_eq!(
            table.columns,
            vec![
                "id",
                "first_name",
                "income",
                "address.city",
                "household_size",
                "address.zip"
            ]
        );
        assert!(!table.columns.iter().any(|c| c == JSON_EXT_COLUMN));
        assert_eq!(table.rows[1]["address.zip"], json!("08000"));
        assert!(table.rows[2].get("income").is_none());
    }

    #[test]
    fn test_clashing_attribute_is_prefixed() {
        let table = flatten_json_ext(vec![row(json!({
            "id": "1",
            "json_ext": {"id": "external-7"}
        }))]);
        assert_eq!(table.columns, vec!["id", "json_ext.id"]);
        assert_eq!(table.rows[0]["id"], json!("1"));
    }
}
