//! Order-independent JSON view of a settings document

use serde_json::{Map, Value};
use toml_edit::{Item, Table};

/// Convert a TOML table into a JSON object with sorted keys.
///
/// Formatting, comments and key order are dropped, so two documents that
/// differ only in layout normalize to the same value.
pub fn table_to_json(table: &Table) -> Value {
    let mut map = Map::new();
    let mut keys: Vec<_> = table.iter().map(|(k, _)| k.to_string()).collect();
    keys.sort();

    for key in keys {
        if let Some(item) = table.get(&key) {
            map.insert(key, item_to_json(item));
        }
    }
    Value::Object(map)
}

fn item_to_json(item: &Item) -> Value {
    match item {
        Item::Value(v) => value_to_json(v),
        Item::Table(t) => table_to_json(t),
        Item::ArrayOfTables(arr) => Value::Array(arr.iter().map(table_to_json).collect()),
        Item::None => Value::Null,
    }
}

fn value_to_json(v: &toml_edit::Value) -> Value {
    match v {
        toml_edit::Value::String(s) => Value::String(s.value().to_string()),
        toml_edit::Value::Integer(i) => Value::Number((*i.value()).into()),
        toml_edit::Value::Float(f) => serde_json::Number::from_f64(*f.value())
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml_edit::Value::Boolean(b) => Value::Bool(*b.value()),
        toml_edit::Value::Datetime(d) => Value::String(d.to_string()),
        toml_edit::Value::Array(arr) => Value::Array(arr.iter().map(value_to_json).collect()),
        toml_edit::Value::InlineTable(t) => {
            let mut map = Map::new();
            let mut keys: Vec<_> = t.iter().map(|(k, _)| k.to_string()).collect();
            keys.sort();
            for key in keys {
                if let Some(v) = t.get(&key) {
                    map.insert(key, value_to_json(v));
                }
            }
            Value::Object(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toml_edit::DocumentMut;

    fn normalize(source: &str) -> Value {
        let doc: DocumentMut = source.parse().unwrap();
        table_to_json(doc.as_table())
    }

    #[test]
    fn normalize_ignores_order_and_comments() {
        let a = normalize("# header\nversion = 1\n[component.A]\nx = 1\n[component.B]\ny = 2\n");
        let b = normalize("version = 1\n[component.B]\ny = 2\n\n[component.A]\nx = 1 # inline\n");
        assert_eq!(a, b);
    }

    #[test]
    fn normalize_arrays_of_tables() {
        let value = normalize(
            "[[component.RunManager.configuration]]\nname = \"a\"\n\n[[component.RunManager.configuration]]\nname = \"b\"\n",
        );
        let configs = &value["component"]["RunManager"]["configuration"];
        assert_eq!(configs.as_array().unwrap().len(), 2);
        assert_eq!(configs[1]["name"], "b");
    }
}
