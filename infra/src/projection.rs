use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Keeps only the listed dotted paths of a document. Arrays met along a path
/// are projected element by element; `_id` is dropped unless listed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    fields: BTreeMap<String, Projection>,
}

impl Projection {
    pub fn of(paths: &[&str]) -> Self {
        let mut root = Projection::default();
        for path in paths {
            let mut node = &mut root;
            for step in path.split('.') {
                node = node.fields.entry(step.to_string()).or_default();
            }
        }
        root
    }

    pub fn apply(&self, doc: &Value) -> Value {
        match doc {
            Value::Object(map) => {
                let mut out = Map::new();
                for (key, sub) in self.fields.iter() {
                    let value = match map.get(key) {
                        Some(value) => value,
                        None => continue,
                    };
                    if sub.fields.is_empty() {
                        out.insert(key.clone(), value.clone());
                    } else if let Some(projected) = sub.apply_nested(value) {
                        out.insert(key.clone(), projected);
                    }
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(items.iter().map(|v| self.apply(v)).collect()),
            other => other.clone(),
        }
    }

    fn apply_nested(&self, value: &Value) -> Option<Value> {
        match value {
            Value::Object(_) => Some(self.apply(value)),
            Value::Array(items) => Some(Value::Array(
                items.iter().filter_map(|v| self.apply_nested(v)).collect(),
            )),
            _ => None,
        }
    }
}
