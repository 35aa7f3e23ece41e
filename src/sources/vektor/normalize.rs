//! Normalization for Vektor payloads

use serde_json::Value;

use crate::sources::normalized::{clean_value, label_for, Record};

const TAG_KEYS: &[&str] = &["base", "source", "database"];

const VEKTOR_LABELS: &[(&str, &str)] = &[
    ("phones", "Phone"),
    ("emails", "Email"),
    ("birth", "Birth Date"),
    ("auto", "Car Number"),
    ("nicknames", "Username"),
];

pub fn normalize(payload: &Value) -> Vec<Record> {
    let rows = match payload {
        Value::Array(rows) => rows.as_slice(),
        Value::Object(obj) => ["result", "data"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };

    rows.iter()
        .filter_map(|row| {
            let fields = row.as_object()?;
            let mut record = Record::new();
            if let Some(tag) = TAG_KEYS
                .iter()
                .find_map(|key| fields.get(*key).and_then(clean_value))
            {
                record = record.with_database(tag);
            }
            for (key, value) in fields {
                if !TAG_KEYS.contains(&key.as_str()) {
                    record.insert_raw(&label_for(VEKTOR_LABELS, key), value);
                }
            }
            (!record.is_empty()).then_some(record)
        })
        .collect()
}
