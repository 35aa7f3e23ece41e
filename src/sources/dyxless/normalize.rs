//! Normalization for Dyxless payloads

use serde_json::Value;

use crate::sources::normalized::{clean_value, label_for, Record};

/// Members that tag the record rather than describe the person
const TAG_KEYS: &[&str] = &["source", "database"];

/// Dyxless mixes English and Russian column names
const DYXLESS_LABELS: &[(&str, &str)] = &[
    ("телефон", "Phone"),
    ("фио", "Full Name"),
    ("имя", "First Name"),
    ("фамилия", "Last Name"),
    ("отчество", "Middle Name"),
    ("почта", "Email"),
    ("дата рождения", "Birth Date"),
    ("адрес", "Address"),
    ("город", "City"),
    ("пол", "Gender"),
    ("паспорт", "Passport"),
    ("инн", "INN"),
    ("снилс", "SNILS"),
];

pub fn normalize(payload: &Value) -> Vec<Record> {
    let rows = match payload {
        Value::Array(rows) => rows.as_slice(),
        Value::Object(obj) => match obj.get("data") {
            Some(Value::Array(rows)) => rows.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    rows.iter().filter_map(normalize_row).collect()
}

fn normalize_row(row: &Value) -> Option<Record> {
    let fields = row.as_object()?;

    let mut record = Record::new();
    if let Some(tag) = TAG_KEYS
        .iter()
        .find_map(|key| fields.get(*key).and_then(clean_value))
    {
        record = record.with_database(tag);
    }

    for (key, value) in fields {
        if TAG_KEYS.contains(&key.as_str()) {
            continue;
        }
        record.insert_raw(&label_for(DYXLESS_LABELS, key), value);
    }

    (!record.is_empty()).then_some(record)
}
