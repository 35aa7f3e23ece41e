//! Normalization for ITP payloads
//!
//! Flattens `{database: {data: [...]}}` into records tagged with the database
//! name. The payload may also arrive wrapped in a top-level `data` object.

use serde_json::{Map, Value};

use crate::sources::normalized::{label_for, Record};

/// Transliterated column names used by ITP
const ITP_LABELS: &[(&str, &str)] = &[
    ("number", "Phone Number"),
    ("telefon", "Phone"),
    ("pol", "Gender"),
    ("familiya", "Last Name"),
    ("familia", "Last Name"),
    ("imya", "First Name"),
    ("otchestvo", "Middle Name"),
    ("dr", "Birth Date"),
    ("data_rozhdeniya", "Birth Date"),
    ("adres", "Address"),
    ("gorod", "City"),
    ("strana", "Country"),
    ("pochta", "Email"),
    ("parol", "Password"),
    ("pasport", "Passport"),
    ("karta", "Card Number"),
    ("nik", "Username"),
    ("avto", "Car Number"),
    ("data_registracii", "Registration Date"),
];

/// Normalize an ITP payload to records
pub fn normalize(payload: &Value) -> Vec<Record> {
    let Some(databases) = database_map(payload) else {
        tracing::debug!("ITP payload is not a database map");
        return Vec::new();
    };

    databases
        .iter()
        .flat_map(|(database, entry)| entry_rows(entry).iter().map(move |row| (database, row)))
        .filter_map(|(database, row)| normalize_row(database, row))
        .collect()
}

fn database_map(payload: &Value) -> Option<&Map<String, Value>> {
    let top = payload.as_object()?;
    match top.get("data") {
        Some(Value::Object(inner)) => Some(inner),
        _ => Some(top),
    }
}

fn entry_rows(entry: &Value) -> &[Value] {
    match entry {
        Value::Object(obj) => obj
            .get("data")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        Value::Array(rows) => rows.as_slice(),
        _ => &[],
    }
}

fn normalize_row(database: &str, row: &Value) -> Option<Record> {
    let fields = row.as_object()?;
    let mut record = Record::new().with_database(database);
    for (key, value) in fields {
        record.insert_raw(&label_for(ITP_LABELS, key), value);
    }
    (!record.is_empty()).then_some(record)
}
