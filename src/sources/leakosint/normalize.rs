//! Normalization for LeakOsint payloads

use serde_json::Value;

use crate::sources::normalized::{clean_value, is_not_found_message, label_for, Record};

/// LeakOsint CamelCase column names, lowercased
const LEAKOSINT_LABELS: &[(&str, &str)] = &[
    ("passwordhash", "Password Hash"),
    ("phone2", "Phone"),
    ("vkid", "VK ID"),
    ("okid", "OK ID"),
    ("regdate", "Registration Date"),
    ("lastactive", "Last Visit"),
    ("ipaddress", "IP Address"),
    ("carnumber", "Car Number"),
    ("bdate", "Birth Date"),
    ("cardnumber", "Card Number"),
];

pub fn normalize(payload: &Value) -> Vec<Record> {
    // a bare "no results" string in place of the map is common too
    let Some(list) = payload.get("List").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut records = Vec::new();
    for (database, entry) in list {
        if is_not_found_message(database) {
            continue;
        }

        let info = entry.get("InfoLeak").and_then(clean_value);
        if info.as_deref().is_some_and(is_not_found_message) {
            continue;
        }

        let Some(rows) = entry.get("Data").and_then(Value::as_array) else {
            continue;
        };

        records.extend(rows.iter().filter_map(|row| {
            let fields = row.as_object()?;
            let mut record = Record::new()
                .with_database(database.as_str())
                .with_info(info.clone());
            for (key, value) in fields {
                record.insert_raw(&label_for(LEAKOSINT_LABELS, key), value);
            }
            (!record.is_empty()).then_some(record)
        }));
    }

    records
}
