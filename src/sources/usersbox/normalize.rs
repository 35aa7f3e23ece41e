//! Normalization for Usersbox payloads
//!
//! Each item of `data.items` becomes one [`RecordGroup`]. Hit members with a
//! leading underscore are search metadata; only `_score` is kept.

use serde_json::Value;

use crate::sources::normalized::{clean_value, label_for, Record, RecordGroup};

const USERSBOX_LABELS: &[(&str, &str)] = &[
    ("photo", "Photo"),
    ("vk", "VK ID"),
    ("ok", "OK ID"),
    ("first_visit", "Registration Date"),
    ("last_visit", "Last Visit"),
];

/// Per-source groups, in upstream order, without empty ones
pub fn normalize_groups(payload: &Value) -> Vec<RecordGroup> {
    let Some(items) = payload
        .get("data")
        .and_then(|d| d.get("items"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    items.iter().filter_map(normalize_group).collect()
}

/// Groups flattened into one record list
pub fn normalize(payload: &Value) -> Vec<Record> {
    normalize_groups(payload)
        .into_iter()
        .flat_map(|group| group.records)
        .collect()
}

fn normalize_group(item: &Value) -> Option<RecordGroup> {
    let source = item.get("source");
    let database = source
        .and_then(|s| s.get("database"))
        .and_then(clean_value)
        .unwrap_or_else(|| "unknown".to_string());
    let collection = source
        .and_then(|s| s.get("collection"))
        .and_then(clean_value);

    let hits = item
        .get("hits")
        .and_then(|h| h.get("items"))
        .and_then(Value::as_array)?;

    let records: Vec<Record> = hits
        .iter()
        .filter_map(|hit| normalize_hit(hit, &database, collection.clone()))
        .collect();

    if records.is_empty() {
        return None;
    }

    Some(RecordGroup {
        database,
        collection,
        count: records.len(),
        records,
    })
}

fn normalize_hit(hit: &Value, database: &str, collection: Option<String>) -> Option<Record> {
    let fields = hit.as_object()?;

    let mut record = Record::new()
        .with_database(database)
        .with_collection(collection)
        .with_score(fields.get("_score").and_then(Value::as_f64));

    for (key, value) in fields.iter().filter(|(k, _)| !k.starts_with('_')) {
        record.insert_raw(&label_for(USERSBOX_LABELS, key), value);
    }

    (!record.is_empty()).then_some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({
            "status": "success",
            "data": {
                "count": 3,
                "items": [
                    {
                        "source": {"database": "yandex", "collection": "eda"},
                        "hits": {"hitsCount": 2, "count": 2, "items": [
                            {"_id": "a1", "_score": 12.5, "phone": "79991234567", "full_name": "Иванов Иван"},
                            {"_id": "a2", "_score": 7.0, "phone": "89991234567", "address": "Москва"}
                        ]}
                    },
                    {
                        "source": {"database": "vk", "collection": "users"},
                        "hits": {"hitsCount": 1, "items": [
                            {"_id": "b1", "sex": "2", "first_visit": "11.11.2011"}
                        ]}
                    },
                    {
                        "source": {"database": "empty", "collection": "x"},
                        "hits": {"items": [{"_id": "c1", "email": "NULL"}]}
                    }
                ]
            }
        })
    }

    #[test]
    fn test_groups_per_source() {
        let groups = normalize_groups(&sample_payload());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].database, "yandex");
        assert_eq!(groups[0].collection.as_deref(), Some("eda"));
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[1].database, "vk");
        assert_eq!(groups[1].count, 1);
    }

    #[test]
    fn test_score_kept_metadata_dropped() {
        let groups = normalize_groups(&sample_payload());
        let first = &groups[0].records[0];

        assert_eq!(first.score, Some(12.5));
        assert_eq!(first.get("_id"), None);
        assert_eq!(first.get("Phone"), Some("+79991234567"));
        assert_eq!(first.source_collection.as_deref(), Some("eda"));
        assert_eq!(groups[1].records[0].get("Registration Date"), Some("2011-11-11"));
    }

    #[test]
    fn test_flat_records_match_group_counts() {
        let payload = sample_payload();
        let records = normalize(&payload);
        let groups = normalize_groups(&payload);

        assert_eq!(records.len(), groups.iter().map(|g| g.count).sum::<usize>());
        assert_eq!(records.len(), 3);
    }
}
