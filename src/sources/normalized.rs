//! Canonical leak records and value normalization
//!
//! Every normalizer funnels upstream values through [`Record::insert_raw`], so
//! the drop rules (empty, `NULL`, placeholder dates) and the per-label value
//! rules (phone, gender, dates, card masking) live in one place.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// =============================================================================
// Record Types
// =============================================================================

/// One leaked data entry: canonical label -> value, tagged with its origin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
    /// Upstream database the entry was found in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_database: Option<String>,
    /// Collection within the database (Usersbox)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_collection: Option<String>,
    /// Free-text description of the leak (LeakOsint `InfoLeak`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    /// Upstream relevance score (Usersbox `_score`)
    #[serde(rename = "_score", default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.source_database = Some(database.into());
        self
    }

    pub fn with_collection(mut self, collection: Option<String>) -> Self {
        self.source_collection = collection;
        self
    }

    pub fn with_info(mut self, info: Option<String>) -> Self {
        self.info = info.filter(|i| !is_sentinel(i));
        self
    }

    pub fn with_score(mut self, score: Option<f64>) -> Self {
        self.score = score;
        self
    }

    /// Insert an upstream JSON value under a canonical label
    ///
    /// Array elements are normalized one by one and then joined. Values that
    /// clean to nothing are skipped; an existing value for the same label is
    /// kept.
    pub fn insert_raw(&mut self, label: &str, raw: &Value) {
        let value = match raw {
            Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter(|v| !v.is_array())
                    .filter_map(clean_value)
                    .filter_map(|v| normalize_value(label, &v))
                    .collect();
                (!parts.is_empty()).then(|| parts.join(MULTI_VALUE_SEPARATOR))
            }
            other => clean_value(other).and_then(|v| normalize_value(label, &v)),
        };

        if let Some(value) = value {
            self.fields.entry(field_key(label)).or_insert(value);
        }
    }

    /// Insert a string value under a canonical label, applying the label's rules
    pub fn insert(&mut self, label: &str, value: &str) {
        if let Some(value) = normalize_value(label, value) {
            self.fields.entry(field_key(label)).or_insert(value);
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields.get(label).map(String::as_str)
    }

    /// True when no field survived normalization
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Records that share one upstream source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordGroup {
    pub database: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    pub count: usize,
    pub records: Vec<Record>,
}

/// Re-apply value normalization to already-built records
///
/// Idempotent: output of any normalizer passes through unchanged.
pub fn canonicalize(records: &[Record]) -> Vec<Record> {
    records
        .iter()
        .filter_map(|record| {
            let mut out = Record {
                fields: BTreeMap::new(),
                source_database: record.source_database.clone(),
                source_collection: record.source_collection.clone(),
                info: record.info.clone(),
                score: record.score,
            };
            for (label, value) in &record.fields {
                out.insert(label, value);
            }
            (!out.is_empty()).then_some(out)
        })
        .collect()
}

// =============================================================================
// Field Labels
// =============================================================================

/// Upstream keys shared by most sources, lowercase
const COMMON_LABELS: &[(&str, &str)] = &[
    ("full_name", "Full Name"),
    ("fullname", "Full Name"),
    ("fio", "Full Name"),
    ("name", "Full Name"),
    ("first_name", "First Name"),
    ("firstname", "First Name"),
    ("last_name", "Last Name"),
    ("lastname", "Last Name"),
    ("surname", "Last Name"),
    ("middle_name", "Middle Name"),
    ("middlename", "Middle Name"),
    ("patronymic", "Middle Name"),
    ("phone", "Phone"),
    ("phone_number", "Phone"),
    ("telephone", "Phone"),
    ("tel", "Phone"),
    ("mobile", "Phone"),
    ("email", "Email"),
    ("e-mail", "Email"),
    ("mail", "Email"),
    ("password", "Password"),
    ("pass", "Password"),
    ("password_hash", "Password Hash"),
    ("hash", "Password Hash"),
    ("birth_date", "Birth Date"),
    ("birthdate", "Birth Date"),
    ("birthday", "Birth Date"),
    ("bday", "Birth Date"),
    ("dob", "Birth Date"),
    ("gender", "Gender"),
    ("sex", "Gender"),
    ("address", "Address"),
    ("city", "City"),
    ("region", "Region"),
    ("country", "Country"),
    ("inn", "INN"),
    ("snils", "SNILS"),
    ("passport", "Passport"),
    ("card", "Card Number"),
    ("card_number", "Card Number"),
    ("cardnumber", "Card Number"),
    ("login", "Login"),
    ("username", "Username"),
    ("nickname", "Username"),
    ("nick", "Username"),
    ("ip", "IP Address"),
    ("ip_address", "IP Address"),
    ("vk_id", "VK ID"),
    ("ok_id", "OK ID"),
    ("car_number", "Car Number"),
    ("vin", "VIN"),
    ("reg_date", "Registration Date"),
    ("registration_date", "Registration Date"),
    ("created_at", "Registration Date"),
];

/// Keys `Record` serializes itself next to the flattened fields
const RESERVED_KEYS: &[&str] = &["source_database", "source_collection", "info", "_score"];

/// Map key for a label, moving reserved names out of the way
fn field_key(label: &str) -> String {
    if RESERVED_KEYS.contains(&label) {
        format!("upstream_{}", label)
    } else {
        label.to_string()
    }
}

/// Resolve an upstream key to its display label
///
/// The source table wins over the shared one; unknown keys pass through 1:1.
pub fn label_for(source_labels: &[(&str, &str)], key: &str) -> String {
    let lowered = key.trim().to_lowercase();
    source_labels
        .iter()
        .chain(COMMON_LABELS.iter())
        .find(|(k, _)| *k == lowered)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| key.trim().to_string())
}

// =============================================================================
// Value Cleaning
// =============================================================================

const PLACEHOLDER_DATES: &[&str] = &[
    "1970-01-01",
    "1900-01-01",
    "0001-01-01",
    "0000-00-00",
    "01.01.1970",
    "01.01.1900",
    "01.01.0001",
    "00.00.0000",
];

const PHONE_LABELS: &[&str] = &["Phone", "Phone Number"];
const DATE_LABELS: &[&str] = &["Birth Date", "Registration Date", "Last Visit"];

/// Joins the elements of a multi-valued field
const MULTI_VALUE_SEPARATOR: &str = ", ";

/// Values that mean "unknown" and must never be surfaced
pub fn is_sentinel(value: &str) -> bool {
    let value = value.trim();
    value.is_empty()
        || value.eq_ignore_ascii_case("null")
        || PLACEHOLDER_DATES.iter().any(|d| value.starts_with(d))
}

/// Convert a loosely-typed JSON value into a display string
///
/// Nested objects are not representable as one field and are skipped.
pub fn clean_value(raw: &Value) -> Option<String> {
    let text = match raw {
        Value::Null | Value::Object(_) => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter(|v| !v.is_array())
                .filter_map(clean_value)
                .collect();
            parts.join(MULTI_VALUE_SEPARATOR)
        }
    };
    (!is_sentinel(&text)).then_some(text)
}

/// Apply the value rule of a canonical label
///
/// Ruled labels may hold several joined values; each one is normalized on its
/// own, so already-normalized multi-valued fields pass through unchanged.
pub fn normalize_value(label: &str, value: &str) -> Option<String> {
    let value = value.trim();
    if is_sentinel(value) {
        return None;
    }

    let Some(rule) = value_rule(label) else {
        return Some(value.to_string());
    };

    let parts: Vec<String> = value
        .split(MULTI_VALUE_SEPARATOR)
        .map(str::trim)
        .filter(|part| !is_sentinel(part))
        .map(rule)
        .filter(|part| !is_sentinel(part))
        .collect();

    (!parts.is_empty()).then(|| parts.join(MULTI_VALUE_SEPARATOR))
}

fn value_rule(label: &str) -> Option<fn(&str) -> String> {
    if PHONE_LABELS.contains(&label) {
        Some(normalize_phone)
    } else if DATE_LABELS.contains(&label) {
        Some(normalize_date)
    } else if label == "Gender" {
        Some(normalize_gender)
    } else if label == "Card Number" {
        Some(mask_card)
    } else {
        None
    }
}

/// Digits only, Russian trunk prefix rewritten, `+` prepended
///
/// `8 (999) 123-45-67` and `9991234567` both become `+79991234567`.
pub fn normalize_phone(value: &str) -> String {
    let mut digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return value.to_string();
    }
    if digits.len() == 11 && digits.starts_with('8') {
        digits.replace_range(..1, "7");
    } else if digits.len() == 10 && digits.starts_with('9') {
        digits.insert(0, '7');
    }
    format!("+{}", digits)
}

pub fn normalize_gender(value: &str) -> String {
    match value.trim().to_lowercase().as_str() {
        "m" | "1" | "male" | "man" | "м" | "муж" | "мужской" => "Male".to_string(),
        "f" | "0" | "w" | "female" | "woman" | "ж" | "жен" | "женский" => {
            "Female".to_string()
        }
        _ => value.to_string(),
    }
}

/// `DD.MM.YYYY` (optionally with a time part) to ISO `YYYY-MM-DD`
pub fn normalize_date(value: &str) -> String {
    let date_part = value.split_whitespace().next().unwrap_or(value);
    ["%d.%m.%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| chrono::NaiveDate::parse_from_str(date_part, fmt).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| value.to_string())
}

/// Keep the first and last four digits of a card number
pub fn mask_card(value: &str) -> String {
    if value.contains('*') {
        return value.to_string();
    }
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if !(13..=19).contains(&digits.len()) {
        return value.to_string();
    }
    format!(
        "{}{}{}",
        &digits[..4],
        "*".repeat(digits.len() - 8),
        &digits[digits.len() - 4..]
    )
}

// =============================================================================
// Not-Found Detection
// =============================================================================

/// Complete phrases, never bare stems
const NOT_FOUND_PHRASES: &[&str] = &[
    "не найдено результатов",
    "результатов не найдено",
    "ничего не найдено",
    "no results found",
    "nothing found",
];

/// Whether an upstream message means "zero matches"
pub fn is_not_found_message(text: &str) -> bool {
    let lowered = text.to_lowercase();
    NOT_FOUND_PHRASES.iter().any(|p| lowered.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sentinels_dropped() {
        for v in ["", "  ", "NULL", "null", "1970-01-01", "01.01.1970", "0000-00-00"] {
            assert!(is_sentinel(v), "{v:?} should be a sentinel");
        }
        assert!(!is_sentinel("Ivanov"));
        assert!(!is_sentinel("1985-03-12"));
    }

    #[test]
    fn test_all_sentinel_record_is_empty() {
        let mut record = Record::new();
        record.insert_raw("Full Name", &json!(""));
        record.insert_raw("Email", &json!("NULL"));
        record.insert_raw("Phone", &json!(null));
        record.insert_raw("Birth Date", &json!("01.01.1970"));
        record.insert_raw("Password", &json!("null"));
        assert!(record.is_empty());
        assert!(canonicalize(&[record]).is_empty());
    }

    #[test]
    fn test_phone_normalization() {
        assert_eq!(normalize_phone("89991234567"), "+79991234567");
        assert_eq!(normalize_phone("+7 (999) 123-45-67"), "+79991234567");
        assert_eq!(normalize_phone("9991234567"), "+79991234567");
        assert_eq!(normalize_phone("380501234567"), "+380501234567");
        assert_eq!(normalize_phone("hidden"), "hidden");
    }

    #[test]
    fn test_gender_translation() {
        assert_eq!(normalize_gender("m"), "Male");
        assert_eq!(normalize_gender("1"), "Male");
        assert_eq!(normalize_gender("Ж"), "Female");
        assert_eq!(normalize_gender("0"), "Female");
        assert_eq!(normalize_gender("Male"), "Male");
        assert_eq!(normalize_gender("unknown"), "unknown");
    }

    #[test]
    fn test_date_reparse() {
        assert_eq!(normalize_date("12.03.1985"), "1985-03-12");
        assert_eq!(normalize_date("12.03.1985 10:15:00"), "1985-03-12");
        assert_eq!(normalize_date("1985-03-12"), "1985-03-12");
        assert_eq!(normalize_date("March 1985"), "March 1985");
    }

    #[test]
    fn test_card_masking() {
        assert_eq!(mask_card("4276 1234 5678 9012"), "4276********9012");
        assert_eq!(mask_card("4276********9012"), "4276********9012");
        assert_eq!(mask_card("1234"), "1234");
    }

    #[test]
    fn test_clean_value_types() {
        assert_eq!(clean_value(&json!(42)), Some("42".to_string()));
        assert_eq!(clean_value(&json!(true)), Some("true".to_string()));
        assert_eq!(
            clean_value(&json!(["a", "", "b"])),
            Some("a, b".to_string())
        );
        assert_eq!(clean_value(&json!({"nested": 1})), None);
        assert_eq!(clean_value(&json!([])), None);
    }

    #[test]
    fn test_label_lookup() {
        const SOURCE: &[(&str, &str)] = &[("number", "Phone Number")];
        assert_eq!(label_for(SOURCE, "number"), "Phone Number");
        assert_eq!(label_for(SOURCE, "EMAIL"), "Email");
        assert_eq!(label_for(SOURCE, "favourite_color"), "favourite_color");
    }

    #[test]
    fn test_canonicalize_idempotent() {
        let mut record = Record::new().with_database("DB1");
        record.insert("Phone", "8 999 123 45 67");
        record.insert("Gender", "f");
        record.insert("Birth Date", "12.03.1985");
        record.insert("Card Number", "4276123456789012");

        let once = canonicalize(&[record.clone()]);
        assert_eq!(once, vec![record]);
        assert_eq!(canonicalize(&once), once);
    }

    #[test]
    fn test_first_value_wins() {
        let mut record = Record::new();
        record.insert("Email", "a@example.com");
        record.insert("Email", "b@example.com");
        assert_eq!(record.get("Email"), Some("a@example.com"));
    }

    #[test]
    fn test_not_found_phrases() {
        assert!(is_not_found_message("По вашему запросу не найдено результатов"));
        assert!(is_not_found_message("No results found"));
        assert!(!is_not_found_message("Found 3 results in 2 databases"));
        assert!(!is_not_found_message("В утечке 2022 года пароли не найдены"));
        assert!(!is_not_found_message("Password hashes not found in this dump"));
    }

    #[test]
    fn test_multiple_phones_normalized_separately() {
        let mut record = Record::new();
        record.insert_raw("Phone", &json!(["89991234567", "NULL", "9990001122"]));
        assert_eq!(record.get("Phone"), Some("+79991234567, +79990001122"));
    }

    #[test]
    fn test_cards_and_dates_in_arrays() {
        let mut record = Record::new();
        record.insert_raw("Card Number", &json!(["4276 1234 5678 9012", 5536913712345678u64]));
        record.insert_raw("Birth Date", &json!(["12.03.1985", "01.01.1970"]));
        assert_eq!(
            record.get("Card Number"),
            Some("4276********9012, 5536********5678")
        );
        assert_eq!(record.get("Birth Date"), Some("1985-03-12"));
    }

    #[test]
    fn test_multi_valued_fields_stay_canonical() {
        let mut record = Record::new();
        record.insert_raw("Phone", &json!(["89991234567", "89990001122"]));
        record.insert_raw("Address", &json!("Москва, ул. Ленина, 1"));

        let once = canonicalize(&[record.clone()]);
        assert_eq!(once, vec![record]);
        assert_eq!(once[0].get("Address"), Some("Москва, ул. Ленина, 1"));
    }

    #[test]
    fn test_reserved_keys_do_not_clash() {
        let mut record = Record::new().with_info(Some("VK dump".into()));
        record.insert_raw(&label_for(&[], "info"), &json!("upstream note"));
        record.insert_raw(&label_for(&[], "source_database"), &json!("raw db"));

        assert_eq!(record.get("upstream_info"), Some("upstream note"));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["info"], "VK dump");
        assert_eq!(json["upstream_info"], "upstream note");
        assert_eq!(json["upstream_source_database"], "raw db");
        assert!(json.get("source_database").is_none());
        assert_eq!(canonicalize(&[record.clone()]), vec![record]);
    }
}
