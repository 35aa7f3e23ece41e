//! Canonical search query
//!
//! A [`Query`] is only constructed through [`Query::parse`], so every query an
//! adapter sees has a non-empty value and, for phones, a bare digit string.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;
use url::Url;

use crate::error::ValidationError;

/// What kind of identifier the query value is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Phone,
    Email,
    Inn,
    Snils,
    Vk,
    Ok,
    Username,
}

impl FieldKind {
    pub const ALL: [FieldKind; 7] = [
        Self::Phone,
        Self::Email,
        Self::Inn,
        Self::Snils,
        Self::Vk,
        Self::Ok,
        Self::Username,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Inn => "inn",
            Self::Snils => "snils",
            Self::Vk => "vk",
            Self::Ok => "ok",
            Self::Username => "username",
        }
    }

    /// Social handles are sent upstream as a bare username
    pub fn is_handle(&self) -> bool {
        matches!(self, Self::Vk | Self::Ok | Self::Username)
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| ValidationError::UnknownField(s.to_string()))
    }
}

/// A validated search query
///
/// Deserialization goes through [`Query::new`], so a stored or submitted query
/// is held to the same rules as parsed input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuery")]
pub struct Query {
    value: String,
    field: FieldKind,
}

/// Wire form of [`Query`] before validation
#[derive(Deserialize)]
struct RawQuery {
    value: String,
    field: FieldKind,
}

impl TryFrom<RawQuery> for Query {
    type Error = ValidationError;

    fn try_from(raw: RawQuery) -> Result<Self, Self::Error> {
        Query::new(&raw.value, raw.field)
    }
}

impl Query {
    /// Validate raw user input and bring it into canonical form
    pub fn parse(value: &str, field: &str) -> Result<Self, ValidationError> {
        let field = FieldKind::from_str(field)?;
        Self::new(value, field)
    }

    pub fn new(value: &str, field: FieldKind) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyValue);
        }

        let value = match field {
            FieldKind::Phone => strip_phone_formatting(trimmed)?,
            FieldKind::Email => {
                if !email_pattern().is_match(trimmed) {
                    return Err(ValidationError::InvalidEmail(trimmed.to_string()));
                }
                trimmed.to_string()
            }
            _ => trimmed.to_string(),
        };

        Ok(Self { value, field })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn field(&self) -> FieldKind {
        self.field
    }

    /// The value as adapters send it upstream
    ///
    /// Social-handle queries pasted as profile URLs are reduced to the handle.
    pub fn upstream_value(&self) -> String {
        if self.field.is_handle() {
            extract_handle(&self.value)
        } else {
            self.value.clone()
        }
    }
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("email pattern is valid")
    })
}

/// Drop spaces, dashes, dots, parentheses and a leading plus
fn strip_phone_formatting(raw: &str) -> Result<String, ValidationError> {
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.' | '+' | '\t'))
        .collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidPhone(raw.to_string()));
    }
    Ok(digits)
}

/// Extract a username from a pasted profile link
///
/// `https://vk.com/ivanov123`, `vk.com/ivanov123/` and `@ivanov123` all become
/// `ivanov123`. Values that are not links pass through trimmed.
pub fn extract_handle(raw: &str) -> String {
    let trimmed = raw.trim();

    let url = if trimmed.contains("://") {
        Url::parse(trimmed).ok()
    } else if looks_like_host_path(trimmed) {
        Url::parse(&format!("https://{}", trimmed)).ok()
    } else {
        None
    };

    let handle = url
        .as_ref()
        .and_then(|u| u.path_segments())
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(str::to_string))
        .unwrap_or_else(|| trimmed.to_string());

    handle.trim_start_matches('@').to_string()
}

fn looks_like_host_path(value: &str) -> bool {
    match value.split_once('/') {
        Some((host, _)) => host.contains('.') && !host.contains('@'),
        None => false,
    }
}
