//! Canonical ledger record model.

use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Account identifier in the local store.
pub type AccountId = i64;

/// Field names a canonical record may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalField {
    Date,
    Category,
    MainCategory,
    Amount,
    Currency,
    Member,
    Account,
    Tags,
    Note,
    Type,
    LastUpdated,
    Uuid,
}

impl CanonicalField {
    /// Every recognized field, in export column order.
    pub const ALL: [CanonicalField; 12] = [
        CanonicalField::Date,
        CanonicalField::Category,
        CanonicalField::MainCategory,
        CanonicalField::Amount,
        CanonicalField::Currency,
        CanonicalField::Member,
        CanonicalField::Account,
        CanonicalField::Tags,
        CanonicalField::Note,
        CanonicalField::Type,
        CanonicalField::LastUpdated,
        CanonicalField::Uuid,
    ];

    /// Key used when the record is serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::Date => "date",
            CanonicalField::Category => "category",
            CanonicalField::MainCategory => "mainCategory",
            CanonicalField::Amount => "amount",
            CanonicalField::Currency => "currency",
            CanonicalField::Member => "member",
            CanonicalField::Account => "account",
            CanonicalField::Tags => "tags",
            CanonicalField::Note => "note",
            CanonicalField::Type => "type",
            CanonicalField::LastUpdated => "lastUpdated",
            CanonicalField::Uuid => "uuid",
        }
    }

    /// Resolve a serialized key back to a field.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == key)
    }

    /// Map a column header from the bookkeeping app's export to a field.
    ///
    /// Matching is exact and case-sensitive; anything else maps to nothing.
    pub fn from_localized_header(header: &str) -> Option<Self> {
        let field = match header {
            "日期" => CanonicalField::Date,
            "類別" => CanonicalField::Category,
            "大類別" => CanonicalField::MainCategory,
            "金額" => CanonicalField::Amount,
            "貨幣" => CanonicalField::Currency,
            "成員" => CanonicalField::Member,
            "帳戶" => CanonicalField::Account,
            "標籤" => CanonicalField::Tags,
            "備註" => CanonicalField::Note,
            "收支區分" => CanonicalField::Type,
            "上次更新" => CanonicalField::LastUpdated,
            "UUID" => CanonicalField::Uuid,
            _ => return None,
        };
        Some(field)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value stored under a canonical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(serde_json::Number),
    Text(String),
}

impl FieldValue {
    /// Interpret raw cell text as an amount.
    ///
    /// Integers and finite decimals become numbers; everything else stays text.
    pub fn amount(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            return FieldValue::Number(value.into());
        }
        trimmed
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(FieldValue::Number)
            .unwrap_or_else(|| FieldValue::Text(raw.to_string()))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Number(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(number) => number.as_f64(),
            FieldValue::Text(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value.into())
    }
}

/// One normalized ledger row.
///
/// Fields keep insertion order, which for parsed rows is header order. Only
/// `amount` may hold a number; every other field is text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalRecord {
    fields: Vec<(CanonicalField, FieldValue)>,
}

impl CanonicalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any earlier value in place.
    pub fn insert(&mut self, field: CanonicalField, value: impl Into<FieldValue>) {
        let value = normalize(field, value.into());
        if let Some(slot) = self.fields.iter_mut().find(|(f, _)| *f == field) {
            slot.1 = value;
        } else {
            self.fields.push((field, value));
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, field: CanonicalField, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn get(&self, field: CanonicalField) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (CanonicalField, &FieldValue)> {
        self.fields.iter().map(|(field, value)| (*field, value))
    }

    /// Field names in order.
    pub fn field_names(&self) -> Vec<CanonicalField> {
        self.fields.iter().map(|(field, _)| *field).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// Numbers outside `amount` are stored as their text form.
fn normalize(field: CanonicalField, value: FieldValue) -> FieldValue {
    match value {
        FieldValue::Number(number) if field != CanonicalField::Amount => {
            FieldValue::Text(number.to_string())
        }
        other => other,
    }
}

impl Serialize for CanonicalRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field.as_str(), value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CanonicalRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = CanonicalRecord;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a ledger record object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut record = CanonicalRecord::new();
                while let Some(key) = access.next_key::<String>()? {
                    match CanonicalField::from_key(&key) {
                        Some(field) => {
                            let value = access.next_value::<FieldValue>().map_err(|e| {
                                de::Error::custom(format!("field `{}`: {}", key, e))
                            })?;
                            record.insert(field, value);
                        }
                        None => {
                            access.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}
