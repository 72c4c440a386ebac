//! Flat field maps exchanged with the cache.
//!
//! A [`Record`] is what providers' typed models are flattened into before they
//! are cached. Values are restricted to [`Scalar`]s so that every record can be
//! written to and read back from the JSON snapshot without loss.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ValidationError;

/// A single cached field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    String(String),
}

impl Scalar {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Hashable form used to match records by identity key. `Null` has none.
    pub fn identity(&self) -> Option<IdentityValue> {
        match self {
            Self::Null => None,
            Self::Bool(value) => Some(IdentityValue::Bool(*value)),
            Self::Integer(value) => Some(IdentityValue::Integer(*value)),
            Self::Number(value) => Some(IdentityValue::Number(value.to_bits())),
            Self::String(value) => Some(IdentityValue::Text(value.clone())),
        }
    }

    /// Converts a JSON value, returning `None` for arrays and objects.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(value) => Some(Self::Bool(value)),
            Value::Number(number) => Some(match number.as_i64() {
                Some(integer) => Self::Integer(integer),
                None => Self::Number(number.as_f64().unwrap_or(f64::NAN)),
            }),
            Value::String(value) => Some(Self::String(value)),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T> From<Option<T>> for Scalar
where
    T: Into<Scalar>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Hashable identity-key value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityValue {
    Bool(bool),
    Integer(i64),
    /// Raw bits of an `f64` key.
    Number(u64),
    Text(String),
}

/// Ordered field name → scalar mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Scalar>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens a typed provider model into a record.
    pub fn from_model<T>(model: &T) -> Result<Self, ValidationError>
    where
        T: Serialize,
    {
        let value = serde_json::to_value(model).map_err(|error| ValidationError::NotARecord {
            reason: error.to_string(),
        })?;
        Self::try_from(value)
    }

    /// Rebuilds a typed model from a cached record.
    pub fn to_model<T>(&self) -> Result<T, ValidationError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = serde_json::to_value(self).map_err(|error| ValidationError::NotARecord {
            reason: error.to_string(),
        })?;
        serde_json::from_value(value).map_err(|error| ValidationError::NotARecord {
            reason: error.to_string(),
        })
    }

    pub fn get(&self, field: &str) -> Option<&Scalar> {
        self.fields.get(field)
    }

    /// Like [`Record::get`] but treats an explicit `null` as absent.
    pub fn get_present(&self, field: &str) -> Option<&Scalar> {
        self.fields.get(field).filter(|value| !value.is_null())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Scalar::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Scalar>) -> Option<Scalar> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Scalar> {
        self.fields.remove(field)
    }

    pub fn identity(&self, key: &str) -> Option<IdentityValue> {
        self.fields.get(key).and_then(Scalar::identity)
    }

    /// Returns a copy of `self` with every field of `other` written over it.
    pub fn overlaid_with(&self, other: &Record) -> Record {
        let mut merged = self.clone();
        for (field, value) in &other.fields {
            merged.fields.insert(field.clone(), value.clone());
        }
        merged
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Scalar> {
        self.fields.iter()
    }
}

impl TryFrom<Value> for Record {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(object) = value else {
            return Err(ValidationError::NotARecord {
                reason: String::from("expected a JSON object"),
            });
        };

        let mut fields = BTreeMap::new();
        for (field, value) in object {
            let Some(scalar) = Scalar::from_json(value) else {
                return Err(ValidationError::NonScalarField { field });
            };
            fields.insert(field, scalar);
        }
        Ok(Self { fields })
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Scalar>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Scalar);
    type IntoIter = btree_map::Iter<'a, String, Scalar>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Records cached for one (entity kind, symbol) pair.
pub type Collection = Vec<Record>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_deserialization_keeps_integers_and_floats_apart() {
        let record: Record =
            serde_json::from_value(json!({"volume": 1000, "close": 102.5, "open": 100.0}))
                .expect("record");
        assert_eq!(record.get("volume"), Some(&Scalar::Integer(1000)));
        assert_eq!(record.get("close"), Some(&Scalar::Number(102.5)));
        assert_eq!(record.get("open"), Some(&Scalar::Number(100.0)));
    }

    #[test]
    fn null_identity_counts_as_missing() {
        let record = Record::try_from(json!({"time": null, "close": 1.0})).expect("record");
        assert!(record.contains("time"));
        assert_eq!(record.identity("time"), None);
        assert_eq!(record.get_present("time"), None);
    }

    #[test]
    fn rejects_nested_values() {
        let error = Record::try_from(json!({"date": "2024-01-01", "tags": ["a"]}))
            .expect_err("nested array must be rejected");
        assert_eq!(
            error,
            ValidationError::NonScalarField {
                field: String::from("tags")
            }
        );
    }

    #[test]
    fn overlay_unions_fields_and_prefers_incoming() {
        let existing = Record::try_from(json!({"time": "2023-01-01", "open": 100, "close": 5}))
            .expect("existing");
        let incoming =
            Record::try_from(json!({"time": "2023-01-01", "close": 999})).expect("incoming");

        let merged = existing.overlaid_with(&incoming);
        assert_eq!(
            merged,
            Record::try_from(json!({"time": "2023-01-01", "open": 100, "close": 999}))
                .expect("expected")
        );
    }

    #[test]
    fn typed_models_flatten_and_rebuild() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct News {
            date: String,
            title: String,
            sentiment: Option<String>,
        }

        let news = News {
            date: String::from("2024-03-01"),
            title: String::from("Earnings beat"),
            sentiment: None,
        };
        let record = Record::from_model(&news).expect("flatten");
        assert_eq!(record.get("sentiment"), Some(&Scalar::Null));
        assert_eq!(record.to_model::<News>().expect("rebuild"), news);
    }
}
