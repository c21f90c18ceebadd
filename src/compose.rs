use crate::error::FormatError;
use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt;

/// A value that can be turned into JSON later, when the record is composed.
///
/// Implemented for every [`Serialize`] type. Deferring the conversion lets an
/// unrepresentable payload value surface as a [`FormatError`] from the
/// formatter rather than when the field was attached.
pub trait ToJson {
    fn to_json(&self) -> Result<Value, serde_json::Error>;
}

impl<T: Serialize + ?Sized> ToJson for T {
    fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// One caller-supplied payload value.
pub enum FieldValue {
    /// Rendered as the error's display string.
    Error(Box<dyn Error + Send + Sync>),
    Value(Box<dyn ToJson + Send + Sync>),
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Error(e) => f.debug_tuple("Error").field(&e.to_string()).finish(),
            FieldValue::Value(v) => match v.to_json() {
                Ok(json) => f.debug_tuple("Value").field(&json).finish(),
                Err(_) => f.write_str("Value(<unencodable>)"),
            },
        }
    }
}

impl FieldValue {
    fn to_json(&self) -> Result<Value, serde_json::Error> {
        match self {
            FieldValue::Error(e) => Ok(Value::String(e.to_string())),
            FieldValue::Value(v) => v.to_json(),
        }
    }
}

/// Free-form key/value data attached to a log entry, kept in insertion order.
/// Setting a key twice replaces the earlier value.
#[derive(Debug, Default)]
pub struct Payload {
    fields: Vec<(String, FieldValue)>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn insert_value<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.insert(key, FieldValue::Value(Box::new(value)));
    }

    pub fn insert_error<E>(&mut self, key: impl Into<String>, err: E)
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        self.insert(key, FieldValue::Error(err.into()));
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            let json = value.to_json().map_err(S::Error::custom)?;
            map.serialize_entry(key, &json)?;
        }
        map.end()
    }
}

/// Builds one flat JSON object out of independently serialized sub-records.
///
/// Each sub-record must serialize to a JSON object. Its fields are written
/// into the shared object in the order the sub-records are merged; a
/// sub-record with no fields contributes nothing. When two sub-records
/// define the same key the later one wins.
#[derive(Debug, Default)]
pub struct Composer {
    fields: Map<String, Value>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the fields of `part` at the top level.
    pub fn merge(&mut self, name: &'static str, part: &dyn ToJson) -> Result<&mut Self, FormatError> {
        self.merge_except(name, part, &[])
    }

    /// Merge the fields of `part` at the top level, dropping any key listed
    /// in `reserved`. Fields already composed under those keys are kept.
    pub fn merge_except(
        &mut self,
        name: &'static str,
        part: &dyn ToJson,
        reserved: &[&str],
    ) -> Result<&mut Self, FormatError> {
        let Value::Object(fields) = part.to_json()? else {
            return Err(FormatError::NotAnObject { part: name });
        };

        let fields: Map<String, Value> = fields
            .into_iter()
            .filter(|(key, _)| {
                let keep = !reserved.contains(&key.as_str());
                if !keep {
                    tracing::debug!(part = name, key = %key, "dropping field with reserved key");
                }
                keep
            })
            .collect();

        if fields.is_empty() {
            tracing::trace!(part = name, "eliding empty sub-record");
            return Ok(self);
        }

        for (key, value) in fields {
            if self.fields.contains_key(&key) {
                tracing::debug!(part = name, key = %key, "sub-record overrides existing field");
            }
            self.fields.insert(key, value);
        }
        Ok(self)
    }

    /// Insert `part` as a nested object under `key`, unless it has no fields.
    pub fn nest(&mut self, key: &'static str, part: &dyn ToJson) -> Result<&mut Self, FormatError> {
        let value = part.to_json()?;
        match &value {
            Value::Object(fields) if fields.is_empty() => {
                tracing::trace!(part = key, "eliding empty nested sub-record");
            }
            Value::Object(_) => {
                self.fields.insert(key.to_string(), value);
            }
            _ => return Err(FormatError::NotAnObject { part: key }),
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Append the composed object to `buf` as compact JSON.
    pub fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), FormatError> {
        serde_json::to_writer(buf, &self.fields)?;
        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String, FormatError> {
        Ok(serde_json::to_string(&self.fields)?)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, FormatError> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }
}

/// Merge `parts` in order into one JSON object, eliding empty ones.
///
/// With every part empty the result is exactly `{}`.
pub fn compose<'a, I>(parts: I) -> Result<Vec<u8>, FormatError>
where
    I: IntoIterator<Item = (&'static str, &'a dyn ToJson)>,
{
    let mut composer = Composer::new();
    for (name, part) in parts {
        composer.merge(name, part)?;
    }
    composer.to_vec()
}
