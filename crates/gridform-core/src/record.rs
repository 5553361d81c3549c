//! Records and field values

use crate::value::Value;
use ahash::AHashMap;
use chrono::{DateTime, Utc};

/// One observation of a superposed cell
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Observed value
    pub value: Value,
    /// When the value was observed, if known
    pub timestamp: Option<DateTime<Utc>>,
    /// Context label the observation was made under (source, view, import batch...)
    pub context: Option<String>,
}

impl Observation {
    /// Create an observation without timestamp or context
    pub fn new<V: Into<Value>>(value: V) -> Self {
        Self {
            value: value.into(),
            timestamp: None,
            context: None,
        }
    }

    /// Set the observation timestamp
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the observation context
    pub fn in_context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// A cell holding several concurrently valid observations.
///
/// Formulas never see the cell itself; a [`ValueResolver`](crate::ValueResolver) picks the
/// dominant value first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SuperposedCell {
    observations: Vec<Observation>,
}

impl SuperposedCell {
    /// Create an empty cell
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observation (builder style)
    pub fn with(mut self, observation: Observation) -> Self {
        self.observations.push(observation);
        self
    }

    /// Add an observation
    pub fn push(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    /// Observations in declaration order
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Check if the cell has no observations
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

impl FromIterator<Observation> for SuperposedCell {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Self {
            observations: iter.into_iter().collect(),
        }
    }
}

/// The value stored under a field name
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain scalar
    Scalar(Value),
    /// Multi-observation cell
    Superposed(SuperposedCell),
}

impl FieldValue {
    /// Get the scalar, if this is not a superposed cell
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            FieldValue::Scalar(v) => Some(v),
            FieldValue::Superposed(_) => None,
        }
    }
}

macro_rules! scalar_field_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FieldValue {
                fn from(value: $t) -> Self {
                    FieldValue::Scalar(value.into())
                }
            }
        )*
    };
}

scalar_field_from!(Value, f64, i32, i64, bool, &str, String, DateTime<Utc>);

impl From<SuperposedCell> for FieldValue {
    fn from(cell: SuperposedCell) -> Self {
        FieldValue::Superposed(cell)
    }
}

/// A record: field name → value
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: AHashMap<String, FieldValue>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Look up a field holding a plain scalar
    pub fn scalar(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).and_then(FieldValue::as_scalar)
    }

    /// Set a field, replacing any previous value
    pub fn set<S: Into<String>, V: Into<FieldValue>>(&mut self, name: S, value: V) {
        self.fields.insert(name.into(), value.into());
    }

    /// Remove a field
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    /// Check if a field is present
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate over fields in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.set(name, value);
        }
        record
    }
}
