//! JSON representation of records
//!
//! A record is a JSON object. Numbers, strings, booleans and `null` are scalar fields; an
//! object with an `observations` array is a superposed cell:
//!
//! ```json
//! {
//!   "Price": 100,
//!   "Status": {
//!     "observations": [
//!       { "value": "draft", "timestamp": "2024-01-01T00:00:00Z", "context": "editor" },
//!       { "value": "final", "timestamp": "2024-02-01T00:00:00Z" }
//!     ]
//!   }
//! }
//! ```

use crate::error::Result;
use gridform_core::{
    parse_date, Error as CoreError, FieldValue, Observation, Record, SuperposedCell, Value,
};
use serde_json::{json, Map, Number, Value as Json};

/// Build a record from a JSON object
pub fn record_from_json(json: &Json) -> Result<Record> {
    let object = json
        .as_object()
        .ok_or_else(|| CoreError::InvalidRecord("record must be a JSON object".to_string()))?;

    let mut record = Record::new();
    for (name, value) in object {
        record.set(name.as_str(), field_from_json(name, value)?);
    }
    Ok(record)
}

/// Parse a record from JSON text
pub fn record_from_str(s: &str) -> Result<Record> {
    record_from_json(&serde_json::from_str(s)?)
}

fn field_from_json(name: &str, json: &Json) -> Result<FieldValue> {
    match json {
        Json::Object(object) => {
            let observations = object
                .get("observations")
                .and_then(Json::as_array)
                .ok_or_else(|| {
                    CoreError::InvalidRecord(format!(
                        "field '{}': objects must carry an 'observations' array",
                        name
                    ))
                })?;

            let mut cell = SuperposedCell::new();
            for obs in observations {
                cell.push(observation_from_json(name, obs)?);
            }
            Ok(FieldValue::Superposed(cell))
        }
        other => Ok(FieldValue::Scalar(scalar_from_json(name, other)?)),
    }
}

fn observation_from_json(name: &str, json: &Json) -> Result<Observation> {
    let invalid = |what: &str| CoreError::InvalidRecord(format!("field '{}': {}", name, what));

    let object = json.as_object().ok_or_else(|| invalid("observation must be an object"))?;
    let value = match object.get("value") {
        Some(v) => scalar_from_json(name, v)?,
        None => Value::Empty,
    };

    let mut observation = Observation::new(value);
    if let Some(ts) = object.get("timestamp").filter(|ts| !ts.is_null()) {
        let parsed = ts
            .as_str()
            .and_then(parse_date)
            .ok_or_else(|| invalid("observation timestamp is not a date"))?;
        observation = observation.at(parsed);
    }
    if let Some(context) = object.get("context").and_then(Json::as_str) {
        observation = observation.in_context(context);
    }
    Ok(observation)
}

fn scalar_from_json(name: &str, json: &Json) -> Result<Value> {
    Ok(match json {
        Json::Null => Value::Empty,
        Json::Bool(b) => Value::Boolean(*b),
        Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        Json::String(s) => Value::String(s.clone()),
        Json::Array(_) | Json::Object(_) => {
            return Err(CoreError::InvalidRecord(format!(
                "field '{}': expected a scalar value",
                name
            ))
            .into())
        }
    })
}

/// Convert a record to a JSON object with sorted keys
pub fn record_to_json(record: &Record) -> Json {
    let mut object = Map::new();
    for (name, field) in record.iter() {
        let value = match field {
            FieldValue::Scalar(v) => scalar_to_json(v),
            FieldValue::Superposed(cell) => {
                let observations: Vec<Json> = cell
                    .observations()
                    .iter()
                    .map(|obs| {
                        let mut o = Map::new();
                        o.insert("value".to_string(), scalar_to_json(&obs.value));
                        if let Some(ts) = obs.timestamp {
                            o.insert("timestamp".to_string(), scalar_to_json(&Value::Date(ts)));
                        }
                        if let Some(context) = &obs.context {
                            o.insert("context".to_string(), json!(context));
                        }
                        Json::Object(o)
                    })
                    .collect();
                json!({ "observations": observations })
            }
        };
        object.insert(name.to_string(), value);
    }
    Json::Object(object)
}

/// JSON form of a scalar; dates and non-finite numbers become their text form
pub fn scalar_to_json(value: &Value) -> Json {
    match value {
        Value::Empty => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::String(s) => Json::String(s.clone()),
        Value::Number(n) => match Number::from_f64(*n) {
            Some(_) if n.fract() == 0.0 && n.abs() < 9.0e15 => json!(*n as i64),
            Some(num) => Json::Number(num),
            None => Json::String(value.to_text()),
        },
        Value::Date(_) => Json::String(value.to_text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gridform_core::{MostRecentObservation, ValueResolver, ViewContext};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalar_fields() {
        let record = record_from_json(&json!({
            "Price": 100,
            "Name": "Widget",
            "Active": true,
            "Notes": null
        }))
        .unwrap();

        assert_eq!(record.scalar("Price"), Some(&Value::Number(100.0)));
        assert_eq!(record.scalar("Name"), Some(&Value::string("Widget")));
        assert_eq!(record.scalar("Active"), Some(&Value::Boolean(true)));
        assert_eq!(record.scalar("Notes"), Some(&Value::Empty));
    }

    #[test]
    fn test_superposed_field() {
        let record = record_from_str(
            r#"{"Status": {"observations": [
                {"value": "draft", "timestamp": "2024-01-01T00:00:00Z", "context": "editor"},
                {"value": "final", "timestamp": "2024-02-01"}
            ]}}"#,
        )
        .unwrap();

        let FieldValue::Superposed(cell) = record.get("Status").unwrap() else {
            panic!("expected a superposed cell");
        };
        assert_eq!(cell.observations().len(), 2);
        assert_eq!(cell.observations()[0].context.as_deref(), Some("editor"));
        assert_eq!(
            MostRecentObservation.resolve(cell, &ViewContext::default()),
            Value::string("final")
        );
    }

    #[test]
    fn test_invalid_records() {
        assert!(record_from_json(&json!([1, 2])).is_err());
        assert!(record_from_json(&json!({"A": [1]})).is_err());
        assert!(record_from_json(&json!({"A": {"x": 1}})).is_err());
        let bad_timestamp = json!({"A": {"observations": [{"value": 1, "timestamp": "soon"}]}});
        assert!(record_from_json(&bad_timestamp).is_err());
        assert!(record_from_str("{not json").is_err());
    }

    #[test]
    fn test_record_to_json() {
        let mut record = Record::new();
        record.set("Total", 500.0);
        record.set("Ratio", 0.5);
        record.set("Bad", f64::NAN);
        record.set("When", Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
        record.set("Missing", Value::Empty);

        assert_eq!(
            record_to_json(&record),
            json!({
                "Bad": "NaN",
                "Missing": null,
                "Ratio": 0.5,
                "Total": 500,
                "When": "2024-03-15T00:00:00.000Z"
            })
        );
    }
}
