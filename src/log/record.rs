use chrono::DateTime;
use chrono_tz::Tz;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::value::{render, Value, WriteError};
use super::Field;

/// Backend-neutral form of one entry, with every field mapped onto a typed
/// JSON value.
///
/// Field order and duplicate labels are preserved, also when serialized.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Tz>,
    pub logger: Option<String>,
    pub message: String,
    #[serde(serialize_with = "serialize_fields")]
    pub fields: Vec<(String, serde_json::Value)>,
}

impl LogRecord {
    pub fn new<'a>(
        timestamp: DateTime<Tz>,
        logger: &str,
        message: &str,
        fields: impl IntoIterator<Item = &'a Field>,
    ) -> Result<Self, WriteError> {
        let fields = fields
            .into_iter()
            .map(|f| Ok((f.label.clone(), json_value(&f.value)?)))
            .collect::<Result<Vec<_>, WriteError>>()?;
        Ok(Self {
            timestamp,
            logger: (!logger.is_empty()).then(|| logger.to_string()),
            message: message.to_string(),
            fields,
        })
    }

    /// The fields as one JSON object.
    pub fn fields_json(&self) -> String {
        serde_json::to_string(&FieldsJson(&self.fields)).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Map a [`Value`] onto the JSON type matching its variant.
///
/// Integers stay numbers; strings, stringers and errors become strings;
/// reflected values become their `Debug` text. Absent stringers and errors
/// become `"<nil>"`, and panics while rendering are returned as errors.
pub fn json_value(value: &Value) -> Result<serde_json::Value, WriteError> {
    Ok(match value {
        Value::Int64(i) => serde_json::Value::from(*i),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Reflect(r) => serde_json::Value::String(render(Some(|| format!("{r:?}")))?),
        Value::Stringer(s) => serde_json::Value::String(render(s.as_ref().map(|s| move || s.to_string()))?),
        Value::Error(e) => serde_json::Value::String(render(e.as_ref().map(|e| move || e.to_string()))?),
    })
}

struct FieldsJson<'a>(&'a [(String, serde_json::Value)]);

impl Serialize for FieldsJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_fields(self.0, serializer)
    }
}

fn serialize_fields<S: Serializer>(
    fields: &[(String, serde_json::Value)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(fields.len()))?;
    for (label, value) in fields {
        map.serialize_entry(label, value)?;
    }
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fmt;

    fn at() -> DateTime<Tz> {
        Tz::UTC.with_ymd_and_hms(2022, 3, 9, 19, 51, 0).unwrap()
    }

    #[derive(Debug)]
    struct Failed;

    impl fmt::Display for Failed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("failed")
        }
    }

    impl std::error::Error for Failed {}

    #[test]
    fn maps_fields_by_variant() {
        let fields = [
            Field::error(Failed),
            Field::int64("ID", 1),
            Field::int64("neg", -1),
            Field::reflect("values", vec![1, 2]),
            Field::string("name", "something"),
            Field::stringer("string", "stringed"),
            Field::shared_error(None),
            Field::new("absent", Value::Stringer(None)),
        ];
        let record = LogRecord::new(at(), "", "abc", &fields).unwrap();
        assert_eq!(record.logger, None);
        assert_eq!(
            record.fields_json(),
            r#"{"error":"failed","ID":1,"neg":-1,"values":"[1, 2]","name":"something","string":"stringed","error":"<nil>","absent":"<nil>"}"#
        );
    }

    #[test]
    fn panicking_reflect_is_an_error() {
        struct BadDebug;

        impl fmt::Debug for BadDebug {
            fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
                panic!("oh, no!")
            }
        }

        let fields = [Field::reflect("r", BadDebug)];
        assert_eq!(
            LogRecord::new(at(), "", "abc", &fields),
            Err(WriteError::Panic("oh, no!".into()))
        );
    }

    #[test]
    fn keeps_duplicate_labels_in_order() {
        let fields = [Field::int64("a", 1), Field::int64("a", 2)];
        let record = LogRecord::new(at(), "x", "m", &fields).unwrap();
        assert_eq!(record.logger.as_deref(), Some("x"));
        assert_eq!(record.fields_json(), r#"{"a":1,"a":2}"#);
    }

    #[test]
    fn serializes_whole_record() {
        let record = LogRecord::new(at(), "svc", "m", &[Field::int64("a", 1)]).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["logger"], "svc");
        assert_eq!(json["message"], "m");
        assert_eq!(json["fields"]["a"], 1);
        assert!(json["timestamp"].as_str().is_some_and(|t| t.starts_with("2022-03-09T19:51:00")));
    }
}
