use async_graphql::{InputValueError, InputValueResult, Scalar, ScalarType, Value};
use chrono::{DateTime, SecondsFormat, Utc};

/// ISO-8601 date-time, serialized in UTC
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Date(pub DateTime<Utc>);

#[Scalar(name = "Date")]
impl ScalarType for Date {
    fn parse(value: Value) -> InputValueResult<Self> {
        match &value {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|ts| Date(ts.with_timezone(&Utc)))
                .map_err(|e| InputValueError::custom(format!("Invalid date: {}", e))),
            _ => Err(InputValueError::expected_type(value)),
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_date_serializes_as_utc_iso_string() {
        let date = Date(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        assert_eq!(date.to_value(), Value::from("2024-01-02T03:04:05.000Z"));
    }

    #[test]
    fn test_date_parses_offsets() {
        let parsed = Date::parse(Value::from("2024-01-02T05:04:05+02:00")).unwrap();
        assert_eq!(parsed.0, Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        assert!(Date::parse(Value::from(42)).is_err());
    }
}
