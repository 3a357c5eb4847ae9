//! Field-level request validation shared by the HTTP handlers.
//!
//! Failures become `invalid_request` errors whose details name the field,
//! a machine-readable reason and, where useful, the rejected value.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::Error;

/// Name of a path, query or body field as clients spell it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }
}

/// Why a field was refused; serialized into `details.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reason {
    MissingField,
    InvalidUuid,
    InvalidTimestamp,
    InvalidValue,
}

impl Reason {
    const fn code(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::InvalidValue => "invalid_value",
        }
    }
}

fn reject(field: FieldName, reason: Reason, message: String, value: Option<&str>) -> Error {
    let mut details = Map::new();
    details.insert("field".to_owned(), Value::from(field.0));
    details.insert("code".to_owned(), Value::from(reason.code()));
    if let Some(raw) = value {
        details.insert("value".to_owned(), Value::from(raw));
    }
    Error::invalid_request(message).with_details(Value::Object(details))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    reject(
        field,
        Reason::MissingField,
        format!("missing required field: {}", field.0),
        None,
    )
}

/// Refuse a field whose value failed a domain parse.
pub(crate) fn invalid_field_error(field: FieldName, message: impl Display) -> Error {
    reject(field, Reason::InvalidValue, message.to_string(), None)
}

/// Parse a typed identifier from a path or body field.
pub(crate) fn parse_id<T: From<Uuid>>(value: &str, field: FieldName) -> Result<T, Error> {
    Uuid::parse_str(value.trim()).map(T::from).map_err(|_| {
        reject(
            field,
            Reason::InvalidUuid,
            format!("{} must be a valid UUID", field.0),
            Some(value),
        )
    })
}

/// Parse an optional query value; blank counts as absent.
pub(crate) fn parse_optional<T>(value: Option<&str>, field: FieldName) -> Result<Option<T>, Error>
where
    T: FromStr,
    T::Err: Display,
{
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|error| invalid_field_error(field, error)),
    }
}

/// Parse an optional RFC 3339 timestamp into UTC; blank counts as absent.
pub(crate) fn parse_optional_rfc3339_timestamp(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<DateTime<Utc>>, Error> {
    let Some(raw) = value.filter(|raw| !raw.trim().is_empty()) else {
        return Ok(None);
    };
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|timestamp| Some(timestamp.with_timezone(&Utc)))
        .map_err(|_| {
            reject(
                field,
                Reason::InvalidTimestamp,
                format!("{} must be an RFC 3339 timestamp", field.0),
                Some(&raw),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::domain::{CaseId, ErrorCode as DomainCode, QuoteStatus};

    const FIELD: FieldName = FieldName::new("case_id");

    #[test]
    fn parses_typed_ids() {
        let id: CaseId =
            parse_id(" 33333333-3333-4333-8333-333333333333 ", FIELD).expect("valid uuid");
        assert_eq!(id.to_string(), "33333333-3333-4333-8333-333333333333");
    }

    #[test]
    fn invalid_ids_carry_field_details() {
        let err = parse_id::<CaseId>("nope", FIELD).expect_err("invalid uuid");
        assert_eq!(err.code(), DomainCode::InvalidRequest);
        let details = err.details().expect("details");
        assert_eq!(details["field"], "case_id");
        assert_eq!(details["code"], "invalid_uuid");
        assert_eq!(details["value"], "nope");
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some("accepted"), Some(QuoteStatus::Accepted))]
    fn optional_values(#[case] raw: Option<&str>, #[case] expected: Option<QuoteStatus>) {
        let parsed = parse_optional::<QuoteStatus>(raw, FieldName::new("status"))
            .expect("valid optional value");
        assert_eq!(parsed, expected);
    }

    #[test]
    fn unknown_optional_value_is_rejected() {
        let err = parse_optional::<QuoteStatus>(Some("paid"), FieldName::new("status"))
            .expect_err("unknown status");
        assert_eq!(err.details().expect("details")["code"], "invalid_value");
    }

    #[rstest]
    #[case(Some("2026-03-01T09:30:00+08:00".to_owned()), true)]
    #[case(None, false)]
    fn optional_timestamps(#[case] raw: Option<String>, #[case] present: bool) {
        let parsed = parse_optional_rfc3339_timestamp(raw, FieldName::new("created_since"))
            .expect("valid timestamp");
        assert_eq!(parsed.is_some(), present);
    }

    #[test]
    fn missing_fields_have_no_value() {
        let err = missing_field_error(FieldName::new("file"));
        let details = err.details().expect("details");
        assert_eq!(details["field"], "file");
        assert_eq!(details["code"], "missing_field");
        assert!(details.get("value").is_none());
    }

    #[test]
    fn malformed_timestamp_is_rejected() {
        let err = parse_optional_rfc3339_timestamp(
            Some("yesterday".to_owned()),
            FieldName::new("created_since"),
        )
        .expect_err("not RFC 3339");
        assert_eq!(err.details().expect("details")["code"], "invalid_timestamp");
    }
}
