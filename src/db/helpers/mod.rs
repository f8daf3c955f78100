use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::ValueRef;

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

/// `hash_sum` is declared TEXT, but rows written by other tools may carry the
/// integer unconverted.
pub fn parse_checksum(value: ValueRef<'_>) -> Result<i64> {
    match value {
        ValueRef::Integer(sum) => Ok(sum),
        ValueRef::Text(raw) => {
            let text = std::str::from_utf8(raw).context("hash_sum is not valid UTF-8")?;
            text.trim()
                .parse::<i64>()
                .with_context(|| format!("hash_sum '{text}' is not an integer"))
        }
        other => Err(anyhow!("hash_sum has unexpected type {:?}", other.data_type())),
    }
}

/// Wraps an application error so it can leave a rusqlite row mapper.
pub fn to_sql_error(err: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{err:#}"),
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_accepts_text_and_integer() {
        assert_eq!(parse_checksum(ValueRef::Text(b"-42")).unwrap(), -42);
        assert_eq!(parse_checksum(ValueRef::Text(b" 7 ")).unwrap(), 7);
        assert_eq!(parse_checksum(ValueRef::Integer(99)).unwrap(), 99);
    }

    #[test]
    fn checksum_rejects_other_values() {
        assert!(parse_checksum(ValueRef::Text(b"abc")).is_err());
        assert!(parse_checksum(ValueRef::Null).is_err());
        assert!(parse_checksum(ValueRef::Real(1.5)).is_err());
    }

    #[test]
    fn datetimes_round_trip_through_rfc3339() {
        let now = Utc::now();
        let parsed = parse_datetime(&now.to_rfc3339(), "captured_at").unwrap();
        assert_eq!(parsed, now);
        assert!(parse_optional_datetime(None, "captured_at").unwrap().is_none());
        assert!(parse_datetime("yesterday", "captured_at").is_err());
    }
}
