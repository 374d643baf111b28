//! Millisecond-precision UTC timestamps.
//!
//! Every timestamp crosses the storage boundary as text in [`FORMAT`]. The
//! format is fixed width, so lexical order in SQL matches chronological
//! order, which the aggregate `ORDER BY` clauses rely on.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

/// Storage format: `2024-05-01T09:30:00.125Z`.
pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Current time, truncated to milliseconds.
pub fn now() -> DateTime<Utc> {
    truncate(Utc::now())
}

pub fn truncate(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(3)
}

/// The zero instant. A caller-supplied timestamp equal to this is rejected.
pub fn is_zero(ts: &DateTime<Utc>) -> bool {
    *ts == DateTime::<Utc>::default()
}

pub fn format(ts: &DateTime<Utc>) -> String {
    ts.format(FORMAT).to_string()
}

pub fn format_opt(ts: Option<&DateTime<Utc>>) -> Option<String> {
    ts.map(format)
}

#[derive(Debug, thiserror::Error)]
#[error("malformed timestamp '{0}'")]
pub struct ParseError(String);

/// Inverse of [`format`]. Anything [`format`] would not have written,
/// such as a missing fraction, is rejected.
pub fn parse(s: &str) -> Result<DateTime<Utc>, ParseError> {
    let ts = NaiveDateTime::parse_from_str(s, FORMAT)
        .map_err(|_| ParseError(s.to_string()))?
        .and_utc();
    if format(&ts) != s {
        return Err(ParseError(s.to_string()));
    }
    Ok(ts)
}

/// Serde adapter for timestamps embedded in aggregated JSON.
pub mod serde_ms {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse(&raw).map_err(de::Error::custom)
    }
}

/// Optional variant of [`serde_ms`]; JSON `null` maps to `None`.
pub mod serde_ms_opt {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(ts: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => s.serialize_str(&super::format(ts)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) => super::parse(&raw).map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}
