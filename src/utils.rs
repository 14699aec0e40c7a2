/// Utility functions
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use url::Url;

/// Wire format of `date_created`, always UTC with a literal `Z`
pub const CREATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Read the `page` query parameter out of a request URL.
///
/// Returns `None` when the URL does not parse, has no `page` parameter, or
/// the value is not a non-negative integer.
pub fn page_from_href(href: &str) -> Option<u32> {
    let url = Url::parse(href).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.trim().parse::<u32>().ok())
}

/// Parse a creation timestamp.
///
/// The fixed wire format comes first; any other RFC 3339 timestamp (with
/// fractional seconds or an offset) is accepted and normalized to UTC.
pub fn parse_created(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, CREATED_FORMAT)
        .ok()
        .map(|ndt| Utc.from_utc_datetime(&ndt))
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

/// Render a creation timestamp back into the fixed wire format
pub fn format_created(dt: &DateTime<Utc>) -> String {
    dt.format(CREATED_FORMAT).to_string()
}

/// Serde adapter for `date_created` fields
pub mod created_format {
    use super::{format_created, parse_created, CREATED_FORMAT};
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_created(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_created(&s).ok_or_else(|| {
            de::Error::custom(format!(
                "date_created {:?} is neither {} nor RFC 3339",
                s, CREATED_FORMAT
            ))
        })
    }
}
