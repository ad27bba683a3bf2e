use chrono::{DateTime, TimeZone, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn to_rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub fn from_rfc3339(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

/// Converts a `seconds + nanoseconds` pair, the shape document stores use
/// for native timestamps.
pub fn from_unix_parts(seconds: i64, nanoseconds: u32) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, nanoseconds).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_round_trips() {
        let parsed = from_rfc3339("2025-03-01T10:15:00Z").unwrap();
        assert_eq!(to_rfc3339(parsed), "2025-03-01T10:15:00+00:00");
    }

    #[test]
    fn unix_parts_rejects_out_of_range_nanos() {
        assert!(from_unix_parts(0, 2_000_000_000).is_none());
        assert_eq!(from_unix_parts(60, 0).unwrap().timestamp(), 60);
    }
}
