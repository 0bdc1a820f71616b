//! Wall-clock time handling shared by the scheduling cells.
//!
//! Times-of-day travel the wire as `"HH:MM"` strings. They are parsed once at
//! the serde boundary into [`chrono::NaiveTime`]; all interval arithmetic
//! happens on minutes-since-midnight integers.

use chrono::{NaiveTime, Timelike};

pub const HH_MM: &str = "%H:%M";

/// Minutes since midnight for a wall-clock time.
pub fn minute_of_day(t: NaiveTime) -> i32 {
    (t.hour() * 60 + t.minute()) as i32
}

/// Inverse of [`minute_of_day`]. Returns `None` past the end of the day.
pub fn time_from_minutes(minutes: i32) -> Option<NaiveTime> {
    if minutes < 0 {
        return None;
    }
    NaiveTime::from_hms_opt(minutes as u32 / 60, minutes as u32 % 60, 0)
}

/// Parse an `"HH:MM"` string; seconds are tolerated for rows written by hand.
pub fn parse_hh_mm(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(s, HH_MM).or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
}

/// Serde adapter for `NaiveTime` fields stored as `"HH:MM"`.
pub mod hh_mm {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(t: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&t.format(super::HH_MM).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_hh_mm(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minute_of_day_counts_from_midnight() {
        let t = NaiveTime::from_hms_opt(9, 45, 0).unwrap();
        assert_eq!(minute_of_day(t), 585);
    }

    #[test]
    fn time_from_minutes_carries_over_the_hour() {
        // 09:45 + 30min lands at 10:15
        let t = time_from_minutes(585 + 30).unwrap();
        assert_eq!(t, NaiveTime::from_hms_opt(10, 15, 0).unwrap());
    }

    #[test]
    fn time_from_minutes_rejects_out_of_range() {
        assert!(time_from_minutes(24 * 60).is_none());
        assert!(time_from_minutes(-1).is_none());
    }

    #[test]
    fn parse_accepts_with_and_without_seconds() {
        assert_eq!(
            parse_hh_mm("14:05").unwrap(),
            NaiveTime::from_hms_opt(14, 5, 0).unwrap()
        );
        assert_eq!(
            parse_hh_mm("14:05:00").unwrap(),
            NaiveTime::from_hms_opt(14, 5, 0).unwrap()
        );
        assert!(parse_hh_mm("25:00").is_err());
    }
}
