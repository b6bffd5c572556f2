//! Off-peak («heures creuses») windows.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Local, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, de};

/// Recurring daily wall-clock window, `[start, end)`.
///
/// A window whose end precedes its start wraps past midnight.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct OffPeakPeriod {
    #[serde(deserialize_with = "deserialize_time_of_day")]
    pub start: NaiveTime,

    #[serde(deserialize_with = "deserialize_time_of_day")]
    pub end: NaiveTime,
}

impl OffPeakPeriod {
    #[cfg(test)]
    pub const fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn wraps_midnight(self) -> bool {
        self.end < self.start
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    #[must_use]
    pub fn contains(self, time_of_day: NaiveTime) -> bool {
        if self.wraps_midnight() {
            time_of_day >= self.start || time_of_day < self.end
        } else {
            self.start <= time_of_day && time_of_day < self.end
        }
    }
}

impl Display for OffPeakPeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// Configured off-peak windows, tested as a union.
#[must_use]
#[derive(
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    derive_more::Deref,
    derive_more::From,
)]
#[serde(transparent)]
pub struct OffPeakPeriods(Vec<OffPeakPeriod>);

impl OffPeakPeriods {
    /// Check whether the local time of day of the timestamp falls into any window.
    ///
    /// Always `false` when no windows are configured.
    #[must_use]
    pub fn is_offpeak(&self, timestamp: DateTime<Local>) -> bool {
        let time_of_day = timestamp.time();
        self.0.iter().any(|period| period.contains(time_of_day))
    }
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
}

fn deserialize_time_of_day<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<NaiveTime, D::Error> {
    let value = String::deserialize(deserializer)?;
    parse_time_of_day(&value).map_err(|_| {
        <D::Error as de::Error>::invalid_value(
            de::Unexpected::Str(&value),
            &"a time of day as HH:MM",
        )
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, 15, hour, minute, 0).unwrap()
    }

    fn period(start: &str, end: &str) -> OffPeakPeriod {
        OffPeakPeriod::new(parse_time_of_day(start).unwrap(), parse_time_of_day(end).unwrap())
    }

    #[test]
    fn test_empty_periods_never_offpeak() {
        let periods = OffPeakPeriods::default();
        for hour in 0..24 {
            assert!(!periods.is_offpeak(at(hour, 0)));
            assert!(!periods.is_offpeak(at(hour, 59)));
        }
    }

    #[test]
    fn test_wrapping_period() {
        let periods = OffPeakPeriods::from(vec![period("22:00", "06:00")]);
        assert!(periods.is_offpeak(at(23, 0)));
        assert!(periods.is_offpeak(at(5, 0)));
        assert!(periods.is_offpeak(at(0, 0)));
        assert!(!periods.is_offpeak(at(12, 0)));
    }

    #[test]
    fn test_boundaries_are_half_open() {
        let periods =
            OffPeakPeriods::from(vec![period("22:00", "06:00"), period("12:30", "14:30")]);
        assert!(periods.is_offpeak(at(22, 0)));
        assert!(!periods.is_offpeak(at(6, 0)));
        assert!(!periods.is_offpeak(at(21, 59)));
        assert!(periods.is_offpeak(at(12, 30)));
        assert!(!periods.is_offpeak(at(14, 30)));
        assert!(periods.is_offpeak(at(14, 29)));
    }

    #[test]
    fn test_overlapping_periods_are_union() {
        let periods =
            OffPeakPeriods::from(vec![period("01:00", "05:00"), period("03:00", "07:00")]);
        assert!(periods.is_offpeak(at(2, 0)));
        assert!(periods.is_offpeak(at(4, 0)));
        assert!(periods.is_offpeak(at(6, 0)));
        assert!(!periods.is_offpeak(at(7, 0)));
    }

    #[test]
    fn test_calendar_date_is_ignored() {
        let periods = OffPeakPeriods::from(vec![period("22:00", "06:00")]);
        let summer = Local.with_ymd_and_hms(2025, 7, 1, 23, 0, 0).unwrap();
        assert!(periods.is_offpeak(summer));
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("06:00").unwrap(), NaiveTime::from_hms_opt(6, 0, 0).unwrap());
        assert_eq!(
            parse_time_of_day("06:00:30").unwrap(),
            NaiveTime::from_hms_opt(6, 0, 30).unwrap()
        );
        assert!(parse_time_of_day("6h").is_err());
    }

    #[test]
    fn test_deserialize_ok() {
        // language=toml
        let periods: OffPeakPeriods = toml::from_str::<Wrapper>(
            r#"
            periods = [{ start = "22:00", end = "06:00" }, { start = "12:30:00", end = "14:30" }]
            "#,
        )
        .unwrap()
        .periods;
        assert_eq!(periods.len(), 2);
        assert!(periods[0].wraps_midnight());
        assert!(!periods[1].wraps_midnight());
    }

    #[test]
    fn test_display() {
        assert_eq!(period("22:00", "06:00").to_string(), "22:00-06:00");
    }

    #[derive(Deserialize)]
    struct Wrapper {
        periods: OffPeakPeriods,
    }
}
