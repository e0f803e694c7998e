//! Expiration tokens offered to authors.
//!
//! Authors choose a lifetime from a short fixed list; anything else means the
//! post never expires. Calendar periods use calendar arithmetic with
//! overflow rollover: one month after January 31 is March 2 or 3, not the end
//! of February.

use chrono::{DateTime, Datelike, Days, Duration, Months, Utc};

/// A recognized post lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expiration {
    /// `"1 hour"`
    Hour,
    /// `"1 day"`
    Day,
    /// `"1 month"`
    Month,
    /// `"1 year"`
    Year,
}

impl Expiration {
    /// Parses a lifetime token. Unknown tokens, including the empty string, yield `None`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "1 hour" => Some(Self::Hour),
            "1 day" => Some(Self::Day),
            "1 month" => Some(Self::Month),
            "1 year" => Some(Self::Year),
            _ => None,
        }
    }

    /// The token this lifetime is parsed from.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "1 hour",
            Self::Day => "1 day",
            Self::Month => "1 month",
            Self::Year => "1 year",
        }
    }

    /// Returns the instant this lifetime ends when started at `now`.
    ///
    /// Returns `None` only if the result is outside the representable range.
    #[must_use]
    pub fn after(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Hour => now.checked_add_signed(Duration::hours(1)),
            Self::Day => now.checked_add_days(Days::new(1)),
            Self::Month => add_months_rolling(now, 1),
            Self::Year => add_months_rolling(now, 12),
        }
    }
}

/// Adds calendar months keeping the day-of-month offset, so a day that does
/// not exist in the target month spills into the following one.
fn add_months_rolling(at: DateTime<Utc>, months: u32) -> Option<DateTime<Utc>> {
    let first_of_month = at.with_day(1)?;
    let shifted = first_of_month.checked_add_months(Months::new(months))?;
    shifted.checked_add_days(Days::new(u64::from(at.day0())))
}

/// Resolves a lifetime token against the current time.
#[must_use]
pub fn resolve(token: &str) -> Option<DateTime<Utc>> {
    resolve_at(token, Utc::now())
}

/// Resolves a lifetime token against `now`.
#[must_use]
pub fn resolve_at(token: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    Expiration::parse(token).and_then(|expiration| expiration.after(now))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[rstest]
    #[case::hour("1 hour", at(2024, 3, 10, 23, 30), at(2024, 3, 11, 0, 30))]
    #[case::day("1 day", at(2024, 2, 28, 8, 0), at(2024, 2, 29, 8, 0))]
    #[case::month("1 month", at(2024, 4, 15, 12, 0), at(2024, 5, 15, 12, 0))]
    #[case::year("1 year", at(2023, 7, 1, 0, 0), at(2024, 7, 1, 0, 0))]
    #[case::month_end_leap("1 month", at(2024, 1, 31, 9, 15), at(2024, 3, 2, 9, 15))]
    #[case::month_end("1 month", at(2023, 1, 31, 9, 15), at(2023, 3, 3, 9, 15))]
    #[case::december("1 month", at(2023, 12, 31, 0, 0), at(2024, 1, 31, 0, 0))]
    #[case::leap_day_year("1 year", at(2024, 2, 29, 6, 0), at(2025, 3, 1, 6, 0))]
    fn test_resolve_at(#[case] token: &str, #[case] now: DateTime<Utc>, #[case] expected: DateTime<Utc>) {
        assert_eq!(resolve_at(token, now), Some(expected));
    }

    #[rstest]
    #[case::empty("")]
    #[case::junk("junk")]
    #[case::case_sensitive("1 Hour")]
    #[case::padded(" 1 day")]
    #[case::plural("2 days")]
    fn test_unknown_tokens_never_expire(#[case] token: &str) {
        assert_eq!(resolve_at(token, at(2024, 1, 1, 0, 0)), None);
        assert_eq!(resolve(token), None);
    }

    #[test]
    fn test_resolve_uses_current_time() {
        let before = Utc::now();
        let resolved = resolve("1 hour").unwrap();
        let after = Utc::now();

        assert!(resolved >= before + Duration::hours(1));
        assert!(resolved <= after + Duration::hours(1));
    }

    proptest::proptest! {
        #[test]
        fn calendar_periods_stay_in_range(secs in 0i64..4_102_444_800) {
            let now = DateTime::from_timestamp(secs, 0).unwrap();

            let hour = Expiration::Hour.after(now).unwrap();
            proptest::prop_assert_eq!(hour - now, Duration::hours(1));

            let day = Expiration::Day.after(now).unwrap();
            proptest::prop_assert_eq!(day - now, Duration::days(1));

            let month = (Expiration::Month.after(now).unwrap() - now).num_days();
            proptest::prop_assert!((28..=31).contains(&month), "month was {} days", month);

            let year = (Expiration::Year.after(now).unwrap() - now).num_days();
            proptest::prop_assert!((365..=366).contains(&year), "year was {} days", year);
        }
    }

    #[test]
    fn test_tokens_round_trip() {
        for expiration in [Expiration::Hour, Expiration::Day, Expiration::Month, Expiration::Year] {
            assert_eq!(Expiration::parse(expiration.as_str()), Some(expiration));
        }
    }
}
