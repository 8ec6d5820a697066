use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single date cell. Identity is the date; there is never more than one
/// `CalendarDay` per date inside a [`crate::MonthIndex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub selected: bool,
}

impl CalendarDay {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            selected: false,
        }
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

/// Which neighbour of a day to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

pub fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().expect("next day should exist")
}

pub fn previous_day(date: NaiveDate) -> NaiveDate {
    date.pred_opt().expect("previous day should exist")
}

/// Identity of a calendar month, independent of any day in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Earliest month chrono can represent.
    pub const MIN: YearMonth = YearMonth {
        year: -262_144,
        month: 1,
    };
    /// Latest month chrono can represent.
    pub const MAX: YearMonth = YearMonth {
        year: 262_143,
        month: 12,
    };

    /// Months outside 1..=12 and years outside chrono's date range are
    /// clamped rather than rejected.
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year: year.clamp(Self::MIN.year, Self::MAX.year),
            month: month.clamp(1, 12),
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("first day of month must be valid")
    }

    pub fn last_day(&self) -> NaiveDate {
        let next_first = match self.month {
            12 => NaiveDate::from_ymd_opt(self.year + 1, 1, 1),
            month => NaiveDate::from_ymd_opt(self.year, month + 1, 1),
        };
        match next_first.and_then(|date| date.pred_opt()) {
            Some(date) => date,
            None => NaiveDate::MAX,
        }
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    /// Saturates at [`Self::MIN`] and [`Self::MAX`].
    pub fn shift(&self, delta: i32) -> Self {
        let total = (Self::index(*self) + i64::from(delta))
            .clamp(Self::index(Self::MIN), Self::index(Self::MAX));
        Self {
            year: total.div_euclid(12) as i32,
            month: total.rem_euclid(12) as u32 + 1,
        }
    }

    fn index(month: YearMonth) -> i64 {
        i64::from(month.year) * 12 + i64::from(month.month) - 1
    }

    /// Signed number of months from `self` to `other`.
    pub fn months_until(&self, other: YearMonth) -> i32 {
        (other.year - self.year) * 12 + (other.month as i32 - self.month as i32)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let first = self.first_day();
        (0..self.days_in_month()).map(move |offset| first + Duration::days(offset.into()))
    }

    /// Blank cells before the 1st when weeks start on `week_start`.
    pub fn leading_blanks(&self, week_start: Weekday) -> u32 {
        let first = self.first_day().weekday();
        (first.num_days_from_monday() + 7 - week_start.num_days_from_monday()) % 7
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearMonthParseError {
    input: String,
}

impl Display for YearMonthParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid year-month `{}`, expected YYYY-MM", self.input)
    }
}

impl std::error::Error for YearMonthParseError {}

impl FromStr for YearMonth {
    type Err = YearMonthParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || YearMonthParseError {
            input: raw.to_string(),
        };
        let trimmed = raw.trim();
        // a leading minus belongs to the year
        let split_at = trimmed
            .char_indices()
            .skip(1)
            .find(|(_, ch)| *ch == '-')
            .map(|(index, _)| index)
            .ok_or_else(invalid)?;
        let year = trimmed[..split_at].parse::<i32>().map_err(|_| invalid())?;
        let month = trimmed[split_at + 1..].parse::<u32>().map_err(|_| invalid())?;
        Ok(YearMonth::new(year, month))
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Weekday};

    use super::YearMonth;

    #[test]
    fn clamps_out_of_range_months() {
        assert_eq!(YearMonth::new(2024, 0), YearMonth::new(2024, 1));
        assert_eq!(YearMonth::new(2024, 13), YearMonth::new(2024, 12));
        assert_eq!("2024-17".parse::<YearMonth>().unwrap(), YearMonth::new(2024, 12));
        assert!("2024/03".parse::<YearMonth>().is_err());
        assert!("march".parse::<YearMonth>().is_err());
    }

    #[test]
    fn shifts_across_year_boundaries() {
        let january = YearMonth::new(2024, 1);
        assert_eq!(january.shift(-1), YearMonth::new(2023, 12));
        assert_eq!(january.shift(13), YearMonth::new(2025, 2));
        assert_eq!(january.months_until(YearMonth::new(2023, 11)), -2);
        assert_eq!(january.months_until(january.shift(26)), 26);
    }

    #[test]
    fn clamps_years_to_the_supported_date_range() {
        let far = "300000-01".parse::<YearMonth>().unwrap();
        assert_eq!(far, YearMonth::new(262_143, 1));
        assert_eq!(far.first_day(), NaiveDate::from_ymd_opt(262_143, 1, 1).unwrap());
        assert_eq!(YearMonth::new(i32::MIN, 7), YearMonth::new(-262_144, 7));

        assert_eq!(YearMonth::MAX.shift(1), YearMonth::MAX);
        assert_eq!(YearMonth::MIN.shift(-5), YearMonth::MIN);
        assert_eq!(YearMonth::MAX.last_day(), NaiveDate::MAX);
        assert_eq!(YearMonth::MIN.first_day(), NaiveDate::MIN);
        assert_eq!(YearMonth::new(2024, 3).shift(i32::MAX), YearMonth::MAX);
    }

    #[test]
    fn knows_month_lengths_and_padding() {
        let february = YearMonth::new(2024, 2);
        assert_eq!(february.days_in_month(), 29);
        assert_eq!(february.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(february.days().count(), 29);
        // 2024-02-01 is a Thursday
        assert_eq!(february.leading_blanks(Weekday::Mon), 3);
        assert_eq!(february.leading_blanks(Weekday::Sun), 4);
        assert_eq!(february.to_string(), "2024-02");
    }
}
