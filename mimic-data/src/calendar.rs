use crate::error::DataError;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Business-day calendar combining weekend, explicit-holiday and recurring `(month, day)`
/// holiday rules. Membership tests are O(1).
///
/// Presets define only recurring dates; venue-specific one-off closures are supplied by the
/// caller via [`Self::with_holiday`].
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct BusinessCalendar {
    pub name: SmolStr,
    explicit_holidays: FnvHashSet<NaiveDate>,
    recurring_holidays: FnvHashSet<(u32, u32)>,
}

impl BusinessCalendar {
    pub fn new<S: Into<SmolStr>>(name: S) -> Self {
        Self {
            name: name.into(),
            explicit_holidays: FnvHashSet::default(),
            recurring_holidays: FnvHashSet::default(),
        }
    }

    /// New York Stock Exchange preset.
    pub fn nyse() -> Self {
        Self::new("NYSE").with_recurring_holidays([(1, 1), (7, 4), (12, 25)])
    }

    /// London Stock Exchange preset.
    pub fn lse() -> Self {
        Self::new("LSE").with_recurring_holidays([(1, 1), (12, 25), (12, 26)])
    }

    /// Tokyo Stock Exchange preset.
    pub fn tse() -> Self {
        Self::new("TSE").with_recurring_holidays([(1, 1), (1, 2), (1, 3), (12, 31)])
    }

    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.explicit_holidays.insert(date);
        self
    }

    pub fn with_holidays<I: IntoIterator<Item = NaiveDate>>(mut self, dates: I) -> Self {
        self.explicit_holidays.extend(dates);
        self
    }

    pub fn with_recurring_holiday(mut self, month: u32, day: u32) -> Self {
        self.recurring_holidays.insert((month, day));
        self
    }

    pub fn with_recurring_holidays<I: IntoIterator<Item = (u32, u32)>>(mut self, days: I) -> Self {
        self.recurring_holidays.extend(days);
        self
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }

        if self.explicit_holidays.contains(&date) {
            return false;
        }

        !self.recurring_holidays.contains(&(date.month(), date.day()))
    }

    /// Advance `date` by `n` business days, counting only days this calendar considers open.
    ///
    /// `n = 0` returns `date` unchanged, whether or not it is a business day.
    pub fn add_business_days(&self, date: NaiveDate, n: u32) -> NaiveDate {
        let mut current = date;
        let mut remaining = n;

        while remaining > 0 {
            current = current
                .checked_add_days(Days::new(1))
                .expect("business day arithmetic does not approach NaiveDate::MAX");

            if self.is_business_day(current) {
                remaining -= 1;
            }
        }

        current
    }

    /// Count business days in the half-open interval `(start, end]`.
    pub fn business_days_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u32, DataError> {
        if end < start {
            return Err(DataError::InvalidRange { start, end });
        }

        let mut count = 0;
        let mut current = start;

        while current < end {
            current = current
                .checked_add_days(Days::new(1))
                .expect("business day arithmetic does not approach NaiveDate::MAX");

            if self.is_business_day(current) {
                count += 1;
            }
        }

        Ok(count)
    }
}
