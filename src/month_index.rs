use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::day::{CalendarDay, Direction, YearMonth, next_day, previous_day};

/// All days of one month, in order. The days themselves live in the
/// [`MonthIndex`] day map; the row only holds their keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthRow {
    pub month: YearMonth,
    pub days: Vec<NaiveDate>,
}

impl MonthRow {
    fn new(month: YearMonth) -> Self {
        Self {
            month,
            days: month.days().collect(),
        }
    }
}

/// Identity map of days plus the rows of currently materialized months.
#[derive(Debug, Default)]
pub struct MonthIndex {
    days: BTreeMap<NaiveDate, CalendarDay>,
    rows: BTreeMap<YearMonth, MonthRow>,
}

impl MonthIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&CalendarDay> {
        self.days.get(&date)
    }

    pub fn get_or_create(&mut self, date: NaiveDate) -> &mut CalendarDay {
        self.days
            .entry(date)
            .or_insert_with(|| CalendarDay::new(date))
    }

    pub fn adjacent(&mut self, date: NaiveDate, direction: Direction) -> &mut CalendarDay {
        let target = match direction {
            Direction::Previous => previous_day(date),
            Direction::Next => next_day(date),
        };
        self.get_or_create(target)
    }

    pub fn row_for(&self, month: YearMonth) -> Option<&MonthRow> {
        self.rows.get(&month)
    }

    pub fn has_row(&self, month: YearMonth) -> bool {
        self.rows.contains_key(&month)
    }

    /// Creates the row for `month` and every day in it. Existing days keep
    /// their state.
    pub fn materialize(&mut self, month: YearMonth) -> &MonthRow {
        if !self.rows.contains_key(&month) {
            let row = MonthRow::new(month);
            for date in &row.days {
                self.days
                    .entry(*date)
                    .or_insert_with(|| CalendarDay::new(*date));
            }
            self.rows.insert(month, row);
        }
        &self.rows[&month]
    }

    /// Drops the row of `month`; its days stay in the map.
    pub fn evict(&mut self, month: YearMonth) -> Option<MonthRow> {
        self.rows.remove(&month)
    }

    pub fn rows(&self) -> impl Iterator<Item = &MonthRow> {
        self.rows.values()
    }

    pub fn selected_days(&self) -> impl Iterator<Item = &CalendarDay> {
        self.days.values().filter(|day| day.selected)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn clear(&mut self) {
        self.days.clear();
        self.rows.clear();
    }
}
