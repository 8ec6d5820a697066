use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::day::{YearMonth, next_day};
use crate::decorator::DecoratorChain;
use crate::month_index::MonthIndex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    #[default]
    None,
    Single,
    Multiple,
    Range,
    Even,
    Odd,
}

impl Display for SelectionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SelectionMode::None => "none",
            SelectionMode::Single => "single",
            SelectionMode::Multiple => "multiple",
            SelectionMode::Range => "range",
            SelectionMode::Even => "even",
            SelectionMode::Odd => "odd",
        };
        f.write_str(name)
    }
}

/// What "even" and "odd" are measured on in the parity modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ParityRule {
    /// 2nd, 4th, ... of the month are even.
    #[default]
    DayOfMonth,
    /// Tuesday, Thursday and Saturday are even (Monday is day 1).
    DayOfWeek,
}

impl ParityRule {
    pub fn is_even(self, date: NaiveDate) -> bool {
        match self {
            ParityRule::DayOfMonth => date.day() % 2 == 0,
            ParityRule::DayOfWeek => date.weekday().number_from_monday() % 2 == 0,
        }
    }
}

/// Months whose days changed selection state, in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedMonths(BTreeSet<YearMonth>);

impl ChangedMonths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, month: YearMonth) {
        self.0.insert(month);
    }

    pub fn merge(&mut self, other: ChangedMonths) {
        self.0.extend(other.0);
    }

    pub fn contains(&self, month: YearMonth) -> bool {
        self.0.contains(&month)
    }

    pub fn iter(&self) -> impl Iterator<Item = YearMonth> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<YearMonth> for ChangedMonths {
    fn from_iter<T: IntoIterator<Item = YearMonth>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    SelectionDisabled,
    NotInteractive,
    ParityMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Changed(ChangedMonths),
    Ignored(IgnoreReason),
}

impl ClickOutcome {
    pub fn changed_months(&self) -> Option<&ChangedMonths> {
        match self {
            ClickOutcome::Changed(months) => Some(months),
            ClickOutcome::Ignored(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangePhase {
    Idle,
    Pending,
    Complete,
}

/// Selection state machine. Day flags live in the [`MonthIndex`]; the engine
/// keeps them in step with its ordered list of selected dates.
#[derive(Debug, Clone)]
pub struct SelectionEngine {
    mode: SelectionMode,
    parity: ParityRule,
    selections: Vec<NaiveDate>,
    phase: RangePhase,
}

impl SelectionEngine {
    pub fn new(mode: SelectionMode, parity: ParityRule) -> Self {
        Self {
            mode,
            parity,
            selections: Vec::new(),
            phase: RangePhase::Idle,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn parity(&self) -> ParityRule {
        self.parity
    }

    pub fn set_parity(&mut self, parity: ParityRule) {
        self.parity = parity;
    }

    pub fn selections(&self) -> &[NaiveDate] {
        &self.selections
    }

    pub fn first_selection(&self) -> Option<NaiveDate> {
        self.selections.first().copied()
    }

    pub fn is_pending_range(&self) -> bool {
        self.phase == RangePhase::Pending
    }

    /// Switching to another mode drops the current selection.
    pub fn set_mode(&mut self, mode: SelectionMode, index: &mut MonthIndex) -> ChangedMonths {
        if mode == self.mode {
            return ChangedMonths::new();
        }
        let changed = self.clear(index);
        self.mode = mode;
        changed
    }

    pub fn on_day_clicked(
        &mut self,
        date: NaiveDate,
        index: &mut MonthIndex,
        decorators: &DecoratorChain,
    ) -> ClickOutcome {
        if !decorators.is_interactive(index.get_or_create(date)) {
            return ClickOutcome::Ignored(IgnoreReason::NotInteractive);
        }

        match self.mode {
            SelectionMode::None => ClickOutcome::Ignored(IgnoreReason::SelectionDisabled),
            SelectionMode::Single => ClickOutcome::Changed(self.replace_with(date, index)),
            SelectionMode::Even | SelectionMode::Odd => {
                if !self.parity_matches(date) {
                    return ClickOutcome::Ignored(IgnoreReason::ParityMismatch);
                }
                ClickOutcome::Changed(self.replace_with(date, index))
            }
            SelectionMode::Multiple => ClickOutcome::Changed(self.toggle(date, index)),
            SelectionMode::Range => ClickOutcome::Changed(self.extend_range(date, index)),
        }
    }

    pub fn clear(&mut self, index: &mut MonthIndex) -> ChangedMonths {
        let mut changed = ChangedMonths::new();
        for date in self.selections.drain(..) {
            index.get_or_create(date).selected = false;
            changed.insert(YearMonth::from_date(date));
        }
        self.phase = RangePhase::Idle;
        changed
    }

    /// Applies a host-supplied selection through the rules of the current
    /// mode. Dates that could not be clicked are skipped.
    pub fn preselect(
        &mut self,
        dates: &[NaiveDate],
        index: &mut MonthIndex,
        decorators: &DecoratorChain,
    ) -> ChangedMonths {
        let mut changed = self.clear(index);
        let mut eligible = Vec::new();
        for date in dates {
            if decorators.is_interactive(index.get_or_create(*date)) && self.parity_matches(*date) {
                eligible.push(*date);
            }
        }

        match self.mode {
            SelectionMode::None => {}
            SelectionMode::Single | SelectionMode::Even | SelectionMode::Odd => {
                if let Some(date) = eligible.last() {
                    self.select(*date, index);
                    changed.insert(YearMonth::from_date(*date));
                }
            }
            SelectionMode::Multiple => {
                for date in eligible {
                    if !self.selections.contains(&date) {
                        self.select(date, index);
                        changed.insert(YearMonth::from_date(date));
                    }
                }
            }
            SelectionMode::Range => {
                let first = eligible.iter().min().copied();
                let last = eligible.iter().max().copied();
                if let (Some(first), Some(last)) = (first, last) {
                    self.select(first, index);
                    self.phase = RangePhase::Pending;
                    changed.insert(YearMonth::from_date(first));
                    if first != last {
                        changed.merge(self.extend_range(last, index));
                    }
                }
            }
        }
        changed
    }

    fn parity_matches(&self, date: NaiveDate) -> bool {
        match self.mode {
            SelectionMode::Even => self.parity.is_even(date),
            SelectionMode::Odd => !self.parity.is_even(date),
            _ => true,
        }
    }

    fn select(&mut self, date: NaiveDate, index: &mut MonthIndex) {
        index.get_or_create(date).selected = true;
        self.selections.push(date);
    }

    fn replace_with(&mut self, date: NaiveDate, index: &mut MonthIndex) -> ChangedMonths {
        let mut changed = self.clear(index);
        self.select(date, index);
        changed.insert(YearMonth::from_date(date));
        changed
    }

    fn toggle(&mut self, date: NaiveDate, index: &mut MonthIndex) -> ChangedMonths {
        if let Some(position) = self.selections.iter().position(|selected| *selected == date) {
            self.selections.remove(position);
            index.get_or_create(date).selected = false;
        } else {
            self.select(date, index);
        }
        [YearMonth::from_date(date)].into_iter().collect()
    }

    fn extend_range(&mut self, date: NaiveDate, index: &mut MonthIndex) -> ChangedMonths {
        let start = match (self.phase, self.selections.first()) {
            (RangePhase::Pending, Some(start)) => *start,
            _ => {
                let mut changed = self.clear(index);
                self.select(date, index);
                self.phase = RangePhase::Pending;
                changed.insert(YearMonth::from_date(date));
                return changed;
            }
        };

        let (from, to) = if date < start { (date, start) } else { (start, date) };
        self.selections.clear();
        let mut cursor = from;
        loop {
            self.select(cursor, index);
            if cursor == to {
                break;
            }
            cursor = next_day(cursor);
        }
        self.phase = RangePhase::Complete;

        let first_month = YearMonth::from_date(from);
        let span = first_month.months_until(YearMonth::from_date(to));
        (0..=span).map(|offset| first_month.shift(offset)).collect()
    }
}
