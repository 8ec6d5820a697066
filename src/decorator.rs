use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::day::CalendarDay;

/// Visual or behavioural effect a decorator applies to a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Decoration {
    /// Dimmed and not clickable.
    Disabled,
    TextColor(String),
    Marker(String),
}

/// A predicate plus the effect applied when it matches. Implementations must
/// not depend on anything but the day they are given.
pub trait DayDecorator {
    fn should_decorate(&self, day: &CalendarDay) -> bool;
    fn decorate(&self, day: &CalendarDay) -> Decoration;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecoratorId(u64);

/// Resolved presentation of a day after running the chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DayAppearance {
    pub disabled: bool,
    pub text_color: Option<String>,
    pub markers: Vec<String>,
}

#[derive(Default)]
pub struct DecoratorChain {
    decorators: Vec<(DecoratorId, Box<dyn DayDecorator>)>,
    next_id: u64,
}

impl DecoratorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, decorator: Box<dyn DayDecorator>) -> DecoratorId {
        let id = DecoratorId(self.next_id);
        self.next_id += 1;
        self.decorators.push((id, decorator));
        id
    }

    pub fn remove(&mut self, id: DecoratorId) -> bool {
        let before = self.decorators.len();
        self.decorators.retain(|(existing, _)| *existing != id);
        self.decorators.len() != before
    }

    pub fn clear(&mut self) {
        self.decorators.clear();
    }

    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }

    /// Effects of every matching decorator, in registration order.
    pub fn evaluate(&self, day: &CalendarDay) -> Vec<Decoration> {
        self.decorators
            .iter()
            .filter(|(_, decorator)| decorator.should_decorate(day))
            .map(|(_, decorator)| decorator.decorate(day))
            .collect()
    }

    pub fn appearance(&self, day: &CalendarDay) -> DayAppearance {
        let mut appearance = DayAppearance::default();
        for decoration in self.evaluate(day) {
            match decoration {
                Decoration::Disabled => appearance.disabled = true,
                Decoration::TextColor(color) => {
                    if appearance.text_color.is_none() {
                        appearance.text_color = Some(color);
                    }
                }
                Decoration::Marker(label) => appearance.markers.push(label),
            }
        }
        appearance
    }

    pub fn is_interactive(&self, day: &CalendarDay) -> bool {
        !self.decorators.iter().any(|(_, decorator)| {
            decorator.should_decorate(day) && decorator.decorate(day) == Decoration::Disabled
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeMode {
    Before,
    After,
}

/// Disables every day strictly before or after a boundary date.
#[derive(Debug, Clone)]
pub struct RangeDisableDecorator {
    mode: RangeMode,
    // None when the boundary is the first or last date chrono supports
    first_disabled: Option<NaiveDate>,
}

impl RangeDisableDecorator {
    pub fn new(mode: RangeMode, boundary: NaiveDate) -> Self {
        let first_disabled = match mode {
            RangeMode::Before => boundary.checked_sub_signed(Duration::days(1)),
            RangeMode::After => boundary.checked_add_signed(Duration::days(1)),
        };
        Self {
            mode,
            first_disabled,
        }
    }

    pub fn mode(&self) -> RangeMode {
        self.mode
    }
}

impl DayDecorator for RangeDisableDecorator {
    fn should_decorate(&self, day: &CalendarDay) -> bool {
        match (self.mode, self.first_disabled) {
            (_, None) => false,
            (RangeMode::Before, Some(first)) => day.date <= first,
            (RangeMode::After, Some(first)) => day.date >= first,
        }
    }

    fn decorate(&self, _day: &CalendarDay) -> Decoration {
        Decoration::Disabled
    }
}

/// Puts a label on a fixed set of dates.
#[derive(Debug, Clone)]
pub struct MarkerDecorator {
    dates: BTreeSet<NaiveDate>,
    label: String,
}

impl MarkerDecorator {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>, label: impl Into<String>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
            label: label.into(),
        }
    }
}

impl DayDecorator for MarkerDecorator {
    fn should_decorate(&self, day: &CalendarDay) -> bool {
        self.dates.contains(&day.date)
    }

    fn decorate(&self, _day: &CalendarDay) -> Decoration {
        Decoration::Marker(self.label.clone())
    }
}

/// Recolors days falling on the given weekdays, e.g. weekends.
#[derive(Debug, Clone)]
pub struct WeekdayDecorator {
    weekdays: Vec<Weekday>,
    color: String,
}

impl WeekdayDecorator {
    pub fn new(weekdays: impl IntoIterator<Item = Weekday>, color: impl Into<String>) -> Self {
        Self {
            weekdays: weekdays.into_iter().collect(),
            color: color.into(),
        }
    }
}

impl DayDecorator for WeekdayDecorator {
    fn should_decorate(&self, day: &CalendarDay) -> bool {
        self.weekdays.contains(&day.date.weekday())
    }

    fn decorate(&self, _day: &CalendarDay) -> Decoration {
        Decoration::TextColor(self.color.clone())
    }
}
