use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::{Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::day::YearMonth;
use crate::decorator::{
    DayDecorator, MarkerDecorator, RangeDisableDecorator, RangeMode, WeekdayDecorator,
};
use crate::selection::{ParityRule, SelectionMode};

/// Host configuration of a calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Month shown first. Defaults to the current month.
    pub initial_month: Option<YearMonth>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub selection_mode: SelectionMode,
    pub parity: ParityRule,
    pub legend: bool,
    /// Days selected at startup, applied through the selection mode rules.
    pub selected: Vec<NaiveDate>,
    pub decorators: Vec<DecoratorSpec>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            initial_month: None,
            min_date: None,
            max_date: None,
            selection_mode: SelectionMode::None,
            parity: ParityRule::DayOfMonth,
            legend: true,
            selected: Vec::new(),
            decorators: Vec::new(),
        }
    }
}

impl CalendarConfig {
    pub fn with_initial_month(mut self, month: YearMonth) -> Self {
        self.initial_month = Some(month);
        self
    }

    pub fn with_min_date(mut self, date: NaiveDate) -> Self {
        self.min_date = Some(date);
        self
    }

    pub fn with_max_date(mut self, date: NaiveDate) -> Self {
        self.max_date = Some(date);
        self
    }

    pub fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = mode;
        self
    }

    pub fn with_parity(mut self, parity: ParityRule) -> Self {
        self.parity = parity;
        self
    }

    pub fn with_legend(mut self, legend: bool) -> Self {
        self.legend = legend;
        self
    }

    pub fn with_selected(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.selected = dates.into_iter().collect();
        self
    }

    pub fn with_decorator(mut self, spec: DecoratorSpec) -> Self {
        self.decorators.push(spec);
        self
    }

    pub fn resolved_initial_month(&self) -> YearMonth {
        self.initial_month
            .unwrap_or_else(|| YearMonth::from_date(Local::now().date_naive()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let (Some(min), Some(max)) = (self.min_date, self.max_date) {
            if min > max {
                return Err(ConfigError::Invalid(format!(
                    "min_date {min} is after max_date {max}"
                )));
            }
        }
        Ok(())
    }
}

/// Declarative decorator as it appears in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecoratorSpec {
    DisableRange { mode: RangeMode, boundary: NaiveDate },
    Marker { label: String, dates: Vec<NaiveDate> },
    Weekdays { color: String, weekdays: Vec<Weekday> },
}

impl DecoratorSpec {
    pub fn build(&self) -> Box<dyn DayDecorator> {
        match self {
            DecoratorSpec::DisableRange { mode, boundary } => {
                Box::new(RangeDisableDecorator::new(*mode, *boundary))
            }
            DecoratorSpec::Marker { label, dates } => {
                Box::new(MarkerDecorator::new(dates.iter().copied(), label.clone()))
            }
            DecoratorSpec::Weekdays { color, weekdays } => {
                Box::new(WeekdayDecorator::new(weekdays.iter().copied(), color.clone()))
            }
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    TomlDecode(toml::de::Error),
    TomlEncode(toml::ser::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {err}"),
            ConfigError::TomlDecode(err) => write!(f, "failed to parse TOML config: {err}"),
            ConfigError::TomlEncode(err) => write!(f, "failed to encode TOML config: {err}"),
            ConfigError::Invalid(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Missing or blank files yield the default configuration.
pub fn load_config(path: &Path) -> Result<CalendarConfig, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(CalendarConfig::default()),
        Err(err) => return Err(ConfigError::Io(err)),
    };

    if raw.trim().is_empty() {
        return Ok(CalendarConfig::default());
    }

    let config: CalendarConfig = toml::from_str(&raw).map_err(ConfigError::TomlDecode)?;
    config.validate()?;
    Ok(config)
}

pub fn save_config(path: &Path, config: &CalendarConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
    }

    let raw = toml::to_string_pretty(config).map_err(ConfigError::TomlEncode)?;
    fs::write(path, raw).map_err(ConfigError::Io)
}
