//! Headless core of an infinitely scrolling calendar.
//!
//! A [`TimelineController`] materializes months on demand around an initial
//! month, keeps one [`CalendarDay`] per date, runs day taps through a
//! [`SelectionEngine`] and tells a [`Viewport`] which rows to add and which
//! months to redraw. Rendering itself lives behind the [`Viewport`] trait.

pub mod config;
pub mod day;
pub mod decorator;
pub mod listeners;
pub mod logging;
pub mod month_index;
pub mod paths;
pub mod selection;
pub mod timeline;
pub mod viewport;

pub use config::{CalendarConfig, ConfigError, DecoratorSpec, load_config, save_config};
pub use day::{CalendarDay, Direction, YearMonth};
pub use decorator::{
    DayAppearance, DayDecorator, Decoration, DecoratorChain, DecoratorId, MarkerDecorator,
    RangeDisableDecorator, RangeMode, WeekdayDecorator,
};
pub use listeners::{ListenerId, ListenerResult};
pub use month_index::{MonthIndex, MonthRow};
pub use selection::{
    ChangedMonths, ClickOutcome, IgnoreReason, ParityRule, SelectionEngine, SelectionMode,
};
pub use timeline::{CalendarSnapshot, TickReport, TimelineController};
pub use viewport::{Edge, NullViewport, Viewport};
