use crate::day::YearMonth;
use crate::month_index::MonthRow;

/// Edge of the rendered month range that the user is scrolling towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

/// Rendering surface driven by the [`crate::TimelineController`].
///
/// The viewport owns layout, padding cells and row recycling. It reports
/// scrolling, taps and row lifecycle back through the controller's
/// `on_*` methods and calls [`crate::TimelineController::tick`] once per
/// frame.
pub trait Viewport {
    /// Rows arrive in chronological order and go after the existing ones.
    fn append_rows(&mut self, rows: &[MonthRow]);
    /// Rows arrive in chronological order and go before the existing ones.
    fn prepend_rows(&mut self, rows: &[MonthRow]);
    fn clear_all(&mut self);
    fn notify_month_changed(&mut self, month: YearMonth);
    fn scroll_to_start(&mut self);
    fn scroll_to_end(&mut self);
}

/// Viewport that renders nothing. Useful for driving the model headless.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullViewport;

impl Viewport for NullViewport {
    fn append_rows(&mut self, _rows: &[MonthRow]) {}
    fn prepend_rows(&mut self, _rows: &[MonthRow]) {}
    fn clear_all(&mut self) {}
    fn notify_month_changed(&mut self, _month: YearMonth) {}
    fn scroll_to_start(&mut self) {}
    fn scroll_to_end(&mut self) {}
}
