use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;

use crate::config::CalendarConfig;
use crate::day::{CalendarDay, YearMonth};
use crate::decorator::{
    DayAppearance, DayDecorator, DecoratorChain, DecoratorId, RangeDisableDecorator, RangeMode,
};
use crate::listeners::{ListenerId, ListenerResult, ObserverList};
use crate::month_index::{MonthIndex, MonthRow};
use crate::selection::{
    ChangedMonths, ClickOutcome, IgnoreReason, ParityRule, SelectionEngine, SelectionMode,
};
use crate::viewport::{Edge, Viewport};

/// Months fetched when the viewport nears the end of the rendered range.
pub const FUTURE_LOOKAHEAD_MONTHS: usize = 3;
/// Months fetched when the viewport nears the start of the rendered range.
pub const PAST_LOOKAHEAD_MONTHS: usize = 2;
/// Rows from an edge at which a scroll counts as "near" it.
const BOUNDARY_PROXIMITY_ROWS: usize = 2;

#[derive(Debug, Clone, Copy, Default)]
struct PendingWork {
    future: usize,
    past: usize,
    scroll_to: Option<Edge>,
}

/// What a [`TimelineController::tick`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub months_added: usize,
    pub months_redrawn: Vec<YearMonth>,
}

/// Read-only summary of the calendar state.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarSnapshot {
    pub initial_month: YearMonth,
    pub first_month: YearMonth,
    pub last_month: YearMonth,
    pub past_count: usize,
    pub future_count: usize,
    pub mode: SelectionMode,
    pub parity: ParityRule,
    pub legend: bool,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub pending_range: bool,
    pub selected: Vec<NaiveDate>,
}

/// Drives an unbounded timeline of months on top of a [`Viewport`].
///
/// Month expansion triggered by scrolling is deferred to [`Self::tick`], so a
/// burst of scroll events produces one batch of months. Selection changes are
/// applied at once but the viewport only hears about the touched months on
/// the next tick.
pub struct TimelineController<V: Viewport> {
    initial_month: YearMonth,
    past_count: usize,
    future_count: usize,
    index: MonthIndex,
    decorators: DecoratorChain,
    selection: SelectionEngine,
    min_date: Option<NaiveDate>,
    max_date: Option<NaiveDate>,
    min_decorator: Option<DecoratorId>,
    max_decorator: Option<DecoratorId>,
    legend: bool,
    pending: PendingWork,
    dirty: ChangedMonths,
    next_listener_id: u64,
    month_added: ObserverList<YearMonth>,
    month_bound: ObserverList<YearMonth>,
    month_unbound: ObserverList<YearMonth>,
    day_clicked: ObserverList<CalendarDay>,
    viewport: V,
}

impl<V: Viewport> TimelineController<V> {
    /// Builds the calendar and renders its initial month.
    pub fn new(config: CalendarConfig, viewport: V) -> Self {
        let mut controller = Self {
            initial_month: config.resolved_initial_month(),
            past_count: 0,
            future_count: 0,
            index: MonthIndex::new(),
            decorators: DecoratorChain::new(),
            selection: SelectionEngine::new(config.selection_mode, config.parity),
            min_date: None,
            max_date: None,
            min_decorator: None,
            max_decorator: None,
            legend: config.legend,
            pending: PendingWork::default(),
            dirty: ChangedMonths::new(),
            next_listener_id: 0,
            month_added: ObserverList::new("month added"),
            month_bound: ObserverList::new("month bound"),
            month_unbound: ObserverList::new("month unbound"),
            day_clicked: ObserverList::new("day clicked"),
            viewport,
        };

        controller.set_min_date(config.min_date);
        controller.set_max_date(config.max_date);
        for spec in &config.decorators {
            controller.decorators.add(spec.build());
        }
        controller.materialize_initial();
        if !config.selected.is_empty() {
            controller.set_selections(&config.selected);
        }
        controller
    }

    /// Rebuilds everything around a new initial month. Days, rows and the
    /// current selection are dropped; attach month-added listeners first if
    /// they should see the new initial month.
    pub fn set_initial_month(&mut self, month: YearMonth) {
        self.viewport.clear_all();
        self.selection.clear(&mut self.index);
        self.index.clear();
        self.initial_month = month;
        self.past_count = 0;
        self.future_count = 0;
        self.pending = PendingWork::default();
        self.dirty = ChangedMonths::new();
        self.materialize_initial();
    }

    pub fn set_min_date(&mut self, date: Option<NaiveDate>) {
        if let Some(id) = self.min_decorator.take() {
            self.decorators.remove(id);
        }
        self.min_date = date;
        self.min_decorator = date.map(|date| {
            self.decorators
                .add(Box::new(RangeDisableDecorator::new(RangeMode::Before, date)))
        });
        self.mark_rows_dirty();
    }

    pub fn set_max_date(&mut self, date: Option<NaiveDate>) {
        if let Some(id) = self.max_decorator.take() {
            self.decorators.remove(id);
        }
        self.max_date = date;
        self.max_decorator = date.map(|date| {
            self.decorators
                .add(Box::new(RangeDisableDecorator::new(RangeMode::After, date)))
        });
        self.mark_rows_dirty();
    }

    pub fn add_decorator(&mut self, decorator: Box<dyn DayDecorator>) -> DecoratorId {
        let id = self.decorators.add(decorator);
        self.mark_rows_dirty();
        id
    }

    pub fn remove_decorator(&mut self, id: DecoratorId) -> bool {
        let removed = self.decorators.remove(id);
        if removed {
            self.mark_rows_dirty();
        }
        removed
    }

    pub fn set_legend_enabled(&mut self, legend: bool) {
        self.legend = legend;
    }

    /// Materializes up to `count` months after the furthest future month and
    /// appends them to the viewport. Stops at the max date.
    pub fn expand_future(&mut self, count: usize) -> usize {
        let mut rows = Vec::new();
        for _ in 0..count {
            if !self.can_grow(Edge::End) {
                debug!("future expansion stopped after {}", self.last_month());
                break;
            }
            let month = self.initial_month.shift(self.future_count as i32 + 1);
            self.future_count += 1;
            rows.push(self.index.materialize(month).clone());
            self.month_added.notify(&month);
        }

        if !rows.is_empty() {
            self.viewport.append_rows(&rows);
        }
        rows.len()
    }

    /// Materializes up to `count` months before the furthest past month and
    /// prepends them to the viewport. Stops at the min date.
    pub fn expand_past(&mut self, count: usize) -> usize {
        let mut months = Vec::new();
        for _ in 0..count {
            if !self.can_grow(Edge::Start) {
                debug!("past expansion stopped before {}", self.first_month());
                break;
            }
            self.past_count += 1;
            months.push(self.first_month());
        }
        months.reverse();

        let mut rows = Vec::with_capacity(months.len());
        for month in &months {
            rows.push(self.index.materialize(*month).clone());
            self.month_added.notify(month);
        }

        if !rows.is_empty() {
            self.viewport.prepend_rows(&rows);
        }
        rows.len()
    }

    pub fn schedule_future(&mut self, count: usize) {
        self.pending.future = self.pending.future.max(count);
    }

    pub fn schedule_past(&mut self, count: usize) {
        self.pending.past = self.pending.past.max(count);
    }

    /// Schedules look-ahead months for `edge`, unless a bound or the end of
    /// the supported date range already stops the timeline there.
    pub fn on_boundary_near(&mut self, edge: Edge) {
        if !self.can_grow(edge) {
            return;
        }
        match edge {
            Edge::End => self.schedule_future(FUTURE_LOOKAHEAD_MONTHS),
            Edge::Start => self.schedule_past(PAST_LOOKAHEAD_MONTHS),
        }
    }

    /// Derives boundary proximity from the visible row indices.
    pub fn on_scrolled(&mut self, first_visible: usize, last_visible: usize) {
        if last_visible + BOUNDARY_PROXIMITY_ROWS >= self.row_count() {
            self.on_boundary_near(Edge::End);
        } else if first_visible <= BOUNDARY_PROXIMITY_ROWS {
            self.on_boundary_near(Edge::Start);
        }
    }

    /// Initial fill once the viewport knows how tall it and its first row are.
    pub fn on_attached_with_size(&mut self, height: usize, first_row_height: usize) {
        if first_row_height == 0 {
            info!("first month row has no height yet, skipping initial fill");
            return;
        }
        self.schedule_future(height.div_ceil(first_row_height) + 1);
        self.schedule_past(PAST_LOOKAHEAD_MONTHS);
    }

    pub fn on_day_tapped(&mut self, date: NaiveDate) -> ClickOutcome {
        let outcome = self
            .selection
            .on_day_clicked(date, &mut self.index, &self.decorators);

        match &outcome {
            ClickOutcome::Changed(months) => self.dirty.merge(months.clone()),
            ClickOutcome::Ignored(reason) => debug!("tap on {date} ignored: {reason:?}"),
        }

        if outcome != ClickOutcome::Ignored(IgnoreReason::NotInteractive) {
            let day = self.index.get_or_create(date).clone();
            self.day_clicked.notify(&day);
        }
        outcome
    }

    pub fn on_month_bound(&mut self, month: YearMonth) {
        self.index.materialize(month);
        self.month_bound.notify(&month);
    }

    /// The row goes away; its days and their selection stay.
    pub fn on_month_unbound(&mut self, month: YearMonth) {
        self.month_unbound.notify(&month);
        self.index.evict(month);
    }

    pub fn clear_selection(&mut self) -> ChangedMonths {
        let changed = self.selection.clear(&mut self.index);
        self.dirty.merge(changed.clone());
        changed
    }

    pub fn set_selection_mode(&mut self, mode: SelectionMode) -> ChangedMonths {
        let changed = self.selection.set_mode(mode, &mut self.index);
        self.dirty.merge(changed.clone());
        changed
    }

    pub fn set_parity(&mut self, parity: ParityRule) {
        self.selection.set_parity(parity);
    }

    /// Replaces the selection and schedules the months needed to reach the
    /// first selected day, scrolling there on the next tick.
    pub fn set_selections(&mut self, dates: &[NaiveDate]) -> ChangedMonths {
        let changed = self
            .selection
            .preselect(dates, &mut self.index, &self.decorators);
        self.dirty.merge(changed.clone());
        self.reconcile_with_selection();
        changed
    }

    /// Runs deferred expansions, then tells the viewport which materialized
    /// months changed since the last tick.
    pub fn tick(&mut self) -> TickReport {
        let work = std::mem::take(&mut self.pending);
        let mut months_added = 0;
        if work.future > 0 {
            months_added += self.expand_future(work.future);
        }
        if work.past > 0 {
            months_added += self.expand_past(work.past);
        }
        match work.scroll_to {
            Some(Edge::Start) => self.viewport.scroll_to_start(),
            Some(Edge::End) => self.viewport.scroll_to_end(),
            None => {}
        }

        let dirty = std::mem::take(&mut self.dirty);
        let mut months_redrawn = Vec::new();
        for month in dirty.iter() {
            if self.index.has_row(month) {
                self.viewport.notify_month_changed(month);
                months_redrawn.push(month);
            }
        }

        TickReport {
            months_added,
            months_redrawn,
        }
    }

    pub fn add_month_added_listener(
        &mut self,
        listener: impl Fn(&YearMonth) -> ListenerResult + 'static,
    ) -> ListenerId {
        let id = self.next_listener_id();
        self.month_added.add(id, listener);
        id
    }

    pub fn add_month_bound_listener(
        &mut self,
        listener: impl Fn(&YearMonth) -> ListenerResult + 'static,
    ) -> ListenerId {
        let id = self.next_listener_id();
        self.month_bound.add(id, listener);
        id
    }

    pub fn add_month_unbound_listener(
        &mut self,
        listener: impl Fn(&YearMonth) -> ListenerResult + 'static,
    ) -> ListenerId {
        let id = self.next_listener_id();
        self.month_unbound.add(id, listener);
        id
    }

    pub fn add_day_click_listener(
        &mut self,
        listener: impl Fn(&CalendarDay) -> ListenerResult + 'static,
    ) -> ListenerId {
        let id = self.next_listener_id();
        self.day_clicked.add(id, listener);
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.month_added.remove(id)
            || self.month_bound.remove(id)
            || self.month_unbound.remove(id)
            || self.day_clicked.remove(id)
    }

    pub fn clear_month_added_listeners(&mut self) {
        self.month_added.clear();
    }

    pub fn clear_month_bound_listeners(&mut self) {
        self.month_bound.clear();
    }

    pub fn clear_month_unbound_listeners(&mut self) {
        self.month_unbound.clear();
    }

    pub fn clear_day_click_listeners(&mut self) {
        self.day_clicked.clear();
    }

    pub fn initial_month(&self) -> YearMonth {
        self.initial_month
    }

    pub fn past_count(&self) -> usize {
        self.past_count
    }

    pub fn future_count(&self) -> usize {
        self.future_count
    }

    pub fn row_count(&self) -> usize {
        self.past_count + 1 + self.future_count
    }

    pub fn first_month(&self) -> YearMonth {
        self.initial_month.shift(-(self.past_count as i32))
    }

    pub fn last_month(&self) -> YearMonth {
        self.initial_month.shift(self.future_count as i32)
    }

    /// Every month materialized so far, oldest first.
    pub fn months(&self) -> impl Iterator<Item = YearMonth> + use<V> {
        let first = self.first_month();
        (0..self.row_count() as i32).map(move |offset| first.shift(offset))
    }

    pub fn row_for(&self, month: YearMonth) -> Option<&MonthRow> {
        self.index.row_for(month)
    }

    pub fn day(&self, date: NaiveDate) -> Option<&CalendarDay> {
        self.index.day(date)
    }

    pub fn is_selected(&self, date: NaiveDate) -> bool {
        self.index.day(date).is_some_and(|day| day.selected)
    }

    /// Decorations for `date`, without creating the day.
    pub fn appearance(&self, date: NaiveDate) -> DayAppearance {
        match self.index.day(date) {
            Some(day) => self.decorators.appearance(day),
            None => self.decorators.appearance(&CalendarDay::new(date)),
        }
    }

    pub fn selections(&self) -> &[NaiveDate] {
        self.selection.selections()
    }

    pub fn mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    pub fn parity(&self) -> ParityRule {
        self.selection.parity()
    }

    pub fn legend_enabled(&self) -> bool {
        self.legend
    }

    pub fn min_date(&self) -> Option<NaiveDate> {
        self.min_date
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.max_date
    }

    pub fn month_index(&self) -> &MonthIndex {
        &self.index
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn snapshot(&self) -> CalendarSnapshot {
        CalendarSnapshot {
            initial_month: self.initial_month,
            first_month: self.first_month(),
            last_month: self.last_month(),
            past_count: self.past_count,
            future_count: self.future_count,
            mode: self.selection.mode(),
            parity: self.selection.parity(),
            legend: self.legend,
            min_date: self.min_date,
            max_date: self.max_date,
            pending_range: self.selection.is_pending_range(),
            selected: self.selection.selections().to_vec(),
        }
    }

    /// Whether another month fits beyond the current range at `edge`.
    pub fn can_grow(&self, edge: Edge) -> bool {
        match edge {
            Edge::End => {
                let last = self.last_month();
                last != YearMonth::MAX && !self.max_date.is_some_and(|max| last.last_day() >= max)
            }
            Edge::Start => {
                let first = self.first_month();
                first != YearMonth::MIN
                    && !self.min_date.is_some_and(|min| first.first_day() <= min)
            }
        }
    }

    fn materialize_initial(&mut self) {
        let row = self.index.materialize(self.initial_month).clone();
        self.month_added.notify(&self.initial_month);
        self.viewport.append_rows(&[row]);
    }

    fn reconcile_with_selection(&mut self) {
        let Some(first) = self.selection.first_selection() else {
            return;
        };
        let distance = self.initial_month.months_until(YearMonth::from_date(first));
        let needed = distance.unsigned_abs() as usize;
        if distance < 0 && needed > self.past_count {
            self.schedule_past(needed - self.past_count);
            self.pending.scroll_to = Some(Edge::Start);
        } else if distance > 0 && needed > self.future_count {
            self.schedule_future(needed - self.future_count);
            self.pending.scroll_to = Some(Edge::End);
        }
    }

    fn mark_rows_dirty(&mut self) {
        let months = self.index.rows().map(|row| row.month).collect::<Vec<_>>();
        for month in months {
            self.dirty.insert(month);
        }
    }

    fn next_listener_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use chrono::NaiveDate;

    use crate::config::{CalendarConfig, DecoratorSpec};
    use crate::day::YearMonth;
    use crate::decorator::{MarkerDecorator, RangeMode};
    use crate::month_index::MonthRow;
    use crate::selection::{ClickOutcome, IgnoreReason, SelectionMode};
    use crate::viewport::{Edge, NullViewport, Viewport};

    use super::TimelineController;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Append(Vec<YearMonth>),
        Prepend(Vec<YearMonth>),
        ClearAll,
        Changed(YearMonth),
        ScrollToStart,
        ScrollToEnd,
    }

    #[derive(Debug, Default)]
    struct RecordingViewport {
        calls: Vec<Call>,
    }

    impl RecordingViewport {
        fn take(&mut self) -> Vec<Call> {
            std::mem::take(&mut self.calls)
        }
    }

    impl Viewport for RecordingViewport {
        fn append_rows(&mut self, rows: &[MonthRow]) {
            self.calls
                .push(Call::Append(rows.iter().map(|row| row.month).collect()));
        }

        fn prepend_rows(&mut self, rows: &[MonthRow]) {
            self.calls
                .push(Call::Prepend(rows.iter().map(|row| row.month).collect()));
        }

        fn clear_all(&mut self) {
            self.calls.push(Call::ClearAll);
        }

        fn notify_month_changed(&mut self, month: YearMonth) {
            self.calls.push(Call::Changed(month));
        }

        fn scroll_to_start(&mut self) {
            self.calls.push(Call::ScrollToStart);
        }

        fn scroll_to_end(&mut self) {
            self.calls.push(Call::ScrollToEnd);
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn month(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month)
    }

    fn calendar(config: CalendarConfig) -> TimelineController<RecordingViewport> {
        let config = if config.initial_month.is_none() {
            config.with_initial_month(month(2024, 1))
        } else {
            config
        };
        let mut controller = TimelineController::new(config, RecordingViewport::default());
        controller.viewport_mut().take();
        controller
    }

    fn record_months(
        controller: &mut TimelineController<RecordingViewport>,
    ) -> Rc<RefCell<Vec<YearMonth>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        controller.add_month_added_listener(move |month| {
            sink.borrow_mut().push(*month);
            Ok(())
        });
        seen
    }

    #[test]
    fn renders_initial_month_on_creation() {
        let config = CalendarConfig::default().with_initial_month(month(2024, 1));
        let mut controller = TimelineController::new(config, RecordingViewport::default());
        assert_eq!(controller.viewport_mut().take(), vec![Call::Append(vec![month(2024, 1)])]);
        assert_eq!(controller.row_count(), 1);
        assert_eq!(controller.row_for(month(2024, 1)).unwrap().days.len(), 31);
    }

    #[test]
    fn future_expansion_stops_at_max_date() {
        let mut controller = calendar(CalendarConfig::default().with_max_date(date(2024, 3, 31)));
        let seen = record_months(&mut controller);

        assert_eq!(controller.expand_future(12), 2);
        assert_eq!(controller.future_count(), 2);
        assert_eq!(controller.last_month(), month(2024, 3));
        assert_eq!(*seen.borrow(), vec![month(2024, 2), month(2024, 3)]);
        assert_eq!(
            controller.viewport_mut().take(),
            vec![Call::Append(vec![month(2024, 2), month(2024, 3)])]
        );

        assert_eq!(controller.expand_future(3), 0);
        assert_eq!(controller.future_count(), 2);
        assert!(controller.viewport_mut().take().is_empty());
    }

    #[test]
    fn past_expansion_prepends_in_chronological_order() {
        let mut controller = calendar(CalendarConfig::default().with_min_date(date(2023, 11, 15)));
        let seen = record_months(&mut controller);

        assert_eq!(controller.expand_past(5), 2);
        assert_eq!(controller.past_count(), 2);
        assert_eq!(controller.first_month(), month(2023, 11));
        assert_eq!(*seen.borrow(), vec![month(2023, 11), month(2023, 12)]);
        assert_eq!(
            controller.viewport_mut().take(),
            vec![Call::Prepend(vec![month(2023, 11), month(2023, 12)])]
        );
        assert_eq!(
            controller.months().collect::<Vec<_>>(),
            vec![month(2023, 11), month(2023, 12), month(2024, 1)]
        );
    }

    #[test]
    fn boundary_signals_are_coalesced_until_tick() {
        let mut controller = calendar(CalendarConfig::default());
        controller.on_boundary_near(Edge::End);
        controller.on_boundary_near(Edge::End);
        controller.on_scrolled(0, 0);
        assert_eq!(controller.future_count(), 0);

        let report = controller.tick();
        assert_eq!(report.months_added, 3);
        assert_eq!(controller.future_count(), 3);
        assert_eq!(
            controller.viewport_mut().take(),
            vec![Call::Append(vec![month(2024, 2), month(2024, 3), month(2024, 4)])]
        );

        // four rows, first visible row is near the start
        controller.on_scrolled(1, 1);
        controller.tick();
        assert_eq!(controller.past_count(), 2);
    }

    #[test]
    fn attach_schedules_initial_fill() {
        let mut controller = calendar(CalendarConfig::default());
        controller.on_attached_with_size(500, 0);
        assert_eq!(controller.tick().months_added, 0);

        controller.on_attached_with_size(500, 120);
        let report = controller.tick();
        assert_eq!(report.months_added, 8);
        assert_eq!(controller.future_count(), 6);
        assert_eq!(controller.past_count(), 2);
    }

    #[test]
    fn range_click_redraws_only_spanned_months() {
        let mut controller =
            calendar(CalendarConfig::default().with_selection_mode(SelectionMode::Range));
        controller.expand_future(3);
        controller.viewport_mut().take();

        controller.on_day_tapped(date(2024, 1, 30));
        controller.tick();
        assert_eq!(controller.viewport_mut().take(), vec![Call::Changed(month(2024, 1))]);

        let outcome = controller.on_day_tapped(date(2024, 3, 2));
        let changed = outcome.changed_months().expect("range should complete");
        assert_eq!(
            changed.iter().collect::<Vec<_>>(),
            vec![month(2024, 1), month(2024, 2), month(2024, 3)]
        );

        let report = controller.tick();
        assert_eq!(
            report.months_redrawn,
            vec![month(2024, 1), month(2024, 2), month(2024, 3)]
        );
        assert_eq!(
            controller.viewport_mut().take(),
            vec![
                Call::Changed(month(2024, 1)),
                Call::Changed(month(2024, 2)),
                Call::Changed(month(2024, 3)),
            ]
        );
    }

    #[test]
    fn unbound_months_keep_selection_and_skip_redraw() {
        let mut controller =
            calendar(CalendarConfig::default().with_selection_mode(SelectionMode::Multiple));
        controller.expand_future(1);
        controller.on_month_unbound(month(2024, 2));
        controller.viewport_mut().take();

        controller.on_day_tapped(date(2024, 2, 10));
        controller.on_day_tapped(date(2024, 1, 10));
        assert_eq!(controller.tick().months_redrawn, vec![month(2024, 1)]);
        assert!(controller.is_selected(date(2024, 2, 10)));

        controller.on_month_bound(month(2024, 2));
        assert!(controller.row_for(month(2024, 2)).is_some());
        assert!(controller.is_selected(date(2024, 2, 10)));
    }

    #[test]
    fn out_of_bounds_taps_change_nothing() {
        let mut controller = calendar(
            CalendarConfig::default()
                .with_selection_mode(SelectionMode::Single)
                .with_max_date(date(2024, 1, 20)),
        );
        let clicks = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&clicks);
        controller.add_day_click_listener(move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        });
        controller.tick();
        controller.viewport_mut().take();

        assert_eq!(
            controller.on_day_tapped(date(2024, 1, 21)),
            ClickOutcome::Ignored(IgnoreReason::NotInteractive)
        );
        assert_eq!(*clicks.borrow(), 0);
        assert!(controller.tick().months_redrawn.is_empty());
        assert!(controller.selections().is_empty());

        controller.on_day_tapped(date(2024, 1, 20));
        assert_eq!(*clicks.borrow(), 1);
        assert_eq!(controller.selections(), &[date(2024, 1, 20)]);
        assert!(controller.appearance(date(2024, 1, 25)).disabled);
    }

    #[test]
    fn failing_listener_does_not_abort_expansion() {
        let mut controller = calendar(CalendarConfig::default());
        controller.add_month_added_listener(|_| Err("listener failure".into()));
        let seen = record_months(&mut controller);

        assert_eq!(controller.expand_future(2), 2);
        assert_eq!(*seen.borrow(), vec![month(2024, 2), month(2024, 3)]);
    }

    #[test]
    fn removed_listener_stops_receiving_events() {
        let mut controller = calendar(CalendarConfig::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = controller.add_month_bound_listener(move |month| {
            sink.borrow_mut().push(*month);
            Ok(())
        });

        controller.on_month_bound(month(2024, 1));
        assert!(controller.remove_listener(id));
        controller.on_month_bound(month(2024, 1));
        assert_eq!(*seen.borrow(), vec![month(2024, 1)]);
    }

    #[test]
    fn preselection_materializes_months_up_to_first_selected_day() {
        let mut controller =
            calendar(CalendarConfig::default().with_selection_mode(SelectionMode::Single));
        controller.set_selections(&[date(2024, 5, 10)]);
        assert_eq!(controller.future_count(), 0);

        controller.tick();
        assert_eq!(controller.future_count(), 4);
        let calls = controller.viewport_mut().take();
        assert!(calls.contains(&Call::ScrollToEnd));
        assert!(calls.contains(&Call::Changed(month(2024, 5))));

        controller.set_selections(&[date(2023, 10, 1)]);
        controller.tick();
        assert_eq!(controller.past_count(), 3);
        assert!(controller.viewport_mut().take().contains(&Call::ScrollToStart));
    }

    #[test]
    fn changing_initial_month_rebuilds_the_model() {
        let mut controller =
            calendar(CalendarConfig::default().with_selection_mode(SelectionMode::Single));
        controller.expand_future(2);
        controller.on_day_tapped(date(2024, 2, 2));
        controller.viewport_mut().take();

        controller.set_initial_month(month(2025, 6));
        assert_eq!(
            controller.viewport_mut().take(),
            vec![Call::ClearAll, Call::Append(vec![month(2025, 6)])]
        );
        assert_eq!(controller.future_count(), 0);
        assert!(controller.selections().is_empty());
        assert!(controller.day(date(2024, 2, 2)).is_none());
        assert_eq!(controller.month_index().len(), 30);
    }

    #[test]
    fn snapshot_reports_selection() {
        let mut controller = calendar(
            CalendarConfig::default()
                .with_selection_mode(SelectionMode::Range)
                .with_selected([date(2024, 1, 3), date(2024, 1, 5)]),
        );
        controller.tick();
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.selected.len(), 3);
        assert!(!snapshot.pending_range);
        assert_eq!(snapshot.mode, SelectionMode::Range);
    }

    #[test]
    fn scroll_position_drives_expansion_headless() {
        let config = CalendarConfig::default()
            .with_initial_month(month(2024, 1))
            .with_min_date(date(2023, 12, 15));
        let mut controller = TimelineController::new(config, NullViewport);

        controller.on_scrolled(0, 0);
        assert_eq!(controller.tick().months_added, 3);
        assert_eq!(controller.last_month(), month(2024, 4));

        controller.on_scrolled(0, 1);
        assert_eq!(controller.tick().months_added, 1);
        assert_eq!(controller.first_month(), month(2023, 12));
        assert_eq!(controller.row_count(), 5);
    }

    #[test]
    fn stops_scheduling_once_the_min_date_is_reached() {
        let config = CalendarConfig::default()
            .with_initial_month(month(2024, 1))
            .with_min_date(date(2024, 1, 10));
        let mut controller = TimelineController::new(config, NullViewport);

        assert!(!controller.can_grow(Edge::Start));
        controller.on_scrolled(0, 0);
        assert_eq!(controller.pending.past, 0);
        assert_eq!(controller.pending.future, 3);
        controller.tick();

        controller.on_scrolled(0, 1);
        assert_eq!(controller.pending.past, 0);
        assert_eq!(controller.tick().months_added, 0);
        assert_eq!(controller.first_month(), month(2024, 1));
    }

    #[test]
    fn extreme_config_values_are_clamped_instead_of_panicking() {
        let far = "300000-01".parse::<YearMonth>().unwrap();
        let config = CalendarConfig::default()
            .with_initial_month(far)
            .with_min_date(NaiveDate::MIN)
            .with_max_date(NaiveDate::MAX)
            .with_selection_mode(SelectionMode::Single);
        let mut controller = TimelineController::new(config, NullViewport);
        assert_eq!(controller.initial_month(), month(262_143, 1));

        assert_eq!(controller.expand_future(20), 11);
        assert_eq!(controller.last_month(), YearMonth::MAX);
        assert!(!controller.can_grow(Edge::End));
        controller.on_scrolled(0, controller.row_count() - 1);
        assert_eq!(controller.tick().months_added, 0);

        assert!(matches!(
            controller.on_day_tapped(NaiveDate::MAX),
            ClickOutcome::Changed(_)
        ));
        assert!(controller.is_selected(NaiveDate::MAX));
    }

    #[test]
    fn bounds_and_decorators_change_at_runtime() {
        let mut controller = calendar(
            CalendarConfig::default()
                .with_selection_mode(SelectionMode::Single)
                .with_max_date(date(2024, 1, 31)),
        );
        assert_eq!(controller.expand_future(3), 0);

        controller.set_max_date(Some(date(2024, 3, 31)));
        assert_eq!(controller.expand_future(3), 2);
        assert_eq!(controller.last_month(), month(2024, 3));
        assert!(matches!(
            controller.on_day_tapped(date(2024, 3, 31)),
            ClickOutcome::Changed(_)
        ));
        assert_eq!(
            controller.on_day_tapped(date(2024, 4, 1)),
            ClickOutcome::Ignored(IgnoreReason::NotInteractive)
        );

        controller.set_max_date(None);
        assert_eq!(controller.max_date(), None);
        assert!(!controller.appearance(date(2024, 4, 1)).disabled);
        assert_eq!(controller.expand_future(1), 1);
        controller.viewport_mut().take();

        let report = controller.tick();
        assert_eq!(
            report.months_redrawn,
            vec![month(2024, 1), month(2024, 2), month(2024, 3)]
        );
        assert_eq!(
            controller.viewport_mut().take(),
            vec![
                Call::Changed(month(2024, 1)),
                Call::Changed(month(2024, 2)),
                Call::Changed(month(2024, 3)),
            ]
        );

        let payday = controller.add_decorator(Box::new(MarkerDecorator::new(
            [date(2024, 2, 25)],
            "payday",
        )));
        assert_eq!(controller.appearance(date(2024, 2, 25)).markers, vec!["payday"]);
        assert_eq!(controller.tick().months_redrawn.len(), 4);
        assert!(controller.remove_decorator(payday));
        assert!(!controller.remove_decorator(payday));
        assert!(controller.appearance(date(2024, 2, 25)).markers.is_empty());
    }

    #[test]
    fn configured_decorators_gate_taps() {
        let mut controller = calendar(
            CalendarConfig::default()
                .with_selection_mode(SelectionMode::Single)
                .with_decorator(DecoratorSpec::DisableRange {
                    mode: RangeMode::Before,
                    boundary: date(2024, 1, 10),
                }),
        );

        assert_eq!(
            controller.on_day_tapped(date(2024, 1, 9)),
            ClickOutcome::Ignored(IgnoreReason::NotInteractive)
        );
        assert!(matches!(
            controller.on_day_tapped(date(2024, 1, 10)),
            ClickOutcome::Changed(_)
        ));
        assert_eq!(controller.selections(), &[date(2024, 1, 10)]);
    }
}
