use std::collections::BTreeSet;
use std::error::Error;
use std::io;
use std::time::Duration as StdDuration;

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{Frame, Terminal};

use vcalendar::{ClickOutcome, MonthRow, SelectionMode, TimelineController, Viewport, YearMonth};

const WEEK_START: Weekday = Weekday::Mon;
const GRID_WEEKS: usize = 6;
const CURSOR_COLOR: Color = Color::Yellow;
const SELECTED_COLOR: Color = Color::LightGreen;
const DISABLED_COLOR: Color = Color::DarkGray;

/// Viewport backed by a terminal: an ordered list of month rows and a scroll
/// offset. Drawing happens in [`run_dashboard`] from the controller state.
#[derive(Debug, Default)]
pub struct TerminalViewport {
	rows: Vec<YearMonth>,
	top: usize,
	redraws: usize,
	last_changed: Option<YearMonth>,
}

impl TerminalViewport {
	pub fn new() -> Self {
		Self::default()
	}

	fn position_of(&self, month: YearMonth) -> Option<usize> {
		self.rows.iter().position(|row| *row == month)
	}

	fn visible(&self, fit: usize) -> &[YearMonth] {
		let end = (self.top + fit).min(self.rows.len());
		&self.rows[self.top.min(end)..end]
	}

	/// Scrolls just enough to bring `index` into a window of `fit` rows.
	fn reveal(&mut self, index: usize, fit: usize) {
		if index < self.top {
			self.top = index;
		} else if fit > 0 && index >= self.top + fit {
			self.top = index + 1 - fit;
		}
	}
}

impl Viewport for TerminalViewport {
	fn append_rows(&mut self, rows: &[MonthRow]) {
		self.rows.extend(rows.iter().map(|row| row.month));
	}

	fn prepend_rows(&mut self, rows: &[MonthRow]) {
		let mut merged = rows.iter().map(|row| row.month).collect::<Vec<_>>();
		merged.append(&mut self.rows);
		self.rows = merged;
		self.top += rows.len();
	}

	fn clear_all(&mut self) {
		self.rows.clear();
		self.top = 0;
	}

	fn notify_month_changed(&mut self, month: YearMonth) {
		self.redraws += 1;
		self.last_changed = Some(month);
	}

	fn scroll_to_start(&mut self) {
		self.top = 0;
	}

	fn scroll_to_end(&mut self) {
		self.top = self.rows.len().saturating_sub(1);
	}
}

pub fn run_dashboard(calendar: &mut TimelineController<TerminalViewport>) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, calendar);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	calendar: &mut TimelineController<TerminalViewport>,
) -> Result<(), Box<dyn Error>> {
	let mut app = App::new(calendar);
	let size = terminal.size()?;
	let month_height = month_height(calendar.legend_enabled());
	calendar.on_attached_with_size(usize::from(size.height.saturating_sub(FOOTER_HEIGHT)), month_height);

	loop {
		let report = calendar.tick();
		if report.months_added > 0 {
			app.status = format!("loaded {} more month(s)", report.months_added);
		}

		let size = terminal.size()?;
		let fit = (usize::from(size.height.saturating_sub(FOOTER_HEIGHT)) / month_height).max(1);
		app.sync_viewport(calendar, fit);
		terminal.draw(|frame| draw_dashboard(frame, calendar, &app, fit))?;

		if event::poll(StdDuration::from_millis(250))? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}
				if handle_key(&mut app, key.code, calendar) {
					break;
				}
			}
		}
	}

	Ok(())
}

const FOOTER_HEIGHT: u16 = 4;

fn month_height(legend: bool) -> usize {
	// title, optional legend, six weeks, spacer
	1 + usize::from(legend) + GRID_WEEKS + 1
}

fn handle_key(app: &mut App, code: KeyCode, calendar: &mut TimelineController<TerminalViewport>) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => return true,
		KeyCode::Left | KeyCode::Char('h') => app.move_cursor(calendar, app.cursor - Duration::days(1)),
		KeyCode::Right | KeyCode::Char('l') => app.move_cursor(calendar, app.cursor + Duration::days(1)),
		KeyCode::Up | KeyCode::Char('k') => app.move_cursor(calendar, app.cursor - Duration::days(7)),
		KeyCode::Down | KeyCode::Char('j') => app.move_cursor(calendar, app.cursor + Duration::days(7)),
		KeyCode::PageUp => app.move_cursor(calendar, shift_month(app.cursor, -1)),
		KeyCode::PageDown => app.move_cursor(calendar, shift_month(app.cursor, 1)),
		KeyCode::Char('t') => app.move_cursor(calendar, Local::now().date_naive()),
		KeyCode::Enter | KeyCode::Char(' ') => {
			app.status = match calendar.on_day_tapped(app.cursor) {
				ClickOutcome::Changed(months) => format!(
					"{} selected day(s), {} month(s) changed",
					calendar.selections().len(),
					months.len()
				),
				ClickOutcome::Ignored(reason) => format!("{} ignored: {reason:?}", app.cursor),
			};
		}
		KeyCode::Char('c') => {
			let changed = calendar.clear_selection();
			app.status = format!("selection cleared in {} month(s)", changed.len());
		}
		KeyCode::Char('m') => {
			let next = next_mode(calendar.mode());
			calendar.set_selection_mode(next);
			app.status = format!("mode: {next}");
		}
		_ => {}
	}
	false
}

fn next_mode(mode: SelectionMode) -> SelectionMode {
	match mode {
		SelectionMode::None => SelectionMode::Single,
		SelectionMode::Single => SelectionMode::Multiple,
		SelectionMode::Multiple => SelectionMode::Range,
		SelectionMode::Range => SelectionMode::Even,
		SelectionMode::Even => SelectionMode::Odd,
		SelectionMode::Odd => SelectionMode::None,
	}
}

fn draw_dashboard(frame: &mut Frame, calendar: &TimelineController<TerminalViewport>, app: &App, fit: usize) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Min(3), Constraint::Length(FOOTER_HEIGHT)])
		.split(frame.area());

	let mut lines = Vec::new();
	for month in calendar.viewport().visible(fit) {
		lines.extend(month_lines(calendar, *month, Some(app.cursor)));
		lines.push(Line::from(""));
	}

	let title = format!(
		"Calendar {} .. {} | mode {}",
		calendar.first_month(),
		calendar.last_month(),
		calendar.mode()
	);
	let body = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
	frame.render_widget(body, layout[0]);
	render_footer(frame, layout[1], calendar, app);
}

fn render_footer(frame: &mut Frame, area: Rect, calendar: &TimelineController<TerminalViewport>, app: &App) {
	let viewport = calendar.viewport();
	let footer_lines = vec![
		Line::from("arrows/hjkl move | PgUp/PgDn month | space/Enter select | c clear | m mode | t today | q quit"),
		Line::from(format!(
			"{} | redraws {}{}",
			app.status,
			viewport.redraws,
			viewport
				.last_changed
				.map(|month| format!(" (last {month})"))
				.unwrap_or_default()
		)),
	];

	let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn month_lines<V: Viewport>(
	calendar: &TimelineController<V>,
	month: YearMonth,
	cursor: Option<NaiveDate>,
) -> Vec<Line<'static>> {
	let mut lines = Vec::new();
	lines.push(Line::from(Span::styled(
		format!("{} {}", month.first_day().format("%B"), month.year()),
		Style::default().add_modifier(Modifier::BOLD),
	)));
	if calendar.legend_enabled() {
		lines.push(Line::from("Mo Tu We Th Fr Sa Su"));
	}

	for week in month_weeks(month) {
		let mut spans = Vec::new();
		for cell in week {
			let Some(date) = cell else {
				spans.push(Span::raw("   "));
				continue;
			};

			let appearance = calendar.appearance(date);
			let mut style = appearance
				.text_color
				.as_deref()
				.and_then(color_from_name)
				.map(|color| Style::default().fg(color))
				.unwrap_or_default();
			if appearance.disabled {
				style = style.fg(DISABLED_COLOR);
			}
			if calendar.is_selected(date) {
				style = style.fg(Color::Black).bg(SELECTED_COLOR);
			}
			if Some(date) == cursor {
				style = style.fg(Color::Black).bg(CURSOR_COLOR).add_modifier(Modifier::BOLD);
			}
			let marker = if appearance.markers.is_empty() { ' ' } else { '+' };
			spans.push(Span::styled(format!("{:>2}{marker}", date.day()), style));
		}
		lines.push(Line::from(spans));
	}
	lines
}

/// Plain-text month grid. `*` marks selected days, `+` marked days and `-`
/// disabled ones.
pub fn month_text<V: Viewport>(calendar: &TimelineController<V>, month: YearMonth) -> Vec<String> {
	let mut lines = vec![format!("{} {}", month.first_day().format("%B"), month.year())];
	if calendar.legend_enabled() {
		lines.push("Mo Tu We Th Fr Sa Su".to_string());
	}

	for week in month_weeks(month) {
		let mut line = String::new();
		for cell in week {
			let Some(date) = cell else {
				line.push_str("   ");
				continue;
			};
			let appearance = calendar.appearance(date);
			let flag = if calendar.is_selected(date) {
				'*'
			} else if appearance.disabled {
				'-'
			} else if !appearance.markers.is_empty() {
				'+'
			} else {
				' '
			};
			line.push_str(&format!("{:>2}{flag}", date.day()));
		}
		lines.push(line.trim_end().to_string());
	}
	lines
}

fn month_weeks(month: YearMonth) -> Vec<[Option<NaiveDate>; 7]> {
	let blanks = month.leading_blanks(WEEK_START) as usize;
	let mut weeks = vec![[None; 7]; GRID_WEEKS];
	for (offset, date) in month.days().enumerate() {
		let slot = blanks + offset;
		weeks[slot / 7][slot % 7] = Some(date);
	}
	weeks
}

fn shift_month(day: NaiveDate, delta: i32) -> NaiveDate {
	let month = YearMonth::from_date(day).shift(delta);
	let target_day = day.day().min(month.days_in_month());
	NaiveDate::from_ymd_opt(month.year(), month.month(), target_day).expect("shifted month date must be valid")
}

fn color_from_name(color_name: &str) -> Option<Color> {
	match color_name {
		"black" => Some(Color::Black),
		"red" => Some(Color::Red),
		"green" => Some(Color::Green),
		"yellow" => Some(Color::Yellow),
		"blue" => Some(Color::Blue),
		"magenta" => Some(Color::Magenta),
		"cyan" => Some(Color::Cyan),
		"gray" => Some(Color::Gray),
		"dark_gray" => Some(Color::DarkGray),
		"light_red" => Some(Color::LightRed),
		"light_green" => Some(Color::LightGreen),
		"light_yellow" => Some(Color::LightYellow),
		"light_blue" => Some(Color::LightBlue),
		"light_magenta" => Some(Color::LightMagenta),
		"light_cyan" => Some(Color::LightCyan),
		"white" => Some(Color::White),
		_ => None,
	}
}

#[derive(Debug, Clone)]
struct App {
	cursor: NaiveDate,
	bound: BTreeSet<YearMonth>,
	status: String,
}

impl App {
	fn new(calendar: &TimelineController<TerminalViewport>) -> Self {
		let today = Local::now().date_naive();
		let initial = calendar.initial_month();
		let cursor = if initial.contains(today) { today } else { initial.first_day() };
		Self {
			cursor,
			bound: BTreeSet::new(),
			status: "Ready".to_string(),
		}
	}

	/// Moves the cursor, pulling in months when it walks off the rendered
	/// range. Stays put when a bound stops the timeline.
	fn move_cursor(&mut self, calendar: &mut TimelineController<TerminalViewport>, target: NaiveDate) {
		let month = YearMonth::from_date(target);
		if month < calendar.first_month() {
			calendar.schedule_past(calendar.first_month().months_until(month).unsigned_abs() as usize);
			calendar.tick();
		} else if month > calendar.last_month() {
			calendar.schedule_future(calendar.last_month().months_until(month) as usize);
			calendar.tick();
		}

		if month >= calendar.first_month() && month <= calendar.last_month() {
			self.cursor = target;
		} else {
			self.status = format!("no months beyond {}", YearMonth::from_date(self.cursor));
		}
	}

	/// Keeps the cursor month on screen and reports scroll position and row
	/// lifecycle back to the controller.
	fn sync_viewport(&mut self, calendar: &mut TimelineController<TerminalViewport>, fit: usize) {
		let cursor_month = YearMonth::from_date(self.cursor);
		if let Some(index) = calendar.viewport().position_of(cursor_month) {
			calendar.viewport_mut().reveal(index, fit);
		}

		let top = calendar.viewport().top;
		let visible = calendar.viewport().visible(fit).iter().copied().collect::<BTreeSet<_>>();
		if visible.is_empty() {
			return;
		}
		calendar.on_scrolled(top, top + visible.len() - 1);

		for month in self.bound.difference(&visible) {
			calendar.on_month_unbound(*month);
		}
		for month in visible.difference(&self.bound) {
			calendar.on_month_bound(*month);
		}
		self.bound = visible;
	}
}

#[cfg(test)]
mod tests {
	use chrono::NaiveDate;

	use vcalendar::{CalendarConfig, SelectionMode, TimelineController, Viewport, YearMonth};

	use super::{TerminalViewport, month_text, shift_month};

	#[test]
	fn terminal_viewport_keeps_rows_in_order() {
		let config = CalendarConfig::default().with_initial_month(YearMonth::new(2024, 1));
		let mut calendar = TimelineController::new(config, TerminalViewport::new());
		calendar.expand_future(1);
		calendar.expand_past(2);

		assert_eq!(
			calendar.viewport().rows,
			vec![
				YearMonth::new(2023, 11),
				YearMonth::new(2023, 12),
				YearMonth::new(2024, 1),
				YearMonth::new(2024, 2),
			]
		);
		assert_eq!(calendar.viewport().top, 2);
		calendar.viewport_mut().scroll_to_start();
		assert_eq!(calendar.viewport().top, 0);
	}

	#[test]
	fn month_text_flags_selected_and_disabled_days() {
		let config = CalendarConfig::default()
			.with_initial_month(YearMonth::new(2024, 2))
			.with_selection_mode(SelectionMode::Single)
			.with_max_date(NaiveDate::from_ymd_opt(2024, 2, 27).unwrap());
		let mut calendar = TimelineController::new(config, TerminalViewport::new());
		calendar.on_day_tapped(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

		let lines = month_text(&calendar, YearMonth::new(2024, 2));
		assert_eq!(lines[0], "February 2024");
		assert_eq!(lines[2], "          1* 2  3  4");
		assert_eq!(lines[6], "26 27 28-29-");
	}

	#[test]
	fn shift_month_clamps_day() {
		let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
		assert_eq!(shift_month(date, 1), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
		assert_eq!(shift_month(date, -2), NaiveDate::from_ymd_opt(2023, 11, 30).unwrap());
	}
}
