mod ui;

use std::env;
use std::error::Error;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use flexi_logger::LoggerHandle;
use log::{debug, info};

use vcalendar::logging::{default_log_level, init_logging};
use vcalendar::paths::{log_dir, resolve_config_path};
use vcalendar::{
	CalendarConfig, ClickOutcome, ParityRule, SelectionMode, TimelineController, Viewport, YearMonth,
	load_config, save_config,
};

use crate::ui::{TerminalViewport, month_text, run_dashboard};

#[derive(Debug, Parser)]
#[command(name = "vcalendar", about = "Infinitely scrolling calendar for the terminal")]
struct Cli {
	#[arg(long)]
	config: Option<PathBuf>,
	#[arg(long)]
	log_level: Option<String>,
	/// First month shown, as YYYY-MM
	#[arg(long)]
	initial: Option<YearMonth>,
	#[arg(long)]
	min: Option<NaiveDate>,
	#[arg(long)]
	max: Option<NaiveDate>,
	#[arg(long, value_enum)]
	mode: Option<SelectionMode>,
	#[arg(long, value_enum)]
	parity: Option<ParityRule>,
	#[arg(long)]
	no_legend: bool,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Dashboard,
	Show {
		#[arg(long, default_value_t = 1)]
		months: usize,
		#[arg(long, default_value_t = 0)]
		past: usize,
	},
	Click {
		#[arg(long = "date", required = true)]
		dates: Vec<NaiveDate>,
		#[arg(long, default_value_t = 1)]
		months: usize,
	},
	Snapshot,
	InitConfig,
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	let _logger = start_logging(cli.log_level.as_deref());

	let config_path = resolve_config_path(cli.config.clone());
	let mut config = load_config(&config_path)?;
	apply_overrides(&mut config, &cli);
	config.validate()?;

	match cli.command.unwrap_or(Command::Dashboard) {
		Command::InitConfig => {
			save_config(&config_path, &config)?;
			println!("wrote config to {}", config_path.display());
		}
		Command::Dashboard => {
			let mut calendar = TimelineController::new(config, TerminalViewport::new());
			calendar.add_month_added_listener(|month| {
				debug!("month added {month}");
				Ok(())
			});
			calendar.add_day_click_listener(|day| {
				info!("day clicked {} selected={}", day.date, day.selected);
				Ok(())
			});
			run_dashboard(&mut calendar)?;
		}
		Command::Show { months, past } => {
			let mut calendar = TimelineController::new(config, TerminalViewport::new());
			calendar.expand_future(months.saturating_sub(1));
			calendar.expand_past(past);
			calendar.tick();
			print_months(&calendar);
		}
		Command::Click { dates, months } => {
			let mut calendar = TimelineController::new(config, TerminalViewport::new());
			calendar.expand_future(months.saturating_sub(1));
			for date in dates {
				if let ClickOutcome::Ignored(reason) = calendar.on_day_tapped(date) {
					eprintln!("warning: click on {date} ignored: {reason:?}");
				}
			}
			calendar.tick();
			print_months(&calendar);
		}
		Command::Snapshot => {
			let mut calendar = TimelineController::new(config, TerminalViewport::new());
			calendar.tick();
			println!("{}", serde_json::to_string_pretty(&calendar.snapshot())?);
		}
	}

	Ok(())
}

fn apply_overrides(config: &mut CalendarConfig, cli: &Cli) {
	if let Some(initial) = cli.initial {
		config.initial_month = Some(initial);
	}
	if let Some(min) = cli.min {
		config.min_date = Some(min);
	}
	if let Some(max) = cli.max {
		config.max_date = Some(max);
	}
	if let Some(mode) = cli.mode {
		config.selection_mode = mode;
	}
	if let Some(parity) = cli.parity {
		config.parity = parity;
	}
	if cli.no_legend {
		config.legend = false;
	}
}

fn start_logging(level: Option<&str>) -> Option<LoggerHandle> {
	let level = level
		.map(str::to_string)
		.or_else(|| env::var("VCALENDAR_LOG").ok())
		.unwrap_or_else(|| default_log_level().to_string());

	match init_logging(&level, &log_dir()) {
		Ok(handle) => Some(handle),
		Err(err) => {
			eprintln!("warning: logging disabled: {err}");
			None
		}
	}
}

fn print_months<V: Viewport>(calendar: &TimelineController<V>) {
	for month in calendar.months() {
		for line in month_text(calendar, month) {
			println!("{line}");
		}
		println!();
	}
}
