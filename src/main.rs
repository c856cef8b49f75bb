use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::thread;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use personal_os::aggregate::{format_clock, format_compact, format_hours_minutes};
use personal_os::codec::{clear_all, data_size_kb, export_all, import_all};
use personal_os::config::{Settings, load_settings, resolve_config_path, resolve_store_path};
use personal_os::dates::{LabelStyle, date_string, day_bounds, day_label, month_grid, parse_date_string};
use personal_os::journal::parse_tags;
use personal_os::markdown;
use personal_os::models::{Category, GoalType, JournalEntry, TimeEntry};
use personal_os::planner::{NewEvent, NewGoal, active_goals, completed_goals};
use personal_os::pomodoro::Pomodoro;
use personal_os::repository::RecordId;
use personal_os::review::MOODS;
use personal_os::store::{FileStore, KeyedStore};
use personal_os::tracker::{ManualEntry, TimerDraft};
use personal_os::workspace::Workspace;

#[derive(Debug, Parser)]
#[command(name = "personal-os", about = "Local-first personal productivity dashboard")]
struct Cli {
	#[arg(long)]
	store: Option<PathBuf>,
	#[arg(long)]
	config: Option<PathBuf>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Init,
	Status,
	Intention {
		text: Option<String>,
		#[arg(long)]
		date: Option<String>,
	},
	Start {
		#[arg(long, default_value = "")]
		description: String,
		#[arg(long, default_value = "work")]
		category: Category,
		#[arg(long)]
		goal: Option<RecordId>,
	},
	EditTimer {
		#[arg(long)]
		description: Option<String>,
		#[arg(long)]
		category: Option<Category>,
		#[arg(long)]
		goal: Option<RecordId>,
	},
	Stop,
	Log {
		#[arg(long)]
		description: String,
		#[arg(long, default_value = "work")]
		category: Category,
		#[arg(long)]
		goal: Option<RecordId>,
		#[arg(long)]
		start: String,
		#[arg(long)]
		end: String,
	},
	Entries {
		#[arg(long, default_value_t = 20)]
		limit: usize,
	},
	AddGoal {
		#[arg(long)]
		title: String,
		#[arg(long = "type", default_value = "personal")]
		kind: GoalType,
		#[arg(long)]
		deadline: Option<String>,
		#[arg(long, default_value_t = 0)]
		progress: u8,
	},
	GoalProgress {
		id: RecordId,
		progress: u8,
	},
	Goals,
	AddProject {
		#[arg(long)]
		title: String,
		#[arg(long, default_value = "")]
		description: String,
	},
	Projects,
	AddEvent {
		#[arg(long)]
		date: String,
		#[arg(long)]
		title: String,
		#[arg(long, default_value = "work")]
		category: Category,
		#[arg(long)]
		time: Option<String>,
	},
	Events {
		#[arg(long)]
		date: Option<String>,
	},
	Calendar {
		#[arg(long)]
		month: Option<String>,
	},
	AddActivity {
		description: String,
		#[arg(long, default_value = "")]
		tags: String,
	},
	Activity {
		#[arg(long, default_value = "")]
		query: String,
		#[arg(long, default_value_t = 20)]
		limit: usize,
	},
	AddJournal {
		#[arg(long)]
		title: String,
		#[arg(long)]
		content: String,
	},
	EditJournal {
		id: RecordId,
		#[arg(long)]
		title: Option<String>,
		#[arg(long)]
		content: Option<String>,
	},
	DeleteJournal {
		id: RecordId,
	},
	Journal {
		#[arg(long, default_value = "")]
		query: String,
	},
	ShowJournal {
		id: RecordId,
	},
	Delete {
		kind: RecordKind,
		id: RecordId,
	},
	Review {
		#[arg(long)]
		month: Option<String>,
	},
	SaveReview {
		#[arg(long)]
		month: Option<String>,
		#[arg(long)]
		went_well: Option<String>,
		#[arg(long)]
		didnt_go_well: Option<String>,
		#[arg(long)]
		reflection: Option<String>,
		#[arg(long)]
		focus: Option<String>,
	},
	Mood {
		mood: String,
		#[arg(long)]
		date: Option<String>,
	},
	Energy {
		level: u8,
		#[arg(long)]
		date: Option<String>,
	},
	Export {
		#[arg(long)]
		output: Option<PathBuf>,
	},
	Import {
		file: PathBuf,
		#[arg(long)]
		yes: bool,
	},
	Clear {
		#[arg(long)]
		yes: bool,
		#[arg(long)]
		really: bool,
	},
	Usage,
	Pomodoro {
		#[arg(long, default_value_t = 2)]
		phases: u32,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RecordKind {
	Entry,
	Goal,
	Project,
	Event,
	Activity,
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	let settings = load_settings(&resolve_config_path(cli.config))?;
	init_logging(&settings);

	let store_path = resolve_store_path(cli.store);
	let mut workspace = Workspace::new(FileStore::open(&store_path)?);
	log::debug!("using store {}", store_path.display());

	match cli.command.unwrap_or(Command::Status) {
		Command::Init => {
			workspace.store().flush()?;
			println!("initialized store at {}", store_path.display());
		}
		Command::Status => {
			print_status(&workspace);
		}
		Command::Intention { text, date } => {
			let day = parse_day(date.as_deref())?;
			match text {
				Some(text) => {
					workspace.set_intention(day, &text)?;
					println!("intention for {} saved", date_string(day));
				}
				None => match workspace.intention(day) {
					Some(text) => println!("{text}"),
					None => println!("no intention set for {}", date_string(day)),
				},
			}
		}
		Command::Start {
			description,
			category,
			goal,
		} => {
			let timer = workspace.start_timer(
				Utc::now(),
				TimerDraft {
					description,
					category,
					goal_id: goal,
				},
			)?;
			println!("timer started ({})", timer.category);
		}
		Command::EditTimer {
			description,
			category,
			goal,
		} => {
			let timer = workspace.update_active_timer(|draft| {
				if let Some(description) = description {
					draft.description = description;
				}
				if let Some(category) = category {
					draft.category = category;
				}
				if goal.is_some() {
					draft.goal_id = goal;
				}
			})?;
			println!("timer updated: {} ({})", timer.description, timer.category);
		}
		Command::Stop => {
			let completed = workspace.stop_timer(Utc::now())?;
			println!(
				"stopped: {} ({})",
				completed.entry.description,
				format_compact(completed.entry.duration)
			);
		}
		Command::Log {
			description,
			category,
			goal,
			start,
			end,
		} => {
			let manual = ManualEntry {
				description,
				category,
				goal_id: goal,
				start: parse_datetime(&start)?,
				end: parse_datetime(&end)?,
			};
			let completed = workspace.log_manual_entry(Utc::now(), manual)?;
			println!(
				"recorded entry {} ({})",
				completed.entry.id,
				format_compact(completed.entry.duration)
			);
		}
		Command::Entries { limit } => {
			print_entries(&workspace.time_entries(), limit);
		}
		Command::AddGoal {
			title,
			kind,
			deadline,
			progress,
		} => {
			let goal = workspace.add_goal(
				Utc::now(),
				NewGoal {
					title,
					kind,
					deadline,
					progress,
				},
			)?;
			println!("created goal {}", goal.id);
		}
		Command::GoalProgress { id, progress } => {
			let goal = workspace.set_goal_progress(id, progress)?;
			println!("{} is at {}%", goal.title, goal.progress);
		}
		Command::Goals => {
			print_goals(&workspace);
		}
		Command::AddProject { title, description } => {
			let project = workspace.add_project(Utc::now(), &title, &description)?;
			println!("created project {}", project.id);
		}
		Command::Projects => {
			let projects = workspace.projects();
			if projects.is_empty() {
				println!("no projects yet");
			}
			for project in projects {
				println!("{} | {} | {}", project.id, project.title, project.description);
			}
		}
		Command::AddEvent {
			date,
			title,
			category,
			time,
		} => {
			let event = workspace.add_event(
				Utc::now(),
				NewEvent {
					date: parse_day(Some(&date))?,
					title,
					category,
					time,
				},
			)?;
			println!("created event {} on {}", event.id, date_string(event.date));
		}
		Command::Events { date } => {
			let events = match date {
				Some(date) => workspace.events_on(parse_day(Some(&date))?),
				None => workspace.calendar_events(),
			};
			if events.is_empty() {
				println!("no events");
			}
			for event in events {
				println!(
					"{} | {} | {} | {} | {}",
					event.id,
					date_string(event.date),
					event.time.as_deref().unwrap_or("all day"),
					event.category,
					event.title
				);
			}
		}
		Command::Calendar { month } => {
			print_calendar(&workspace, month.as_deref())?;
		}
		Command::AddActivity { description, tags } => {
			let activity = workspace.add_activity(Utc::now(), &description, parse_tags(&tags))?;
			println!("logged activity {}", activity.id);
		}
		Command::Activity { query, limit } => {
			let now = Local::now();
			for activity in workspace.search_activities(&query).into_iter().take(limit) {
				println!(
					"{} | {} | {} | {}",
					activity.id,
					day_label(activity.timestamp, &now, LabelStyle::Weekday),
					activity.description,
					activity.tags.join(", ")
				);
			}
		}
		Command::AddJournal { title, content } => {
			let entry = workspace.add_journal_entry(Utc::now(), &title, &content)?;
			println!("created journal entry {}", entry.id);
		}
		Command::EditJournal { id, title, content } => {
			let entry = workspace.update_journal_entry(Utc::now(), id, title, content)?;
			println!("updated journal entry {}", entry.id);
		}
		Command::DeleteJournal { id } => {
			report_removal("journal entry", id, workspace.delete_journal_entry(id)?);
		}
		Command::Journal { query } => {
			print_journal(&workspace.search_journal(&query));
		}
		Command::ShowJournal { id } => {
			let entry = workspace
				.journal_entries()
				.into_iter()
				.find(|entry| entry.id == id)
				.ok_or_else(|| format!("journal entry not found: {id}"))?;
			println!("{}", entry.title);
			println!("{}", markdown::render(&entry.content));
		}
		Command::Delete { kind, id } => {
			let (label, removed) = match kind {
				RecordKind::Entry => ("time entry", workspace.remove_time_entry(id)?),
				RecordKind::Goal => ("goal", workspace.remove_goal(id)?),
				RecordKind::Project => ("project", workspace.remove_project(id)?),
				RecordKind::Event => ("event", workspace.remove_event(id)?),
				RecordKind::Activity => ("activity", workspace.remove_activity(id)?),
			};
			report_removal(label, id, removed);
		}
		Command::Review { month } => {
			let month = month.unwrap_or_else(current_month);
			print_review(&workspace, &month);
		}
		Command::SaveReview {
			month,
			went_well,
			didnt_go_well,
			reflection,
			focus,
		} => {
			let month = month.unwrap_or_else(current_month);
			let mut review = workspace.review(&month);
			if let Some(text) = went_well {
				review.went_well = text;
			}
			if let Some(text) = didnt_go_well {
				review.didnt_go_well = text;
			}
			if let Some(text) = reflection {
				review.reflection = text;
			}
			if let Some(text) = focus {
				review.focus = text;
			}
			workspace.save_review(&month, review)?;
			println!("saved review for {month}");
		}
		Command::Mood { mood, date } => {
			let day = parse_day(date.as_deref())?;
			workspace.log_mood(day, &mood)?;
			println!("mood {mood} logged for {}", date_string(day));
		}
		Command::Energy { level, date } => {
			let day = parse_day(date.as_deref())?;
			workspace.log_energy(day, level)?;
			println!("energy {level} logged for {}", date_string(day));
		}
		Command::Export { output } => {
			let now = Utc::now();
			let document = export_all(workspace.store(), now).to_json_pretty()?;
			let output = output.unwrap_or_else(|| {
				PathBuf::from(format!("personal-os-backup-{}.json", now.format("%Y-%m-%d")))
			});
			fs::write(&output, document)?;
			println!("exported to {}", output.display());
		}
		Command::Import { file, yes } => {
			if !yes {
				return Err("import overwrites existing data, pass --yes to confirm".into());
			}
			let raw = fs::read_to_string(&file)?;
			let summary = import_all(workspace.store_mut(), &raw)?;
			println!(
				"imported {} namespaces and {} intentions",
				summary.namespaces, summary.intentions
			);
		}
		Command::Clear { yes, really } => {
			if !(yes && really) {
				return Err("clear deletes everything, pass both --yes and --really to confirm".into());
			}
			clear_all(workspace.store_mut())?;
			println!("all data cleared");
		}
		Command::Usage => {
			println!("store: {}", workspace.store().path().display());
			println!("keys: {}", workspace.store().keys().len());
			println!("size: {:.2} KB", data_size_kb(workspace.store()));
		}
		Command::Pomodoro { phases } => {
			run_pomodoro(&settings, phases)?;
		}
	}

	Ok(())
}

fn init_logging(settings: &Settings) {
	let env = env_logger::Env::default().default_filter_or(settings.log_level.as_str());
	env_logger::Builder::from_env(env).init();
}

/// RFC 3339, or `YYYY-MM-DD HH:MM` in local time.
fn parse_datetime(input: &str) -> Result<DateTime<Utc>, Box<dyn Error>> {
	if let Ok(timestamp) = DateTime::parse_from_rfc3339(input) {
		return Ok(timestamp.with_timezone(&Utc));
	}

	let naive = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M")?;
	let local = Local
		.from_local_datetime(&naive)
		.earliest()
		.ok_or_else(|| format!("{input} does not exist in the local timezone"))?;
	Ok(local.with_timezone(&Utc))
}

fn parse_day(input: Option<&str>) -> Result<NaiveDate, Box<dyn Error>> {
	match input {
		Some(raw) => Ok(parse_date_string(raw).ok_or_else(|| format!("invalid date: {raw}"))?),
		None => Ok(Local::now().date_naive()),
	}
}

fn current_month() -> String {
	Local::now().format("%Y-%m").to_string()
}

fn report_removal(label: &str, id: RecordId, removed: bool) {
	if removed {
		println!("deleted {label} {id}");
	} else {
		println!("no {label} with id {id}");
	}
}

fn print_status(workspace: &Workspace<FileStore>) {
	let now = Local::now();
	let today = now.date_naive();

	println!("{}", date_string(today));
	if let Some(intention) = workspace.intention(today) {
		println!("intention: {intention}");
	}

	match workspace.active_timer() {
		Some(timer) => println!(
			"timer: {} {} ({})",
			format_clock(timer.elapsed_seconds(now.with_timezone(&Utc))),
			timer.description,
			timer.category
		),
		None => println!("timer: stopped"),
	}

	let summary = workspace.time_summary(&now);
	println!("today: {}", format_hours_minutes(summary.today_seconds));
	println!("this week: {}", format_hours_minutes(summary.week_seconds));

	let (start, end) = day_bounds(&now);
	let totals = workspace.category_totals(start, end);
	if !totals.is_empty() {
		println!("\nby category:");
		for (category, seconds) in totals {
			println!("{} | {}", format_compact(seconds), category);
		}
	}

	let goals = workspace.goals();
	println!(
		"\ngoals: {} active, {} completed",
		active_goals(&goals).len(),
		completed_goals(&goals).len()
	);

	let events = workspace.events_on(today);
	if !events.is_empty() {
		println!("\ntoday's events:");
		for event in events {
			println!("{} | {}", event.time.as_deref().unwrap_or("all day"), event.title);
		}
	}

	let activities = workspace.activities();
	if !activities.is_empty() {
		println!("\nrecent activity:");
		for activity in activities.iter().take(5) {
			println!(
				"{} | {}",
				day_label(activity.timestamp, &now, LabelStyle::Weekday),
				activity.description
			);
		}
	}
}

fn print_entries(entries: &[TimeEntry], limit: usize) {
	if entries.is_empty() {
		println!("no time entries yet");
		return;
	}

	let now = Local::now();
	for entry in entries.iter().take(limit) {
		println!(
			"{} | {} | {} | {} | {}",
			entry.id,
			day_label(entry.end_time, &now, LabelStyle::Weekday),
			format_compact(entry.duration),
			entry.category,
			entry.description
		);
	}
}

fn print_goals(workspace: &Workspace<FileStore>) {
	let goals = workspace.goals();
	if goals.is_empty() {
		println!("no goals yet");
		return;
	}

	for (heading, rows) in [
		("active", active_goals(&goals)),
		("completed", completed_goals(&goals)),
	] {
		if rows.is_empty() {
			continue;
		}
		println!("{heading}:");
		for goal in rows {
			println!(
				"{} | {:>3}% | {} | {} | {}",
				goal.id,
				goal.progress,
				goal.kind.label(),
				goal.deadline.as_deref().unwrap_or("no deadline"),
				goal.title
			);
		}
	}
}

fn print_calendar(workspace: &Workspace<FileStore>, month: Option<&str>) -> Result<(), Box<dyn Error>> {
	let first = match month {
		Some(raw) => NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
			.map_err(|_| format!("invalid month: {raw}, expected YYYY-MM"))?,
		None => Local::now().date_naive().with_day(1).ok_or("invalid current date")?,
	};
	let cells = month_grid(first.year(), first.month()).ok_or("invalid month")?;
	let events = workspace.calendar_events();

	println!("{}", first.format("%B %Y"));
	println!(" Su  Mo  Tu  We  Th  Fr  Sa");
	for week in cells.chunks(7) {
		let row = week
			.iter()
			.map(|cell| match cell {
				Some(day) if events.iter().any(|event| event.date == *day) => {
					format!("{:>3}*", day.day())
				}
				Some(day) => format!("{:>3} ", day.day()),
				None => "    ".to_string(),
			})
			.collect::<String>();
		println!("{}", row.trim_end());
	}

	Ok(())
}

fn print_journal(entries: &[JournalEntry]) {
	if entries.is_empty() {
		println!("no journal entries");
		return;
	}

	let now = Local::now();
	for entry in entries {
		println!(
			"{} | {} | {}",
			entry.id,
			day_label(entry.created_at, &now, LabelStyle::CalendarDate),
			entry.title
		);
	}
}

fn print_review(workspace: &Workspace<FileStore>, month: &str) {
	let review = workspace.review(month);
	println!("review for {month}");
	for (label, text) in [
		("went well", &review.went_well),
		("didn't go well", &review.didnt_go_well),
		("reflection", &review.reflection),
		("focus", &review.focus),
	] {
		println!("{label}: {text}");
	}

	if !review.mood.is_empty() {
		println!("\nmood:");
		for (day, mood) in &review.mood {
			println!("{day} | {mood}");
		}
	}
	if !review.energy.is_empty() {
		println!("\nenergy:");
		for (day, level) in &review.energy {
			println!("{day} | {level}");
		}
	}
	println!("\nmoods: {}", MOODS.join(" "));
}

fn run_pomodoro(settings: &Settings, phases: u32) -> Result<(), Box<dyn Error>> {
	let mut pomodoro = Pomodoro::new(settings.pomodoro);
	let mut finished = 0;
	pomodoro.toggle();

	while finished < phases {
		print!(
			"\r{} {} {:>3.0}%",
			pomodoro.phase().label(),
			format_clock(i64::from(pomodoro.remaining_seconds())),
			pomodoro.progress_percent()
		);
		io::stdout().flush()?;
		thread::sleep(std::time::Duration::from_secs(1));

		if let Some(phase) = pomodoro.tick() {
			finished += 1;
			println!("\n{} finished", phase.label());
			if finished < phases {
				pomodoro.toggle();
			}
		}
	}

	Ok(())
}
