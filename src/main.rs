use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, Subcommand};

use cascade::core::dates::{format_date, parse_date};
use cascade::core::{DateSpan, ProjectId, ScheduleId, Task, TaskId};
use cascade::schedule::{move_task, run_auto_schedule, PlacementKind};
use cascade::log::LogLevel;
use cascade::{clog, clog_error, Config, Error, JsonStore, Result, ScheduleStore};

/// Cascade - dependency-driven construction scheduling
#[derive(Parser, Debug)]
#[command(name = "cascade")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:
    CASCADE_DEBUG=1     Enable debug logging (alternative to --debug)")]
pub struct Cli {
    /// Schedule file (default: data_file from ~/.cascade/cascade.toml,
    /// else ~/.cascade/schedule.json)
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Enable debug logging (writes to ~/.cascade/cascade.log)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Log threshold once logging is on: error, warn, info, debug or trace
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Place a project's unscheduled work on the timeline
    AutoSchedule {
        /// Project id or exact project name
        project: String,
    },

    /// Move a task and cascade the change to its dependents
    Move {
        /// Task id
        task: String,

        /// New start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// New end date (default: start + duration - 1)
        #[arg(long)]
        end: Option<String>,
    },

    /// List tasks in date order
    Show {
        /// Only this schedule
        #[arg(long)]
        schedule: Option<String>,
    },

    /// Report dependency cycles and tasks whose dates disagree with their duration
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    cascade::log::init(cli.debug);
    if let Some(level) = cli.log_level {
        cascade::log::set_level(level);
    }
    if cli.debug {
        clog!("Cascade starting (debug mode enabled)");
    }

    let config = Config::load()?;
    let path = match &cli.data {
        Some(path) => path.clone(),
        None => config.data_path()?,
    };

    let result = match cli.command {
        Command::AutoSchedule { project } => run_auto(&path, &config, &project),
        Command::Move { task, start, end } => {
            run_move(&path, &config, &task, &start, end.as_deref())
        }
        Command::Show { schedule } => run_show(&path, schedule.as_deref()),
        Command::Check => run_check(&path),
    };
    if let Err(e) = &result {
        clog_error!("Command failed: {}", e);
    }
    result
}

fn run_auto(path: &Path, config: &Config, project: &str) -> Result<()> {
    let mut store = JsonStore::open(path)?;
    let project_id = resolve_project(&store, project)?;
    if let Some(backup) = store.backup()? {
        println!("Backup written to {}", backup.display());
    }

    let report = run_auto_schedule(&mut store, project_id, config)?;
    if report.placements.is_empty() {
        println!("Nothing to schedule.");
        return Ok(());
    }

    for placement in &report.placements {
        let action = match placement.kind {
            PlacementKind::Update(_) => "update",
            PlacementKind::Insert(_) => "insert",
        };
        println!(
            "  {:<7} {:<30} {} .. {}",
            action,
            placement.name,
            format_date(placement.span.start),
            format_date(placement.span.end)
        );
    }
    println!(
        "{} task(s) updated, {} inserted.",
        report.updated, report.inserted
    );
    Ok(())
}

fn run_move(
    path: &Path,
    config: &Config,
    task: &str,
    start: &str,
    end: Option<&str>,
) -> Result<()> {
    let mut store = JsonStore::open(path)?;
    let task_id = TaskId::from_str(task)?;
    let current = store.get_task(task_id)?;
    let span = move_span(&current, start, end)?;

    if let Some(backup) = store.backup()? {
        println!("Backup written to {}", backup.display());
    }

    let report = move_task(&mut store, task_id, span, current.schedule_id, config)?;
    println!("Moved '{}' to {}", current.name, span);

    for update in &report.updates {
        let name = store
            .get_task(update.id)
            .map(|t| t.name)
            .unwrap_or_else(|_| update.id.short());
        match update.previous {
            Some(previous) => println!("  {:<30} {} -> {}", name, previous, update.span),
            None => println!("  {:<30} {}", name, update.span),
        }
    }
    for branch in &report.abandoned {
        eprintln!("  skipped {}: {}", branch.task_id.short(), branch.reason);
    }

    println!(
        "{} dependent task(s) updated{}.",
        report.updates.len(),
        if report.is_complete() {
            String::new()
        } else {
            format!(", {} branch(es) abandoned; re-run to retry", report.abandoned.len())
        }
    );
    Ok(())
}

/// New span for a moved task. `end` defaults to the task's duration; when
/// both are given they must agree with it.
fn move_span(task: &Task, start: &str, end: Option<&str>) -> Result<DateSpan> {
    let start = parse_date(start)?;
    let Some(end) = end else {
        return DateSpan::starting(start, task.effective_duration());
    };

    let span = DateSpan::new(start, parse_date(end)?);
    if span.end < span.start {
        return Err(Error::Validation(format!("end date precedes start date: {}", span)));
    }
    if task.duration_days.is_some() && span.len_days() != i64::from(task.effective_duration()) {
        return Err(Error::Validation(format!(
            "{} is {} day(s) but '{}' lasts {} day(s)",
            span,
            span.len_days(),
            task.name,
            task.effective_duration()
        )));
    }
    Ok(span)
}

fn run_show(path: &Path, schedule: Option<&str>) -> Result<()> {
    let store = JsonStore::open(path)?;
    let snapshot = store.inner().to_snapshot();

    let filter = schedule.map(ScheduleId::from_str).transpose()?;
    if let Some(id) = filter {
        store.get_schedule(id)?;
    }

    for project in &snapshot.projects {
        if filter.is_some_and(|id| id != project.schedule_id) {
            continue;
        }
        let start = project
            .start_date
            .map(format_date)
            .unwrap_or_else(|| "no start date".to_string());
        println!("{} ({}, {})", project.name, project.id, start);

        let mut tasks = store.list_tasks(project.schedule_id)?;
        tasks.sort_by_key(|t| (t.start_date.is_none(), t.start_date, t.display_order));
        for task in tasks {
            let dates = match task.span() {
                Some(span) => span.to_string(),
                None => "unscheduled".to_string(),
            };
            let constraint = task
                .constraint
                .map(|c| format!("  [{}]", c))
                .unwrap_or_default();
            println!(
                "  {}  {:<30} {:>3}d  {}{}",
                task.id.short(),
                task.name,
                task.effective_duration(),
                dates,
                constraint
            );
        }
    }
    Ok(())
}

fn run_check(path: &Path) -> Result<()> {
    let store = JsonStore::open(path)?;
    let problems = report_problems(&store);
    if problems == 0 {
        println!("No problems found.");
        return Ok(());
    }
    Err(Error::CheckFailed(problems))
}

/// Print every cycle and inconsistent task; returns how many were found.
fn report_problems(store: &JsonStore) -> usize {
    let mut problems = 0;

    for cycle in store.inner().graph().cycles() {
        problems += 1;
        let names: Vec<String> = cycle
            .iter()
            .map(|id| store.get_task(*id).map(|t| t.name).unwrap_or_else(|_| id.short()))
            .collect();
        println!("cycle among: {}", names.join(", "));
    }

    for task in &store.inner().to_snapshot().tasks {
        if task.span_is_inconsistent() {
            problems += 1;
            if let Some(span) = task.span() {
                println!(
                    "inconsistent: '{}' spans {} ({} days) but lasts {} day(s)",
                    task.name,
                    span,
                    span.len_days(),
                    task.effective_duration()
                );
            }
        }
    }

    problems
}

fn resolve_project(store: &JsonStore, project: &str) -> Result<ProjectId> {
    if let Ok(id) = ProjectId::from_str(project) {
        return Ok(id);
    }
    let matches: Vec<ProjectId> = store
        .inner()
        .to_snapshot()
        .projects
        .into_iter()
        .filter(|p| p.name == project)
        .map(|p| p.id)
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(Error::Validation(format!("no project named '{}'", project))),
        _ => Err(Error::Validation(format!(
            "{} projects named '{}'; use the project id",
            matches.len(),
            project
        ))),
    }
}
