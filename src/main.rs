mod app;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use app::App;
use explora_calendar::{CalendarError, ReminderOutcome};
use explora_core::{AppError, Config};

/// The update was refused or failed.
const EXIT_FAILED: u8 = 1;
/// Another update for the same destination is running; retry later (EX_TEMPFAIL).
const EXIT_RETRY: u8 = 75;

#[derive(Parser)]
#[command(name = "explora", about = "Plan trips and keep travel reminders in your calendar")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Destination catalog JSON, overriding the configured one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List destinations and their reminder status
    List,
    /// Show one destination
    Show { destination: String },
    /// Add the reminder if missing, otherwise remove it
    Toggle { destination: String },
    /// Add a reminder for the suggested travel dates
    Add { destination: String },
    /// Remove the reminder from the calendar
    Remove { destination: String },
    /// Forget the stored link without touching the calendar
    Forget {
        #[arg(required_unless_present = "event")]
        destination: Option<String>,
        /// Forget by calendar event id instead of destination
        #[arg(long, conflicts_with = "destination")]
        event: Option<String>,
    },
    /// List stored destination to event links
    Links,
    /// List events in the local calendar
    Events,
    /// Print the active configuration and any warnings
    Config,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    explora_core::init()?;
    let cli = Cli::parse();

    let (config, validation) = Config::load_validated(cli.config.as_deref())?;

    if let Command::Config = cli.command {
        println!("{}", config_summary(&config));
        for warning in &validation.warnings {
            println!("warning: {}", warning);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let app = App::new(config, cli.catalog.as_deref())?;
    let status = match run(&app, cli.command).await {
        Ok(status) => status,
        // Calendar failures have a friendlier message than the raw chain.
        Err(e) => match e.downcast::<CalendarError>() {
            Ok(calendar_err) => {
                eprintln!("{}", calendar_err.user_message());
                let status = error_status(&calendar_err);
                tracing::debug!("{}", AppError::from(calendar_err));
                status
            }
            Err(other) => return Err(other),
        },
    };

    app.shutdown()?;
    Ok(ExitCode::from(status))
}

/// Process exit status for a calendar error.
fn error_status(err: &CalendarError) -> u8 {
    if err.is_retryable() {
        EXIT_RETRY
    } else {
        EXIT_FAILED
    }
}

fn outcome_status(outcome: &ReminderOutcome) -> u8 {
    if outcome.is_success() {
        0
    } else {
        EXIT_FAILED
    }
}

async fn run(app: &App, command: Command) -> Result<u8> {
    match command {
        Command::List => {
            for destination in app.catalog().iter() {
                let linked = app.sync().linked_event(destination.key()).await?;
                let dates = destination
                    .date_range_label()
                    .unwrap_or_else(|_| "no dates".to_string());
                println!(
                    "{} {:<24} {}",
                    if linked.is_some() { "✓" } else { " " },
                    destination.name,
                    dates
                );
            }
        }
        Command::Show { destination } => {
            let destination = app.destination(&destination)?;
            println!("{}", destination.name);
            if !destination.description.is_empty() {
                println!("  {}", destination.description);
            }
            if let Ok(dates) = destination.date_range_label() {
                println!("  Suggested dates: {}", dates);
            }
            if let Some(point) = destination.location {
                println!("  Location: {}", point.display());
            }
            match app.sync().linked_event(destination.key()).await? {
                Some(event_id) => println!("  ✓ Added to calendar ({})", event_id),
                None => println!("  Not in calendar"),
            }
        }
        Command::Toggle { destination } => {
            let destination = app.destination(&destination)?;
            let outcome = app.sync().toggle(destination).await?;
            return print_outcome(app, &destination.name, &outcome).await;
        }
        Command::Add { destination } => {
            let destination = app.destination(&destination)?;
            let outcome = app.sync().add_reminder(destination).await?;
            return print_outcome(app, &destination.name, &outcome).await;
        }
        Command::Remove { destination } => {
            let destination = app.destination(&destination)?;
            let outcome = app.sync().remove_reminder(destination).await?;
            return print_outcome(app, &destination.name, &outcome).await;
        }
        Command::Forget { destination, event } => match (destination, event) {
            (Some(name), _) => {
                let destination = app.destination(&name)?;
                if app.sync().dissociate(destination.key()).await? {
                    println!("Forgot the calendar link for {}", destination.name);
                } else {
                    println!("{} has no calendar link", destination.name);
                }
            }
            (None, Some(event_id)) => match app.sync().dissociate_event(&event_id).await? {
                Some(key) => println!("Forgot event {} (was linked to {})", event_id, key),
                None => println!("No destination is linked to event {}", event_id),
            },
            (None, None) => bail!("Name a destination or pass --event"),
        },
        Command::Links => {
            let links = app.sync().links().await?;
            if links.is_empty() {
                println!("No calendar links");
            }
            for link in links {
                println!(
                    "{:<24} {}  linked {}",
                    link.destination_key,
                    link.event_id,
                    link.linked_at.format("%Y-%m-%d %H:%M UTC")
                );
            }
        }
        Command::Events => {
            let events = app.calendar().list_events()?;
            if events.is_empty() {
                println!("No events");
            }
            for event in events {
                println!(
                    "{}  {} - {}  {}  [{}]",
                    event.id, event.start_date, event.end_date, event.title, event.location
                );
            }
        }
        Command::Config => {}
    }
    Ok(0)
}

async fn print_outcome(app: &App, name: &str, outcome: &ReminderOutcome) -> Result<u8> {
    let notice = outcome.notice(name);
    println!("{}: {}", notice.title, notice.message);
    if notice.settings_action {
        println!("(calendar access is {:?})", app.permissions().status());
        app.sync().open_settings().await?;
    }
    Ok(outcome_status(outcome))
}

fn config_summary(config: &Config) -> String {
    format!(
        "config_dir = {}\ncatalog = {}\nlinks_db = {}\ncalendar = {} ({:?})\nlead_time_minutes = {}\ntitle_prefix = {:?}",
        config.config_dir.display(),
        config.catalog.path,
        config.storage.links_db,
        config.calendar.database,
        config.calendar.access,
        config.reminders.lead_time_minutes,
        config.reminders.title_prefix,
    )
}
