//! `salon` CLI: manage clients, services and appointments, list free slots,
//! and send reminders from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Register a client and a service
//! salon client add --name Ana --email ana@example.com --phone "+55 11 98765-4321"
//! salon service add --name "Lash lift" --price 150 --duration 60
//!
//! # Which slots are free on a day, for a service
//! salon slots --date 2026-03-16 --service 1
//!
//! # Book, then confirm
//! salon book --client 1 --service 1 --at "2026-03-16 10:00"
//! salon appointment status 1 confirmed
//!
//! # Calendar feed, dashboard and exports
//! salon events
//! salon stats --days 30
//! salon export csv --kind appointments -o agenda.csv
//!
//! # Send reminders for appointments starting in about an hour (run from cron)
//! salon remind
//! ```
//!
//! Configuration comes from `SALON_*` environment variables (see `config.rs`);
//! `--store` and `--now` override them per invocation.

mod config;
mod outbox;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use salon_engine::calendar::{calendar_events, next_appointment_notice, Viewer};
use salon_engine::export::{appointment_report, services_csv, ExportFormat};
use salon_engine::reminders::send_due_reminders;
use salon_engine::stats::{daily_counts, dashboard};
use salon_engine::{
    list_slots, AppointmentId, BusinessHours, ClientDraft, ClientId, Clock, FixedClock, Price,
    ServiceDraft, ServiceId, SlotView, Status, Store, SystemClock,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::outbox::OutboxMailer;

#[derive(Parser)]
#[command(name = "salon", version, about = "Salon appointment booking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Record store path (overrides SALON_STORE)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Treat this RFC 3339 instant as the current time
    #[arg(long, global = true)]
    now: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage clients
    Client {
        #[command(subcommand)]
        action: ClientCommand,
    },
    /// Manage services
    Service {
        #[command(subcommand)]
        action: ServiceCommand,
    },
    /// List candidate slots for a day as JSON
    Slots {
        /// Day to list, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        /// Use this service's duration
        #[arg(long, conflicts_with = "duration")]
        service: Option<u64>,
        /// Duration in minutes when no service is given (default 60)
        #[arg(long)]
        duration: Option<u32>,
        /// Minutes between slot starts (overrides SALON_STEP_MINUTES)
        #[arg(long)]
        step: Option<u32>,
    },
    /// Book a service for a client
    Book {
        #[arg(long)]
        client: u64,
        #[arg(long)]
        service: u64,
        /// Local start, "YYYY-MM-DD HH:MM"
        #[arg(long)]
        at: String,
    },
    /// Inspect and update appointments
    Appointment {
        #[command(subcommand)]
        action: AppointmentCommand,
    },
    /// Calendar events as JSON
    Events {
        /// Only this client's appointments
        #[arg(long)]
        client_email: Option<String>,
    },
    /// Upcoming-appointment notice for a client
    Notice {
        #[arg(long)]
        client_email: String,
    },
    /// Dashboard counters and daily bookings as JSON
    Stats {
        /// Length of the daily series
        #[arg(long, default_value_t = 7, value_parser = parse_days)]
        days: u32,
    },
    /// Export records
    Export {
        #[command(subcommand)]
        format: ExportCommand,
    },
    /// Send reminders for confirmed appointments starting in about an hour
    Remind,
}

#[derive(Subcommand)]
enum ClientCommand {
    /// Register a client
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        /// 11-digit tax ID (CPF)
        #[arg(long)]
        tax_id: Option<String>,
    },
    /// List clients, optionally filtered by name, email or tax ID
    List {
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Change a client's details; omitted fields keep their value
    Edit {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Pass "" to clear
        #[arg(long)]
        phone: Option<String>,
        /// Pass "" to clear
        #[arg(long)]
        tax_id: Option<String>,
    },
    /// Delete a client and all of their appointments
    Remove { id: u64 },
}

#[derive(Subcommand)]
enum ServiceCommand {
    /// Create a service
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Price, e.g. 150 or 149.90
        #[arg(long)]
        price: Price,
        /// Duration in minutes
        #[arg(long, default_value_t = 60)]
        duration: u32,
        /// Path of an already square-cropped image
        #[arg(long)]
        image: Option<String>,
    },
    /// List services by name
    List,
    /// Change a service; omitted fields keep their value
    Edit {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        price: Option<Price>,
        #[arg(long)]
        duration: Option<u32>,
        /// Pass "" to remove the image
        #[arg(long)]
        image: Option<String>,
    },
    /// Delete a service; its appointments keep their time slot
    Remove { id: u64 },
}

#[derive(Subcommand)]
enum AppointmentCommand {
    /// List appointments chronologically
    List {
        #[arg(long)]
        client: Option<u64>,
    },
    /// Set an appointment's status (pending, confirmed, cancelled, completed)
    Status { id: u64, status: Status },
}

#[derive(Subcommand)]
enum ExportCommand {
    /// Comma-separated values
    Csv {
        #[arg(long, value_enum, default_value_t = ExportKind::Appointments)]
        kind: ExportKind,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Printable appointment report
    Pdf {
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportKind {
    Appointments,
    Services,
}

#[derive(Serialize)]
struct SlotsResponse {
    slots: Vec<SlotView>,
}

#[derive(Serialize)]
struct NoticeResponse {
    message: String,
}

#[derive(Serialize)]
struct StatsResponse {
    #[serde(flatten)]
    dashboard: salon_engine::stats::Dashboard,
    daily: Vec<salon_engine::stats::DailyCount>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load()?;
    if let Some(store) = cli.store.clone() {
        config.store = store;
    }
    let hours = config.business_hours()?;
    let clock = build_clock(cli.now.as_deref())?;
    let mut store = Store::open(&config.store)
        .with_context(|| format!("Failed to open store: {}", config.store.display()))?;

    match cli.command {
        Commands::Client { action } => run_client(action, &mut store, &hours, clock.as_ref())?,
        Commands::Service { action } => run_service(action, &mut store)?,
        Commands::Slots {
            date,
            service,
            duration,
            step,
        } => {
            let duration = match service {
                Some(id) => store.service(ServiceId(id))?.duration_minutes,
                None => duration.unwrap_or(60),
            };
            let hours = match step {
                Some(step) => hours.with_step(step)?,
                None => hours,
            };
            let busy = store.busy_on(date, &hours);
            let slots = list_slots(date, duration, &hours, &busy, clock.as_ref());
            print_json(&SlotsResponse {
                slots: slots.iter().map(|s| s.view()).collect(),
            })?;
        }
        Commands::Book { client, service, at } => {
            let starts_at = parse_local(&at, &hours)?;
            let appointment = store
                .book(ClientId(client), ServiceId(service), starts_at, &hours, clock.as_ref())
                .context("Booking refused")?;
            store.save()?;
            println!(
                "Appointment #{} created for {}. Awaiting confirmation.",
                appointment.id,
                hours.local_datetime(appointment.starts_at).format("%Y-%m-%d %H:%M")
            );
        }
        Commands::Appointment { action } => match action {
            AppointmentCommand::List { client } => {
                let appointments = match client {
                    Some(id) => store.appointments_for_client(ClientId(id)),
                    None => store.appointments(),
                };
                print_json(&appointments)?;
            }
            AppointmentCommand::Status { id, status } => {
                let previous = store.set_status(AppointmentId(id), status)?;
                store.save()?;
                println!("Appointment #{} status changed from {} to {}.", id, previous, status);
            }
        },
        Commands::Events { client_email } => {
            let viewer = match client_email {
                Some(email) => Viewer::Client(email),
                None => Viewer::Staff,
            };
            print_json(&calendar_events(&store, &hours, &viewer))?;
        }
        Commands::Notice { client_email } => {
            print_json(&NoticeResponse {
                message: next_appointment_notice(&store, &client_email, clock.as_ref()),
            })?;
        }
        Commands::Stats { days } => {
            print_json(&StatsResponse {
                dashboard: dashboard(&store),
                daily: daily_counts(&store, &hours, clock.as_ref(), days),
            })?;
        }
        Commands::Export { format } => match format {
            ExportCommand::Csv { kind, output } => {
                let csv = match kind {
                    ExportKind::Appointments => appointment_report(&store, &hours, ExportFormat::Csv)?,
                    ExportKind::Services => services_csv(&store)?,
                };
                write_output(output.as_deref(), &csv)?;
            }
            ExportCommand::Pdf { output } => {
                let report = appointment_report(&store, &hours, ExportFormat::Pdf)?;
                write_output(output.as_deref(), &report)?;
            }
        },
        Commands::Remind => {
            let mut mailer = OutboxMailer::new(config.outbox.clone());
            let report = send_due_reminders(&mut store, &hours, &mut mailer, clock.as_ref(), &config.owner_email);
            store.save()?;
            eprintln!("Reminders sent: {}, failed: {}", report.sent, report.failed);
            if report.failed > 0 {
                bail!("{} reminder(s) could not be sent", report.failed);
            }
        }
    }

    Ok(())
}

fn run_client(action: ClientCommand, store: &mut Store, hours: &BusinessHours, clock: &dyn Clock) -> Result<()> {
    match action {
        ClientCommand::Add {
            name,
            email,
            phone,
            tax_id,
        } => {
            let draft = ClientDraft {
                name,
                email,
                phone,
                tax_id,
            };
            let client = store.add_client(&draft, hours.local_date(clock.now()))?;
            store.save()?;
            println!("Client #{} {} registered.", client.id, client.name);
        }
        ClientCommand::List { query } => {
            print_json(&store.search_clients(&query))?;
        }
        ClientCommand::Edit {
            id,
            name,
            email,
            phone,
            tax_id,
        } => {
            let current = store.client(ClientId(id))?;
            let draft = ClientDraft {
                name: name.unwrap_or_else(|| current.name.clone()),
                email: email.unwrap_or_else(|| current.email.clone()),
                phone: phone.or_else(|| current.phone.clone()),
                tax_id: tax_id.or_else(|| current.tax_id.clone()),
            };
            let client = store.update_client(ClientId(id), &draft)?;
            store.save()?;
            println!("Client #{} updated.", client.id);
        }
        ClientCommand::Remove { id } => {
            let client = store.remove_client(ClientId(id))?;
            store.save()?;
            println!("Client {} removed.", client.name);
        }
    }
    Ok(())
}

fn run_service(action: ServiceCommand, store: &mut Store) -> Result<()> {
    match action {
        ServiceCommand::Add {
            name,
            description,
            price,
            duration,
            image,
        } => {
            let service = store.add_service(&ServiceDraft {
                name,
                description,
                price,
                duration_minutes: duration,
                image,
            })?;
            store.save()?;
            println!("Service #{} {} created.", service.id, service.name);
        }
        ServiceCommand::List => {
            print_json(&store.services())?;
        }
        ServiceCommand::Edit {
            id,
            name,
            description,
            price,
            duration,
            image,
        } => {
            let current = store.service(ServiceId(id))?;
            let draft = ServiceDraft {
                name: name.unwrap_or_else(|| current.name.clone()),
                description: description.unwrap_or_else(|| current.description.clone()),
                price: price.unwrap_or(current.price),
                duration_minutes: duration.unwrap_or(current.duration_minutes),
                image: image.or_else(|| current.image.clone()),
            };
            let service = store.update_service(ServiceId(id), &draft)?;
            store.save()?;
            println!("Service #{} updated.", service.id);
        }
        ServiceCommand::Remove { id } => {
            let service = store.remove_service(ServiceId(id))?;
            store.save()?;
            println!("Service {} removed.", service.name);
        }
    }
    Ok(())
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_clock(now: Option<&str>) -> Result<Box<dyn Clock>> {
    match now {
        Some(raw) => {
            let instant = DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("Invalid --now instant: {}", raw))?;
            Ok(Box::new(FixedClock(instant.with_timezone(&Utc))))
        }
        None => Ok(Box::new(SystemClock)),
    }
}

/// Daily series windows offered on the dashboard.
fn parse_days(raw: &str) -> std::result::Result<u32, String> {
    match raw {
        "7" => Ok(7),
        "30" => Ok(30),
        "90" => Ok(90),
        other => Err(format!("'{}' is not one of 7, 30, 90", other)),
    }
}

/// Parse a local "YYYY-MM-DD HH:MM" in the business timezone.
fn parse_local(raw: &str, hours: &BusinessHours) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M")
        .with_context(|| format!("Invalid date/time '{}' (use YYYY-MM-DD HH:MM)", raw))?;
    match hours.localize_naive(naive) {
        Some(instant) => Ok(instant),
        None => bail!("{} does not exist in {}", raw, hours.timezone()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
