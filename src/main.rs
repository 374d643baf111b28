use std::path::PathBuf;

use anyhow::{Context, Result};
use applytrack::models::*;
use applytrack::{
    ApplicationIncludes, CompanyIncludes, Config, Database, EventIncludes, Level, MigrationConfig,
    PersonIncludes, timestamp,
};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "applytrack")]
#[command(about = "Track job applications, companies, contacts, and events")]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, global = true, env = applytrack::config::DATABASE_ENV)]
    database: Option<PathBuf>,

    /// Directory holding the schema migrations
    #[arg(
        long,
        global = true,
        env = applytrack::config::MIGRATIONS_ENV,
        default_value = applytrack::migrations::DEFAULT_MIGRATIONS_DIR
    )]
    migrations: PathBuf,

    /// Treat --migrations as an absolute path
    #[arg(long, global = true, env = applytrack::config::MIGRATIONS_ABSOLUTE_ENV)]
    migrations_absolute: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Manage companies
    Company {
        #[command(subcommand)]
        command: CompanyCommands,
    },

    /// Manage persons
    Person {
        #[command(subcommand)]
        command: PersonCommands,
    },

    /// Manage events
    Event {
        #[command(subcommand)]
        command: EventCommands,
    },

    /// Manage applications
    Application {
        #[command(subcommand)]
        command: ApplicationCommands,
    },

    /// Associate two entities
    Link {
        pair: Pair,
        left: Uuid,
        right: Uuid,
    },

    /// Remove an association
    Unlink {
        pair: Pair,
        left: Uuid,
        right: Uuid,
    },
}

#[derive(Subcommand)]
enum CompanyCommands {
    /// Add a company
    Add {
        name: String,

        /// employer, recruiter, or consultancy
        #[arg(short = 't', long = "type", default_value = "employer")]
        company_type: CompanyType,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List all companies
    List,

    /// Find companies by name
    Find { name: String },

    /// Show a company with its relations
    Show {
        id: Uuid,

        #[arg(long, default_value = "none")]
        persons: Level,

        #[arg(long, default_value = "none")]
        events: Level,
    },

    /// Delete a company
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum PersonCommands {
    /// Add a person
    Add {
        name: String,

        #[arg(short = 't', long = "type", default_value = "unknown")]
        person_type: PersonType,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        phone: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List all persons
    List,

    /// Find persons by name
    Find { name: String },

    /// Show a person with their relations
    Show {
        id: Uuid,

        #[arg(long, default_value = "none")]
        companies: Level,

        #[arg(long, default_value = "none")]
        events: Level,

        #[arg(long, default_value = "none")]
        applications: Level,
    },

    /// Delete a person
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum EventCommands {
    /// Record an event
    Add {
        #[arg(short = 't', long = "type")]
        event_type: EventType,

        /// RFC 3339 timestamp, defaults to now
        #[arg(long)]
        date: Option<DateTime<Utc>>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List all events, most recent first
    List,

    /// Show an event with its relations
    Show {
        id: Uuid,

        #[arg(long, default_value = "none")]
        companies: Level,

        #[arg(long, default_value = "none")]
        persons: Level,

        #[arg(long, default_value = "none")]
        applications: Level,
    },
}

#[derive(Subcommand)]
enum ApplicationCommands {
    /// Add an application
    Add {
        #[arg(long)]
        company: Option<Uuid>,

        #[arg(long)]
        recruiter: Option<Uuid>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        country: Option<String>,

        #[arg(long)]
        area: Option<String>,

        /// hybrid, office, remote, or unknown
        #[arg(long)]
        remote: Option<RemoteStatusType>,
    },

    /// List all applications
    List,

    /// Find applications by job title
    Find { title: String },

    /// Show an application with its relations
    Show {
        id: Uuid,

        #[arg(long, default_value = "none")]
        company: Level,

        #[arg(long, default_value = "none")]
        recruiter: Level,

        #[arg(long, default_value = "none")]
        persons: Level,

        #[arg(long, default_value = "none")]
        events: Level,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Pair {
    CompanyPerson,
    CompanyEvent,
    EventPerson,
    ApplicationPerson,
    ApplicationEvent,
}

fn link(db: &Database, pair: Pair, left: Uuid, right: Uuid) -> Result<()> {
    match pair {
        Pair::CompanyPerson => db.associate(&AssociateCompanyPerson::new(left, right)).map(drop)?,
        Pair::CompanyEvent => db.associate(&AssociateCompanyEvent::new(left, right)).map(drop)?,
        Pair::EventPerson => db.associate(&AssociateEventPerson::new(left, right)).map(drop)?,
        Pair::ApplicationPerson => db
            .associate(&AssociateApplicationPerson::new(left, right))
            .map(drop)?,
        Pair::ApplicationEvent => db
            .associate(&AssociateApplicationEvent::new(left, right))
            .map(drop)?,
    }
    Ok(())
}

fn unlink(db: &Database, pair: Pair, left: Uuid, right: Uuid) -> Result<()> {
    match pair {
        Pair::CompanyPerson => db.delete_association(&DeleteCompanyPerson::new(left, right))?,
        Pair::CompanyEvent => db.delete_association(&DeleteCompanyEvent::new(left, right))?,
        Pair::EventPerson => db.delete_association(&DeleteEventPerson::new(left, right))?,
        Pair::ApplicationPerson => {
            db.delete_association(&DeleteApplicationPerson::new(left, right))?
        }
        Pair::ApplicationEvent => db.delete_association(&DeleteApplicationEvent::new(left, right))?,
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to render JSON")?);
    Ok(())
}

fn date(ts: Option<&DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn print_companies(companies: &[Company]) {
    if companies.is_empty() {
        println!("No companies found.");
        return;
    }
    println!("{:<36} {:<12} {:<30} {:<10}", "ID", "TYPE", "NAME", "CREATED");
    println!("{}", "-".repeat(91));
    for company in companies {
        println!(
            "{:<36} {:<12} {:<30} {:<10}",
            company.id,
            company.company_type,
            truncate(&company.name, 28),
            date(Some(&company.created_date))
        );
    }
}

fn print_persons(persons: &[Person]) {
    if persons.is_empty() {
        println!("No persons found.");
        return;
    }
    println!("{:<36} {:<18} {:<24} {:<28}", "ID", "TYPE", "NAME", "EMAIL");
    println!("{}", "-".repeat(109));
    for person in persons {
        println!(
            "{:<36} {:<18} {:<24} {:<28}",
            person.id,
            person.person_type,
            truncate(&person.name, 22),
            truncate(person.email.as_deref().unwrap_or("-"), 26)
        );
    }
}

fn print_events(events: &[Event]) {
    if events.is_empty() {
        println!("No events found.");
        return;
    }
    println!("{:<36} {:<12} {:<28} {:<30}", "ID", "DATE", "TYPE", "DESCRIPTION");
    println!("{}", "-".repeat(109));
    for event in events {
        println!(
            "{:<36} {:<12} {:<28} {:<30}",
            event.id,
            date(Some(&event.event_date)),
            event.event_type,
            truncate(event.description.as_deref().unwrap_or("-"), 28)
        );
    }
}

fn print_applications(applications: &[Application]) {
    if applications.is_empty() {
        println!("No applications found.");
        return;
    }
    println!("{:<36} {:<30} {:<8} {:<10}", "ID", "TITLE", "REMOTE", "APPLIED");
    println!("{}", "-".repeat(87));
    for app in applications {
        let title = app.job_title.as_deref().or(app.job_ad_url.as_deref()).unwrap_or("-");
        let remote = app
            .remote_status_type
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<36} {:<30} {:<8} {:<10}",
            app.id,
            truncate(title, 28),
            remote,
            date(app.application_date.as_ref())
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("applytrack=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config {
        database_path: cli.database.unwrap_or_else(Database::default_path),
        migrations: MigrationConfig::new(cli.migrations, cli.migrations_absolute),
    };

    let mut db = config.open().context("Failed to open database")?;

    match cli.command {
        Commands::Init => {
            let applied = db.migrate(&config.migrations)?;
            println!(
                "Database initialized at {} ({} migration(s) applied)",
                config.database_path.display(),
                applied
            );
        }

        Commands::Company { command } => {
            db.ensure_initialized()?;
            match command {
                CompanyCommands::Add {
                    name,
                    company_type,
                    notes,
                } => {
                    let company = db.create_company(&CreateCompany {
                        notes,
                        ..CreateCompany::new(name, company_type)
                    })?;
                    println!("Added company '{}' ({})", company.name, company.id);
                }
                CompanyCommands::List => print_companies(&db.get_all_companies()?),
                CompanyCommands::Find { name } => {
                    print_companies(&db.get_all_companies_by_name(&name)?)
                }
                CompanyCommands::Show {
                    id,
                    persons,
                    events,
                } => print_json(&db.get_company_with(id, &CompanyIncludes { persons, events })?)?,
                CompanyCommands::Delete { id } => {
                    db.delete_company(id)?;
                    println!("Deleted company {}", id);
                }
            }
        }

        Commands::Person { command } => {
            db.ensure_initialized()?;
            match command {
                PersonCommands::Add {
                    name,
                    person_type,
                    email,
                    phone,
                    notes,
                } => {
                    let person = db.create_person(&CreatePerson {
                        email,
                        phone,
                        notes,
                        ..CreatePerson::new(name, person_type)
                    })?;
                    println!("Added person '{}' ({})", person.name, person.id);
                }
                PersonCommands::List => print_persons(&db.get_all_persons()?),
                PersonCommands::Find { name } => print_persons(&db.get_all_persons_by_name(&name)?),
                PersonCommands::Show {
                    id,
                    companies,
                    events,
                    applications,
                } => print_json(&db.get_person_with(
                    id,
                    &PersonIncludes {
                        companies,
                        events,
                        applications,
                    },
                )?)?,
                PersonCommands::Delete { id } => {
                    db.delete_person(id)?;
                    println!("Deleted person {}", id);
                }
            }
        }

        Commands::Event { command } => {
            db.ensure_initialized()?;
            match command {
                EventCommands::Add {
                    event_type,
                    date,
                    description,
                    notes,
                } => {
                    let event = db.create_event(&CreateEvent {
                        description,
                        notes,
                        ..CreateEvent::new(event_type, date.unwrap_or_else(timestamp::now))
                    })?;
                    println!("Recorded {} event ({})", event.event_type, event.id);
                }
                EventCommands::List => print_events(&db.get_all_events()?),
                EventCommands::Show {
                    id,
                    companies,
                    persons,
                    applications,
                } => print_json(&db.get_event_with(
                    id,
                    &EventIncludes {
                        companies,
                        persons,
                        applications,
                    },
                )?)?,
            }
        }

        Commands::Application { command } => {
            db.ensure_initialized()?;
            match command {
                ApplicationCommands::Add {
                    company,
                    recruiter,
                    title,
                    url,
                    country,
                    area,
                    remote,
                } => {
                    let app = db.create_application(&CreateApplication {
                        company_id: company,
                        recruiter_id: recruiter,
                        job_title: title,
                        job_ad_url: url,
                        country,
                        area,
                        remote_status_type: remote,
                        application_date: Some(timestamp::now()),
                        ..Default::default()
                    })?;
                    println!("Added application ({})", app.id);
                }
                ApplicationCommands::List => print_applications(&db.get_all_applications()?),
                ApplicationCommands::Find { title } => {
                    print_applications(&db.get_all_applications_by_job_title(&title)?)
                }
                ApplicationCommands::Show {
                    id,
                    company,
                    recruiter,
                    persons,
                    events,
                } => print_json(&db.get_application_with(
                    id,
                    &ApplicationIncludes {
                        company,
                        recruiter,
                        persons,
                        events,
                    },
                )?)?,
            }
        }

        Commands::Link { pair, left, right } => {
            db.ensure_initialized()?;
            link(&db, pair, left, right)?;
            println!("Linked {} and {}", left, right);
        }

        Commands::Unlink { pair, left, right } => {
            db.ensure_initialized()?;
            unlink(&db, pair, left, right)?;
            println!("Unlinked {} and {}", left, right);
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
